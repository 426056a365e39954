//! Reasoning gateway backed by a chat LLM.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::entities::asset_record::AssetRecord;
use crate::domain::entities::knowledge_entry::ScoredEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::reasoning_port::{
    LlmClient, PriceSuggestion, Reasoner, ReasoningOpinion, SnapshotSet,
};
use crate::domain::values::normalize::number;
use crate::domain::values::trend::Trend;

pub const SYSTEM_PROMPT: &str = "You are an AI pricing specialist for tokenized real-world assets.";

/// Cap on one snapshot payload inside the prompt.
const MAX_SNAPSHOT_CHARS: usize = 2_000;
/// Cap on one retrieved document inside the prompt.
const MAX_CONTEXT_ENTRY_CHARS: usize = 1_000;
/// Confidence assumed when the reply omits one.
const DEFAULT_OPINION_CONFIDENCE: f64 = 0.5;

const INSTRUCTIONS: &str = "Based on all the information above, determine a fair market price for this asset.
Consider trends, comparable assets, sentiment, and economic conditions.

Provide your response as a JSON object with the following fields:
- price: The recommended price in USD (numeric value only)
- price_change_pct: Optional expected change versus the current price, in percent
- confidence_score: Your confidence in this price (0.0-1.0)
- explanation: Brief explanation of your pricing rationale
- trend: Expected short-term price direction (\"up\", \"down\", or \"stable\")

JSON RESPONSE:";

pub struct LlmReasoningGateway {
    llm: Arc<dyn LlmClient>,
    context_budget_chars: usize,
}

impl LlmReasoningGateway {
    pub fn new(llm: Arc<dyn LlmClient>, context_budget_chars: usize) -> Self {
        Self {
            llm,
            context_budget_chars,
        }
    }

    pub fn build_prompt(
        &self,
        asset: &AssetRecord,
        snapshots: &SnapshotSet,
        context: &[ScoredEntry],
    ) -> String {
        let asset_info = json!({
            "asset_id": asset.id,
            "name": asset.name,
            "category": asset.category,
            "description": asset.description,
            "last_price": asset.last_price,
        });

        let mut prompt = String::from(
            "You are an AI pricing specialist for tokenized real-world assets (RWAs).\n\nASSET INFORMATION:\n",
        );
        prompt.push_str(&pretty(&asset_info));
        prompt.push_str("\n\nDATA SOURCES:\n");
        if snapshots.is_empty() {
            prompt.push_str("(no data sources available)\n");
        }
        for (name, snap) in snapshots {
            prompt.push_str(&format!(
                "## {} (as of {})\n{}\n",
                name,
                snap.timestamp.to_rfc3339(),
                truncate(&pretty(&snap.payload), MAX_SNAPSHOT_CHARS)
            ));
        }

        prompt.push_str("\nHISTORICAL CONTEXT:\n");
        let section = self.context_section(context);
        if section.is_empty() {
            prompt.push_str("(no similar observations)\n");
        } else {
            prompt.push_str(&section);
        }
        prompt.push('\n');
        prompt.push_str(INSTRUCTIONS);
        prompt
    }

    /// Context entries in the given (descending similarity) order until the
    /// budget is spent; the least similar entries are the ones dropped.
    fn context_section(&self, context: &[ScoredEntry]) -> String {
        let mut section = String::new();
        for (i, scored) in context.iter().enumerate() {
            let line = format!(
                "[{}] (similarity {:.3}) {}\n",
                i + 1,
                scored.similarity,
                truncate(&scored.entry.document, MAX_CONTEXT_ENTRY_CHARS)
            );
            if section.chars().count() + line.chars().count() > self.context_budget_chars {
                break;
            }
            section.push_str(&line);
        }
        section
    }
}

#[async_trait]
impl Reasoner for LlmReasoningGateway {
    fn name(&self) -> &str {
        self.llm.name()
    }

    async fn evaluate(
        &self,
        asset: &AssetRecord,
        snapshots: &SnapshotSet,
        context: &[ScoredEntry],
    ) -> Result<ReasoningOpinion, DomainError> {
        let prompt = self.build_prompt(asset, snapshots, context);
        tracing::debug!(asset_id = %asset.id, prompt_chars = prompt.len(), "requesting reasoning opinion");
        let reply = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;
        parse_opinion(&reply)
    }
}

/// Parses an LLM reply into an opinion.
///
/// Accepts bare JSON or JSON wrapped in prose or Markdown fences. Requires a
/// positive `price` or a finite `price_change_pct`.
pub fn parse_opinion(reply: &str) -> Result<ReasoningOpinion, DomainError> {
    let body = extract_json_object(reply)
        .ok_or_else(|| DomainError::ReasoningParse("no JSON object in reply".into()))?;
    let value: Value = serde_json::from_str(body)
        .map_err(|e| DomainError::ReasoningParse(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(DomainError::ReasoningParse("reply is not a JSON object".into()));
    }

    let suggestion = match number(&value, "price").filter(|p| *p > 0.0) {
        Some(price) => PriceSuggestion::Absolute(price),
        None => match number(&value, "price_change_pct") {
            Some(pct) => PriceSuggestion::ChangePct(pct),
            None => {
                return Err(DomainError::ReasoningParse(
                    "reply has neither a positive price nor a price change".into(),
                ))
            }
        },
    };

    let confidence = number(&value, "confidence_score")
        .or_else(|| number(&value, "confidence"))
        .unwrap_or(DEFAULT_OPINION_CONFIDENCE)
        .clamp(0.0, 1.0);
    let rationale = value
        .get("explanation")
        .or_else(|| value.get("rationale"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let trend = value
        .get("trend")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<Trend>().ok());

    Ok(ReasoningOpinion {
        suggestion,
        rationale,
        confidence,
        trend,
        produced_at: Utc::now(),
    })
}

fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
