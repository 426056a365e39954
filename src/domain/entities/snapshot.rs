use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known source names read by the pricing engine.
pub mod sources {
    pub const MARKET_DATA: &str = "market_data";
    pub const AUCTION_DATA: &str = "auction_data";
    pub const SENTIMENT: &str = "sentiment";
    pub const ECONOMIC_INDICATORS: &str = "economic_indicators";

    pub const ALL: [&str; 4] = [MARKET_DATA, AUCTION_DATA, SENTIMENT, ECONOMIC_INDICATORS];
}

/// Latest payload submitted by one external data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSnapshot {
    pub source: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl DataSourceSnapshot {
    pub fn new(source: impl Into<String>, payload: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            payload,
            timestamp,
        }
    }

    /// One-line digest of the scalar top-level fields, keys sorted.
    pub fn summary(&self) -> String {
        let fields: Vec<String> = match &self.payload {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                keys.into_iter()
                    .filter_map(|k| match &map[k] {
                        Value::Number(n) => Some(format!("{k}={n}")),
                        Value::String(s) => Some(format!("{k}={s}")),
                        Value::Bool(b) => Some(format!("{k}={b}")),
                        _ => None,
                    })
                    .collect()
            }
            Value::Null => vec![],
            other => vec![other.to_string()],
        };
        format!("{}: {}", self.source, fields.join(", "))
    }

    /// Text stored in the knowledge base for this observation.
    pub fn to_document(&self) -> String {
        format!(
            "Source: {}\nTimestamp: {}\nData: {}",
            self.source,
            self.timestamp.to_rfc3339(),
            self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_lists_scalars_only() {
        let snap = DataSourceSnapshot::new(
            "auction_data",
            json!({"price_trend": "+5.2%", "average_price": 26750.0, "recent_sales": [1, 2]}),
            Utc::now(),
        );
        assert_eq!(snap.summary(), "auction_data: average_price=26750.0, price_trend=+5.2%");
    }

    #[test]
    fn test_document_mentions_source() {
        let snap = DataSourceSnapshot::new("sentiment", json!({"overall_sentiment": 0.4}), Utc::now());
        let doc = snap.to_document();
        assert!(doc.starts_with("Source: sentiment\n"));
        assert!(doc.contains("overall_sentiment"));
    }
}
