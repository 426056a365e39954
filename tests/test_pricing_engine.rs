mod common;

use chrono::{Duration, Utc};
use common::{
    setup, setup_with, CountingReasoner, FailingEmbedder, FailingReasoner, SlowReasoner,
    StubReasoner, StubVerifier,
};
use rwa_pricing::application::pricing::PricingOptions;
use rwa_pricing::domain::entities::asset_record::AssetRecord;
use rwa_pricing::domain::error::DomainError;
use rwa_pricing::domain::values::asset_category::AssetCategory;
use rwa_pricing::domain::values::factor::{Factor, WEIGHT_EPSILON};
use rwa_pricing::domain::values::trend::Trend;
use rwa_pricing::domain::values::warning::PricingWarning;
use rwa_pricing::{Providers, RwaPricing};
use serde_json::json;
use std::sync::Arc;

fn no_llm() -> PricingOptions {
    PricingOptions {
        use_llm: false,
        ..PricingOptions::default()
    }
}

async fn seed_sources(app: &RwaPricing, at: chrono::DateTime<Utc>) {
    app.update_data_source(
        "market_data",
        json!({"average_price": 118000.0, "volume_24h": 1500000, "price_trend": "+2.1%"}),
        at,
    )
    .await
    .unwrap();
    app.update_data_source("sentiment", json!({"overall_sentiment": 0.4}), at)
        .await
        .unwrap();
    app.update_data_source(
        "economic_indicators",
        json!({"inflation_rate": 2.7, "interest_rate": 4.5, "consumer_confidence": 95.2, "gdp_growth": 2.1}),
        at,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_empty_asset_id_is_not_resolvable() {
    let app = setup();
    let err = app.generate_price("", Some(100.0), &PricingOptions::default()).await;
    assert!(matches!(err, Err(DomainError::AssetNotResolvable(_))));
    let err = app.generate_price("has space", None, &PricingOptions::default()).await;
    assert!(matches!(err, Err(DomainError::AssetNotResolvable(_))));
}

#[tokio::test]
async fn test_price_is_produced_without_any_data() {
    let app = setup();
    let signal = app
        .generate_price("unknown_asset", None, &PricingOptions::default())
        .await
        .unwrap();
    assert!(signal.price > 0.0);
    let c = signal.confidence_score.value();
    assert!((0.0..=1.0).contains(&c));
    assert!((signal.weight_sum() - 1.0).abs() < WEIGHT_EPSILON);
    assert!(!signal.reasoning_used);
    assert!(signal
        .warnings
        .iter()
        .any(|w| matches!(w, PricingWarning::MissingSource(s) if s == "sentiment")));

    // the first request creates the asset
    let asset = app.get_asset("unknown_asset").unwrap().unwrap();
    assert_eq!(asset.last_price, Some(signal.price));
}

#[tokio::test]
async fn test_weights_sum_to_one_for_every_option_combination() {
    for use_llm in [true, false] {
        for verify_on_chain in [true, false] {
            for verified in [true, false] {
                let verifier = if verified { StubVerifier::found() } else { StubVerifier::not_found() };
                let app = setup_with(Some(StubReasoner::absolute(125_000.0, 0.8)), Some(verifier));
                seed_sources(&app, Utc::now()).await;
                let options = PricingOptions {
                    use_llm,
                    verify_on_chain,
                    include_factors: true,
                };
                let signal = app.generate_price("bored_ape_1234", Some(120_000.0), &options).await.unwrap();
                assert!((signal.weight_sum() - 1.0).abs() < WEIGHT_EPSILON, "{:?}", signal.factors);
                assert!(signal.price > 0.0);
                let breakdown = signal.breakdown.as_ref().unwrap();
                assert_eq!(breakdown.len(), signal.factors.len());
            }
        }
    }
}

#[tokio::test]
async fn test_use_llm_false_never_calls_reasoner() {
    let reasoner = Arc::new(CountingReasoner::default());
    let app = setup_with(Some(reasoner.clone()), None);
    seed_sources(&app, Utc::now()).await;

    let signal = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    assert_eq!(reasoner.calls(), 0);
    assert!(signal.weight_of(Factor::RecentMarketData).is_none());
    assert!((signal.weight_sum() - 1.0).abs() < WEIGHT_EPSILON);
    // sentiment 0.2 : economic 0.1 : intrinsic 0.1
    let sentiment = signal.weight_of(Factor::SentimentAnalysis).unwrap();
    assert!((sentiment - 0.5).abs() < 1e-9);

    app.generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    assert_eq!(reasoner.calls(), 1);
}

#[tokio::test]
async fn test_reasoning_failure_falls_back_with_lower_confidence() {
    let ok = setup_with(Some(StubReasoner::absolute(126_000.0, 0.8)), None);
    let failing = setup_with(Some(Arc::new(FailingReasoner)), None);

    let good = ok
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    let fallback = failing
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();

    assert!(good.reasoning_used);
    assert!(good.weight_of(Factor::RecentMarketData).is_some());
    assert_eq!(good.trend, Trend::Up);

    assert!(!fallback.reasoning_used);
    assert!(fallback.price > 0.0);
    assert!(fallback.confidence_score < good.confidence_score);
    assert!(fallback.weight_of(Factor::BlockchainData).is_none());
    assert!(fallback.weight_of(Factor::RecentMarketData).is_none());
    assert!((fallback.weight_sum() - 1.0).abs() < WEIGHT_EPSILON);
    assert!(fallback
        .warnings
        .iter()
        .any(|w| matches!(w, PricingWarning::ReasoningFallback(_))));
    assert!(fallback.explanation.contains("reasoning fallback"));
}

#[tokio::test]
async fn test_unconfident_opinion_still_beats_fallback() {
    let ok = setup_with(Some(StubReasoner::absolute(126_000.0, 0.1)), None);
    let failing = setup_with(Some(Arc::new(FailingReasoner)), None);

    let good = ok
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    let fallback = failing
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();

    assert!(good.reasoning_used);
    assert!(!fallback.reasoning_used);
    assert!(fallback.confidence_score < good.confidence_score);
}

#[tokio::test]
async fn test_reasoning_timeout_is_recoverable() {
    let mut settings = common::settings();
    settings.reasoning_timeout = std::time::Duration::from_millis(50);
    let app = RwaPricing::with_providers(settings, common::providers(Some(Arc::new(SlowReasoner)), None)).unwrap();

    let signal = app
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    assert!(!signal.reasoning_used);
    assert!(signal
        .warnings
        .iter()
        .any(|w| matches!(w, PricingWarning::ReasoningFallback(d) if d.contains("timed out"))));
}

#[tokio::test]
async fn test_chain_not_found_excludes_blockchain_factor() {
    let options = PricingOptions {
        use_llm: true,
        verify_on_chain: true,
        include_factors: false,
    };
    let register = |app: &RwaPricing| {
        let mut record = AssetRecord::new(
            "manhattan_property_token".into(),
            "Manhattan Property Token".into(),
            AssetCategory::RealEstate,
            "Fractional ownership of a Manhattan office building".into(),
        );
        record.contract_address = Some("0x1234567890abcdef1234567890abcdef12345678".into());
        record.token_id = Some(1);
        app.register_asset(record).unwrap();
    };

    let verified_app = setup_with(
        Some(StubReasoner::absolute(2_550_000.0, 0.8)),
        Some(StubVerifier::found()),
    );
    let missing_app = setup_with(
        Some(StubReasoner::absolute(2_550_000.0, 0.8)),
        Some(StubVerifier::not_found()),
    );
    register(&verified_app);
    register(&missing_app);

    let verified = verified_app
        .generate_price("manhattan_property_token", Some(2_500_000.0), &options)
        .await
        .unwrap();
    let missing = missing_app
        .generate_price("manhattan_property_token", Some(2_500_000.0), &options)
        .await
        .unwrap();

    assert!(verified.weight_of(Factor::BlockchainData).is_some());
    assert!(missing.weight_of(Factor::BlockchainData).is_none());
    assert!((missing.weight_sum() - 1.0).abs() < WEIGHT_EPSILON);
    assert!(missing.confidence_score < verified.confidence_score);
    assert!(missing
        .warnings
        .iter()
        .any(|w| matches!(w, PricingWarning::BlockchainUnavailable(_))));
}

#[tokio::test]
async fn test_verified_token_metadata_reaches_explanation() {
    let app = setup_with(None, Some(StubVerifier::found()));
    let mut record = AssetRecord::new(
        "bored_ape_1234".into(),
        "Bored Ape #1234".into(),
        AssetCategory::Nft,
        String::new(),
    );
    record.contract_address = Some("0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d".into());
    record.token_id = Some(1234);
    app.register_asset(record).unwrap();

    let options = PricingOptions {
        use_llm: false,
        verify_on_chain: true,
        include_factors: false,
    };
    let signal = app.generate_price("bored_ape_1234", Some(120_000.0), &options).await.unwrap();
    assert!(signal.weight_of(Factor::BlockchainData).is_some());
    assert!(signal.explanation.contains("BoredApeYachtClub (BAYC) token 1234"));
    assert!(signal.explanation.contains("on chain 1"));

    let hits = app.similar("Price signal for bored_ape_1234", 1).await.unwrap();
    assert!(hits[0].entry.document.contains("BAYC"));
}

#[tokio::test]
async fn test_verify_without_backend_is_not_fatal() {
    let app = setup();
    let options = PricingOptions {
        use_llm: false,
        verify_on_chain: true,
        include_factors: false,
    };
    let signal = app.generate_price("manhattan_property_token", Some(2_500_000.0), &options).await.unwrap();
    assert!(signal.weight_of(Factor::BlockchainData).is_none());
    assert!(signal.price > 0.0);
}

#[tokio::test]
async fn test_stale_snapshot_lowers_confidence_only() {
    let fresh_app = setup_with(Some(StubReasoner::absolute(121_000.0, 0.8)), None);
    let stale_app = setup_with(Some(StubReasoner::absolute(121_000.0, 0.8)), None);
    seed_sources(&fresh_app, Utc::now()).await;
    seed_sources(&stale_app, Utc::now() - Duration::hours(72)).await;

    let fresh = fresh_app
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    let stale = stale_app
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();

    assert_eq!(fresh.price, stale.price);
    assert_eq!(fresh.factors, stale.factors);
    assert!(stale.confidence_score < fresh.confidence_score);
    assert!(stale.warnings.iter().any(|w| matches!(w, PricingWarning::StaleData(_))));
    assert!(!fresh.warnings.iter().any(|w| matches!(w, PricingWarning::StaleData(_))));
}

#[tokio::test]
async fn test_signal_is_written_back_to_knowledge_base() {
    let app = setup();
    let before = app.knowledge_base().size();
    let signal = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    assert_eq!(app.knowledge_base().size(), before + 1);

    let hits = app.similar("Price signal for bored_ape_1234", 1).await.unwrap();
    assert_eq!(hits[0].entry.metadata_str("signal_id"), Some(signal.id.as_str()));
    assert_eq!(hits[0].entry.metadata_str("source"), Some("price_signal"));
}

#[tokio::test]
async fn test_each_request_creates_a_new_signal() {
    let app = setup();
    let a = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    let b = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    assert_ne!(a.id, b.id);
    assert!(b.generated_at >= a.generated_at);
}

#[tokio::test]
async fn test_include_factors_exposes_breakdown() {
    let app = setup_with(Some(StubReasoner::absolute(130_000.0, 0.9)), None);
    seed_sources(&app, Utc::now()).await;
    let options = PricingOptions {
        include_factors: true,
        ..PricingOptions::default()
    };
    let signal = app.generate_price("bored_ape_1234", Some(120_000.0), &options).await.unwrap();
    let breakdown = signal.breakdown.as_ref().unwrap();
    assert!(breakdown.iter().any(|c| c.factor == Factor::RecentMarketData));
    assert!(signal.explanation.contains("recent_market_data weight"));

    let plain = app
        .generate_price("bored_ape_1234", Some(120_000.0), &PricingOptions::default())
        .await
        .unwrap();
    assert!(plain.breakdown.is_none());
    assert!(!plain.explanation.contains("Factors:"));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let app = Arc::new(setup_with(Some(StubReasoner::absolute(101.0, 0.7)), None));
    seed_sources(&app, Utc::now()).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.generate_price(&format!("asset_{i}"), Some(100.0), &PricingOptions::default())
                .await
                .unwrap()
        }));
    }
    for h in handles {
        let signal = h.await.unwrap();
        assert!(signal.price > 0.0);
        assert!((signal.weight_sum() - 1.0).abs() < WEIGHT_EPSILON);
    }
    assert_eq!(app.stats().unwrap().assets, 8);
}

#[tokio::test]
async fn test_providers_from_default_settings_are_offline() {
    let providers = Providers::from_settings(&common::settings());
    assert!(providers.reasoner.is_none());
    assert!(providers.verifier.is_none());
    assert_eq!(providers.embedder.dimension(), common::DIMENSION);
}

#[tokio::test]
async fn test_embedding_outage_still_prices_and_records_evidence() {
    let providers = Providers {
        embedder: Arc::new(FailingEmbedder),
        reasoner: None,
        verifier: None,
    };
    let app = RwaPricing::with_providers(common::settings(), providers).unwrap();
    let is_embedding_warning = |w: &PricingWarning| matches!(w, PricingWarning::EmbeddingFallback(_));

    // Empty knowledge base: retrieval is skipped, only the evidence write degrades.
    let first = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    assert_eq!(first.price, 120_000.0);
    assert_eq!(first.warnings.iter().filter(|w| is_embedding_warning(w)).count(), 1);
    assert_eq!(app.knowledge_base().size(), 1);

    // Now retrieval has something to embed a query against and fails too.
    let second = app.generate_price("bored_ape_1234", Some(120_000.0), &no_llm()).await.unwrap();
    assert!(second.price > 0.0);
    assert_eq!(second.warnings.iter().filter(|w| is_embedding_warning(w)).count(), 2);
    assert!(second.explanation.contains("embedding"));
    assert_eq!(app.knowledge_base().size(), 2);
}
