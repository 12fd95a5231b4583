//! Detection and classification together, with the capability in various states

use std::sync::Arc;
use std::time::Duration;
use triage_classifier::{ClassificationMethod, ClassifierConfig, FormatDetector, IntentClassifier};
use triage_domain::{Format, Intent, LanguageCapability, RawInput, StageMarker};
use triage_llm::prompt::PromptBuilder;
use triage_llm::{BoundedCapability, MockProvider, PromptedCapability};

fn classifier_over(provider: MockProvider, limit: Duration) -> IntentClassifier {
    let prompted: Arc<dyn LanguageCapability> =
        Arc::new(PromptedCapability::new(provider, PromptBuilder::default()));
    let bounded = BoundedCapability::new(prompted, limit);
    IntentClassifier::new(Arc::new(bounded), ClassifierConfig::default())
}

#[tokio::test]
async fn test_json_order_classified_by_capability() {
    let input = RawInput::from(r#"{"order_id": "PO-1", "customer": "Acme", "items": []}"#);
    let detection = FormatDetector::new().detect(&input);
    assert_eq!(detection.format, Format::Json);

    let classifier = classifier_over(
        MockProvider::new(r#"{"intent": "Order", "confidence": 0.88}"#),
        Duration::from_secs(5),
    );
    let c = classifier.classify(detection.format, &input.text_lossy()).await;
    assert_eq!(c.intent, Intent::Order);
    assert_eq!(c.method, ClassificationMethod::Capability);
}

#[tokio::test]
async fn test_unavailable_provider_degrades() {
    let classifier = classifier_over(MockProvider::unavailable(), Duration::from_secs(5));
    let c = classifier
        .classify(Format::Email, "Subject: pricing\n\nCould you send a quotation?")
        .await;
    assert_eq!(c.intent, Intent::Rfq);
    assert!(c.confidence <= 0.6);
    assert!(c.fallback_used);
    assert!(c.markers.contains(&StageMarker::FallbackUsed));
}

#[tokio::test]
async fn test_slow_provider_times_out_into_fallback() {
    let provider = MockProvider::new(r#"{"intent": "Invoice", "confidence": 0.99}"#)
        .with_delay(Duration::from_millis(500));
    let classifier = classifier_over(provider.clone(), Duration::from_millis(50));

    let c = classifier.classify(Format::Pdf, "compliance policy update").await;
    assert_eq!(c.intent, Intent::Regulation);
    assert!(c.fallback_used);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_fenced_response_accepted() {
    let classifier = classifier_over(
        MockProvider::new("```json\n{\"intent\": \"general inquiry\", \"confidence\": \"0.7\"}\n```"),
        Duration::from_secs(5),
    );
    let c = classifier.classify(Format::Email, "hello").await;
    assert_eq!(c.intent, Intent::GeneralInquiry);
    assert_eq!(c.confidence, 0.7);
    assert!(!c.fallback_used);
}
