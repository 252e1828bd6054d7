mod common;

use admatch::{
    AdmatchConfig, IngestError, MatchConfig, MatchDirection, PerceptualConfig, Pipeline,
    PipelineError,
};
use common::{MemoryFetcher, empty, pipeline, rising};
use serde_json::json;

#[tokio::test]
async fn invalid_json_is_fatal() {
    let err = pipeline(MemoryFetcher::new())
        .process_payload("{\"user_id\": ")
        .await
        .expect_err("truncated JSON");
    assert!(matches!(err, PipelineError::Ingest(IngestError::InvalidJson(_))));
}

#[tokio::test]
async fn missing_user_id_is_fatal() {
    let err = pipeline(MemoryFetcher::new())
        .process_payload(r#"{"ad_creative_images": [], "metaad_previews": []}"#)
        .await
        .expect_err("no user_id");
    match err {
        PipelineError::Ingest(IngestError::MalformedInput(msg)) => assert!(msg.contains("user_id")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn preview_without_url_is_fatal_even_if_other_users_are_fine() {
    let fetcher = MemoryFetcher::new().with("https://cdn/x.jpg", rising());
    let pipeline = pipeline(fetcher);
    let err = pipeline
        .process_value(json!([
            {"user_id": "ok", "metaad_previews": [{"id": "p", "url": "https://cdn/x.jpg"}]},
            {"user_id": "bad", "metaad_previews": [{"id": "p"}]}
        ]))
        .await
        .expect_err("malformed preview");

    assert!(matches!(err, PipelineError::Ingest(IngestError::MalformedInput(_))));
    // Parsing happens before any user is processed.
    assert_eq!(pipeline.fetcher().total_calls(), 0);
}

#[tokio::test]
async fn creative_without_id_is_fatal() {
    let err = pipeline(MemoryFetcher::new())
        .process_value(json!({
            "user_id": "u1",
            "ad_creative_images": [{"url": "https://cdn/c.jpg"}]
        }))
        .await
        .expect_err("creative without id");
    assert!(matches!(err, PipelineError::Ingest(IngestError::MalformedInput(_))));
}

#[tokio::test]
async fn scalar_payload_is_fatal() {
    let err = pipeline(MemoryFetcher::new())
        .process_payload("\"just a string\"")
        .await
        .expect_err("scalar payload");
    assert!(matches!(err, PipelineError::Ingest(IngestError::MalformedInput(_))));
}

#[tokio::test]
async fn empty_image_is_skipped_like_a_failed_download() {
    let fetcher = MemoryFetcher::new()
        .with("https://cdn/blank.jpg", empty())
        .with("https://cdn/c.jpg", rising())
        .with("https://cdn/p.jpg", rising());
    let out = pipeline(fetcher)
        .process_value(json!({
            "user_id": "u1",
            "ad_creative_images": [
                {"id": "blank", "url": "https://cdn/blank.jpg"},
                {"id": "c1", "url": "https://cdn/c.jpg"}
            ],
            "metaad_previews": [
                {"id": "p-blank", "url": "https://cdn/blank.jpg"},
                {"id": "p1", "url": "https://cdn/p.jpg"}
            ]
        }))
        .await
        .unwrap();

    let matches = &out[0].matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].target_id, json!("p1"));
    assert_eq!(matches[0].candidate_id, json!("c1"));
}

#[test]
fn invalid_hash_size_is_rejected_before_running() {
    let config = AdmatchConfig::default().with_perceptual(PerceptualConfig::new().with_hash_size(1));
    let err = Pipeline::new(MemoryFetcher::new(), &config).err().expect("invalid config");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn grouping_with_target_direction_is_rejected() {
    let config = AdmatchConfig::default().with_matcher(
        MatchConfig::default()
            .with_direction(MatchDirection::TargetsToCandidates)
            .with_group_variants(true),
    );
    assert!(Pipeline::new(MemoryFetcher::new(), &config).is_err());
}

#[test]
fn error_messages_are_human_readable() {
    let err = PipelineError::from(IngestError::InvalidJson("EOF while parsing".into()));
    assert_eq!(err.to_string(), "ingest failure: invalid JSON input: EOF while parsing");
}
