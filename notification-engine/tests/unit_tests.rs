use std::sync::Arc;

use campus_fcm_shared::{filter_plausible, FcmClient, Transport};
/// Unit tests for notification-engine core functionality
///
/// This test module covers:
/// - Category and payload serialization
/// - Preference eligibility rules
/// - The validate-then-chunk pipeline
/// - Report shapes for logging
use notification_engine::models::*;
use notification_engine::services::BatchDispatcher;
use notification_engine::DispatchConfig;
use uuid::Uuid;

#[test]
fn test_category_serialization() {
    let categories = vec![
        NotificationCategory::Post,
        NotificationCategory::Notes,
        NotificationCategory::Announcement,
        NotificationCategory::Connection,
        NotificationCategory::Schedule,
    ];

    for category in categories {
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, format!("\"{}\"", category.as_str()));
        let deserialized: NotificationCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(category, deserialized);
    }
}

#[test]
fn test_preference_round_trip() {
    let prefs = NotificationPreference::default_for(Uuid::new_v4());
    let json = serde_json::to_string(&prefs).unwrap();
    let back: NotificationPreference = serde_json::from_str(&json).unwrap();

    assert_eq!(back.user_id, prefs.user_id);
    assert!(back.enabled);
    assert!(back.schedule_enabled);
}

#[test]
fn test_push_message_deserializes_without_data() {
    let message: PushMessage =
        serde_json::from_str(r#"{"title": "New post", "body": "Photosynthesis recap"}"#).unwrap();
    assert_eq!(message.title, "New post");
    assert!(message.data.is_empty());
}

#[test]
fn test_validate_then_chunk_pipeline() {
    // 25 tokens, 2 of them malformed.
    let mut tokens: Vec<String> = (0..23)
        .map(|i| format!("APA91bGhtyRfDdkkkaaaabbbb-{i:03}"))
        .collect();
    tokens.insert(3, "bad".to_string());
    tokens.insert(11, "also not a plausible token!!".to_string());
    assert_eq!(tokens.len(), 25);

    let valid = filter_plausible(tokens);
    assert_eq!(valid.len(), 23);
    assert!(valid.iter().all(|t| t.len() >= 20));

    let dispatcher = BatchDispatcher::new(
        Arc::new(FcmClient::new(Transport::Unconfigured).unwrap()),
        &DispatchConfig::default(),
    );
    let chunks = dispatcher.chunk(&valid);
    assert_eq!(
        chunks.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![10, 10, 3]
    );
    assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), valid.len());
}

#[test]
fn test_dispatch_report_serializes_for_logging() {
    let report = DispatchReport {
        success: true,
        error: None,
        original_tokens: 25,
        valid_tokens: 23,
        total_sent: 22,
        total_failed: 1,
        cleaned_tokens: 1,
        chunks: vec![ChunkOutcome {
            index: 0,
            size: 10,
            sent: 9,
            failed: 1,
            error: None,
            invalid_tokens: vec!["APA91bGhtyRfDdkkkaaaabbbb-002".to_string()],
        }],
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["valid_tokens"], 23);
    assert_eq!(value["chunks"][0]["invalid_tokens"][0], "APA91bGhtyRfDdkkkaaaabbbb-002");
}

#[test]
fn test_topic_report_carries_error_in_value() {
    let report = TopicReport {
        success: false,
        message_id: None,
        error: Some("no usable FCM transport is configured".to_string()),
    };
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().unwrap().contains("transport"));
}
