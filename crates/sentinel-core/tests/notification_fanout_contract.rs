//! Contract Test: Notification Fan-out
//!
//! Verifies the notifier's eligibility rules and failure isolation:
//! - A channel fires only if enabled, subscribed, and credentialed
//! - One channel's failure never blocks a sibling
//! - Test deliveries never mutate stored configuration

mod common;

use common::*;
use sentinel_core::{ChannelCredentials, NotificationConfig, EVENT_IP_CHANGE};
use tempfile::tempdir;

#[tokio::test]
async fn disabled_channels_deliver_nothing() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;

    let delivered = notifier.notify(EVENT_IP_CHANGE, "title", "body").await;

    assert!(!delivered);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn only_enabled_subscribed_channel_fires() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;
    enable_channel(&notifier, "pushover").await;

    let delivered = notifier.notify(EVENT_IP_CHANGE, "title", "body").await;
    assert!(delivered);

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].channel, "pushover");
}

#[tokio::test]
async fn unsubscribed_event_is_skipped() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;
    notifier
        .configure_pushover(
            true,
            "user-key".to_string(),
            "api-token".to_string(),
            vec!["some_other_event".to_string()],
        )
        .await
        .unwrap();

    let delivered = notifier.notify(EVENT_IP_CHANGE, "title", "body").await;

    assert!(!delivered);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_credentials_never_dispatch() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;

    // Enabled and subscribed, but no webhook URL
    notifier
        .configure_discord(true, String::new(), vec![EVENT_IP_CHANGE.to_string()])
        .await
        .unwrap();

    let delivered = notifier.notify(EVENT_IP_CHANGE, "title", "body").await;

    assert!(!delivered);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failing_channel_does_not_block_sibling() {
    let dir = tempdir().unwrap();
    let (registry, log) = registry_with_failing_discord();
    let notifier = notifier_in(dir.path(), registry).await;
    enable_channel(&notifier, "discord").await;
    enable_channel(&notifier, "pushover").await;

    let delivered = notifier.notify(EVENT_IP_CHANGE, "title", "body").await;

    // Discord failed but Pushover got through
    assert!(delivered);
    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].channel, "pushover");
}

#[tokio::test]
async fn ip_change_event_carries_the_address() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;
    enable_channel(&notifier, "discord").await;

    let delivered = notifier.notify_ip_change("3.3.3.3".parse().unwrap()).await;
    assert!(delivered);

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries[0].title, "IP Address Changed");
    assert!(deliveries[0].body.contains("3.3.3.3"));
}

#[tokio::test]
async fn test_delivery_with_adhoc_credentials_does_not_persist() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;

    let delivered = notifier
        .test_channel(
            "discord",
            Some(ChannelCredentials::Discord {
                webhook_url: "https://discord.example/adhoc".to_string(),
            }),
        )
        .await;

    assert!(delivered);
    assert_eq!(log.lock().unwrap().len(), 1);

    // Stored configuration is untouched: still all-default, no file written
    assert_eq!(notifier.config().await, NotificationConfig::default());
    assert!(!dir.path().join("notifications.json").exists());
}

#[tokio::test]
async fn test_delivery_falls_back_to_stored_credentials() {
    let dir = tempdir().unwrap();
    let (registry, log) = recording_registry();
    let notifier = notifier_in(dir.path(), registry).await;
    enable_channel(&notifier, "pushover").await;

    assert!(notifier.test_channel("pushover", None).await);
    assert_eq!(log.lock().unwrap().len(), 1);

    // No stored credentials and no override: nothing to deliver with
    assert!(!notifier.test_channel("discord", None).await);
}
