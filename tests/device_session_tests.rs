//! Tests for the Comware device session over a mock connection

mod common;

use std::sync::Arc;

use common::MockConnection;
use comware_push::connection::{CommandResult, ConnectionError, HostConfig};
use comware_push::modules::network::{ComwareDevice, DeviceSession};

fn device(connection: &Arc<MockConnection>) -> ComwareDevice {
    let host = HostConfig::new()
        .hostname("10.0.0.1")
        .user("admin")
        .password("secret");
    ComwareDevice::with_connection(host, connection.clone())
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_config_batch_is_wrapped_in_system_view() {
    let connection = Arc::new(MockConnection::new("admin@10.0.0.1:22"));
    let device = device(&connection);

    device.open().await.unwrap();
    device
        .cli_config(&lines(&["undo vsi blue", "vsi red"]))
        .await
        .unwrap();

    assert_eq!(
        connection.scripts(),
        vec!["screen-length disable\nsystem-view\nundo vsi blue\nvsi red\nreturn\nquit"]
    );
}

#[tokio::test]
async fn test_display_batch_stays_in_user_view() {
    let connection = Arc::new(MockConnection::new("admin@10.0.0.1:22"));
    connection.set_output("H3C Comware Software, Version 7.1.070");
    let device = device(&connection);

    device.open().await.unwrap();
    let response = device
        .cli_display(&lines(&["display version"]))
        .await
        .unwrap();

    assert_eq!(response, "H3C Comware Software, Version 7.1.070");
    assert_eq!(
        connection.scripts(),
        vec!["screen-length disable\ndisplay version\nquit"]
    );
}

#[tokio::test]
async fn test_percent_line_is_a_rejection() {
    let connection = Arc::new(MockConnection::new("sw1"));
    connection.set_output(
        "[sw1]vsi blue\n % Unrecognized command found at '^' position.\n[sw1]return",
    );
    let device = device(&connection);

    let err = device
        .cli_config(&lines(&["vsi blue"]))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectionError::ExecutionFailed(_)));
    assert!(err.to_string().contains("% Unrecognized command"));
}

#[tokio::test]
async fn test_non_zero_exit_is_a_failure() {
    let connection = Arc::new(MockConnection::new("sw1"));
    connection.set_result(CommandResult::failure(
        255,
        String::new(),
        "channel closed".to_string(),
    ));
    let device = device(&connection);

    let err = device.cli_display(&lines(&["display version"])).await.unwrap_err();
    assert!(err.to_string().contains("255"));
}

#[tokio::test]
async fn test_close_releases_connection() {
    let connection = Arc::new(MockConnection::new("sw1"));
    let device = device(&connection);

    device.close().await.unwrap();
    assert_eq!(connection.close_count(), 1);

    // second close is a no-op
    device.close().await.unwrap();
    assert_eq!(connection.close_count(), 1);

    let err = device.cli_config(&lines(&["vsi red"])).await.unwrap_err();
    assert!(matches!(err, ConnectionError::ConnectionClosed));
}

#[test]
fn test_identifier_comes_from_connection() {
    let connection = Arc::new(MockConnection::new("admin@sw1:22"));
    assert_eq!(device(&connection).identifier(), "admin@sw1:22");
}
