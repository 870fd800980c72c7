use transync_telemetry::init_test_tracing;

use crate::support::test_app::spawn_test_app;

mod support;

#[tokio::test(flavor = "multi_thread")]
async fn health_check_returns_200() {
    init_test_tracing();
    // Arrange
    let app = spawn_test_app().await;

    // Act
    let response = app.health_check().await;

    // Assert
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}
