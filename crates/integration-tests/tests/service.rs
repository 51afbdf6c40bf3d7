//! Health checks, landing page and response headers.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use cellarbook_integration_tests::TestServer;

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::spawn().await;
    let client = TestServer::client();

    let resp = server.get(&client, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = server.get(&client, "/health/ready").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_landing_page_differs_for_guests_and_users() {
    let server = TestServer::spawn().await;

    let guest = server
        .get(&TestServer::client(), "/")
        .await
        .text()
        .await
        .unwrap();
    assert!(guest.contains(r#"href="/register""#));
    assert!(!guest.contains("Go to your products"));

    let client = server.logged_in_client("alice").await;
    let user = server.get(&client, "/").await.text().await.unwrap();
    assert!(user.contains("Go to your products"));
    assert!(user.contains(r#"href="/logout""#));
}

#[tokio::test]
async fn test_security_headers() {
    let server = TestServer::spawn().await;
    let resp = server.get(&TestServer::client(), "/").await;
    let headers = resp.headers();

    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
    assert!(
        headers["content-security-policy"]
            .to_str()
            .unwrap()
            .contains("frame-ancestors 'none'")
    );
}

#[tokio::test]
async fn test_request_id_is_generated_or_echoed() {
    let server = TestServer::spawn().await;
    let client = TestServer::client();

    let resp = server.get(&client, "/health").await;
    let generated = resp.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let resp = client
        .get(server.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "req-42");
}
