//! # Cache Tests
//!
//! Read-through caching and invalidation on every write.

use super::*;

#[tokio::test]
async fn test_second_list_is_cached_until_a_write() {
    let app = TestApp::new().await;
    let token = app.sign_in("alice@example.com").await.access_token;
    let wire = app.create_wire(&token, "Alice", "1.00").await;

    let (_, first) = app.request(Method::GET, "/api/wires", Some(&token), None).await;
    let (_, second) = app.request(Method::GET, "/api/wires", Some(&token), None).await;
    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(first["wires"], second["wires"]);

    // Different page parameters are cached separately
    let (_, other) = app
        .request(Method::GET, "/api/wires?page_size=5", Some(&token), None)
        .await;
    assert_eq!(other["cached"], false);

    app.request(
        Method::PUT,
        &wire_uri(&wire["id"]),
        Some(&token),
        Some(json!({ "status": "processing" })),
    )
    .await;

    let (_, after) = app.request(Method::GET, "/api/wires", Some(&token), None).await;
    assert_eq!(after["cached"], false);
    assert_eq!(after["wires"][0]["status"], "processing");
}

#[tokio::test]
async fn test_writes_clear_user_keys() {
    let app = TestApp::new().await;
    let token = app.sign_in("alice@example.com").await.access_token;

    let wire = app.create_wire(&token, "Alice", "1.00").await;
    let uri = wire_uri(&wire["id"]);
    app.request(Method::GET, "/api/wires", Some(&token), None).await;
    app.request(Method::GET, &uri, Some(&token), None).await;
    assert!(app.store.keys().await.iter().any(|k| k.starts_with("wires:user:")));
    assert!(app.store.keys().await.iter().any(|k| k.starts_with("wire:")));

    app.create_wire(&token, "Alice", "2.00").await;
    assert!(!app.store.keys().await.iter().any(|k| k.starts_with("wires:user:")));

    app.request(Method::GET, "/api/wires", Some(&token), None).await;
    app.request(Method::DELETE, &uri, Some(&token), None).await;
    let keys = app.store.keys().await;
    assert!(!keys.iter().any(|k| k.starts_with("wires:user:")));
    assert!(!keys.iter().any(|k| k.starts_with("wire:")));

    let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cached_wire_is_not_served_to_other_users() {
    let app = TestApp::new().await;
    let alice = app.sign_in("alice@example.com").await.access_token;
    let mallory = app.sign_in("mallory@example.com").await.access_token;
    let wire = app.create_wire(&alice, "Alice", "1.00").await;
    let uri = wire_uri(&wire["id"]);

    let (status, _) = app.request(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
