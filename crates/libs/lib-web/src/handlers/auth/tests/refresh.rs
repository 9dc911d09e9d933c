//! # Refresh Tests

use super::*;

async fn refresh(app: &TestApp, token: &str) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/api/auth/refresh",
        None,
        Some(json!({ "refresh_token": token })),
    )
    .await
}

#[tokio::test]
async fn test_refresh_returns_working_pair() {
    let app = TestApp::new().await;
    let tokens = app.sign_in("alice@example.com").await;

    let (status, body) = refresh(&app, &tokens.refresh_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let access = body["access_token"].as_str().unwrap();
    let (status, me) = app
        .request(Method::GET, "/api/auth/me", Some(access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::new().await;
    let tokens = app.sign_in("alice@example.com").await;

    let (status, body) = refresh(&app, &tokens.access_token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Could not validate credentials");
}

#[tokio::test]
async fn test_refresh_rejects_garbage() {
    let app = TestApp::new().await;

    let (status, _) = refresh(&app, "not.a.jwt").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
