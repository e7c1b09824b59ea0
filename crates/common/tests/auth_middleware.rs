//! Integration tests for the authentication middleware and HTTP auth client.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use common::{
    ApiResponse, AuthenticatedUser, Authenticator, CurrentUser, HttpAuthenticator, UserId,
    require_auth,
};
use tower::ServiceExt;

fn alice() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId::new(7),
        email: "alice@example.com".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Reader".to_string(),
        is_verified: true,
        is_superuser: false,
    }
}

/// Serves a stand-in for the user service's introspection route and
/// returns its `/user/` prefix.
async fn spawn_introspection_server() -> String {
    async fn introspect(Path(token): Path<String>) -> axum::response::Response {
        match token.as_str() {
            "valid-token" => {
                ApiResponse::success("Authorization successful", alice()).into_response()
            }
            "no-data" => ApiResponse::message("Authorization successful").into_response(),
            "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    let app = Router::new().route("/user/{token}", get(introspect));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/user/")
}

async fn protected_app() -> Router {
    let endpoint = spawn_introspection_server().await;
    let authenticator: Arc<dyn Authenticator> =
        Arc::new(HttpAuthenticator::new(reqwest::Client::new(), endpoint));

    async fn whoami(CurrentUser(auth): CurrentUser) -> String {
        format!("{}:{}", auth.user.email, auth.token)
    }

    Router::new()
        .route("/whoami", get(whoami))
        .layer(axum::middleware::from_fn_with_state(
            authenticator,
            require_auth,
        ))
}

async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_valid_bearer_token_reaches_handler() {
    let app = protected_app().await;

    let (status, body) = call(app, Some("Bearer valid-token")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "alice@example.com:valid-token");
}

#[tokio::test]
async fn test_bare_token_is_accepted() {
    let app = protected_app().await;

    let (status, _) = call(app, Some("valid-token")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let app = protected_app().await;

    let (status, body) = call(app, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["detail"], "Authorization token missing");
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let app = protected_app().await;

    let (status, _) = call(app, Some("Bearer forged")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_user_data_is_unauthorized() {
    let app = protected_app().await;

    let (status, _) = call(app, Some("Bearer no-data")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_service_failure_is_internal_error() {
    let app = protected_app().await;

    let (status, _) = call(app, Some("Bearer boom")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unreachable_auth_service_is_internal_error() {
    // Port 9 (discard) on localhost is not listening in test environments.
    let authenticator = HttpAuthenticator::new(reqwest::Client::new(), "http://127.0.0.1:9/user/");

    let result = authenticator.authenticate("anything").await;

    assert!(matches!(result, Err(common::AuthError::Unavailable(_))));
}
