//! Full checkout flow across real user, book and cart routers.
//!
//! The user and book services are served on ephemeral ports so the cart
//! service talks to them over HTTP exactly as it does in production.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use book_service::InMemoryBookStore;
use cart_service::{HttpBookCatalog, InMemoryCartStore};
use common::{Authenticator, HttpAuthenticator};
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use user_service::{AppState as UserState, InMemoryUserStore, PasswordHasher, TokenService};

const SUPERUSER_KEY: &str = "e2e-superuser-key";
const PASSWORD: &str = "Str0ng#pass";

struct Services {
    client: reqwest::Client,
    user_url: String,
    book_url: String,
    cart: Router,
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start() -> Services {
    let handle = common::telemetry::metrics_handle();
    let client = reqwest::Client::new();

    let user_state = Arc::new(UserState {
        store: InMemoryUserStore::new(),
        tokens: TokenService::new(
            SecretString::from("e2e-secret"),
            Algorithm::HS256,
            chrono::Duration::minutes(30),
            chrono::Duration::days(7),
        ),
        hasher: PasswordHasher::new(4 /* bcrypt minimum cost; bcrypt::MIN_COST is private */),
        superuser_key: SecretString::from(SUPERUSER_KEY),
        public_url: "http://127.0.0.1".to_string(),
    });
    let user_url = spawn(user_service::create_app(user_state, handle.clone())).await;

    let authenticator: Arc<dyn Authenticator> = Arc::new(HttpAuthenticator::new(
        client.clone(),
        format!("{user_url}/user/"),
    ));

    let book_url = spawn(book_service::create_app(
        book_service::create_state(InMemoryBookStore::new()),
        authenticator.clone(),
        handle.clone(),
    ))
    .await;

    let catalog = HttpBookCatalog::new(client.clone(), format!("{book_url}/books/"));
    let cart = cart_service::create_app(
        cart_service::create_state(InMemoryCartStore::new(), catalog),
        authenticator,
        handle,
    );

    Services {
        client,
        user_url,
        book_url,
        cart,
    }
}

impl Services {
    async fn register(&self, email: &str, superuser: bool) -> String {
        let mut url = format!("{}/register", self.user_url);
        if superuser {
            url.push_str(&format!("?superuser_key={SUPERUSER_KEY}"));
        }
        let response = self
            .client
            .post(url)
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "first_name": "Ada",
                "last_name": "Lovelace",
                "is_superuser": superuser
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let json: Value = response.json().await.unwrap();
        json["access_token"].as_str().unwrap().to_string()
    }

    async fn create_book(&self, token: &str, name: &str, price: i64, stock: i32) -> i64 {
        let response = self
            .client
            .post(format!("{}/books/", self.book_url))
            .bearer_auth(token)
            .json(&json!({ "name": name, "author": "Ursula K. Le Guin", "price": price, "stock": stock }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let json: Value = response.json().await.unwrap();
        json["data"]["id"].as_i64().unwrap()
    }

    async fn stock(&self, token: &str, id: i64) -> i64 {
        let json: Value = self
            .client
            .get(format!("{}/books/{id}", self.book_url))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        json["data"]["stock"].as_i64().unwrap()
    }

    async fn cart(&self, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"));
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.cart.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_order_placement_and_cancellation_move_stock() {
    let services = start().await;
    let admin = services.register("admin@example.com", true).await;
    let reader = services.register("reader@example.com", false).await;

    let earthsea = services.create_book(&admin, "A Wizard of Earthsea", 1200, 4).await;
    let dispossessed = services.create_book(&admin, "The Dispossessed", 1500, 2).await;

    let (status, json) = services
        .cart("POST", "/cart/items/", &reader, Some(json!({ "book_id": earthsea, "quantity": 3 })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["data"]["price"], 3600);

    let (status, _) = services
        .cart("POST", "/cart/items/", &reader, Some(json!({ "book_id": dispossessed, "quantity": 2 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = services.cart("PATCH", "/cart/place-order", &reader, None).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["data"]["total_price"], 6600);
    assert_eq!(services.stock(&reader, earthsea).await, 1);
    assert_eq!(services.stock(&reader, dispossessed).await, 0);

    let (status, json) = services.cart("DELETE", "/cancel-order/", &reader, None).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(services.stock(&reader, earthsea).await, 4);
    assert_eq!(services.stock(&reader, dispossessed).await, 2);

    let (status, _) = services.cart("GET", "/order-details", &reader, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_rejects_unknown_books_and_tokens() {
    let services = start().await;
    let reader = services.register("reader@example.com", false).await;

    let (status, json) = services
        .cart("POST", "/cart/items/", &reader, Some(json!({ "book_id": 404, "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Book with ID 404 not found");

    let (status, _) = services.cart("GET", "/cart/", "not-a-token", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
