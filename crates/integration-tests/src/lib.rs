//! Integration tests for Cellarbook.
//!
//! Each test spawns the full application (router, sessions, middleware) on
//! an ephemeral port against a private in-memory SQLite database and talks
//! to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cellarbook-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, Response, redirect::Policy};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use cellarbook_web::{AppConfig, AppState, db};

/// A running application instance.
pub struct TestServer {
    base_url: String,
    pool: SqlitePool,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the application on `127.0.0.1` with a fresh database.
    pub async fn spawn() -> Self {
        let config = AppConfig::local("sqlite::memory:");
        let pool = db::create_pool(&config.database_url)
            .await
            .expect("Failed to create database pool");
        db::init_schema(&pool)
            .await
            .expect("Failed to initialize schema");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Listener has no address");

        let app = cellarbook_web::app(AppState::new(config, pool.clone()));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            pool,
            handle,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The database behind the server, for asserting on stored state.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A browser-like client with its own cookie jar that does not follow redirects.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Register an account.
    pub async fn register(
        &self,
        client: &Client,
        username: &str,
        email: &str,
        password: &str,
    ) -> Response {
        self.post(
            client,
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
            ],
        )
        .await
    }

    /// Log in with username and password.
    pub async fn login(&self, client: &Client, username: &str, password: &str) -> Response {
        self.post(
            client,
            "/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// A new client that is registered and logged in as `username`.
    pub async fn logged_in_client(&self, username: &str) -> Client {
        let client = Self::client();
        let email = format!("{username}@example.com");
        assert_redirect(&self.register(&client, username, &email, "pw123").await, "/login");
        assert_redirect(&self.login(&client, username, "pw123").await, "/products");
        client
    }

    /// Follow a redirect by hand and return the body of the target page.
    pub async fn follow(&self, client: &Client, response: &Response) -> String {
        let target = location(response).to_owned();
        self.get(client, &target)
            .await
            .text()
            .await
            .expect("Failed to read body")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Assert a 303 See Other to `expected`.
pub fn assert_redirect(response: &Response, expected: &str) {
    assert_eq!(
        response.status(),
        reqwest::StatusCode::SEE_OTHER,
        "expected redirect to {expected} from {}",
        response.url()
    );
    assert_eq!(location(response), expected);
}

/// Form fields for a product.
#[must_use]
pub fn product_form<'a>(
    name: &'a str,
    quantity: &'a str,
    price: &'a str,
) -> [(&'static str, &'a str); 7] {
    [
        ("name", name),
        ("category", "Spirits"),
        ("type", name),
        ("volume", "0.7"),
        ("strength", "40.0"),
        ("quantity", quantity),
        ("price", price),
    ]
}
