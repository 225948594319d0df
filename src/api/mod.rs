//! HTTP layer - axum router, shared state and request identity.
//!
//! Handlers are thin: they resolve the caller, delegate to [`crate::core`], and shape
//! the JSON response. Errors convert into responses through `IntoResponse` for
//! [`crate::errors::Error`].

/// Identity resolution and the `CurrentUser` extractor
pub mod auth;
/// `/emis` handlers
pub mod emis;
/// Error to HTTP response mapping
pub mod error;
/// `/expenses` handlers
pub mod expenses;
/// JSON response shapes
pub mod views;

use crate::errors::Result;
use auth::IdentityResolver;
use axum::{
    Router,
    http::Method,
    routing::get,
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Shared data available to all handlers.
/// Holds the database pool and the identity resolver; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub db: DatabaseConnection,
    /// Resolves request headers to a user id
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// Creates a new `AppState` from an established connection and a resolver.
    #[must_use]
    pub fn new(db: DatabaseConnection, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { db, identity }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/emis", get(emis::list_emis).post(emis::create_emi))
        .route(
            "/emis/:id",
            get(emis::get_emi)
                .patch(emis::update_emi)
                .delete(emis::delete_emi),
        )
        .route("/emis/:id/progress", get(emis::emi_progress))
        .route(
            "/expenses",
            get(expenses::get_month).post(expenses::create_expense),
        )
        .route(
            "/expenses/:id",
            get(expenses::get_expense)
                .patch(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serves the router on `listener` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!("Server running on {address}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use auth::HeaderIdentity;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let db = setup_test_db().await.unwrap();
        let identity = HeaderIdentity::new("x-user-id").unwrap();
        router(AppState::new(db, Arc::new(identity)))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn car_loan() -> Value {
        json!({
            "title": "Car Loan",
            "amount": 500.0,
            "startDate": "2020-01-01",
            "endDate": "2020-12-31",
            "dayOfMonth": 31
        })
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = test_app().await;
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/emis")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().contains_key("access-control-allow-methods"));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/emis", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized - Invalid token");

        let (status, _) = send(&app, "GET", "/expenses?month=1&year=2020", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_emi_lifecycle() {
        let app = test_app().await;

        let (status, body) = send(&app, "POST", "/emis", Some(TEST_USER), Some(car_loan())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["emi"]["title"], "Car Loan");
        assert_eq!(body["emi"]["dayOfMonth"], 31);
        assert_eq!(body["emi"]["isActive"], true);
        let id = body["emi"]["id"].as_i64().unwrap();

        let (status, body) = send(&app, "GET", "/emis", Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emis"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/emis/{id}"),
            Some(TEST_USER),
            Some(json!({ "amount": 450.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emi"]["amount"], 450.0);
        assert_eq!(body["emi"]["startDate"], "2020-01-01");

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/emis/{id}"),
            Some(TEST_USER),
            Some(json!({ "endDate": "2019-06-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("End date must be after start date"));

        let (status, body) = send(
            &app,
            "GET",
            &format!("/emis/{id}/progress"),
            Some(TEST_USER),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalInstallments"], 12);
        assert_eq!(body["installmentsPaid"], 12);

        let (status, body) =
            send(&app, "DELETE", &format!("/emis/{id}"), Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);

        let (status, _) = send(&app, "GET", &format!("/emis/{id}"), Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_emi_validation_error() {
        let app = test_app().await;
        let mut payload = car_loan();
        payload["dayOfMonth"] = json!(0);

        let (status, body) = send(&app, "POST", "/emis", Some(TEST_USER), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Day of month"));
    }

    #[tokio::test]
    async fn test_other_user_gets_not_found() {
        let app = test_app().await;
        let (_, body) = send(&app, "POST", "/emis", Some(TEST_USER), Some(car_loan())).await;
        let id = body["emi"]["id"].as_i64().unwrap();

        for method in ["GET", "DELETE"] {
            let (status, body) =
                send(&app, method, &format!("/emis/{id}"), Some(OTHER_USER), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "EMI not found");
        }

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/emis/{id}"),
            Some(OTHER_USER),
            Some(json!({ "isActive": false })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_month_listing_materializes_emis() {
        let app = test_app().await;
        send(&app, "POST", "/emis", Some(TEST_USER), Some(car_loan())).await;
        let (status, _) = send(
            &app,
            "POST",
            "/expenses",
            Some(TEST_USER),
            Some(json!({
                "title": "Groceries",
                "amount": 100.0,
                "category": "Food",
                "date": "2020-02-03"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) =
            send(&app, "GET", "/expenses?month=2&year=2020", Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["month"], 2);
        assert_eq!(body["year"], 2020);
        assert_eq!(body["totalExpenses"], 2);
        assert_eq!(body["totalAmount"], 600.0);
        assert_eq!(body["dailyTotals"]["29"], 500.0);
        let generated = &body["expensesByDate"]["2020-02-29"][0];
        assert_eq!(generated["title"], "Car Loan (EMI)");
        assert_eq!(generated["isEmi"], true);
        assert_eq!(generated["category"], "EMI");

        // Reloading never duplicates the generated expense
        let (_, body) =
            send(&app, "GET", "/expenses?month=2&year=2020", Some(TEST_USER), None).await;
        assert_eq!(body["totalExpenses"], 2);
    }

    #[tokio::test]
    async fn test_invalid_month_rejected() {
        let app = test_app().await;

        let (status, body) =
            send(&app, "GET", "/expenses?month=13&year=2024", Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Month must be between 1 and 12"));
    }

    #[tokio::test]
    async fn test_expense_update_and_delete() {
        let app = test_app().await;
        let (_, body) = send(
            &app,
            "POST",
            "/expenses",
            Some(TEST_USER),
            Some(json!({ "title": "Taxi", "amount": 30.0, "category": "Travel" })),
        )
        .await;
        let id = body["expense"]["id"].as_i64().unwrap();
        assert_eq!(body["expense"]["isEmi"], false);

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/expenses/{id}"),
            Some(TEST_USER),
            Some(json!({ "amount": -5.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Amount must be a positive number"));

        let (status, body) = send(
            &app,
            "PATCH",
            &format!("/expenses/{id}"),
            Some(TEST_USER),
            Some(json!({ "category": "Transport" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expense"]["category"], "Transport");

        let (status, _) =
            send(&app, "DELETE", &format!("/expenses/{id}"), Some(OTHER_USER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, "DELETE", &format!("/expenses/{id}"), Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send(&app, "GET", &format!("/expenses/{id}"), Some(TEST_USER), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
