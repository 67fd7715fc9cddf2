use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{Mailer, auth, buckets, categories, dashboard, goals, transactions, users, wallets};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
}

/// Basic auth against the users table. The verified account is inserted
/// into the request extensions for the handlers.
async fn require_user(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let email = auth_header.username().trim().to_lowercase();
    let user = engine::users::Entity::find()
        .filter(engine::users::Column::Email.eq(email))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let Some(hashed) = user.hashed_password.as_deref() else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let valid = bcrypt::verify(auth_header.password(), hashed)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    if !valid || !user.is_active {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/resend-code", post(auth::resend_verification))
        .route(
            "/users/me",
            get(users::me).patch(users::update).delete(users::remove),
        )
        .route("/wallets", get(wallets::list).post(wallets::create))
        .route(
            "/wallets/transfer",
            post(transactions::transfer_between_wallets),
        )
        .route(
            "/wallets/{id}",
            get(wallets::get).patch(wallets::update).delete(wallets::remove),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::get)
                .patch(categories::rename)
                .delete(categories::remove),
        )
        .route("/goals", get(goals::list).post(goals::create))
        .route(
            "/goals/{id}",
            get(goals::get).patch(goals::update).delete(goals::remove),
        )
        .route("/goals/{id}/assign", post(transactions::assign_to_goal))
        .route("/incomes", get(buckets::income_list).post(buckets::income_create))
        .route(
            "/incomes/{id}",
            get(buckets::income_get)
                .patch(buckets::income_update)
                .delete(buckets::income_remove),
        )
        .route("/incomes/{id}/assign", post(transactions::assign_income))
        .route(
            "/expenses",
            get(buckets::expense_list).post(buckets::expense_create),
        )
        .route(
            "/expenses/{id}",
            get(buckets::expense_get)
                .patch(buckets::expense_update)
                .delete(buckets::expense_remove),
        )
        .route(
            "/expenses/{id}/assign",
            post(transactions::assign_to_expense),
        )
        .route("/transactions", get(transactions::list))
        .route("/transactions/{id}", get(transactions::get))
        .route("/dashboard", get(dashboard::get))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google_sign_in))
        .route("/auth/apple", post(auth::apple_sign_in))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .merge(protected)
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, mailer: Arc<dyn Mailer>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, mailer, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        mailer,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, mailer, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::LogMailer;

    const EMAIL: &str = "alice@example.com";
    const PASSWORD: &str = "correct-horse";

    async fn app() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = engine::Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
            mailer: Arc::new(LogMailer),
        })
    }

    fn basic_auth(email: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
    }

    fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, auth: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Registers the default account and returns its Basic auth header.
    async fn register(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/register",
                None,
                json!({ "email": EMAIL, "password": PASSWORD, "full_name": "Alice" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        basic_auth(EMAIL, PASSWORD)
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = app().await;
        register(&app).await;

        let response = app
            .oneshot(get_request("/wallets", &basic_auth(EMAIL, "not-the-password")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_then_list_wallets() {
        let app = app().await;
        let auth = register(&app).await;

        let response = app.oneshot(get_request("/wallets", &auth)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn login_checks_credentials() {
        let app = app().await;
        register(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                json!({ "email": EMAIL, "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], EMAIL);

        let response = app
            .oneshot(json_request(
                "POST",
                "/auth/login",
                None,
                json!({ "email": EMAIL, "password": "nope-nope-nope" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn goal_assignment_over_http() {
        let app = app().await;
        let auth = register(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/wallets",
                Some(&auth),
                json!({ "name": "Cash", "balance_minor": 1_000 }),
            ))
            .await
            .unwrap();
        let wallet_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/goals",
                Some(&auth),
                json!({ "name": "Bike", "target_minor": 500 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let goal_id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/goals/{goal_id}/assign"),
                Some(&auth),
                json!({
                    "wallet_id": wallet_id,
                    "amount_minor": 300,
                    "occurred_on": "2026-02-01",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let entry = json_body(response).await;
        assert_eq!(entry["kind"], "goal_transfer");

        let response = app
            .oneshot(get_request(&format!("/goals/{goal_id}"), &auth))
            .await
            .unwrap();
        let goal = json_body(response).await;
        assert_eq!(goal["current_minor"], 300);
        assert_eq!(goal["remaining_minor"], 200);
    }

    #[tokio::test]
    async fn wallet_crud_round_trip() {
        let app = app().await;
        let auth = register(&app).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/wallets",
                Some(&auth),
                json!({ "name": "Cash", "balance_minor": 1_000 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let wallet = json_body(response).await;
        assert_eq!(wallet["balance_minor"], 1_000);
        let wallet_id = wallet["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/wallets/{wallet_id}"),
                Some(&auth),
                json!({ "name": "Pocket cash" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["name"], "Pocket cash");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/wallets/{wallet_id}"))
                    .header(header::AUTHORIZATION, &auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get_request(&format!("/wallets/{wallet_id}"), &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfer_endpoint_moves_funds_and_rejects_overdraft() {
        let app = app().await;
        let auth = register(&app).await;

        let mut wallet_ids = Vec::new();
        for (name, balance) in [("Checking", 5_000), ("Savings", 0)] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/wallets",
                    Some(&auth),
                    json!({ "name": name, "balance_minor": balance }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            wallet_ids.push(json_body(response).await["id"].as_str().unwrap().to_string());
        }

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/wallets/transfer",
                Some(&auth),
                json!({
                    "from_wallet_id": wallet_ids[0],
                    "to_wallet_id": wallet_ids[1],
                    "amount_minor": 2_000,
                    "occurred_on": "2026-02-01",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let entry = json_body(response).await;
        assert_eq!(entry["kind"], "wallet_transfer");
        assert_eq!(entry["amount_minor"], 2_000);

        let response = app
            .clone()
            .oneshot(get_request(&format!("/wallets/{}", wallet_ids[1]), &auth))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["balance_minor"], 2_000);

        let response = app
            .oneshot(json_request(
                "POST",
                "/wallets/transfer",
                Some(&auth),
                json!({
                    "from_wallet_id": wallet_ids[0],
                    "to_wallet_id": wallet_ids[1],
                    "amount_minor": 99_999,
                    "occurred_on": "2026-02-01",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn ledger_list_pages_through_entries() {
        let app = app().await;
        let auth = register(&app).await;

        let mut wallet_ids = Vec::new();
        for name in ["From", "To"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/wallets",
                    Some(&auth),
                    json!({ "name": name, "balance_minor": 10_000 }),
                ))
                .await
                .unwrap();
            wallet_ids.push(json_body(response).await["id"].as_str().unwrap().to_string());
        }
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/wallets/transfer",
                    Some(&auth),
                    json!({
                        "from_wallet_id": wallet_ids[0],
                        "to_wallet_id": wallet_ids[1],
                        "amount_minor": 100,
                        "occurred_on": "2026-02-01",
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .clone()
            .oneshot(get_request("/transactions?limit=2", &auth))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["entries"].as_array().unwrap().len(), 2);
        let cursor = page["next_cursor"].as_str().unwrap().to_string();

        let response = app
            .oneshot(get_request(
                &format!("/transactions?limit=2&cursor={cursor}"),
                &auth,
            ))
            .await
            .unwrap();
        let page = json_body(response).await;
        assert_eq!(page["entries"].as_array().unwrap().len(), 1);
        assert!(page["next_cursor"].is_null());
    }
}
