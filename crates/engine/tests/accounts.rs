use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
};
use uuid::Uuid;

use engine::{Engine, EngineError, NewUser, UpdateUser, users};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine() -> Engine {
    engine_with_db().await.0
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: "correct-horse".to_string(),
        full_name: None,
    }
}

#[tokio::test]
async fn register_then_authenticate() {
    let engine = engine().await;
    let registered = engine
        .register_user(new_user("Alice@Example.com"))
        .await
        .unwrap();

    // Emails are stored lowercased.
    assert_eq!(registered.user.email, "alice@example.com");
    assert!(!registered.user.is_email_verified);
    assert_eq!(registered.verification_code.len(), 6);

    let user = engine
        .authenticate("alice@example.com", "correct-horse")
        .await
        .unwrap();
    assert_eq!(user.id, registered.user.id);

    let err = engine
        .authenticate("alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let engine = engine().await;
    engine.register_user(new_user("a@example.com")).await.unwrap();
    let err = engine
        .register_user(new_user("A@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let engine = engine().await;
    let err = engine
        .register_user(NewUser {
            email: "a@example.com".to_string(),
            password: "short".to_string(),
            full_name: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn email_verification_accepts_the_issued_code_once() {
    let engine = engine().await;
    let registered = engine.register_user(new_user("a@example.com")).await.unwrap();
    let user_id = Uuid::parse_str(&registered.user.id).unwrap();

    let err = engine.verify_email_code(user_id, "000000").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    let user = engine
        .verify_email_code(user_id, &registered.verification_code)
        .await
        .unwrap();
    assert!(user.is_email_verified);
    assert!(user.email_verification_code.is_none());

    // Nothing pending anymore.
    let err = engine
        .verify_email_code(user_id, &registered.verification_code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn stale_verification_code_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let registered = engine.register_user(new_user("a@example.com")).await.unwrap();
    let user_id = Uuid::parse_str(&registered.user.id).unwrap();

    // Codes are redeemable for ten minutes.
    let mut active: users::ActiveModel = registered.user.into();
    active.email_verification_code_sent_at =
        ActiveValue::Set(Some(Utc::now() - Duration::seconds(601)));
    active.update(&db).await.unwrap();

    let err = engine
        .verify_email_code(user_id, &registered.verification_code)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    // A fresh code still works.
    let code = engine.resend_verification_code(user_id).await.unwrap();
    let user = engine.verify_email_code(user_id, &code).await.unwrap();
    assert!(user.is_email_verified);
}

#[tokio::test]
async fn resending_replaces_the_pending_code() {
    let engine = engine().await;
    let registered = engine.register_user(new_user("a@example.com")).await.unwrap();
    let user_id = Uuid::parse_str(&registered.user.id).unwrap();

    let code = engine.resend_verification_code(user_id).await.unwrap();
    let user = engine.verify_email_code(user_id, &code).await.unwrap();
    assert!(user.is_email_verified);

    let err = engine.resend_verification_code(user_id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn password_reset_round_trip() {
    let engine = engine().await;
    engine.register_user(new_user("a@example.com")).await.unwrap();

    // Unknown emails do not error, so callers can answer identically.
    let missing = engine
        .request_password_reset("nobody@example.com")
        .await
        .unwrap();
    assert!(missing.is_none());

    let (_, token) = engine
        .request_password_reset("a@example.com")
        .await
        .unwrap()
        .expect("reset token for a known email");

    let err = engine
        .reset_password("not-a-token", "another-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    engine.reset_password(&token, "another-pass").await.unwrap();

    let err = engine
        .authenticate("a@example.com", "correct-horse")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
    engine
        .authenticate("a@example.com", "another-pass")
        .await
        .unwrap();

    // The token is single use.
    let err = engine
        .reset_password(&token, "third-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn stale_reset_token_is_rejected() {
    let (engine, db) = engine_with_db().await;
    engine.register_user(new_user("a@example.com")).await.unwrap();
    let (user, token) = engine
        .request_password_reset("a@example.com")
        .await
        .unwrap()
        .expect("reset token for a known email");

    // Tokens are redeemable for an hour.
    let mut active: users::ActiveModel = user.into();
    active.reset_password_token_sent_at =
        ActiveValue::Set(Some(Utc::now() - Duration::seconds(3601)));
    active.update(&db).await.unwrap();

    let err = engine
        .reset_password(&token, "another-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));

    // The old password still authenticates.
    engine
        .authenticate("a@example.com", "correct-horse")
        .await
        .unwrap();
}

#[tokio::test]
async fn google_sign_in_attaches_to_an_existing_account() {
    let (engine, db) = engine_with_db().await;
    let registered = engine.register_user(new_user("a@example.com")).await.unwrap();

    let user = engine
        .user_with_google("google-123", "a@example.com", Some("Alice"))
        .await
        .unwrap();
    assert_eq!(user.id, registered.user.id);
    assert_eq!(user.google_id.as_deref(), Some("google-123"));
    assert!(user.is_email_verified);

    // The attachment must survive the call, not just show in its return value.
    let stored = users::Entity::find_by_id(registered.user.id.clone())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.google_id.as_deref(), Some("google-123"));
    assert!(stored.is_email_verified);

    // Subsequent sign-ins resolve by provider id and never mint a second row.
    let again = engine
        .user_with_google("google-123", "other@example.com", None)
        .await
        .unwrap();
    assert_eq!(again.id, registered.user.id);
    assert_eq!(users::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn apple_sign_in_creates_a_fresh_verified_account() {
    let engine = engine().await;
    let user = engine
        .user_with_apple("apple-9", "b@example.com", None)
        .await
        .unwrap();
    assert_eq!(user.apple_id.as_deref(), Some("apple-9"));
    assert!(user.is_email_verified);
    assert!(user.hashed_password.is_none());

    // Password auth is unavailable for social-only accounts.
    let err = engine
        .authenticate("b@example.com", "whatever-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidCredentials(_)));
}

#[tokio::test]
async fn profile_update_changes_only_given_fields() {
    let engine = engine().await;
    let registered = engine.register_user(new_user("a@example.com")).await.unwrap();
    let user_id = Uuid::parse_str(&registered.user.id).unwrap();

    let user = engine
        .update_user(
            user_id,
            UpdateUser {
                full_name: Some("Alice A.".to_string()),
                password: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Alice A."));

    engine
        .update_user(
            user_id,
            UpdateUser {
                full_name: None,
                password: Some("brand-new-pass".to_string()),
            },
        )
        .await
        .unwrap();
    let user = engine
        .authenticate("a@example.com", "brand-new-pass")
        .await
        .unwrap();
    assert_eq!(user.full_name.as_deref(), Some("Alice A."));
}
