//! Account lifecycle: registration, credentials, email verification and
//! password reset, plus the ordered cascade that removes an account.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, NewUser, ResultEngine, UpdateUser, categories, expenses, goals, incomes,
    transactions, users, wallets,
};

use super::{Engine, normalize_optional_text, with_tx};

/// How long a 6-digit verification code stays redeemable.
const VERIFICATION_CODE_TTL_SECS: i64 = 600;
/// How long a password reset token stays redeemable.
const RESET_TOKEN_TTL_SECS: i64 = 3600;

/// A freshly registered account plus the code the caller must deliver.
#[derive(Clone, Debug)]
pub struct RegisteredUser {
    pub user: users::Model,
    pub verification_code: String,
}

fn normalize_email(email: &str) -> ResultEngine<String> {
    let trimmed = email.trim().to_lowercase();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(EngineError::InvalidCredentials(
            "email is not valid".to_string(),
        ));
    }
    Ok(trimmed)
}

fn hash_password(password: &str) -> ResultEngine<String> {
    if password.len() < 8 {
        return Err(EngineError::InvalidCredentials(
            "password must be at least 8 characters".to_string(),
        ));
    }
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| EngineError::Hashing(e.to_string()))
}

fn verification_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

impl Engine {
    /// Register a password account. The returned code is not persisted
    /// anywhere except on the user row, so the caller must deliver it.
    pub async fn register_user(&self, new_user: NewUser) -> ResultEngine<RegisteredUser> {
        let email = normalize_email(&new_user.email)?;
        let hashed = hash_password(&new_user.password)?;
        let code = verification_code();
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                email: ActiveValue::Set(email),
                full_name: ActiveValue::Set(normalize_optional_text(
                    new_user.full_name.as_deref(),
                )),
                hashed_password: ActiveValue::Set(Some(hashed)),
                google_id: ActiveValue::Set(None),
                apple_id: ActiveValue::Set(None),
                is_active: ActiveValue::Set(true),
                is_email_verified: ActiveValue::Set(false),
                email_verification_code: ActiveValue::Set(Some(code.clone())),
                email_verification_code_sent_at: ActiveValue::Set(Some(now)),
                reset_password_token: ActiveValue::Set(None),
                reset_password_token_sent_at: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(RegisteredUser {
                user: model,
                verification_code: code,
            })
        })
    }

    /// Check email and password, returning the account on success.
    ///
    /// Inactive accounts and social-only accounts (no password set) fail
    /// with the same error as a wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<users::Model> {
        let email = normalize_email(email)?;
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidCredentials("wrong email or password".to_string())
            })?;

        let hashed = user.hashed_password.as_deref().ok_or_else(|| {
            EngineError::InvalidCredentials("wrong email or password".to_string())
        })?;
        let valid = bcrypt::verify(password, hashed)
            .map_err(|e| EngineError::Hashing(e.to_string()))?;
        if !valid {
            return Err(EngineError::InvalidCredentials(
                "wrong email or password".to_string(),
            ));
        }
        if !user.is_active {
            return Err(EngineError::InvalidCredentials(
                "account is disabled".to_string(),
            ));
        }
        Ok(user)
    }

    /// Find or create the account tied to a Google identity.
    ///
    /// Social sign-ins arrive with a verified email, so a matching account
    /// gets the identity attached and marked verified.
    pub async fn user_with_google(
        &self,
        google_id: &str,
        email: &str,
        full_name: Option<&str>,
    ) -> ResultEngine<users::Model> {
        self.user_with_identity(users::Column::GoogleId, google_id, email, full_name)
            .await
    }

    /// Find or create the account tied to an Apple identity.
    pub async fn user_with_apple(
        &self,
        apple_id: &str,
        email: &str,
        full_name: Option<&str>,
    ) -> ResultEngine<users::Model> {
        self.user_with_identity(users::Column::AppleId, apple_id, email, full_name)
            .await
    }

    async fn user_with_identity(
        &self,
        id_column: users::Column,
        provider_id: &str,
        email: &str,
        full_name: Option<&str>,
    ) -> ResultEngine<users::Model> {
        let email = normalize_email(email)?;
        let full_name = normalize_optional_text(full_name);
        // Every branch must reach the tail so the transaction commits.
        with_tx!(self, |db_tx| {
            let by_provider = users::Entity::find()
                .filter(id_column.eq(provider_id))
                .one(&db_tx)
                .await?;
            let by_email = match by_provider {
                Some(_) => None,
                None => {
                    users::Entity::find()
                        .filter(users::Column::Email.eq(email.clone()))
                        .one(&db_tx)
                        .await?
                }
            };

            let user = if let Some(user) = by_provider {
                user
            } else if let Some(user) = by_email {
                let mut active: users::ActiveModel = user.into();
                match id_column {
                    users::Column::AppleId => {
                        active.apple_id = ActiveValue::Set(Some(provider_id.to_string()));
                    }
                    _ => active.google_id = ActiveValue::Set(Some(provider_id.to_string())),
                }
                active.is_email_verified = ActiveValue::Set(true);
                active.update(&db_tx).await?
            } else {
                let mut active = users::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    email: ActiveValue::Set(email),
                    full_name: ActiveValue::Set(full_name),
                    hashed_password: ActiveValue::Set(None),
                    google_id: ActiveValue::Set(None),
                    apple_id: ActiveValue::Set(None),
                    is_active: ActiveValue::Set(true),
                    is_email_verified: ActiveValue::Set(true),
                    email_verification_code: ActiveValue::Set(None),
                    email_verification_code_sent_at: ActiveValue::Set(None),
                    reset_password_token: ActiveValue::Set(None),
                    reset_password_token_sent_at: ActiveValue::Set(None),
                    created_at: ActiveValue::Set(Utc::now()),
                };
                match id_column {
                    users::Column::AppleId => {
                        active.apple_id = ActiveValue::Set(Some(provider_id.to_string()));
                    }
                    _ => active.google_id = ActiveValue::Set(Some(provider_id.to_string())),
                }
                active.insert(&db_tx).await?
            };
            Ok(user)
        })
    }

    /// Redeem a verification code. Expired or mismatched codes fail.
    pub async fn verify_email_code(&self, user_id: Uuid, code: &str) -> ResultEngine<users::Model> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let (stored, sent_at) = match (
                user.email_verification_code.as_deref(),
                user.email_verification_code_sent_at,
            ) {
                (Some(stored), Some(sent_at)) => (stored, sent_at),
                _ => {
                    return Err(EngineError::InvalidCredentials(
                        "no verification pending".to_string(),
                    ));
                }
            };
            if stored != code {
                return Err(EngineError::InvalidCredentials(
                    "wrong verification code".to_string(),
                ));
            }
            if (Utc::now() - sent_at).num_seconds() > VERIFICATION_CODE_TTL_SECS {
                return Err(EngineError::InvalidCredentials(
                    "verification code expired".to_string(),
                ));
            }

            let mut active: users::ActiveModel = user.into();
            active.is_email_verified = ActiveValue::Set(true);
            active.email_verification_code = ActiveValue::Set(None);
            active.email_verification_code_sent_at = ActiveValue::Set(None);
            Ok(active.update(&db_tx).await?)
        })
    }

    /// Issue a fresh verification code, replacing any pending one.
    pub async fn resend_verification_code(&self, user_id: Uuid) -> ResultEngine<String> {
        let code = verification_code();
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            if user.is_email_verified {
                return Err(EngineError::InvalidCredentials(
                    "email already verified".to_string(),
                ));
            }
            let mut active: users::ActiveModel = user.into();
            active.email_verification_code = ActiveValue::Set(Some(code.clone()));
            active.email_verification_code_sent_at = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok(code)
        })
    }

    /// Attach a reset token to the account behind `email`, if any.
    ///
    /// Returns `None` (not an error) for unknown emails so the caller can
    /// answer identically either way.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> ResultEngine<Option<(users::Model, String)>> {
        let email = normalize_email(email)?;
        let token = Uuid::new_v4().to_string();
        with_tx!(self, |db_tx| {
            let found = users::Entity::find()
                .filter(users::Column::Email.eq(email))
                .one(&db_tx)
                .await?;
            match found {
                Some(user) => {
                    let mut active: users::ActiveModel = user.into();
                    active.reset_password_token = ActiveValue::Set(Some(token.clone()));
                    active.reset_password_token_sent_at = ActiveValue::Set(Some(Utc::now()));
                    let user = active.update(&db_tx).await?;
                    Ok(Some((user, token)))
                }
                None => Ok(None),
            }
        })
    }

    /// Redeem a reset token and replace the password.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> ResultEngine<()> {
        let hashed = hash_password(new_password)?;
        with_tx!(self, |db_tx| {
            let user = users::Entity::find()
                .filter(users::Column::ResetPasswordToken.eq(token))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::InvalidCredentials("invalid reset token".to_string())
                })?;
            let sent_at = user.reset_password_token_sent_at.ok_or_else(|| {
                EngineError::InvalidCredentials("invalid reset token".to_string())
            })?;
            if (Utc::now() - sent_at).num_seconds() > RESET_TOKEN_TTL_SECS {
                return Err(EngineError::InvalidCredentials(
                    "reset token expired".to_string(),
                ));
            }

            let mut active: users::ActiveModel = user.into();
            active.hashed_password = ActiveValue::Set(Some(hashed));
            active.reset_password_token = ActiveValue::Set(None);
            active.reset_password_token_sent_at = ActiveValue::Set(None);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Return an account by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Update profile fields. Absent fields are left untouched.
    pub async fn update_user(
        &self,
        user_id: Uuid,
        update: UpdateUser,
    ) -> ResultEngine<users::Model> {
        let hashed = match update.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = user.into();
            if update.full_name.is_some() {
                active.full_name =
                    ActiveValue::Set(normalize_optional_text(update.full_name.as_deref()));
            }
            if let Some(hashed) = hashed {
                active.hashed_password = ActiveValue::Set(Some(hashed));
            }
            Ok(active.update(&db_tx).await?)
        })
    }

    /// Remove the account and every row it owns, children first.
    pub async fn delete_user(&self, user_id: Uuid) -> ResultEngine<()> {
        let id = user_id.to_string();
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            incomes::Entity::delete_many()
                .filter(incomes::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_many()
                .filter(expenses::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            goals::Entity::delete_many()
                .filter(goals::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_many()
                .filter(categories::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            wallets::Entity::delete_many()
                .filter(wallets::Column::UserId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_many()
                .filter(users::Column::Id.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_user(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
