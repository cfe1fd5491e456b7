//! Authentication service - Identity provider over the credential store.
//!
//! Accounts, sign-in sessions backed by the session store, and the
//! password reset flow. Password hashing lives in the domain `Password`
//! value object.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::config::{
    Config, CACHE_PREFIX_FAILED_SIGN_IN, FAILED_SIGN_IN_WINDOW_SECONDS, MAX_FAILED_SIGN_INS,
    PASSWORD_RESET_TTL_MINUTES, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER,
};
use crate::errors::{AppError, AppResult, IdentityError};
use crate::infra::{Backend, Credential, Email, Mailer, PasswordReset, SessionStore};
use domain::{DomainError, Password, User, UserRole};

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Session id, checked against the session store on every request
    pub sid: Uuid,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        UserRole::from(self.role.as_str()).is_admin()
    }
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// A signed-in user
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user: User,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn token_response(&self) -> TokenResponse {
        TokenResponse {
            access_token: self.access_token.clone(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: (self.expires_at - Utc::now()).num_seconds().max(0),
        }
    }
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign up: create the credential, then the profile keyed by its id
    async fn create_account(&self, email: String, password: String, name: String)
        -> AppResult<User>;

    /// Sign in and open a session
    async fn authenticate(&self, email: String, password: String) -> AppResult<Session>;

    /// Sign out. Tokens carrying this session id stop verifying.
    async fn end_session(&self, session_id: Uuid) -> AppResult<()>;

    /// Mail a reset link. Answers success for unknown emails too.
    async fn send_password_reset(&self, email: String) -> AppResult<()>;

    /// Redeem a reset token
    async fn reset_password(&self, token: String, new_password: String) -> AppResult<()>;

    /// Verify JWT token and that its session is still open
    async fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

// Verified when the email is unknown so both paths pay for a hash check
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$ZHVtbXlzYWx0MTIzNDU2$ZHVtbXloYXNoMTIzNDU2Nzg5MDEyMzQ1Njc4OTAxMg";

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(IdentityError::InvalidEmail.into());
    }
    Ok(email)
}

fn new_password(plain_text: &str) -> AppResult<Password> {
    Password::new(plain_text).map_err(|e| match e {
        DomainError::Password(msg) => IdentityError::WeakPassword(msg).into(),
        other => AppError::from(other),
    })
}

fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Generate JWT token for a session
fn generate_token(
    user: &User,
    session_id: Uuid,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    config: &Config,
) -> AppResult<String> {
    let claims = Claims {
        sub: user.id,
        sid: session_id,
        role: user.role().to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;
    Ok(token)
}

/// Concrete implementation of AuthService.
pub struct Authenticator<B: Backend> {
    backend: Arc<B>,
    sessions: Arc<dyn SessionStore>,
    mailer: Arc<dyn Mailer>,
    config: Config,
}

impl<B: Backend> Authenticator<B> {
    pub fn new(
        backend: Arc<B>,
        sessions: Arc<dyn SessionStore>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        Self {
            backend,
            sessions,
            mailer,
            config,
        }
    }

    async fn check_credential(&self, email: &str, password: &str) -> AppResult<Credential> {
        let credential = self.backend.credentials().find_by_email(email).await?;

        let hash = credential
            .as_ref()
            .map_or(DUMMY_HASH, |c| c.password_hash.as_str());
        let password_valid = Password::from_hash(hash).verify(password);

        match credential {
            None => Err(IdentityError::UnknownAccount.into()),
            Some(_) if !password_valid => Err(IdentityError::WrongPassword.into()),
            Some(credential) => Ok(credential),
        }
    }
}

#[async_trait]
impl<B: Backend> AuthService for Authenticator<B> {
    #[tracing::instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: String,
        password: String,
        name: String,
    ) -> AppResult<User> {
        let email = normalize_email(&email)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Name is required").into());
        }
        let password = new_password(&password)?;

        let credential = self
            .backend
            .credentials()
            .create(Credential {
                user_id: Uuid::new_v4(),
                email: email.clone(),
                password_hash: password.into_string(),
                created_at: Utc::now(),
            })
            .await?;

        let created = self
            .backend
            .users()
            .create(User::new(credential.user_id, email, name))
            .await;
        let user = match created {
            Ok(user) => user,
            Err(e) => {
                // Free the email again so the sign-up can be retried
                if let Err(cleanup) = self.backend.credentials().delete(credential.user_id).await {
                    tracing::error!(
                        user_id = %credential.user_id,
                        error = %cleanup,
                        "Orphaned credential left after failed profile write"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    #[tracing::instrument(skip(self, password))]
    async fn authenticate(&self, email: String, password: String) -> AppResult<Session> {
        let email = email.trim().to_lowercase();
        let throttle_key = format!("{}{}", CACHE_PREFIX_FAILED_SIGN_IN, email);

        // Every attempt counts; a successful one clears the counter
        let attempts = self
            .sessions
            .hit(&throttle_key, FAILED_SIGN_IN_WINDOW_SECONDS)
            .await?;
        if attempts > MAX_FAILED_SIGN_INS {
            tracing::warn!("Sign-in throttled");
            return Err(IdentityError::TooManyAttempts.into());
        }

        let credential = match self.check_credential(&email, &password).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(attempts, "Sign-in rejected");
                return Err(e);
            }
        };
        self.sessions.reset(&throttle_key).await?;

        let user = self
            .backend
            .users()
            .find_by_id(credential.user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.jwt_expiration_hours);
        let session_id = Uuid::new_v4();
        let access_token = generate_token(&user, session_id, now, expires_at, &self.config)?;

        let ttl = u64::try_from(self.config.jwt_expiration_hours * SECONDS_PER_HOUR)
            .unwrap_or_default();
        self.sessions
            .put_session(&session_id.to_string(), user.id, ttl)
            .await?;

        tracing::info!(user_id = %user.id, session_id = %session_id, "Signed in");
        Ok(Session {
            id: session_id,
            user,
            access_token,
            expires_at,
        })
    }

    async fn end_session(&self, session_id: Uuid) -> AppResult<()> {
        self.sessions.revoke_session(&session_id.to_string()).await?;
        tracing::info!(session_id = %session_id, "Signed out");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn send_password_reset(&self, email: String) -> AppResult<()> {
        let email = normalize_email(&email)?;
        let Some(credential) = self.backend.credentials().find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = Uuid::new_v4().simple().to_string();
        self.backend
            .credentials()
            .store_reset(PasswordReset {
                token_hash: hash_token(&token),
                user_id: credential.user_id,
                expires_at: Utc::now() + Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
            })
            .await?;

        let link = format!(
            "{}/reset-password?token={}",
            self.config.public_base_url.trim_end_matches('/'),
            token
        );
        self.mailer
            .send(Email::new(
                credential.email,
                "Reset your Supper Club password",
                format!(
                    "Use this link within {} minutes to choose a new password:\n{}\n\nReset code: {}",
                    PASSWORD_RESET_TTL_MINUTES, link, token
                ),
            ))
            .await?;

        tracing::info!(user_id = %credential.user_id, "Password reset sent");
        Ok(())
    }

    async fn reset_password(&self, token: String, new_password_text: String) -> AppResult<()> {
        let password = new_password(&new_password_text)?;

        let reset = self
            .backend
            .credentials()
            .take_reset(&hash_token(token.trim()))
            .await?
            .filter(|reset| reset.expires_at > Utc::now())
            .ok_or(IdentityError::InvalidResetToken)?;

        self.backend
            .credentials()
            .update_password(reset.user_id, password.into_string())
            .await?;

        tracing::info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        let claims = token_data.claims;
        if !self.sessions.session_active(&claims.sid.to_string()).await? {
            return Err(IdentityError::SessionExpired.into());
        }
        Ok(claims)
    }
}
