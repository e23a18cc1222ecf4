// Authentication, password hashing and JWT token handling

use crate::db::repositories::user::UserRepository;
use crate::errors::{AuthError, ModelError};
use crate::models::{LoginRequest, NewUser, User, UserClaims};
use crate::telemetry;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{error, instrument};

/// Hash a plain-text password with bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AuthError::HashingFailed(e.to_string())
    })
}

/// Check a plain-text password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| {
        error!(error = %e, "Failed to verify password");
        AuthError::HashingFailed(e.to_string())
    })
}

/// JWT token service for encoding and decoding tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    expiration_hours: i64,
}

impl JwtService {
    #[instrument(skip(secret))]
    pub fn new(secret: &str, expiration_hours: u64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            expiration_hours: expiration_hours as i64,
        }
    }

    /// Issue a token carrying the user's name and admin flag
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub fn create_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.username.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            exp: (now + Duration::hours(self.expiration_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to encode JWT token");
            AuthError::InvalidToken(format!("Failed to encode token: {}", e))
        })
    }

    /// Decode and validate a token signed with this service's secret
    #[instrument(skip(self, token))]
    pub fn decode_token(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data =
            decode::<UserClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                tracing::debug!(error = %e, "Rejected JWT token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }
}

/// Login and self-registration backed by the users table
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    user_repository: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, user_repository: UserRepository) -> Self {
        Self {
            jwt_service,
            user_repository: Arc::new(user_repository),
        }
    }

    /// Check credentials and issue a token
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<String, ModelError> {
        let result = self
            .user_repository
            .authenticate(&request.username, &request.password)
            .await;
        telemetry::record_login(result.is_ok());

        let user = result?;
        let token = self.jwt_service.create_token(&user)?;

        tracing::info!(username = %user.username, "User logged in successfully");
        Ok(token)
    }

    /// Register a non-admin user and issue a token
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: NewUser) -> Result<String, ModelError> {
        let new_user = NewUser {
            is_admin: false,
            ..new_user
        };
        let user = self.user_repository.register(&new_user).await?;
        let token = self.jwt_service.create_token(&user)?;

        tracing::info!(username = %user.username, "User registered");
        Ok(token)
    }
}
