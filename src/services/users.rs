//! User accounts and login

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{CreateUser, LoginUser},
        User, UserClaims,
    },
    repository::Repository,
};

const DEFAULT_ROLE: &str = "user";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new account. Requested roles are only honoured when
    /// `can_assign_roles` is set; otherwise the account gets the default role.
    pub async fn create_user(&self, data: CreateUser, can_assign_roles: bool) -> AppResult<User> {
        if self.repository.users.username_exists(&data.username).await? {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                data.username
            )));
        }

        let now = Utc::now();
        let user = User {
            user_reference: Uuid::new_v4(),
            username: data.username,
            password_hash: hash_password(&data.password)?,
            roles: data
                .roles
                .filter(|roles| can_assign_roles && !roles.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_ROLE.to_string()]),
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.users.create(&user).await?;
        tracing::info!("User {} created", created.username);
        Ok(created)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, data: LoginUser) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(&data.username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user, &data.password)? {
            tracing::warn!("Failed login attempt for {}", data.username);
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let token = UserClaims::for_user(&user, &self.config)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
