// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, LoginUserPayload, RegisterUserPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_hours: i64, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, token_ttl_hours, pool }
    }

    // Cadastro de funcionário (feito por alguém já autenticado)
    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<User, AppError> {
        payload.validate()?;

        // Hashing fora do runtime async
        let password = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .user_repo
            .create_user(
                &self.pool,
                payload.name.trim(),
                &payload.email.trim().to_lowercase(),
                &hashed_password,
            )
            .await?;

        tracing::info!("👤 Usuário {} cadastrado", user.email);
        Ok(user)
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let user = self
            .user_repo
            .find_by_email(&payload.email.trim().to_lowercase())
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::UserNotFound)
    }

    /// Cria o primeiro usuário a partir da configuração, se ele ainda não existir.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<(), AppError> {
        if self.user_repo.find_by_email(&email.trim().to_lowercase()).await?.is_some() {
            return Ok(());
        }

        self.register_user(RegisterUserPayload {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;

        tracing::info!("🔑 Usuário administrador inicial criado ({})", email);
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        encode_token(user, &self.jwt_secret, self.token_ttl_hours)
    }
}

fn encode_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;

    Ok(token_data.claims)
}
