// src/services/auth.rs

use std::collections::BTreeSet;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    config::settings::AdminBootstrap,
    db::UserRepository,
    models::auth::{
        AccessToken, Caller, Claims, Group, RegisterUserPayload, TokenPair, TokenType, User,
        UserProfile,
    },
};

// Chaves e validade dos tokens. Não depende de banco.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn issue(&self, user_id: i64, role: &str, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type,
            role: role.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Decodifica e confere o tipo. Qualquer falha vira `InvalidToken`.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::InvalidToken)?
            .claims;

        if claims.token_type != expected {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt: JwtKeys,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt: JwtKeys, pool: PgPool) -> Self {
        Self { user_repo, jwt, pool }
    }

    async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    fn caller_for(user: &User, groups: BTreeSet<Group>) -> Caller {
        Caller {
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            groups,
        }
    }

    // Cadastro sem login automático
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<UserProfile, AppError> {
        let hashed_password = Self::hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(&self.pool, &payload.username, &payload.email, &hashed_password, false)
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "👤 Usuário registrado");
        Ok(UserProfile::new(&user, &BTreeSet::new()))
    }

    pub async fn obtain_token(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let Some(user) = self.user_repo.find_by_username(username).await? else {
            tracing::warn!(username, "🔒 Login com usuário inexistente");
            return Err(AppError::InvalidCredentials);
        };

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(username, "🔒 Senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        let groups = self.user_repo.groups_for(user.id).await?;
        let caller = Self::caller_for(&user, groups);
        let role = caller.token_role();

        Ok(TokenPair {
            access: self.jwt.issue(user.id, role, TokenType::Access)?,
            refresh: self.jwt.issue(user.id, role, TokenType::Refresh)?,
            role: role.to_string(),
        })
    }

    /// Novo access token; o papel é recalculado com os grupos atuais.
    pub async fn refresh_token(&self, refresh: &str) -> Result<AccessToken, AppError> {
        let claims = self.jwt.decode(refresh, TokenType::Refresh)?;
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let groups = self.user_repo.groups_for(user.id).await?;
        let caller = Self::caller_for(&user, groups);

        Ok(AccessToken {
            access: self.jwt.issue(user.id, caller.token_role(), TokenType::Access)?,
        })
    }

    /// Valida o access token e materializa o `Caller` da requisição.
    pub async fn authenticate(&self, token: &str) -> Result<Caller, AppError> {
        let claims = self.jwt.decode(token, TokenType::Access)?;
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let groups = self.user_repo.groups_for(user.id).await?;
        Ok(Self::caller_for(&user, groups))
    }

    pub async fn profile(&self, caller: &Caller) -> Result<UserProfile, AppError> {
        let user = self
            .user_repo
            .find_by_id(caller.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        Ok(UserProfile::new(&user, &caller.groups))
    }

    // Administração de grupos (substitui o painel admin)
    pub async fn set_user_access(
        &self,
        user_id: i64,
        groups: Vec<Group>,
        is_admin: bool,
    ) -> Result<UserProfile, AppError> {
        let groups: BTreeSet<Group> = groups.into_iter().collect();

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .replace_access(&mut *tx, user_id, &groups, is_admin)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tx.commit().await?;

        tracing::info!(user_id, ?groups, is_admin, "🔑 Acesso do usuário atualizado");
        Ok(UserProfile::new(&user, &groups))
    }

    /// Cria o administrador configurado se ainda não existir. Retorna `true` se criou.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<bool, AppError> {
        if self.user_repo.find_by_username(&admin.username).await?.is_some() {
            return Ok(false);
        }

        let hashed_password = Self::hash_password(&admin.password).await?;
        self.user_repo
            .create_user(&self.pool, &admin.username, &admin.email, &hashed_password, true)
            .await?;

        tracing::info!(username = %admin.username, "👑 Administrador inicial criado");
        Ok(true)
    }
}
