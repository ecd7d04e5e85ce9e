// src/models/auth.rs

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,

    #[serde(skip_serializing)] // nunca sai na resposta
    pub password_hash: String,

    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Grupos de acesso. Um usuário pode estar em nenhum, um ou ambos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum Group {
    Sales,
    Tech,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Sales => "Sales",
            Group::Tech => "Tech",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sales" => Ok(Group::Sales),
            "Tech" => Ok(Group::Tech),
            other => Err(format!("grupo desconhecido: {other}")),
        }
    }
}

/// Identidade materializada uma vez por requisição pelo `auth_guard`.
/// Tudo que decide acesso recebe isto como parâmetro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub username: String,
    pub is_admin: bool,
    pub groups: BTreeSet<Group>,
}

impl Caller {
    pub fn in_group(&self, group: Group) -> bool {
        self.groups.contains(&group)
    }

    /// Papel que vai no token e no perfil: Admin > Sales > Tech > User.
    pub fn token_role(&self) -> &'static str {
        if self.is_admin {
            "Admin"
        } else if self.in_group(Group::Sales) {
            "Sales"
        } else if self.in_group(Group::Tech) {
            "Tech"
        } else {
            "User"
        }
    }
}

// Tipos de token emitidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // ID do usuário
    pub exp: usize, // expiração
    pub iat: usize, // emissão
    pub token_type: TokenType,
    pub role: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 150, message = "O nome de usuário é obrigatório (até 150 caracteres)."))]
    pub username: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenObtainPayload {
    #[validate(length(min = 1, message = "Informe o nome de usuário."))]
    pub username: String,
    #[validate(length(min = 1, message = "Informe a senha."))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshPayload {
    pub refresh: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccessPayload {
    pub groups: Vec<Group>,
    pub is_admin: bool,
}

// --- Respostas ---

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub groups: Vec<Group>,
    pub role: String,
}

impl UserProfile {
    pub fn new(user: &User, groups: &BTreeSet<Group>) -> Self {
        let caller = Caller {
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            groups: groups.clone(),
        };
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            groups: groups.iter().copied().collect(),
            role: caller.token_role().to_string(),
        }
    }
}
