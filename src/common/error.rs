use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::access::EntityKind,
};

// Erro de um item específico na importação em lote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkItemError {
    pub index: usize,
    pub fields: BTreeMap<String, Vec<String>>,
}

// Erros de domínio. Os handlers convertem para `ApiError` com `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Importação em lote inválida ({} itens com erro)", .0.len())]
    BulkValidationError(Vec<BulkItemError>),

    #[error("O lote de importação não é uma lista")]
    BulkPayloadNotList,

    #[error("Corpo da requisição inválido: {0}")]
    MalformedBody(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão negada: {0}")]
    PermissionDenied(String),

    #[error("{0} não encontrado")]
    NotFound(EntityKind),

    // Violação de constraint: o detalhe vai para o log, não para o cliente
    #[error("Conflito de persistência: {0}")]
    Conflict(String),

    #[error("Falha ao converter o lead: {0}")]
    ConversionFailed(String),

    #[error("Falha ao criar a tarefa a partir do pagamento: {0}")]
    TaskCreationFailed(String),

    #[error("Nenhum recibo enviado")]
    ReceiptMissing,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de armazenamento: {0}")]
    StorageError(#[from] std::io::Error),
}

// Códigos SQLSTATE de dados rejeitados pelo banco (texto longo demais, número fora da faixa)
const SQLSTATE_STRING_TRUNCATION: &str = "22001";
const SQLSTATE_NUMERIC_OUT_OF_RANGE: &str = "22003";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let rejected_by_constraint = matches!(
                db_err.kind(),
                sqlx::error::ErrorKind::UniqueViolation
                    | sqlx::error::ErrorKind::ForeignKeyViolation
                    | sqlx::error::ErrorKind::NotNullViolation
                    | sqlx::error::ErrorKind::CheckViolation
            );
            let rejected_value = matches!(
                db_err.code().as_deref(),
                Some(SQLSTATE_STRING_TRUNCATION) | Some(SQLSTATE_NUMERIC_OUT_OF_RANGE)
            );
            if rejected_by_constraint || rejected_value {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::DatabaseError(err)
    }
}

impl AppError {
    /// Chave no catálogo do `I18nStore`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::BulkValidationError(_) => "bulk_validation_failed",
            AppError::BulkPayloadNotList => "bulk_payload_not_list",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken | AppError::JwtError(_) => "invalid_token",
            AppError::UsernameAlreadyExists => "username_taken",
            AppError::UserNotFound => "user_not_found",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::NotFound(EntityKind::Lead) => "lead_not_found",
            AppError::NotFound(EntityKind::Payment) => "payment_not_found",
            AppError::NotFound(_) => "record_not_found",
            AppError::Conflict(_) => "record_conflict",
            AppError::ConversionFailed(_) => "conversion_failed",
            AppError::TaskCreationFailed(_) => "task_creation_failed",
            AppError::ReceiptMissing => "receipt_missing",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::StorageError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BulkValidationError(_)
            | AppError::BulkPayloadNotList
            | AppError::MalformedBody(_)
            | AppError::UsernameAlreadyExists
            | AppError::Conflict(_)
            | AppError::ConversionFailed(_)
            | AppError::TaskCreationFailed(_)
            | AppError::ReceiptMissing => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status_code();
        let lang = locale.as_str();

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        } else if matches!(self, AppError::Conflict(_) | AppError::TaskCreationFailed(_)) {
            tracing::warn!("Escrita rejeitada pelo banco: {}", self);
        }

        let error = match self {
            AppError::ConversionFailed(detail) => {
                store.translate_with(lang, self.code(), &[("detail", detail)])
            }
            _ => store.translate(lang, self.code()),
        };

        let details = match self {
            AppError::ValidationError(errors) => Some(json!(validation_details(errors))),
            AppError::BulkValidationError(items) => Some(json!(items)),
            AppError::MalformedBody(reason) => Some(json!(reason)),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

/// Achata os erros do `validator` em `{campo: [mensagens]}`.
pub fn validation_details(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

// Erro pronto para ir para o fio
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
