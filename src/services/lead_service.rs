// src/services/lead_service.rs
//
// Operações em lote, só para leads.

use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::error::{validation_details, AppError, BulkItemError},
    db::RecordRepository,
    models::{
        access::{EntityKind, Operation},
        auth::Caller,
        sales::{Lead, LeadInput},
    },
    services::access_policy,
};

/// Valida o lote inteiro. Qualquer item inválido rejeita tudo,
/// com o erro de cada item indexado pela posição no array.
pub fn parse_batch(payload: Value) -> Result<Vec<LeadInput>, AppError> {
    let Value::Array(items) = payload else {
        return Err(AppError::BulkPayloadNotList);
    };

    let mut inputs = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LeadInput>(item) {
            Ok(input) => match input.validate() {
                Ok(()) => inputs.push(input),
                Err(e) => errors.push(BulkItemError { index, fields: validation_details(&e) }),
            },
            Err(e) => {
                let mut fields = BTreeMap::new();
                fields.insert("non_field_errors".to_string(), vec![e.to_string()]);
                errors.push(BulkItemError { index, fields });
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::BulkValidationError(errors));
    }
    Ok(inputs)
}

#[derive(Clone)]
pub struct LeadService {
    repo: RecordRepository,
    pool: PgPool,
}

impl LeadService {
    pub fn new(repo: RecordRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Importa o lote numa transação. Retorna quantos leads foram criados.
    pub async fn bulk_import(&self, caller: &Caller, payload: Value) -> Result<u64, AppError> {
        access_policy::authorize(caller, EntityKind::Lead, Operation::Write)?;

        let inputs = match parse_batch(payload) {
            Ok(inputs) => inputs,
            Err(err) => {
                if let AppError::BulkValidationError(items) = &err {
                    tracing::warn!(invalid = items.len(), user_id = caller.user_id, "📥 Importação rejeitada");
                }
                return Err(err);
            }
        };

        let mut tx = self.pool.begin().await?;
        let created = self
            .repo
            .bulk_insert::<Lead>(&mut *tx, caller.user_id, inputs)
            .await?;
        tx.commit().await?;

        tracing::info!(created, user_id = caller.user_id, "📥 Leads importados");
        Ok(created)
    }

    /// Apaga por ids em todo o sistema; inexistentes são ignorados.
    pub async fn bulk_delete(&self, caller: &Caller, ids: &[i64]) -> Result<u64, AppError> {
        access_policy::authorize(caller, EntityKind::Lead, Operation::Write)?;

        let deleted = self.repo.bulk_delete::<Lead, _>(&self.pool, ids).await?;

        tracing::info!(requested = ids.len(), deleted, user_id = caller.user_id, "🗑️ Leads removidos em lote");
        Ok(deleted)
    }
}
