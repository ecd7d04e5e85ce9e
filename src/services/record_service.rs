// src/services/record_service.rs
//
// CRUD genérico para as sete entidades. Cada operação decide o acesso
// pelo `access_policy` antes de tocar no repositório.

use chrono_tz::Tz;
use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::{
        db_utils::{ListQuery, Page},
        error::AppError,
    },
    config::settings::today_in,
    db::{RecordRepository, Resource, RowLock},
    models::{
        access::{EntityKind, Operation},
        auth::Caller,
        sales::Payment,
    },
    services::{
        access_policy,
        receipt_storage::{discard_quietly, ReceiptStorage},
    },
};

// Campos que o PATCH nunca sobrescreve
const READ_ONLY_FIELDS: &[&str] = &["id", "owner_id", "created_at", "receipt"];

#[derive(Clone)]
pub struct RecordService {
    repo: RecordRepository,
    pool: PgPool,
    time_zone: Tz,
}

/// Sobrepõe as chaves do PATCH na linha atual serializada.
pub fn merge_patch(current: Value, patch: Value) -> Result<Value, AppError> {
    let Value::Object(patch) = patch else {
        return Err(AppError::MalformedBody("PATCH espera um objeto JSON".into()));
    };
    let Value::Object(mut merged) = current else {
        return Err(AppError::InternalServerError(anyhow::anyhow!(
            "registro não serializou como objeto"
        )));
    };

    for (key, value) in patch {
        if !READ_ONLY_FIELDS.contains(&key.as_str()) {
            merged.insert(key, value);
        }
    }
    Ok(Value::Object(merged))
}

impl RecordService {
    pub fn new(repo: RecordRepository, pool: PgPool, time_zone: Tz) -> Self {
        Self { repo, pool, time_zone }
    }

    fn prepare<T: Resource>(&self, mut input: T::Input) -> Result<T::Input, AppError> {
        input.validate()?;
        T::fill_defaults(&mut input, today_in(self.time_zone));
        Ok(input)
    }

    pub async fn list<T: Resource>(
        &self,
        caller: &Caller,
        query: &ListQuery,
    ) -> Result<Page<T>, AppError> {
        let scope = access_policy::authorize(caller, T::KIND, Operation::Read)?;

        let count = self.repo.count::<T, _>(&self.pool, scope, query).await?;
        let rows = self.repo.list::<T, _>(&self.pool, scope, query).await?;

        let results = rows.into_iter().map(|row| row.present(caller)).collect();
        Ok(Page::new(results, count, query))
    }

    pub async fn retrieve<T: Resource>(&self, caller: &Caller, id: i64) -> Result<T, AppError> {
        let scope = access_policy::authorize(caller, T::KIND, Operation::Read)?;

        self.repo
            .find_by_id::<T, _>(&self.pool, id, scope)
            .await?
            .map(|row| row.present(caller))
            .ok_or(AppError::NotFound(T::KIND))
    }

    pub async fn create<T: Resource>(&self, caller: &Caller, input: T::Input) -> Result<T, AppError> {
        access_policy::authorize(caller, T::KIND, Operation::Write)?;
        let input = self.prepare::<T>(input)?;

        let created = self
            .repo
            .insert::<T, _>(&self.pool, caller.user_id, input)
            .await?;

        tracing::info!(entity = %T::KIND, user_id = caller.user_id, "➕ Registro criado");
        Ok(created.present(caller))
    }

    // PUT: validação completa do corpo
    pub async fn replace<T: Resource>(
        &self,
        caller: &Caller,
        id: i64,
        input: T::Input,
    ) -> Result<T, AppError> {
        let scope = access_policy::authorize(caller, T::KIND, Operation::Write)?;
        let input = self.prepare::<T>(input)?;

        self.repo
            .update::<T, _>(&self.pool, id, scope, input)
            .await?
            .map(|row| row.present(caller))
            .ok_or(AppError::NotFound(T::KIND))
    }

    // PATCH: mescla com a linha travada e revalida o resultado
    pub async fn patch<T: Resource>(
        &self,
        caller: &Caller,
        id: i64,
        patch: Value,
    ) -> Result<T, AppError> {
        let scope = access_policy::authorize(caller, T::KIND, Operation::Write)?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .lock_by_id::<T, _>(&mut *tx, id, scope, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound(T::KIND))?;

        let current = serde_json::to_value(&current)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar registro: {}", e))?;
        let merged = merge_patch(current, patch)?;
        let input: T::Input =
            serde_json::from_value(merged).map_err(|e| AppError::MalformedBody(e.to_string()))?;
        let input = self.prepare::<T>(input)?;

        let updated = self
            .repo
            .update::<T, _>(&mut *tx, id, scope, input)
            .await?
            .ok_or(AppError::NotFound(T::KIND))?;

        tx.commit().await?;
        Ok(updated.present(caller))
    }

    pub async fn delete<T: Resource>(&self, caller: &Caller, id: i64) -> Result<(), AppError> {
        let scope = access_policy::authorize(caller, T::KIND, Operation::Write)?;

        if !self.repo.delete::<T, _>(&self.pool, id, scope).await? {
            return Err(AppError::NotFound(T::KIND));
        }

        tracing::info!(entity = %T::KIND, id, user_id = caller.user_id, "🗑️ Registro removido");
        Ok(())
    }

    /// Grava o recibo e associa ao pagamento.
    pub async fn attach_receipt(
        &self,
        caller: &Caller,
        payment_id: i64,
        file_name: Option<&str>,
        bytes: &[u8],
        storage: &dyn ReceiptStorage,
    ) -> Result<Payment, AppError> {
        let scope = access_policy::authorize(caller, EntityKind::Payment, Operation::Write)?;

        // Confere o pagamento antes de gravar arquivo
        let current: Payment = self
            .repo
            .find_by_id::<Payment, _>(&self.pool, payment_id, scope)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Payment))?;

        let reference = storage.store(file_name, bytes).await?;

        // Arquivo novo sem linha que o referencie não fica no disco
        let payment = match self.repo.set_receipt(&self.pool, payment_id, &reference).await {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                discard_quietly(storage, &reference).await;
                return Err(AppError::NotFound(EntityKind::Payment));
            }
            Err(e) => {
                discard_quietly(storage, &reference).await;
                return Err(e);
            }
        };

        // O recibo substituído deixa de ser referenciado
        if let Some(previous) = current.receipt.filter(|previous| *previous != reference) {
            discard_quietly(storage, &previous).await;
        }

        tracing::info!(payment_id, receipt = %reference, "📎 Recibo anexado ao pagamento");
        Ok(payment)
    }
}
