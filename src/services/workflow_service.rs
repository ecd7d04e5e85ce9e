// src/services/workflow_service.rs
//
// Transições entre tabelas. Cada uma trava a linha de origem e grava
// status + registro derivado na mesma transação.

use chrono_tz::Tz;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::settings::today_in,
    db::{RecordRepository, RowLock},
    models::{
        access::{EntityKind, Operation, Visibility},
        auth::Caller,
        sales::{Lead, Payment, SalesTask},
        tech::Task,
        workflow::{
            ConvertLeadPayload, GoThruPayload, MoveToSalesTaskPayload, STATUS_CONVERTED,
            STATUS_INTERESTED,
        },
    },
    services::{
        access_policy,
        receipt_storage::{discard_quietly, ReceiptFile, ReceiptStorage},
    },
};

// Falha de persistência na conversão volta com o detalhe do banco
fn conversion_failure(err: AppError) -> AppError {
    match err {
        AppError::Conflict(detail) => AppError::ConversionFailed(detail),
        AppError::DatabaseError(e) => AppError::ConversionFailed(e.to_string()),
        other => other,
    }
}

// Na criação da tarefa, qualquer erro de banco vira a mensagem genérica
fn task_creation_failure(err: AppError) -> AppError {
    match err {
        AppError::Conflict(detail) => AppError::TaskCreationFailed(detail),
        AppError::DatabaseError(e) => AppError::TaskCreationFailed(e.to_string()),
        other => other,
    }
}

#[derive(Clone)]
pub struct WorkflowService {
    repo: RecordRepository,
    pool: PgPool,
    time_zone: Tz,
}

impl WorkflowService {
    pub fn new(repo: RecordRepository, pool: PgPool, time_zone: Tz) -> Self {
        Self { repo, pool, time_zone }
    }

    // =========================================================================
    //  1. LEAD → PAYMENT
    // =========================================================================

    /// Fecha o negócio: lead vira `Converted` e nasce um pagamento.
    /// Lead já convertido é aceito e gera outro pagamento. Retorna o ID do pagamento.
    ///
    /// O recibo opcional é gravado antes da transação e referenciado dentro dela;
    /// se a conversão falhar o arquivo é descartado.
    pub async fn convert_lead(
        &self,
        caller: &Caller,
        lead_id: i64,
        payload: ConvertLeadPayload,
        receipt: Option<ReceiptFile>,
        storage: &dyn ReceiptStorage,
    ) -> Result<i64, AppError> {
        let scope = access_policy::authorize(caller, EntityKind::Lead, Operation::Write)?;
        payload.validate()?;

        let reference = match receipt {
            Some(file) => Some(storage.store(file.file_name.as_deref(), &file.bytes).await?),
            None => None,
        };

        let converted = self
            .convert_in_transaction(caller, lead_id, scope, payload, reference.as_deref())
            .await;

        if converted.is_err() {
            if let Some(reference) = &reference {
                discard_quietly(storage, reference).await;
            }
        }
        converted
    }

    async fn convert_in_transaction(
        &self,
        caller: &Caller,
        lead_id: i64,
        scope: Visibility,
        payload: ConvertLeadPayload,
        receipt: Option<&str>,
    ) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o lead (duas conversões simultâneas ficam em fila)
        let lead: Lead = self
            .repo
            .lock_by_id(&mut *tx, lead_id, scope, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Lead))?;

        if lead.status == STATUS_CONVERTED {
            tracing::warn!(lead_id, "⚠️ Lead já convertido; criando novo pagamento");
        }

        // 2. Atualiza o status
        self.repo
            .set_status::<Lead, _>(&mut *tx, lead_id, STATUS_CONVERTED)
            .await
            .map_err(conversion_failure)?;

        // 3. Cria o pagamento em nome de quem converteu
        let payment: Payment = self
            .repo
            .insert::<Payment, _>(&mut *tx, caller.user_id, payload.into_payment(&lead))
            .await
            .map_err(conversion_failure)?;

        // 4. Recibo enviado junto com a conversão
        if let Some(receipt) = receipt {
            self.repo
                .set_receipt(&mut *tx, payment.id, receipt)
                .await
                .map_err(conversion_failure)?;
        }

        tx.commit().await.map_err(|e| conversion_failure(e.into()))?;

        tracing::info!(
            lead_id,
            payment_id = payment.id,
            user_id = caller.user_id,
            with_receipt = receipt.is_some(),
            "💰 Lead convertido em pagamento"
        );
        Ok(payment.id)
    }

    // =========================================================================
    //  2. PAYMENT → TASK ("go-thru")
    // =========================================================================

    /// Cria uma tarefa a partir do pagamento. O pagamento não é alterado.
    pub async fn payment_to_task(
        &self,
        caller: &Caller,
        payment_id: i64,
        payload: GoThruPayload,
    ) -> Result<i64, AppError> {
        let scope = access_policy::authorize(caller, EntityKind::Payment, Operation::Write)?;
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        // FOR SHARE: impede que o pagamento suma no meio da transação
        let payment: Payment = self
            .repo
            .lock_by_id(&mut *tx, payment_id, scope, RowLock::Share)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Payment))?;

        let task_input = payload.into_task(&payment, today_in(self.time_zone));
        let task: Task = self
            .repo
            .insert::<Task, _>(&mut *tx, caller.user_id, task_input)
            .await
            .map_err(task_creation_failure)?;

        tx.commit().await.map_err(|e| task_creation_failure(e.into()))?;

        tracing::info!(payment_id, task_id = task.id, user_id = caller.user_id, "🛠️ Pagamento enviado ao gerenciador de tarefas");
        Ok(task.id)
    }

    // =========================================================================
    //  3. LEAD → SALES TASK
    // =========================================================================

    /// Agenda o follow-up e marca o lead como `Interested`. Retorna o ID da tarefa.
    pub async fn lead_to_sales_task(
        &self,
        caller: &Caller,
        lead_id: i64,
        payload: MoveToSalesTaskPayload,
    ) -> Result<i64, AppError> {
        let scope = access_policy::authorize(caller, EntityKind::Lead, Operation::Write)?;
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        let lead: Lead = self
            .repo
            .lock_by_id(&mut *tx, lead_id, scope, RowLock::Update)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Lead))?;

        let sales_task: SalesTask = self
            .repo
            .insert::<SalesTask, _>(
                &mut *tx,
                caller.user_id,
                payload.into_sales_task(&lead, today_in(self.time_zone)),
            )
            .await?;

        self.repo
            .set_status::<Lead, _>(&mut *tx, lead_id, STATUS_INTERESTED)
            .await?;

        tx.commit().await?;

        tracing::info!(lead_id, sales_task_id = sales_task.id, user_id = caller.user_id, "📞 Lead movido para follow-up");
        Ok(sales_task.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failures_keep_database_detail() {
        let err = conversion_failure(AppError::Conflict("value too long".into()));
        assert!(matches!(err, AppError::ConversionFailed(ref d) if d == "value too long"));
    }

    #[test]
    fn not_found_is_not_rewritten() {
        let err = task_creation_failure(AppError::NotFound(EntityKind::Payment));
        assert!(matches!(err, AppError::NotFound(EntityKind::Payment)));
    }

    #[test]
    fn task_creation_conflict_is_generic_failure() {
        let err = task_creation_failure(AppError::Conflict("check constraint".into()));
        assert!(matches!(err, AppError::TaskCreationFailed(_)));
    }
}
