// src/db/record_repo.rs

use sqlx::{Executor, PgConnection, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::{like_pattern, resolve_ordering, ListQuery},
        error::AppError,
    },
    db::resource::Resource,
    models::{access::Visibility, sales::Payment},
};

// Postgres aceita até 65535 parâmetros por comando; 1000 linhas cabem com folga
const BULK_CHUNK_SIZE: usize = 1000;

/// Trava de linha usada pelas transições.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    Update,
    Share,
}

impl RowLock {
    fn clause(self) -> &'static str {
        match self {
            RowLock::Update => " FOR UPDATE",
            RowLock::Share => " FOR SHARE",
        }
    }
}

// Repositório genérico: toda SQL de registro passa por aqui, parametrizada pelo `Resource`.
#[derive(Clone, Default)]
pub struct RecordRepository;

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Visibility) {
    match scope {
        Visibility::All => {
            qb.push(" WHERE TRUE");
        }
        Visibility::OwnedBy(owner_id) => {
            qb.push(" WHERE owner_id = ").push_bind(owner_id);
        }
    }
}

fn push_list_filters<T: Resource>(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: Visibility,
    query: &ListQuery,
) {
    push_scope(qb, scope);

    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        qb.push(" AND (");
        for (i, field) in T::SEARCH_FIELDS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*field).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }

    T::push_filters(query, qb);
}

impl RecordRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn count<'e, T, E>(
        &self,
        executor: E,
        scope: Visibility,
        query: &ListQuery,
    ) -> Result<i64, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
        push_list_filters::<T>(&mut qb, scope, query);

        let count: i64 = qb.build_query_scalar().fetch_one(executor).await?;
        Ok(count)
    }

    pub async fn list<'e, T, E>(
        &self,
        executor: E,
        scope: Visibility,
        query: &ListQuery,
    ) -> Result<Vec<T>, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", T::TABLE));
        push_list_filters::<T>(&mut qb, scope, query);

        let (column, descending) = resolve_ordering(query.ordering.as_deref(), T::ORDER_FIELDS);
        qb.push(" ORDER BY ")
            .push(column)
            .push(if descending { " DESC" } else { " ASC" });
        if column != "id" {
            // desempate estável entre páginas
            qb.push(", id DESC");
        }

        qb.push(" LIMIT ")
            .push_bind(query.page_size())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = qb.build_query_as::<T>().fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, T, E>(
        &self,
        executor: E,
        id: i64,
        scope: Visibility,
    ) -> Result<Option<T>, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", T::TABLE));
        push_scope(&mut qb, scope);
        qb.push(" AND id = ").push_bind(id);

        let row = qb.build_query_as::<T>().fetch_optional(executor).await?;
        Ok(row)
    }

    /// Igual a `find_by_id`, travando a linha até o fim da transação.
    pub async fn lock_by_id<'e, T, E>(
        &self,
        executor: E,
        id: i64,
        scope: Visibility,
        lock: RowLock,
    ) -> Result<Option<T>, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", T::TABLE));
        push_scope(&mut qb, scope);
        qb.push(" AND id = ").push_bind(id).push(lock.clause());

        let row = qb.build_query_as::<T>().fetch_optional(executor).await?;
        Ok(row)
    }

    // =========================================================================
    //  ESCRITA
    // =========================================================================

    pub async fn insert<'e, T, E>(
        &self,
        executor: E,
        owner_id: i64,
        input: T::Input,
    ) -> Result<T, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!(
            "INSERT INTO {} (owner_id, {}) ",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        qb.push_values(std::iter::once(input), |mut row, input| {
            row.push_bind(owner_id);
            T::bind_values(input, &mut row);
        });
        qb.push(" RETURNING *");

        let created = qb.build_query_as::<T>().fetch_one(executor).await?;
        Ok(created)
    }

    /// Substitui todas as colunas graváveis. `owner_id` nunca é tocado.
    pub async fn update<'e, T, E>(
        &self,
        executor: E,
        id: i64,
        scope: Visibility,
        input: T::Input,
    ) -> Result<Option<T>, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!(
            "UPDATE {} SET ({}) = ROW(",
            T::TABLE,
            T::COLUMNS.join(", ")
        ));
        {
            let mut values = qb.separated(", ");
            T::bind_values(input, &mut values);
        }
        qb.push(")");
        push_scope(&mut qb, scope);
        qb.push(" AND id = ").push_bind(id).push(" RETURNING *");

        let updated = qb.build_query_as::<T>().fetch_optional(executor).await?;
        Ok(updated)
    }

    pub async fn delete<'e, T, E>(
        &self,
        executor: E,
        id: i64,
        scope: Visibility,
    ) -> Result<bool, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::new(format!("DELETE FROM {}", T::TABLE));
        push_scope(&mut qb, scope);
        qb.push(" AND id = ").push_bind(id);

        let result = qb.build().execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status<'e, T, E>(
        &self,
        executor: E,
        id: i64,
        status: &str,
    ) -> Result<(), AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(&format!("UPDATE {} SET status = $1 WHERE id = $2", T::TABLE))
            .bind(status)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_receipt<'e, E>(
        &self,
        executor: E,
        payment_id: i64,
        receipt: &str,
    ) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET receipt = $1 WHERE id = $2 RETURNING *",
        )
        .bind(receipt)
        .bind(payment_id)
        .fetch_optional(executor)
        .await?;
        Ok(payment)
    }

    // =========================================================================
    //  LOTE
    // =========================================================================

    /// Insere tudo em blocos na conexão recebida (normalmente uma transação).
    pub async fn bulk_insert<T: Resource>(
        &self,
        conn: &mut PgConnection,
        owner_id: i64,
        inputs: Vec<T::Input>,
    ) -> Result<u64, AppError> {
        let mut inserted = 0;
        let mut remaining = inputs.into_iter().peekable();

        while remaining.peek().is_some() {
            let chunk: Vec<T::Input> = remaining.by_ref().take(BULK_CHUNK_SIZE).collect();

            let mut qb = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO {} (owner_id, {}) ",
                T::TABLE,
                T::COLUMNS.join(", ")
            ));
            qb.push_values(chunk, |mut row, input| {
                row.push_bind(owner_id);
                T::bind_values(input, &mut row);
            });

            inserted += qb.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(inserted)
    }

    /// Apaga por ids, sem filtro de dono. IDs inexistentes não contam.
    pub async fn bulk_delete<'e, T, E>(&self, executor: E, ids: &[i64]) -> Result<u64, AppError>
    where
        T: Resource,
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ANY($1)", T::TABLE))
            .bind(ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
