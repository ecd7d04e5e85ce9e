// src/db/resource.rs
//
// Configuração por entidade consumida pelo CRUD genérico
// (RecordRepository / RecordService / handlers::records).

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    postgres::PgRow,
    query_builder::Separated,
    FromRow, Postgres, QueryBuilder,
};
use validator::Validate;

use crate::{
    common::db_utils::ListQuery,
    models::{
        access::EntityKind,
        auth::Caller,
        sales::{Customer, CustomerInput, Lead, LeadInput, Payment, PaymentInput, SalesTask, SalesTaskInput},
        tech::{Task, TaskInput, TechData, TechDataInput, Tender, TenderInput},
    },
    services::access_policy,
};

pub trait Resource:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Sync + Unpin + 'static
{
    /// Corpo aceito em POST/PUT (e o resultado do merge no PATCH).
    type Input: DeserializeOwned + Validate + Send + Sync + 'static;

    const KIND: EntityKind;
    const TABLE: &'static str;
    /// Colunas graváveis, na mesma ordem de `bind_values`. Nunca inclui `owner_id`.
    const COLUMNS: &'static [&'static str];
    const SEARCH_FIELDS: &'static [&'static str];
    const ORDER_FIELDS: &'static [&'static str];

    fn bind_values<'args>(
        input: Self::Input,
        row: &mut Separated<'_, 'args, Postgres, &'static str>,
    );

    /// Filtros extras da coleção (após o WHERE de escopo).
    fn push_filters(_query: &ListQuery, _qb: &mut QueryBuilder<'_, Postgres>) {}

    /// Completa campos que dependem de "hoje" antes de gravar.
    fn fill_defaults(_input: &mut Self::Input, _today: NaiveDate) {}

    /// Ajuste de apresentação por chamador.
    fn present(self, _caller: &Caller) -> Self {
        self
    }
}

// =========================================================================
//  VENDAS
// =========================================================================

impl Resource for Lead {
    type Input = LeadInput;

    const KIND: EntityKind = EntityKind::Lead;
    const TABLE: &'static str = "leads";
    const COLUMNS: &'static [&'static str] = &[
        "date", "sno", "company", "name", "contact", "email", "address", "note", "purpose", "status",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["company", "name", "email", "contact"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "date", "company", "name", "status", "created_at"];

    fn bind_values<'args>(input: LeadInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.date)
            .push_bind(input.sno)
            .push_bind(input.company)
            .push_bind(input.name)
            .push_bind(input.contact)
            .push_bind(input.email)
            .push_bind(input.address)
            .push_bind(input.note)
            .push_bind(input.purpose)
            .push_bind(input.status);
    }

    fn push_filters(query: &ListQuery, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND status = ").push_bind(status.to_string());
        }
        if let Some(date_after) = query.date_after {
            qb.push(" AND created_at::date >= ").push_bind(date_after);
        }
    }

    fn present(mut self, caller: &Caller) -> Self {
        if access_policy::masks_lead_contact(caller) {
            self.contact = access_policy::mask_contact(&self.contact);
        }
        self
    }
}

impl Resource for Customer {
    type Input = CustomerInput;

    const KIND: EntityKind = EntityKind::Customer;
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &[
        "date", "sno", "company", "name", "contact", "email", "purpose", "status", "remarks",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["company", "name"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "date", "company", "name", "status", "created_at"];

    fn bind_values<'args>(input: CustomerInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.date)
            .push_bind(input.sno)
            .push_bind(input.company)
            .push_bind(input.name)
            .push_bind(input.contact)
            .push_bind(input.email)
            .push_bind(input.purpose)
            .push_bind(input.status)
            .push_bind(input.remarks);
    }
}

impl Resource for Payment {
    type Input = PaymentInput;

    const KIND: EntityKind = EntityKind::Payment;
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static [&'static str] =
        &["company", "so_no", "amount", "advance", "remaining", "invoice", "remark"];
    const SEARCH_FIELDS: &'static [&'static str] = &["company", "invoice", "so_no"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "company", "amount", "remaining", "created_at"];

    fn bind_values<'args>(input: PaymentInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.company)
            .push_bind(input.so_no)
            .push_bind(input.amount)
            .push_bind(input.advance)
            .push_bind(input.remaining)
            .push_bind(input.invoice)
            .push_bind(input.remark);
    }
}

impl Resource for SalesTask {
    type Input = SalesTaskInput;

    const KIND: EntityKind = EntityKind::SalesTask;
    const TABLE: &'static str = "sales_tasks";
    const COLUMNS: &'static [&'static str] = &[
        "date", "lead_name", "company", "contact", "task_type", "next_follow_up", "status",
        "remarks", "follow_up_count", "priority",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["lead_name", "company", "contact"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "date", "next_follow_up", "priority", "status", "created_at"];

    fn bind_values<'args>(input: SalesTaskInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.date)
            .push_bind(input.lead_name)
            .push_bind(input.company)
            .push_bind(input.contact)
            .push_bind(input.task_type)
            .push_bind(input.next_follow_up)
            .push_bind(input.status)
            .push_bind(input.remarks)
            .push_bind(input.follow_up_count)
            .push_bind(input.priority);
    }
}

// =========================================================================
//  TÉCNICO
// =========================================================================

impl Resource for Task {
    type Input = TaskInput;

    const KIND: EntityKind = EntityKind::Task;
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "date", "company_name", "client_name", "client_id", "gem_id", "gem_password",
        "task_name", "priority", "deadline", "status",
    ];
    const SEARCH_FIELDS: &'static [&'static str] =
        &["company_name", "client_name", "gem_id", "task_name"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "date", "deadline", "priority", "status", "created_at"];

    fn bind_values<'args>(input: TaskInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.date)
            .push_bind(input.company_name)
            .push_bind(input.client_name)
            .push_bind(input.client_id)
            .push_bind(input.gem_id)
            .push_bind(input.gem_password)
            .push_bind(input.task_name)
            .push_bind(input.priority)
            .push_bind(input.deadline)
            .push_bind(input.status);
    }

    // A coluna é NOT NULL: sem data, vale o dia corrente
    fn fill_defaults(input: &mut TaskInput, today: NaiveDate) {
        input.date.get_or_insert(today);
    }
}

impl Resource for Tender {
    type Input = TenderInput;

    const KIND: EntityKind = EntityKind::Tender;
    const TABLE: &'static str = "tenders";
    const COLUMNS: &'static [&'static str] =
        &["date", "company", "bid_no", "item", "start_date", "end_date", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["company", "bid_no", "item"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "date", "company", "end_date", "status", "created_at"];

    fn bind_values<'args>(input: TenderInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.date)
            .push_bind(input.company)
            .push_bind(input.bid_no)
            .push_bind(input.item)
            .push_bind(input.start_date)
            .push_bind(input.end_date)
            .push_bind(input.status);
    }
}

impl Resource for TechData {
    type Input = TechDataInput;

    const KIND: EntityKind = EntityKind::TechData;
    const TABLE: &'static str = "tech_data";
    const COLUMNS: &'static [&'static str] =
        &["company", "machine", "serial", "warranty", "service_due", "status"];
    const SEARCH_FIELDS: &'static [&'static str] = &["company", "serial", "machine"];
    const ORDER_FIELDS: &'static [&'static str] =
        &["id", "company", "warranty", "service_due", "status", "created_at"];

    fn bind_values<'args>(input: TechDataInput, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(input.company)
            .push_bind(input.machine)
            .push_bind(input.serial)
            .push_bind(input.warranty)
            .push_bind(input.service_due)
            .push_bind(input.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Group;
    use chrono::Utc;

    fn assert_whitelists<R: Resource>() {
        assert!(R::ORDER_FIELDS.contains(&"id"), "{} sem ordenação por id", R::TABLE);
        assert!(!R::COLUMNS.contains(&"owner_id"), "{} grava owner_id", R::TABLE);
        for field in R::SEARCH_FIELDS {
            assert!(R::COLUMNS.contains(field), "{}: busca em coluna desconhecida {field}", R::TABLE);
        }
    }

    #[test]
    fn every_resource_has_consistent_configuration() {
        assert_whitelists::<Lead>();
        assert_whitelists::<Customer>();
        assert_whitelists::<Payment>();
        assert_whitelists::<SalesTask>();
        assert_whitelists::<Task>();
        assert_whitelists::<Tender>();
        assert_whitelists::<TechData>();
    }

    #[test]
    fn bind_values_matches_column_count() {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        let input = TaskInput {
            date: None,
            company_name: String::new(),
            client_name: String::new(),
            client_id: String::new(),
            gem_id: String::new(),
            gem_password: String::new(),
            task_name: String::new(),
            priority: "Medium".into(),
            deadline: None,
            status: "Pending".into(),
        };
        {
            let mut row = qb.separated(", ");
            Task::bind_values(input, &mut row);
        }
        let sql = qb.sql().to_string();
        assert_eq!(sql.matches('$').count(), Task::COLUMNS.len());
    }

    #[test]
    fn task_date_defaults_to_today_only_when_missing() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut input: TaskInput = serde_json::from_value(serde_json::json!({})).unwrap();
        Task::fill_defaults(&mut input, today);
        assert_eq!(input.date, Some(today));

        let earlier = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        input.date = Some(earlier);
        Task::fill_defaults(&mut input, today);
        assert_eq!(input.date, Some(earlier));
    }

    #[test]
    fn lead_contact_is_masked_for_tech_members() {
        let lead = Lead {
            id: 1,
            owner_id: 1,
            date: None,
            sno: String::new(),
            company: "Acme".into(),
            name: "Ravi".into(),
            contact: "9876543210".into(),
            email: String::new(),
            address: None,
            note: String::new(),
            purpose: String::new(),
            status: "New".into(),
            created_at: Utc::now(),
        };
        let tech = Caller {
            user_id: 2,
            username: "tech".into(),
            is_admin: false,
            groups: [Group::Tech].into_iter().collect(),
        };
        let sales = Caller { groups: [Group::Sales].into_iter().collect(), ..tech.clone() };

        assert_eq!(lead.clone().present(&tech).contact, "98765*****");
        assert_eq!(lead.present(&sales).contact, "9876543210");
    }
}
