// src/models/workflow.rs
//
// Payloads das transições (Lead → Payment, Payment → Task, Lead → SalesTask)
// e a montagem do registro derivado. A montagem é pura: quem chama passa o
// registro de origem e a data de "hoje".

use std::{collections::HashMap, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{
    sales::{Lead, Payment, PaymentInput, SalesTaskInput},
    tech::TaskInput,
    validation::validate_priority,
};

pub const STATUS_CONVERTED: &str = "Converted";
pub const STATUS_INTERESTED: &str = "Interested";

// --- Lead → Payment ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ConvertLeadPayload {
    #[validate(length(max = 100))]
    pub so_no: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub advance: Decimal,
    #[serde(default)]
    pub remaining: Decimal,
    #[validate(length(max = 100))]
    pub invoice: Option<String>,
    pub remark: Option<String>,
}

impl ConvertLeadPayload {
    /// Campos de texto de um formulário multipart. Campo vazio conta como omitido.
    pub fn from_form_fields(fields: &HashMap<String, String>) -> Result<Self, String> {
        let text = |name: &str| {
            fields
                .get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };
        let decimal = |name: &str| match text(name) {
            Some(value) => Decimal::from_str(value)
                .map_err(|_| format!("{name}: número decimal inválido ({value})")),
            None => Ok(Decimal::ZERO),
        };

        Ok(Self {
            so_no: text("so_no").map(str::to_owned),
            amount: decimal("amount")?,
            advance: decimal("advance")?,
            remaining: decimal("remaining")?,
            invoice: text("invoice").map(str::to_owned),
            remark: text("remark").map(str::to_owned),
        })
    }

    /// Pagamento derivado do lead. Campos omitidos recebem os padrões de conversão.
    pub fn into_payment(self, lead: &Lead) -> PaymentInput {
        PaymentInput {
            company: lead.company.clone(),
            so_no: self.so_no.unwrap_or_else(|| "N/A".to_string()),
            amount: self.amount,
            advance: self.advance,
            remaining: self.remaining,
            invoice: self.invoice.unwrap_or_else(|| "Pending".to_string()),
            remark: self
                .remark
                .unwrap_or_else(|| format!("Converted from Lead: {}", lead.name)),
        }
    }
}

// --- Payment → Task ("go-thru") ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct GoThruPayload {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub client_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub client_id: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub gem_id: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub gem_password: String,
    pub task_name: Option<String>,
    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,
}

impl GoThruPayload {
    pub fn into_task(self, payment: &Payment, today: NaiveDate) -> TaskInput {
        TaskInput {
            date: Some(today),
            company_name: payment.company.clone(),
            client_name: self.client_name,
            client_id: self.client_id,
            gem_id: self.gem_id,
            gem_password: self.gem_password,
            task_name: self
                .task_name
                .unwrap_or_else(|| "Auto Created Task".to_string()),
            priority: self.priority.unwrap_or_else(|| "Medium".to_string()),
            deadline: None,
            // sempre nasce pendente, o payload não escolhe
            status: "Pending".to_string(),
        }
    }
}

// --- Lead → SalesTask ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MoveToSalesTaskPayload {
    pub next_follow_up: Option<NaiveDate>,
    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,
    pub remarks: Option<String>,
}

impl MoveToSalesTaskPayload {
    pub fn into_sales_task(self, lead: &Lead, today: NaiveDate) -> SalesTaskInput {
        SalesTaskInput {
            date: Some(today),
            lead_name: lead.name.clone(),
            company: lead.company.clone(),
            contact: lead.contact.clone(),
            task_type: "Call".to_string(),
            next_follow_up: self.next_follow_up,
            status: "Pending".to_string(),
            remarks: self
                .remarks
                .unwrap_or_else(|| format!("Moved from Leads. Purpose: {}", lead.purpose)),
            follow_up_count: 0,
            priority: self.priority.unwrap_or_else(|| "Medium".to_string()),
        }
    }
}

// --- Respostas e lote ---

#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub message: String,
    /// ID do registro criado pela transição
    pub record_id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeletePayload {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkImportResponse {
    pub message: String,
    pub created_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}
