// src/models/sales.rs
//
// Registros do domínio de vendas: Lead, Customer, Payment, SalesTask.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::validation::{validate_blank_or_email, validate_priority};

fn default_lead_status() -> String {
    "New".to_string()
}

fn default_customer_status() -> String {
    "Active".to_string()
}

fn default_sales_task_type() -> String {
    "Follow Up".to_string()
}

fn default_pending() -> String {
    "Pending".to_string()
}

pub(crate) fn default_priority() -> String {
    "Medium".to_string()
}

// =========================================================================
//  LEAD
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Lead {
    pub id: i64,
    pub owner_id: i64,
    pub date: Option<DateTime<Utc>>,
    pub sno: String,
    pub company: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub address: Option<String>,
    pub note: String,
    pub purpose: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LeadInput {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub sno: String,
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[validate(length(min = 1, max = 100, message = "This field may not be blank (max 100 characters)."))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub contact: String,
    #[serde(default)]
    #[validate(length(max = 254), custom(function = "validate_blank_or_email"))]
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub purpose: String,
    #[serde(default = "default_lead_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

// =========================================================================
//  CUSTOMER
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub owner_id: i64,
    pub date: Option<NaiveDate>,
    pub sno: String,
    pub company: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub purpose: String,
    pub status: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CustomerInput {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub sno: String,
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[validate(length(min = 1, max = 100, message = "This field may not be blank (max 100 characters)."))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub contact: String,
    #[serde(default)]
    #[validate(length(max = 254), custom(function = "validate_blank_or_email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub purpose: String,
    #[serde(default = "default_customer_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
    #[serde(default)]
    pub remarks: String,
}

// =========================================================================
//  PAYMENT
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub owner_id: i64,
    pub company: String,
    pub so_no: String,
    pub amount: Decimal,
    pub advance: Decimal,
    pub remaining: Decimal,
    pub invoice: String,
    pub remark: String,
    /// Referência do recibo anexado (`/media/receipts/...`)
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
}

// O recibo não entra aqui: é enviado por upload próprio
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentInput {
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub so_no: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub advance: Decimal,
    #[serde(default)]
    pub remaining: Decimal,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub invoice: String,
    #[serde(default)]
    pub remark: String,
}

// =========================================================================
//  SALES TASK (follow-ups)
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalesTask {
    pub id: i64,
    pub owner_id: i64,
    pub date: Option<NaiveDate>,
    pub lead_name: String,
    pub company: String,
    pub contact: String,
    pub task_type: String,
    pub next_follow_up: Option<NaiveDate>,
    pub status: String,
    pub remarks: String,
    pub follow_up_count: i32,
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SalesTaskInput {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub lead_name: String,
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub contact: String,
    #[serde(default = "default_sales_task_type")]
    #[validate(length(min = 1, max = 100))]
    pub task_type: String,
    #[serde(default)]
    pub next_follow_up: Option<NaiveDate>,
    #[serde(default = "default_pending")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub follow_up_count: i32,
    #[serde(default = "default_priority")]
    #[validate(custom(function = "validate_priority"))]
    pub priority: String,
}
