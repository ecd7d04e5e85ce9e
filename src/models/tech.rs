// src/models/tech.rs
//
// Registros do domínio técnico: Task, Tender, TechData.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{sales::default_priority, validation::validate_priority};

fn default_task_status() -> String {
    "Pending".to_string()
}

fn default_tender_status() -> String {
    "Draft".to_string()
}

fn default_tech_status() -> String {
    "Active".to_string()
}

// =========================================================================
//  TASK (tarefas operacionais)
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Task {
    pub id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub company_name: String,
    pub client_name: String,
    pub client_id: String,
    pub gem_id: String,
    pub gem_password: String,
    pub task_name: String,
    pub priority: String,
    pub deadline: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// `date` ausente vira "hoje" no fuso configurado (ver RecordService)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TaskInput {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub company_name: String,
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
    #[serde(default)]
    pub task_name: String,
    #[serde(default = "default_priority")]
    #[validate(custom(function = "validate_priority"))]
    pub priority: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default = "default_task_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

// =========================================================================
//  TENDER (licitações)
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Tender {
    pub id: i64,
    pub owner_id: i64,
    pub date: Option<NaiveDate>,
    pub company: String,
    pub bid_no: String,
    pub item: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TenderInput {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[validate(length(min = 1, max = 100, message = "This field may not be blank (max 100 characters)."))]
    pub bid_no: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub item: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_tender_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}

// =========================================================================
//  TECH DATA (equipamentos)
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TechData {
    pub id: i64,
    pub owner_id: i64,
    pub company: String,
    pub machine: String,
    pub serial: String,
    pub warranty: Option<NaiveDate>,
    pub service_due: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TechDataInput {
    #[validate(length(min = 1, max = 200, message = "This field may not be blank (max 200 characters)."))]
    pub company: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub machine: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub serial: String,
    #[serde(default)]
    pub warranty: Option<NaiveDate>,
    #[serde(default)]
    pub service_due: Option<NaiveDate>,
    #[serde(default = "default_tech_status")]
    #[validate(length(min = 1, max = 50))]
    pub status: String,
}
