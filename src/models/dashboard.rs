// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Rótulo de papel exibido no painel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DashboardRole {
    Manager,
    Tech,
    Sales,
}

// 1. Cards de vendas
#[derive(Debug, Serialize, ToSchema)]
pub struct SalesStats {
    pub total_leads: i64,
    pub new_leads: i64,
    pub interested_leads: i64,
    pub converted_leads: i64,
    pub follow_ups_today: i64,
    pub total_revenue: Decimal,
    pub recent_payments: Vec<RecentPayment>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct RecentPayment {
    pub company: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub created_by: String,
}

// 2. Cards técnicos
#[derive(Debug, Serialize, ToSchema)]
pub struct TechStats {
    pub pending_tasks: i64,
    pub high_priority_tasks: i64,
    pub upcoming_services: i64,
    pub active_tenders: i64,
}

// 3. Ranking de faturamento por criador (só admin)
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_sales: Decimal,
}

// Seções ausentes não aparecem no JSON
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub role: DashboardRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<SalesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech: Option<TechStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}
