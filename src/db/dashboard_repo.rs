// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::{
    common::error::AppError,
    models::dashboard::{LeaderboardEntry, RecentPayment, SalesStats, TechStats},
};

// Agregações do painel. Tudo roda na conexão recebida, que é uma
// transação somente leitura aberta pelo DashboardService.
#[derive(Clone, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    pub fn new() -> Self {
        Self
    }

    // 1. Vendas
    pub async fn sales_stats(
        &self,
        conn: &mut PgConnection,
        today: NaiveDate,
    ) -> Result<SalesStats, AppError> {
        // A. Leads por status
        let (total_leads, new_leads, interested_leads, converted_leads): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'New'),
                    COUNT(*) FILTER (WHERE status = 'Interested'),
                    COUNT(*) FILTER (WHERE status = 'Converted')
                FROM leads
                "#,
            )
            .fetch_one(&mut *conn)
            .await?;

        // B. Follow-ups de hoje
        let follow_ups_today: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales_tasks WHERE next_follow_up = $1")
                .bind(today)
                .fetch_one(&mut *conn)
                .await?;

        // C. Faturamento total
        let total_revenue: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payments")
                .fetch_one(&mut *conn)
                .await?;

        // D. Últimos 5 pagamentos
        let recent_payments = sqlx::query_as::<_, RecentPayment>(
            r#"
            SELECT p.company, p.amount, p.created_at AS date, u.username AS created_by
            FROM payments p
            JOIN users u ON u.id = p.owner_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(SalesStats {
            total_leads,
            new_leads,
            interested_leads,
            converted_leads,
            follow_ups_today,
            total_revenue,
            recent_payments,
        })
    }

    // 2. Técnico
    pub async fn tech_stats(
        &self,
        conn: &mut PgConnection,
        today: NaiveDate,
    ) -> Result<TechStats, AppError> {
        let (pending_tasks, high_priority_tasks): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'Pending'),
                COUNT(*) FILTER (WHERE status = 'Pending' AND priority = 'High')
            FROM tasks
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        let upcoming_services: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tech_data WHERE service_due >= $1")
                .bind(today)
                .fetch_one(&mut *conn)
                .await?;

        let active_tenders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tenders WHERE status NOT IN ('Won', 'Lost')",
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(TechStats {
            pending_tasks,
            high_priority_tasks,
            upcoming_services,
            active_tenders,
        })
    }

    // 3. Ranking por criador do pagamento
    pub async fn leaderboard(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT u.username, SUM(p.amount) AS total_sales
            FROM payments p
            JOIN users u ON u.id = p.owner_id
            GROUP BY u.username
            ORDER BY total_sales DESC, u.username ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }
}
