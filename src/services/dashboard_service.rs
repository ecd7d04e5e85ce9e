// src/services/dashboard_service.rs

use chrono_tz::Tz;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    config::settings::today_in,
    db::DashboardRepository,
    models::{
        auth::{Caller, Group},
        dashboard::{DashboardRole, DashboardStats},
    },
};

// Quais blocos do painel o chamador recebe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSections {
    pub role: DashboardRole,
    pub sales: bool,
    pub tech: bool,
    pub leaderboard: bool,
}

pub fn sections_for(caller: &Caller) -> DashboardSections {
    let role = if caller.is_admin {
        DashboardRole::Manager
    } else if caller.in_group(Group::Tech) {
        DashboardRole::Tech
    } else {
        DashboardRole::Sales
    };

    DashboardSections {
        role,
        sales: caller.is_admin || caller.in_group(Group::Sales),
        tech: caller.is_admin || caller.in_group(Group::Tech),
        leaderboard: caller.is_admin,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    pool: PgPool,
    time_zone: Tz,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, pool: PgPool, time_zone: Tz) -> Self {
        Self { repo, pool, time_zone }
    }

    pub async fn stats(&self, caller: &Caller) -> Result<DashboardStats, AppError> {
        let sections = sections_for(caller);
        let today = today_in(self.time_zone);

        // Snapshot consistente de todas as contagens
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sales = if sections.sales {
            Some(self.repo.sales_stats(&mut *tx, today).await?)
        } else {
            None
        };
        let tech = if sections.tech {
            Some(self.repo.tech_stats(&mut *tx, today).await?)
        } else {
            None
        };
        let leaderboard = if sections.leaderboard {
            Some(self.repo.leaderboard(&mut *tx).await?)
        } else {
            None
        };

        tx.commit().await?;

        Ok(DashboardStats {
            role: sections.role,
            sales,
            tech,
            leaderboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn caller(is_admin: bool, groups: &[Group]) -> Caller {
        Caller {
            user_id: 1,
            username: "u".into(),
            is_admin,
            groups: groups.iter().copied().collect(),
        }
    }

    #[rstest]
    #[case(true, &[], DashboardRole::Manager, true, true, true)]
    #[case(false, &[Group::Sales], DashboardRole::Sales, true, false, false)]
    #[case(false, &[Group::Tech], DashboardRole::Tech, false, true, false)]
    #[case(false, &[Group::Sales, Group::Tech], DashboardRole::Tech, true, true, false)]
    #[case(false, &[], DashboardRole::Sales, false, false, false)]
    fn sections_follow_membership(
        #[case] admin: bool,
        #[case] groups: &[Group],
        #[case] role: DashboardRole,
        #[case] sales: bool,
        #[case] tech: bool,
        #[case] leaderboard: bool,
    ) {
        let sections = sections_for(&caller(admin, groups));
        assert_eq!(
            sections,
            DashboardSections { role, sales, tech, leaderboard }
        );
    }
}
