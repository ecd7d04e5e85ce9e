// tests/dashboard_test.rs

mod common;

use crm_backend::models::{auth::Group, dashboard::DashboardRole};
use serde_json::json;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn admin_gets_every_section_and_a_leaderboard() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;

    state
        .record_service
        .create::<crm_backend::models::sales::Payment>(
            &admin,
            serde_json::from_value(json!({ "company": common::unique("Board"), "amount": 1200 })).unwrap(),
        )
        .await
        .unwrap();

    let stats = state.dashboard_service.stats(&admin).await.unwrap();
    assert_eq!(stats.role, DashboardRole::Manager);
    assert!(stats.sales.is_some());
    assert!(stats.tech.is_some());

    let leaderboard = stats.leaderboard.expect("leaderboard para admin");
    assert!(leaderboard.iter().any(|entry| entry.username == admin.username));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn tech_member_only_gets_tech_section() {
    let state = common::app_state().await;
    let tech = common::caller(&state, &[Group::Tech], false).await;

    let stats = state.dashboard_service.stats(&tech).await.unwrap();
    assert_eq!(stats.role, DashboardRole::Tech);
    assert!(stats.sales.is_none());
    assert!(stats.tech.is_some());
    assert!(stats.leaderboard.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn caller_without_groups_gets_only_the_role() {
    let state = common::app_state().await;
    let plain = common::caller(&state, &[], false).await;

    let stats = state.dashboard_service.stats(&plain).await.unwrap();
    assert!(stats.sales.is_none());
    assert!(stats.tech.is_none());
    assert!(stats.leaderboard.is_none());
}
