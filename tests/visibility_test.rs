// tests/visibility_test.rs

mod common;

use crm_backend::{
    common::{db_utils::ListQuery, error::AppError},
    models::{
        auth::Group,
        sales::Lead,
        tech::{Task, TechData},
    },
};
use serde_json::json;

fn search(term: &str) -> ListQuery {
    ListQuery {
        search: Some(term.to_string()),
        ..ListQuery::default()
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn user_without_groups_only_sees_own_leads() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let plain = common::caller(&state, &[], false).await;
    let tag = common::unique("Scope");

    let foreign: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&tag)).unwrap())
        .await
        .unwrap();

    let page = state.record_service.list::<Lead>(&plain, &search(&tag)).await.unwrap();
    assert_eq!(page.count, 0);

    // Fora do escopo responde como inexistente
    let err = state
        .record_service
        .retrieve::<Lead>(&plain, foreign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Sales enxerga a linha do colega
    let page = state.record_service.list::<Lead>(&sales, &search(&tag)).await.unwrap();
    assert_eq!(page.count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn tech_member_reads_leads_with_masked_contact() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let tech = common::caller(&state, &[Group::Tech], false).await;
    let tag = common::unique("Mask");

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&tag)).unwrap())
        .await
        .unwrap();

    let seen: Lead = state.record_service.retrieve::<Lead>(&tech, lead.id).await.unwrap();
    assert_eq!(seen.contact, "98765*****");

    let seen: Lead = state.record_service.retrieve::<Lead>(&sales, lead.id).await.unwrap();
    assert_eq!(seen.contact, "9876543210");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn sales_member_cannot_write_tech_records() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;

    let input = serde_json::from_value(json!({
        "company_name": common::unique("Tech"),
        "task_name": "Install"
    }))
    .unwrap();
    let err = state
        .record_service
        .create::<Task>(&sales, input)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn tech_data_is_readable_by_everyone() {
    let state = common::app_state().await;
    let tech = common::caller(&state, &[Group::Tech], false).await;
    let plain = common::caller(&state, &[], false).await;
    let tag = common::unique("Shared");

    let input = serde_json::from_value(json!({ "company": tag })).unwrap();
    let created: TechData = state.record_service.create::<TechData>(&tech, input).await.unwrap();

    let seen: TechData = state
        .record_service
        .retrieve::<TechData>(&plain, created.id)
        .await
        .unwrap();
    assert_eq!(seen.id, created.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn patch_merges_and_revalidates() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let tag = common::unique("Patch");

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&tag)).unwrap())
        .await
        .unwrap();

    let patched: Lead = state
        .record_service
        .patch::<Lead>(&sales, lead.id, json!({ "status": "Interested", "owner_id": 0 }))
        .await
        .unwrap();
    assert_eq!(patched.status, "Interested");
    assert_eq!(patched.company, tag);
    assert_eq!(patched.owner_id, sales.user_id);

    let err = state
        .record_service
        .patch::<Lead>(&sales, lead.id, json!({ "email": "not-an-email" }))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn lead_filters_by_status() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let tag = common::unique("Filter");

    for status in ["New", "Lost", "Lost"] {
        let mut body = common::lead_body(&tag);
        body["status"] = json!(status);
        state
            .record_service
            .create::<Lead>(&sales, serde_json::from_value(body).unwrap())
            .await
            .unwrap();
    }

    let query = ListQuery {
        status: Some("Lost".to_string()),
        ..search(&tag)
    };
    let page = state.record_service.list::<Lead>(&sales, &query).await.unwrap();
    assert_eq!(page.count, 2);
    assert!(page.results.iter().all(|lead| lead.status == "Lost"));
}
