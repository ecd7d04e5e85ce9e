// tests/workflow_test.rs

mod common;

use std::{path::PathBuf, sync::Mutex};

use async_trait::async_trait;
use crm_backend::{
    common::error::AppError,
    models::{
        auth::Group,
        sales::{Lead, Payment, SalesTask},
        tech::Task,
        workflow::{ConvertLeadPayload, GoThruPayload, MoveToSalesTaskPayload},
    },
    services::receipt_storage::{LocalReceiptStorage, ReceiptFile, ReceiptStorage},
};
use rust_decimal::Decimal;
use serde_json::json;

fn receipt_path(media_root: &std::path::Path, reference: &str) -> PathBuf {
    media_root.join(reference.trim_start_matches("/media/"))
}

// Disco local que anota cada descarte
struct RecordingStorage {
    inner: LocalReceiptStorage,
    discarded: Mutex<Vec<String>>,
}

#[async_trait]
impl ReceiptStorage for RecordingStorage {
    async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError> {
        self.inner.store(original_name, bytes).await
    }

    async fn discard(&self, reference: &str) -> Result<(), AppError> {
        self.discarded.lock().unwrap().push(reference.to_string());
        self.inner.discard(reference).await
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn convert_marks_lead_and_creates_payment() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let company = common::unique("Acme");

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&company)).unwrap())
        .await
        .unwrap();

    let payload: ConvertLeadPayload = serde_json::from_value(json!({
        "amount": 15000.50,
        "advance": 5000
    }))
    .unwrap();
    let payment_id = state
        .workflow_service
        .convert_lead(&sales, lead.id, payload, None, state.receipt_storage.as_ref())
        .await
        .unwrap();

    let lead: Lead = state.record_service.retrieve::<Lead>(&sales, lead.id).await.unwrap();
    assert_eq!(lead.status, "Converted");

    let payment: Payment = state
        .record_service
        .retrieve::<Payment>(&sales, payment_id)
        .await
        .unwrap();
    assert_eq!(payment.company, company);
    assert_eq!(payment.amount, Decimal::new(1500050, 2));
    assert_eq!(payment.so_no, "N/A");
    assert_eq!(payment.owner_id, sales.user_id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn converting_twice_creates_a_second_payment() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&common::unique("Twice"))).unwrap())
        .await
        .unwrap();

    let first = state
        .workflow_service
        .convert_lead(&sales, lead.id, ConvertLeadPayload::default(), None, state.receipt_storage.as_ref())
        .await
        .unwrap();
    let second = state
        .workflow_service
        .convert_lead(&sales, lead.id, ConvertLeadPayload::default(), None, state.receipt_storage.as_ref())
        .await
        .unwrap();

    assert_ne!(first, second);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn tech_member_cannot_convert_leads() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let tech = common::caller(&state, &[Group::Tech], false).await;

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&common::unique("Denied"))).unwrap())
        .await
        .unwrap();

    let err = state
        .workflow_service
        .convert_lead(&tech, lead.id, ConvertLeadPayload::default(), None, state.receipt_storage.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    // Nada mudou no lead
    let lead: Lead = state.record_service.retrieve::<Lead>(&sales, lead.id).await.unwrap();
    assert_eq!(lead.status, "New");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn convert_unknown_lead_is_not_found() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;

    let err = state
        .workflow_service
        .convert_lead(&sales, i64::MAX, ConvertLeadPayload::default(), None, state.receipt_storage.as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn go_thru_creates_pending_task_from_payment() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;
    let company = common::unique("Initech");

    let payment: Payment = state
        .record_service
        .create::<Payment>(&admin, serde_json::from_value(json!({ "company": company, "amount": 900 })).unwrap())
        .await
        .unwrap();

    let payload: GoThruPayload =
        serde_json::from_value(json!({ "priority": "High", "status": "Done" })).unwrap();
    let task_id = state
        .workflow_service
        .payment_to_task(&admin, payment.id, payload)
        .await
        .unwrap();

    let task: Task = state.record_service.retrieve::<Task>(&admin, task_id).await.unwrap();
    assert_eq!(task.company_name, company);
    assert_eq!(task.priority, "High");
    assert_eq!(task.status, "Pending");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn go_thru_rejects_unknown_priority() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;

    let payment: Payment = state
        .record_service
        .create::<Payment>(&admin, serde_json::from_value(json!({ "company": common::unique("Prio") })).unwrap())
        .await
        .unwrap();

    let payload: GoThruPayload = serde_json::from_value(json!({ "priority": "Urgent" })).unwrap();
    let err = state
        .workflow_service
        .payment_to_task(&admin, payment.id, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn lead_moves_to_sales_task_and_becomes_interested() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&common::unique("Follow"))).unwrap())
        .await
        .unwrap();

    let sales_task_id = state
        .workflow_service
        .lead_to_sales_task(&sales, lead.id, MoveToSalesTaskPayload::default())
        .await
        .unwrap();

    let lead: Lead = state.record_service.retrieve::<Lead>(&sales, lead.id).await.unwrap();
    assert_eq!(lead.status, "Interested");

    let task: SalesTask = state
        .record_service
        .retrieve::<SalesTask>(&sales, sales_task_id)
        .await
        .unwrap();
    assert_eq!(task.task_type, "Call");
    assert_eq!(task.status, "Pending");
    assert_eq!(task.follow_up_count, 0);
    assert!(task.remarks.starts_with("Moved from Leads."));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn go_thru_leaves_the_payment_untouched() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;

    let payment: Payment = state
        .record_service
        .create::<Payment>(
            &admin,
            serde_json::from_value(json!({ "company": common::unique("Stable"), "amount": 1200, "invoice": "INV-7" })).unwrap(),
        )
        .await
        .unwrap();
    let before = serde_json::to_value(&payment).unwrap();

    state
        .workflow_service
        .payment_to_task(&admin, payment.id, GoThruPayload::default())
        .await
        .unwrap();

    let after: Payment = state.record_service.retrieve::<Payment>(&admin, payment.id).await.unwrap();
    assert_eq!(serde_json::to_value(&after).unwrap(), before);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn convert_with_receipt_stores_file_and_references_it() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;

    let lead: Lead = state
        .record_service
        .create::<Lead>(&sales, serde_json::from_value(common::lead_body(&common::unique("Recibo"))).unwrap())
        .await
        .unwrap();

    let receipt = ReceiptFile {
        file_name: Some("comprovante.pdf".to_string()),
        bytes: b"%PDF-1.4 recibo".to_vec(),
    };
    let payment_id = state
        .workflow_service
        .convert_lead(&sales, lead.id, ConvertLeadPayload::default(), Some(receipt), state.receipt_storage.as_ref())
        .await
        .unwrap();

    let payment: Payment = state.record_service.retrieve::<Payment>(&sales, payment_id).await.unwrap();
    let reference = payment.receipt.expect("recibo referenciado");
    assert!(reference.starts_with("/media/receipts/"));
    assert!(reference.ends_with(".pdf"));

    let stored = tokio::fs::read(receipt_path(&state.settings.media_root, &reference)).await.unwrap();
    assert_eq!(stored, b"%PDF-1.4 recibo");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn failed_convert_discards_the_uploaded_receipt() {
    let state = common::app_state().await;
    let sales = common::caller(&state, &[Group::Sales], false).await;
    let media = tempfile::tempdir().unwrap();
    let storage = RecordingStorage {
        inner: LocalReceiptStorage::new(media.path()),
        discarded: Mutex::new(Vec::new()),
    };

    let receipt = ReceiptFile { file_name: Some("x.png".to_string()), bytes: vec![1, 2, 3] };
    let err = state
        .workflow_service
        .convert_lead(&sales, i64::MAX, ConvertLeadPayload::default(), Some(receipt), &storage)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let discarded = storage.discarded.lock().unwrap().clone();
    assert_eq!(discarded.len(), 1);
    assert!(!receipt_path(media.path(), &discarded[0]).exists());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn replacing_a_receipt_removes_the_previous_file() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;

    let payment: Payment = state
        .record_service
        .create::<Payment>(&admin, serde_json::from_value(json!({ "company": common::unique("Troca") })).unwrap())
        .await
        .unwrap();

    let storage = state.receipt_storage.as_ref();
    let first = state
        .record_service
        .attach_receipt(&admin, payment.id, Some("a.pdf"), b"primeiro", storage)
        .await
        .unwrap()
        .receipt
        .unwrap();
    let second = state
        .record_service
        .attach_receipt(&admin, payment.id, Some("b.pdf"), b"segundo", storage)
        .await
        .unwrap()
        .receipt
        .unwrap();

    assert_ne!(first, second);
    assert!(!receipt_path(&state.settings.media_root, &first).exists());
    assert!(receipt_path(&state.settings.media_root, &second).exists());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn receipt_for_unknown_payment_leaves_no_file_behind() {
    let state = common::app_state().await;
    let admin = common::caller(&state, &[], true).await;
    let media = tempfile::tempdir().unwrap();
    let storage = RecordingStorage {
        inner: LocalReceiptStorage::new(media.path()),
        discarded: Mutex::new(Vec::new()),
    };

    let err = state
        .record_service
        .attach_receipt(&admin, i64::MAX, Some("a.pdf"), b"orfao", &storage)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // O pagamento é conferido antes: nada foi gravado
    assert!(storage.discarded.lock().unwrap().is_empty());
    assert!(!media.path().join("receipts").exists());
}
