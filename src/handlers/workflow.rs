// src/handlers/workflow.rs

use std::collections::HashMap;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        FromRequest, Multipart, Path, Request, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::records::require_write,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        access::EntityKind,
        sales::Payment,
        workflow::{ConvertLeadPayload, GoThruPayload, MoveToSalesTaskPayload, TransitionResponse},
    },
    services::receipt_storage::ReceiptFile,
};

/// Campo multipart que carrega o arquivo do recibo.
pub const RECEIPT_FIELD: &str = "receipt";

// Formulário multipart: campos de texto + recibo opcional
#[derive(Debug, Default)]
struct ReceiptForm {
    fields: HashMap<String, String>,
    receipt: Option<ReceiptFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<ReceiptForm, AppError> {
    let mut form = ReceiptForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedBody(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == RECEIPT_FIELD {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::MalformedBody(e.body_text()))?;
            // Arquivo vazio vale como ausente
            if !bytes.is_empty() {
                form.receipt = Some(ReceiptFile { file_name, bytes: bytes.to_vec() });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::MalformedBody(e.body_text()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

// Todos os campos das transições são opcionais: corpo ausente vale como `{}`
fn optional_body<P: Default>(body: Result<Option<Json<P>>, JsonRejection>) -> Result<P, AppError> {
    match body {
        Ok(Some(Json(payload))) => Ok(payload),
        Ok(None) => Ok(P::default()),
        Err(rejection) => Err(AppError::MalformedBody(rejection.body_text())),
    }
}

// POST /api/leads/{id}/convert/
#[utoipa::path(
    post,
    path = "/api/leads/{id}/convert/",
    tag = "Fluxos",
    request_body = ConvertLeadPayload,
    params(("id" = i64, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead convertido e pagamento criado (recibo opcional via multipart)", body = TransitionResponse),
        (status = 400, description = "Dados inválidos ou erro de banco na criação"),
        (status = 403, description = "Sem permissão de escrita em leads"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn convert_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<i64>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Lead).map_err(to_api)?;

    // JSON (ou corpo vazio) ou multipart com o recibo junto
    let (payload, receipt) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &app_state)
            .await
            .map_err(|r| to_api(AppError::MalformedBody(r.body_text())))?;
        let form = read_form(multipart).await.map_err(to_api)?;
        let payload = ConvertLeadPayload::from_form_fields(&form.fields)
            .map_err(|reason| to_api(AppError::MalformedBody(reason)))?;
        (payload, form.receipt)
    } else {
        let body = <Option<Json<ConvertLeadPayload>> as FromRequest<AppState>>::from_request(
            request, &app_state,
        )
        .await;
        (optional_body(body).map_err(to_api)?, None)
    };

    let payment_id = app_state
        .workflow_service
        .convert_lead(
            &caller,
            lead_id,
            payload,
            receipt,
            app_state.receipt_storage.as_ref(),
        )
        .await
        .map_err(to_api)?;

    Ok((
        StatusCode::OK,
        Json(TransitionResponse {
            message: app_state.i18n_store.translate(locale.as_str(), "lead_converted"),
            record_id: payment_id,
        }),
    ))
}

// POST /api/payments/{id}/go-thru/
#[utoipa::path(
    post,
    path = "/api/payments/{id}/go-thru/",
    tag = "Fluxos",
    request_body = GoThruPayload,
    params(("id" = i64, Path, description = "ID do pagamento")),
    responses(
        (status = 200, description = "Tarefa criada a partir do pagamento", body = TransitionResponse),
        (status = 400, description = "Prioridade inválida ou conflito ao criar a tarefa"),
        (status = 403, description = "Sem permissão de escrita em pagamentos"),
        (status = 404, description = "Pagamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn payment_go_thru(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(payment_id): Path<i64>,
    body: Result<Option<Json<GoThruPayload>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Payment).map_err(to_api)?;
    let payload = optional_body(body).map_err(to_api)?;
    let task_id = app_state
        .workflow_service
        .payment_to_task(&caller, payment_id, payload)
        .await
        .map_err(to_api)?;

    Ok((
        StatusCode::OK,
        Json(TransitionResponse {
            message: app_state.i18n_store.translate(locale.as_str(), "payment_sent_to_tasks"),
            record_id: task_id,
        }),
    ))
}

// POST /api/leads/{id}/to-sales-task/
#[utoipa::path(
    post,
    path = "/api/leads/{id}/to-sales-task/",
    tag = "Fluxos",
    request_body = MoveToSalesTaskPayload,
    params(("id" = i64, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead marcado como Interested e tarefa de vendas criada", body = TransitionResponse),
        (status = 403, description = "Sem permissão de escrita em leads"),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn lead_to_sales_task(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(lead_id): Path<i64>,
    body: Result<Option<Json<MoveToSalesTaskPayload>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Lead).map_err(to_api)?;
    let payload = optional_body(body).map_err(to_api)?;
    let sales_task_id = app_state
        .workflow_service
        .lead_to_sales_task(&caller, lead_id, payload)
        .await
        .map_err(to_api)?;

    Ok((
        StatusCode::OK,
        Json(TransitionResponse {
            message: app_state
                .i18n_store
                .translate(locale.as_str(), "lead_moved_to_sales_tasks"),
            record_id: sales_task_id,
        }),
    ))
}

// POST /api/payments/{id}/receipt/ (multipart, campo `receipt`; substitui o anterior)
#[utoipa::path(
    post,
    path = "/api/payments/{id}/receipt/",
    tag = "Fluxos",
    params(("id" = i64, Path, description = "ID do pagamento")),
    responses(
        (status = 200, description = "Recibo anexado", body = Payment),
        (status = 400, description = "Arquivo ausente ou multipart inválido"),
        (status = 403, description = "Sem permissão de escrita em pagamentos"),
        (status = 404, description = "Pagamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_receipt(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(payment_id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Payment).map_err(to_api)?;

    let multipart = multipart.map_err(|r| to_api(AppError::MalformedBody(r.body_text())))?;
    let ReceiptFile { file_name, bytes } = read_form(multipart)
        .await
        .map_err(to_api)?
        .receipt
        .ok_or_else(|| to_api(AppError::ReceiptMissing))?;

    let payment = app_state
        .record_service
        .attach_receipt(
            &caller,
            payment_id,
            file_name.as_deref(),
            &bytes,
            app_state.receipt_storage.as_ref(),
        )
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(payment)))
}
