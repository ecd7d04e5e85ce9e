// src/handlers/leads.rs
//
// Operações em lote sobre leads.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::records::{json_body, require_write},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        access::EntityKind,
        sales::LeadInput,
        workflow::{BulkDeletePayload, BulkDeleteResponse, BulkImportResponse},
    },
};

// POST /api/leads/bulk-import/
#[utoipa::path(
    post,
    path = "/api/leads/bulk-import/",
    tag = "Leads",
    request_body = Vec<LeadInput>,
    responses(
        (status = 201, description = "Todos os leads foram criados", body = BulkImportResponse),
        (status = 400, description = "Lote rejeitado; nenhum lead foi criado"),
        (status = 403, description = "Sem permissão de escrita em leads")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_import(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Lead).map_err(to_api)?;
    let payload = json_body(body).map_err(to_api)?;
    let created_count = app_state
        .lead_service
        .bulk_import(&caller, payload)
        .await
        .map_err(to_api)?;

    let count = created_count.to_string();
    Ok((
        StatusCode::CREATED,
        Json(BulkImportResponse {
            message: app_state
                .i18n_store
                .translate_with(locale.as_str(), "leads_imported", &[("count", &count)]),
            created_count,
        }),
    ))
}

// POST /api/leads/bulk-delete/
#[utoipa::path(
    post,
    path = "/api/leads/bulk-delete/",
    tag = "Leads",
    request_body = BulkDeletePayload,
    responses(
        (status = 200, description = "Leads visíveis removidos", body = BulkDeleteResponse),
        (status = 400, description = "Corpo inválido"),
        (status = 403, description = "Sem permissão de escrita em leads")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    body: Result<Json<BulkDeletePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, EntityKind::Lead).map_err(to_api)?;
    let payload = json_body(body).map_err(to_api)?;
    let deleted_count = app_state
        .lead_service
        .bulk_delete(&caller, &payload.ids)
        .await
        .map_err(to_api)?;

    let count = deleted_count.to_string();
    Ok((
        StatusCode::OK,
        Json(BulkDeleteResponse {
            message: app_state
                .i18n_store
                .translate_with(locale.as_str(), "leads_deleted", &[("count", &count)]),
            deleted_count,
        }),
    ))
}
