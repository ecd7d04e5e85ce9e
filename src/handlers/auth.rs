// src/handlers/auth.rs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::records::json_body,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{ManageUsers, RequireCapability},
    },
    models::auth::{
        AccessToken, RegisterUserPayload, TokenObtainPayload, TokenPair, TokenRefreshPayload,
        UpdateAccessPayload, UserProfile,
    },
};

// POST /api/register/
#[utoipa::path(
    post,
    path = "/api/register/",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado (sem login automático)", body = UserProfile),
        (status = 400, description = "Dados inválidos ou nome de usuário já existe")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<RegisterUserPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let payload = json_body(body).map_err(to_api)?;
    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let profile = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(profile)))
}

// POST /api/token/
#[utoipa::path(
    post,
    path = "/api/token/",
    tag = "Auth",
    request_body = TokenObtainPayload,
    responses(
        (status = 200, description = "Par de tokens e papel do usuário", body = TokenPair),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn obtain_token(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<TokenObtainPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let payload = json_body(body).map_err(to_api)?;
    payload.validate().map_err(|e| to_api(AppError::ValidationError(e)))?;

    let tokens = app_state
        .auth_service
        .obtain_token(&payload.username, &payload.password)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(tokens)))
}

// POST /api/token/refresh/
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "Auth",
    request_body = TokenRefreshPayload,
    responses(
        (status = 200, description = "Novo access token", body = AccessToken),
        (status = 401, description = "Refresh token inválido ou expirado")
    )
)]
pub async fn refresh_token(
    State(app_state): State<AppState>,
    locale: Locale,
    body: Result<Json<TokenRefreshPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let payload = json_body(body).map_err(to_api)?;
    let access = app_state
        .auth_service
        .refresh_token(&payload.refresh)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(access)))
}

// GET /api/me/
#[utoipa::path(
    get,
    path = "/api/me/",
    tag = "Auth",
    responses(
        (status = 200, description = "Perfil do usuário autenticado", body = UserProfile),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .auth_service
        .profile(&caller)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(profile)))
}

// PUT /api/users/{id}/access/
#[utoipa::path(
    put,
    path = "/api/users/{id}/access/",
    tag = "Auth",
    request_body = UpdateAccessPayload,
    params(("id" = i64, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Grupos e flag de admin substituídos", body = UserProfile),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_access(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<ManageUsers>,
    Path(user_id): Path<i64>,
    body: Result<Json<UpdateAccessPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let payload = json_body(body).map_err(to_api)?;
    let profile = app_state
        .auth_service
        .set_user_access(user_id, payload.groups, payload.is_admin)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(profile)))
}
