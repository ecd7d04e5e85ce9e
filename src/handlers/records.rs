// src/handlers/records.rs
//
// Handlers genéricos de CRUD. O router instancia um conjunto por entidade:
// `records::list::<Lead>`, `records::create::<Payment>`, ...

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use crate::{
    common::{
        db_utils::ListQuery,
        error::{ApiError, AppError},
    },
    config::AppState,
    db::Resource,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        access::{EntityKind, Operation},
        auth::Caller,
    },
    services::access_policy,
};

/// Corpo JSON ou erro 400 com o motivo da rejeição.
pub(crate) fn json_body<P>(body: Result<Json<P>, JsonRejection>) -> Result<P, AppError> {
    body.map(|Json(payload)| payload)
        .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))
}

/// Escrita negada vira 403 antes de o corpo ser lido.
pub(crate) fn require_write(caller: &Caller, kind: EntityKind) -> Result<(), AppError> {
    access_policy::authorize(caller, kind, Operation::Write).map(|_| ())
}

// ID fora do formato numérico é tratado como registro inexistente
fn record_id<T: Resource>(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound(T::KIND))
}

// GET /api/<coleção>/
pub async fn list<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let Query(query) = query.map_err(|r| to_api(AppError::MalformedBody(r.body_text())))?;

    let page = app_state
        .record_service
        .list::<T>(&caller, &query)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(page)))
}

// POST /api/<coleção>/
pub async fn create<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    body: Result<Json<T::Input>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    require_write(&caller, T::KIND).map_err(to_api)?;
    let input = json_body(body).map_err(to_api)?;
    let created = app_state
        .record_service
        .create::<T>(&caller, input)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/<coleção>/{id}/
pub async fn retrieve<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let id = record_id::<T>(path).map_err(to_api)?;
    let record = app_state
        .record_service
        .retrieve::<T>(&caller, id)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(record)))
}

// PUT /api/<coleção>/{id}/
pub async fn replace<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<T::Input>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let id = record_id::<T>(path).map_err(to_api)?;
    require_write(&caller, T::KIND).map_err(to_api)?;
    let input = json_body(body).map_err(to_api)?;
    let record = app_state
        .record_service
        .replace::<T>(&caller, id, input)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(record)))
}

// PATCH /api/<coleção>/{id}/
pub async fn patch<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let id = record_id::<T>(path).map_err(to_api)?;
    require_write(&caller, T::KIND).map_err(to_api)?;
    let patch = json_body(body).map_err(to_api)?;
    let record = app_state
        .record_service
        .patch::<T>(&caller, id, patch)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::OK, Json(record)))
}

// DELETE /api/<coleção>/{id}/
pub async fn delete<T: Resource>(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(caller): AuthenticatedUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let id = record_id::<T>(path).map_err(to_api)?;
    app_state
        .record_service
        .delete::<T>(&caller, id)
        .await
        .map_err(to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::Group, sales::Lead, tech::Tender};
    use axum::{
        body::Body,
        http::{header, Request},
        routing::{post, put},
        Extension, Router,
    };
    use rstest::rstest;
    use tower::ServiceExt;

    fn caller(groups: &[Group]) -> Caller {
        Caller {
            user_id: 1,
            username: "ana".to_string(),
            is_admin: false,
            groups: groups.iter().copied().collect(),
        }
    }

    // Chamador injetado direto nas extensions, como o auth_guard faria
    fn app(caller: Caller) -> Router {
        Router::new()
            .route("/api/tenders/", post(create::<Tender>))
            .route(
                "/api/leads/{id}/",
                put(replace::<Lead>).patch(patch::<Lead>),
            )
            .layer(Extension(caller))
            .with_state(AppState::lazy_for_tests())
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[rstest]
    #[case("POST", "/api/tenders/", r#"{"item":"printer"}"#, &[Group::Sales])]
    #[case("POST", "/api/tenders/", "{quebrado", &[])]
    #[case("PUT", "/api/leads/1/", r#"{"company":1}"#, &[Group::Tech])]
    #[case("PATCH", "/api/leads/1/", "[1, 2", &[Group::Tech])]
    #[tokio::test]
    async fn write_without_permission_is_forbidden_whatever_the_body(
        #[case] method: &str,
        #[case] uri: &str,
        #[case] body: &str,
        #[case] groups: &[Group],
    ) {
        let response = app(caller(groups))
            .oneshot(json_request(method, uri, body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn permitted_writer_with_incomplete_body_gets_bad_request() {
        let response = app(caller(&[Group::Tech]))
            .oneshot(json_request("POST", "/api/tenders/", r#"{"item":"printer"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
