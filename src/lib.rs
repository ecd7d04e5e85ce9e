// src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{
    config::AppState,
    db::Resource,
    handlers::records,
    middleware::auth::auth_guard,
    models::{
        sales::{Customer, Lead, Payment, SalesTask},
        tech::{Task, TechData, Tender},
    },
    services::receipt_storage::MEDIA_URL_PREFIX,
};

/// Limite do upload de recibos.
pub const RECEIPT_BODY_LIMIT: usize = 10 * 1024 * 1024;

// Coleção + detalhe de uma entidade, ex.: /api/leads/ e /api/leads/{id}/
fn resource_routes<T: Resource>(router: Router<AppState>, collection: &str) -> Router<AppState> {
    router
        .route(
            &format!("/api/{collection}/"),
            get(records::list::<T>).post(records::create::<T>),
        )
        .route(
            &format!("/api/{collection}/{{id}}/"),
            get(records::retrieve::<T>)
                .put(records::replace::<T>)
                .patch(records::patch::<T>)
                .delete(records::delete::<T>),
        )
}

/// Monta o router completo. Usado pelo `main` e pelos testes.
pub fn build_router(app_state: AppState) -> Router {
    // --- Rotas públicas ---
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/register/", post(handlers::auth::register))
        .route("/api/token/", post(handlers::auth::obtain_token))
        .route("/api/token/refresh/", post(handlers::auth::refresh_token))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(docs::ApiDoc::openapi()) }),
        );

    // --- CRUD por entidade ---
    let mut protected_routes = Router::new();
    protected_routes = resource_routes::<Lead>(protected_routes, "leads");
    protected_routes = resource_routes::<Customer>(protected_routes, "customers");
    protected_routes = resource_routes::<Payment>(protected_routes, "payments");
    protected_routes = resource_routes::<SalesTask>(protected_routes, "sales-tasks");
    protected_routes = resource_routes::<Task>(protected_routes, "tasks");
    protected_routes = resource_routes::<Tender>(protected_routes, "tenders");
    protected_routes = resource_routes::<TechData>(protected_routes, "tech-data");

    // --- Fluxos, lote, dashboard e conta ---
    let protected_routes = protected_routes
        .route(
            "/api/leads/{id}/convert/",
            post(handlers::workflow::convert_lead)
                .layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route("/api/leads/{id}/to-sales-task/", post(handlers::workflow::lead_to_sales_task))
        .route("/api/payments/{id}/go-thru/", post(handlers::workflow::payment_go_thru))
        .route(
            "/api/payments/{id}/receipt/",
            post(handlers::workflow::upload_receipt)
                .layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route("/api/leads/bulk-import/", post(handlers::leads::bulk_import))
        .route("/api/leads/bulk-delete/", post(handlers::leads::bulk_delete))
        .route("/api/dashboard/stats/", get(handlers::dashboard::stats))
        .route("/api/me/", get(handlers::auth::me))
        .route("/api/users/{id}/access/", put(handlers::auth::update_access))
        // Recibos gravados só para usuários autenticados
        .nest_service(
            MEDIA_URL_PREFIX,
            ServeDir::new(app_state.settings.media_root.clone()),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
