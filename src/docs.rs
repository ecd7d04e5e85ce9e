// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::obtain_token,
        handlers::auth::refresh_token,

        // --- Users ---
        handlers::auth::me,
        handlers::auth::update_access,

        // --- Fluxos ---
        handlers::workflow::convert_lead,
        handlers::workflow::payment_go_thru,
        handlers::workflow::lead_to_sales_task,
        handlers::workflow::upload_receipt,

        // --- Leads (lote) ---
        handlers::leads::bulk_import,
        handlers::leads::bulk_delete,

        // --- Dashboard ---
        handlers::dashboard::stats,
    ),
    components(
        schemas(
            // --- Vendas ---
            models::sales::Lead,
            models::sales::LeadInput,
            models::sales::Customer,
            models::sales::CustomerInput,
            models::sales::Payment,
            models::sales::PaymentInput,
            models::sales::SalesTask,
            models::sales::SalesTaskInput,

            // --- Técnico ---
            models::tech::Task,
            models::tech::TaskInput,
            models::tech::Tender,
            models::tech::TenderInput,
            models::tech::TechData,
            models::tech::TechDataInput,

            // --- Fluxos e lote ---
            models::workflow::ConvertLeadPayload,
            models::workflow::GoThruPayload,
            models::workflow::MoveToSalesTaskPayload,
            models::workflow::TransitionResponse,
            models::workflow::BulkDeletePayload,
            models::workflow::BulkImportResponse,
            models::workflow::BulkDeleteResponse,
            common::error::BulkItemError,

            // --- Auth ---
            models::auth::Group,
            models::auth::RegisterUserPayload,
            models::auth::TokenObtainPayload,
            models::auth::TokenRefreshPayload,
            models::auth::UpdateAccessPayload,
            models::auth::TokenPair,
            models::auth::AccessToken,
            models::auth::UserProfile,

            // --- Dashboard ---
            models::dashboard::DashboardRole,
            models::dashboard::DashboardStats,
            models::dashboard::SalesStats,
            models::dashboard::TechStats,
            models::dashboard::RecentPayment,
            models::dashboard::LeaderboardEntry,

            models::access::EntityKind,
        )
    ),
    tags(
        (name = "Auth", description = "Registro, tokens e perfil"),
        (name = "Fluxos", description = "Transições Lead → Pagamento → Tarefa e recibos"),
        (name = "Leads", description = "Importação e remoção em lote"),
        (name = "Dashboard", description = "Indicadores por papel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
