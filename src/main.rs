//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crm_backend::{
    build_router,
    config::{settings::Settings, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env é opcional (em produção as variáveis vêm do ambiente)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crm_backend=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Configuração inválida impede o boot
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some(admin) = app_state.settings.admin.clone() {
        let created = app_state.auth_service.ensure_admin(&admin).await?;
        if !created {
            tracing::info!(username = %admin.username, "Administrador inicial já existe");
        }
    }

    let addr = app_state.settings.bind_address();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
