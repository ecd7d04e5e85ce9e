// tests/common/mod.rs
//
// Apoio aos testes de integração. Exigem um Postgres em DATABASE_URL:
//   cargo test -- --ignored

#![allow(dead_code)]

use std::collections::BTreeSet;

use crm_backend::{
    config::{settings::Settings, AppState},
    models::auth::{Caller, Group, RegisterUserPayload},
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;

pub const JWT_SECRET: &str = "segredo-dos-testes";

pub async fn app_state() -> AppState {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL precisa estar definida");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("falha ao conectar no banco de testes");
    sqlx::migrate!().run(&pool).await.expect("falha nas migrações");

    let settings = Settings {
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        db_max_connections: 5,
        access_token_ttl: chrono::Duration::minutes(5),
        refresh_token_ttl: chrono::Duration::days(1),
        media_root: std::env::temp_dir().join("crm-backend-tests"),
        time_zone: chrono_tz::Asia::Kolkata,
        admin: None,
    };

    AppState::from_pool(pool, settings)
}

/// Nome único por teste, para não colidir com execuções paralelas.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Cria um usuário com os grupos pedidos e devolve o `Caller` correspondente.
pub async fn caller(state: &AppState, groups: &[Group], is_admin: bool) -> Caller {
    let username = unique("user");
    let profile = state
        .auth_service
        .register_user(&RegisterUserPayload {
            username: username.clone(),
            email: format!("{username}@example.com"),
            password: "segredo123".to_string(),
        })
        .await
        .expect("registro");

    state
        .auth_service
        .set_user_access(profile.id, groups.to_vec(), is_admin)
        .await
        .expect("grupos");

    Caller {
        user_id: profile.id,
        username,
        is_admin,
        groups: groups.iter().copied().collect::<BTreeSet<_>>(),
    }
}

pub fn lead_body(company: &str) -> Value {
    json!({
        "company": company,
        "name": "Ravi Kumar",
        "contact": "9876543210",
        "email": "ravi@example.com",
        "purpose": "AMC renewal"
    })
}
