// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::Caller,
};

/// 1. O Trait que define uma capacidade exigida pela rota
pub trait CapabilityDef: Send + Sync + 'static {
    fn name() -> &'static str;
    fn granted(caller: &Caller) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequireCapability<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o chamador (401 se a rota não passou pelo auth_guard)
        let AuthenticatedUser(caller) = AuthenticatedUser::from_request_parts(parts, state).await?;

        // B. Confere a capacidade
        if !T::granted(&caller) {
            tracing::warn!(user_id = caller.user_id, capability = T::name(), "🚫 Capacidade ausente");
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
            return Err(AppError::PermissionDenied(T::name().to_string())
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// CAPACIDADES
// ---

/// Administrar grupos e flag de admin de outros usuários.
pub struct ManageUsers;
impl CapabilityDef for ManageUsers {
    fn name() -> &'static str { "users:manage" }
    fn granted(caller: &Caller) -> bool { caller.is_admin }
}
