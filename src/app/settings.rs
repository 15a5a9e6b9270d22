use crate::core::resolver::BaseUrlResolver;
use crate::domain::model::{HealthInfo, SystemInfo};
use crate::domain::ports::ProjectApi;
use crate::utils::error::{ConsoleError, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct SettingsState {
    pub resolver: Arc<BaseUrlResolver>,
    pub api: Arc<dyn ProjectApi>,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub api_url: Option<String>,
    pub resolved_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub api_url: String,
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::InvalidUrlError { .. } | ConsoleError::ValidationError { .. } => {
                StatusCode::BAD_REQUEST
            }
            ConsoleError::UpstreamExchangeError(_) | ConsoleError::BackendError { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Settings request failed: {}", self);
        }

        (
            status,
            Json(serde_json::json!({ "error": self.user_friendly_message() })),
        )
            .into_response()
    }
}

fn current_view(resolver: &BaseUrlResolver) -> Result<SettingsView> {
    Ok(SettingsView {
        api_url: resolver.get_override()?,
        resolved_url: resolver.resolve(),
    })
}

pub async fn get_settings(State(state): State<SettingsState>) -> Result<Json<SettingsView>> {
    Ok(Json(current_view(&state.resolver)?))
}

pub async fn update_settings(
    State(state): State<SettingsState>,
    update: std::result::Result<Json<UpdateSettings>, JsonRejection>,
) -> Result<Json<SettingsView>> {
    let Json(update) = update.map_err(|rejection| ConsoleError::ValidationError {
        field: "apiUrl".to_string(),
        message: rejection.body_text(),
    })?;
    state.resolver.set_override(&update.api_url)?;
    Ok(Json(current_view(&state.resolver)?))
}

/// Merges backend health with what this process knows about itself.
pub fn compose_system_info(health: Option<&HealthInfo>, environment: &str) -> SystemInfo {
    let backend_version = health
        .and_then(|h| h.version.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let node_version = health
        .and_then(|h| h.node_version.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let database = health
        .and_then(|h| h.database.as_ref())
        .map(|db| db.kind.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    SystemInfo {
        frontend_version: env!("CARGO_PKG_VERSION").to_string(),
        backend_version,
        environment: environment.to_string(),
        last_updated: chrono::Utc::now().to_rfc3339(),
        node_version,
        database,
        backend_reachable: health.is_some(),
    }
}

pub async fn system_info(State(state): State<SettingsState>) -> Json<SystemInfo> {
    let health = match state.api.health().await {
        Ok(health) => Some(health),
        Err(e) => {
            tracing::warn!("Backend health check failed: {}", e);
            None
        }
    };

    Json(compose_system_info(health.as_ref(), &state.environment))
}

pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn routes(state: SettingsState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/settings/system", get(system_info))
        .route("/healthz", get(liveness))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DatabaseInfo;

    #[test]
    fn test_system_info_without_backend() {
        let info = compose_system_info(None, "development");

        assert!(!info.backend_reachable);
        assert_eq!(info.backend_version, NOT_AVAILABLE);
        assert_eq!(info.database, NOT_AVAILABLE);
        assert_eq!(info.environment, "development");
        assert_eq!(info.frontend_version, env!("CARGO_PKG_VERSION"));
        assert!(chrono::DateTime::parse_from_rfc3339(&info.last_updated).is_ok());
    }

    #[test]
    fn test_system_info_from_health() {
        let health = HealthInfo {
            status: "ok".to_string(),
            version: Some("3.2.1".to_string()),
            timestamp: None,
            node_version: Some("v20.11.0".to_string()),
            database: Some(DatabaseInfo {
                connected: true,
                kind: "PostgreSQL".to_string(),
                version: "16.1".to_string(),
            }),
            uptime: Some(42.0),
        };

        let info = compose_system_info(Some(&health), "production");

        assert!(info.backend_reachable);
        assert_eq!(info.backend_version, "3.2.1");
        assert_eq!(info.node_version, "v20.11.0");
        assert_eq!(info.database, "PostgreSQL");
    }

    #[test]
    fn test_invalid_url_maps_to_bad_request() {
        let response = ConsoleError::InvalidUrlError {
            field: "apiUrl".to_string(),
            value: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
