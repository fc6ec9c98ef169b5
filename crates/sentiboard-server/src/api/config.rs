use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;
use crate::publisher::DashboardEvent;
use crate::settings::{ConfigSnapshot, ConfigUpdate};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ConfigUpdateResult {
    pub changed: bool,
    pub config: ConfigSnapshot,
}

pub(super) async fn get_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ConfigSnapshot>> {
    Json(ApiResponse {
        data: state.settings.snapshot(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Apply a partial settings update.
///
/// On an actual change the aggregation state is reset, the collection loop is
/// woken, and subscribers get the cleared snapshot followed by the new settings.
pub(super) async fn update_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<ConfigUpdateResult>>, ApiError> {
    let Json(update) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;

    let changed = state
        .settings
        .apply_update(update)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
    let config = state.settings.snapshot();

    if changed {
        tracing::info!(
            terms = ?config.search_terms,
            max_items = config.max_items,
            "settings updated, resetting aggregation"
        );
        let cleared = state.aggregator.reset();
        state.wake.notify_one();
        state.publisher.publish_snapshot(cleared);
        state
            .publisher
            .broadcast(DashboardEvent::Config(config.clone()));
    }

    Ok(Json(ApiResponse {
        data: ConfigUpdateResult { changed, config },
        meta: ResponseMeta::new(req_id.0),
    }))
}
