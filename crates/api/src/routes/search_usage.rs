use crate::{
    middleware::AuthenticatedUser,
    models::{ErrorResponse, SearchUsageResponse},
    routes::{api::AppState, common::{map_quota_error, ApiError}},
};
use axum::{
    extract::{Extension, State},
    response::Json as ResponseJson,
};

/// Web searches used and remaining this month
#[utoipa::path(
    get,
    path = "/api/search-usage",
    responses(
        (status = 200, description = "Current usage", body = SearchUsageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Search"
)]
pub async fn get_search_usage(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<SearchUsageResponse>, ApiError> {
    app_state
        .search
        .usage(&user.0)
        .await
        .map(|usage| ResponseJson(usage.into()))
        .map_err(|e| map_quota_error(&e))
}
