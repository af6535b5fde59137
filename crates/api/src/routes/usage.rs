use crate::{
    middleware::AuthenticatedUser,
    models::*,
    routes::{
        api::AppState,
        common::{map_quota_error, map_usage_error, ApiError},
    },
};
use axum::{
    extract::{Extension, Query, State},
    response::Json as ResponseJson,
};

/// Daily activity of the caller in one month
#[utoipa::path(
    get,
    path = "/api/usage",
    params(UsageQuery),
    responses(
        (status = 200, description = "Days with activity, oldest first", body = UsageHistoryResponse),
        (status = 400, description = "Invalid month", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Usage"
)]
pub async fn get_usage_history(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UsageQuery>,
) -> Result<ResponseJson<UsageHistoryResponse>, ApiError> {
    let period = query.period().map_err(|e| map_usage_error(&e))?;
    let usage = app_state
        .usage
        .history(&user.0, period)
        .await
        .map_err(|e| map_usage_error(&e))?;

    Ok(ResponseJson(UsageHistoryResponse {
        year: period.year,
        month: period.month,
        usage: usage.into_iter().map(Into::into).collect(),
    }))
}

/// Turns per model in one month plus this month's search quota
#[utoipa::path(
    get,
    path = "/api/stats",
    params(UsageQuery),
    responses(
        (status = 200, description = "Per-model statistics", body = StatsResponse),
        (status = 400, description = "Invalid month", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Usage"
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UsageQuery>,
) -> Result<ResponseJson<StatsResponse>, ApiError> {
    let period = query.period().map_err(|e| map_usage_error(&e))?;
    let stats = app_state
        .usage
        .model_stats(&user.0, period)
        .await
        .map_err(|e| map_usage_error(&e))?;
    let search_usage = app_state
        .search
        .usage(&user.0)
        .await
        .map_err(|e| map_quota_error(&e))?;

    Ok(ResponseJson(StatsResponse {
        year: period.year,
        month: period.month,
        stats: stats.into_iter().map(Into::into).collect(),
        search_usage: search_usage.into(),
    }))
}
