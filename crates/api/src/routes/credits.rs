use crate::{
    models::{CreditsQuery, CreditsResponse, ErrorResponse},
    routes::{
        api::AppState,
        common::{map_credits_error, ApiError},
    },
};
use axum::{
    extract::{Query, State},
    response::Json as ResponseJson,
};

/// Remaining prepaid credit of the gateway's upstream account
#[utoipa::path(
    get,
    path = "/api/credits",
    params(CreditsQuery),
    responses(
        (status = 200, description = "Account balance", body = CreditsResponse),
        (status = 400, description = "Provider has no credit balance", body = ErrorResponse),
        (status = 502, description = "Provider rejected the lookup", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Providers"
)]
pub async fn get_credits(
    State(app_state): State<AppState>,
    Query(query): Query<CreditsQuery>,
) -> Result<ResponseJson<CreditsResponse>, ApiError> {
    let provider = query.provider.trim().to_lowercase();
    let balance = app_state
        .providers
        .credit_balance(&provider)
        .await
        .map_err(|e| {
            tracing::warn!(provider = %provider, error = %e, "Credit lookup failed");
            map_credits_error(&e)
        })?;

    Ok(ResponseJson(CreditsResponse::new(provider, balance)))
}
