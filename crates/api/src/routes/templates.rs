use crate::{
    middleware::AuthenticatedUser,
    models::*,
    routes::{
        api::AppState,
        common::{map_template_error, ApiError},
    },
};
use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use services::templates::TemplateId;
use tracing::debug;

fn parse_template_id(id: &str) -> Result<TemplateId, ApiError> {
    id.parse::<TemplateId>()
        .map_err(|e| map_template_error(&e))
}

/// List the caller's prompt templates, most recently updated first
#[utoipa::path(
    get,
    path = "/api/templates",
    responses(
        (status = 200, description = "Templates", body = TemplateList),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Templates"
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<TemplateList>, ApiError> {
    let templates = app_state
        .template_service
        .list_templates(&user.0)
        .await
        .map_err(|e| map_template_error(&e))?;

    Ok(ResponseJson(TemplateList {
        data: templates.into_iter().map(Into::into).collect(),
    }))
}

/// Save a new prompt template
#[utoipa::path(
    post,
    path = "/api/templates",
    request_body = TemplateRequest,
    responses(
        (status = 201, description = "Created template", body = TemplateObject),
        (status = 400, description = "Missing name or content", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Templates"
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TemplateRequest>,
) -> Result<(StatusCode, ResponseJson<TemplateObject>), ApiError> {
    debug!("Create template for user {}", user.0);

    let template = app_state
        .template_service
        .create_template(&user.0, &request.name, &request.content)
        .await
        .map_err(|e| map_template_error(&e))?;

    Ok((StatusCode::CREATED, ResponseJson(template.into())))
}

#[utoipa::path(
    get,
    path = "/api/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template", body = TemplateObject),
        (status = 404, description = "Template not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Templates"
)]
pub async fn get_template(
    Path(template_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<TemplateObject>, ApiError> {
    let id = parse_template_id(&template_id)?;

    let template = app_state
        .template_service
        .get_template(id, &user.0)
        .await
        .map_err(|e| map_template_error(&e))?;

    Ok(ResponseJson(template.into()))
}

/// Replace the name and content of a template
#[utoipa::path(
    put,
    path = "/api/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template ID")),
    request_body = TemplateRequest,
    responses(
        (status = 200, description = "Updated template", body = TemplateObject),
        (status = 400, description = "Missing name or content", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Templates"
)]
pub async fn update_template(
    Path(template_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TemplateRequest>,
) -> Result<ResponseJson<TemplateObject>, ApiError> {
    debug!("Update template {} for user {}", template_id, user.0);
    let id = parse_template_id(&template_id)?;

    let template = app_state
        .template_service
        .update_template(id, &user.0, &request.name, &request.content)
        .await
        .map_err(|e| map_template_error(&e))?;

    Ok(ResponseJson(template.into()))
}

#[utoipa::path(
    delete,
    path = "/api/templates/{template_id}",
    params(("template_id" = String, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template deleted", body = TemplateDeleteResult),
        (status = 404, description = "Template not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "Templates"
)]
pub async fn delete_template(
    Path(template_id): Path<String>,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ResponseJson<TemplateDeleteResult>, ApiError> {
    let id = parse_template_id(&template_id)?;

    app_state
        .template_service
        .delete_template(id, &user.0)
        .await
        .map_err(|e| map_template_error(&e))?;

    Ok(ResponseJson(TemplateDeleteResult {
        id: id.to_string(),
        deleted: true,
    }))
}
