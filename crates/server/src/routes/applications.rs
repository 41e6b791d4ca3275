use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::application;
use service::application::domain::{CreateApplicationInput, UpdateApplicationInput};

use crate::errors::ApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusUpdateInput {
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddRoundInput {
    pub name: String,
}

#[derive(Serialize)]
pub struct DeleteOutput {
    pub message: &'static str,
}

#[utoipa::path(get, path = "/applications", tag = "applications", responses((status = 200, description = "List OK"), (status = 401, description = "Unauthorized")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<application::Model>>, ApiError> {
    let apps = state.applications.list(user.id).await?;
    info!(count = apps.len(), "list applications");
    Ok(Json(apps))
}

#[utoipa::path(post, path = "/applications", tag = "applications", request_body = crate::openapi::CreateApplicationRequest, responses((status = 201, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateApplicationInput>,
) -> Result<(StatusCode, Json<application::Model>), ApiError> {
    let app = state.applications.create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

#[utoipa::path(get, path = "/applications/{id}", tag = "applications", params(("id" = Uuid, Path, description = "Application ID")), responses((status = 200, description = "OK"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.get(user.id, id).await?;
    Ok(Json(app))
}

#[utoipa::path(put, path = "/applications/{id}", tag = "applications", params(("id" = Uuid, Path, description = "Application ID")), request_body = crate::openapi::UpdateApplicationRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateApplicationInput>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.update(user.id, id, input).await?;
    Ok(Json(app))
}

#[utoipa::path(delete, path = "/applications/{id}", tag = "applications", params(("id" = Uuid, Path, description = "Application ID")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteOutput>, ApiError> {
    state.applications.delete(user.id, id).await?;
    Ok(Json(DeleteOutput { message: "Application deleted" }))
}

#[utoipa::path(patch, path = "/applications/{id}/status", tag = "applications", params(("id" = Uuid, Path, description = "Application ID")), request_body = crate::openapi::StatusUpdateRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Invalid status"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn set_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusUpdateInput>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.set_status(user.id, id, &input.status).await?;
    Ok(Json(app))
}

#[utoipa::path(post, path = "/applications/{id}/rounds", tag = "rounds", params(("id" = Uuid, Path, description = "Application ID")), request_body = crate::openapi::AddRoundRequest, responses((status = 201, description = "Round added"), (status = 400, description = "Empty name"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn add_round(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddRoundInput>,
) -> Result<(StatusCode, Json<application::Model>), ApiError> {
    let app = state.applications.add_round(user.id, id, &input.name).await?;
    Ok((StatusCode::CREATED, Json(app)))
}

#[utoipa::path(patch, path = "/applications/{id}/rounds/{round_id}", tag = "rounds", params(("id" = Uuid, Path, description = "Application ID"), ("round_id" = Uuid, Path, description = "Round ID")), request_body = crate::openapi::StatusUpdateRequest, responses((status = 200, description = "Updated"), (status = 400, description = "Invalid status"), (status = 403, description = "Forbidden"), (status = 404, description = "App or round not found")))]
pub async fn set_round_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, round_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<StatusUpdateInput>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.set_round_status(user.id, id, round_id, &input.status).await?;
    Ok(Json(app))
}

#[utoipa::path(delete, path = "/applications/{id}/rounds/{round_id}", tag = "rounds", params(("id" = Uuid, Path, description = "Application ID"), ("round_id" = Uuid, Path, description = "Round ID")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "App or round not found")))]
pub async fn delete_round(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, round_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.delete_round(user.id, id, round_id).await?;
    Ok(Json(app))
}

#[utoipa::path(post, path = "/applications/{id}/attachments", tag = "attachments", params(("id" = Uuid, Path, description = "Application ID")), responses((status = 201, description = "Attached"), (status = 400, description = "Bad type or upload rejected"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn add_attachment(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<application::Model>), ApiError> {
    let mut kind: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "Malformed multipart body", Some(e.to_string())))?
    {
        match field.name() {
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "Malformed multipart body", Some(e.to_string())))?;
                kind = Some(value);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "Malformed multipart body", Some(e.to_string())))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Attachment type is required", None))?;
    let (filename, bytes) = file.ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "File is required", None))?;

    let app = state
        .applications
        .add_attachment(user.id, id, &kind, &filename, &bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(app)))
}

#[utoipa::path(delete, path = "/applications/{id}/attachments/{attachment_id}", tag = "attachments", params(("id" = Uuid, Path, description = "Application ID"), ("attachment_id" = Uuid, Path, description = "Attachment ID")), responses((status = 200, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "App or attachment not found")))]
pub async fn delete_attachment(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<application::Model>, ApiError> {
    let app = state.applications.delete_attachment(user.id, id, attachment_id).await?;
    Ok(Json(app))
}
