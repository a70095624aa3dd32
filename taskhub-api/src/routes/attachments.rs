/// Attachment endpoints
///
/// # Endpoints
///
/// - `POST   /v1/attachments`     - Upload a file for one parent resource
/// - `GET    /v1/attachments/:id` - Get attachment metadata (scope-gated)
/// - `DELETE /v1/attachments/:id` - Delete attachment (scope-gated)
///
/// The upload is multipart: a `file` part plus exactly one of the
/// `project_id`, `task_id`, or `task_comment_id` text parts. The parent's
/// project is resolved and scope-gated before any byte reaches disk.
///
/// The metadata row is the authoritative resource. Deleting an attachment
/// removes the row first and then deletes the stored file best-effort: a
/// failing disk never blocks the delete, it is only logged.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskhub_shared::access::gate;
use taskhub_shared::auth::middleware::Principal;
use taskhub_shared::models::attachment::{
    Attachment, AttachmentParent, CreateAttachment,
};
use taskhub_shared::storage::{sanitize_filename, UploadFolder};
use uuid::Uuid;

/// The parsed multipart upload
struct UploadParts {
    parent: AttachmentParent,
    filename: String,
    mime_type: String,
    data: Vec<u8>,
}

fn parse_uuid(field_name: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", field_name, raw)))
}

/// Reads the multipart body into its parts, enforcing the exactly-one
/// parent invariant before anything else happens
async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadParts> {
    let mut project_id: Option<Uuid> = None;
    let mut task_id: Option<Uuid> = None;
    let mut task_comment_id: Option<Uuid> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "project_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                project_id = Some(parse_uuid("project_id", &raw)?);
            }
            "task_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                task_id = Some(parse_uuid("task_id", &raw)?);
            }
            "task_comment_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                task_comment_id = Some(parse_uuid("task_comment_id", &raw)?);
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "file".to_string());
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

                file = Some((filename, mime_type, data.to_vec()));
            }
            _ => {
                // Unknown parts are ignored
            }
        }
    }

    let parent = AttachmentParent::from_refs(project_id, task_id, task_comment_id)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (filename, mime_type, data) =
        file.ok_or_else(|| ApiError::BadRequest("Missing file part".to_string()))?;

    Ok(UploadParts {
        parent,
        filename,
        mime_type,
        data,
    })
}

fn folder_for(parent: &AttachmentParent) -> UploadFolder {
    match parent {
        AttachmentParent::Project(_) => UploadFolder::Projects,
        AttachmentParent::Task(_) => UploadFolder::Tasks,
        AttachmentParent::Comment(_) => UploadFolder::Comments,
    }
}

/// Resolves an attachment parent's project and gates the principal on it
async fn guard_parent_access(
    state: &AppState,
    principal: &Principal,
    parent: &AttachmentParent,
) -> ApiResult<Uuid> {
    let project_id = parent
        .resolve_project_id(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment parent not found".to_string()))?;

    gate::require_project_access(&state.db, principal, project_id).await?;

    Ok(project_id)
}

/// Upload an attachment for a project, task, or comment
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    let upload = read_upload(multipart).await?;

    guard_parent_access(&state, &principal, &upload.parent).await?;

    let stored = state
        .files
        .store(
            folder_for(&upload.parent),
            &upload.filename,
            &upload.mime_type,
            &upload.data,
        )
        .await?;

    let created = Attachment::create(
        &state.db,
        CreateAttachment {
            filename: upload.filename,
            mime_type: upload.mime_type,
            size: upload.data.len() as i64,
            path: stored.path.clone(),
            url: stored.url,
            parent: upload.parent,
            uploaded_by_id: principal.id,
        },
    )
    .await;

    let attachment = match created {
        Ok(attachment) => attachment,
        Err(e) => {
            // The row failed; don't leave the file orphaned on disk
            if let Err(cleanup) = state.files.delete(&stored.path).await {
                tracing::warn!(path = %stored.path, error = %cleanup, "Failed to clean up orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(attachment_id = %attachment.id, size = attachment.size, "Attachment uploaded");

    Ok((StatusCode::CREATED, Json(attachment)))
}

/// Get attachment metadata
pub async fn get_attachment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Attachment>> {
    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let parent = attachment
        .parent()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    guard_parent_access(&state, &principal, &parent).await?;

    Ok(Json(attachment))
}

/// Delete an attachment
///
/// The row is deleted first; removing the stored file is best-effort and a
/// failure there is logged, never surfaced.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let attachment = Attachment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attachment not found".to_string()))?;

    let parent = attachment
        .parent()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    guard_parent_access(&state, &principal, &parent).await?;

    let deleted = Attachment::soft_delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Attachment not found".to_string()));
    }

    if let Err(e) = state.files.delete(&attachment.path).await {
        tracing::warn!(
            attachment_id = %id,
            path = %attachment.path,
            error = %e,
            "Failed to delete stored file; metadata row already removed"
        );
    }

    tracing::info!(attachment_id = %id, "Attachment deleted");

    Ok(StatusCode::NO_CONTENT)
}
