use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use chrono::Utc;
use common::{DiskVault, StorageError};
use futures::TryStreamExt;
use sea_orm::{ConnectionTrait, EntityTrait, Set, SqlErr};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::image;
use crate::error::{AppError, ErrorBody};
use crate::models::image::ImageResponse;
use crate::state::AppState;
use crate::utils::filename::{extension_of, validate_flat_filename};

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    // Headroom for multipart framing around the configured blob limit.
    DefaultBodyLimit::max(max_upload_size as usize + 64 * 1024)
}

/// A blob already written to disk, not yet recorded in the store.
struct StoredBlob {
    uuid: Uuid,
    name: String,
    extension: String,
    path: PathBuf,
    size: u64,
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image",
    description = "Uploads one image file via the `file` multipart field. The extension is \
        checked against the configured allow-list, the blob is written under a \
        date-partitioned directory, and a metadata record is created. The blob write always \
        precedes the metadata insert; if the insert fails, the blob is removed again.",
    request_body(content_type = "multipart/form-data", description = "Image file upload"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Invalid extension or malformed upload (INVALID_EXTENSION, VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage or metadata failure (WRITE_FAILED, METADATA_PERSIST_FAILED, PATH_ALLOCATION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut stored: Option<StoredBlob> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if stored.is_some() {
                    return Err(AppError::Validation("Duplicate 'file' field".into()));
                }
                stored = Some(store_field(&state, field).await?);
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let stored = stored.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

    let saved = persist_metadata(&state.db, &state.vault, stored).await?;

    Ok((StatusCode::CREATED, Json(ImageResponse::from(saved))))
}

#[utoipa::path(
    get,
    path = "/{uuid}",
    tag = "Images",
    operation_id = "downloadImage",
    summary = "Download an image",
    description = "Streams a previously uploaded image back, with the original filename in \
        the `Content-Disposition` header.",
    params(("uuid" = String, Path, description = "Image identifier (UUID)")),
    responses(
        (status = 200, description = "Image content"),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown identifier (IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Record exists but file is gone (STORED_FILE_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(uuid))]
pub async fn download_image(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Response, AppError> {
    let record = find_record(&state.db, &uuid).await?;

    let reader = match state
        .vault
        .open_stream(std::path::Path::new(&record.path))
        .await
    {
        Ok(reader) => reader,
        // A missing file behind an existing record is an integrity failure,
        // reported distinctly from a plain not-found.
        Err(StorageError::NotFound(_)) => {
            return Err(AppError::StoredFileMissing(record.path));
        }
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let body = Body::from_stream(ReaderStream::new(reader));

    let content_type = mime_guess::from_path(&record.name)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".into());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&record.name),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/{uuid}/info",
    tag = "Images",
    operation_id = "getImageInfo",
    summary = "Get image metadata",
    params(("uuid" = String, Path, description = "Image identifier (UUID)")),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 400, description = "Malformed identifier (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown identifier (IMAGE_NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(uuid))]
pub async fn get_image_info(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<ImageResponse>, AppError> {
    let record = find_record(&state.db, &uuid).await?;
    Ok(Json(ImageResponse::from(record)))
}

/// Validate the upload filename and stream the field to its final path.
async fn store_field(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
) -> Result<StoredBlob, AppError> {
    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let filename = validate_flat_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let allowed = state.config.storage.allowed_extensions();
    let extension = extension_of(&filename)
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| allowed.contains(ext))
        .ok_or_else(|| {
            let mut list: Vec<&str> = allowed.iter().map(String::as_str).collect();
            list.sort_unstable();
            AppError::InvalidExtension(format!(
                "Invalid file extension. Allowed extensions are: {}",
                list.join(", ")
            ))
        })?;

    let uuid = Uuid::new_v4();
    let path = state
        .vault
        .allocate(Utc::now().date_naive(), uuid, &extension)
        .await
        .map_err(|e| AppError::PathAllocation(e.to_string()))?;

    let reader = StreamReader::new(field.map_err(std::io::Error::other));
    let size = state
        .vault
        .write_stream(reader, &path)
        .await
        .map_err(|e| match e {
            StorageError::SizeLimitExceeded { .. } => AppError::Validation(e.to_string()),
            other => AppError::Write(other.to_string()),
        })?;

    Ok(StoredBlob {
        uuid,
        name: filename,
        extension,
        path,
        size,
    })
}

/// Insert the metadata row for a written blob.
///
/// The blob is already on disk; if the insert fails it is removed again, so
/// no record can outlive its file and no file silently leaks disk space.
async fn persist_metadata<C: ConnectionTrait>(
    db: &C,
    vault: &DiskVault,
    blob: StoredBlob,
) -> Result<image::Model, AppError> {
    let now = Utc::now();
    let model = image::ActiveModel {
        uuid: Set(blob.uuid),
        name: Set(blob.name),
        size: Set(blob.size as i64),
        extension: Set(blob.extension),
        path: Set(blob.path.display().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(err) = image::Entity::insert(model).exec_without_returning(db).await {
        if let Err(rm) = vault.remove(&blob.path).await {
            tracing::warn!(
                path = %blob.path.display(),
                error = %rm,
                "failed to remove blob after insert failure"
            );
        }
        let app_err = match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Image identifier already exists".into())
            }
            _ => AppError::MetadataPersist(err.to_string()),
        };
        return Err(app_err);
    }

    image::Entity::find_by_id(blob.uuid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("image row missing after insert".into()))
}

/// Parse the identifier and look up its record.
async fn find_record<C: ConnectionTrait>(db: &C, uuid: &str) -> Result<image::Model, AppError> {
    let uuid =
        Uuid::parse_str(uuid).map_err(|_| AppError::Validation("Invalid image ID".into()))?;

    image::Entity::find_by_id(uuid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
