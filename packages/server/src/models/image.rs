use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::image;

/// Response DTO for a stored image's metadata.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    /// Image identifier (UUIDv4).
    #[schema(example = "f9c9746a-6e2e-4a78-b6f1-45e7c4216a4d")]
    pub uuid: String,
    /// Original upload filename.
    #[schema(example = "cat.png")]
    pub name: String,
    /// Blob size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    /// Lower-cased file extension.
    #[schema(example = "png")]
    pub extension: String,
    /// Storage location of the blob.
    #[schema(example = "./data/2026-08-27/f9c9746a-6e2e-4a78-b6f1-45e7c4216a4d.png")]
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<image::Model> for ImageResponse {
    fn from(model: image::Model) -> Self {
        Self {
            uuid: model.uuid.to_string(),
            name: model.name,
            size: model.size,
            extension: model.extension,
            path: model.path,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
