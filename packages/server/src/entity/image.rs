use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    /// Random v4 UUID, generated at upload time. This is the identifier
    /// clients use to reference the file; never reused.
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,

    /// Original client-supplied filename, stored verbatim for display.
    pub name: String,

    /// Byte length of the blob on disk at time of write.
    pub size: i64,

    /// Lower-cased extension extracted from `name`.
    pub extension: String,

    /// Filesystem location of the stored blob. While this row exists, a
    /// readable file must exist at this path.
    pub path: String,

    pub created_at: DateTimeUtc,

    /// Refreshed on mutation; in practice equal to `created_at`, since no
    /// update operation exists.
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
