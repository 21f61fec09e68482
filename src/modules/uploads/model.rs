use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const SINGLE_FIELD: &str = "file";
pub const MULTIPLE_FIELD: &str = "files";

/// A multipart part read into memory, not yet stored.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Public URL under `/uploads`
    pub url: String,
    pub key: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadManyResponse {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

/// Schema for the single-file form.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Schema for the multi-file form.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadManyForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<Vec<u8>>,
}
