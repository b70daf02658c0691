use std::io;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("invalid upload input: {0}")]
    InvalidInput(String),

    #[error("invalid content disposition")]
    InvalidContentDisposition,

    #[error("invalid content type")]
    InvalidContentType,

    #[error("multipart error: {0:?}")]
    NtexError(ntex_multipart::MultipartError),
}

impl From<ntex_multipart::MultipartError> for UploadError {
    fn from(value: ntex_multipart::MultipartError) -> Self {
        UploadError::NtexError(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadErrorKind {
    IniSize,
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    Extension,
    Attack,
    FileNotFound,
    Unknown,
}

impl UploadErrorKind {
    pub fn message_key(&self) -> &'static str {
        match self {
            UploadErrorKind::IniSize => "fileUploadFileErrorIniSize",
            UploadErrorKind::FormSize => "fileUploadFileErrorFormSize",
            UploadErrorKind::Partial => "fileUploadFileErrorPartial",
            UploadErrorKind::NoFile => "fileUploadFileErrorNoFile",
            UploadErrorKind::NoTmpDir => "fileUploadFileErrorNoTmpDir",
            UploadErrorKind::CantWrite => "fileUploadFileErrorCantWrite",
            UploadErrorKind::Extension => "fileUploadFileErrorExtension",
            UploadErrorKind::Attack => "fileUploadFileErrorAttack",
            UploadErrorKind::FileNotFound => "fileUploadFileErrorFileNotFound",
            UploadErrorKind::Unknown => "fileUploadFileErrorUnknown",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadErrorKind::IniSize => {
                "The uploaded file exceeds the upload_max_filesize directive in php.ini"
            }
            UploadErrorKind::FormSize => {
                "The uploaded file exceeds the MAX_FILE_SIZE directive that was specified in the HTML form"
            }
            UploadErrorKind::Partial => "The uploaded file was only partially uploaded",
            UploadErrorKind::NoFile => "No file was uploaded",
            UploadErrorKind::NoTmpDir => "Missing a temporary folder",
            UploadErrorKind::CantWrite => "Failed to write file to disk",
            UploadErrorKind::Extension => "A PHP extension stopped the file upload",
            UploadErrorKind::Attack => "File was illegally uploaded. This could be a possible attack",
            UploadErrorKind::FileNotFound => "File was not found",
            UploadErrorKind::Unknown => "Unknown error while uploading file",
        }
    }
}

impl std::fmt::Display for UploadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

// `is_valid` is serialized but not read back, it follows from `error`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationResult {
    pub filename: Option<String>,
    pub error: Option<UploadErrorKind>,
}

impl ValidationResult {
    pub fn valid(filename: Option<String>) -> Self {
        Self { filename, error: None }
    }

    pub fn invalid(filename: Option<String>, kind: UploadErrorKind) -> Self {
        Self { filename, error: Some(kind) }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn messages(&self) -> Vec<(&'static str, &'static str)> {
        self.error
            .iter()
            .map(|kind| (kind.message_key(), kind.message()))
            .collect()
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationResult", 3)?;
        state.serialize_field("is_valid", &self.is_valid())?;
        state.serialize_field("error", &self.error)?;
        state.serialize_field("filename", &self.filename)?;
        state.end()
    }
}
