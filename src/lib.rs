mod descriptor;
mod file;
mod provenance;
mod result;
mod status;
mod uploader;
mod validator;

pub use descriptor::{StreamMetadata, UploadDescriptor, UploadInput, UploadRecord, UploadedFile};
pub use file::FileInfo;
pub use provenance::{ProvenanceCheck, UploadRegistry};
pub use result::{UploadError, UploadErrorKind, UploadResult, ValidationResult};
pub use status::UploadStatus;
pub use uploader::{CapturedFile, UploadData, Uploader};
pub use validator::UploadFileValidator;
