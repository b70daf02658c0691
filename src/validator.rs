use std::path::Path;

use crate::descriptor::{UploadDescriptor, UploadInput};
use crate::provenance::ProvenanceCheck;
use crate::result::{UploadErrorKind, UploadResult, ValidationResult};
use crate::status::UploadStatus;

pub struct UploadFileValidator<P> {
    provenance: P,
}

impl<P: ProvenanceCheck> UploadFileValidator<P> {
    pub fn new(provenance: P) -> Self {
        Self { provenance }
    }

    pub fn validate<'a>(&self, input: impl Into<UploadInput<'a>>) -> UploadResult<ValidationResult> {
        let descriptor = UploadDescriptor::normalize(input.into())?;
        Ok(self.classify(&descriptor))
    }

    pub fn classify(&self, descriptor: &UploadDescriptor) -> ValidationResult {
        let filename = descriptor.original_filename.clone();

        let error = match descriptor.status {
            UploadStatus::Ok => self.check_temp_file(descriptor.temp_location.as_deref()),
            UploadStatus::ExceedsServerLimit => Some(UploadErrorKind::IniSize),
            UploadStatus::ExceedsFormLimit => Some(UploadErrorKind::FormSize),
            UploadStatus::Partial => Some(UploadErrorKind::Partial),
            UploadStatus::NoFile => Some(UploadErrorKind::NoFile),
            UploadStatus::NoTempDir => Some(UploadErrorKind::NoTmpDir),
            UploadStatus::CantWrite => Some(UploadErrorKind::CantWrite),
            UploadStatus::ExtensionBlocked => Some(UploadErrorKind::Extension),
            UploadStatus::Unknown(_) => Some(UploadErrorKind::Unknown),
        };

        match error {
            None => {
                tracing::debug!(filename = ?filename, "upload validated");
                ValidationResult::valid(filename)
            }
            Some(kind) => {
                tracing::debug!(
                    filename = ?filename,
                    status = descriptor.status.code(),
                    error = kind.message_key(),
                    "upload rejected"
                );
                ValidationResult::invalid(filename, kind)
            }
        }
    }

    fn check_temp_file(&self, location: Option<&Path>) -> Option<UploadErrorKind> {
        let path = match location {
            Some(path) if path.is_file() => path,
            _ => return Some(UploadErrorKind::FileNotFound),
        };

        if !self.provenance.is_genuine_upload(path) {
            tracing::warn!(path = %path.display(), "file was not produced by the upload mechanism");
            return Some(UploadErrorKind::Attack);
        }

        None
    }
}
