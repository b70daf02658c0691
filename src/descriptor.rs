use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::result::{UploadError, UploadResult};
use crate::status::UploadStatus;

// fields are optional so a malformed record surfaces as `InvalidInput`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadRecord {
    pub tmp_name: Option<String>,
    pub name: Option<String>,
    pub error: Option<i64>,
}

impl UploadRecord {
    pub fn new(tmp_name: impl Into<String>, name: impl Into<String>, error: i64) -> Self {
        Self {
            tmp_name: Some(tmp_name.into()),
            name: Some(name.into()),
            error: Some(error),
        }
    }
}

pub trait StreamMetadata {
    fn metadata(&self, key: &str) -> Option<String>;
}

pub trait UploadedFile {
    fn client_filename(&self) -> Option<String>;

    fn error(&self) -> i64;

    /// Only consulted when `error()` is `0`.
    fn stream(&self) -> &dyn StreamMetadata;
}

pub enum UploadInput<'a> {
    Record(UploadRecord),
    Uploaded(&'a dyn UploadedFile),
    Path(PathBuf),
}

impl From<UploadRecord> for UploadInput<'_> {
    fn from(value: UploadRecord) -> Self {
        UploadInput::Record(value)
    }
}

impl<'a, T: UploadedFile> From<&'a T> for UploadInput<'a> {
    fn from(value: &'a T) -> Self {
        UploadInput::Uploaded(value)
    }
}

impl From<&str> for UploadInput<'_> {
    fn from(value: &str) -> Self {
        UploadInput::Path(PathBuf::from(value))
    }
}

impl From<String> for UploadInput<'_> {
    fn from(value: String) -> Self {
        UploadInput::Path(PathBuf::from(value))
    }
}

impl From<&Path> for UploadInput<'_> {
    fn from(value: &Path) -> Self {
        UploadInput::Path(value.to_path_buf())
    }
}

impl From<PathBuf> for UploadInput<'_> {
    fn from(value: PathBuf) -> Self {
        UploadInput::Path(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDescriptor {
    pub temp_location: Option<PathBuf>,
    pub original_filename: Option<String>,
    pub status: UploadStatus,
}

impl UploadDescriptor {
    pub fn normalize(input: UploadInput<'_>) -> UploadResult<Self> {
        match input {
            UploadInput::Record(record) => Self::from_record(record),
            UploadInput::Uploaded(file) => Ok(Self::from_uploaded(file)),
            UploadInput::Path(path) => Ok(Self::from_path(path)),
        }
    }

    fn from_record(record: UploadRecord) -> UploadResult<Self> {
        let missing = |field: &str| {
            UploadError::InvalidInput(format!(
                "upload record must carry `tmp_name`, `name` and `error`, `{}` is missing",
                field
            ))
        };

        let tmp_name = record.tmp_name.ok_or_else(|| missing("tmp_name"))?;
        let name = record.name.ok_or_else(|| missing("name"))?;
        let error = record.error.ok_or_else(|| missing("error"))?;

        Ok(Self {
            temp_location: non_empty_path(tmp_name),
            original_filename: Some(name),
            status: UploadStatus::from_code(error),
        })
    }

    fn from_uploaded(file: &dyn UploadedFile) -> Self {
        let status = UploadStatus::from_code(file.error());
        let temp_location = match status {
            UploadStatus::Ok => file.stream().metadata("uri").and_then(non_empty_path),
            _ => None,
        };

        Self {
            temp_location,
            original_filename: file.client_filename(),
            status,
        }
    }

    fn from_path(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            temp_location: Some(path).filter(|p| !p.as_os_str().is_empty()),
            original_filename: Some(filename),
            status: UploadStatus::Ok,
        }
    }
}

fn non_empty_path(value: String) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FakeUpload {
        filename: Option<String>,
        error: i64,
        uri: Option<String>,
        stream_reads: Cell<usize>,
    }

    impl StreamMetadata for FakeUpload {
        fn metadata(&self, key: &str) -> Option<String> {
            self.stream_reads.set(self.stream_reads.get() + 1);
            match key {
                "uri" => self.uri.clone(),
                _ => None,
            }
        }
    }

    impl UploadedFile for FakeUpload {
        fn client_filename(&self) -> Option<String> {
            self.filename.clone()
        }

        fn error(&self) -> i64 {
            self.error
        }

        fn stream(&self) -> &dyn StreamMetadata {
            self
        }
    }

    #[test]
    fn test_record_is_normalized() {
        let record = UploadRecord::new("/tmp/phpA1b2", "photo.jpg", 0);
        let descriptor = UploadDescriptor::normalize(record.into()).unwrap();

        assert_eq!(descriptor.temp_location, Some(PathBuf::from("/tmp/phpA1b2")));
        assert_eq!(descriptor.original_filename.as_deref(), Some("photo.jpg"));
        assert_eq!(descriptor.status, UploadStatus::Ok);
    }

    #[test]
    fn test_record_with_empty_tmp_name_has_no_location() {
        let record = UploadRecord::new("", "big.zip", 1);
        let descriptor = UploadDescriptor::normalize(record.into()).unwrap();

        assert_eq!(descriptor.temp_location, None);
        assert_eq!(descriptor.status, UploadStatus::ExceedsServerLimit);
    }

    #[test]
    fn test_record_missing_fields_is_invalid_input() {
        let cases = [
            UploadRecord { tmp_name: None, ..UploadRecord::new("", "a", 0) },
            UploadRecord { name: None, ..UploadRecord::new("", "a", 0) },
            UploadRecord { error: None, ..UploadRecord::new("", "a", 0) },
        ];

        for record in cases {
            let result = UploadDescriptor::normalize(record.into());
            assert!(matches!(result, Err(UploadError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_record_deserializes_from_json() {
        let record: UploadRecord =
            serde_json::from_str(r#"{"tmp_name": "/tmp/phpX", "name": "a.txt", "error": 3}"#).unwrap();
        assert_eq!(record, UploadRecord::new("/tmp/phpX", "a.txt", 3));

        let partial: UploadRecord = serde_json::from_str(r#"{"name": "a.txt"}"#).unwrap();
        assert!(UploadDescriptor::normalize(partial.into()).is_err());
    }

    #[test]
    fn test_uploaded_file_reads_stream_only_on_success() {
        let failed = FakeUpload {
            filename: Some("report.pdf".into()),
            error: 3,
            uri: Some("/tmp/should-not-be-read".into()),
            stream_reads: Cell::new(0),
        };
        let descriptor = UploadDescriptor::normalize((&failed).into()).unwrap();
        assert_eq!(descriptor.temp_location, None);
        assert_eq!(descriptor.status, UploadStatus::Partial);
        assert_eq!(failed.stream_reads.get(), 0);

        let ok = FakeUpload {
            filename: None,
            error: 0,
            uri: Some("/tmp/upload-1".into()),
            stream_reads: Cell::new(0),
        };
        let descriptor = UploadDescriptor::normalize((&ok).into()).unwrap();
        assert_eq!(descriptor.temp_location, Some(PathBuf::from("/tmp/upload-1")));
        assert_eq!(descriptor.original_filename, None);
        assert_eq!(ok.stream_reads.get(), 1);
    }

    #[test]
    fn test_bare_path_uses_basename() {
        let descriptor = UploadDescriptor::normalize("/var/uploads/resolved-file.png".into()).unwrap();
        assert_eq!(descriptor.original_filename.as_deref(), Some("resolved-file.png"));
        assert_eq!(descriptor.status, UploadStatus::Ok);
        assert_eq!(
            descriptor.temp_location,
            Some(PathBuf::from("/var/uploads/resolved-file.png"))
        );
    }

    #[test]
    fn test_empty_bare_path() {
        let descriptor = UploadDescriptor::normalize("".into()).unwrap();
        assert_eq!(descriptor.temp_location, None);
        assert_eq!(descriptor.original_filename.as_deref(), Some(""));
    }
}
