use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadStatus {
    Ok,
    ExceedsServerLimit,
    ExceedsFormLimit,
    Partial,
    NoFile,
    NoTempDir,
    CantWrite,
    ExtensionBlocked,
    Unknown(i64),
}

impl UploadStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => UploadStatus::Ok,
            1 => UploadStatus::ExceedsServerLimit,
            2 => UploadStatus::ExceedsFormLimit,
            3 => UploadStatus::Partial,
            4 => UploadStatus::NoFile,
            6 => UploadStatus::NoTempDir,
            7 => UploadStatus::CantWrite,
            8 => UploadStatus::ExtensionBlocked,
            other => UploadStatus::Unknown(other),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            UploadStatus::Ok => 0,
            UploadStatus::ExceedsServerLimit => 1,
            UploadStatus::ExceedsFormLimit => 2,
            UploadStatus::Partial => 3,
            UploadStatus::NoFile => 4,
            UploadStatus::NoTempDir => 6,
            UploadStatus::CantWrite => 7,
            UploadStatus::ExtensionBlocked => 8,
            UploadStatus::Unknown(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, UploadStatus::Ok)
    }
}

impl From<i64> for UploadStatus {
    fn from(code: i64) -> Self {
        UploadStatus::from_code(code)
    }
}
