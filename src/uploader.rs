use std::convert::Infallible;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use ntex::http::Payload;
use ntex::util::Bytes;
use ntex::web::types::State;
use ntex::web::{FromRequest, HttpRequest};
use ntex_multipart::Multipart as NtexMultipart;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::descriptor::{StreamMetadata, UploadedFile};
use crate::file::FileInfo;
use crate::provenance::UploadRegistry;
use crate::result::UploadResult;
use crate::status::UploadStatus;

const TEMP_FILE_PREFIX: &str = "medullah-upload-";

pub struct Uploader {
    multipart: NtexMultipart,
    registry: UploadRegistry,
}

#[derive(Debug, Clone)]
pub struct UploadData<'a> {
    pub field: &'a str,
    pub temp_dir: PathBuf,
    pub max_server_size: Option<usize>,
    pub max_form_size: Option<usize>,
}

impl<'a> UploadData<'a> {
    pub fn new(field: &'a str) -> Self {
        Self {
            field,
            temp_dir: std::env::temp_dir(),
            max_server_size: None,
            max_form_size: None,
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_max_server_size(mut self, size: usize) -> Self {
        self.max_server_size = Some(size);
        self
    }

    pub fn with_max_form_size(mut self, size: usize) -> Self {
        self.max_form_size = Some(size);
        self
    }
}

impl<Err> FromRequest<Err> for Uploader {
    type Error = Infallible;

    async fn from_request(
        req: &HttpRequest,
        payload: &mut Payload,
    ) -> Result<Uploader, Infallible> {
        let registry = req
            .app_state::<UploadRegistry>()
            .cloned()
            .or_else(|| {
                req.app_state::<State<UploadRegistry>>()
                    .map(|state| UploadRegistry::clone(state))
            })
            .unwrap_or_default();

        let multipart = NtexMultipart::new(req.headers(), payload.take());
        Ok(Uploader::new(multipart, registry))
    }
}

impl<'a> Uploader {
    pub fn new(multipart: NtexMultipart, registry: UploadRegistry) -> Uploader {
        Self { multipart, registry }
    }

    pub async fn capture(&mut self, field: &'a str) -> UploadResult<CapturedFile> {
        self.capture_advance(UploadData::new(field)).await
    }

    /// Upload failures come back as a non-`Ok` status, not as `Err`.
    pub async fn capture_advance(&mut self, ud: UploadData<'a>) -> UploadResult<CapturedFile> {
        while let Some(item) = self.multipart.next().await {
            let mut field = item?;

            let info = match FileInfo::from_headers(field.headers())? {
                Some(info) if info.field == ud.field => info,
                _ => continue,
            };

            return Ok(receive(&mut field, info, &ud, &self.registry).await);
        }

        tracing::debug!(field = ud.field, "file field not present in request");
        let info = FileInfo { field: ud.field.to_string(), ..FileInfo::default() };
        Ok(CapturedFile::new(info, UploadStatus::NoFile, None, self.registry.clone()))
    }

    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }
}

pub(crate) async fn receive<S, E>(
    stream: &mut S,
    mut info: FileInfo,
    ud: &UploadData<'_>,
    registry: &UploadRegistry,
) -> CapturedFile
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Debug,
{
    if info.name.is_empty() {
        return CapturedFile::new(info, UploadStatus::NoFile, None, registry.clone());
    }

    let is_dir = fs::metadata(&ud.temp_dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        tracing::warn!(temp_dir = %ud.temp_dir.display(), "temporary upload directory is missing");
        return CapturedFile::new(info, UploadStatus::NoTempDir, None, registry.clone());
    }

    let path = ud
        .temp_dir
        .join(format!("{}{}", TEMP_FILE_PREFIX, Uuid::new_v4().simple()));
    let (status, size) = spool(stream, &path, ud).await;
    info.size = size;

    tracing::debug!(
        field = %info.field,
        filename = %info.name,
        size = size,
        status = status.code(),
        "file part received"
    );

    if status.is_ok() {
        registry.register(&path);
        return CapturedFile::new(info, status, Some(path), registry.clone());
    }

    if let Err(err) = fs::remove_file(&path).await {
        log_cleanup_failure(&path, err);
    }
    CapturedFile::new(info, status, None, registry.clone())
}

async fn spool<S, E>(stream: &mut S, path: &Path, ud: &UploadData<'_>) -> (UploadStatus, usize)
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Debug,
{
    let mut file = match File::create(path).await {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cannot create temporary upload file");
            return (UploadStatus::CantWrite, 0);
        }
    };

    let mut total_size = 0;
    while let Some(chunk) = stream.next().await {
        let data = match chunk {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(error = ?err, received = total_size, "upload stream broke off");
                return (UploadStatus::Partial, total_size);
            }
        };
        total_size += data.len();

        if ud.max_server_size.is_some_and(|max| total_size > max) {
            return (UploadStatus::ExceedsServerLimit, total_size);
        }

        if ud.max_form_size.is_some_and(|max| total_size > max) {
            return (UploadStatus::ExceedsFormLimit, total_size);
        }

        if let Err(err) = file.write_all(&data).await {
            tracing::warn!(path = %path.display(), error = %err, "cannot write temporary upload file");
            return (UploadStatus::CantWrite, total_size);
        }
    }

    if let Err(err) = file.flush().await {
        tracing::warn!(path = %path.display(), error = %err, "cannot flush temporary upload file");
        return (UploadStatus::CantWrite, total_size);
    }

    (UploadStatus::Ok, total_size)
}

/// Dropping it deletes and unregisters the temp file unless it was persisted.
#[derive(Debug)]
pub struct CapturedFile {
    info: FileInfo,
    status: UploadStatus,
    temp_path: Option<PathBuf>,
    registry: UploadRegistry,
}

impl CapturedFile {
    fn new(
        info: FileInfo,
        status: UploadStatus,
        temp_path: Option<PathBuf>,
        registry: UploadRegistry,
    ) -> Self {
        Self { info, status, temp_path, registry }
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }

    pub async fn save<P: AsRef<Path>>(&self, path: &P) -> UploadResult<()> {
        let temp_path = self.temp_path.as_ref().ok_or_else(no_temp_file)?;

        fs::copy(temp_path, path).await?;
        Ok(())
    }

    pub async fn persist<P: AsRef<Path>>(mut self, path: P) -> UploadResult<()> {
        let temp_path = self.temp_path.clone().ok_or_else(no_temp_file)?;

        // rename fails across filesystems, drop removes the temp file after the copy
        if fs::rename(&temp_path, path.as_ref()).await.is_err() {
            fs::copy(&temp_path, path.as_ref()).await?;
            return Ok(());
        }

        self.registry.unregister(&temp_path);
        self.temp_path = None;
        Ok(())
    }

    pub async fn discard(mut self) -> UploadResult<()> {
        if let Some(path) = self.temp_path.take() {
            self.registry.unregister(&path);
            fs::remove_file(&path).await?;
        }

        Ok(())
    }
}

impl Drop for CapturedFile {
    fn drop(&mut self) {
        if let Some(path) = self.temp_path.take() {
            self.registry.unregister(&path);
            if let Err(err) = std::fs::remove_file(&path) {
                log_cleanup_failure(&path, err);
            }
        }
    }
}

fn no_temp_file() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "upload has no temporary file")
}

fn log_cleanup_failure(path: &Path, err: io::Error) {
    if err.kind() != io::ErrorKind::NotFound {
        tracing::warn!(path = %path.display(), error = %err, "cannot remove temporary upload file");
    }
}

impl StreamMetadata for CapturedFile {
    fn metadata(&self, key: &str) -> Option<String> {
        match key {
            "uri" => self
                .temp_path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

impl UploadedFile for CapturedFile {
    fn client_filename(&self) -> Option<String> {
        Some(self.info.name.clone())
    }

    fn error(&self) -> i64 {
        self.status.code()
    }

    fn stream(&self) -> &dyn StreamMetadata {
        self
    }
}
