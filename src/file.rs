use std::collections::HashMap;

use ntex::http::HeaderMap;

use crate::result::{UploadError, UploadResult};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub field: String,
    pub name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

impl FileInfo {
    /// Returns `Ok(None)` for parts without a `filename`, i.e. plain form fields.
    pub fn from_headers(headers: &HeaderMap) -> UploadResult<Option<Self>> {
        let content_disposition = Self::get_content_disposition(headers)?;
        let mut variables = Self::parse_content_disposition(&content_disposition);

        let field = variables
            .remove("name")
            .ok_or(UploadError::InvalidContentDisposition)?;

        let name = match variables.remove("filename") {
            None => return Ok(None),
            Some(name) => name,
        };

        Ok(Some(Self {
            field,
            name,
            content_type: Self::get_content_type(headers)?,
            size: 0,
        }))
    }

    fn parse_content_disposition(content_disposition: &str) -> HashMap<String, String> {
        let mut variables = HashMap::new();

        for part in content_disposition.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                let value = value.trim().trim_matches('"').to_string();
                variables.insert(key, value);
            }
        }

        variables
    }

    fn get_content_type(headers: &HeaderMap) -> UploadResult<Option<String>> {
        match headers.get("content-type") {
            None => Ok(None),
            Some(header) => header
                .to_str()
                .map(|v| Some(v.to_string()))
                .map_err(|_| UploadError::InvalidContentType),
        }
    }

    fn get_content_disposition(headers: &HeaderMap) -> UploadResult<String> {
        match headers.get("content-disposition") {
            None => Err(UploadError::InvalidContentDisposition),
            Some(header) => header
                .to_str()
                .map(|v| v.to_string())
                .map_err(|_| UploadError::InvalidContentDisposition),
        }
    }
}
