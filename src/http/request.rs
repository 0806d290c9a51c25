//! Outbound request description, independent of the HTTP library.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::params::QueryParams;

/// Timeout for multipart uploads.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
  Empty,
  Json(Value),
  Multipart(UploadForm),
}

/// A fully marshaled API call. Cheap to clone so it can be replayed by the
/// retry wrapper and after a token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
  pub method: Method,
  /// Path relative to the API base URL, e.g. `photos/42/`
  pub path: String,
  pub query: QueryParams,
  pub body: Body,
  /// Overrides the transport default when set
  pub timeout: Option<Duration>,
}

impl ApiRequest {
  pub fn new(method: Method, path: impl Into<String>) -> Self {
    let path = path.into();
    Self {
      method,
      path: path.trim_start_matches('/').to_string(),
      query: QueryParams::new(),
      body: Body::Empty,
      timeout: None,
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new(Method::GET, path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new(Method::POST, path)
  }

  pub fn put(path: impl Into<String>) -> Self {
    Self::new(Method::PUT, path)
  }

  pub fn patch(path: impl Into<String>) -> Self {
    Self::new(Method::PATCH, path)
  }

  pub fn delete(path: impl Into<String>) -> Self {
    Self::new(Method::DELETE, path)
  }

  pub fn query(mut self, key: &str, value: impl ToString) -> Self {
    self.query.insert(key, value);
    self
  }

  pub fn params(mut self, params: &QueryParams) -> Self {
    self.query = std::mem::take(&mut self.query).merge(params);
    self
  }

  pub fn json(mut self, body: Value) -> Self {
    self.body = Body::Json(body);
    self
  }

  /// Serialize a typed body.
  pub fn json_from<T: Serialize>(self, body: &T) -> ApiResult<Self> {
    let value = serde_json::to_value(body)
      .map_err(|e| ApiError::validation(format!("Failed to encode request body: {}", e)))?;
    Ok(self.json(value))
  }

  pub fn multipart(mut self, form: UploadForm) -> Self {
    self.body = Body::Multipart(form);
    self.timeout = Some(UPLOAD_TIMEOUT);
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

/// A file attached to a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
  pub field: String,
  pub file_name: String,
  pub mime: String,
  pub bytes: Vec<u8>,
}

/// Scalar fields plus files, rebuilt into a fresh multipart body on every
/// attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
  pub fields: Vec<(String, String)>,
  pub files: Vec<FilePart>,
}

impl UploadForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn text(mut self, name: &str, value: impl ToString) -> Self {
    self.fields.push((name.to_string(), value.to_string()));
    self
  }

  pub fn text_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
    match value {
      Some(v) => self.text(name, v),
      None => self,
    }
  }

  /// Attach a file. The MIME type is guessed from the file name.
  pub fn file(mut self, field: &str, file_name: &str, bytes: Vec<u8>) -> Self {
    let mime = mime_guess::from_path(file_name)
      .first_or_octet_stream()
      .essence_str()
      .to_string();
    self.files.push(FilePart {
      field: field.to_string(),
      file_name: file_name.to_string(),
      mime,
      bytes,
    });
    self
  }

  pub fn to_multipart(&self) -> ApiResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in &self.fields {
      form = form.text(name.clone(), value.clone());
    }
    for file in &self.files {
      let part = reqwest::multipart::Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime)
        .map_err(|e| ApiError::validation(format!("Invalid MIME type {}: {}", file.mime, e)))?;
      form = form.part(file.field.clone(), part);
    }
    Ok(form)
  }
}
