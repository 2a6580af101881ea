//! Upload backend HTTP helpers.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::Config,
    error::ApiError,
    flow::PendingSelection,
    models::{
        CompareResponse, ComparisonResult, HealthStatus, UploadReceipt, UploadRecord,
        ValidationResult,
    },
};

/// Operations the client needs from the backend.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// `POST /upload` with the selected file.
    async fn upload(&self, file: &PendingSelection) -> Result<UploadReceipt, ApiError>;
    /// `GET /api/uploads`, most recent first.
    async fn list_uploads(&self) -> Result<Vec<UploadRecord>, ApiError>;
    /// `GET /api/compare/{key}`; `None` when there is nothing to compare.
    async fn compare(&self, unique_key: &str) -> Result<Option<ComparisonResult>, ApiError>;
    /// `GET /api/validate/{id}`, optionally checking `expected_keys`.
    async fn validate(
        &self,
        upload_id: i64,
        expected_keys: &[String],
    ) -> Result<ValidationResult, ApiError>;
    /// `GET /health`.
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

/// Error body sent with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest implementation of [`Backend`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
    field_name: String,
}

impl HttpBackend {
    /// Build a client with the configured base URL and timeout.
    pub fn new(cfg: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.server.base_url.trim_end_matches('/').to_string(),
            field_name: cfg.upload.field_name.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a GET and return status plus raw body.
    async fn get(&self, url: String) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, file: &PendingSelection) -> Result<UploadReceipt, ApiError> {
        // Read the whole file up front so a missing file fails before any request.
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| ApiError::Io(format!("cannot read {}: {e}", file.path.display())))?;

        // Single multipart part named after the configured form field.
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part(self.field_name.clone(), part);

        let resp = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        decode_upload(status, &body)
    }

    async fn list_uploads(&self) -> Result<Vec<UploadRecord>, ApiError> {
        let (status, body) = self.get(self.url("/api/uploads")).await?;
        decode_json(status, &body)
    }

    async fn compare(&self, unique_key: &str) -> Result<Option<ComparisonResult>, ApiError> {
        let url = self.url(&compare_path(unique_key));
        let (status, body) = self.get(url).await?;
        decode_compare(status, &body, unique_key)
    }

    async fn validate(
        &self,
        upload_id: i64,
        expected_keys: &[String],
    ) -> Result<ValidationResult, ApiError> {
        let url = self.url(&validate_path(upload_id, expected_keys));
        let (status, body) = self.get(url).await?;
        decode_json(status, &body)
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        let (status, body) = self.get(self.url("/health")).await?;
        decode_json(status, &body)
    }
}

/// Path for a comparison lookup with the key percent-encoded.
pub fn compare_path(unique_key: &str) -> String {
    format!("/api/compare/{}", urlencoding::encode(unique_key))
}

/// Path for a validation lookup; expected keys go comma-joined in `keys`.
pub fn validate_path(upload_id: i64, expected_keys: &[String]) -> String {
    if expected_keys.is_empty() {
        format!("/api/validate/{upload_id}")
    } else {
        format!(
            "/api/validate/{upload_id}?keys={}",
            urlencoding::encode(&expected_keys.join(","))
        )
    }
}

/// `error` field of a failure body, if the body is JSON and has one.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
}

fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        message: error_message(body),
    }
}

/// Decode a 2xx JSON body, mapping other statuses to [`ApiError::Status`].
pub fn decode_json<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    Ok(serde_json::from_slice(body)?)
}

/// Any 2xx counts as accepted; the receipt is informational only.
pub fn decode_upload(status: StatusCode, body: &[u8]) -> Result<UploadReceipt, ApiError> {
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    Ok(serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::warn!("upload accepted with unreadable body: {e}");
        UploadReceipt::default()
    }))
}

/// Non-2xx and bodies without both versions mean "no comparison data".
pub fn decode_compare(
    status: StatusCode,
    body: &[u8],
    unique_key: &str,
) -> Result<Option<ComparisonResult>, ApiError> {
    if !status.is_success() {
        tracing::info!(
            "compare {unique_key}: status {} ({})",
            status.as_u16(),
            error_message(body).unwrap_or_default()
        );
        return Ok(None);
    }
    let resp: CompareResponse = serde_json::from_slice(body)?;
    if let Some(msg) = &resp.message {
        tracing::info!("compare {unique_key}: {msg}");
    }
    Ok(resp.into_result(unique_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_path_encodes_key() {
        assert_eq!(compare_path("ABC-1"), "/api/compare/ABC-1");
        assert_eq!(compare_path("A B/C"), "/api/compare/A%20B%2FC");
    }

    #[test]
    fn test_validate_path_with_keys() {
        assert_eq!(validate_path(5, &[]), "/api/validate/5");
        let keys = vec!["K1".to_string(), "K 2".to_string()];
        assert_eq!(validate_path(5, &keys), "/api/validate/5?keys=K1%2CK%202");
    }

    #[test]
    fn test_decode_upload_error_message() {
        let err = decode_upload(StatusCode::BAD_REQUEST, br#"{"error":"bad format"}"#).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: Some("bad format".into())
            }
        );
    }

    #[test]
    fn test_decode_upload_conflict_without_json() {
        let err = decode_upload(StatusCode::CONFLICT, b"<html>conflict</html>").unwrap_err();
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_decode_upload_success_body() {
        let body = br#"{"success":true,"message":"File uploaded successfully. Processing in background.","upload":{"id":3,"fileName":"a.csv","status":"pending"}}"#;
        let receipt = decode_upload(StatusCode::OK, body).unwrap();
        assert_eq!(receipt.upload.unwrap().id, 3);
    }

    #[test]
    fn test_decode_upload_success_tolerates_empty_body() {
        let receipt = decode_upload(StatusCode::OK, b"").unwrap();
        assert_eq!(receipt, UploadReceipt::default());
    }

    #[test]
    fn test_decode_uploads_list() {
        let body = br#"[
            {"id":2,"fileName":"b.csv","createdAt":"2024-05-02T09:00:00","status":"completed","processedRows":120},
            {"id":1,"fileName":"a.csv","createdAt":"2024-05-01T09:00:00","status":"failed","errorMessage":"bad header"}
        ]"#;
        let uploads: Vec<UploadRecord> = decode_json(StatusCode::OK, body).unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].rows(), 120);
        assert_eq!(uploads[1].error_message.as_deref(), Some("bad header"));
    }

    #[test]
    fn test_decode_malformed_list() {
        let err = decode_json::<Vec<UploadRecord>>(StatusCode::OK, br#"{"oops":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_decode_compare_not_found_on_error_status() {
        let r = decode_compare(StatusCode::BAD_REQUEST, br#"{"error":"boom"}"#, "K1").unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn test_decode_compare_found() {
        let body = br#"{
            "uniqueKey":"K1",
            "previous":{"productTitle":"Tee","piecePrice":4.5,"uploadFile":"a.csv"},
            "latest":{"productTitle":"Tee","piecePrice":4.5,"uploadFile":"b.csv"},
            "changed":false
        }"#;
        let r = decode_compare(StatusCode::OK, body, "K1").unwrap().unwrap();
        assert!(!r.changed);
        assert_eq!(r.previous.upload_file.as_deref(), Some("a.csv"));
    }

    #[test]
    fn test_backend_trims_trailing_slash() {
        let mut cfg = Config::default();
        cfg.server.base_url = "http://localhost:8080/".into();
        let backend = HttpBackend::new(&cfg).unwrap();
        assert_eq!(backend.url("/upload"), "http://localhost:8080/upload");
    }
}
