//! アップロードサーバーが返すレコードのモデル。

use serde::{Deserialize, Serialize};
use std::fmt;

/// アップロード1件の処理状態。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UploadStatus {
    /// 保存済みで処理待ち。
    Pending,
    /// 行を取り込み中。
    Processing,
    /// 取り込み完了。
    Completed,
    /// 取り込み失敗（理由は `UploadRecord::error_message`）。
    Failed,
    /// 未知の状態。文字列のまま保持する。
    Other(String),
}

impl From<String> for UploadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => UploadStatus::Pending,
            "processing" => UploadStatus::Processing,
            "completed" => UploadStatus::Completed,
            "failed" => UploadStatus::Failed,
            _ => UploadStatus::Other(s),
        }
    }
}

impl From<UploadStatus> for String {
    fn from(s: UploadStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Pending => f.write_str("pending"),
            UploadStatus::Processing => f.write_str("processing"),
            UploadStatus::Completed => f.write_str("completed"),
            UploadStatus::Failed => f.write_str("failed"),
            UploadStatus::Other(s) => f.write_str(s),
        }
    }
}

/// `GET /api/uploads` の1行。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// サーバー側ID（`/api/validate/{id}` で使う）。
    pub id: i64,
    /// アップロード時のファイル名。
    pub file_name: String,
    /// サーバーが送るISO-8601形式の日時。
    pub created_at: String,
    /// 現在の処理状態。
    pub status: UploadStatus,
    /// 取り込み済み行数（nullの場合あり）。
    #[serde(default)]
    pub processed_rows: Option<u64>,
    /// 失敗時の理由。
    #[serde(default)]
    pub error_message: Option<String>,
}

impl UploadRecord {
    /// 行数（未設定は0とみなす）。
    pub fn rows(&self) -> u64 {
        self.processed_rows.unwrap_or(0)
    }
}

/// 受け付けたアップロードの概要。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub id: i64,
    pub file_name: String,
    pub status: UploadStatus,
}

/// `POST /upload` 成功時の本文。
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub upload: Option<UploadSummary>,
}

/// 比較表示に使う商品行の1バージョン。
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    /// このバージョンの元になったアップロード名。
    #[serde(default)]
    pub upload_file: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    /// 価格。送られた表記のまま出すためJSON値で持つ。
    #[serde(default)]
    pub piece_price: serde_json::Value,
}

/// `GET /api/compare/{key}` の本文（全項目が省略されうる）。
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    #[serde(default)]
    pub unique_key: Option<String>,
    #[serde(default)]
    pub previous: Option<RecordSnapshot>,
    #[serde(default)]
    pub latest: Option<RecordSnapshot>,
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// 1つのキーの前回版と最新版。
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonResult {
    pub unique_key: String,
    pub previous: RecordSnapshot,
    pub latest: RecordSnapshot,
    pub changed: bool,
}

impl CompareResponse {
    /// 両バージョンが揃った時だけ比較結果にする。
    pub fn into_result(self, requested_key: &str) -> Option<ComparisonResult> {
        let latest = self.latest?;
        let previous = self.previous?;
        Some(ComparisonResult {
            unique_key: self.unique_key.unwrap_or_else(|| requested_key.to_string()),
            previous,
            latest,
            changed: self.changed,
        })
    }
}

/// `GET /api/validate/{id}` の本文。
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub total_uploaded: u64,
    /// 指定した期待キーの件数。
    #[serde(default)]
    pub expected_keys: Option<u64>,
    #[serde(default)]
    pub found_keys: Option<Vec<String>>,
    #[serde(default)]
    pub missing_keys: Option<Vec<String>>,
    /// 保存済み行の先頭数件（形式は自由）。
    #[serde(default)]
    pub sample_records: Option<Vec<serde_json::Value>>,
}

/// `GET /health` の本文。
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_record_defaults_missing_rows_to_zero() {
        // nullの行数が0になることを検証する。
        let json = r#"{"id":7,"fileName":"a.csv","createdAt":"2024-05-01T10:15:30","status":"processing","processedRows":null}"#;
        let r: UploadRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.rows(), 0);
        assert_eq!(r.status, UploadStatus::Processing);
        assert!(r.error_message.is_none());
    }

    #[test]
    fn test_unknown_status_is_kept_verbatim() {
        // 未知の状態が文字列のまま残ることを検証する。
        let s: UploadStatus = serde_json::from_str(r#""archived""#).unwrap();
        assert_eq!(s, UploadStatus::Other("archived".into()));
        assert_eq!(s.to_string(), "archived");
    }

    #[test]
    fn test_compare_response_requires_both_versions() {
        // 片方しか無い比較は結果にしないことを検証する。
        let json = r#"{"uniqueKey":"K1","latest":{"productTitle":"Tee","piecePrice":4.5,"uploadFile":"b.csv"},"changed":true}"#;
        let resp: CompareResponse = serde_json::from_str(json).unwrap();
        assert!(resp.into_result("K1").is_none());
    }

    #[test]
    fn test_compare_response_only_one_version_message() {
        // 1バージョンのみのメッセージを検証する。
        let json = r#"{"message":"Only one version found for this key"}"#;
        let resp: CompareResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.message.as_deref(),
            Some("Only one version found for this key")
        );
        assert!(resp.into_result("K1").is_none());
    }

    #[test]
    fn test_compare_response_falls_back_to_requested_key() {
        // キーが無ければ要求キーを使うことを検証する。
        let json = r#"{
            "previous":{"productTitle":"Tee","piecePrice":4.5,"uploadFile":"a.csv"},
            "latest":{"productTitle":"Tee","piecePrice":4.75,"uploadFile":"b.csv"},
            "changed":true
        }"#;
        let resp: CompareResponse = serde_json::from_str(json).unwrap();
        let result = resp.into_result("K9").unwrap();
        assert_eq!(result.unique_key, "K9");
        assert!(result.changed);
        assert_eq!(result.latest.upload_file.as_deref(), Some("b.csv"));
    }

    #[test]
    fn test_validation_result_optional_lists() {
        // 省略された一覧がNoneになることを検証する。
        let r: ValidationResult = serde_json::from_str(r#"{"totalUploaded":3}"#).unwrap();
        assert_eq!(r.total_uploaded, 3);
        assert!(r.missing_keys.is_none());
        assert!(r.sample_records.is_none());
    }
}
