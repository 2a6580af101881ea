//! アップロード一覧と比較・検証パネルに表示する文字列。

use chrono::{DateTime, Local, NaiveDateTime};

use crate::models::{ComparisonResult, RecordSnapshot, UploadRecord, ValidationResult};

/// アップロードが1件も無い時に一覧の代わりに出す。
pub const NO_UPLOADS: &str = "No uploads yet";
pub const NO_COMPARISON: &str = "No comparison data found for this key";
pub const CHANGED: &str = "Record was updated";
pub const UNCHANGED: &str = "No changes detected";
pub const ALL_KEYS_FOUND: &str = "All expected keys found";

/// 比較パネルの内容。
#[derive(Clone, Debug, PartialEq)]
pub enum ComparisonPanel {
    Found(ComparisonResult),
    NotFound { unique_key: String },
}

/// 検証パネルの内容：対象アップロードと検証結果。
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationPanel {
    pub upload: UploadRecord,
    pub result: ValidationResult,
}

/// `createdAt` をローカル時刻で整形する（解釈できなければそのまま）。
pub fn format_created_at(raw: &str) -> String {
    // タイムゾーン無しの形式はそのまま整形する。
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    // オフセット付きはローカル時刻へ変換する。
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
    raw.to_string()
}

/// 一覧の1行分：日時、ファイル名、状態、行数、エラー内容。
pub fn upload_row(u: &UploadRecord) -> [String; 5] {
    [
        format_created_at(&u.created_at),
        u.file_name.clone(),
        u.status.to_string(),
        u.rows().to_string(),
        u.error_message.clone().unwrap_or_default(),
    ]
}

/// JSONの値を画面表示用の文字列にする（文字列は引用符なし）。
pub fn display_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".into(),
        other => other.to_string(),
    }
}

/// 1バージョン分の表示行。
fn snapshot_lines(heading: &str, s: &RecordSnapshot) -> Vec<String> {
    vec![
        heading.to_string(),
        format!("  File: {}", s.upload_file.as_deref().unwrap_or("-")),
        format!("  Title: {}", s.product_title.as_deref().unwrap_or("-")),
        format!("  Price: ${}", display_value(&s.piece_price)),
    ]
}

/// 比較パネルの表示行。
pub fn comparison_lines(panel: &ComparisonPanel) -> Vec<String> {
    match panel {
        ComparisonPanel::NotFound { unique_key } => {
            // 文言は固定にし、キーは別の行に出す。
            vec![NO_COMPARISON.to_string(), format!("Key: {unique_key}")]
        }
        ComparisonPanel::Found(c) => {
            // 前後のバージョンを並べ、最後に変更有無を出す。
            let mut lines = vec![format!("Comparison for: {}", c.unique_key), String::new()];
            lines.extend(snapshot_lines("Previous Version:", &c.previous));
            lines.extend(snapshot_lines("Latest Version:", &c.latest));
            lines.push(String::new());
            lines.push(if c.changed { CHANGED } else { UNCHANGED }.to_string());
            lines
        }
    }
}

/// 検証パネルの表示行。
pub fn validation_lines(panel: &ValidationPanel) -> Vec<String> {
    let ValidationPanel { upload, result } = panel;
    // 概要を先頭に出す。
    let mut lines = vec![
        format!("Validation for: {}", upload.file_name),
        format!("Total Records: {}", result.total_uploaded),
        format!("Status: {}", upload.status),
    ];
    // 期待キーを指定した時だけ件数を出す。
    if let Some(expected) = result.expected_keys {
        let found = result.found_keys.as_ref().map_or(0, Vec::len);
        lines.push(format!("Expected Keys: {expected} (found {found})"));
    }

    // 不足キーが無ければ全件見つかった扱い。
    match &result.missing_keys {
        Some(missing) if !missing.is_empty() => {
            lines.push(format!("Missing Keys: {}", missing.join(", ")));
        }
        _ => lines.push(ALL_KEYS_FOUND.to_string()),
    }

    // サンプルは整形済みJSONで出す。
    if let Some(samples) = &result.sample_records {
        lines.push(String::new());
        lines.push("Sample Records:".into());
        let pretty = serde_json::to_string_pretty(samples).unwrap_or_else(|e| e.to_string());
        lines.extend(pretty.lines().map(str::to_string));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadStatus;

    fn snapshot(file: &str, title: &str, price: serde_json::Value) -> RecordSnapshot {
        RecordSnapshot {
            upload_file: Some(file.into()),
            product_title: Some(title.into()),
            piece_price: price,
        }
    }

    fn upload() -> UploadRecord {
        UploadRecord {
            id: 4,
            file_name: "march.csv".into(),
            created_at: "2024-03-01T08:30:00.123456".into(),
            status: UploadStatus::Completed,
            processed_rows: None,
            error_message: None,
        }
    }

    #[test]
    fn test_unchanged_comparison_shows_both_versions() {
        // 変更なしでも両バージョンが出ることを検証する。
        let panel = ComparisonPanel::Found(ComparisonResult {
            unique_key: "SKU-1".into(),
            previous: snapshot("feb.csv", "Classic Tee", serde_json::json!(4.5)),
            latest: snapshot("march.csv", "Classic Tee", serde_json::json!(4.5)),
            changed: false,
        });
        let lines = comparison_lines(&panel);

        assert_eq!(lines[0], "Comparison for: SKU-1");
        assert!(lines.contains(&"  File: feb.csv".to_string()));
        assert!(lines.contains(&"  File: march.csv".to_string()));
        assert_eq!(
            lines.iter().filter(|l| *l == "  Title: Classic Tee").count(),
            2
        );
        assert_eq!(lines.iter().filter(|l| *l == "  Price: $4.5").count(), 2);
        assert_eq!(lines.last().unwrap(), UNCHANGED);
    }

    #[test]
    fn test_changed_comparison() {
        // 価格の変更が文字列のまま出ることを検証する。
        let panel = ComparisonPanel::Found(ComparisonResult {
            unique_key: "SKU-1".into(),
            previous: snapshot("feb.csv", "Tee", serde_json::json!("4.50")),
            latest: snapshot("march.csv", "Tee", serde_json::json!("5.00")),
            changed: true,
        });
        let lines = comparison_lines(&panel);
        assert!(lines.contains(&"  Price: $4.50".to_string()));
        assert!(lines.contains(&"  Price: $5.00".to_string()));
        assert_eq!(lines.last().unwrap(), CHANGED);
    }

    #[test]
    fn test_comparison_not_found() {
        // 見つからない時の文言が固定であることを検証する。
        let panel = ComparisonPanel::NotFound {
            unique_key: "X".into(),
        };
        assert_eq!(
            comparison_lines(&panel),
            vec![NO_COMPARISON.to_string(), "Key: X".to_string()]
        );
    }

    #[test]
    fn test_validation_with_missing_keys_and_samples() {
        // 不足キーとサンプルの表示を検証する。
        let panel = ValidationPanel {
            upload: upload(),
            result: ValidationResult {
                total_uploaded: 2,
                expected_keys: Some(3),
                found_keys: Some(vec!["A".into(), "B".into()]),
                missing_keys: Some(vec!["C".into()]),
                sample_records: Some(vec![serde_json::json!({"uniqueKey": "A"})]),
            },
        };
        let lines = validation_lines(&panel);

        assert_eq!(lines[0], "Validation for: march.csv");
        assert!(lines.contains(&"Total Records: 2".to_string()));
        assert!(lines.contains(&"Status: completed".to_string()));
        assert!(lines.contains(&"Expected Keys: 3 (found 2)".to_string()));
        assert!(lines.contains(&"Missing Keys: C".to_string()));
        assert!(lines.contains(&"Sample Records:".to_string()));
        assert!(lines.iter().any(|l| l.contains("\"uniqueKey\": \"A\"")));
    }

    #[test]
    fn test_validation_without_missing_keys() {
        // 不足キーが無い時の表示を検証する。
        let panel = ValidationPanel {
            upload: upload(),
            result: ValidationResult {
                total_uploaded: 0,
                missing_keys: Some(vec![]),
                ..Default::default()
            },
        };
        let lines = validation_lines(&panel);
        assert!(lines.contains(&ALL_KEYS_FOUND.to_string()));
        assert!(!lines.contains(&"Sample Records:".to_string()));
    }

    #[test]
    fn test_upload_row_formats_date_and_rows() {
        // 日時の整形と行数の既定値を検証する。
        let row = upload_row(&upload());
        assert_eq!(row[0], "2024-03-01 08:30:00");
        assert_eq!(row[1], "march.csv");
        assert_eq!(row[2], "completed");
        assert_eq!(row[3], "0");
        assert_eq!(row[4], "");
    }

    #[test]
    fn test_upload_row_shows_failure_reason() {
        // 失敗理由が専用の列に出ることを検証する。
        let mut u = upload();
        u.status = UploadStatus::Failed;
        u.error_message = Some("bad header".into());
        let row = upload_row(&u);
        assert_eq!(row[2], "failed");
        assert_eq!(row[4], "bad header");
    }

    #[test]
    fn test_unparseable_date_is_kept() {
        // 解釈できない日時はそのまま出す。
        assert_eq!(format_created_at("yesterday"), "yesterday");
    }
}
