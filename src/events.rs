//! 描画側と共有するUI状態。

use std::collections::VecDeque;

use crate::{
    flow::{SUBMIT_LABEL, UploadView},
    models::UploadRecord,
    panels::{ComparisonPanel, ValidationPanel},
};

/// 描画側が参照する状態一式。
#[derive(Clone, Debug)]
pub struct UiState {
    /// 選択中ファイル名の表示（Noneなら非表示）。
    pub selected_file: Option<String>,
    /// 送信ボタンが押せるかどうか。
    pub submit_enabled: bool,
    /// 送信ボタンの現在のラベル。
    pub submit_label: String,
    /// 未確認の通知。先頭だけを表示し、閉じるまで入力を止める。
    notices: VecDeque<String>,
    /// 最新のアップロード一覧（新しい順）。
    pub uploads: Vec<UploadRecord>,
    /// 最初の一覧取得（成功・失敗どちらでも）が済んだか。
    pub uploads_loaded: bool,
    /// 一覧取得の直近の失敗内容。成功すると消える。
    pub uploads_error: Option<String>,
    /// アップロード一覧の選択行。
    pub selected_row: usize,
    /// 比較パネルの内容。
    pub comparison: Option<ComparisonPanel>,
    /// 検証パネルの内容。
    pub validation: Option<ValidationPanel>,
    /// 画面下部のステータス文言。
    pub status: String,
    /// アップロードフローからの再取得要求。イベントループがコマンドに変換する。
    pub refresh_requested: bool,
}

impl UiState {
    /// 初期状態：未選択で送信不可。
    pub fn new() -> Self {
        Self {
            selected_file: None,
            submit_enabled: false,
            submit_label: SUBMIT_LABEL.into(),
            notices: VecDeque::new(),
            uploads: vec![],
            uploads_loaded: false,
            uploads_error: None,
            selected_row: 0,
            comparison: None,
            validation: None,
            status: "Ready".into(),
            refresh_requested: false,
        }
    }

    /// 表示中の通知（キューの先頭）。
    pub fn notice(&self) -> Option<&str> {
        self.notices.front().map(String::as_str)
    }

    /// 表示中のものを除いた待ち件数。
    pub fn pending_notices(&self) -> usize {
        self.notices.len().saturating_sub(1)
    }

    /// 先頭の通知を閉じ、次があればそれを表示させる。
    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    /// 一覧を差し替え、選択行を範囲内に収める。
    pub fn set_uploads(&mut self, uploads: Vec<UploadRecord>) {
        // 取得に成功したので失敗表示は消す。
        self.uploads = uploads;
        self.uploads_loaded = true;
        self.uploads_error = None;
        // 行数が減った場合に備えて選択位置を補正する。
        if self.selected_row >= self.uploads.len() {
            self.selected_row = self.uploads.len().saturating_sub(1);
        }
    }

    /// 一覧取得の失敗を記録する。前回の一覧はそのまま残す。
    pub fn set_uploads_error(&mut self, error: String) {
        self.uploads_loaded = true;
        self.status = format!("Refresh failed: {error}");
        self.uploads_error = Some(error);
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadView for UiState {
    fn show_selection(&mut self, name: Option<&str>) {
        self.selected_file = name.map(|n| format!("Selected: {n}"));
    }

    fn set_submit(&mut self, enabled: bool, label: &str) {
        self.submit_enabled = enabled;
        self.submit_label = label.to_string();
    }

    fn notify(&mut self, message: String) {
        // 上書きせず後ろに積む。前の通知を見落とさないため。
        tracing::info!("notice: {message}");
        self.notices.push_back(message);
    }

    fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }
}
