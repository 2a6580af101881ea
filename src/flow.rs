//! ファイル選択とアップロード送信のステート管理。
//!
//! 画面やネットワークには直接触れない。表示の更新は [`UploadView`] 経由で行い、
//! POST自体はWorkerが実行して [`UploadFlow::finish_submit`] へ結果を返す。

use std::path::{Path, PathBuf};

use crate::{error::ApiError, models::UploadReceipt};

/// 待機中の送信ボタンのラベル。
pub const SUBMIT_LABEL: &str = "Upload File";
/// 送信中の送信ボタンのラベル。
pub const SUBMIT_BUSY_LABEL: &str = "Uploading...";

pub const MSG_NOT_CSV: &str = "Please select a CSV file";
pub const MSG_NO_FILE: &str = "Please select a file";
pub const MSG_UPLOADED: &str = "File uploaded successfully! Processing in background.";

/// ステートマシンが操作する表示面。
pub trait UploadView {
    /// `Selected: <name>` を表示する（Noneなら非表示）。
    fn show_selection(&mut self, name: Option<&str>);
    /// 送信ボタンの有効/無効とラベルを設定する。
    fn set_submit(&mut self, enabled: bool, label: &str);
    /// 確認が必要な通知を出す。
    fn notify(&mut self, message: String);
    /// アップロード一覧の再取得を依頼する。
    fn request_refresh(&mut self);
}

/// 選択済みで未送信のファイル。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSelection {
    /// ディスク上の場所。
    pub path: PathBuf,
    /// 末尾のファイル名（表示名かつマルチパートのファイル名）。
    pub name: String,
    /// 許可された拡張子かどうか。
    pub valid: bool,
}

impl PendingSelection {
    /// 選択を作り、拡張子を判定する。
    pub fn new(path: impl Into<PathBuf>, extension: &str) -> Self {
        let path = path.into();
        // 表示と送信に使うファイル名を取り出す。
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let valid = has_extension(&name, extension);
        Self { path, name, valid }
    }
}

/// 大文字小文字を区別しない拡張子判定（例: `DATA.CSV` と `.csv`）。
pub fn has_extension(name: &str, extension: &str) -> bool {
    !extension.is_empty() && name.to_lowercase().ends_with(&extension.to_lowercase())
}

/// 送信フローの状態。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// 未選択。送信不可。
    Empty,
    /// 有効なファイルを選択済み。送信可。
    Ready(PendingSelection),
    /// この選択をPOST中。送信不可。
    Submitting(PendingSelection),
}

/// 選択中ファイルの持ち主。
#[derive(Debug)]
pub struct UploadFlow {
    state: FlowState,
    extension: String,
}

impl UploadFlow {
    /// `Empty` から開始し、`extension` で終わるファイルを受け付ける。
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            state: FlowState::Empty,
            extension: extension.into(),
        }
    }

    /// 現在の状態。
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// `Ready` または `Submitting` で保持している選択。
    pub fn selection(&self) -> Option<&PendingSelection> {
        match &self.state {
            FlowState::Empty => None,
            FlowState::Ready(s) | FlowState::Submitting(s) => Some(s),
        }
    }

    /// POST中かどうか。
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FlowState::Submitting(_))
    }

    /// ファイル選択またはドロップ。先頭の1件だけを使い、空なら何もしない。
    pub fn select_first<I, P>(&mut self, paths: I, view: &mut impl UploadView)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let Some(first) = paths.into_iter().next() else {
            return;
        };
        self.select(PendingSelection::new(first.as_ref(), &self.extension), view);
    }

    /// 選択を `candidate` に置き換える。拡張子が違えば拒否する。
    pub fn select(&mut self, candidate: PendingSelection, view: &mut impl UploadView) {
        // 送信中の選択は受け付けない。
        if self.is_submitting() {
            tracing::info!("selection ignored during upload: {}", candidate.name);
            return;
        }

        if candidate.valid {
            // ファイル名を表示して送信を有効にする。
            tracing::info!("file selected: {}", candidate.path.display());
            view.show_selection(Some(&candidate.name));
            view.set_submit(true, SUBMIT_LABEL);
            self.state = FlowState::Ready(candidate);
        } else {
            // 通知を出して選択を解除する。
            tracing::warn!("file rejected: {}", candidate.path.display());
            view.notify(MSG_NOT_CSV.into());
            self.clear(view);
        }
    }

    /// `Empty` へ戻す（送信中は何もしない）。
    pub fn reset(&mut self, view: &mut impl UploadView) {
        if self.is_submitting() {
            return;
        }
        self.clear(view);
    }

    /// `Ready` から `Submitting` へ進め、POSTするファイルを返す。
    ///
    /// 送るものが無ければ `None`。その場合は通信してはならない。
    pub fn begin_submit(&mut self, view: &mut impl UploadView) -> Option<PendingSelection> {
        match std::mem::replace(&mut self.state, FlowState::Empty) {
            FlowState::Empty => {
                // 未選択なら案内だけ出す。
                view.notify(MSG_NO_FILE.into());
                None
            }
            FlowState::Ready(sel) => {
                // ボタンを無効にしてラベルを送信中へ。
                tracing::info!("upload start: {}", sel.name);
                view.set_submit(false, SUBMIT_BUSY_LABEL);
                self.state = FlowState::Submitting(sel.clone());
                Some(sel)
            }
            submitting @ FlowState::Submitting(_) => {
                // 二重送信はしない。
                self.state = submitting;
                None
            }
        }
    }

    /// [`begin_submit`](Self::begin_submit) で始めたPOSTの結果を反映する。
    pub fn finish_submit(
        &mut self,
        result: Result<UploadReceipt, ApiError>,
        view: &mut impl UploadView,
    ) {
        // 送信中でなければ無関係な結果として捨てる。
        let sel = match std::mem::replace(&mut self.state, FlowState::Empty) {
            FlowState::Submitting(sel) => sel,
            other => {
                tracing::warn!("upload result without pending upload");
                self.state = other;
                return;
            }
        };

        match result {
            Ok(receipt) => {
                // 受付内容をログに残す。
                match &receipt.upload {
                    Some(u) => tracing::info!(
                        "upload done: {} as #{} {} [{}]",
                        sel.name,
                        u.id,
                        u.file_name,
                        u.status
                    ),
                    None => tracing::info!(
                        "upload done: {} ({})",
                        sel.name,
                        receipt.message.as_deref().unwrap_or("no message")
                    ),
                }
                // 選択を消し、通知して一覧の再取得を1回だけ依頼する。
                view.show_selection(None);
                view.set_submit(false, SUBMIT_LABEL);
                view.notify(MSG_UPLOADED.into());
                view.request_refresh();
            }
            Err(e) => {
                // サーバーのエラー文言があればそれを出す。
                tracing::error!("upload failed: {}: {e}", sel.name);
                let message = match &e {
                    ApiError::Status { .. } => format!(
                        "Upload failed: {}",
                        e.server_message().unwrap_or("Unknown error")
                    ),
                    other => format!("Upload error: {other}"),
                };
                // 選択は残して再送できるようにする。
                view.set_submit(true, SUBMIT_LABEL);
                view.notify(message);
                self.state = FlowState::Ready(sel);
            }
        }
    }

    /// 未選択状態へ戻して表示も消す。
    fn clear(&mut self, view: &mut impl UploadView) {
        self.state = FlowState::Empty;
        view.show_selection(None);
        view.set_submit(false, SUBMIT_LABEL);
    }
}
