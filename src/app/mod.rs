//! TUIのイベントループ、入力処理、状態管理。

mod handlers;
mod render;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc;

use crate::{
    api::HttpBackend,
    config::Config,
    events::UiState,
    flow::{UploadFlow, UploadView},
    input::InputBoxState,
    panels::{ComparisonPanel, ValidationPanel},
    poller::RefreshTimer,
    shortcuts::Shortcuts,
    ui::Tui,
    worker::{self, WorkerCmd, WorkerEvent},
};

use handlers::{handle_key, handle_paste, is_ctrl_c};
use render::draw;

/// 入力処理と描画で共有するアプリ状態。
pub struct App {
    /// 現在の設定。
    pub cfg: Config,
    /// 描画側が参照するUI状態。
    pub ui: UiState,
    /// 選択ファイルと送信状態のステートマシン。
    pub flow: UploadFlow,
    /// Workerへのコマンド送信口。
    pub worker_tx: mpsc::Sender<WorkerCmd>,
    /// Workerからのイベント受信口。
    pub worker_rx: mpsc::Receiver<WorkerEvent>,
    /// 開いている入力ポップアップ。
    pub input_box: Option<InputBoxState>,
    /// キー割り当て。
    pub shortcuts: Shortcuts,
}

impl App {
    /// 設定とチャネルからアプリ状態を組み立てる。
    pub fn new(
        cfg: Config,
        shortcuts: Shortcuts,
        worker_tx: mpsc::Sender<WorkerCmd>,
        worker_rx: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        // 受け付ける拡張子は設定から取る。
        let flow = UploadFlow::new(cfg.upload.extension.clone());
        Self {
            cfg,
            ui: UiState::new(),
            flow,
            worker_tx,
            worker_rx,
            input_box: None,
            shortcuts,
        }
    }
}

/// ユーザーが終了するまでメインTUIループを回す。
pub async fn run_app(terminal: &mut Tui, cfg: Config) -> Result<()> {
    // ショートカット設定を読み込む（無ければデフォルト）。
    let shortcuts = Shortcuts::load_or_default(PathBuf::from("shortcut.toml"))?;

    // Worker通信用のコマンド/イベントチャネルを作る。
    let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCmd>(64);
    let (tx_ev, rx_ev) = mpsc::channel::<WorkerEvent>(256);

    // HTTPバックエンドを用意してWorkerを起動する。
    let backend = HttpBackend::new(&cfg)?;
    tokio::spawn(worker::run(rx_cmd, tx_ev, backend));

    // 定期更新を開始する（初回は即時に一覧を取得）。
    let timer = RefreshTimer::spawn(cfg.refresh_interval(), tx_cmd.clone());
    // 起動時に一度だけサーバーの疎通を確認する。
    tx_cmd.send(WorkerCmd::CheckHealth).await?;

    // アプリ状態を初期化する。
    let mut app = App::new(cfg, shortcuts, tx_cmd, rx_ev);
    tracing::info!("backend: {}", app.cfg.server.base_url);

    loop {
        // 現在の状態を描画する。
        terminal.draw(|f| draw(f, &app))?;

        // 入力処理の前にWorkerイベントを消化する。
        while let Ok(ev) = app.worker_rx.try_recv() {
            handle_worker_event(&mut app, ev);
        }
        // アップロード成功で要求された再取得を送る。
        flush_refresh(&mut app).await?;

        // UIの応答性確保のため短いタイムアウトで入力をポーリングする。
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    // どの状態でもCtrl+Cで終了できるようにする。
                    if is_ctrl_c(&k) || handle_key(&mut app, k).await? {
                        break;
                    }
                }
                // ドラッグ&ドロップは貼り付けとして届く。
                Event::Paste(text) => handle_paste(&mut app, &text).await?,
                _ => {}
            }
        }
    }

    // 定期更新を止めて終了する。
    timer.cancel();
    Ok(())
}

/// WorkerイベントをUI状態へ反映する。
pub(crate) fn handle_worker_event(app: &mut App, ev: WorkerEvent) {
    match ev {
        WorkerEvent::UploadFinished(result) => {
            // 結果をステートマシンへ渡し、表示はそちらに任せる。
            app.flow.finish_submit(result, &mut app.ui);
        }
        WorkerEvent::UploadsLoaded(uploads) => {
            // 件数と更新時刻をステータスに出して一覧を差し替える。
            app.ui.status = format!(
                "{} uploads (updated {})",
                uploads.len(),
                chrono::Local::now().format("%H:%M:%S")
            );
            app.ui.set_uploads(uploads);
        }
        WorkerEvent::RefreshFailed(e) => {
            // 一覧は前回のまま残し、失敗だけ記録する。
            app.ui.set_uploads_error(e);
        }
        WorkerEvent::ComparisonLoaded { unique_key, result } => {
            // 比較結果が無ければ「見つからない」表示にする。
            app.ui.comparison = Some(match result {
                Some(c) => ComparisonPanel::Found(c),
                None => ComparisonPanel::NotFound { unique_key },
            });
        }
        WorkerEvent::ValidationLoaded { upload, result } => {
            // 検証パネルを更新する。
            app.ui.status = format!("Validated {}", upload.file_name);
            app.ui.validation = Some(ValidationPanel { upload, result });
        }
        WorkerEvent::Log(s) => {
            // 情報メッセージはステータスに出す。
            app.ui.status = s;
        }
        WorkerEvent::Notice(s) => {
            // 通知はキューに積み、順番に表示する。
            app.ui.notify(s);
        }
    }
}

/// アップロードフローからの再取得要求をWorkerコマンド1件に変換する。
pub(crate) async fn flush_refresh(app: &mut App) -> Result<()> {
    // 要求フラグは取り出した時点で下ろす。
    if std::mem::take(&mut app.ui.refresh_requested) {
        tracing::info!("refresh requested after upload");
        app.worker_tx.send(WorkerCmd::RefreshUploads).await?;
    }
    Ok(())
}
