//! キー入力と貼り付け（ドロップ）のハンドラー関数。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

use crate::{
    flow::UploadView,
    input::{self, InputBoxState, InputCallbackId},
    shortcuts,
    worker::WorkerCmd,
};

use super::App;

/// キー入力を1件処理し、終了すべきならtrueを返す。
pub async fn handle_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // 通知が出ている間は閉じるキー以外を受け付けない。
    if app.ui.notice().is_some() {
        if shortcuts::matches_shortcut(&k, &app.shortcuts.notice.dismiss) {
            // 先頭を閉じる。後続があれば次の描画で出る。
            app.ui.dismiss_notice();
        }
        return Ok(false);
    }

    // 入力ボックスが開いていれば優先して処理する。
    if app.input_box.is_some() {
        return handle_input_box_key(app, k).await;
    }

    // それ以外はメイン画面のキー処理へ。
    handle_main_key(app, k).await
}

/// Ctrl+Cかどうかを判定する。
pub fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c')
}

/// 貼り付けを処理する。入力ボックスが開いていれば文字入力、なければファイルのドロップ。
pub async fn handle_paste(app: &mut App, text: &str) -> Result<()> {
    // 通知が出ている間は無視する。
    if app.ui.notice().is_some() {
        return Ok(());
    }
    // 入力ボックスへそのまま挿入する。
    if let Some(state) = &mut app.input_box {
        state.insert_str(text);
        return Ok(());
    }

    // ドロップ内容をパスに分解し、先頭の1件だけを選択候補にする。
    let paths = input::dropped_paths(text);
    tracing::info!("drop received: {} path(s)", paths.len());
    app.flow.select_first(paths, &mut app.ui);
    Ok(())
}

/// メイン画面のキー処理。
async fn handle_main_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    // メイン画面のショートカットを参照する。
    let sc = &app.shortcuts.main;

    if shortcuts::matches_shortcut(&k, &sc.quit) {
        return Ok(true);
    } else if shortcuts::matches_shortcut(&k, &sc.pick_file) {
        // ファイルパスの入力ボックスを開く。
        app.input_box = Some(InputBoxState::new(
            "CSV file path:",
            InputCallbackId::PickFile,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.submit) {
        // 送信可能な時だけWorkerへアップロードを依頼する。
        if let Some(sel) = app.flow.begin_submit(&mut app.ui) {
            app.worker_tx.send(WorkerCmd::Upload(sel)).await?;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.clear) {
        // 選択を解除する（送信中は何もしない）。
        app.flow.reset(&mut app.ui);
    } else if shortcuts::matches_shortcut(&k, &sc.refresh) {
        // アップロード一覧の再取得を依頼する。
        app.worker_tx.send(WorkerCmd::RefreshUploads).await?;
        app.ui.status = "Refreshing uploads...".into();
    } else if shortcuts::matches_shortcut(&k, &sc.compare) {
        // 比較するキーの入力ボックスを開く。
        app.input_box = Some(InputBoxState::new(
            "UNIQUE_KEY:",
            InputCallbackId::CompareKey,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.validate) {
        // キー指定なしで最新アップロードを検証する。
        request_validation(app, vec![]).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.validate_keys) {
        // 期待キーの入力ボックスを開く。
        app.input_box = Some(InputBoxState::new(
            "Expected keys (comma separated):",
            InputCallbackId::ExpectedKeys,
        ));
    } else if shortcuts::matches_shortcut(&k, &sc.down) {
        // 次の行へ移動する。
        if app.ui.selected_row + 1 < app.ui.uploads.len() {
            app.ui.selected_row += 1;
        }
    } else if shortcuts::matches_shortcut(&k, &sc.up) {
        // 前の行へ移動する。
        app.ui.selected_row = app.ui.selected_row.saturating_sub(1);
    }

    Ok(false)
}

/// 入力ボックスのキー処理。
async fn handle_input_box_key(app: &mut App, k: KeyEvent) -> Result<bool> {
    let Some(input_state) = &mut app.input_box else {
        return Ok(false);
    };
    // 入力ボックスのショートカットを参照する。
    let sc = &app.shortcuts.input_box;

    if shortcuts::matches_shortcut(&k, &sc.confirm) {
        // 値を取り出して閉じ、コールバックへ渡す。
        let value = input_state.value.clone();
        let callback_id = input_state.callback_id.clone();
        app.input_box = None;
        apply_input_callback(app, callback_id, value).await?;
    } else if shortcuts::matches_shortcut(&k, &sc.cancel) {
        // 入力を破棄して閉じる。
        app.input_box = None;
    } else if shortcuts::matches_shortcut(&k, &sc.backspace) {
        input_state.backspace();
    } else if shortcuts::matches_shortcut(&k, &sc.delete) {
        input_state.delete();
    } else if shortcuts::matches_shortcut(&k, &sc.left) {
        input_state.move_left();
    } else if shortcuts::matches_shortcut(&k, &sc.right) {
        input_state.move_right();
    } else if shortcuts::matches_shortcut(&k, &sc.home) {
        input_state.move_home();
    } else if shortcuts::matches_shortcut(&k, &sc.end) {
        input_state.move_end();
    } else if shortcuts::matches_shortcut(&k, &sc.clear_line) {
        input_state.clear_line();
    } else if let KeyCode::Char(c) = k.code
        && !k.modifiers.contains(KeyModifiers::CONTROL)
    {
        // 通常の文字入力。
        input_state.insert_char(c);
    }

    Ok(false)
}

/// 確定した入力値を用途ごとに処理する。
async fn apply_input_callback(
    app: &mut App,
    callback_id: InputCallbackId,
    value: String,
) -> Result<()> {
    match callback_id {
        InputCallbackId::PickFile => {
            // 前後の空白と引用符を落とす。
            let path = value.trim().trim_matches(|c| c == '\'' || c == '"');
            // 空で確定した場合は閉じたのと同じ扱い。
            if !path.is_empty() {
                app.flow.select_first([PathBuf::from(path)], &mut app.ui);
            }
        }
        InputCallbackId::CompareKey => {
            // 空のキーではリクエストしない。
            let key = value.trim();
            if key.is_empty() {
                app.ui.notify("Please enter a UNIQUE_KEY".into());
            } else {
                app.worker_tx.send(WorkerCmd::Compare(key.to_string())).await?;
                app.ui.status = format!("Comparing {key}...");
            }
        }
        InputCallbackId::ExpectedKeys => {
            // カンマで分割し、空要素は捨てる。
            let keys = value
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            request_validation(app, keys).await?;
        }
    }
    Ok(())
}

/// Workerへ最新アップロードの検証を依頼する。
async fn request_validation(app: &mut App, expected_keys: Vec<String>) -> Result<()> {
    app.worker_tx
        .send(WorkerCmd::ValidateLatest { expected_keys })
        .await?;
    app.ui.status = "Validating latest upload...".into();
    Ok(())
}
