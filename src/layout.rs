//! レイアウト計算のヘルパー関数

use ratatui::prelude::*;

/// メイン画面の4つの領域
pub struct MainLayout {
    /// ドロップ案内・選択ファイル名・送信ボタンの領域
    pub upload_bar: Rect,
    /// アップロード一覧 + パネルの領域
    pub body: Rect,
    /// HELPバーの領域
    pub help_bar: Rect,
    /// STATUSバーの領域
    pub status_bar: Rect,
}

/// ボディ部の3つの領域（左に一覧、右に比較と検証）
pub struct BodyLayout {
    /// アップロード一覧の領域
    pub uploads_table: Rect,
    /// COMPARISONパネルの領域
    pub comparison_panel: Rect,
    /// VALIDATIONパネルの領域
    pub validation_panel: Rect,
}

/// メイン画面を4つの領域に分割（UPLOAD + Body + HELP + STATUS）
pub fn create_main_layout(area: Rect) -> MainLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // UPLOAD欄
            Constraint::Min(1),    // Body（一覧 + パネル）
            Constraint::Length(3), // HELPバー
            Constraint::Length(3), // STATUSバー
        ])
        .split(area);

    MainLayout {
        upload_bar: chunks[0],
        body: chunks[1],
        help_bar: chunks[2],
        status_bar: chunks[3],
    }
}

/// ボディ部を分割（一覧60%、右側40%を上下に2分割）
pub fn create_body_layout(area: Rect) -> BodyLayout {
    // 左右に分ける。
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    // 右側を比較と検証に分ける。
    let panels = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(columns[1]);

    BodyLayout {
        uploads_table: columns[0],
        comparison_panel: panels[0],
        validation_panel: panels[1],
    }
}
