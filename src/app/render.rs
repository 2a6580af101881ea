//! TUI描画関連の関数。

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
    flow::FlowState,
    input, layout,
    models::UploadStatus,
    panels::{self, ALL_KEYS_FOUND, CHANGED, NO_COMPARISON, UNCHANGED},
    shortcuts::Shortcuts,
};

use super::App;

/// 画面全体を描画する（ポップアップは最後に重ねる）。
pub fn draw(f: &mut Frame, app: &App) {
    // メインレイアウト（UPLOAD + Body + HELP + STATUS）を作る。
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    // アップロード欄と一覧を描画する。
    f.render_widget(build_upload_bar(app), main_layout.upload_bar);
    draw_uploads_table(f, app, body_layout.uploads_table);

    // 比較パネル（未実行なら操作案内）を描画する。
    let comparison = match &app.ui.comparison {
        Some(panel) => styled_lines(panels::comparison_lines(panel)),
        None => vec![Line::from(format!(
            "Press {} to compare a UNIQUE_KEY",
            format_keys(&app.shortcuts.main.compare)
        ))],
    };
    let comparison = Paragraph::new(comparison)
        .block(Block::default().borders(Borders::ALL).title("COMPARISON"))
        .wrap(Wrap { trim: false });
    f.render_widget(comparison, body_layout.comparison_panel);

    // 検証パネル（未実行なら操作案内）を描画する。
    let validation = match &app.ui.validation {
        Some(panel) => styled_lines(panels::validation_lines(panel)),
        None => vec![Line::from(format!(
            "Press {} to validate the latest upload",
            format_keys(&app.shortcuts.main.validate)
        ))],
    };
    let validation = Paragraph::new(validation)
        .block(Block::default().borders(Borders::ALL).title("VALIDATION"))
        .wrap(Wrap { trim: false });
    f.render_widget(validation, body_layout.validation_panel);

    // ヘルプバーを描画する。
    let help_bar = Paragraph::new(get_help_text(&app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    // ステータスバーを描画する。
    let status_bar = Paragraph::new(app.ui.status.clone())
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });
    f.render_widget(status_bar, main_layout.status_bar);

    // 入力ボックスが開いていれば重ねて描画する。
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
    // 通知は一番手前に出す。
    if let Some(notice) = app.ui.notice() {
        input::render_notice(f, notice, app.ui.pending_notices());
    }
}

/// ドロップ案内、選択ファイル名、送信ボタンを組み立てる。
fn build_upload_bar(app: &App) -> Paragraph<'static> {
    // 送信中は対象ファイルを、それ以外は操作案内を出す。
    let hint = match app.flow.state() {
        FlowState::Submitting(sel) => format!("Sending {} ...", sel.path.display()),
        _ => format!(
            "Drop a CSV file onto this window or press {} to choose one",
            format_keys(&app.shortcuts.main.pick_file)
        ),
    };
    let mut lines = vec![Line::from(hint).style(Style::default().fg(Color::Gray))];

    // 選択中ならファイル名とフルパスを並べる。
    match (&app.ui.selected_file, app.flow.selection()) {
        (Some(name), Some(sel)) => lines.push(Line::from(vec![
            Span::styled(name.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("  {}", sel.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
        ])),
        (Some(name), None) => {
            lines.push(Line::from(name.clone()).style(Style::default().fg(Color::Cyan)))
        }
        (None, _) => lines.push(Line::from("")),
    }

    // 送信ボタンは押せる時だけ強調する。
    let button_style = if app.ui.submit_enabled {
        Style::default()
            .bg(Color::Green)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    lines.push(Line::from(vec![
        Span::styled(format!("[ {} ]", app.ui.submit_label), button_style),
        Span::raw(format!(" ({})", format_keys(&app.shortcuts.main.submit))),
    ]));

    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("UPLOAD"))
}

/// アップロード一覧を描画する。
fn draw_uploads_table(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("UPLOADS");

    // 行が無い時は状況に応じた文言だけを出す。
    if app.ui.uploads.is_empty() {
        let text = match (&app.ui.uploads_error, app.ui.uploads_loaded) {
            (Some(e), _) => format!("Could not load uploads: {e}"),
            (None, true) => panels::NO_UPLOADS.to_string(),
            (None, false) => "Loading...".to_string(),
        };
        f.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    // アップロード一覧からテーブル行を組み立てる。
    let rows = app.ui.uploads.iter().map(|u| {
        let [date, file, status, rows, error] = panels::upload_row(u);
        Row::new(vec![
            Cell::from(date),
            Cell::from(file),
            Cell::from(status).style(status_style(&u.status)),
            Cell::from(rows),
            Cell::from(error).style(Style::default().fg(Color::Red)),
        ])
    });

    // 一覧テーブルのウィジェットを構築する。
    let table = Table::new(
        rows,
        [
            Constraint::Length(19),
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Min(10),
        ],
    )
    .block(block)
    .header(Row::new(vec!["Date", "File", "Status", "Rows", "Error"]).bold())
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(255, 140, 0)) // オレンジ色の背景
            .fg(Color::Black) // 黒文字
            .add_modifier(Modifier::BOLD),
    );

    // 選択中の行をハイライトする。
    let mut table_state = TableState::default();
    table_state.select(Some(app.ui.selected_row));
    f.render_stateful_widget(table, area, &mut table_state);
}

/// 状態ごとの文字色。
fn status_style(s: &UploadStatus) -> Style {
    match s {
        UploadStatus::Pending => Style::default().fg(Color::Yellow),
        UploadStatus::Processing => Style::default().fg(Color::Cyan),
        UploadStatus::Completed => Style::default().fg(Color::Green),
        UploadStatus::Failed => Style::default().fg(Color::Red),
        UploadStatus::Other(_) => Style::default(),
    }
}

/// パネル内の判定行に色を付ける。
fn styled_lines(lines: Vec<String>) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .map(|l| {
            let style = if l == CHANGED || l == ALL_KEYS_FOUND {
                Style::default().fg(Color::Green)
            } else if l == UNCHANGED {
                Style::default().fg(Color::Yellow)
            } else if l == NO_COMPARISON || l.starts_with("Missing Keys") {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Line::from(l).style(style)
        })
        .collect()
}

/// ヘルプ文言を組み立てる。
fn get_help_text(shortcuts: &Shortcuts) -> String {
    let m = &shortcuts.main;
    format!(
        "{}: quit | {}: choose file | {}: upload | {}: clear | {}: refresh | {}: compare | {}: validate | {}: validate keys",
        format_keys(&m.quit),
        format_keys(&m.pick_file),
        format_keys(&m.submit),
        format_keys(&m.clear),
        format_keys(&m.refresh),
        format_keys(&m.compare),
        format_keys(&m.validate),
        format_keys(&m.validate_keys),
    )
}

/// 割り当てキーを表示用に連結する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
