//! TUI内での文字列入力（InputBox）、通知ポップアップ、ドロップされたパスの解析。

use std::path::PathBuf;

use ratatui::{
    layout::Alignment,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// InputBox入力状態
#[derive(Clone, Debug)]
pub struct InputBoxState {
    /// プロンプトメッセージ
    pub prompt: String,
    /// 現在の入力値
    pub value: String,
    /// カーソル位置（文字単位）
    pub cursor: usize,
    /// 入力完了時のコールバック識別子
    pub callback_id: InputCallbackId,
}

/// 入力完了時のコールバック識別子
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputCallbackId {
    /// ファイル選択で入力されたパス
    PickFile,
    /// 比較するUNIQUE_KEY
    CompareKey,
    /// 最新アップロードに含まれるべきキー（カンマ区切り）
    ExpectedKeys,
}

impl InputBoxState {
    /// 空の入力欄を作る。
    pub fn new(prompt: impl Into<String>, callback_id: InputCallbackId) -> Self {
        Self {
            prompt: prompt.into(),
            value: String::new(),
            cursor: 0,
            callback_id,
        }
    }

    /// 文字位置からバイト位置へ変換する。
    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// 文字を挿入
    pub fn insert_char(&mut self, c: char) {
        // カーソル位置に挿入してから進める。
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// 貼り付けられた文字列を挿入（改行は空白に置き換える）
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            // 1行入力なので改行は残さない。
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    /// Backspace（カーソル前の文字を削除）
    pub fn backspace(&mut self) {
        // カーソルが先頭なら何もしない。
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            // カーソル位置を左へ移動する。
            self.cursor -= 1;
        }
    }

    /// Delete（カーソル位置の文字を削除）
    pub fn delete(&mut self) {
        // カーソルが末尾なら何もしない。
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    /// カーソルを左に移動
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// カーソルを右に移動
    pub fn move_right(&mut self) {
        // 末尾を超えないようにする。
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    /// カーソルを先頭に移動
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// カーソルを末尾に移動
    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// 行全体をクリア
    pub fn clear_line(&mut self) {
        // 入力値を空にし、カーソルも先頭へ。
        self.value.clear();
        self.cursor = 0;
    }
}

/// バックスラッシュでエスケープされうる文字（空白・引用符・シェルの記号）。
fn is_shell_escapable(c: char) -> bool {
    c.is_whitespace() || "'\"\\()[]{}&;!$`*?#~<>|".contains(c)
}

/// 端末へのドロップ内容をファイルパスへ分解する。
///
/// 端末はドロップされたファイルをシェルの単語として貼り付ける：引用符付き
/// （`'/a b.csv'`）、バックスラッシュエスケープ（`/a\ b.csv`）、`file://` URI。
/// 区切りは空白か改行。エスケープ対象以外の前のバックスラッシュはそのまま残すので、
/// `C:\Users\me\data.csv` のようなWindowsパスも壊れない。
pub fn dropped_paths(text: &str) -> Vec<PathBuf> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            // 引用符の中は閉じ引用符まで素通し。
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => cur.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                // 次がエスケープ対象ならそれを1文字として取り込む。
                match chars.peek() {
                    Some(&next) if is_shell_escapable(next) => {
                        cur.push(next);
                        chars.next();
                    }
                    // それ以外はパス区切りとしてそのまま残す。
                    _ => cur.push('\\'),
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                // 単語の区切りで確定させる。
                if in_word {
                    words.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            (None, c) => {
                cur.push(c);
                in_word = true;
            }
        }
    }
    // 末尾の単語を取りこぼさない。
    if in_word {
        words.push(cur);
    }

    // file:// URIはパーセントデコードしてパスに戻す。
    words
        .into_iter()
        .filter(|w| !w.is_empty())
        .map(|w| match w.strip_prefix("file://") {
            Some(rest) => urlencoding::decode(rest)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| rest.to_string()),
            None => w,
        })
        .map(PathBuf::from)
        .collect()
}

/// InputBoxをポップアップとして描画
pub fn render_input_box(f: &mut Frame, state: &InputBoxState) {
    // 中央に配置されたポップアップ領域を計算する。
    let popup_area = centered_popup(f.area(), 70, 7);

    // 既存の描画を消してポップアップ用の背景にする。
    f.render_widget(Clear, popup_area);

    // ポップアップの外枠とスタイルを描画する。
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Input")
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(block, popup_area);

    // 内部レイアウト（プロンプト + 入力フィールド + ヘルプ）を定義する。
    let inner_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // プロンプト
            Constraint::Length(1), // 入力フィールド
            Constraint::Length(1), // 空行
            Constraint::Length(1), // ヘルプ
        ])
        .split(popup_area);

    // プロンプトメッセージを描画する。
    let prompt_widget = Paragraph::new(state.prompt.clone()).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(prompt_widget, inner_layout[0]);

    // カーソル位置が表示幅を超えた場合のスクロール量を算出する。
    let display_width = inner_layout[1].width as usize;
    let scroll_offset = state.cursor.saturating_sub(display_width.saturating_sub(2));

    // 現在の入力値を可視範囲に切り出す。
    let visible: Vec<char> = state
        .value
        .chars()
        .skip(scroll_offset)
        .take(display_width)
        .collect();

    // カーソル位置を視覚的に表現（|を挿入）する。
    let split = state.cursor.saturating_sub(scroll_offset).min(visible.len());
    let before: String = visible[..split].iter().collect();
    let after: String = visible[split..].iter().collect();

    // 文字列とカーソルを含む入力欄を描画する。
    let input_widget =
        Paragraph::new(format!("{before}|{after}")).style(Style::default().fg(Color::Green));
    f.render_widget(input_widget, inner_layout[1]);

    // ヘルプテキストを描画する。
    let help = Paragraph::new("Enter=confirm | Esc=cancel | Ctrl+U=clear")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, inner_layout[3]);
}

/// 通知をポップアップとして描画（後続がある場合は件数も出す）
pub fn render_notice(f: &mut Frame, message: &str, pending: usize) {
    // 中央に配置して背景を消す。
    let popup_area = centered_popup(f.area(), 60, 7);
    f.render_widget(Clear, popup_area);

    // 後続の通知があればタイトルで知らせる。
    let title = if pending > 0 {
        format!("Notice (+{pending} more)")
    } else {
        "Notice".to_string()
    };

    // 本文と閉じ方を描画する。
    let notice = Paragraph::new(format!("{message}\n\n[Enter] OK"))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().bg(Color::DarkGray)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(notice, popup_area);
}

/// 中央配置のポップアップ領域を計算
fn centered_popup(area: Rect, width_percent: u16, height: u16) -> Rect {
    // 縦方向の余白を作り、中央行を取り出す。
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    // 横方向も中央に寄せてポップアップ領域を返す。
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_plain_path() {
        // 末尾の改行付きの単純なパスを検証する。
        assert_eq!(
            dropped_paths("/home/me/data.csv\n"),
            vec![PathBuf::from("/home/me/data.csv")]
        );
    }

    #[test]
    fn test_dropped_quoted_and_escaped_paths() {
        // 引用符とエスケープされた空白を検証する。
        assert_eq!(
            dropped_paths("'/home/me/My Data.csv' /tmp/b\\ c.csv"),
            vec![
                PathBuf::from("/home/me/My Data.csv"),
                PathBuf::from("/tmp/b c.csv")
            ]
        );
    }

    #[test]
    fn test_dropped_escaped_parens() {
        // シェル記号のエスケープが外れることを検証する。
        assert_eq!(
            dropped_paths(r"/tmp/prices\ \(v2\).csv"),
            vec![PathBuf::from("/tmp/prices (v2).csv")]
        );
    }

    #[test]
    fn test_dropped_windows_path_keeps_separators() {
        // 引用符なしのWindowsパスで区切りが消えないことを検証する。
        assert_eq!(
            dropped_paths(r"C:\Users\me\data.csv"),
            vec![PathBuf::from(r"C:\Users\me\data.csv")]
        );
        assert_eq!(
            dropped_paths(r"C:\Users\me\My\ Data.csv"),
            vec![PathBuf::from(r"C:\Users\me\My Data.csv")]
        );
    }

    #[test]
    fn test_dropped_file_uri() {
        // file:// URIのデコードを検証する。
        assert_eq!(
            dropped_paths("file:///tmp/My%20Data.csv"),
            vec![PathBuf::from("/tmp/My Data.csv")]
        );
    }

    #[test]
    fn test_dropped_nothing() {
        // 空白だけなら何も返さない。
        assert!(dropped_paths("   \n").is_empty());
    }

    #[test]
    fn test_editing_multibyte_value() {
        // マルチバイト文字を含む編集を検証する。
        let mut s = InputBoxState::new("Key:", InputCallbackId::CompareKey);
        s.insert_str("añb");
        s.move_left();
        s.backspace();
        assert_eq!(s.value, "ab");
        assert_eq!(s.cursor, 1);
        s.delete();
        assert_eq!(s.value, "a");
        s.move_end();
        s.insert_char('z');
        assert_eq!(s.value, "az");
    }

    #[test]
    fn test_pasted_newlines_become_spaces() {
        // 貼り付けの改行が空白になることを検証する。
        let mut s = InputBoxState::new("Keys:", InputCallbackId::ExpectedKeys);
        s.insert_str("A\nB");
        assert_eq!(s.value, "A B");
    }
}
