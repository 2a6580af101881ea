//! ショートカット設定の管理。

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// ショートカット設定の全体（`shortcut.toml`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcuts {
    pub main: MainShortcuts,
    pub notice: NoticeShortcuts,
    pub input_box: InputBoxShortcuts,
}

/// メイン画面のショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainShortcuts {
    pub quit: Vec<String>,
    /// ファイルパスの入力を開く。
    pub pick_file: Vec<String>,
    pub submit: Vec<String>,
    /// 選択を解除する。
    pub clear: Vec<String>,
    pub refresh: Vec<String>,
    pub compare: Vec<String>,
    pub validate: Vec<String>,
    /// 期待キーを入力して検証する。
    pub validate_keys: Vec<String>,
    pub down: Vec<String>,
    pub up: Vec<String>,
}

/// 通知ポップアップのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeShortcuts {
    pub dismiss: Vec<String>,
}

/// InputBoxのショートカット。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBoxShortcuts {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub backspace: Vec<String>,
    pub delete: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub home: Vec<String>,
    pub end: Vec<String>,
    pub clear_line: Vec<String>,
}

impl Shortcuts {
    /// TOMLから読み込み、無ければデフォルトを返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            // 既存ファイルを読み込んでパースする。
            let content = std::fs::read_to_string(path)?;
            let shortcuts: Shortcuts = toml::from_str(&content)?;
            Ok(shortcuts)
        } else {
            // 未作成の場合は既定値を利用する。
            Ok(Self::default())
        }
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            main: MainShortcuts {
                quit: vec!["q".into()],
                pick_file: vec!["o".into()],
                submit: vec!["u".into(), "Enter".into()],
                clear: vec!["x".into()],
                refresh: vec!["r".into()],
                compare: vec!["c".into()],
                validate: vec!["v".into()],
                validate_keys: vec!["e".into()],
                down: vec!["Down".into(), "j".into()],
                up: vec!["Up".into(), "k".into()],
            },
            notice: NoticeShortcuts {
                dismiss: vec!["Enter".into(), "Esc".into()],
            },
            input_box: InputBoxShortcuts {
                confirm: vec!["Enter".into()],
                cancel: vec!["Esc".into()],
                backspace: vec!["Backspace".into()],
                delete: vec!["Delete".into()],
                left: vec!["Left".into()],
                right: vec!["Right".into()],
                home: vec!["Home".into()],
                end: vec!["End".into()],
                clear_line: vec!["Ctrl+u".into()],
            },
        }
    }
}

/// キーイベントがいずれかのショートカットに一致するか判定する。
pub fn matches_shortcut(key: &KeyEvent, shortcuts: &[String]) -> bool {
    shortcuts.iter().any(|s| matches_single_shortcut(key, s))
}

/// `"Ctrl+u"` や `"Enter"` のような1件のショートカットと照合する。
fn matches_single_shortcut(key: &KeyEvent, shortcut: &str) -> bool {
    // "+"で修飾キーとキー本体に分ける。
    let parts: Vec<&str> = shortcut.split('+').collect();

    let (modifiers_str, key_str) = if parts.len() > 1 {
        (&parts[0..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    // 期待する修飾キーを組み立てる（未知の修飾キーは不一致）。
    let mut expected_modifiers = KeyModifiers::empty();
    for modifier in modifiers_str {
        match *modifier {
            "Ctrl" | "ctrl" => expected_modifiers |= KeyModifiers::CONTROL,
            "Alt" | "alt" => expected_modifiers |= KeyModifiers::ALT,
            "Shift" | "shift" => expected_modifiers |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    // 修飾キーは完全一致のみ許可する。
    if key.modifiers != expected_modifiers {
        return false;
    }

    // キー本体を照合する。
    match key_str {
        "Enter" | "enter" => key.code == KeyCode::Enter,
        "Esc" | "esc" => key.code == KeyCode::Esc,
        "Tab" | "tab" => key.code == KeyCode::Tab,
        "Backspace" | "backspace" => key.code == KeyCode::Backspace,
        "Delete" | "delete" => key.code == KeyCode::Delete,
        "Up" | "up" => key.code == KeyCode::Up,
        "Down" | "down" => key.code == KeyCode::Down,
        "Left" | "left" => key.code == KeyCode::Left,
        "Right" | "right" => key.code == KeyCode::Right,
        "Home" | "home" => key.code == KeyCode::Home,
        "End" | "end" => key.code == KeyCode::End,
        s if s.len() == 1 => {
            if let Some(c) = s.chars().next() {
                key.code == KeyCode::Char(c)
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn test_single_char_and_special_keys() {
        // 単一文字と特殊キーの一致判定を検証する。
        let sc = Shortcuts::default();
        assert!(matches_shortcut(&key(KeyCode::Char('o')), &sc.main.pick_file));
        assert!(matches_shortcut(&key(KeyCode::Enter), &sc.main.submit));
        assert!(matches_shortcut(&key(KeyCode::Char('u')), &sc.main.submit));
        assert!(!matches_shortcut(&key(KeyCode::Esc), &sc.main.submit));
    }

    #[test]
    fn test_modifier_must_match() {
        // 修飾キー付きの一致判定を検証する。
        let ctrl_u = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        let sc = Shortcuts::default();
        assert!(matches_shortcut(&ctrl_u, &sc.input_box.clear_line));
        // Ctrl+uは送信キーのuとは別扱い。
        assert!(!matches_shortcut(&ctrl_u, &sc.main.submit));
    }

    #[test]
    fn test_multiple_bindings() {
        // 複数割り当ての一致判定を検証する。
        let sc = Shortcuts::default();
        assert!(matches_shortcut(&key(KeyCode::Up), &sc.main.up));
        assert!(matches_shortcut(&key(KeyCode::Char('k')), &sc.main.up));
        assert!(!matches_shortcut(&key(KeyCode::Char('j')), &sc.main.up));
    }

    #[test]
    fn test_unknown_modifier_never_matches() {
        // 未知の修飾キーは一致しないことを検証する。
        let k = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::empty());
        assert!(!matches_shortcut(&k, &[String::from("Hyper+x")]));
    }

    #[test]
    fn test_load_from_toml() {
        // TOMLからの読み込みを検証する。
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcut.toml");
        let mut sc = Shortcuts::default();
        sc.main.compare = vec!["p".into()];
        std::fs::write(&path, toml::to_string_pretty(&sc).unwrap()).unwrap();

        let loaded = Shortcuts::load_or_default(&path).unwrap();
        assert_eq!(loaded.main.compare, vec!["p".to_string()]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        // ファイルが無ければ既定値になることを検証する。
        let dir = tempfile::tempdir().unwrap();
        let loaded = Shortcuts::load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded.main.quit, vec!["q".to_string()]);
    }
}
