//! Interactive demo for the composition engine.
//!
//! Run with an optional Wubi table path:
//!
//! ```text
//! cargo run --example interactive -- /usr/share/ibus-table/data/wubi86.txt
//! ```
//!
//! Commands are whitespace-separated tokens: a bare word is typed letter by
//! letter; `caps`, `bs`, `space`, `enter`, `esc`, `up`, `down`, `left`,
//! `right`, `speech` map to the corresponding keys; `quit` exits.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use audime_core::config::KEY_WUBI_TABLE;
use audime_core::{
    CandidateList, ConfigStore, Engine, Host, Key, KeyEvent, KeyResult, MemoryStore,
    PhoneticDecoder, SpeechSession, SpeechStatus,
};

/// Prints every rendering call.
struct TerminalHost;

impl Host for TerminalHost {
    fn commit_text(&mut self, text: &str) {
        println!("=> {text}");
    }
    fn update_preedit(&mut self, text: &str) {
        if !text.is_empty() {
            println!("preedit: {text}");
        }
    }
    fn show_preedit(&mut self) {}
    fn hide_preedit(&mut self) {}
    fn update_auxiliary(&mut self, text: &str) {
        if !text.is_empty() {
            println!("aux: {text}");
        }
    }
    fn show_auxiliary(&mut self) {}
    fn hide_auxiliary(&mut self) {}
    fn update_lookup_table(&mut self, table: &CandidateList) {
        for (i, candidate) in table.page_candidates().iter().enumerate() {
            let marker = if i == table.cursor_in_page() { ">" } else { " " };
            let tag = if candidate.is_phonetic() { "py" } else { "wb" };
            println!("{marker}{}. {} [{tag}]", i + 1, candidate.text);
        }
    }
    fn show_lookup_table(&mut self) {}
    fn hide_lookup_table(&mut self) {}
}

/// A handful of canned Pinyin entries, enough to see the interleave.
struct StubDecoder {
    current: Vec<&'static str>,
}

impl PhoneticDecoder for StubDecoder {
    fn search(&mut self, input: &str) -> usize {
        self.current = match input {
            "wo" => vec!["窝", "沃"],
            "ni" => vec!["你", "尼"],
            "hao" => vec!["好", "号"],
            _ => Vec::new(),
        };
        self.current.len()
    }

    fn candidate(&self, index: usize) -> Option<Vec<u16>> {
        self.current
            .get(index)
            .map(|word| word.encode_utf16().collect())
    }
}

/// Flips status locally; stands in for the cloud transport.
struct StubSpeech {
    status: Mutex<SpeechStatus>,
}

impl SpeechSession for StubSpeech {
    fn start(&self) {
        *self.status.lock().unwrap() = SpeechStatus::Recording;
    }
    fn stop(&self) {
        *self.status.lock().unwrap() = SpeechStatus::Idle;
    }
    fn status(&self) -> SpeechStatus {
        *self.status.lock().unwrap()
    }
}

fn main() {
    let mut store = MemoryStore::new();
    if let Some(path) = std::env::args().nth(1) {
        store.set_string(KEY_WUBI_TABLE, &path);
    }
    let mut engine = Engine::new(
        TerminalHost,
        None,
        Box::new(StubDecoder { current: Vec::new() }),
        Arc::new(StubSpeech {
            status: Mutex::new(SpeechStatus::Idle),
        }),
        Box::new(store),
    );

    println!("tokens: letters | caps bs space enter esc up down left right speech quit");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        for token in line.split_whitespace() {
            let events: Vec<KeyEvent> = match token {
                "quit" => return,
                "caps" => vec![KeyEvent::press(Key::CapsLock)],
                "bs" => vec![KeyEvent::press(Key::Backspace)],
                "space" => vec![KeyEvent::press(Key::Space)],
                "enter" => vec![KeyEvent::press(Key::Enter)],
                "esc" => vec![KeyEvent::press(Key::Escape)],
                "up" => vec![KeyEvent::press(Key::Up)],
                "down" => vec![KeyEvent::press(Key::Down)],
                "left" => vec![KeyEvent::press(Key::Left)],
                "right" => vec![KeyEvent::press(Key::Right)],
                "speech" => vec![KeyEvent::ctrl(Key::Char('`'))],
                word => word.chars().map(|ch| KeyEvent::press(Key::Char(ch))).collect(),
            };
            for ev in events {
                if engine.process_key(ev) == KeyResult::NotHandled {
                    println!("(passed through: {:?})", ev.key);
                }
            }
        }
    }
}
