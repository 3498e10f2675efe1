//! Per-keystroke composition state machine.
//!
//! `Engine` decides what each key-down means: speech hot-key handling, the
//! English/Chinese mode toggle, lookup-table navigation, candidate selection,
//! or growing the pending input buffer. Rendering goes through the [`Host`]
//! trait; the host forwards every physical keystroke to
//! [`Engine::process_key`] and routes speech results back in via
//! [`SpeechListener`].
//!
//! Everything here runs on the host's key-event thread. The only thread the
//! engine ever spawns is the detached worker that kicks off a speech session,
//! which never touches engine state.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use lru::LruCache;
use tracing::{debug, info, warn};

use crate::candidate::{Candidate, CandidateList};
use crate::config::{
    ConfigStore, RuntimeOptions, KEY_PINYIN, KEY_SPEECH, KEY_SPEECH_AK_ID, KEY_SPEECH_AK_SECRET,
    KEY_WUBI_TABLE,
};
use crate::input_buffer::InputBuffer;
use crate::ranker::{self, PhoneticDecoder};
use crate::speech::{SpeechListener, SpeechSession, SpeechStatus};
use crate::trie::CodeDict;

/// The speech hot-key character, pressed together with Ctrl.
pub const SPEECH_HOTKEY: char = '`';

const QUERY_CACHE_SIZE: usize = 256;

/// A key, already translated by the host from its native key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character (letters, digits, punctuation).
    Char(char),
    Backspace,
    Enter,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
    /// The composition-mode toggle key.
    CapsLock,
    /// Anything the host could not map.
    Other,
}

/// One keystroke as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub release: bool,
}

impl KeyEvent {
    /// A plain key-down.
    pub fn press(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            release: false,
        }
    }

    /// A key-down with Ctrl held.
    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            ctrl: true,
            release: false,
        }
    }

    /// A key-up.
    pub fn release(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            release: true,
        }
    }
}

/// Whether the engine consumed a keystroke. `NotHandled` tells the host to
/// forward the key to the application as usual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    Handled,
    NotHandled,
}

/// Composition mode. Speech status is tracked separately by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys pass through untouched.
    English,
    /// Letters accumulate in the pending buffer and drive candidate lookup.
    Chinese,
}

/// Rendering surface the plugin shell implements.
///
/// The engine never draws; it tells the host what to show. Tests supply a
/// recording fake.
pub trait Host {
    /// Emit final text to the application.
    fn commit_text(&mut self, text: &str);
    fn update_preedit(&mut self, text: &str);
    fn show_preedit(&mut self);
    fn hide_preedit(&mut self);
    fn update_auxiliary(&mut self, text: &str);
    fn show_auxiliary(&mut self);
    fn hide_auxiliary(&mut self);
    fn update_lookup_table(&mut self, table: &CandidateList);
    fn show_lookup_table(&mut self);
    fn hide_lookup_table(&mut self);
}

/// The composition engine.
///
/// Owns the pending input buffer, the lookup table and the runtime options;
/// borrows the dictionary, decoder and speech session as injected
/// collaborators.
pub struct Engine<H: Host> {
    host: H,
    dict: Option<Arc<CodeDict>>,
    decoder: Box<dyn PhoneticDecoder>,
    speech: Arc<dyn SpeechSession>,
    table: CandidateList,
    input: InputBuffer,
    mode: InputMode,
    options: RuntimeOptions,
    store: Box<dyn ConfigStore>,
    cache: LruCache<String, Vec<Candidate>>,
}

impl<H: Host> Engine<H> {
    /// Build an engine. Options are loaded from the store; when no dictionary
    /// is injected and the options name a table, it is loaded from there. A
    /// table that fails to load degrades to phonetic-only candidates.
    pub fn new(
        host: H,
        dict: Option<Arc<CodeDict>>,
        decoder: Box<dyn PhoneticDecoder>,
        speech: Arc<dyn SpeechSession>,
        store: Box<dyn ConfigStore>,
    ) -> Self {
        let options = RuntimeOptions::load(store.as_ref());
        let dict = dict.or_else(|| Self::load_dict(&options.wubi_table));
        Self {
            host,
            dict,
            decoder,
            speech,
            table: CandidateList::new(),
            input: InputBuffer::new(),
            mode: InputMode::English,
            options,
            store,
            cache: LruCache::new(
                NonZeroUsize::new(QUERY_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    fn load_dict(path: &str) -> Option<Arc<CodeDict>> {
        if path.is_empty() {
            return None;
        }
        match CodeDict::from_path(path) {
            Ok(dict) => Some(Arc::new(dict)),
            Err(err) => {
                warn!(error = %err, path, "code table unusable, continuing phonetic-only");
                None
            }
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    pub fn table(&self) -> &CandidateList {
        &self.table
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Process one keystroke. Returns whether the engine consumed it.
    pub fn process_key(&mut self, ev: KeyEvent) -> KeyResult {
        debug!(key = ?ev.key, ctrl = ev.ctrl, release = ev.release, "key event");
        if ev.release {
            return KeyResult::NotHandled;
        }

        if self.options.speech {
            if let Some(result) = self.process_speech(&ev) {
                return result;
            }
        }

        if ev.key == Key::CapsLock {
            return self.toggle_mode();
        }

        match self.mode {
            InputMode::English => {
                self.host.hide_lookup_table();
                self.host.hide_preedit();
                self.host.hide_auxiliary();
                KeyResult::NotHandled
            }
            InputMode::Chinese => self.process_composing(ev),
        }
    }

    /// Speech-mode early exit. `Some` means the keystroke is settled here.
    fn process_speech(&mut self, ev: &KeyEvent) -> Option<KeyResult> {
        let status = self.speech.status();
        if ev.ctrl && ev.key == Key::Char(SPEECH_HOTKEY) {
            if status == SpeechStatus::Waiting {
                // a result is already on its way; ignore the toggle
                return Some(KeyResult::Handled);
            }
            if status == SpeechStatus::Recording {
                info!("speech stop requested");
                self.speech.stop();
            } else {
                info!("speech start requested");
                let session = Arc::clone(&self.speech);
                thread::spawn(move || session.start());
            }
            self.host.hide_lookup_table();
            self.host.show_preedit();
            self.host.show_auxiliary();
            return Some(KeyResult::Handled);
        }
        if status != SpeechStatus::Idle {
            // every other key is swallowed while speech is active; the
            // buffer must not change
            return Some(KeyResult::Handled);
        }
        if ev.ctrl {
            return Some(KeyResult::NotHandled);
        }
        None
    }

    /// CapsLock: flip English/Chinese. Leaving composition with letters
    /// pending commits them verbatim, without candidate lookup.
    fn toggle_mode(&mut self) -> KeyResult {
        match self.mode {
            InputMode::English => {
                self.mode = InputMode::Chinese;
            }
            InputMode::Chinese => {
                if !self.input.is_empty() {
                    let raw = self.input.as_str().to_string();
                    info!(text = %raw, "committing raw buffer on mode switch");
                    self.host.commit_text(&raw);
                }
                self.mode = InputMode::English;
            }
        }
        self.reset_session();
        KeyResult::Handled
    }

    fn process_composing(&mut self, ev: KeyEvent) -> KeyResult {
        match ev.key {
            // Lookup-table navigation only means anything mid-composition;
            // otherwise the keys stay ordinary.
            Key::Char('=') | Key::Right if !self.input.is_empty() => {
                if !self.table.page_down() {
                    debug!("already on last page");
                }
                self.host.update_lookup_table(&self.table);
                KeyResult::Handled
            }
            Key::Char('-') | Key::Left if !self.input.is_empty() => {
                if !self.table.page_up() {
                    debug!("already on first page");
                }
                self.host.update_lookup_table(&self.table);
                KeyResult::Handled
            }
            Key::Down if !self.input.is_empty() => {
                if !self.table.cursor_down() {
                    warn!("cursor already at bottom");
                }
                self.host.update_lookup_table(&self.table);
                KeyResult::Handled
            }
            Key::Up if !self.input.is_empty() => {
                if !self.table.cursor_up() {
                    warn!("cursor already at top");
                }
                self.host.update_lookup_table(&self.table);
                KeyResult::Handled
            }
            // Selection needs something to select; with a shown-but-empty
            // list the keys propagate like any other.
            Key::Space | Key::Enter if !self.input.is_empty() && !self.table.is_empty() => {
                let cursor = self.table.global_cursor(None);
                self.candidate_selected(cursor, false);
                KeyResult::Handled
            }
            Key::Escape if !self.input.is_empty() && !self.table.is_empty() => {
                let cursor = self.table.global_cursor(None);
                self.candidate_selected(cursor, true);
                KeyResult::Handled
            }
            Key::Char(ch @ '0'..='9') if !self.input.is_empty() && !self.table.is_empty() => {
                let n = ch as usize - '0' as usize;
                self.table.set_cursor(self.table.global_cursor(Some(n)));
                self.candidate_selected(self.table.cursor(), false);
                KeyResult::Handled
            }
            Key::Backspace if !self.input.is_empty() => {
                self.input.pop();
                self.wubi_pinyin_query();
                KeyResult::Handled
            }
            Key::Char(ch) if ch.is_ascii_alphabetic() => {
                self.input.push(ch.to_ascii_lowercase());
                self.wubi_pinyin_query();
                KeyResult::Handled
            }
            // Nothing composed and nothing matched: let the key through so
            // plain typing keeps working.
            _ => KeyResult::NotHandled,
        }
    }

    /// Rebuild the lookup table for the current buffer and show it, empty or
    /// not.
    fn wubi_pinyin_query(&mut self) {
        self.table.clear();
        let input = self.input.as_str().to_string();
        self.host.update_auxiliary(&input);
        self.host.show_auxiliary();

        let candidates = if input.is_empty() {
            Vec::new()
        } else {
            match self.cache.get(&input) {
                Some(hit) => hit.clone(),
                None => {
                    let dict = self.dict.as_deref();
                    let decoder: Option<&mut dyn PhoneticDecoder> = if self.options.pinyin {
                        Some(self.decoder.as_mut())
                    } else {
                        None
                    };
                    let fresh = ranker::query(&input, dict, decoder);
                    self.cache.put(input.clone(), fresh.clone());
                    fresh
                }
            }
        };
        debug!(input = %input, count = candidates.len(), "lookup table rebuilt");
        for candidate in candidates {
            self.table.append(candidate);
        }
        self.table.show();
        self.host.update_lookup_table(&self.table);
        self.host.show_lookup_table();
    }

    /// Commit the candidate at `index` (global). With `ignore_text` the
    /// selection only clears state, nothing is emitted.
    pub fn candidate_selected(&mut self, index: usize, ignore_text: bool) {
        let candidate = self.table.candidate(index).clone();

        if candidate.is_phonetic() {
            // show which code would have produced this word
            let code = self
                .dict
                .as_deref()
                .and_then(|d| d.code_of(&candidate.text))
                .map(str::to_string);
            match code {
                Some(code) => {
                    info!(text = %candidate.text, code = %code, "phonetic pick has a code");
                    self.host.update_auxiliary(&format!("五笔[{code}]"));
                    self.host.show_auxiliary();
                }
                None => self.host.hide_auxiliary(),
            }
        } else {
            self.host.hide_auxiliary();
        }

        if !ignore_text {
            self.host.commit_text(&candidate.text);
        }
        self.table.clear();
        self.table.hide();
        self.host.update_lookup_table(&self.table);
        self.host.hide_lookup_table();
        self.host.hide_preedit();
        self.input.clear();
    }

    /// Refresh the recording indicator in the auxiliary area. Driven by a
    /// host-side timer while a session is live.
    pub fn update_speech_indicator(&mut self, recording_secs: u64) {
        let mut msg = String::from("press C-` to toggle record[");
        match self.speech.status() {
            SpeechStatus::Recording => {
                msg.push_str(&format!("recording {recording_secs}"));
            }
            SpeechStatus::Waiting => msg.push_str("waiting"),
            SpeechStatus::Idle => {}
        }
        msg.push(']');
        self.host.update_auxiliary(&msg);
        self.host.show_auxiliary();
    }

    /// Select the active Wubi table. Empty path disables code candidates.
    /// The dictionary is swapped wholesale and the change persisted.
    pub fn set_wubi_table(&mut self, path: &str) {
        self.options.wubi_table = path.to_string();
        self.store.set_string(KEY_WUBI_TABLE, path);
        self.dict = Self::load_dict(path);
        self.cache.clear();
    }

    /// Toggle phonetic candidates; persisted.
    pub fn set_pinyin_enabled(&mut self, enabled: bool) {
        self.options.pinyin = enabled;
        self.store
            .set_string(KEY_PINYIN, if enabled { "true" } else { "false" });
        self.cache.clear();
    }

    /// Toggle the speech hot-key; persisted.
    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.options.speech = enabled;
        self.store
            .set_string(KEY_SPEECH, if enabled { "true" } else { "false" });
    }

    /// Update speech service credentials; persisted.
    pub fn set_speech_credentials(&mut self, ak_id: &str, ak_secret: &str) {
        self.options.speech_ak_id = ak_id.to_string();
        self.options.speech_ak_secret = ak_secret.to_string();
        self.store.set_string(KEY_SPEECH_AK_ID, ak_id);
        self.store.set_string(KEY_SPEECH_AK_SECRET, ak_secret);
    }

    /// Clear buffer, table and every visible surface atomically.
    fn reset_session(&mut self) {
        self.input.clear();
        self.table.clear();
        self.table.hide();
        self.host.update_lookup_table(&self.table);
        self.host.hide_lookup_table();
        self.host.update_preedit("");
        self.host.hide_preedit();
        self.host.hide_auxiliary();
    }
}

impl<H: Host> SpeechListener for Engine<H> {
    fn on_partial_result(&mut self, text: &str) {
        self.host.update_preedit(text);
        self.host.show_preedit();
    }

    fn on_completed(&mut self, text: &str) {
        info!(text = %text, "speech recognition completed");
        self.host.commit_text(text);
        self.reset_session();
    }

    fn on_failed(&mut self) {
        warn!("speech recognition failed, discarding partial input");
        self.reset_session();
    }
}
