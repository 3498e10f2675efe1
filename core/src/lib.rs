//! audime-core
//!
//! Candidate engine for a Wubi/Pinyin input method with a cloud speech
//! session. The crate owns the data structures and state machine that decide
//! what candidates to show, in what order, and what each keystroke means;
//! rendering, key delivery and the speech transport stay on the host side
//! behind narrow traits.
//!
//! Public API:
//! - `CodeDict` - Wubi code table (prefix trie + word→code reverse index)
//! - `Candidate` / `CandidateList` - origin-tagged candidates with paging
//! - `ranker::query` - Wubi/Pinyin candidate merge
//! - `Engine` - per-keystroke composition state machine
//! - `SpeechSession` / `SpeechListener` - speech collaborator seams
//! - `RuntimeOptions` / `ConfigStore` - persisted engine options

pub mod trie;
pub use trie::{CodeDict, TrieNode};

pub mod candidate;
pub use candidate::{Candidate, CandidateList, CandidateOrigin};

pub mod input_buffer;
pub use input_buffer::InputBuffer;

pub mod ranker;
pub use ranker::PhoneticDecoder;

pub mod speech;
pub use speech::{SpeechListener, SpeechSession, SpeechStatus};

pub mod config;
pub use config::{ConfigStore, MemoryStore, RuntimeOptions, TomlStore};

pub mod engine;
pub use engine::{Engine, Host, InputMode, Key, KeyEvent, KeyResult};

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
