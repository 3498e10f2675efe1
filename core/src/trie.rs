//! Prefix trie for the Wubi code table.
//!
//! A code table maps alphabetic key sequences ("codes") to Chinese words with
//! a frequency each. `CodeDict` stores the table in a 26-ary trie so that the
//! engine can answer both "what does this exact code produce" and "what do
//! all codes starting with this prefix produce" (predictive completion), and
//! keeps a word→code reverse index used for display hints.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::utils::normalize;

const ALPHABET: usize = 26;

fn slot(ch: char) -> Option<usize> {
    if ch.is_ascii_lowercase() {
        Some(ch as usize - 'a' as usize)
    } else {
        None
    }
}

/// One trie node: a child slot per letter `a`-`z` and the words produced by
/// the code ending here, keyed by frequency.
///
/// Several words may share a frequency; all of them are retained, in
/// insertion order. The highest frequency is the last key of the map.
#[derive(Debug, Default)]
pub struct TrieNode {
    children: [Option<Box<TrieNode>>; ALPHABET],
    is_end: bool,
    /// When `is_end` is true, the full code leading to this node.
    code: Option<String>,
    values: BTreeMap<u64, Vec<String>>,
}

impl TrieNode {
    /// Whether a complete code ends at this node.
    pub fn is_end(&self) -> bool {
        self.is_end
    }

    /// The code leading here, when this node terminates one.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Words produced by this exact node, keyed by frequency.
    pub fn values(&self) -> &BTreeMap<u64, Vec<String>> {
        &self.values
    }

    /// The single highest-frequency entry of this node, if any.
    pub fn best(&self) -> Option<(u64, &str)> {
        self.values
            .iter()
            .next_back()
            .and_then(|(freq, words)| words.first().map(|w| (*freq, w.as_str())))
    }

    /// Collect every complete-word entry strictly below this node.
    ///
    /// The node's own values are excluded; the caller handles the exact match
    /// separately and must not see it twice.
    pub fn collect_subtree(&self) -> BTreeMap<u64, Vec<String>> {
        let mut out = BTreeMap::new();
        for child in self.children.iter().flatten() {
            child.gather(&mut out);
        }
        out
    }

    fn gather(&self, out: &mut BTreeMap<u64, Vec<String>>) {
        for (freq, words) in &self.values {
            out.entry(*freq).or_default().extend(words.iter().cloned());
        }
        for child in self.children.iter().flatten() {
            child.gather(out);
        }
    }
}

/// The Wubi code dictionary: a prefix trie plus a word→code reverse index.
///
/// Built once from a table file (or in memory via [`CodeDict::insert`]) and
/// treated as immutable afterwards; changing tables swaps the whole value.
///
/// # Example
/// ```
/// use audime_core::CodeDict;
///
/// let mut dict = CodeDict::new();
/// dict.insert("wo", "我", 100);
/// dict.insert("wovy", "俄", 60);
///
/// let node = dict.search("wo").unwrap();
/// assert!(node.is_end());
/// assert_eq!(node.best(), Some((100, "我")));
/// assert_eq!(dict.code_of("俄"), Some("wovy"));
/// ```
#[derive(Debug, Default)]
pub struct CodeDict {
    root: TrieNode,
    reverse: AHashMap<String, String>,
    len: usize,
}

impl CodeDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dictionary from a table file.
    ///
    /// The file is UTF-8 text. A line exactly `BEGIN_TABLE` starts the data
    /// section and a line exactly `END_TABLE` ends it; lines outside the
    /// markers are ignored. Each data line is `<code> <word>\t<frequency>`.
    /// A frequency that does not parse is a fatal error: the table must not
    /// load partially.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open code table {}", path.display()))?;
        let dict = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), entries = dict.len(), "code table loaded");
        Ok(dict)
    }

    /// Load a dictionary from any buffered reader (see [`CodeDict::from_path`]).
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut dict = Self::new();
        let mut in_table = false;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("read code table line {}", idx + 1))?;
            let line = line.trim_end();
            match line {
                "BEGIN_TABLE" => {
                    in_table = true;
                    continue;
                }
                "END_TABLE" => {
                    in_table = false;
                    continue;
                }
                _ => {}
            }
            if !in_table || line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (code, word, freq) = match (fields.next(), fields.next(), fields.next()) {
                (Some(code), Some(word), Some(freq)) => (code, word, freq),
                _ => bail!("malformed table line {}: {:?}", idx + 1, line),
            };
            let freq: u64 = freq
                .parse()
                .with_context(|| format!("bad frequency on table line {}: {:?}", idx + 1, freq))?;

            if code.chars().any(|ch| slot(ch).is_none()) {
                // Table files ship punctuation codes the engine never queries.
                debug!(code, word, "skipping non-alphabetic code");
                continue;
            }
            dict.insert(code, &normalize(word), freq);
        }
        Ok(dict)
    }

    /// Insert one `(code, word, frequency)` entry.
    ///
    /// Re-inserting the same triple has no effect. Words sharing a frequency
    /// at the same node are all kept, in insertion order.
    pub fn insert(&mut self, code: &str, word: &str, freq: u64) {
        let mut node = &mut self.root;
        for ch in code.chars() {
            let Some(i) = slot(ch) else { return };
            node = node.children[i].get_or_insert_with(Box::default);
        }
        node.is_end = true;
        if node.code.is_none() {
            node.code = Some(code.to_string());
        }
        let words = node.values.entry(freq).or_default();
        if !words.iter().any(|w| w == word) {
            words.push(word.to_string());
            self.len += 1;
        }
        self.reverse.insert(word.to_string(), code.to_string());
    }

    /// Walk the trie along `code`. Returns the reached node, or `None` when
    /// some letter has no child. Absence is not an error.
    pub fn search(&self, code: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in code.chars() {
            node = node.children[slot(ch)?].as_deref()?;
        }
        Some(node)
    }

    /// Reverse lookup: the code that produces `word`, if the table has one.
    /// Used only for display hints, never for ranking.
    pub fn code_of(&self, word: &str) -> Option<&str> {
        self.reverse.get(word).map(String::as_str)
    }

    /// Number of `(code, word)` entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the dictionary holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
