//! Candidate types for the lookup table.
//!
//! This module provides:
//! - `Candidate`: one selectable entry, tagged with its source
//! - `CandidateList`: the paginated lookup session with cursor navigation

use serde::{Deserialize, Serialize};

/// Where a candidate came from. The tag is the only provenance the engine
/// needs later: phonetic picks get a reverse-code hint on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateOrigin {
    /// From the Wubi code dictionary.
    Code,
    /// From the external phonetic (Pinyin) decoder.
    Phonetic,
}

/// A single candidate with display text and origin tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub origin: CandidateOrigin,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T, origin: CandidateOrigin) -> Self {
        Candidate {
            text: text.into(),
            origin,
        }
    }

    pub fn is_phonetic(&self) -> bool {
        self.origin == CandidateOrigin::Phonetic
    }
}

/// A paginated candidate list with a global cursor.
///
/// Insertion order is display order. The cursor indexes the full list; the
/// visible page and the cursor's position within it are derived from it.
/// Every movement operation clamps so that `0 <= cursor < len` holds whenever
/// the list is non-empty.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    items: Vec<Candidate>,
    page_size: usize,
    cursor: usize,
    visible: bool,
}

impl CandidateList {
    /// Create an empty list with the default page size of 5.
    pub fn new() -> Self {
        Self::with_page_size(5)
    }

    /// Create an empty list with the given page size.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            page_size: page_size.max(1),
            cursor: 0,
            visible: false,
        }
    }

    /// Append a candidate at the end of the display order.
    pub fn append(&mut self, candidate: Candidate) {
        self.items.push(candidate);
    }

    /// Drop all candidates and reset the cursor. Idempotent.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// Mark the list visible. The renderer reads this; drawing is its job.
    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Mark the list hidden.
    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Global cursor position (0-based index into the full list).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cursor position within the current page.
    pub fn cursor_in_page(&self) -> usize {
        self.cursor % self.page_size
    }

    /// All candidates, in display order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.items
    }

    /// The candidates on the page the cursor is on.
    pub fn page_candidates(&self) -> &[Candidate] {
        let start = self.cursor - self.cursor_in_page();
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    /// Move the cursor to `pos`, clamped into the list.
    pub fn set_cursor(&mut self, pos: usize) {
        if self.items.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor = pos.min(self.items.len() - 1);
        }
    }

    /// Move the cursor up by one. Returns false (cursor unchanged) at the
    /// top edge; callers log and carry on.
    pub fn cursor_up(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor down by one. Returns false at the bottom edge.
    pub fn cursor_down(&mut self) -> bool {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor one page back, clamped to the first entry.
    /// Returns whether the cursor moved.
    pub fn page_up(&mut self) -> bool {
        let next = self.cursor.saturating_sub(self.page_size);
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    /// Move the cursor one page forward, clamped to the last entry.
    /// Returns whether the cursor moved.
    pub fn page_down(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let next = (self.cursor + self.page_size).min(self.items.len() - 1);
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    /// Resolve a global index from the cursor.
    ///
    /// With `None`, the current cursor. With `Some(n)` - the user pressed
    /// digit key `n` to pick the n-th visible row - the resolved index is
    /// `cursor + (n - cursor_in_page) - 1`, which lands on the n-th row of
    /// the current page no matter where on the page the cursor sits.
    ///
    /// # Example
    /// ```
    /// use audime_core::{Candidate, CandidateList, CandidateOrigin};
    ///
    /// let mut list = CandidateList::with_page_size(5);
    /// for i in 0..12 {
    ///     list.append(Candidate::new(format!("c{i}"), CandidateOrigin::Code));
    /// }
    /// list.set_cursor(7); // page 2, position 2
    /// assert_eq!(list.global_cursor(Some(4)), 8);
    /// ```
    pub fn global_cursor(&self, page_relative: Option<usize>) -> usize {
        match page_relative {
            None => self.cursor,
            Some(n) => {
                let page_start = self.cursor - self.cursor_in_page();
                (page_start + n).saturating_sub(1)
            }
        }
    }

    /// The candidate at a global index.
    ///
    /// Asking for an index the navigation API never handed out is a caller
    /// bug; this indexes directly and panics on out-of-range.
    pub fn candidate(&self, global_index: usize) -> &Candidate {
        &self.items[global_index]
    }
}
