//! Candidate merge across the code dictionary and the phonetic decoder.
//!
//! The code side contributes the exact match for the pending input plus every
//! word the input is a proper prefix of (predictive completion), ordered by
//! frequency. The phonetic side contributes its own internally-ranked
//! candidates. The two streams are interleaved one-for-one rather than merged
//! by a global score, so neither source can crowd the other out of the
//! visible page.

use std::collections::BTreeMap;

use crate::candidate::{Candidate, CandidateOrigin};
use crate::trie::CodeDict;

/// The external phonetic (Pinyin) decoder.
///
/// `search` primes the decoder for an input and returns how many candidates
/// it holds; `candidate` hands back the i-th as UTF-16 code units, which the
/// core transcodes at emission time.
pub trait PhoneticDecoder {
    fn search(&mut self, input: &str) -> usize;
    fn candidate(&self, index: usize) -> Option<Vec<u16>>;
}

/// Produce the merged, display-ordered candidate list for `input`.
///
/// Either source may be absent (dictionary not loaded, phonetic disabled);
/// the other then fills the list alone with no gaps. An empty input yields an
/// empty list without touching either source.
pub fn query(
    input: &str,
    dict: Option<&CodeDict>,
    mut decoder: Option<&mut dyn PhoneticDecoder>,
) -> Vec<Candidate> {
    if input.is_empty() {
        return Vec::new();
    }

    let phonetic_count = match decoder.as_mut() {
        Some(d) => d.search(input),
        None => 0,
    };

    // Code side: best exact entry first, then the rest of the exact node
    // folded together with the whole proper-prefix subtree, by frequency.
    let mut best: Option<String> = None;
    let mut merged: BTreeMap<u64, Vec<String>> = BTreeMap::new();
    if let Some(node) = dict.and_then(|d| d.search(input)) {
        if node.is_end() {
            if let Some((best_freq, best_word)) = node.best() {
                best = Some(best_word.to_string());
                for (freq, words) in node.values() {
                    let skip = usize::from(*freq == best_freq);
                    for word in words.iter().skip(skip) {
                        merged.entry(*freq).or_default().push(word.clone());
                    }
                }
            }
        }
        for (freq, words) in node.collect_subtree() {
            merged.entry(freq).or_default().extend(words);
        }
    }

    let mut code_words = best
        .iter()
        .chain(merged.iter().rev().flat_map(|(_, words)| words.iter()));

    // One-for-one interleave, code side first; phonetic entries are fetched
    // and transcoded only when emitted.
    let mut out = Vec::new();
    let mut j = 0;
    loop {
        let next_code = code_words.next();
        if next_code.is_none() && j >= phonetic_count {
            break;
        }
        if let Some(word) = next_code {
            out.push(Candidate::new(word.clone(), CandidateOrigin::Code));
        }
        if j < phonetic_count {
            if let Some(units) = decoder.as_deref().and_then(|d| d.candidate(j)) {
                out.push(Candidate::new(
                    String::from_utf16_lossy(&units),
                    CandidateOrigin::Phonetic,
                ));
            }
            j += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Canned decoder: a fixed candidate list per input.
    struct FakeDecoder {
        entries: Vec<(&'static str, Vec<&'static str>)>,
        current: Vec<&'static str>,
    }

    impl FakeDecoder {
        fn new(entries: Vec<(&'static str, Vec<&'static str>)>) -> Self {
            Self {
                entries,
                current: Vec::new(),
            }
        }
    }

    impl PhoneticDecoder for FakeDecoder {
        fn search(&mut self, input: &str) -> usize {
            self.current = self
                .entries
                .iter()
                .find(|(key, _)| *key == input)
                .map(|(_, words)| words.clone())
                .unwrap_or_default();
            self.current.len()
        }

        fn candidate(&self, index: usize) -> Option<Vec<u16>> {
            self.current
                .get(index)
                .map(|word| word.encode_utf16().collect())
        }
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn best_exact_first_then_alternating() {
        let mut dict = CodeDict::new();
        dict.insert("wo", "我", 100);
        dict.insert("wo", "握", 50);
        let mut decoder = FakeDecoder::new(vec![("wo", vec!["窝", "沃"])]);

        let result = query("wo", Some(&dict), Some(&mut decoder));
        assert_eq!(texts(&result), vec!["我", "窝", "握", "沃"]);
        assert_eq!(result[0].origin, CandidateOrigin::Code);
        assert_eq!(result[1].origin, CandidateOrigin::Phonetic);
        assert_eq!(result[2].origin, CandidateOrigin::Code);
        assert_eq!(result[3].origin, CandidateOrigin::Phonetic);
    }

    #[test]
    fn interleave_has_no_holes_when_one_side_runs_dry() {
        let mut dict = CodeDict::new();
        dict.insert("ab", "阿", 9);
        let mut decoder = FakeDecoder::new(vec![("ab", vec!["一", "二", "三"])]);

        let result = query("ab", Some(&dict), Some(&mut decoder));
        assert_eq!(texts(&result), vec!["阿", "一", "二", "三"]);
    }

    #[test]
    fn total_is_n_plus_m() {
        let mut dict = CodeDict::new();
        dict.insert("go", "工", 30);
        dict.insert("gox", "攻", 20);
        dict.insert("goy", "功", 10);
        let mut decoder = FakeDecoder::new(vec![("go", vec!["狗", "够"])]);

        let result = query("go", Some(&dict), Some(&mut decoder));
        assert_eq!(result.len(), 5);
        // alternates code-first while both sides have entries
        assert_eq!(result[0].origin, CandidateOrigin::Code);
        assert_eq!(result[1].origin, CandidateOrigin::Phonetic);
        assert_eq!(result[2].origin, CandidateOrigin::Code);
        assert_eq!(result[3].origin, CandidateOrigin::Phonetic);
        assert_eq!(result[4].origin, CandidateOrigin::Code);
    }

    #[test]
    fn proper_prefix_completions_rank_by_frequency() {
        let mut dict = CodeDict::new();
        dict.insert("wov", "俄", 60);
        dict.insert("wovy", "鹅", 80);

        let result = query("wo", Some(&dict), None);
        // "wo" itself is not a complete code; descendants come highest first
        assert_eq!(texts(&result), vec!["鹅", "俄"]);
        assert!(result.iter().all(|c| c.origin == CandidateOrigin::Code));
    }

    #[test]
    fn empty_input_is_empty_and_queries_nothing() {
        let mut dict = CodeDict::new();
        dict.insert("a", "啊", 1);
        struct Panicking;
        impl PhoneticDecoder for Panicking {
            fn search(&mut self, _input: &str) -> usize {
                panic!("search must not run for empty input");
            }
            fn candidate(&self, _index: usize) -> Option<Vec<u16>> {
                None
            }
        }
        let mut decoder = Panicking;
        assert!(query("", Some(&dict), Some(&mut decoder)).is_empty());
    }

    #[test]
    fn disabled_dictionary_leaves_phonetic_alone() {
        let mut decoder = FakeDecoder::new(vec![("ni", vec!["你", "尼"])]);
        let result = query("ni", None, Some(&mut decoder));
        assert_eq!(texts(&result), vec!["你", "尼"]);
        assert!(result.iter().all(|c| c.is_phonetic()));
    }

    #[test]
    fn disabled_decoder_leaves_code_alone() {
        let mut dict = CodeDict::new();
        dict.insert("wo", "我", 100);
        dict.insert("wo", "握", 50);
        let result = query("wo", Some(&dict), None);
        assert_eq!(texts(&result), vec!["我", "握"]);
    }

    #[test]
    fn equal_frequency_entries_keep_insertion_order() {
        let mut dict = CodeDict::new();
        dict.insert("aa", "式", 7);
        dict.insert("aa", "戒", 7);
        let result = query("aa", Some(&dict), None);
        assert_eq!(texts(&result), vec!["式", "戒"]);
    }
}
