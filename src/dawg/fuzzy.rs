//! Approximate lookup tolerating a single edit.

use smallvec::SmallVec;

use super::reader::{CompactDawg, Cursor};

/// A stored word found by [`CompactDawg::lookup_fuzzy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// The stored word that matched.
    pub text: Vec<u8>,
    /// True if the query itself is stored, i.e. no edit was spent.
    pub exact_match: bool,
}

impl CompactDawg {
    /// Looks up `word`, tolerating one edit when `fuzzy` is set.
    ///
    /// Without `fuzzy` this is [`lookup`](Self::lookup) reported as a
    /// [`FuzzyMatch`].
    pub fn lookup_with(&self, word: impl AsRef<[u8]>, fuzzy: bool) -> Option<FuzzyMatch> {
        let word = word.as_ref();
        if fuzzy {
            self.lookup_fuzzy(word)
        } else {
            self.lookup(word).then(|| FuzzyMatch {
                text: word.to_vec(),
                exact_match: true,
            })
        }
    }

    /// Finds a stored word within one byte insertion, deletion or
    /// substitution of `word`.
    ///
    /// An exact match is preferred. Otherwise candidates are tried by
    /// backtracking from the deepest position the query matches exactly
    /// toward the root. At each position the search tries, in order:
    /// skipping the query byte, taking an edge without consuming the query
    /// byte, and taking an edge with a different label in its place. Edges
    /// are tried in ascending label order and the first complete word wins.
    ///
    /// ```
    /// use dawg_cache::dawg::builder::build_dawg;
    /// use dawg_cache::dawg::CompactDawg;
    ///
    /// let builder = build_dawg(["cart", "cast", "yeniseian"]).unwrap();
    /// let dawg = CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap();
    ///
    /// let found = dawg.lookup_fuzzy("tyeniseian").unwrap();
    /// assert_eq!(found.text, b"yeniseian");
    /// assert!(!found.exact_match);
    ///
    /// assert_eq!(dawg.lookup_fuzzy("cat").unwrap().text, b"cart");
    /// assert!(dawg.lookup_fuzzy("wrongheeeeadedness").is_none());
    /// ```
    pub fn lookup_fuzzy(&self, word: impl AsRef<[u8]>) -> Option<FuzzyMatch> {
        let word = word.as_ref();

        // trail[i] is the position after consuming word[..i] exactly.
        let mut trail: SmallVec<[Cursor; 32]> = SmallVec::new();
        let mut cursor = Cursor::ROOT;
        trail.push(cursor);
        for &label in word {
            match cursor.state.and_then(|state| self.find_edge(state, label)) {
                Some((_, edge)) => {
                    cursor = Cursor::through(edge);
                    trail.push(cursor);
                }
                None => break,
            }
        }

        if trail.len() == word.len() + 1 && cursor.is_final {
            return Some(FuzzyMatch {
                text: word.to_vec(),
                exact_match: true,
            });
        }

        trail
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, &at)| self.one_edit_at(word, i, at))
            .map(|text| FuzzyMatch {
                text,
                exact_match: false,
            })
    }

    /// Tries every single edit at position `i`, where `at` is the position
    /// reached by consuming `word[..i]`.
    fn one_edit_at(&self, word: &[u8], i: usize, at: Cursor) -> Option<Vec<u8>> {
        let completes = |start: Cursor, rest: &[u8]| {
            self.walk(start, rest).is_some_and(|end| end.is_final)
        };
        let spliced = |middle: &[u8], rest: &[u8]| {
            let mut text = Vec::with_capacity(i + middle.len() + rest.len());
            text.extend_from_slice(&word[..i]);
            text.extend_from_slice(middle);
            text.extend_from_slice(rest);
            text
        };
        let current = word.get(i).copied();

        // Extra byte in the query.
        if current.is_some() && completes(at, &word[i + 1..]) {
            return Some(spliced(&[], &word[i + 1..]));
        }

        let state = at.state?;
        let edges = (0..self.edge_count(state)).filter_map(|e| self.edge(state, e));

        // Byte missing from the query.
        for edge in edges.clone() {
            if completes(Cursor::through(edge), &word[i..]) {
                return Some(spliced(&[edge.label], &word[i..]));
            }
        }

        // Wrong byte in the query.
        let current = current?;
        for edge in edges.filter(|edge| edge.label != current) {
            if completes(Cursor::through(edge), &word[i + 1..]) {
                return Some(spliced(&[edge.label], &word[i + 1..]));
            }
        }
        None
    }
}

#[cfg(test)]
#[cfg(feature = "builder")]
mod test {
    use super::super::builder::build_dawg;
    use super::*;

    fn compact(words: &[&str]) -> CompactDawg {
        let builder = build_dawg(words).unwrap();
        CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap()
    }

    fn fuzzy(dawg: &CompactDawg, word: &str) -> Option<(String, bool)> {
        dawg.lookup_fuzzy(word)
            .map(|m| (String::from_utf8(m.text).unwrap(), m.exact_match))
    }

    #[test]
    fn exact_match() {
        let dawg = compact(&["yeniseian"]);
        assert_eq!(fuzzy(&dawg, "yeniseian"), Some(("yeniseian".into(), true)));
    }

    #[test]
    fn extra_byte_in_query() {
        let dawg = compact(&["yeniseian"]);
        for query in ["tyeniseian", "yenisteian", "yeniseiant"] {
            assert_eq!(
                fuzzy(&dawg, query),
                Some(("yeniseian".into(), false)),
                "{query}"
            );
        }
    }

    #[test]
    fn byte_missing_from_query() {
        let dawg = compact(&["yeomaness"]);
        for query in ["eomaness", "yeoaness", "yeomanes"] {
            assert_eq!(
                fuzzy(&dawg, query),
                Some(("yeomaness".into(), false)),
                "{query}"
            );
        }
    }

    #[test]
    fn wrong_byte_in_query() {
        let dawg = compact(&["yeomaness"]);
        for query in ["xeomaness", "yeoXaness", "yeomanesz"] {
            assert_eq!(
                fuzzy(&dawg, query),
                Some(("yeomaness".into(), false)),
                "{query}"
            );
        }
    }

    #[test]
    fn two_edits_fail() {
        let dawg = compact(&["wrongheadedness", "yeniseian"]);
        assert_eq!(fuzzy(&dawg, "wrongheeeeadedness"), None);
        assert_eq!(fuzzy(&dawg, "wrogheadness"), None);
        assert_eq!(fuzzy(&dawg, "yenisei"), None);
        assert_eq!(fuzzy(&dawg, ""), None);
    }

    #[test]
    fn smallest_label_wins() {
        let dawg = compact(&["cart", "cast"]);
        assert_eq!(fuzzy(&dawg, "cat"), Some(("cart".into(), false)));
        assert_eq!(fuzzy(&dawg, "caxt"), Some(("cart".into(), false)));
    }

    #[test]
    fn deepest_position_is_tried_first() {
        let dawg = compact(&["dog", "dogg"]);
        assert_eq!(fuzzy(&dawg, "dogtg"), Some(("dogg".into(), false)));
        assert_eq!(fuzzy(&dawg, "dogs"), Some(("dog".into(), false)));
    }

    #[test]
    fn single_byte_words() {
        let dawg = compact(&["a", "b"]);
        assert_eq!(fuzzy(&dawg, "c"), Some(("a".into(), false)));
        assert_eq!(fuzzy(&dawg, "ab"), Some(("a".into(), false)));
        assert_eq!(fuzzy(&dawg, ""), Some(("a".into(), false)));
    }

    #[test]
    fn non_fuzzy_lookup_with() {
        let dawg = compact(&["cart"]);
        assert_eq!(
            dawg.lookup_with("cart", false),
            Some(FuzzyMatch {
                text: b"cart".to_vec(),
                exact_match: true
            })
        );
        assert_eq!(dawg.lookup_with("cat", false), None);
        assert!(dawg.lookup_with("cat", true).is_some());
    }

    #[test]
    fn long_query_terminates() {
        let dawg = compact(&["cart", "cast"]);
        let long = "c".repeat(100_000);
        assert_eq!(fuzzy(&dawg, &long), None);
    }
}
