use std::hash::BuildHasher;
use std::io::BufRead;

use bytes::Bytes;
use hashbrown::{DefaultHashBuilder, HashTable};
use mark_last::MarkLastIterator;
use smallvec::SmallVec;
use tracing::{debug, info};

use super::encoder::encode;
use super::error::{BuildError, Result};
use super::state::{Edge, State, StateId};

/// Types that can be inserted as a word.
///
/// Implemented for common string and byte sequence types so that
/// [`Builder::insert`] and [`build_dawg`] accept them directly. Strings are
/// inserted as their UTF-8 bytes.
pub trait IntoWord {
    /// Collects this word into a byte buffer.
    fn collect_word(self) -> SmallVec<[u8; 32]>;
}

impl IntoWord for &str {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for &&str {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for String {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for &String {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self.as_bytes())
    }
}

impl IntoWord for &[u8] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

impl IntoWord for Vec<u8> {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_vec(self)
    }
}

impl IntoWord for &Vec<u8> {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

impl<const N: usize> IntoWord for [u8; N] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(&self)
    }
}

impl<const N: usize> IntoWord for &[u8; N] {
    fn collect_word(self) -> SmallVec<[u8; 32]> {
        SmallVec::from_slice(self)
    }
}

/// One step of the path spelling the most recently inserted word.
///
/// `state` is not yet canonical; the edge leading into it (labeled `label`)
/// is only added to the parent once `state` has been canonicalized.
struct BuildState {
    label: u8,
    is_final: bool,
    state: State,
}

/// Incremental builder of a minimal DAWG.
///
/// Words must be inserted in strictly increasing byte order. Only the path
/// of the last inserted word is kept uncommitted; every state off that path
/// is already canonical, so working memory beyond the automaton itself is
/// bounded by the length of the longest word.
///
/// Canonical states live in an arena and are referenced by [`StateId`]. The
/// register maps each canonical state's structure to its id, so an
/// equivalent state met later is replaced instead of stored twice.
///
/// # Examples
///
/// ```
/// use dawg_cache::dawg::builder::Builder;
/// use dawg_cache::dawg::CompactDawg;
///
/// let mut builder = Builder::new();
/// for word in ["test", "testable", "testament", "testing"] {
///     builder.insert(word).unwrap();
/// }
/// builder.finish().unwrap();
///
/// let dawg = CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap();
/// assert!(dawg.lookup("testament"));
/// assert!(!dawg.lookup("testa"));
/// assert!(dawg.lookup_prefix("testa"));
/// ```
pub struct Builder {
    states: Vec<State>,
    register: HashTable<StateId>,
    hasher: DefaultHashBuilder,
    build_state: Vec<BuildState>,
    word_count: usize,
    finished: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Builder {
            states: Vec::new(),
            register: HashTable::new(),
            hasher: DefaultHashBuilder::default(),
            build_state: vec![BuildState {
                label: 0,
                is_final: false,
                state: State::new(),
            }],
            word_count: 0,
            finished: false,
        }
    }

    /// Adds a word to the DAWG being constructed.
    ///
    /// # Errors
    ///
    /// * [`BuildError::EmptyInput`] if the word is empty.
    /// * [`BuildError::Order`] if the word is not strictly greater than the
    ///   previously inserted word.
    /// * [`BuildError::TooManyEdges`] if the word would give one state a
    ///   256th edge.
    /// * [`BuildError::AlreadyFinished`] after [`finish`](Builder::finish).
    ///
    /// A failed insert leaves the builder unchanged.
    pub fn insert(&mut self, word: impl IntoWord) -> std::result::Result<(), BuildError> {
        if self.finished {
            return Err(BuildError::AlreadyFinished);
        }
        let word = word.collect_word();
        if word.is_empty() {
            return Err(BuildError::EmptyInput);
        }
        self.insert_slice(&word)
    }

    fn insert_slice(&mut self, word: &[u8]) -> std::result::Result<(), BuildError> {
        let prefix_length = self.prefix_length(word)?;
        self.check_fan_out(word, prefix_length)?;
        self.canonicalize_suffix(prefix_length);
        self.build_state.extend(
            word[prefix_length..]
                .iter()
                .copied()
                .mark_last()
                .map(|(last, label)| BuildState {
                    label,
                    is_final: last,
                    state: State::new(),
                }),
        );
        self.word_count += 1;
        Ok(())
    }

    /// Length of the prefix `word` shares with the previous word, or an
    /// error if `word` does not sort after it.
    fn prefix_length(&self, word: &[u8]) -> std::result::Result<usize, BuildError> {
        let mut prefix_len = 0;
        for (i, &label) in word.iter().enumerate() {
            let is_last = i == word.len() - 1;
            if let Some(prev_state) = self.build_state.get(prefix_len + 1) {
                if label > prev_state.label {
                    break;
                }
                if label < prev_state.label || is_last {
                    return Err(BuildError::Order {
                        previous: self.previous_word(),
                        word: word.to_vec(),
                    });
                }
                prefix_len += 1;
            } else {
                break;
            }
        }
        Ok(prefix_len)
    }

    /// The state at depth `prefix_length` gains one edge for `word`. Once
    /// the pending child below it is committed it must still have room.
    fn check_fan_out(&self, word: &[u8], prefix_length: usize) -> std::result::Result<(), BuildError> {
        let parent = &self.build_state[prefix_length];
        let pending_child = usize::from(self.build_state.len() > prefix_length + 1);
        if parent.state.edge_count() + pending_child >= usize::from(u8::MAX) {
            return Err(BuildError::TooManyEdges {
                prefix: word[..prefix_length].to_vec(),
            });
        }
        Ok(())
    }

    fn previous_word(&self) -> Vec<u8> {
        self.build_state[1..].iter().map(|s| s.label).collect()
    }

    /// Canonicalizes the pending states deeper than `target_length`, from
    /// the deepest up, attaching each to its parent.
    fn canonicalize_suffix(&mut self, target_length: usize) {
        while self.build_state.len() > target_length + 1 {
            let Some(BuildState {
                label,
                is_final,
                state,
            }) = self.build_state.pop()
            else {
                break;
            };
            let target = self.canonicalize(state);
            if let Some(parent) = self.build_state.last_mut() {
                parent.state.push(Edge {
                    label,
                    target,
                    is_final,
                });
            }
        }
    }

    /// Returns the id of the registered state equal to `state`, registering
    /// `state` if there is none.
    fn canonicalize(&mut self, state: State) -> StateId {
        debug_assert!(
            state.edges().iter().all(|e| e.target.index() < self.states.len()),
            "Cannot canonicalize unless all children are canonical"
        );

        let hash = self.hasher.hash_one(&state);
        let states = &self.states;
        if let Some(&id) = self.register.find(hash, |&id| states[id.index()] == state) {
            return id;
        }

        let id = StateId::new(self.states.len());
        self.states.push(state);
        let Builder {
            states,
            register,
            hasher,
            ..
        } = self;
        register.insert_unique(hash, id, |&id| hasher.hash_one(&states[id.index()]));
        id
    }

    /// Minimizes the path of the last word and closes the builder.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::AlreadyFinished`] when called a second time.
    pub fn finish(&mut self) -> std::result::Result<(), BuildError> {
        if self.finished {
            return Err(BuildError::AlreadyFinished);
        }
        self.canonicalize_suffix(0);
        self.finished = true;
        debug!(
            words = self.word_count,
            states = self.node_count(),
            edges = self.edge_count(),
            "dawg minimized"
        );
        Ok(())
    }

    /// True once [`finish`](Builder::finish) has succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of words inserted so far.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Number of canonical states, the root included.
    ///
    /// Only meaningful after [`finish`](Builder::finish).
    pub fn node_count(&self) -> usize {
        self.states.len() + 1
    }

    /// Number of edges between canonical states.
    ///
    /// Only meaningful after [`finish`](Builder::finish).
    pub fn edge_count(&self) -> usize {
        self.states.iter().map(State::edge_count).sum::<usize>() + self.root().edge_count()
    }

    /// Returns true if `word` has been inserted.
    pub fn lookup(&self, word: impl AsRef<[u8]>) -> bool {
        let word = word.as_ref();
        !word.is_empty() && self.walk(word) == Some(true)
    }

    /// Returns true if some inserted word starts with `prefix`.
    pub fn lookup_prefix(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.walk(prefix.as_ref()).is_some()
    }

    /// Follows `word` from the root, first along the uncommitted path and
    /// then through canonical states. Returns the final flag of the last
    /// edge taken.
    fn walk(&self, word: &[u8]) -> Option<bool> {
        enum Cursor<'a> {
            Pending(usize),
            Committed(&'a State),
        }

        let mut cursor = Cursor::Pending(0);
        let mut is_final = false;
        for &label in word {
            let edge = match cursor {
                Cursor::Pending(depth) => match self.build_state.get(depth + 1) {
                    Some(next) if next.label == label => {
                        cursor = Cursor::Pending(depth + 1);
                        is_final = next.is_final;
                        continue;
                    }
                    _ => self.build_state[depth].state.get(label)?,
                },
                Cursor::Committed(state) => state.get(label)?,
            };
            cursor = Cursor::Committed(&self.states[edge.target.index()]);
            is_final = edge.is_final;
        }
        Some(is_final)
    }

    /// Serializes the finished automaton into a compact buffer.
    ///
    /// With `preserve_counts` the buffer also records how many words lie
    /// below each state, enabling the rank queries of
    /// [`CompactDawg`](super::CompactDawg). Each call produces an
    /// independent buffer.
    ///
    /// # Errors
    ///
    /// * [`BuildError::NotFinished`] before [`finish`](Builder::finish).
    /// * [`BuildError::TooLarge`] if offsets do not fit in 31 bits.
    pub fn to_compact_buffer(&self, preserve_counts: bool) -> std::result::Result<Bytes, BuildError> {
        if !self.finished {
            return Err(BuildError::NotFinished);
        }
        encode(self.root(), &self.states, preserve_counts)
    }

    fn root(&self) -> &State {
        &self.build_state[0].state
    }
}

/// Builds a DAWG from an iterator of words and returns the finished builder.
///
/// Words **must** be provided in strictly increasing byte order, or this
/// function will return an error.
///
/// # Examples
///
/// ```
/// use dawg_cache::dawg::builder::build_dawg;
///
/// let builder = build_dawg(["APPLE", "BANANA", "CHERRY"]).unwrap();
/// assert!(builder.lookup("BANANA"));
/// assert!(!builder.lookup("APRICOT"));
/// ```
pub fn build_dawg<W: IntoWord>(
    words: impl IntoIterator<Item = W>,
) -> std::result::Result<Builder, BuildError> {
    let mut builder = Builder::new();
    for word in words {
        builder.insert(word)?;
    }
    builder.finish()?;
    Ok(builder)
}

/// Builds a DAWG from newline-delimited, pre-sorted words.
///
/// Line terminators (`\n` or `\r\n`) are stripped and empty lines skipped;
/// every other byte is part of the word. Returns the finished builder.
///
/// # Examples
///
/// ```
/// use dawg_cache::dawg::builder::build_from_reader;
///
/// let builder = build_from_reader(&b"bake\ncake\n\nfake\n"[..]).unwrap();
/// assert_eq!(builder.word_count(), 3);
/// assert!(builder.lookup("cake"));
/// ```
pub fn build_from_reader<R: BufRead>(mut reader: R) -> Result<Builder> {
    let mut builder = Builder::new();

    // Reuse one buffer for every line instead of allocating per word.
    let mut buf = Vec::with_capacity(80);
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let word = trim_line_end(&buf);
        if !word.is_empty() {
            builder.insert(word)?;
        }
    }
    builder.finish()?;
    info!(
        words = builder.word_count(),
        states = builder.node_count(),
        edges = builder.edge_count(),
        "dawg built from reader"
    );
    Ok(builder)
}

/// Strips a trailing `\n` or `\r\n`.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod test {
    use super::*;

    fn order_err(a: &str, b: &str) -> BuildError {
        BuildError::Order {
            previous: a.as_bytes().to_vec(),
            word: b.as_bytes().to_vec(),
        }
    }

    #[test]
    fn graph_shares_nodes() {
        let b1 = build_dawg(["ABCDEF"]).unwrap();
        assert_eq!(b1.node_count(), "ABCDEF".len() + 1);

        let b2 = build_dawg(["ABCDEF", "ABDEF", "ABEF", "AF"]).unwrap();
        assert_eq!(b1.node_count(), b2.node_count());
    }

    #[test]
    fn graph_shares_nodes_multibyte() {
        let b1 = build_dawg(["授人以鱼不如授人以渔"]).unwrap();
        let b2 = build_dawg(["授人以渔", "授人以鱼不如授人以渔"]).unwrap();
        assert_eq!(b1.node_count(), b2.node_count());
    }

    #[test]
    fn final_flag_lives_on_edges() {
        let b = build_dawg(["ab", "b"]).unwrap();
        // root, the state after "a", and the leaf shared by "ab" and "b"
        assert_eq!(b.node_count(), 3);
        assert_eq!(b.edge_count(), 3);
    }

    #[test]
    fn edge_finality_does_not_split_states() {
        let b1 = build_dawg(["xa", "ya"]).unwrap();
        let b2 = build_dawg(["x", "xa", "ya"]).unwrap();
        assert_eq!(b1.node_count(), 3);
        // The "x" edge becomes final but still leads to the shared state.
        assert_eq!(b2.node_count(), 3);
        assert!(b2.lookup("x"));
        assert!(!b2.lookup("y"));
    }

    #[test]
    fn sorted_input_words_gives_no_error() {
        let res = build_dawg(["ALFA", "BRAVO", "CHARLIE", "DELTA"]);
        assert!(res.is_ok());
    }

    #[test]
    fn unsorted_input_words_gives_error() {
        use itertools::Itertools;
        const SORTED_WORDS: [&str; 7] = [
            "ALFA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "FOXTROT", "GOLF",
        ];
        let mut sorted_count = 0;
        // Every permutation except the sorted one must be rejected.
        let permutations = SORTED_WORDS
            .iter()
            .cloned()
            .permutations(SORTED_WORDS.len());
        for wordlist in permutations {
            let is_sorted = wordlist == SORTED_WORDS;
            let res = build_dawg(&wordlist);
            assert_eq!(res.is_ok(), is_sorted);
            sorted_count += is_sorted as i32;
        }

        assert_eq!(sorted_count, 1);
    }

    #[test]
    fn same_word_twice_in_input_words_gives_error() {
        let res = build_dawg(["ALFA", "BRAVO", "CHARLIE", "CHARLIE"]);
        assert_eq!(res.err(), Some(order_err("CHARLIE", "CHARLIE")));
    }

    #[test]
    fn prefix_after_word_gives_error() {
        let res = build_dawg(["testing", "test"]);
        assert_eq!(res.err(), Some(order_err("testing", "test")));
    }

    #[test]
    fn unsorted_input_words_gives_unsorted_words_in_error() {
        let res = build_dawg([
            "ALFA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "GOLF", "FOXTROT", "HOTEL",
        ]);
        assert_eq!(res.err(), Some(order_err("GOLF", "FOXTROT")));

        let res = build_dawg(["ZULU", "ALFA", "BRAVO", "CHARLIE"]);
        assert_eq!(res.err(), Some(order_err("ZULU", "ALFA")));
    }

    #[test]
    fn builder_usable_after_order_error() {
        let mut b = Builder::new();
        b.insert("beta").unwrap();
        assert_eq!(b.insert("alpha"), Err(order_err("beta", "alpha")));
        b.insert("gamma").unwrap();
        b.finish().unwrap();
        assert!(b.lookup("beta"));
        assert!(b.lookup("gamma"));
        assert!(!b.lookup("alpha"));
        assert_eq!(b.word_count(), 2);
    }

    #[test]
    fn empty_word_is_rejected() {
        let mut b = Builder::new();
        assert_eq!(b.insert(""), Err(BuildError::EmptyInput));
        b.insert("a").unwrap();
        assert_eq!(b.insert(Vec::new()), Err(BuildError::EmptyInput));
    }

    #[test]
    fn lifecycle_errors() {
        let mut b = Builder::new();
        b.insert("word").unwrap();
        assert_eq!(b.to_compact_buffer(false).err(), Some(BuildError::NotFinished));
        b.finish().unwrap();
        assert_eq!(b.finish(), Err(BuildError::AlreadyFinished));
        assert_eq!(b.insert("zebra"), Err(BuildError::AlreadyFinished));
        assert!(b.to_compact_buffer(false).is_ok());
        assert!(b.to_compact_buffer(true).is_ok());
    }

    #[test]
    fn too_many_edges() {
        let mut b = Builder::new();
        for label in 0..=254u8 {
            b.insert([label]).unwrap();
        }
        assert_eq!(
            b.insert([255u8]),
            Err(BuildError::TooManyEdges { prefix: Vec::new() })
        );
        b.finish().unwrap();
        assert_eq!(b.edge_count(), 255);
        assert!(b.lookup([254u8]));
        assert!(!b.lookup([255u8]));
    }

    #[test]
    fn lookup_before_and_after_finish() {
        let mut b = Builder::new();
        for word in ["car", "cart", "cat"] {
            b.insert(word).unwrap();
        }
        // "cat" is still pending, "car" and "cart" are committed.
        assert!(b.lookup("car"));
        assert!(b.lookup("cart"));
        assert!(b.lookup("cat"));
        assert!(!b.lookup("ca"));
        assert!(b.lookup_prefix("ca"));
        assert!(b.lookup_prefix(""));
        assert!(!b.lookup(""));
        assert!(!b.lookup_prefix("cb"));

        b.finish().unwrap();
        assert!(b.lookup("car"));
        assert!(b.lookup("cart"));
        assert!(b.lookup("cat"));
        assert!(!b.lookup("carts"));
    }

    #[test]
    fn suffixes_are_shared() {
        let testdata = [
            "ASUFFIX",
            "BSUFFIX",
            "CDESUFFIX",
            "FFFFFFFSUFFIX",
            "INBETWEEN",
            "JSUFFIX",
            "XXSUFFIX",
        ];

        let b = build_dawg(testdata).unwrap();
        let root = b.root();
        let target = |state: &State, label: u8| state.get(label).unwrap().target;
        let suffix_state = target(root, b'A');
        for word in testdata {
            if word.ends_with("SUFFIX") {
                let prefix_len = word.len() - "SUFFIX".len();
                let mut state = root;
                let mut id = None;
                for &label in &word.as_bytes()[..prefix_len] {
                    let next = target(state, label);
                    state = &b.states[next.index()];
                    id = Some(next);
                }
                assert_eq!(id, Some(suffix_state), "{word}");
            }
        }
    }

    #[test]
    fn reads_words_from_lines() {
        let input = b"alpha\r\nbeta\n\ngamma\n\xffbytes";
        let b = build_from_reader(&input[..]).unwrap();
        assert_eq!(b.word_count(), 4);
        assert!(b.lookup("alpha"));
        assert!(b.lookup("beta"));
        assert!(b.lookup(b"\xffbytes"));
        assert!(b.lookup("gamma"));
        assert!(b.is_finished());
    }

    #[test]
    fn reader_propagates_order_errors() {
        let res = build_from_reader(&b"beta\nalpha\n"[..]);
        assert!(matches!(
            res,
            Err(super::super::Error::Build(BuildError::Order { .. }))
        ));
    }

    #[test]
    fn trims_line_endings() {
        assert_eq!(trim_line_end(b"word\r\n"), b"word");
        assert_eq!(trim_line_end(b"word\n"), b"word");
        assert_eq!(trim_line_end(b"word"), b"word");
        assert_eq!(trim_line_end(b"\n"), b"");
    }
}
