use bytes::Bytes;
use smallvec::SmallVec;
use tracing::warn;

use super::error::FormatError;
use super::format::{validate, Layout, EDGE_SIZE, FINAL_FLAG, HEADER_SIZE, OFFSET_MASK};
use super::iter::Words;

/// An edge record decoded from the structure region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EdgeRecord {
    pub label: u8,
    /// Offset of the target state, `None` for leaves.
    pub target: Option<u32>,
    pub is_final: bool,
}

/// Position reached after consuming a byte string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cursor {
    /// State the walk stands in, `None` past a leaf edge.
    pub state: Option<u32>,
    /// Whether the last edge consumed completes a word.
    pub is_final: bool,
}

impl Cursor {
    pub(crate) const ROOT: Cursor = Cursor {
        state: Some(0),
        is_final: false,
    };

    pub(crate) fn through(edge: EdgeRecord) -> Self {
        Cursor {
            state: edge.target,
            is_final: edge.is_final,
        }
    }
}

/// Result of a counted lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountedMatch {
    /// Number of stored words sorting before the matched string.
    pub index: u32,
    /// Number of stored words starting with the matched string, itself included.
    pub suffix_count: u32,
    /// True if the matched string is itself a stored word.
    pub is_final: bool,
    /// The matched string: the query, or the word selected by rank.
    pub text: Vec<u8>,
}

/// A read-only view of a compact buffer.
///
/// The buffer is validated once, on construction; afterwards every query is
/// offset arithmetic and binary search over shared immutable bytes, so a
/// `CompactDawg` can be cloned cheaply and queried from many threads.
///
/// Accessors are bounds checked: a buffer whose checksum matches but whose
/// offsets are inconsistent answers "not found" rather than panicking.
///
/// # Examples
///
/// ```
/// use dawg_cache::dawg::builder::build_dawg;
/// use dawg_cache::dawg::CompactDawg;
///
/// let builder = build_dawg(["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"]).unwrap();
/// let dawg = CompactDawg::new(builder.to_compact_buffer(true).unwrap()).unwrap();
///
/// assert!(dawg.lookup("CAKE"));
/// assert!(!dawg.lookup("AKE"));
///
/// let found = dawg.lookup_counts("FAKE").unwrap();
/// assert_eq!(found.index, 2);
/// assert_eq!(dawg.lookup_index(4).unwrap().text, b"MAKE");
/// ```
#[derive(Clone, Debug)]
pub struct CompactDawg {
    data: Bytes,
    layout: Layout,
}

impl CompactDawg {
    /// Validates `buf` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the first [`FormatError`] found in the header or checksum.
    pub fn new(buf: impl Into<Bytes>) -> Result<Self, FormatError> {
        let buf = buf.into();
        let header = validate(&buf).inspect_err(|err| warn!(%err, "rejecting dawg buffer"))?;
        Ok(CompactDawg {
            data: buf.slice(HEADER_SIZE..),
            layout: header.layout,
        })
    }

    /// True if the buffer records word counts, enabling rank queries.
    pub fn has_counts(&self) -> bool {
        self.layout == Layout::Counted
    }

    /// Number of stored words, for buffers with counts.
    pub fn word_count(&self) -> Option<u32> {
        self.has_counts().then(|| self.words_below(Some(0)))
    }

    /// Size of the structure region in bytes.
    pub fn structure_len(&self) -> usize {
        self.data.len()
    }

    /// The structure region, without the header.
    pub fn structure(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if some stored word starts with `prefix`.
    ///
    /// The empty prefix is always present.
    pub fn lookup_prefix(&self, prefix: impl AsRef<[u8]>) -> bool {
        self.walk(Cursor::ROOT, prefix.as_ref()).is_some()
    }

    /// Returns true if `word` is stored. The empty string never is.
    pub fn lookup(&self, word: impl AsRef<[u8]>) -> bool {
        self.walk(Cursor::ROOT, word.as_ref())
            .is_some_and(|cursor| cursor.is_final)
    }

    /// Like [`lookup_prefix`](Self::lookup_prefix), also reporting the rank
    /// of `prefix` and the number of words starting with it.
    ///
    /// For the empty prefix, `suffix_count` is the total number of words.
    /// Returns `None` if the prefix is absent or the buffer has no counts.
    pub fn lookup_prefix_counts(&self, prefix: impl AsRef<[u8]>) -> Option<CountedMatch> {
        self.counted_walk(prefix.as_ref())
    }

    /// Like [`lookup`](Self::lookup), also reporting the word's rank and the
    /// number of words starting with it.
    ///
    /// Returns `None` if the word is absent or the buffer has no counts.
    pub fn lookup_counts(&self, word: impl AsRef<[u8]>) -> Option<CountedMatch> {
        self.counted_walk(word.as_ref()).filter(|m| m.is_final)
    }

    /// Returns the word at 0-based position `rank` in sorted order.
    ///
    /// Returns `None` if `rank` is not below the word count or the buffer
    /// has no counts.
    pub fn lookup_index(&self, rank: u32) -> Option<CountedMatch> {
        if rank >= self.word_count()? {
            return None;
        }

        let mut remaining = rank;
        let mut state = Some(0);
        let mut text = Vec::new();
        loop {
            // No stored word is longer than the structure has bytes.
            if text.len() > self.data.len() {
                return None;
            }
            let offset = state?;
            // Cumulative suffix counts of the edges, in label order.
            let mut cumulative: SmallVec<[u32; 16]> = SmallVec::new();
            let mut total = 0u32;
            for i in 0..self.edge_count(offset) {
                let edge = self.edge(offset, i)?;
                total = total.saturating_add(self.suffix_count(edge));
                cumulative.push(total);
            }
            let i = cumulative.partition_point(|&c| c <= remaining);
            let edge = self.edge(offset, i)?;
            if i > 0 {
                remaining -= cumulative[i - 1];
            }
            text.push(edge.label);

            if edge.is_final {
                if remaining == 0 {
                    return Some(CountedMatch {
                        index: rank,
                        suffix_count: self.suffix_count(edge),
                        is_final: true,
                        text,
                    });
                }
                remaining -= 1;
            }
            state = edge.target;
        }
    }

    /// Iterates over all words in ascending byte order.
    pub fn iter(&self) -> Words<'_> {
        Words::new(self, &[])
    }

    /// Iterates over the words starting with `prefix`, in ascending order.
    ///
    /// Yielded words include the prefix; the prefix itself comes first if it
    /// is a stored word.
    pub fn iter_prefix(&self, prefix: impl AsRef<[u8]>) -> Words<'_> {
        Words::new(self, prefix.as_ref())
    }

    /// Returns the distinct strings of at most `max_depth` bytes that extend
    /// `prefix` toward some stored word, sorted.
    ///
    /// Each word below `prefix` is cut to `max_depth` bytes; the prefix
    /// itself is not a continuation. Empty if `prefix` is absent or longer
    /// than `max_depth`.
    ///
    /// ```
    /// use dawg_cache::dawg::builder::build_dawg;
    /// use dawg_cache::dawg::CompactDawg;
    ///
    /// let builder = build_dawg(["test", "testable", "testament", "testing"]).unwrap();
    /// let dawg = CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap();
    /// assert_eq!(dawg.prefix_continuations("test", 5), vec![b"testa".to_vec(), b"testi".to_vec()]);
    /// ```
    pub fn prefix_continuations(&self, prefix: impl AsRef<[u8]>, max_depth: usize) -> Vec<Vec<u8>> {
        let prefix = prefix.as_ref();
        if prefix.len() > max_depth {
            return Vec::new();
        }
        Words::bounded(self, prefix, max_depth - prefix.len()).collect()
    }

    /// Follows `bytes` from `start`, binary searching each state's edges.
    pub(crate) fn walk(&self, start: Cursor, bytes: &[u8]) -> Option<Cursor> {
        bytes.iter().try_fold(start, |cursor, &label| {
            self.find_edge(cursor.state?, label).map(|(_, edge)| Cursor::through(edge))
        })
    }

    /// Walks `bytes` while summing the counts of everything sorting before it.
    fn counted_walk(&self, bytes: &[u8]) -> Option<CountedMatch> {
        if !self.has_counts() {
            return None;
        }

        let mut index = 0u32;
        let mut cursor = Cursor::ROOT;
        let mut suffix_count = self.words_below(Some(0));
        for &label in bytes {
            let offset = cursor.state?;
            let (i, edge) = self.find_edge(offset, label)?;
            // Words ending on the edges already taken sort first.
            index = index.saturating_add(u32::from(cursor.is_final));
            for sibling in 0..i {
                let sibling = self.edge(offset, sibling)?;
                index = index.saturating_add(self.suffix_count(sibling));
            }
            suffix_count = self.suffix_count(edge);
            cursor = Cursor::through(edge);
        }

        Some(CountedMatch {
            index,
            suffix_count,
            is_final: cursor.is_final,
            text: bytes.to_vec(),
        })
    }

    /// Number of words through `edge`, the word it completes included.
    fn suffix_count(&self, edge: EdgeRecord) -> u32 {
        u32::from(edge.is_final).saturating_add(self.words_below(edge.target))
    }

    /// Number of words continuing strictly below a state; 0 for leaves.
    fn words_below(&self, state: Option<u32>) -> u32 {
        match (self.layout, state) {
            (Layout::Counted, Some(offset)) => self.read_u32(offset as usize + 1).unwrap_or(0),
            _ => 0,
        }
    }

    /// Number of edges leaving the state at `offset`.
    #[inline]
    pub(crate) fn edge_count(&self, offset: u32) -> usize {
        self.data.get(offset as usize).map_or(0, |&n| usize::from(n))
    }

    /// Decodes the `index`th edge of the state at `offset`.
    #[inline]
    pub(crate) fn edge(&self, offset: u32, index: usize) -> Option<EdgeRecord> {
        if index >= self.edge_count(offset) {
            return None;
        }
        let at = offset as usize + self.layout.state_header_width() + EDGE_SIZE * index;
        let label = *self.data.get(at)?;
        let flagged = self.read_u32(at + 1)?;
        let target = flagged & OFFSET_MASK;
        Some(EdgeRecord {
            label,
            target: (target != 0).then_some(target),
            is_final: flagged & FINAL_FLAG != 0,
        })
    }

    /// Binary searches the edges of the state at `offset` for `label`.
    pub(crate) fn find_edge(&self, offset: u32, label: u8) -> Option<(usize, EdgeRecord)> {
        let (mut lo, mut hi) = (0, self.edge_count(offset));
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let edge = self.edge(offset, mid)?;
            match edge.label.cmp(&label) {
                std::cmp::Ordering::Equal => return Some((mid, edge)),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        None
    }

    fn read_u32(&self, at: usize) -> Option<u32> {
        let bytes = self.data.get(at..at.checked_add(4)?)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }
}
