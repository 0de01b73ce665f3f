use std::io::Write;
use std::iter::FusedIterator;

use super::error::Result;
use super::reader::{CompactDawg, Cursor};

/// Position within one state during enumeration.
#[derive(Clone, Copy, Debug)]
struct Frame {
    state: u32,
    edge: usize,
    /// The current edge's string has been yielded.
    emitted: bool,
    /// The current edge's target has been pushed.
    descended: bool,
}

impl Frame {
    fn new(state: u32) -> Self {
        Frame {
            state,
            edge: 0,
            emitted: false,
            descended: false,
        }
    }

    fn advance(&mut self) {
        self.edge += 1;
        self.emitted = false;
        self.descended = false;
    }
}

/// Depth-first enumeration of the words of a [`CompactDawg`].
///
/// Words come out in ascending byte order. The traversal keeps an explicit
/// stack of frames, so its depth is bounded by the buffer rather than the
/// call stack. Created by [`CompactDawg::iter`] and
/// [`CompactDawg::iter_prefix`].
///
/// ```
/// use dawg_cache::dawg::builder::build_dawg;
/// use dawg_cache::dawg::CompactDawg;
///
/// let builder = build_dawg(["test", "testable", "testament", "testing", "toast"]).unwrap();
/// let dawg = CompactDawg::new(builder.to_compact_buffer(false).unwrap()).unwrap();
///
/// let words: Vec<String> = dawg
///     .iter_prefix("test")
///     .map(|w| String::from_utf8(w).unwrap())
///     .collect();
/// assert_eq!(words, ["test", "testable", "testament", "testing"]);
/// ```
#[derive(Clone, Debug)]
pub struct Words<'a> {
    dawg: &'a CompactDawg,
    prefix_len: usize,
    /// Where the prefix walk ended, `None` if the prefix is absent.
    start: Option<Cursor>,
    /// Longest string, relative to the prefix, to yield; longer words are cut.
    depth_limit: Option<usize>,
    stack: Vec<Frame>,
    /// Prefix followed by the labels of the edges descended through.
    path: Vec<u8>,
    emit_prefix: bool,
}

impl<'a> Words<'a> {
    pub(crate) fn new(dawg: &'a CompactDawg, prefix: &[u8]) -> Self {
        Self::with_limit(dawg, prefix, None)
    }

    /// Yields the distinct strings extending `prefix` by at most `depth`
    /// bytes toward some word, the prefix itself excluded.
    pub(crate) fn bounded(dawg: &'a CompactDawg, prefix: &[u8], depth: usize) -> Self {
        Self::with_limit(dawg, prefix, Some(depth))
    }

    fn with_limit(dawg: &'a CompactDawg, prefix: &[u8], depth_limit: Option<usize>) -> Self {
        let mut words = Words {
            dawg,
            prefix_len: prefix.len(),
            start: dawg.walk(Cursor::ROOT, prefix),
            depth_limit,
            stack: Vec::new(),
            path: prefix.to_vec(),
            emit_prefix: false,
        };
        words.rewind();
        words
    }

    /// Restarts the enumeration from the first word.
    pub fn rewind(&mut self) {
        self.stack.clear();
        self.path.truncate(self.prefix_len);
        self.emit_prefix = false;

        let Some(start) = self.start else {
            return;
        };
        if self.depth_limit == Some(0) {
            return;
        }
        self.emit_prefix = start.is_final && self.depth_limit.is_none();
        if let Some(state) = start.state {
            self.stack.push(Frame::new(state));
        }
    }

    fn depth(&self) -> usize {
        self.path.len() - self.prefix_len
    }
}

impl Iterator for Words<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.emit_prefix {
            self.emit_prefix = false;
            return Some(self.path.clone());
        }

        loop {
            let depth = self.depth() + 1;
            let at_limit = self.depth_limit.is_some_and(|limit| depth >= limit);
            // Bounds the walk on buffers whose offsets form a cycle.
            let can_descend = !at_limit && self.path.len() < self.dawg.structure_len();

            let frame = self.stack.last_mut()?;
            let Some(edge) = self.dawg.edge(frame.state, frame.edge) else {
                // Edges exhausted: return to the parent and move to its next edge.
                self.stack.pop();
                if let Some(parent) = self.stack.last_mut() {
                    self.path.pop();
                    parent.advance();
                }
                continue;
            };

            if !frame.emitted && (edge.is_final || (at_limit && edge.target.is_some())) {
                frame.emitted = true;
                let mut word = Vec::with_capacity(self.path.len() + 1);
                word.extend_from_slice(&self.path);
                word.push(edge.label);
                return Some(word);
            }

            match edge.target {
                Some(target) if !frame.descended && can_descend => {
                    frame.descended = true;
                    self.path.push(edge.label);
                    self.stack.push(Frame::new(target));
                }
                _ => frame.advance(),
            }
        }
    }
}

impl FusedIterator for Words<'_> {}

/// Writes every word of `dawg` to `out`, one per line, in ascending order.
///
/// Words are written as stored bytes, each followed by `\n`. The output can
/// be fed back to [`build_from_reader`](super::builder::build_from_reader).
pub fn write_words<W: Write>(dawg: &CompactDawg, mut out: W) -> Result<()> {
    for word in dawg.iter() {
        out.write_all(&word)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
