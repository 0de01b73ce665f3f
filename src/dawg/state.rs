use smallvec::SmallVec;

/// Index of a canonical state in the builder's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    pub(crate) fn new(index: usize) -> Self {
        // The arena never outgrows 31-bit offsets in practice; the encoder
        // reports oversized structures separately.
        StateId(index as u32)
    }

    /// Position of the state in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A labeled transition between two states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Byte consumed by the transition.
    pub label: u8,
    /// Canonical state the transition leads to.
    pub target: StateId,
    /// True if the path ending with this edge spells a stored word.
    pub is_final: bool,
}

/// A state of the automaton under construction.
///
/// Edges are kept sorted by label. Up to two edges are stored inline, so
/// the long chains of single-edge states do not allocate.
///
/// Equality and hashing only look one level down: a state is compared by
/// its labels, final flags and the *identity* of its targets. This is
/// sufficient because states are canonicalized bottom-up, so all targets are
/// already canonical when their parent is compared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct State {
    edges: SmallVec<[Edge; 2]>,
}

impl State {
    /// Creates a state without edges.
    pub fn new() -> Self {
        State::default()
    }

    /// Appends an edge.
    ///
    /// Edges arrive in increasing label order because words are inserted in
    /// sorted order.
    pub fn push(&mut self, edge: Edge) {
        debug_assert!(
            self.edges.last().map_or(true, |last| last.label < edge.label),
            "edges must be appended in increasing label order"
        );
        self.edges.push(edge);
    }

    /// Returns the edge labeled `label`, if present.
    #[inline]
    pub fn get(&self, label: u8) -> Option<&Edge> {
        self.edges
            .binary_search_by_key(&label, |e| e.label)
            .ok()
            .map(|i| &self.edges[i])
    }

    /// Returns the edges in label order.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if the state has no outgoing edges.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.edges.is_empty()
    }
}
