use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::error::BuildError;
use super::format::{Header, Layout, EDGE_SIZE, FINAL_FLAG, HEADER_SIZE, OFFSET_MASK};
use super::state::{State, StateId};

/// Where a state ends up in the structure region.
#[derive(Clone, Copy)]
enum Slot {
    /// Not reached yet.
    Unplaced,
    /// Leaves are not emitted; edges into them store offset 0.
    Leaf,
    Placed(u32),
}

/// Serializes a minimized automaton into a compact buffer.
///
/// `states` is the builder's arena, in canonicalization order: every edge
/// points to a state with a smaller index. States are emitted depth-first
/// from the root, children in label order, each state once.
pub(crate) fn encode(
    root: &State,
    states: &[State],
    preserve_counts: bool,
) -> Result<Bytes, BuildError> {
    let layout = Layout::from_preserve_counts(preserve_counts);
    let (order, slots, size) = place(root, states, layout)?;

    let below = match layout {
        Layout::Counted => words_below(states),
        Layout::Plain => Vec::new(),
    };

    let mut structure = BytesMut::with_capacity(size);
    for id in order {
        let state = id.map_or(root, |id| &states[id.index()]);
        structure.put_u8(state.edge_count() as u8);
        if layout == Layout::Counted {
            let count = match id {
                Some(id) => below[id.index()],
                None => count_below(root, &below),
            };
            structure.put_u32_le(count);
        }
        for edge in state.edges() {
            let offset = match slots[edge.target.index()] {
                Slot::Placed(offset) => offset,
                Slot::Leaf | Slot::Unplaced => 0,
            };
            let flag = if edge.is_final { FINAL_FLAG } else { 0 };
            structure.put_u8(edge.label);
            structure.put_u32_le(offset | flag);
        }
    }
    debug_assert_eq!(structure.len(), size);

    let header = Header::describe(layout, &structure);
    let mut out = BytesMut::with_capacity(HEADER_SIZE + structure.len());
    header.write(&mut out);
    out.put_slice(&structure);

    debug!(
        ?layout,
        bytes = out.len(),
        checksum = header.checksum,
        "dawg serialized"
    );
    Ok(out.freeze())
}

/// Assigns offsets. Returns the emission order (`None` standing for the
/// root), the slot of every arena state and the total structure size.
fn place(
    root: &State,
    states: &[State],
    layout: Layout,
) -> Result<(Vec<Option<StateId>>, Vec<Slot>, usize), BuildError> {
    let mut slots = vec![Slot::Unplaced; states.len()];
    let mut order = Vec::new();
    let record_size = |state: &State| layout.state_header_width() + EDGE_SIZE * state.edge_count();

    order.push(None);
    let mut size = record_size(root);

    // Pushing children in reverse makes the pop order match a recursive
    // pre-order walk.
    let mut stack: Vec<StateId> = root.edges().iter().rev().map(|e| e.target).collect();
    while let Some(id) = stack.pop() {
        if !matches!(slots[id.index()], Slot::Unplaced) {
            continue;
        }
        let state = &states[id.index()];
        if state.is_leaf() {
            slots[id.index()] = Slot::Leaf;
            continue;
        }
        if size > OFFSET_MASK as usize {
            return Err(BuildError::TooLarge { size });
        }
        slots[id.index()] = Slot::Placed(size as u32);
        order.push(Some(id));
        size += record_size(state);
        stack.extend(state.edges().iter().rev().map(|e| e.target));
    }
    if size > u32::MAX as usize {
        return Err(BuildError::TooLarge { size });
    }
    Ok((order, slots, size))
}

/// Number of words continuing strictly below each arena state.
fn words_below(states: &[State]) -> Vec<u32> {
    let mut below: Vec<u32> = Vec::with_capacity(states.len());
    for state in states {
        let count = count_below(state, &below);
        below.push(count);
    }
    below
}

fn count_below(state: &State, below: &[u32]) -> u32 {
    state
        .edges()
        .iter()
        .map(|e| u32::from(e.is_final) + below[e.target.index()])
        .fold(0u32, u32::saturating_add)
}
