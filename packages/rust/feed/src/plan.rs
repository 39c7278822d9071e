//! The feed planner: a small state machine that decides which item comes next.
//!
//! The planner only deals in content-unit positions and item indices.
//! Rendering the planned items into [`FeedItem`](crate::FeedItem)s happens in
//! the assembler.

/// One slot of the repeating feed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Content,
    Quiz,
    Fact,
}

/// The repeating slot template.
pub const FEED_PATTERN: [Slot; 6] = [
    Slot::Content,
    Slot::Quiz,
    Slot::Content,
    Slot::Content,
    Slot::Fact,
    Slot::Content,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Emitting,
    /// The synthesis interval was reached; the next step emits a checkpoint.
    SynthesisPending,
    Done,
}

/// Planner state threaded through [`step`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub phase: Phase,
    /// Next content unit to emit.
    pub content_cursor: usize,
    /// Position in [`FEED_PATTERN`].
    pub pattern_cursor: usize,
    /// Index assigned to the next emitted item.
    pub next_index: usize,
    /// Content units emitted since the last synthesis.
    pub since_synthesis: usize,
    /// Content units awaiting a synthesis checkpoint.
    pub buffer: Vec<usize>,
    /// Most recently emitted content unit. Quiz and fact slots read this, and
    /// unlike `buffer` it is kept across synthesis resets.
    pub last_content: Option<usize>,
}

impl FeedState {
    pub fn new(start_index: usize) -> Self {
        Self {
            phase: Phase::Emitting,
            content_cursor: 0,
            pattern_cursor: 0,
            next_index: start_index,
            since_synthesis: 0,
            buffer: Vec::new(),
            last_content: None,
        }
    }
}

/// What the planner knows about the content it is sequencing.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Content units emitted between synthesis checkpoints.
    pub synthesis_interval: usize,
    /// Per content unit: whether a quiz question is available.
    pub quizzable: Vec<bool>,
}

impl PlanContext {
    pub fn unit_count(&self) -> usize {
        self.quizzable.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedKind {
    Content(usize),
    Quiz(usize),
    Fact(usize),
    /// Checkpoint over the listed content units, in emission order.
    Synthesis(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub index: usize,
    pub kind: PlannedKind,
}

/// Advance the planner by one transition.
///
/// Returns the next state and the item emitted by this transition, if any.
/// Skipped quiz/fact slots and the switch into `SynthesisPending` emit nothing
/// and consume no index.
pub fn step(mut state: FeedState, ctx: &PlanContext) -> (FeedState, Option<PlannedItem>) {
    match state.phase {
        Phase::Done => (state, None),

        Phase::SynthesisPending => {
            let units = std::mem::take(&mut state.buffer);
            let item = emit(&mut state, PlannedKind::Synthesis(units));
            state.since_synthesis = 0;
            state.phase = Phase::Emitting;
            (state, Some(item))
        }

        Phase::Emitting if state.content_cursor >= ctx.unit_count() => {
            state.phase = Phase::Done;
            if state.buffer.len() >= 2 {
                let units = std::mem::take(&mut state.buffer);
                let item = emit(&mut state, PlannedKind::Synthesis(units));
                return (state, Some(item));
            }
            (state, None)
        }

        Phase::Emitting if state.since_synthesis >= ctx.synthesis_interval.max(1) => {
            state.phase = Phase::SynthesisPending;
            (state, None)
        }

        Phase::Emitting => {
            let slot = FEED_PATTERN[state.pattern_cursor];
            state.pattern_cursor = (state.pattern_cursor + 1) % FEED_PATTERN.len();

            let kind = match slot {
                Slot::Content => {
                    let unit = state.content_cursor;
                    state.content_cursor += 1;
                    state.since_synthesis += 1;
                    state.buffer.push(unit);
                    state.last_content = Some(unit);
                    Some(PlannedKind::Content(unit))
                }
                Slot::Quiz => state
                    .last_content
                    .filter(|&u| ctx.quizzable.get(u).copied().unwrap_or(false))
                    .map(PlannedKind::Quiz),
                Slot::Fact => state.last_content.map(PlannedKind::Fact),
            };

            let item = kind.map(|kind| emit(&mut state, kind));
            (state, item)
        }
    }
}

fn emit(state: &mut FeedState, kind: PlannedKind) -> PlannedItem {
    let index = state.next_index;
    state.next_index += 1;
    PlannedItem { index, kind }
}

/// Run the planner to completion, numbering items from `start_index`.
pub fn plan_feed(ctx: &PlanContext, start_index: usize) -> Vec<PlannedItem> {
    let mut state = FeedState::new(start_index);
    let mut items = Vec::new();
    while state.phase != Phase::Done {
        let (next, item) = step(state, ctx);
        items.extend(item);
        state = next;
    }
    items
}
