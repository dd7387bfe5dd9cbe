use std::collections::HashMap;
use std::fmt;

/// Request categories. Within a slot only the most recently issued request may
/// change anything. The slots that replace the displayed graph also share one
/// view ordering: the last-issued of them wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    FullGraph,
    Search,
    PaperGraph,
    Upload,
    PaperList,
    Expansion,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::FullGraph => "full_graph",
            Slot::Search => "search",
            Slot::PaperGraph => "paper_graph",
            Slot::Upload => "upload",
            Slot::PaperList => "paper_list",
            Slot::Expansion => "expansion",
        }
    }

    pub fn replaces_view(&self) -> bool {
        matches!(
            self,
            Slot::FullGraph | Slot::Search | Slot::PaperGraph | Slot::Upload
        )
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotPhase {
    #[default]
    Idle,
    Pending,
    Settled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub slot: Slot,
    pub token: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct SlotState {
    latest: u64,
    phase: SlotPhase,
}

#[derive(Debug, Default)]
pub(crate) struct SlotTable {
    slots: HashMap<Slot, SlotState>,
    latest_view: Option<Ticket>,
}

impl SlotTable {
    pub(crate) fn issue(&mut self, slot: Slot) -> Ticket {
        let state = self.slots.entry(slot).or_default();
        state.latest += 1;
        state.phase = SlotPhase::Pending;
        let ticket = Ticket {
            slot,
            token: state.latest,
        };
        if slot.replaces_view() {
            self.latest_view = Some(ticket);
        }
        ticket
    }

    /// Latest in its slot and, for view slots, the latest view request overall.
    pub(crate) fn is_latest(&self, ticket: Ticket) -> bool {
        let latest_in_slot = self
            .slots
            .get(&ticket.slot)
            .is_some_and(|state| state.latest == ticket.token);
        latest_in_slot && (!ticket.slot.replaces_view() || self.latest_view == Some(ticket))
    }

    /// Only the latest ticket of a slot moves its phase.
    pub(crate) fn finish(&mut self, ticket: Ticket, phase: SlotPhase) {
        if let Some(state) = self.slots.get_mut(&ticket.slot) {
            if state.latest == ticket.token {
                state.phase = phase;
            }
        }
    }

    pub(crate) fn phase(&self, slot: Slot) -> SlotPhase {
        self.slots
            .get(&slot)
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    pub(crate) fn any_pending(&self) -> bool {
        self.slots
            .values()
            .any(|state| state.phase == SlotPhase::Pending)
    }
}
