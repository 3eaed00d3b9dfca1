//! The single "selected gym" cell.

use tracing::debug;

use crate::gym::Gym;

/// Outcome of a `select`, used by the screen to decide whether to recenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    /// Nothing was selected before.
    Selected,
    /// A different gym was selected before.
    Replaced,
    /// The same gym was already selected.
    Unchanged,
}

impl SelectionChange {
    pub fn is_change(self) -> bool {
        !matches!(self, SelectionChange::Unchanged)
    }
}

/// Proof that a `select` was started at a given point. Only the newest ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectTicket(u64);

#[derive(Debug, Default)]
pub struct SelectionState {
    selected: Option<Gym>,
    generation: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&Gym> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected.is_some()
    }

    /// Starts a selection whose gym record is not at hand yet. Any earlier pending
    /// ticket becomes stale.
    pub fn begin_select(&mut self) -> SelectTicket {
        self.generation += 1;
        SelectTicket(self.generation)
    }

    /// Completes a pending selection. Returns `None` if a newer `select` or `clear` ran
    /// in the meantime.
    pub fn commit(&mut self, ticket: SelectTicket, gym: Gym) -> Option<SelectionChange> {
        if ticket.0 != self.generation {
            debug!(gym_id = gym.id, "discarding stale selection");
            return None;
        }
        let change = match &self.selected {
            None => SelectionChange::Selected,
            Some(current) if current.id == gym.id => SelectionChange::Unchanged,
            Some(_) => SelectionChange::Replaced,
        };
        debug!(gym_id = gym.id, ?change, "gym selected");
        self.selected = Some(gym);
        Some(change)
    }

    /// Selects immediately. Last write wins over any pending ticket.
    pub fn select(&mut self, gym: Gym) -> SelectionChange {
        let ticket = self.begin_select();
        // The ticket was issued just above, so it is always current.
        self.commit(ticket, gym).unwrap_or(SelectionChange::Unchanged)
    }

    /// Deselects. Returns whether something was selected. Pending tickets become stale.
    pub fn clear(&mut self) -> bool {
        self.generation += 1;
        self.selected.take().is_some()
    }
}
