//! Per-line call history for the open billing period

use serde::{Deserialize, Serialize};

use crate::call::{Call, CallDirection};

/// Chronologically ordered calls logged against one line
///
/// Calls with equal timestamps keep their logging order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallHistory {
    calls: Vec<Call>,
}

impl CallHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a call at its chronological position
    pub fn record(&mut self, call: Call) {
        let at = self
            .calls
            .partition_point(|c| c.timestamp() <= call.timestamp());
        self.calls.insert(at, call);
    }

    /// All calls, oldest first
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn outgoing(&self) -> impl Iterator<Item = &Call> {
        self.by_direction(CallDirection::Outgoing)
    }

    pub fn incoming(&self) -> impl Iterator<Item = &Call> {
        self.by_direction(CallDirection::Incoming)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Empties the history, returning the calls it held
    pub fn drain(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    fn by_direction(&self, direction: CallDirection) -> impl Iterator<Item = &Call> {
        self.calls.iter().filter(move |c| c.direction() == direction)
    }
}
