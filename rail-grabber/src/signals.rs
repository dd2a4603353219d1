//! Named change signals for widget and background consumers.

use tokio::sync::broadcast;

/// Capacity of the signal channel; slow subscribers miss the oldest signals.
const SIGNAL_CAPACITY: usize = 32;

/// A change other parts of the application may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepartureSignal {
    /// The trip list or the selected trip changed.
    TripUpdated,
    /// The stored next departure became (or stopped being) suspect.
    NextDepartureSuspectChanged,
    /// A new next departure time was stored.
    NextDepartureTimeChanged,
    /// A background next-departure refresh started.
    UpdateInProgress,
    /// A next-departure refresh finished, whatever its result.
    UpdateFinished,
}

/// Cloneable broadcaster for [`DepartureSignal`]s.
#[derive(Debug, Clone)]
pub struct Signals {
    sender: broadcast::Sender<DepartureSignal>,
}

impl Signals {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { sender }
    }

    /// Send a signal to every current subscriber.
    pub fn emit(&self, signal: DepartureSignal) {
        // No subscribers is not an error
        let _ = self.sender.send(signal);
    }

    /// Subscribe to signals emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DepartureSignal> {
        self.sender.subscribe()
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain every signal already delivered to `receiver`.
#[cfg(test)]
pub(crate) fn drain(receiver: &mut broadcast::Receiver<DepartureSignal>) -> Vec<DepartureSignal> {
    let mut signals = Vec::new();
    while let Ok(signal) = receiver.try_recv() {
        signals.push(signal);
    }
    signals
}
