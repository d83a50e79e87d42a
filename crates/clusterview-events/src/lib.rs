use clusterview_core::ClusterId;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

pub mod telemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutOutcome {
    /// The layout engine signalled completion.
    Stopped,
    /// The engine never signalled; seed positions were used instead.
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Data
    ClustersLoaded {
        cluster_count: usize,
        account_count: usize,
    },
    IntegrityIssue {
        cluster: ClusterId,
        message: String,
    },

    // Layout pass
    LayoutStarted {
        generation: u64,
        node_count: usize,
        edge_count: usize,
    },
    LayoutStopped {
        generation: u64,
        duration_ms: u64,
    },
    LayoutTimedOut {
        generation: u64,
        waited_ms: u64,
    },
    StaleLayoutDiscarded {
        generation: u64,
        current: u64,
    },

    // Packing and viewport
    PackComplete {
        generation: u64,
        placements: usize,
        rows: usize,
    },
    ViewportFitted {
        zoom: f32,
        pan_x: f32,
        pan_y: f32,
    },
    FrameCommitted {
        generation: u64,
        outcome: LayoutOutcome,
    },
    Resize {
        width: f32,
        height: f32,
    },

    // Tooltip
    TooltipShow {
        address: String,
        volume_label: String,
        x: f32,
        y: f32,
    },
    TooltipHide,
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    /// This is useful for draining notifications after a redraw.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Drain pending events into a vector.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
