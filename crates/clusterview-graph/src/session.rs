//! Two-phase render session.
//!
//! Phase 1 runs the layouter on a worker thread and reports a [`LayoutStop`]
//! over a channel. Phase 2 (pack, fit, zoom damping, commit) only runs once
//! that stop message has been received on the session's thread, so bounding
//! boxes are always read from final positions.
//!
//! Every redraw gets a new generation. Stops carrying any other generation
//! are dropped; an in-flight layout is never cancelled, its result is just
//! ignored.

use crate::elements::{ElementBuilder, ElementSet};
use crate::frame::RenderFrame;
use crate::graph::{LayoutGraph, NodeIndex, Positions};
use crate::layout::{ForceDirectedLayouter, Layouter};
use crate::packer::{ComponentPacker, PackCluster};
use crate::settings::GraphSettings;
use crate::viewport::Viewport;
use clusterview_core::Cluster;
use clusterview_events::telemetry::{LayoutPass, PassKind};
use clusterview_events::{Event, EventBus, LayoutOutcome};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Completion signal of a layout pass.
#[derive(Debug, Clone)]
pub struct LayoutStop {
    pub generation: u64,
    pub positions: Positions,
}

/// Everything phase 2 needs from a redraw.
struct Redraw {
    generation: u64,
    elements: ElementSet,
    graph: Arc<LayoutGraph>,
    seed: Positions,
}

/// A redraw waiting for its layout to stop. Dropping it unclosed marks the
/// layout pass as abandoned.
struct PendingRedraw {
    redraw: Redraw,
    pass: LayoutPass,
}

pub struct GraphSession {
    settings: GraphSettings,
    layouter: Arc<dyn Layouter + Send + Sync>,
    bus: EventBus,
    generation: u64,
    clusters: Vec<Cluster>,
    pending: Option<PendingRedraw>,
    frame: Option<RenderFrame>,
    stop_tx: Sender<LayoutStop>,
    stop_rx: Receiver<LayoutStop>,
}

impl GraphSession {
    pub fn new(settings: GraphSettings, bus: EventBus) -> Self {
        let layouter = ForceDirectedLayouter::new(settings.layout.clone());
        Self::with_layouter(settings, bus, layouter)
    }

    pub fn with_layouter<L>(settings: GraphSettings, bus: EventBus, layouter: L) -> Self
    where
        L: Layouter + Send + Sync + 'static,
    {
        let (stop_tx, stop_rx) = unbounded();
        Self {
            settings,
            layouter: Arc::new(layouter),
            bus,
            generation: 0,
            clusters: Vec::new(),
            pending: None,
            frame: None,
            stop_tx,
            stop_rx,
        }
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last committed frame.
    pub fn frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Rebuild elements and start a layout pass for `clusters`. Returns the
    /// new generation.
    pub fn redraw(&mut self, clusters: &[Cluster]) -> u64 {
        self.clusters = clusters.to_vec();
        self.start_layout()
    }

    /// New canvas size. Triggers a full redraw of the current clusters.
    pub fn resize(&mut self, width: f32, height: f32) -> u64 {
        self.settings.canvas.width = width;
        self.settings.canvas.height = height;
        self.bus.publish(Event::Resize { width, height });
        self.start_layout()
    }

    fn start_layout(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                "Redraw {} supersedes pending layout {}",
                generation,
                previous.redraw.generation
            );
        }

        self.bus.publish(Event::ClustersLoaded {
            cluster_count: self.clusters.len(),
            account_count: self.clusters.iter().map(Cluster::member_count).sum(),
        });

        let elements = ElementBuilder::new(self.settings.encoding).build(&self.clusters);
        for issue in &elements.issues {
            self.bus.publish(Event::IntegrityIssue {
                cluster: issue.cluster(),
                message: issue.to_string(),
            });
        }

        let graph = Arc::new(LayoutGraph::from_elements(&elements));
        let seed = self.layouter.initial_positions(&graph);
        let pass = LayoutPass::start(PassKind::Layout, generation);
        self.bus.publish(Event::LayoutStarted {
            generation,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        });

        self.spawn_layout(generation, Arc::clone(&graph));

        self.pending = Some(PendingRedraw {
            redraw: Redraw {
                generation,
                elements,
                graph,
                seed,
            },
            pass,
        });
        generation
    }

    fn spawn_layout(&self, generation: u64, graph: Arc<LayoutGraph>) {
        let layouter = Arc::clone(&self.layouter);
        let tx = self.stop_tx.clone();
        let run = move || {
            let positions = layouter.execute(&graph);
            // The session may be gone by now.
            let _ = tx.send(LayoutStop {
                generation,
                positions,
            });
        };

        let spawned = thread::Builder::new()
            .name(format!("clusterview-layout-{generation}"))
            .spawn(run.clone());
        if let Err(err) = spawned {
            tracing::warn!(
                "Could not spawn layout thread for generation {}: {}; running inline",
                generation,
                err
            );
            run();
        }
    }

    /// Handle every stop message already delivered. Returns true when a new
    /// frame was committed.
    pub fn pump(&mut self) -> bool {
        let mut committed = false;
        while let Ok(stop) = self.stop_rx.try_recv() {
            committed |= self.on_layout_stop(stop);
        }
        committed
    }

    /// Block until the current layout stops, or fall back to the seed
    /// positions after `timeout`. Always leaves a committed frame behind
    /// when a redraw was pending.
    pub fn wait_for_layout(&mut self, timeout: Duration) -> Option<&RenderFrame> {
        let deadline = Instant::now() + timeout;

        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.stop_rx.recv_timeout(remaining) {
                Ok(stop) => {
                    self.on_layout_stop(stop);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    self.on_layout_timeout(timeout);
                }
            }
        }

        self.frame.as_ref()
    }

    /// [`wait_for_layout`](Self::wait_for_layout) with the configured timeout.
    pub fn wait(&mut self) -> Option<&RenderFrame> {
        let timeout = self.settings.layout_timeout();
        self.wait_for_layout(timeout)
    }

    fn on_layout_stop(&mut self, stop: LayoutStop) -> bool {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.redraw.generation == stop.generation);
        if !is_current {
            tracing::debug!(
                "Discarding layout stop for generation {} (current {})",
                stop.generation,
                self.generation
            );
            self.bus.publish(Event::StaleLayoutDiscarded {
                generation: stop.generation,
                current: self.generation,
            });
            return false;
        }

        let Some(PendingRedraw { redraw, mut pass }) = self.pending.take() else {
            return false;
        };

        let positions = if stop.positions.len() == redraw.graph.node_count() {
            stop.positions
        } else {
            tracing::warn!(
                "Layout for generation {} returned {} positions for {} nodes; using seed positions",
                redraw.generation,
                stop.positions.len(),
                redraw.graph.node_count()
            );
            pass.note("seed positions after size mismatch");
            redraw.seed.clone()
        };

        let record = pass.success();
        self.bus.publish(Event::LayoutStopped {
            generation: redraw.generation,
            duration_ms: record.elapsed_ms,
        });

        self.commit(&redraw, positions, LayoutOutcome::Stopped);
        true
    }

    fn on_layout_timeout(&mut self, waited: Duration) {
        let Some(PendingRedraw { redraw, pass }) = self.pending.take() else {
            return;
        };
        tracing::warn!(
            "Layout for generation {} did not stop within {} ms; committing seed positions",
            redraw.generation,
            waited.as_millis()
        );
        pass.failure("timeout");
        self.bus.publish(Event::LayoutTimedOut {
            generation: redraw.generation,
            waited_ms: waited.as_millis() as u64,
        });

        self.commit(&redraw, redraw.seed.clone(), LayoutOutcome::TimedOut);
    }

    /// Phase 2: pack, fit, damp and commit.
    fn commit(&mut self, redraw: &Redraw, mut positions: Positions, outcome: LayoutOutcome) {
        let generation = redraw.generation;
        let graph = &redraw.graph;

        let mut pack_pass = LayoutPass::start(PassKind::Pack, generation);
        let clusters = PackCluster::from_elements(&redraw.elements);
        let packed = ComponentPacker::new(self.settings.pack.clone()).pack(
            &clusters,
            graph,
            &mut positions,
        );
        pack_pass.note(format!(
            "{} placements in {} rows",
            packed.placements.len(),
            packed.rows
        ));
        pack_pass.success();
        self.bus.publish(Event::PackComplete {
            generation,
            placements: packed.placements.len(),
            rows: packed.rows,
        });

        let canvas = &self.settings.canvas;
        let mut viewport = Viewport::new(canvas.width, canvas.height, &self.settings.viewport);
        let all_nodes: Vec<NodeIndex> = graph.node_indices().collect();
        if viewport.fit(
            positions.body_bounds(graph, &all_nodes),
            self.settings.viewport.fit_padding,
        ) {
            viewport.scale_zoom(self.settings.viewport.zoom_factor);
            self.bus.publish(Event::ViewportFitted {
                zoom: viewport.zoom,
                pan_x: viewport.pan.x,
                pan_y: viewport.pan.y,
            });
        }

        let frame = RenderFrame::assemble(
            generation,
            outcome,
            &redraw.elements,
            &positions,
            viewport,
            packed.placements,
        );
        tracing::info!(
            "Committed frame {} with {} nodes and {} edges",
            generation,
            frame.nodes.len(),
            frame.edges.len()
        );
        self.bus.publish(Event::FrameCommitted {
            generation,
            outcome,
        });
        self.frame = Some(frame);
    }
}
