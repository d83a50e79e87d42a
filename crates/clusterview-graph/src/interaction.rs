//! Hover tooltip handling.
//!
//! The tooltip is the only output of the interaction layer. Nothing survives
//! beyond the current hover.

use crate::frame::{PlacedNode, RenderFrame};
use crate::geometry::Vec2;
use crate::hit_tester::{HitResult, HitTester};
use clusterview_core::format_usd;
use clusterview_events::{Event, EventBus};
use serde::Serialize;

/// Pixels between the node centre and the tooltip corner.
pub const TOOLTIP_OFFSET: f32 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipState {
    pub x: f32,
    pub y: f32,
    pub visible: bool,
    pub address: String,
    pub volume_label: String,
}

pub struct Interaction {
    tooltip: TooltipState,
    bus: EventBus,
}

impl Interaction {
    pub fn new(bus: EventBus) -> Self {
        Self {
            tooltip: TooltipState::default(),
            bus,
        }
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    /// Show the tooltip for `node`, whose centre is at `rendered` on a canvas
    /// whose top-left corner sits at `origin` in page coordinates.
    pub fn hover_node(
        &mut self,
        node: &PlacedNode,
        rendered: Vec2,
        origin: Vec2,
        device_pixel_ratio: f32,
    ) -> &TooltipState {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };

        self.tooltip = TooltipState {
            x: origin.x + rendered.x / dpr + TOOLTIP_OFFSET,
            y: origin.y + rendered.y / dpr + TOOLTIP_OFFSET,
            visible: true,
            address: node.id.clone(),
            volume_label: format_usd(node.raw_volume),
        };
        self.bus.publish(Event::TooltipShow {
            address: self.tooltip.address.clone(),
            volume_label: self.tooltip.volume_label.clone(),
            x: self.tooltip.x,
            y: self.tooltip.y,
        });
        &self.tooltip
    }

    pub fn hover_out(&mut self) {
        if !self.tooltip.visible {
            return;
        }
        self.tooltip = TooltipState::default();
        self.bus.publish(Event::TooltipHide);
    }

    /// Pointer moved to `pos` (canvas pixels). Shows the tooltip over a node
    /// and hides it anywhere else.
    pub fn pointer_move(
        &mut self,
        frame: &RenderFrame,
        tester: &HitTester,
        pos: Vec2,
        origin: Vec2,
        device_pixel_ratio: f32,
    ) -> &TooltipState {
        let hovered = tester.node_at(pos).and_then(|id| frame.node(id));
        match hovered {
            Some(node) => {
                if !(self.tooltip.visible && self.tooltip.address == node.id) {
                    let rendered = frame.rendered_position(node);
                    self.hover_node(node, rendered, origin, device_pixel_ratio);
                }
            }
            None => self.hover_out(),
        }
        &self.tooltip
    }

    /// Tapping the empty canvas hides the tooltip; tapping an element does not.
    pub fn tap(&mut self, hit: &HitResult) {
        if hit.is_none() {
            self.hover_out();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::COLOR_LEVEL_FIRST;
    use crate::viewport::Viewport;
    use clusterview_core::ClusterId;
    use clusterview_events::LayoutOutcome;

    fn node(volume: f64) -> PlacedNode {
        PlacedNode {
            id: "EdCNh8EzETJLFphW8yvdY7rDd8zBiyweiz8DU5gUUUka".to_string(),
            cluster: ClusterId(7),
            label: "EdCN...UUka".to_string(),
            position: Vec2::new(10.0, 20.0),
            size: 30.0,
            color: COLOR_LEVEL_FIRST,
            level: 1,
            raw_volume: volume,
        }
    }

    #[test]
    fn test_hover_positions_tooltip_with_pixel_ratio() {
        let bus = EventBus::new();
        let mut interaction = Interaction::new(bus.clone());

        let tooltip = interaction
            .hover_node(&node(1_234_567.5), Vec2::new(200.0, 100.0), Vec2::new(40.0, 60.0), 2.0)
            .clone();

        assert!(tooltip.visible);
        assert_eq!(tooltip.x, 142.0);
        assert_eq!(tooltip.y, 112.0);
        assert_eq!(tooltip.volume_label, "$1,234,567.5");

        match bus.drain().as_slice() {
            [Event::TooltipShow { address, x, .. }] => {
                assert_eq!(address, &tooltip.address);
                assert_eq!(*x, 142.0);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_pixel_ratio_falls_back_to_one() {
        let mut interaction = Interaction::new(EventBus::new());
        let tooltip = interaction.hover_node(&node(0.0), Vec2::new(10.0, 10.0), Vec2::ZERO, 0.0);
        assert_eq!(tooltip.x, 12.0);
        assert_eq!(tooltip.volume_label, "$0");
    }

    #[test]
    fn test_hover_out_and_empty_tap_hide() {
        let bus = EventBus::new();
        let mut interaction = Interaction::new(bus.clone());

        interaction.hover_node(&node(5.0), Vec2::ZERO, Vec2::ZERO, 1.0);
        interaction.tap(&HitResult::Node("other".into()));
        assert!(interaction.tooltip().visible);

        interaction.tap(&HitResult::None);
        assert!(!interaction.tooltip().visible);

        interaction.hover_node(&node(5.0), Vec2::ZERO, Vec2::ZERO, 1.0);
        interaction.hover_out();
        assert_eq!(interaction.tooltip(), &TooltipState::default());

        let hides = bus
            .drain()
            .into_iter()
            .filter(|e| matches!(e, Event::TooltipHide))
            .count();
        assert_eq!(hides, 2);
    }

    #[test]
    fn test_pointer_move_tracks_hovered_node() {
        let frame = RenderFrame {
            generation: 1,
            outcome: LayoutOutcome::Stopped,
            viewport: Viewport {
                zoom: 1.0,
                pan: Vec2::new(100.0, 0.0),
                ..Viewport::default()
            },
            nodes: vec![node(42.0)],
            edges: vec![],
            placements: vec![],
            issues: vec![],
        };
        let tester = HitTester::from_frame(&frame);
        let mut interaction = Interaction::new(EventBus::new());

        let shown = interaction
            .pointer_move(&frame, &tester, Vec2::new(112.0, 22.0), Vec2::ZERO, 1.0)
            .clone();
        assert!(shown.visible);
        assert_eq!((shown.x, shown.y), (112.0, 22.0));

        let hidden =
            interaction.pointer_move(&frame, &tester, Vec2::new(500.0, 500.0), Vec2::ZERO, 1.0);
        assert!(!hidden.visible);
    }

    #[test]
    fn test_tooltip_serializes_camel_case() {
        let json = serde_json::to_value(TooltipState::default()).unwrap();
        assert!(json.get("volumeLabel").is_some());
    }
}
