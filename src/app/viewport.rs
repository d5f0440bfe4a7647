use std::collections::HashMap;

use eframe::egui::{self, Color32, Rect, Sense, Ui, Vec2};

use crate::topology::Topology;

use super::grid::{CANVAS_MARGINS, GridLayoutEngine, GridLayoutParams};
use super::node_view::{ActionDispatcher, NodeView, RenderParams, Scale};
use super::precision::layout_precision;
use super::render_utils::{ColorMapper, screen_to_world, world_to_screen};

/// Fixed chrome (navbar etc.) above the canvas; the usable viewport height is
/// the window height minus this.
pub(super) const CHROME_HEIGHT: f32 = 160.0;
pub(super) const NODE_SIZE: f32 = 24.0;

pub(super) const EMPTY_TOPOLOGY_REASONS: [&str; 3] = [
    "We haven't received any reports from probes recently. Are the probes properly configured?",
    "There are nodes, but they're currently hidden. Check the view options if they allow for showing hidden nodes.",
    "Containers view only: you're not running Docker, or you don't have any containers.",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ViewportDimensions {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(super) struct SubscriptionId(pub u64);

/// Injected window-resize event source. The notification carries no payload;
/// the viewport re-reads the window size itself.
pub(super) trait ResizeSource {
    fn subscribe(&mut self) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
    /// Returns true once per resize burst since the last poll for `id`.
    fn take_resized(&mut self, id: SubscriptionId) -> bool;
    fn window_size(&self) -> (f32, f32);
}

/// Resize source backed by the egui screen rect, refreshed once per frame.
#[derive(Default)]
pub(super) struct ScreenResizeSource {
    size: (f32, f32),
    pending: HashMap<SubscriptionId, bool>,
    next_id: u64,
}

impl ScreenResizeSource {
    pub(super) fn new(ctx: &egui::Context) -> Self {
        let mut source = Self::default();
        source.refresh(ctx);
        source
    }

    pub(super) fn refresh(&mut self, ctx: &egui::Context) {
        let rect = ctx.screen_rect();
        let size = (rect.width(), rect.height());
        if size != self.size {
            self.size = size;
            for resized in self.pending.values_mut() {
                *resized = true;
            }
        }
    }
}

impl ResizeSource for ScreenResizeSource {
    fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, false);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.pending.remove(&id);
    }

    fn take_resized(&mut self, id: SubscriptionId) -> bool {
        self.pending
            .get_mut(&id)
            .map(std::mem::take)
            .unwrap_or(false)
    }

    fn window_size(&self) -> (f32, f32) {
        self.size
    }
}

/// What the canvas reported back to the caller for this frame.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct ViewportResponse {
    pub background_clicked: bool,
}

/// Owns the viewport dimensions and the per-node views, computes the layout
/// precision for the current topology size, and delegates placement to the
/// grid-layout collaborator.
pub(super) struct TopologyViewport {
    dimensions: ViewportDimensions,
    subscription: Option<SubscriptionId>,
    node_views: HashMap<String, NodeView>,
    layout: Box<dyn GridLayoutEngine>,
    node_scale: Scale,
    selected_node_scale: Scale,
    pan: Vec2,
    zoom: f32,
}

impl TopologyViewport {
    pub(super) fn new(layout: Box<dyn GridLayoutEngine>) -> Self {
        Self {
            dimensions: ViewportDimensions {
                width: 0.0,
                height: 0.0,
            },
            subscription: None,
            node_views: HashMap::new(),
            layout,
            node_scale: Scale {
                pixels_per_unit: 2.0,
            },
            selected_node_scale: Scale {
                pixels_per_unit: 2.5,
            },
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    pub(super) fn dimensions(&self) -> ViewportDimensions {
        self.dimensions
    }

    pub(super) fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Subscribes to the resize source exactly once and reads the initial
    /// dimensions. Subscribe/unsubscribe stay symmetric across mount cycles.
    pub(super) fn mount(&mut self, resize: &mut dyn ResizeSource) {
        if self.subscription.is_none() {
            self.subscription = Some(resize.subscribe());
            self.read_dimensions(resize);
        }
    }

    pub(super) fn unmount(&mut self, resize: &mut dyn ResizeSource) {
        if let Some(id) = self.subscription.take() {
            resize.unsubscribe(id);
        }
    }

    /// Drains pending resize notifications, recomputing dimensions in place.
    pub(super) fn poll_resize(&mut self, resize: &mut dyn ResizeSource) {
        if let Some(id) = self.subscription
            && resize.take_resized(id)
        {
            self.read_dimensions(resize);
        }
    }

    fn read_dimensions(&mut self, resize: &dyn ResizeSource) {
        let (width, height) = resize.window_size();
        self.dimensions = ViewportDimensions {
            width,
            height: height - CHROME_HEIGHT,
        };
    }

    pub(super) fn has_selected_node(topology: &Topology, selected_node_id: Option<&str>) -> bool {
        selected_node_id.is_some_and(|id| !id.is_empty() && topology.contains(id))
    }

    pub(super) fn show(
        &mut self,
        ui: &mut Ui,
        topology: &mut Topology,
        selected_node_id: Option<&str>,
        colors: &dyn ColorMapper,
        dispatch: &mut dyn ActionDispatcher,
    ) -> ViewportResponse {
        // views for vanished nodes are dropped, resetting their hover state
        self.node_views.retain(|id, _| topology.contains(id));

        if topology.is_empty() {
            show_empty_topology(ui);
            return ViewportResponse::default();
        }

        let precision = layout_precision(topology.len());
        let has_selected = Self::has_selected_node(topology, selected_node_id);

        let (canvas, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.handle_zoom(ui, canvas, &response);
        self.handle_pan(&response);
        ui.painter_at(canvas)
            .rect_filled(canvas, 0.0, Color32::from_rgb(16, 20, 27));

        let placements = self.layout.place(&GridLayoutParams {
            topology,
            width: self.dimensions.width,
            height: self.dimensions.height,
            margins: CANVAS_MARGINS,
            layout_precision: precision,
            has_selected_node: has_selected,
            node_size: NODE_SIZE,
        });
        for (node, placement) in topology.nodes_mut().iter_mut().zip(&placements) {
            node.transform = *placement;
        }

        let params = RenderParams {
            scale_factor: NODE_SIZE,
            zoom_scale: self.zoom,
            node_scale: self.node_scale,
            selected_node_scale: self.selected_node_scale,
        };
        for node in topology.nodes() {
            let view = self.node_views.entry(node.id.clone()).or_default();
            let center = world_to_screen(canvas, self.pan, self.zoom, node.transform.translate);
            view.show(ui, node, center, params, colors, dispatch);
        }

        ViewportResponse {
            background_clicked: response.clicked(),
        }
    }

    fn handle_zoom(&mut self, ui: &Ui, canvas: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| canvas.center());
        let world_before = screen_to_world(canvas, self.pan, self.zoom, pointer);

        let zoom_step = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_step).clamp(0.2, 5.0);
        self.pan = pointer - canvas.left_top() - (world_before * self.zoom);
    }

    fn handle_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }
}

fn show_empty_topology(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("Nothing to show. This can have any of these reasons:");
        ui.add_space(8.0);
        for reason in EMPTY_TOPOLOGY_REASONS {
            ui.label(format!("\u{2022} {reason}"));
        }
    });
}

#[cfg(test)]
mod tests {
    use crate::topology::{Node, Placement};

    use super::super::grid::SquareGrid;
    use super::*;

    struct StubResize {
        size: (f32, f32),
        subscribed: Vec<SubscriptionId>,
        unsubscribed: Vec<SubscriptionId>,
        pending: HashMap<SubscriptionId, bool>,
        next_id: u64,
    }

    impl StubResize {
        fn new(width: f32, height: f32) -> Self {
            Self {
                size: (width, height),
                subscribed: Vec::new(),
                unsubscribed: Vec::new(),
                pending: HashMap::new(),
                next_id: 0,
            }
        }

        fn emit_resize(&mut self, width: f32, height: f32) {
            self.size = (width, height);
            for resized in self.pending.values_mut() {
                *resized = true;
            }
        }
    }

    impl ResizeSource for StubResize {
        fn subscribe(&mut self) -> SubscriptionId {
            let id = SubscriptionId(self.next_id);
            self.next_id += 1;
            self.subscribed.push(id);
            self.pending.insert(id, false);
            id
        }

        fn unsubscribe(&mut self, id: SubscriptionId) {
            self.unsubscribed.push(id);
            self.pending.remove(&id);
        }

        fn take_resized(&mut self, id: SubscriptionId) -> bool {
            self.pending
                .get_mut(&id)
                .map(std::mem::take)
                .unwrap_or(false)
        }

        fn window_size(&self) -> (f32, f32) {
            self.size
        }
    }

    fn viewport() -> TopologyViewport {
        TopologyViewport::new(Box::new(SquareGrid::new()))
    }

    fn node(id: &str) -> Node {
        Node {
            id: id.to_owned(),
            label: id.to_owned(),
            sub_label: String::new(),
            shape: "circle".to_owned(),
            stack: false,
            rank: None,
            pseudo: false,
            highlighted: false,
            blurred: false,
            focused: false,
            transform: Placement::default(),
        }
    }

    #[test]
    fn mount_subscribes_once_and_reads_dimensions() {
        let mut resize = StubResize::new(1280.0, 1024.0);
        let mut viewport = viewport();

        viewport.mount(&mut resize);
        viewport.mount(&mut resize);

        assert_eq!(resize.subscribed.len(), 1);
        assert_eq!(
            viewport.dimensions(),
            ViewportDimensions {
                width: 1280.0,
                height: 1024.0 - CHROME_HEIGHT,
            }
        );
    }

    #[test]
    fn unmount_releases_exactly_the_held_subscription() {
        let mut resize = StubResize::new(800.0, 600.0);
        let mut viewport = viewport();

        viewport.unmount(&mut resize);
        assert!(resize.unsubscribed.is_empty());

        viewport.mount(&mut resize);
        viewport.unmount(&mut resize);
        viewport.unmount(&mut resize);

        assert_eq!(resize.subscribed, resize.unsubscribed);
    }

    #[test]
    fn subscription_stays_symmetric_across_mount_cycles() {
        let mut resize = StubResize::new(800.0, 600.0);
        let mut viewport = viewport();

        for _ in 0..3 {
            viewport.mount(&mut resize);
            viewport.unmount(&mut resize);
        }

        assert_eq!(resize.subscribed.len(), 3);
        assert_eq!(resize.subscribed, resize.unsubscribed);
        assert!(resize.pending.is_empty());
    }

    #[test]
    fn resize_notification_recomputes_dimensions() {
        let mut resize = StubResize::new(1280.0, 1024.0);
        let mut viewport = viewport();
        viewport.mount(&mut resize);

        resize.emit_resize(1920.0, 1200.0);
        viewport.poll_resize(&mut resize);
        assert_eq!(
            viewport.dimensions(),
            ViewportDimensions {
                width: 1920.0,
                height: 1200.0 - CHROME_HEIGHT,
            }
        );

        // no further notification, no further change
        resize.size = (640.0, 480.0);
        viewport.poll_resize(&mut resize);
        assert_eq!(viewport.dimensions().width, 1920.0);
    }

    #[test]
    fn has_selected_node_requires_a_present_non_empty_id() {
        let topology = Topology::from_nodes(vec![node("n1"), node("n2")]).unwrap();

        assert!(TopologyViewport::has_selected_node(&topology, Some("n1")));
        assert!(!TopologyViewport::has_selected_node(&topology, Some("n9")));
        assert!(!TopologyViewport::has_selected_node(&topology, Some("")));
        assert!(!TopologyViewport::has_selected_node(&topology, None));

        let empty = Topology::default();
        assert!(!TopologyViewport::has_selected_node(&empty, Some("n1")));
    }
}
