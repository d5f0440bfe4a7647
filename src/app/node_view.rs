use eframe::egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2, pos2};

use crate::topology::Node;

use super::label::ellipsis;
use super::render_utils::{ColorMapper, fade_color};
use super::shape::{ShapeRenderer, UnknownShapeError, resolve};

pub(super) const LABEL_FONT_SIZE: f32 = 14.0;
pub(super) const SUB_LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_OFFSET_Y: f32 = 18.0;
const SUB_LABEL_OFFSET_Y: f32 = 35.0;

/// Linear glyph scale. The viewport carries two of these so the focused-node
/// scale can be tuned independently of the resting one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Scale {
    pub pixels_per_unit: f32,
}

impl Scale {
    pub(super) fn apply(self, value: f32) -> f32 {
        value * self.pixels_per_unit
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct RenderParams {
    pub scale_factor: f32,
    pub zoom_scale: f32,
    pub node_scale: Scale,
    pub selected_node_scale: Scale,
}

/// External action dispatcher: fire-and-forget interaction notifications.
pub(super) trait ActionDispatcher {
    fn click_node(&mut self, id: &str, label: &str, bounds: Rect);
    fn enter_node(&mut self, id: &str);
    fn leave_node(&mut self, id: &str);
}

/// Visual attributes derived from one node for one render, in world units
/// (pre-camera-zoom).
#[derive(Clone, Debug, PartialEq)]
pub(super) struct NodeVisual {
    pub color: Color32,
    pub size: f32,
    pub label: String,
    pub sub_label: String,
    pub label_font: f32,
    pub sub_label_font: f32,
    pub label_offset: f32,
    pub sub_label_offset: f32,
    pub renderer: ShapeRenderer,
}

/// What actually gets painted: the camera zoom scales the whole glyph group,
/// so the focused-node text (pre-divided by the zoom in `derive_visual`)
/// cancels out to a constant on-screen size while everything else zooms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ScreenMetrics {
    pub size: f32,
    pub label_font: f32,
    pub sub_label_font: f32,
    pub label_offset: f32,
    pub sub_label_offset: f32,
}

impl NodeVisual {
    pub(super) fn screen_metrics(&self, zoom_scale: f32) -> ScreenMetrics {
        ScreenMetrics {
            size: self.size * zoom_scale,
            label_font: self.label_font * zoom_scale,
            sub_label_font: self.sub_label_font * zoom_scale,
            label_offset: self.label_offset * zoom_scale,
            sub_label_offset: self.sub_label_offset * zoom_scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct VisualInputs {
    node: Node,
    hovered: bool,
    params: RenderParams,
}

/// One interactive node glyph: owns the hover state and memoizes the derived
/// visual attributes behind a shallow input comparison, since every store
/// update re-evaluates hundreds of these.
#[derive(Default)]
pub(super) struct NodeView {
    hovered: bool,
    memo: Option<(VisualInputs, Result<NodeVisual, UnknownShapeError>)>,
    recompute_count: u64,
}

impl NodeView {
    pub(super) fn hovered(&self) -> bool {
        self.hovered
    }

    /// Derives (or replays) the visual attributes for the current inputs.
    /// An unknown shape is fatal for this node's render and is memoized like
    /// any other outcome, so it is reported once, not retried.
    pub(super) fn visual(
        &mut self,
        node: &Node,
        params: RenderParams,
        colors: &dyn ColorMapper,
    ) -> Result<NodeVisual, UnknownShapeError> {
        let inputs = VisualInputs {
            node: node.clone(),
            hovered: self.hovered,
            params,
        };

        if let Some((previous, outcome)) = &self.memo
            && *previous == inputs
        {
            return outcome.clone();
        }

        let outcome = derive_visual(&inputs.node, self.hovered, params, colors);
        if let Err(error) = &outcome {
            log::warn!("node {} cannot render: {error}", node.id);
        }
        self.recompute_count += 1;
        self.memo = Some((inputs, outcome.clone()));
        outcome
    }

    /// Applies one frame of pointer input. Enter/leave each fire exactly once
    /// per transition; a click is consumed here (returns true) so the viewport
    /// background never also treats it as a canvas click.
    pub(super) fn handle_pointer(
        &mut self,
        node: &Node,
        bounds: Rect,
        pointer_inside: bool,
        clicked: bool,
        dispatch: &mut dyn ActionDispatcher,
    ) -> bool {
        if pointer_inside && !self.hovered {
            self.hovered = true;
            dispatch.enter_node(&node.id);
        } else if !pointer_inside && self.hovered {
            self.hovered = false;
            dispatch.leave_node(&node.id);
        }

        if clicked {
            dispatch.click_node(&node.id, &node.label, bounds);
            return true;
        }

        false
    }

    pub(super) fn show(
        &mut self,
        ui: &mut Ui,
        node: &Node,
        center: Pos2,
        params: RenderParams,
        colors: &dyn ColorMapper,
        dispatch: &mut dyn ActionDispatcher,
    ) {
        // interaction first so this frame draws with the fresh hover state
        let probe = probe_rect(node, center, params);
        let response = ui.interact(probe, ui.id().with(&node.id), Sense::click());
        self.handle_pointer(node, probe, response.hovered(), response.clicked(), dispatch);

        let painter = ui.painter();
        let visual = match self.visual(node, params, colors) {
            Ok(visual) => visual,
            Err(_) => {
                painter.circle(
                    center,
                    10.0,
                    Color32::TRANSPARENT,
                    Stroke::new(1.5, Color32::from_rgb(220, 80, 80)),
                );
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    "?",
                    FontId::proportional(SUB_LABEL_FONT_SIZE),
                    Color32::from_rgb(220, 80, 80),
                );
                return;
            }
        };

        let metrics = visual.screen_metrics(params.zoom_scale);
        let fill = if node.blurred {
            fade_color(visual.color, 0.35)
        } else {
            visual.color
        };
        let stroke = if node.highlighted || self.hovered {
            Stroke::new(2.5, Color32::from_gray(230))
        } else {
            Stroke::new(1.2, Color32::from_rgba_unmultiplied(12, 14, 18, 200))
        };
        visual.renderer.draw(painter, center, metrics.size, fill, stroke);

        let half = metrics.size * 0.5;
        let text_color = if node.blurred {
            Color32::from_gray(120)
        } else {
            Color32::from_gray(235)
        };
        painter.text(
            pos2(center.x, center.y + half + metrics.label_offset),
            Align2::CENTER_BOTTOM,
            &visual.label,
            FontId::proportional(metrics.label_font),
            text_color,
        );
        if !visual.sub_label.is_empty() {
            painter.text(
                pos2(center.x, center.y + half + metrics.sub_label_offset),
                Align2::CENTER_BOTTOM,
                &visual.sub_label,
                FontId::proportional(metrics.sub_label_font),
                fade_color(text_color, 0.7),
            );
        }
    }
}

/// Interaction rect for the glyph: tracks the scale the glyph is drawn at,
/// including the focus-selected scale and the camera zoom.
fn probe_rect(node: &Node, center: Pos2, params: RenderParams) -> Rect {
    let scale = if node.focused {
        params.selected_node_scale
    } else {
        params.node_scale
    };
    Rect::from_center_size(
        center,
        Vec2::splat(scale.apply(params.scale_factor) * params.zoom_scale),
    )
}

fn derive_visual(
    node: &Node,
    hovered: bool,
    params: RenderParams,
    colors: &dyn ColorMapper,
) -> Result<NodeVisual, UnknownShapeError> {
    let renderer = resolve(&node.shape, node.stack)?;
    let color = colors.node_color(node.rank.as_deref(), &node.label, node.pseudo);

    let scale = if node.focused {
        params.selected_node_scale
    } else {
        params.node_scale
    };
    let size = scale.apply(params.scale_factor);

    let truncate = !node.focused && !hovered;
    let width_budget = params.node_scale.apply(4.0 * params.scale_factor);
    let (label, sub_label) = if truncate {
        (
            ellipsis(&node.label, LABEL_FONT_SIZE, width_budget).into_owned(),
            ellipsis(&node.sub_label, SUB_LABEL_FONT_SIZE, width_budget).into_owned(),
        )
    } else {
        (node.label.clone(), node.sub_label.clone())
    };

    let mut label_font = LABEL_FONT_SIZE;
    let mut sub_label_font = SUB_LABEL_FONT_SIZE;
    let mut label_offset = LABEL_OFFSET_Y;
    let mut sub_label_offset = SUB_LABEL_OFFSET_Y;

    // focused text stays constant-sized on screen regardless of camera zoom
    if node.focused {
        label_font /= params.zoom_scale;
        sub_label_font /= params.zoom_scale;
        label_offset /= params.zoom_scale;
        sub_label_offset /= params.zoom_scale;
    }

    Ok(NodeVisual {
        color,
        size,
        label,
        sub_label,
        label_font,
        sub_label_font,
        label_offset,
        sub_label_offset,
        renderer,
    })
}
