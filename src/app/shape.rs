use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    Color32, Painter, Pos2, Rect, Shape as PaintShape, Stroke, StrokeKind, Vec2, pos2, vec2,
};
use thiserror::Error;

use super::render_utils::fade_color;

/// The closed set of glyph shapes a node can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ShapeVariant {
    Circle,
    Hexagon,
    Heptagon,
    RoundedSquare,
    Cloud,
}

/// A shape identifier outside the known set. Fatal for that node's render;
/// deliberately not defaulted so bad topology data surfaces immediately.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown node shape {0:?}")]
pub(super) struct UnknownShapeError(pub String);

/// Resolves a shape identifier (plus the stacking flag) to a renderer.
/// Pure lookup; the stack decorator wraps every variant the same way.
pub(super) fn resolve(shape_id: &str, stacked: bool) -> Result<ShapeRenderer, UnknownShapeError> {
    let variant = match shape_id {
        "circle" => ShapeVariant::Circle,
        "hexagon" => ShapeVariant::Hexagon,
        "heptagon" => ShapeVariant::Heptagon,
        "square" => ShapeVariant::RoundedSquare,
        "cloud" => ShapeVariant::Cloud,
        other => return Err(UnknownShapeError(other.to_owned())),
    };

    Ok(ShapeRenderer { variant, stacked })
}

const STACK_LAYERS: usize = 3;
const STACK_STEP_RATIO: f32 = 0.14;

/// Resolved drawing capability for one node glyph.
///
/// Geometry is exposed separately from painting so the stacking decorator is
/// testable without a backend: a stacked renderer yields the base layer plus
/// offset copies of the identical path, with size and color untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct ShapeRenderer {
    variant: ShapeVariant,
    stacked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) enum GlyphPath {
    Circle { center: Pos2, radius: f32 },
    Polygon { points: Vec<Pos2> },
    RoundedRect { rect: Rect, rounding: f32 },
    Lobes { circles: Vec<(Pos2, f32)> },
}

impl ShapeRenderer {
    pub(super) fn variant(self) -> ShapeVariant {
        self.variant
    }

    pub(super) fn is_stacked(self) -> bool {
        self.stacked
    }

    /// Back-to-front glyph layers. A plain renderer has exactly one; a stacked
    /// one repeats the same path shifted upward per layer.
    pub(super) fn layers(self, center: Pos2, size: f32) -> Vec<GlyphPath> {
        if !self.stacked {
            return vec![base_path(self.variant, center, size)];
        }

        (0..STACK_LAYERS)
            .rev()
            .map(|layer| {
                let offset = vec2(0.0, -(layer as f32) * size * STACK_STEP_RATIO);
                base_path(self.variant, center + offset, size)
            })
            .collect()
    }

    pub(super) fn draw(self, painter: &Painter, center: Pos2, size: f32, fill: Color32, stroke: Stroke) {
        let layers = self.layers(center, size);
        let front = layers.len() - 1;
        for (index, path) in layers.iter().enumerate() {
            // back layers keep the glyph geometry but recede visually
            let layer_fill = if index == front {
                fill
            } else {
                fade_color(fill, 0.45)
            };
            draw_path(painter, path, layer_fill, stroke);
        }
    }
}

fn base_path(variant: ShapeVariant, center: Pos2, size: f32) -> GlyphPath {
    let radius = size * 0.5;
    match variant {
        ShapeVariant::Circle => GlyphPath::Circle { center, radius },
        ShapeVariant::Hexagon => GlyphPath::Polygon {
            points: regular_polygon(center, radius, 6),
        },
        ShapeVariant::Heptagon => GlyphPath::Polygon {
            points: regular_polygon(center, radius, 7),
        },
        ShapeVariant::RoundedSquare => GlyphPath::RoundedRect {
            rect: Rect::from_center_size(center, Vec2::splat(size)),
            rounding: size * 0.12,
        },
        ShapeVariant::Cloud => GlyphPath::Lobes {
            circles: vec![
                (center + vec2(-0.18, 0.06) * size, radius * 0.46),
                (center + vec2(0.0, -0.10) * size, radius * 0.58),
                (center + vec2(0.20, 0.06) * size, radius * 0.42),
            ],
        },
    }
}

fn regular_polygon(center: Pos2, radius: f32, sides: usize) -> Vec<Pos2> {
    (0..sides)
        .map(|corner| {
            let angle = TAU * (corner as f32 / sides as f32) - FRAC_PI_2;
            pos2(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

fn draw_path(painter: &Painter, path: &GlyphPath, fill: Color32, stroke: Stroke) {
    match path {
        GlyphPath::Circle { center, radius } => {
            painter.circle(*center, *radius, fill, stroke);
        }
        GlyphPath::Polygon { points } => {
            painter.add(PaintShape::convex_polygon(points.clone(), fill, stroke));
        }
        GlyphPath::RoundedRect { rect, rounding } => {
            painter.rect_filled(*rect, *rounding, fill);
            painter.rect_stroke(*rect, *rounding, stroke, StrokeKind::Middle);
        }
        GlyphPath::Lobes { circles } => {
            for (lobe_center, lobe_radius) in circles {
                painter.circle(*lobe_center, *lobe_radius, fill, stroke);
            }
        }
    }
}
