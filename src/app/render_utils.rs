use eframe::egui::{Color32, Pos2, Rect, Vec2};

use crate::util::stable_unit;

/// External color mapper contract: pure derivation of a node color from its
/// rank, label, and pseudo flag.
pub(super) trait ColorMapper {
    fn node_color(&self, rank: Option<&str>, label: &str, pseudo: bool) -> Color32;
}

/// Default mapper: hashes the rank (falling back to the label) to a hue so
/// nodes of the same rank share a color across renders and probes. Pseudo
/// nodes are neutral grey since they stand for aggregates, not real entities.
pub(super) struct HueColorMapper;

impl ColorMapper for HueColorMapper {
    fn node_color(&self, rank: Option<&str>, label: &str, pseudo: bool) -> Color32 {
        if pseudo {
            return Color32::from_gray(125);
        }

        let key = rank.filter(|value| !value.is_empty()).unwrap_or(label);
        hsv_color(stable_unit(key), 0.55, 0.82)
    }
}

fn hsv_color(hue: f32, saturation: f32, value: f32) -> Color32 {
    let sector = (hue.clamp(0.0, 0.9999) * 6.0).floor();
    let fraction = hue * 6.0 - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - fraction * saturation);
    let t = value * (1.0 - (1.0 - fraction) * saturation);

    let (r, g, b) = match sector as u32 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    Color32::from_rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

pub(super) fn fade_color(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn world_to_screen(canvas: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    canvas.left_top() + pan + world * zoom
}

pub(super) fn screen_to_world(canvas: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - canvas.left_top() - pan) / zoom
}
