use std::collections::HashMap;

use eframe::egui::vec2;

use crate::topology::{Placement, Topology};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Margins {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
}

pub(super) const CANVAS_MARGINS: Margins = Margins {
    top: 130.0,
    left: 40.0,
    right: 40.0,
    bottom: 0.0,
};

/// Everything the viewport hands to the layout collaborator for one frame.
pub(super) struct GridLayoutParams<'a> {
    pub topology: &'a Topology,
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
    pub layout_precision: u8,
    pub has_selected_node: bool,
    pub node_size: f32,
}

/// The external grid/layout engine boundary. Returns one placement per node,
/// index-aligned with `topology.nodes()`.
pub(super) trait GridLayoutEngine {
    fn place(&mut self, params: &GridLayoutParams<'_>) -> Vec<Placement>;
}

/// Bundled reference engine: a deterministic row-major grid.
///
/// Node order is sorted by label, but frozen while a node is selected so the
/// selected glyph (and the popover anchored to it) cannot jump under the
/// cursor when labels churn between reports. Columns are driven by the usable
/// width; when the resulting rows would run past the usable height, the row
/// pitch compresses so every cell stays inside the viewport.
#[derive(Default)]
pub(super) struct SquareGrid {
    frozen_order: Option<Vec<String>>,
}

impl SquareGrid {
    pub(super) fn new() -> Self {
        Self::default()
    }
}

impl GridLayoutEngine for SquareGrid {
    fn place(&mut self, params: &GridLayoutParams<'_>) -> Vec<Placement> {
        let count = params.topology.len();
        let order = match (&self.frozen_order, params.has_selected_node) {
            (Some(frozen), true)
                if frozen.len() == count
                    && frozen.iter().all(|id| params.topology.contains(id)) =>
            {
                frozen.clone()
            }
            _ => {
                let mut entries: Vec<(String, String)> = params
                    .topology
                    .nodes()
                    .iter()
                    .map(|node| (node.label.clone(), node.id.clone()))
                    .collect();
                entries.sort();
                entries.into_iter().map(|(_, id)| id).collect()
            }
        };
        self.frozen_order = Some(order.clone());

        let cell = params.node_size * 4.0;
        let usable_width = (params.width - params.margins.left - params.margins.right).max(cell);
        let columns = ((usable_width / cell).floor() as usize).max(1);

        let rows = count.div_ceil(columns).max(1);
        let usable_height = (params.height - params.margins.top - params.margins.bottom).max(cell);
        let row_pitch = if rows as f32 * cell > usable_height {
            usable_height / rows as f32
        } else {
            cell
        };

        let mut by_id: HashMap<String, Placement> = order
            .into_iter()
            .enumerate()
            .map(|(slot, id)| {
                let column = slot % columns;
                let row = slot / columns;
                let x = params.margins.left + (column as f32 + 0.5) * cell;
                let y = params.margins.top + (row as f32 + 0.5) * row_pitch;
                let placement = Placement {
                    translate: vec2(
                        round_to(x, params.layout_precision),
                        round_to(y, params.layout_precision),
                    ),
                    scale: 1.0,
                };
                (id, placement)
            })
            .collect();

        params
            .topology
            .nodes()
            .iter()
            .map(|node| by_id.remove(node.id.as_str()).unwrap_or_default())
            .collect()
    }
}

fn round_to(value: f32, precision: u8) -> f32 {
    let factor = 10_f32.powi(i32::from(precision));
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use crate::topology::Node;

    use super::*;

    fn node(id: &str, label: &str) -> Node {
        Node {
            id: id.to_owned(),
            label: label.to_owned(),
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

    fn params(topology: &Topology, precision: u8, has_selected: bool) -> GridLayoutParams<'_> {
        GridLayoutParams {
            topology,
            width: 1280.0,
            height: 760.0,
            margins: CANVAS_MARGINS,
            layout_precision: precision,
            has_selected_node: has_selected,
            node_size: 24.0,
        }
    }

    #[test]
    fn rounding_follows_the_precision_bucket() {
        assert_eq!(round_to(123.4567, 0), 123.0);
        assert_eq!(round_to(123.4567, 1), 123.5);
        assert_eq!(round_to(123.4567, 2), 123.46);
        assert_eq!(round_to(123.4567, 3), 123.457);
    }

    #[test]
    fn placements_are_label_ordered_and_inside_margins() {
        let topology = Topology::from_nodes(vec![
            node("n3", "charlie"),
            node("n1", "alpha"),
            node("n2", "bravo"),
        ])
        .unwrap();

        let placements = SquareGrid::new().place(&params(&topology, 3, false));
        assert_eq!(placements.len(), 3);

        // alpha (n1) takes the first cell even though it is listed second
        let first_cell = vec2(CANVAS_MARGINS.left + 48.0, CANVAS_MARGINS.top + 48.0);
        assert_eq!(placements[1].translate, first_cell);

        for placement in &placements {
            assert!(placement.translate.x >= CANVAS_MARGINS.left);
            assert!(placement.translate.y >= CANVAS_MARGINS.top);
            assert_eq!(placement.scale, 1.0);
        }
    }

    #[test]
    fn coarse_precision_yields_integer_coordinates() {
        let nodes = (0..60)
            .map(|index| node(&format!("n{index}"), &format!("node-{index:02}")))
            .collect();
        let topology = Topology::from_nodes(nodes).unwrap();

        let placements = SquareGrid::new().place(&params(&topology, 0, false));
        for placement in placements {
            assert_eq!(placement.translate.x.fract(), 0.0);
            assert_eq!(placement.translate.y.fract(), 0.0);
        }
    }

    #[test]
    fn rows_compress_to_fit_the_viewport_height() {
        let nodes = (0..60)
            .map(|index| node(&format!("n{index}"), &format!("node-{index:02}")))
            .collect();
        let topology = Topology::from_nodes(nodes).unwrap();

        // 60 nodes over 12 columns need 5 rows of 96px; only 270px fit
        let mut short = params(&topology, 3, false);
        short.height = 400.0;
        let placements = SquareGrid::new().place(&short);
        for placement in &placements {
            assert!(placement.translate.y >= CANVAS_MARGINS.top);
            assert!(placement.translate.y <= short.height - CANVAS_MARGINS.bottom);
        }

        // a tall viewport keeps the square pitch
        let tall = params(&topology, 3, false);
        let relaxed = SquareGrid::new().place(&tall);
        let row_gap = relaxed[12].translate.y - relaxed[0].translate.y;
        assert_eq!(row_gap, 96.0);
    }

    #[test]
    fn order_is_frozen_while_a_node_is_selected() {
        let mut engine = SquareGrid::new();
        let topology = Topology::from_nodes(vec![node("n1", "alpha"), node("n2", "bravo")]).unwrap();
        let before = engine.place(&params(&topology, 3, false));

        // relabeling would swap the sort order, but the selection pins it
        let relabeled =
            Topology::from_nodes(vec![node("n1", "zulu"), node("n2", "bravo")]).unwrap();
        let pinned = engine.place(&params(&relabeled, 3, true));
        assert_eq!(pinned, before);

        // once the selection clears, the order resorts
        let resorted = engine.place(&params(&relabeled, 3, false));
        assert_eq!(resorted[0].translate, before[1].translate);
        assert_eq!(resorted[1].translate, before[0].translate);
    }
}
