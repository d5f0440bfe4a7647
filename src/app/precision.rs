/// Coordinate-rounding precision (decimal places) for the layout engine,
/// chosen from the topology size.
///
/// Sub-pixel jitter from layout recomputation is invisible on dense graphs but
/// jarring on sparse ones, so precision drops as the node count grows.
pub(super) fn layout_precision(node_count: usize) -> u8 {
    if node_count >= 50 {
        0
    } else if node_count > 20 {
        1
    } else if node_count > 10 {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_buckets_follow_topology_size() {
        assert_eq!(layout_precision(0), 3);
        assert_eq!(layout_precision(9), 3);
        assert_eq!(layout_precision(10), 3);
        assert_eq!(layout_precision(11), 2);
        assert_eq!(layout_precision(20), 2);
        assert_eq!(layout_precision(21), 1);
        assert_eq!(layout_precision(49), 1);
        assert_eq!(layout_precision(50), 0);
        assert_eq!(layout_precision(51), 0);
    }

    #[test]
    fn precision_never_increases_with_node_count() {
        let mut previous = layout_precision(0);
        for count in 1..200 {
            let current = layout_precision(count);
            assert!(current <= previous, "precision rose at {count} nodes");
            previous = current;
        }
    }
}
