use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn stable_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Maps a string to a stable value in `[0, 1)`.
pub fn stable_unit(text: &str) -> f32 {
    ((stable_hash(text) & 0xffff_ffff) as f64 / (u64::from(u32::MAX) + 1) as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_unit_is_deterministic_and_bounded() {
        for text in ["", "nginx", "host-42", "internet"] {
            let value = stable_unit(text);
            assert_eq!(value, stable_unit(text));
            assert!((0.0..1.0).contains(&value));
        }
    }
}
