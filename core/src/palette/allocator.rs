use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate hues are scanned at this step when allocating a new color.
const HUE_STEP: f32 = 10.0;

/// Fixed saturation and lightness; hex is always derivable from hue alone.
const SATURATION: f32 = 0.70;
const LIGHTNESS: f32 = 0.50;

/// Color assigned to one class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassColorEntry {
    pub hue: f32,
    pub hex: String,
}

impl ClassColorEntry {
    pub fn from_hue(hue: f32) -> Self {
        let hue = hue.rem_euclid(360.0);
        Self {
            hex: hue_to_hex(hue),
            hue,
        }
    }
}

fn circular_distance(a: f32, b: f32) -> f32 {
    let diff = (a - b).abs() % 360.0;
    diff.min(360.0 - diff)
}

/// Picks the candidate hue with the greatest minimum circular distance to
/// every existing hue. With nothing assigned yet, any hue is valid.
pub fn allocate_hue(existing: &[f32]) -> f32 {
    if existing.is_empty() {
        return 0.0;
    }
    let mut best_hue = 0.0;
    let mut best_distance = -1.0;
    let mut candidate = 0.0;
    while candidate < 360.0 {
        let distance = existing
            .iter()
            .map(|&hue| circular_distance(candidate, hue))
            .fold(f32::INFINITY, f32::min);
        if distance > best_distance {
            best_distance = distance;
            best_hue = candidate;
        }
        candidate += HUE_STEP;
    }
    best_hue
}

/// Fixed HSL(h, 70%, 50%) to RGB hex conversion.
pub fn hue_to_hex(hue: f32) -> String {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (1.0 - (2.0 * LIGHTNESS - 1.0).abs()) * SATURATION;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = LIGHTNESS - c / 2.0;
    let to_byte = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", to_byte(r), to_byte(g), to_byte(b))
}

/// Deterministic distinct-hue assignment for observed class labels.
///
/// A label keeps its color for the lifetime of the job; only an explicit
/// override replaces it. The revision counter lets renderers detect palette
/// changes without comparing entries.
#[derive(Debug, Clone, Default)]
pub struct ColorAllocator {
    entries: BTreeMap<String, ClassColorEntry>,
    revision: u64,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a color at first observation; later calls return the
    /// existing entry untouched.
    pub fn ensure(&mut self, label: &str) -> &ClassColorEntry {
        if !self.entries.contains_key(label) {
            let existing: Vec<f32> = self.entries.values().map(|entry| entry.hue).collect();
            let entry = ClassColorEntry::from_hue(allocate_hue(&existing));
            self.entries.insert(label.to_string(), entry);
            self.revision += 1;
        }
        &self.entries[label]
    }

    /// Explicit user override; the only path that replaces an assignment.
    pub fn set_override(&mut self, label: &str, hue: f32) {
        self.entries
            .insert(label.to_string(), ClassColorEntry::from_hue(hue));
        self.revision += 1;
    }

    pub fn get(&self, label: &str) -> Option<&ClassColorEntry> {
        self.entries.get(label)
    }

    pub fn hex_of(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(|entry| entry.hex.as_str())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClassColorEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_to_hex_is_pure_and_deterministic() {
        assert_eq!(hue_to_hex(0.0), hue_to_hex(0.0));
        assert_eq!(hue_to_hex(0.0), hue_to_hex(360.0));
        assert_eq!(hue_to_hex(0.0), "#d92626");
    }

    #[test]
    fn allocation_maximizes_minimum_circular_distance() {
        let hue = allocate_hue(&[0.0]);
        assert_eq!(hue, 180.0);

        let hue = allocate_hue(&[0.0, 180.0]);
        let distance = [0.0f32, 180.0]
            .iter()
            .map(|&existing| circular_distance(hue, existing))
            .fold(f32::INFINITY, f32::min);
        assert!((distance - 90.0).abs() < HUE_STEP);
    }

    #[test]
    fn circular_distance_wraps_around_zero() {
        assert_eq!(circular_distance(350.0, 10.0), 20.0);
    }

    #[test]
    fn label_colors_are_stable_once_assigned() {
        let mut allocator = ColorAllocator::new();
        let first = allocator.ensure("person").clone();
        allocator.ensure("car");
        allocator.ensure("person");
        assert_eq!(allocator.get("person"), Some(&first));
    }

    #[test]
    fn override_replaces_and_persists() {
        let mut allocator = ColorAllocator::new();
        allocator.ensure("person");
        allocator.set_override("person", 120.0);
        allocator.ensure("person");
        assert_eq!(allocator.get("person").unwrap().hue, 120.0);
    }

    #[test]
    fn revision_advances_only_on_changes() {
        let mut allocator = ColorAllocator::new();
        assert_eq!(allocator.revision(), 0);
        allocator.ensure("person");
        let after_assign = allocator.revision();
        allocator.ensure("person");
        assert_eq!(allocator.revision(), after_assign);
        allocator.set_override("person", 200.0);
        assert!(allocator.revision() > after_assign);
    }

    #[test]
    fn distinct_labels_receive_distinct_hues() {
        let mut allocator = ColorAllocator::new();
        for label in ["person", "car", "truck", "boat", "bench"] {
            allocator.ensure(label);
        }
        let hues: Vec<f32> = allocator.iter().map(|(_, entry)| entry.hue).collect();
        for (i, a) in hues.iter().enumerate() {
            for b in hues.iter().skip(i + 1) {
                assert!(circular_distance(*a, *b) >= HUE_STEP);
            }
        }
    }
}
