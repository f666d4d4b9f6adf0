//! Compound highlight key composition.
//!
//! # Invariants
//! - `JOIN_TOKEN` never occurs in a natural (base) id, so a composed key can
//!   not collide with one.
//! - Keys are only composed and compared, never parsed back.

use crate::model::signal::Axis;

/// Reserved separator between a base id and its suffix.
pub const JOIN_TOKEN: &str = "___";

const CROSSHAIR_X: &str = "Crosshair_X";
const CROSSHAIR_Y: &str = "Crosshair_Y";

/// Joins `base_id` and `suffix` into one key.
pub fn compose(base_id: &str, suffix: &str) -> String {
    format!("{base_id}{JOIN_TOKEN}{suffix}")
}

/// Whether `id` is usable as a base id.
pub fn is_reserved_free(id: &str) -> bool {
    !id.contains(JOIN_TOKEN)
}

/// Key of the crosshair drawn for a 2D signal on `axis`.
pub fn crosshair_key(signal_id: &str, axis: Axis) -> String {
    let suffix = match axis {
        Axis::X => CROSSHAIR_X,
        Axis::Y => CROSSHAIR_Y,
    };
    compose(signal_id, suffix)
}

/// Key of an entity restricted to one axis.
pub fn axis_key(entity_id: &str, axis: Axis) -> String {
    compose(entity_id, axis.as_str())
}
