//! Named-field form of the feature vector and its ordered serialization.

/// Total feature vector width consumed by the policy network.
pub const FEATURE_LEN: usize = 56;
/// Width of the self-state group at `[0..12)`.
pub const SELF_STATE_LEN: usize = 12;
/// Number of enemy slots in the `[12..36)` group.
pub const ENEMY_SLOTS: usize = 4;
/// Values per enemy slot.
pub const ENEMY_SLOT_LEN: usize = 6;
/// Reserved navigation group width at `[36..48)`.
pub const NAVIGATION_LEN: usize = 12;
/// Reserved pickup group width at `[48..56)`.
pub const PICKUP_LEN: usize = 8;

/// Normalized self state, `[0..12)` of the feature vector.
///
/// `reserved` is the twelfth slot of the self-state group. The recorder
/// exposes eleven self-state measurements, but the group is declared twelve
/// wide by the runtime consumer, so the last slot stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelfState {
    pub health: f32,
    pub armor: f32,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub weapon_id: f32,
    pub ammo: f32,
    pub on_ground: f32,
    pub reserved: f32,
}

/// One encoded enemy slot.
///
/// An empty slot is all zeros (the default), including the angle cosines, so
/// padding is distinguishable from a real enemy dead-ahead at zero range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnemySlot {
    /// `1 - min(distance / max_distance, 1)`; closer enemies score higher.
    pub proximity: f32,
    pub horizontal_cos: f32,
    pub horizontal_sin: f32,
    pub vertical_cos: f32,
    pub vertical_sin: f32,
    pub health: f32,
}

/// The full feature vector in named-field form.
///
/// [`FeatureSchema::to_array`] is the single definition of the array layout;
/// no other code may assume positions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureSchema {
    pub self_state: SelfState,
    /// Slots fill in recorder output order, extras past four truncated.
    /// Encounter order rather than distance order is deliberate fidelity to
    /// the runtime extractor.
    pub enemies: [EnemySlot; ENEMY_SLOTS],
    /// Placeholder until waypoint integration lands; always zero.
    pub navigation: [f32; NAVIGATION_LEN],
    /// Placeholder until entity scanning lands; always zero.
    pub pickups: [f32; PICKUP_LEN],
}

impl FeatureSchema {
    /// Serializes the schema into the flat array form the network consumes.
    #[must_use]
    pub fn to_array(&self) -> [f32; FEATURE_LEN] {
        let mut out = [0.0; FEATURE_LEN];
        let mut i = 0;
        let mut push = |v: f32| {
            out[i] = v;
            i += 1;
        };

        let s = &self.self_state;
        push(s.health);
        push(s.armor);
        for v in s.position {
            push(v);
        }
        for v in s.velocity {
            push(v);
        }
        push(s.weapon_id);
        push(s.ammo);
        push(s.on_ground);
        push(s.reserved);

        for slot in &self.enemies {
            push(slot.proximity);
            push(slot.horizontal_cos);
            push(slot.horizontal_sin);
            push(slot.vertical_cos);
            push(slot.vertical_sin);
            push(slot.health);
        }

        for v in self.navigation {
            push(v);
        }
        for v in self.pickups {
            push(v);
        }

        debug_assert_eq!(i, FEATURE_LEN);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_widths_sum_to_feature_len() {
        assert_eq!(
            SELF_STATE_LEN + ENEMY_SLOTS * ENEMY_SLOT_LEN + NAVIGATION_LEN + PICKUP_LEN,
            FEATURE_LEN
        );
    }

    #[test]
    fn test_serialization_order_is_fixed() {
        let mut schema = FeatureSchema::default();
        schema.self_state.health = 0.5;
        schema.self_state.armor = 0.25;
        schema.self_state.position = [0.1, 0.2, 0.3];
        schema.self_state.on_ground = 1.0;
        schema.enemies[0].proximity = 0.9;
        schema.enemies[3].health = 0.7;
        schema.navigation[0] = 0.0;
        schema.pickups[PICKUP_LEN - 1] = 0.0;

        let array = schema.to_array();
        assert_eq!(array.len(), FEATURE_LEN);
        assert_eq!(array[0], 0.5);
        assert_eq!(array[1], 0.25);
        assert_eq!(array[2..5], [0.1, 0.2, 0.3]);
        assert_eq!(array[10], 1.0);
        // Reserved twelfth self-state slot.
        assert_eq!(array[11], 0.0);
        // First enemy slot starts right after the self-state group.
        assert_eq!(array[SELF_STATE_LEN], 0.9);
        // Last value of the fourth enemy slot.
        assert_eq!(array[SELF_STATE_LEN + ENEMY_SLOTS * ENEMY_SLOT_LEN - 1], 0.7);
    }

    #[test]
    fn test_default_schema_is_all_zero() {
        let array = FeatureSchema::default().to_array();
        assert!(array.iter().all(|&v| v == 0.0));
    }
}
