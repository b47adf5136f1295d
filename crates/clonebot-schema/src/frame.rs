//! Wire format of one recorded gameplay frame.
//!
//! Frames are produced by the in-game recorder; this crate only reads them.
//! Every field is optional on the wire and defaults to a zero/neutral value,
//! so a sparsely populated frame still encodes. Unknown fields are ignored.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AimDelta {
    pub yaw: f32,
    pub pitch: f32,
}

/// One entry of the recorder's visibility scan.
///
/// Distance defaults to the map extent (slot encodes as "at the horizon")
/// and health to full, matching what the recorder emits for entities it
/// could not measure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibleEntity {
    pub is_enemy: bool,
    pub distance: f32,
    pub horizontal_angle: f32,
    pub vertical_angle: f32,
    pub health: f32,
}

impl Default for VisibleEntity {
    fn default() -> Self {
        Self {
            is_enemy: false,
            distance: 4096.0,
            horizontal_angle: 0.0,
            vertical_angle: 0.0,
            health: 100.0,
        }
    }
}

/// One recorded timestep of gameplay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub health: f32,
    pub armor: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub current_weapon_id: f32,
    pub primary_ammo: f32,
    /// Recorders have emitted both `true`/`false` and `1`/`0` here.
    #[serde(deserialize_with = "bool_or_number")]
    pub on_ground: f32,
    pub visible_entities: Vec<VisibleEntity>,
    pub movement: Vec3,
    pub aim_delta: AimDelta,
    pub buttons: u32,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            health: 0.0,
            armor: 0.0,
            position: Vec3::default(),
            velocity: Vec3::default(),
            current_weapon_id: 0.0,
            primary_ammo: 0.0,
            // A frame that does not say otherwise is treated as standing.
            on_ground: 1.0,
            visible_entities: Vec::new(),
            movement: Vec3::default(),
            aim_delta: AimDelta::default(),
            buttons: 0,
        }
    }
}

fn bool_or_number<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrNumber {
        Bool(bool),
        Number(f32),
    }

    Ok(match BoolOrNumber::deserialize(deserializer)? {
        BoolOrNumber::Bool(true) => 1.0,
        BoolOrNumber::Bool(false) => 0.0,
        BoolOrNumber::Number(n) => n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_neutral_defaults() {
        let frame: Frame = serde_json::from_str("{}").unwrap();
        assert_eq!(frame.health, 0.0);
        assert_eq!(frame.on_ground, 1.0);
        assert!(frame.visible_entities.is_empty());
        assert_eq!(frame.buttons, 0);
    }

    #[test]
    fn test_on_ground_accepts_bool_and_number() {
        let a: Frame = serde_json::from_str(r#"{"on_ground": true}"#).unwrap();
        let b: Frame = serde_json::from_str(r#"{"on_ground": 1}"#).unwrap();
        let c: Frame = serde_json::from_str(r#"{"on_ground": false}"#).unwrap();
        assert_eq!(a.on_ground, 1.0);
        assert_eq!(b.on_ground, 1.0);
        assert_eq!(c.on_ground, 0.0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let frame: Frame =
            serde_json::from_str(r#"{"health": 75.0, "timestamp": 12.5, "map": "dm_lockdown"}"#)
                .unwrap();
        assert_eq!(frame.health, 75.0);
    }

    #[test]
    fn test_visible_entity_defaults_to_horizon() {
        let entity: VisibleEntity = serde_json::from_str(r#"{"is_enemy": true}"#).unwrap();
        assert_eq!(entity.distance, 4096.0);
        assert_eq!(entity.health, 100.0);
    }
}
