//! Frame-to-vector encoder.
//!
//! Every normalization divisor and button bit position lives in
//! [`EncoderConfig`]; the defaults are the game's known coordinate, velocity
//! and angle ranges. Values are clamped into their declared range so a frame
//! with out-of-range measurements can never push an out-of-distribution
//! input into the network.

use serde_json::Value;

use crate::{
    action::{ACTION_LEN, ActionSchema, Buttons},
    feature::{ENEMY_SLOTS, EnemySlot, FEATURE_LEN, FeatureSchema, SelfState},
    frame::Frame,
};

/// Normalization and decoding constants for the encoder.
///
/// Divisors are tied to the game: map coordinates span roughly +/-4096
/// units, player velocity tops out near 600 units/s, commanded move speed
/// near 450, and per-frame aim deltas stay under 90 degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub max_health: f32,
    pub max_armor: f32,
    pub map_extent: f32,
    pub max_velocity: f32,
    pub max_weapon_id: f32,
    pub max_ammo: f32,
    pub max_enemy_distance: f32,
    pub max_enemy_health: f32,
    pub max_move_speed: f32,
    pub max_turn_rate: f32,
    pub attack_bit: u32,
    pub jump_bit: u32,
    pub crouch_bit: u32,
    pub reload_bit: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            max_armor: 100.0,
            map_extent: 4096.0,
            max_velocity: 600.0,
            max_weapon_id: 50.0,
            max_ammo: 100.0,
            max_enemy_distance: 4096.0,
            max_enemy_health: 100.0,
            max_move_speed: 450.0,
            max_turn_rate: 90.0,
            attack_bit: 0,
            jump_bit: 1,
            crouch_bit: 2,
            reload_bit: 13,
        }
    }
}

impl EncoderConfig {
    /// Decodes the button bitmask into named button state.
    #[must_use]
    pub fn decode_buttons(&self, mask: u32) -> Buttons {
        let bit = |n: u32| mask & (1 << n) != 0;
        Buttons {
            attack: bit(self.attack_bit),
            jump: bit(self.jump_bit),
            crouch: bit(self.crouch_bit),
            reload: bit(self.reload_bit),
        }
    }
}

/// One feature/action pair, the atomic training unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: [f32; FEATURE_LEN],
    pub actions: [f32; ACTION_LEN],
}

/// Why a frame was dropped instead of encoded.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SkipReason {
    #[display("malformed frame: {_0}")]
    Malformed(#[error(not(source))] String),
    #[display("frame produced a non-finite vector element")]
    NonFinite,
}

/// Encodes one parsed frame into a training sample.
///
/// # Errors
///
/// Returns [`SkipReason::NonFinite`] when the frame carries NaN or infinite
/// measurements; callers skip the frame and keep going.
pub fn extract_sample(frame: &Frame, config: &EncoderConfig) -> Result<Sample, SkipReason> {
    let features = encode_features(frame, config).to_array();
    let actions = encode_actions(frame, config).to_array();
    if !features.iter().chain(actions.iter()).all(|v| v.is_finite()) {
        return Err(SkipReason::NonFinite);
    }
    Ok(Sample { features, actions })
}

/// Parses a loosely-structured frame record and encodes it.
///
/// Parsing per frame keeps a single malformed frame from aborting the file
/// it came from.
///
/// # Errors
///
/// Returns [`SkipReason::Malformed`] when the record does not decode as a
/// frame, or [`SkipReason::NonFinite`] as in [`extract_sample`].
pub fn extract_sample_from_value(
    value: &Value,
    config: &EncoderConfig,
) -> Result<Sample, SkipReason> {
    let frame: Frame = serde_json::from_value(value.clone())
        .map_err(|err| SkipReason::Malformed(err.to_string()))?;
    extract_sample(&frame, config)
}

fn encode_features(frame: &Frame, config: &EncoderConfig) -> FeatureSchema {
    let unit = |v: f32, max: f32| (v / max).clamp(0.0, 1.0);
    let signed = |v: f32, max: f32| (v / max).clamp(-1.0, 1.0);

    let self_state = SelfState {
        health: unit(frame.health, config.max_health),
        armor: unit(frame.armor, config.max_armor),
        position: [
            signed(frame.position.x, config.map_extent),
            signed(frame.position.y, config.map_extent),
            signed(frame.position.z, config.map_extent),
        ],
        velocity: [
            signed(frame.velocity.x, config.max_velocity),
            signed(frame.velocity.y, config.max_velocity),
            signed(frame.velocity.z, config.max_velocity),
        ],
        weapon_id: unit(frame.current_weapon_id, config.max_weapon_id),
        ammo: unit(frame.primary_ammo, config.max_ammo),
        on_ground: frame.on_ground.clamp(0.0, 1.0),
        reserved: 0.0,
    };

    let mut enemies = [EnemySlot::default(); ENEMY_SLOTS];
    let visible = frame
        .visible_entities
        .iter()
        .filter(|e| e.is_enemy)
        .take(ENEMY_SLOTS);
    for (slot, enemy) in enemies.iter_mut().zip(visible) {
        let h_angle = enemy.horizontal_angle.to_radians();
        let v_angle = enemy.vertical_angle.to_radians();
        *slot = EnemySlot {
            proximity: 1.0 - unit(enemy.distance, config.max_enemy_distance),
            horizontal_cos: h_angle.cos(),
            horizontal_sin: h_angle.sin(),
            vertical_cos: v_angle.cos(),
            vertical_sin: v_angle.sin(),
            health: unit(enemy.health, config.max_enemy_health),
        };
    }

    FeatureSchema {
        self_state,
        enemies,
        ..FeatureSchema::default()
    }
}

fn encode_actions(frame: &Frame, config: &EncoderConfig) -> ActionSchema {
    let signed = |v: f32, max: f32| (v / max).clamp(-1.0, 1.0);
    ActionSchema {
        movement: [
            signed(frame.movement.x, config.max_move_speed),
            signed(frame.movement.y, config.max_move_speed),
            signed(frame.movement.z, config.max_move_speed),
        ],
        aim: [
            signed(frame.aim_delta.yaw, config.max_turn_rate),
            signed(frame.aim_delta.pitch, config.max_turn_rate),
        ],
        buttons: config.decode_buttons(frame.buttons),
    }
}
