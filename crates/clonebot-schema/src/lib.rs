//! Feature/action vector schema shared between the offline training tools
//! and the in-game inference consumer.
//!
//! The vector layout is an array-position contract: the runtime feeds the
//! exported network a flat `[f32; 56]` and reads back a flat `[f32; 9]`, so
//! producer and consumer must agree on every index. This crate defines the
//! layout once, as named-field schema types with an ordered serialization
//! routine, and everything else derives the array form from it.
//!
//! # Layout
//!
//! Feature vector (56 values):
//!
//! | Range      | Group       | Contents                                     |
//! |------------|-------------|----------------------------------------------|
//! | `[0..12)`  | self state  | health, armor, position, velocity, weapon, ammo, ground flag, reserved |
//! | `[12..36)` | enemies     | 4 slots x 6 values, zero-padded              |
//! | `[36..48)` | navigation  | reserved (always zero)                       |
//! | `[48..56)` | pickups     | reserved (always zero)                       |
//!
//! Action vector (9 values): movement x/y/z, aim yaw/pitch (all in [-1, 1]),
//! then attack/jump/crouch/reload button indicators (0.0 or 1.0).
//!
//! All normalization divisors and button bit positions live in
//! [`EncoderConfig`] so the constants are declared in exactly one place.

pub use self::{
    action::{ACTION_LEN, ActionSchema, BINARY_LEN, Buttons, CONTINUOUS_LEN},
    encode::{EncoderConfig, Sample, SkipReason, extract_sample, extract_sample_from_value},
    feature::{
        ENEMY_SLOT_LEN, ENEMY_SLOTS, EnemySlot, FEATURE_LEN, FeatureSchema, NAVIGATION_LEN,
        PICKUP_LEN, SELF_STATE_LEN, SelfState,
    },
    frame::{AimDelta, Frame, Vec3, VisibleEntity},
};

mod action;
mod encode;
mod feature;
mod frame;
