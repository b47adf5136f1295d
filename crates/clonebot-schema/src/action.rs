//! Named-field form of the action vector and its ordered serialization.

/// Total action vector width produced by the policy network.
pub const ACTION_LEN: usize = 9;
/// Continuous outputs (movement + aim) at `[0..5)`.
pub const CONTINUOUS_LEN: usize = 5;
/// Binary button outputs at `[5..9)`.
pub const BINARY_LEN: usize = 4;

/// Decoded button state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub attack: bool,
    pub jump: bool,
    pub crouch: bool,
    pub reload: bool,
}

/// The full action vector in named-field form.
///
/// The array layout is continuous-first (movement, aim) then binary
/// (buttons); the network's output heads concatenate in the same order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActionSchema {
    /// Forward/back, left/right, up/down in [-1, 1].
    pub movement: [f32; 3],
    /// Yaw, pitch delta in [-1, 1].
    pub aim: [f32; 2],
    pub buttons: Buttons,
}

impl ActionSchema {
    /// Serializes the schema into the flat array form the network predicts.
    #[must_use]
    pub fn to_array(&self) -> [f32; ACTION_LEN] {
        let b = |v: bool| if v { 1.0 } else { 0.0 };
        [
            self.movement[0],
            self.movement[1],
            self.movement[2],
            self.aim[0],
            self.aim[1],
            b(self.buttons.attack),
            b(self.buttons.jump),
            b(self.buttons.crouch),
            b(self.buttons.reload),
        ]
    }
}
