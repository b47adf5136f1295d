//! Feedforward policy training for behavior cloning.
//!
//! This crate is the numeric core of the trainer: dense layers, the
//! two-head policy network, the blended regression/classification loss,
//! the Adam optimizer, plateau learning-rate decay, JSON checkpoints, and
//! the epoch loop that ties them together.
//!
//! # How Training Works
//!
//! 1. **Samples** - Feature/action pairs come from `clonebot-schema`
//! 2. **Batches** - The trainer shuffles sample indices each epoch and
//!    slices them into fixed-size batches
//! 3. **Forward** - The policy network maps 56 features to 9 actions
//!    through a shared trunk and two output heads
//! 4. **Loss** - MSE over the continuous outputs plus half-weighted BCE
//!    over the button outputs
//! 5. **Backward** - Gradients flow back through heads and trunk; Adam
//!    updates every parameter tensor
//! 6. **Schedule** - Validation loss drives plateau-triggered LR decay and
//!    checkpoint writes
//!
//! # Architecture
//!
//! ```text
//! features [batch, 56]
//!     ↓ trunk: Linear + ReLU + Dropout per hidden width
//! shared [batch, hidden.last()]
//!     ↓ continuous head          ↓ binary head
//! Linear + Tanh [batch, 5]       Linear + Sigmoid [batch, 4]
//!     └──────────── concat ────────────┘
//! actions [batch, 9]
//! ```
//!
//! The concatenation order (continuous first, then binary) matches the
//! action vector layout in `clonebot-schema` and is part of the external
//! contract with the inference consumer.

pub use self::{
    activation::Activation,
    checkpoint::Checkpoint,
    linear::{Linear, LinearGrads},
    loss::{BINARY_LOSS_WEIGHT, bce, mse},
    mlp::{Mlp, MlpLayer},
    optimizer::Adam,
    policy::PolicyNetwork,
    scheduler::ReduceLrOnPlateau,
    trainer::{FitReport, TrainConfig, Trainer},
};

mod activation;
mod checkpoint;
mod linear;
mod loss;
mod mlp;
mod optimizer;
mod policy;
mod scheduler;
mod trainer;
