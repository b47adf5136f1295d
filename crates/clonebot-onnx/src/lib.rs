//! ONNX export and inference for the trained networks.
//!
//! Export builds the protobuf model directly from the in-memory layers
//! (each dense layer becomes a `Gemm` node with a `transB` weight, followed
//! by its activation) and inference round-trips the written file through
//! `tract` so every exported artifact is known to load and run.

pub use self::{
    benchmark::{BenchmarkReport, LatencyRating, benchmark_model},
    graph::{model_from_mlp, model_from_policy, write_model},
    session::OnnxSession,
};

mod benchmark;
mod graph;
mod session;
