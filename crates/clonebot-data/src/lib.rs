//! Recording ingestion for the behavior-clone trainer.
//!
//! Loading is best-effort: a recording file that fails to parse, or a single
//! malformed frame inside an otherwise good file, is skipped with a warning
//! and counted in the [`LoadReport`]. Only an entirely empty dataset stops
//! the run, and that decision belongs to the caller.

pub use self::{
    dataset::{Dataset, LoadReport},
    recording::{Recording, RecordingError, expand_data_pattern},
};

mod dataset;
mod recording;
