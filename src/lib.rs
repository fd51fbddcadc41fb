//! Coverage, timeliness and quality scorecards for tasks distributed to
//! municipal units.
//!
//! Every calculator reads through [`store::ReferenceStore`] and returns plain
//! records; rendering is left to the caller (see `output` and the
//! `scorecard` binary).

pub mod aggregator;
pub mod config;
pub mod coverage;
pub mod error;
pub mod evaluation;
pub mod lifecycle;
pub mod loader;
pub mod monthly;
pub mod output;
pub mod palette;
pub mod store;
pub mod types;
pub mod util;
pub mod window;

pub use error::{EvalError, Result, StoreError};
pub use evaluation::EvaluationFilter;
pub use store::{MemoryStore, ReferenceStore, TaskQuery};
pub use window::TimeWindow;
