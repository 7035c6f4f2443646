//! TestMachine Report: human-readable and JSON views of a search run.
//!
//! ```text
//! RunResult ─▶ trace_lines ─▶ Handlebars template ─▶ TextReporter ─▶ sink
//!           └▶ to_json
//! ```
//!
//! # Example
//!
//! ```text
//! Falsifying program found after 12 trials (seed 0, trial 11):
//!     t1 = 0.11945064104636571
//!     t2 = t1 / t1
//!     t3 = 0.16278913131835504
//!     t4 = 0.6323432862008465
//!     assert associative_add(t4, t3, t2)
//! check `associative_add` failed on t4 = 0.6323432862008465, t3 = 0.16278913131835504, t2 = 1.0
//! ```

pub mod render;
pub mod trace;

pub use render::{render_result, to_json, ReportRenderer, TextReporter, DEFAULT_TEMPLATE};
pub use trace::{failure_line, step_line, trace_lines};
