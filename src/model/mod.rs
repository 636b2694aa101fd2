//! Document model types for report export.
//!
//! This module defines the intermediate representation that bridges the
//! markdown classifier and the format backends. A report is a flat,
//! ordered sequence of [`Block`]s; rich text inside a block is a sequence
//! of [`StyledRun`]s.

mod artifact;
mod block;
mod inline;
mod table;

pub use artifact::{Artifact, ExportFormat, TIMESTAMP_FORMAT};
pub use block::{Block, ListMarker};
pub use inline::{runs_text, RunStyle, StyledRun};
pub use table::{Row, TableBlock};
