#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Photo submission pipeline.
//!
//! Ties the coordinate extractor, zone matcher and compositor together
//! behind [`Pipeline`], a four-state machine that always ends with a
//! displayable image. A missing coordinate, a location outside every
//! zone, and any extraction or rendering failure each produce a sentinel
//! [`ZoneOutcome`] with a pass-through image instead of an error.

pub mod orchestrator;
pub mod output;
pub mod status;
pub mod submission;

pub use geofilter_render::EncodedImage;
pub use orchestrator::{Pipeline, PipelineState};
pub use output::{output_filename, save_rendered};
pub use status::{LogStatus, NullStatus, StatusLevel, StatusReporter, null_status};
pub use submission::{PhotoSubmission, ZoneOutcome};

use thiserror::Error;

/// Errors returned by the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A submission was attempted while the pipeline was not idle.
    #[error("Pipeline is busy ({state}); reset before submitting another photo")]
    Busy { state: PipelineState },

    /// Saving the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
