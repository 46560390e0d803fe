//! Per-submission state machine.
//!
//! ```text
//! Idle --submit--> Extracting --coordinate--> Rendering --> Complete
//!                      |                                      ^
//!                      +------------- no coordinate ----------+
//! Complete --reset--> Idle
//! ```
//!
//! Every path through [`Pipeline::submit`] ends in `Complete` with a
//! displayable image. Failures degrade to a pass-through re-encode of the
//! original, or to the original bytes if even that fails.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geofilter_extract::CoordinateExtractor;
use geofilter_render::{Compositor, EncodedImage};
use geofilter_zone::ZoneMatcher;
use geofilter_zone_models::GeoCoordinate;
use strum_macros::{AsRefStr, Display};

use crate::PipelineError;
use crate::status::{StatusLevel, StatusReporter, null_status};
use crate::submission::{PhotoSubmission, ZoneOutcome};

/// Where the pipeline is in handling the current submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineState {
    /// No submission in flight.
    #[default]
    Idle,
    /// Coordinate extraction in progress.
    Extracting,
    /// Zone matching and, if matched, compositing in progress.
    Rendering,
    /// A result is available until [`Pipeline::reset`].
    Complete,
}

#[derive(Default)]
struct Slot {
    state: PipelineState,
    result: Option<Arc<PhotoSubmission>>,
}

/// Sequences extraction, matching and compositing for one photo at a time.
pub struct Pipeline {
    extractor: Arc<dyn CoordinateExtractor>,
    matcher: Arc<ZoneMatcher>,
    compositor: Compositor,
    status: Arc<dyn StatusReporter>,
    slot: Mutex<Slot>,
}

/// Marks a submission as in flight. Returns the pipeline to `Idle` if the
/// submission is dropped before it completes.
struct InFlight<'a> {
    pipeline: &'a Pipeline,
    completed: bool,
}

impl InFlight<'_> {
    fn advance(&self, state: PipelineState) {
        log::debug!("Pipeline state -> {state}");
        self.pipeline.slot().state = state;
    }

    fn complete(mut self, submission: PhotoSubmission) -> Arc<PhotoSubmission> {
        let submission = Arc::new(submission);
        {
            let mut slot = self.pipeline.slot();
            slot.state = PipelineState::Complete;
            slot.result = Some(submission.clone());
        }
        self.completed = true;
        log::info!(
            "Submission '{}' complete: {}",
            submission.original_name,
            submission.outcome
        );
        self.pipeline.status.set_processing(false);
        submission
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            log::warn!("Submission abandoned before completion");
            let mut slot = self.pipeline.slot();
            slot.state = PipelineState::Idle;
            slot.result = None;
            drop(slot);
            self.pipeline.status.set_processing(false);
        }
    }
}

impl Pipeline {
    /// Creates a pipeline with the default compositor and no status output.
    #[must_use]
    pub fn new(extractor: Arc<dyn CoordinateExtractor>, matcher: Arc<ZoneMatcher>) -> Self {
        Self {
            extractor,
            matcher,
            compositor: Compositor::default(),
            status: null_status(),
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Sends status events to `status`.
    #[must_use]
    pub fn with_status(mut self, status: Arc<dyn StatusReporter>) -> Self {
        self.status = status;
        self
    }

    /// Uses `compositor` for rendering.
    #[must_use]
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.slot().state
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        matches!(
            self.state(),
            PipelineState::Extracting | PipelineState::Rendering
        )
    }

    /// The completed submission, while in `Complete`.
    #[must_use]
    pub fn result(&self) -> Option<Arc<PhotoSubmission>> {
        self.slot().result.clone()
    }

    /// The extraction strategy in use.
    #[must_use]
    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Discards the completed result and returns to `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if a submission is in flight;
    /// cancellation is not supported.
    pub fn reset(&self) -> Result<(), PipelineError> {
        let mut slot = self.slot();
        match slot.state {
            PipelineState::Extracting | PipelineState::Rendering => {
                Err(PipelineError::Busy { state: slot.state })
            }
            PipelineState::Idle | PipelineState::Complete => {
                slot.state = PipelineState::Idle;
                slot.result = None;
                log::debug!("Pipeline reset");
                Ok(())
            }
        }
    }

    fn begin(&self) -> Result<InFlight<'_>, PipelineError> {
        {
            let mut slot = self.slot();
            if slot.state != PipelineState::Idle {
                return Err(PipelineError::Busy { state: slot.state });
            }
            slot.state = PipelineState::Extracting;
        }
        self.status.set_processing(true);
        Ok(InFlight {
            pipeline: self,
            completed: false,
        })
    }

    /// Processes one photo to completion.
    ///
    /// Only one submission may be in flight, and a completed result must be
    /// [`reset`](Self::reset) before the next submission.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if the pipeline is not `Idle`. Every
    /// other failure degrades to a sentinel outcome.
    pub async fn submit(
        &self,
        image: impl Into<Arc<[u8]>> + Send,
        original_name: impl Into<String> + Send,
    ) -> Result<Arc<PhotoSubmission>, PipelineError> {
        let flight = self.begin()?;
        let image: Arc<[u8]> = image.into();
        let original_name = original_name.into();

        log::info!(
            "Processing '{original_name}' ({} bytes) with {} extractor",
            image.len(),
            self.extractor.name()
        );
        self.status
            .notify(StatusLevel::Info, "Extracting location data from photo...");

        let coordinate = match self.extractor.extract(&image).await {
            Ok(Some(coordinate)) => {
                self.status.notify(
                    StatusLevel::Success,
                    &format!("Location found: {coordinate}"),
                );
                coordinate
            }
            Ok(None) => {
                self.status
                    .notify(StatusLevel::Warning, "No GPS data found in this photo");
                let rendered = self.passthrough(&image).await;
                return Ok(flight.complete(PhotoSubmission {
                    original_name,
                    image,
                    coordinate: None,
                    outcome: ZoneOutcome::NoCoordinate,
                    rendered,
                }));
            }
            Err(e) => {
                log::error!("Coordinate extraction failed: {e}");
                self.status
                    .notify(StatusLevel::Error, "Error processing photo");
                flight.advance(PipelineState::Rendering);
                let rendered = self.passthrough(&image).await;
                return Ok(flight.complete(PhotoSubmission {
                    original_name,
                    image,
                    coordinate: None,
                    outcome: ZoneOutcome::ProcessingFailed,
                    rendered,
                }));
            }
        };

        flight.advance(PipelineState::Rendering);
        let (outcome, rendered) = self.match_and_render(&image, &coordinate).await;

        Ok(flight.complete(PhotoSubmission {
            original_name,
            image,
            coordinate: Some(coordinate),
            outcome,
            rendered,
        }))
    }

    async fn match_and_render(
        &self,
        image: &Arc<[u8]>,
        coordinate: &GeoCoordinate,
    ) -> (ZoneOutcome, EncodedImage) {
        let Some(zone) = self.matcher.find_zone(coordinate) else {
            log::info!("{coordinate} is outside all zones");
            self.status
                .notify(StatusLevel::Info, "Photo not taken in a special zone");
            return (ZoneOutcome::OutsideZones, self.passthrough(image).await);
        };

        log::info!("Matched zone: {}", zone.name);
        match self.compositor.render(image.clone(), &zone.filter).await {
            Ok(rendered) => {
                self.status
                    .notify(StatusLevel::Success, &format!("Applied {} filter!", zone.name));
                (ZoneOutcome::Matched(zone.name.clone()), rendered)
            }
            Err(e) => {
                log::error!("Failed to render {} filter: {e}", zone.name);
                self.status
                    .notify(StatusLevel::Error, "Error processing photo location");
                (ZoneOutcome::ProcessingFailed, self.passthrough(image).await)
            }
        }
    }

    async fn passthrough(&self, image: &Arc<[u8]>) -> EncodedImage {
        match self.compositor.reencode(image.clone()).await {
            Ok(rendered) => rendered,
            Err(e) => {
                log::warn!("Pass-through re-encode failed, returning original bytes: {e}");
                EncodedImage::original(image)
            }
        }
    }
}
