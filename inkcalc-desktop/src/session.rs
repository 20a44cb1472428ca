//! The drawing session: one surface, one overlay, one in-flight submission.
//!
//! Submission runs in three steps so that the session is never borrowed
//! across an await point:
//!
//! 1. [`Session::prepare`] gates on state and emptiness, snapshots the
//!    surface and bindings, and claims the client's in-flight slot.
//! 2. [`PendingSubmission::run`] encodes and uploads the snapshot.
//! 3. [`Session::complete`] applies the outcome.
//!
//! [`Session::submit`] chains the three for callers that don't need to keep
//! drawing while the request is out.

use std::sync::Arc;

use inkcalc_client::{AnalysisClient, AnalysisError, InFlight, ServiceResult};
use inkcalc_core::{
    AnalysisResult, BindingValue, CanvasResult, Color, DrawingSurface, InputEvent, Notification,
    NotificationSink, Palette, Point, ResultOverlay, StrokeCapture, StrokeStyle, SubmissionState,
    SurfaceSnapshot, VariableBindings, Viewport,
};
use inkcalc_renderer::{ImagePackager, PackageError, PackagerConfig};
use thiserror::Error;

/// Shown when the user submits a blank canvas.
pub const EMPTY_CANVAS_MESSAGE: &str = "Please draw something first!";

/// Shown when a result is adopted.
pub const SUCCESS_MESSAGE: &str = "Analysis complete!";

/// Shown when the drawing could not be encoded.
pub const ENCODING_FAILED_MESSAGE: &str = "Failed to encode drawing";

/// Errors that abort a submission. All are recoverable.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Nothing has been drawn.
    #[error("canvas is empty")]
    EmptyCanvas,
    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    Busy,
    /// The drawing could not be packaged.
    #[error(transparent)]
    Encoding(#[from] PackageError),
    /// The service exchange failed or returned nothing.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl SubmitError {
    /// The notification this error produces, if any.
    ///
    /// A busy rejection is silent: the submit control is disabled while
    /// loading, so reaching it means a duplicate trigger.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            Self::EmptyCanvas => Some(Notification::error(EMPTY_CANVAS_MESSAGE)),
            Self::Busy => None,
            Self::Encoding(_) => Some(Notification::error(ENCODING_FAILED_MESSAGE)),
            Self::Analysis(err) => Some(Notification::error(err.user_message())),
        }
    }
}

/// What happened to a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The result is now on the overlay.
    Shown(AnalysisResult),
    /// The surface was reset while the request was out; the result was dropped.
    Discarded,
}

/// Session behavior knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Swatches offered to the user.
    pub palette: Palette,
    /// Pen geometry.
    pub stroke_style: StrokeStyle,
    /// Image encoding settings.
    pub packager: PackagerConfig,
    /// Merge results flagged `assigned` into the bindings.
    pub merge_assigned: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            stroke_style: StrokeStyle::default(),
            packager: PackagerConfig::default(),
            merge_assigned: true,
        }
    }
}

/// State for one drawing page.
pub struct Session {
    capture: StrokeCapture,
    bindings: VariableBindings,
    overlay: ResultOverlay,
    client: AnalysisClient,
    packager: ImagePackager,
    sink: Arc<dyn NotificationSink>,
    palette: Palette,
    merge_assigned: bool,
}

impl Session {
    /// Create a session over an existing surface.
    #[must_use]
    pub fn new(
        surface: DrawingSurface,
        client: AnalysisClient,
        sink: Arc<dyn NotificationSink>,
        config: SessionConfig,
    ) -> Self {
        Self {
            capture: StrokeCapture::with_style(surface, config.stroke_style),
            bindings: VariableBindings::new(),
            overlay: ResultOverlay::new(),
            client,
            packager: ImagePackager::new(config.packager),
            sink,
            palette: config.palette,
            merge_assigned: config.merge_assigned,
        }
    }

    /// Create a session with a surface sized to the viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if the viewport leaves no drawable area.
    pub fn mount(
        viewport: &Viewport,
        client: AnalysisClient,
        sink: Arc<dyn NotificationSink>,
        config: SessionConfig,
    ) -> CanvasResult<Self> {
        let surface = DrawingSurface::for_viewport(viewport)?;
        tracing::info!(
            "Session mounted: {}x{} surface",
            surface.width(),
            surface.height()
        );
        Ok(Self::new(surface, client, sink, config))
    }

    /// The drawing surface.
    #[must_use]
    pub fn surface(&self) -> &DrawingSurface {
        self.capture.surface()
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.capture.is_drawing()
    }

    /// Selected ink color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.capture.color()
    }

    /// Swatches for the color picker.
    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current variable bindings.
    #[must_use]
    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    /// Mutable access to the bindings, for seeding values.
    pub fn bindings_mut(&mut self) -> &mut VariableBindings {
        &mut self.bindings
    }

    /// The result overlay.
    #[must_use]
    pub fn overlay(&self) -> &ResultOverlay {
        &self.overlay
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn submission_state(&self) -> SubmissionState {
        self.client.state()
    }

    /// Mouse down on the surface.
    pub fn pointer_down(&mut self, point: Point) {
        self.capture.begin(point);
    }

    /// Mouse move over the surface.
    pub fn pointer_move(&mut self, point: Point) {
        self.capture.extend(point);
    }

    /// Mouse up, or the pointer left the surface.
    pub fn pointer_up(&mut self) {
        self.capture.end();
    }

    /// Pick an ink color.
    pub fn select_color(&mut self, color: Color) {
        self.capture.set_color(color);
    }

    /// Pick an ink color from the palette. Returns false for an unknown index.
    pub fn select_swatch(&mut self, index: usize) -> bool {
        match self.palette.get(index) {
            Some(color) => {
                self.capture.set_color(color);
                true
            }
            None => {
                tracing::warn!("No swatch at index {}", index);
                false
            }
        }
    }

    /// Clear the surface and the overlay together.
    pub fn reset(&mut self) {
        self.capture.clear();
        self.overlay.dismiss();
    }

    /// Close the overlay. Pixels and bindings are untouched.
    pub fn dismiss(&mut self) {
        self.overlay.dismiss();
    }

    /// Forget every variable binding.
    pub fn clear_variables(&mut self) {
        self.bindings.clear();
    }

    /// Apply one presentation-layer event.
    ///
    /// Returns the submission outcome for [`InputEvent::Submit`], `None`
    /// otherwise.
    pub async fn dispatch(
        &mut self,
        event: &InputEvent,
    ) -> Option<Result<Completion, SubmitError>> {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp | InputEvent::PointerLeave => self.pointer_up(),
            InputEvent::SelectColor { color } => self.select_color(*color),
            InputEvent::SelectSwatch { index } => {
                self.select_swatch(*index);
            }
            InputEvent::Reset => self.reset(),
            InputEvent::Dismiss => self.dismiss(),
            InputEvent::Submit => return Some(self.submit().await),
        }
        None
    }

    /// Prepare, run and complete a submission.
    ///
    /// # Errors
    ///
    /// Returns the [`SubmitError`] that aborted the submission; it has
    /// already been reported to the notification sink.
    pub async fn submit(&mut self) -> Result<Completion, SubmitError> {
        let pending = self.prepare()?;
        let outcome = pending.run().await;
        self.complete(outcome)
    }

    /// Gate and snapshot a submission.
    ///
    /// On success the client is `Loading` until the returned submission has
    /// run (or is dropped), and any previous result is hidden.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Busy`] if a submission is in flight and
    /// [`SubmitError::EmptyCanvas`] if nothing has been drawn.
    pub fn prepare(&mut self) -> Result<PendingSubmission, SubmitError> {
        if !self.client.state().can_submit() {
            tracing::debug!("Submission ignored: already loading");
            return Err(SubmitError::Busy);
        }

        if self.capture.surface().is_empty() {
            return Err(self.report(SubmitError::EmptyCanvas));
        }

        let flight = self.client.begin().map_err(|_| SubmitError::Busy)?;
        self.overlay.dismiss();

        let surface = self.capture.surface();
        Ok(PendingSubmission {
            flight,
            snapshot: surface.snapshot(),
            variables: self.bindings.clone(),
            packager: self.packager.clone(),
            epoch: surface.epoch(),
        })
    }

    /// Apply the outcome of a submission.
    ///
    /// # Errors
    ///
    /// Returns the outcome's error after reporting it.
    pub fn complete(&mut self, outcome: SubmissionOutcome) -> Result<Completion, SubmitError> {
        let result = outcome.result.map_err(|err| self.report(err))?;

        if outcome.epoch != self.capture.surface().epoch() {
            tracing::info!(
                "Discarding result for {:?}: surface was reset while loading",
                result.expr
            );
            return Ok(Completion::Discarded);
        }

        if result.assigned && self.merge_assigned {
            tracing::debug!("Binding {} = {}", result.expr, result.result);
            self.bindings
                .insert(result.expr.clone(), BindingValue::parse_lossy(&result.result));
        }

        let shown = result.to_analysis_result();
        self.overlay.show(shown.clone());
        self.sink.notify(Notification::success(SUCCESS_MESSAGE));
        Ok(Completion::Shown(shown))
    }

    fn report(&self, err: SubmitError) -> SubmitError {
        tracing::warn!("Submission failed: {}", err);
        if let Some(notification) = err.notification() {
            self.sink.notify(notification);
        }
        err
    }
}

/// A gated submission holding its snapshot and the in-flight slot.
pub struct PendingSubmission {
    flight: InFlight,
    snapshot: SurfaceSnapshot,
    variables: VariableBindings,
    packager: ImagePackager,
    epoch: u64,
}

impl PendingSubmission {
    /// The pixels that will be sent.
    #[must_use]
    pub fn snapshot(&self) -> &SurfaceSnapshot {
        &self.snapshot
    }

    /// The bindings that will be sent.
    #[must_use]
    pub fn variables(&self) -> &VariableBindings {
        &self.variables
    }

    /// Encode and upload. The client returns to `Idle` when this finishes.
    pub async fn run(self) -> SubmissionOutcome {
        let Self {
            flight,
            snapshot,
            variables,
            packager,
            epoch,
        } = self;

        let result = match packager.package(snapshot, &variables).await {
            Ok(payload) => flight.send(payload).await.map_err(SubmitError::from),
            Err(err) => Err(SubmitError::from(err)),
        };

        SubmissionOutcome { epoch, result }
    }
}

/// The raw result of a run, waiting to be applied to its session.
#[derive(Debug)]
pub struct SubmissionOutcome {
    epoch: u64,
    result: Result<ServiceResult, SubmitError>,
}
