//! View Controller
//!
//! The four-screen flow of the trick as an explicit state machine:
//!
//! ```text
//! Setup --confirm(image)--> Camera --shutter, flash--> Processing --delay--> Result
//!   ^                         |  ^                                             |
//!   +-------reset-------------+  +--------------------back---------------------+
//! ```
//!
//! The controller never performs side effects itself. Every accepted event
//! returns a list of [`Effect`]s for the host to carry out (open/close the
//! camera, start/cancel a timer, start/discard an analysis request).
//!
//! Camera opens, timers and analysis requests are identified by a
//! [`Ticket`]. A completion carrying a ticket the controller no longer
//! waits for is ignored, so a late camera, timer or analysis can never
//! land in the wrong screen.
//!
//! Not reentrant: events must be applied one at a time from the UI thread.

use std::time::Duration;

use crate::analysis::AnalysisResult;
use crate::camera::{CaptureOutcome, HiddenResetCounter};
use crate::error::{CaptureError, TransitionError};
use crate::state::data::{ImageStore, SecretImage};

/// The active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Setup,
    Camera,
    Processing,
    Result,
}

/// Identifies one camera open, scheduled timer or in-flight analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

/// What a scheduled timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Shutter flash shown in the Camera view
    Flash,
    /// Fake "developing" delay
    Processing,
}

/// Durations used by the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub flash: Duration,
    pub processing: Duration,
    /// Taps on the fake gallery button that trigger a reset
    pub hidden_reset_taps: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            flash: Duration::from_millis(150),
            processing: Duration::from_millis(1500),
            hidden_reset_taps: 3,
        }
    }
}

/// Input to the controller
#[derive(Debug, Clone)]
pub enum Event {
    /// User confirmed the chosen image in Setup
    Confirm(SecretImage),
    /// Host reports the outcome of an `AcquireCamera` effect
    CameraReported(Ticket, CaptureOutcome),
    ShutterPressed,
    /// Visible back button in the Camera view (or a programmatic reset)
    Reset,
    /// Tap on the disguised gallery button
    HiddenTap,
    TimerElapsed(Ticket),
    /// Back button in the Result view
    Back,
    AnalysisFinished(Ticket, AnalysisResult),
    /// Leave the invalid-state screen
    Recover,
    /// Host is shutting down
    Teardown,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Confirm(_) => "confirm",
            Event::CameraReported(..) => "camera-reported",
            Event::ShutterPressed => "shutter",
            Event::Reset => "reset",
            Event::HiddenTap => "hidden-tap",
            Event::TimerElapsed(_) => "timer-elapsed",
            Event::Back => "back",
            Event::AnalysisFinished(..) => "analysis-finished",
            Event::Recover => "recover",
            Event::Teardown => "teardown",
        }
    }
}

/// Side effect requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AcquireCamera(Ticket),
    ReleaseCamera,
    Schedule {
        ticket: Ticket,
        timer: Timer,
        delay: Duration,
    },
    Cancel(Ticket),
    Analyze {
        ticket: Ticket,
        image: SecretImage,
    },
    DiscardAnalysis(Ticket),
}

/// Camera state while the Camera view is active
#[derive(Debug, Clone, PartialEq)]
pub enum CameraStatus {
    /// Acquisition requested, no answer yet; nothing to release
    Pending,
    Live,
    /// Permission denied or no camera; nothing to release
    NoAccess(CaptureError),
    /// Not in the Camera view
    Off,
}

/// Analysis state while the Result view is active
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    Loading(Ticket),
    Ready(AnalysisResult),
}

/// Why the controller cannot render a normal screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidState {
    MissingSecretImage(ViewState),
}

/// What the host should draw
#[derive(Debug, Clone, PartialEq)]
pub enum Screen<'a> {
    Setup,
    Camera {
        status: &'a CameraStatus,
        flash: bool,
    },
    Processing,
    Result {
        image: &'a SecretImage,
        analysis: &'a AnalysisState,
    },
    Invalid(InvalidState),
}

/// The single owner of session state
#[derive(Debug)]
pub struct Controller {
    view: ViewState,
    images: ImageStore,
    timings: Timings,
    camera: CameraStatus,
    camera_request: Option<Ticket>,
    hidden_reset: HiddenResetCounter,
    flash_timer: Option<Ticket>,
    processing_timer: Option<Ticket>,
    analysis: AnalysisState,
    next_ticket: u64,
}

impl Controller {
    pub fn new(timings: Timings) -> Self {
        Self {
            view: ViewState::Setup,
            images: ImageStore::new(),
            timings,
            camera: CameraStatus::Off,
            camera_request: None,
            hidden_reset: HiddenResetCounter::new(timings.hidden_reset_taps),
            flash_timer: None,
            processing_timer: None,
            analysis: AnalysisState::Idle,
            next_ticket: 0,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn secret_image(&self) -> Option<&SecretImage> {
        self.images.image()
    }

    pub fn camera_status(&self) -> &CameraStatus {
        &self.camera
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    /// Ticket of the camera open the Camera view is waiting for
    pub fn awaited_camera(&self) -> Option<Ticket> {
        self.camera_request
    }

    /// True while the Camera view owns a live stream
    pub fn wants_preview(&self) -> bool {
        self.view == ViewState::Camera && self.camera == CameraStatus::Live
    }

    /// The screen for the current state
    ///
    /// Camera, Processing and Result require a secret image; without one
    /// the controller reports an invalid state instead of guessing.
    pub fn screen(&self) -> Screen<'_> {
        match (self.view, self.images.image()) {
            (ViewState::Setup, _) => Screen::Setup,
            (view, None) => Screen::Invalid(InvalidState::MissingSecretImage(view)),
            (ViewState::Camera, Some(_)) => Screen::Camera {
                status: &self.camera,
                flash: self.flash_timer.is_some(),
            },
            (ViewState::Processing, Some(_)) => Screen::Processing,
            (ViewState::Result, Some(image)) => Screen::Result {
                image,
                analysis: &self.analysis,
            },
        }
    }

    /// Apply one event and return the effects the host must perform
    pub fn apply(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let from = self.view;
        let name = event.name();

        let effects = match (self.view, event) {
            (ViewState::Setup, Event::Confirm(image)) => self.confirm(image)?,

            (ViewState::Camera, Event::CameraReported(ticket, outcome)) => {
                self.camera_reported(ticket, outcome)
            }
            (ViewState::Camera, Event::ShutterPressed) => self.shutter()?,
            (ViewState::Camera, Event::HiddenTap) => {
                if self.hidden_reset.tap() {
                    tracing::info!("🤫 Hidden reset triggered");
                    self.reset()
                } else {
                    tracing::debug!(taps = self.hidden_reset.taps(), "Gallery tapped");
                    Vec::new()
                }
            }
            (ViewState::Setup, Event::Reset) => Vec::new(),
            (_, Event::Reset) => self.reset(),

            (_, Event::TimerElapsed(ticket)) => self.timer_elapsed(ticket),

            (ViewState::Result, Event::Back) => self.back_to_camera(),
            (_, Event::AnalysisFinished(ticket, result)) => self.analysis_finished(ticket, result),

            (_, Event::Recover) if !self.images.has_image() => self.reset(),
            (_, Event::Teardown) => self.teardown(),

            (_, Event::CameraReported(..)) => {
                // Stream opened for a view we already left
                tracing::debug!(view = ?self.view, "Late camera report");
                Vec::new()
            }

            (view, event) => {
                return Err(TransitionError::NotAllowed {
                    from: view,
                    event: event.name(),
                })
            }
        };

        if from != self.view {
            tracing::debug!(from = ?from, to = ?self.view, event = name, "View transition");
        }
        Ok(effects)
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    fn confirm(&mut self, image: SecretImage) -> Result<Vec<Effect>, TransitionError> {
        if image.is_empty() {
            return Err(TransitionError::EmptyImage);
        }
        tracing::info!(image = ?image, "🔒 Secret image set");
        self.images.set_image(image);
        Ok(self.enter_camera())
    }

    fn enter_camera(&mut self) -> Vec<Effect> {
        self.view = ViewState::Camera;
        self.camera = CameraStatus::Pending;
        self.hidden_reset.reset();
        let ticket = self.issue_ticket();
        self.camera_request = Some(ticket);
        vec![Effect::AcquireCamera(ticket)]
    }

    fn camera_reported(&mut self, ticket: Ticket, outcome: CaptureOutcome) -> Vec<Effect> {
        if self.camera_request != Some(ticket) {
            tracing::debug!(ticket = ?ticket, status = ?self.camera, "Ignoring stale camera report");
            return Vec::new();
        }
        self.camera_request = None;
        self.camera = match outcome {
            CaptureOutcome::Granted => CameraStatus::Live,
            CaptureOutcome::Denied(err) => CameraStatus::NoAccess(err),
        };
        Vec::new()
    }

    fn shutter(&mut self) -> Result<Vec<Effect>, TransitionError> {
        if matches!(self.camera, CameraStatus::NoAccess(_)) || self.flash_timer.is_some() {
            return Err(TransitionError::NotAllowed {
                from: self.view,
                event: "shutter",
            });
        }
        let ticket = self.issue_ticket();
        self.flash_timer = Some(ticket);
        Ok(vec![Effect::Schedule {
            ticket,
            timer: Timer::Flash,
            delay: self.timings.flash,
        }])
    }

    /// Stop the camera if this controller believes it holds one
    ///
    /// A pending open is forgotten; its stream is dropped when it arrives.
    fn leave_camera(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(ticket) = self.flash_timer.take() {
            effects.push(Effect::Cancel(ticket));
        }
        if self.camera == CameraStatus::Live {
            effects.push(Effect::ReleaseCamera);
        }
        self.camera_request = None;
        self.camera = CameraStatus::Off;
        effects
    }

    fn cancel_pending(&mut self) -> Vec<Effect> {
        let mut effects = self.leave_camera();
        if let Some(ticket) = self.processing_timer.take() {
            effects.push(Effect::Cancel(ticket));
        }
        if let AnalysisState::Loading(ticket) = self.analysis {
            effects.push(Effect::DiscardAnalysis(ticket));
        }
        self.analysis = AnalysisState::Idle;
        effects
    }

    fn reset(&mut self) -> Vec<Effect> {
        let effects = self.cancel_pending();
        self.images.clear_image();
        self.hidden_reset.reset();
        self.view = ViewState::Setup;
        tracing::info!("↩️  Back to setup, secret image cleared");
        effects
    }

    fn teardown(&mut self) -> Vec<Effect> {
        let effects = self.cancel_pending();
        self.images.clear_image();
        self.view = ViewState::Setup;
        effects
    }

    fn timer_elapsed(&mut self, ticket: Ticket) -> Vec<Effect> {
        if self.flash_timer == Some(ticket) && self.view == ViewState::Camera {
            self.flash_timer = None;
            let mut effects = self.leave_camera();
            let processing = self.issue_ticket();
            self.processing_timer = Some(processing);
            self.view = ViewState::Processing;
            effects.push(Effect::Schedule {
                ticket: processing,
                timer: Timer::Processing,
                delay: self.timings.processing,
            });
            return effects;
        }

        if self.processing_timer == Some(ticket) && self.view == ViewState::Processing {
            self.processing_timer = None;
            self.view = ViewState::Result;
            return match self.images.image().cloned() {
                Some(image) => {
                    let request = self.issue_ticket();
                    self.analysis = AnalysisState::Loading(request);
                    vec![Effect::Analyze {
                        ticket: request,
                        image,
                    }]
                }
                None => Vec::new(),
            };
        }

        tracing::debug!(ticket = ?ticket, view = ?self.view, "Ignoring stale timer");
        Vec::new()
    }

    fn back_to_camera(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let AnalysisState::Loading(ticket) = self.analysis {
            effects.push(Effect::DiscardAnalysis(ticket));
        }
        self.analysis = AnalysisState::Idle;
        effects.extend(self.enter_camera());
        effects
    }

    fn analysis_finished(&mut self, ticket: Ticket, result: AnalysisResult) -> Vec<Effect> {
        if self.view == ViewState::Result && self.analysis == AnalysisState::Loading(ticket) {
            self.analysis = AnalysisState::Ready(result);
        } else {
            tracing::debug!(ticket = ?ticket, view = ?self.view, "Discarding stale analysis");
        }
        Vec::new()
    }
}

#[cfg(test)]
impl Controller {
    /// Put the controller in a state its transitions never produce
    pub(crate) fn force_view(&mut self, view: ViewState) {
        self.view = view;
    }
}
