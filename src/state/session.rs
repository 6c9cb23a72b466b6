//! Session: the view controller wired to the camera
//!
//! Releasing the camera happens here, synchronously. Opening it does not:
//! `AcquireCamera` is returned to the caller together with timers and
//! analysis requests, and the opened stream comes back through
//! [`Session::camera_opened`].

use std::time::Duration;

use crate::camera::{CaptureAdapter, OpenRequest, OpenedStream, PreviewFrame};
use crate::error::TransitionError;
use crate::state::flow::{Controller, Effect, Event, Screen, Ticket, Timings, ViewState};

#[derive(Debug)]
pub struct Session {
    controller: Controller,
    camera: CaptureAdapter,
}

impl Session {
    pub fn new(timings: Timings, camera: CaptureAdapter) -> Self {
        Self {
            controller: Controller::new(timings),
            camera,
        }
    }

    /// Apply an event and release the camera if asked to
    ///
    /// Returns the effects left for the caller: `AcquireCamera`,
    /// `Schedule`, `Cancel`, `Analyze` and `DiscardAnalysis`.
    pub fn dispatch(&mut self, event: Event) -> Result<Vec<Effect>, TransitionError> {
        let effects = self.controller.apply(event)?;
        let mut deferred = Vec::with_capacity(effects.len());

        for effect in effects {
            match effect {
                Effect::ReleaseCamera => {
                    self.camera.release();
                }
                other => deferred.push(other),
            }
        }

        Ok(deferred)
    }

    /// Camera access request for an `AcquireCamera` effect
    pub fn open_request(&self) -> OpenRequest {
        self.camera.open_request()
    }

    /// Hand back the stream opened for `ticket`
    ///
    /// A stream nobody waits for any more is stopped right away.
    pub fn camera_opened(
        &mut self,
        ticket: Ticket,
        opened: &OpenedStream,
    ) -> Result<Vec<Effect>, TransitionError> {
        if self.controller.awaited_camera() != Some(ticket) {
            if opened.discard() {
                tracing::info!(ticket = ?ticket, "📴 Late camera stream stopped");
            }
            return Ok(Vec::new());
        }

        let outcome = self.camera.install(opened);
        self.dispatch(Event::CameraReported(ticket, outcome))
    }

    pub fn view(&self) -> ViewState {
        self.controller.view()
    }

    pub fn screen(&self) -> Screen<'_> {
        self.controller.screen()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_active()
    }

    /// Latest live preview frame, only while the Camera view is live
    pub fn preview_frame(&self) -> Option<PreviewFrame> {
        if self.controller.wants_preview() {
            self.camera.latest_frame()
        } else {
            None
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Camera effects are handled here; the rest die with the host
        if let Ok(effects) = self.controller.apply(Event::Teardown) {
            if effects.contains(&Effect::ReleaseCamera) {
                self.camera.release();
            }
        }
    }
}

/// Resolve after `delay` with the ticket of the timer that fired
pub async fn elapse(ticket: Ticket, delay: Duration) -> Ticket {
    tokio::time::sleep(delay).await;
    ticket
}

#[cfg(test)]
impl Session {
    /// Run every pending camera open inline and return the other effects
    pub(crate) fn settle(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut rest = Vec::new();
        for effect in effects {
            match effect {
                Effect::AcquireCamera(ticket) => {
                    let opened = self.open_request().run();
                    rest.extend(self.camera_opened(ticket, &opened).unwrap());
                }
                other => rest.push(other),
            }
        }
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::testing::{adapter, CameraLog, FakeBackend};
    use crate::state::data::SecretImage;
    use crate::state::flow::{CameraStatus, Timer};
    use std::sync::Arc;

    fn image() -> SecretImage {
        SecretImage::from_bytes(Some("cat.jpg".into()), vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap()
    }

    fn session(log: &Arc<CameraLog>) -> Session {
        Session::new(
            Timings::default(),
            adapter(FakeBackend::granting(Arc::clone(log))),
        )
    }

    fn acquire_ticket(effects: &[Effect]) -> Ticket {
        match effects {
            [Effect::AcquireCamera(ticket)] => *ticket,
            other => panic!("expected a camera open, got {:?}", other),
        }
    }

    #[test]
    fn test_confirm_requests_camera_without_opening_it() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);

        let effects = session.dispatch(Event::Confirm(image())).unwrap();
        acquire_ticket(&effects);
        assert_eq!(log.opens(), 0);
        assert_eq!(session.controller().camera_status(), &CameraStatus::Pending);
        assert!(!session.camera_active());
    }

    #[test]
    fn test_opened_stream_goes_live() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);

        let effects = session.dispatch(Event::Confirm(image())).unwrap();
        assert!(session.settle(effects).is_empty());
        assert!(session.camera_active());
        assert_eq!(log.opens(), 1);
        assert!(session.preview_frame().is_some());
    }

    #[test]
    fn test_reset_while_pending_stops_late_stream() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);

        let ticket = acquire_ticket(&session.dispatch(Event::Confirm(image())).unwrap());
        let open = session.open_request();

        session.dispatch(Event::Reset).unwrap();
        assert_eq!(session.view(), ViewState::Setup);

        // The device answers after the user already left
        let opened = open.run();
        assert_eq!(log.live_tracks(), 2);
        assert!(session.camera_opened(ticket, &opened).unwrap().is_empty());

        assert_eq!(log.live_tracks(), 0);
        assert_eq!(log.stops(), 1);
        assert!(!session.camera_active());
        assert_eq!(session.view(), ViewState::Setup);
    }

    #[test]
    fn test_stale_stream_from_previous_visit_is_stopped() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);

        let first = acquire_ticket(&session.dispatch(Event::Confirm(image())).unwrap());
        let stale = session.open_request().run();
        session.dispatch(Event::Reset).unwrap();

        let second = acquire_ticket(&session.dispatch(Event::Confirm(image())).unwrap());
        session.camera_opened(first, &stale).unwrap();
        assert!(!session.camera_active());
        assert_eq!(log.live_tracks(), 0);

        let fresh = session.open_request().run();
        session.camera_opened(second, &fresh).unwrap();
        assert!(session.camera_active());
        assert_eq!(log.live_tracks(), 2);
    }

    #[test]
    fn test_reset_releases_camera_whatever_happened_before() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);
        let effects = session.dispatch(Event::Confirm(image())).unwrap();
        session.settle(effects);
        session.dispatch(Event::ShutterPressed).unwrap();

        session.dispatch(Event::Reset).unwrap();
        assert_eq!(session.view(), ViewState::Setup);
        assert!(session.controller().secret_image().is_none());
        assert_eq!(log.live_tracks(), 0);
        assert!(session.preview_frame().is_none());
    }

    #[test]
    fn test_rejected_event_leaves_camera_alone() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);
        let effects = session.dispatch(Event::Confirm(image())).unwrap();
        session.settle(effects);
        assert!(session.dispatch(Event::Back).is_err());
        assert!(session.camera_active());
    }

    #[test]
    fn test_drop_releases_camera() {
        let log = Arc::new(CameraLog::default());
        {
            let mut session = session(&log);
            let effects = session.dispatch(Event::Confirm(image())).unwrap();
            session.settle(effects);
        }
        assert_eq!(log.live_tracks(), 0);
        assert_eq!(log.stops(), 1);
    }

    fn only_timer(effects: &[Effect]) -> (Ticket, Duration) {
        match effects {
            [Effect::Schedule { ticket, delay, .. }] => (*ticket, *delay),
            other => panic!("expected one timer, got {:?}", other),
        }
    }

    /// Drive a live session through the flash into Processing
    fn processing(session: &mut Session) -> (Ticket, Duration) {
        let effects = session.dispatch(Event::Confirm(image())).unwrap();
        session.settle(effects);
        let (flash, _) = only_timer(&session.dispatch(Event::ShutterPressed).unwrap());
        let effects = session.dispatch(Event::TimerElapsed(flash)).unwrap();
        assert!(matches!(
            &effects[..],
            [Effect::Schedule { timer: Timer::Processing, .. }]
        ));
        only_timer(&effects)
    }

    #[tokio::test(start_paused = true)]
    async fn test_processing_timer_fires_after_exact_delay() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);
        let (ticket, delay) = processing(&mut session);

        let started = tokio::time::Instant::now();
        let timer = tokio::spawn(elapse(ticket, delay));
        tokio::task::yield_now().await;

        tokio::time::advance(delay - Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert!(!timer.is_finished());
        assert_eq!(session.view(), ViewState::Processing);

        let fired = timer.await.unwrap();
        assert_eq!(fired, ticket);
        assert!(started.elapsed() >= Duration::from_millis(1500));

        let effects = session.dispatch(Event::TimerElapsed(fired)).unwrap();
        assert_eq!(session.view(), ViewState::Result);
        assert!(matches!(&effects[..], [Effect::Analyze { .. }]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let log = Arc::new(CameraLog::default());
        let mut session = session(&log);
        let (ticket, delay) = processing(&mut session);
        let timer = tokio::spawn(elapse(ticket, delay));

        let effects = session.dispatch(Event::Reset).unwrap();
        assert_eq!(effects, vec![Effect::Cancel(ticket)]);
        timer.abort();

        tokio::time::advance(delay * 2).await;
        assert!(timer.await.unwrap_err().is_cancelled());
        assert_eq!(session.view(), ViewState::Setup);
    }
}
