//! End-to-end runs of the trick against fake hardware and a fake analyzer

use std::sync::Arc;
use std::time::Duration;

use crate::analysis::testing::RecordingAnalyzer;
use crate::analysis::{AnalysisResult, Analyzer};
use crate::camera::testing::{adapter, CameraLog, FakeBackend};
use crate::error::CaptureError;
use crate::state::data::SecretImage;
use crate::state::flow::{
    AnalysisState, CameraStatus, Effect, Event, Screen, Timer, Timings, ViewState,
};
use crate::state::session::Session;

/// Bytes of a tiny JPEG header standing in for cat.jpg
const CAT_JPG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

fn only_timer(effects: &[Effect], expected: Timer) -> (crate::state::flow::Ticket, Duration) {
    match effects {
        [Effect::Schedule { ticket, timer, delay }] if *timer == expected => (*ticket, *delay),
        other => panic!("expected a single {:?} timer, got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_upload_shoot_and_reveal() {
    let log = Arc::new(CameraLog::default());
    let mut session = Session::new(
        Timings::default(),
        adapter(FakeBackend::granting(Arc::clone(&log))),
    );
    let analyzer = RecordingAnalyzer::new(AnalysisResult::new("Feline Oracle", "It chose you."));

    // Setup: upload cat.jpg and confirm
    let cat = SecretImage::from_bytes(Some("cat.jpg".into()), CAT_JPG.to_vec()).unwrap();
    assert_eq!(cat.mime(), "image/jpeg");
    let effects = session.dispatch(Event::Confirm(cat.clone())).unwrap();
    assert!(matches!(&effects[..], [Effect::AcquireCamera(_)]));

    // Camera: waiting for the device, then live preview
    assert_eq!(session.view(), ViewState::Camera);
    assert!(matches!(
        session.screen(),
        Screen::Camera { status: CameraStatus::Pending, flash: false }
    ));
    assert!(session.settle(effects).is_empty());
    assert!(matches!(
        session.screen(),
        Screen::Camera { status: CameraStatus::Live, flash: false }
    ));
    assert!(session.preview_frame().is_some());

    // Shutter: flash for ~150ms
    let effects = session.dispatch(Event::ShutterPressed).unwrap();
    let (flash, delay) = only_timer(&effects, Timer::Flash);
    assert_eq!(delay, Duration::from_millis(150));
    assert!(matches!(session.screen(), Screen::Camera { flash: true, .. }));

    // Flash over: Processing, camera off
    let effects = session.dispatch(Event::TimerElapsed(flash)).unwrap();
    let (processing, delay) = only_timer(&effects, Timer::Processing);
    assert_eq!(delay, Duration::from_millis(1500));
    assert_eq!(session.screen(), Screen::Processing);
    assert_eq!(log.live_tracks(), 0);

    // 1500ms later: Result with exactly one analysis request
    let effects = session.dispatch(Event::TimerElapsed(processing)).unwrap();
    let (ticket, image) = match &effects[..] {
        [Effect::Analyze { ticket, image }] => (*ticket, image.clone()),
        other => panic!("expected one analysis request, got {:?}", other),
    };
    let result = analyzer.analyze(&image).await;
    session.dispatch(Event::AnalysisFinished(ticket, result.clone())).unwrap();

    match session.screen() {
        Screen::Result { image, analysis } => {
            assert_eq!(image.name(), Some("cat.jpg"));
            assert_eq!(image.bytes().as_slice(), CAT_JPG);
            assert_eq!(analysis, &AnalysisState::Ready(result));
        }
        other => panic!("expected result screen, got {:?}", other),
    }

    let calls = analyzer.calls();
    assert_eq!(calls, vec![cat.base64_payload().to_string()]);
    assert!(!calls[0].starts_with("data:"));

    // Back to Camera keeps the secret and reopens the camera
    let effects = session.dispatch(Event::Back).unwrap();
    session.settle(effects);
    assert_eq!(session.view(), ViewState::Camera);
    assert_eq!(session.controller().secret_image(), Some(&cat));
    assert_eq!(log.opens(), 2);
}

#[test]
fn test_camera_denied_shows_no_access_without_release() {
    let log = Arc::new(CameraLog::default());
    let mut session = Session::new(
        Timings::default(),
        adapter(FakeBackend::denying(Arc::clone(&log))),
    );
    let cat = SecretImage::from_bytes(Some("cat.jpg".into()), CAT_JPG.to_vec()).unwrap();

    let effects = session.dispatch(Event::Confirm(cat)).unwrap();
    assert!(session.settle(effects).is_empty());
    assert_eq!(
        session.screen(),
        Screen::Camera {
            status: &CameraStatus::NoAccess(CaptureError::PermissionDenied),
            flash: false,
        }
    );
    assert!(session.preview_frame().is_none());

    // Leaving performs no release: nothing was acquired
    let effects = session.dispatch(Event::Reset).unwrap();
    assert!(effects.is_empty());
    assert_eq!(log.stops(), 0);
    assert_eq!(session.view(), ViewState::Setup);
}

#[test]
fn test_rapid_back_out_of_result_discards_analysis() {
    let log = Arc::new(CameraLog::default());
    let mut session = Session::new(
        Timings::default(),
        adapter(FakeBackend::granting(Arc::clone(&log))),
    );
    let cat = SecretImage::from_bytes(Some("cat.jpg".into()), CAT_JPG.to_vec()).unwrap();
    let effects = session.dispatch(Event::Confirm(cat)).unwrap();
    session.settle(effects);

    let (flash, _) = only_timer(&session.dispatch(Event::ShutterPressed).unwrap(), Timer::Flash);
    let (processing, _) =
        only_timer(&session.dispatch(Event::TimerElapsed(flash)).unwrap(), Timer::Processing);
    let effects = session.dispatch(Event::TimerElapsed(processing)).unwrap();
    let ticket = match &effects[..] {
        [Effect::Analyze { ticket, .. }] => *ticket,
        other => panic!("unexpected {:?}", other),
    };

    let effects = session.dispatch(Event::Back).unwrap();
    assert!(matches!(
        &effects[..],
        [Effect::DiscardAnalysis(t), Effect::AcquireCamera(_)] if *t == ticket
    ));
    session.settle(effects);

    session
        .dispatch(Event::AnalysisFinished(ticket, AnalysisResult::new("Late", "Too late.")))
        .unwrap();
    assert_eq!(session.view(), ViewState::Camera);
    assert_eq!(session.controller().analysis(), &AnalysisState::Idle);
    assert!(session.camera_active());
}
