use iced::widget::image;
use iced::{task, Element, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod analysis;
mod camera;
mod config;
mod error;
mod share;
mod state;
mod ui;

#[cfg(test)]
mod scenarios;

use analysis::{build_analyzer, AnalysisResult, Analyzer};
use camera::{CaptureAdapter, OpenedStream};
use config::Config;
use error::{ImageError, TransitionError};
use share::SharePayload;
use state::data::{load_secret_image, SecretImage};
use state::flow::{AnalysisState, Effect, Event, Screen, Ticket, Timings, ViewState};
use state::session::{self, Session};
use ui::setup::SetupForm;

/// Preview refresh interval (~30 fps)
const PREVIEW_INTERVAL: Duration = Duration::from_millis(33);

/// Main application state
struct MagicShutter {
    config: Config,
    /// View controller plus the camera it drives
    session: Session,
    analyzer: Arc<dyn Analyzer>,
    setup: SetupForm,
    /// Display handle for the confirmed secret image
    secret_handle: Option<image::Handle>,
    /// Last preview frame shown, keyed by its sequence number
    preview: Option<(u64, image::Handle)>,
    /// Running timers and analysis requests, abortable by ticket
    tasks: HashMap<Ticket, task::Handle>,
    /// Transient feedback such as "Copied!"
    notice: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked the upload area in Setup
    PickImage,
    /// Background file read finished
    ImageLoaded(Result<SecretImage, ImageError>),
    ConfirmSetup,
    ShareApp,
    Shutter,
    /// Visible back button in the Camera view
    BackToSetup,
    /// Tap on the disguised gallery button
    HiddenTap,
    /// Decorative; the camera never flips
    FlipCamera,
    PreviewTick,
    TimerElapsed(Ticket),
    /// Back button in the Result view
    BackToCamera,
    ShareResult,
    AnalysisFinished(Ticket, AnalysisResult),
    /// A camera open finished on the blocking pool
    CameraOpened(Ticket, OpenedStream),
    /// "Start over" on the invalid-state screen
    Recover,
}

impl MagicShutter {
    fn new() -> (Self, Task<Message>) {
        let config = Config::load_or_default();

        let timings = Timings {
            flash: config.flash_duration(),
            processing: config.processing_delay(),
            hidden_reset_taps: config.hidden_reset_taps,
        };
        let camera = CaptureAdapter::new(camera::default_backend(), config.capture_request());

        let analyzer = build_analyzer(&config);

        if config.api_key.is_none() {
            tracing::warn!("⚠️  No API key configured; analysis will show a configuration error");
        }
        tracing::info!(locale = ?config.locale, model = %config.model, "🪄 Magic Shutter initialized");

        (
            MagicShutter {
                session: Session::new(timings, camera),
                config,
                analyzer,
                setup: SetupForm::default(),
                secret_handle: None,
                preview: None,
                tasks: HashMap::new(),
                notice: None,
            },
            Task::none(),
        )
    }

    fn strings(&self) -> &'static ui::Strings {
        ui::strings(self.config.locale)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickImage => {
                if self.setup.is_loading() {
                    return Task::none();
                }
                let file = FileDialog::new()
                    .set_title("Choose the secret photo")
                    .add_filter("Images", &["jpg", "jpeg", "png", "gif", "webp", "bmp"])
                    .pick_file();

                match file {
                    Some(path) => {
                        tracing::debug!(path = %path.display(), "Loading secret image");
                        self.setup.begin_load();
                        Task::perform(load_secret_image(path), Message::ImageLoaded)
                    }
                    None => Task::none(),
                }
            }
            Message::ImageLoaded(result) => {
                self.setup.loaded(result);
                Task::none()
            }
            Message::ConfirmSetup => {
                let Some(draft) = self.setup.take_draft() else {
                    return Task::none();
                };
                let task = self.dispatch(Event::Confirm(draft.image.clone()));
                if self.session.view() == ViewState::Camera {
                    self.secret_handle = Some(draft.handle);
                } else {
                    self.setup.restore(draft);
                }
                task
            }
            Message::ShareApp => {
                let payload = SharePayload::app(self.config.locale, self.config.share_url.as_deref());
                self.notice = Some(self.strings().app_link_copied.to_string());
                iced::clipboard::write(payload.clipboard_text())
            }
            Message::Shutter => self.dispatch(Event::ShutterPressed),
            Message::BackToSetup => self.dispatch(Event::Reset),
            Message::HiddenTap => self.dispatch(Event::HiddenTap),
            Message::FlipCamera => {
                tracing::debug!("Flip pressed; only one camera is used");
                Task::none()
            }
            Message::PreviewTick => {
                match self.session.preview_frame() {
                    Some(frame) => {
                        let fresh = self
                            .preview
                            .as_ref()
                            .map_or(true, |(sequence, _)| *sequence != frame.sequence);
                        if fresh {
                            self.preview = Some((frame.sequence, ui::camera::preview_handle(&frame)));
                        }
                    }
                    None => self.preview = None,
                }
                Task::none()
            }
            Message::TimerElapsed(ticket) => {
                self.tasks.remove(&ticket);
                self.dispatch(Event::TimerElapsed(ticket))
            }
            Message::BackToCamera => self.dispatch(Event::Back),
            Message::ShareResult => {
                let AnalysisState::Ready(result) = self.session.controller().analysis() else {
                    return Task::none();
                };
                let payload = SharePayload::analysis(
                    self.config.locale,
                    result,
                    self.config.share_url.as_deref(),
                );
                self.notice = Some(self.strings().result_copied.to_string());
                iced::clipboard::write(payload.clipboard_text())
            }
            Message::AnalysisFinished(ticket, result) => {
                self.tasks.remove(&ticket);
                self.dispatch(Event::AnalysisFinished(ticket, result))
            }
            Message::CameraOpened(ticket, opened) => {
                let before = self.session.view();
                let result = self.session.camera_opened(ticket, &opened);
                self.settle(before, result)
            }
            Message::Recover => self.dispatch(Event::Recover),
        }
    }

    /// Feed an event to the session and turn its effects into tasks
    fn dispatch(&mut self, event: Event) -> Task<Message> {
        let before = self.session.view();
        let result = self.session.dispatch(event);
        self.settle(before, result)
    }

    /// Sync view-side state after the session moved and run its effects
    fn settle(
        &mut self,
        before: ViewState,
        result: Result<Vec<Effect>, TransitionError>,
    ) -> Task<Message> {
        let effects = match result {
            Ok(effects) => effects,
            Err(err) => {
                tracing::debug!(error = %err, "Event ignored");
                return Task::none();
            }
        };

        let after = self.session.view();
        if before != after {
            tracing::debug!(
                from = ?before,
                to = ?after,
                camera = self.session.camera_active(),
                "Screen changed"
            );
            self.notice = None;
        }
        if after == ViewState::Setup {
            self.secret_handle = None;
        }
        if !self.session.controller().wants_preview() {
            self.preview = None;
        }

        Task::batch(effects.into_iter().map(|effect| self.run_effect(effect)))
    }

    fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::Schedule { ticket, timer, delay } => {
                tracing::trace!(ticket = ?ticket, timer = ?timer, "Timer scheduled");
                let (task, handle) =
                    Task::perform(session::elapse(ticket, delay), Message::TimerElapsed)
                        .abortable();
                self.tasks.insert(ticket, handle);
                task
            }
            Effect::Analyze { ticket, image } => {
                tracing::info!(image = ?image, "🔮 Analyzing secret image");
                let analyzer = Arc::clone(&self.analyzer);
                let (task, handle) = Task::perform(
                    async move { analyzer.analyze(&image).await },
                    move |result| Message::AnalysisFinished(ticket, result),
                )
                .abortable();
                self.tasks.insert(ticket, handle);
                task
            }
            Effect::Cancel(ticket) | Effect::DiscardAnalysis(ticket) => {
                if let Some(handle) = self.tasks.remove(&ticket) {
                    handle.abort();
                }
                Task::none()
            }
            Effect::AcquireCamera(ticket) => {
                tracing::debug!(ticket = ?ticket, "Opening camera");
                Task::perform(
                    self.session.open_request().run_in_background(),
                    move |opened| Message::CameraOpened(ticket, opened),
                )
            }
            // Performed by the session before it returns
            Effect::ReleaseCamera => Task::none(),
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let strings = self.strings();

        match self.session.screen() {
            Screen::Setup => ui::setup::view(strings, self.setup.picker(), self.notice.as_deref()),
            Screen::Camera { status, flash } => ui::camera::view(
                strings,
                status,
                flash,
                self.preview.as_ref().map(|(_, handle)| handle),
            ),
            Screen::Processing => ui::processing::view(strings),
            Screen::Result { analysis, .. } => ui::result::view(
                strings,
                self.secret_handle.as_ref(),
                analysis,
                self.notice.as_deref(),
            ),
            Screen::Invalid(_) => ui::invalid(strings),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.session.controller().wants_preview() {
            iced::time::every(PREVIEW_INTERVAL).map(|_| Message::PreviewTick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("magic_shutter=info")),
        )
        .init();

    iced::application("Magic Shutter", MagicShutter::update, MagicShutter::view)
        .subscription(MagicShutter::subscription)
        .theme(MagicShutter::theme)
        .centered()
        .run_with(MagicShutter::new)
}
