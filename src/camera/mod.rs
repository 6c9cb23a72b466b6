//! Capture Adapter
//!
//! Owns the live camera feed for the Camera view. At most one stream is
//! held at a time; `release` stops every track of it, and dropping the
//! adapter releases whatever is still held.
//!
//! Opening a device can take a while, so it is split in two: an
//! [`OpenRequest`] runs on a blocking thread, and the resulting
//! [`OpenedStream`] is installed back on the UI thread.
//!
//! The shutter never reads a frame. Frames are only pulled for the live
//! preview.

mod hidden_reset;
#[cfg(target_os = "linux")]
pub mod linux;

pub use hidden_reset::HiddenResetCounter;

use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::error::CaptureError;

/// Which camera to prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Parameters for a camera acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub device_index: usize,
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            device_index: 0,
            facing: Facing::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// Pixel layout of a preview frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Encoded JPEG (MJPEG cameras)
    Jpeg,
    /// Tightly packed RGBA8
    Rgba,
}

/// One frame of the live preview
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// Increments for every frame delivered by a stream
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data: Arc<Vec<u8>>,
}

/// A live camera stream
pub trait LiveStream: Send {
    /// Most recent frame for the preview, if any arrived yet
    fn latest_frame(&self) -> Option<PreviewFrame>;

    /// Number of tracks still running
    fn track_count(&self) -> usize;

    /// Stop every track. Must be idempotent.
    fn stop(&mut self);
}

/// Platform camera access
///
/// `open` may block for as long as the device takes to start streaming;
/// callers run it off the UI thread through [`OpenRequest`].
pub trait CameraBackend: Send + Sync {
    /// Open a stream, or report why the camera is unavailable
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn LiveStream>, CaptureError>;
}

/// Backend for platforms without camera support
#[cfg_attr(target_os = "linux", allow(dead_code))]
#[derive(Debug, Default)]
pub struct UnavailableBackend;

impl CameraBackend for UnavailableBackend {
    fn open(&self, _request: &CaptureRequest) -> Result<Box<dyn LiveStream>, CaptureError> {
        Err(CaptureError::NoDevice)
    }
}

/// Backend for the current platform
pub fn default_backend() -> Arc<dyn CameraBackend> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(linux::V4lBackend)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(UnavailableBackend)
    }
}

/// Result of an acquisition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Granted,
    Denied(CaptureError),
}

/// A camera open that has not run yet
pub struct OpenRequest {
    backend: Arc<dyn CameraBackend>,
    request: CaptureRequest,
}

impl OpenRequest {
    /// Open the device on the calling thread
    pub fn run(self) -> OpenedStream {
        OpenedStream::new(self.backend.open(&self.request))
    }

    /// Open the device on tokio's blocking pool
    pub async fn run_in_background(self) -> OpenedStream {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .unwrap_or_else(|err| OpenedStream::new(Err(CaptureError::Device(err.to_string()))))
    }
}

type OpenResult = Result<Box<dyn LiveStream>, CaptureError>;

/// Holds an opened stream until it is installed or dropped
struct Slot(Mutex<Option<OpenResult>>);

impl Drop for Slot {
    fn drop(&mut self) {
        if let Ok(slot) = self.0.get_mut() {
            if let Some(Ok(mut stream)) = slot.take() {
                tracing::debug!("Uninstalled camera stream dropped");
                stream.stop();
            }
        }
    }
}

/// The answer of a finished [`OpenRequest`]
///
/// Cheap to clone so it can travel in a UI message. The stream can be
/// taken once; if nobody takes it, it is stopped when the last clone is
/// dropped.
#[derive(Clone)]
pub struct OpenedStream(Arc<Slot>);

impl OpenedStream {
    fn new(result: OpenResult) -> Self {
        Self(Arc::new(Slot(Mutex::new(Some(result)))))
    }

    fn take(&self) -> Option<OpenResult> {
        self.0 .0.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Stop a stream nobody is waiting for
    ///
    /// Returns true if a live stream was stopped.
    pub fn discard(&self) -> bool {
        match self.take() {
            Some(Ok(mut stream)) => {
                stream.stop();
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for OpenedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.0 .0.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(Ok(_)) => "stream",
                Some(Err(_)) => "denied",
                None => "taken",
            },
            Err(_) => "poisoned",
        };
        f.debug_tuple("OpenedStream").field(&state).finish()
    }
}

/// Scoped owner of the single live stream
pub struct CaptureAdapter {
    backend: Arc<dyn CameraBackend>,
    request: CaptureRequest,
    active: Option<Box<dyn LiveStream>>,
}

impl CaptureAdapter {
    pub fn new(backend: Arc<dyn CameraBackend>, request: CaptureRequest) -> Self {
        Self {
            backend,
            request,
            active: None,
        }
    }

    /// Prepare a camera access request
    pub fn open_request(&self) -> OpenRequest {
        OpenRequest {
            backend: Arc::clone(&self.backend),
            request: self.request.clone(),
        }
    }

    /// Take ownership of an opened stream
    ///
    /// Any stream still held is released first.
    pub fn install(&mut self, opened: &OpenedStream) -> CaptureOutcome {
        if self.active.is_some() {
            tracing::warn!("Camera acquired while a stream was still held; releasing it first");
            self.release();
        }

        match opened.take() {
            Some(Ok(stream)) => {
                tracing::info!(
                    device = self.request.device_index,
                    facing = ?self.request.facing,
                    tracks = stream.track_count(),
                    "📷 Camera stream started"
                );
                self.active = Some(stream);
                CaptureOutcome::Granted
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "🚫 Camera unavailable");
                CaptureOutcome::Denied(err)
            }
            None => CaptureOutcome::Denied(CaptureError::Device("stream already installed".to_string())),
        }
    }

    /// Stop every track of the held stream
    ///
    /// Returns false if nothing was held.
    pub fn release(&mut self) -> bool {
        match self.active.take() {
            Some(mut stream) => {
                stream.stop();
                tracing::info!("📴 Camera stream released");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Latest preview frame from the held stream
    pub fn latest_frame(&self) -> Option<PreviewFrame> {
        self.active.as_ref().and_then(|stream| stream.latest_frame())
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureAdapter")
            .field("request", &self.request)
            .field("active", &self.active.is_some())
            .finish()
    }
}
