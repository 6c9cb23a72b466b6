//! Video4Linux2 camera backend
//!
//! The device is opened and streamed on a worker thread. `open` waits
//! for the worker to report that streaming started (or failed), so it
//! must not be called from the UI thread. Stopping the stream joins the
//! worker; dropping the mmap stream turns the camera off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::{CameraBackend, CaptureRequest, FrameFormat, LiveStream, PreviewFrame};
use crate::error::CaptureError;

/// Number of mmap buffers queued with the driver
const BUFFER_COUNT: u32 = 4;

type SharedFrame = Arc<Mutex<Option<PreviewFrame>>>;

/// Opens `/dev/video{device_index}`
#[derive(Debug, Default)]
pub struct V4lBackend;

impl CameraBackend for V4lBackend {
    fn open(&self, request: &CaptureRequest) -> Result<Box<dyn LiveStream>, CaptureError> {
        let running = Arc::new(AtomicBool::new(true));
        let latest: SharedFrame = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = {
            let running = Arc::clone(&running);
            let latest = Arc::clone(&latest);
            let request = request.clone();
            std::thread::Builder::new()
                .name("camera-preview".to_string())
                .spawn(move || stream_frames(request, running, latest, ready_tx))
                .map_err(|e| CaptureError::Device(e.to_string()))?
        };

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::Device("camera worker exited".to_string())));

        match ready {
            Ok(()) => Ok(Box::new(V4lStream {
                running,
                latest,
                worker: Some(worker),
            })),
            Err(err) => {
                let _ = worker.join();
                Err(err)
            }
        }
    }
}

/// Worker body: open, negotiate, stream until told to stop
fn stream_frames(
    request: CaptureRequest,
    running: Arc<AtomicBool>,
    latest: SharedFrame,
    ready: mpsc::Sender<Result<(), CaptureError>>,
) {
    let setup = || -> Result<(Device, v4l::Format), CaptureError> {
        let device = Device::new(request.device_index)?;
        let mut format = device.format()?;
        format.width = request.ideal_width;
        format.height = request.ideal_height;
        format.fourcc = FourCC::new(b"MJPG");
        let format = device.set_format(&format)?;
        Ok((device, format))
    };

    let (device, format) = match setup() {
        Ok(opened) => opened,
        Err(err) => {
            let _ = ready.send(Err(err));
            return;
        }
    };

    let frame_format = if format.fourcc == FourCC::new(b"MJPG") {
        FrameFormat::Jpeg
    } else if format.fourcc == FourCC::new(b"YUYV") {
        FrameFormat::Rgba
    } else {
        let _ = ready.send(Err(CaptureError::Device(format!(
            "unsupported pixel format {}",
            format.fourcc
        ))));
        return;
    };

    let mut stream = match Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(err) => {
            let _ = ready.send(Err(err.into()));
            return;
        }
    };

    tracing::debug!(
        width = format.width,
        height = format.height,
        fourcc = %format.fourcc,
        facing = ?request.facing,
        "Camera format negotiated"
    );
    let _ = ready.send(Ok(()));

    let mut sequence = 0u64;
    while running.load(Ordering::Acquire) {
        let (buffer, meta) = match stream.next() {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(error = %err, "⚠️  Camera stream interrupted");
                break;
            }
        };

        let used = (meta.bytesused as usize).min(buffer.len());
        let data = match frame_format {
            FrameFormat::Jpeg => buffer[..used].to_vec(),
            FrameFormat::Rgba => {
                yuyv_to_rgba(&buffer[..used], format.width, format.height, format.stride)
            }
        };
        if data.is_empty() {
            continue;
        }

        sequence += 1;
        if let Ok(mut slot) = latest.lock() {
            *slot = Some(PreviewFrame {
                sequence,
                width: format.width,
                height: format.height,
                format: frame_format,
                data: Arc::new(data),
            });
        }
    }
}

/// A running V4L2 capture (one video track)
struct V4lStream {
    running: Arc<AtomicBool>,
    latest: SharedFrame,
    worker: Option<JoinHandle<()>>,
}

impl LiveStream for V4lStream {
    fn latest_frame(&self) -> Option<PreviewFrame> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }

    fn track_count(&self) -> usize {
        usize::from(self.worker.is_some())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Camera worker panicked");
            }
        }
        if let Ok(mut slot) = self.latest.lock() {
            *slot = None;
        }
    }
}

impl Drop for V4lStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Convert packed YUYV 4:2:2 to RGBA8 (BT.601)
///
/// `stride` is the driver's bytes per line; rows may be padded past
/// `width * 2`. Returns an empty buffer if `data` is shorter than one frame.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, stride: u32) -> Vec<u8> {
    let (width, height) = (width as usize, height as usize);
    let row_bytes = width * 2;
    let stride = (stride as usize).max(row_bytes);
    if height == 0 || data.len() < stride * (height - 1) + row_bytes {
        return Vec::new();
    }

    let mut rgba = Vec::with_capacity(width * height * 4);
    for row in data.chunks(stride).take(height) {
        for chunk in row[..row_bytes].chunks_exact(4) {
            let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            for y in [y0, y1] {
                let [r, g, b] = yuv_to_rgb(y, u, v);
                rgba.extend_from_slice(&[r, g, b, 255]);
            }
        }
    }
    rgba
}

fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = y as f32 - 16.0;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;

    let r = 1.164 * c + 1.596 * e;
    let g = 1.164 * c - 0.392 * d - 0.813 * e;
    let b = 1.164 * c + 2.017 * d;

    [
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    ]
}
