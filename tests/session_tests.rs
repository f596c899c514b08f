// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera session facade
//!
//! Drives a session end to end with a scripted capture device and a
//! counting buffer pool, the way a hosting UI would.

use camera_runtime::device::{
    CodeBounds, CodeFrame, CodeKind, RecordingCompletion, ScannedCode, ShutterKind,
};
use camera_runtime::errors::DeviceFault;
use camera_runtime::frame::BufferReclaim;
use camera_runtime::processor::{FrameProcessor, ProcessorSlot};
use camera_runtime::recording::RecordingCallbacks;
use camera_runtime::session::EventHandlers;
use camera_runtime::{
    CameraError, CameraResult, CameraSession, CaptureDevice, Flash, Frame, FrameBuffer,
    NativeEvent, Orientation, PhotoOptions, Photo, PixelFormat, Point, RecordVideoOptions,
    RecordingState, SessionConfig, SnapshotOptions, VideoFile,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Opt into session logs for a test run (`RUST_LOG=camera_runtime=trace`)
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Buffer pool that counts reclaims
struct CountingPool {
    reclaimed: AtomicU32,
}

impl CountingPool {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            reclaimed: AtomicU32::new(0),
        })
    }
}

impl BufferReclaim for CountingPool {
    fn reclaim(&self, _buffer: FrameBuffer) {
        self.reclaimed.fetch_add(1, Ordering::SeqCst);
    }
}

fn new_frame(pool: &Arc<CountingPool>, id: u64) -> Frame {
    Frame::new(
        FrameBuffer {
            id,
            data: Arc::from(vec![0u8; 64].as_slice()),
            width: 4,
            height: 4,
            format: PixelFormat::Rgba,
            stride: 16,
            captured_at: Instant::now(),
        },
        pool.clone() as Arc<dyn BufferReclaim>,
    )
}

/// Scripted capture device for facade tests
struct ScriptedDevice {
    torch_on: AtomicBool,
    photo_calls: AtomicU32,
    fail_photo: AtomicBool,
    completion: Mutex<Option<RecordingCompletion>>,
}

impl ScriptedDevice {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            torch_on: AtomicBool::new(false),
            photo_calls: AtomicU32::new(0),
            fail_photo: AtomicBool::new(false),
            completion: Mutex::new(None),
        })
    }

    fn finish_recording(&self, result: Result<VideoFile, CameraError>) {
        let completion = self
            .completion
            .lock()
            .unwrap()
            .take()
            .expect("no pending recording");
        completion(result);
    }
}

impl CaptureDevice for ScriptedDevice {
    fn take_photo(&self, _options: &PhotoOptions) -> Result<Photo, DeviceFault> {
        self.photo_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_photo.load(Ordering::SeqCst) {
            return Err(DeviceFault::new("capture/no-data", "sensor produced no data"));
        }
        Ok(Photo {
            path: PathBuf::from("/tmp/photo.jpg"),
            width: 4032,
            height: 3024,
            is_mirrored: false,
        })
    }

    fn take_snapshot(&self, _options: &SnapshotOptions) -> Result<Photo, DeviceFault> {
        Ok(Photo {
            path: PathBuf::from("/tmp/snapshot.jpg"),
            width: 1920,
            height: 1080,
            is_mirrored: false,
        })
    }

    fn start_video_recording(
        &self,
        _options: &RecordVideoOptions,
        completion: RecordingCompletion,
    ) -> Result<(), DeviceFault> {
        *self.completion.lock().unwrap() = Some(completion);
        Ok(())
    }

    fn pause_video_recording(&self) -> Result<(), DeviceFault> {
        Ok(())
    }

    fn resume_video_recording(&self) -> Result<(), DeviceFault> {
        Ok(())
    }

    fn stop_video_recording(&self) -> Result<(), DeviceFault> {
        Ok(())
    }

    fn cancel_video_recording(&self) -> Result<(), DeviceFault> {
        Ok(())
    }

    fn focus(&self, _point: Point) -> Result<(), DeviceFault> {
        Ok(())
    }

    fn set_torch(&self, enabled: bool) -> Result<(), DeviceFault> {
        self.torch_on.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

fn ready_session(device: &Arc<ScriptedDevice>, handlers: EventHandlers) -> CameraSession {
    let mut session = CameraSession::new(
        Some(device.clone() as Arc<dyn CaptureDevice>),
        handlers,
        SessionConfig::default(),
    );
    session.notify_view_ready();
    session
}

#[test]
fn test_photo_requires_device_and_ready_view() {
    init_logging();
    let session = CameraSession::new(None, EventHandlers::default(), SessionConfig::default());
    assert!(matches!(
        session.take_photo(&PhotoOptions::default()),
        Err(CameraError::DeviceUnavailable)
    ));

    let device = ScriptedDevice::new();
    let mut session = CameraSession::new(
        Some(device.clone() as Arc<dyn CaptureDevice>),
        EventHandlers::default(),
        SessionConfig::default(),
    );
    assert!(matches!(
        session.take_photo(&PhotoOptions::default()),
        Err(CameraError::NativeViewNotReady)
    ));
    // The device was never called for either failure
    assert_eq!(device.photo_calls.load(Ordering::SeqCst), 0);

    session.notify_view_ready();
    let photo = session.take_photo(&PhotoOptions::default()).unwrap();
    assert_eq!(photo.width, 4032);
}

#[test]
fn test_photo_fault_is_normalized_with_cause() {
    let device = ScriptedDevice::new();
    device.fail_photo.store(true, Ordering::SeqCst);
    let session = ready_session(&device, EventHandlers::default());

    let err = session.take_photo(&PhotoOptions::default()).unwrap_err();
    assert!(matches!(err, CameraError::CaptureFailed(_)));
    assert_eq!(
        err.device_fault().map(|fault| fault.code.as_str()),
        Some("capture/no-data")
    );
}

#[test]
fn test_identical_orientation_events_notify_rotation_once() {
    let rotations = Arc::new(Mutex::new(Vec::new()));
    let orientations = Arc::new(AtomicU32::new(0));

    let rotation_log = Arc::clone(&rotations);
    let orientation_count = Arc::clone(&orientations);
    let handlers = EventHandlers {
        on_ui_rotation_changed: Some(Box::new(move |rotation| {
            rotation_log.lock().unwrap().push(rotation);
        })),
        on_output_orientation_changed: Some(Box::new(move |_| {
            orientation_count.fetch_add(1, Ordering::SeqCst);
        })),
        ..Default::default()
    };

    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, handlers);

    session.handle_event(NativeEvent::OutputOrientationChanged(
        Orientation::LandscapeLeft,
    ));
    session.handle_event(NativeEvent::OutputOrientationChanged(
        Orientation::LandscapeLeft,
    ));

    // The raw orientation event is forwarded every time...
    assert_eq!(orientations.load(Ordering::SeqCst), 2);
    // ...but the derived UI rotation only on change
    assert_eq!(*rotations.lock().unwrap(), vec![90]);
    assert_eq!(session.ui_rotation(), 90);

    // Preview catching up changes the derivation again
    session.handle_event(NativeEvent::PreviewOrientationChanged(
        Orientation::LandscapeLeft,
    ));
    assert_eq!(*rotations.lock().unwrap(), vec![90, 0]);
}

#[test]
fn test_fps_history_is_gated_and_bounded() {
    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, EventHandlers::default());

    // Disabled by default: samples are not retained
    session.handle_event(NativeEvent::AverageFpsChanged(30.0));
    assert!(session.fps_history().is_empty());

    let mut session = CameraSession::new(
        Some(device.clone() as Arc<dyn CaptureDevice>),
        EventHandlers::default(),
        SessionConfig {
            enable_fps_history: true,
            ..Default::default()
        },
    );
    let capacity = camera_runtime::constants::MAX_FPS_SAMPLES;
    for i in 0..(capacity + 5) {
        session.handle_event(NativeEvent::AverageFpsChanged(i as f64));
    }
    assert_eq!(session.fps_history().len(), capacity);
    // Oldest-first, most recent last
    assert_eq!(session.fps_history().samples().next(), Some(5.0));
    assert_eq!(session.fps_history().latest(), Some((capacity + 4) as f64));
}

#[test]
fn test_frame_released_exactly_once_even_when_unit_fails() {
    struct Failing;

    impl FrameProcessor for Failing {
        fn process(&self, _frame: &Frame) -> CameraResult<()> {
            Err(CameraError::InvalidParameter("synthetic failure".to_string()))
        }
    }

    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_log = Arc::clone(&errors);
    let handlers = EventHandlers {
        on_error: Some(Box::new(move |error| {
            error_log.lock().unwrap().push(error.to_string());
        })),
        ..Default::default()
    };

    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, handlers);
    session.set_frame_processor(ProcessorSlot::Function(Arc::new(Failing)));

    let pool = CountingPool::new();
    session.handle_frame(new_frame(&pool, 1));

    // The unit error surfaced, and the implicit reference was still dropped
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert_eq!(pool.reclaimed.load(Ordering::SeqCst), 1);

    // A frame with no processor attached is released too
    session.set_frame_processor(ProcessorSlot::None);
    session.handle_frame(new_frame(&pool, 2));
    assert_eq!(pool.reclaimed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_frame_processor_deferred_until_view_ready() {
    struct Counting {
        calls: AtomicU32,
    }

    impl FrameProcessor for Counting {
        fn process(&self, _frame: &Frame) -> CameraResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let device = ScriptedDevice::new();
    let mut session = CameraSession::new(
        Some(device.clone() as Arc<dyn CaptureDevice>),
        EventHandlers::default(),
        SessionConfig::default(),
    );

    let first = Arc::new(Counting {
        calls: AtomicU32::new(0),
    });
    session.set_frame_processor(ProcessorSlot::Function(first.clone()));

    let pool = CountingPool::new();
    // Configured before readiness: nothing runs yet
    session.handle_frame(new_frame(&pool, 1));
    assert_eq!(first.calls.load(Ordering::SeqCst), 0);

    // Applied exactly once at readiness
    session.notify_view_ready();
    session.handle_frame(new_frame(&pool, 2));
    session.handle_frame(new_frame(&pool, 3));
    assert_eq!(first.calls.load(Ordering::SeqCst), 2);

    // Replacing by identity detaches the old unit
    let second = Arc::new(Counting {
        calls: AtomicU32::new(0),
    });
    session.set_frame_processor(ProcessorSlot::Function(second.clone()));
    session.handle_frame(new_frame(&pool, 4));
    assert_eq!(first.calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);

    // Unassigning entirely stops processing
    session.set_frame_processor(ProcessorSlot::None);
    session.handle_frame(new_frame(&pool, 5));
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);

    // Every frame was still released
    assert_eq!(pool.reclaimed.load(Ordering::SeqCst), 5);
}

#[test]
fn test_offloaded_unit_defers_buffer_reclaim() {
    struct Offloading {
        scheduler: Arc<camera_runtime::OffloadScheduler>,
        release_rx: Mutex<Option<mpsc::Receiver<()>>>,
        done_tx: Mutex<mpsc::Sender<()>>,
    }

    impl FrameProcessor for Offloading {
        fn process(&self, frame: &Frame) -> CameraResult<()> {
            let gate = self.release_rx.lock().unwrap().take();
            let done = self.done_tx.lock().unwrap().clone();
            if let Some(gate) = gate {
                self.scheduler.offload(
                    frame,
                    Box::new(move |_frame| {
                        gate.recv().unwrap();
                        done.send(()).unwrap();
                        Ok(())
                    }),
                )?;
            }
            Ok(())
        }
    }

    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, EventHandlers::default());

    let (gate_tx, gate_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();
    let scheduler = session.offload_scheduler();
    session.set_frame_processor(ProcessorSlot::Function(Arc::new(Offloading {
        scheduler: scheduler.clone(),
        release_rx: Mutex::new(Some(gate_rx)),
        done_tx: Mutex::new(done_tx),
    })));

    let pool = CountingPool::new();
    session.handle_frame(new_frame(&pool, 1));

    // The sync path released its reference, but the offloaded unit still
    // holds one: the buffer must not come back yet.
    assert_eq!(pool.reclaimed.load(Ordering::SeqCst), 0);
    assert!(scheduler.is_busy());

    gate_tx.send(()).unwrap();
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while scheduler.is_busy() {
        assert!(Instant::now() < deadline, "offload context never freed");
        std::thread::yield_now();
    }
    assert_eq!(pool.reclaimed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_recording_with_flash_through_the_facade() {
    init_logging();
    let device = ScriptedDevice::new();
    let session = ready_session(&device, EventHandlers::default());

    let torch_at_finish = Arc::new(AtomicBool::new(true));
    let finished = Arc::new(AtomicU32::new(0));

    let observe_device = device.clone();
    let observe_torch = Arc::clone(&torch_at_finish);
    let observe_finished = Arc::clone(&finished);
    session
        .start_recording(
            RecordVideoOptions {
                flash: Flash::On,
                ..Default::default()
            },
            RecordingCallbacks::new(
                move |_video| {
                    observe_torch.store(
                        observe_device.torch_on.load(Ordering::SeqCst),
                        Ordering::SeqCst,
                    );
                    observe_finished.fetch_add(1, Ordering::SeqCst);
                },
                |error| panic!("unexpected recording error: {}", error),
            ),
        )
        .unwrap();

    assert_eq!(session.recording_state(), RecordingState::Recording);
    assert!(session.is_flash_override_active());
    assert!(device.torch_on.load(Ordering::SeqCst));

    session.stop_recording().unwrap();
    device.finish_recording(Ok(VideoFile {
        path: PathBuf::from("/tmp/recording.mp4"),
        duration: Duration::from_secs(2),
        width: 1920,
        height: 1080,
    }));

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    // The torch was already off when on_finished observed it
    assert!(!torch_at_finish.load(Ordering::SeqCst));
    assert!(!session.is_flash_override_active());
    assert_eq!(session.recording_state(), RecordingState::Idle);
}

#[test]
fn test_cancel_recording_reports_canceled_error() {
    let device = ScriptedDevice::new();
    let session = ready_session(&device, EventHandlers::default());

    let received = Arc::new(Mutex::new(None));
    let error_slot = Arc::clone(&received);
    session
        .start_recording(
            RecordVideoOptions::default(),
            RecordingCallbacks::new(
                |_video| panic!("canceled recording must not finish"),
                move |error| {
                    *error_slot.lock().unwrap() = Some(error);
                },
            ),
        )
        .unwrap();

    session.cancel_recording().unwrap();
    device.finish_recording(Err(CameraError::RecordingCanceled));

    assert!(matches!(
        *received.lock().unwrap(),
        Some(CameraError::RecordingCanceled)
    ));
    assert_eq!(session.recording_state(), RecordingState::Idle);
}

#[test]
fn test_device_error_event_reaches_error_handler() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let error_log = Arc::clone(&errors);
    let handlers = EventHandlers {
        on_error: Some(Box::new(move |error| {
            error_log.lock().unwrap().push(error.to_string());
        })),
        ..Default::default()
    };

    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, handlers);

    session.handle_event(NativeEvent::Error(DeviceFault::new(
        "device/disconnected",
        "camera went away",
    )));

    let collected = errors.lock().unwrap();
    assert_eq!(collected.len(), 1);
    assert!(collected[0].contains("device/disconnected"));
}

#[test]
fn test_code_scan_events_reach_registered_handler() {
    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, EventHandlers::default());

    let scans = Arc::new(Mutex::new(Vec::new()));
    let scan_log = Arc::clone(&scans);
    session.set_code_scanner(Some(Box::new(move |codes, frame| {
        scan_log
            .lock()
            .unwrap()
            .push((codes.to_vec(), *frame));
    })));

    let event = NativeEvent::CodeScanned {
        codes: vec![ScannedCode {
            kind: CodeKind::Qr,
            value: Some("https://example.org".to_string()),
            bounds: Some(CodeBounds {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 100.0,
            }),
        }],
        frame: CodeFrame {
            width: 1920,
            height: 1080,
        },
    };
    session.handle_event(event);

    let collected = scans.lock().unwrap();
    assert_eq!(collected.len(), 1);
    let (codes, frame) = &collected[0];
    assert_eq!(codes[0].kind, CodeKind::Qr);
    assert_eq!(codes[0].value.as_deref(), Some("https://example.org"));
    assert_eq!(frame.width, 1920);
}

#[test]
fn test_lifecycle_events_forwarded_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let push = |log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str| {
        let log = Arc::clone(log);
        move || log.lock().unwrap().push(name)
    };
    let shutter_log = Arc::clone(&log);
    let handlers = EventHandlers {
        on_initialized: Some(Box::new(push(&log, "initialized"))),
        on_started: Some(Box::new(push(&log, "started"))),
        on_preview_started: Some(Box::new(push(&log, "preview-started"))),
        on_shutter: Some(Box::new(move |kind| {
            assert_eq!(kind, ShutterKind::Photo);
            shutter_log.lock().unwrap().push("shutter");
        })),
        on_preview_stopped: Some(Box::new(push(&log, "preview-stopped"))),
        on_stopped: Some(Box::new(push(&log, "stopped"))),
        ..Default::default()
    };

    let device = ScriptedDevice::new();
    let mut session = ready_session(&device, handlers);

    for event in [
        NativeEvent::Initialized,
        NativeEvent::Started,
        NativeEvent::PreviewStarted,
        NativeEvent::Shutter(ShutterKind::Photo),
        NativeEvent::PreviewStopped,
        NativeEvent::Stopped,
    ] {
        session.handle_event(event);
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "initialized",
            "started",
            "preview-started",
            "shutter",
            "preview-stopped",
            "stopped",
        ]
    );
}
