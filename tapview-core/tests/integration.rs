//! Integration tests for full session flows against an in-memory device:
//! capture/refresh, streaming state machine, gestures → commands.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use tapview_core::{
    DevicePoint, DeviceTransport, FittedRect, Point, PointerEvent, ResampleFilter, Rotation,
    Session, SessionConfig, SessionEvent, Size, StreamState, TapError, UserAction,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Fake device: records every command and serves a PNG whose red channel
/// is the number of captures taken so far.
#[derive(Default)]
struct FakeDevice {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    log: Vec<String>,
    captures: u8,
    fail_capture: bool,
    fail_input: bool,
}

impl FakeDevice {
    fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    fn set_fail_capture(&self, fail: bool) {
        self.state.lock().unwrap().fail_capture = fail;
    }

    fn set_fail_input(&self, fail: bool) {
        self.state.lock().unwrap().fail_input = fail;
    }

    fn record(&self, entry: String, fail: bool) -> Result<(), TapError> {
        self.state.lock().unwrap().log.push(entry.clone());
        if fail {
            return Err(TapError::CommandFailed {
                command: "fake",
                message: format!("{entry} rejected"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceTransport for FakeDevice {
    async fn capture_screen(&self, _remote_path: &str) -> Result<(), TapError> {
        let fail = self.state.lock().unwrap().fail_capture;
        self.record("screencap".into(), fail)
    }

    async fn pull_file(&self, _remote_path: &str) -> Result<Vec<u8>, TapError> {
        self.record("pull".into(), false)?;
        let shade = {
            let mut state = self.state.lock().unwrap();
            state.captures += 1;
            state.captures
        };
        let img = RgbaImage::from_pixel(480, 854, Rgba([shade, 0, 0, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        Ok(buf.into_inner())
    }

    async fn remove_file(&self, _remote_path: &str) -> Result<(), TapError> {
        self.record("rm".into(), false)
    }

    async fn send_tap(&self, at: DevicePoint) -> Result<(), TapError> {
        let fail = self.state.lock().unwrap().fail_input;
        self.record(format!("tap {} {}", at.x, at.y), fail)
    }

    async fn send_swipe(
        &self,
        from: DevicePoint,
        to: DevicePoint,
        duration: Duration,
    ) -> Result<(), TapError> {
        let fail = self.state.lock().unwrap().fail_input;
        self.record(
            format!(
                "swipe {} {} {} {} {}",
                from.x,
                from.y,
                to.x,
                to.y,
                duration.as_millis()
            ),
            fail,
        )
    }

    async fn send_key_event(&self, code: u32) -> Result<(), TapError> {
        let fail = self.state.lock().unwrap().fail_input;
        self.record(format!("key {code}"), fail)
    }
}

const CAPTURE: [&str; 3] = ["screencap", "pull", "rm"];

fn session() -> (Arc<FakeDevice>, Session<FakeDevice>) {
    let device = Arc::new(FakeDevice::default());
    let mut config = SessionConfig::new(
        Size::new(480, 854).unwrap(),
        Size::new(1280, 900).unwrap(),
    );
    config.filter = ResampleFilter::Nearest;
    config.interval = Duration::from_millis(1000);
    (device.clone(), Session::new(device, config))
}

/// Session with one snapshot already shown and an empty command log.
async fn ready_session() -> (Arc<FakeDevice>, Session<FakeDevice>) {
    let (device, mut session) = session();
    assert!(session.refresh().await);
    device.clear_log();
    (device, session)
}

fn shown_shade(session: &Session<FakeDevice>) -> u8 {
    session.surface().bitmap().unwrap().get_pixel(0, 0).0[0]
}

fn center(session: &Session<FakeDevice>) -> Point {
    session.surface().fitted_rect().unwrap().center()
}

async fn tap(session: &mut Session<FakeDevice>, at: Point) {
    session
        .handle(SessionEvent::Pointer(PointerEvent::Press(at)), Instant::now())
        .await;
    session
        .handle(SessionEvent::Pointer(PointerEvent::Release(at)), Instant::now())
        .await;
}

// ── Refresh ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_snapshot_fits_into_viewport() {
    let (device, mut session) = session();
    assert!(session.surface().fitted_rect().is_none());

    assert!(session.refresh().await);
    assert_eq!(device.log(), CAPTURE);
    assert_eq!(
        session.surface().fitted_rect(),
        Some(FittedRect {
            x: 387,
            y: 0,
            width: 506,
            height: 900
        })
    );

    let frame = session.frame_if_dirty().unwrap();
    assert_eq!((frame.width, frame.height), (1280, 900));
    assert_eq!(frame.bgra.len(), 1280 * 900 * 4);
}

#[tokio::test]
async fn test_capture_failure_keeps_last_good_bitmap() {
    let (device, mut session) = ready_session().await;
    assert_eq!(shown_shade(&session), 1);

    device.set_fail_capture(true);
    assert!(!session.refresh().await);
    assert_eq!(device.log(), vec!["screencap"]);
    assert_eq!(shown_shade(&session), 1);

    device.set_fail_capture(false);
    assert!(session.refresh().await);
    assert_eq!(shown_shade(&session), 2);
}

// ── Streaming ────────────────────────────────────────────────────

#[tokio::test]
async fn test_streaming_toggle_and_tick() {
    let (device, mut session) = ready_session().await;
    let t0 = Instant::now();

    session
        .handle(SessionEvent::Action(UserAction::ToggleStreaming), t0)
        .await;
    assert!(session.state().streaming);
    assert_eq!(session.state().interval_ms, 1000);
    assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(1000)));

    // Not due yet.
    assert!(!session.tick(t0 + Duration::from_millis(999)).await);
    assert!(device.log().is_empty());

    // Due: capture and re-arm one interval later.
    let t1 = t0 + Duration::from_millis(1000);
    assert!(session.tick(t1).await);
    assert_eq!(device.log(), CAPTURE);
    assert_eq!(session.next_deadline(), Some(t1 + Duration::from_millis(1000)));

    session
        .handle(SessionEvent::Action(UserAction::ToggleStreaming), t1)
        .await;
    assert_eq!(session.stream_state(), StreamState::Idle);
    assert!(!session.tick(t1 + Duration::from_secs(60)).await);
}

#[tokio::test]
async fn test_failed_periodic_capture_stays_streaming() {
    let (device, mut session) = ready_session().await;
    let t0 = Instant::now();
    session.start_streaming(t0);

    device.set_fail_capture(true);
    assert!(session.tick(t0 + Duration::from_secs(1)).await);
    assert!(session.state().streaming);
    assert_eq!(shown_shade(&session), 1);
}

#[tokio::test]
async fn test_manual_refresh_disables_streaming() {
    let (device, mut session) = ready_session().await;
    let now = Instant::now();
    session.start_streaming(now);

    session
        .handle(SessionEvent::Action(UserAction::Refresh), now)
        .await;
    assert_eq!(session.stream_state(), StreamState::Idle);
    assert_eq!(device.log(), CAPTURE);
}

#[tokio::test]
async fn test_interval_must_be_positive() {
    let (_device, mut session) = session();
    assert!(session.set_interval(Duration::ZERO).is_err());
    assert!(session.set_interval(Duration::from_millis(250)).is_ok());
    assert_eq!(session.state().interval_ms, 250);
}

#[tokio::test]
async fn test_new_interval_applies_at_next_rearm() {
    let (device, mut session) = ready_session().await;
    let t0 = Instant::now();
    session.start_streaming(t0);

    session.set_interval(Duration::from_millis(250)).unwrap();
    assert_eq!(session.state().interval_ms, 250);
    // The armed deadline is unchanged.
    assert_eq!(
        session.stream_state(),
        StreamState::Streaming {
            next_due: t0 + Duration::from_millis(1000)
        }
    );

    let t1 = t0 + Duration::from_millis(1000);
    assert!(session.tick(t1).await);
    assert_eq!(device.log(), CAPTURE);
    assert_eq!(session.next_deadline(), Some(t1 + Duration::from_millis(250)));
}

// ── Gestures ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_tap_sends_command_then_refreshes() {
    let (device, mut session) = ready_session().await;
    let at = center(&session);

    tap(&mut session, at).await;

    let mut expected = vec!["tap 240 427".to_string()];
    expected.extend(CAPTURE.iter().map(|s| s.to_string()));
    assert_eq!(device.log(), expected);
    assert_eq!(shown_shade(&session), 2);
}

#[tokio::test]
async fn test_drag_threshold() {
    let (device, mut session) = ready_session().await;
    let start = center(&session);
    let now = Instant::now();

    session
        .handle(SessionEvent::Pointer(PointerEvent::Press(start)), now)
        .await;
    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Move(Point::new(start.x + 3, start.y))),
            now,
        )
        .await;
    assert!(device.log().is_empty());

    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Move(Point::new(start.x + 10, start.y))),
            now,
        )
        .await;
    let log = device.log();
    assert_eq!(log.len(), 1 + CAPTURE.len());
    assert!(log[0].starts_with("swipe 240 427 "), "{log:?}");
    assert!(log[0].ends_with(" 300"), "{log:?}");
    assert_eq!(&log[1..], CAPTURE);

    // Release after a drag: no tap, one refresh.
    device.clear_log();
    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Release(Point::new(start.x + 10, start.y))),
            now,
        )
        .await;
    assert_eq!(device.log(), CAPTURE);
}

#[tokio::test]
async fn test_tap_outside_image_only_refreshes() {
    let (device, mut session) = ready_session().await;
    tap(&mut session, Point::new(5, 5)).await;
    assert_eq!(device.log(), CAPTURE);
}

#[tokio::test]
async fn test_failed_tap_still_refreshes_on_release() {
    let (device, mut session) = ready_session().await;
    device.set_fail_input(true);
    let at = center(&session);

    tap(&mut session, at).await;

    let log = device.log();
    assert_eq!(log[0], "tap 240 427");
    assert_eq!(&log[1..], CAPTURE);
}

#[tokio::test]
async fn test_failed_drag_does_not_refresh() {
    let (device, mut session) = ready_session().await;
    device.set_fail_input(true);
    let start = center(&session);
    let now = Instant::now();

    session
        .handle(SessionEvent::Pointer(PointerEvent::Press(start)), now)
        .await;
    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Move(Point::new(start.x, start.y + 20))),
            now,
        )
        .await;
    let log = device.log();
    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("swipe"));
}

#[tokio::test]
async fn test_before_first_snapshot_release_fetches_one() {
    let (device, mut session) = session();
    tap(&mut session, Point::new(640, 450)).await;
    assert_eq!(device.log(), CAPTURE);
    assert!(session.surface().fitted_rect().is_some());
}

#[tokio::test]
async fn test_wheel_sends_fixed_swipe_without_refresh() {
    let (device, mut session) = ready_session().await;
    let at = center(&session);

    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Wheel { at, delta: 120 }),
            Instant::now(),
        )
        .await;
    session
        .handle(
            SessionEvent::Pointer(PointerEvent::Wheel { at, delta: -120 }),
            Instant::now(),
        )
        .await;

    assert_eq!(
        device.log(),
        vec!["swipe 240 352 240 502 150", "swipe 240 502 240 352 150"]
    );
}

#[tokio::test]
async fn test_send_enter() {
    let (device, mut session) = ready_session().await;
    session
        .handle(SessionEvent::Action(UserAction::SendEnter), Instant::now())
        .await;
    assert_eq!(device.log(), vec!["key 66"]);
}

// ── Rotation & resize ────────────────────────────────────────────

#[tokio::test]
async fn test_rotate_refits_and_remaps() {
    let (device, mut session) = ready_session().await;

    session
        .handle(SessionEvent::Action(UserAction::Rotate), Instant::now())
        .await;
    assert_eq!(session.rotation(), Rotation::Deg90);
    assert_eq!(
        session.surface().fitted_rect(),
        Some(FittedRect {
            x: 0,
            y: 90,
            width: 1280,
            height: 719
        })
    );
    assert!(device.log().is_empty());

    // Top-left of the rotated picture is the device's top-right corner.
    tap(&mut session, Point::new(0, 90)).await;
    assert_eq!(device.log()[0], "tap 479 0");

    for _ in 0..3 {
        session.rotate();
    }
    assert_eq!(session.rotation(), Rotation::Deg0);
}

#[tokio::test]
async fn test_resize_refits() {
    let (_device, mut session) = ready_session().await;
    assert!(session.frame_if_dirty().is_some());
    assert!(session.frame_if_dirty().is_none());

    session
        .handle(
            SessionEvent::Resize(Size::new(600, 600).unwrap()),
            Instant::now(),
        )
        .await;
    let rect = session.surface().fitted_rect().unwrap();
    assert_eq!(rect.height, 600);
    assert_eq!(rect.width, 337);

    let frame = session.frame_if_dirty().unwrap();
    assert_eq!((frame.width, frame.height), (600, 600));

    session.handle(SessionEvent::Expose, Instant::now()).await;
    assert!(session.frame_if_dirty().is_some());
}
