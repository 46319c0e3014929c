//! Native viewer window.
//!
//! Win32 owns the message loop; `wndproc` turns the messages the viewer
//! cares about into [`WindowEvent`]s and queues them for the main loop,
//! which feeds them to [`crate::input::translate_event`]. Pointer
//! positions are always client-area pixels.

/// Events queued by the window procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Close,
    /// New client-area size; `0x0` while minimized.
    Resize(u32, u32),
    /// Contents must be drawn again.
    Paint,
    PointerMove(i32, i32),
    /// Primary button went down (`true`) or up.
    PrimaryButton(bool, i32, i32),
    /// Wheel delta (120 per notch, positive away from the user).
    Wheel(i16, i32, i32),
    /// Virtual-key code of a fresh key press.
    KeyDown(u16),
}

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::mpsc;

    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::{ScreenToClient, ValidateRect};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use super::WindowEvent;

    type EventSender = mpsc::Sender<WindowEvent>;

    pub struct NativeWindow {
        hwnd: HWND,
        events: mpsc::Receiver<WindowEvent>,
    }

    /// Signed 16-bit coordinates packed into an `LPARAM`.
    fn lparam_point(lparam: LPARAM) -> (i32, i32) {
        let x = (lparam.0 & 0xFFFF) as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
        (x, y)
    }

    fn translate(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<WindowEvent> {
        let event = match msg {
            WM_CLOSE => WindowEvent::Close,
            WM_SIZE => WindowEvent::Resize(
                (lparam.0 & 0xFFFF) as u32,
                ((lparam.0 >> 16) & 0xFFFF) as u32,
            ),
            WM_PAINT => {
                let _ = unsafe { ValidateRect(hwnd, None) };
                WindowEvent::Paint
            }
            WM_MOUSEMOVE => {
                let (x, y) = lparam_point(lparam);
                WindowEvent::PointerMove(x, y)
            }
            WM_LBUTTONDOWN => {
                // Moves and the release keep arriving outside the client area.
                unsafe { SetCapture(hwnd) };
                let (x, y) = lparam_point(lparam);
                WindowEvent::PrimaryButton(true, x, y)
            }
            WM_LBUTTONUP => {
                let _ = unsafe { ReleaseCapture() };
                let (x, y) = lparam_point(lparam);
                WindowEvent::PrimaryButton(false, x, y)
            }
            WM_MOUSEWHEEL => {
                let delta = ((wparam.0 >> 16) & 0xFFFF) as i16;
                // Wheel messages carry screen coordinates.
                let (x, y) = lparam_point(lparam);
                let mut pt = POINT { x, y };
                let _ = unsafe { ScreenToClient(hwnd, &mut pt) };
                WindowEvent::Wheel(delta, pt.x, pt.y)
            }
            // Bit 30 set: auto-repeat of a held key.
            WM_KEYDOWN if (lparam.0 >> 30) & 1 == 0 => {
                WindowEvent::KeyDown((wparam.0 & 0xFFFF) as u16)
            }
            _ => return None,
        };
        Some(event)
    }

    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        if msg == WM_ERASEBKGND {
            // Every frame covers the whole client area.
            return LRESULT(1);
        }
        if msg == WM_DESTROY {
            unsafe { PostQuitMessage(0) };
            return LRESULT(0);
        }

        let sender = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const EventSender;
        if !sender.is_null() {
            if let Some(event) = translate(hwnd, msg, wparam, lparam) {
                let _ = unsafe { &*sender }.send(event);
                return LRESULT(0);
            }
        }
        unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
    }

    fn wide(text: &str) -> Vec<u16> {
        text.encode_utf16().chain(std::iter::once(0)).collect()
    }

    impl NativeWindow {
        /// Open a visible top-level window of roughly `width` x `height`.
        pub fn create(title: &str, width: u32, height: u32) -> Result<Self, String> {
            let hinstance = unsafe { GetModuleHandleW(None) }
                .map_err(|e| format!("GetModuleHandle: {e}"))?;
            let class_name = wide("TapviewWindow");
            let title = wide(title);

            let class = WNDCLASSW {
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
                ..Default::default()
            };
            if unsafe { RegisterClassW(&class) } == 0 {
                return Err("RegisterClassW failed".into());
            }

            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(class_name.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                    CW_USEDEFAULT,
                    CW_USEDEFAULT,
                    width as i32,
                    height as i32,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| format!("CreateWindowExW: {e}"))?;

            let (sender, events) = mpsc::channel();
            let sender = Box::into_raw(Box::new(sender));
            unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, sender as isize) };

            Ok(Self { hwnd, events })
        }

        /// Dispatch pending messages without blocking and drain the queue.
        pub fn poll_events(&self) -> Vec<WindowEvent> {
            let mut msg = MSG::default();
            while unsafe { PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE) }.as_bool() {
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
            self.events.try_iter().collect()
        }

        /// Current client-area size.
        ///
        /// The first `WM_SIZE` arrives inside `CreateWindowExW`, before the
        /// sender is attached, so the main loop asks once explicitly.
        pub fn client_size(&self) -> (u32, u32) {
            let mut rect = RECT::default();
            match unsafe { GetClientRect(self.hwnd, &mut rect) } {
                Ok(()) => (
                    (rect.right - rect.left).max(0) as u32,
                    (rect.bottom - rect.top).max(0) as u32,
                ),
                Err(_) => (0, 0),
            }
        }

        pub fn hwnd(&self) -> HWND {
            self.hwnd
        }
    }

    impl Drop for NativeWindow {
        fn drop(&mut self) {
            unsafe {
                let sender = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut EventSender;
                SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                if !sender.is_null() {
                    drop(Box::from_raw(sender));
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::NativeWindow;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use super::WindowEvent;

    pub struct NativeWindow;

    impl NativeWindow {
        pub fn create(_title: &str, _w: u32, _h: u32) -> Result<Self, String> {
            Err("Window creation is only supported on Windows".into())
        }

        pub fn poll_events(&self) -> Vec<WindowEvent> {
            Vec::new()
        }

        pub fn client_size(&self) -> (u32, u32) {
            (0, 0)
        }

        pub fn hwnd(&self) {}
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::NativeWindow;
