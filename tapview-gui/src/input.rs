//! Window event → session event conversion.
//!
//! Translates [`WindowEvent`]s from the Win32 message loop into
//! [`SessionEvent`]s. Only the primary button drives gestures; the
//! keyboard carries the viewer's commands.

use tapview_core::{Point, PointerEvent, SessionEvent, Size, UserAction};

use crate::window::WindowEvent;

// ── Key bindings (Win32 virtual-key codes) ───────────────────────

pub const VK_RETURN: u16 = 0x0D;
/// `L`: rotate the view.
pub const VK_L: u16 = 0x4C;
/// `R`: manual refresh.
pub const VK_R: u16 = 0x52;
/// `S`: toggle streaming.
pub const VK_S: u16 = 0x53;

/// Action bound to a key, if any.
pub fn key_action(vk: u16) -> Option<UserAction> {
    match vk {
        VK_R => Some(UserAction::Refresh),
        VK_S => Some(UserAction::ToggleStreaming),
        VK_L => Some(UserAction::Rotate),
        VK_RETURN => Some(UserAction::SendEnter),
        _ => None,
    }
}

/// Convert a window event to a session event (if applicable).
pub fn translate_event(event: &WindowEvent) -> Option<SessionEvent> {
    match event {
        WindowEvent::PointerMove(x, y) => {
            Some(SessionEvent::Pointer(PointerEvent::Move(Point::new(*x, *y))))
        }
        WindowEvent::PrimaryButton(pressed, x, y) => {
            let at = Point::new(*x, *y);
            let pointer = if *pressed {
                PointerEvent::Press(at)
            } else {
                PointerEvent::Release(at)
            };
            Some(SessionEvent::Pointer(pointer))
        }
        WindowEvent::Wheel(delta, x, y) => Some(SessionEvent::Pointer(PointerEvent::Wheel {
            at: Point::new(*x, *y),
            delta: i32::from(*delta),
        })),
        WindowEvent::KeyDown(vk) => key_action(*vk).map(SessionEvent::Action),
        // Minimizing reports a 0x0 client area.
        WindowEvent::Resize(w, h) => Size::new(*w, *h).ok().map(SessionEvent::Resize),
        WindowEvent::Paint => Some(SessionEvent::Expose),
        WindowEvent::Close => None,
    }
}

// ── Tests ────────────────────────────────────────────────────────
