//! # tapview-gui: Remote touch viewer window
//!
//! Shows snapshots of an adb-connected device in a native Win32
//! window and forwards clicks, drags, wheel turns and key commands
//! to the `tapview-core` session.

pub mod config;
pub mod display;
pub mod input;
pub mod window;
