//! Window queries and borderless-fullscreen detection.

use crate::geometry::{Rect, Resolution};

/// An opaque OS window handle, stored as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// `self`, or `fallback` when `self` is null.
    pub const fn or(self, fallback: WindowHandle) -> WindowHandle {
        if self.is_null() { fallback } else { self }
    }
}

/// The window geometry queries the detector needs from the operating system.
pub trait WindowMetrics {
    /// The window's outer bounding rectangle in screen coordinates.
    fn window_rect(&self, window: WindowHandle) -> Option<Rect>;

    /// The window's client area translated to screen coordinates.
    fn client_rect_on_screen(&self, window: WindowHandle) -> Option<Rect>;
}

/// `true` when both the outer and the client rectangle of `window` start at or
/// before the screen origin and reach at least the native resolution.
///
/// Always asks `metrics` afresh; window placement can change between calls.
pub fn is_borderless_fullscreen(
    metrics: &dyn WindowMetrics,
    window: WindowHandle,
    native: Resolution,
) -> bool {
    if window.is_null() {
        return false;
    }
    let (Some(outer), Some(client)) = (metrics.window_rect(window), metrics.client_rect_on_screen(window)) else {
        return false;
    };
    outer.covers_screen(native.width, native.height) && client.covers_screen(native.width, native.height)
}
