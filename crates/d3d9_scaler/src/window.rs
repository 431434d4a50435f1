use std::ffi::c_void;

use scaler_core::{Rect, WindowHandle, WindowMetrics};
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::UI::WindowsAndMessaging::{GetClientRect, GetWindowRect};

/// Live window geometry straight from user32.
pub struct Win32Window;

impl WindowMetrics for Win32Window {
    fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(to_hwnd(window), &mut rect) }.ok()?;
        Some(from_win_rect(&rect))
    }

    fn client_rect_on_screen(&self, window: WindowHandle) -> Option<Rect> {
        let hwnd = to_hwnd(window);
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rect) }.ok()?;

        let mut top_left = POINT { x: rect.left, y: rect.top };
        let mut bottom_right = POINT { x: rect.right, y: rect.bottom };
        unsafe {
            if !ClientToScreen(hwnd, &mut top_left).as_bool() || !ClientToScreen(hwnd, &mut bottom_right).as_bool() {
                return None;
            }
        }
        Some(Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y))
    }
}

pub fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

pub fn from_win_rect(rect: &RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}
