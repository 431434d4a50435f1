/// An axis-aligned rectangle in the Win32 `RECT` convention: `right`/`bottom` are exclusive.
///
/// The field order and `repr(C)` match `RECT`, so a `Rect` can be handed to the
/// graphics API wherever a `const RECT*` is expected.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// A rectangle anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// `true` if this rectangle starts at or above/left of the screen origin and
    /// reaches at least `width`x`height` towards the bottom-right.
    pub const fn covers_screen(&self, width: u32, height: u32) -> bool {
        self.left <= 0
            && self.top <= 0
            && self.right >= width as i32
            && self.bottom >= height as i32
    }
}

/// Pixel dimensions of a surface or a display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn rect(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Width over height. Callers must rule out a zero height first.
    pub fn aspect(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_size_is_anchored_at_origin() {
        let rect = Rect::from_size(1920, 1080);
        assert_eq!(rect, Rect::new(0, 0, 1920, 1080));
        assert_eq!(rect.width(), 1920);
        assert_eq!(rect.height(), 1080);
    }

    #[test]
    fn test_covers_screen_accepts_overhanging_frame() {
        // A maximized window's frame hangs a few pixels past every screen edge.
        let outer = Rect::new(-8, -8, 1928, 1088);
        assert!(outer.covers_screen(1920, 1080));
    }

    #[test]
    fn test_covers_screen_rejects_offset_window() {
        let outer = Rect::new(100, 100, 2020, 1180);
        assert!(!outer.covers_screen(1920, 1080));
    }

    #[test]
    fn test_covers_screen_rejects_short_window() {
        let outer = Rect::new(0, 0, 1920, 1040);
        assert!(!outer.covers_screen(1920, 1080));
    }

    #[test]
    fn test_resolution_display_format() {
        assert_eq!(Resolution::new(3840, 2160).to_string(), "3840x2160");
    }
}
