//! Presentation geometry: decides whether a frame is scaled on its way to the
//! display and which source/destination rectangles `Present` receives.

use serde::Deserialize;

use crate::error::ScalingError;
use crate::geometry::{Rect, Resolution};

pub const DEFAULT_ASPECT_TOLERANCE: f64 = 0.01;

/// Rounding applied to the letterbox centering offset when the border is odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterRounding {
    /// The odd pixel goes to the right/bottom border.
    #[default]
    Floor,
    /// The odd pixel goes to the left/top border.
    Ceil,
}

impl CenterRounding {
    fn half(self, border: u32) -> u32 {
        match self {
            CenterRounding::Floor => border / 2,
            CenterRounding::Ceil => border.div_ceil(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingOptions {
    pub aspect_tolerance: f64,
    pub center_rounding: CenterRounding,
}

impl Default for ScalingOptions {
    fn default() -> Self {
        Self {
            aspect_tolerance: DEFAULT_ASPECT_TOLERANCE,
            center_rounding: CenterRounding::Floor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalingMode {
    /// The caller's own `Present` rectangles are used.
    NoScale,
    /// Non-uniform stretch over the whole display.
    StretchFullscreen,
    /// Whole-number upscale, centered with borders.
    IntegerLetterbox,
}

/// Outcome of the calculator. `src` always spans the full back buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingDecision {
    pub mode: ScalingMode,
    pub src: Rect,
    pub dst: Rect,
}

impl ScalingDecision {
    /// NoScale over the given back buffer: source and destination are the same rectangle.
    pub const fn passthrough(back_buffer: Resolution) -> Self {
        Self {
            mode: ScalingMode::NoScale,
            src: back_buffer.rect(),
            dst: back_buffer.rect(),
        }
    }

    pub fn is_scaling(&self) -> bool {
        self.mode != ScalingMode::NoScale
    }

    /// The rectangles `Present` must use instead of the caller's, or `None` when
    /// the caller's rectangles pass through.
    pub fn substitute_rects(&self) -> Option<(Rect, Rect)> {
        self.is_scaling().then_some((self.src, self.dst))
    }
}

/// Everything the calculator looks at. `client_rect` is the window's client
/// area in screen coordinates, when the window could be queried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingInput {
    pub native: Resolution,
    pub back_buffer: Resolution,
    pub windowed: bool,
    pub borderless_fullscreen: bool,
    pub client_rect: Option<Rect>,
}

/// Computes the scaling decision for one set of presentation parameters.
///
/// Pure and deterministic: identical inputs always give identical outputs.
pub fn compute(input: &ScalingInput, options: &ScalingOptions) -> Result<ScalingDecision, ScalingError> {
    let back = input.back_buffer;
    if back.is_zero() {
        return Err(ScalingError::InvalidGeometry {
            width: back.width,
            height: back.height,
        });
    }

    let native = input.native;
    if native.is_zero() || native == back {
        return Ok(ScalingDecision::passthrough(back));
    }

    if input.windowed && !input.borderless_fullscreen {
        return Ok(ScalingDecision {
            mode: ScalingMode::NoScale,
            src: back.rect(),
            dst: input.client_rect.unwrap_or_else(|| back.rect()),
        });
    }

    let stretch = ScalingDecision {
        mode: ScalingMode::StretchFullscreen,
        src: back.rect(),
        dst: native.rect(),
    };

    if (back.aspect() - native.aspect()).abs() >= options.aspect_tolerance {
        return Ok(stretch);
    }

    let scale_x = native.width / back.width;
    let scale_y = native.height / back.height;
    if scale_x == 0 || scale_y == 0 {
        return Ok(stretch);
    }

    let scaled_width = back.width * scale_x;
    let scaled_height = back.height * scale_y;
    let left = options.center_rounding.half(native.width - scaled_width) as i32;
    let top = options.center_rounding.half(native.height - scaled_height) as i32;

    Ok(ScalingDecision {
        mode: ScalingMode::IntegerLetterbox,
        src: back.rect(),
        dst: Rect::new(left, top, left + scaled_width as i32, top + scaled_height as i32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fullscreen(native: (u32, u32), back: (u32, u32)) -> ScalingInput {
        ScalingInput {
            native: Resolution::new(native.0, native.1),
            back_buffer: Resolution::new(back.0, back.1),
            windowed: false,
            borderless_fullscreen: false,
            client_rect: None,
        }
    }

    fn run(input: ScalingInput) -> ScalingDecision {
        compute(&input, &ScalingOptions::default()).unwrap()
    }

    #[test]
    fn test_matching_resolution_is_no_scale_in_every_mode() {
        for (windowed, borderless) in [(false, false), (true, false), (true, true)] {
            let input = ScalingInput {
                windowed,
                borderless_fullscreen: borderless,
                client_rect: Some(Rect::new(100, 100, 900, 700)),
                ..fullscreen((1920, 1080), (1920, 1080))
            };
            let decision = run(input);
            assert_eq!(decision.mode, ScalingMode::NoScale);
            assert_eq!(decision.src, Rect::new(0, 0, 1920, 1080));
            assert_eq!(decision.dst, decision.src);
        }
    }

    #[test]
    fn test_unknown_native_resolution_is_no_scale() {
        let decision = run(fullscreen((0, 0), (1280, 720)));
        assert_eq!(decision, ScalingDecision::passthrough(Resolution::new(1280, 720)));
    }

    #[test]
    fn test_windowed_uses_live_client_rect() {
        for native in [(1920, 1080), (3840, 2160), (1280, 1024)] {
            let input = ScalingInput {
                windowed: true,
                client_rect: Some(Rect::new(100, 100, 900, 700)),
                ..fullscreen(native, (800, 600))
            };
            let decision = run(input);
            assert_eq!(decision.mode, ScalingMode::NoScale);
            assert_eq!(decision.src, Rect::new(0, 0, 800, 600));
            assert_eq!(decision.dst, Rect::new(100, 100, 900, 700));
            assert_eq!(decision.substitute_rects(), None);
        }
    }

    #[test]
    fn test_windowed_without_client_rect_falls_back_to_back_buffer() {
        let input = ScalingInput {
            windowed: true,
            ..fullscreen((1920, 1080), (800, 600))
        };
        assert_eq!(run(input).dst, Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn test_exact_double_fills_screen() {
        let decision = run(fullscreen((3840, 2160), (1920, 1080)));
        assert_eq!(decision.mode, ScalingMode::IntegerLetterbox);
        assert_eq!(decision.src, Rect::new(0, 0, 1920, 1080));
        assert_eq!(decision.dst, Rect::new(0, 0, 3840, 2160));
    }

    #[test]
    fn test_aspect_mismatch_stretches() {
        let decision = run(fullscreen((1920, 1080), (1280, 800)));
        assert_eq!(decision.mode, ScalingMode::StretchFullscreen);
        assert_eq!(decision.src, Rect::new(0, 0, 1280, 800));
        assert_eq!(decision.dst, Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_four_by_three_on_widescreen_stretches() {
        let decision = run(fullscreen((1920, 1080), (640, 480)));
        assert_eq!(decision.mode, ScalingMode::StretchFullscreen);
        assert_eq!(decision.dst, Rect::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_integer_letterbox_is_centered() {
        let decision = run(fullscreen((1920, 1080), (800, 450)));
        assert_eq!(decision.mode, ScalingMode::IntegerLetterbox);
        assert_eq!(decision.dst, Rect::new(160, 90, 1760, 990));
    }

    #[test]
    fn test_exact_multiples_are_centered_letterbox() {
        let cases = [
            ((3840, 2160), (1280, 720)),
            ((3840, 2160), (960, 540)),
            ((2560, 1440), (1280, 720)),
            ((1920, 1200), (960, 600)),
            ((1280, 1024), (640, 512)),
        ];
        for (native, back) in cases {
            let decision = run(fullscreen(native, back));
            assert_eq!(decision.mode, ScalingMode::IntegerLetterbox, "{native:?} <- {back:?}");
            let scaled_width = back.0 * (native.0 / back.0);
            assert_eq!(decision.dst.width(), scaled_width as i32);
            assert_eq!(decision.dst.left, ((native.0 - scaled_width) / 2) as i32);
        }
    }

    #[test]
    fn test_odd_border_rounding_is_configurable() {
        let input = fullscreen((1920, 1080), (639, 359));
        let floor = compute(&input, &ScalingOptions::default()).unwrap();
        assert_eq!(floor.mode, ScalingMode::IntegerLetterbox);
        assert_eq!(floor.dst, Rect::new(1, 1, 1918, 1078));

        let ceil_options = ScalingOptions {
            center_rounding: CenterRounding::Ceil,
            ..ScalingOptions::default()
        };
        let ceil = compute(&input, &ceil_options).unwrap();
        assert_eq!(ceil.dst, Rect::new(2, 2, 1919, 1079));
    }

    #[test]
    fn test_back_buffer_larger_than_native_stretches() {
        let decision = run(fullscreen((1280, 720), (1920, 1080)));
        assert_eq!(decision.mode, ScalingMode::StretchFullscreen);
        assert_eq!(decision.dst, Rect::new(0, 0, 1280, 720));
    }

    #[test]
    fn test_borderless_window_is_scaled_like_fullscreen() {
        let input = ScalingInput {
            windowed: true,
            borderless_fullscreen: true,
            client_rect: Some(Rect::new(0, 0, 3840, 2160)),
            ..fullscreen((3840, 2160), (1920, 1080))
        };
        let decision = run(input);
        assert_eq!(decision.mode, ScalingMode::IntegerLetterbox);
        assert_eq!(decision.dst, Rect::new(0, 0, 3840, 2160));
    }

    #[test]
    fn test_zero_tolerance_always_stretches() {
        // The mismatch test is `>=`, so a zero tolerance never admits integer scaling.
        let options = ScalingOptions {
            aspect_tolerance: 0.0,
            ..ScalingOptions::default()
        };
        let decision = compute(&fullscreen((3840, 2160), (1920, 1080)), &options).unwrap();
        assert_eq!(decision.mode, ScalingMode::StretchFullscreen);
    }

    #[test]
    fn test_zero_back_buffer_is_invalid_geometry() {
        let err = compute(&fullscreen((1920, 1080), (0, 720)), &ScalingOptions::default()).unwrap_err();
        assert_eq!(err, ScalingError::InvalidGeometry { width: 0, height: 720 });

        let err = compute(&fullscreen((1920, 1080), (1280, 0)), &ScalingOptions::default()).unwrap_err();
        assert_eq!(err, ScalingError::InvalidGeometry { width: 1280, height: 0 });
    }

    #[test]
    fn test_compute_is_idempotent() {
        let input = fullscreen((2560, 1440), (1024, 768));
        let first = run(input);
        let second = run(input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_substitute_rects_only_when_scaling() {
        let decision = run(fullscreen((3840, 2160), (1920, 1080)));
        assert_eq!(
            decision.substitute_rects(),
            Some((Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 3840, 2160)))
        );
    }
}
