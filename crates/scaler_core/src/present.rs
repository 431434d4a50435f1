//! Per-device presentation state: the parameters a device was created or reset
//! with, and the scaling decision derived from them.

use crate::config::ScalerConfig;
use crate::error::{HResult, ProxyError};
use crate::geometry::{Rect, Resolution};
use crate::scaling::{self, ScalingDecision, ScalingInput};
use crate::window::{is_borderless_fullscreen, WindowHandle, WindowMetrics};

/// The part of the application's presentation parameters the scaler looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentParams {
    pub windowed: bool,
    pub window: WindowHandle,
    pub back_buffer: Resolution,
}

/// What a decision is computed against, besides the parameters themselves.
pub struct ScalingContext<'a> {
    pub native: Option<Resolution>,
    pub config: &'a ScalerConfig,
    pub metrics: &'a dyn WindowMetrics,
}

impl ScalingContext<'_> {
    /// Queries the window afresh and runs the calculator. Geometry the
    /// calculator rejects degrades to a passthrough decision.
    pub fn decide(&self, params: &PresentParams, window: WindowHandle) -> ScalingDecision {
        if !self.config.enabled {
            return ScalingDecision::passthrough(params.back_buffer);
        }

        let native = self.native.unwrap_or_default();
        let input = ScalingInput {
            native,
            back_buffer: params.back_buffer,
            windowed: params.windowed,
            borderless_fullscreen: params.windowed && is_borderless_fullscreen(self.metrics, window, native),
            client_rect: self.client_rect(window),
        };

        match scaling::compute(&input, &self.config.scaling_options()) {
            Ok(decision) => {
                log::info!(
                    "Back buffer {} (windowed: {}, borderless: {}) on display {}: {:?}, dst {:?}",
                    params.back_buffer,
                    params.windowed,
                    input.borderless_fullscreen,
                    native,
                    decision.mode,
                    decision.dst,
                );
                decision
            }
            Err(e) => {
                log::warn!("{}; presenting without scaling.", e);
                ScalingDecision::passthrough(params.back_buffer)
            }
        }
    }

    fn client_rect(&self, window: WindowHandle) -> Option<Rect> {
        if window.is_null() {
            None
        } else {
            self.metrics.client_rect_on_screen(window)
        }
    }
}

/// State owned by one device proxy. Replaced wholesale on a successful reset,
/// untouched on a failed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentState {
    params: PresentParams,
    focus_window: WindowHandle,
    decision: ScalingDecision,
}

impl PresentState {
    /// `focus_window` stands in for a null device window in `params`.
    pub fn new(ctx: &ScalingContext<'_>, params: PresentParams, focus_window: WindowHandle) -> Self {
        let decision = ctx.decide(&params, params.window.or(focus_window));
        Self {
            params,
            focus_window,
            decision,
        }
    }

    pub fn params(&self) -> &PresentParams {
        &self.params
    }

    pub fn decision(&self) -> &ScalingDecision {
        &self.decision
    }

    /// Applies the outcome of a wrapped reset that has already run. Only a
    /// success adopts the parameters from `read_params` and recomputes the
    /// decision. `hr` is returned unchanged.
    pub fn reset<P>(&mut self, ctx: &ScalingContext<'_>, hr: HResult, read_params: P) -> HResult
    where
        P: FnOnce() -> PresentParams,
    {
        if let Err(e) = ProxyError::check(hr) {
            log::warn!("Reset: {}; keeping previous scaling state.", e);
            return hr;
        }

        let params = read_params();
        self.decision = ctx.decide(&params, params.window.or(self.focus_window));
        self.params = params;
        hr
    }

    /// Rectangles to hand to the wrapped `Present`: ours while scaling is
    /// active, the caller's otherwise.
    pub fn present_rects(&self) -> Option<(Rect, Rect)> {
        self.decision.substitute_rects()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::{E_FAIL, S_OK};
    use crate::scaling::ScalingMode;
    use crate::window::tests::FakeWindow;

    const GAME_WINDOW: WindowHandle = WindowHandle(0x2a);

    fn params(windowed: bool, width: u32, height: u32) -> PresentParams {
        PresentParams {
            windowed,
            window: GAME_WINDOW,
            back_buffer: Resolution::new(width, height),
        }
    }

    fn borderless_window() -> FakeWindow {
        let full = Rect::new(0, 0, 3840, 2160);
        FakeWindow::new(full, full)
    }

    #[test]
    fn test_new_computes_initial_decision() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let state = PresentState::new(&ctx, params(false, 1920, 1080), WindowHandle::NULL);
        assert_eq!(state.decision().mode, ScalingMode::IntegerLetterbox);
        assert_eq!(
            state.present_rects(),
            Some((Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 3840, 2160)))
        );
    }

    #[test]
    fn test_successful_reset_adopts_new_params() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let mut state = PresentState::new(&ctx, params(false, 1920, 1080), WindowHandle::NULL);

        let hr = state.reset(&ctx, S_OK, || params(false, 3840, 2160));
        assert_eq!(hr, S_OK);
        assert_eq!(state.params().back_buffer, Resolution::new(3840, 2160));
        assert_eq!(state.decision().mode, ScalingMode::NoScale);
        assert_eq!(state.present_rects(), None);
    }

    #[test]
    fn test_failed_reset_leaves_state_identical() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let mut state = PresentState::new(&ctx, params(false, 1280, 720), WindowHandle::NULL);
        let before = state.clone();

        let device_lost = 0x8876_0868_u32 as i32;
        let read = Cell::new(false);
        let hr = state.reset(
            &ctx,
            device_lost,
            || {
                read.set(true);
                params(true, 800, 600)
            },
        );

        assert_eq!(hr, device_lost);
        assert_eq!(state, before);
        assert!(!read.get());
    }

    #[test]
    fn test_success_code_is_returned_verbatim() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: None,
            config: &config,
            metrics: &window,
        };
        let mut state = PresentState::new(&ctx, params(false, 1280, 720), WindowHandle::NULL);
        let occluded = 0x0876_0868;
        assert_eq!(state.reset(&ctx, occluded, || params(false, 1280, 720)), occluded);
    }

    #[test]
    fn test_windowed_device_keeps_caller_rects() {
        let config = ScalerConfig::default();
        let window = FakeWindow::new(Rect::new(92, 69, 908, 731), Rect::new(100, 100, 900, 700));
        let ctx = ScalingContext {
            native: Some(Resolution::new(1920, 1080)),
            config: &config,
            metrics: &window,
        };
        let state = PresentState::new(&ctx, params(true, 800, 600), WindowHandle::NULL);
        assert_eq!(state.decision().mode, ScalingMode::NoScale);
        assert_eq!(state.decision().dst, Rect::new(100, 100, 900, 700));
        assert_eq!(state.present_rects(), None);
    }

    #[test]
    fn test_borderless_window_is_scaled() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let state = PresentState::new(&ctx, params(true, 1280, 720), WindowHandle::NULL);
        assert_eq!(state.decision().mode, ScalingMode::IntegerLetterbox);
        assert_eq!(state.decision().dst, Rect::new(0, 0, 3840, 2160));
    }

    #[test]
    fn test_null_device_window_falls_back_to_focus_window() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let mut p = params(true, 1280, 720);
        p.window = WindowHandle::NULL;

        let without_focus = PresentState::new(&ctx, p, WindowHandle::NULL);
        assert_eq!(without_focus.decision().mode, ScalingMode::NoScale);

        let with_focus = PresentState::new(&ctx, p, GAME_WINDOW);
        assert_eq!(with_focus.decision().mode, ScalingMode::IntegerLetterbox);
    }

    #[test]
    fn test_zero_back_buffer_degrades_to_passthrough() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let state = PresentState::new(&ctx, params(false, 0, 0), WindowHandle::NULL);
        assert_eq!(state.decision().mode, ScalingMode::NoScale);
        assert_eq!(state.present_rects(), None);
    }

    #[test]
    fn test_disabled_config_never_scales() {
        let config = ScalerConfig {
            enabled: false,
            ..ScalerConfig::default()
        };
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let state = PresentState::new(&ctx, params(false, 1920, 1080), WindowHandle::NULL);
        assert_eq!(state.present_rects(), None);
    }

    #[test]
    fn test_reset_failure_after_fullscreen_keeps_substitution() {
        let config = ScalerConfig::default();
        let window = borderless_window();
        let ctx = ScalingContext {
            native: Some(Resolution::new(3840, 2160)),
            config: &config,
            metrics: &window,
        };
        let mut state = PresentState::new(&ctx, params(false, 1920, 1080), WindowHandle::NULL);
        let rects = state.present_rects();
        state.reset(&ctx, E_FAIL, || params(true, 640, 480));
        assert_eq!(state.present_rects(), rects);
    }
}
