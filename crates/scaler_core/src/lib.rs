//! scaler_core: the platform-independent half of the d3d9 resolution scaler.
//!
//! - `scaling` decides, per set of presentation parameters, whether a frame is
//!   stretched, integer-letterboxed or left alone, and with which rectangles.
//! - `window` detects borderless-fullscreen windows through the `WindowMetrics` trait.
//! - `present` owns the per-device parameters/decision pair and its reset rules.
//! - `intercept` carries the bodies of the intercepted `CreateDevice`, `Reset`
//!   and `Present` methods.
//! - `native` holds the process-wide, write-once native display resolution.
//! - `com` provides the generic COM proxy object and the `forward_methods!` macro
//!   used to build complete pass-through vtables.
//! - `config` reads the optional `d3d9_scaler.toml`.

pub mod com;
pub mod config;
pub mod error;
pub mod geometry;
pub mod intercept;
pub mod native;
pub mod present;
pub mod scaling;
pub mod window;

pub use config::{ConfigError, ScalerConfig, CONFIG_FILE_NAME};
pub use error::{succeeded, HResult, ProxyError, ScalingError, E_FAIL, S_OK};
pub use geometry::{Rect, Resolution};
pub use native::{NativeResolution, NATIVE_RESOLUTION};
pub use present::{PresentParams, PresentState, ScalingContext};
pub use scaling::{compute, CenterRounding, ScalingDecision, ScalingInput, ScalingMode, ScalingOptions};
pub use window::{is_borderless_fullscreen, WindowHandle, WindowMetrics};
