//! Bodies of the intercepted `CreateDevice`, `Reset` and `Present` methods.
//!
//! They are generic over the parameter struct and window handle types of the
//! wrapped API, so the exported thunks only translate types and the logic can
//! be driven by fake COM objects.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::com::{ComProxy, ProxyHeader};
use crate::error::{HResult, ProxyError};
use crate::geometry::{Rect, Resolution};
use crate::native::NativeResolution;
use crate::present::{PresentParams, PresentState, ScalingContext};

/// `IDirect3D9::CreateDevice`.
pub const CREATE_DEVICE: usize = 16;
/// `IDirect3DDevice9::Reset`.
pub const RESET: usize = 16;
/// `IDirect3DDevice9::Present`.
pub const PRESENT: usize = 17;

type FnCreateDevice<W, P> =
    unsafe extern "system" fn(*mut c_void, u32, u32, W, u32, *mut P, *mut *mut c_void) -> HResult;
type FnReset<P> = unsafe extern "system" fn(*mut c_void, *mut P) -> HResult;
type FnPresent<W> = unsafe extern "system" fn(*mut c_void, *const Rect, *const Rect, W, *const c_void) -> HResult;

/// Per-device state carried by a device proxy.
pub struct DeviceState {
    present: Mutex<PresentState>,
}

impl DeviceState {
    pub fn new(state: PresentState) -> Self {
        Self {
            present: Mutex::new(state),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, PresentState> {
        self.present.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The arguments of `CreateDevice` that follow `this`.
pub struct CreateDeviceArgs<W, P> {
    pub adapter: u32,
    pub device_type: u32,
    pub focus_window: W,
    pub behavior_flags: u32,
    pub params: *mut P,
    pub returned: *mut *mut c_void,
}

/// Captures the native resolution on first use, forwards the creation and, on
/// success, replaces the returned device with whatever `wrap` builds around it.
/// When `wrap` fails the real device is handed out.
///
/// # Safety
/// `this` must be a live factory proxy, and `args` must be valid arguments for
/// the wrapped `CreateDevice`.
pub unsafe fn create_device<W, P, Q, F>(
    this: *mut c_void,
    native: &NativeResolution,
    query_native: Q,
    args: CreateDeviceArgs<W, P>,
    wrap: F,
) -> HResult
where
    Q: FnOnce(&ProxyHeader, u32) -> Option<Resolution>,
    F: FnOnce(NonNull<c_void>, &P) -> Result<*mut c_void, ProxyError>,
{
    let header = unsafe { ProxyHeader::from_this(this) };
    native.capture_with(|| query_native(header, args.adapter));

    let original: FnCreateDevice<W, P> = unsafe { header.original_method(CREATE_DEVICE) };
    let hr = unsafe {
        original(
            header.real(),
            args.adapter,
            args.device_type,
            args.focus_window,
            args.behavior_flags,
            args.params,
            args.returned,
        )
    };
    if let Err(e) = ProxyError::check(hr) {
        log::warn!("CreateDevice: {}", e);
        return hr;
    }
    if args.params.is_null() || args.returned.is_null() {
        return hr;
    }
    let Some(real_device) = NonNull::new(unsafe { *args.returned }) else {
        return hr;
    };

    // The runtime has written resolved values (e.g. a zero back buffer size) back by now.
    match wrap(real_device, unsafe { &*args.params }) {
        Ok(proxy) => unsafe { *args.returned = proxy },
        Err(e) => log::error!("Cannot wrap device, handing out the real one: {}", e),
    }
    hr
}

/// Forwards `Reset`, then lets the device state adopt the parameters if it succeeded.
///
/// # Safety
/// `this` must be a live device proxy and `params` valid for the wrapped `Reset`.
pub unsafe fn reset<P, R>(this: *mut c_void, ctx: &ScalingContext<'_>, params: *mut P, read_params: R) -> HResult
where
    R: FnOnce(&P) -> PresentParams,
{
    let proxy = unsafe { ComProxy::<DeviceState>::from_this(this) };
    let header = proxy.header();
    let original: FnReset<P> = unsafe { header.original_method(RESET) };

    // The state must not be locked here: a mode change dispatches window
    // messages on this thread and their handlers may call Present.
    let hr = unsafe { original(header.real(), params) };
    if params.is_null() {
        return hr;
    }
    proxy.state().lock().reset(ctx, hr, || read_params(unsafe { &*params }))
}

/// Forwards `Present` with the device's own rectangles while it is scaling and
/// the caller's otherwise. `window_override` and `dirty_region` always pass through.
///
/// # Safety
/// `this` must be a live device proxy and the pointers valid for the wrapped `Present`.
pub unsafe fn present<W>(
    this: *mut c_void,
    src: *const Rect,
    dst: *const Rect,
    window_override: W,
    dirty_region: *const c_void,
) -> HResult {
    let proxy = unsafe { ComProxy::<DeviceState>::from_this(this) };
    let header = proxy.header();
    let original: FnPresent<W> = unsafe { header.original_method(PRESENT) };

    let substitute = proxy.state().lock().present_rects();
    match substitute {
        Some((src, dst)) => {
            log::trace!("Present {:?} -> {:?}", src, dst);
            unsafe { original(header.real(), &src, &dst, window_override, dirty_region) }
        }
        None => unsafe { original(header.real(), src, dst, window_override, dirty_region) },
    }
}
