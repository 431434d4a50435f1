//! d3d9_scaler: a drop-in d3d9.dll that scales the presented frame to the
//! display's native resolution.
//!
//! This crate is responsible for:
//! - Loading the system d3d9.dll and forwarding all of its exports.
//! - Wrapping the factory returned by `Direct3DCreate9` so that `CreateDevice`
//!   can capture the native display mode and wrap each new device.
//! - Rewriting the source/destination rectangles of `Present` on wrapped devices,
//!   and recomputing them whenever the device is `Reset`.
#![cfg(target_os = "windows")]
#![allow(non_snake_case)]

use std::ffi::c_void;
use std::ptr::NonNull;

use scaler_core::com::Guid;
use windows::core::{GUID, HRESULT, PCWSTR};
use windows::Win32::Foundation::{BOOL, E_FAIL};

#[macro_use]
mod loader;
mod device;
mod factory;
mod logger;
mod runtime;
mod window;

pub(crate) fn interface_id(iid: &GUID) -> Guid {
    Guid {
        data1: iid.data1,
        data2: iid.data2,
        data3: iid.data3,
        data4: iid.data4,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "system" fn Direct3DCreate9(sdk_version: u32) -> *mut c_void {
    type FnType = unsafe extern "system" fn(u32) -> *mut c_void;

    runtime::initialize();
    log::info!("Direct3DCreate9({:#x})", sdk_version);

    let original_fn: FnType = match unsafe { loader::get_original_function(loader::DIRECT3D_CREATE9) } {
        Ok(f) => f,
        Err(e) => {
            log::error!("Direct3DCreate9: {}", e);
            return std::ptr::null_mut();
        }
    };

    let Some(real) = NonNull::new(unsafe { original_fn(sdk_version) }) else {
        log::warn!("System Direct3DCreate9 returned null.");
        return std::ptr::null_mut();
    };

    match factory::wrap(real) {
        Ok(proxy) => proxy,
        Err(e) => {
            log::error!("Cannot wrap factory, handing out the real one: {}", e);
            real.as_ptr()
        }
    }
}

// Everything else goes straight to the system library.
create_proxy_function!(D3DPERF_BeginEvent, 1, (col: u32, wsz_name: PCWSTR), i32, -1);
create_proxy_function!(D3DPERF_EndEvent, 2, (), i32, -1);
create_proxy_function!(D3DPERF_GetStatus, 3, (), u32, 0);
create_proxy_function!(D3DPERF_QueryRepeatFrame, 4, (), BOOL, BOOL(0));
create_proxy_function!(D3DPERF_SetMarker, 5, (col: u32, wsz_name: PCWSTR), (), ());
create_proxy_function!(D3DPERF_SetOptions, 6, (dw_options: u32), (), ());
create_proxy_function!(D3DPERF_SetRegion, 7, (col: u32, wsz_name: PCWSTR), (), ());
create_proxy_function!(DebugSetLevel, 8, (level: u32), i32, 0);
create_proxy_function!(DebugSetMute, 9, (), (), ());
create_proxy_function!(Direct3D9EnableMaximizedWindowedModeShim, 10, (enable: BOOL), i32, 0);
create_proxy_function!(Direct3DCreate9Ex, 12, (sdk_version: u32, out_ptr: *mut *mut c_void), HRESULT, E_FAIL);
create_proxy_function!(Direct3DShaderValidatorCreate9, 13, (), *mut c_void, std::ptr::null_mut());
create_proxy_function!(PSGPError, 14, (d3dfe: *mut c_void, error_id: u32, value: u32), (), ());
create_proxy_function!(
    PSGPSampleTexture,
    15,
    (d3dfe: *mut c_void, stage: u32, coords: *mut c_void, count: u32, result: *mut c_void),
    (),
    ()
);
