//! The `IDirect3D9` proxy. Only `CreateDevice` is intercepted.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::LazyLock;

use scaler_core::com::{ComProxy, ProxyHeader, ProxyVTable, VTableBuilder};
use scaler_core::intercept::{self, CreateDeviceArgs, CREATE_DEVICE};
use scaler_core::{succeeded, HResult, ProxyError, Resolution, NATIVE_RESOLUTION};
use windows::core::Interface;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D9::{IDirect3D9, D3DDISPLAYMODE, D3DPRESENT_PARAMETERS};

use crate::{device, window};

const FACTORY_SLOTS: usize = 17;
const GET_ADAPTER_DISPLAY_MODE: usize = 8;

type FnGetAdapterDisplayMode = unsafe extern "system" fn(this: *mut c_void, adapter: u32, mode: *mut D3DDISPLAYMODE) -> HResult;

static FACTORY_VTABLE: LazyLock<Result<ProxyVTable, ProxyError>> = LazyLock::new(|| {
    VTableBuilder::new(FACTORY_SLOTS)
        .unknown::<()>()
        .identity(crate::interface_id(&IDirect3D9::IID))
        .slots(forwarded::forwarded_slots())
        .slot(CREATE_DEVICE, create_device as usize)
        .finish()
});

/// Wraps a real factory, taking over the caller's reference on it.
pub fn wrap(real: NonNull<c_void>) -> Result<*mut c_void, ProxyError> {
    let table = FACTORY_VTABLE.as_ref().map_err(Clone::clone)?;
    let proxy = ComProxy::into_raw(table, real, ());
    log::info!("Direct3D9 factory {:p} wrapped as {:p}.", real, proxy);
    Ok(proxy)
}

fn query_display_mode(header: &ProxyHeader, adapter: u32) -> Option<Resolution> {
    let get_mode: FnGetAdapterDisplayMode = unsafe { header.original_method(GET_ADAPTER_DISPLAY_MODE) };
    let mut mode = D3DDISPLAYMODE::default();
    let hr = unsafe { get_mode(header.real(), adapter, &mut mode) };
    if succeeded(hr) {
        Some(Resolution::new(mode.Width, mode.Height))
    } else {
        log::warn!("GetAdapterDisplayMode({}) returned {:#010x}", adapter, hr);
        None
    }
}

unsafe extern "system" fn create_device(
    this: *mut c_void,
    adapter: u32,
    devicetype: u32,
    hfocuswindow: HWND,
    behaviorflags: u32,
    ppresentationparameters: *mut D3DPRESENT_PARAMETERS,
    ppreturneddeviceinterface: *mut *mut c_void,
) -> HResult {
    log::info!("IDirect3D9::CreateDevice(adapter: {}, type: {})", adapter, devicetype);
    let args = CreateDeviceArgs {
        adapter,
        device_type: devicetype,
        focus_window: hfocuswindow,
        behavior_flags: behaviorflags,
        params: ppresentationparameters,
        returned: ppreturneddeviceinterface,
    };
    unsafe {
        intercept::create_device(this, &NATIVE_RESOLUTION, query_display_mode, args, |real, params| {
            device::wrap(real, device::snapshot(params), window::from_hwnd(hfocuswindow))
        })
    }
}

mod forwarded {
    use std::ffi::c_void;

    use scaler_core::HResult;
    use windows::Win32::Foundation::BOOL;

    scaler_core::forward_methods! {
        3 => fn RegisterSoftwareDevice(initialize_function: *mut c_void) -> HResult;
        4 => fn GetAdapterCount() -> u32;
        5 => fn GetAdapterIdentifier(adapter: u32, flags: u32, identifier: *mut c_void) -> HResult;
        6 => fn GetAdapterModeCount(adapter: u32, format: u32) -> u32;
        7 => fn EnumAdapterModes(adapter: u32, format: u32, mode: u32, display_mode: *mut c_void) -> HResult;
        8 => fn GetAdapterDisplayMode(adapter: u32, display_mode: *mut c_void) -> HResult;
        9 => fn CheckDeviceType(adapter: u32, device_type: u32, adapter_format: u32, back_buffer_format: u32, windowed: BOOL) -> HResult;
        10 => fn CheckDeviceFormat(adapter: u32, device_type: u32, adapter_format: u32, usage: u32, resource_type: u32, check_format: u32) -> HResult;
        11 => fn CheckDeviceMultiSampleType(adapter: u32, device_type: u32, surface_format: u32, windowed: BOOL, multi_sample_type: u32, quality_levels: *mut u32) -> HResult;
        12 => fn CheckDepthStencilMatch(adapter: u32, device_type: u32, adapter_format: u32, render_target_format: u32, depth_stencil_format: u32) -> HResult;
        13 => fn CheckDeviceFormatConversion(adapter: u32, device_type: u32, source_format: u32, target_format: u32) -> HResult;
        14 => fn GetDeviceCaps(adapter: u32, device_type: u32, caps: *mut c_void) -> HResult;
        15 => fn GetAdapterMonitor(adapter: u32) -> *mut c_void;
    }
}
