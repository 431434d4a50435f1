use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::PathBuf;
use std::sync::LazyLock;

use scaler_core::ProxyError;
use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::FARPROC;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::Win32::System::SystemInformation::GetSystemDirectoryW;

/// Every export of the system d3d9.dll, in ordinal order (ordinal = index + 1).
const NAMES: [&[u8]; 15] = [
    b"D3DPERF_BeginEvent\0", b"D3DPERF_EndEvent\0", b"D3DPERF_GetStatus\0",
    b"D3DPERF_QueryRepeatFrame\0", b"D3DPERF_SetMarker\0", b"D3DPERF_SetOptions\0",
    b"D3DPERF_SetRegion\0", b"DebugSetLevel\0", b"DebugSetMute\0",
    b"Direct3D9EnableMaximizedWindowedModeShim\0", b"Direct3DCreate9\0",
    b"Direct3DCreate9Ex\0", b"Direct3DShaderValidatorCreate9\0", b"PSGPError\0",
    b"PSGPSampleTexture\0",
];

pub const DIRECT3D_CREATE9: usize = 11;

pub struct D3d9Functions {
    functions: [FARPROC; 15],
}

/// Bound on first use and kept for the life of the process; the library is never freed.
static REAL_D3D9: LazyLock<Result<D3d9Functions, ProxyError>> = LazyLock::new(|| {
    let result = load_system_d3d9();
    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result
});

fn load_system_d3d9() -> Result<D3d9Functions, ProxyError> {
    // Construct the path to the original d3d9.dll in the System32 folder,
    // so that we never end up loading ourselves.
    let mut system_path_buf = vec![0u16; 260];
    let len = unsafe { GetSystemDirectoryW(Some(&mut system_path_buf)) } as usize;
    if len == 0 || len > system_path_buf.len() {
        return Err(ProxyError::InitializationFailure(
            "cannot determine the system directory".to_string(),
        ));
    }
    system_path_buf.truncate(len);
    let mut path = PathBuf::from(std::ffi::OsString::from_wide(&system_path_buf));
    path.push("d3d9.dll");

    let wide_path: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
    let lib_handle = unsafe { LoadLibraryW(PCWSTR(wide_path.as_ptr())) }.map_err(|e| {
        ProxyError::InitializationFailure(format!("cannot load {}: {}", path.display(), e))
    })?;

    // Missing exports are tolerated here; only the entry points that need them fail.
    let mut functions: [FARPROC; 15] = [None; 15];
    for (i, &name) in NAMES.iter().enumerate() {
        functions[i] = unsafe { GetProcAddress(lib_handle, PCSTR::from_raw(name.as_ptr())) };
        if functions[i].is_none() {
            log::warn!("{} does not export {}", path.display(), export_name(i + 1));
        }
    }

    log::info!("Bound system library {}", path.display());
    Ok(D3d9Functions { functions })
}

fn export_name(ordinal: usize) -> String {
    let name = NAMES[ordinal - 1];
    String::from_utf8_lossy(&name[..name.len() - 1]).into_owned()
}

/// Resolves export `ordinal` of the system library as function type `T`.
///
/// # Safety
/// `T` must be the exact function pointer type of that export.
#[inline]
pub unsafe fn get_original_function<T>(ordinal: usize) -> Result<T, ProxyError> {
    let real = REAL_D3D9.as_ref().map_err(Clone::clone)?;
    let func_ptr = real.functions[ordinal - 1].ok_or_else(|| {
        ProxyError::InitializationFailure(format!("{} is not available", export_name(ordinal)))
    })?;
    Ok(unsafe { std::mem::transmute_copy(&func_ptr) })
}

// ======================================================== \\
/// Exports `$fn_name` as a straight pass-through to the same export of the
/// system library. When that export cannot be bound, `$fallback` is returned.
#[macro_export]
macro_rules! create_proxy_function {
    ($fn_name:ident, $ordinal:expr, ($($arg_name:ident: $arg_type:ty),*), $ret_type:ty, $fallback:expr) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "system" fn $fn_name($($arg_name: $arg_type),*) -> $ret_type {
            type FnType = unsafe extern "system" fn($($arg_type),*) -> $ret_type;
            crate::runtime::initialize();
            match unsafe { crate::loader::get_original_function::<FnType>($ordinal) } {
                Ok(original_fn) => unsafe { original_fn($($arg_name),*) },
                Err(e) => {
                    log::error!("{}: {}", stringify!($fn_name), e);
                    $fallback
                }
            }
        }
    };
}
