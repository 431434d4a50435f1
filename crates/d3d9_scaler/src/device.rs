//! The `IDirect3DDevice9` proxy.
//!
//! Reset (slot 16) and Present (slot 17) are intercepted; every other slot is a
//! pure forward to the real device.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::LazyLock;

use scaler_core::com::{ComProxy, ProxyVTable, VTableBuilder};
use scaler_core::intercept::{self, DeviceState, PRESENT, RESET};
use scaler_core::{
    HResult, PresentParams, PresentState, ProxyError, Rect, Resolution, ScalingContext, WindowHandle, NATIVE_RESOLUTION,
};
use windows::core::Interface;
use windows::Win32::Foundation::{HWND, RECT};
use windows::Win32::Graphics::Direct3D9::{IDirect3DDevice9, D3DPRESENT_PARAMETERS};

use crate::window::{self, Win32Window};

const DEVICE_SLOTS: usize = 119;

static DEVICE_VTABLE: LazyLock<Result<ProxyVTable, ProxyError>> = LazyLock::new(|| {
    VTableBuilder::new(DEVICE_SLOTS)
        .unknown::<DeviceState>()
        .identity(crate::interface_id(&IDirect3DDevice9::IID))
        .slots(forwarded::forwarded_slots())
        .slot(RESET, reset as usize)
        .slot(PRESENT, present as usize)
        .finish()
});

fn scaling_context() -> ScalingContext<'static> {
    ScalingContext {
        native: NATIVE_RESOLUTION.get(),
        config: crate::runtime::config(),
        metrics: &Win32Window,
    }
}

/// Reads the fields the scaler cares about out of the application's parameters.
pub fn snapshot(params: &D3DPRESENT_PARAMETERS) -> PresentParams {
    PresentParams {
        windowed: params.Windowed.as_bool(),
        window: window::from_hwnd(params.hDeviceWindow),
        back_buffer: Resolution::new(params.BackBufferWidth, params.BackBufferHeight),
    }
}

/// Wraps a freshly created real device, taking over the caller's reference on it.
pub fn wrap(real: NonNull<c_void>, params: PresentParams, focus_window: WindowHandle) -> Result<*mut c_void, ProxyError> {
    let table = DEVICE_VTABLE.as_ref().map_err(Clone::clone)?;
    let state = PresentState::new(&scaling_context(), params, focus_window);
    let proxy = ComProxy::into_raw(table, real, DeviceState::new(state));
    log::info!("Device {:p} wrapped as {:p}.", real, proxy);
    Ok(proxy)
}

unsafe extern "system" fn reset(this: *mut c_void, ppresentationparameters: *mut D3DPRESENT_PARAMETERS) -> HResult {
    log::info!("IDirect3DDevice9::Reset");
    unsafe { intercept::reset(this, &scaling_context(), ppresentationparameters, snapshot) }
}

unsafe extern "system" fn present(
    this: *mut c_void,
    psourcerect: *const RECT,
    pdestrect: *const RECT,
    hdestwindowoverride: HWND,
    pdirtyregion: *const c_void,
) -> HResult {
    // `Rect` has the layout of `RECT`.
    unsafe {
        intercept::present(
            this,
            psourcerect.cast::<Rect>(),
            pdestrect.cast::<Rect>(),
            hdestwindowoverride,
            pdirtyregion,
        )
    }
}

mod forwarded {
    use std::ffi::c_void;

    use scaler_core::HResult;
    use windows::Win32::Foundation::BOOL;

    // D3D enums, DWORDs and D3DCOLORs are all 32-bit; every interface, struct
    // and array argument is passed by pointer.
    scaler_core::forward_methods! {
        3 => fn TestCooperativeLevel() -> HResult;
        4 => fn GetAvailableTextureMem() -> u32;
        5 => fn EvictManagedResources() -> HResult;
        6 => fn GetDirect3D(d3d9: *mut *mut c_void) -> HResult;
        7 => fn GetDeviceCaps(caps: *mut c_void) -> HResult;
        8 => fn GetDisplayMode(swap_chain: u32, mode: *mut c_void) -> HResult;
        9 => fn GetCreationParameters(parameters: *mut c_void) -> HResult;
        10 => fn SetCursorProperties(x_hot_spot: u32, y_hot_spot: u32, cursor_bitmap: *mut c_void) -> HResult;
        11 => fn SetCursorPosition(x: i32, y: i32, flags: u32) -> ();
        12 => fn ShowCursor(show: BOOL) -> BOOL;
        13 => fn CreateAdditionalSwapChain(presentation_parameters: *mut c_void, swap_chain: *mut *mut c_void) -> HResult;
        14 => fn GetSwapChain(swap_chain_index: u32, swap_chain: *mut *mut c_void) -> HResult;
        15 => fn GetNumberOfSwapChains() -> u32;
        18 => fn GetBackBuffer(swap_chain: u32, back_buffer: u32, kind: u32, surface: *mut *mut c_void) -> HResult;
        19 => fn GetRasterStatus(swap_chain: u32, raster_status: *mut c_void) -> HResult;
        20 => fn SetDialogBoxMode(enable: BOOL) -> HResult;
        21 => fn SetGammaRamp(swap_chain: u32, flags: u32, ramp: *const c_void) -> ();
        22 => fn GetGammaRamp(swap_chain: u32, ramp: *mut c_void) -> ();
        23 => fn CreateTexture(width: u32, height: u32, levels: u32, usage: u32, format: u32, pool: u32, texture: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        24 => fn CreateVolumeTexture(width: u32, height: u32, depth: u32, levels: u32, usage: u32, format: u32, pool: u32, volume_texture: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        25 => fn CreateCubeTexture(edge_length: u32, levels: u32, usage: u32, format: u32, pool: u32, cube_texture: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        26 => fn CreateVertexBuffer(length: u32, usage: u32, fvf: u32, pool: u32, vertex_buffer: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        27 => fn CreateIndexBuffer(length: u32, usage: u32, format: u32, pool: u32, index_buffer: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        28 => fn CreateRenderTarget(width: u32, height: u32, format: u32, multi_sample: u32, multisample_quality: u32, lockable: BOOL, surface: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        29 => fn CreateDepthStencilSurface(width: u32, height: u32, format: u32, multi_sample: u32, multisample_quality: u32, discard: BOOL, surface: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        30 => fn UpdateSurface(source_surface: *mut c_void, source_rect: *const c_void, destination_surface: *mut c_void, dest_point: *const c_void) -> HResult;
        31 => fn UpdateTexture(source_texture: *mut c_void, destination_texture: *mut c_void) -> HResult;
        32 => fn GetRenderTargetData(render_target: *mut c_void, dest_surface: *mut c_void) -> HResult;
        33 => fn GetFrontBufferData(swap_chain: u32, dest_surface: *mut c_void) -> HResult;
        34 => fn StretchRect(source_surface: *mut c_void, source_rect: *const c_void, dest_surface: *mut c_void, dest_rect: *const c_void, filter: u32) -> HResult;
        35 => fn ColorFill(surface: *mut c_void, rect: *const c_void, color: u32) -> HResult;
        36 => fn CreateOffscreenPlainSurface(width: u32, height: u32, format: u32, pool: u32, surface: *mut *mut c_void, shared_handle: *mut c_void) -> HResult;
        37 => fn SetRenderTarget(render_target_index: u32, render_target: *mut c_void) -> HResult;
        38 => fn GetRenderTarget(render_target_index: u32, render_target: *mut *mut c_void) -> HResult;
        39 => fn SetDepthStencilSurface(new_z_stencil: *mut c_void) -> HResult;
        40 => fn GetDepthStencilSurface(z_stencil_surface: *mut *mut c_void) -> HResult;
        41 => fn BeginScene() -> HResult;
        42 => fn EndScene() -> HResult;
        43 => fn Clear(count: u32, rects: *const c_void, flags: u32, color: u32, z: f32, stencil: u32) -> HResult;
        44 => fn SetTransform(state: u32, matrix: *const c_void) -> HResult;
        45 => fn GetTransform(state: u32, matrix: *mut c_void) -> HResult;
        46 => fn MultiplyTransform(state: u32, matrix: *const c_void) -> HResult;
        47 => fn SetViewport(viewport: *const c_void) -> HResult;
        48 => fn GetViewport(viewport: *mut c_void) -> HResult;
        49 => fn SetMaterial(material: *const c_void) -> HResult;
        50 => fn GetMaterial(material: *mut c_void) -> HResult;
        51 => fn SetLight(index: u32, light: *const c_void) -> HResult;
        52 => fn GetLight(index: u32, light: *mut c_void) -> HResult;
        53 => fn LightEnable(index: u32, enable: BOOL) -> HResult;
        54 => fn GetLightEnable(index: u32, enable: *mut BOOL) -> HResult;
        55 => fn SetClipPlane(index: u32, plane: *const f32) -> HResult;
        56 => fn GetClipPlane(index: u32, plane: *mut f32) -> HResult;
        57 => fn SetRenderState(state: u32, value: u32) -> HResult;
        58 => fn GetRenderState(state: u32, value: *mut u32) -> HResult;
        59 => fn CreateStateBlock(kind: u32, state_block: *mut *mut c_void) -> HResult;
        60 => fn BeginStateBlock() -> HResult;
        61 => fn EndStateBlock(state_block: *mut *mut c_void) -> HResult;
        62 => fn SetClipStatus(clip_status: *const c_void) -> HResult;
        63 => fn GetClipStatus(clip_status: *mut c_void) -> HResult;
        64 => fn GetTexture(stage: u32, texture: *mut *mut c_void) -> HResult;
        65 => fn SetTexture(stage: u32, texture: *mut c_void) -> HResult;
        66 => fn GetTextureStageState(stage: u32, kind: u32, value: *mut u32) -> HResult;
        67 => fn SetTextureStageState(stage: u32, kind: u32, value: u32) -> HResult;
        68 => fn GetSamplerState(sampler: u32, kind: u32, value: *mut u32) -> HResult;
        69 => fn SetSamplerState(sampler: u32, kind: u32, value: u32) -> HResult;
        70 => fn ValidateDevice(num_passes: *mut u32) -> HResult;
        71 => fn SetPaletteEntries(palette_number: u32, entries: *const c_void) -> HResult;
        72 => fn GetPaletteEntries(palette_number: u32, entries: *mut c_void) -> HResult;
        73 => fn SetCurrentTexturePalette(palette_number: u32) -> HResult;
        74 => fn GetCurrentTexturePalette(palette_number: *mut u32) -> HResult;
        75 => fn SetScissorRect(rect: *const c_void) -> HResult;
        76 => fn GetScissorRect(rect: *mut c_void) -> HResult;
        77 => fn SetSoftwareVertexProcessing(software: BOOL) -> HResult;
        78 => fn GetSoftwareVertexProcessing() -> BOOL;
        79 => fn SetNPatchMode(segments: f32) -> HResult;
        80 => fn GetNPatchMode() -> f32;
        81 => fn DrawPrimitive(primitive_type: u32, start_vertex: u32, primitive_count: u32) -> HResult;
        82 => fn DrawIndexedPrimitive(primitive_type: u32, base_vertex_index: i32, min_vertex_index: u32, num_vertices: u32, start_index: u32, prim_count: u32) -> HResult;
        83 => fn DrawPrimitiveUP(primitive_type: u32, primitive_count: u32, vertex_stream_zero_data: *const c_void, vertex_stream_zero_stride: u32) -> HResult;
        84 => fn DrawIndexedPrimitiveUP(primitive_type: u32, min_vertex_index: u32, num_vertices: u32, primitive_count: u32, index_data: *const c_void, index_data_format: u32, vertex_stream_zero_data: *const c_void, vertex_stream_zero_stride: u32) -> HResult;
        85 => fn ProcessVertices(src_start_index: u32, dest_index: u32, vertex_count: u32, dest_buffer: *mut c_void, vertex_decl: *mut c_void, flags: u32) -> HResult;
        86 => fn CreateVertexDeclaration(vertex_elements: *const c_void, decl: *mut *mut c_void) -> HResult;
        87 => fn SetVertexDeclaration(decl: *mut c_void) -> HResult;
        88 => fn GetVertexDeclaration(decl: *mut *mut c_void) -> HResult;
        89 => fn SetFVF(fvf: u32) -> HResult;
        90 => fn GetFVF(fvf: *mut u32) -> HResult;
        91 => fn CreateVertexShader(function: *const u32, shader: *mut *mut c_void) -> HResult;
        92 => fn SetVertexShader(shader: *mut c_void) -> HResult;
        93 => fn GetVertexShader(shader: *mut *mut c_void) -> HResult;
        94 => fn SetVertexShaderConstantF(start_register: u32, constant_data: *const f32, vector4f_count: u32) -> HResult;
        95 => fn GetVertexShaderConstantF(start_register: u32, constant_data: *mut f32, vector4f_count: u32) -> HResult;
        96 => fn SetVertexShaderConstantI(start_register: u32, constant_data: *const i32, vector4i_count: u32) -> HResult;
        97 => fn GetVertexShaderConstantI(start_register: u32, constant_data: *mut i32, vector4i_count: u32) -> HResult;
        98 => fn SetVertexShaderConstantB(start_register: u32, constant_data: *const BOOL, bool_count: u32) -> HResult;
        99 => fn GetVertexShaderConstantB(start_register: u32, constant_data: *mut BOOL, bool_count: u32) -> HResult;
        100 => fn SetStreamSource(stream_number: u32, stream_data: *mut c_void, offset_in_bytes: u32, stride: u32) -> HResult;
        101 => fn GetStreamSource(stream_number: u32, stream_data: *mut *mut c_void, offset_in_bytes: *mut u32, stride: *mut u32) -> HResult;
        102 => fn SetStreamSourceFreq(stream_number: u32, setting: u32) -> HResult;
        103 => fn GetStreamSourceFreq(stream_number: u32, setting: *mut u32) -> HResult;
        104 => fn SetIndices(index_data: *mut c_void) -> HResult;
        105 => fn GetIndices(index_data: *mut *mut c_void) -> HResult;
        106 => fn CreatePixelShader(function: *const u32, shader: *mut *mut c_void) -> HResult;
        107 => fn SetPixelShader(shader: *mut c_void) -> HResult;
        108 => fn GetPixelShader(shader: *mut *mut c_void) -> HResult;
        109 => fn SetPixelShaderConstantF(start_register: u32, constant_data: *const f32, vector4f_count: u32) -> HResult;
        110 => fn GetPixelShaderConstantF(start_register: u32, constant_data: *mut f32, vector4f_count: u32) -> HResult;
        111 => fn SetPixelShaderConstantI(start_register: u32, constant_data: *const i32, vector4i_count: u32) -> HResult;
        112 => fn GetPixelShaderConstantI(start_register: u32, constant_data: *mut i32, vector4i_count: u32) -> HResult;
        113 => fn SetPixelShaderConstantB(start_register: u32, constant_data: *const BOOL, bool_count: u32) -> HResult;
        114 => fn GetPixelShaderConstantB(start_register: u32, constant_data: *mut BOOL, bool_count: u32) -> HResult;
        115 => fn DrawRectPatch(handle: u32, num_segs: *const f32, rect_patch_info: *const c_void) -> HResult;
        116 => fn DrawTriPatch(handle: u32, num_segs: *const f32, tri_patch_info: *const c_void) -> HResult;
        117 => fn DeletePatch(handle: u32) -> HResult;
        118 => fn CreateQuery(kind: u32, query: *mut *mut c_void) -> HResult;
    }
}
