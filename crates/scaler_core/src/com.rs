//! Generic COM proxy objects.
//!
//! A proxy is a heap object whose first word is a vtable pointer, so COM callers
//! cannot tell it from the object it wraps. Every slot of that vtable is either an
//! intercept or a thunk generated by [`forward_methods!`](crate::forward_methods)
//! that swaps `this` for the wrapped object and jumps to the wrapped object's own
//! implementation of the same slot.
//!
//! Lifetime is delegated: `AddRef`/`Release` go straight to the wrapped object and
//! the proxy frees itself when a forwarded `Release` reports zero. The proxy never
//! keeps a count of its own.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::error::{succeeded, HResult, ProxyError};

pub const QUERY_INTERFACE: usize = 0;
pub const ADD_REF: usize = 1;
pub const RELEASE: usize = 2;

type FnQueryInterface = unsafe extern "system" fn(*mut c_void, *const c_void, *mut *mut c_void) -> HResult;
type FnAddRef = unsafe extern "system" fn(*mut c_void) -> u32;
type FnRelease = unsafe extern "system" fn(*mut c_void) -> u32;

/// Binary layout of a COM interface identifier.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const IUNKNOWN: Guid = Guid::from_u128(0x00000000_0000_0000_c000_000000000046);

    pub const fn from_u128(uuid: u128) -> Self {
        Self {
            data1: (uuid >> 96) as u32,
            data2: (uuid >> 80) as u16,
            data3: (uuid >> 64) as u16,
            data4: (uuid as u64).to_be_bytes(),
        }
    }
}

/// A finished proxy vtable plus the interface IDs the proxy answers for itself.
pub struct ProxyVTable {
    slots: Box<[usize]>,
    identities: Box<[Guid]>,
}

impl ProxyVTable {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn answers_for(&self, iid: &Guid) -> bool {
        self.identities.contains(iid)
    }
}

/// Assembles a [`ProxyVTable`], refusing to produce one with a hole in it.
pub struct VTableBuilder {
    slots: Vec<Option<usize>>,
    identities: Vec<Guid>,
    error: Option<ProxyError>,
}

impl VTableBuilder {
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            identities: vec![Guid::IUNKNOWN],
            error: None,
        }
    }

    /// Fills the three `IUnknown` slots with the delegating implementations
    /// for a proxy carrying state `S`.
    pub fn unknown<S>(self) -> Self {
        self.slot(QUERY_INTERFACE, query_interface as usize)
            .slot(ADD_REF, add_ref as usize)
            .slot(RELEASE, release::<S> as usize)
    }

    /// An interface ID for which `QueryInterface` hands out the proxy itself.
    pub fn identity(mut self, iid: Guid) -> Self {
        self.identities.push(iid);
        self
    }

    pub fn slot(mut self, index: usize, function: usize) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.slots.get_mut(index) {
            None => {
                self.error = Some(ProxyError::SlotOutOfRange {
                    index,
                    len: self.slots.len(),
                })
            }
            Some(Some(_)) => self.error = Some(ProxyError::DuplicateSlot(index)),
            Some(entry) => *entry = Some(function),
        }
        self
    }

    pub fn slots<I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        entries.into_iter().fold(self, |builder, (index, function)| builder.slot(index, function))
    }

    pub fn finish(self) -> Result<ProxyVTable, ProxyError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let slots = self
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(ProxyError::IncompleteVTable(index)))
            .collect::<Result<Box<[usize]>, _>>()?;
        Ok(ProxyVTable {
            slots,
            identities: self.identities.into_boxed_slice(),
        })
    }
}

/// The part of every proxy that thunks rely on. `vtable` must stay the first field.
#[repr(C)]
pub struct ProxyHeader {
    vtable: *const usize,
    real: NonNull<c_void>,
    table: &'static ProxyVTable,
}

impl ProxyHeader {
    /// # Safety
    /// `this` must be a pointer produced by [`ComProxy::into_raw`] that is still alive.
    #[inline]
    pub unsafe fn from_this<'a>(this: *mut c_void) -> &'a ProxyHeader {
        unsafe { &*(this as *const ProxyHeader) }
    }

    /// The wrapped object's COM pointer.
    #[inline]
    pub fn real(&self) -> *mut c_void {
        self.real.as_ptr()
    }

    /// Reads slot `index` of the wrapped object's vtable as function type `F`.
    ///
    /// # Safety
    /// `F` must be the exact function pointer type of that slot.
    #[inline]
    pub unsafe fn original_method<F: Copy>(&self, index: usize) -> F {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
        unsafe {
            let vtable = *(self.real.as_ptr() as *const *const usize);
            let address = *vtable.add(index);
            std::mem::transmute_copy(&address)
        }
    }
}

/// A proxy wrapping one COM object and carrying per-object state `S`.
#[repr(C)]
pub struct ComProxy<S> {
    header: ProxyHeader,
    state: S,
}

impl<S> ComProxy<S> {
    /// Boxes a proxy for `real` and returns it as a COM pointer.
    ///
    /// The reference the caller holds on `real` becomes the proxy's reference:
    /// from here on the proxy pointer is released instead of `real`.
    pub fn into_raw(table: &'static ProxyVTable, real: NonNull<c_void>, state: S) -> *mut c_void {
        let proxy = Box::new(ComProxy {
            header: ProxyHeader {
                vtable: table.slots.as_ptr(),
                real,
                table,
            },
            state,
        });
        Box::into_raw(proxy) as *mut c_void
    }

    /// # Safety
    /// `this` must be a live proxy created with state type `S`.
    #[inline]
    pub unsafe fn from_this<'a>(this: *mut c_void) -> &'a ComProxy<S> {
        unsafe { &*(this as *const ComProxy<S>) }
    }

    pub fn header(&self) -> &ProxyHeader {
        &self.header
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Forwards `QueryInterface`. When the wrapped object answers one of the proxied
/// interfaces with its own pointer, the proxy pointer is handed out instead; the
/// reference the wrapped object added is the shared one, so counts stay in step.
unsafe extern "system" fn query_interface(this: *mut c_void, riid: *const c_void, out: *mut *mut c_void) -> HResult {
    let header = unsafe { ProxyHeader::from_this(this) };
    let original: FnQueryInterface = unsafe { header.original_method(QUERY_INTERFACE) };
    let hr = unsafe { original(header.real(), riid, out) };

    if succeeded(hr) && !riid.is_null() && !out.is_null() {
        let iid = unsafe { *(riid as *const Guid) };
        if unsafe { *out } == header.real() && header.table.answers_for(&iid) {
            unsafe { *out = this };
        }
    }
    hr
}

unsafe extern "system" fn add_ref(this: *mut c_void) -> u32 {
    let header = unsafe { ProxyHeader::from_this(this) };
    let original: FnAddRef = unsafe { header.original_method(ADD_REF) };
    unsafe { original(header.real()) }
}

unsafe extern "system" fn release<S>(this: *mut c_void) -> u32 {
    let count = {
        let header = unsafe { ProxyHeader::from_this(this) };
        let original: FnRelease = unsafe { header.original_method(RELEASE) };
        unsafe { original(header.real()) }
    };
    if count == 0 {
        log::debug!("Wrapped object released; freeing proxy at {:p}.", this);
        drop(unsafe { Box::from_raw(this as *mut ComProxy<S>) });
    }
    count
}

/// Generates forwarding thunks for a list of vtable slots, plus a
/// `forwarded_slots()` function listing `(slot, thunk address)` pairs for
/// [`VTableBuilder::slots`](crate::com::VTableBuilder::slots).
///
/// ```ignore
/// forward_methods! {
///     3 => fn TestCooperativeLevel() -> HResult;
///     11 => fn SetCursorPosition(x: i32, y: i32, flags: u32) -> ();
/// }
/// ```
#[macro_export]
macro_rules! forward_methods {
    ($($index:literal => fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty;)*) => {
        $(
            #[allow(non_snake_case)]
            unsafe extern "system" fn $name(this: *mut ::std::ffi::c_void $(, $arg: $ty)*) -> $ret {
                type Original = unsafe extern "system" fn(*mut ::std::ffi::c_void $(, $ty)*) -> $ret;
                let header = unsafe { $crate::com::ProxyHeader::from_this(this) };
                let original: Original = unsafe { header.original_method($index) };
                unsafe { original(header.real() $(, $arg)*) }
            }
        )*

        pub(crate) fn forwarded_slots() -> ::std::vec::Vec<(usize, usize)> {
            ::std::vec![$(($index, $name as usize)),*]
        }
    };
}
