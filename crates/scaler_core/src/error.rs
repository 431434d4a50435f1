use thiserror::Error;

/// Raw COM status code. Kept as a plain `i32` so that every code the wrapped
/// object returns, success codes included, travels back to the caller untouched.
pub type HResult = i32;

pub const S_OK: HResult = 0;
pub const E_FAIL: HResult = 0x8000_4005_u32 as i32;

/// Mirrors the `SUCCEEDED()` macro: any non-negative code is a success.
#[inline]
pub const fn succeeded(hr: HResult) -> bool {
    hr >= 0
}

/// Errors raised by the scaling calculator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScalingError {
    #[error("invalid back buffer geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
}

/// Errors raised by the interception layer itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The real library or one of its entry points could not be bound.
    #[error("initialization failed: {0}")]
    InitializationFailure(String),

    /// The wrapped object reported failure on a forwarded call.
    #[error("wrapped object returned HRESULT {0:#010x}")]
    PassthroughFailure(HResult),

    /// A proxy vtable was assembled with a slot left empty.
    #[error("vtable slot {0} has no handler")]
    IncompleteVTable(usize),

    #[error("vtable slot {0} was assigned twice")]
    DuplicateSlot(usize),

    #[error("vtable slot {index} is outside a {len}-slot table")]
    SlotOutOfRange { index: usize, len: usize },
}

impl ProxyError {
    /// Turns a forwarded status code into a `Result`, keeping the original code on failure.
    pub fn check(hr: HResult) -> Result<HResult, ProxyError> {
        if succeeded(hr) {
            Ok(hr)
        } else {
            Err(ProxyError::PassthroughFailure(hr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_keeps_success_codes() {
        // S_PRESENT_OCCLUDED is a positive success code and must not be flattened to S_OK.
        let occluded = 0x0876_0868;
        assert_eq!(ProxyError::check(occluded), Ok(occluded));
        assert_eq!(ProxyError::check(S_OK), Ok(S_OK));
    }

    #[test]
    fn test_check_keeps_failure_code_verbatim() {
        let device_lost = 0x8876_0868_u32 as i32;
        let err = ProxyError::check(device_lost).unwrap_err();
        assert_eq!(err, ProxyError::PassthroughFailure(device_lost));
        assert_eq!(err.to_string(), "wrapped object returned HRESULT 0x88760868");
    }

    #[test]
    fn test_initialization_failure_names_cause() {
        let err = ProxyError::InitializationFailure("d3d9.dll not found".into());
        assert!(err.to_string().contains("d3d9.dll not found"));
    }
}
