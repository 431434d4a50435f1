use std::sync::OnceLock;

use crate::geometry::Resolution;

/// The display's resolution as seen at the first device creation.
///
/// Write-once: after the first successful capture the value never changes for the
/// lifetime of the process, and there is no teardown. The set is an atomic
/// check-and-set, so concurrent first callers never observe a half-written value.
pub struct NativeResolution {
    cell: OnceLock<Resolution>,
}

/// The process-wide instance used by the factory proxy.
pub static NATIVE_RESOLUTION: NativeResolution = NativeResolution::new();

impl NativeResolution {
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    pub fn get(&self) -> Option<Resolution> {
        self.cell.get().copied()
    }

    /// Runs `query` unless a resolution was already captured, and stores its
    /// answer. A failed or zero-sized answer stores nothing, so a later call
    /// gets another chance.
    pub fn capture_with<F>(&self, query: F) -> Option<Resolution>
    where
        F: FnOnce() -> Option<Resolution>,
    {
        if let Some(existing) = self.get() {
            return Some(existing);
        }

        match query() {
            Some(resolution) if !resolution.is_zero() => {
                if self.cell.set(resolution).is_ok() {
                    log::info!("Native display resolution captured: {}", resolution);
                }
            }
            Some(resolution) => log::warn!("Display mode query returned {}, ignoring.", resolution),
            None => log::warn!("Display mode query failed; native resolution still unknown."),
        }
        self.get()
    }
}

impl Default for NativeResolution {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_first_capture_wins() {
        let native = NativeResolution::new();
        assert_eq!(native.get(), None);

        let first = native.capture_with(|| Some(Resolution::new(3840, 2160)));
        assert_eq!(first, Some(Resolution::new(3840, 2160)));

        let second = native.capture_with(|| Some(Resolution::new(1280, 720)));
        assert_eq!(second, Some(Resolution::new(3840, 2160)));
    }

    #[test]
    fn test_query_skipped_once_captured() {
        let native = NativeResolution::new();
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            native.capture_with(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(Resolution::new(1920, 1080))
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_query_allows_retry() {
        let native = NativeResolution::new();
        assert_eq!(native.capture_with(|| None), None);
        assert_eq!(native.capture_with(|| Some(Resolution::new(0, 0))), None);
        assert_eq!(
            native.capture_with(|| Some(Resolution::new(2560, 1440))),
            Some(Resolution::new(2560, 1440))
        );
    }

    #[test]
    fn test_concurrent_capture_agrees_on_one_value() {
        let native = Arc::new(NativeResolution::new());
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let native = Arc::clone(&native);
                std::thread::spawn(move || native.capture_with(|| Some(Resolution::new(1000 + i, 1000 + i))))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = native.get().unwrap();
        assert_eq!(stored.width, stored.height);
        assert!(results.iter().all(|r| *r == Some(stored)));
    }
}
