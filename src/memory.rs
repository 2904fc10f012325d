//! Allocation accounting
//!
//! With the `memory_tracking` feature a counting global allocator wraps the
//! system allocator (or mimalloc with the `mimalloc` feature). Without it the
//! counters read zero.

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    fn record(size: usize) {
        let current = ALLOCATED.fetch_add(size, Ordering::Relaxed) + size;
        PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
    }

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                record(layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }

        unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
            let new_ptr = UNDERLYING.realloc(ptr, layout, new_size);
            if !new_ptr.is_null() {
                ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
                record(new_size);
            }
            new_ptr
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bytes currently allocated
#[cfg(feature = "memory_tracking")]
pub fn allocated() -> usize {
    tracking::ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Highest value of [`allocated`] since start or the last [`reset_peak`]
#[cfg(feature = "memory_tracking")]
pub fn peak() -> usize {
    tracking::PEAK_ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
}

/// Reset the peak to the current allocation; returns `(current, old_peak)`.
#[cfg(feature = "memory_tracking")]
pub fn reset_peak() -> (usize, usize) {
    use std::sync::atomic::Ordering;
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
pub fn allocated() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
pub fn peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
pub fn reset_peak() -> (usize, usize) {
    (0, 0)
}
