//! Counting global allocator for checking that steady-state firing does not
//! touch the heap.
//!
//! Counting is off by default.  It is switched on either process-wide
//! (`VOLLEY_ALLOC_PROFILE=1`, read by [`init_from_env`]) or for the calling
//! thread only, via [`count_on_current_thread`].  The per-thread mode keeps
//! test-harness threads out of the numbers.
//!
//! This file installs a `#[global_allocator]`, so it is only compiled into
//! binaries (`main.rs`, `tests/zero_alloc.rs`), never into the library.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct CountingAlloc;

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

static PROCESS_WIDE: AtomicBool = AtomicBool::new(false);

thread_local! {
    static THIS_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Heap traffic since the last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapTraffic {
    /// Fresh allocations (`alloc` and `alloc_zeroed`).
    pub allocs: u64,
    /// Resizes of an existing block.
    pub reallocs: u64,
    pub frees: u64,
    /// Bytes handed out by fresh allocations and growing resizes.
    pub bytes_requested: u64,
}

impl HeapTraffic {
    /// Calls that asked the allocator for memory (fresh or resized).
    pub fn heap_requests(self) -> u64 {
        self.allocs + self.reallocs
    }
}

struct Counters {
    allocs: AtomicU64,
    reallocs: AtomicU64,
    frees: AtomicU64,
    bytes_requested: AtomicU64,
}

static COUNTERS: Counters = Counters {
    allocs: AtomicU64::new(0),
    reallocs: AtomicU64::new(0),
    frees: AtomicU64::new(0),
    bytes_requested: AtomicU64::new(0),
};

impl Counters {
    #[inline]
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [&self.allocs, &self.reallocs, &self.frees, &self.bytes_requested] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    fn read(&self) -> HeapTraffic {
        HeapTraffic {
            allocs: self.allocs.load(Ordering::Relaxed),
            reallocs: self.reallocs.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            bytes_requested: self.bytes_requested.load(Ordering::Relaxed),
        }
    }
}

#[inline]
fn counting() -> bool {
    // `try_with` fails during thread-local teardown; count nothing then.
    PROCESS_WIDE.load(Ordering::Relaxed) || THIS_THREAD.try_with(Cell::get).unwrap_or(false)
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() && counting() {
            Counters::bump(&COUNTERS.allocs, 1);
            Counters::bump(&COUNTERS.bytes_requested, layout.size() as u64);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() && counting() {
            Counters::bump(&COUNTERS.allocs, 1);
            Counters::bump(&COUNTERS.bytes_requested, layout.size() as u64);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let out = unsafe { System.realloc(ptr, layout, new_size) };
        if !out.is_null() && counting() {
            Counters::bump(&COUNTERS.reallocs, 1);
            let grown = new_size.saturating_sub(layout.size());
            Counters::bump(&COUNTERS.bytes_requested, grown as u64);
        }
        out
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if counting() {
            Counters::bump(&COUNTERS.frees, 1);
        }
        unsafe { System.dealloc(ptr, layout) };
    }
}

pub fn init_from_env() {
    let enabled = std::env::var("VOLLEY_ALLOC_PROFILE")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    PROCESS_WIDE.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    PROCESS_WIDE.load(Ordering::Relaxed)
}

/// Read the counters and zero them.
pub fn take_traffic() -> HeapTraffic {
    let traffic = COUNTERS.read();
    COUNTERS.reset();
    traffic
}

/// Run `f` with counting enabled on this thread and return what it allocated.
pub fn count_on_current_thread<R>(f: impl FnOnce() -> R) -> (R, HeapTraffic) {
    COUNTERS.reset();
    THIS_THREAD.with(|on| on.set(true));
    let out = f();
    THIS_THREAD.with(|on| on.set(false));
    (out, take_traffic())
}
