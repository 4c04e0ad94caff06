//! Per-platform discovery of the current thread's stack bounds.
//!
//! The collector only needs the live portion of the stack: everything
//! between the caller's frame and the stack's high end (stacks grow
//! downward on all supported targets). Each adapter queries the
//! platform for the full extent and clips at the supplied frame
//! address. Unsupported platforms report `None` and embedders supply
//! their own ranges.

use super::AddressRange;

/// An address inside the caller's stack frame, usable as the low bound
/// for a stack scan.
#[inline(never)]
pub fn approximate_frame() -> *const () {
    let probe = 0usize;
    std::hint::black_box(&probe as *const usize as *const ())
}

/// Best-effort bounds of the current thread's live stack, from `frame`
/// up to the platform-reported stack top.
#[cfg(target_os = "linux")]
pub fn current_stack(frame: *const ()) -> Option<AddressRange> {
    // SAFETY: standard pthread attribute queries on the current thread;
    // the attr struct is initialized by pthread_getattr_np and released
    // before returning.
    unsafe {
        let mut attr: libc::pthread_attr_t = std::mem::zeroed();
        if libc::pthread_getattr_np(libc::pthread_self(), &mut attr) != 0 {
            return None;
        }
        let mut stack_addr: *mut libc::c_void = std::ptr::null_mut();
        let mut stack_size: libc::size_t = 0;
        let rc = libc::pthread_attr_getstack(&attr, &mut stack_addr, &mut stack_size);
        libc::pthread_attr_destroy(&mut attr);
        if rc != 0 {
            return None;
        }
        let top = stack_addr as usize + stack_size;
        Some(AddressRange::new(frame as usize, top))
    }
}

/// Best-effort bounds of the current thread's live stack, from `frame`
/// up to the platform-reported stack top.
#[cfg(target_os = "macos")]
pub fn current_stack(frame: *const ()) -> Option<AddressRange> {
    // SAFETY: both calls are infallible queries on the current thread.
    unsafe {
        let thread = libc::pthread_self();
        let top = libc::pthread_get_stackaddr_np(thread) as usize;
        if top == 0 {
            return None;
        }
        Some(AddressRange::new(frame as usize, top))
    }
}

/// Best-effort bounds of the current thread's live stack, from `frame`
/// up to the platform-reported stack top.
#[cfg(windows)]
pub fn current_stack(frame: *const ()) -> Option<AddressRange> {
    use windows_sys::Win32::System::Threading::GetCurrentThreadStackLimits;

    let mut low: usize = 0;
    let mut high: usize = 0;
    // SAFETY: out-pointers to two locals, as the API requires.
    unsafe { GetCurrentThreadStackLimits(&mut low, &mut high) };
    if high == 0 {
        return None;
    }
    Some(AddressRange::new(frame as usize, high))
}

/// Stack discovery is unavailable on this platform; supply ranges
/// explicitly.
#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
pub fn current_stack(_frame: *const ()) -> Option<AddressRange> {
    None
}
