//! Stack growth for recursive tree walks.
//!
//! Conditional chains built from long `if/elif` sequences nest through
//! their false branches, so evaluation, optimization and init/deinit
//! recurse once per clause. Every recursive entry point goes through
//! [`ensure_sufficient_stack`].

/// Run `f`, growing the native stack first if less than the red zone is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    // Grow when under 64KB remain, by 1MB at a time.
    const RED_ZONE: usize = 64 * 1024;
    const GROWTH: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, GROWTH, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
