use log::error;

/// Reports an unrecoverable error and aborts the current thread of emulation.
///
/// Used for conditions that mean emulated memory would be corrupted if execution continued, e.g. a
/// stack overflow or an out of bounds dereference.
#[cold]
#[inline(never)]
#[track_caller]
pub fn fatal(args: std::fmt::Arguments<'_>) -> ! {
    error!(target: "psxvm", "fatal: {args}");
    panic!("{args}")
}
