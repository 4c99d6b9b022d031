//! Pool-integrated string formatting: write once, grow only if it didn't
//! fit.
//!
//! Mirrors alloc.c's `pvsprintf`/`psprintf_write`: format directly into
//! whatever room is left in the pool's active block; if the result didn't
//! fit, allocate a block sized exactly to the real length and format a
//! second time into that. Two passes, at most one allocation.

use std::fmt;

use crate::block;
use crate::config::round_to_clicks;
use crate::pool::Pool;

/// A `fmt::Write` sink over a fixed-size buffer that never panics or
/// errors on overflow — it just stops copying past the end, while still
/// tallying how many bytes *would* have been written.
struct BoundedWriter<'a> {
    dest: &'a mut [u8],
    copied: usize,
    needed: usize,
}

impl<'a> BoundedWriter<'a> {
    fn new(dest: &'a mut [u8]) -> Self {
        BoundedWriter {
            dest,
            copied: 0,
            needed: 0,
        }
    }

    fn overflowed(&self) -> bool {
        self.needed > self.dest.len()
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        self.needed += bytes.len();
        if self.copied < self.dest.len() {
            let remaining = self.dest.len() - self.copied;
            let to_copy = bytes.len().min(remaining);
            self.dest[self.copied..self.copied + to_copy].copy_from_slice(&bytes[..to_copy]);
            self.copied += to_copy;
        }
        Ok(())
    }
}

impl Pool {
    /// Renders `args` into pool-owned memory and returns a pool-lifetime
    /// view of the result. Prefer the [`crate::pformat`] macro at call
    /// sites, which builds `args` from a `format!`-style template.
    ///
    /// The returned `&str` borrows only `&self`; it becomes invalid the
    /// moment this pool is [cleared](Pool::clear) or
    /// [destroyed](Pool::destroy), same as [`Pool::alloc`] and friends —
    /// see that method's documentation for the full contract.
    ///
    /// Mirrors alloc.c's `psprintf`.
    pub fn format(&self, args: fmt::Arguments<'_>) -> &str {
        use fmt::Write as _;

        let inner_config = self.config().clone();
        let mut blocks = self.inner_blocks().borrow_mut();

        if blocks.is_empty() {
            blocks.push(block::store::acquire(inner_config.min_alloc(), &inner_config));
        }
        let active = blocks.last().expect("a block was just ensured to exist");
        let avail = active.avail();
        // SAFETY: [avail_ptr, avail_ptr + avail) is this block's unused
        // region, exclusively owned until `bump` is called below.
        let scratch = unsafe { std::slice::from_raw_parts_mut(active.avail_ptr().as_ptr(), avail) };

        let mut writer = BoundedWriter::new(scratch);
        let _ = write!(writer, "{args}");

        if !writer.overflowed() {
            let written = writer.needed;
            let active = blocks.last().expect("block still present");
            let claimed = active.bump(round_to_clicks(written + 1));
            // SAFETY: `claimed` is the same region `scratch` pointed at;
            // the NUL terminator byte lives one past `written`.
            unsafe {
                *claimed.as_ptr().add(written) = 0;
                let bytes = std::slice::from_raw_parts(claimed.as_ptr(), written);
                std::str::from_utf8_unchecked(bytes)
            }
        } else {
            let needed = writer.needed;
            drop(blocks);
            let buf = self.alloc(needed as isize + 1).expect("needed + 1 > 0");
            let mut second_pass = BoundedWriter::new(&mut buf[..needed]);
            let _ = write!(second_pass, "{args}");
            debug_assert!(!second_pass.overflowed(), "args must format identically twice");
            buf[needed] = 0;
            // SAFETY: formatted output is always valid UTF-8.
            unsafe { std::str::from_utf8_unchecked(&buf[..needed]) }
        }
    }
}

/// Formats a string directly into `$pool`, `format!`-style.
///
/// ```
/// use arenapool::pool::Pool;
/// use arenapool::config::AllocatorConfig;
/// use arenapool::pformat;
///
/// let pool = Pool::new(AllocatorConfig::default());
/// let s = pformat!(pool, "{}-{}", "id", 42);
/// assert_eq!(s, "id-42");
/// ```
#[macro_export]
macro_rules! pformat {
    ($pool:expr, $($arg:tt)*) => {
        $pool.format(format_args!($($arg)*))
    };
}
