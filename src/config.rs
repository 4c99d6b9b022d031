//! Allocator-wide tunables.
//!
//! `CLICK_SZ` (the alignment unit) is a compile-time constant — it's a
//! property of the target platform, not something a caller should be able
//! to mistune — but the block-reuse slack, minimum block size, subprocess
//! grace period, and debug toggles are runtime configuration, built with
//! the same builder pattern the teacher crate uses for `PoolConfig`.

/// The alignment unit ("click"): the strictest natural alignment needed by
/// any scalar, function pointer, or I/O handle on this platform.
pub const CLICK_SZ: usize = std::mem::align_of::<MaxAlign>();

/// A type whose alignment is the platform's strictest "interesting"
/// alignment, mirroring the C original's `union align` of `char *`,
/// function pointer, `long`, `FILE *`, and `double`.
#[repr(C)]
pub(crate) union MaxAlign {
    _ptr: *const (),
    _fn: usize,
    _long: i64,
    _double: f64,
}

/// Rounds `size` up to a whole number of clicks.
#[inline]
pub(crate) const fn round_to_clicks(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    let clicks = 1 + ((size - 1) / CLICK_SZ);
    clicks * CLICK_SZ
}

/// Runtime-tunable allocator configuration.
///
/// Use [`AllocatorConfig::builder`] to construct one with validation, or
/// [`AllocatorConfig::default`] for the historical Apache httpd constants
/// this system was distilled from.
///
/// # Examples
///
/// ```
/// use arenapool::config::AllocatorConfig;
///
/// let config = AllocatorConfig::builder()
///     .min_alloc(4096)
///     .subprocess_grace_period_secs(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_alloc(), 4096);
/// ```
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    min_free: usize,
    min_alloc: usize,
    subprocess_grace_period_secs: u64,
    sentinel_fill: bool,
    malloc_per_allocation: bool,
    track_pool_ownership: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_free: 8192,
            min_alloc: 8192,
            subprocess_grace_period_secs: 3,
            sentinel_fill: cfg!(debug_assertions),
            malloc_per_allocation: false,
            track_pool_ownership: cfg!(debug_assertions),
        }
    }
}

impl AllocatorConfig {
    /// Creates a new builder for constructing an allocator configuration.
    pub fn builder() -> AllocatorConfigBuilder {
        AllocatorConfigBuilder::default()
    }

    /// Block-reuse slack: a free-list block is only handed back out if its
    /// free capacity is at least `requested + min_free`.
    #[inline]
    pub fn min_free(&self) -> usize {
        self.min_free
    }

    /// Minimum size of a freshly acquired block from the system.
    #[inline]
    pub fn min_alloc(&self) -> usize {
        self.min_alloc
    }

    /// How long `free_proc_chain` sleeps, once, for the whole reap batch.
    #[inline]
    pub fn subprocess_grace_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.subprocess_grace_period_secs)
    }

    /// Whether released blocks should be fill-stamped with the sentinel
    /// byte for use-after-free detection.
    #[inline]
    pub fn sentinel_fill(&self) -> bool {
        self.sentinel_fill
    }

    /// Whether every allocation should bypass the bump allocator and go
    /// straight to the system allocator, for use with external memory
    /// checkers.
    #[inline]
    pub fn malloc_per_allocation(&self) -> bool {
        self.malloc_per_allocation
    }

    /// Whether table ancestry assertions (the debug-mode `*n` argument
    /// checks) are enforced.
    #[inline]
    pub fn track_pool_ownership(&self) -> bool {
        self.track_pool_ownership
    }
}

/// Builder for [`AllocatorConfig`].
#[derive(Debug, Default)]
pub struct AllocatorConfigBuilder {
    min_free: Option<usize>,
    min_alloc: Option<usize>,
    subprocess_grace_period_secs: Option<u64>,
    sentinel_fill: Option<bool>,
    malloc_per_allocation: Option<bool>,
    track_pool_ownership: Option<bool>,
}

impl AllocatorConfigBuilder {
    /// Sets the block-reuse slack.
    pub fn min_free(mut self, value: usize) -> Self {
        self.min_free = Some(value);
        self
    }

    /// Sets the minimum freshly-acquired block size.
    pub fn min_alloc(mut self, value: usize) -> Self {
        self.min_alloc = Some(value);
        self
    }

    /// Sets the subprocess reap grace period, in seconds.
    pub fn subprocess_grace_period_secs(mut self, value: u64) -> Self {
        self.subprocess_grace_period_secs = Some(value);
        self
    }

    /// Enables or disables sentinel fill-stamping of released blocks.
    pub fn sentinel_fill(mut self, value: bool) -> Self {
        self.sentinel_fill = Some(value);
        self
    }

    /// Enables or disables malloc-per-allocation debug mode.
    pub fn malloc_per_allocation(mut self, value: bool) -> Self {
        self.malloc_per_allocation = Some(value);
        self
    }

    /// Enables or disables pool-ownership ancestry tracking.
    pub fn track_pool_ownership(mut self, value: bool) -> Self {
        self.track_pool_ownership = Some(value);
        self
    }

    /// Builds the configuration, falling back to [`AllocatorConfig::default`]
    /// values for anything not set.
    pub fn build(self) -> crate::error::Result<AllocatorConfig> {
        let defaults = AllocatorConfig::default();
        Ok(AllocatorConfig {
            min_free: self.min_free.unwrap_or(defaults.min_free),
            min_alloc: self.min_alloc.unwrap_or(defaults.min_alloc),
            subprocess_grace_period_secs: self
                .subprocess_grace_period_secs
                .unwrap_or(defaults.subprocess_grace_period_secs),
            sentinel_fill: self.sentinel_fill.unwrap_or(defaults.sentinel_fill),
            malloc_per_allocation: self
                .malloc_per_allocation
                .unwrap_or(defaults.malloc_per_allocation),
            track_pool_ownership: self
                .track_pool_ownership
                .unwrap_or(defaults.track_pool_ownership),
        })
    }
}
