//! # arenapool
//!
//! A hierarchical arena allocator with scoped cleanup, ported from Apache
//! httpd's original pool allocator (`alloc.c`): pools bump-allocate from
//! fixed-alignment blocks, form a parent/child tree, and tear down in one
//! shot — freeing every block they own and running every cleanup they
//! registered, in registration order — when cleared or destroyed.
//!
//! ## Overview
//!
//! A [`Pool`](pool::Pool) never frees individual allocations. Instead you
//! build a tree of pools shaped like your program's own scopes (one pool
//! per request, one per connection, one per long-lived subsystem) and
//! clear or destroy the whole subtree at once. Resource wrappers in
//! [`resource`] — descriptors, buffered streams, directories, sockets,
//! compiled regexes — register themselves as pool cleanups so they're
//! closed automatically along with everything else, without needing
//! `Drop` to fire at the right lexical moment.
//!
//! Blocks released by a pool don't go back to the system allocator; they
//! go to one process-wide free list (see [`block`]) that any other pool
//! can pull from. Exactly one mutex guards that free list — pools
//! themselves are single-threaded (`Pool` is `!Send`/`!Sync`).
//!
//! ## Quick start
//!
//! ```rust
//! use arenapool::config::AllocatorConfig;
//! use arenapool::pool::Pool;
//!
//! let root = Pool::new(AllocatorConfig::default());
//! let request = root.make_sub_pool();
//!
//! let greeting = request.strdup("hello");
//! assert_eq!(greeting, "hello");
//!
//! request.register_cleanup(|| println!("request finished"), None);
//! request.destroy(); // runs the cleanup, frees the request pool's blocks
//! ```
//!
//! ## Modules
//!
//! - [`pool`] — pool lifecycle, bump allocation, the cleanup registry.
//! - [`block`] — the raw blocks pools are built from and their shared
//!   free list.
//! - [`array`] — a growable, pool-backed vector for `Copy` element types.
//! - [`table`] — a case-insensitive, order-preserving string multimap.
//! - [`format`] — `psprintf`-style formatting directly into pool memory.
//! - [`resource`] — pool-scoped OS resources (files, directories,
//!   sockets, compiled regexes).
//! - [`subprocess`] — spawning and reaping child processes tied to a
//!   pool's lifetime.
//! - [`interrupt`] — the reentrant scope pool surgery runs inside.
//! - [`error`] / [`fatal`] — the recoverable/unrecoverable error split.
//! - [`config`] — allocator-wide tunables.

#![warn(missing_docs, rust_2018_idioms)]

pub mod array;
pub mod block;
pub mod config;
pub mod error;
pub mod fatal;
pub mod format;
pub mod interrupt;
pub mod pool;
pub mod resource;
pub mod subprocess;
pub mod table;

pub use array::Array;
pub use config::AllocatorConfig;
pub use error::{Error, Result};
pub use pool::Pool;
pub use table::Table;

/// Convenient re-exports for common use.
pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::array::Array;
    pub use crate::config::AllocatorConfig;
    pub use crate::error::{Error, Result};
    pub use crate::pformat;
    pub use crate::pool::{CleanupHandle, Pool};
    pub use crate::table::Table;
}
