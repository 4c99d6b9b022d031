//! Resource wrappers: OS handles whose lifetime is tied to a [`Pool`],
//! not to ordinary Rust scoping.
//!
//! Every wrapper in this module registers exactly one `(on_destroy,
//! on_exec)` cleanup pair with its owning pool at construction time (see
//! `crate::pool::cleanup`), per the fixed table alloc.c's resource
//! constructors use:
//!
//! | Resource   | on_destroy         | on_exec                        |
//! |------------|--------------------|---------------------------------|
//! | descriptor | close the fd       | close the fd (don't leak to exec) |
//! | stream     | fclose / drop      | close the underlying fd          |
//! | directory  | closedir           | none (dir handles aren't fd-like)|
//! | socket     | close the socket   | close the socket                 |
//! | regex      | drop (no syscall)  | none                             |
//!
//! None of these types implement [`Drop`] to close themselves early: a
//! pool-attached resource outlives ordinary Rust scoping by design and is
//! only released when its pool is cleared/destroyed, or when the caller
//! explicitly closes it (which kills the cleanup so it doesn't run
//! twice).

pub mod descriptor;
pub mod directory;
pub mod regex;
pub mod socket;
pub mod stream;

pub use descriptor::PoolDescriptor;
pub use directory::PoolDirectory;
pub use regex::PoolRegex;
pub use socket::PoolSocket;
pub use stream::PoolStream;
