//! Shared infrastructure utilities for Quill.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename), used by
//!   the settings store and the text-file document host.

pub mod atomic_write;

pub use atomic_write::{AtomicWriteOptions, PersistMode, atomic_write, atomic_write_with_options};
