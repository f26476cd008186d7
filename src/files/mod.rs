//! Local file resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → safety.rs (lexical join onto base, reject escapes)
//!     → resolver.rs (cached: file, dir/index.html, or nothing)
//!     → fs.rs (stat capability)
//! ```

pub mod fs;
pub mod resolver;
pub mod safety;

pub use fs::{FileKind, FileSystem, TokioFs};
pub use resolver::{FileResolution, FileResolver};
pub use safety::{local_target, LocalTarget, UnsafePathError};
