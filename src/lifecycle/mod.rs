//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Register scheme → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or fatal router error → Stop accepting → Drain → Exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
