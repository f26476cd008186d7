//! Custom scheme subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     privileges.rs (descriptor handed to the shell before windows exist)
//!     → router.rs register_handler (precondition checks)
//!     → registry.rs (one handler per scheme)
//!
//! Per request:
//!     host → registry.rs dispatch → router.rs / file_handler.rs → response
//! ```
//!
//! # Design Decisions
//! - Caches belong to each router instance, never to the process
//! - Configuration errors surface at registration; per-request problems
//!   become responses wherever a response contract exists

pub mod file_handler;
pub mod privileges;
pub mod registry;
pub mod router;
pub mod types;

pub use file_handler::{register_file_handler, FileSchemeHandler};
pub use privileges::{privileged_scheme, CustomScheme, PrivilegeOverrides, SchemePrivileges};
pub use registry::{SchemeHandle, SchemeRegistry};
pub use router::{into_response, register_handler, RouterOptions, SchemeRouter};
pub use types::{HandlerResult, RegisterError, SchemeError, SchemeHandler};
