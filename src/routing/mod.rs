//! Proxy routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request path (percent-decoded)
//!     → router.rs (cached decision lookup)
//!     → matcher.rs (longest matching prefix)
//!     → rule.rs (Ignore → Local, Redirect → final URL)
//!     → Return: Forward { url } or Local
//!
//! Table construction (at registration):
//!     route proxy config / code
//!     → normalized into ProxyRule
//!     → frozen as an ordered ProxyTable
//! ```

pub mod matcher;
pub mod router;
pub mod rule;

pub use router::{ProxyDecision, ProxyRouter, Resolved};
pub use rule::{ConvertPath, ProxyRule, ProxyTable};
