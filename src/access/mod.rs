//! Request admission by client IP.
//!
//! ```text
//! request → real_ip (trusted headers, else peer) → allowlist
//!     private network        → allow
//!     ALLOWED_HOME_IP match  → allow
//!     anything else          → 403 + warn log
//! ```

pub mod allowlist;
pub mod network;
pub mod real_ip;

pub use allowlist::{AdmissionFilter, AllowReason, AllowedNetwork, Decision, DenyReason};
pub use network::{is_private_network, PRIVATE_NETWORKS};
pub use real_ip::RealIpResolver;
