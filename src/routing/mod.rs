//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (structural path match, subpath capture)
//!     → split.rs (primary vs. secondary, only for partially-migrated rules)
//!     → Return: RoutingDecision or NotFound
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Sort by priority
//!     → Compile exact + wildcard matchers per feature
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (literal and segment-set matching only)
//! - Deterministic lookup: same path always matches same rule
//! - First match wins (ordered by explicit priority)

pub mod matcher;
pub mod router;
pub mod split;

pub use router::{Origin, PathRewrite, RouteMatch, RouteRule, RouteTable, RouteTableError, RoutingDecision, RoutingError};
pub use split::{Split, SplitDecider};
