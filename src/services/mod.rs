//! GitHub API service implementations.
//!
//! Each service borrows the client, builds requests against paths
//! relative to the base URL and decodes the JSON result.

mod actions;
mod code_scanning;
mod copilot;
mod organizations;
mod rate_limit;
mod repositories;
mod scim;
mod teams;

pub use actions::*;
pub use code_scanning::*;
pub use copilot::*;
pub use organizations::*;
pub use rate_limit::*;
pub use repositories::*;
pub use scim::*;
pub use teams::*;
