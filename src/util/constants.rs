//! Centralized constants for source clients
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// HTTP Timeouts
// ═══════════════════════════════════════════════════════════════

/// Default timeout for a single fetch (file content, API call, query)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// HTTP Client Limits
// ═══════════════════════════════════════════════════════════════

/// Maximum number of HTTP redirects to follow
pub const REDIRECT_LIMIT: usize = 5;

/// User agent sent by every source client
pub const USER_AGENT: &str = concat!("factgraph/", env!("CARGO_PKG_VERSION"));
