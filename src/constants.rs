//! Centralized constants for the wire format and tracker defaults.
//!
//! All magic values in the crate are defined here with documented
//! rationale. This enables:
//! - Format compatibility auditing in one place
//! - Consistent limits across modules
//! - Easy tuning without code search

// =============================================================================
// Wire Format
// =============================================================================

/// Separates records in the cookie wire format.
///
/// The format has no escaping, so this character may also legitimately
/// appear inside campaign names; the decoder reconstructs such names
/// heuristically. Changing this value breaks every previously issued
/// cookie.
pub const RECORD_SEPARATOR: char = '/';

/// Separates fields (name, type, timestamp) within a record.
///
/// Same caveat as [`RECORD_SEPARATOR`]: unescaped and compatibility-bound.
pub const FIELD_SEPARATOR: char = '|';

/// Separates type from name in a `campaign` query parameter value
/// (`campaign=visit_spring-sale`), and source from medium in a derived
/// UTM type (`newsletter_email`).
pub const DESCRIPTOR_SEPARATOR: char = '_';

// =============================================================================
// Query Parameters
// =============================================================================

/// Combined `type_name` campaign parameter.
pub const PARAM_CAMPAIGN: &str = "campaign";

/// UTM campaign name parameter.
pub const PARAM_UTM_CAMPAIGN: &str = "utm_campaign";

/// UTM source parameter, used as the touch type.
pub const PARAM_UTM_SOURCE: &str = "utm_source";

/// UTM medium parameter, concatenated onto the source when present.
pub const PARAM_UTM_MEDIUM: &str = "utm_medium";

// =============================================================================
// Tracker Defaults
// =============================================================================

/// Default cookie name for the touch store.
pub const DEFAULT_COOKIE_NAME: &str = "campaigns";

/// Default attribution window (30 days, in milliseconds).
pub const DEFAULT_TTL_MS: i64 = 30 * 86_400_000;

/// Cookie path attribute on write.
pub const COOKIE_PATH: &str = "/";

// =============================================================================
// Limits
// =============================================================================

/// Maximum accepted length of an incoming cookie value (RFC 6265 minimum
/// supported cookie size). Longer values are treated as absent rather
/// than parsed.
pub const MAX_COOKIE_VALUE_LEN: usize = 4096;

/// Buffered capacity of the touch event broadcast channel. Slow
/// subscribers lag and drop events rather than blocking the response
/// path.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
