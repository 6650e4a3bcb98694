// =============================================================================
// Lint Configuration
// =============================================================================

// Safety: no unsafe anywhere in this crate
#![deny(unsafe_code)]
// Correctness: must handle all fallible operations
#![deny(unused_must_use)]
// Quality: pedantic but pragmatic
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
// Allowed with documented reasons
#![allow(clippy::missing_errors_doc)] // Error returns self-documenting via type
#![allow(clippy::module_name_repetitions)] // e.g., config::TrackerConfig is clearer
#![allow(clippy::must_use_candidate)] // Not all returned values need annotation

//! touchpoint - HTTP-request-scoped campaign attribution tracking.
//!
//! On each response, the tracker inspects query parameters for a campaign
//! or UTM descriptor, records a `(name, type, timestamp)` touch into a
//! client-held cookie, deduplicates repeat touches by `(name, type)`, and
//! expires touches older than the configured attribution window. There is
//! no server-side state: the cookie is the store.
//!
//! # Modules
//!
//! - [`wire`] - the cookie wire-format codec (unescaped `|`/`/` text,
//!   optional base64 transport, heuristic delimiter-collision recovery)
//! - [`touch`] - touch records and the pure query/upsert store operations
//! - [`resolver`] - descriptor resolution from query parameters
//! - [`notify`] - fire-and-forget touch events over a broadcast channel
//! - [`middleware`] - the axum middleware and explicit accessor surface
//! - [`config`] - immutable tracker configuration
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use axum::{Router, middleware, routing::get};
//! use touchpoint::{Tracker, TrackerConfig, track_touches};
//!
//! let tracker = Arc::new(Tracker::new(TrackerConfig::default())?);
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(tracker.clone(), track_touches));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod resolver;
pub mod touch;
pub mod wire;

pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use middleware::{RecordedTouch, Tracker, cookie_value, track_touches};
pub use notify::{TouchEvent, TouchNotifier};
pub use resolver::{Descriptor, resolve_params, resolve_query};
pub use touch::{TouchRecord, load, persist, query, upsert};
pub use wire::{Transport, decode, encode};
