//! HTTP integration: the tracker and its axum middleware.
//!
//! [`Tracker`] owns the immutable configuration and the event notifier.
//! Its accessor methods are explicit over the current cookie value and
//! time, so the core stays request-agnostic; [`track_touches`] binds them
//! to the axum request/response cycle:
//!
//! ```ignore
//! let tracker = Arc::new(Tracker::new(TrackerConfig::default())?);
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(tracker.clone(), track_touches));
//! ```
//!
//! Nothing on this path is allowed to fail the response: malformed
//! cookies decode to an empty store, and a touch whose encoded value
//! cannot form a valid header is logged and skipped.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::constants::{COOKIE_PATH, MAX_COOKIE_VALUE_LEN};
use crate::error::Result;
use crate::notify::{TouchEvent, TouchNotifier};
use crate::resolver::{self, Descriptor};
use crate::touch::{self, TouchRecord};

/// Outcome of recording a touch: the re-encoded cookie value and the
/// updated store.
#[derive(Debug, Clone)]
pub struct RecordedTouch {
    /// Encoded cookie value to write back to the client.
    pub cookie_value: String,
    /// The full touch list after the merge, in first-seen order.
    pub touches: Vec<TouchRecord>,
    /// The touch that was inserted or refreshed.
    pub accepted: TouchRecord,
}

/// Request-scoped attribution tracker.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    notifier: TouchNotifier,
}

impl Tracker {
    /// Create a tracker from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            notifier: TouchNotifier::default(),
        })
    }

    /// The tracker's configuration.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Subscribe to touch events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<TouchEvent> {
        self.notifier.subscribe()
    }

    /// Read the still-valid touches out of a raw cookie value.
    #[must_use]
    pub fn read_touches(&self, raw: Option<&str>, now: i64) -> Vec<TouchRecord> {
        raw.map(|value| touch::load(value, now, self.config.ttl_ms))
            .unwrap_or_default()
    }

    /// Merge a descriptor into the store held in `raw` and re-encode it.
    ///
    /// Expired touches are dropped before the merge, so refreshing a key
    /// only ever happens among still-valid touches. Pure with respect to
    /// HTTP: the caller decides what to do with the returned cookie
    /// value.
    #[must_use]
    pub fn record_touch(
        &self,
        raw: Option<&str>,
        descriptor: &Descriptor,
        now: i64,
    ) -> RecordedTouch {
        let live = self.read_touches(raw, now);
        let touches = touch::upsert(live, descriptor, now);
        let accepted = touches
            .iter()
            .find(|r| r.matches(descriptor))
            .cloned()
            .unwrap_or_else(|| {
                TouchRecord::new(descriptor.name.clone(), descriptor.kind.clone(), now)
            });

        RecordedTouch {
            cookie_value: touch::persist(&touches, self.config.transport),
            touches,
            accepted,
        }
    }

    /// Format the `Set-Cookie` header value for an encoded store.
    fn set_cookie(&self, cookie_value: &str) -> String {
        format!(
            "{}={}; Max-Age={}; Path={}",
            self.config.cookie_name,
            cookie_value,
            self.config.ttl_secs(),
            COOKIE_PATH
        )
    }
}

/// Axum middleware recording campaign touches on the response path.
///
/// Resolves a descriptor from the request query; when one is present,
/// merges it into the cookie-held store, appends the `Set-Cookie` header
/// to the response, and notifies subscribers. Requests without a campaign
/// signal pass through untouched.
pub async fn track_touches(
    State(tracker): State<Arc<Tracker>>,
    request: Request,
    next: Next,
) -> Response {
    let descriptor = request.uri().query().and_then(resolver::resolve_query);
    let path = request.uri().path().to_string();
    let raw = cookie_value(request.headers(), &tracker.config.cookie_name);

    let mut response = next.run(request).await;

    if let Some(descriptor) = descriptor {
        let now = Utc::now().timestamp_millis();
        let recorded = tracker.record_touch(raw.as_deref(), &descriptor, now);

        match HeaderValue::from_str(&tracker.set_cookie(&recorded.cookie_value)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(_) => {
                // Plain transport with hostile campaign text can produce a
                // value that is not a legal header; drop the write, never
                // the response.
                warn!(name = %descriptor.name, "touch cookie not header-safe, skipping write");
                return response;
            }
        }

        debug!(name = %recorded.accepted.name, kind = %recorded.accepted.kind, %path, "recorded touch");
        tracker.notifier.notify(TouchEvent {
            path,
            touches: recorded.touches,
            accepted: recorded.accepted,
        });
    }

    response
}

/// Extract a named cookie's value from request headers.
///
/// Tolerant by design: unreadable headers and oversized values are
/// treated as no cookie rather than an error.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(text) = header_value.to_str() else {
            continue;
        };
        for pair in text.split(';') {
            let Some((key, value)) = pair.trim_start().split_once('=') else {
                continue;
            };
            if key == name {
                if value.len() > MAX_COOKIE_VALUE_LEN {
                    warn!(len = value.len(), "cookie value over size cap, ignoring");
                    return None;
                }
                return Some(value.to_string());
            }
        }
    }
    None
}
