//! Data models for the redirect service
//!
//! This module defines the persisted records and the request/response
//! payloads exchanged over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link as stored in the database
///
/// The record is created once by the shorten endpoint and afterwards only
/// ever grows: every successful redirect appends one [`VisitRecord`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShortLink {
    /// Public identifier, also the table key (e.g., "aZ3k9QxP")
    pub short_id: String,

    /// The long URL a visitor is redirected to
    pub redirect_url: String,

    /// Visits in the order they were recorded
    #[serde(default)]
    pub visit_history: Vec<VisitRecord>,
}

impl ShortLink {
    /// Creates a link that has never been visited
    pub fn new(short_id: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            short_id: short_id.into(),
            redirect_url: redirect_url.into(),
            visit_history: Vec::new(),
        }
    }
}

/// A single resolution of a short link
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VisitRecord {
    /// Moment the short link was resolved
    pub timestamp: DateTime<Utc>,
}

impl VisitRecord {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

/// Request payload for shortening a URL
///
/// # Example
/// ```json
/// { "url": "https://example.com/very/long/path" }
/// ```
///
/// `url` is optional at the serde level so that a missing field is reported
/// the same way as an empty one.
#[derive(Deserialize, Debug, Default)]
pub struct CreateRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Response returned after a short link is created
///
/// # Example
/// ```json
/// {
///   "id": "aZ3k9QxP",
///   "short_url": "http://localhost:8001/aZ3k9QxP"
/// }
/// ```
#[derive(Serialize, Debug)]
pub struct CreateResponse {
    pub id: String,
    pub short_url: String,
}

/// Raw visit log of a short link
#[derive(Serialize, Debug)]
pub struct VisitLogResponse {
    pub id: String,
    pub total_clicks: usize,
    pub visit_history: Vec<VisitRecord>,
}

impl From<ShortLink> for VisitLogResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            id: link.short_id,
            total_clicks: link.visit_history.len(),
            visit_history: link.visit_history,
        }
    }
}
