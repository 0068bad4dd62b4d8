//! Short-lived staging store for generated ticket PDFs.
//!
//! The PDF generator runs out-of-band: it posts the rendered document here,
//! hands the returned id to the delivery email, and the recipient's browser
//! fetches the bytes once. Entries carry an explicit expiry timestamp and
//! are swept on every insert, so the store holds nothing past its TTL even
//! without a background task. Nothing here is durable across restarts;
//! callers regenerate on a miss.

use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

struct StagedPdf {
    bytes: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Id-keyed PDF arena with per-entry expiry.
pub struct PdfStore {
    entries: Mutex<HashMap<String, StagedPdf>>,
    ttl: Duration,
}

impl PdfStore {
    /// Build a store whose entries live for `ttl_secs` seconds.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Stage a base64-encoded document, returning its generated id.
    ///
    /// Expired entries are swept as a side effect, keeping the arena bounded
    /// by the insert rate within one TTL window.
    ///
    /// Returns `None` when the payload is not valid base64.
    pub fn insert(&self, pdf_base64: &str, now: DateTime<Utc>) -> Option<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(pdf_base64)
            .ok()?;

        let id = Uuid::new_v4().simple().to_string();
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.retain(|_, staged| staged.expires_at > now);
        entries.insert(
            id.clone(),
            StagedPdf {
                bytes,
                expires_at: now + self.ttl,
            },
        );
        Some(id)
    }

    /// Fetch a staged document's bytes, or `None` if unknown or expired.
    pub fn get(&self, id: &str, now: DateTime<Utc>) -> Option<Vec<u8>> {
        let entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .get(id)
            .filter(|staged| staged.expires_at > now)
            .map(|staged| staged.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if staging fails
    fn staged_pdf_is_served_until_expiry() {
        let store = PdfStore::new(300);
        let now = Utc::now();
        let encoded = STANDARD.encode(b"%PDF-1.4 fake");

        let id = store.insert(&encoded, now).expect("valid base64 stages");
        assert_eq!(store.get(&id, now), Some(b"%PDF-1.4 fake".to_vec()));

        let after_expiry = now + Duration::seconds(301);
        assert_eq!(store.get(&id, after_expiry), None);
    }

    #[test]
    fn invalid_base64_is_not_staged() {
        let store = PdfStore::new(300);
        assert_eq!(store.insert("not base64!!!", Utc::now()), None);
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if staging fails
    fn insert_sweeps_expired_entries() {
        let store = PdfStore::new(60);
        let start = Utc::now();
        let encoded = STANDARD.encode(b"doc");

        let old = store.insert(&encoded, start).expect("valid base64 stages");
        let later = start + Duration::seconds(120);
        let fresh = store.insert(&encoded, later).expect("valid base64 stages");

        assert_eq!(store.get(&old, later), None);
        assert!(store.get(&fresh, later).is_some());
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: test fails if staging fails
    fn unknown_id_misses() {
        let store = PdfStore::new(60);
        assert_eq!(store.get("nope", Utc::now()), None);
        let id = store
            .insert(&STANDARD.encode(b"doc"), Utc::now())
            .expect("valid base64 stages");
        assert_ne!(id, "nope");
    }
}
