//! Read-through booking cache.
//!
//! Bookings are keyed by id and loaded from `GET /bookings/`. Any mutation
//! invalidates the whole cache and re-fetches the full list; entries are
//! never patched in place. A change of signed-in identity empties the cache
//! before the next read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use garage_core::BookingId;
use moka::future::Cache;
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::resources::BookingRecord;

const MAX_BOOKINGS: u64 = 10_000;

/// Cache of the bookings visible to the current session.
#[derive(Clone)]
pub struct BookingCache {
    api: ApiClient,
    entries: Cache<BookingId, BookingRecord>,
    /// Session generation the entries were loaded under.
    filled_under: Arc<AtomicU64>,
}

impl BookingCache {
    /// Create an empty cache using the configured time-to-live.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_BOOKINGS)
            .time_to_live(api.config().cache_ttl)
            .build();
        let filled_under = Arc::new(AtomicU64::new(api.session().generation()));
        Self {
            api,
            entries,
            filled_under,
        }
    }

    /// Drop every cached booking and load the full list again.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the list cannot be fetched; the cache is
    /// left empty in that case.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<BookingRecord>, ClientError> {
        self.invalidate().await;
        self.filled_under
            .store(self.api.session().generation(), Ordering::Release);
        let records = self.api.list_bookings().await?;
        for record in &records {
            self.entries.insert(record.id(), record.clone()).await;
        }
        debug!(count = records.len(), "Booking cache refreshed");
        Ok(sorted(records))
    }

    /// All cached bookings, newest first, loading them if the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if a load is needed and fails.
    pub async fn list(&self) -> Result<Vec<BookingRecord>, ClientError> {
        self.discard_if_stale().await;
        self.entries.run_pending_tasks().await;
        if self.entries.entry_count() == 0 {
            return self.refresh().await;
        }
        debug!("Booking cache hit");
        Ok(sorted(self.entries.iter().map(|(_, record)| record).collect()))
    }

    /// A single booking. A miss triggers a full refresh before giving up.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the booking is not in the refreshed
    /// list, or the refresh error.
    pub async fn get(&self, id: BookingId) -> Result<BookingRecord, ClientError> {
        self.discard_if_stale().await;
        if let Some(record) = self.entries.get(&id).await {
            debug!(booking_id = %id, "Booking cache hit");
            return Ok(record);
        }
        self.refresh()
            .await?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| ClientError::NotFound(format!("Booking #{id} not found.")))
    }

    /// Drop every cached booking without re-fetching.
    pub async fn invalidate(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }

    async fn discard_if_stale(&self) {
        let current = self.api.session().generation();
        let filled = self.filled_under.swap(current, Ordering::AcqRel);
        if filled != current {
            debug!("Signed-in identity changed, dropping cached bookings");
            self.invalidate().await;
        }
    }
}

impl std::fmt::Debug for BookingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingCache")
            .field("entries", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

fn sorted(mut records: Vec<BookingRecord>) -> Vec<BookingRecord> {
    records.sort_by(|a, b| {
        b.booking
            .created_at
            .cmp(&a.booking.created_at)
            .then_with(|| b.id().cmp(&a.id()))
    });
    records
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use crate::token_store::{MemoryTokenStore, StoredTokens};

    fn token(role: &str, username: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::json!({ "role": role, "username": username, "user_id": 1 }).to_string(),
        );
        format!("{header}.{body}.sig")
    }

    fn record(id: i64, created: &str) -> BookingRecord {
        serde_json::from_value(serde_json::json!({
            "id": id, "customer": 1, "vehicle": 1, "service": 1,
            "status": "PENDING", "preferred_date": "2026-03-05",
            "created_at": created
        }))
        .unwrap()
    }

    #[test]
    fn test_sorted_newest_first() {
        let records = sorted(vec![
            record(1, "2026-03-01T10:00:00Z"),
            record(3, "2026-03-03T10:00:00Z"),
            record(2, "2026-03-03T10:00:00Z"),
        ]);
        let ids: Vec<i64> = records.iter().map(|r| r.id().as_i64()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_refresh_without_session_leaves_cache_empty() {
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let session = SessionStore::new(Arc::new(MemoryTokenStore::new()));
        let cache = BookingCache::new(ApiClient::new(config, session).unwrap());

        assert!(cache.refresh().await.is_err());
        assert!(cache.get(BookingId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_identity_change_drops_entries() {
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let session = SessionStore::new(Arc::new(MemoryTokenStore::with_tokens(
            StoredTokens::new(token("ADMIN", "boss"), None),
        )));
        session.restore();
        let cache = BookingCache::new(ApiClient::new(config, session.clone()).unwrap());

        cache
            .entries
            .insert(BookingId::new(1), record(1, "2026-03-01T10:00:00Z"))
            .await;
        assert!(cache.get(BookingId::new(1)).await.is_ok());

        session.logout().unwrap();
        cache.discard_if_stale().await;
        assert_eq!(cache.entries.entry_count(), 0);
    }
}
