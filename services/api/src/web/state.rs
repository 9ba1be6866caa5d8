//! services/api/src/web/state.rs
//!
//! Defines the application's shared state, created once at startup and
//! passed to all handlers.

use crate::config::Config;
use sabi_assistant_core::ports::{CompletionService, DatabaseService, LinkSafetyService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state. Per-request context (caller identity, chosen
/// mode and language) never lives here; it flows through request extensions
/// and handler arguments.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub gateway: Arc<dyn CompletionService>,
    /// Absent when no reputation-checker key is configured; scam-check then
    /// answers without safety annotations.
    pub safety: Option<Arc<dyn LinkSafetyService>>,
    pub config: Arc<Config>,
    pub guest_quota: GuestQuota,
}

//=========================================================================================
// GuestQuota (Optional Anonymous-Use Policy)
//=========================================================================================

/// In-process message counter backing the optional guest quota. Counts are
/// keyed by the guest cookie and reset on restart, which is acceptable for a
/// soft nudge-to-register throttle.
#[derive(Default)]
pub struct GuestQuota {
    counts: Mutex<HashMap<String, u32>>,
}

impl GuestQuota {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one use for `guest_id`. Returns false once the guest has
    /// already used up `limit` messages.
    pub fn try_consume(&self, guest_id: &str, limit: u32) -> bool {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = counts.entry(guest_id.to_string()).or_insert(0);
        if *count >= limit {
            return false;
        }
        *count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_trips_after_the_configured_count() {
        let quota = GuestQuota::new();
        assert!(quota.try_consume("g1", 2));
        assert!(quota.try_consume("g1", 2));
        assert!(!quota.try_consume("g1", 2));
    }

    #[test]
    fn guests_are_counted_independently() {
        let quota = GuestQuota::new();
        assert!(quota.try_consume("g1", 1));
        assert!(!quota.try_consume("g1", 1));
        assert!(quota.try_consume("g2", 1));
    }

    #[test]
    fn zero_limit_means_no_guest_messages() {
        let quota = GuestQuota::new();
        assert!(!quota.try_consume("g1", 0));
    }
}
