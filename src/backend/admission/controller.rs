/**
 * Per-Address Connection Admission
 *
 * Counts live connections per source address and refuses new ones once the
 * configured ceiling is reached. The check runs before identity resolution,
 * so reconnection storms are capped without paying for token verification.
 *
 * # Leak Guard
 *
 * Every entry carries an expiry refreshed on each admit and on each
 * [`renew`](AdmissionController::renew). The sweep task renews every address
 * that still has registered sessions, so only slots whose connections went
 * away without a release ever expire. An expired entry is reset on the next
 * admit and removed by the periodic sweep.
 */

use std::net::IpAddr;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::backend::error::BackendError;

#[derive(Debug, Clone, Copy)]
struct AdmissionEntry {
    count: usize,
    expires_at: Instant,
}

/// Bounded connection counter keyed by source address
#[derive(Debug)]
pub struct AdmissionController {
    max_per_address: usize,
    ttl: Duration,
    entries: DashMap<IpAddr, AdmissionEntry>,
}

impl AdmissionController {
    pub fn new(max_per_address: usize, ttl: Duration) -> Self {
        Self {
            max_per_address,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn max_per_address(&self) -> usize {
        self.max_per_address
    }

    /// Take a connection slot for `address`.
    ///
    /// Returns the number of live connections for the address including this
    /// one, or `ConnectionLimitExceeded` when the ceiling is already reached.
    pub fn admit(&self, address: IpAddr) -> Result<usize, BackendError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(address).or_insert(AdmissionEntry {
            count: 0,
            expires_at: now + self.ttl,
        });

        if entry.expires_at <= now && entry.count > 0 {
            tracing::warn!(
                "[Admission] Entry for {} expired with {} slots held, resetting",
                address,
                entry.count
            );
            entry.count = 0;
        }

        if entry.count >= self.max_per_address {
            tracing::warn!(
                "[Admission] Rejecting connection from {}: {} live (limit {})",
                address,
                entry.count,
                self.max_per_address
            );
            return Err(BackendError::ConnectionLimitExceeded {
                address: address.to_string(),
                limit: self.max_per_address,
            });
        }

        entry.count += 1;
        entry.expires_at = now + self.ttl;
        tracing::debug!("[Admission] Admitted {} ({} live)", address, entry.count);
        Ok(entry.count)
    }

    /// Give back a slot taken by [`admit`](Self::admit).
    pub fn release(&self, address: IpAddr) {
        if let Entry::Occupied(mut occupied) = self.entries.entry(address) {
            let entry = occupied.get_mut();
            entry.count = entry.count.saturating_sub(1);
            if entry.count == 0 {
                occupied.remove();
            }
        }
    }

    /// Push back the expiry of an address whose connections are still open.
    pub fn renew(&self, address: IpAddr) {
        if let Some(mut entry) = self.entries.get_mut(&address) {
            entry.expires_at = Instant::now() + self.ttl;
        }
    }

    /// Live connection count for `address` (0 when untracked)
    pub fn active_connections(&self, address: IpAddr) -> usize {
        self.entries.get(&address).map(|e| e.count).unwrap_or(0)
    }

    pub fn tracked_addresses(&self) -> usize {
        self.entries.len()
    }

    /// Drop expired entries; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::info!("[Admission] Swept {} expired admission entries", removed);
        }
        removed
    }
}
