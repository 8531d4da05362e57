//! Provider credential pool: rotation, quota tracking, deactivation, reset.
//!
//! The pool is process-wide shared mutable state touched by every request
//! handler, so all bookkeeping lives behind a [`Mutex`]. Only the
//! read-modify-write sequences in [`KeyPool::select`],
//! [`KeyPool::report_success`], and [`KeyPool::report_failure`] take the
//! lock; the network call itself runs outside it.
//!
//! # Lifecycle
//!
//! Keys are created once at pool construction from an ordered secret list
//! (the order is the rotation order), mutated on use and on rate-limit
//! deactivation, and never deleted, only reset, either by the automatic
//! monthly pass or by an operator calling [`KeyPool::reset_all`].

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::config::validate_secrets;
use crate::error::Result;

/// One provider credential and its usage state.
#[derive(Debug, Clone)]
struct ProviderKey {
    /// Opaque secret. Unique within the pool.
    value: String,
    /// Whether this key may be selected. Cleared on rate-limit deactivation.
    active: bool,
    /// Successful calls served this month.
    monthly_usage: u32,
    /// Fixed monthly call quota.
    quota_limit: u32,
    /// When this key last served or failed a call.
    last_used_at: Option<DateTime<Utc>>,
}

/// A credential leased out of the pool for one call attempt.
///
/// The lease carries a copy of the secret so the pool lock is released
/// before the network call starts. Outcomes are reported back through
/// [`KeyPool::report_success`] or [`KeyPool::report_failure`].
#[derive(Debug, Clone)]
pub struct KeyLease {
    pub(crate) slot: usize,
    secret: String,
}

impl KeyLease {
    /// The leased credential secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// Read-only snapshot of a single key's state. Never carries the secret.
#[derive(Debug, Clone, Serialize)]
pub struct KeyStatus {
    pub active: bool,
    pub monthly_usage: u32,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Read-only snapshot of the whole pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub total_keys: usize,
    pub active_keys: usize,
    pub current_index: usize,
    pub keys: Vec<KeyStatus>,
}

#[derive(Debug)]
struct PoolInner {
    keys: Vec<ProviderKey>,
    /// Advisory rotation cursor. Always reduced mod pool size before use;
    /// selection may serve a different slot when this one is unusable.
    current_index: usize,
}

/// The shared registry of provider credentials.
#[derive(Debug)]
pub struct KeyPool {
    inner: Mutex<PoolInner>,
}

impl KeyPool {
    /// Build a pool from an ordered secret list.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GatewayError::Config`] if the list is empty or
    /// contains blank or duplicate secrets.
    pub fn new(secrets: Vec<String>, quota_limit: u32) -> Result<Self> {
        validate_secrets(&secrets)?;
        let keys = secrets
            .into_iter()
            .map(|value| ProviderKey {
                value,
                active: true,
                monthly_usage: 0,
                quota_limit,
                last_used_at: None,
            })
            .collect();
        Ok(Self {
            inner: Mutex::new(PoolInner {
                keys,
                current_index: 0,
            }),
        })
    }

    /// Number of configured keys.
    pub fn key_count(&self) -> usize {
        self.lock().keys.len()
    }

    /// Select a usable credential, or `None` when the pool is empty.
    ///
    /// Selection order:
    /// 1. the key at the rotation cursor, if it is active;
    /// 2. otherwise the first key (scanning from slot 0) that is active and
    ///    under quota, moving the cursor to it;
    /// 3. otherwise a monthly reset pass revives every key whose last use
    ///    predates the first calendar day of the current month;
    /// 4. then slot 0 is handed out.
    ///
    /// Step 4 can return a key that is still inactive and over quota when
    /// the reset pass revived nothing. That key will fail with the
    /// provider's own rate-limit response; the gateway's per-operation
    /// attempt bound turns that into a terminal exhaustion error. Kept
    /// deliberately: callers must not assume a selected key is under quota.
    pub fn select(&self) -> Option<KeyLease> {
        self.select_at(Utc::now())
    }

    fn select_at(&self, now: DateTime<Utc>) -> Option<KeyLease> {
        let mut inner = self.lock();
        if inner.keys.is_empty() {
            return None;
        }

        let cursor = inner.current_index % inner.keys.len();
        inner.current_index = cursor;
        if inner.keys[cursor].active {
            return Some(lease(&inner.keys, cursor));
        }

        for slot in 0..inner.keys.len() {
            let key = &inner.keys[slot];
            if key.active && key.monthly_usage < key.quota_limit {
                inner.current_index = slot;
                return Some(lease(&inner.keys, slot));
            }
        }

        let month_start = month_start(now);
        let mut revived = 0usize;
        for key in &mut inner.keys {
            if key.last_used_at.is_none_or(|t| t < month_start) {
                key.monthly_usage = 0;
                key.active = true;
                revived += 1;
            }
        }
        tracing::debug!(revived, "monthly reset pass completed");

        inner.current_index = 0;
        Some(lease(&inner.keys, 0))
    }

    /// Record a successful call served by the leased key.
    pub fn report_success(&self, lease: &KeyLease) {
        let mut inner = self.lock();
        if let Some(key) = inner.keys.get_mut(lease.slot) {
            key.monthly_usage += 1;
            key.last_used_at = Some(Utc::now());
        }
    }

    /// Record a rate-limit or quota rejection for the leased key.
    ///
    /// Deactivates the key and forces its usage to the quota limit so it
    /// stays out of rotation until a reset makes it eligible again. Other
    /// failure classes are not the pool's concern and never reach here.
    pub fn report_failure(&self, lease: &KeyLease) {
        let mut inner = self.lock();
        if let Some(key) = inner.keys.get_mut(lease.slot) {
            key.active = false;
            key.monthly_usage = key.quota_limit;
            key.last_used_at = Some(Utc::now());
        }
    }

    /// Administrative reset: every key active with zero usage.
    ///
    /// Not time-gated, unlike the automatic monthly pass.
    pub fn reset_all(&self) {
        let mut inner = self.lock();
        for key in &mut inner.keys {
            key.active = true;
            key.monthly_usage = 0;
        }
        tracing::debug!(total = inner.keys.len(), "all credentials reset");
    }

    /// Read-only snapshot of pool state. Does not mutate anything.
    pub fn status(&self) -> PoolStatus {
        let inner = self.lock();
        PoolStatus {
            total_keys: inner.keys.len(),
            active_keys: inner.keys.iter().filter(|k| k.active).count(),
            current_index: inner.current_index,
            keys: inner
                .keys
                .iter()
                .map(|k| KeyStatus {
                    active: k.active,
                    monthly_usage: k.monthly_usage,
                    last_used_at: k.last_used_at,
                })
                .collect(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lease(keys: &[ProviderKey], slot: usize) -> KeyLease {
    KeyLease {
        slot,
        secret: keys[slot].value.clone(),
    }
}

/// Midnight UTC on the first calendar day of `now`'s month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
