use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use redis::AsyncCommands;

use crate::models::student::StudentModel;

/// Value written over a card key when its row changes. Lookups treat it as
/// "go to the database" and backfills cannot replace it until it expires.
const STALE_MARKER: &str = "stale";

/// Lifetime of a stale marker. A reader that loaded a row before a write
/// must finish its backfill within this window or lose the race to the
/// marker anyway.
const SETTLE_SECS: u64 = 60;

/// Result of a cache read for one card.
#[derive(Debug)]
pub enum CardLookup {
    Hit(StudentModel),
    /// Nothing cached. The caller may backfill.
    Miss,
    /// The key was written recently or the cache is unreachable. Read the
    /// database and leave the cache alone.
    Bypass,
}

/// Copy of card lookups, keyed by school ID.
///
/// Writers call [`CacheRepository::mark_stale`] before and after changing a
/// row. Readers only fill empty keys ([`CacheRepository::backfill`] is a
/// `SET NX`), so a row read before a write can never land on top of the
/// marker that write left behind.
#[derive(Clone, Debug)]
pub struct CacheRepository {
    backend: Backend,
    ttl_secs: u64,
    /// Keys whose marker could not be written. Served from the database
    /// until a marker write succeeds.
    unmarked: Arc<Mutex<HashSet<String>>>,
}

#[derive(Clone, Debug)]
enum Backend {
    Redis(bb8::Pool<redis::Client>),
    Memory(Arc<MemoryCache>),
}

#[derive(Debug, Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    offline: AtomicBool,
}

fn card_key(school_id: &str) -> String {
    format!("card:{school_id}")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CacheRepository {
    pub fn new(redis_pool: bb8::Pool<redis::Client>, ttl_secs: u64) -> Self {
        Self::with_backend(Backend::Redis(redis_pool), ttl_secs)
    }

    /// Process-local cache for single-instance deployments.
    pub fn in_memory(ttl_secs: u64) -> Self {
        Self::with_backend(Backend::Memory(Arc::default()), ttl_secs)
    }

    fn with_backend(backend: Backend, ttl_secs: u64) -> Self {
        Self {
            backend,
            ttl_secs,
            unmarked: Arc::default(),
        }
    }

    pub async fn lookup(&self, school_id: &str) -> CardLookup {
        if lock(&self.unmarked).contains(school_id) {
            // Retry the marker so the key can be cached again once the
            // backend is back.
            let _ = self.mark_stale(school_id).await;
            return CardLookup::Bypass;
        }

        match self.read(&card_key(school_id)).await {
            Ok(None) => CardLookup::Miss,
            Ok(Some(raw)) if raw == STALE_MARKER => CardLookup::Bypass,
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(student) => CardLookup::Hit(student),
                Err(e) => {
                    tracing::warn!("Unreadable cached card: {:?}", e);
                    CardLookup::Bypass
                }
            },
            Err(e) => {
                tracing::warn!("Card cache read failed: {:?}", e);
                CardLookup::Bypass
            }
        }
    }

    /// Caches `student` unless the key already holds something. Returns
    /// whether the entry was written.
    pub async fn backfill(&self, student: &StudentModel) -> anyhow::Result<bool> {
        let value = serde_json::to_string(student)?;
        self.write(&card_key(&student.school_id), value, self.ttl_secs, true)
            .await
    }

    /// Replaces whatever is cached for `school_id` with the stale marker.
    /// On failure the key is served from the database by this process
    /// until a later marker write succeeds.
    pub async fn mark_stale(&self, school_id: &str) -> anyhow::Result<()> {
        let written = self
            .write(&card_key(school_id), STALE_MARKER.to_string(), SETTLE_SECS, false)
            .await;
        let mut unmarked = lock(&self.unmarked);
        match written {
            Ok(_) => {
                unmarked.remove(school_id);
                Ok(())
            }
            Err(e) => {
                unmarked.insert(school_id.to_string());
                Err(e)
            }
        }
    }

    /// Round-trips a throwaway key so a bad URL fails at startup.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.write("membercard:ping", "pong".into(), 5, false).await?;
        let result = self.read("membercard:ping").await?;
        anyhow::ensure!(
            result.as_deref() == Some("pong"),
            "unexpected cache reply {result:?}"
        );
        Ok(())
    }

    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        match &self.backend {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await?;
                Ok(conn.get(key).await?)
            }
            Backend::Memory(memory) => {
                memory.check_online()?;
                let mut entries = lock(&memory.entries);
                match entries.get(key) {
                    Some((_, expires)) if *expires <= Instant::now() => {
                        entries.remove(key);
                        Ok(None)
                    }
                    entry => Ok(entry.map(|(value, _)| value.clone())),
                }
            }
        }
    }

    async fn write(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
        only_if_absent: bool,
    ) -> anyhow::Result<bool> {
        match &self.backend {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await?;
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(value).arg("EX").arg(ttl_secs);
                if only_if_absent {
                    cmd.arg("NX");
                }
                // SET replies OK, or nil when NX found the key taken.
                let reply: Option<String> = cmd.query_async(&mut *conn).await?;
                Ok(reply.is_some())
            }
            Backend::Memory(memory) => {
                memory.check_online()?;
                let now = Instant::now();
                let mut entries = lock(&memory.entries);
                let live = entries
                    .get(key)
                    .is_some_and(|(_, expires)| *expires > now);
                if only_if_absent && live {
                    return Ok(false);
                }
                entries.insert(
                    key.to_string(),
                    (value, now + Duration::from_secs(ttl_secs)),
                );
                Ok(true)
            }
        }
    }

    /// Makes the in-memory backend fail every call, like an unreachable
    /// Redis.
    #[cfg(test)]
    pub(crate) fn set_offline(&self, offline: bool) {
        if let Backend::Memory(memory) = &self.backend {
            memory.offline.store(offline, Ordering::SeqCst);
        }
    }
}

impl MemoryCache {
    fn check_online(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.offline.load(Ordering::SeqCst), "cache unavailable");
        Ok(())
    }
}
