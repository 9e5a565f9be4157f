use dashmap::DashMap;
use news_pipeline::NewsPipeline;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Limits on live pipeline sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions untouched for longer than this are closed
    pub idle_ttl: Duration,
    pub max_sessions: usize,
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// `SESSION_IDLE_SECS`, `SESSION_MAX`, `SESSION_SWEEP_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            idle_ttl: secs("SESSION_IDLE_SECS", defaults.idle_ttl),
            max_sessions: std::env::var("SESSION_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_sessions),
            sweep_interval: secs("SESSION_SWEEP_SECS", defaults.sweep_interval),
        }
    }
}

struct SessionEntry {
    pipeline: Arc<NewsPipeline>,
    last_access: Instant,
}

/// Live sessions keyed by id, with idle expiry and a size cap.
///
/// Lookups refresh a session's idle timer. An expired session is gone for
/// every caller even before the sweeper shuts it down.
pub struct SessionRegistry {
    entries: DashMap<Uuid, SessionEntry>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        tracing::info!(
            "Sessions: max {}, idle timeout {}s",
            config.max_sessions,
            config.idle_ttl.as_secs()
        );

        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a pipeline under a fresh id; `None` when the registry is full.
    pub fn open(&self, pipeline: Arc<NewsPipeline>) -> Option<Uuid> {
        if self.entries.len() >= self.config.max_sessions {
            return None;
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            SessionEntry {
                pipeline,
                last_access: Instant::now(),
            },
        );
        Some(id)
    }

    /// Live pipeline for `id`, refreshing its idle timer.
    pub fn get(&self, id: &Uuid) -> Option<Arc<NewsPipeline>> {
        let now = Instant::now();
        let live = {
            let mut entry = self.entries.get_mut(id)?;
            if now.duration_since(entry.last_access) > self.config.idle_ttl {
                None
            } else {
                entry.last_access = now;
                Some(Arc::clone(&entry.pipeline))
            }
        };

        if live.is_none() {
            // Dropping the last handle cancels its pending annotations
            self.entries.remove(id);
            tracing::info!("Session {} expired", id);
        }
        live
    }

    pub fn remove(&self, id: &Uuid) -> Option<Arc<NewsPipeline>> {
        self.entries.remove(id).map(|(_, entry)| entry.pipeline)
    }

    /// Remove idle sessions and hand back their pipelines for shutdown.
    pub fn take_expired(&self) -> Vec<Arc<NewsPipeline>> {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|entry| now.duration_since(entry.last_access) > self.config.idle_ttl)
            .map(|entry| *entry.key())
            .collect();

        expired
            .iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }

    pub fn drain(&self) -> Vec<Arc<NewsPipeline>> {
        let ids: Vec<Uuid> = self.entries.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Periodically shut down idle sessions.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(registry.config.sweep_interval);
            loop {
                interval.tick().await;
                let expired = registry.take_expired();
                if expired.is_empty() {
                    continue;
                }
                tracing::info!(
                    "Closing {} idle sessions ({} remain)",
                    expired.len(),
                    registry.len()
                );
                for pipeline in expired {
                    pipeline.shutdown().await;
                }
            }
        })
    }
}
