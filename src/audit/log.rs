//! Enrollment and verification audit counters.
//!
//! Counts outcomes only. No keystrokes, texts or user ids are kept here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running outcome counters for this process.
#[derive(Debug)]
pub struct AuditLog {
    /// Sessions accepted into a profile
    sessions_enrolled: AtomicU64,
    /// Sessions refused by the consistency gate
    sessions_rejected: AtomicU64,
    /// Verification attempts
    verifications: AtomicU64,
    /// Verification attempts where the claimed user was the best match
    verifications_succeeded: AtomicU64,
    started_at: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            sessions_enrolled: AtomicU64::new(0),
            sessions_rejected: AtomicU64::new(0),
            verifications: AtomicU64::new(0),
            verifications_succeeded: AtomicU64::new(0),
            started_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that resumes from and saves to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous audit stats: {}", e);
        }

        log
    }

    pub fn record_enrolled(&self) {
        self.sessions_enrolled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.sessions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a verification attempt and whether it succeeded.
    pub fn record_verification(&self, verified: bool) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
        if verified {
            self.verifications_succeeded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            sessions_enrolled: self.sessions_enrolled.load(Ordering::Relaxed),
            sessions_rejected: self.sessions_rejected.load(Ordering::Relaxed),
            verifications: self.verifications.load(Ordering::Relaxed),
            verifications_succeeded: self.verifications_succeeded.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Audit Statistics:\n\
             - Sessions enrolled: {}\n\
             - Sessions rejected (inconsistent pattern): {}\n\
             - Verification attempts: {}\n\
             - Verifications succeeded: {}\n\
             - Uptime: {} seconds",
            stats.sessions_enrolled,
            stats.sessions_rejected,
            stats.verifications,
            stats.verifications_succeeded,
            stats.uptime_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                sessions_enrolled: stats.sessions_enrolled,
                sessions_rejected: stats.sessions_rejected,
                verifications: stats.verifications,
                verifications_succeeded: stats.verifications_succeeded,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            // Concurrent savers each write their own file; the rename is atomic.
            let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
            if let Err(e) = std::fs::write(&tmp, json).and_then(|()| std::fs::rename(&tmp, path)) {
                let _ = std::fs::remove_file(&tmp);
                return Err(e);
            }
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.sessions_enrolled
                    .store(persisted.sessions_enrolled, Ordering::Relaxed);
                self.sessions_rejected
                    .store(persisted.sessions_rejected, Ordering::Relaxed);
                self.verifications
                    .store(persisted.verifications, Ordering::Relaxed);
                self.verifications_succeeded
                    .store(persisted.verifications_succeeded, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.sessions_enrolled.store(0, Ordering::Relaxed);
        self.sessions_rejected.store(0, Ordering::Relaxed);
        self.verifications.store(0, Ordering::Relaxed);
        self.verifications_succeeded.store(0, Ordering::Relaxed);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the audit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub sessions_enrolled: u64,
    pub sessions_rejected: u64,
    pub verifications: u64,
    pub verifications_succeeded: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    sessions_enrolled: u64,
    sessions_rejected: u64,
    verifications: u64,
    verifications_succeeded: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}
