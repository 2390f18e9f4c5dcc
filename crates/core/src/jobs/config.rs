//! Job orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Enable/disable the recurring cron triggers.
    /// Queues keep accepting jobs from the API either way.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Attempts per job, including the first run.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds). Doubles per attempt.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Six-field cron for the torrent progress refresh.
    #[serde(default = "default_refresh_cron")]
    pub refresh_torrents_cron: String,

    #[serde(default = "default_scan_cron")]
    pub scan_library_cron: String,

    #[serde(default = "default_find_new_cron")]
    pub find_new_episodes_cron: String,

    #[serde(default = "default_download_missing_cron")]
    pub download_missing_cron: String,

    /// Completed and failed jobs kept in the registry; the oldest are
    /// evicted first.
    #[serde(default = "default_max_finished_jobs")]
    pub max_finished_jobs: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    1000 // 1 second
}

fn default_refresh_cron() -> String {
    "0 * * * * *".to_string() // every minute
}

fn default_scan_cron() -> String {
    "0 0 */6 * * *".to_string() // every 6 hours
}

fn default_find_new_cron() -> String {
    "0 0 */6 * * *".to_string()
}

fn default_download_missing_cron() -> String {
    "0 */30 * * * *".to_string() // every 30 minutes
}

fn default_max_finished_jobs() -> usize {
    1000
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            refresh_torrents_cron: default_refresh_cron(),
            scan_library_cron: default_scan_cron(),
            find_new_episodes_cron: default_find_new_cron(),
            download_missing_cron: default_download_missing_cron(),
            max_finished_jobs: default_max_finished_jobs(),
        }
    }
}

impl JobsConfig {
    /// Cron expressions keyed by their config field name.
    pub fn schedules(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("refresh_torrents_cron", self.refresh_torrents_cron.as_str()),
            ("scan_library_cron", self.scan_library_cron.as_str()),
            ("find_new_episodes_cron", self.find_new_episodes_cron.as_str()),
            ("download_missing_cron", self.download_missing_cron.as_str()),
        ]
    }

    /// Backoff before re-running a job that failed on `attempt` (1-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(1u64 << exponent))
    }
}
