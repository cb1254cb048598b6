//! Configuration types for mobile-pkg-renamer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// External tool paths (aapt, plutil)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to aapt executable (auto-detected if None)
    #[serde(default)]
    pub aapt_path: Option<PathBuf>,

    /// Path to plutil executable (auto-detected if None)
    #[serde(default)]
    pub plutil_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Run `plutil -p` on the main Info.plist as a corroborating method (default: true)
    #[serde(default = "default_true")]
    pub use_plist_dump: bool,

    /// Pass `--values` to `aapt dump resources` so string values are printed (default: true)
    #[serde(default = "default_true")]
    pub resource_values: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            aapt_path: None,
            plutil_path: None,
            search_path: true,
            use_plist_dump: true,
            resource_values: true,
        }
    }
}

/// Hard ceilings for every external invocation and archive read
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// `aapt dump badging` (default: 30 seconds)
    #[serde(default = "default_badging_timeout", with = "duration_serde")]
    pub badging: Duration,

    /// `aapt dump resources` (default: 30 seconds)
    #[serde(default = "default_resources_timeout", with = "duration_serde")]
    pub resources: Duration,

    /// `aapt dump xmltree` (default: 20 seconds)
    #[serde(default = "default_xmltree_timeout", with = "duration_serde")]
    pub xmltree: Duration,

    /// `plutil -p` (default: 10 seconds)
    #[serde(default = "default_plist_dump_timeout", with = "duration_serde")]
    pub plist_dump: Duration,

    /// Any single archive read or icon copy (default: 30 seconds)
    #[serde(default = "default_archive_timeout", with = "duration_serde")]
    pub archive: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            badging: default_badging_timeout(),
            resources: default_resources_timeout(),
            xmltree: default_xmltree_timeout(),
            plist_dump: default_plist_dump_timeout(),
            archive: default_archive_timeout(),
        }
    }
}

/// Phase 1 (parallel analysis) settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum concurrent analyses (None = number of CPUs)
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// How many secondary Info.plist entries to inspect when the main one has no name (default: 5)
    #[serde(default = "default_alternate_manifest_limit")]
    pub alternate_manifest_limit: usize,

    /// Largest archive entry read into memory, in bytes (default: 64 MiB)
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            alternate_manifest_limit: default_alternate_manifest_limit(),
            max_entry_bytes: default_max_entry_bytes(),
        }
    }
}

/// Retry behavior for transient failures
///
/// `max_attempts` counts retries after the first try, so the operation runs
/// at most `max_attempts + 1` times.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before first retry (default: 100 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_ms_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 1 second)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry (default: 1.0 = fixed backoff)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Phase 2 renaming settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameConfig {
    /// Version appended when none was resolved (default: "1.0")
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Retry policy for the physical rename
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            retry: RetryConfig::default(),
        }
    }
}

/// Icon extraction settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IconConfig {
    /// Output directory for extracted icons (default: "icons")
    #[serde(default = "default_icon_dir")]
    pub icon_dir: PathBuf,

    /// Extract one icon per package after renaming (default: true)
    #[serde(default = "default_true")]
    pub extract: bool,

    /// Remove degenerate icon files before and after a batch (default: true)
    #[serde(default = "default_true")]
    pub prune_invalid: bool,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            icon_dir: default_icon_dir(),
            extract: true,
            prune_invalid: true,
        }
    }
}

/// Main configuration for a batch run
///
/// Fields are organized into logical sub-configs:
/// - [`tools`](ToolsConfig): external binary paths
/// - [`timeouts`](TimeoutConfig): hard ceilings per invocation
/// - [`analysis`](AnalysisConfig): phase 1 worker pool
/// - [`rename`](RenameConfig): phase 2 naming and retries
/// - [`icons`](IconConfig): icon output directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for packages and renamed in place (default: ".")
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Rename settings
    #[serde(default)]
    pub rename: RenameConfig,

    /// Icon settings
    #[serde(default)]
    pub icons: IconConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            tools: ToolsConfig::default(),
            timeouts: TimeoutConfig::default(),
            analysis: AnalysisConfig::default(),
            rename: RenameConfig::default(),
            icons: IconConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration rooted at `input_dir`, with icons written to `<input_dir>/icons`
    pub fn for_dir(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        Self {
            icons: IconConfig {
                icon_dir: input_dir.join(default_icon_dir()),
                ..IconConfig::default()
            },
            input_dir,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_workers == Some(0) {
            return Err(Error::Config {
                message: "max_workers must be at least 1".to_string(),
                key: Some("analysis.max_workers".to_string()),
            });
        }

        if self.analysis.max_entry_bytes == 0 {
            return Err(Error::Config {
                message: "max_entry_bytes must be greater than zero".to_string(),
                key: Some("analysis.max_entry_bytes".to_string()),
            });
        }

        let timeouts = [
            ("timeouts.badging", self.timeouts.badging),
            ("timeouts.resources", self.timeouts.resources),
            ("timeouts.xmltree", self.timeouts.xmltree),
            ("timeouts.plist_dump", self.timeouts.plist_dump),
            ("timeouts.archive", self.timeouts.archive),
        ];
        for (key, value) in timeouts {
            if value.is_zero() {
                return Err(Error::Config {
                    message: format!("{} must be greater than zero", key),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.rename.default_version.trim().is_empty() {
            return Err(Error::Config {
                message: "default_version must not be empty".to_string(),
                key: Some("rename.default_version".to_string()),
            });
        }

        if self.rename.retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be >= 1.0".to_string(),
                key: Some("rename.retry.backoff_multiplier".to_string()),
            });
        }

        Ok(())
    }

    /// Number of phase 1 workers: configured value, else available CPUs
    pub fn worker_count(&self) -> usize {
        self.analysis
            .max_workers
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

// Default value functions
fn default_input_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_icon_dir() -> PathBuf {
    PathBuf::from("icons")
}

fn default_true() -> bool {
    true
}

fn default_badging_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_resources_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_xmltree_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_plist_dump_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_archive_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_entry_bytes() -> u64 {
    crate::archive::DEFAULT_MAX_ENTRY_BYTES
}

fn default_alternate_manifest_limit() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_version() -> String {
    "1.0".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
