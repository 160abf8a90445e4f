use config::{Config, Environment, File};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("profscope.db")
}

fn default_pool_size() -> usize {
    4
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Minimum group size for a query shape to count as N+1.
    #[serde(default = "default_n_plus_one_threshold")]
    pub n_plus_one_threshold: usize,
    /// Number of views in each top-N report.
    #[serde(default = "default_top_views")]
    pub top_views: usize,
}

fn default_n_plus_one_threshold() -> usize {
    crate::analytics::n_plus_one::DEFAULT_THRESHOLD
}

fn default_top_views() -> usize {
    crate::analytics::top_views::DEFAULT_TOP_VIEWS
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            n_plus_one_threshold: default_n_plus_one_threshold(),
            top_views: default_top_views(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    #[serde(default = "default_per_page_options")]
    pub per_page_options: Vec<usize>,
    #[serde(default = "default_view_style")]
    pub default_view_style: String,
}

fn default_per_page() -> usize {
    25
}

fn default_per_page_options() -> Vec<usize> {
    vec![10, 25, 50, 100]
}

fn default_view_style() -> String {
    "row".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            per_page_options: default_per_page_options(),
            default_view_style: default_view_style(),
        }
    }
}

impl DisplayConfig {
    pub fn default_page_size(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.default_per_page).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn is_allowed_per_page(&self, n: usize) -> bool {
        self.per_page_options.contains(&n)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,
    /// Memory backend only: evict sessions idle for this long. Unset keeps
    /// state for the life of the process.
    #[serde(default)]
    pub idle_ttl_secs: Option<u64>,
    /// Memory backend only: evict least recently used sessions past this
    /// count. Unset is unbounded.
    #[serde(default)]
    pub max_sessions: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            idle_ttl_secs: None,
            max_sessions: None,
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default)]
    pub window_hours: Option<u64>,
}

fn default_max_requests() -> usize {
    10_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_hours: None,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();

        // Load from config file
        let path = config_path.unwrap_or("config.toml");
        builder = builder.add_source(File::with_name(path).required(false));

        // Overlay with environment variables (PROFSCOPE__DISPLAY__DEFAULT_PER_PAGE=50, etc.)
        builder = builder.add_source(
            Environment::with_prefix("PROFSCOPE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.analytics.n_plus_one_threshold == 0 {
            return Err(config::ConfigError::Message(
                "analytics.n_plus_one_threshold must be at least 1".to_string(),
            ));
        }
        if self.display.per_page_options.is_empty()
            || self.display.per_page_options.contains(&0)
        {
            return Err(config::ConfigError::Message(
                "display.per_page_options must be non-empty and positive".to_string(),
            ));
        }
        if !self.display.is_allowed_per_page(self.display.default_per_page) {
            return Err(config::ConfigError::Message(format!(
                "display.default_per_page {} is not one of {:?}",
                self.display.default_per_page, self.display.per_page_options
            )));
        }
        if self.loader.max_requests == 0 {
            return Err(config::ConfigError::Message(
                "loader.max_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
