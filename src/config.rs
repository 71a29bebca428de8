//! Generator configuration model and defaults.

use std::path::{Path, PathBuf};

use log::{info, warn};

pub const CONFIG_FILE_NAME: &str = "badge-favicon.toml";
pub const MAX_ICON_EDGE_PX: u32 = 256;

/// Root configuration, optionally loaded from `badge-favicon.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    /// Page to scan and the HTTP identity used to fetch it.
    pub source: SourceConfig,
    #[serde(default)]
    /// Where the downloaded source image and the icon are written.
    pub output: OutputConfig,
    #[serde(default)]
    /// Candidate discovery diagnostics.
    pub discovery: DiscoveryConfig,
}

/// Page URL and request identity shared by every GET.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_page_url")]
    pub page_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output locations and icon frame sizes.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// File stem for the persisted source image; the URL's extension is appended.
    #[serde(default = "default_source_basename")]
    pub source_basename: String,
    #[serde(default = "default_icon_path")]
    pub icon_path: PathBuf,
    #[serde(default = "default_icon_sizes")]
    pub icon_sizes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct DiscoveryConfig {
    /// Number of ranked candidates logged before selection.
    #[serde(default = "default_log_top_candidates")]
    pub log_top_candidates: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            source_basename: default_source_basename(),
            icon_path: default_icon_path(),
            icon_sizes: default_icon_sizes(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            log_top_candidates: default_log_top_candidates(),
        }
    }
}

fn default_page_url() -> String {
    "https://www.scouting.org/merit-badges/cybersecurity/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets").join("img")
}

fn default_source_basename() -> String {
    "cybersecurity-badge-source".to_string()
}

fn default_icon_path() -> PathBuf {
    PathBuf::from("favicon.ico")
}

/// Returns the built-in icon frame sizes.
pub fn default_icon_sizes() -> Vec<u32> {
    vec![16, 32, 48, 64, 96, 128, 256]
}

fn default_log_top_candidates() -> usize {
    8
}

fn non_empty_or(value: String, fallback: fn() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value.trim().to_string()
    }
}

/// Clamps values into ranges the pipeline can honor and restores defaults for blanks.
pub fn sanitize_config(config: Config) -> Config {
    let mut icon_sizes: Vec<u32> = config
        .output
        .icon_sizes
        .into_iter()
        .map(|size| size.clamp(1, MAX_ICON_EDGE_PX))
        .collect();
    icon_sizes.sort_unstable();
    icon_sizes.dedup();
    if icon_sizes.is_empty() {
        icon_sizes = default_icon_sizes();
    }

    let assets_dir = if config.output.assets_dir.as_os_str().is_empty() {
        default_assets_dir()
    } else {
        config.output.assets_dir
    };
    let icon_path = if config.output.icon_path.as_os_str().is_empty() {
        default_icon_path()
    } else {
        config.output.icon_path
    };

    Config {
        source: SourceConfig {
            page_url: non_empty_or(config.source.page_url, default_page_url),
            user_agent: non_empty_or(config.source.user_agent, default_user_agent),
            accept: non_empty_or(config.source.accept, default_accept),
            timeout_secs: config.source.timeout_secs.clamp(1, 300),
        },
        output: OutputConfig {
            assets_dir,
            source_basename: non_empty_or(config.output.source_basename, default_source_basename),
            icon_path,
            icon_sizes,
        },
        discovery: config.discovery,
    }
}

/// Candidate config file locations, most specific first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("badge-favicon").join("config.toml"));
    }
    paths
}

/// Parses a config file, falling back to defaults when it cannot be parsed.
pub fn load_config_file(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config {}: {}", path.display(), err))?;
    let config = match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                "Config file is invalid, using defaults. path={} error={}",
                path.display(),
                err
            );
            Config::default()
        }
    };
    Ok(sanitize_config(config))
}

/// Loads the first config file present in `search_paths`, or the built-in defaults.
pub fn load_config(search_paths: &[PathBuf]) -> Result<Config, String> {
    for path in search_paths {
        if path.is_file() {
            info!("Loading config. path={}", path.display());
            return load_config_file(path);
        }
    }
    info!("No config file found. Using built-in defaults");
    Ok(sanitize_config(Config::default()))
}
