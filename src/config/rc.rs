use super::eligibility::Eligibility;
use crate::marker::DEFAULT_MARKER_ICON;
use crate::store::DEFAULT_ANNOUNCE_DURATION;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const RC_FILE_NAME: &str = ".lasteditrc";
pub const STORAGE_DIR_ENV: &str = "LASTEDIT_STORAGE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct RcConfig {
    pub storage_dir: Option<PathBuf>,
    pub languages: Eligibility,
    pub marker_icon: PathBuf,
    pub announce_duration: Duration,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            languages: Eligibility::default(),
            marker_icon: PathBuf::from(DEFAULT_MARKER_ICON),
            announce_duration: DEFAULT_ANNOUNCE_DURATION,
        }
    }
}

impl RcConfig {
    /// Directory holding both store files: the configured one, or the
    /// platform data directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("lastedit")
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .lasteditrc in:
    /// 1. Current directory
    /// 2. Home directory (~/.lasteditrc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE_NAME);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Some(home) = dirs::home_dir() {
            let home_rc = home.join(RC_FILE_NAME);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load the RC file if one is found, then apply environment overrides.
    pub fn load_config() -> RcConfig {
        let mut config = RcConfig::default();

        if let Some(rc_path) = Self::get_rc_path() {
            match fs::read_to_string(&rc_path) {
                Ok(content) => {
                    log::debug!("[CONFIG] loading {}", rc_path.display());
                    Self::parse_config_content(&content, &mut config);
                }
                Err(e) => {
                    log::warn!("[CONFIG] could not read {}: {e}", rc_path.display());
                }
            }
        }

        Self::apply_env(&mut config);
        config
    }

    /// Load an explicitly named RC file. Unlike the implicit lookup, an
    /// unreadable file is an error.
    pub fn load_from(path: &Path) -> Result<RcConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = RcConfig::default();
        Self::parse_config_content(&content, &mut config);
        Self::apply_env(&mut config);
        Ok(config)
    }

    pub fn apply_env(config: &mut RcConfig) {
        Self::apply_env_with(config, |key| env::var(key).ok());
    }

    fn apply_env_with(config: &mut RcConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(STORAGE_DIR_ENV).filter(|value| !value.trim().is_empty()) {
            config.storage_dir = Some(PathBuf::from(dir.trim()));
        }
    }

    /// Parse the content of an RC file
    pub fn parse_config_content(content: &str, config: &mut RcConfig) {
        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('"') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    fn parse_config_line(line: &str, config: &mut RcConfig) {
        // Remove inline comments
        let line = match line.find(" #") {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        let setting = line.strip_prefix("set ").map(str::trim).unwrap_or(line);

        if let Some((key, value)) = setting.split_once("+=") {
            if matches!(key.trim(), "language" | "languages") {
                for language in split_list(value) {
                    config.languages.insert(language);
                }
            }
            return;
        }

        if let Some((key, value)) = setting.split_once("-=") {
            if matches!(key.trim(), "language" | "languages") {
                for language in split_list(value) {
                    config.languages.remove(&language);
                }
            }
            return;
        }

        let Some((key, value)) = setting.split_once('=') else {
            return;
        };
        let value = value.trim();

        match key.trim() {
            "storage_dir" | "storagedir" => {
                if !value.is_empty() {
                    config.storage_dir = Some(PathBuf::from(value));
                }
            }
            "languages" | "language" => {
                config.languages = match value {
                    "default" => Eligibility::default(),
                    "narrow" => Eligibility::narrow(),
                    _ => Eligibility::from_languages(split_list(value)),
                };
            }
            "marker_icon" | "icon" => {
                if !value.is_empty() {
                    config.marker_icon = PathBuf::from(value);
                }
            }
            "announce_secs" | "announce" => {
                if let Ok(secs) = value.parse::<u64>() {
                    if secs > 0 && secs <= 3600 {
                        config.announce_duration = Duration::from_secs(secs);
                    }
                }
            }
            _ => {} // Unknown setting, ignore
        }
    }

    /// Generate a sample RC file content
    pub fn generate_sample_rc() -> String {
        r#"# lastedit configuration file (.lasteditrc)
# Lines starting with # or " are comments

# Where lastEditPosition.json and lastOpenedFile.json live
# set storage_dir=/home/me/.local/share/lastedit

# Tracked content types: a comma list, or the presets "default" / "narrow"
set languages=default
set language+=toml       # add one
set language-=json       # or drop one

# Gutter icon handed to the editor
set marker_icon=images/dot.png

# Seconds the startup "Last opened file" notice stays up
set announce_secs=10
"#
        .to_string()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
