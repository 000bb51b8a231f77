use piiscrub_core::{MaskingMode, ScrubConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(flatten)]
    pub scrub: ScrubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Off by default; request lines could hint at what was submitted
    #[serde(default = "default_false")]
    pub enabled: bool,

    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            scrub: ScrubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a YAML or TOML file, chosen by extension
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    ///
    /// Unparseable values are reported and ignored, except `ENABLE_AUTH`,
    /// which must be a recognizable flag.
    pub fn merge_env(&mut self) -> anyhow::Result<()> {
        // Server settings
        if let Ok(val) = std::env::var("HOST") {
            self.host = val;
        }
        set_parsed("PORT", &mut self.port);

        // Logging settings
        set_flag("ENABLE_LOGGING", &mut self.logging.enabled);
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = val.to_lowercase();
        }

        let scrub = &mut self.scrub;

        // Masking defaults
        if let Ok(val) = std::env::var("MASKING_MODE") {
            match MaskingMode::from_str(val.trim()) {
                Ok(mode) => scrub.masking_mode = Some(mode),
                Err(_) => eprintln!("Warning: Invalid MASKING_MODE '{}', ignoring", val),
            }
        }
        if let Ok(val) = std::env::var("MASKING_CHAR") {
            let mut chars = val.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => scrub.masking_char = Some(c),
                _ => eprintln!("Warning: MASKING_CHAR must be a single character, ignoring"),
            }
        }
        set_parsed("MAX_TEXT_SIZE", &mut scrub.max_text_size);
        set_flag("ENABLE_PREPROCESSING", &mut scrub.enable_preprocessing);

        // Languages
        if let Ok(val) = std::env::var("SUPPORTED_LANGUAGES") {
            scrub.languages.supported = split_list(&val)
                .into_iter()
                .map(|l| l.to_lowercase())
                .collect();
        }
        if let Ok(val) = std::env::var("DEFAULT_LANGUAGE") {
            scrub.languages.default = val.trim().to_lowercase();
        }
        set_flag("AUTO_DETECT_LANGUAGE", &mut scrub.languages.auto_detect);

        // Authentication
        if let Ok(val) = std::env::var("ENABLE_AUTH") {
            scrub.auth.enabled = parse_flag(&val).ok_or_else(|| {
                anyhow::anyhow!("Invalid ENABLE_AUTH '{}': expected true/false", val)
            })?;
        }
        if let Ok(val) = std::env::var("API_USERNAME") {
            scrub.auth.username = Some(val);
        }
        if let Ok(val) = std::env::var("API_PASSWORD") {
            scrub.auth.password = Some(val);
        }
        set_parsed("MIN_PASSWORD_LENGTH", &mut scrub.auth.min_password_length);

        // Rate limiting
        set_flag("RATE_LIMIT_ENABLED", &mut scrub.rate_limit.enabled);
        set_parsed("RATE_LIMIT_PER_MINUTE", &mut scrub.rate_limit.per_minute);
        set_parsed("RATE_LIMIT_BURST", &mut scrub.rate_limit.burst);

        if let Ok(val) = std::env::var("CORS_ORIGINS") {
            scrub.cors.allowed_origins = split_list(&val);
        }

        // Request limits
        set_parsed(
            "MAX_PROCESSING_TIME_MS",
            &mut scrub.limits.max_processing_time_ms,
        );
        set_parsed(
            "MAX_ENTITIES_PER_REQUEST",
            &mut scrub.limits.max_entities_per_request,
        );
        set_parsed("MAX_REQUEST_SIZE", &mut scrub.limits.max_request_body_bytes);

        if let Ok(val) = std::env::var("HASH_KEY")
            && !val.is_empty()
        {
            scrub.hash_key = Some(val);
        }

        Ok(())
    }
}

/// Overwrite `target` from the environment when the variable parses
fn set_parsed<T: FromStr>(name: &str, target: &mut T) {
    if let Ok(val) = std::env::var(name) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => eprintln!("Warning: Invalid {} '{}', ignoring", name, val),
        }
    }
}

/// Case-insensitive `true/1/yes/on` or `false/0/no/off`
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn set_flag(name: &str, target: &mut bool) {
    if let Ok(val) = std::env::var(name) {
        match parse_flag(&val) {
            Some(flag) => *target = flag,
            None => eprintln!("Warning: Invalid {} '{}', ignoring", name, val),
        }
    }
}

/// Comma-separated list, blanks dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
