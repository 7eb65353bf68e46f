// Configuration loading and parsing (pairpick.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// pairpick.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pairpick.toml file.
#[derive(Debug, Clone, Deserialize)]
struct PairpickFile {
    api: ApiConfig,
    session: SessionConfig,
}

/// Where candidate batches come from.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root URL of the ranking API, without the trailing `/users/...` path.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout_secs: u64,
    /// Batch size requested on each refill.
    pub batch_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Poll the console starts on.
    pub default_poll: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub api_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/pairpick.toml` and
/// (optionally) `config/credentials.toml`, both relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- pairpick.toml (required) ---
    let main_path = config_dir.join("pairpick.toml");
    let main_text = read_file(&main_path)?;
    let main_file: PairpickFile =
        toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
            path: main_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        api: main_file.api,
        session: main_file.session,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the crate directory or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // User-edited file wins.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    match reqwest::Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ConfigError::ValidationError {
                field: "api.base_url".into(),
                message: format!("scheme must be http or https, got {}", url.scheme()),
            });
        }
        Err(e) => {
            return Err(ConfigError::ValidationError {
                field: "api.base_url".into(),
                message: format!("not a valid URL: {e}"),
            });
        }
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.api.batch_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.batch_limit".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.session.default_poll.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "session.default_poll".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID_MAIN: &str = r#"
[api]
base_url = "http://localhost:8000"
timeout_secs = 10
batch_limit = 20

[session]
default_poll = "videos"
"#;

    /// Helper: a fresh scratch directory with an empty `config/` inside.
    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("pairpick_config_{name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_main(base: &Path, content: &str) {
        fs::write(base.join("config/pairpick.toml"), content).unwrap();
    }

    fn expect_validation_error(base: &Path, field: &str) {
        match load_config_from(base) {
            Err(ConfigError::ValidationError { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected ValidationError for {field}, got {other:?}"),
        }
    }

    #[test]
    fn load_valid_config() {
        let tmp = scratch_dir("valid");
        write_main(&tmp, VALID_MAIN);

        let config = load_config_from(&tmp).expect("should load valid config");
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.api.batch_limit, 20);
        assert_eq!(config.session.default_poll, "videos");
        assert!(config.credentials.api_token.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn shipped_defaults_are_valid() {
        let tmp = scratch_dir("shipped_defaults");
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("defaults/pairpick.toml");
        fs::copy(shipped, tmp.join("config/pairpick.toml")).unwrap();

        let config = load_config_from(&tmp).expect("shipped defaults should validate");
        assert_eq!(config.session.default_poll, "videos");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_with_token() {
        let tmp = scratch_dir("with_creds");
        write_main(&tmp, VALID_MAIN);
        fs::write(
            tmp.join("config/credentials.toml"),
            "api_token = \"secret-token\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.credentials.api_token.as_deref(), Some("secret-token"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_bad_base_url() {
        let tmp = scratch_dir("bad_url");
        write_main(
            &tmp,
            &VALID_MAIN.replace("http://localhost:8000", "not a url"),
        );
        expect_validation_error(&tmp, "api.base_url");

        write_main(
            &tmp,
            &VALID_MAIN.replace("http://localhost:8000", "ftp://example.org"),
        );
        expect_validation_error(&tmp, "api.base_url");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = scratch_dir("zero_timeout");
        write_main(&tmp, &VALID_MAIN.replace("timeout_secs = 10", "timeout_secs = 0"));
        expect_validation_error(&tmp, "api.timeout_secs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_batch_limit() {
        let tmp = scratch_dir("zero_batch");
        write_main(&tmp, &VALID_MAIN.replace("batch_limit = 20", "batch_limit = 0"));
        expect_validation_error(&tmp, "api.batch_limit");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_blank_default_poll() {
        let tmp = scratch_dir("blank_poll");
        write_main(
            &tmp,
            &VALID_MAIN.replace("default_poll = \"videos\"", "default_poll = \"  \""),
        );
        expect_validation_error(&tmp, "session.default_poll");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_main_toml() {
        let tmp = scratch_dir("missing_main");
        match load_config_from(&tmp) {
            Err(ConfigError::FileNotFound { path }) => {
                assert!(path.ends_with("pairpick.toml"));
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = scratch_dir("invalid_toml");
        write_main(&tmp, "[api\nbase_url = ");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("pairpick_config_ensure_copy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults/pairpick.toml"), VALID_MAIN).unwrap();
        fs::write(tmp.join("defaults/credentials.toml.example"), "api_token = \"\"\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/pairpick.toml")]);
        assert!(!tmp.join("config/credentials.toml.example").exists());

        // Second run leaves the existing copy alone.
        fs::write(tmp.join("config/pairpick.toml"), "# edited\n").unwrap();
        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config/pairpick.toml")).unwrap(),
            "# edited\n"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("pairpick_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));

        let _ = fs::remove_dir_all(&tmp);
    }
}
