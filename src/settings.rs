use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::gate::{HeaderPolicy, SessionCheck, SessionCheckMode};
use crate::rules::{
    DEFAULT_ARCHIVER_SIGNATURES, DEFAULT_ASSETS_PREFIX, DEFAULT_BYPASS_PATHS,
    DEFAULT_CHALLENGE_PATH, DEFAULT_STATIC_EXTENSIONS,
};
use crate::session::cookie::{DEFAULT_COOKIE_MAX_AGE_HOURS, MAX_COOKIE_MAX_AGE_HOURS};
use crate::utils::crypto::generate_secret;
use crate::verification::TURNSTILE_VERIFY_URL;

/// Largest token age `chrono::Duration` can hold, in hours
const MAX_TOKEN_AGE_HOURS: i64 = i64::MAX / 3_600_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: basic_toml::Error,
    },
    #[error("{0} must be set in production")]
    MissingSecret(&'static str),
    #[error("cookie_max_age_hours must be between 1 and {max}, got {0}", max = MAX_COOKIE_MAX_AGE_HOURS)]
    InvalidCookieMaxAge(u64),
    #[error("failed to initialize logger: {0}")]
    Logger(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GateSettings {
    pub application: ApplicationSettings,
    pub proxy: ProxySettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub verification: VerificationSettings,
    pub rules: RulesSettings,
    pub origin: OriginSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub upstream_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    /// Lifetime of the session cookie in the client's jar
    pub cookie_max_age_hours: u64,
    /// How the edge checks the session cookie
    pub check_mode: SessionCheckMode,
    /// Server-side token age limit in signed mode. 0 disables it.
    pub max_token_age_hours: u64,
}

/// Off by default so plain-HTTP development hosts keep the cookie;
/// [`GateSettings::finalize`] forces it on in production
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    pub secret_key: String,
    pub verify_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSettings {
    pub bypass_paths: Vec<String>,
    pub static_extensions: Vec<String>,
    pub archiver_signatures: Vec<String>,
    pub assets_prefix: String,
    pub challenge_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginSettings {
    pub header_policy: HeaderPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            upstream_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty outside production
            cookie_max_age_hours: DEFAULT_COOKIE_MAX_AGE_HOURS,
            check_mode: SessionCheckMode::Presence,
            max_token_age_hours: 0,
        }
    }
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            verify_url: TURNSTILE_VERIFY_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for RulesSettings {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(ToString::to_string).collect()
        }
        Self {
            bypass_paths: owned(DEFAULT_BYPASS_PATHS),
            static_extensions: owned(DEFAULT_STATIC_EXTENSIONS),
            archiver_signatures: owned(DEFAULT_ARCHIVER_SIGNATURES),
            assets_prefix: DEFAULT_ASSETS_PREFIX.to_string(),
            challenge_path: DEFAULT_CHALLENGE_PATH.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GateSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - A settings file cannot be read or parsed
    /// - A required secret is missing in production
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::init_logger(&settings.logging)?;

        settings.finalize()?;
        Ok(settings)
    }

    fn init_logger(logging: &LoggingSettings) -> Result<(), SettingsError> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&logging.level))
            .try_init()
            .map_err(|e| SettingsError::Logger(e.to_string()))
    }

    /// Load base settings from TOML file(s) or use defaults
    ///
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `WARDGATE_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("WARDGATE_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ WARDGATE_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file; missing sections fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: display.clone(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: display,
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);

        if let Ok(upstream_url) = std::env::var("UPSTREAM_URL") {
            settings.proxy.upstream_url = upstream_url;
        }

        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_verification_env_overrides(&mut settings.verification);

        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                settings.cookies.secure = cookie_secure;
            }
        }

        if let Ok(policy) = std::env::var("ORIGIN_HEADER_POLICY") {
            match policy.as_str() {
                "passed_only" => settings.origin.header_policy = HeaderPolicy::PassedOnly,
                "all_responses" => settings.origin.header_policy = HeaderPolicy::AllResponses,
                other => eprintln!("⚠️  Ignoring unknown ORIGIN_HEADER_POLICY '{other}'"),
            }
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            settings.logging.level = log_level;
        }
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(env) = std::env::var("APP_ENV") {
            app_settings.environment = if env.eq_ignore_ascii_case("production") {
                Environment::Production
            } else {
                Environment::Development
            };
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            if !secret.is_empty() {
                session_settings.session_secret = secret;
            }
        }
        Self::apply_numeric_env_override(
            "SESSION_COOKIE_MAX_AGE_HOURS",
            &mut session_settings.cookie_max_age_hours,
        );
        Self::apply_numeric_env_override(
            "SESSION_MAX_TOKEN_AGE_HOURS",
            &mut session_settings.max_token_age_hours,
        );
        if let Ok(mode) = std::env::var("SESSION_CHECK_MODE") {
            match mode.as_str() {
                "presence" => session_settings.check_mode = SessionCheckMode::Presence,
                "signed" => session_settings.check_mode = SessionCheckMode::Signed,
                other => eprintln!("⚠️  Ignoring unknown SESSION_CHECK_MODE '{other}'"),
            }
        }
    }

    fn apply_verification_env_overrides(verification: &mut VerificationSettings) {
        if let Ok(secret) = std::env::var("CLOUDFLARE_TURNSTILE_SECRET_KEY") {
            verification.secret_key = secret;
        }
        if let Ok(url) = std::env::var("TURNSTILE_VERIFY_URL") {
            verification.verify_url = url;
        }
        Self::apply_numeric_env_override(
            "VERIFICATION_TIMEOUT_SECONDS",
            &mut verification.timeout_seconds,
        );
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Enforce production requirements and fill development fallbacks
    ///
    /// # Errors
    ///
    /// - [`SettingsError::InvalidCookieMaxAge`] if the cookie lifetime is zero
    ///   or longer than browsers keep cookies
    /// - [`SettingsError::MissingSecret`] if a secret is empty in production
    pub fn finalize(&mut self) -> Result<(), SettingsError> {
        let max_age = self.session.cookie_max_age_hours;
        if max_age == 0 || max_age > MAX_COOKIE_MAX_AGE_HOURS {
            return Err(SettingsError::InvalidCookieMaxAge(max_age));
        }

        if self.is_production() {
            if self.session.session_secret.is_empty() {
                return Err(SettingsError::MissingSecret("SESSION_SECRET"));
            }
            if self.verification.secret_key.is_empty() {
                return Err(SettingsError::MissingSecret(
                    "CLOUDFLARE_TURNSTILE_SECRET_KEY",
                ));
            }
            self.cookies.secure = true;
            return Ok(());
        }

        if self.session.session_secret.is_empty() {
            self.session.session_secret = generate_secret();
            Self::warn_about_generated_secret();
        }
        if self.verification.secret_key.is_empty() {
            log::warn!("No verification secret configured; every challenge will be rejected");
        }
        Ok(())
    }

    /// Display warnings about using a generated session secret
    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 Issued sessions will stop verifying after a restart");
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.application.environment == Environment::Production
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Session check the edge gate should run
    #[must_use]
    pub fn session_check(&self) -> SessionCheck {
        match self.session.check_mode {
            SessionCheckMode::Presence => SessionCheck::Presence,
            SessionCheckMode::Signed => SessionCheck::Signed {
                secret: Arc::from(self.session.session_secret.as_bytes()),
                max_age: match self.session.max_token_age_hours {
                    0 => None,
                    hours => Some(chrono::Duration::hours(
                        i64::try_from(hours)
                            .unwrap_or(MAX_TOKEN_AGE_HOURS)
                            .min(MAX_TOKEN_AGE_HOURS),
                    )),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "SESSION_SECRET",
            "SESSION_COOKIE_MAX_AGE_HOURS",
            "SESSION_MAX_TOKEN_AGE_HOURS",
            "SESSION_CHECK_MODE",
            "CLOUDFLARE_TURNSTILE_SECRET_KEY",
            "TURNSTILE_VERIFY_URL",
            "ORIGIN_HEADER_POLICY",
            "APP_ENV",
            "WARDGATE_SECRETS_DIR",
            "COOKIE_SECURE",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = GateSettings::default();
        assert_eq!(settings.session.session_secret, "");
        assert_eq!(settings.session.cookie_max_age_hours, 24);
        assert_eq!(settings.session.check_mode, SessionCheckMode::Presence);
        assert_eq!(settings.origin.header_policy, HeaderPolicy::PassedOnly);
        assert_eq!(settings.verification.verify_url, TURNSTILE_VERIFY_URL);
        assert_eq!(settings.rules.challenge_path, "/challenge");
        assert!(settings.rules.archiver_signatures.contains(&"curl/".to_string()));
        assert!(!settings.cookies.secure);
        assert!(!settings.is_production());
    }

    #[test]
    #[serial]
    fn test_session_env_overrides() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_secret: "file-secret".to_string(),
            ..Default::default()
        };

        std::env::set_var("SESSION_SECRET", "env-override-secret");
        std::env::set_var("SESSION_CHECK_MODE", "signed");
        std::env::set_var("SESSION_MAX_TOKEN_AGE_HOURS", "12");

        GateSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.session_secret, "env-override-secret");
        assert_eq!(session_settings.check_mode, SessionCheckMode::Signed);
        assert_eq!(session_settings.max_token_age_hours, 12);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_empty_env_secret_does_not_clear_configured_secret() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_secret: "file-secret".to_string(),
            ..Default::default()
        };
        std::env::set_var("SESSION_SECRET", "");
        GateSettings::apply_session_env_overrides(&mut session_settings);
        assert_eq!(session_settings.session_secret, "file-secret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_environment_and_policy_overrides() {
        clean_env_vars();

        std::env::set_var("APP_ENV", "production");
        std::env::set_var("ORIGIN_HEADER_POLICY", "all_responses");
        std::env::set_var("CLOUDFLARE_TURNSTILE_SECRET_KEY", "turnstile-secret");

        let mut settings = GateSettings::default();
        GateSettings::apply_env_overrides(&mut settings);

        assert!(settings.is_production());
        assert_eq!(settings.origin.header_policy, HeaderPolicy::AllResponses);
        assert_eq!(settings.verification.secret_key, "turnstile-secret");

        clean_env_vars();
    }

    #[test]
    fn test_production_requires_secrets() {
        let mut settings = GateSettings::default();
        settings.application.environment = Environment::Production;
        settings.verification.secret_key = "turnstile".to_string();
        assert!(matches!(
            settings.finalize(),
            Err(SettingsError::MissingSecret("SESSION_SECRET"))
        ));

        settings.session.session_secret = "session".to_string();
        settings.verification.secret_key = String::new();
        assert!(matches!(
            settings.finalize(),
            Err(SettingsError::MissingSecret("CLOUDFLARE_TURNSTILE_SECRET_KEY"))
        ));

        settings.verification.secret_key = "turnstile".to_string();
        settings.cookies.secure = false;
        assert!(settings.finalize().is_ok());
        assert!(settings.cookies.secure, "production forces secure cookies");
    }

    #[test]
    fn test_development_leaves_cookies_insecure_unless_asked() {
        let mut settings = GateSettings::default();
        settings.finalize().unwrap();
        assert!(!settings.cookies.secure);

        let mut settings = GateSettings::default();
        settings.cookies.secure = true;
        settings.finalize().unwrap();
        assert!(settings.cookies.secure);
    }

    #[test]
    #[serial]
    fn test_cookie_secure_env_override() {
        clean_env_vars();
        std::env::set_var("COOKIE_SECURE", "true");

        let mut settings = GateSettings::default();
        GateSettings::apply_env_overrides(&mut settings);
        settings.finalize().unwrap();
        assert!(settings.cookies.secure);

        clean_env_vars();
    }

    #[test]
    fn test_unusable_cookie_max_age_is_rejected() {
        for hours in [0, MAX_COOKIE_MAX_AGE_HOURS + 1, 9_000_000_000_000_000] {
            let mut settings = GateSettings::default();
            settings.session.cookie_max_age_hours = hours;
            assert!(
                matches!(settings.finalize(), Err(SettingsError::InvalidCookieMaxAge(h)) if h == hours),
                "{hours}h should be rejected"
            );
        }

        let mut settings = GateSettings::default();
        settings.session.cookie_max_age_hours = MAX_COOKIE_MAX_AGE_HOURS;
        assert!(settings.finalize().is_ok());
    }

    #[test]
    #[serial]
    fn test_huge_cookie_max_age_from_env_is_rejected() {
        clean_env_vars();
        std::env::set_var("SESSION_COOKIE_MAX_AGE_HOURS", "9000000000000000");

        let mut settings = GateSettings::default();
        GateSettings::apply_env_overrides(&mut settings);
        assert!(matches!(
            settings.finalize(),
            Err(SettingsError::InvalidCookieMaxAge(9_000_000_000_000_000))
        ));

        clean_env_vars();
    }

    #[test]
    fn test_development_generates_session_secret() {
        let mut first = GateSettings::default();
        let mut second = GateSettings::default();
        first.finalize().unwrap();
        second.finalize().unwrap();

        assert!(first.session.session_secret.len() > 40);
        assert_ne!(first.session.session_secret, second.session.session_secret);
    }

    #[test]
    fn test_from_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[application]
port = 9090

[session]
session_secret = "from-file"
check_mode = "signed"

[rules]
archiver_signatures = ["MirrorBot"]

[origin]
header_policy = "all_responses"
"#
        )
        .unwrap();

        let settings = GateSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.application.port, 9090);
        assert_eq!(settings.application.host, "0.0.0.0");
        assert_eq!(settings.session.session_secret, "from-file");
        assert_eq!(settings.session.check_mode, SessionCheckMode::Signed);
        assert_eq!(settings.session.cookie_max_age_hours, 24);
        assert_eq!(settings.rules.archiver_signatures, vec!["MirrorBot"]);
        assert_eq!(settings.rules.challenge_path, "/challenge");
        assert_eq!(settings.origin.header_policy, HeaderPolicy::AllResponses);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session\nsession_secret = ").unwrap();
        assert!(matches!(
            GateSettings::from_file(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_session_check_from_settings() {
        let mut settings = GateSettings::default();
        assert!(matches!(settings.session_check(), SessionCheck::Presence));

        settings.session.check_mode = SessionCheckMode::Signed;
        settings.session.session_secret = "secret".to_string();
        settings.session.max_token_age_hours = 2;
        match settings.session_check() {
            SessionCheck::Signed { secret, max_age } => {
                assert_eq!(&*secret, b"secret");
                assert_eq!(max_age, Some(chrono::Duration::hours(2)));
            }
            SessionCheck::Presence => panic!("expected signed check"),
        }
    }
}
