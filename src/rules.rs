//! Shared gating rules
//!
//! A single [`RuleSet`] is built at startup and handed to both the edge and the
//! origin gate, so the two tiers can never disagree about which paths bypass
//! the gate or which user agents count as archivers.

use crate::settings::RulesSettings;

/// Paths that skip the human-verification gate entirely
pub const DEFAULT_BYPASS_PATHS: &[&str] = &[
    "/challenge",
    "/api/verify-session",
    "/_nuxt",
    "/favicon.ico",
    "/robots.txt",
    "/_robots.txt",
    "/__nuxt",
];

/// File extensions that are always served without gating
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    ".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico", ".css", ".js", ".woff", ".woff2",
    ".ttf", ".map", ".wasm",
];

/// Lowercase user-agent fragments of known crawlers and archivers
pub const DEFAULT_ARCHIVER_SIGNATURES: &[&str] = &[
    "ia_archiver",
    "archive.org_bot",
    "wayback",
    "httrack",
    "wget/1",
    "curl/",
    "python-requests",
    "go-http-client",
    "scrapy",
    "phantomjs",
    "headlesschrome",
];

/// Build-asset directory the edge intercept point never runs on
pub const DEFAULT_ASSETS_PREFIX: &str = "/_nuxt/";

/// Page that hosts the human-verification widget
pub const DEFAULT_CHALLENGE_PATH: &str = "/challenge";

/// Immutable rule lists consulted by every gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    bypass_paths: Vec<String>,
    static_extensions: Vec<String>,
    archiver_signatures: Vec<String>,
    assets_prefix: String,
    challenge_path: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_settings(&RulesSettings::default())
    }
}

impl RuleSet {
    /// Build a rule set. Archiver signatures are lowercased so matching can
    /// run against a lowercased user agent.
    #[must_use]
    pub fn new(
        bypass_paths: Vec<String>,
        static_extensions: Vec<String>,
        archiver_signatures: Vec<String>,
        assets_prefix: String,
        challenge_path: String,
    ) -> Self {
        Self {
            bypass_paths,
            static_extensions,
            archiver_signatures: archiver_signatures
                .into_iter()
                .map(|sig| sig.to_lowercase())
                .filter(|sig| !sig.is_empty())
                .collect(),
            assets_prefix,
            challenge_path,
        }
    }

    /// Build the rule set from the `[rules]` settings section
    #[must_use]
    pub fn from_settings(settings: &RulesSettings) -> Self {
        Self::new(
            settings.bypass_paths.clone(),
            settings.static_extensions.clone(),
            settings.archiver_signatures.clone(),
            settings.assets_prefix.clone(),
            settings.challenge_path.clone(),
        )
    }

    #[must_use]
    pub fn is_static_asset(&self, path: &str) -> bool {
        self.static_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    #[must_use]
    pub fn is_bypass_path(&self, path: &str) -> bool {
        self.bypass_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Check a user agent against the archiver signatures, ignoring case.
    /// An empty user agent never matches.
    #[must_use]
    pub fn is_archiver(&self, user_agent: &str) -> bool {
        if user_agent.is_empty() {
            return false;
        }
        let ua_lower = user_agent.to_lowercase();
        self.archiver_signatures
            .iter()
            .any(|sig| ua_lower.contains(sig.as_str()))
    }

    /// Whether the edge intercept point runs at all for this path.
    ///
    /// Excludes the assets prefix, `favicon.ico` and every static extension,
    /// matching the exclusion expression the edge is deployed with.
    #[must_use]
    pub fn is_intercepted(&self, path: &str) -> bool {
        let relative = path.trim_start_matches('/');
        let assets = self.assets_prefix.trim_start_matches('/');

        if !assets.is_empty() && relative.starts_with(assets) {
            return false;
        }
        if relative.starts_with("favicon.ico") {
            return false;
        }
        !self.is_static_asset(path)
    }

    #[must_use]
    pub fn challenge_path(&self) -> &str {
        &self.challenge_path
    }

    #[must_use]
    pub fn archiver_signatures(&self) -> &[String] {
        &self.archiver_signatures
    }
}
