use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashSet, fmt, str::FromStr, sync::OnceLock};

use crate::error::StorageError;

/// Domains blocked during focus sessions on a fresh install
const DEFAULT_FOCUS_DOMAINS: [&str; 20] = [
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "youtube.com",
    "reddit.com",
    "tiktok.com",
    "snapchat.com",
    "pinterest.com",
    "tumblr.com",
    "twitch.tv",
    "netflix.com",
    "hulu.com",
    "disneyplus.com",
    "amazon.com",
    "ebay.com",
    "etsy.com",
    "linkedin.com",
    "discord.com",
    "9gag.com",
    "buzzfeed.com",
];

const DEFAULT_DURATION_PRESETS: [u32; 4] = [25, 45, 60, 90];

/// Key-value storage area.
///
/// `Sync` holds user preferences, `Local` holds per-machine session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Sync,
    Local,
}

impl StorageArea {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a blocked site is enforced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteType {
    /// Blocked only while a focus session is active
    #[default]
    Focus,
    /// Blocked regardless of session state
    Permanent,
}

impl SiteType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Permanent => "permanent",
        }
    }

    /// Whether a site of this type is blocked for the given session flag
    #[must_use]
    pub const fn is_blocked(self, session_active: bool) -> bool {
        match self {
            Self::Permanent => true,
            Self::Focus => session_active,
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "focus" => Ok(Self::Focus),
            "permanent" => Ok(Self::Permanent),
            other => Err(StorageError::UnknownSiteType(other.to_string())),
        }
    }
}

/// A domain on the user's block list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSite {
    pub url: String,
    #[serde(rename = "type", default)]
    pub site_type: SiteType,
}

impl BlockedSite {
    /// Create a blocked site from user input, normalizing the domain.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::EmptyDomain` if nothing is left after normalization
    pub fn new(url: &str, site_type: SiteType) -> Result<Self, StorageError> {
        let url = normalize_domain(url);
        if url.is_empty() {
            return Err(StorageError::EmptyDomain);
        }
        Ok(Self { url, site_type })
    }
}

fn scheme_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(https?://)?(www\.)?").expect("static pattern is valid"))
}

/// Normalize a user-entered domain: trim, lower-case, strip the scheme,
/// a leading `www.` and trailing slashes.
#[must_use]
pub fn normalize_domain(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let stripped = scheme_prefix().replace(&lowered, "");
    stripped.trim_end_matches('/').to_string()
}

/// UI colour theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    Light,
    Dark,
    #[default]
    System,
}

impl UiTheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for UiTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiTheme {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(StorageError::UnknownTheme(other.to_string())),
        }
    }
}

/// User preferences, stored in the sync area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub blocked_domains: Vec<BlockedSite>,
    pub ui_theme: UiTheme,
    pub duration_presets: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_domains: DEFAULT_FOCUS_DOMAINS
                .iter()
                .map(|domain| BlockedSite {
                    url: (*domain).to_string(),
                    site_type: SiteType::Focus,
                })
                .collect(),
            ui_theme: UiTheme::default(),
            duration_presets: DEFAULT_DURATION_PRESETS.to_vec(),
        }
    }
}

/// Stored block-list entry: the current object shape or a bare domain string
/// written by older versions.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSite {
    Site(BlockedSite),
    Legacy(String),
}

/// One block-list entry; malformed entries are skipped, not fatal to the list
fn stored_site(entry: Value) -> Option<BlockedSite> {
    match serde_json::from_value::<StoredSite>(entry) {
        Ok(StoredSite::Site(site)) => BlockedSite::new(&site.url, site.site_type).ok(),
        Ok(StoredSite::Legacy(url)) => BlockedSite::new(&url, SiteType::Focus).ok(),
        Err(e) => {
            log::warn!("Skipping malformed blocked site entry: {e}");
            None
        }
    }
}

impl Settings {
    /// Build settings from a stored JSON value.
    ///
    /// Each field is read independently; absent or malformed fields fall back
    /// to their defaults.
    #[must_use]
    pub fn from_stored(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(map) = value.as_object() else {
            log::warn!("Stored settings are not an object, using defaults");
            return defaults;
        };

        let blocked_domains = field::<Vec<Value>>(map, "blockedDomains")
            .map_or(defaults.blocked_domains, |stored| {
                dedup_sites(stored.into_iter().filter_map(stored_site))
            });

        let duration_presets = field::<Vec<u32>>(map, "durationPresets")
            .filter(|presets| presets.iter().all(|minutes| *minutes > 0))
            .unwrap_or(defaults.duration_presets);

        Self {
            blocked_domains,
            ui_theme: field(map, "uiTheme").unwrap_or(defaults.ui_theme),
            duration_presets,
        }
    }

    /// Shallow-merge `patch` over these settings
    #[must_use]
    pub fn merged(self, patch: SettingsPatch) -> Self {
        Self {
            blocked_domains: patch.blocked_domains.unwrap_or(self.blocked_domains),
            ui_theme: patch.ui_theme.unwrap_or(self.ui_theme),
            duration_presets: patch.duration_presets.unwrap_or(self.duration_presets),
        }
    }

    /// Find a site by (normalized) domain
    #[must_use]
    pub fn find_site(&self, url: &str) -> Option<&BlockedSite> {
        let normalized = normalize_domain(url);
        self.blocked_domains.iter().find(|s| s.url == normalized)
    }
}

/// Partial settings update; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_domains: Option<Vec<BlockedSite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_theme: Option<UiTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_presets: Option<Vec<u32>>,
}

/// Focus session state, stored in the local area
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub active: bool,
    /// Only meaningful while `active`
    pub ends_at_epoch_ms: i64,
    /// Only meaningful while `active`
    pub active_rule_ids: Vec<u32>,
}

impl SessionState {
    #[must_use]
    pub fn from_stored(value: &Value) -> Self {
        let defaults = Self::default();
        let Some(map) = value.as_object() else {
            log::warn!("Stored session is not an object, using defaults");
            return defaults;
        };

        Self {
            active: field(map, "active").unwrap_or(defaults.active),
            ends_at_epoch_ms: field(map, "endsAtEpochMs").unwrap_or(defaults.ends_at_epoch_ms),
            active_rule_ids: field(map, "activeRuleIds").unwrap_or(defaults.active_rule_ids),
        }
    }

    #[must_use]
    pub fn merged(self, patch: SessionPatch) -> Self {
        Self {
            active: patch.active.unwrap_or(self.active),
            ends_at_epoch_ms: patch.ends_at_epoch_ms.unwrap_or(self.ends_at_epoch_ms),
            active_rule_ids: patch.active_rule_ids.unwrap_or(self.active_rule_ids),
        }
    }

    /// Milliseconds left in the session at `now_ms`, zero when inactive or expired
    #[must_use]
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        if self.active {
            (self.ends_at_epoch_ms - now_ms).max(0)
        } else {
            0
        }
    }

    /// Active but past its end time
    #[must_use]
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.active && now_ms >= self.ends_at_epoch_ms
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at_epoch_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_rule_ids: Option<Vec<u32>>,
}

/// Redirect rule installed in the rule engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    pub id: u32,
    pub priority: u32,
    /// Domain anchor pattern, e.g. `||reddit.com`
    pub url_filter: String,
    pub redirect_url: String,
    pub main_frame_only: bool,
}

fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring malformed stored field '{key}': {e}");
            None
        }
    }
}

fn dedup_sites(sites: impl Iterator<Item = BlockedSite>) -> Vec<BlockedSite> {
    let mut seen = HashSet::new();
    sites.filter(|site| seen.insert(site.url.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_domain_strips_scheme_and_www() {
        assert_eq!(normalize_domain("https://www.Reddit.com/"), "reddit.com");
        assert_eq!(normalize_domain("http://news.ycombinator.com"), "news.ycombinator.com");
        assert_eq!(normalize_domain("  www.youtube.com "), "youtube.com");
        assert_eq!(normalize_domain("twitch.tv"), "twitch.tv");
    }

    #[test]
    fn test_normalize_domain_keeps_inner_www() {
        assert_eq!(normalize_domain("docs.www.example.com"), "docs.www.example.com");
    }

    #[test]
    fn test_blocked_site_rejects_empty() {
        assert_eq!(
            BlockedSite::new("https://www.", SiteType::Focus),
            Err(StorageError::EmptyDomain)
        );
    }

    #[test]
    fn test_site_type_blocking_policy() {
        assert!(SiteType::Permanent.is_blocked(false));
        assert!(SiteType::Permanent.is_blocked(true));
        assert!(!SiteType::Focus.is_blocked(false));
        assert!(SiteType::Focus.is_blocked(true));
    }

    #[test]
    fn test_site_type_parse() {
        assert_eq!("Permanent".parse::<SiteType>(), Ok(SiteType::Permanent));
        assert_eq!(
            "sometimes".parse::<SiteType>(),
            Err(StorageError::UnknownSiteType("sometimes".to_string()))
        );
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.blocked_domains.len(), 20);
        assert!(settings
            .blocked_domains
            .iter()
            .all(|s| s.site_type == SiteType::Focus));
        assert_eq!(settings.ui_theme, UiTheme::System);
        assert_eq!(settings.duration_presets, vec![25, 45, 60, 90]);
    }

    #[test]
    fn test_settings_from_partial_value() {
        let stored = json!({ "uiTheme": "dark" });
        let settings = Settings::from_stored(&stored);
        assert_eq!(settings.ui_theme, UiTheme::Dark);
        assert_eq!(settings.blocked_domains, Settings::default().blocked_domains);
        assert_eq!(settings.duration_presets, vec![25, 45, 60, 90]);
    }

    #[test]
    fn test_settings_from_legacy_string_list() {
        let stored = json!({
            "blockedDomains": ["www.reddit.com", { "url": "x.com", "type": "permanent" }],
        });
        let settings = Settings::from_stored(&stored);
        assert_eq!(
            settings.blocked_domains,
            vec![
                BlockedSite { url: "reddit.com".to_string(), site_type: SiteType::Focus },
                BlockedSite { url: "x.com".to_string(), site_type: SiteType::Permanent },
            ]
        );
    }

    #[test]
    fn test_malformed_site_entry_keeps_the_rest() {
        let stored = json!({
            "blockedDomains": [
                { "url": "mysite.com", "type": "permanent" },
                { "url": "other.com", "type": "sometimes" },
                7,
                "legacy.com",
            ],
        });
        let settings = Settings::from_stored(&stored);
        assert_eq!(
            settings.blocked_domains,
            vec![
                BlockedSite { url: "mysite.com".to_string(), site_type: SiteType::Permanent },
                BlockedSite { url: "legacy.com".to_string(), site_type: SiteType::Focus },
            ]
        );

        let not_a_list = Settings::from_stored(&json!({ "blockedDomains": "reddit.com" }));
        assert_eq!(not_a_list.blocked_domains, Settings::default().blocked_domains);
    }

    #[test]
    fn test_settings_from_garbage_falls_back() {
        assert_eq!(Settings::from_stored(&json!(42)), Settings::default());

        let stored = json!({ "uiTheme": "neon", "durationPresets": [25, 0] });
        let settings = Settings::from_stored(&stored);
        assert_eq!(settings.ui_theme, UiTheme::System);
        assert_eq!(settings.duration_presets, vec![25, 45, 60, 90]);
    }

    #[test]
    fn test_settings_from_stored_drops_duplicates() {
        let stored = json!({
            "blockedDomains": ["reddit.com", "https://reddit.com", { "url": "reddit.com", "type": "permanent" }],
        });
        let settings = Settings::from_stored(&stored);
        assert_eq!(settings.blocked_domains.len(), 1);
        assert_eq!(settings.blocked_domains[0].site_type, SiteType::Focus);
    }

    #[test]
    fn test_settings_merge_is_shallow() {
        let patch = SettingsPatch {
            duration_presets: Some(vec![10]),
            ..SettingsPatch::default()
        };
        let merged = Settings::default().merged(patch);
        assert_eq!(merged.duration_presets, vec![10]);
        assert_eq!(merged.blocked_domains.len(), 20);
    }

    #[test]
    fn test_settings_serialize_uses_camel_case() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("blockedDomains").is_some());
        assert_eq!(json["blockedDomains"][0]["type"], "focus");
        assert_eq!(json["uiTheme"], "system");
    }

    #[test]
    fn test_session_from_stored_and_remaining() {
        let stored = json!({ "active": true, "endsAtEpochMs": 10_000 });
        let session = SessionState::from_stored(&stored);
        assert!(session.active);
        assert!(session.active_rule_ids.is_empty());
        assert_eq!(session.remaining_ms(4_000), 6_000);
        assert_eq!(session.remaining_ms(12_000), 0);
        assert!(session.is_expired(10_000));
        assert!(!session.is_expired(9_999));
    }

    #[test]
    fn test_inactive_session_has_no_remaining_time() {
        let session = SessionState {
            active: false,
            ends_at_epoch_ms: 50_000,
            active_rule_ids: vec![1000],
        };
        assert_eq!(session.remaining_ms(0), 0);
        assert!(!session.is_expired(60_000));
    }
}
