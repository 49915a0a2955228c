pub mod db;
pub mod error;
pub mod migrations;
pub mod models;

pub use db::{Database, SESSION_KEY, SETTINGS_KEY};
pub use error::StorageError;
pub use models::{
    normalize_domain, BlockRule, BlockedSite, SessionPatch, SessionState, Settings,
    SettingsPatch, SiteType, StorageArea, UiTheme,
};
