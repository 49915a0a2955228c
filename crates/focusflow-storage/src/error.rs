use thiserror::Error;

/// Validation errors raised by the settings and session stores
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("domain must not be empty")]
    EmptyDomain,

    #[error("domain already in list: {0}")]
    DuplicateSite(String),

    #[error("domain not in list: {0}")]
    UnknownSite(String),

    #[error("unknown site type '{0}' (expected focus or permanent)")]
    UnknownSiteType(String),

    #[error("unknown theme '{0}' (expected light, dark or system)")]
    UnknownTheme(String),

    #[error("duration presets must be positive minutes")]
    InvalidPreset,
}
