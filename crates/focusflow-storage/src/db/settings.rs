use anyhow::Result;

use super::Database;
use crate::error::StorageError;
use crate::models::{BlockedSite, Settings, SettingsPatch, SiteType, StorageArea};

pub const SETTINGS_KEY: &str = "settings";

impl Database {
    // ==================== Settings Methods ====================

    /// Get settings, filling absent fields from defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub fn get_settings(&self) -> Result<Settings> {
        Ok(self
            .get_value(StorageArea::Sync, SETTINGS_KEY)?
            .map_or_else(Settings::default, |value| Settings::from_stored(&value)))
    }

    /// Merge `patch` over the current settings and persist the result
    ///
    /// # Errors
    ///
    /// Returns an error if the patch holds a non-positive preset or the write fails
    pub fn set_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        if let Some(presets) = &patch.duration_presets {
            if presets.iter().any(|minutes| *minutes == 0) {
                return Err(StorageError::InvalidPreset.into());
            }
        }

        let merged = self.get_settings()?.merged(patch);
        self.set_value(
            StorageArea::Sync,
            SETTINGS_KEY,
            &serde_json::to_value(&merged)?,
        )?;
        Ok(merged)
    }

    /// Append a site to the block list
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is empty, already listed, or the write fails
    pub fn add_site(&self, url: &str, site_type: SiteType) -> Result<BlockedSite> {
        let site = BlockedSite::new(url, site_type)?;
        let mut settings = self.get_settings()?;
        if settings.find_site(&site.url).is_some() {
            return Err(StorageError::DuplicateSite(site.url).into());
        }

        settings.blocked_domains.push(site.clone());
        self.set_settings(SettingsPatch {
            blocked_domains: Some(settings.blocked_domains),
            ..SettingsPatch::default()
        })?;
        log::info!("Added {} site: {}", site.site_type, site.url);
        Ok(site)
    }

    /// Remove a site from the block list, returning whether it was present
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub fn remove_site(&self, url: &str) -> Result<bool> {
        let mut settings = self.get_settings()?;
        let Some(target) = settings.find_site(url).map(|s| s.url.clone()) else {
            return Ok(false);
        };

        settings.blocked_domains.retain(|s| s.url != target);
        self.set_settings(SettingsPatch {
            blocked_domains: Some(settings.blocked_domains),
            ..SettingsPatch::default()
        })?;
        log::info!("Removed site: {target}");
        Ok(true)
    }

    /// Change whether a listed site is blocked always or only during sessions
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not listed or the write fails
    pub fn set_site_type(&self, url: &str, site_type: SiteType) -> Result<()> {
        let mut settings = self.get_settings()?;
        let target = settings.find_site(url).map(|s| s.url.clone());
        let Some(target) = target else {
            return Err(StorageError::UnknownSite(url.to_string()).into());
        };

        for site in &mut settings.blocked_domains {
            if site.url == target {
                site.site_type = site_type;
            }
        }
        self.set_settings(SettingsPatch {
            blocked_domains: Some(settings.blocked_domains),
            ..SettingsPatch::default()
        })?;
        Ok(())
    }
}
