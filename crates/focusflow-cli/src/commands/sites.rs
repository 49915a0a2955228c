//! Block list commands

use anyhow::Result;
use focusflow_storage::{BlockedSite, Database, SiteType};
use std::path::Path;
use tabled::{Table, Tabled};

use super::helpers::{notify_settings_changed, truncate_str};

const MAX_DOMAIN_CHARS: usize = 40;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Type")]
    site_type: String,
    #[tabled(rename = "Blocked")]
    blocked: &'static str,
}

fn site_rows(sites: &[BlockedSite]) -> Vec<SiteRow> {
    sites
        .iter()
        .enumerate()
        .map(|(i, site)| SiteRow {
            index: i + 1,
            domain: truncate_str(&site.url, MAX_DOMAIN_CHARS),
            site_type: site.site_type.to_string(),
            blocked: match site.site_type {
                SiteType::Focus => "during sessions",
                SiteType::Permanent => "always",
            },
        })
        .collect()
}

/// # Errors
///
/// Returns an error if the settings cannot be read
pub fn list_sites() -> Result<()> {
    let settings = Database::new(None)?.get_settings()?;

    if settings.blocked_domains.is_empty() {
        println!("No blocked sites. Add one with: focusflow sites add <domain>");
        return Ok(());
    }

    println!("\nBlocked Sites");
    println!("{}", "=".repeat(40));
    println!("{}", Table::new(site_rows(&settings.blocked_domains)));
    Ok(())
}

/// # Errors
///
/// Returns an error if the domain is empty or already listed, or the write fails
pub async fn add_site(data_dir: &Path, domain: &str, site_type: SiteType) -> Result<()> {
    let site = Database::new(None)?.add_site(domain, site_type)?;
    println!("Added {} ({})", site.url, site.site_type);
    notify_settings_changed(data_dir).await;
    Ok(())
}

/// # Errors
///
/// Returns an error if the write fails
pub async fn remove_site(data_dir: &Path, domain: &str) -> Result<()> {
    if Database::new(None)?.remove_site(domain)? {
        println!("Removed {domain}");
        notify_settings_changed(data_dir).await;
    } else {
        println!("{domain} is not on the block list");
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the site is not listed or the write fails
pub async fn set_site_type(data_dir: &Path, domain: &str, site_type: SiteType) -> Result<()> {
    Database::new(None)?.set_site_type(domain, site_type)?;
    println!("{domain} is now a {site_type} site");
    notify_settings_changed(data_dir).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_rows() {
        let sites = vec![
            BlockedSite::new("reddit.com", SiteType::Focus).unwrap(),
            BlockedSite::new("youtube.com", SiteType::Permanent).unwrap(),
        ];
        let rows = site_rows(&sites);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].domain, "reddit.com");
        assert_eq!(rows[0].blocked, "during sessions");
        assert_eq!(rows[1].site_type, "permanent");
        assert_eq!(rows[1].blocked, "always");
    }

    #[test]
    fn test_table_renders_headers() {
        let sites = vec![BlockedSite::new("x.com", SiteType::Focus).unwrap()];
        let table = Table::new(site_rows(&sites)).to_string();
        assert!(table.contains("Domain"));
        assert!(table.contains("x.com"));
    }
}
