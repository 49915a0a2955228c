//! The blocked page contract: what a redirected navigation carries and how
//! the page presents the remaining session time.

use anyhow::{Context, Result};
use focusflow_storage::SiteType;
use url::Url;

const UNKNOWN_DOMAIN: &str = "this site";

/// Parameters carried by a blocked-page redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPageQuery {
    pub domain: String,
    /// Absent on redirects from rules that predate typed sites
    pub site_type: Option<SiteType>,
}

impl BlockedPageQuery {
    /// Parse a blocked-page URL
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid URL
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("Invalid blocked page URL: {raw}"))?;

        let mut domain: Option<String> = None;
        let mut site_type: Option<SiteType> = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "domain" if !value.is_empty() => domain = Some(value.into_owned()),
                "type" => site_type = value.parse().ok(),
                _ => {}
            }
        }

        Ok(Self {
            domain: domain.unwrap_or_else(|| UNKNOWN_DOMAIN.to_string()),
            site_type,
        })
    }
}

/// Format milliseconds as `MM:SS`, clamping negatives to zero
#[must_use]
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_seconds = remaining_ms.max(0) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_and_type() {
        let query =
            BlockedPageQuery::parse("focusflow://blocked?domain=reddit.com&type=permanent").unwrap();
        assert_eq!(query.domain, "reddit.com");
        assert_eq!(query.site_type, Some(SiteType::Permanent));
    }

    #[test]
    fn test_parse_without_type() {
        let query = BlockedPageQuery::parse("focusflow://blocked?domain=a%20b.com").unwrap();
        assert_eq!(query.domain, "a b.com");
        assert_eq!(query.site_type, None);
    }

    #[test]
    fn test_parse_missing_domain() {
        let query = BlockedPageQuery::parse("focusflow://blocked?type=bogus").unwrap();
        assert_eq!(query.domain, "this site");
        assert_eq!(query.site_type, None);
    }

    #[test]
    fn test_parse_invalid_url() {
        assert!(BlockedPageQuery::parse("::nope").is_err());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(1_500_000), "25:00");
        assert_eq!(format_remaining(61_999), "01:01");
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(-5_000), "00:00");
        assert_eq!(format_remaining(6_000_000), "100:00");
    }
}
