//! Translation of the block list into redirect rules.

use anyhow::{Context, Result};
use focusflow_storage::{BlockRule, BlockedSite};
use url::Url;

/// Id of the first compiled rule; later rules follow in list order
pub const FIRST_RULE_ID: u32 = 1000;
pub const RULE_PRIORITY: u32 = 1;

/// Compiles block lists into rules that redirect to the blocked page
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    blocked_page: Url,
}

impl RuleCompiler {
    /// # Errors
    ///
    /// Returns an error if `blocked_page_url` is not an absolute URL
    pub fn new(blocked_page_url: &str) -> Result<Self> {
        let blocked_page = Url::parse(blocked_page_url)
            .with_context(|| format!("Invalid blocked page URL: {blocked_page_url}"))?;
        Ok(Self { blocked_page })
    }

    /// Rules for every site that is blocked under the given session flag.
    ///
    /// Permanent sites are always included, focus sites only while a session
    /// is active. Ids are positional: `FIRST_RULE_ID + index` over the
    /// filtered list.
    #[must_use]
    pub fn compile(&self, sites: &[BlockedSite], session_active: bool) -> Vec<BlockRule> {
        sites
            .iter()
            .filter(|site| site.site_type.is_blocked(session_active))
            .zip(FIRST_RULE_ID..)
            .map(|(site, id)| BlockRule {
                id,
                priority: RULE_PRIORITY,
                url_filter: format!("||{}", site.url),
                redirect_url: self.redirect_url(site),
                main_frame_only: true,
            })
            .collect()
    }

    /// Blocked page URL carrying the site's domain and type
    #[must_use]
    pub fn redirect_url(&self, site: &BlockedSite) -> String {
        let mut url = self.blocked_page.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("domain", &site.url)
            .append_pair("type", site.site_type.as_str());
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusflow_storage::SiteType;

    fn site(url: &str, site_type: SiteType) -> BlockedSite {
        BlockedSite {
            url: url.to_string(),
            site_type,
        }
    }

    fn mixed_sites() -> Vec<BlockedSite> {
        vec![
            site("reddit.com", SiteType::Focus),
            site("casino.example", SiteType::Permanent),
            site("youtube.com", SiteType::Focus),
            site("x.com", SiteType::Permanent),
        ]
    }

    fn compiler() -> RuleCompiler {
        RuleCompiler::new("focusflow://blocked").unwrap()
    }

    #[test]
    fn test_inactive_compiles_permanent_only_in_order() {
        let rules = compiler().compile(&mixed_sites(), false);

        let summary: Vec<(u32, &str)> = rules
            .iter()
            .map(|r| (r.id, r.url_filter.as_str()))
            .collect();
        assert_eq!(summary, vec![(1000, "||casino.example"), (1001, "||x.com")]);
    }

    #[test]
    fn test_active_compiles_all_sites() {
        let rules = compiler().compile(&mixed_sites(), true);

        let ids: Vec<u32> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1000, 1001, 1002, 1003]);
        assert_eq!(rules[2].url_filter, "||youtube.com");
        assert!(rules.iter().all(|r| r.main_frame_only && r.priority == 1));
    }

    #[test]
    fn test_empty_input_compiles_nothing() {
        assert!(compiler().compile(&[], true).is_empty());
        assert!(compiler().compile(&[], false).is_empty());
    }

    #[test]
    fn test_only_focus_sites_while_inactive() {
        let sites = vec![site("reddit.com", SiteType::Focus)];
        assert!(compiler().compile(&sites, false).is_empty());
    }

    #[test]
    fn test_redirect_url_carries_domain_and_type() {
        let rules = compiler().compile(&[site("news.example.com", SiteType::Permanent)], false);
        assert_eq!(
            rules[0].redirect_url,
            "focusflow://blocked?domain=news.example.com&type=permanent"
        );
    }

    #[test]
    fn test_redirect_url_replaces_existing_query() {
        let compiler = RuleCompiler::new("http://127.0.0.1:7777/blocked?stale=1").unwrap();
        let url = compiler.redirect_url(&site("a b.com", SiteType::Focus));
        assert_eq!(url, "http://127.0.0.1:7777/blocked?domain=a+b.com&type=focus");
    }

    #[test]
    fn test_invalid_blocked_page_url() {
        assert!(RuleCompiler::new("not a url").is_err());
    }
}
