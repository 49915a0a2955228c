//! Text rendering of the blocked page

use anyhow::Result;
use focusflow_core::{
    blocked_page::{format_remaining, BlockedPageQuery},
    clock::{Clock, SystemClock},
};
use focusflow_storage::{Database, SessionState, SiteType};

/// Render the blocked page for `query` given the session at `now_ms`
pub fn render(query: &BlockedPageQuery, session: &SessionState, now_ms: i64) -> String {
    let mut lines = vec![format!("{} is blocked", query.domain), String::new()];

    if query.site_type == Some(SiteType::Permanent) {
        lines.push("This site is on your permanent block list.".to_string());
        lines.push(String::new());
        lines.push(format!(
            "To unblock it: focusflow sites remove {}",
            query.domain
        ));
        return lines.join("\n");
    }

    let remaining_ms = session.remaining_ms(now_ms);
    if remaining_ms > 0 {
        lines.push("Stay focused! This site is blocked during your focus session.".to_string());
        lines.push(format!("Time remaining: {}", format_remaining(remaining_ms)));
        lines.push(String::new());
        lines.push("To end the session early: focusflow focus stop".to_string());
    } else {
        lines.push("Your focus session has ended.".to_string());
        lines.push(String::new());
        lines.push("To start another: focusflow focus start".to_string());
    }
    lines.join("\n")
}

/// # Errors
///
/// Returns an error if the URL is invalid or the session cannot be read
pub fn show_blocked(url: &str) -> Result<()> {
    let query = BlockedPageQuery::parse(url)?;
    let session = Database::new(None)?.get_session()?;
    println!("{}", render(&query, &session, SystemClock.now_ms()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(domain: &str, site_type: Option<SiteType>) -> BlockedPageQuery {
        BlockedPageQuery {
            domain: domain.to_string(),
            site_type,
        }
    }

    fn active_until(ends_at_epoch_ms: i64) -> SessionState {
        SessionState {
            active: true,
            ends_at_epoch_ms,
            active_rule_ids: vec![1000],
        }
    }

    #[test]
    fn test_render_active_session() {
        let page = render(
            &query("reddit.com", Some(SiteType::Focus)),
            &active_until(90_000),
            5_000,
        );
        assert!(page.starts_with("reddit.com is blocked"));
        assert!(page.contains("Time remaining: 01:25"));
        assert!(page.contains("focusflow focus stop"));
    }

    #[test]
    fn test_render_ended_session() {
        let page = render(&query("reddit.com", None), &active_until(1_000), 5_000);
        assert!(page.contains("has ended"));
        assert!(!page.contains("Time remaining"));

        let page = render(&query("reddit.com", None), &SessionState::default(), 5_000);
        assert!(page.contains("has ended"));
    }

    #[test]
    fn test_render_permanent_site() {
        let page = render(
            &query("youtube.com", Some(SiteType::Permanent)),
            &SessionState::default(),
            0,
        );
        assert!(page.contains("permanent block list"));
        assert!(page.contains("focusflow sites remove youtube.com"));
    }
}
