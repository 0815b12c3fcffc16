//! Scheme list markup and details navigation.
//!
//! The page is reached through [`Document`], so the same rendering code can
//! drive a real DOM binding or the in-memory [`Page`] used by tests and
//! server-side callers. Rendering is synchronous and makes no network calls.

use std::collections::HashMap;

use askama::Template;

use crate::types::SchemeRecord;

/// Page that scheme cards link to.
pub const DETAILS_PAGE: &str = "scheme_details.html";

/// Label shown when a scheme lists no beneficiary categories.
pub const GENERAL_BENEFICIARIES: &str = "General";

/// Markup rendered for an empty list.
pub const NO_RESULTS_HTML: &str = r#"<p class="no-results">No schemes found.</p>"#;

pub trait Document {
    /// Replace the content of the element with id `target_id`. Returns
    /// `false` when no such element exists.
    fn set_inner_html(&mut self, target_id: &str, html: String) -> bool;

    /// Redirect the current page.
    fn navigate(&mut self, url: &str);
}

/// In-memory document: named containers plus the current location.
#[derive(Debug, Clone, Default)]
pub struct Page {
    containers: HashMap<String, String>,
    location: Option<String>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty container.
    pub fn with_container(mut self, id: &str) -> Self {
        self.containers.insert(id.to_string(), String::new());
        self
    }

    pub fn inner_html(&self, id: &str) -> Option<&str> {
        self.containers.get(id).map(String::as_str)
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Document for Page {
    fn set_inner_html(&mut self, target_id: &str, html: String) -> bool {
        match self.containers.get_mut(target_id) {
            Some(content) => {
                *content = html;
                true
            }
            None => false,
        }
    }

    fn navigate(&mut self, url: &str) {
        self.location = Some(url.to_string());
    }
}

/// Comma-joined categories, or [`GENERAL_BENEFICIARIES`] when there are none.
pub fn beneficiary_text(record: &SchemeRecord) -> String {
    match record.beneficiary_category.as_deref() {
        Some(categories) if !categories.is_empty() => categories.join(", "),
        _ => GENERAL_BENEFICIARIES.to_string(),
    }
}

/// Markup for a list of schemes: one card per record, in order, or the
/// no-results placeholder.
pub fn scheme_list_html(records: &[SchemeRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS_HTML.to_string();
    }
    let template = SchemeListTemplate {
        cards: records.iter().map(SchemeCard::from).collect(),
    };
    template.render().unwrap_or_else(|err| {
        tracing::error!(error = %err, "scheme list template failed");
        String::new()
    })
}

#[derive(Template)]
#[template(
    source = r#"{% for card in cards %}<div class="card scheme-card" data-scheme-id="{{ card.id }}"><h3 class="scheme-name">{{ card.name }}</h3><p class="scheme-description">{{ card.description }}</p><div class="scheme-beneficiaries"><strong>Beneficiaries:</strong> {{ card.beneficiaries }}</div><a class="btn btn-primary" href="{{ card.href }}">View Details</a></div>{% endfor %}"#,
    ext = "html"
)]
struct SchemeListTemplate<'a> {
    cards: Vec<SchemeCard<'a>>,
}

struct SchemeCard<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    beneficiaries: String,
    href: String,
}

impl<'a> From<&'a SchemeRecord> for SchemeCard<'a> {
    fn from(record: &'a SchemeRecord) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            description: &record.description,
            beneficiaries: beneficiary_text(record),
            href: scheme_details_url(&record.id),
        }
    }
}

/// Render `records` into the container `target_id`. Does nothing when the
/// container is missing.
pub fn render_scheme_list<D: Document + ?Sized>(doc: &mut D, records: &[SchemeRecord], target_id: &str) {
    if !doc.set_inner_html(target_id, scheme_list_html(records)) {
        tracing::debug!(target_id, "render target not found");
    }
}

pub fn scheme_details_url(id: &str) -> String {
    format!("{DETAILS_PAGE}?id={}", urlencoding::encode(id))
}

/// Redirect to the details page for scheme `id`.
pub fn view_scheme_details<D: Document + ?Sized>(doc: &mut D, id: &str) {
    doc.navigate(&scheme_details_url(id));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, categories: Option<&[&str]>) -> SchemeRecord {
        SchemeRecord {
            id: id.to_string(),
            name: name.to_string(),
            description: "d".to_string(),
            beneficiary_category: categories.map(|c| c.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let mut page = Page::new().with_container("list");
        render_scheme_list(&mut page, &[], "list");
        assert_eq!(page.inner_html("list"), Some(NO_RESULTS_HTML));
        assert_eq!(page.location(), None);
    }

    #[test]
    fn card_joins_categories() {
        let mut page = Page::new().with_container("list");
        render_scheme_list(&mut page, &[record("1", "Scheme A", Some(&["Farmers", "Women"]))], "list");

        let html = page.inner_html("list").unwrap();
        assert_eq!(html.matches("scheme-card").count(), 1);
        assert!(html.contains("<strong>Beneficiaries:</strong> Farmers, Women</div>"));
        assert!(html.contains(r#"data-scheme-id="1""#));
        assert!(html.contains("Scheme A"));
    }

    #[test]
    fn missing_or_empty_categories_render_general() {
        assert_eq!(beneficiary_text(&record("1", "A", None)), "General");
        assert_eq!(beneficiary_text(&record("1", "A", Some(&[]))), "General");
    }

    #[test]
    fn cards_follow_input_order() {
        let html = scheme_list_html(&[record("1", "First", None), record("2", "Second", None)]);
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(first < second);
        assert_eq!(html.matches("scheme-card").count(), 2);
    }

    #[test]
    fn missing_target_is_ignored() {
        let mut page = Page::new().with_container("other");
        render_scheme_list(&mut page, &[record("1", "A", None)], "list");
        assert_eq!(page.inner_html("other"), Some(""));
        assert_eq!(page.inner_html("list"), None);
    }

    #[test]
    fn record_text_is_escaped() {
        let html = scheme_list_html(&[record("1", "<script>alert(1)</script>", None)]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn id_cannot_break_out_of_attribute() {
        let html = scheme_list_html(&[record(r#"1" onclick="x"#, "A", None)]);
        assert!(html.contains(r#"data-scheme-id="1&quot; onclick=&quot;x""#));
    }

    #[test]
    fn details_navigation_encodes_id() {
        let mut page = Page::new();
        view_scheme_details(&mut page, "65f 1&x");
        assert_eq!(page.location(), Some("scheme_details.html?id=65f%201%26x"));
    }

    #[test]
    fn card_links_to_details() {
        let html = scheme_list_html(&[record("abc", "A", None)]);
        assert!(html.contains(r#"href="scheme_details.html?id=abc""#));
    }
}
