//! Link href construction.
//!
//! Each link-source kind maps to one href rule. Page links use the
//! locale's slug and append an in-page anchor resolved through the
//! per-tree anchor table.

use folia_case::Str;
use folia_forme::LinkVariable;

use crate::RenderRules;

/// Build the href for a link value. `None` means the element renders
/// without an href (unresolved asset, unknown page, malformed value).
pub fn href_for(link: &LinkVariable, rules: &RenderRules) -> Option<Str> {
    match link {
        LinkVariable::Url(data) => Some(data.url.clone()),
        LinkVariable::Email(data) => {
            let mut href = Str::from("mailto:");
            href.push_str(&data.address);
            Some(href)
        }
        LinkVariable::Phone(data) => {
            let mut href = Str::from("tel:");
            href.push_str(&data.number);
            Some(href)
        }
        LinkVariable::Asset(data) => data.url.clone(),
        LinkVariable::Page(data) => {
            let page = rules.pages.get(&data.page_id)?;
            let slug = page.slug_for(rules.locale.as_deref());
            let mut href = Str::from("/");
            href.push_str(slug.trim_start_matches('/'));
            if let Some(anchor_layer) = &data.anchor_layer_id {
                if let Some(anchor) = rules.anchors.get(anchor_layer.as_str()) {
                    href.push('#');
                    href.push_str(anchor);
                }
            }
            Some(href)
        }
        // field links resolve to URL values during expansion; one still
        // here had nothing to resolve against
        LinkVariable::Field(_) => None,
        LinkVariable::Malformed(_) => None,
    }
}

/// Whether the link opens in a new tab.
pub fn opens_new_tab(link: &LinkVariable) -> bool {
    matches!(link, LinkVariable::Url(data) if data.new_tab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folia_case::FxHashMap;
    use folia_forme::{EmailLink, Page, PageLink, PhoneLink};

    fn rules_with_page() -> RenderRules {
        let mut page = Page::new("p1", "about");
        page.locale_slugs
            .insert(Str::from("fr"), Str::from("a-propos"));
        let mut pages = FxHashMap::default();
        pages.insert(Str::from("p1"), page);
        let mut rules = RenderRules {
            pages,
            anchors: FxHashMap::default(),
            locale: None,
        };
        rules
            .anchors
            .insert(Str::from("heroLayer"), Str::from("hero"));
        rules
    }

    #[test]
    fn test_mailto_and_tel() {
        let rules = RenderRules::default();
        let email = LinkVariable::Email(EmailLink {
            address: Str::from("hi@folia.dev"),
            extra: Default::default(),
        });
        assert_eq!(href_for(&email, &rules).as_deref(), Some("mailto:hi@folia.dev"));

        let phone = LinkVariable::Phone(PhoneLink {
            number: Str::from("+15551234"),
            extra: Default::default(),
        });
        assert_eq!(href_for(&phone, &rules).as_deref(), Some("tel:+15551234"));
    }

    #[test]
    fn test_page_link_with_anchor() {
        let rules = rules_with_page();
        let link = LinkVariable::Page(PageLink {
            page_id: Str::from("p1"),
            anchor_layer_id: Some(Str::from("heroLayer")),
            extra: Default::default(),
        });
        assert_eq!(href_for(&link, &rules).as_deref(), Some("/about#hero"));
    }

    #[test]
    fn test_page_link_uses_localized_slug() {
        let mut rules = rules_with_page();
        rules.locale = Some(Str::from("fr"));
        let link = LinkVariable::Page(PageLink {
            page_id: Str::from("p1"),
            anchor_layer_id: None,
            extra: Default::default(),
        });
        assert_eq!(href_for(&link, &rules).as_deref(), Some("/a-propos"));
    }

    #[test]
    fn test_unknown_page_renders_no_href() {
        let rules = RenderRules::default();
        let link = LinkVariable::Page(PageLink {
            page_id: Str::from("ghost"),
            anchor_layer_id: None,
            extra: Default::default(),
        });
        assert_eq!(href_for(&link, &rules), None);
    }
}
