// src/checker/html.rs
// =============================================================================
// This module looks for our backlink inside a fetched HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), so broken markup is fine
//
// Matching rules:
// 1. Walk every <a href> in document order.
// 2. Make the href absolute against the page's origin.
// 3. The first href containing the target domain wins.
//    rel="nofollow" (any case) -> nofollow, otherwise dofollow.
// 4. No anchor matched? Look at <meta content> and <link href> values.
//    Any value containing the target domain counts as a "meta" link.
// =============================================================================

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One <a href> as found in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    /// Inner text with all nested tags stripped, trimmed
    pub text: String,
    pub rel: Option<String>,
}

/// What kind of reference to the target domain was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacklinkMatch {
    /// A regular anchor pointing at the target domain
    Anchor { text: String, nofollow: bool },
    /// A <meta>/<link> attribute mentioning the target domain
    Meta,
}

/// Extracts every <a> that has an href, in document order.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    // Constant selector, parsing it cannot fail
    let selector = Selector::parse("a[href]").expect("valid selector");

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(Anchor {
                href: href.to_string(),
                text: inner_text(&element),
                rel: element.value().attr("rel").map(str::to_string),
            })
        })
        .collect()
}

/// Extracts `content` / `href` attribute values of <meta> and <link> tags.
pub fn extract_meta_values(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta, link").expect("valid selector");

    let mut values = Vec::new();
    for element in document.select(&selector) {
        for attr in ["content", "href"] {
            if let Some(value) = element.value().attr(attr) {
                values.push(value.to_string());
            }
        }
    }
    values
}

/// Turns an href into an absolute URL using only the page's scheme and host.
///
/// - "/path"        -> "<origin>/path"
/// - "http..."      -> unchanged
/// - anything else  -> "<origin>/<href>"
///
/// Path-relative hrefs resolve against the origin, not the page's directory.
pub fn resolve_href(page: &Url, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", origin(page), href)
    } else if !href.starts_with("http") {
        format!("{}/{}", origin(page), href)
    } else {
        href.to_string()
    }
}

/// Searches the page for a reference to `target_domain`.
///
/// `page_url` is the URL that was fetched (used for relative hrefs).
/// Returns the first match, or `None` if the page never mentions the domain.
pub fn find_backlink(html: &str, page_url: &str, target_domain: &str) -> Option<BacklinkMatch> {
    // The fetch already succeeded, so this only fails for exotic inputs.
    // Without a base we still compare absolute hrefs.
    let page = Url::parse(page_url).ok();

    for anchor in extract_anchors(html) {
        let absolute = match &page {
            Some(page) => resolve_href(page, &anchor.href),
            None => anchor.href.clone(),
        };

        if absolute.contains(target_domain) {
            let nofollow = anchor
                .rel
                .as_deref()
                .is_some_and(|rel| rel.to_lowercase().contains("nofollow"));
            let text = if anchor.text.is_empty() {
                anchor.href
            } else {
                anchor.text
            };
            return Some(BacklinkMatch::Anchor { text, nofollow });
        }
    }

    extract_meta_values(html)
        .iter()
        .any(|value| value.contains(target_domain))
        .then_some(BacklinkMatch::Meta)
}

// scheme://host[:port], without a trailing slash
fn origin(page: &Url) -> String {
    page.origin().ascii_serialization()
}

fn inner_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a real HTML parser instead of a regex?
//    - Attributes can come in any order, use either quote style, or span lines
//    - html5ever handles all of that exactly like a browser would
//    - We still keep the simple rules: first match wins, plain substring match
//
// 2. What does .then_some() do?
//    - bool::then_some(x) returns Some(x) if the bool is true, else None
//    - Handy to turn "did we find it?" into an Option
//
// 3. What is origin().ascii_serialization()?
//    - The origin of "https://example.com:8443/a/b" is "https://example.com:8443"
//    - Default ports are left out, just like a browser's location.origin
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = "mying.vercel.app";

    #[test]
    fn test_extract_anchor_text_strips_tags() {
        let html = r#"<a href="https://x.com" rel="NoFollow"><b>Bold</b> link </a>"#;
        let anchors = extract_anchors(html);
        assert_eq!(
            anchors,
            vec![Anchor {
                href: "https://x.com".to_string(),
                text: "Bold link".to_string(),
                rel: Some("NoFollow".to_string()),
            }]
        );
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let anchors = extract_anchors(r#"<a name="top">Top</a>"#);
        assert!(anchors.is_empty());
    }

    #[test]
    fn test_resolve_root_relative() {
        let page = Url::parse("https://blog.example.com:8443/posts/1").unwrap();
        assert_eq!(
            resolve_href(&page, "/about"),
            "https://blog.example.com:8443/about"
        );
    }

    #[test]
    fn test_resolve_path_relative_uses_origin() {
        let page = Url::parse("https://blog.example.com/posts/1").unwrap();
        assert_eq!(
            resolve_href(&page, "other/page"),
            "https://blog.example.com/other/page"
        );
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        let page = Url::parse("https://blog.example.com/").unwrap();
        assert_eq!(
            resolve_href(&page, "https://mying.vercel.app/x"),
            "https://mying.vercel.app/x"
        );
    }

    #[test]
    fn test_dofollow_match() {
        let html = r#"<p>See <a href="https://mying.vercel.app/products/a">our rides</a></p>"#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Anchor {
                text: "our rides".to_string(),
                nofollow: false
            })
        );
    }

    #[test]
    fn test_nofollow_match_is_case_insensitive() {
        let html = r#"<a rel="external NOFOLLOW" href="https://mying.vercel.app/">x</a>"#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Anchor {
                text: "x".to_string(),
                nofollow: true
            })
        );
    }

    #[test]
    fn test_first_match_wins() {
        let html = r#"
            <a href="https://other.com">unrelated</a>
            <a href="https://mying.vercel.app/a">first</a>
            <a href="https://mying.vercel.app/b" rel="nofollow">second</a>
        "#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Anchor {
                text: "first".to_string(),
                nofollow: false
            })
        );
    }

    #[test]
    fn test_empty_text_falls_back_to_href() {
        let html = r#"<a href="https://mying.vercel.app/logo"><img src="logo.png"></a>"#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Anchor {
                text: "https://mying.vercel.app/logo".to_string(),
                nofollow: false
            })
        );
    }

    #[test]
    fn test_relative_href_on_the_target_domain_itself() {
        // A page hosted on the target domain links to itself relatively
        let html = r#"<a href="/products">Products</a>"#;
        assert!(find_backlink(html, "https://mying.vercel.app/blog", DOMAIN).is_some());
    }

    #[test]
    fn test_meta_fallback() {
        let html = r#"
            <head>
              <link rel="canonical" href="https://mying.vercel.app/products/a">
            </head>
            <body><a href="https://other.com">x</a></body>
        "#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Meta)
        );
    }

    #[test]
    fn test_meta_content_attribute() {
        let html = r#"<meta property="og:see_also" content="https://mying.vercel.app">"#;
        assert_eq!(
            find_backlink(html, "https://blog.example.com", DOMAIN),
            Some(BacklinkMatch::Meta)
        );
    }

    #[test]
    fn test_no_match() {
        let html = r#"<a href="https://other.com">x</a><meta content="nothing">"#;
        assert_eq!(find_backlink(html, "https://blog.example.com", DOMAIN), None);
    }
}
