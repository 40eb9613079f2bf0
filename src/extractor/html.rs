//! DOM helpers shared by the extraction strategies
//!
//! Everything here is a cheap lookup over an already parsed document:
//! - Page title and first heading
//! - `<meta>` values by name or property, case-insensitively
//! - Visible text of an element, skipping scripts and chrome

use scraper::{ElementRef, Html, Selector};

/// Elements whose text is never page content
const EXCLUDED_TAGS: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "nav", "header", "footer",
    "aside", "form", "button", "select", "iframe", "svg", "canvas",
];

/// Elements that start a new text block
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "td", "th", "li", "dd", "dt", "article", "section", "main", "body", "pre",
    "blockquote", "figcaption", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Class or id tokens that mark navigation, ads and similar chrome
const BOILERPLATE_MARKERS: &[&str] = &[
    "nav", "navbar", "navigation", "menu", "footer", "header", "masthead", "sidebar",
    "breadcrumb", "breadcrumbs", "ad", "ads", "advert", "advertisement", "banner", "sponsor",
    "sponsored", "promo", "share", "sharing", "social", "cookie", "cookies", "consent",
    "newsletter", "subscribe", "popup", "modal", "related", "recommended",
];

pub fn is_excluded_tag(name: &str) -> bool {
    EXCLUDED_TAGS.contains(&name)
}

pub fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Whether the element's class or id names a boilerplate region
pub fn has_boilerplate_marker(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    [value.attr("class"), value.attr("id")]
        .into_iter()
        .flatten()
        .flat_map(|attr| attr.split(|c: char| c.is_whitespace() || c == '-' || c == '_'))
        .any(|token| {
            let token = token.to_ascii_lowercase();
            BOILERPLATE_MARKERS.contains(&token.as_str())
        })
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the first element matching `css`
fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;

    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
        .find(|text| !text.is_empty())
}

/// Text of the `<title>` element
pub fn page_title(document: &Html) -> Option<String> {
    first_text(document, "title")
}

/// Text of the first `<h1>`
pub fn first_heading(document: &Html) -> Option<String> {
    first_text(document, "h1")
}

/// Content of the first `<meta>` whose `name` or `property` matches one of `keys`
///
/// Keys are tried in order, so earlier keys take precedence.
pub fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;
    let metas: Vec<_> = document.select(&selector).collect();

    keys.iter().find_map(|key| {
        metas.iter().find_map(|meta| {
            let value = meta.value();
            let matches = [value.attr("name"), value.attr("property")]
                .into_iter()
                .flatten()
                .any(|attr| attr.trim().eq_ignore_ascii_case(key));
            if matches {
                value
                    .attr("content")
                    .map(collapse_whitespace)
                    .and_then(non_empty)
            } else {
                None
            }
        })
    })
}

/// The `<meta name="description">` value
pub fn meta_description(document: &Html) -> Option<String> {
    meta_content(document, &["description"])
}

/// Every keyword from `keywords`, `news_keywords` and `article:tag` metas
///
/// Keywords are de-duplicated case-insensitively, keeping first spelling,
/// and joined with ", ".
pub fn meta_keywords(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;
    let mut keywords: Vec<String> = Vec::new();

    for meta in document.select(&selector) {
        let value = meta.value();
        let is_keyword_meta = [value.attr("name"), value.attr("property")]
            .into_iter()
            .flatten()
            .any(|attr| {
                let attr = attr.trim();
                attr.eq_ignore_ascii_case("keywords")
                    || attr.eq_ignore_ascii_case("news_keywords")
                    || attr.eq_ignore_ascii_case("article:tag")
            });
        if !is_keyword_meta {
            continue;
        }

        for keyword in value.attr("content").unwrap_or_default().split(',') {
            let keyword = collapse_whitespace(keyword);
            if !keyword.is_empty()
                && !keywords.iter().any(|k| k.eq_ignore_ascii_case(&keyword))
            {
                keywords.push(keyword);
            }
        }
    }

    non_empty(keywords.join(", "))
}

/// Visible text below `element`, skipping excluded descendants
pub fn visible_text(element: ElementRef<'_>) -> String {
    let root = *element;
    let root_id = root.id();
    let mut parts: Vec<&str> = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root_id)
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_excluded_tag(ancestor.value().name()));
        if !hidden {
            parts.push(&**text);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title>  Launch   Day </title>
        <meta name="Description" content="All about the launch">
        <meta property="og:title" content="Launch Day (OG)">
        <meta name="keywords" content="rockets, space, Rockets">
        <meta property="article:tag" content="launch">
        </head><body>
        <h1>Headline</h1>
        <div id="post"><p>Hello <b>there</b> world</p><script>var x = 1;</script></div>
        </body></html>"#;

    #[test]
    fn test_page_title_is_collapsed() {
        let document = Html::parse_document(PAGE);
        assert_eq!(page_title(&document), Some("Launch Day".to_string()));
        assert_eq!(first_heading(&document), Some("Headline".to_string()));
    }

    #[test]
    fn test_meta_lookup_is_case_insensitive() {
        let document = Html::parse_document(PAGE);
        assert_eq!(
            meta_description(&document),
            Some("All about the launch".to_string())
        );
        assert_eq!(
            meta_content(&document, &["twitter:title", "og:title"]),
            Some("Launch Day (OG)".to_string())
        );
        assert_eq!(meta_content(&document, &["missing"]), None);
    }

    #[test]
    fn test_keywords_are_merged_and_deduplicated() {
        let document = Html::parse_document(PAGE);
        assert_eq!(
            meta_keywords(&document),
            Some("rockets, space, launch".to_string())
        );
    }

    #[test]
    fn test_visible_text_skips_scripts() {
        let document = Html::parse_document(PAGE);
        let selector = Selector::parse("#post").unwrap();
        let post = document.select(&selector).next().unwrap();
        assert_eq!(visible_text(post), "Hello there world");
    }

    #[test]
    fn test_boilerplate_markers() {
        let document = Html::parse_document(
            r#"<div class="site-nav">a</div><div id="main_sidebar">b</div><div class="navigator">c</div>"#,
        );
        let selector = Selector::parse("div").unwrap();
        let flags: Vec<bool> = document
            .select(&selector)
            .map(|div| has_boilerplate_marker(&div))
            .collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
