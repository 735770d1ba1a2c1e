use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static LINK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:href|src)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("link attribute pattern is valid")
});

const IGNORED_PREFIXES: [&str; 5] = ["#", "javascript:", "mailto:", "data:", "tel:"];

/// Pull every `href`/`src` target out of `html`, resolved against `base`.
///
/// Fragments are stripped and duplicates dropped; first-seen order is kept.
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for captures in LINK_ATTRIBUTE.captures_iter(html) {
        let Some(raw) = captures.get(1).or_else(|| captures.get(2)).or_else(|| captures.get(3)) else {
            continue;
        };
        let raw = raw.as_str().trim();
        if raw.is_empty() {
            continue;
        }
        let lowered = raw.to_ascii_lowercase();
        if IGNORED_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
            continue;
        }

        match base.join(raw) {
            Ok(url) => {
                let url = normalize(url);
                if seen.insert(url.to_string()) {
                    links.push(url);
                }
            }
            Err(e) => {
                log::trace!("[spider::links] unparsable_link: base={} raw={} error={}", base, raw, e);
            }
        }
    }

    links
}

/// Canonical form used to decide whether a URI was already seen
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

pub fn is_html(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.starts_with("text/html") || ct.starts_with("application/xhtml+xml")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://example.com/dir/page.html").unwrap()
    }

    fn strings(links: Vec<Url>) -> Vec<String> {
        links.into_iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_extract_resolves_relative_links() {
        let html = r#"<a href="/a">A</a> <a href='b.html'>B</a> <img src=img.png>"#;
        assert_eq!(strings(extract_links(&base(), html)), vec![
            "http://example.com/a",
            "http://example.com/dir/b.html",
            "http://example.com/dir/img.png",
        ]);
    }

    #[test]
    fn test_extract_strips_fragments_and_dedupes() {
        let html = r#"<a href="/a#top">1</a><a href="/a">2</a><a HREF="/a#bottom">3</a>"#;
        assert_eq!(strings(extract_links(&base(), html)), vec!["http://example.com/a"]);
    }

    #[test]
    fn test_extract_skips_non_navigable_targets() {
        let html = r##"<a href="#section">s</a><a href="javascript:void(0)">j</a>
            <a href="mailto:a@example.com">m</a><a href="">e</a><a href="https://other.org/x">x</a>"##;
        assert_eq!(strings(extract_links(&base(), html)), vec!["https://other.org/x"]);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(Some("text/html; charset=utf-8")));
        assert!(is_html(Some("application/xhtml+xml")));
        assert!(!is_html(Some("image/png")));
        assert!(!is_html(None));
    }
}
