use eyre::{Result, WrapErr};
use url::Url;

const DEFAULT_SCHEME: &str = "http";

/// A crawlable site: the identifier shown to the user plus the URL the crawl starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub original: String,
    pub name: String,      // host[:port], the identifier used in the site list
    pub start_url: Url,
}

impl Site {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            eyre::bail!("Site must not be empty");
        }

        // Bare host (with optional port/path) gets the default scheme
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{}://{}", DEFAULT_SCHEME, trimmed)
        };

        let start_url = Url::parse(&candidate)
            .wrap_err_with(|| format!("Invalid site: {}", trimmed))?;

        match start_url.scheme() {
            "http" | "https" => {}
            other => eyre::bail!("Unsupported scheme for site {}: {}", trimmed, other),
        }

        let host = start_url.host_str()
            .ok_or_else(|| eyre::eyre!("Site has no host: {}", trimmed))?;

        let name = match start_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            original: trimmed.to_string(),
            name,
            start_url,
        })
    }

    pub fn host(&self) -> &str {
        self.start_url.host_str().unwrap_or(&self.name)
    }

    /// Whether `url` belongs to this site (same host and effective port)
    pub fn is_in_scope(&self, url: &Url, include_subdomains: bool) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };

        let same_host = host.eq_ignore_ascii_case(self.host());
        if same_host {
            return url.port_or_known_default() == self.start_url.port_or_known_default();
        }

        include_subdomains && host.to_ascii_lowercase()
            .ends_with(&format!(".{}", self.host().to_ascii_lowercase()))
    }
}

/// The sites a user can pick from. Start requests are resolved against it.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Self> {
        let mut registry = Self::new();
        for input in inputs {
            registry.add(Site::parse(input.as_ref())?);
        }
        Ok(registry)
    }

    /// Add a site; a site with the same name replaces nothing and is ignored
    pub fn add(&mut self, site: Site) -> bool {
        if self.sites.iter().any(|s| s.name == site.name) {
            log::debug!("[site] add_ignored: name={} reason=duplicate", site.name);
            return false;
        }
        log::debug!("[site] add: name={} start_url={}", site.name, site.start_url);
        self.sites.push(site);
        true
    }

    /// Look a site up by its name or by the text it was registered with
    pub fn resolve(&self, site: &str) -> Option<&Site> {
        let site = site.trim();
        self.sites.iter().find(|s| s.name == site || s.original == site)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn names(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_domain() {
        let site = Site::parse("example.com").unwrap();
        assert_eq!(site.name, "example.com");
        assert_eq!(site.start_url.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parse_domain_with_port() {
        let site = Site::parse("example.com:8080").unwrap();
        assert_eq!(site.name, "example.com:8080");
        assert_eq!(site.start_url.port(), Some(8080));
    }

    #[test]
    fn test_parse_url_keeps_path() {
        let site = Site::parse("https://example.com/app/").unwrap();
        assert_eq!(site.name, "example.com");
        assert_eq!(site.start_url.path(), "/app/");
        assert_eq!(site.start_url.scheme(), "https");
    }

    #[test]
    fn test_parse_rejects_empty_and_bad_scheme() {
        assert!(Site::parse("   ").is_err());
        assert!(Site::parse("ftp://example.com").is_err());
    }

    #[test]
    fn test_scope_same_host() {
        let site = Site::parse("example.com").unwrap();
        assert!(site.is_in_scope(&Url::parse("http://example.com/a").unwrap(), false));
        assert!(!site.is_in_scope(&Url::parse("http://example.com:8080/a").unwrap(), false));
        assert!(!site.is_in_scope(&Url::parse("http://other.com/").unwrap(), false));
        assert!(!site.is_in_scope(&Url::parse("mailto:a@example.com").unwrap(), false));
    }

    #[test]
    fn test_scope_subdomains() {
        let site = Site::parse("example.com").unwrap();
        let sub = Url::parse("http://www.example.com/").unwrap();
        assert!(!site.is_in_scope(&sub, false));
        assert!(site.is_in_scope(&sub, true));
        assert!(!site.is_in_scope(&Url::parse("http://badexample.com/").unwrap(), true));
    }

    #[test]
    fn test_registry_resolve() {
        let registry = SiteRegistry::from_inputs(&["example.com", "https://other.org:8443/"]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("example.com").is_some());
        assert!(registry.resolve("other.org:8443").is_some());
        assert!(registry.resolve("https://other.org:8443/").is_some());
        assert!(registry.resolve("missing.net").is_none());
    }

    #[test]
    fn test_registry_ignores_duplicates() {
        let mut registry = SiteRegistry::new();
        assert!(registry.add(Site::parse("example.com").unwrap()));
        assert!(!registry.add(Site::parse("http://example.com/").unwrap()));
        assert_eq!(registry.names(), vec!["example.com"]);
    }
}
