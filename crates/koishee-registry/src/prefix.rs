//! Key prefixes derived from DNS-style domain names.

use std::fmt;

/// First path component of every SkyDNS key.
pub const NAMESPACE_ROOT: &str = "skydns";

/// Registry subtree owned by one domain.
///
/// The domain's labels are reversed so that more specific names sort below
/// their parents: `web.skydns.local` lives at `/skydns/local/skydns/web`.
/// Input is not validated; empty labels become empty path components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    path: String,
}

impl Prefix {
    /// Builds the prefix for `domain`.
    ///
    /// ```
    /// use koishee_registry::Prefix;
    ///
    /// assert_eq!(Prefix::from_domain("skydns.local").as_str(), "/skydns/local/skydns");
    /// ```
    #[must_use]
    pub fn from_domain(domain: &str) -> Self {
        let labels: Vec<&str> = domain.split('.').rev().collect();
        Self {
            path: format!("/{NAMESPACE_ROOT}/{}", labels.join("/")),
        }
    }

    /// The prefix as an absolute key path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path components below the key-space root, namespace first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').skip(1)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("skydns.local", "/skydns/local/skydns")]
    #[case("web-3.nodes.skydns.local", "/skydns/local/skydns/nodes/web-3")]
    #[case("single", "/skydns/single")]
    #[case("", "/skydns/")]
    #[case("a..b", "/skydns/b//a")]
    fn reverses_domain_labels(#[case] domain: &str, #[case] expected: &str) {
        assert_eq!(Prefix::from_domain(domain).as_str(), expected);
    }

    #[test]
    fn segments_start_at_namespace() {
        let prefix = Prefix::from_domain("skydns.local");
        let segments: Vec<&str> = prefix.segments().collect();
        assert_eq!(segments, ["skydns", "local", "skydns"]);
    }

    #[test]
    fn displays_as_key_path() {
        let prefix = Prefix::from_domain("example.org");
        assert_eq!(prefix.to_string(), "/skydns/org/example");
    }
}
