//! Content URIs
//!
//! A node URI has five fields, serialized with configurable separators:
//!
//! ```text
//! scheme://namespace@path.ext#version
//! i18n://sv-se@page/title.md#3
//! ```
//!
//! Parsing and serialization are pure. Defaults are applied separately by
//! [`UriOptions::normalize`], so a parsed URI can tell "unset" (`None`)
//! apart from an explicit empty field (`Some("")`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Structured content identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    pub scheme: Option<String>,
    pub namespace: Option<String>,
    pub path: Option<String>,
    pub ext: Option<String>,
    pub version: Option<String>,
}

impl Uri {
    /// Copy of this URI without its version
    pub fn versionless(&self) -> Uri {
        Uri {
            version: None,
            ..self.clone()
        }
    }
}

/// Values used for unset fields during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriDefaults {
    pub scheme: String,
    pub namespace: String,
    pub path: String,
    pub ext: String,
    pub version: String,
}

impl Default for UriDefaults {
    fn default() -> Self {
        Self {
            scheme: "i18n".into(),
            namespace: String::new(),
            path: String::new(),
            ext: "txt".into(),
            version: String::new(),
        }
    }
}

/// Separator placed *after* each field when serializing.
///
/// `path` separates the path from the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriSeparators {
    pub scheme: String,
    pub namespace: String,
    pub path: String,
    pub version: String,
}

impl Default for UriSeparators {
    fn default() -> Self {
        Self {
            scheme: "://".into(),
            namespace: "@".into(),
            path: ".".into(),
            version: "#".into(),
        }
    }
}

/// URI defaults, per-scheme namespaces and separators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriOptions {
    pub defaults: UriDefaults,
    pub namespace_by_scheme: HashMap<String, String>,
    pub separators: UriSeparators,
}

impl Default for UriOptions {
    fn default() -> Self {
        let namespace_by_scheme = [("i18n", "en-us"), ("l10n", "local"), ("g11n", "global")]
            .into_iter()
            .map(|(scheme, namespace)| (scheme.to_string(), namespace.to_string()))
            .collect();

        Self {
            defaults: UriDefaults::default(),
            namespace_by_scheme,
            separators: UriSeparators::default(),
        }
    }
}

impl UriOptions {
    /// Split a URI string into its fields. Absent fields stay `None`.
    pub fn parse(&self, input: &str) -> Uri {
        let sep = &self.separators;
        let mut uri = Uri::default();
        let mut rest = input;

        if let Some((scheme, tail)) = split_first(rest, &sep.scheme) {
            uri.scheme = Some(scheme.to_string());
            rest = tail;
        }

        if let Some((head, version)) = split_last(rest, &sep.version) {
            uri.version = Some(version.to_string());
            rest = head;
        }

        if let Some((namespace, tail)) = split_first(rest, &sep.namespace) {
            uri.namespace = Some(namespace.to_string());
            rest = tail;
        }

        // A separator inside a directory name is not an extension
        if let Some((path, ext)) = split_last(rest, &sep.path) {
            if !ext.contains('/') {
                uri.ext = Some(ext.to_string());
                rest = path;
            }
        }

        if !rest.is_empty() {
            uri.path = Some(rest.to_string());
        }

        uri
    }

    /// Serialize a URI. Unset fields are left out together with their
    /// separators. An explicit empty field keeps its separator whenever
    /// leaving it out would let normalization fill in a non-empty default,
    /// so `i18n://@page.txt` stays distinct from `i18n://en-us@page.txt`.
    pub fn stringify(&self, uri: &Uri) -> String {
        let sep = &self.separators;
        let defaults = &self.defaults;
        let scheme = uri.scheme.as_deref().unwrap_or(&defaults.scheme);
        let mut out = String::new();

        if let Some(scheme) = emitted(&uri.scheme, &defaults.scheme) {
            out.push_str(scheme);
            out.push_str(&sep.scheme);
        }
        if let Some(namespace) = emitted(&uri.namespace, self.default_namespace(scheme)) {
            out.push_str(namespace);
            out.push_str(&sep.namespace);
        }
        if let Some(path) = non_empty(&uri.path) {
            out.push_str(path);
        }
        if let Some(ext) = emitted(&uri.ext, &defaults.ext) {
            out.push_str(&sep.path);
            out.push_str(ext);
        }
        if let Some(version) = emitted(&uri.version, &defaults.version) {
            out.push_str(&sep.version);
            out.push_str(version);
        }

        out
    }

    /// Namespace an unset namespace takes under `scheme`
    pub fn default_namespace(&self, scheme: &str) -> &str {
        self.namespace_by_scheme
            .get(scheme)
            .map(String::as_str)
            .unwrap_or(&self.defaults.namespace)
    }

    /// Fill every unset field.
    ///
    /// An unset namespace takes the namespace configured for the URI's
    /// scheme before falling back to the generic default.
    pub fn normalize(&self, uri: &Uri) -> Uri {
        let defaults = &self.defaults;
        let scheme = uri.scheme.clone().unwrap_or_else(|| defaults.scheme.clone());
        let namespace = uri
            .namespace
            .clone()
            .unwrap_or_else(|| self.default_namespace(&scheme).to_string());

        Uri {
            scheme: Some(scheme),
            namespace: Some(namespace),
            path: Some(uri.path.clone().unwrap_or_else(|| defaults.path.clone())),
            ext: Some(uri.ext.clone().unwrap_or_else(|| defaults.ext.clone())),
            version: Some(uri.version.clone().unwrap_or_else(|| defaults.version.clone())),
        }
    }

    /// Parse, normalize and serialize in one go
    pub fn canonicalize(&self, input: &str) -> String {
        self.stringify(&self.normalize(&self.parse(input)))
    }

    /// Canonical form with the version stripped
    pub fn versionless(&self, input: &str) -> String {
        self.stringify(&self.normalize(&self.parse(input)).versionless())
    }
}

fn split_first<'a>(input: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    if separator.is_empty() {
        return None;
    }
    input.split_once(separator)
}

fn split_last<'a>(input: &'a str, separator: &str) -> Option<(&'a str, &'a str)> {
    if separator.is_empty() {
        return None;
    }
    input.rsplit_once(separator)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Field text to write, if any. Empty is written only when the default it
/// would otherwise fall back to is not empty.
fn emitted<'a>(field: &'a Option<String>, default: &str) -> Option<&'a str> {
    field
        .as_deref()
        .filter(|value| !value.is_empty() || !default.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn is_complete(uri: &Uri) -> bool {
        uri.scheme.is_some()
            && uri.namespace.is_some()
            && uri.path.is_some()
            && uri.ext.is_some()
            && uri.version.is_some()
    }

    #[test]
    fn test_parse_full_uri() {
        let options = UriOptions::default();
        let uri = options.parse("i18n://sv-se@page/title.md#3");

        assert_eq!(uri.scheme, some("i18n"));
        assert_eq!(uri.namespace, some("sv-se"));
        assert_eq!(uri.path, some("page/title"));
        assert_eq!(uri.ext, some("md"));
        assert_eq!(uri.version, some("3"));
        assert!(is_complete(&uri));
    }

    #[test]
    fn test_parse_bare_path() {
        let options = UriOptions::default();
        let uri = options.parse("page/title");

        assert_eq!(uri.scheme, None);
        assert_eq!(uri.namespace, None);
        assert_eq!(uri.path, some("page/title"));
        assert_eq!(uri.ext, None);
        assert_eq!(uri.version, None);
    }

    #[test]
    fn test_dot_in_directory_is_not_an_extension() {
        let options = UriOptions::default();
        let uri = options.parse("docs/v1.2/intro");
        assert_eq!(uri.path, some("docs/v1.2/intro"));
        assert_eq!(uri.ext, None);

        let uri = options.parse("docs/v1.2/intro.md");
        assert_eq!(uri.path, some("docs/v1.2/intro"));
        assert_eq!(uri.ext, some("md"));
    }

    #[test]
    fn test_round_trip_explicit_uris() {
        let options = UriOptions::default();
        for input in [
            "i18n://en-us@home/title.txt#1",
            "l10n://local@footer.md#draft",
            "custom://ns@a/b/c.html#12",
        ] {
            assert_eq!(options.stringify(&options.parse(input)), input);
        }
    }

    #[test]
    fn test_round_trip_normalized_uris() {
        let options = UriOptions::default();
        for input in ["page", "l10n://x", "foo://page.md", "i18n://sv-se@p#2"] {
            let normalized = options.canonicalize(input);
            assert_eq!(options.stringify(&options.parse(&normalized)), normalized);
        }
    }

    #[test]
    fn test_namespace_by_scheme() {
        let options = UriOptions::default();
        assert_eq!(options.canonicalize("i18n://page"), "i18n://en-us@page.txt");
        assert_eq!(options.canonicalize("l10n://page"), "l10n://local@page.txt");
        assert_eq!(options.canonicalize("g11n://page"), "g11n://global@page.txt");
        assert_eq!(options.canonicalize("other://page"), "other://page.txt");
        assert_eq!(options.canonicalize("page"), "i18n://en-us@page.txt");
    }

    #[test]
    fn test_explicit_namespace_wins() {
        let options = UriOptions::default();
        assert_eq!(options.canonicalize("i18n://sv-se@page"), "i18n://sv-se@page.txt");

        let uri = options.normalize(&options.parse("i18n://@page"));
        assert_eq!(uri.namespace, some(""));
    }

    #[test]
    fn test_normalize_fills_every_field() {
        let options = UriOptions::default();
        let uri = options.normalize(&Uri::default());
        assert!(is_complete(&uri));
        assert_eq!(uri.scheme, some("i18n"));
        assert_eq!(uri.namespace, some("en-us"));
        assert_eq!(uri.ext, some("txt"));
        assert_eq!(uri.version, some(""));
    }

    #[test]
    fn test_explicit_empty_fields_survive_serialization() {
        let options = UriOptions::default();
        assert_eq!(options.canonicalize("i18n://@page"), "i18n://@page.txt");
        assert_eq!(options.canonicalize("page."), "i18n://en-us@page.");
        assert_eq!(options.canonicalize("://page"), "://page.txt");

        // Empty version and an empty namespace without a per-scheme default
        // match their defaults, so nothing needs to be written
        assert_eq!(options.canonicalize("page#"), "i18n://en-us@page.txt");
        assert_eq!(options.canonicalize("other://@page"), "other://page.txt");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let options = UriOptions::default();
        for input in [
            "page",
            "i18n://@page",
            "l10n://@footer.md#2",
            "page.",
            "://page",
            "other://@page",
            "g11n://global@a/b.c#",
            "docs/v1.2/intro",
        ] {
            let once = options.canonicalize(input);
            assert_eq!(options.canonicalize(&once), once, "input {:?}", input);
            assert_eq!(options.stringify(&options.parse(&once)), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_versionless() {
        let options = UriOptions::default();
        assert_eq!(options.versionless("home/title.md#5"), "i18n://en-us@home/title.md");
    }

    #[test]
    fn test_custom_separators() {
        let options = UriOptions {
            separators: UriSeparators {
                scheme: ":".into(),
                namespace: "|".into(),
                path: "~".into(),
                version: "!".into(),
            },
            ..Default::default()
        };

        let uri = options.parse("i18n:sv|a.b~md!4");
        assert_eq!(uri.namespace, some("sv"));
        assert_eq!(uri.path, some("a.b"));
        assert_eq!(uri.ext, some("md"));
        assert_eq!(options.stringify(&uri), "i18n:sv|a.b~md!4");
    }
}
