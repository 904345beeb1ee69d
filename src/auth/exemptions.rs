// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path-based exemptions from authentication.
//!
//! The table is declarative: each rule pairs a path matcher with the methods
//! it exempts, and a request is exempt when any rule matches. Anything not
//! listed requires a token.

use axum::http::Method;
use regex::Regex;

#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Whole path must equal the literal.
    Exact(String),
    /// Path starts with the literal.
    Prefix(String),
    /// Regex, anchored by whoever writes it.
    Pattern(Regex),
}

impl PathMatcher {
    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Ok(PathMatcher::Pattern(Regex::new(re)?))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(literal) => literal == path,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathMatcher::Pattern(re) => re.is_match(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSet {
    Any,
    Only(Vec<Method>),
}

impl MethodSet {
    pub fn contains(&self, method: &Method) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::Only(methods) => methods.contains(method),
        }
    }

    /// `GET` and `OPTIONS`, the read-only default.
    pub fn read_only() -> Self {
        MethodSet::Only(vec![Method::GET, Method::OPTIONS])
    }
}

#[derive(Debug, Clone)]
pub struct ExemptionRule {
    pub path: PathMatcher,
    pub methods: MethodSet,
}

impl ExemptionRule {
    pub fn new(path: PathMatcher, methods: MethodSet) -> Self {
        Self { path, methods }
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.methods.contains(method) && self.path.matches(path)
    }
}

/// Immutable set of exemption rules, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ExemptionTable {
    rules: Vec<ExemptionRule>,
}

impl ExemptionTable {
    pub fn new(rules: Vec<ExemptionRule>) -> Self {
        Self { rules }
    }

    /// Rules for the public catalogue, static files, the login and
    /// registration endpoints, health probes and API docs.
    pub fn default_rules(api_version: &str) -> Result<Self, regex::Error> {
        let api = regex::escape(api_version);
        let users = format!("{api_version}/users");
        Ok(Self::new(vec![
            ExemptionRule::new(
                PathMatcher::pattern(&format!(r"^{api}/products(/.*)?$"))?,
                MethodSet::read_only(),
            ),
            ExemptionRule::new(
                PathMatcher::pattern(&format!(r"^{api}/categories(/.*)?$"))?,
                MethodSet::read_only(),
            ),
            ExemptionRule::new(PathMatcher::Prefix("/public/".to_string()), MethodSet::read_only()),
            ExemptionRule::new(PathMatcher::Exact(format!("{users}/login")), MethodSet::Any),
            ExemptionRule::new(PathMatcher::Exact(format!("{users}/register")), MethodSet::Any),
            ExemptionRule::new(
                PathMatcher::pattern(r"^/health(/live|/ready)?$")?,
                MethodSet::Only(vec![Method::GET]),
            ),
            ExemptionRule::new(
                PathMatcher::Prefix("/docs".to_string()),
                MethodSet::Only(vec![Method::GET]),
            ),
            ExemptionRule::new(
                PathMatcher::Exact("/api-doc/openapi.json".to_string()),
                MethodSet::Only(vec![Method::GET]),
            ),
        ]))
    }

    pub fn is_exempt(&self, method: &Method, path: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(method, path))
    }

    pub fn rules(&self) -> &[ExemptionRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ExemptionTable {
        ExemptionTable::default_rules("/api/v1").unwrap()
    }

    #[test]
    fn catalogue_reads_are_exempt() {
        let table = table();
        assert!(table.is_exempt(&Method::GET, "/api/v1/products/123"));
        assert!(table.is_exempt(&Method::OPTIONS, "/api/v1/products"));
        assert!(table.is_exempt(&Method::GET, "/api/v1/categories/9/items"));
    }

    #[test]
    fn catalogue_writes_are_not_exempt() {
        let table = table();
        assert!(!table.is_exempt(&Method::POST, "/api/v1/products/123"));
        assert!(!table.is_exempt(&Method::DELETE, "/api/v1/categories/1"));
    }

    #[test]
    fn login_and_register_are_exempt_for_any_method() {
        let table = table();
        for method in [Method::GET, Method::POST, Method::PUT, Method::OPTIONS] {
            assert!(table.is_exempt(&method, "/api/v1/users/login"));
            assert!(table.is_exempt(&method, "/api/v1/users/register"));
        }
    }

    #[test]
    fn literal_exemptions_match_whole_path_only() {
        let table = table();
        assert!(!table.is_exempt(&Method::POST, "/api/v1/users/login/extra"));
        assert!(!table.is_exempt(&Method::POST, "/x/api/v1/users/login"));
    }

    #[test]
    fn static_files_are_exempt_for_reads() {
        let table = table();
        assert!(table.is_exempt(&Method::GET, "/public/profile_pic/a.png"));
        assert!(!table.is_exempt(&Method::POST, "/public/profile_pic/a.png"));
    }

    #[test]
    fn prefixes_are_anchored() {
        let table = table();
        assert!(!table.is_exempt(&Method::GET, "/evil/public/x"));
        assert!(!table.is_exempt(&Method::GET, "/evil/api/v1/products"));
    }

    #[test]
    fn unknown_paths_require_auth() {
        let table = table();
        assert!(!table.is_exempt(&Method::GET, "/"));
        assert!(!table.is_exempt(&Method::GET, "/api/v1/users/"));
        assert!(!table.is_exempt(&Method::PUT, "/api/v1/users/change_password"));
        assert!(!table.is_exempt(&Method::POST, "/api/v1/users/uploadProfilePic"));
        assert!(!table.is_exempt(&Method::GET, "/anything/else"));
    }

    #[test]
    fn empty_table_exempts_nothing() {
        let table = ExemptionTable::default();
        assert!(!table.is_exempt(&Method::GET, "/api/v1/products/1"));
        assert!(table.rules().is_empty());
    }

    #[test]
    fn api_version_is_escaped() {
        let table = ExemptionTable::default_rules("/api/v1.0").unwrap();
        assert!(table.is_exempt(&Method::GET, "/api/v1.0/products/7"));
        assert!(!table.is_exempt(&Method::GET, "/api/v1x0/products/7"));
    }

    #[test]
    fn catalogue_pattern_stops_at_segment_boundary() {
        let table = table();
        assert!(table.is_exempt(&Method::GET, "/api/v1/products"));
        assert!(!table.is_exempt(&Method::GET, "/api/v1/productsecret"));
    }

    #[test]
    fn health_probes_are_exempt() {
        let table = table();
        assert!(table.is_exempt(&Method::GET, "/health"));
        assert!(table.is_exempt(&Method::GET, "/health/ready"));
        assert!(!table.is_exempt(&Method::GET, "/healthz"));
        assert!(!table.is_exempt(&Method::POST, "/health"));
    }
}
