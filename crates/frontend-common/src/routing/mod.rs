//! Route table, locations and path matching

pub mod guard;
pub mod router;

pub use guard::{NavigationState, Redirect, RouteGuard};
pub use router::{History, MemoryHistory, RouteError, Router};

use quill_http::Audience;
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Query key carrying the return destination on the sign-in view
pub const REDIRECT_QUERY_KEY: &str = "redirect";

/// Every named view of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    About,
    BlogDetail,
    Tools,
    AdminLogin,
    Admin,
    AdminPosts,
    AdminPostCreate,
    AdminPostEdit,
    AdminCategories,
    AdminTags,
    AdminComments,
    AdminUsers,
}

impl RouteName {
    /// Path pattern of the route, `:name` segments are parameters
    pub fn pattern(self) -> &'static str {
        ROUTES
            .iter()
            .find(|route| route.name == self)
            .map_or("/", |route| route.pattern)
    }
}

/// Static description of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: RouteName,
    pub pattern: &'static str,
    pub requires_auth: bool,
    pub audience: Audience,
    pub title: Option<&'static str>,
    /// Navigation to this route continues to another one
    pub redirect: Option<RouteName>,
}

impl RouteDescriptor {
    const fn public(name: RouteName, pattern: &'static str, title: &'static str) -> Self {
        Self {
            name,
            pattern,
            requires_auth: false,
            audience: Audience::Front,
            title: Some(title),
            redirect: None,
        }
    }

    const fn admin(name: RouteName, pattern: &'static str, title: &'static str) -> Self {
        Self {
            name,
            pattern,
            requires_auth: true,
            audience: Audience::Admin,
            title: Some(title),
            redirect: None,
        }
    }
}

/// The application's routes, first match wins
pub static ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor::public(RouteName::Home, "/", "Home"),
    RouteDescriptor::public(RouteName::About, "/about", "About"),
    RouteDescriptor::public(RouteName::BlogDetail, "/blog/:id", "Post"),
    RouteDescriptor::public(RouteName::Tools, "/tools", "Tools"),
    RouteDescriptor {
        requires_auth: false,
        ..RouteDescriptor::admin(RouteName::AdminLogin, "/admin/login", "Sign in")
    },
    RouteDescriptor {
        title: None,
        redirect: Some(RouteName::AdminPosts),
        ..RouteDescriptor::admin(RouteName::Admin, "/admin", "")
    },
    RouteDescriptor::admin(RouteName::AdminPosts, "/admin/posts", "Posts"),
    RouteDescriptor::admin(RouteName::AdminPostCreate, "/admin/posts/create", "New post"),
    RouteDescriptor::admin(RouteName::AdminPostEdit, "/admin/posts/edit/:id", "Edit post"),
    RouteDescriptor::admin(RouteName::AdminCategories, "/admin/categories", "Categories"),
    RouteDescriptor::admin(RouteName::AdminTags, "/admin/tags", "Tags"),
    RouteDescriptor::admin(RouteName::AdminComments, "/admin/comments", "Comments"),
    RouteDescriptor::admin(RouteName::AdminUsers, "/admin/users", "Users"),
];

/// A path plus decoded query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            query: Vec::new(),
        }
    }

    /// Parse `path?query#fragment`; the fragment is dropped
    pub fn parse(full_path: &str) -> Self {
        let without_fragment = full_path.split('#').next().unwrap_or_default();
        let (path, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        Self {
            path: normalize_path(path),
            query: form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Path with the encoded query string, if any
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish();
        format!("{}?{query}", self.path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A resolved navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static RouteDescriptor,
    pub params: BTreeMap<String, String>,
    pub location: Location,
}

impl RouteMatch {
    pub const fn name(&self) -> RouteName {
        self.route.name
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Matches locations against a static route list
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    routes: &'static [RouteDescriptor],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self { routes: ROUTES }
    }
}

impl RouteTable {
    pub const fn new(routes: &'static [RouteDescriptor]) -> Self {
        Self { routes }
    }

    pub const fn routes(&self) -> &'static [RouteDescriptor] {
        self.routes
    }

    pub fn resolve(&self, location: &Location) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            match_pattern(route.pattern, &location.path).map(|params| RouteMatch {
                route,
                params,
                location: location.clone(),
            })
        })
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let mut pattern_segments = pattern.split('/').filter(|s| !s.is_empty());
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());
    let mut params = BTreeMap::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    params.insert(name.to_string(), actual.to_string());
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_audience_follows_path() {
        for route in ROUTES {
            assert_eq!(
                route.audience,
                Audience::classify(route.pattern),
                "{:?}",
                route.name
            );
        }
    }

    #[test]
    fn test_only_login_is_open_in_admin_area() {
        let open: Vec<_> = ROUTES
            .iter()
            .filter(|r| r.audience == Audience::Admin && !r.requires_auth)
            .map(|r| r.name)
            .collect();
        assert_eq!(open, vec![RouteName::AdminLogin]);
    }

    #[test]
    fn test_resolve_literal_and_param_routes() {
        let table = RouteTable::default();

        let m = table.resolve(&Location::parse("/admin/posts/")).unwrap();
        assert_eq!(m.name(), RouteName::AdminPosts);

        let m = table.resolve(&Location::parse("/admin/posts/create")).unwrap();
        assert_eq!(m.name(), RouteName::AdminPostCreate);

        let m = table.resolve(&Location::parse("/admin/posts/edit/42")).unwrap();
        assert_eq!(m.name(), RouteName::AdminPostEdit);
        assert_eq!(m.param("id"), Some("42"));

        let m = table.resolve(&Location::parse("/blog/hello-world?ref=home")).unwrap();
        assert_eq!(m.name(), RouteName::BlogDetail);
        assert_eq!(m.location.query_value("ref"), Some("home"));

        assert_eq!(
            table.resolve(&Location::parse("")).unwrap().name(),
            RouteName::Home
        );
        assert!(table.resolve(&Location::parse("/blog")).is_none());
        assert!(table.resolve(&Location::parse("/admin/posts/edit")).is_none());
    }

    #[test]
    fn test_location_full_path_encodes_query() {
        let location = Location::new("/admin/login").with_query(REDIRECT_QUERY_KEY, "/admin/posts?page=2");
        assert_eq!(
            location.full_path(),
            "/admin/login?redirect=%2Fadmin%2Fposts%3Fpage%3D2"
        );

        let parsed = Location::parse(&location.full_path());
        assert_eq!(parsed, location);
        assert_eq!(parsed.query_value(REDIRECT_QUERY_KEY), Some("/admin/posts?page=2"));
    }

    #[test]
    fn test_pattern_lookup() {
        assert_eq!(RouteName::AdminLogin.pattern(), "/admin/login");
        assert_eq!(RouteName::AdminPosts.pattern(), "/admin/posts");
    }
}
