//! Route resolution.

use axum::http::Method;

use crate::config::{parse_method, ConfigError, RouteConfig};

/// A compiled routing rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub prefix: String,
    /// `None` means all methods.
    pub methods: Option<Vec<Method>>,
    pub backend: String,
    pub auth_required: bool,
}

impl RouteRule {
    fn accepts(&self, path: &str, method: &Method) -> bool {
        if let Some(methods) = &self.methods {
            if !methods.contains(method) {
                return false;
            }
        }
        prefix_matches(&self.prefix, path)
    }
}

/// Prefix match on path-segment boundaries: `/orders` covers `/orders` and
/// `/orders/42` but not `/ordersx`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// The routing table: most specific (longest) matching prefix wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn compile(routes: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(routes.len());
        for route in routes {
            let methods = match &route.methods {
                Some(raw) => Some(
                    raw.iter()
                        .map(|m| parse_method(m))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                None => None,
            };
            rules.push(RouteRule {
                prefix: route.prefix.clone(),
                methods,
                backend: route.backend.clone(),
                auth_required: route.auth_required,
            });
        }
        Ok(Self { rules })
    }

    pub fn resolve(&self, path: &str, method: &Method) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.accepts(path, method))
            .max_by_key(|rule| rule.prefix.trim_end_matches('/').len())
    }
}
