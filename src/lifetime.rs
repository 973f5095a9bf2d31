//! Lifetime policies controlling how resolved instances are cached.

use std::fmt;
use std::str::FromStr;

use crate::error::{DiError, DiResult};

/// Caching policy of a node.
///
/// # Lifetime Characteristics
///
/// - **Singleton**: built at most once per graph, shared by every scope
/// - **PerDependency**: never cached, a fresh instance for every input slot
/// - **PerScope**: cached for one top-level call, dropped when it ends
/// - **PerRequest**: cached for one request scope; outside a request scope it
///   behaves like `PerScope`
///
/// Lifetimes also parse from their names, so definitions loaded from
/// configuration can carry them as strings:
///
/// ```rust
/// use ferrous_wire::Lifetime;
///
/// assert_eq!("singleton".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
/// assert_eq!("per_resolve".parse::<Lifetime>().unwrap(), Lifetime::PerScope);
/// assert_eq!("PerHttpRequest".parse::<Lifetime>().unwrap(), Lifetime::PerRequest);
/// assert!("forever".parse::<Lifetime>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(try_from = "String", into = "String"))]
pub enum Lifetime {
    /// Built once and shared by every scope.
    Singleton,
    /// Never cached.
    ///
    /// Given `fn new_foo(a: Arc<dyn Dep>, b: Arc<dyn Dep>)`, `a` and `b` are
    /// two separate instances.
    PerDependency,
    /// Cached within one scope.
    PerScope,
    /// Cached within one request scope, falling back to `PerScope`.
    PerRequest,
}

impl Lifetime {
    /// Canonical name, accepted back by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::PerDependency => "per_dependency",
            Lifetime::PerScope => "per_scope",
            Lifetime::PerRequest => "per_request",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "perdependency" | "transient" => Ok(Lifetime::PerDependency),
            "perscope" | "perresolve" | "scoped" => Ok(Lifetime::PerScope),
            "perrequest" | "perhttprequest" | "request" => Ok(Lifetime::PerRequest),
            _ => Err(DiError::UnknownLifetime(raw.to_string())),
        }
    }
}

/// Numeric lifetimes: 0 singleton, 1 per dependency, 2 per request,
/// 3 per scope.
impl TryFrom<u8> for Lifetime {
    type Error = DiError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Lifetime::Singleton),
            1 => Ok(Lifetime::PerDependency),
            2 => Ok(Lifetime::PerRequest),
            3 => Ok(Lifetime::PerScope),
            other => Err(DiError::UnknownLifetime(other.to_string())),
        }
    }
}

impl TryFrom<String> for Lifetime {
    type Error = DiError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Lifetime> for String {
    fn from(lifetime: Lifetime) -> Self {
        lifetime.as_str().to_string()
    }
}

/// Anything a definition accepts as its lifetime.
pub trait IntoLifetime {
    fn into_lifetime(self) -> DiResult<Lifetime>;
}

impl IntoLifetime for Lifetime {
    fn into_lifetime(self) -> DiResult<Lifetime> {
        Ok(self)
    }
}

impl IntoLifetime for &str {
    fn into_lifetime(self) -> DiResult<Lifetime> {
        self.parse()
    }
}

impl IntoLifetime for String {
    fn into_lifetime(self) -> DiResult<Lifetime> {
        self.parse()
    }
}

impl IntoLifetime for u8 {
    fn into_lifetime(self) -> DiResult<Lifetime> {
        Lifetime::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_display() {
        for lifetime in [
            Lifetime::Singleton,
            Lifetime::PerDependency,
            Lifetime::PerScope,
            Lifetime::PerRequest,
        ] {
            assert_eq!(lifetime.to_string().parse::<Lifetime>().unwrap(), lifetime);
        }
    }

    #[test]
    fn unknown_numeric_lifetime_is_rejected() {
        match 9u8.into_lifetime() {
            Err(DiError::UnknownLifetime(raw)) => assert_eq!(raw, "9"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
