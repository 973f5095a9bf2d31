//! Build-time options for graph assembly.
//!
//! Options let deployments adjust definitions without touching code: today
//! that means overriding the lifetime of individual types, keyed by their
//! full type name.

use std::collections::HashMap;
use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};
use crate::lifetime::Lifetime;

/// Environment variable read by [`GraphOptions::from_env`].
pub const LIFETIMES_ENV: &str = "FERROUS_WIRE_LIFETIMES";

/// Options applied by [`Registry::build_with`](crate::Registry::build_with).
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{GraphOptions, Lifetime};
///
/// let options = GraphOptions::parse_overrides("dyn app::Cache=per_scope; dyn app::Pool = singleton").unwrap();
/// assert_eq!(options.lifetime_for("dyn app::Cache"), Some(Lifetime::PerScope));
/// assert_eq!(options.lifetime_for("dyn app::Other"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GraphOptions {
    /// Lifetime to use instead of the defined one, by full type name.
    pub lifetime_overrides: HashMap<String, Lifetime>,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the lifetime of the type named `type_name`.
    pub fn override_lifetime(mut self, type_name: impl Into<String>, lifetime: Lifetime) -> Self {
        self.lifetime_overrides.insert(type_name.into(), lifetime);
        self
    }

    /// Overrides the lifetime of `T`.
    pub fn override_lifetime_of<T: ?Sized + 'static>(self, lifetime: Lifetime) -> Self {
        self.override_lifetime(std::any::type_name::<T>(), lifetime)
    }

    /// Parses `type=lifetime` pairs separated by `;`.
    pub fn parse_overrides(raw: &str) -> DiResult<Self> {
        let mut options = Self::default();
        for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
            let (name, lifetime) = entry
                .rsplit_once('=')
                .ok_or_else(|| DiError::Config(format!("expected type=lifetime, got `{}`", entry)))?;
            options
                .lifetime_overrides
                .insert(name.trim().to_string(), lifetime.trim().parse()?);
        }
        Ok(options)
    }

    /// Reads overrides from `FERROUS_WIRE_LIFETIMES`; an unset variable
    /// yields the defaults.
    pub fn from_env() -> DiResult<Self> {
        match env::var(LIFETIMES_ENV) {
            Ok(raw) => Self::parse_overrides(&raw),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(err) => Err(DiError::Config(format!("{}: {}", LIFETIMES_ENV, err))),
        }
    }

    /// Parses options from JSON, e.g.
    /// `{"lifetime_overrides": {"dyn app::Cache": "per_scope"}}`.
    #[cfg(feature = "config")]
    pub fn from_json(raw: &str) -> DiResult<Self> {
        serde_json::from_str(raw).map_err(|err| DiError::Config(err.to_string()))
    }

    /// Override for `type_name`, if any.
    pub fn lifetime_for(&self, type_name: &str) -> Option<Lifetime> {
        self.lifetime_overrides.get(type_name).copied()
    }

    /// Override keys that name none of `defined`.
    pub(crate) fn unmatched_overrides<'a, I>(&'a self, defined: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'static str>,
    {
        if self.lifetime_overrides.is_empty() {
            return Vec::new();
        }
        let defined: Vec<&str> = defined.into_iter().collect();
        self.lifetime_overrides
            .keys()
            .map(String::as_str)
            .filter(|name| !defined.contains(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_entry_is_a_config_error() {
        assert!(matches!(
            GraphOptions::parse_overrides("dyn a::B"),
            Err(DiError::Config(_))
        ));
    }

    #[test]
    fn unknown_lifetime_in_overrides_is_rejected() {
        assert!(matches!(
            GraphOptions::parse_overrides("dyn a::B=eternal"),
            Err(DiError::UnknownLifetime(_))
        ));
    }

    #[test]
    fn builder_and_lookup_agree() {
        trait Pool {}
        let options = GraphOptions::new().override_lifetime_of::<dyn Pool>(Lifetime::PerRequest);
        assert_eq!(
            options.lifetime_for(std::any::type_name::<dyn Pool>()),
            Some(Lifetime::PerRequest)
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_overrides_parse() {
        let options =
            GraphOptions::from_json(r#"{"lifetime_overrides": {"dyn a::B": "per_request"}}"#).unwrap();
        assert_eq!(options.lifetime_for("dyn a::B"), Some(Lifetime::PerRequest));
    }
}
