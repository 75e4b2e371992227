use crate::{
    dialect::{Ansi, Dialect, MySql, PlaceholderStyle, Postgres},
    error::{CriteriaError, Result},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DIALECT_ENV: &str = "CRITERIA_DIALECT";
pub const PLACEHOLDER_ENV: &str = "CRITERIA_PLACEHOLDER";
pub const PROPERTY_AS_ALIAS_ENV: &str = "CRITERIA_PROPERTY_AS_ALIAS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Ansi,
    Postgres,
    Mysql,
}

/// Rendering defaults shared by a [`SqlManager`](crate::SqlManager) and a
/// [`CriteriaFactory`](crate::CriteriaFactory).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaConfig {
    pub dialect: DialectKind,
    /// Parameter style of the ANSI dialect; other dialects have a fixed one.
    pub placeholder: PlaceholderStyle,
    /// Whether new roots alias property-addressed columns by property name.
    pub property_as_alias: bool,
}

impl CriteriaConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CriteriaError::Config(format!("invalid criteria config: {}", e)))
    }

    /// Reads overrides from the process environment; unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CriteriaConfig::default();

        if let Some(value) = lookup(DIALECT_ENV) {
            config.dialect = parse_keyword(DIALECT_ENV, &value)?;
        }
        if let Some(value) = lookup(PLACEHOLDER_ENV) {
            config.placeholder = parse_keyword(PLACEHOLDER_ENV, &value)?;
        }
        if let Some(value) = lookup(PROPERTY_AS_ALIAS_ENV) {
            config.property_as_alias = value.trim().parse().map_err(|_| {
                CriteriaError::Config(format!(
                    "{} must be `true` or `false`, got `{}`",
                    PROPERTY_AS_ALIAS_ENV, value
                ))
            })?;
        }

        debug!("loaded criteria config from environment: {:?}", config);
        Ok(config)
    }

    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self.dialect {
            DialectKind::Ansi => Box::new(Ansi {
                placeholder: self.placeholder,
            }),
            DialectKind::Postgres => Box::new(Postgres),
            DialectKind::Mysql => Box::new(MySql),
        }
    }
}

fn parse_keyword<T: for<'de> Deserialize<'de>>(key: &str, value: &str) -> Result<T> {
    let keyword = serde_json::Value::String(value.trim().to_lowercase());
    serde_json::from_value(keyword)
        .map_err(|_| CriteriaError::Config(format!("unsupported value `{}` for {}", value, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_json_with_defaults() {
        let config = CriteriaConfig::from_json(r#"{ "dialect": "postgres" }"#).unwrap();
        assert_eq!(config.dialect, DialectKind::Postgres);
        assert_eq!(config.placeholder, PlaceholderStyle::Positional);
        assert!(!config.property_as_alias);
        assert_eq!(config.dialect().name(), "PostgreSQL");
    }

    #[test]
    fn test_from_json_rejects_unknown_dialect() {
        let err = CriteriaConfig::from_json(r#"{ "dialect": "oracle" }"#).unwrap_err();
        assert!(matches!(err, CriteriaError::Config(_)));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DIALECT_ENV, "ANSI"),
            (PLACEHOLDER_ENV, "named"),
            (PROPERTY_AS_ALIAS_ENV, "true"),
        ]);
        let config = CriteriaConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.dialect, DialectKind::Ansi);
        assert!(config.property_as_alias);
        assert_eq!(config.dialect().get_placeholder(1), ":p2");
    }

    #[test]
    fn test_from_lookup_rejects_bad_flag() {
        let err = CriteriaConfig::from_lookup(|key| {
            (key == PROPERTY_AS_ALIAS_ENV).then(|| "sometimes".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, CriteriaError::Config(msg) if msg.contains("sometimes")));
    }
}
