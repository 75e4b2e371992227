//! Defines the `Dialect` trait for database-specific clause syntax.

use serde::{Deserialize, Serialize};

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - ANSI (unquoted): `my_column`
    /// - PostgreSQL uses double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for the parameter at `index` (zero based).
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn get_placeholder(&self, index: usize) -> String;

    /// Returns the name of the dialect (e.g., "PostgreSQL", "MySQL").
    fn name(&self) -> String;

    /// Text written between a table (or derived table) and its alias.
    fn table_alias_separator(&self) -> &'static str {
        " AS "
    }

    /// Function applied to both sides of a case-insensitive sort key.
    fn case_fold_function(&self) -> &'static str {
        "LOWER"
    }
}

/// How the ANSI dialect writes parameter markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?`
    #[default]
    Positional,
    /// `:p1`, `:p2`, ...
    Named,
}

/// Plain SQL: unquoted identifiers, bare table aliases (`FROM order t`).
#[derive(Debug, Clone, Default)]
pub struct Ansi {
    pub placeholder: PlaceholderStyle,
}

impl Ansi {
    pub fn named() -> Self {
        Self {
            placeholder: PlaceholderStyle::Named,
        }
    }
}

impl Dialect for Ansi {
    fn quote_identifier(&self, ident: &str) -> String {
        ident.to_string()
    }

    fn get_placeholder(&self, index: usize) -> String {
        match self.placeholder {
            PlaceholderStyle::Positional => "?".into(),
            PlaceholderStyle::Named => format!(":p{}", index + 1),
        }
    }

    fn name(&self) -> String {
        "ANSI".into()
    }

    fn table_alias_separator(&self) -> &'static str {
        " "
    }
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc.
        format!("${}", index + 1)
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl Dialect for MySql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn get_placeholder(&self, _index: usize) -> String {
        // MySQL uses ?
        "?".into()
    }

    fn name(&self) -> String {
        "MySQL".into()
    }
}
