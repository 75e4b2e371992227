//! Defines the core rendering trait and context for converting AST to SQL.

use crate::{ast::common::TableRef, dialect::Dialect};
use model::core::value::Value;

pub mod expr;
pub mod select;

/// A trait for any AST node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and the parameters, and provides
/// access to the dialect for syntax-specific details. Parameters are
/// numbered in the order they are written, across nested sub-queries.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final SQL string and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn add_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.get_placeholder(self.params.len() - 1);
        self.sql.push_str(&placeholder);
    }

    pub fn push_identifier(&mut self, ident: &str) {
        let quoted = self.dialect.quote_identifier(ident);
        self.sql.push_str(&quoted);
    }

    pub fn render_table_ref(&mut self, table: &TableRef) {
        if let Some(schema) = &table.schema {
            self.push_identifier(schema);
            self.sql.push('.');
        }
        self.push_identifier(&table.name);
    }

    pub fn render_table_alias(&mut self, alias: Option<&str>) {
        if let Some(alias) = alias {
            self.sql.push_str(self.dialect.table_alias_separator());
            self.push_identifier(alias);
        }
    }

    /// Renders `items` separated by `", "`.
    pub fn render_list<T: Render>(&mut self, items: &[T]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            item.render(self);
        }
    }
}

/// Renders a standalone AST piece, returning its text and parameters.
pub fn render_to_string<T: Render + ?Sized>(node: &T, dialect: &dyn Dialect) -> (String, Vec<Value>) {
    let mut renderer = Renderer::new(dialect);
    node.render(&mut renderer);
    renderer.finish()
}
