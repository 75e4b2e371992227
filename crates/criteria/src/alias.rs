//! Table alias allocation for one query tree.

use crate::{
    context::NodeId,
    error::{CriteriaError, Result},
};
use model::core::entity::EntityType;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Alias bookkeeping shared by the root of a tree and every join attached to it.
///
/// Derived aliases are the lowercased first letter of the entity name,
/// followed by a per-token counter from the second use on (`o`, `o1`, `o2`).
#[derive(Debug, Default, Clone)]
pub struct AliasRegistry {
    entries: HashMap<String, NodeId>,
    counters: HashMap<String, usize>,
    /// Names derivation must avoid without owning them, e.g. the aliases of
    /// an enclosing query.
    reserved: HashSet<String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of a fresh tree, with its root already registered under
    /// `explicit` or a derived alias that avoids `reserved`.
    pub fn for_root<I>(
        entity: &EntityType,
        explicit: Option<&str>,
        reserved: I,
        root: NodeId,
    ) -> (Self, String)
    where
        I: IntoIterator<Item = String>,
    {
        let mut registry = Self::new();
        registry.reserve(reserved);
        let alias = match explicit {
            Some(alias) => alias.to_string(),
            None => registry.next_alias(entity),
        };
        debug!("registered root alias `{}`", alias);
        registry.entries.insert(alias.clone(), root);
        (registry, alias)
    }

    /// Next free derived alias for `entity`. Does not register it.
    pub fn next_alias(&mut self, entity: &EntityType) -> String {
        let token = alias_token(entity.name());
        loop {
            let counter = self.counters.entry(token.clone()).or_insert(0);
            let candidate = if *counter == 0 {
                token.clone()
            } else {
                format!("{token}{counter}")
            };
            *counter += 1;

            if !self.entries.contains_key(&candidate) && !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }

    pub fn register(&mut self, alias: &str, node: NodeId) -> Result<()> {
        if self.entries.contains_key(alias) {
            return Err(CriteriaError::DuplicateAlias(alias.to_string()));
        }
        debug!("registered alias `{}` for node {}", alias, node);
        self.entries.insert(alias.to_string(), node);
        Ok(())
    }

    /// Registers `explicit` when given, otherwise a derived alias.
    pub fn allocate(
        &mut self,
        entity: &EntityType,
        explicit: Option<&str>,
        node: NodeId,
    ) -> Result<String> {
        let alias = match explicit {
            Some(alias) => alias.to_string(),
            None => self.next_alias(entity),
        };
        self.register(&alias, node)?;
        Ok(alias)
    }

    pub fn reserve<I, S>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(aliases.into_iter().map(Into::into));
    }

    pub fn lookup(&self, alias: &str) -> Option<NodeId> {
        self.entries.get(alias).copied()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn alias_token(entity_name: &str) -> String {
    entity_name
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase().to_string())
        .unwrap_or_else(|| "t".to_string())
}
