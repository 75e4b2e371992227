//! State shared by every node of one criteria tree.

use crate::{
    alias::AliasRegistry,
    ast::common::JoinKind,
    error::{CriteriaError, Result},
    node::{CriteriaNode, Filter, JoinEdge, JoinState, NodeSource, OuterRef, ResultConfig},
    resolver::PropertyResolver,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
    sync::Arc,
};
use tracing::debug;

/// Index of a node in its tree's arena.
pub type NodeId = usize;

pub(crate) type SharedContext = Rc<RefCell<TreeContext>>;

/// Attached joins, keyed by the graph key of the node they hang under.
/// Each list is in attachment order, which is also emission order.
#[derive(Debug, Default, Clone)]
pub(crate) struct JoinGraph {
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl JoinGraph {
    pub fn attach(&mut self, key: NodeId, child: NodeId) {
        self.children.entry(key).or_default().push(child);
    }

    pub fn children(&self, key: NodeId) -> &[NodeId] {
        self.children.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Arena of nodes plus the alias registry and join graph they share.
pub(crate) struct TreeContext {
    pub nodes: Vec<CriteriaNode>,
    pub aliases: AliasRegistry,
    pub joins: JoinGraph,
    pub resolver: Arc<dyn PropertyResolver>,
}

impl TreeContext {
    /// A tree holding only its root node (id 0).
    pub fn with_root(
        resolver: Arc<dyn PropertyResolver>,
        source: NodeSource,
        explicit: Option<&str>,
        reserved: Vec<String>,
        result: ResultConfig,
        outer: Option<OuterRef>,
    ) -> SharedContext {
        let (aliases, alias) = AliasRegistry::for_root(source.entity(), explicit, reserved, 0);
        let mut root = CriteriaNode::new(source, alias, 0);
        root.result = result;
        root.outer = outer;

        Rc::new(RefCell::new(TreeContext {
            nodes: vec![root],
            aliases,
            joins: JoinGraph::default(),
            resolver,
        }))
    }

    pub fn node(&self, id: NodeId) -> &CriteriaNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CriteriaNode {
        &mut self.nodes[id]
    }

    /// Adds an unattached join node created from `reference`.
    pub fn add_join(
        &mut self,
        reference: NodeId,
        source: NodeSource,
        kind: JoinKind,
        explicit: Option<&str>,
    ) -> Result<NodeId> {
        let id = self.nodes.len();
        let alias = self.aliases.allocate(source.entity(), explicit, id)?;

        let mut node = CriteriaNode::new(source, alias, id);
        node.result = self.nodes[reference].result.clone();
        node.join = Some(JoinEdge {
            kind,
            reference,
            parent: None,
            conditions: Vec::new(),
        });

        debug!(
            "created {} `{}` from `{}`",
            kind.keyword(),
            node.alias,
            self.nodes[reference].alias
        );
        self.nodes.push(node);
        Ok(id)
    }

    /// Adds a copy of `id` sharing its alias and join list.
    pub fn add_branch(&mut self, id: NodeId) -> NodeId {
        let branch_id = self.nodes.len();
        let branch = self.nodes[id].branch();
        self.nodes.push(branch);
        branch_id
    }

    /// Links join `child` under `parent`.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<()> {
        let child_alias = self.nodes[child].alias.clone();
        let edge = self.nodes[child]
            .join
            .as_ref()
            .ok_or_else(|| CriteriaError::NullReference {
                alias: child_alias.clone(),
                context: "only join criteria can be attached".to_string(),
            })?;

        if let Some(existing) = edge.parent {
            return Err(CriteriaError::JoinAlreadyAttached {
                alias: child_alias,
                parent: self.nodes[existing].alias.clone(),
            });
        }

        if self.reaches(child, self.nodes[parent].graph_key) {
            return Err(CriteriaError::Cycle(child_alias));
        }

        let key = self.nodes[parent].graph_key;
        if let Some(edge) = self.nodes[child].join.as_mut() {
            edge.parent = Some(parent);
        }
        self.joins.attach(key, child);

        debug!(
            "attached `{}` to `{}`",
            child_alias, self.nodes[parent].alias
        );
        Ok(())
    }

    /// Whether the subtree below `from` (itself included) owns graph key `key`.
    fn reaches(&self, from: NodeId, key: NodeId) -> bool {
        let mut stack = vec![self.nodes[from].graph_key];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == key {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(
                self.joins
                    .children(current)
                    .iter()
                    .map(|child| self.nodes[*child].graph_key),
            );
        }
        false
    }

    pub fn join_state(&self, id: NodeId) -> Option<JoinState> {
        self.nodes[id].join.as_ref().map(JoinEdge::state)
    }

    /// Every join of the tree must be attached and conditioned.
    pub fn validate_joins(&self) -> Result<()> {
        for node in &self.nodes {
            let Some(edge) = &node.join else {
                continue;
            };
            match edge.state() {
                JoinState::Attached if edge.conditions.is_empty() => {
                    return Err(incomplete(&node.alias, "no on-condition"));
                }
                JoinState::Attached => {}
                _ => return Err(incomplete(&node.alias, "never attached")),
            }
        }
        Ok(())
    }

    /// Sub-query contexts referenced by this tree's nodes.
    pub fn nested(&self) -> Vec<SharedContext> {
        let mut nested = Vec::new();
        for node in &self.nodes {
            if let NodeSource::SubQuery { sub, .. } = &node.source {
                nested.push(Rc::clone(&sub.ctx));
            }
            for filter in &node.filters {
                match filter {
                    Filter::InSubQuery { sub, .. } | Filter::Exists { sub, .. } => {
                        nested.push(Rc::clone(&sub.ctx))
                    }
                    _ => {}
                }
            }
        }
        nested
    }
}

fn incomplete(alias: &str, reason: &str) -> CriteriaError {
    CriteriaError::IncompleteJoin {
        alias: alias.to_string(),
        reason: reason.to_string(),
    }
}

/// Whether `haystack` is `needle` or nests it at any depth.
pub(crate) fn contains_context(haystack: &SharedContext, needle: &SharedContext) -> bool {
    if Rc::ptr_eq(haystack, needle) {
        return true;
    }
    let nested = haystack.borrow().nested();
    nested.iter().any(|ctx| contains_context(ctx, needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CachedResolver;
    use model::{core::entity::Entity, entity, metadata::MetadataRegistry};

    entity! {
        struct Node => "node" {
            ID: "id" => "id" as Long,
            PARENT_ID: "parentId" => "parent_id" as Long,
        }
    }

    fn tree() -> SharedContext {
        let registry = MetadataRegistry::new().with::<Node>().unwrap();
        TreeContext::with_root(
            Arc::new(CachedResolver::new(Arc::new(registry))),
            NodeSource::Entity(Node::entity_type()),
            None,
            Vec::new(),
            ResultConfig::default(),
            None,
        )
    }

    fn join(ctx: &SharedContext, reference: NodeId) -> NodeId {
        ctx.borrow_mut()
            .add_join(reference, NodeSource::Entity(Node::entity_type()), JoinKind::Inner, None)
            .unwrap()
    }

    #[test]
    fn test_join_lifecycle() {
        let ctx = tree();
        let child = join(&ctx, 0);
        let mut tree = ctx.borrow_mut();
        assert_eq!(tree.join_state(child), Some(JoinState::Created));
        assert_eq!(tree.join_state(0), None);

        tree.node_mut(child)
            .join
            .as_mut()
            .unwrap()
            .conditions
            .push(crate::node::OnCondition {
                left: "parent_id".into(),
                right: "id".into(),
            });
        assert_eq!(tree.join_state(child), Some(JoinState::Conditioned));

        tree.attach(child, 0).unwrap();
        assert_eq!(tree.join_state(child), Some(JoinState::Attached));
        assert_eq!(tree.joins.children(0), &[child]);
        assert!(tree.validate_joins().is_ok());
    }

    #[test]
    fn test_second_attach_fails() {
        let ctx = tree();
        let child = join(&ctx, 0);
        let mut tree = ctx.borrow_mut();
        tree.attach(child, 0).unwrap();

        let err = tree.attach(child, 0).unwrap_err();
        assert_eq!(
            err,
            CriteriaError::JoinAlreadyAttached {
                alias: "n1".into(),
                parent: "n".into(),
            }
        );
    }

    #[test]
    fn test_attach_under_own_subtree_is_a_cycle() {
        let ctx = tree();
        let first = join(&ctx, 0);
        let second = join(&ctx, first);
        let mut tree = ctx.borrow_mut();
        tree.attach(second, first).unwrap();

        assert_eq!(tree.attach(first, second), Err(CriteriaError::Cycle("n1".into())));
        assert_eq!(tree.attach(first, first), Err(CriteriaError::Cycle("n1".into())));
    }

    #[test]
    fn test_unattached_join_is_incomplete() {
        let ctx = tree();
        join(&ctx, 0);
        let err = ctx.borrow().validate_joins().unwrap_err();
        assert_eq!(
            err,
            CriteriaError::IncompleteJoin {
                alias: "n1".into(),
                reason: "never attached".into(),
            }
        );
    }

    #[test]
    fn test_branch_shares_join_list() {
        let ctx = tree();
        let child = join(&ctx, 0);
        let mut tree = ctx.borrow_mut();
        tree.attach(child, 0).unwrap();

        let branch = tree.add_branch(0);
        assert_eq!(tree.node(branch).alias, "n");
        assert_eq!(tree.joins.children(tree.node(branch).graph_key), &[child]);
        assert_eq!(tree.aliases.len(), 2);
    }
}
