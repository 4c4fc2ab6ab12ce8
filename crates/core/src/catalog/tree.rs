//! Category tree built from the CMS's flat category list.
//!
//! The CMS hands categories out as flat records, each pointing at its parent
//! and optionally listing its children. [`CategoryTree`] indexes both link
//! directions once and answers the two questions the storefront asks:
//! "every category with its parent" (product feed) and "every category below
//! this one" (subtree listings and attribute facets).
//!
//! Traversals carry a visited set, so a cyclic snapshot terminates instead of
//! recursing forever.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::CategoryId;

/// A category record as delivered by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<CategoryId>,
    /// Child links listed on the record itself, if the CMS populated them.
    #[serde(default)]
    pub children: Vec<CategoryId>,
}

/// A category annotated with its resolved parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatCategory<'a> {
    pub id: CategoryId,
    pub name: &'a str,
    pub slug: &'a str,
    /// `None` for roots and for categories whose parent is not in the snapshot.
    /// An explicit `parent_id` takes precedence over a parent's `children` list.
    pub parent_id: Option<CategoryId>,
}

/// Read-only parent/child index over a category snapshot.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    by_id: HashMap<CategoryId, usize>,
    children: HashMap<CategoryId, Vec<CategoryId>>,
    parents: HashMap<CategoryId, CategoryId>,
}

impl CategoryTree {
    /// Index a flat list of categories.
    ///
    /// When the same ID appears twice, the first record wins. Child links are
    /// merged from `parent_id` and from each record's `children` list.
    #[must_use]
    pub fn new(categories: impl IntoIterator<Item = CategoryNode>) -> Self {
        let mut nodes = Vec::new();
        let mut by_id = HashMap::new();

        for node in categories {
            if by_id.contains_key(&node.id) {
                continue;
            }
            by_id.insert(node.id, nodes.len());
            nodes.push(node);
        }

        let mut children: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();
        let mut parents = HashMap::new();
        let mut link = |parent: CategoryId, child: CategoryId| {
            if parent == child {
                return;
            }
            parents.entry(child).or_insert(parent);
            let list = children.entry(parent).or_default();
            if !list.contains(&child) {
                list.push(child);
            }
        };

        for node in &nodes {
            if let Some(parent) = node.parent_id
                && by_id.contains_key(&parent)
            {
                link(parent, node.id);
            }
        }
        for node in &nodes {
            for &child in &node.children {
                if by_id.contains_key(&child) {
                    link(node.id, child);
                }
            }
        }

        Self {
            nodes,
            by_id,
            children,
            parents,
        }
    }

    /// Number of distinct categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a category by ID.
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.by_id.get(&id).and_then(|&idx| self.nodes.get(idx))
    }

    /// Look up a category by ID, with its parent resolved.
    #[must_use]
    pub fn get_flat(&self, id: CategoryId) -> Option<FlatCategory<'_>> {
        self.get(id).map(|node| FlatCategory {
            id: node.id,
            name: &node.name,
            slug: &node.slug,
            parent_id: self.resolved_parent(node),
        })
    }

    /// Look up a category by its slug.
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&CategoryNode> {
        self.nodes.iter().find(|node| node.slug == slug)
    }

    /// Direct children of a category, in discovery order.
    #[must_use]
    pub fn children_of(&self, id: CategoryId) -> &[CategoryId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Categories without a parent in this snapshot.
    pub fn roots(&self) -> impl Iterator<Item = &CategoryNode> {
        self.nodes
            .iter()
            .filter(|node| self.resolved_parent(node).is_none())
    }

    /// Every category exactly once, in input order, with its parent resolved.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatCategory<'_>> {
        self.nodes
            .iter()
            .map(|node| FlatCategory {
                id: node.id,
                name: &node.name,
                slug: &node.slug,
                parent_id: self.resolved_parent(node),
            })
            .collect()
    }

    /// All categories transitively below `root`, depth-first, `root` excluded.
    ///
    /// Returns an empty list when `root` is not part of the snapshot. Callers
    /// that need the root in the set add it themselves.
    #[must_use]
    pub fn descendant_ids(&self, root: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        if !self.by_id.contains_key(&root) {
            return out;
        }

        let mut visited = HashSet::from([root]);
        let mut stack: Vec<CategoryId> = self.children_of(root).iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children_of(id).iter().rev().copied());
        }

        out
    }

    /// Ancestor chain from the top-level category down to `id` (inclusive).
    ///
    /// Empty when `id` is unknown.
    #[must_use]
    pub fn path_to(&self, id: CategoryId) -> Vec<&CategoryNode> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.get(id);

        while let Some(node) = current {
            if !visited.insert(node.id) {
                break;
            }
            path.push(node);
            current = self.resolved_parent(node).and_then(|parent| self.get(parent));
        }

        path.reverse();
        path
    }

    fn resolved_parent(&self, node: &CategoryNode) -> Option<CategoryId> {
        self.parents.get(&node.id).copied()
    }
}
