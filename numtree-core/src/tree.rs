//! Reply trees: assembly from flat rows and aggregation
//!
//! Rows usually come from a recursive SQL query, so they arrive flat with a
//! parent reference each. Assembly and every traversal here are iterative;
//! chains of arbitrary length never recurse on the call stack.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::derivation::{audit_post, Violation};
use crate::operation::OperationKind;

/// A row that can be placed in a reply tree.
pub trait TreeNode {
    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
    fn value(&self) -> f64;
    /// Operation that derived this node from its parent (`None` for roots)
    fn operation(&self) -> Option<(OperationKind, f64)>;
}

/// A node with its ordered children
#[derive(Debug, Clone)]
pub struct Tree<T> {
    pub node: T,
    pub children: Vec<Tree<T>>,
}

/// Aggregates over a (sub)tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    /// Number of posts including the root
    pub size: usize,
    /// Longest root-to-leaf path in edges (root alone = 0)
    pub depth: usize,
    pub leaves: usize,
    pub min_value: f64,
    pub max_value: f64,
}

/// Assemble the tree rooted at `root_id` from a flat set of rows.
///
/// Children keep the order in which they appear in `rows`. Rows that are not
/// connected to the root are ignored, as are repeated ids after the first.
/// Returns `None` if no row has `root_id`.
pub fn build_tree<T, I>(root_id: Uuid, rows: I) -> Option<Tree<T>>
where
    T: TreeNode,
    I: IntoIterator<Item = T>,
{
    let mut slots: Vec<Option<T>> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut children_of: HashMap<Uuid, Vec<usize>> = HashMap::new();

    for row in rows {
        let id = row.id();
        if index.contains_key(&id) {
            continue;
        }
        let slot = slots.len();
        if let Some(parent) = row.parent_id() {
            children_of.entry(parent).or_default().push(slot);
        }
        index.insert(id, slot);
        slots.push(Some(row));
    }

    let root_slot = *index.get(&root_id)?;

    // Breadth-first order from the root; reversed, it visits every child
    // before its parent.
    let mut order = vec![root_slot];
    let mut seen = HashSet::from([root_slot]);
    let mut cursor = 0;
    while cursor < order.len() {
        let slot = order[cursor];
        cursor += 1;
        let id = slots[slot].as_ref().map(T::id)?;
        if let Some(kids) = children_of.get(&id) {
            for &kid in kids {
                if seen.insert(kid) {
                    order.push(kid);
                }
            }
        }
    }

    let mut built: HashMap<usize, Tree<T>> = HashMap::with_capacity(order.len());
    for &slot in order.iter().rev() {
        let node = slots[slot].take()?;
        let children = children_of
            .get(&node.id())
            .map(|kids| kids.iter().filter_map(|k| built.remove(k)).collect())
            .unwrap_or_default();
        built.insert(slot, Tree { node, children });
    }

    built.remove(&root_slot)
}

impl<T> Tree<T> {
    /// Depth-first, pre-order iterator yielding `(depth, node)`.
    pub fn iter(&self) -> TreeIter<'_, T> {
        TreeIter {
            stack: vec![(0, self)],
        }
    }

    /// Number of nodes including the root
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        self.iter().map(|(d, _)| d).max().unwrap_or(0)
    }

    /// Number of nodes without children
    pub fn leaf_count(&self) -> usize {
        self.walk().filter(|t| t.children.is_empty()).count()
    }

    /// Find a node by id anywhere in the tree
    pub fn find(&self, id: Uuid) -> Option<&Tree<T>>
    where
        T: TreeNode,
    {
        self.walk().find(|t| t.node.id() == id)
    }

    fn walk(&self) -> impl Iterator<Item = &Tree<T>> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

impl<T: TreeNode> Tree<T> {
    /// Smallest and largest value in the tree
    pub fn value_range(&self) -> (f64, f64) {
        self.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, n)| {
            (lo.min(n.value()), hi.max(n.value()))
        })
    }

    /// Size, depth, leaf count and value range together
    pub fn stats(&self) -> TreeStats {
        let (min_value, max_value) = self.value_range();
        TreeStats {
            size: self.size(),
            depth: self.depth(),
            leaves: self.leaf_count(),
            min_value,
            max_value,
        }
    }

    /// Every node whose stored value or structure breaks the derivation
    /// invariants.
    ///
    /// The subtree root is only checked when it is a true root (no parent),
    /// since its parent's value is not part of the tree.
    pub fn inconsistencies(&self) -> Vec<(Uuid, Violation)> {
        let mut found = Vec::new();

        if self.node.parent_id().is_none() {
            if let Err(v) = audit_post(None, self.node.operation(), self.node.value()) {
                found.push((self.node.id(), v));
            }
        }

        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            let parent_value = tree.node.value();
            for child in tree.children.iter().rev() {
                if let Err(v) = audit_post(
                    Some(parent_value),
                    child.node.operation(),
                    child.node.value(),
                ) {
                    found.push((child.node.id(), v));
                }
                stack.push(child);
            }
        }

        found
    }
}

/// Pre-order iterator over a [`Tree`]
pub struct TreeIter<'a, T> {
    stack: Vec<(usize, &'a Tree<T>)>,
}

impl<'a, T> Iterator for TreeIter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, tree) = self.stack.pop()?;
        self.stack
            .extend(tree.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, &tree.node))
    }
}
