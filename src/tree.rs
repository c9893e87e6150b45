//! Builds a nested display tree out of the flat tag list returned by the
//! server. Pure transform: the same input always yields the same tree.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Tag;

/// A tag together with its rendering metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Nests a flat tag list into a tree of [`TreeNode`]s.
///
/// Sibling order preserves input order. Tags whose parent id is missing from
/// the input (orphans), and tags caught in a parent cycle, are unreachable
/// from any root and are omitted from the result.
#[must_use]
pub fn build_tree(tags: &[Tag]) -> Vec<TreeNode> {
    // One pass groups child indices by parent id; assembly then walks the
    // grouping from the roots down instead of rescanning the list per level.
    let mut children_of: HashMap<Option<i64>, Vec<usize>> = HashMap::new();
    for (index, tag) in tags.iter().enumerate() {
        children_of.entry(tag.parent_id).or_default().push(index);
    }

    let mut visited = HashSet::new();
    assemble(tags, &children_of, None, 0, &mut visited)
}

fn assemble(
    tags: &[Tag],
    children_of: &HashMap<Option<i64>, Vec<usize>>,
    parent_id: Option<i64>,
    level: usize,
    visited: &mut HashSet<i64>,
) -> Vec<TreeNode> {
    let Some(indices) = children_of.get(&parent_id) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(indices.len());
    for &index in indices {
        let tag = &tags[index];
        // A duplicated id could otherwise place the same subtree twice.
        if !visited.insert(tag.id) {
            continue;
        }
        let children = assemble(tags, children_of, Some(tag.id), level + 1, visited);
        nodes.push(TreeNode {
            id: tag.id,
            name: tag.name.clone(),
            parent_id: tag.parent_id,
            level,
            children,
        });
    }
    nodes
}

/// True when the node has no children and may be offered for deletion.
#[must_use]
pub fn is_leaf(node: &TreeNode) -> bool {
    node.children.is_empty()
}

/// Walks the tree depth-first, yielding each node in display order.
pub fn walk<'a>(nodes: &'a [TreeNode], visit: &mut impl FnMut(&'a TreeNode)) {
    for node in nodes {
        visit(node);
        walk(&node.children, visit);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn tag(id: i64, name: &str, parent_id: Option<i64>) -> Tag {
        let now = Utc::now();
        Tag {
            id,
            user_id: "u1".to_string(),
            name: name.to_string(),
            parent_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn roots_are_exactly_the_parentless_tags() {
        let tags = vec![
            tag(1, "a", None),
            tag(2, "b", Some(1)),
            tag(3, "c", None),
        ];
        let tree = build_tree(&tags);

        assert_eq!(tree.len(), 2);
        assert!(tree.iter().all(|n| n.parent_id.is_none() && n.level == 0));
        assert_eq!(tree[0].id, 1);
        assert_eq!(tree[1].id, 3);
    }

    #[test]
    fn children_are_nested_with_incremented_level() {
        let tags = vec![
            tag(1, "a", None),
            tag(2, "b", Some(1)),
            tag(3, "c", Some(2)),
        ];
        let tree = build_tree(&tags);

        assert_eq!(tree.len(), 1);
        let b = &tree[0].children[0];
        assert_eq!(b.level, 1);
        let c = &b.children[0];
        assert_eq!(c.id, 3);
        assert_eq!(c.level, 2);
        assert!(c.children.is_empty());
    }

    #[test]
    fn orphans_are_omitted() {
        // The worked example: C points at a parent that does not exist.
        let tags = vec![
            tag(1, "A", None),
            tag(2, "B", Some(1)),
            tag(3, "C", Some(99)),
        ];
        let tree = build_tree(&tags);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, 2);

        let mut seen = Vec::new();
        walk(&tree, &mut |node| seen.push(node.id));
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn descendants_of_orphans_are_omitted_too() {
        let tags = vec![
            tag(1, "a", None),
            tag(2, "orphan", Some(42)),
            tag(3, "child-of-orphan", Some(2)),
        ];
        let tree = build_tree(&tags);

        let mut seen = Vec::new();
        walk(&tree, &mut |node| seen.push(node.id));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn cycles_do_not_hang_and_their_members_are_omitted() {
        let tags = vec![tag(1, "a", None), tag(2, "b", Some(3)), tag(3, "c", Some(2))];
        let tree = build_tree(&tags);

        let mut seen = Vec::new();
        walk(&tree, &mut |node| seen.push(node.id));
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn sibling_order_preserves_input_order() {
        let tags = vec![
            tag(5, "zebra", None),
            tag(2, "apple", None),
            tag(9, "mango", None),
        ];
        let tree = build_tree(&tags);
        let ids: Vec<i64> = tree.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn build_is_idempotent() {
        let tags = vec![
            tag(1, "a", None),
            tag(2, "b", Some(1)),
            tag(3, "c", Some(1)),
            tag(4, "d", Some(3)),
        ];
        assert_eq!(build_tree(&tags), build_tree(&tags));
    }

    #[test]
    fn every_reachable_tag_appears_exactly_once() {
        let tags = vec![
            tag(1, "a", None),
            tag(2, "b", Some(1)),
            tag(3, "c", Some(1)),
            tag(4, "d", Some(2)),
            tag(5, "e", None),
        ];
        let tree = build_tree(&tags);

        let mut seen = Vec::new();
        walk(&tree, &mut |node| seen.push(node.id));
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(seen.len(), sorted.len());
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        assert!(build_tree(&[]).is_empty());
    }

    #[test]
    fn leaf_check_gates_on_children() {
        let tags = vec![tag(1, "a", None), tag(2, "b", Some(1))];
        let tree = build_tree(&tags);
        assert!(!is_leaf(&tree[0]));
        assert!(is_leaf(&tree[0].children[0]));
    }
}
