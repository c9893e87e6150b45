use std::fmt;

use inquire::{InquireError, Select};

use crate::tree::{build_tree, is_leaf, walk};
use crate::types::Tag;

/// Tree node flattened for display, indented by depth.
#[derive(Clone)]
pub struct TagNodeDisplay {
    pub id: i64,
    pub name: String,
    pub level: usize,
    pub has_children: bool,
}

impl fmt::Display for TagNodeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", "  ".repeat(self.level), self.name)
    }
}

/// Flatten a tree into display rows, parents before their children.
pub fn tree_to_displays(tags: &[Tag]) -> Vec<TagNodeDisplay> {
    let tree = build_tree(tags);
    let mut displays = Vec::with_capacity(tags.len());
    walk(&tree, &mut |node| {
        displays.push(TagNodeDisplay {
            id: node.id,
            name: node.name.clone(),
            level: node.level,
            has_children: !is_leaf(node),
        });
    });
    displays
}

/// Print the tag hierarchy as an indented list.
pub fn print_tag_tree(tags: &[Tag]) {
    let displays = tree_to_displays(tags);
    if displays.is_empty() {
        println!("No tags found.");
        return;
    }
    println!();
    for display in displays {
        println!("  {display}");
    }
    println!();
}

/// The rows offered for selection. With `leaves_only`, tags that still have
/// children are left out.
pub fn selectable_displays(tags: &[Tag], leaves_only: bool) -> Vec<TagNodeDisplay> {
    let mut displays = tree_to_displays(tags);
    if leaves_only {
        displays.retain(|d| !d.has_children);
    }
    displays
}

/// Pick a tag from the hierarchy.
pub fn pick_tag(
    tags: &[Tag],
    message: &str,
    leaves_only: bool,
) -> anyhow::Result<Option<TagNodeDisplay>> {
    let displays = selectable_displays(tags, leaves_only);

    if displays.is_empty() {
        println!("No tags found.");
        return Ok(None);
    }

    let selection = Select::new(message, displays)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(display) => Ok(Some(display)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Pick a parent for a new tag, with an explicit root option.
pub fn pick_parent(tags: &[Tag]) -> anyhow::Result<Option<Option<i64>>> {
    #[derive(Clone)]
    enum ParentOption {
        Root,
        Node(TagNodeDisplay),
    }

    impl fmt::Display for ParentOption {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ParentOption::Root => write!(f, "(no parent)"),
                ParentOption::Node(display) => display.fmt(f),
            }
        }
    }

    let mut options = vec![ParentOption::Root];
    options.extend(tree_to_displays(tags).into_iter().map(ParentOption::Node));

    let selection = Select::new("Parent tag:", options)
        .with_page_size(15)
        .with_help_message("Type to filter, Enter to select")
        .with_vim_mode(true)
        .prompt();

    match selection {
        Ok(ParentOption::Root) => Ok(Some(None)),
        Ok(ParentOption::Node(display)) => Ok(Some(Some(display.id))),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Request confirmation for a destructive operation
pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
    fn displays_follow_tree_order_and_depth() {
        let tags = vec![
            tag(1, "work", None),
            tag(2, "home", None),
            tag(3, "projects", Some(1)),
        ];
        let displays = tree_to_displays(&tags);
        let rows: Vec<(i64, usize)> = displays.iter().map(|d| (d.id, d.level)).collect();
        assert_eq!(rows, vec![(1, 0), (3, 1), (2, 0)]);
        assert!(displays[0].has_children);
        assert!(!displays[1].has_children);
    }

    #[test]
    fn remove_picker_only_offers_leaves() {
        let tags = vec![
            tag(1, "work", None),
            tag(2, "projects", Some(1)),
            tag(3, "rust", Some(2)),
            tag(4, "home", None),
        ];

        let leaves = selectable_displays(&tags, true);
        let ids: Vec<i64> = leaves.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert!(leaves.iter().all(|d| !d.has_children));

        // Without the filter every tag stays selectable.
        assert_eq!(selectable_displays(&tags, false).len(), 4);
    }

    #[test]
    fn display_indents_by_level() {
        let display = TagNodeDisplay {
            id: 3,
            name: "projects".to_string(),
            level: 2,
            has_children: false,
        };
        assert_eq!(display.to_string(), "    projects");
    }
}
