//! Comment threading: a reply tree built from the flat comment list of one
//! task, plus @mention autocompletion and the per-task comment panel.

pub mod mention;
pub mod panel;

use crate::model::TaskComment;

pub use mention::{apply_mention, mention_at_caret, mention_suggestions, MentionContext};
pub use panel::CommentPanel;

/// A comment with its direct replies nested beneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment: TaskComment,
    pub replies: Vec<CommentNode>,
}

/// Arrange a flat, unordered comment list into a reply tree.
///
/// A comment whose `parentId` resolves within the set becomes a child of
/// that parent, in input order; anything else is a root. A comment citing a
/// parent that is not in the snapshot degrades to a root rather than an
/// error. Members of a parent cycle are unreachable from any root and drop
/// out of the tree.
pub fn build_comment_tree(comments: &[TaskComment]) -> Vec<CommentNode> {
    let ids: std::collections::HashSet<&str> = comments
        .iter()
        .filter(|c| !c.id.is_empty())
        .map(|c| c.id.as_str())
        .collect();

    comments
        .iter()
        .filter(|c| c.parent_id.is_empty() || !ids.contains(c.parent_id.as_str()))
        .map(|root| build_node(root, comments))
        .collect()
}

fn build_node(comment: &TaskComment, comments: &[TaskComment]) -> CommentNode {
    let replies = if comment.id.is_empty() {
        Vec::new()
    } else {
        comments
            .iter()
            .filter(|c| c.parent_id == comment.id && c.id != comment.id)
            .map(|child| build_node(child, comments))
            .collect()
    };
    CommentNode {
        comment: comment.clone(),
        replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn comment(id: &str, parent_id: &str) -> TaskComment {
        TaskComment {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            content: format!("comment {id}"),
            ..TaskComment::default()
        }
    }

    #[test]
    fn replies_nest_under_their_parent_in_input_order() {
        let tree = build_comment_tree(&[
            comment("a", ""),
            comment("b", "a"),
            comment("c", "a"),
            comment("d", "b"),
        ]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, "a");
        let reply_ids: Vec<&str> = tree[0].replies.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(reply_ids, vec!["b", "c"]);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, "d");
    }

    #[test]
    fn unresolved_parent_becomes_a_root() {
        let tree = build_comment_tree(&[comment("a", "deleted"), comment("b", "")]);
        let root_ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(root_ids, vec!["a", "b"]);
    }

    #[test]
    fn roots_never_have_a_resolvable_parent() {
        let comments = vec![
            comment("a", ""),
            comment("b", "a"),
            comment("c", "missing"),
        ];
        let tree = build_comment_tree(&comments);
        let ids: std::collections::HashSet<&str> =
            comments.iter().map(|c| c.id.as_str()).collect();
        for root in &tree {
            assert!(
                root.comment.parent_id.is_empty() || !ids.contains(root.comment.parent_id.as_str())
            );
        }
    }

    #[test]
    fn parent_cycles_drop_out_instead_of_looping() {
        let tree = build_comment_tree(&[
            comment("a", "b"),
            comment("b", "a"),
            comment("c", ""),
        ]);
        let root_ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(root_ids, vec!["c"]);
    }

    #[test]
    fn self_referencing_comment_is_dropped() {
        let tree = build_comment_tree(&[comment("a", "a"), comment("b", "")]);
        let root_ids: Vec<&str> = tree.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(root_ids, vec!["b"]);
    }
}
