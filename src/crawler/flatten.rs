//! Comment tree flattening.
//!
//! Converts a post's nested reply tree into a flat, parent-linked sequence.
//! Traversal is pre-order (a node before any of its descendants, siblings in
//! given order): downstream consumers rebuild the tree by replaying parent
//! references in sequence, so the order is a hard contract.

use crate::{Comment, FlatComment, Post};

/// Flatten a post's comment tree into one record per node.
///
/// Every node is visited exactly once; nothing is synthesized or dropped.
/// The post itself is not emitted. Each record's `parent_id` is the
/// structural parent seen during traversal (`None` for top-level comments),
/// independent of the API-reported field.
///
/// Uses an explicit stack rather than recursion: reply depth is bounded only
/// by the input.
pub fn flatten_comments(post: &Post) -> Vec<FlatComment> {
    let mut flat = Vec::new();
    // Children are pushed in reverse so pops preserve sibling order.
    let mut stack: Vec<(&Comment, Option<&str>)> =
        post.comments.iter().rev().map(|c| (c, None)).collect();

    while let Some((node, parent_id)) = stack.pop() {
        flat.push(FlatComment {
            id: node.id.clone(),
            post_id: post.id.clone(),
            post_title: post.title.clone(),
            parent_id: parent_id.map(str::to_string),
            author: node.author.as_ref().map(|a| a.name.clone()),
            content: node.content.clone(),
            upvotes: node.upvotes,
            downvotes: node.downvotes,
            created_at: node.created_at.clone(),
        });
        for reply in node.replies.iter().rev() {
            stack.push((reply, Some(node.id.as_str())));
        }
    }

    flat
}
