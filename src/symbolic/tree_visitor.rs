//! Visitor interface for renderers that walk a tree without touching its structure.
//!
//! Nodes are visited in pre-order (parent, left subtree, right subtree). `visit`
//! decides whether the children are walked; `leave` is called once the node and
//! everything below it that was walked is done, which is where a renderer closes
//! whatever `visit` opened.
use crate::symbolic::expr_tree::{ExprTree, Node, NodeView};

/// # Example
/// ```
/// use RustedDiff::symbolic::expr_tree::NodeView;
/// use RustedDiff::symbolic::parse_brackets::parse_tree;
/// use RustedDiff::symbolic::tree_visitor::{walk_tree, TreeVisitor};
///
/// struct Leaves(usize);
/// impl TreeVisitor for Leaves {
///     fn visit(&mut self, view: NodeView<'_>) -> bool {
///         if !view.has_left && !view.has_right {
///             self.0 += 1;
///         }
///         true
///     }
/// }
/// let tree = parse_tree("{ { {x} sin } + {2} }").unwrap();
/// let mut leaves = Leaves(0);
/// walk_tree(&tree, &mut leaves);
/// assert_eq!(leaves.0, 2);
/// ```
pub trait TreeVisitor {
    /// Called on entering a node; return `false` to skip its children.
    fn visit(&mut self, view: NodeView<'_>) -> bool;

    /// Called after the node's walked children.
    fn leave(&mut self, _view: NodeView<'_>) {}
}

/// Walks `tree` with `visitor`; an empty tree produces no calls.
pub fn walk_tree<V: TreeVisitor>(tree: &ExprTree, visitor: &mut V) {
    if let Some(root) = tree.root() {
        walk_node(root, 0, visitor);
    }
}

/// Walks a subtree, reporting depths relative to `depth`.
pub fn walk_node<V: TreeVisitor>(node: &Node, depth: usize, visitor: &mut V) {
    if visitor.visit(node.view(depth)) {
        if let Some(lhs) = node.left() {
            walk_node(lhs, depth + 1, visitor);
        }
        if let Some(rhs) = node.right() {
            walk_node(rhs, depth + 1, visitor);
        }
    }
    visitor.leave(node.view(depth));
}
