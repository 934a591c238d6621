//! # Expression Tree Module
//!
//! Storage and ownership rules for the binary expression tree shared by the parser,
//! the evaluator, the differentiator and the optimizer.
//!
//! ## Main Structures
//!
//! - `NodeValue`: `Number(f64)` literal or `Symbol(String)` token. Whether a symbol is an
//!   operator, a variable or garbage is decided only when the tree is evaluated or differentiated.
//! - `Node`: a value plus up to two exclusively owned children. A node has no children,
//!   a left child only (unary operators) or both children. A right child without a left
//!   one is rejected by every insertion routine.
//! - `ExprTree`: owns one root node or nothing.
//!
//! ## Ownership
//!
//! Children are `Box<Node>`, so a subtree can never be reachable from two places.
//! Whenever the same subexpression is needed twice it is deep-copied with `copy_branch`
//! or `deep_copy`, which is the only way to duplicate content.
//!
//! ## Printing
//!
//! `Display` writes the bracket grammar back (`{ {x} + {3} }`), so printing and
//! reparsing gives an equal tree. `to_infix` gives a readable form like `(x + 3)`.

use crate::symbolic::expr_error::{ExprError, ExprResult};
use std::collections::BTreeSet;
use std::fmt;
use strum_macros::Display;

/// Side of a parent node a child hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Branch {
    Left,
    Right,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// numeric literal
    Number(f64),
    /// operator symbol, variable name or an unrecognized token
    Symbol(String),
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeValue::Number(val) => write!(f, "{}", val),
            NodeValue::Symbol(name) => write!(f, "{}", name),
        }
    }
}

/// Kind of a node as seen by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NodeKind {
    Number,
    Symbol,
}

/// A node of the expression tree. Clone is a full recursive (deep) copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: NodeValue,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    pub fn new(value: NodeValue) -> Self {
        Node {
            value,
            left: None,
            right: None,
        }
    }

    pub fn number(val: f64) -> Self {
        Node::new(NodeValue::Number(val))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Node::new(NodeValue::Symbol(name.into()))
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Number(_) => NodeKind::Number,
            NodeValue::Symbol(_) => NodeKind::Symbol,
        }
    }

    /// numeric payload, if the node is a literal
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            NodeValue::Number(val) => Some(val),
            NodeValue::Symbol(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Symbol(name) => Some(name.as_str()),
            NodeValue::Number(_) => None,
        }
    }

    /// numeric payload of a childless literal
    pub fn as_literal(&self) -> Option<f64> {
        if self.is_leaf() { self.as_number() } else { None }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    pub fn left_mut(&mut self) -> Option<&mut Node> {
        self.left.as_deref_mut()
    }

    pub fn right_mut(&mut self) -> Option<&mut Node> {
        self.right.as_deref_mut()
    }

    pub fn child(&self, side: Branch) -> Option<&Node> {
        match side {
            Branch::Left => self.left(),
            Branch::Right => self.right(),
        }
    }

    fn slot_mut(&mut self, side: Branch) -> &mut Option<Box<Node>> {
        match side {
            Branch::Left => &mut self.left,
            Branch::Right => &mut self.right,
        }
    }

    /// Child required by an operator; its absence is a structural defect of the tree.
    pub fn operand(&self, side: Branch, operator: &str) -> ExprResult<&Node> {
        self.child(side).ok_or_else(|| {
            ExprError::StructuralError(format!(
                "operator '{}' is missing its {} operand",
                operator,
                side.to_string().to_lowercase()
            ))
        })
    }

    /// Attaches a new leaf holding `value` on `side`.
    pub fn insert(&mut self, side: Branch, value: NodeValue) -> ExprResult<&mut Node> {
        self.insert_node(side, Node::new(value))
    }

    /// Attaches an already built subtree on `side`.
    ///
    /// Fails with `TreeError` if the side is occupied, or if a right child would be
    /// attached to a node without a left child.
    pub fn insert_node(&mut self, side: Branch, node: Node) -> ExprResult<&mut Node> {
        if side == Branch::Right && self.left.is_none() {
            return Err(ExprError::TreeError(format!(
                "cannot attach a right child under '{}' without a left child",
                self.value
            )));
        }
        let slot = self.slot_mut(side);
        if slot.is_some() {
            return Err(ExprError::TreeError(format!(
                "{} branch is already occupied",
                side
            )));
        }
        Ok(slot.insert(Box::new(node)).as_mut())
    }

    /// Deep-copies `source` and attaches the copy on `side` (same contract as `insert_node`).
    pub fn copy_branch(&mut self, side: Branch, source: &Node) -> ExprResult<&mut Node> {
        self.insert_node(side, source.deep_copy())
    }

    /// Releases the subtree on `side` and clears the link.
    pub fn delete_branch(&mut self, side: Branch) -> ExprResult<()> {
        if side == Branch::Left && self.right.is_some() {
            return Err(ExprError::TreeError(format!(
                "cannot delete the left branch of '{}' while a right branch exists",
                self.value
            )));
        }
        match self.slot_mut(side).take() {
            Some(_released) => Ok(()),
            None => Err(ExprError::TreeError(format!("{} branch is empty", side))),
        }
    }

    /// Detaches the subtree on `side` and hands it to the caller.
    pub(crate) fn take_branch(&mut self, side: Branch) -> Option<Node> {
        self.slot_mut(side).take().map(|boxed| *boxed)
    }

    /// Recursive copy into an independent node graph.
    pub fn deep_copy(&self) -> Node {
        self.clone()
    }

    /// Overwrites this node, value and children, with `other`; the old children are released.
    pub(crate) fn replace_with(&mut self, other: Node) {
        *self = other;
    }

    /// Read-only summary of this node as seen at `depth`.
    pub fn view(&self, depth: usize) -> NodeView<'_> {
        NodeView {
            depth,
            value: &self.value,
            has_left: self.left.is_some(),
            has_right: self.right.is_some(),
        }
    }

    /// number of nodes in the subtree
    pub fn size(&self) -> usize {
        1 + self.left().map_or(0, Node::size) + self.right().map_or(0, Node::size)
    }

    /// number of levels in the subtree, a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .left()
            .map_or(0, Node::depth)
            .max(self.right().map_or(0, Node::depth))
    }

    /// Readable infix form: binary nodes as `(l op r)`, unary as `op(l)`.
    pub fn to_infix(&self) -> String {
        match (self.left(), self.right()) {
            (Some(lhs), Some(rhs)) => {
                format!("({} {} {})", lhs.to_infix(), self.value, rhs.to_infix())
            }
            (Some(arg), None) => format!("{}({})", self.value, arg.to_infix()),
            _ => match self.value {
                NodeValue::Number(val) if val < 0.0 => format!("({})", val),
                _ => self.value.to_string(),
            },
        }
    }
}

/// Bracket grammar: `{x}`, `{ {x} sin }`, `{ {x} + {3} }`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.left(), self.right()) {
            (None, None) => write!(f, "{{{}}}", self.value),
            (Some(lhs), None) => write!(f, "{{ {} {} }}", lhs, self.value),
            (Some(lhs), Some(rhs)) => write!(f, "{{ {} {} {} }}", lhs, self.value, rhs),
            // not constructible through the insertion API
            (None, Some(rhs)) => write!(f, "{{ {} {} }}", self.value, rhs),
        }
    }
}

/// An expression tree: a single root or nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExprTree {
    root: Option<Box<Node>>,
}

impl ExprTree {
    /// empty tree
    pub fn new() -> Self {
        ExprTree { root: None }
    }

    pub fn from_root(root: Node) -> Self {
        ExprTree {
            root: Some(Box::new(root)),
        }
    }

    /// Populates an empty tree. A tree is populated once, a second call is a `TreeError`.
    pub fn set_root(&mut self, root: Node) -> ExprResult<()> {
        if self.root.is_some() {
            return Err(ExprError::TreeError("tree already has a root".to_string()));
        }
        self.root = Some(Box::new(root));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Node> {
        self.root.as_deref_mut()
    }

    /// Root or a `TreeError` for an empty tree.
    pub fn require_root(&self) -> ExprResult<&Node> {
        self.root()
            .ok_or_else(|| ExprError::TreeError("the tree is empty".to_string()))
    }

    pub fn require_root_mut(&mut self) -> ExprResult<&mut Node> {
        self.root_mut()
            .ok_or_else(|| ExprError::TreeError("the tree is empty".to_string()))
    }

    /// Empties the tree, returning the former root.
    pub fn take_root(&mut self) -> Option<Node> {
        self.root.take().map(|boxed| *boxed)
    }

    pub fn size(&self) -> usize {
        self.root().map_or(0, Node::size)
    }

    pub fn depth(&self) -> usize {
        self.root().map_or(0, Node::depth)
    }

    pub fn to_infix(&self) -> String {
        self.root().map_or_else(String::new, Node::to_infix)
    }

    /// Pre-order walk: parent, then left subtree, then right subtree.
    pub fn preorder(&self) -> Preorder<'_> {
        let mut stack = Vec::new();
        if let Some(root) = self.root() {
            stack.push((root, 0));
        }
        Preorder { stack }
    }

    /// Distinct symbol texts in the tree, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .preorder()
            .filter_map(|view| match view.value {
                NodeValue::Symbol(name) => Some(name.as_str()),
                NodeValue::Number(_) => None,
            })
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.root() {
            Some(root) => write!(f, "{}", root),
            None => Ok(()),
        }
    }
}

/// Read-only view of one node handed out by the pre-order traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeView<'a> {
    pub depth: usize,
    pub value: &'a NodeValue,
    pub has_left: bool,
    pub has_right: bool,
}

impl<'a> NodeView<'a> {
    pub fn kind(&self) -> NodeKind {
        match self.value {
            NodeValue::Number(_) => NodeKind::Number,
            NodeValue::Symbol(_) => NodeKind::Symbol,
        }
    }

    /// literal text of the node
    pub fn text(&self) -> String {
        self.value.to_string()
    }
}

/// Iterator behind `ExprTree::preorder`; uses an explicit stack.
pub struct Preorder<'a> {
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        if let Some(rhs) = node.right() {
            self.stack.push((rhs, depth + 1));
        }
        if let Some(lhs) = node.left() {
            self.stack.push((lhs, depth + 1));
        }
        Some(node.view(depth))
    }
}
