#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// error type shared by the parser, the evaluator, the differentiator and the optimizer
pub mod expr_error;
///____________________________________________________________________________________________________________________________
/// # Expression tree
/// binary tree of numbers, symbols and operators with insert, delete and deep copy of branches
///# Example
/// ```
/// use RustedDiff::symbolic::expr_tree::{Branch, ExprTree, Node};
/// let mut root = Node::symbol("+");
/// root.insert_node(Branch::Left, Node::symbol("x")).unwrap();
/// root.insert_node(Branch::Right, Node::number(2.0)).unwrap();
/// let tree = ExprTree::from_root(root);
/// assert_eq!(tree.to_string(), "{ {x} + {2} }");
/// assert_eq!(tree.size(), 3);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod expr_tree;
/// the operator table: symbol, arity and numeric function of each operator
pub mod operators;
///____________________________________________________________________________________________________________________________
/// a module turns bracketed text like "{ {x} * { {x} sin } }" into an expression tree
///# Example
/// ```
/// use RustedDiff::symbolic::parse_brackets::parse_tree;
/// let tree = parse_tree("{ { {x} sin } * {2} }").unwrap();
/// assert_eq!(tree.to_infix(), "(sin(x) * 2)");
/// assert!(parse_tree("{ {x} + ").is_err());
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_brackets;
/// numeric evaluation and structural checks
pub mod tree_eval;
///____________________________________________________________________________________________________________________________
/// # Derivatives
/// builds the derivative of a tree as a new tree, the source is left untouched
///# Example
/// ```
/// use RustedDiff::bindings;
/// use RustedDiff::symbolic::operators::OperatorTable;
/// use RustedDiff::symbolic::parse_brackets::parse_tree;
/// let ops = OperatorTable::standard();
/// let vars = bindings! { "x" => 2.0 };
/// let tree = parse_tree("{ {x} * {x} }").unwrap();
/// let derivative = tree.diff("x", &ops, &vars).unwrap();
/// assert_eq!(derivative.eval(&ops, &vars).unwrap(), 4.0);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod tree_derivatives;
/// constant folding and identity elimination
pub mod tree_simplify;
/// read-only pre-order traversal with a visitor
pub mod tree_visitor;
///______________________________________________________________________________________________________________________________________________
/// # Symbolic engine
/// one object with operators, bindings and optimizer settings: parse, evaluate, differentiate, simplify
/// ______________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
/// session settings read from a task document
pub mod session_config;
