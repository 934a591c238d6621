//! Symbolic differentiation: builds a new, independent tree holding the derivative.
//!
//! | source | derivative |
//! |---|---|
//! | number | `0` |
//! | variable | `1` for the differentiation variable, `0` for other bound variables |
//! | `a + b`, `a - b` | `da ± db` |
//! | `a * b` | `da*b + a*db` |
//! | `a / b` | `(da*b - a*db) / (b*b)` |
//! | `a ^ c` | `{ { {c} * { a ^ {c-1} } } * da }`, `c` must be a literal |
//! | `sin(a)` | `cos(a) * da` |
//! | `cos(a)` | `{ { {-1} * { {a} sin } } * da }` |
//!
//! Whenever a rule needs `a` or `b` themselves, the source subtree is deep-copied.
//! The source tree is never modified. The result is not simplified; run the optimizer on it.
use crate::symbolic::expr_error::{ExprError, ExprResult};
use crate::symbolic::expr_tree::{Branch, ExprTree, Node};
use crate::symbolic::operators::{OperatorId, OperatorTable, Resolved, VariableBindings};
use log::trace;

/// `{ lhs op rhs }` with the operator symbol taken from the table
fn binary(ops: &OperatorTable, id: OperatorId, lhs: Node, rhs: Node) -> ExprResult<Node> {
    let mut node = Node::symbol(ops.symbol_of(id)?);
    node.insert_node(Branch::Left, lhs)?;
    node.insert_node(Branch::Right, rhs)?;
    Ok(node)
}

/// `{ arg op }`
fn unary(ops: &OperatorTable, id: OperatorId, arg: Node) -> ExprResult<Node> {
    let mut node = Node::symbol(ops.symbol_of(id)?);
    node.insert_node(Branch::Left, arg)?;
    Ok(node)
}

impl Node {
    /// Derivative of this subtree with respect to the bound variable `var`.
    ///
    /// `var` must be present in `bindings` and must not be an operator symbol. Every other
    /// non-operator symbol must be bound as well; bound ones are held constant.
    pub fn diff(
        &self,
        var: &str,
        ops: &OperatorTable,
        bindings: &VariableBindings,
    ) -> ExprResult<Node> {
        if ops.by_symbol(var).is_some() || !bindings.contains_key(var) {
            return Err(ExprError::InvalidInput(format!(
                "cannot differentiate with respect to '{}': not a bound variable",
                var
            )));
        }
        self.check_structure(ops, bindings)?;
        self.diff_checked(var, ops, bindings)
    }

    fn diff_checked(
        &self,
        var: &str,
        ops: &OperatorTable,
        bindings: &VariableBindings,
    ) -> ExprResult<Node> {
        let op = match ops.resolve(self, bindings) {
            Resolved::Number(_) => return Ok(Node::number(0.0)),
            Resolved::Variable(_) => {
                let val = if self.as_symbol() == Some(var) { 1.0 } else { 0.0 };
                return Ok(Node::number(val));
            }
            Resolved::Unresolved => {
                return Err(ExprError::InvalidInput(format!(
                    "symbol '{}' is neither an operator nor a bound variable",
                    self.value()
                )));
            }
            Resolved::Operator(op) => op,
        };
        trace!("d/d{} rule {} on {}", var, op.id, self.to_infix());

        let a = self.operand(Branch::Left, op.symbol)?;
        let da = a.diff_checked(var, ops, bindings)?;
        match op.id {
            OperatorId::Addition | OperatorId::Subtraction => {
                let b = self.operand(Branch::Right, op.symbol)?;
                let db = b.diff_checked(var, ops, bindings)?;
                binary(ops, op.id, da, db)
            }
            OperatorId::Multiplication => {
                let b = self.operand(Branch::Right, op.symbol)?;
                let db = b.diff_checked(var, ops, bindings)?;
                let da_b = binary(ops, OperatorId::Multiplication, da, b.deep_copy())?;
                let a_db = binary(ops, OperatorId::Multiplication, a.deep_copy(), db)?;
                binary(ops, OperatorId::Addition, da_b, a_db)
            }
            OperatorId::Division => {
                let b = self.operand(Branch::Right, op.symbol)?;
                let db = b.diff_checked(var, ops, bindings)?;
                let da_b = binary(ops, OperatorId::Multiplication, da, b.deep_copy())?;
                let a_db = binary(ops, OperatorId::Multiplication, a.deep_copy(), db)?;
                let numerator = binary(ops, OperatorId::Subtraction, da_b, a_db)?;
                let denominator =
                    binary(ops, OperatorId::Multiplication, b.deep_copy(), b.deep_copy())?;
                binary(ops, OperatorId::Division, numerator, denominator)
            }
            OperatorId::Power => {
                let b = self.operand(Branch::Right, op.symbol)?;
                let exponent = b.as_literal().ok_or_else(|| {
                    ExprError::UnsupportedOperation(format!(
                        "power rule needs a numeric exponent, found {}",
                        b.to_infix()
                    ))
                })?;
                let lowered = binary(
                    ops,
                    OperatorId::Power,
                    a.deep_copy(),
                    Node::number(exponent - 1.0),
                )?;
                let scaled = binary(
                    ops,
                    OperatorId::Multiplication,
                    Node::number(exponent),
                    lowered,
                )?;
                binary(ops, OperatorId::Multiplication, scaled, da)
            }
            OperatorId::Sine => {
                let cos_a = unary(ops, OperatorId::Cosine, a.deep_copy())?;
                binary(ops, OperatorId::Multiplication, cos_a, da)
            }
            OperatorId::Cosine => {
                let sin_a = unary(ops, OperatorId::Sine, a.deep_copy())?;
                let minus_sin_a =
                    binary(ops, OperatorId::Multiplication, Node::number(-1.0), sin_a)?;
                binary(ops, OperatorId::Multiplication, minus_sin_a, da)
            }
        }
    }
}

impl ExprTree {
    /// New tree holding d(self)/d(var). An empty source is a `TreeError`.
    pub fn diff(
        &self,
        var: &str,
        ops: &OperatorTable,
        bindings: &VariableBindings,
    ) -> ExprResult<ExprTree> {
        let root = self.require_root()?.diff(var, ops, bindings)?;
        Ok(ExprTree::from_root(root))
    }
}
