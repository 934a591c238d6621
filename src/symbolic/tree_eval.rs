//! Numeric evaluation of expression trees under a variable binding.
//!
//! The tree is validated once (`check_structure`), then evaluated by plain post-order
//! recursion. Symbols are resolved through the `OperatorTable` first and the binding map
//! second; anything else is `InvalidInput`. Division by zero is left to IEEE-754.
use crate::symbolic::expr_error::{ExprError, ExprResult};
use crate::symbolic::expr_tree::{Branch, ExprTree, Node};
use crate::symbolic::operators::{
    Arity, OperatorDescriptor, OperatorTable, Resolved, VariableBindings,
};

impl Node {
    /// Checks that every operator node has exactly the children its arity requires
    /// and that literals and variables are leaves.
    pub fn check_structure(
        &self,
        ops: &OperatorTable,
        bindings: &VariableBindings,
    ) -> ExprResult<()> {
        match ops.resolve(self, bindings) {
            Resolved::Operator(op) => self.check_arity(op)?,
            Resolved::Number(_) | Resolved::Variable(_) => {
                if !self.is_leaf() {
                    return Err(ExprError::StructuralError(format!(
                        "'{}' is not an operator but has {} child(ren)",
                        self.value(),
                        self.child_count()
                    )));
                }
            }
            // reported by the consumer that needs a value for it
            Resolved::Unresolved => {}
        }
        if let Some(lhs) = self.left() {
            lhs.check_structure(ops, bindings)?;
        }
        if let Some(rhs) = self.right() {
            rhs.check_structure(ops, bindings)?;
        }
        Ok(())
    }

    /// Operand count of an operator node against the operator's arity (this node only).
    pub fn check_arity(&self, op: &OperatorDescriptor) -> ExprResult<()> {
        let fits = match op.arity {
            Arity::Unary => self.left().is_some() && self.right().is_none(),
            Arity::Binary => self.left().is_some() && self.right().is_some(),
        };
        if fits {
            Ok(())
        } else {
            Err(ExprError::StructuralError(format!(
                "operator '{}' expects {} operand(s), found {}",
                op.symbol,
                op.arity.operands(),
                self.child_count()
            )))
        }
    }

    fn child_count(&self) -> usize {
        usize::from(self.left().is_some()) + usize::from(self.right().is_some())
    }

    /// Validates the subtree, then evaluates it.
    pub fn eval(&self, ops: &OperatorTable, bindings: &VariableBindings) -> ExprResult<f64> {
        self.check_structure(ops, bindings)?;
        self.eval_checked(ops, bindings)
    }

    fn eval_checked(&self, ops: &OperatorTable, bindings: &VariableBindings) -> ExprResult<f64> {
        match ops.resolve(self, bindings) {
            Resolved::Number(val) | Resolved::Variable(val) => Ok(val),
            Resolved::Operator(op) => {
                let lhs = self
                    .operand(Branch::Left, op.symbol)?
                    .eval_checked(ops, bindings)?;
                let rhs = match op.arity {
                    Arity::Unary => 0.0,
                    Arity::Binary => self
                        .operand(Branch::Right, op.symbol)?
                        .eval_checked(ops, bindings)?,
                };
                Ok(op.apply(lhs, rhs))
            }
            Resolved::Unresolved => Err(ExprError::InvalidInput(format!(
                "symbol '{}' is neither an operator nor a bound variable",
                self.value()
            ))),
        }
    }
}

impl ExprTree {
    /// Evaluates the whole tree; an empty tree is a `TreeError`.
    pub fn eval(&self, ops: &OperatorTable, bindings: &VariableBindings) -> ExprResult<f64> {
        self.require_root()?.eval(ops, bindings)
    }

    pub fn check_structure(
        &self,
        ops: &OperatorTable,
        bindings: &VariableBindings,
    ) -> ExprResult<()> {
        self.require_root()?.check_structure(ops, bindings)
    }

    /// Distinct non-operator symbol names, sorted.
    pub fn variables(&self, ops: &OperatorTable) -> Vec<String> {
        self.symbols()
            .into_iter()
            .filter(|name| ops.by_symbol(name).is_none())
            .collect()
    }

    /// Non-operator symbols that are missing from `bindings`.
    pub fn unbound(&self, ops: &OperatorTable, bindings: &VariableBindings) -> Vec<String> {
        self.variables(ops)
            .into_iter()
            .filter(|name| !bindings.contains_key(name))
            .collect()
    }
}
