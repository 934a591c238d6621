//! # Tree Optimizer
//!
//! Two in-place rewrite passes over an expression tree, both single post-order sweeps:
//!
//! 1. **Constant folding**: an operator node whose operands are all numeric leaves is
//!    replaced by a leaf holding the result. Idempotent.
//! 2. **Identity elimination**: `a+0`, `0+a`, `a-0`, `a*1`, `1*a`, `a/1`, `a^1` collapse to
//!    `a`; `a*0`, `0*a`, `0/a`, `0^a` collapse to `0`; `a^0`, `1^a` collapse to `1`.
//!    A rule fires only when the operand it tests is a numeric leaf. The surviving operand,
//!    leaf or whole subtree, is moved into the node's place. Value-preserving except for
//!    `0/a` and `0^a`: at `a = 0` they give `0` where evaluation gives NaN and `1`.
//!
//! Every operator node's child count is checked over the whole tree before the first
//! rewrite, so a `StructuralError` leaves the tree exactly as it was.
//!
//! `sin` and `cos` nodes are only ever folded. Symbols that are not in the operator
//! table are never touched. Each pass reports how many rewrites it made so callers
//! can iterate to a fixed point with `optimize_until_stable`.
use crate::symbolic::expr_error::{ExprError, ExprResult};
use crate::symbolic::expr_tree::{Branch, ExprTree, Node};
use crate::symbolic::operators::{Arity, OperatorDescriptor, OperatorId, OperatorTable};
use log::{debug, info, warn};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Rewrite pass selector; parses from `fold`/`constant_folding` and
/// `identities`/`identity_elimination`, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum OptimizationPass {
    #[strum(to_string = "fold", serialize = "constant_folding")]
    ConstantFolding,
    #[strum(to_string = "identities", serialize = "identity_elimination")]
    IdentityElimination,
}

impl OptimizationPass {
    /// folding first, then identities
    pub fn standard() -> Vec<OptimizationPass> {
        OptimizationPass::iter().collect()
    }
}

/// outcome of an identity rule
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rewrite {
    /// replace the node by its child on this side
    Keep(Branch),
    /// replace the node by a numeric leaf
    Literal(f64),
}

/// `lhs`/`rhs` are the operand values when the operand is a numeric leaf.
fn identity_rule(id: OperatorId, lhs: Option<f64>, rhs: Option<f64>) -> Option<Rewrite> {
    let is = |operand: Option<f64>, val: f64| operand == Some(val);
    match id {
        OperatorId::Addition if is(rhs, 0.0) => Some(Rewrite::Keep(Branch::Left)),
        OperatorId::Addition if is(lhs, 0.0) => Some(Rewrite::Keep(Branch::Right)),
        OperatorId::Subtraction if is(rhs, 0.0) => Some(Rewrite::Keep(Branch::Left)),
        OperatorId::Multiplication if is(rhs, 1.0) => Some(Rewrite::Keep(Branch::Left)),
        OperatorId::Multiplication if is(lhs, 1.0) => Some(Rewrite::Keep(Branch::Right)),
        OperatorId::Multiplication if is(rhs, 0.0) || is(lhs, 0.0) => {
            Some(Rewrite::Literal(0.0))
        }
        OperatorId::Division if is(rhs, 1.0) => Some(Rewrite::Keep(Branch::Left)),
        OperatorId::Division if is(lhs, 0.0) => Some(Rewrite::Literal(0.0)),
        OperatorId::Power if is(rhs, 0.0) => Some(Rewrite::Literal(1.0)),
        OperatorId::Power if is(rhs, 1.0) => Some(Rewrite::Keep(Branch::Left)),
        OperatorId::Power if is(lhs, 1.0) => Some(Rewrite::Literal(1.0)),
        OperatorId::Power if is(lhs, 0.0) => Some(Rewrite::Literal(0.0)),
        _ => None,
    }
}

impl Node {
    /// operator descriptor for this node, if its symbol is in the table
    fn as_operator<'t>(&self, ops: &'t OperatorTable) -> Option<&'t OperatorDescriptor> {
        self.as_symbol().and_then(|name| ops.by_symbol(name))
    }

    /// Literal operand values `(left, right)`; `right` is always `None` for unary operators.
    fn literal_operands(
        &self,
        op: &OperatorDescriptor,
    ) -> ExprResult<(Option<f64>, Option<f64>)> {
        self.check_arity(op)?;
        let lhs = self.operand(Branch::Left, op.symbol)?.as_literal();
        let rhs = match op.arity {
            Arity::Unary => None,
            Arity::Binary => self.operand(Branch::Right, op.symbol)?.as_literal(),
        };
        Ok((lhs, rhs))
    }

    /// Child counts of every operator node in the subtree; nothing else is resolved.
    fn check_operator_arities(&self, ops: &OperatorTable) -> ExprResult<()> {
        if let Some(op) = self.as_operator(ops) {
            self.check_arity(op)?;
        }
        if let Some(lhs) = self.left() {
            lhs.check_operator_arities(ops)?;
        }
        if let Some(rhs) = self.right() {
            rhs.check_operator_arities(ops)?;
        }
        Ok(())
    }

    /// Constant folding over this subtree; returns the number of folded nodes.
    pub fn fold_constants(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        self.check_operator_arities(ops)?;
        self.fold_checked(ops)
    }

    fn fold_checked(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        let mut count = 0;
        if let Some(lhs) = self.left_mut() {
            count += lhs.fold_checked(ops)?;
        }
        if let Some(rhs) = self.right_mut() {
            count += rhs.fold_checked(ops)?;
        }
        let Some(op) = self.as_operator(ops) else {
            return Ok(count);
        };
        let folded = match (op.arity, self.literal_operands(op)?) {
            (Arity::Unary, (Some(arg), _)) => Some(op.apply(arg, 0.0)),
            (Arity::Binary, (Some(lhs), Some(rhs))) => Some(op.apply(lhs, rhs)),
            _ => None,
        };
        if let Some(val) = folded {
            debug!("fold {} -> {}", self.to_infix(), val);
            self.replace_with(Node::number(val));
            count += 1;
        }
        Ok(count)
    }

    /// Identity elimination over this subtree; returns the number of rewrites.
    pub fn eliminate_identities(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        self.check_operator_arities(ops)?;
        self.eliminate_checked(ops)
    }

    fn eliminate_checked(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        let mut count = 0;
        if let Some(lhs) = self.left_mut() {
            count += lhs.eliminate_checked(ops)?;
        }
        if let Some(rhs) = self.right_mut() {
            count += rhs.eliminate_checked(ops)?;
        }
        let Some(op) = self.as_operator(ops) else {
            return Ok(count);
        };
        let (lhs, rhs) = self.literal_operands(op)?;
        let Some(rewrite) = identity_rule(op.id, lhs, rhs) else {
            return Ok(count);
        };
        let before = self.to_infix();
        match rewrite {
            Rewrite::Keep(side) => {
                let survivor = self.take_branch(side).ok_or_else(|| {
                    ExprError::StructuralError(format!(
                        "operator '{}' lost its {} operand",
                        op.symbol, side
                    ))
                })?;
                self.replace_with(survivor);
            }
            Rewrite::Literal(val) => self.replace_with(Node::number(val)),
        }
        debug!("identity {} -> {}", before, self.to_infix());
        Ok(count + 1)
    }

    pub fn apply_pass(
        &mut self,
        ops: &OperatorTable,
        pass: OptimizationPass,
    ) -> ExprResult<usize> {
        self.check_operator_arities(ops)?;
        self.apply_checked(ops, pass)
    }

    /// both passes keep every operator's child count, so one check covers a whole sequence
    fn apply_checked(&mut self, ops: &OperatorTable, pass: OptimizationPass) -> ExprResult<usize> {
        match pass {
            OptimizationPass::ConstantFolding => self.fold_checked(ops),
            OptimizationPass::IdentityElimination => self.eliminate_checked(ops),
        }
    }
}

impl ExprTree {
    pub fn fold_constants(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        self.require_root_mut()?.fold_constants(ops)
    }

    pub fn eliminate_identities(&mut self, ops: &OperatorTable) -> ExprResult<usize> {
        self.require_root_mut()?.eliminate_identities(ops)
    }

    /// Runs each pass once, in the given order. Returns the total rewrite count.
    pub fn optimize(
        &mut self,
        ops: &OperatorTable,
        passes: &[OptimizationPass],
    ) -> ExprResult<usize> {
        let root = self.require_root_mut()?;
        root.check_operator_arities(ops)?;
        let mut total = 0;
        for &pass in passes {
            let count = root.apply_checked(ops, pass)?;
            info!("pass {}: {} rewrite(s)", pass, count);
            total += count;
        }
        Ok(total)
    }

    /// Repeats `optimize` until a round makes no rewrite or `max_rounds` rounds ran.
    pub fn optimize_repeated(
        &mut self,
        ops: &OperatorTable,
        passes: &[OptimizationPass],
        max_rounds: usize,
    ) -> ExprResult<usize> {
        let mut total = 0;
        for round in 1..=max_rounds {
            let count = self.optimize(ops, passes)?;
            total += count;
            if count == 0 {
                info!("tree stable after {} round(s), {} rewrite(s)", round, total);
                return Ok(total);
            }
        }
        if max_rounds > 0 {
            warn!("stopped after {} rounds with rewrites still possible", max_rounds);
        }
        Ok(total)
    }

    /// `optimize_repeated` with folding followed by identity elimination.
    pub fn optimize_until_stable(
        &mut self,
        ops: &OperatorTable,
        max_rounds: usize,
    ) -> ExprResult<usize> {
        self.optimize_repeated(ops, &OptimizationPass::standard(), max_rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::expr_tree::NodeValue;
    use crate::symbolic::operators::VariableBindings;
    use crate::symbolic::parse_brackets::parse_tree;
    use approx::assert_relative_eq;

    fn folded(text: &str) -> (String, usize) {
        let mut tree = parse_tree(text).unwrap();
        let count = tree.fold_constants(&OperatorTable::standard()).unwrap();
        (tree.to_string(), count)
    }

    fn reduced(text: &str) -> (String, usize) {
        let mut tree = parse_tree(text).unwrap();
        let count = tree.eliminate_identities(&OperatorTable::standard()).unwrap();
        (tree.to_string(), count)
    }

    #[test]
    fn test_fold_binary() {
        assert_eq!(folded("{ {2} + {3} }"), ("{5}".to_string(), 1));
        assert_eq!(folded("{ { {2} * {3} } - {1} }"), ("{5}".to_string(), 2));
        assert_eq!(folded("{ {2} ^ {-1} }"), ("{0.5}".to_string(), 1));
    }

    #[test]
    fn test_fold_unary() {
        assert_eq!(folded("{ {0} sin }"), ("{0}".to_string(), 1));
        assert_eq!(folded("{ { {0} cos } * {4} }"), ("{4}".to_string(), 2));
    }

    #[test]
    fn test_fold_keeps_variables() {
        assert_eq!(
            folded("{ {x} + { {2} * {3} } }"),
            ("{ {x} + {6} }".to_string(), 1)
        );
        assert_eq!(folded("{ {x} sin }"), ("{ {x} sin }".to_string(), 0));
    }

    #[test]
    fn test_fold_is_idempotent() {
        let table = OperatorTable::standard();
        let mut tree = parse_tree("{ { { {1} + {2} } * {x} } - { { {0} cos } / {4} } }").unwrap();
        assert_eq!(tree.fold_constants(&table).unwrap(), 3);
        let once = tree.clone();
        assert_eq!(tree.fold_constants(&table).unwrap(), 0);
        assert_eq!(tree, once);
        assert_eq!(tree.to_string(), "{ { {3} * {x} } - {0.25} }");
    }

    #[test]
    fn test_fold_ignores_unknown_operators() {
        assert_eq!(folded("{ {2} ?? {3} }"), ("{ {2} ?? {3} }".to_string(), 0));
        // operands below an unknown symbol are still folded
        assert_eq!(
            folded("{ { {2} + {3} } ?? {3} }"),
            ("{ {5} ?? {3} }".to_string(), 1)
        );
    }

    #[test]
    fn test_fold_division_by_zero() {
        let mut tree = parse_tree("{ {1} / {0} }").unwrap();
        tree.fold_constants(&OperatorTable::standard()).unwrap();
        assert_eq!(tree.root().unwrap().as_number(), Some(f64::INFINITY));
    }

    #[test]
    fn test_identity_rules() {
        let cases = [
            ("{ {x} + {0} }", "{x}"),
            ("{ {0} + {x} }", "{x}"),
            ("{ {x} - {0} }", "{x}"),
            ("{ {x} * {1} }", "{x}"),
            ("{ {1} * {x} }", "{x}"),
            ("{ {x} * {0} }", "{0}"),
            ("{ {0} * {x} }", "{0}"),
            ("{ {x} / {1} }", "{x}"),
            ("{ {0} / {x} }", "{0}"),
            ("{ {x} ^ {0} }", "{1}"),
            ("{ {x} ^ {1} }", "{x}"),
            ("{ {1} ^ {x} }", "{1}"),
            ("{ {0} ^ {x} }", "{0}"),
        ];
        for (source, expected) in cases {
            assert_eq!(reduced(source), (expected.to_string(), 1), "{}", source);
        }
    }

    #[test]
    fn test_identity_non_rules() {
        for source in [
            "{ {0} - {x} }",
            "{ {1} / {x} }",
            "{ {x} / {0} }",
            "{ {x} ^ {2} }",
            "{ {0} sin }",
            "{ {1} cos }",
            "{ {x} * {y} }",
            "{ {x} * { {1} sin } }",
        ] {
            assert_eq!(reduced(source), (source.to_string(), 0), "{}", source);
        }
    }

    #[test]
    fn test_identity_moves_whole_subtree() {
        assert_eq!(
            reduced("{ { { {x} ^ {2} } sin } * {1} }"),
            ("{ { {x} ^ {2} } sin }".to_string(), 1)
        );
        assert_eq!(
            reduced("{ {0} + { {x} * {y} } }"),
            ("{ {x} * {y} }".to_string(), 1)
        );
    }

    #[test]
    fn test_identity_cascades_bottom_up() {
        // ((x * 1) + 0) * 1 -> x in a single sweep
        assert_eq!(
            reduced("{ { { {x} * {1} } + {0} } * {1} }"),
            ("{x}".to_string(), 3)
        );
    }

    #[test]
    fn test_identity_preserves_value() {
        let table = OperatorTable::standard();
        let sources = [
            "{ { { {x} * {1} } + {0} } * { {x} ^ {1} } }",
            "{ { { {x} sin } ^ {0} } - { {0} * { {x} cos } } }",
            "{ { {1} ^ {x} } + { { {x} / {1} } - {0} } }",
        ];
        for source in sources {
            let original = parse_tree(source).unwrap();
            let mut reduced = original.clone();
            reduced.eliminate_identities(&table).unwrap();
            for x in [-1.7, 0.4, 2.0] {
                let mut bindings = VariableBindings::new();
                bindings.insert("x".to_string(), x);
                assert_relative_eq!(
                    original.eval(&table, &bindings).unwrap(),
                    reduced.eval(&table, &bindings).unwrap(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_wrong_child_count_is_structural_error() {
        let table = OperatorTable::standard();
        let mut root = Node::symbol("*");
        root.insert(Branch::Left, NodeValue::Number(1.0)).unwrap();
        let mut tree = ExprTree::from_root(root);
        assert!(matches!(
            tree.eliminate_identities(&table).unwrap_err(),
            ExprError::StructuralError(_)
        ));
        assert!(matches!(
            tree.fold_constants(&table).unwrap_err(),
            ExprError::StructuralError(_)
        ));
    }

    #[test]
    fn test_structural_error_leaves_tree_untouched() {
        let table = OperatorTable::standard();
        // the defect sits above subtrees that would otherwise be rewritten
        let mut tree = parse_tree("{ { {1} + {2} } sin {3} }").unwrap();
        let before = tree.clone();
        assert!(matches!(
            tree.fold_constants(&table).unwrap_err(),
            ExprError::StructuralError(_)
        ));
        assert_eq!(tree, before);

        let mut tree = parse_tree("{ { { {x} * {1} } + {0} } cos {3} }").unwrap();
        let before = tree.clone();
        assert!(matches!(
            tree.eliminate_identities(&table).unwrap_err(),
            ExprError::StructuralError(_)
        ));
        assert_eq!(tree, before);
        assert!(matches!(
            tree.optimize(&table, &OptimizationPass::standard()).unwrap_err(),
            ExprError::StructuralError(_)
        ));
        assert_eq!(tree, before);
        assert!(tree.optimize_until_stable(&table, 8).is_err());
        assert_eq!(tree, before);
    }

    #[test]
    fn test_zero_base_rules_at_zero() {
        // 0/a and 0^a collapse to 0 even where evaluation of the source disagrees
        let table = OperatorTable::standard();
        let mut bindings = VariableBindings::new();
        bindings.insert("x".to_string(), 0.0);
        let mut power = parse_tree("{ {0} ^ {x} }").unwrap();
        assert_eq!(power.eval(&table, &bindings).unwrap(), 1.0);
        power.eliminate_identities(&table).unwrap();
        assert_eq!(power.eval(&table, &bindings).unwrap(), 0.0);

        let mut quotient = parse_tree("{ {0} / {x} }").unwrap();
        assert!(quotient.eval(&table, &bindings).unwrap().is_nan());
        quotient.eliminate_identities(&table).unwrap();
        assert_eq!(quotient.eval(&table, &bindings).unwrap(), 0.0);
    }

    #[test]
    fn test_single_round_vs_until_stable() {
        let table = OperatorTable::standard();
        let source = "{ { { {x} * {0} } + {2} } * {3} }";
        let mut once = parse_tree(source).unwrap();
        assert_eq!(once.optimize(&table, &OptimizationPass::standard()).unwrap(), 2);
        assert_eq!(once.to_string(), "{ {2} * {3} }");

        let mut stable = parse_tree(source).unwrap();
        assert_eq!(stable.optimize_until_stable(&table, 10).unwrap(), 3);
        assert_eq!(stable.to_string(), "{6}");
    }

    #[test]
    fn test_round_limit() {
        let table = OperatorTable::standard();
        let mut tree = parse_tree("{ { { {x} * {0} } + {2} } * {3} }").unwrap();
        assert_eq!(tree.optimize_until_stable(&table, 1).unwrap(), 2);
        assert_eq!(tree.to_string(), "{ {2} * {3} }");
        assert_eq!(tree.optimize_until_stable(&table, 0).unwrap(), 0);
    }

    #[test]
    fn test_pass_order_is_respected() {
        let table = OperatorTable::standard();
        let source = "{ { {2} - {1} } * {x} }";
        let mut tree = parse_tree(source).unwrap();
        tree.optimize(
            &table,
            &[OptimizationPass::IdentityElimination, OptimizationPass::ConstantFolding],
        )
        .unwrap();
        assert_eq!(tree.to_string(), "{ {1} * {x} }");

        let mut tree = parse_tree(source).unwrap();
        tree.optimize(&table, &OptimizationPass::standard()).unwrap();
        assert_eq!(tree.to_string(), "{x}");
    }

    #[test]
    fn test_pass_names() {
        assert_eq!(
            "fold".parse::<OptimizationPass>().unwrap(),
            OptimizationPass::ConstantFolding
        );
        assert_eq!(
            "Identity_Elimination".parse::<OptimizationPass>().unwrap(),
            OptimizationPass::IdentityElimination
        );
        assert!("expand".parse::<OptimizationPass>().is_err());
        assert_eq!(OptimizationPass::IdentityElimination.to_string(), "identities");
        assert_eq!(
            OptimizationPass::standard(),
            vec![
                OptimizationPass::ConstantFolding,
                OptimizationPass::IdentityElimination
            ]
        );
    }

    #[test]
    fn test_empty_tree() {
        let table = OperatorTable::standard();
        let mut tree = ExprTree::new();
        let err = tree.optimize(&table, &OptimizationPass::standard()).unwrap_err();
        assert!(matches!(err, ExprError::TreeError(_)));
        assert!(tree.fold_constants(&table).is_err());
    }
}
