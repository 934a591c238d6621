//! Operator registry: symbol text, arity, numeric implementation and a stable id
//! used to pick derivative and simplification rules.
//!
//! The table is built explicitly and passed to every consumer; symbol resolution
//! always goes operator table first, then variable bindings, else unresolved.
use crate::symbolic::expr_error::{ExprError, ExprResult};
use crate::symbolic::expr_tree::{Node, NodeValue};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter};

/// name -> value map supplied by the caller
pub type VariableBindings = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Arity {
    Unary,
    Binary,
}

impl Arity {
    pub fn operands(self) -> usize {
        match self {
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum OperatorId {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Power,
    Sine,
    Cosine,
}

/// Immutable registry entry.
#[derive(Debug, Clone, Copy)]
pub struct OperatorDescriptor {
    pub symbol: &'static str,
    pub arity: Arity,
    pub id: OperatorId,
    /// second argument is ignored by unary operators
    pub function: fn(f64, f64) -> f64,
}

impl OperatorDescriptor {
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        (self.function)(lhs, rhs)
    }
}

fn op_addition(lhs: f64, rhs: f64) -> f64 {
    lhs + rhs
}

fn op_subtraction(lhs: f64, rhs: f64) -> f64 {
    lhs - rhs
}

fn op_multiplication(lhs: f64, rhs: f64) -> f64 {
    lhs * rhs
}

fn op_division(lhs: f64, rhs: f64) -> f64 {
    lhs / rhs
}

fn op_power(base: f64, exp: f64) -> f64 {
    base.powf(exp)
}

fn op_sine(arg: f64, _: f64) -> f64 {
    arg.sin()
}

fn op_cosine(arg: f64, _: f64) -> f64 {
    arg.cos()
}

fn entry(
    symbol: &'static str,
    arity: Arity,
    id: OperatorId,
    function: fn(f64, f64) -> f64,
) -> OperatorDescriptor {
    OperatorDescriptor {
        symbol,
        arity,
        id,
        function,
    }
}

/// What a node stands for under a given table and binding map.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'t> {
    Number(f64),
    Operator(&'t OperatorDescriptor),
    Variable(f64),
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct OperatorTable {
    entries: Vec<OperatorDescriptor>,
}

impl OperatorTable {
    /// `+ - * / ^` (binary) and `sin cos` (unary)
    pub fn standard() -> Self {
        OperatorTable {
            entries: vec![
                entry("+", Arity::Binary, OperatorId::Addition, op_addition),
                entry("-", Arity::Binary, OperatorId::Subtraction, op_subtraction),
                entry("*", Arity::Binary, OperatorId::Multiplication, op_multiplication),
                entry("/", Arity::Binary, OperatorId::Division, op_division),
                entry("^", Arity::Binary, OperatorId::Power, op_power),
                entry("sin", Arity::Unary, OperatorId::Sine, op_sine),
                entry("cos", Arity::Unary, OperatorId::Cosine, op_cosine),
            ],
        }
    }

    /// Table restricted to the given ids, in standard order.
    pub fn only(ids: &[OperatorId]) -> Self {
        let mut table = OperatorTable::standard();
        table.entries.retain(|entry| ids.contains(&entry.id));
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorDescriptor> {
        self.entries.iter()
    }

    /// exact symbol-text match
    pub fn by_symbol(&self, symbol: &str) -> Option<&OperatorDescriptor> {
        self.entries.iter().find(|entry| entry.symbol == symbol)
    }

    pub fn by_id(&self, id: OperatorId) -> Option<&OperatorDescriptor> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Symbol text for `id`; an id missing from this table cannot be used to build trees.
    pub fn symbol_of(&self, id: OperatorId) -> ExprResult<&'static str> {
        self.by_id(id).map(|entry| entry.symbol).ok_or_else(|| {
            ExprError::UnsupportedOperation(format!("operator {} is not registered", id))
        })
    }

    pub fn resolve(&self, node: &Node, bindings: &VariableBindings) -> Resolved<'_> {
        match node.value() {
            NodeValue::Number(val) => Resolved::Number(*val),
            NodeValue::Symbol(name) => {
                if let Some(entry) = self.by_symbol(name) {
                    Resolved::Operator(entry)
                } else if let Some(val) = bindings.get(name) {
                    Resolved::Variable(*val)
                } else {
                    Resolved::Unresolved
                }
            }
        }
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        OperatorTable::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_standard_table_has_every_id() {
        let table = OperatorTable::standard();
        assert_eq!(table.len(), 7);
        for id in OperatorId::iter() {
            let entry = table.by_id(id).unwrap();
            assert_eq!(table.by_symbol(entry.symbol).unwrap().id, id);
        }
    }

    #[test]
    fn test_arities() {
        let table = OperatorTable::standard();
        assert_eq!(table.by_symbol("sin").unwrap().arity, Arity::Unary);
        assert_eq!(table.by_symbol("cos").unwrap().arity.operands(), 1);
        assert_eq!(table.by_symbol("^").unwrap().arity, Arity::Binary);
        assert!(table.by_symbol("tan").is_none());
        assert!(table.by_symbol("SIN").is_none());
    }

    #[test]
    fn test_numeric_functions() {
        let table = OperatorTable::standard();
        let apply = |sym: &str, a: f64, b: f64| table.by_symbol(sym).unwrap().apply(a, b);
        assert_eq!(apply("+", 2.0, 3.0), 5.0);
        assert_eq!(apply("-", 2.0, 3.0), -1.0);
        assert_eq!(apply("*", 2.0, 3.0), 6.0);
        assert_eq!(apply("/", 3.0, 2.0), 1.5);
        assert_eq!(apply("^", 2.0, 10.0), 1024.0);
        assert_relative_eq!(apply("sin", 1.0, 123.0), 1.0_f64.sin());
        assert_relative_eq!(apply("cos", 1.0, 0.0), 1.0_f64.cos());
    }

    #[test]
    fn test_resolution_order() {
        let table = OperatorTable::standard();
        let mut bindings = VariableBindings::new();
        bindings.insert("x".to_string(), 2.5);
        // an operator symbol wins over a binding of the same name
        bindings.insert("sin".to_string(), 1.0);
        assert!(matches!(
            table.resolve(&Node::symbol("sin"), &bindings),
            Resolved::Operator(entry) if entry.id == OperatorId::Sine
        ));
        assert!(matches!(
            table.resolve(&Node::symbol("x"), &bindings),
            Resolved::Variable(v) if v == 2.5
        ));
        assert!(matches!(
            table.resolve(&Node::symbol("y"), &bindings),
            Resolved::Unresolved
        ));
        assert!(matches!(
            table.resolve(&Node::number(4.0), &bindings),
            Resolved::Number(v) if v == 4.0
        ));
    }

    #[test]
    fn test_restricted_table() {
        let table = OperatorTable::only(&[OperatorId::Addition, OperatorId::Power]);
        assert_eq!(table.len(), 2);
        assert!(table.symbol_of(OperatorId::Multiplication).is_err());
        assert_eq!(table.symbol_of(OperatorId::Power).unwrap(), "^");
    }
}
