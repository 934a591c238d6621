//! # Symbolic Engine Module
//!
//! One object bundling the operator table, the variable bindings and the optimizer
//! settings, so callers do not have to thread them through every call.
//!
//! ## Main Structures and Methods
//!
//! ### `SymbolicEngine`
//! - `parse(text)` - bracketed text to `ExprTree`
//! - `evaluate(&tree)` - numeric value under the current bindings
//! - `differentiate(&tree, var)` - new tree holding the derivative
//! - `optimize(&mut tree, passes)` / `optimize_until_stable(&mut tree, max_rounds)`
//! - `derivative_report(text, var)` - the whole pipeline: parse, evaluate, differentiate,
//!   simplify and evaluate the derivative
//!
//! ### `DerivativeReport`
//! Everything the pipeline produced, printable as a short multi-line summary.
//!
//! ### `bindings!` macro
//! `bindings!{ "x" => 3.0, "a" => 2 }` builds a `VariableBindings` map.
//!
//! # Example
//! ```
//! use RustedDiff::bindings;
//! use RustedDiff::symbolic::symbolic_engine::SymbolicEngine;
//! let engine = SymbolicEngine::with_bindings(bindings! { "x" => 3.0 });
//! let report = engine.derivative_report("{ {x} * {x} }", "x").unwrap();
//! assert_eq!(report.value, 9.0);
//! assert_eq!(report.derivative_value, 6.0);
//! ```
use crate::symbolic::expr_error::ExprResult;
use crate::symbolic::expr_tree::ExprTree;
use crate::symbolic::operators::{OperatorTable, VariableBindings};
use crate::symbolic::parse_brackets::parse_tree;
use crate::symbolic::session_config::SessionConfig;
use crate::symbolic::tree_simplify::OptimizationPass;
use log::info;
use std::fmt;

/// Builds a `VariableBindings` map: `bindings!{ "x" => 3.0, "y" => -1 }`.
#[macro_export]
macro_rules! bindings {
    () => {
        $crate::symbolic::operators::VariableBindings::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::symbolic::operators::VariableBindings::new();
            $(
                map.insert(::std::string::ToString::to_string(&$name), $value as f64);
            )+
            map
        }
    };
}

#[derive(Debug, Clone)]
pub struct SymbolicEngine {
    operators: OperatorTable,
    bindings: VariableBindings,
    passes: Vec<OptimizationPass>,
    /// `Some(limit)`: repeat the passes until stable, at most `limit` rounds
    stable_rounds: Option<usize>,
}

impl Default for SymbolicEngine {
    fn default() -> Self {
        SymbolicEngine::new()
    }
}

impl SymbolicEngine {
    /// Standard operators, no bindings, one round of folding then identity elimination.
    pub fn new() -> Self {
        SymbolicEngine {
            operators: OperatorTable::standard(),
            bindings: VariableBindings::new(),
            passes: OptimizationPass::standard(),
            stable_rounds: None,
        }
    }

    pub fn with_bindings(bindings: VariableBindings) -> Self {
        SymbolicEngine {
            bindings,
            ..SymbolicEngine::new()
        }
    }

    pub fn with_operators(operators: OperatorTable, bindings: VariableBindings) -> Self {
        SymbolicEngine {
            operators,
            bindings,
            ..SymbolicEngine::new()
        }
    }

    /// Bindings, passes and round limit taken from a session file.
    pub fn from_config(config: &SessionConfig) -> Self {
        SymbolicEngine {
            operators: OperatorTable::standard(),
            bindings: config.bindings(),
            passes: config.passes.clone(),
            stable_rounds: config.until_stable.then_some(config.max_rounds),
        }
    }

    /// Binds or rebinds `name`; returns the previous value.
    pub fn bind(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.bindings.insert(name.into(), value)
    }

    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn set_passes(&mut self, passes: Vec<OptimizationPass>) {
        self.passes = passes;
    }

    /// `None` runs every pass once, `Some(limit)` repeats them until nothing changes.
    pub fn set_stable_rounds(&mut self, rounds: Option<usize>) {
        self.stable_rounds = rounds;
    }

    pub fn parse(&self, text: &str) -> ExprResult<ExprTree> {
        parse_tree(text)
    }

    pub fn evaluate(&self, tree: &ExprTree) -> ExprResult<f64> {
        tree.eval(&self.operators, &self.bindings)
    }

    pub fn differentiate(&self, tree: &ExprTree, var: &str) -> ExprResult<ExprTree> {
        tree.diff(var, &self.operators, &self.bindings)
    }

    pub fn optimize(
        &self,
        tree: &mut ExprTree,
        passes: &[OptimizationPass],
    ) -> ExprResult<usize> {
        tree.optimize(&self.operators, passes)
    }

    /// Repeats the engine's passes until a round changes nothing or `max_rounds` ran.
    pub fn optimize_until_stable(
        &self,
        tree: &mut ExprTree,
        max_rounds: usize,
    ) -> ExprResult<usize> {
        tree.optimize_repeated(&self.operators, &self.passes, max_rounds)
    }

    /// Optimizes with the engine's own settings.
    pub fn simplify(&self, tree: &mut ExprTree) -> ExprResult<usize> {
        match self.stable_rounds {
            Some(limit) => self.optimize_until_stable(tree, limit),
            None => self.optimize(tree, &self.passes),
        }
    }

    /// Parses `text`, evaluates it, differentiates by `var`, simplifies the derivative
    /// and evaluates it too. The first failing step aborts the report.
    pub fn derivative_report(&self, text: &str, var: &str) -> ExprResult<DerivativeReport> {
        let source = self.parse(text)?;
        let value = self.evaluate(&source)?;
        let derivative = self.differentiate(&source, var)?;
        let mut simplified = derivative.clone();
        let rewrites = self.simplify(&mut simplified)?;
        let derivative_value = self.evaluate(&simplified)?;
        info!(
            "d/d{} of {}: {} nodes, {} after {} rewrite(s)",
            var,
            source.to_infix(),
            derivative.size(),
            simplified.size(),
            rewrites
        );
        Ok(DerivativeReport {
            variable: var.to_string(),
            source,
            value,
            derivative,
            simplified,
            rewrites,
            derivative_value,
        })
    }
}

/// Results of `SymbolicEngine::derivative_report`.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeReport {
    pub variable: String,
    pub source: ExprTree,
    pub value: f64,
    /// derivative exactly as the differentiation rules build it
    pub derivative: ExprTree,
    pub simplified: ExprTree,
    pub rewrites: usize,
    pub derivative_value: f64,
}

impl fmt::Display for DerivativeReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "expression: {} = {}", self.source.to_infix(), self.value)?;
        writeln!(f, "d/d{}: {}", self.variable, self.derivative.to_infix())?;
        write!(
            f,
            "simplified ({} rewrite(s)): {} = {}",
            self.rewrites,
            self.simplified.to_infix(),
            self.derivative_value
        )
    }
}
