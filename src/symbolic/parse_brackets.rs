//! a module turns a bracketed text into an expression tree
//!# Example
//! ```
//! use RustedDiff::symbolic::parse_brackets::parse_tree;
//! let tree = parse_tree("{ { {x} ^ {2} } + {1} }").unwrap();
//! assert_eq!(tree.size(), 5);
//! assert_eq!(tree.to_infix(), "((x ^ 2) + 1)");
//! ```
//                  grammar
//   Expr   := '{' Child? Token Child? '}'
//   Child  := Expr
//   Token  := Number | Symbol
//
//   "{ { {x} ^ {2} } + {1} }"
//    |   |_________|   |___|
//    |   left Child    right Child
//    |_______________ Token "+"
//
// A right Child is only allowed after a left Child: unary operators keep
// their operand on the left, so "{ sin {x} }" is rejected.
use crate::symbolic::expr_error::{ExprError, ExprResult};
use crate::symbolic::expr_tree::{Branch, ExprTree, Node, NodeValue};
use log::trace;
use nom::{
    IResult, Parser,
    bytes::complete::{take_till1, take_while},
    character::complete::char,
    number::complete::double,
};

const OPEN: char = '{';
const CLOSE: char = '}';
/// deepest accepted bracket nesting
pub const MAX_NESTING: usize = 512;

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == OPEN || c == CLOSE
}

/// skips exactly the characters `is_boundary` treats as whitespace
fn skip_spaces(input: &str) -> &str {
    let result: IResult<&str, &str> = take_while(char::is_whitespace).parse(input);
    match result {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

fn open_bracket(input: &str) -> IResult<&str, char> {
    char(OPEN).parse(input)
}

fn close_bracket(input: &str) -> IResult<&str, char> {
    char(CLOSE).parse(input)
}

/// maximal run of non-whitespace, non-brace characters
fn token_run(input: &str) -> IResult<&str, &str> {
    take_till1(is_boundary).parse(input)
}

/// A token is a number only if the float literal covers the whole run,
/// so "2x" or "info" stay symbols instead of splitting into a number and garbage.
fn number_token(token: &str) -> Option<f64> {
    let result: IResult<&str, f64> = double(token);
    match result {
        Ok(("", val)) => Some(val),
        _ => None,
    }
}

/// Recursive descent parser over one source buffer.
pub struct BracketParser<'a> {
    source: &'a str,
}

impl<'a> BracketParser<'a> {
    pub fn new(source: &'a str) -> Self {
        BracketParser { source }
    }

    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }

    /// Parses the whole buffer: exactly one `Expr` surrounded by optional whitespace.
    pub fn parse(&self) -> ExprResult<ExprTree> {
        let rest = skip_spaces(self.source);
        let (rest, root) = self.parse_node(rest, 1)?;
        let rest = skip_spaces(rest);
        if !rest.is_empty() {
            return Err(ExprError::syntax(
                self.offset(rest),
                "unexpected text after the outermost expression",
            ));
        }
        Ok(ExprTree::from_root(root))
    }

    fn parse_node(&self, input: &'a str, depth: usize) -> ExprResult<(&'a str, Node)> {
        if depth > MAX_NESTING {
            return Err(ExprError::syntax(
                self.offset(input),
                format!("brackets nested deeper than {} levels", MAX_NESTING),
            ));
        }
        let (rest, _) = open_bracket(input)
            .map_err(|_| ExprError::syntax(self.offset(input), "expected '{'"))?;
        let mut rest = skip_spaces(rest);

        let mut left = None;
        if rest.starts_with(OPEN) {
            let (after, child) = self.parse_node(rest, depth + 1)?;
            left = Some(child);
            rest = skip_spaces(after);
        }

        if rest.is_empty() || rest.starts_with(OPEN) || rest.starts_with(CLOSE) {
            return Err(ExprError::syntax(
                self.offset(rest),
                "expected a number or a symbol",
            ));
        }
        let (after, value) = self.parse_token(rest)?;
        let mut node = Node::new(value);
        if let Some(child) = left {
            node.insert_node(Branch::Left, child)?;
        }
        rest = skip_spaces(after);

        if rest.starts_with(OPEN) {
            if node.left().is_none() {
                return Err(ExprError::syntax(
                    self.offset(rest),
                    "right operand without a left operand",
                ));
            }
            let (after, child) = self.parse_node(rest, depth + 1)?;
            node.insert_node(Branch::Right, child)?;
            rest = skip_spaces(after);
        }

        let (rest, _) = close_bracket(rest)
            .map_err(|_| ExprError::syntax(self.offset(rest), "expected '}'"))?;
        Ok((rest, node))
    }

    fn parse_token(&self, input: &'a str) -> ExprResult<(&'a str, NodeValue)> {
        let (rest, token) = token_run(input)
            .map_err(|_| ExprError::syntax(self.offset(input), "expected a token"))?;
        let value = match number_token(token) {
            Some(val) => {
                trace!("number token {} at {}", val, self.offset(input));
                NodeValue::Number(val)
            }
            None => {
                trace!("symbol token '{}' at {}", token, self.offset(input));
                NodeValue::Symbol(token.to_string())
            }
        };
        Ok((rest, value))
    }
}

/// Parses a bracketed expression into a new tree.
pub fn parse_tree(input: &str) -> ExprResult<ExprTree> {
    BracketParser::new(input).parse()
}

impl std::str::FromStr for ExprTree {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tree(s)
    }
}
