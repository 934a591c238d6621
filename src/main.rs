#![allow(non_snake_case)]
use RustedDiff::bindings;
use RustedDiff::symbolic::expr_error::ExprResult;
use RustedDiff::symbolic::expr_tree::{Branch, ExprTree, Node, NodeView};
use RustedDiff::symbolic::session_config::SessionConfig;
use RustedDiff::symbolic::symbolic_engine::SymbolicEngine;
use RustedDiff::symbolic::tree_simplify::OptimizationPass;
use RustedDiff::symbolic::tree_visitor::{TreeVisitor, walk_tree};

/// prints every node indented by its depth
struct Outline;

impl TreeVisitor for Outline {
    fn visit(&mut self, view: NodeView<'_>) -> bool {
        println!("{}{} ({})", "  ".repeat(view.depth), view.text(), view.kind());
        true
    }
}

/// x * cos(x), assembled node by node
fn x_times_cos_x() -> ExprResult<ExprTree> {
    let mut root = Node::symbol("*");
    let x = Node::symbol("x");
    root.copy_branch(Branch::Left, &x)?;
    let cos = root.insert_node(Branch::Right, Node::symbol("cos"))?;
    cos.copy_branch(Branch::Left, &x)?;
    Ok(ExprTree::from_root(root))
}

fn main() {
    let example = 0;
    match example {
        0 => {
            // whole pipeline for a single expression
            let engine = SymbolicEngine::with_bindings(bindings! { "x" => 3.0 });
            match engine.derivative_report("{ {x} ^ {3} }", "x") {
                Ok(report) => println!("{}", report),
                Err(err) => println!("error: {}", err),
            }
        }
        1 => {
            // build a tree by hand, copy a branch and differentiate
            let tree = match x_times_cos_x() {
                Ok(tree) => tree,
                Err(err) => {
                    println!("error: {}", err);
                    return;
                }
            };
            println!("tree: {}  infix: {}", tree, tree.to_infix());
            walk_tree(&tree, &mut Outline);

            let engine = SymbolicEngine::with_bindings(bindings! { "x" => 0.5 });
            match engine.differentiate(&tree, "x") {
                Ok(mut derivative) => {
                    println!("raw derivative: {}", derivative.to_infix());
                    let rewrites = engine.optimize(&mut derivative, &OptimizationPass::standard());
                    println!("rewrites {:?}, simplified: {}", rewrites, derivative.to_infix());
                    println!("value at x = 0.5: {:?}", engine.evaluate(&derivative));
                }
                Err(err) => println!("error: {}", err),
            }
        }
        2 => {
            // settings from a task document
            let text = r#"
                variables
                  x: 2.0
                  k: 5
                optimization
                  passes: fold, identities
                  until_stable: true
                logging
                  level: debug
            "#;
            let config: SessionConfig = match text.parse() {
                Ok(config) => config,
                Err(err) => {
                    println!("error: {}", err);
                    return;
                }
            };
            if let Err(err) = config.init_logging() {
                println!("logger not installed: {}", err);
            }
            let engine = SymbolicEngine::from_config(&config);
            for input in [
                "{ { {k} * {x} } + { {x} * {0} } }",
                "{ { { {x} ^ {2} } + {1} } sin }",
                "{ {x} ^ {x} }",
                "{ {x} + ",
            ] {
                match engine.derivative_report(input, &config.with_respect_to) {
                    Ok(report) => println!("{}\n", report),
                    Err(err) => println!("{} -> error: {}\n", input, err),
                }
            }
        }
        _ => {
            println!("example not found");
        }
    }
}
