//! Front-end: preprocessed C text to the checker's AST.
//!
//! Parsing is delegated to tree-sitter with the C grammar; this module only
//! lowers the concrete tree to [`crate::ast`] types. The lowering is
//! deliberately lossy in the right places: expression forms the analysis
//! has no use for fold into [`Expr::Verbatim`] with normalized source text,
//! and unknown statement wrappers lower to their children. tree-sitter is
//! error-tolerant, so stray constructs inside one function degrade locally
//! instead of failing the file.

mod prefilter;

pub use prefilter::strip_extensions;

use crate::ast::{Expr, FuncDef, Stmt, TranslationUnit};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser};

/// Front-end failure.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load C grammar: {0}")]
    Grammar(String),

    #[error("tree-sitter produced no syntax tree")]
    NoTree,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read, pre-filter, and parse one file.
pub fn parse_file(path: &Path) -> Result<TranslationUnit, ParseError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&strip_extensions(&raw))
}

/// Parse preprocessed C text into a translation unit.
pub fn parse_source(source: &str) -> Result<TranslationUnit, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| ParseError::Grammar(e.to_string()))?;
    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::warn!("syntax errors in input; affected constructs degrade to opaque text");
    }

    let mut functions = Vec::new();
    for i in 0..root.named_child_count() {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        if child.kind() == "function_definition" {
            if let Some(func) = lower_function(child, source) {
                functions.push(func);
            }
        }
    }
    Ok(TranslationUnit { functions })
}

fn lower_function(node: Node, src: &str) -> Option<FuncDef> {
    let name = declarator_name(node.child_by_field_name("declarator")?, src)?;
    let body = lower_stmt(node.child_by_field_name("body")?, src);
    Some(FuncDef {
        name,
        line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
        body,
    })
}

/// Descend a declarator chain to the defined identifier.
fn declarator_name(node: Node, src: &str) -> Option<String> {
    let mut current = node;
    loop {
        if current.kind() == "identifier" {
            return Some(text(current, src));
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| first_named(current))?;
    }
}

/// Named children minus comments.
fn named_children(node: Node) -> Vec<Node> {
    (0..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn first_named(node: Node) -> Option<Node> {
    named_children(node).into_iter().next()
}

fn text(node: Node, src: &str) -> String {
    node.utf8_text(src.as_bytes()).unwrap_or("").to_string()
}

/// Source text with whitespace runs collapsed, for opaque fallbacks.
fn verbatim(node: Node, src: &str) -> Expr {
    Expr::Verbatim(text(node, src).split_whitespace().collect::<Vec<_>>().join(" "))
}

fn lower_stmt(node: Node, src: &str) -> Stmt {
    match node.kind() {
        "compound_statement" => Stmt::Compound(
            named_children(node)
                .into_iter()
                .map(|c| lower_stmt(c, src))
                .collect(),
        ),
        "expression_statement" => match first_named(node) {
            Some(e) => Stmt::Expr(lower_expr(e, src)),
            None => Stmt::Empty,
        },
        "declaration" => Stmt::Decl(
            named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "init_declarator")
                .filter_map(|c| c.child_by_field_name("value"))
                .map(|v| lower_expr(v, src))
                .collect(),
        ),
        "return_statement" => Stmt::Return(first_named(node).map(|e| lower_expr(e, src))),
        "if_statement" => {
            let cond = condition(node, src);
            let then_branch = node
                .child_by_field_name("consequence")
                .map(|c| lower_stmt(c, src))
                .unwrap_or(Stmt::Empty);
            let else_branch = node
                .child_by_field_name("alternative")
                .and_then(|alt| {
                    if alt.kind() == "else_clause" {
                        first_named(alt)
                    } else {
                        Some(alt)
                    }
                })
                .map(|s| Box::new(lower_stmt(s, src)));
            Stmt::If {
                cond,
                then_branch: Box::new(then_branch),
                else_branch,
            }
        }
        "switch_statement" => Stmt::Switch {
            cond: condition(node, src),
            body: Box::new(
                node.child_by_field_name("body")
                    .map(|b| lower_stmt(b, src))
                    .unwrap_or(Stmt::Empty),
            ),
        },
        "case_statement" => {
            let guard = node.child_by_field_name("value");
            let body = named_children(node)
                .into_iter()
                .filter(|c| guard.map_or(true, |g| g.id() != c.id()))
                .map(|c| lower_stmt(c, src))
                .collect();
            Stmt::Case {
                guard: guard.map(|g| lower_expr(g, src)),
                body,
            }
        }
        "while_statement" => Stmt::While {
            cond: condition(node, src),
            body: Box::new(body_or_empty(node, src)),
        },
        "do_statement" => Stmt::DoWhile {
            body: Box::new(body_or_empty(node, src)),
            cond: condition(node, src),
        },
        "for_statement" => {
            let init = node.child_by_field_name("initializer").map(|n| {
                Box::new(if n.kind() == "declaration" {
                    lower_stmt(n, src)
                } else {
                    Stmt::Expr(lower_expr(n, src))
                })
            });
            Stmt::For {
                init,
                cond: node
                    .child_by_field_name("condition")
                    .map(|n| lower_expr(n, src)),
                step: node.child_by_field_name("update").map(|n| lower_expr(n, src)),
                body: Box::new(body_or_empty(node, src)),
            }
        }
        "break_statement" => Stmt::Break,
        "continue_statement" => Stmt::Continue,
        "goto_statement" => Stmt::Goto(
            node.child_by_field_name("label")
                .map(|l| text(l, src))
                .unwrap_or_default(),
        ),
        "labeled_statement" => {
            let label = node.child_by_field_name("label");
            let name = label.map(|l| text(l, src)).unwrap_or_default();
            let stmt = named_children(node)
                .into_iter()
                .find(|c| label.map_or(true, |l| l.id() != c.id()))
                .map(|c| lower_stmt(c, src))
                .unwrap_or(Stmt::Empty);
            Stmt::Label {
                name,
                stmt: Box::new(stmt),
            }
        }
        kind if is_expression_kind(kind) => Stmt::Expr(lower_expr(node, src)),
        // Unknown wrappers (attributed statements, stray preprocessor
        // leftovers, error nodes): keep whatever statements are inside.
        _ => {
            let inner: Vec<Stmt> = named_children(node)
                .into_iter()
                .map(|c| lower_stmt(c, src))
                .collect();
            match inner.len() {
                0 => Stmt::Empty,
                1 => inner.into_iter().next().unwrap_or(Stmt::Empty),
                _ => Stmt::Compound(inner),
            }
        }
    }
}

/// The `condition` field, unwrapping the grammar's parenthesized node.
fn condition(node: Node, src: &str) -> Expr {
    node.child_by_field_name("condition")
        .map(|c| lower_expr(c, src))
        .unwrap_or(Expr::Constant("1".into()))
}

fn body_or_empty(node: Node, src: &str) -> Stmt {
    node.child_by_field_name("body")
        .map(|b| lower_stmt(b, src))
        .unwrap_or(Stmt::Empty)
}

fn is_expression_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "number_literal"
            | "char_literal"
            | "string_literal"
            | "concatenated_string"
            | "true"
            | "false"
            | "null"
            | "call_expression"
            | "binary_expression"
            | "unary_expression"
            | "update_expression"
            | "assignment_expression"
            | "conditional_expression"
            | "field_expression"
            | "subscript_expression"
            | "cast_expression"
            | "pointer_expression"
            | "parenthesized_expression"
            | "comma_expression"
            | "sizeof_expression"
    )
}

fn lower_expr(node: Node, src: &str) -> Expr {
    match node.kind() {
        "identifier" => Expr::Ident(text(node, src)),
        "number_literal" | "char_literal" | "string_literal" | "concatenated_string" | "true"
        | "false" | "null" => Expr::Constant(text(node, src)),
        "parenthesized_expression" => match first_named(node) {
            Some(inner) => lower_expr(inner, src),
            None => verbatim(node, src),
        },
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map(|f| lower_expr(f, src))
                .unwrap_or_else(|| verbatim(node, src));
            let args = node
                .child_by_field_name("arguments")
                .map(|a| {
                    named_children(a)
                        .into_iter()
                        .map(|c| lower_expr(c, src))
                        .collect()
                })
                .unwrap_or_default();
            Expr::Call {
                callee: Box::new(callee),
                args,
            }
        }
        "binary_expression" => match (
            node.child_by_field_name("left"),
            node.child_by_field_name("operator"),
            node.child_by_field_name("right"),
        ) {
            (Some(l), Some(op), Some(r)) => Expr::Binary {
                op: text(op, src),
                lhs: Box::new(lower_expr(l, src)),
                rhs: Box::new(lower_expr(r, src)),
            },
            _ => verbatim(node, src),
        },
        "assignment_expression" => match (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) {
            (Some(l), Some(r)) => Expr::Assign {
                op: node
                    .child_by_field_name("operator")
                    .map(|o| text(o, src))
                    .unwrap_or_else(|| "=".into()),
                lhs: Box::new(lower_expr(l, src)),
                rhs: Box::new(lower_expr(r, src)),
            },
            _ => verbatim(node, src),
        },
        "unary_expression" | "pointer_expression" => match (
            node.child_by_field_name("operator"),
            node.child_by_field_name("argument"),
        ) {
            (Some(op), Some(arg)) => Expr::Unary {
                op: text(op, src),
                operand: Box::new(lower_expr(arg, src)),
                postfix: false,
            },
            _ => verbatim(node, src),
        },
        "update_expression" => match (
            node.child_by_field_name("operator"),
            node.child_by_field_name("argument"),
        ) {
            (Some(op), Some(arg)) => Expr::Unary {
                op: text(op, src),
                operand: Box::new(lower_expr(arg, src)),
                postfix: op.start_byte() > arg.start_byte(),
            },
            _ => verbatim(node, src),
        },
        "conditional_expression" => match (
            node.child_by_field_name("condition"),
            node.child_by_field_name("consequence"),
            node.child_by_field_name("alternative"),
        ) {
            (Some(c), Some(t), Some(e)) => Expr::Ternary {
                cond: Box::new(lower_expr(c, src)),
                then_expr: Box::new(lower_expr(t, src)),
                else_expr: Box::new(lower_expr(e, src)),
            },
            _ => verbatim(node, src),
        },
        "field_expression" => match (
            node.child_by_field_name("argument"),
            node.child_by_field_name("field"),
        ) {
            (Some(base), Some(field)) => {
                let between = &src[base.end_byte()..field.start_byte()];
                Expr::Member {
                    base: Box::new(lower_expr(base, src)),
                    field: text(field, src),
                    arrow: between.contains("->"),
                }
            }
            _ => verbatim(node, src),
        },
        "subscript_expression" => match (
            node.child_by_field_name("argument"),
            node.child_by_field_name("index"),
        ) {
            (Some(base), Some(index)) => Expr::Index {
                base: Box::new(lower_expr(base, src)),
                index: Box::new(lower_expr(index, src)),
            },
            _ => verbatim(node, src),
        },
        "cast_expression" => match (
            node.child_by_field_name("type"),
            node.child_by_field_name("value"),
        ) {
            (Some(ty), Some(value)) => Expr::Cast {
                ty: text(ty, src).split_whitespace().collect::<Vec<_>>().join(" "),
                operand: Box::new(lower_expr(value, src)),
            },
            _ => verbatim(node, src),
        },
        "comma_expression" => {
            let mut items = Vec::new();
            flatten_comma(node, src, &mut items);
            Expr::Comma(items)
        }
        _ => verbatim(node, src),
    }
}

fn flatten_comma(node: Node, src: &str, items: &mut Vec<Expr>) {
    let (left, right) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    );
    match (left, right) {
        (Some(l), Some(r)) => {
            items.push(lower_expr(l, src));
            if r.kind() == "comma_expression" {
                flatten_comma(r, src, items);
            } else {
                items.push(lower_expr(r, src));
            }
        }
        _ => items.push(verbatim(node, src)),
    }
}
