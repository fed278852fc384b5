//! Canonical expression rendering.
//!
//! Condition memoization keys two visits of the same `if`/ternary condition
//! by its textual form, so the rendering must be deterministic: equal
//! subtrees yield byte-equal strings regardless of how the source spelled
//! whitespace or redundant parentheses. Parentheses are re-derived from C
//! operator precedence rather than copied from the source.

use super::Expr;

/// Render an expression to its canonical textual form.
pub fn expr_key(expr: &Expr) -> String {
    let mut out = String::new();
    render(expr, 0, &mut out);
    out
}

// C precedence levels, high binds tight. Only the relative order matters.
const PREC_PRIMARY: u8 = 16;
const PREC_POSTFIX: u8 = 15;
const PREC_UNARY: u8 = 14;
const PREC_TERNARY: u8 = 3;
const PREC_ASSIGN: u8 = 2;
const PREC_COMMA: u8 = 1;

fn binary_prec(op: &str) -> u8 {
    match op {
        "*" | "/" | "%" => 13,
        "+" | "-" => 12,
        "<<" | ">>" => 11,
        "<" | "<=" | ">" | ">=" => 10,
        "==" | "!=" => 9,
        "&" => 8,
        "^" => 7,
        "|" => 6,
        "&&" => 5,
        "||" => 4,
        _ => 4,
    }
}

fn prec(expr: &Expr) -> u8 {
    match expr {
        Expr::Ident(_) | Expr::Constant(_) | Expr::Verbatim(_) => PREC_PRIMARY,
        Expr::Call { .. } | Expr::Member { .. } | Expr::Index { .. } => PREC_POSTFIX,
        Expr::Unary { postfix, .. } => {
            if *postfix {
                PREC_POSTFIX
            } else {
                PREC_UNARY
            }
        }
        Expr::Cast { .. } => PREC_UNARY,
        Expr::Binary { op, .. } => binary_prec(op),
        Expr::Ternary { .. } => PREC_TERNARY,
        Expr::Assign { .. } => PREC_ASSIGN,
        Expr::Comma(_) => PREC_COMMA,
    }
}

/// Render `expr` into `out`; parenthesize when its precedence is below
/// `min` (the binding strength the context requires).
fn render(expr: &Expr, min: u8, out: &mut String) {
    let p = prec(expr);
    let parens = p < min;
    if parens {
        out.push('(');
    }
    match expr {
        Expr::Ident(name) => out.push_str(name),
        Expr::Constant(text) => out.push_str(text),
        Expr::Verbatim(text) => out.push_str(text),
        Expr::Call { callee, args } => {
            render(callee, PREC_POSTFIX, out);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(arg, PREC_ASSIGN, out);
            }
            out.push(')');
        }
        Expr::Unary {
            op,
            operand,
            postfix,
        } => {
            if *postfix {
                render(operand, PREC_POSTFIX, out);
                out.push_str(op);
            } else {
                out.push_str(op);
                render(operand, PREC_UNARY, out);
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let bp = binary_prec(op);
            render(lhs, bp, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            render(rhs, bp + 1, out);
        }
        Expr::Assign { op, lhs, rhs } => {
            render(lhs, PREC_UNARY, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            render(rhs, PREC_ASSIGN, out);
        }
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            render(cond, PREC_TERNARY + 1, out);
            out.push_str(" ? ");
            render(then_expr, PREC_TERNARY, out);
            out.push_str(" : ");
            render(else_expr, PREC_TERNARY, out);
        }
        Expr::Member { base, field, arrow } => {
            render(base, PREC_POSTFIX, out);
            out.push_str(if *arrow { "->" } else { "." });
            out.push_str(field);
        }
        Expr::Index { base, index } => {
            render(base, PREC_POSTFIX, out);
            out.push('[');
            render(index, PREC_COMMA, out);
            out.push(']');
        }
        Expr::Cast { ty, operand } => {
            out.push('(');
            out.push_str(ty);
            out.push(')');
            render(operand, PREC_UNARY, out);
        }
        Expr::Comma(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(item, PREC_ASSIGN, out);
            }
        }
    }
    if parens {
        out.push(')');
    }
}
