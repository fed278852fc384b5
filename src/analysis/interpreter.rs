//! The path-sensitive AST walk.
//!
//! [`PathInterpreter`] drives one function body through every control-flow
//! alternative. It consults the catalog to classify call sites, mutates the
//! path's [`LockState`](super::state::LockState), and forks sibling
//! explorations wherever control may diverge. Cycles are not followed:
//! loop bodies are walked once, a backward goto ends its path (the forward
//! walk already covered the target region), and the condition memo keeps a
//! re-encountered `if` on the branch it took the first time. This is
//! deliberately unsound for iteration-count-dependent balance; the tool is
//! a lint, not a verifier.
//!
//! Pruning keeps the fork count proportional to locking-relevant code: a
//! construct is only entered when its subtree contains a catalog call, a
//! goto, or (while skipping to a label) the goto's target.

use super::catalog::LockCatalog;
use super::context::ExplorationContext;
use super::explorer::{PathEnd, PathSet};
use crate::ast::{expr_key, Expr, Stmt};
use std::cell::Cell;

/// Nesting deeper than this is assumed to be malformed input; the path is
/// surfaced as an internal outcome instead of blowing the stack.
const MAX_DEPTH: usize = 512;

/// Walks one function body, spawning sibling paths at control divergences.
pub struct PathInterpreter<'a> {
    catalog: &'a LockCatalog,
    /// The enclosing function body, for source-order queries.
    root: &'a Stmt,
    depth: Cell<usize>,
}

impl<'a> PathInterpreter<'a> {
    pub fn new(catalog: &'a LockCatalog, root: &'a Stmt) -> Self {
        Self {
            catalog,
            root,
            depth: Cell::new(0),
        }
    }

    /// Explore the whole body from `ctx`. The returned set holds every
    /// sibling path: still-live fall-throughs and raised outcomes alike.
    pub fn run(&self, ctx: ExplorationContext) -> PathSet {
        self.stmt(self.root, ctx)
    }

    /// Whether the body contains any catalog-relevant call at all; a
    /// function with none cannot misbalance anything and is skipped.
    pub fn function_is_relevant(&self) -> bool {
        self.stmt_contains_call(self.root)
    }

    // ========================================================================
    // Statement dispatch
    // ========================================================================

    fn stmt(&self, s: &'a Stmt, ctx: ExplorationContext) -> PathSet {
        self.depth.set(self.depth.get() + 1);
        let out = if self.depth.get() > MAX_DEPTH {
            PathSet::ended(
                PathEnd::Internal {
                    reason: "statement nesting exceeds interpreter depth limit".into(),
                },
                ctx,
            )
        } else {
            self.stmt_inner(s, ctx)
        };
        self.depth.set(self.depth.get() - 1);
        out
    }

    fn stmt_inner(&self, s: &'a Stmt, ctx: ExplorationContext) -> PathSet {
        match s {
            Stmt::Compound(items) => self.stmts(items, PathSet::single(ctx)),
            Stmt::Expr(e) => self.expr(e, ctx),
            Stmt::Decl(inits) => self.exprs(inits, PathSet::single(ctx)),
            Stmt::Empty => PathSet::single(ctx),
            Stmt::Return(value) => self.return_stmt(value.as_ref(), ctx),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.if_stmt(s, cond, then_branch, else_branch.as_deref(), ctx),
            Stmt::Switch { cond, body } => self.switch_stmt(s, cond, body, ctx),
            // A case outside switch dispatch (ill-formed or label-seeking
            // walk): just its statements.
            Stmt::Case { body, .. } => self.stmts(body, PathSet::single(ctx)),
            Stmt::While { cond, body } => self.while_stmt(s, cond, body, ctx),
            Stmt::DoWhile { body, cond } => self.do_while_stmt(s, body, cond, ctx),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.for_stmt(s, init.as_deref(), cond.as_ref(), step.as_ref(), body, ctx),
            Stmt::Break => {
                if ctx.ignoring() {
                    PathSet::single(ctx)
                } else {
                    PathSet::ended(PathEnd::Break, ctx)
                }
            }
            Stmt::Continue => {
                if ctx.ignoring() {
                    PathSet::single(ctx)
                } else {
                    PathSet::ended(PathEnd::Continue, ctx)
                }
            }
            Stmt::Goto(label) => self.goto_stmt(s, label, ctx),
            Stmt::Label { name, stmt } => {
                let mut ctx = ctx;
                if ctx.ignore_until.as_deref() == Some(name.as_str()) {
                    ctx.ignore_until = None;
                }
                self.stmt(stmt, ctx)
            }
        }
    }

    /// Sequence a statement list over every live path.
    fn stmts(&self, list: &'a [Stmt], set: PathSet) -> PathSet {
        list.iter().fold(set, |set, s| set.then(|ctx| self.stmt(s, ctx)))
    }

    fn return_stmt(&self, value: Option<&'a Expr>, ctx: ExplorationContext) -> PathSet {
        if ctx.ignoring() {
            return PathSet::single(ctx);
        }
        // Calls inside the return expression still count.
        let set = match value {
            Some(e) => self.expr(e, ctx),
            None => PathSet::single(ctx),
        };
        set.then(|ctx| {
            if ctx.state.balanced() {
                PathSet::ended(PathEnd::NoError, ctx)
            } else {
                PathSet::ended(PathEnd::Return, ctx)
            }
        })
    }

    fn if_stmt(
        &self,
        whole: &'a Stmt,
        cond: &'a Expr,
        then_branch: &'a Stmt,
        else_branch: Option<&'a Stmt>,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_stmt(whole, &ctx) {
            return PathSet::single(ctx);
        }
        self.cond_expr(cond, ctx).then(|ctx| {
            let true_matters = self.needs_visit_stmt(then_branch, &ctx);
            let false_matters = else_branch.is_some_and(|e| self.needs_visit_stmt(e, &ctx));
            self.fork(
                expr_key(cond),
                ctx,
                true_matters,
                |c| self.stmt(then_branch, c),
                false_matters,
                |c| match else_branch {
                    Some(e) => self.stmt(e, c),
                    None => PathSet::single(c),
                },
            )
        })
    }

    fn switch_stmt(
        &self,
        whole: &'a Stmt,
        cond: &'a Expr,
        body: &'a Stmt,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_stmt(whole, &ctx) {
            return PathSet::single(ctx);
        }
        if let Some(target) = ctx.ignore_until.as_deref() {
            // Jumping into a switch body is the acknowledged inconsistent
            // case; surface it instead of mis-analyzing.
            if stmt_contains_label(body, target) {
                let reason = format!("goto into switch body (label '{}')", target);
                return PathSet::ended(PathEnd::Internal { reason }, ctx);
            }
            // Gotos inside are skipped while ignoring, so nothing in the
            // switch can matter to this path.
            return PathSet::single(ctx);
        }
        self.cond_expr(cond, ctx).then(|ctx| {
            let cases = collect_cases(body);
            if cases.is_empty() {
                return PathSet::single(ctx);
            }
            let mut out = PathSet::empty();
            // One sibling per entry case; each falls through the following
            // cases until a break hands it back to just after the switch.
            for enter_at in 0..cases.len() {
                let mut fall = PathSet::single(ctx.clone());
                for case in &cases[enter_at..] {
                    fall = self.stmts(case, fall);
                }
                out.merge(fall.catch_breaks());
            }
            // And the sibling that matches no case at all.
            out.push_live(ctx);
            out
        })
    }

    fn while_stmt(
        &self,
        whole: &'a Stmt,
        cond: &'a Expr,
        body: &'a Stmt,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_stmt(whole, &ctx) {
            return PathSet::single(ctx);
        }
        let endless = cond.is_nonzero_constant();
        self.cond_expr(cond, ctx).then(|ctx| {
            // Sibling one: the condition is false, the body never runs.
            let mut out = PathSet::single(ctx.clone());
            // Sibling two: one walk of the body. Completing an endless body
            // absorbs the path (it can never fall out); a caught break or
            // continue resumes just after the loop with the state held at
            // the exit, except that a continue cannot escape an endless
            // loop.
            let body_paths = self
                .stmt(body, ctx)
                .then(|c| {
                    if endless {
                        PathSet::ended(PathEnd::NoError, c)
                    } else {
                        PathSet::single(c)
                    }
                })
                .catch_loop_exits(endless);
            out.merge(body_paths);
            out
        })
    }

    fn do_while_stmt(
        &self,
        whole: &'a Stmt,
        body: &'a Stmt,
        cond: &'a Expr,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_stmt(whole, &ctx) {
            return PathSet::single(ctx);
        }
        // The body always runs once, so there is no skip sibling. Paths
        // that complete the body test the condition; a break jumps past it
        // and resumes after the loop.
        let endless = cond.is_nonzero_constant();
        self.stmt(body, ctx)
            .then(|c| self.cond_expr(cond, c))
            .then(|c| {
                if endless {
                    PathSet::ended(PathEnd::NoError, c)
                } else {
                    PathSet::single(c)
                }
            })
            .catch_loop_exits(endless)
    }

    fn for_stmt(
        &self,
        whole: &'a Stmt,
        init: Option<&'a Stmt>,
        cond: Option<&'a Expr>,
        step: Option<&'a Expr>,
        body: &'a Stmt,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_stmt(whole, &ctx) {
            return PathSet::single(ctx);
        }
        let endless = init.is_none() && cond.is_none() && step.is_none();
        self.for_header(init, cond, step, ctx).then(|ctx| {
            let mut out = PathSet::single(ctx.clone());
            let body_paths = self
                .stmt(body, ctx)
                .then(|c| {
                    if endless {
                        PathSet::ended(PathEnd::NoError, c)
                    } else {
                        PathSet::single(c)
                    }
                })
                .catch_loop_exits(endless);
            out.merge(body_paths);
            out
        })
    }

    /// Visit the three header positions of a `for` in order, all forbidden.
    fn for_header(
        &self,
        init: Option<&'a Stmt>,
        cond: Option<&'a Expr>,
        step: Option<&'a Expr>,
        mut ctx: ExplorationContext,
    ) -> PathSet {
        let was = ctx.forbidden;
        ctx.forbidden = true;
        let mut set = PathSet::single(ctx);
        if let Some(init) = init {
            set = set.then(|c| self.stmt(init, c));
        }
        if let Some(cond) = cond {
            set = set.then(|c| self.expr(cond, c));
        }
        if let Some(step) = step {
            set = set.then(|c| self.expr(step, c));
        }
        set.then(move |mut c| {
            c.forbidden = was;
            PathSet::single(c)
        })
    }

    fn goto_stmt(&self, node: &'a Stmt, label: &str, mut ctx: ExplorationContext) -> PathSet {
        if ctx.ignoring() {
            return PathSet::single(ctx);
        }
        if self.goto_is_backward(node, label) {
            // The forward walk already visited the target region; a jump
            // back re-runs covered code.
            PathSet::ended(PathEnd::NoError, ctx)
        } else {
            ctx.ignore_until = Some(label.to_string());
            PathSet::single(ctx)
        }
    }

    // ========================================================================
    // Expression dispatch
    // ========================================================================

    fn expr(&self, e: &'a Expr, ctx: ExplorationContext) -> PathSet {
        if ctx.ignoring() {
            return PathSet::single(ctx);
        }
        match e {
            Expr::Ident(_) | Expr::Constant(_) | Expr::Verbatim(_) => PathSet::single(ctx),
            Expr::Call { callee, args } => self.call(callee, args, ctx),
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => self.expr(operand, ctx),
            Expr::Member { base, .. } => self.expr(base, ctx),
            Expr::Binary { lhs, rhs, .. } | Expr::Assign { lhs, rhs, .. } => {
                self.expr(lhs, ctx).then(|c| self.expr(rhs, c))
            }
            Expr::Index { base, index } => self.expr(base, ctx).then(|c| self.expr(index, c)),
            Expr::Comma(items) => self.exprs(items, PathSet::single(ctx)),
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.ternary(e, cond, then_expr, else_expr, ctx),
        }
    }

    fn exprs(&self, list: &'a [Expr], set: PathSet) -> PathSet {
        list.iter().fold(set, |set, e| set.then(|ctx| self.expr(e, ctx)))
    }

    fn call(&self, callee: &'a Expr, args: &'a [Expr], mut ctx: ExplorationContext) -> PathSet {
        if let Expr::Ident(name) = callee {
            if name == "panic" {
                // Irrecoverable terminator: the process is presumed dying,
                // so no balance check applies to this path.
                return PathSet::ended(PathEnd::NoError, ctx);
            }
            if let Some(op) = self.catalog.classify(name) {
                if ctx.forbidden {
                    let reason =
                        format!("{} called in a position with indeterminate execution count", name);
                    return PathSet::ended(PathEnd::Forbidden { reason }, ctx);
                }
                ctx.state.update(Some(op));
                tracing::trace!(callee = %name, "lock operation");
            }
            self.exprs(args, PathSet::single(ctx))
        } else {
            // Opaque callee (function pointer, member expression): never
            // classified, but calls nested inside it still count.
            let set = self.expr(callee, ctx);
            self.exprs(args, set)
        }
    }

    /// The ternary operator behaves exactly like `if`, on expressions.
    fn ternary(
        &self,
        whole: &'a Expr,
        cond: &'a Expr,
        then_expr: &'a Expr,
        else_expr: &'a Expr,
        ctx: ExplorationContext,
    ) -> PathSet {
        if !self.needs_visit_expr(whole, &ctx) {
            return PathSet::single(ctx);
        }
        self.cond_expr(cond, ctx).then(|ctx| {
            let true_matters = self.needs_visit_expr(then_expr, &ctx);
            let false_matters = self.needs_visit_expr(else_expr, &ctx);
            self.fork(
                expr_key(cond),
                ctx,
                true_matters,
                |c| self.expr(then_expr, c),
                false_matters,
                |c| self.expr(else_expr, c),
            )
        })
    }

    // ========================================================================
    // Splitting
    // ========================================================================

    /// Visit a condition with the forbidden flag raised, restoring the
    /// caller's flag on every surviving path.
    fn cond_expr(&self, e: &'a Expr, mut ctx: ExplorationContext) -> PathSet {
        let was = ctx.forbidden;
        ctx.forbidden = true;
        self.expr(e, ctx).then(move |mut c| {
            c.forbidden = was;
            PathSet::single(c)
        })
    }

    /// Memo-guided two-way split shared by `if` and the ternary operator.
    ///
    /// On first encounter of `key` the path forks: one sibling records
    /// `true` and walks the true side, the other records `false` and walks
    /// the false side; a side whose subtree cannot matter is skipped but
    /// its sibling still exists, so the fall-through alternative is always
    /// modeled. A re-encountered condition replays the recorded branch
    /// without splitting.
    fn fork<T, F>(
        &self,
        key: String,
        ctx: ExplorationContext,
        true_matters: bool,
        true_side: T,
        false_matters: bool,
        false_side: F,
    ) -> PathSet
    where
        T: FnOnce(ExplorationContext) -> PathSet,
        F: FnOnce(ExplorationContext) -> PathSet,
    {
        if let Some(&taken) = ctx.cond_memo.get(&key) {
            return if taken { true_side(ctx) } else { false_side(ctx) };
        }
        if !true_matters && !false_matters {
            return PathSet::single(ctx);
        }
        tracing::trace!(cond = %key, "splitting exploration");
        let mut false_ctx = ctx.clone();
        let mut true_ctx = ctx;
        true_ctx.cond_memo.insert(key.clone(), true);
        false_ctx.cond_memo.insert(key, false);
        let mut out = PathSet::empty();
        out.merge(if true_matters {
            true_side(true_ctx)
        } else {
            PathSet::single(true_ctx)
        });
        out.merge(if false_matters {
            false_side(false_ctx)
        } else {
            PathSet::single(false_ctx)
        });
        out
    }

    // ========================================================================
    // Pruning and source-order queries
    // ========================================================================

    /// Whether walking `s` can matter for this path: while skipping to a
    /// label, only the target label or a goto can; otherwise only a catalog
    /// call or a goto can.
    fn needs_visit_stmt(&self, s: &Stmt, ctx: &ExplorationContext) -> bool {
        match ctx.ignore_until.as_deref() {
            Some(target) => stmt_contains_label(s, target) || stmt_contains_goto(s),
            None => self.stmt_contains_call(s) || stmt_contains_goto(s),
        }
    }

    /// Expression version: expressions cannot contain labels or gotos.
    fn needs_visit_expr(&self, e: &Expr, ctx: &ExplorationContext) -> bool {
        !ctx.ignoring() && self.expr_contains_call(e)
    }

    fn stmt_contains_call(&self, s: &Stmt) -> bool {
        match s {
            Stmt::Compound(items) => items.iter().any(|s| self.stmt_contains_call(s)),
            Stmt::Expr(e) => self.expr_contains_call(e),
            Stmt::Decl(inits) => inits.iter().any(|e| self.expr_contains_call(e)),
            Stmt::Return(value) => value.as_ref().is_some_and(|e| self.expr_contains_call(e)),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr_contains_call(cond)
                    || self.stmt_contains_call(then_branch)
                    || else_branch.as_deref().is_some_and(|e| self.stmt_contains_call(e))
            }
            Stmt::Switch { cond, body } => {
                self.expr_contains_call(cond) || self.stmt_contains_call(body)
            }
            Stmt::Case { guard, body } => {
                guard.as_ref().is_some_and(|e| self.expr_contains_call(e))
                    || body.iter().any(|s| self.stmt_contains_call(s))
            }
            Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
                self.expr_contains_call(cond) || self.stmt_contains_call(body)
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                init.as_deref().is_some_and(|s| self.stmt_contains_call(s))
                    || cond.as_ref().is_some_and(|e| self.expr_contains_call(e))
                    || step.as_ref().is_some_and(|e| self.expr_contains_call(e))
                    || self.stmt_contains_call(body)
            }
            Stmt::Label { stmt, .. } => self.stmt_contains_call(stmt),
            Stmt::Break | Stmt::Continue | Stmt::Goto(_) | Stmt::Empty => false,
        }
    }

    fn expr_contains_call(&self, e: &Expr) -> bool {
        match e {
            Expr::Call { callee, args } => {
                let classified = match callee.as_ref() {
                    Expr::Ident(name) => self.catalog.knows(name),
                    other => self.expr_contains_call(other),
                };
                classified || args.iter().any(|a| self.expr_contains_call(a))
            }
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => {
                self.expr_contains_call(operand)
            }
            Expr::Member { base, .. } => self.expr_contains_call(base),
            Expr::Binary { lhs, rhs, .. } | Expr::Assign { lhs, rhs, .. } => {
                self.expr_contains_call(lhs) || self.expr_contains_call(rhs)
            }
            Expr::Index { base, index } => {
                self.expr_contains_call(base) || self.expr_contains_call(index)
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                self.expr_contains_call(cond)
                    || self.expr_contains_call(then_expr)
                    || self.expr_contains_call(else_expr)
            }
            Expr::Comma(items) => items.iter().any(|e| self.expr_contains_call(e)),
            Expr::Ident(_) | Expr::Constant(_) | Expr::Verbatim(_) => false,
        }
    }

    /// Source-order scan of the function body: the jump is backward iff its
    /// target label appears before the goto statement itself. A goto whose
    /// label never appears classifies as forward; the path is then dropped
    /// at exploration end for never matching.
    fn goto_is_backward(&self, goto_node: &Stmt, label: &str) -> bool {
        matches!(scan_order(self.root, goto_node, label), Some(true))
    }
}

/// Walk `s` in source order; `Some(true)` if the label is seen first,
/// `Some(false)` if the goto node itself is, `None` if neither occurs here.
fn scan_order(s: &Stmt, goto_node: *const Stmt, label: &str) -> Option<bool> {
    if std::ptr::eq(s, goto_node) {
        return Some(false);
    }
    match s {
        Stmt::Label { name, stmt } => {
            if name == label {
                Some(true)
            } else {
                scan_order(stmt, goto_node, label)
            }
        }
        Stmt::Compound(items) => items.iter().find_map(|s| scan_order(s, goto_node, label)),
        Stmt::Case { body, .. } => body.iter().find_map(|s| scan_order(s, goto_node, label)),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => scan_order(then_branch, goto_node, label).or_else(|| {
            else_branch
                .as_deref()
                .and_then(|e| scan_order(e, goto_node, label))
        }),
        Stmt::Switch { body, .. } | Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            scan_order(body, goto_node, label)
        }
        Stmt::For { init, body, .. } => init
            .as_deref()
            .and_then(|s| scan_order(s, goto_node, label))
            .or_else(|| scan_order(body, goto_node, label)),
        _ => None,
    }
}

fn stmt_contains_goto(s: &Stmt) -> bool {
    match s {
        Stmt::Goto(_) => true,
        Stmt::Compound(items) => items.iter().any(stmt_contains_goto),
        Stmt::Case { body, .. } => body.iter().any(stmt_contains_goto),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            stmt_contains_goto(then_branch)
                || else_branch.as_deref().is_some_and(stmt_contains_goto)
        }
        Stmt::Switch { body, .. }
        | Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::Label { stmt: body, .. } => stmt_contains_goto(body),
        Stmt::For { init, body, .. } => {
            init.as_deref().is_some_and(stmt_contains_goto) || stmt_contains_goto(body)
        }
        _ => false,
    }
}

fn stmt_contains_label(s: &Stmt, label: &str) -> bool {
    match s {
        Stmt::Label { name, stmt } => name == label || stmt_contains_label(stmt, label),
        Stmt::Compound(items) => items.iter().any(|s| stmt_contains_label(s, label)),
        Stmt::Case { body, .. } => body.iter().any(|s| stmt_contains_label(s, label)),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            stmt_contains_label(then_branch, label)
                || else_branch
                    .as_deref()
                    .is_some_and(|e| stmt_contains_label(e, label))
        }
        Stmt::Switch { body, .. } | Stmt::While { body, .. } | Stmt::DoWhile { body, .. } => {
            stmt_contains_label(body, label)
        }
        Stmt::For { init, body, .. } => {
            init.as_deref().is_some_and(|s| stmt_contains_label(s, label))
                || stmt_contains_label(body, label)
        }
        _ => false,
    }
}

/// The case list of a switch body: a compound of cases, or a single
/// case/default.
fn collect_cases(body: &Stmt) -> Vec<&[Stmt]> {
    match body {
        Stmt::Compound(items) => items
            .iter()
            .filter_map(|s| match s {
                Stmt::Case { body, .. } => Some(body.as_slice()),
                _ => None,
            })
            .collect(),
        Stmt::Case { body, .. } => vec![body.as_slice()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::explorer::PathState;
    use crate::parse::parse_source;

    /// Run the interpreter over the first function of `src` and return the
    /// terminal picture of every path.
    fn run(src: &str) -> Vec<PathState> {
        let unit = parse_source(src).expect("test source parses");
        let catalog = LockCatalog::openbsd_defaults();
        let interp = PathInterpreter::new(&catalog, &unit.functions[0].body);
        interp
            .run(ExplorationContext::new(catalog.len()))
            .into_paths()
    }

    fn ends(paths: &[PathState]) -> Vec<&PathEnd> {
        paths
            .iter()
            .filter_map(|p| match p {
                PathState::Ended { end, .. } => Some(end),
                PathState::Live(_) => None,
            })
            .collect()
    }

    fn live(paths: &[PathState]) -> Vec<&ExplorationContext> {
        paths
            .iter()
            .filter_map(|p| match p {
                PathState::Live(ctx) => Some(ctx),
                PathState::Ended { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_straight_line_balanced() {
        let paths = run("void f(void) { splraise(IPL_HIGH); spllower(IPL_NONE); }");
        let live = live(&paths);
        assert_eq!(live.len(), 1);
        assert!(live[0].state.balanced());
    }

    #[test]
    fn test_unbalanced_return_raises() {
        let paths = run("void f(void) { splraise(IPL_HIGH); return; }");
        assert_eq!(ends(&paths), vec![&PathEnd::Return]);
    }

    #[test]
    fn test_balanced_return_is_clean() {
        let paths = run("void f(void) { splraise(s); spllower(s); return; }");
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
    }

    #[test]
    fn test_if_splits_into_two_paths() {
        let paths = run("void f(int x) { splraise(s); if (x) { spllower(s); } }");
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let balanced = live.iter().filter(|c| c.state.balanced()).count();
        assert_eq!(balanced, 1);
    }

    #[test]
    fn test_irrelevant_if_is_pruned() {
        let paths = run("void f(int x) { splraise(s); if (x) { x++; } spllower(s); }");
        let live = live(&paths);
        // No catalog call and no goto inside: the construct is skipped.
        assert_eq!(live.len(), 1);
        assert!(live[0].state.balanced());
    }

    #[test]
    fn test_cond_memo_keeps_correlated_branches_together() {
        // Both ifs share the condition text, so the second consults the memo
        // instead of splitting again: two paths, not four.
        let src = "void f(int x) {
            if (x) { splraise(s); }
            if (x) { spllower(s); }
        }";
        let paths = run(src);
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|c| c.state.balanced()));
    }

    #[test]
    fn test_distinct_conditions_split_independently() {
        let src = "void f(int x, int y) {
            if (x) { splraise(s); }
            if (y) { spllower(s); }
        }";
        let paths = run(src);
        assert_eq!(live(&paths).len(), 4);
    }

    #[test]
    fn test_ternary_behaves_like_if() {
        let paths = run("void f(int x) { int s = x ? splraise(h) : 0; }");
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let raised = live.iter().filter(|c| !c.state.balanced()).count();
        assert_eq!(raised, 1);
    }

    #[test]
    fn test_lock_op_in_while_condition_is_forbidden() {
        let paths = run("void f(void) { while (splraise(IPL_HIGH)) { } }");
        assert!(matches!(ends(&paths)[..], [PathEnd::Forbidden { .. }]));
    }

    #[test]
    fn test_lock_op_in_for_header_is_forbidden() {
        let paths = run("void f(int i) { for (i = splraise(h); i; i--) { } }");
        assert!(matches!(ends(&paths)[..], [PathEnd::Forbidden { .. }]));
    }

    #[test]
    fn test_endless_while_absorbs_fall_through() {
        let paths = run("void f(void) { while (1) { splraise(s); } }");
        // Body sibling ends NoError despite the held lock; the skip sibling
        // stays live and balanced.
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
        assert!(live(&paths).iter().all(|c| c.state.balanced()));
    }

    #[test]
    fn test_endless_for_absorbs_fall_through() {
        let paths = run("void f(void) { for (;;) { mtx_enter(&m); } }");
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
    }

    #[test]
    fn test_finite_loop_body_falls_through() {
        let paths = run("void f(int x) { while (x) { splraise(s); } }");
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let unbalanced = live.iter().filter(|c| !c.state.balanced()).count();
        assert_eq!(unbalanced, 1);
    }

    #[test]
    fn test_break_resumes_after_loop() {
        let paths = run("void f(int x) { while (x) { mtx_enter(&m); break; } }");
        // The break hands its path back to just after the loop, mutex still
        // held; the skip sibling stays balanced.
        assert!(ends(&paths).is_empty());
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let unbalanced = live.iter().filter(|c| !c.state.balanced()).count();
        assert_eq!(unbalanced, 1);
    }

    #[test]
    fn test_code_after_broken_loop_is_walked() {
        let src = "void f(int x) {
            while (x) { mtx_enter(&m); break; }
            mtx_enter(&m);
        }";
        let paths = run(src);
        // The break-exit sibling carries mtx=1 into the trailing acquire.
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let mut counters: Vec<i32> = live.iter().map(|c| c.state.counter(2)).collect();
        counters.sort_unstable();
        assert_eq!(counters, vec![1, 2]);
    }

    #[test]
    fn test_break_escapes_endless_loop() {
        let paths = run("void f(void) { while (1) { mtx_enter(&m); break; } }");
        assert!(ends(&paths).is_empty());
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let unbalanced = live.iter().filter(|c| !c.state.balanced()).count();
        assert_eq!(unbalanced, 1);
    }

    #[test]
    fn test_continue_cannot_escape_endless_loop() {
        let paths = run("void f(void) { for (;;) { mtx_enter(&m); continue; } }");
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
        assert!(live(&paths).iter().all(|c| c.state.balanced()));
    }

    #[test]
    fn test_continue_resumes_after_finite_loop() {
        let paths = run("void f(int x) { while (x) { mtx_enter(&m); continue; } }");
        assert!(ends(&paths).is_empty());
        let live = live(&paths);
        assert_eq!(live.len(), 2);
        let unbalanced = live.iter().filter(|c| !c.state.balanced()).count();
        assert_eq!(unbalanced, 1);
    }

    #[test]
    fn test_break_at_function_root_escapes() {
        let paths = run("void f(void) { mtx_enter(&m); break; }");
        assert_eq!(ends(&paths), vec![&PathEnd::Break]);
    }

    #[test]
    fn test_do_while_body_always_runs() {
        let paths = run("void f(int x) { do { splraise(s); } while (x); }");
        let live = live(&paths);
        assert_eq!(live.len(), 1);
        assert!(!live[0].state.balanced());
    }

    #[test]
    fn test_panic_silences_path() {
        let paths = run("void f(void) { mtx_enter(&m); panic(\"gone\"); }");
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
        assert!(live(&paths).is_empty());
    }

    #[test]
    fn test_backward_goto_terminates_clean() {
        let src = "void f(void) {
            again:
            mtx_enter(&m);
            mtx_leave(&m);
            goto again;
        }";
        let paths = run(src);
        assert_eq!(ends(&paths), vec![&PathEnd::NoError]);
        assert!(live(&paths).is_empty());
    }

    #[test]
    fn test_forward_goto_skips_region() {
        let src = "void f(void) {
            mtx_enter(&m);
            goto out;
            mtx_leave(&m);
            out:
            return;
        }";
        let paths = run(src);
        // The release is in the skipped region; the return sees mtx=1.
        assert_eq!(ends(&paths), vec![&PathEnd::Return]);
    }

    #[test]
    fn test_unmatched_forward_goto_leaves_ignore_set() {
        let src = "void f(int x) {
            if (x) { goto out; mtx_enter(&m); }
        }";
        let paths = run(src);
        let live = live(&paths);
        assert!(live.iter().any(|c| c.ignoring()));
    }

    #[test]
    fn test_switch_paths() {
        let src = "void f(int x) {
            mtx_enter(&m);
            switch (x) {
            case 1:
                mtx_leave(&m);
                break;
            case 2:
                break;
            }
        }";
        let paths = run(src);
        // All three siblings resume after the switch: case 1 released, the
        // case 2 and no-match paths still hold the mutex.
        assert!(ends(&paths).is_empty());
        let live = live(&paths);
        assert_eq!(live.len(), 3);
        let holding = live.iter().filter(|c| c.state.counter(2) == 1).count();
        assert_eq!(holding, 2);
    }

    #[test]
    fn test_switch_fall_through() {
        let src = "void f(int x) {
            switch (x) {
            case 1:
                mtx_enter(&m);
            case 2:
                mtx_leave(&m);
                break;
            }
        }";
        let paths = run(src);
        // Entering at case 1 falls through into case 2 and balances; the
        // case 2 entry over-releases and carries mtx=-1 past the switch.
        assert!(ends(&paths).is_empty());
        let live = live(&paths);
        assert_eq!(live.len(), 3);
        let over_released = live.iter().filter(|c| c.state.counter(2) == -1).count();
        assert_eq!(over_released, 1);
    }

    #[test]
    fn test_lock_op_in_switch_condition_is_forbidden() {
        let src = "void f(void) { switch (splraise(h)) { case 1: break; } }";
        let paths = run(src);
        assert!(matches!(ends(&paths)[..], [PathEnd::Forbidden { .. }]));
    }

    #[test]
    fn test_opaque_callee_leaves_state_unchanged() {
        let paths = run("void f(struct ops *o) { o->lock(); (*o->unlock)(); }");
        let live = live(&paths);
        assert_eq!(live.len(), 1);
        assert!(live[0].state.balanced());
    }
}
