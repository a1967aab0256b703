//! Dependency expressions.
//!
//! Expressions are immutable trees shared through [`Rc`]. The same subtree is
//! frequently reachable from several owners (a prompt condition and a default
//! condition can both end in the node's `depends on`), and some operations
//! rely on that identity, so [`make_and`] and [`make_or`] hand back their
//! operands unchanged instead of rebuilding them.

use std::{fmt, rc::Rc};

/// Handle of a symbol in the [`Kconfig`](crate::Kconfig) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    /// The constant symbol `n`.
    pub const N: SymbolId = SymbolId(0);
    /// The constant symbol `m`.
    pub const M: SymbolId = SymbolId(1);
    /// The constant symbol `y`.
    pub const Y: SymbolId = SymbolId(2);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a choice in the [`Kconfig`](crate::Kconfig) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceId(pub(crate) usize);

impl ChoiceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Either a symbol or a choice. These are the things that have values and
/// take part in dependency tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    Sym(SymbolId),
    Choice(ChoiceId),
}

/// Relational operators. Operands are always symbols; quoted literals are
/// constant symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Equal,
    Unequal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl RelOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Equal => "=",
            RelOp::Unequal => "!=",
            RelOp::Less => "<",
            RelOp::LessEqual => "<=",
            RelOp::Greater => ">",
            RelOp::GreaterEqual => ">=",
        }
    }

    /// Applies the operator to the sign of a comparison.
    pub(crate) fn holds(self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            RelOp::Equal => ord == Equal,
            RelOp::Unequal => ord != Equal,
            RelOp::Less => ord == Less,
            RelOp::LessEqual => ord != Greater,
            RelOp::Greater => ord == Greater,
            RelOp::GreaterEqual => ord != Less,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared expression handle.
pub type ExprRef = Rc<Expr>;

/// A dependency expression.
#[derive(Debug, PartialEq, Eq)]
pub enum Expr {
    /// Reference to a symbol, constant or not.
    Sym(SymbolId),
    /// Reference to a choice. Evaluates to the choice mode. Appears in the
    /// dependencies of choice members.
    Choice(ChoiceId),
    And(ExprRef, ExprRef),
    Or(ExprRef, ExprRef),
    Not(ExprRef),
    Rel(RelOp, SymbolId, SymbolId),
}

/// Binary operators accepted by [`split_expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
}

impl Expr {
    pub fn sym(id: SymbolId) -> ExprRef {
        Rc::new(Expr::Sym(id))
    }

    pub fn and(a: ExprRef, b: ExprRef) -> ExprRef {
        Rc::new(Expr::And(a, b))
    }

    pub fn or(a: ExprRef, b: ExprRef) -> ExprRef {
        Rc::new(Expr::Or(a, b))
    }

    pub fn not(a: ExprRef) -> ExprRef {
        Rc::new(Expr::Not(a))
    }

    pub fn is_y(&self) -> bool {
        matches!(self, Expr::Sym(s) if *s == SymbolId::Y)
    }

    pub fn is_n(&self) -> bool {
        matches!(self, Expr::Sym(s) if *s == SymbolId::N)
    }

    /// The symbol this expression consists of, if it is a plain reference.
    pub fn as_sym(&self) -> Option<SymbolId> {
        match self {
            Expr::Sym(s) => Some(*s),
            _ => None,
        }
    }

    /// True for operator nodes, false for symbol and choice references.
    pub fn is_compound(&self) -> bool {
        !matches!(self, Expr::Sym(_) | Expr::Choice(_))
    }
}

/// `e1 && e2`, simplified when either side is the constant `y` or `n`.
///
/// When no simplification applies a new node is built; otherwise one of the
/// inputs is returned as-is, keeping its identity.
pub fn make_and(e1: &ExprRef, e2: &ExprRef) -> ExprRef {
    if e1.is_y() {
        return e2.clone();
    }
    if e2.is_y() {
        return e1.clone();
    }
    if e1.is_n() {
        return e1.clone();
    }
    if e2.is_n() {
        return e2.clone();
    }
    Expr::and(e1.clone(), e2.clone())
}

/// `e1 || e2`, simplified when either side is the constant `y` or `n`.
pub fn make_or(e1: &ExprRef, e2: &ExprRef) -> ExprRef {
    if e1.is_n() {
        return e2.clone();
    }
    if e2.is_n() {
        return e1.clone();
    }
    if e1.is_y() {
        return e1.clone();
    }
    if e2.is_y() {
        return e2.clone();
    }
    Expr::or(e1.clone(), e2.clone())
}

/// Returns the top-level operands of `expr` joined by `op`, left to right.
///
/// `A && B || C && (D || E)` split on `Or` gives `[A && B, C && (D || E)]`.
/// An expression without a top-level `op` comes back as a single operand.
pub fn split_expr(expr: &ExprRef, op: BinOp) -> Vec<ExprRef> {
    fn rec(expr: &ExprRef, op: BinOp, out: &mut Vec<ExprRef>) {
        match (&**expr, op) {
            (Expr::And(a, b), BinOp::And) | (Expr::Or(a, b), BinOp::Or) => {
                rec(a, op, out);
                rec(b, op, out);
            }
            _ => out.push(expr.clone()),
        }
    }

    let mut out = Vec::new();
    rec(expr, op, &mut out);
    out
}

/// Joins operands back together with `op`. Inverse of [`split_expr`] up to
/// value equivalence.
pub fn join_expr(operands: &[ExprRef], op: BinOp) -> Option<ExprRef> {
    let mut iter = operands.iter().rev();
    let mut acc = iter.next()?.clone();
    for e in iter {
        acc = match op {
            BinOp::And => Expr::and(e.clone(), acc),
            BinOp::Or => Expr::or(e.clone(), acc),
        };
    }
    Some(acc)
}

/// All symbols and choices referenced in `expr`, in first-seen order and
/// including constants.
pub fn expr_items(expr: &Expr) -> Vec<Item> {
    fn push(out: &mut Vec<Item>, item: Item) {
        if !out.contains(&item) {
            out.push(item);
        }
    }

    fn rec(expr: &Expr, out: &mut Vec<Item>) {
        match expr {
            Expr::Sym(s) => push(out, Item::Sym(*s)),
            Expr::Choice(c) => push(out, Item::Choice(*c)),
            Expr::Rel(_, a, b) => {
                push(out, Item::Sym(*a));
                push(out, Item::Sym(*b));
            }
            Expr::Not(a) => rec(a, out),
            Expr::And(a, b) | Expr::Or(a, b) => {
                rec(a, out);
                rec(b, out);
            }
        }
    }

    let mut out = Vec::new();
    rec(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(i: usize) -> ExprRef {
        Expr::sym(SymbolId(i))
    }

    #[test]
    fn test_make_and_keeps_identity() {
        let y = Expr::sym(SymbolId::Y);
        let n = Expr::sym(SymbolId::N);
        let a = s(10);

        assert!(Rc::ptr_eq(&make_and(&y, &a), &a));
        assert!(Rc::ptr_eq(&make_and(&a, &y), &a));
        assert!(make_and(&a, &n).is_n());
        assert!(make_or(&a, &y).is_y());
        assert!(Rc::ptr_eq(&make_or(&n, &a), &a));

        let b = s(11);
        match &*make_and(&a, &b) {
            Expr::And(l, r) => {
                assert!(Rc::ptr_eq(l, &a));
                assert!(Rc::ptr_eq(r, &b));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_split_expr_order() {
        // (A && B) || (C || (D && E))
        let ab = Expr::and(s(10), s(11));
        let de = Expr::and(s(13), s(14));
        let e = Expr::or(ab.clone(), Expr::or(s(12), de.clone()));

        let parts = split_expr(&e, BinOp::Or);
        assert_eq!(parts.len(), 3);
        assert!(Rc::ptr_eq(&parts[0], &ab));
        assert_eq!(*parts[1], Expr::Sym(SymbolId(12)));
        assert!(Rc::ptr_eq(&parts[2], &de));

        let ands = split_expr(&e, BinOp::And);
        assert_eq!(ands.len(), 1);

        let joined = join_expr(&parts, BinOp::Or).unwrap();
        assert_eq!(split_expr(&joined, BinOp::Or), parts);
    }

    #[test]
    fn test_expr_items_dedup() {
        let e = Expr::or(
            Expr::and(s(10), Expr::not(s(11))),
            Rc::new(Expr::Rel(RelOp::Equal, SymbolId(10), SymbolId::Y)),
        );
        assert_eq!(
            expr_items(&e),
            vec![
                Item::Sym(SymbolId(10)),
                Item::Sym(SymbolId(11)),
                Item::Sym(SymbolId::Y)
            ]
        );
    }
}
