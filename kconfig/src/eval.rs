//! Value computation.
//!
//! Every value is computed on first read and cached on the symbol or
//! choice. Assignments clear the caches of everything that depends on the
//! assigned item (see [`crate::assign`]); nothing is recomputed eagerly.
//!
//! Computing a value always computes the visibility of the item first. The
//! invalidation pass relies on this: an item with nothing cached cannot
//! have dependents with cached values derived from it.

use std::cmp::Ordering;

use crate::{
    Kconfig, Result,
    expr::{BinOp, ChoiceId, Expr, ExprRef, SymbolId, split_expr},
    parser,
    symbol::UserValue,
    tristate::{SymbolType, Tristate},
    util::{parse_int, to_hex},
};

const NONE: &[Tristate] = &[];
const ONLY_M: &[Tristate] = &[Tristate::M];
const ONLY_Y: &[Tristate] = &[Tristate::Y];
const N_M: &[Tristate] = &[Tristate::N, Tristate::M];
const N_Y: &[Tristate] = &[Tristate::N, Tristate::Y];
const M_Y: &[Tristate] = &[Tristate::M, Tristate::Y];
const N_M_Y: &[Tristate] = &[Tristate::N, Tristate::M, Tristate::Y];

impl Kconfig {
    /// Evaluates an expression against the current values.
    pub fn eval(&self, expr: &Expr) -> Tristate {
        self.eval_assuming(expr, None)
    }

    /// Like [`eval`](Self::eval), with references to `assume` treated as
    /// `y`. Used to find out which members a choice could select.
    pub(crate) fn eval_assuming(&self, expr: &Expr, assume: Option<ChoiceId>) -> Tristate {
        match expr {
            Expr::Sym(s) => self.tri_value(*s),
            Expr::Choice(c) if assume == Some(*c) => Tristate::Y,
            Expr::Choice(c) => self.choice_tri_value(*c),
            Expr::And(a, b) => {
                let v = self.eval_assuming(a, assume);
                if v == Tristate::N {
                    v
                } else {
                    v.min(self.eval_assuming(b, assume))
                }
            }
            Expr::Or(a, b) => {
                let v = self.eval_assuming(a, assume);
                if v == Tristate::Y {
                    v
                } else {
                    v.max(self.eval_assuming(b, assume))
                }
            }
            Expr::Not(a) => self.eval_assuming(a, assume).not(),
            Expr::Rel(op, a, b) => Tristate::from(op.holds(self.compare(*a, *b))),
        }
    }

    /// Compares two symbols for a relation. Two strings compare as strings,
    /// everything else numerically when both sides parse, and as strings
    /// otherwise.
    fn compare(&self, a: SymbolId, b: SymbolId) -> Ordering {
        let (ta, tb) = (self.syms[a.0].orig_type, self.syms[b.0].orig_type);
        if ta == SymbolType::String && tb == SymbolType::String {
            return self.str_value(a).cmp(&self.str_value(b));
        }
        match (self.sym_to_num(a), self.sym_to_num(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => self.str_value(a).cmp(&self.str_value(b)),
        }
    }

    /// `n`/`m`/`y` count as 0/1/2 for bool and tristate symbols.
    fn sym_to_num(&self, sym: SymbolId) -> Option<i64> {
        let ty = self.syms[sym.0].orig_type;
        if ty.is_bool_or_tristate() {
            return Some(i64::from(self.tri_value(sym).as_u8()));
        }
        parse_int(&self.str_value(sym), ty.base())
    }

    /// Parses and evaluates an expression, e.g. `"FOO && (BAR || !BAZ)"`.
    ///
    /// Unknown symbols evaluate like undefined ones and produce a warning.
    pub fn eval_string(&mut self, s: &str) -> Result<Tristate> {
        let expr = parser::parse_expr_str(self, s)?;
        Ok(self.eval(&expr))
    }

    /// The effective type: `tristate` reads as `bool` when modules are
    /// disabled or inside a choice in `y` mode.
    pub fn sym_type(&self, sym: SymbolId) -> SymbolType {
        let s = &self.syms[sym.0];
        if s.orig_type == SymbolType::Tristate && sym != self.modules {
            let in_y_choice = s
                .choice
                .is_some_and(|c| self.choice_tri_value(c) == Tristate::Y);
            if in_y_choice || self.tri_value(self.modules) == Tristate::N {
                return SymbolType::Bool;
            }
        }
        s.orig_type
    }

    pub fn choice_type(&self, choice: ChoiceId) -> SymbolType {
        let c = &self.choices[choice.0];
        if c.orig_type == SymbolType::Tristate && self.tri_value(self.modules) == Tristate::N {
            return SymbolType::Bool;
        }
        c.orig_type
    }

    /// Upper bound on the value the user can give the symbol. `n` for
    /// symbols without a prompt or with unsatisfied prompt conditions.
    pub fn visibility(&self, sym: SymbolId) -> Tristate {
        let s = &self.syms[sym.0];
        if let Some(vis) = s.cache.vis.get() {
            return vis;
        }
        let vis = self.compute_sym_visibility(sym);
        s.cache.vis.set(Some(vis));
        vis
    }

    fn prompt_visibility(&self, nodes: &[crate::menu::NodeId], assume: Option<ChoiceId>) -> Tristate {
        nodes
            .iter()
            .filter_map(|n| self.nodes[n.0].prompt.as_ref())
            .map(|(_, cond)| self.eval_assuming(cond, assume))
            .max()
            .unwrap_or(Tristate::N)
    }

    fn compute_sym_visibility(&self, sym: SymbolId) -> Tristate {
        let s = &self.syms[sym.0];
        let vis = self.prompt_visibility(&s.nodes, None);

        if let Some(choice) = s.choice {
            let c = &self.choices[choice.0];
            let mode = self.choice_tri_value(choice);
            // Non-tristate members are only visible in y mode
            if c.orig_type == SymbolType::Tristate
                && s.orig_type != SymbolType::Tristate
                && mode != Tristate::Y
            {
                return Tristate::N;
            }
            // Members with m visibility are hidden in y mode
            if s.orig_type == SymbolType::Tristate && vis == Tristate::M && mode == Tristate::Y {
                return Tristate::N;
            }
        }

        if vis == Tristate::M && self.sym_type(sym) != SymbolType::Tristate {
            return Tristate::Y;
        }
        vis
    }

    pub fn choice_visibility(&self, choice: ChoiceId) -> Tristate {
        let c = &self.choices[choice.0];
        if let Some(vis) = c.cache.vis.get() {
            return vis;
        }
        let mut vis = self.prompt_visibility(&c.nodes, None);
        if vis == Tristate::M && self.choice_type(choice) != SymbolType::Tristate {
            vis = Tristate::Y;
        }
        c.cache.vis.set(Some(vis));
        vis
    }

    /// The symbol's value in tristate terms. Always `n` for string, int and
    /// hex symbols.
    pub fn tri_value(&self, sym: SymbolId) -> Tristate {
        let s = &self.syms[sym.0];
        if let Some(tri) = s.cache.tri.get() {
            return tri;
        }
        let tri = self.compute_tri_value(sym);
        s.cache.tri.set(Some(tri));
        tri
    }

    fn compute_tri_value(&self, sym: SymbolId) -> Tristate {
        let s = &self.syms[sym.0];

        if s.is_constant {
            return Tristate::from_str_exact(&s.name)
                .filter(|_| s.orig_type == SymbolType::Tristate)
                .unwrap_or(Tristate::N);
        }

        if !s.orig_type.is_bool_or_tristate() {
            if s.orig_type != SymbolType::Unknown {
                self.warn_msg(format!(
                    "The {} symbol {} is being evaluated in a logical context somewhere. It \
                     will always evaluate to n.",
                    s.orig_type,
                    self.name_and_loc(crate::expr::Item::Sym(sym))
                ));
            }
            return Tristate::N;
        }

        let vis = self.visibility(sym);
        let mut write = vis != Tristate::N;
        let user = s.user_value.as_ref().and_then(UserValue::as_tri);

        let val = match s.choice {
            None => {
                let mut val = Tristate::N;
                match user {
                    Some(u) if vis != Tristate::N => val = u.min(vis),
                    _ => {
                        if let Some((default, cond)) = s
                            .defaults
                            .iter()
                            .map(|(d, c)| (d, self.eval(c)))
                            .find(|(_, c)| *c != Tristate::N)
                        {
                            val = self.eval(default).min(cond);
                            if val != Tristate::N {
                                write = true;
                            }
                        }

                        // Implies only count when the direct dependencies
                        // are met
                        let weak = self.eval(&s.weak_rev_dep);
                        if weak != Tristate::N && self.eval(&s.direct_dep) != Tristate::N {
                            val = val.max(weak);
                            write = true;
                        }
                    }
                }

                // Selects take precedence
                let rev = self.eval(&s.rev_dep);
                if rev != Tristate::N {
                    if self.eval(&s.direct_dep) < rev {
                        self.warn_select_unsatisfied_deps(sym);
                    }
                    val = val.max(rev);
                    write = true;
                }

                if val == Tristate::M
                    && (self.sym_type(sym) == SymbolType::Bool
                        || self.eval(&s.weak_rev_dep) == Tristate::Y)
                {
                    val = Tristate::Y;
                }
                val
            }
            // The choice mode bounds the visibility of its members, so
            // looking at the member's own visibility is enough
            Some(choice) if vis == Tristate::Y => {
                if self.choice_selection(choice) == Some(sym) {
                    Tristate::Y
                } else {
                    Tristate::N
                }
            }
            Some(_) if vis != Tristate::N && user.is_some_and(Tristate::is_set) => Tristate::M,
            Some(_) => Tristate::N,
        };

        s.cache.write_to_conf.set(write);
        val
    }

    fn warn_select_unsatisfied_deps(&self, sym: SymbolId) {
        let s = &self.syms[sym.0];
        let dep_val = self.eval(&s.direct_dep);
        let mut msg = format!(
            "{} has direct dependencies {} with value {}, but is currently being {}-selected by \
             the following symbols:",
            self.name_and_loc(crate::expr::Item::Sym(sym)),
            self.expr_str(&s.direct_dep),
            dep_val,
            self.eval(&s.rev_dep)
        );

        for select in split_expr(&s.rev_dep, BinOp::Or) {
            if self.eval(&select) <= dep_val {
                continue;
            }
            // 'select A if B' is stored as 'A && B'
            let first = split_expr(&select, BinOp::And).remove(0);
            let Some(selector) = first.as_sym() else {
                continue;
            };
            let sel = &self.syms[selector.0];
            msg.push_str(&format!(
                "\n - {}, with value {}, direct dependencies {} (value: {})",
                self.name_and_loc(crate::expr::Item::Sym(selector)),
                self.str_value(selector),
                self.expr_str(&sel.direct_dep),
                self.eval(&sel.direct_dep)
            ));
            if let Expr::And(_, cond) = &*select {
                msg.push_str(&format!(
                    ", and select condition {} (value: {})",
                    self.expr_str(cond),
                    self.eval(cond)
                ));
            }
        }
        self.warn_msg(msg);
    }

    /// The value as a string: `n`/`m`/`y` for bool and tristate symbols,
    /// the name for undefined ones.
    pub fn str_value(&self, sym: SymbolId) -> String {
        let s = &self.syms[sym.0];
        if let Some(val) = &*s.cache.str_val.borrow() {
            return val.clone();
        }
        let val = self.compute_str_value(sym);
        s.cache.str_val.replace(Some(val.clone()));
        val
    }

    fn compute_str_value(&self, sym: SymbolId) -> String {
        let s = &self.syms[sym.0];

        if s.orig_type.is_bool_or_tristate() {
            return self.tri_value(sym).as_str().to_string();
        }
        // Undefined symbols evaluate to their own name, so 'FOO = bar'
        // compares FOO against "bar"
        if s.orig_type == SymbolType::Unknown || s.is_constant {
            return s.name.clone();
        }

        let vis = self.visibility(sym);
        let mut write = vis != Tristate::N;
        let mut val = String::new();

        if s.orig_type.is_int_or_hex() {
            let base = s.orig_type.base();
            let fmt_num = |v: i64| {
                if base == 10 { v.to_string() } else { to_hex(v) }
            };

            let range = s
                .ranges
                .iter()
                .find(|(_, _, cond)| self.eval(cond) != Tristate::N)
                .map(|(low, high, _)| {
                    // Unparsable bounds count as 0
                    let bound = |b: SymbolId| parse_int(&self.str_value(b), base).unwrap_or(0);
                    (bound(*low), bound(*high))
                });

            let mut use_defaults = true;
            if let (Some(UserValue::Str(user)), true) = (&s.user_value, vis != Tristate::N) {
                let num = parse_int(user, base).unwrap_or(0);
                match range {
                    Some((low, high)) if num < low || num > high => {
                        self.warn_msg(format!(
                            "user value {} on the {} symbol {} ignored due to being outside the \
                             active range ([{}, {}]) -- falling back on defaults",
                            fmt_num(num),
                            s.orig_type,
                            self.name_and_loc(crate::expr::Item::Sym(sym)),
                            fmt_num(low),
                            fmt_num(high)
                        ));
                    }
                    // Kept exactly as written, with or without 0x
                    _ => {
                        val = user.clone();
                        use_defaults = false;
                    }
                }
            }

            if use_defaults {
                let mut has_default = false;
                let mut val_num = 0;
                if let Some((default, _)) = s
                    .defaults
                    .iter()
                    .find(|(_, cond)| self.eval(cond) != Tristate::N)
                {
                    has_default = true;
                    write = true;
                    val = self.expr_str_value(default);
                    val_num = parse_int(&val, base).unwrap_or(0);
                }

                // Clamping happens even without a default
                if let Some((low, high)) = range {
                    let clamp = if val_num < low {
                        Some(low)
                    } else if val_num > high {
                        Some(high)
                    } else {
                        None
                    };
                    if let Some(clamp) = clamp {
                        val = fmt_num(clamp);
                        if has_default {
                            self.warn_msg(format!(
                                "default value {} on {} clamped to {} due to being outside the \
                                 active range ([{}, {}])",
                                val_num,
                                self.name_and_loc(crate::expr::Item::Sym(sym)),
                                fmt_num(clamp),
                                fmt_num(low),
                                fmt_num(high)
                            ));
                        }
                    }
                }
            }
        } else {
            match (&s.user_value, vis != Tristate::N) {
                (Some(user), true) => val = user.as_str().to_string(),
                _ => {
                    if let Some((default, _)) = s
                        .defaults
                        .iter()
                        .find(|(_, cond)| self.eval(cond) != Tristate::N)
                    {
                        val = self.expr_str_value(default);
                        write = true;
                    }
                }
            }
        }

        if s.env_var.is_some() || self.defconfig_list == Some(sym) {
            write = false;
        }
        s.cache.write_to_conf.set(write);
        val
    }

    /// String value of a default for a string, int or hex symbol. Defaults
    /// are single symbols; anything else was rejected while loading.
    fn expr_str_value(&self, expr: &ExprRef) -> String {
        match expr.as_sym() {
            Some(sym) => self.str_value(sym),
            None => String::new(),
        }
    }

    /// Whether the symbol would be written to a `.config` file. Determined
    /// as a side effect of computing the value.
    pub(crate) fn write_to_conf(&self, sym: SymbolId) -> bool {
        self.str_value(sym);
        self.syms[sym.0].cache.write_to_conf.get()
    }

    /// Values the user can currently assign to a bool or tristate symbol.
    ///
    /// A single entry means the symbol is pinned: assignments are accepted
    /// but have no effect on the value.
    pub fn assignable(&self, sym: SymbolId) -> &'static [Tristate] {
        let s = &self.syms[sym.0];
        if let Some(a) = s.cache.assignable.get() {
            return a;
        }
        let a = self.compute_sym_assignable(sym);
        s.cache.assignable.set(Some(a));
        a
    }

    fn compute_sym_assignable(&self, sym: SymbolId) -> &'static [Tristate] {
        let s = &self.syms[sym.0];
        if !s.orig_type.is_bool_or_tristate() {
            return NONE;
        }
        let vis = self.visibility(sym);
        if vis == Tristate::N {
            return NONE;
        }

        let rev = self.eval(&s.rev_dep);
        let bool_like =
            self.sym_type(sym) == SymbolType::Bool || self.eval(&s.weak_rev_dep) == Tristate::Y;

        if vis == Tristate::Y {
            if s.choice.is_some() {
                return ONLY_Y;
            }
            return match rev {
                Tristate::N if bool_like => N_Y,
                Tristate::N => N_M_Y,
                Tristate::Y => ONLY_Y,
                Tristate::M if bool_like => ONLY_Y,
                Tristate::M => M_Y,
            };
        }

        // m visibility, so a tristate
        match rev {
            Tristate::N if self.eval(&s.weak_rev_dep) == Tristate::Y => N_Y,
            Tristate::N => N_M,
            Tristate::Y => ONLY_Y,
            Tristate::M => ONLY_M,
        }
    }

    /// True if the symbol has exactly one assignable value.
    pub fn is_pinned(&self, sym: SymbolId) -> bool {
        self.assignable(sym).len() == 1
    }

    /// The choice mode: `y` when one member is selected, `m` when tristate
    /// members may be `m` independently, `n` when all members are `n`.
    pub fn choice_tri_value(&self, choice: ChoiceId) -> Tristate {
        let c = &self.choices[choice.0];
        if let Some(tri) = c.cache.tri.get() {
            return tri;
        }
        let mut val = if c.is_optional { Tristate::N } else { Tristate::M };
        if let Some(user) = c.user_value {
            val = val.max(user);
        }
        val = val.min(self.choice_visibility(choice));
        if val == Tristate::M && self.choice_type(choice) == SymbolType::Bool {
            val = Tristate::Y;
        }
        c.cache.tri.set(Some(val));
        val
    }

    pub fn choice_assignable(&self, choice: ChoiceId) -> &'static [Tristate] {
        let c = &self.choices[choice.0];
        if let Some(a) = c.cache.assignable.get() {
            return a;
        }
        let bool_type = self.choice_type(choice) == SymbolType::Bool;
        let a = match (self.choice_visibility(choice), c.is_optional) {
            (Tristate::N, _) => NONE,
            (Tristate::Y, false) if bool_type => ONLY_Y,
            (Tristate::Y, false) => M_Y,
            (Tristate::Y, true) if bool_type => N_Y,
            (Tristate::Y, true) => N_M_Y,
            (Tristate::M, false) => ONLY_M,
            (Tristate::M, true) => N_M,
        };
        c.cache.assignable.set(Some(a));
        a
    }

    /// Whether `sym` would be visible in its choice if the choice were in
    /// `y` mode. Selections are picked among these members.
    pub(crate) fn is_choice_candidate(&self, sym: SymbolId) -> bool {
        let s = &self.syms[sym.0];
        let Some(choice) = s.choice else {
            return false;
        };
        if let Some(vis) = s.cache.candidate_vis.get() {
            return vis == Tristate::Y;
        }
        // Members with m visibility are hidden in y mode; m is promoted
        // otherwise
        let vis = match self.prompt_visibility(&s.nodes, Some(choice)) {
            Tristate::M if s.orig_type == SymbolType::Tristate => Tristate::N,
            Tristate::M => Tristate::Y,
            vis => vis,
        };
        s.cache.candidate_vis.set(Some(vis));
        vis == Tristate::Y
    }

    /// The member that is `y` when the choice is in `y` mode.
    ///
    /// Computed whatever the current mode is, so front ends can show the
    /// member a disabled or `m` mode choice would select. In order: the
    /// user selection, the first default whose condition holds, the first
    /// member. Members that could not be visible in `y` mode are skipped.
    pub fn choice_selection(&self, choice: ChoiceId) -> Option<SymbolId> {
        let c = &self.choices[choice.0];
        if let Some(sel) = c.cache.selection.get() {
            return sel;
        }
        // Visibility first, see the module docs
        self.choice_visibility(choice);
        let sel = c
            .user_selection
            .filter(|s| self.is_choice_candidate(*s))
            .or_else(|| self.selection_from_defaults(choice));
        c.cache.selection.set(Some(sel));
        sel
    }

    /// The selection ignoring the user selection.
    pub(crate) fn selection_from_defaults(&self, choice: ChoiceId) -> Option<SymbolId> {
        let c = &self.choices[choice.0];
        c.defaults
            .iter()
            .filter(|(_, cond)| self.eval(cond) != Tristate::N)
            .filter_map(|(default, _)| default.as_sym())
            .find(|s| self.syms[s.0].choice == Some(choice) && self.is_choice_candidate(*s))
            .or_else(|| c.syms.iter().copied().find(|s| self.is_choice_candidate(*s)))
    }

    /// `select` terms currently forcing a value onto `sym`, each
    /// `SELECTOR` or `SELECTOR && cond`.
    pub fn active_selects(&self, sym: SymbolId) -> Vec<ExprRef> {
        self.active_terms(&self.syms[sym.0].rev_dep)
    }

    /// Like [`active_selects`](Self::active_selects), for `imply`.
    pub fn active_implies(&self, sym: SymbolId) -> Vec<ExprRef> {
        self.active_terms(&self.syms[sym.0].weak_rev_dep)
    }

    fn active_terms(&self, expr: &ExprRef) -> Vec<ExprRef> {
        if expr.is_n() {
            return Vec::new();
        }
        split_expr(expr, BinOp::Or)
            .into_iter()
            .filter(|term| self.eval(term) != Tristate::N)
            .collect()
    }

    /// The first `default` whose condition holds, as `(value, condition)`.
    pub fn active_default(&self, sym: SymbolId) -> Option<(ExprRef, ExprRef)> {
        self.syms[sym.0]
            .defaults
            .iter()
            .find(|(_, cond)| self.eval(cond) != Tristate::N)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Kconfig, Tristate};

    fn load(text: &str) -> Kconfig {
        Kconfig::from_text(text, "Kconfig").unwrap()
    }

    fn tri(kconf: &Kconfig, name: &str) -> Tristate {
        kconf.tri_value(kconf.lookup(name).unwrap())
    }

    #[test]
    fn test_m_needs_modules() {
        let text = "config MODULES\n\tbool \"modules\"\n\toption modules\n\
                    config T\n\ttristate \"t\"\n\tdefault m\n";
        let mut kconf = load(text);
        assert_eq!(tri(&kconf, "T"), Tristate::Y);

        let modules = kconf.lookup("MODULES").unwrap();
        assert!(kconf.set_value(modules, "y"));
        assert_eq!(tri(&kconf, "T"), Tristate::M);
    }

    #[test]
    fn test_undefined_symbol_compares_to_own_name() {
        let mut kconf = load("config A\n\tbool \"a\"\n");
        assert_eq!(kconf.eval_string("UNDEF_THING = \"UNDEF_THING\"").unwrap(), Tristate::Y);
        assert_eq!(kconf.eval_string("UNDEF_THING != \"x\"").unwrap(), Tristate::Y);
    }

    #[test]
    fn test_numeric_relations() {
        let text = "config I\n\tint \"i\"\n\tdefault 10\nconfig H\n\thex \"h\"\n\tdefault 0x10\n";
        let mut kconf = load(text);
        assert_eq!(kconf.eval_string("I > 9").unwrap(), Tristate::Y);
        assert_eq!(kconf.eval_string("I < 9").unwrap(), Tristate::N);
        assert_eq!(kconf.eval_string("H = 16").unwrap(), Tristate::Y);
        assert_eq!(kconf.eval_string("H = 0x11").unwrap(), Tristate::N);
        assert_eq!(kconf.eval_string("H >= 0x0f").unwrap(), Tristate::Y);
    }

    #[test]
    fn test_int_range_clamps_default() {
        let text = "config I\n\tint \"i\"\n\trange 5 10\n\tdefault 20\n";
        let kconf = load(text);
        let i = kconf.lookup("I").unwrap();
        assert_eq!(kconf.str_value(i), "10");
        assert!(kconf.warnings().iter().any(|w| w.contains("clamped to 10")));
    }

    #[test]
    fn test_imply_sets_floor_only_with_deps() {
        let text = "config A\n\tbool \"a\"\n\tdefault y\n\timply B\n\
                    config B\n\tbool \"b\"\n\tdepends on C\n\
                    config C\n\tbool \"c\"\n";
        let mut kconf = load(text);
        assert_eq!(tri(&kconf, "B"), Tristate::N);

        let c = kconf.lookup("C").unwrap();
        kconf.set_value(c, "y");
        assert_eq!(tri(&kconf, "B"), Tristate::Y);

        // The user can still turn it off
        let b = kconf.lookup("B").unwrap();
        assert_eq!(kconf.assignable(b), &[Tristate::N, Tristate::Y]);
        kconf.set_value(b, "n");
        assert_eq!(tri(&kconf, "B"), Tristate::N);
    }

    #[test]
    fn test_select_pins_value() {
        let text = "config A\n\tbool \"a\"\n\tdefault y\n\tselect B\nconfig B\n\tbool \"b\"\n";
        let kconf = load(text);
        let b = kconf.lookup("B").unwrap();
        assert_eq!(kconf.tri_value(b), Tristate::Y);
        assert!(kconf.is_pinned(b));
        assert_eq!(kconf.active_selects(b).len(), 1);
    }

    #[test]
    fn test_recompute_does_not_repeat_warning() {
        let text = "config A\n\tbool \"a\"\n\tdefault y\n\tselect B\n\
                    config B\n\tbool \"b\"\n\tdepends on C\n\
                    config C\n\tbool \"c\"\n";
        let mut kconf = load(text);
        let a = kconf.lookup("A").unwrap();
        for val in ["y", "n", "y"] {
            kconf.set_value(a, val);
            tri(&kconf, "B");
        }
        let count = kconf
            .warnings()
            .iter()
            .filter(|w| w.contains("is currently being y-selected"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_name_reuses_symbol() {
        let mut kconf = load("config A\n\tbool \"a\"\n");
        kconf.eval_string("NOPE || A").unwrap();
        let count = kconf.syms.len();
        for _ in 0..10 {
            assert_eq!(kconf.eval_string("NOPE").unwrap(), Tristate::N);
        }
        assert_eq!(kconf.syms.len(), count);
        assert_eq!(kconf.lookup("NOPE"), None);
        assert!(kconf.warnings().iter().any(|w| w.contains("no symbol NOPE")));
    }
}
