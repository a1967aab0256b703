//! Post-parse processing of the menu tree.
//!
//! Parsing leaves every property on the node that declared it. This pass
//! pushes inherited dependencies down the tree, copies node properties onto
//! their symbols and choices, builds implicit menus, drops `if` nodes and
//! finally indexes the dependents used for cache invalidation.

use std::{env, rc::Rc};

use crate::{
    Kconfig, Result,
    deploop,
    error::{Error, Location},
    expr::{
        BinOp, ChoiceId, Expr, ExprRef, Item, RelOp, SymbolId, expr_items, make_and, make_or,
        split_expr,
    },
    menu::{MenuItem, NodeId},
    tristate::SymbolType,
    util::{is_base_n, ordered_unique, parse_int},
};

pub(crate) fn finalize(kconf: &mut Kconfig) -> Result<()> {
    kconf.parsing = false;

    let top = kconf.top_node;
    let y = kconf.y.clone();
    finalize_node(kconf, top, &y);

    kconf.unique_defined_syms = ordered_unique(&kconf.defined_syms);
    kconf.unique_choices = ordered_unique(&kconf.choice_defs);

    check_sym_sanity(kconf)?;
    check_choice_sanity(kconf)?;
    let strict = |var: &str| env::var(var).is_ok_and(|v| v == "y");
    if strict("KCONFIG_WARN_UNDEF") || strict("KCONFIG_STRICT") {
        kconf.check_undefined_syms();
    }

    build_dep(kconf);
    deploop::check_dep_loops(kconf)?;
    add_choice_deps(kconf);

    debug!(
        "finalized {} symbols, {} choices, {} menu nodes",
        kconf.unique_defined_syms.len(),
        kconf.unique_choices.len(),
        kconf.nodes.len()
    );
    Ok(())
}

fn finalize_node(kconf: &mut Kconfig, node: NodeId, visible_if: &ExprRef) {
    let item = kconf.nodes[node.0].item;

    if let MenuItem::Symbol(sym) = item {
        add_props_to_sym(kconf, node, sym);

        // Following nodes that depend on the symbol go in an implicit menu
        // rooted at it
        let mut cur = node;
        while let Some(next) = kconf.nodes[cur.0].next {
            if !auto_menu_dep(kconf, sym, next) {
                break;
            }
            finalize_node(kconf, next, visible_if);
            cur = next;
            kconf.nodes[cur.0].parent = Some(node);
        }
        if cur != node {
            let after = kconf.nodes[cur.0].next.take();
            let first = kconf.nodes[node.0].next;
            kconf.nodes[node.0].list = first;
            kconf.nodes[node.0].next = after;
        }
    } else if kconf.nodes[node.0].list.is_some() {
        let visible_if = if item == MenuItem::Menu {
            make_and(visible_if, &kconf.nodes[node.0].visibility)
        } else {
            visible_if.clone()
        };

        // Before finalizing children, so implicit menu creation sees the
        // propagated dependencies
        propagate_deps(kconf, node, &visible_if);

        let mut cur = kconf.nodes[node.0].list;
        while let Some(child) = cur {
            finalize_node(kconf, child, &visible_if);
            cur = kconf.nodes[child.0].next;
        }
    }

    if let Some(list) = kconf.nodes[node.0].list {
        flatten(kconf, list);
        remove_ifs(kconf, node);
    }

    // Empty choices are possible, so this is outside the list check
    if let MenuItem::Choice(choice) = item {
        let dep = kconf.nodes[node.0].dep.clone();
        let defaults = kconf.nodes[node.0].defaults.clone();
        let c = &mut kconf.choices[choice.0];
        c.direct_dep = make_or(&c.direct_dep, &dep);
        c.defaults.extend(defaults);
        finalize_choice(kconf, node, choice);
    }
}

/// ANDs the dependencies of `node` into each child and into the child's
/// properties.
fn propagate_deps(kconf: &mut Kconfig, node: NodeId, visible_if: &ExprRef) {
    // Choice members depend on the choice mode rather than on the choice's
    // `depends on`
    let basedep = match kconf.nodes[node.0].item {
        MenuItem::Choice(c) => Rc::new(Expr::Choice(c)),
        _ => kconf.nodes[node.0].dep.clone(),
    };

    let mut cur = kconf.nodes[node.0].list;
    while let Some(child) = cur {
        let n = &mut kconf.nodes[child.0];
        n.dep = make_and(&n.dep, &basedep);
        let dep = n.dep.clone();

        match n.item {
            MenuItem::Symbol(_) | MenuItem::Choice(_) => {
                if let Some((_, cond)) = &mut n.prompt {
                    *cond = make_and(cond, &make_and(visible_if, &dep));
                }
                for (_, cond) in &mut n.defaults {
                    *cond = make_and(cond, &dep);
                }
                for (_, _, cond) in &mut n.ranges {
                    *cond = make_and(cond, &dep);
                }
                for (_, cond) in n.selects.iter_mut().chain(n.implies.iter_mut()) {
                    *cond = make_and(cond, &dep);
                }
            }
            // 'visible if' only applies to symbols and choices
            MenuItem::Menu | MenuItem::Comment => {
                if let Some((_, cond)) = &mut n.prompt {
                    *cond = make_and(cond, &dep);
                }
            }
        }
        cur = n.next;
    }
}

/// Copies the properties of a symbol's node onto the symbol and records
/// reverse dependencies on select and imply targets.
fn add_props_to_sym(kconf: &mut Kconfig, node: NodeId, sym: SymbolId) {
    let n = &kconf.nodes[node.0];
    let dep = n.dep.clone();
    let defaults = n.defaults.clone();
    let ranges = n.ranges.clone();
    let selects = n.selects.clone();
    let implies = n.implies.clone();

    let s = &mut kconf.syms[sym.0];
    s.direct_dep = make_or(&s.direct_dep, &dep);
    s.defaults.extend(defaults);
    s.ranges.extend(ranges);
    s.selects.extend(selects.iter().cloned());
    s.implies.extend(implies.iter().cloned());

    let sym_expr = Expr::sym(sym);
    for (target, cond) in selects {
        let t = &mut kconf.syms[target.0];
        t.rev_dep = make_or(&t.rev_dep, &make_and(&sym_expr, &cond));
    }
    for (target, cond) in implies {
        let t = &mut kconf.syms[target.0];
        t.weak_rev_dep = make_or(&t.weak_rev_dep, &make_and(&sym_expr, &cond));
    }
}

/// True if `node` belongs in the implicit menu of `sym`. Looks at the prompt
/// condition if there is one, otherwise at the dependencies.
fn auto_menu_dep(kconf: &Kconfig, sym: SymbolId, node: NodeId) -> bool {
    let n = &kconf.nodes[node.0];
    let expr = match &n.prompt {
        Some((_, cond)) => cond,
        None => &n.dep,
    };
    expr_depends_on(expr, sym)
}

/// Matches `SYM`, `SYM = m/y`, `SYM != n` (either operand order) and ANDs
/// containing one of those.
fn expr_depends_on(expr: &Expr, sym: SymbolId) -> bool {
    match expr {
        Expr::Sym(s) => *s == sym,
        Expr::Rel(op, a, b) => {
            let other = if *a == sym {
                *b
            } else if *b == sym {
                *a
            } else {
                return false;
            };
            match op {
                RelOp::Equal => other == SymbolId::M || other == SymbolId::Y,
                RelOp::Unequal => other == SymbolId::N,
                _ => false,
            }
        }
        Expr::And(a, b) => expr_depends_on(a, sym) || expr_depends_on(b, sym),
        _ => false,
    }
}

/// Moves the children of prompt-less nodes up after them. Prompt-less
/// choices keep their children.
fn flatten(kconf: &mut Kconfig, first: NodeId) {
    let mut cur = Some(first);
    while let Some(node) = cur {
        let n = &kconf.nodes[node.0];
        let collapse = n.prompt.is_none() && !matches!(n.item, MenuItem::Choice(_));
        if let (true, Some(list)) = (collapse, n.list) {
            let parent = n.parent;
            let mut last = list;
            loop {
                kconf.nodes[last.0].parent = parent;
                match kconf.nodes[last.0].next {
                    Some(next) => last = next,
                    None => break,
                }
            }
            kconf.nodes[last.0].next = kconf.nodes[node.0].next;
            kconf.nodes[node.0].next = Some(list);
            kconf.nodes[node.0].list = None;
        }
        cur = kconf.nodes[node.0].next;
    }
}

/// Unlinks `if` nodes from the children of `node`. They have already been
/// flattened.
fn remove_ifs(kconf: &mut Kconfig, node: NodeId) {
    let skip = |kconf: &Kconfig, mut cur: Option<NodeId>| {
        while let Some(id) = cur {
            if !kconf.nodes[id.0].is_if {
                break;
            }
            cur = kconf.nodes[id.0].next;
        }
        cur
    };

    let mut cur = skip(&*kconf, kconf.nodes[node.0].list);
    kconf.nodes[node.0].list = cur;
    while let Some(id) = cur {
        let next = skip(&*kconf, kconf.nodes[id.0].next);
        kconf.nodes[id.0].next = next;
        cur = next;
    }
}

/// Registers the symbols directly below a choice node as its members and
/// fills in missing types in both directions.
fn finalize_choice(kconf: &mut Kconfig, node: NodeId, choice: ChoiceId) {
    let mut cur = kconf.nodes[node.0].list;
    while let Some(id) = cur {
        if let MenuItem::Symbol(sym) = kconf.nodes[id.0].item {
            kconf.syms[sym.0].choice = Some(choice);
            let members = &mut kconf.choices[choice.0].syms;
            if !members.contains(&sym) {
                members.push(sym);
            }
        }
        cur = kconf.nodes[id.0].next;
    }

    let members = kconf.choices[choice.0].syms.clone();
    if kconf.choices[choice.0].orig_type == SymbolType::Unknown {
        if let Some(ty) = members
            .iter()
            .map(|s| kconf.syms[s.0].orig_type)
            .find(|t| *t != SymbolType::Unknown)
        {
            kconf.choices[choice.0].orig_type = ty;
        }
    }
    let ty = kconf.choices[choice.0].orig_type;
    for sym in members {
        if kconf.syms[sym.0].orig_type == SymbolType::Unknown {
            kconf.syms[sym.0].orig_type = ty;
        }
    }
}

/// True if `sym` can be the value of an int or hex symbol of type `ty`.
fn num_ok(kconf: &Kconfig, sym: SymbolId, ty: SymbolType) -> bool {
    let s = &kconf.syms[sym.0];
    if s.nodes.is_empty() {
        return is_base_n(&s.name, ty.base());
    }
    s.orig_type == ty
}

fn is_upper(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && !s.chars().any(char::is_lowercase)
}

fn first_location(kconf: &Kconfig, item: Item) -> Location {
    match kconf.item_nodes(item).first() {
        Some(node) => {
            let n = &kconf.nodes[node.0];
            Location::new(&n.filename, n.linenr)
        }
        None => Location::new(kconf.kconfig_filenames[0].as_str(), 1),
    }
}

fn check_sym_sanity(kconf: &Kconfig) -> Result<()> {
    for &sym in &kconf.unique_defined_syms {
        let s = &kconf.syms[sym.0];
        let nal = kconf.name_and_loc(Item::Sym(sym));
        let ty = s.orig_type;

        match ty {
            SymbolType::Bool | SymbolType::Tristate => {
                for (target, verb) in s
                    .selects
                    .iter()
                    .map(|(t, _)| (*t, "selects"))
                    .chain(s.implies.iter().map(|(t, _)| (*t, "implies")))
                {
                    let tt = kconf.syms[target.0].orig_type;
                    if !tt.is_bool_or_tristate() && tt != SymbolType::Unknown {
                        kconf.warn_msg(format!(
                            "{nal} {verb} the {tt} symbol {}, which is not bool or tristate",
                            kconf.name_and_loc(Item::Sym(target))
                        ));
                    }
                }
            }
            SymbolType::String | SymbolType::Int | SymbolType::Hex => {
                for (default, _) in &s.defaults {
                    let Some(d) = default.as_sym() else {
                        return Err(Error::parse(
                            first_location(kconf, Item::Sym(sym)),
                            format!(
                                "the {ty} symbol {nal} has a malformed default {} -- expected a \
                                 single symbol",
                                kconf.expr_str(default)
                            ),
                        ));
                    };
                    let ds = &kconf.syms[d.0];
                    if ty == SymbolType::String {
                        if !ds.is_constant && ds.nodes.is_empty() && !is_upper(&ds.name) {
                            // Probably a string missing its quotes
                            kconf.warn_msg(format!(
                                "style: quotes recommended around default value for string \
                                 symbol {nal}"
                            ));
                        }
                    } else if !num_ok(kconf, d, ty) {
                        kconf.warn_msg(format!(
                            "the {ty} symbol {nal} has a non-{ty} default {}",
                            kconf.name_and_loc(Item::Sym(d))
                        ));
                    }
                }
                if !s.selects.is_empty() || !s.implies.is_empty() {
                    kconf.warn_msg(format!("the {ty} symbol {nal} has selects or implies"));
                }
            }
            SymbolType::Unknown => kconf.warn_msg(format!("{nal} defined without a type")),
        }

        if !s.ranges.is_empty() {
            if !ty.is_int_or_hex() {
                kconf.warn_msg(format!(
                    "the {ty} symbol {nal} has ranges, but is not int or hex"
                ));
            } else {
                for (low, high, _) in &s.ranges {
                    if !num_ok(kconf, *low, ty) || !num_ok(kconf, *high, ty) {
                        kconf.warn_msg(format!(
                            "the {ty} symbol {nal} has a non-{ty} range [{}, {}]",
                            kconf.name_and_loc(Item::Sym(*low)),
                            kconf.name_and_loc(Item::Sym(*high))
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_choice_sanity(kconf: &Kconfig) -> Result<()> {
    let warn_select_imply = |sym: SymbolId, expr: &ExprRef, how: &str| {
        let mut msg = format!(
            "the choice symbol {} is {how} by the following symbols, but select/imply has no \
             effect on choice symbols",
            kconf.name_and_loc(Item::Sym(sym))
        );
        for term in split_expr(expr, BinOp::Or) {
            let first = split_expr(&term, BinOp::And).remove(0);
            let name = match first.as_sym() {
                Some(s) => kconf.name_and_loc(Item::Sym(s)),
                None => kconf.expr_str(&first),
            };
            msg.push_str(&format!("\n - {name}"));
        }
        kconf.warn_msg(msg);
    };

    for &choice in &kconf.unique_choices {
        let c = &kconf.choices[choice.0];
        let nal = kconf.name_and_loc(Item::Choice(choice));

        if !c.orig_type.is_bool_or_tristate() {
            kconf.warn_msg(format!("{nal} defined with type {}", c.orig_type));
        }

        if c.nodes.iter().all(|n| kconf.nodes[n.0].prompt.is_none()) {
            kconf.warn_msg(format!("{nal} defined without a prompt"));
        }

        for (default, _) in &c.defaults {
            let Some(d) = default.as_sym() else {
                return Err(Error::parse(
                    first_location(kconf, Item::Choice(choice)),
                    format!("{nal} has a malformed default {}", kconf.expr_str(default)),
                ));
            };
            if kconf.syms[d.0].choice != Some(choice) {
                kconf.warn_msg(format!(
                    "the default selection {} of {nal} is not contained in the choice",
                    kconf.name_and_loc(Item::Sym(d))
                ));
            }
        }

        for &sym in &c.syms {
            let s = &kconf.syms[sym.0];
            let snal = kconf.name_and_loc(Item::Sym(sym));
            if !s.defaults.is_empty() {
                kconf.warn_msg(format!(
                    "default on the choice symbol {snal} will have no effect, as defaults do \
                     not affect choice symbols"
                ));
            }
            if !s.rev_dep.is_n() {
                warn_select_imply(sym, &s.rev_dep, "selected");
            }
            if !s.weak_rev_dep.is_n() {
                warn_select_imply(sym, &s.weak_rev_dep, "implied");
            }
            for node in &s.nodes {
                let n = &kconf.nodes[node.0];
                let in_choice = n
                    .parent
                    .is_some_and(|p| kconf.nodes[p.0].item == MenuItem::Choice(choice));
                if in_choice && n.prompt.is_none() {
                    kconf.warn_msg(format!("the choice symbol {snal} has no prompt"));
                } else if !in_choice && n.prompt.is_some() {
                    kconf.warn_msg(format!(
                        "the choice symbol {snal} is defined with a prompt outside the choice"
                    ));
                }
            }
        }
    }
    Ok(())
}

impl Kconfig {
    /// Warns about every symbol that is referenced but never defined, with
    /// the definitions referencing it.
    ///
    /// Runs automatically during loading when `KCONFIG_WARN_UNDEF=y`.
    pub fn check_undefined_syms(&self) {
        let is_num = |s: &str| parse_int(s, 10).is_some() || parse_int(s, 16).is_some();

        for (idx, sym) in self.syms.iter().enumerate() {
            if sym.is_constant
                || !sym.nodes.is_empty()
                || is_num(&sym.name)
                || sym.name == "MODULES"
                || self.sym_table.get(&sym.name) != Some(&SymbolId(idx))
            {
                continue;
            }
            let mut msg = format!("undefined symbol {}:", sym.name);
            for node in self.node_iter(false) {
                if self.node_referenced(node).contains(&Item::Sym(SymbolId(idx))) {
                    let n = &self.nodes[node.0];
                    msg.push_str(&format!(
                        "\n\n- Referenced at {}:{}:\n\n{}",
                        n.filename,
                        n.linenr,
                        self.node_str(node)
                    ));
                }
            }
            self.warn_msg(msg);
        }
    }
}

/// Adds `item` to the dependents of every non-constant symbol and choice in
/// `expr`.
fn depend_on(kconf: &mut Kconfig, item: Item, expr: &Expr) {
    for dep in expr_items(expr) {
        let list = match dep {
            Item::Sym(s) if kconf.syms[s.0].is_constant => continue,
            Item::Sym(s) => &mut kconf.syms[s.0].dependents,
            Item::Choice(c) => &mut kconf.choices[c.0].dependents,
        };
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

/// Builds the dependents index. An item is recorded as a dependent of
/// everything its value can be computed from.
fn build_dep(kconf: &mut Kconfig) {
    for sym in kconf.unique_defined_syms.clone() {
        let s = &kconf.syms[sym.0];
        let mut exprs: Vec<ExprRef> = s
            .nodes
            .iter()
            .filter_map(|n| kconf.nodes[n.0].prompt.as_ref().map(|(_, cond)| cond.clone()))
            .collect();
        for (value, cond) in &s.defaults {
            exprs.push(value.clone());
            exprs.push(cond.clone());
        }
        exprs.push(s.rev_dep.clone());
        exprs.push(s.weak_rev_dep.clone());
        for (low, high, cond) in &s.ranges {
            exprs.push(Expr::sym(*low));
            exprs.push(Expr::sym(*high));
            exprs.push(cond.clone());
        }
        // Needed for imply, which looks at the direct dependencies even when
        // there are no properties they were propagated to
        exprs.push(s.direct_dep.clone());

        for expr in exprs {
            depend_on(kconf, Item::Sym(sym), &expr);
        }
    }

    for choice in kconf.unique_choices.clone() {
        let c = &kconf.choices[choice.0];
        let mut exprs: Vec<ExprRef> = c
            .nodes
            .iter()
            .filter_map(|n| kconf.nodes[n.0].prompt.as_ref().map(|(_, cond)| cond.clone()))
            .collect();
        exprs.extend(c.defaults.iter().map(|(_, cond)| cond.clone()));

        for expr in exprs {
            depend_on(kconf, Item::Choice(choice), &expr);
        }
    }
}

/// The selection of a choice depends on the visibility of its members. Added
/// after loop detection, since it makes every choice a trivial cycle.
fn add_choice_deps(kconf: &mut Kconfig) {
    for choice in kconf.unique_choices.clone() {
        for sym in kconf.choices[choice.0].syms.clone() {
            let deps = &mut kconf.syms[sym.0].dependents;
            if !deps.contains(&Item::Choice(choice)) {
                deps.push(Item::Choice(choice));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Kconfig {
        Kconfig::from_text(text, "Kconfig").unwrap()
    }

    fn children(kconf: &Kconfig, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = kconf.node(node).list();
        while let Some(id) = cur {
            out.push(id);
            cur = kconf.node(id).next();
        }
        out
    }

    fn sym_at(kconf: &Kconfig, node: NodeId) -> &str {
        kconf.sym(kconf.node(node).sym().unwrap()).name()
    }

    #[test]
    fn test_if_nodes_removed() {
        let kconf = load(
            "config A\n\tbool \"a\"\nif A\nconfig B\n\tbool \"b\"\nendif\nconfig C\n\tbool \"c\"\n",
        );
        let top = children(&kconf, kconf.top_node());
        // B ends up in the implicit menu of A
        assert_eq!(top.len(), 2);
        assert_eq!(sym_at(&kconf, top[0]), "A");
        assert_eq!(sym_at(&kconf, top[1]), "C");
        let sub = children(&kconf, top[0]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sym_at(&kconf, sub[0]), "B");
        assert_eq!(kconf.node(sub[0]).parent(), Some(top[0]));
    }

    #[test]
    fn test_menu_deps_propagate() {
        let kconf = load(
            "config X\n\tbool \"x\"\nconfig Y\n\tbool \"y\"\nmenu \"M\"\n\tdepends on X\n\tvisible if Y\nconfig A\n\tbool \"a\"\n\tdefault y\nendmenu\n",
        );
        let a = kconf.lookup("A").unwrap();
        let node = kconf.node(kconf.sym(a).nodes()[0]);
        assert_eq!(kconf.expr_str(node.dep()), "X");
        assert_eq!(kconf.expr_str(node.prompt().unwrap().1), "Y && X");
        assert_eq!(kconf.expr_str(&node.defaults()[0].1), "X");
        assert_eq!(kconf.expr_str(kconf.sym(a).direct_dep()), "X");

        // The propagated dependency is stripped again
        let (_, cond) = node.orig_defaults(kconf.y())[0].clone();
        assert!(cond.is_y());
    }

    #[test]
    fn test_select_builds_rev_dep() {
        let kconf = load(
            "config A\n\tbool \"a\"\n\tselect B if C\nconfig B\n\tbool\nconfig C\n\tbool \"c\"\n",
        );
        let b = kconf.lookup("B").unwrap();
        assert_eq!(kconf.expr_str(kconf.sym(b).rev_dep()), "A && C");
        let c = kconf.lookup("C").unwrap();
        assert!(kconf.sym(c).dependents().contains(&Item::Sym(b)));
    }

    #[test]
    fn test_choice_type_inference() {
        let kconf = load(
            "choice\n\tprompt \"pick\"\nconfig A\n\tbool \"a\"\nconfig B\n\tprompt \"b\"\nendchoice\n",
        );
        let choice = kconf.unique_choices()[0];
        assert_eq!(kconf.choice(choice).orig_type(), SymbolType::Bool);
        let b = kconf.lookup("B").unwrap();
        assert_eq!(kconf.sym(b).orig_type(), SymbolType::Bool);
        assert_eq!(kconf.sym(b).choice(), Some(choice));
        assert_eq!(kconf.choice(choice).syms().len(), 2);
    }

    #[test]
    fn test_malformed_string_default_is_error() {
        let err = Kconfig::from_text("config S\n\tstring \"s\"\n\tdefault A && B\n", "Kconfig")
            .err()
            .unwrap();
        assert!(err.to_string().contains("malformed default"));
    }

    #[test]
    fn test_untyped_symbol_warns() {
        let kconf = load("config A\n\tprompt \"a\"\n");
        assert!(
            kconf
                .warnings()
                .iter()
                .any(|w| w.contains("A (defined at Kconfig:1) defined without a type"))
        );
    }
}
