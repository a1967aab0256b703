//! Text renderings of expressions, definitions and values.
//!
//! Definitions are printed in Kconfig syntax with inherited dependencies
//! stripped from properties, so they read like the source they came from.
//! Dependency loop reports are built from these.

use crate::{
    Kconfig,
    expr::{BinOp, ChoiceId, Expr, ExprRef, Item, SymbolId},
    menu::{MenuItem, NodeId},
    tristate::{SymbolType, Tristate},
    util::escape,
};

impl Kconfig {
    /// `NAME`, `"const"` or `<choice NAME>`.
    pub fn item_str(&self, item: Item) -> String {
        match item {
            Item::Sym(s) => {
                let sym = &self.syms[s.0];
                if sym.is_constant && !matches!(sym.name.as_str(), "n" | "m" | "y") {
                    format!("\"{}\"", escape(&sym.name))
                } else {
                    sym.name.clone()
                }
            }
            Item::Choice(c) => match &self.choices[c.0].name {
                Some(name) => format!("<choice {name}>"),
                None => "<choice>".to_string(),
            },
        }
    }

    /// Name plus definition locations, as used in warnings:
    /// `FOO (defined at Kconfig:3, Kconfig:10)` or `FOO (undefined)`.
    pub fn name_and_loc(&self, item: Item) -> String {
        let name = self.item_str(item);
        let nodes = self.item_nodes(item);
        if nodes.is_empty() {
            return format!("{name} (undefined)");
        }
        let locs: Vec<String> = nodes
            .iter()
            .map(|n| {
                let node = &self.nodes[n.0];
                format!("{}:{}", node.filename, node.linenr)
            })
            .collect();
        format!("{name} (defined at {})", locs.join(", "))
    }

    /// Renders an expression in Kconfig syntax.
    ///
    /// `||` operands of `&&` are parenthesized and vice versa, so
    /// `A && B || C` prints as `(A && B) || C`.
    pub fn expr_str(&self, expr: &Expr) -> String {
        match expr {
            Expr::Sym(s) => self.item_str(Item::Sym(*s)),
            Expr::Choice(c) => self.item_str(Item::Choice(*c)),
            Expr::And(a, b) => format!(
                "{} && {}",
                self.parenthesize(a, BinOp::Or),
                self.parenthesize(b, BinOp::Or)
            ),
            Expr::Or(a, b) => format!(
                "{} || {}",
                self.parenthesize(a, BinOp::And),
                self.parenthesize(b, BinOp::And)
            ),
            Expr::Not(a) => {
                if a.is_compound() {
                    format!("!({})", self.expr_str(a))
                } else {
                    format!("!{}", self.expr_str(a))
                }
            }
            Expr::Rel(op, a, b) => format!(
                "{} {} {}",
                self.item_str(Item::Sym(*a)),
                op,
                self.item_str(Item::Sym(*b))
            ),
        }
    }

    fn parenthesize(&self, expr: &Expr, op: BinOp) -> String {
        let matches = matches!(
            (expr, op),
            (Expr::And(..), BinOp::And) | (Expr::Or(..), BinOp::Or)
        );
        if matches {
            format!("({})", self.expr_str(expr))
        } else {
            self.expr_str(expr)
        }
    }

    /// Definition of the item at `node` in Kconfig syntax.
    pub fn node_str(&self, node: NodeId) -> String {
        let n = &self.nodes[node.0];
        match n.item {
            MenuItem::Symbol(_) | MenuItem::Choice(_) => self.sym_choice_node_str(node),
            MenuItem::Menu | MenuItem::Comment => {
                let kind = if n.item == MenuItem::Menu { "menu" } else { "comment" };
                let mut s = format!("{kind} \"{}\"", escape(n.prompt_text().unwrap_or("")));
                if !n.dep.is_y() {
                    s.push_str(&format!("\n\tdepends on {}", self.expr_str(&n.dep)));
                }
                if n.item == MenuItem::Menu && !n.visibility.is_y() {
                    s.push_str(&format!("\n\tvisible if {}", self.expr_str(&n.visibility)));
                }
                s
            }
        }
    }

    fn sym_choice_node_str(&self, node: NodeId) -> String {
        let n = &self.nodes[node.0];
        let y = &self.y;
        let mut lines = Vec::new();
        let cond_suffix = |cond: &ExprRef| {
            if cond.is_y() {
                String::new()
            } else {
                format!(" if {}", self.expr_str(cond))
            }
        };

        let (orig_type, sym) = match n.item {
            MenuItem::Symbol(s) => {
                let kw = if n.is_menuconfig { "menuconfig" } else { "config" };
                lines.push(format!("{kw} {}", self.syms[s.0].name));
                (self.syms[s.0].orig_type, Some(s))
            }
            MenuItem::Choice(c) => {
                let choice = &self.choices[c.0];
                lines.push(match &choice.name {
                    Some(name) => format!("choice {name}"),
                    None => "choice".to_string(),
                });
                (choice.orig_type, None)
            }
            _ => return String::new(),
        };

        match n.orig_prompt(y) {
            Some((text, cond)) => {
                let prefix = if orig_type == SymbolType::Unknown {
                    "prompt"
                } else {
                    orig_type.as_str()
                };
                lines.push(format!("\t{prefix} \"{}\"{}", escape(&text), cond_suffix(&cond)));
            }
            None if orig_type != SymbolType::Unknown => lines.push(format!("\t{orig_type}")),
            None => {}
        }

        if let Some(s) = sym {
            let symbol = &self.syms[s.0];
            if symbol.is_allnoconfig_y {
                lines.push("\toption allnoconfig_y".to_string());
            }
            if self.defconfig_list == Some(s) {
                lines.push("\toption defconfig_list".to_string());
            }
            if let Some(env) = &symbol.env_var {
                lines.push(format!("\toption env=\"{env}\""));
            }
            if self.modules == s {
                lines.push("\toption modules".to_string());
            }
            if symbol.is_transitional {
                lines.push("\ttransitional".to_string());
            }
            for (low, high, cond) in n.orig_ranges(y) {
                lines.push(format!(
                    "\trange {} {}{}",
                    self.item_str(Item::Sym(low)),
                    self.item_str(Item::Sym(high)),
                    cond_suffix(&cond)
                ));
            }
        }

        for (value, cond) in n.orig_defaults(y) {
            lines.push(format!("\tdefault {}{}", self.expr_str(&value), cond_suffix(&cond)));
        }

        if let MenuItem::Choice(c) = n.item {
            if self.choices[c.0].is_optional {
                lines.push("\toptional".to_string());
            }
        }

        if sym.is_some() {
            for (target, cond) in n.orig_selects(y) {
                lines.push(format!(
                    "\tselect {}{}",
                    self.item_str(Item::Sym(target)),
                    cond_suffix(&cond)
                ));
            }
            for (target, cond) in n.orig_implies(y) {
                lines.push(format!(
                    "\timply {}{}",
                    self.item_str(Item::Sym(target)),
                    cond_suffix(&cond)
                ));
            }
        }

        if !n.dep.is_y() {
            lines.push(format!("\tdepends on {}", self.expr_str(&n.dep)));
        }

        if let Some(help) = &n.help {
            lines.push("\thelp".to_string());
            for l in help.lines() {
                lines.push(format!("\t  {l}"));
            }
        }

        lines.join("\n")
    }

    /// Every definition of a symbol or choice, separated by blank lines.
    pub fn item_definition(&self, item: Item) -> String {
        self.item_nodes(item)
            .iter()
            .map(|n| self.node_str(*n))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One-line debug summary of a symbol, e.g.
    /// `<symbol FOO, bool, "Prompt", value y, visibility y, direct deps y, Kconfig:3>`.
    pub fn sym_repr(&self, id: SymbolId) -> String {
        let sym = &self.syms[id.0];
        let mut fields = vec![format!("symbol {}", sym.name), self.sym_type(id).to_string()];
        for node in &sym.nodes {
            if let Some(text) = self.nodes[node.0].prompt_text() {
                fields.push(format!("\"{text}\""));
            }
        }

        let quote = !sym.orig_type.is_bool_or_tristate();
        let value = self.str_value(id);
        fields.push(if quote {
            format!("value \"{value}\"")
        } else {
            format!("value {value}")
        });

        if !sym.is_constant {
            if let Some(user) = &sym.user_value {
                fields.push(if quote {
                    format!("user value \"{}\"", user.as_str())
                } else {
                    format!("user value {}", user.as_str())
                });
            }
            fields.push(format!("visibility {}", self.visibility(id)));
            if sym.choice.is_some() {
                fields.push("choice symbol".to_string());
            }
            if sym.is_allnoconfig_y {
                fields.push("allnoconfig_y".to_string());
            }
            if self.defconfig_list == Some(id) {
                fields.push("is the defconfig_list symbol".to_string());
            }
            if let Some(env) = &sym.env_var {
                fields.push(format!("from environment variable {env}"));
            }
            if self.modules == id {
                fields.push("is the modules symbol".to_string());
            }
            if sym.is_transitional {
                fields.push("transitional".to_string());
            }
            fields.push(format!("direct deps {}", self.eval(&sym.direct_dep)));
        }

        if sym.nodes.is_empty() {
            fields.push(if sym.is_constant { "constant" } else { "undefined" }.to_string());
        } else {
            for node in &sym.nodes {
                let n = &self.nodes[node.0];
                fields.push(format!("{}:{}", n.filename, n.linenr));
            }
        }
        format!("<{}>", fields.join(", "))
    }

    /// One-line debug summary of a choice.
    pub fn choice_repr(&self, id: ChoiceId) -> String {
        let choice = &self.choices[id.0];
        let mut fields = vec![
            match &choice.name {
                Some(name) => format!("choice {name}"),
                None => "choice".to_string(),
            },
            self.choice_type(id).to_string(),
        ];
        for node in &choice.nodes {
            if let Some(text) = self.nodes[node.0].prompt_text() {
                fields.push(format!("\"{text}\""));
            }
        }
        let mode = self.choice_tri_value(id);
        fields.push(format!("mode {mode}"));
        if let Some(user) = choice.user_value {
            fields.push(format!("user mode {user}"));
        }
        let selection = self.choice_selection(id);
        if mode == Tristate::Y {
            if let Some(sel) = selection {
                fields.push(format!("{} selected", self.syms[sel.0].name));
            }
        }
        if let Some(user_sel) = choice.user_selection {
            let mut s = format!("{} selected by user", self.syms[user_sel.0].name);
            if selection != Some(user_sel) {
                s.push_str(" (overridden)");
            }
            fields.push(s);
        }
        fields.push(format!("visibility {}", self.choice_visibility(id)));
        if choice.is_optional {
            fields.push("optional".to_string());
        }
        for node in &choice.nodes {
            let n = &self.nodes[node.0];
            fields.push(format!("{}:{}", n.filename, n.linenr));
        }
        format!("<{}>", fields.join(", "))
    }

    /// One-line debug summary of a menu node.
    pub fn node_repr(&self, node: NodeId) -> String {
        let n = &self.nodes[node.0];
        let mut fields = vec![match n.item {
            MenuItem::Symbol(s) => format!("menu node for symbol {}", self.syms[s.0].name),
            MenuItem::Choice(c) => format!("menu node for {}", self.item_str(Item::Choice(c))),
            MenuItem::Menu => "menu node for menu".to_string(),
            MenuItem::Comment => "menu node for comment".to_string(),
        }];
        if let Some((text, cond)) = &n.prompt {
            fields.push(format!("prompt \"{text}\" (visibility {})", self.eval(cond)));
        }
        if n.is_menuconfig {
            fields.push("is menuconfig".to_string());
        }
        fields.push(format!("deps {}", self.eval(&n.dep)));
        if n.item == MenuItem::Menu {
            fields.push(format!("'visible if' deps {}", self.eval(&n.visibility)));
        }
        if n.help.is_some() {
            fields.push("has help".to_string());
        }
        if n.list.is_some() {
            fields.push("has child".to_string());
        }
        if n.next.is_some() {
            fields.push("has next".to_string());
        }
        fields.push(format!("{}:{}", n.filename, n.linenr));
        format!("<{}>", fields.join(", "))
    }
}
