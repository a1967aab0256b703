//! The menu tree.
//!
//! Every `config`, `menuconfig`, `choice`, `menu` and `comment` statement
//! produces one [`MenuNode`]. Nodes are linked the way the menu is shown:
//! `list` points at the first child and `next` at the following sibling.

use std::collections::HashSet;

use crate::{
    Kconfig,
    expr::{ChoiceId, ExprRef, SymbolId},
};

/// Handle of a node in the [`Kconfig`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a menu node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    Symbol(SymbolId),
    Choice(ChoiceId),
    Menu,
    Comment,
}

/// A position in the menu tree.
#[derive(Debug)]
pub struct MenuNode {
    pub(crate) item: MenuItem,
    pub(crate) parent: Option<NodeId>,
    pub(crate) list: Option<NodeId>,
    pub(crate) next: Option<NodeId>,

    pub(crate) prompt: Option<(String, ExprRef)>,
    pub(crate) help: Option<String>,
    pub(crate) dep: ExprRef,
    /// `visible if` condition. Only meaningful for menus.
    pub(crate) visibility: ExprRef,

    pub(crate) defaults: Vec<(ExprRef, ExprRef)>,
    pub(crate) selects: Vec<(SymbolId, ExprRef)>,
    pub(crate) implies: Vec<(SymbolId, ExprRef)>,
    pub(crate) ranges: Vec<(SymbolId, SymbolId, ExprRef)>,

    pub(crate) is_menuconfig: bool,
    /// `if` block, removed from the tree after finalization.
    pub(crate) is_if: bool,

    pub(crate) filename: String,
    pub(crate) linenr: usize,
    pub(crate) include_path: Vec<(String, usize)>,
}

impl MenuNode {
    pub(crate) fn new(item: MenuItem, y: &ExprRef, filename: &str, linenr: usize) -> Self {
        Self {
            item,
            parent: None,
            list: None,
            next: None,
            prompt: None,
            help: None,
            dep: y.clone(),
            visibility: y.clone(),
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
            is_menuconfig: false,
            is_if: false,
            filename: filename.to_string(),
            linenr,
            include_path: Vec::new(),
        }
    }

    pub fn item(&self) -> MenuItem {
        self.item
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// First child.
    pub fn list(&self) -> Option<NodeId> {
        self.list
    }

    /// Next sibling.
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Prompt text and its condition, with inherited dependencies applied.
    pub fn prompt(&self) -> Option<(&str, &ExprRef)> {
        self.prompt.as_ref().map(|(text, cond)| (text.as_str(), cond))
    }

    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt.as_ref().map(|(text, _)| text.as_str())
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Dependencies of this location, including those inherited from
    /// enclosing menus, choices and `if` blocks.
    pub fn dep(&self) -> &ExprRef {
        &self.dep
    }

    pub fn visibility(&self) -> &ExprRef {
        &self.visibility
    }

    pub fn defaults(&self) -> &[(ExprRef, ExprRef)] {
        &self.defaults
    }

    pub fn selects(&self) -> &[(SymbolId, ExprRef)] {
        &self.selects
    }

    pub fn implies(&self) -> &[(SymbolId, ExprRef)] {
        &self.implies
    }

    pub fn ranges(&self) -> &[(SymbolId, SymbolId, ExprRef)] {
        &self.ranges
    }

    /// True for `menuconfig` symbols, menus and choices: nodes shown as
    /// separate menus.
    pub fn is_menuconfig(&self) -> bool {
        self.is_menuconfig
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn linenr(&self) -> usize {
        self.linenr
    }

    /// `(file, line)` of each `source` statement leading to this node.
    pub fn include_path(&self) -> &[(String, usize)] {
        &self.include_path
    }

    /// The symbol held by this node, if any.
    pub fn sym(&self) -> Option<SymbolId> {
        match self.item {
            MenuItem::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Drops `dep` from the end of a propagated condition.
    pub(crate) fn strip_dep(&self, expr: &ExprRef, y: &ExprRef) -> ExprRef {
        if std::rc::Rc::ptr_eq(&self.dep, expr) {
            return y.clone();
        }
        if let crate::expr::Expr::And(left, right) = &**expr {
            if std::rc::Rc::ptr_eq(right, &self.dep) {
                return left.clone();
            }
        }
        expr.clone()
    }

    /// The prompt as written, without inherited dependencies.
    pub fn orig_prompt(&self, y: &ExprRef) -> Option<(String, ExprRef)> {
        self.prompt
            .as_ref()
            .map(|(text, cond)| (text.clone(), self.strip_dep(cond, y)))
    }

    pub fn orig_defaults(&self, y: &ExprRef) -> Vec<(ExprRef, ExprRef)> {
        self.defaults
            .iter()
            .map(|(v, cond)| (v.clone(), self.strip_dep(cond, y)))
            .collect()
    }

    pub fn orig_selects(&self, y: &ExprRef) -> Vec<(SymbolId, ExprRef)> {
        self.selects
            .iter()
            .map(|(t, cond)| (*t, self.strip_dep(cond, y)))
            .collect()
    }

    pub fn orig_implies(&self, y: &ExprRef) -> Vec<(SymbolId, ExprRef)> {
        self.implies
            .iter()
            .map(|(t, cond)| (*t, self.strip_dep(cond, y)))
            .collect()
    }

    pub fn orig_ranges(&self, y: &ExprRef) -> Vec<(SymbolId, SymbolId, ExprRef)> {
        self.ranges
            .iter()
            .map(|(lo, hi, cond)| (*lo, *hi, self.strip_dep(cond, y)))
            .collect()
    }
}

/// Preorder walk over the menu tree, skipping the top node.
///
/// Created by [`Kconfig::node_iter`].
pub struct NodeIter<'a> {
    kconf: &'a Kconfig,
    cur: Option<NodeId>,
    seen: Option<HashSet<SymbolId>>,
}

impl<'a> NodeIter<'a> {
    pub(crate) fn new(kconf: &'a Kconfig, unique_syms: bool) -> Self {
        Self {
            kconf,
            cur: Some(kconf.top_node()),
            seen: unique_syms.then(HashSet::new),
        }
    }

    fn advance(&self, node: NodeId) -> Option<NodeId> {
        let n = self.kconf.node(node);
        if let Some(list) = n.list {
            return Some(list);
        }
        if let Some(next) = n.next {
            return Some(next);
        }
        let mut cur = n.parent;
        while let Some(p) = cur {
            let pn = self.kconf.node(p);
            if let Some(next) = pn.next {
                return Some(next);
            }
            cur = pn.parent;
        }
        None
    }
}

impl Iterator for NodeIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let node = self.advance(self.cur?)?;
            self.cur = Some(node);
            if let (Some(seen), MenuItem::Symbol(sym)) = (&mut self.seen, self.kconf.node(node).item)
            {
                if !seen.insert(sym) {
                    continue;
                }
            }
            return Some(node);
        }
    }
}
