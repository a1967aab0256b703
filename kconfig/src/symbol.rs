//! Symbols: the named configuration values.

use std::cell::{Cell, RefCell};

use crate::{
    expr::{ChoiceId, ExprRef, Item, SymbolId},
    menu::NodeId,
    tristate::{SymbolType, Tristate},
};

/// A value assigned by the user, through `set_value` or a `.config` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValue {
    Tri(Tristate),
    Str(String),
}

impl UserValue {
    pub fn as_tri(&self) -> Option<Tristate> {
        match self {
            UserValue::Tri(t) => Some(*t),
            UserValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserValue::Tri(t) => t.as_str(),
            UserValue::Str(s) => s,
        }
    }
}

/// Lazily computed values. Every entry is `None` when dirty.
#[derive(Debug, Default)]
pub(crate) struct SymCache {
    pub tri: Cell<Option<Tristate>>,
    pub str_val: RefCell<Option<String>>,
    pub vis: Cell<Option<Tristate>>,
    pub assignable: Cell<Option<&'static [Tristate]>>,
    /// Visibility assuming the owning choice is in `y` mode.
    pub candidate_vis: Cell<Option<Tristate>>,
    /// Set as a side effect of computing the value.
    pub write_to_conf: Cell<bool>,
}

impl SymCache {
    pub fn clear(&self) {
        self.tri.set(None);
        self.str_val.replace(None);
        self.vis.set(None);
        self.assignable.set(None);
        self.candidate_vis.set(None);
    }

    pub fn is_populated(&self) -> bool {
        self.tri.get().is_some()
            || self.str_val.borrow().is_some()
            || self.vis.get().is_some()
            || self.assignable.get().is_some()
            || self.candidate_vis.get().is_some()
    }
}

/// A configuration symbol.
///
/// Fields are read through accessors; values that depend on the rest of the
/// configuration (`tri_value`, `str_value`, ...) are computed by
/// [`Kconfig`](crate::Kconfig), which owns every symbol.
#[derive(Debug)]
pub struct Symbol {
    pub(crate) name: String,
    pub(crate) orig_type: SymbolType,
    pub(crate) is_constant: bool,
    pub(crate) nodes: Vec<NodeId>,

    pub(crate) defaults: Vec<(ExprRef, ExprRef)>,
    pub(crate) selects: Vec<(SymbolId, ExprRef)>,
    pub(crate) implies: Vec<(SymbolId, ExprRef)>,
    pub(crate) ranges: Vec<(SymbolId, SymbolId, ExprRef)>,

    pub(crate) direct_dep: ExprRef,
    pub(crate) rev_dep: ExprRef,
    pub(crate) weak_rev_dep: ExprRef,

    pub(crate) choice: Option<ChoiceId>,
    pub(crate) user_value: Option<UserValue>,
    pub(crate) env_var: Option<String>,
    pub(crate) is_allnoconfig_y: bool,
    pub(crate) is_transitional: bool,

    /// Items whose value depends on this symbol.
    pub(crate) dependents: Vec<Item>,

    pub(crate) cache: SymCache,
    pub(crate) visited: Cell<u8>,
    pub(crate) was_set: bool,
}

impl Symbol {
    pub(crate) fn new(name: impl Into<String>, is_constant: bool, n: &ExprRef) -> Self {
        Self {
            name: name.into(),
            orig_type: SymbolType::Unknown,
            is_constant,
            nodes: Vec::new(),
            defaults: Vec::new(),
            selects: Vec::new(),
            implies: Vec::new(),
            ranges: Vec::new(),
            direct_dep: n.clone(),
            rev_dep: n.clone(),
            weak_rev_dep: n.clone(),
            choice: None,
            user_value: None,
            env_var: None,
            is_allnoconfig_y: false,
            is_transitional: false,
            dependents: Vec::new(),
            cache: SymCache::default(),
            visited: Cell::new(0),
            was_set: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type as declared, before `tristate` to `bool` demotion.
    pub fn orig_type(&self) -> SymbolType {
        self.orig_type
    }

    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    /// True if the symbol has at least one `config` definition.
    pub fn is_defined(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Menu nodes defining this symbol, in definition order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// `(value, condition)` pairs with inherited dependencies applied.
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

    /// OR of the dependencies of every definition.
    pub fn direct_dep(&self) -> &ExprRef {
        &self.direct_dep
    }

    /// OR of `SELECTOR && cond` over every `select` naming this symbol.
    pub fn rev_dep(&self) -> &ExprRef {
        &self.rev_dep
    }

    /// Like [`rev_dep`](Self::rev_dep), for `imply`.
    pub fn weak_rev_dep(&self) -> &ExprRef {
        &self.weak_rev_dep
    }

    pub fn choice(&self) -> Option<ChoiceId> {
        self.choice
    }

    pub fn user_value(&self) -> Option<&UserValue> {
        self.user_value.as_ref()
    }

    /// Environment variable named in `option env`.
    pub fn env_var(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    pub fn is_allnoconfig_y(&self) -> bool {
        self.is_allnoconfig_y
    }

    pub fn is_transitional(&self) -> bool {
        self.is_transitional
    }

    pub fn dependents(&self) -> &[Item] {
        &self.dependents
    }
}
