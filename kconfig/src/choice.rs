//! Choices: groups of mutually exclusive symbols.

use std::cell::Cell;

use crate::{
    expr::{ExprRef, Item, SymbolId},
    menu::NodeId,
    tristate::{SymbolType, Tristate},
};

#[derive(Debug, Default)]
pub(crate) struct ChoiceCache {
    pub tri: Cell<Option<Tristate>>,
    pub vis: Cell<Option<Tristate>>,
    pub assignable: Cell<Option<&'static [Tristate]>>,
    pub selection: Cell<Option<Option<SymbolId>>>,
}

impl ChoiceCache {
    pub fn clear(&self) {
        self.tri.set(None);
        self.vis.set(None);
        self.assignable.set(None);
        self.selection.set(None);
    }

    pub fn is_populated(&self) -> bool {
        self.tri.get().is_some()
            || self.vis.get().is_some()
            || self.assignable.get().is_some()
            || self.selection.get().is_some()
    }
}

/// A `choice ... endchoice` block.
///
/// The choice value is its mode: `y` means exactly one member is `y`, `m`
/// lets tristate members be `m` independently and `n` disables them all.
#[derive(Debug)]
pub struct Choice {
    pub(crate) name: Option<String>,
    pub(crate) orig_type: SymbolType,
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) syms: Vec<SymbolId>,
    pub(crate) defaults: Vec<(ExprRef, ExprRef)>,
    pub(crate) direct_dep: ExprRef,
    pub(crate) is_optional: bool,

    pub(crate) user_value: Option<Tristate>,
    pub(crate) user_selection: Option<SymbolId>,

    pub(crate) dependents: Vec<Item>,
    pub(crate) cache: ChoiceCache,
    pub(crate) visited: Cell<u8>,
    pub(crate) was_set: bool,
}

impl Choice {
    pub(crate) fn new(name: Option<String>, n: &ExprRef) -> Self {
        Self {
            name,
            orig_type: SymbolType::Unknown,
            nodes: Vec::new(),
            syms: Vec::new(),
            defaults: Vec::new(),
            direct_dep: n.clone(),
            is_optional: false,
            user_value: None,
            user_selection: None,
            dependents: Vec::new(),
            cache: ChoiceCache::default(),
            visited: Cell::new(0),
            was_set: false,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn orig_type(&self) -> SymbolType {
        self.orig_type
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Member symbols in definition order.
    pub fn syms(&self) -> &[SymbolId] {
        &self.syms
    }

    /// `(symbol, condition)` pairs from `default` lines.
    pub fn defaults(&self) -> &[(ExprRef, ExprRef)] {
        &self.defaults
    }

    pub fn direct_dep(&self) -> &ExprRef {
        &self.direct_dep
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    /// Mode assigned by the user.
    pub fn user_value(&self) -> Option<Tristate> {
        self.user_value
    }

    /// Member the user set to `y` most recently.
    pub fn user_selection(&self) -> Option<SymbolId> {
        self.user_selection
    }

    pub fn dependents(&self) -> &[Item] {
        &self.dependents
    }
}
