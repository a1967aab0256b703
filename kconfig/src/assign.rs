//! User values and cache invalidation.

use crate::{
    Kconfig,
    expr::{ChoiceId, Item, SymbolId},
    symbol::UserValue,
    tristate::{SymbolType, Tristate},
    util::parse_int,
};

impl Kconfig {
    /// Assigns a user value. `n`/`m`/`y` for bool and tristate symbols,
    /// any string for string symbols, a decimal or hex number for int and
    /// hex symbols.
    ///
    /// Returns `false`, with a warning, when the value is invalid for the
    /// type. A valid value is stored even if visibility or selects keep it
    /// from taking effect; it applies once they allow it.
    ///
    /// Setting a choice member to `y` makes it the choice's user selection.
    pub fn set_value(&mut self, sym: SymbolId, value: &str) -> bool {
        let s = &self.syms[sym.0];
        let orig_type = s.orig_type;
        let tri = Tristate::from_str_exact(value).filter(|_| orig_type.is_bool_or_tristate());
        let new = match tri {
            Some(t) => UserValue::Tri(t),
            None => UserValue::Str(value.to_string()),
        };

        // Choice members always go through, a y may change the selection
        if s.user_value.as_ref() == Some(&new) && s.choice.is_none() {
            self.syms[sym.0].was_set = true;
            return true;
        }

        let valid = match (orig_type, tri) {
            (SymbolType::Bool, Some(t)) => t != Tristate::M,
            (SymbolType::Tristate, Some(_)) => true,
            (SymbolType::String, _) => true,
            (SymbolType::Int, _) => parse_int(value, 10).is_some(),
            (SymbolType::Hex, _) => parse_int(value, 16).is_some_and(|v| v >= 0),
            _ => false,
        };
        if !valid {
            let shown = match tri {
                Some(t) => t.to_string(),
                None => format!("'{value}'"),
            };
            self.warn_msg(format!(
                "the value {shown} is invalid for {}, which has type {orig_type} -- assignment \
                 ignored",
                self.name_and_loc(Item::Sym(sym))
            ));
            return false;
        }

        let s = &mut self.syms[sym.0];
        s.user_value = Some(new);
        s.was_set = true;

        match (s.choice, tri) {
            (Some(choice), Some(Tristate::Y)) => {
                let c = &mut self.choices[choice.0];
                c.user_selection = Some(sym);
                c.was_set = true;
                self.rec_invalidate(Item::Choice(choice));
            }
            _ => self.rec_invalidate_if_has_prompt(sym),
        }
        true
    }

    /// Removes the user value, returning the symbol to its defaults.
    pub fn unset_value(&mut self, sym: SymbolId) {
        if self.syms[sym.0].user_value.take().is_some() {
            self.rec_invalidate_if_has_prompt(sym);
        }
    }

    /// Assigns the choice mode: `y` or `n` (optional choices only) for bool
    /// choices, also `m` for tristate ones.
    pub fn set_choice_value(&mut self, choice: ChoiceId, value: &str) -> bool {
        let c = &self.choices[choice.0];
        let tri = Tristate::from_str_exact(value);

        if tri.is_some() && tri == c.user_value {
            self.choices[choice.0].was_set = true;
            return true;
        }

        let valid = match (c.orig_type, tri) {
            (SymbolType::Bool, Some(t)) => t != Tristate::M,
            (SymbolType::Tristate, Some(_)) => true,
            _ => false,
        };
        let Some(tri) = tri.filter(|_| valid) else {
            let shown = match tri {
                Some(t) => t.to_string(),
                None => format!("'{value}'"),
            };
            self.warn_msg(format!(
                "the value {shown} is invalid for {}, which has type {} -- assignment ignored",
                self.name_and_loc(Item::Choice(choice)),
                c.orig_type
            ));
            return false;
        };

        let c = &mut self.choices[choice.0];
        c.user_value = Some(tri);
        c.was_set = true;
        self.rec_invalidate(Item::Choice(choice));
        true
    }

    /// Removes the user mode and the user selection.
    pub fn unset_choice_value(&mut self, choice: ChoiceId) {
        let c = &mut self.choices[choice.0];
        if c.user_value.is_some() || c.user_selection.is_some() {
            c.user_value = None;
            c.user_selection = None;
            self.rec_invalidate(Item::Choice(choice));
        }
    }

    /// Removes every user value, as if no `.config` had been loaded.
    pub fn unset_values(&mut self) {
        self.warn_assign_no_prompt = false;
        for sym in self.unique_defined_syms.clone() {
            self.unset_value(sym);
        }
        for choice in self.unique_choices.clone() {
            self.unset_choice_value(choice);
        }
        self.warn_assign_no_prompt = true;
    }

    fn rec_invalidate_if_has_prompt(&self, sym: SymbolId) {
        let s = &self.syms[sym.0];
        if s.nodes.iter().any(|n| self.nodes[n.0].prompt.is_some()) {
            self.rec_invalidate(Item::Sym(sym));
        } else if self.warn_assign_no_prompt {
            self.warn_msg(format!(
                "{} has no prompt, meaning user values have no effect on it",
                self.name_and_loc(Item::Sym(sym))
            ));
        }
    }

    /// Clears the cached values of `item` and of everything that depends on
    /// it. Dependents with nothing cached are skipped along with their own
    /// dependents, see [`crate::eval`].
    fn rec_invalidate(&self, item: Item) {
        if item == Item::Sym(self.modules) {
            self.invalidate_all();
            return;
        }

        let mut stack = vec![item];
        while let Some(item) = stack.pop() {
            self.clear_cache(item);
            for &dep in self.dependents(item) {
                let populated = match dep {
                    Item::Sym(s) => self.syms[s.0].cache.is_populated(),
                    Item::Choice(c) => self.choices[c.0].cache.is_populated(),
                };
                if populated {
                    stack.push(dep);
                }
            }
        }
    }

    fn clear_cache(&self, item: Item) {
        match item {
            Item::Sym(s) => self.syms[s.0].cache.clear(),
            Item::Choice(c) => self.choices[c.0].cache.clear(),
        }
    }

    /// Clears every cached value. Needed when `MODULES` changes, as it
    /// affects the type of every tristate item.
    pub(crate) fn invalidate_all(&self) {
        for &sym in &self.unique_defined_syms {
            self.syms[sym.0].cache.clear();
        }
        for &choice in &self.unique_choices {
            self.choices[choice.0].cache.clear();
        }
        // MODULES itself may be undefined
        self.syms[self.modules.0].cache.clear();
    }
}
