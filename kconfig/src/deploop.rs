//! Dependency loop detection.
//!
//! Runs once after parsing, over the dependents index, before any value is
//! computed. A depth-first search marks items as unvisited (0), on the
//! current path (1) or known loop-free (2). Running into an item on the
//! current path closes a loop, which is collected while unwinding.
//!
//! Choices need special care: every member depends on every other member
//! through the choice. A choice entered through one of its members visits
//! the other members only, and the members do not re-enter the choice.

use crate::{
    Kconfig, Result,
    error::Error,
    expr::{ChoiceId, Item, SymbolId},
};

/// Partial loop found on the way back from the recursion.
type Loop = Vec<Item>;

pub(crate) fn check_dep_loops(kconf: &Kconfig) -> Result<()> {
    for &sym in &kconf.unique_defined_syms {
        check_sym(kconf, sym, false)?;
    }
    for &choice in &kconf.unique_choices {
        check_choice(kconf, choice, None)?;
    }
    Ok(())
}

fn check_sym(kconf: &Kconfig, sym: SymbolId, ignore_choice: bool) -> Result<Option<Loop>> {
    let s = &kconf.syms[sym.0];
    match s.visited.get() {
        2 => return Ok(None),
        1 => return Ok(Some(vec![Item::Sym(sym)])),
        _ => {}
    }
    s.visited.set(1);

    for &dep in &s.dependents {
        let found = match dep {
            // A choice with the symbol in a prompt or default condition.
            // Not entered through a member, so all members are checked.
            Item::Choice(c) => check_choice(kconf, c, None)?,
            Item::Sym(d) => check_sym(kconf, d, false)?,
        };
        if let Some(found) = found {
            return found_loop(kconf, found, Item::Sym(sym)).map(Some);
        }
    }

    if let (Some(choice), false) = (s.choice, ignore_choice) {
        if let Some(found) = check_choice(kconf, choice, Some(sym))? {
            return found_loop(kconf, found, Item::Sym(sym)).map(Some);
        }
    }

    s.visited.set(2);
    Ok(None)
}

fn check_choice(kconf: &Kconfig, choice: ChoiceId, skip: Option<SymbolId>) -> Result<Option<Loop>> {
    let c = &kconf.choices[choice.0];
    match c.visited.get() {
        2 => return Ok(None),
        1 => return Ok(Some(vec![Item::Choice(choice)])),
        _ => {}
    }
    c.visited.set(1);

    for &sym in &c.syms {
        if Some(sym) == skip {
            continue;
        }
        if let Some(found) = check_sym(kconf, sym, true)? {
            return found_loop(kconf, found, Item::Choice(choice)).map(Some);
        }
    }

    c.visited.set(2);
    Ok(None)
}

/// Extends the partial loop with `cur`, or reports the loop once `cur` is
/// where it started.
fn found_loop(kconf: &Kconfig, mut lp: Loop, cur: Item) -> Result<Loop> {
    if lp[0] != cur {
        lp.push(cur);
        return Ok(lp);
    }
    Err(Error::DependencyLoop(loop_report(kconf, &lp)))
}

/// Renders a loop as a report listing each item with its definition.
///
/// Selects and implies show up as plain dependencies in the dependents
/// index, so reverse dependencies are printed for every symbol that has
/// them.
pub(crate) fn loop_report(kconf: &Kconfig, lp: &[Item]) -> String {
    let mut msg = String::from("\nDependency loop\n===============\n\n");

    for (i, &item) in lp.iter().enumerate() {
        if i != 0 {
            msg.push_str("...depends on ");
            if let Item::Sym(s) = item {
                if kconf.syms[s.0].choice.is_some() {
                    msg.push_str("the choice symbol ");
                }
            }
        }
        msg.push_str(&format!(
            "{}, with definition...\n\n{}\n\n",
            kconf.name_and_loc(item),
            kconf.item_definition(item)
        ));

        if let Item::Sym(s) = item {
            let sym = &kconf.syms[s.0];
            if !sym.rev_dep.is_n() {
                msg.push_str(&format!(
                    "(select-related dependencies: {})\n\n",
                    kconf.expr_str(&sym.rev_dep)
                ));
            }
            if !sym.weak_rev_dep.is_n() {
                msg.push_str(&format!(
                    "(imply-related dependencies: {})\n\n",
                    kconf.expr_str(&sym.weak_rev_dep)
                ));
            }
        }
    }

    msg.push_str(&format!("...depends again on {}", kconf.name_and_loc(lp[0])));
    msg
}

#[cfg(test)]
mod tests {
    use crate::{Error, Kconfig};

    #[test]
    fn test_self_loop_through_default() {
        let err = Kconfig::from_text(
            "config A\n\tbool \"a\"\n\tdefault B\nconfig B\n\tbool \"b\"\n\tdepends on A\n",
            "Kconfig",
        )
        .err()
        .unwrap();
        let Error::DependencyLoop(report) = &err else {
            panic!("expected a dependency loop, got {err}");
        };
        assert!(report.starts_with("\nDependency loop\n===============\n\n"));
        assert!(report.ends_with("...depends again on A (defined at Kconfig:1)"));
    }

    #[test]
    fn test_choice_members_are_not_a_loop() {
        let kconf = Kconfig::from_text(
            "choice\n\tprompt \"c\"\nconfig A\n\tbool \"a\"\nconfig B\n\tbool \"b\"\nendchoice\n",
            "Kconfig",
        );
        assert!(kconf.is_ok());
    }
}
