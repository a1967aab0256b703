//! `dump`: every symbol and choice with its computed state.

use kconfig::{Item, Kconfig};
use serde::Serialize;

use crate::ctx::AppContext;

#[derive(Debug, Serialize)]
pub struct SymbolDump {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: String,
    pub user_value: Option<String>,
    pub visibility: String,
    pub assignable: Vec<String>,
    pub choice: bool,
    pub defined_at: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChoiceDump {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    pub mode: String,
    pub selection: Option<String>,
    pub members: Vec<String>,
    pub defined_at: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Dump {
    pub mainmenu: String,
    pub symbols: Vec<SymbolDump>,
    pub choices: Vec<ChoiceDump>,
}

pub fn run(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    let kconf = ctx.load_kconfig_with_config()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&collect(&kconf))?);
    } else {
        for &sym in kconf.unique_defined_syms() {
            println!("{}", kconf.sym_repr(sym));
        }
        for &choice in kconf.unique_choices() {
            println!("{}", kconf.choice_repr(choice));
        }
    }
    Ok(())
}

fn locations(kconf: &Kconfig, item: Item) -> Vec<String> {
    kconf
        .item_nodes(item)
        .iter()
        .map(|&n| format!("{}:{}", kconf.node(n).filename(), kconf.node(n).linenr()))
        .collect()
}

pub fn collect(kconf: &Kconfig) -> Dump {
    let symbols = kconf
        .unique_defined_syms()
        .iter()
        .map(|&sym| {
            let s = kconf.sym(sym);
            SymbolDump {
                name: s.name().to_string(),
                ty: kconf.sym_type(sym).to_string(),
                value: kconf.str_value(sym),
                user_value: s.user_value().map(|v| v.as_str().to_string()),
                visibility: kconf.visibility(sym).to_string(),
                assignable: kconf
                    .assignable(sym)
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                choice: s.choice().is_some(),
                defined_at: locations(kconf, Item::Sym(sym)),
            }
        })
        .collect();

    let choices = kconf
        .unique_choices()
        .iter()
        .map(|&choice| {
            let c = kconf.choice(choice);
            ChoiceDump {
                name: c.name().map(str::to_string),
                ty: kconf.choice_type(choice).to_string(),
                mode: kconf.choice_tri_value(choice).to_string(),
                selection: kconf
                    .choice_selection(choice)
                    .map(|s| kconf.sym(s).name().to_string()),
                members: c.syms().iter().map(|&s| kconf.sym(s).name().to_string()).collect(),
                defined_at: locations(kconf, Item::Choice(choice)),
            }
        })
        .collect();

    Dump {
        mainmenu: kconf.mainmenu_text().to_string(),
        symbols,
        choices,
    }
}
