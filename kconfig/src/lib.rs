//! # kconfig
//!
//! A Kconfig parser and configuration engine.
//!
//! Parses Kconfig description files into a menu tree of symbols, choices,
//! menus and comments, computes tristate values from dependencies, defaults,
//! selects and implies, and reads and writes `.config` files.
//!
//! ## Features
//!
//! - Full Kconfig syntax: `source` variants with globbing, `if` blocks,
//!   implicit menus, `choice`, `menuconfig`, `imply`, `range`, macros
//! - Lazily computed values with dependency-driven cache invalidation
//! - Dependency loop detection with a readable report
//! - `.config`, minimal config and C header output
//! - A backend-independent menuconfig front end
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kconfig::{Kconfig, Tristate};
//!
//! let mut kconf = Kconfig::load("Kconfig").unwrap();
//! kconf.load_config(None, true).unwrap();
//!
//! let sym = kconf.lookup("NET").unwrap();
//! if kconf.assignable(sym).contains(&Tristate::Y) {
//!     kconf.set_value(sym, "y");
//! }
//! println!("{}", kconf.write_config(None, None, true).unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`ui`] - Terminal abstraction and the menuconfig state machine

#[macro_use]
extern crate log;

mod assign;
mod choice;
mod conf;
mod deploop;
mod display;
mod error;
mod eval;
mod expr;
mod finalize;
mod kconfig;
mod menu;
mod parser;
mod symbol;
mod tristate;
mod util;

/// Terminal abstraction and the menuconfig front end.
///
/// Nothing here depends on a particular terminal library; hosts implement
/// [`ui::Terminal`] for their backend.
pub mod ui;

pub use choice::Choice;
pub use conf::standard_config_filename;
pub use error::{Error, Location, Result};
pub use expr::{
    BinOp, ChoiceId, Expr, ExprRef, Item, RelOp, SymbolId, expr_items, join_expr, make_and,
    make_or, split_expr,
};
pub use kconfig::{Kconfig, LoadOptions, WarnFlags};
pub use menu::{MenuItem, MenuNode, NodeId, NodeIter};
pub use parser::{DefaultPreprocessor, Preprocessor};
pub use symbol::{Symbol, UserValue};
pub use tristate::{SymbolType, Tristate};
pub use util::{escape, unescape};
