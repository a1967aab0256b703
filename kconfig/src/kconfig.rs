//! The configuration context.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    env,
    path::{Path, PathBuf},
};

use crate::{
    Result,
    choice::Choice,
    error::Error,
    expr::{ChoiceId, Expr, ExprRef, Item, SymbolId},
    finalize,
    menu::{MenuItem, MenuNode, NodeId, NodeIter},
    parser::{self, DefaultPreprocessor, Preprocessor},
    symbol::Symbol,
    tristate::SymbolType,
};

/// Switches for the warning classes. All but `assign_undef` start enabled.
#[derive(Debug, Clone)]
pub struct WarnFlags {
    /// Master switch. When off nothing is recorded or logged.
    pub enabled: bool,
    /// Assignments to undefined symbols in `.config` files.
    pub assign_undef: bool,
    /// A `.config` file assigning a symbol twice with different values.
    pub assign_override: bool,
    /// A `.config` file assigning a symbol twice with the same value.
    pub assign_redun: bool,
}

impl Default for WarnFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            assign_undef: env::var("KCONFIG_WARN_UNDEF_ASSIGN").is_ok_and(|v| v == "y"),
            assign_override: true,
            assign_redun: true,
        }
    }
}

/// Knobs for [`Kconfig::load_with`].
pub struct LoadOptions {
    /// Base directory for the top file and `source` statements. Defaults to
    /// `$srctree`.
    pub srctree: Option<PathBuf>,
    pub warn: WarnFlags,
    /// Replaces the built-in macro expander.
    pub preprocessor: Option<Box<dyn Preprocessor>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            srctree: env::var_os("srctree")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            warn: WarnFlags::default(),
            preprocessor: None,
        }
    }
}

/// A parsed Kconfig description together with its current values.
///
/// Every symbol, choice and menu node lives in an arena owned by this struct
/// and is addressed by a copyable handle ([`SymbolId`], [`ChoiceId`],
/// [`NodeId`]). Computed values are cached and invalidated when assignments
/// change something they depend on.
///
/// The context is not thread safe; share it behind a lock if needed.
pub struct Kconfig {
    pub(crate) syms: Vec<Symbol>,
    pub(crate) choices: Vec<Choice>,
    pub(crate) nodes: Vec<MenuNode>,

    pub(crate) sym_table: HashMap<String, SymbolId>,
    pub(crate) const_table: HashMap<String, SymbolId>,
    pub(crate) named_choices: HashMap<String, ChoiceId>,
    /// Names referenced by expressions evaluated after parsing.
    pub(crate) unknown_syms: HashMap<String, SymbolId>,

    pub(crate) y: ExprRef,
    pub(crate) n: ExprRef,

    pub(crate) top_node: NodeId,
    pub(crate) modules: SymbolId,
    pub(crate) defconfig_list: Option<SymbolId>,

    pub(crate) defined_syms: Vec<SymbolId>,
    pub(crate) unique_defined_syms: Vec<SymbolId>,
    pub(crate) choice_defs: Vec<ChoiceId>,
    pub(crate) unique_choices: Vec<ChoiceId>,
    pub(crate) menus: Vec<NodeId>,
    pub(crate) comments: Vec<NodeId>,

    pub(crate) kconfig_filenames: Vec<String>,
    pub(crate) env_vars: BTreeSet<String>,
    pub(crate) missing_syms: Vec<(String, String)>,

    pub(crate) srctree: Option<PathBuf>,
    pub(crate) config_prefix: String,
    pub(crate) config_header: String,
    pub(crate) header_header: String,

    /// Warning switches. May be changed at any time.
    pub warn: WarnFlags,
    pub(crate) warn_assign_no_prompt: bool,
    pub(crate) warnings: RefCell<Vec<String>>,

    pub(crate) parsing: bool,
}

impl Kconfig {
    /// Parses the Kconfig tree rooted at `path` (relative to `$srctree`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, LoadOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, opts: LoadOptions) -> Result<Self> {
        let filename = path.as_ref().to_string_lossy().into_owned();
        let (mut kconf, mut pp) = Self::empty(opts, &filename);
        let full = kconf.resolve_path(Path::new(&filename));
        let text = std::fs::read_to_string(&full).map_err(|e| Error::io(&full, e))?;
        parser::parse(&mut kconf, &filename, &text, pp.as_mut())?;
        kconf.env_vars.extend(pp.env_vars());
        finalize::finalize(&mut kconf)?;
        Ok(kconf)
    }

    /// Parses Kconfig text held in memory. `filename` is used in locations
    /// and as the base for `rsource`.
    pub fn from_text(text: &str, filename: &str) -> Result<Self> {
        Self::from_text_with(text, filename, LoadOptions::default())
    }

    pub fn from_text_with(text: &str, filename: &str, opts: LoadOptions) -> Result<Self> {
        let (mut kconf, mut pp) = Self::empty(opts, filename);
        parser::parse(&mut kconf, filename, text, pp.as_mut())?;
        kconf.env_vars.extend(pp.env_vars());
        finalize::finalize(&mut kconf)?;
        Ok(kconf)
    }

    fn empty(opts: LoadOptions, filename: &str) -> (Self, Box<dyn Preprocessor>) {
        let n = Expr::sym(SymbolId::N);
        let y = Expr::sym(SymbolId::Y);

        let mut syms = Vec::new();
        let mut const_table = HashMap::new();
        for name in ["n", "m", "y"] {
            let mut sym = Symbol::new(name, true, &n);
            sym.orig_type = SymbolType::Tristate;
            const_table.insert(name.to_string(), SymbolId(syms.len()));
            syms.push(sym);
        }

        let mut top = MenuNode::new(MenuItem::Menu, &y, filename, 1);
        top.prompt = Some(("Main menu".to_string(), y.clone()));
        top.is_menuconfig = true;

        let config_prefix = env::var("CONFIG_").unwrap_or_else(|_| "CONFIG_".to_string());

        let mut kconf = Self {
            syms,
            choices: Vec::new(),
            nodes: vec![top],
            sym_table: HashMap::new(),
            const_table,
            named_choices: HashMap::new(),
            unknown_syms: HashMap::new(),
            y,
            n,
            top_node: NodeId(0),
            modules: SymbolId::N,
            defconfig_list: None,
            defined_syms: Vec::new(),
            unique_defined_syms: Vec::new(),
            choice_defs: Vec::new(),
            unique_choices: Vec::new(),
            menus: Vec::new(),
            comments: Vec::new(),
            kconfig_filenames: vec![filename.to_string()],
            env_vars: BTreeSet::new(),
            missing_syms: Vec::new(),
            srctree: opts.srctree,
            config_prefix,
            config_header: env::var("KCONFIG_CONFIG_HEADER").unwrap_or_default(),
            header_header: env::var("KCONFIG_AUTOHEADER_HEADER").unwrap_or_default(),
            warn: opts.warn,
            warn_assign_no_prompt: true,
            warnings: RefCell::new(Vec::new()),
            parsing: true,
        };
        kconf.modules = kconf.lookup_or_create("MODULES");

        let pp = opts
            .preprocessor
            .unwrap_or_else(|| Box::new(DefaultPreprocessor::new()));
        (kconf, pp)
    }

    /// Joins relative paths onto `$srctree`.
    pub(crate) fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.srctree {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Returns the symbol `name`, creating it if it does not exist yet.
    ///
    /// Outside of parsing the new symbol is not registered in the symbol
    /// table, so it stays invisible to [`lookup`](Self::lookup).
    pub(crate) fn lookup_or_create(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.sym_table.get(name) {
            return *id;
        }
        if let Some(id) = self.unknown_syms.get(name) {
            self.warn_msg(format!("no symbol {name} in configuration"));
            return *id;
        }
        let id = SymbolId(self.syms.len());
        self.syms.push(Symbol::new(name, false, &self.n));
        if self.parsing {
            self.sym_table.insert(name.to_string(), id);
        } else {
            self.warn_msg(format!("no symbol {name} in configuration"));
            self.unknown_syms.insert(name.to_string(), id);
        }
        id
    }

    /// Returns the constant symbol with value `name`.
    pub(crate) fn lookup_const(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.const_table.get(name) {
            return *id;
        }
        let id = SymbolId(self.syms.len());
        self.syms.push(Symbol::new(name, true, &self.n));
        self.const_table.insert(name.to_string(), id);
        id
    }

    pub(crate) fn warn_msg(&self, msg: impl AsRef<str>) {
        self.warn_at(msg, None);
    }

    /// Records a warning, prefixed with `file:line: ` when a location is
    /// given.
    pub(crate) fn warn_at(&self, msg: impl AsRef<str>, loc: Option<(&str, usize)>) {
        if !self.warn.enabled {
            return;
        }
        let mut msg = format!("warning: {}", msg.as_ref());
        if let Some((file, line)) = loc {
            msg = format!("{file}:{line}: {msg}");
        }
        let mut warnings = self.warnings.borrow_mut();
        if warnings.contains(&msg) {
            return;
        }
        warn!("{msg}");
        warnings.push(msg);
    }

    /// Looks up a non-constant symbol by name.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.sym_table.get(name).copied()
    }

    /// Like [`lookup`](Self::lookup), but for quoted constants and `n`/`m`/`y`.
    pub fn lookup_const_sym(&self, name: &str) -> Option<SymbolId> {
        self.const_table.get(name).copied()
    }

    pub fn named_choice(&self, name: &str) -> Option<ChoiceId> {
        self.named_choices.get(name).copied()
    }

    pub fn sym(&self, id: SymbolId) -> &Symbol {
        &self.syms[id.0]
    }

    pub fn choice(&self, id: ChoiceId) -> &Choice {
        &self.choices[id.0]
    }

    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.0]
    }

    /// All non-constant symbols by name, defined or merely referenced.
    pub fn syms(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.sym_table.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Defined symbols in definition order, each once.
    pub fn unique_defined_syms(&self) -> &[SymbolId] {
        &self.unique_defined_syms
    }

    /// Choices in definition order, each once.
    pub fn unique_choices(&self) -> &[ChoiceId] {
        &self.unique_choices
    }

    pub fn menus(&self) -> &[NodeId] {
        &self.menus
    }

    pub fn comments(&self) -> &[NodeId] {
        &self.comments
    }

    pub fn top_node(&self) -> NodeId {
        self.top_node
    }

    /// The symbol gating `m` values. `MODULES` unless `option modules` says
    /// otherwise.
    pub fn modules(&self) -> SymbolId {
        self.modules
    }

    pub fn defconfig_list(&self) -> Option<SymbolId> {
        self.defconfig_list
    }

    pub fn mainmenu_text(&self) -> &str {
        self.nodes[self.top_node.0]
            .prompt_text()
            .unwrap_or("Main menu")
    }

    /// Every Kconfig file parsed, top file first.
    pub fn kconfig_filenames(&self) -> &[String] {
        &self.kconfig_filenames
    }

    /// Environment variables referenced from the Kconfig files.
    pub fn env_vars(&self) -> &BTreeSet<String> {
        &self.env_vars
    }

    /// `(name, value)` assignments to unknown symbols seen while loading
    /// `.config` files.
    pub fn missing_syms(&self) -> &[(String, String)] {
        &self.missing_syms
    }

    pub fn srctree(&self) -> Option<&Path> {
        self.srctree.as_deref()
    }

    /// Prefix of symbol names in `.config` files and headers.
    pub fn config_prefix(&self) -> &str {
        &self.config_prefix
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub fn clear_warnings(&self) {
        self.warnings.borrow_mut().clear();
    }

    /// The constant `y` expression. Unconditional properties use this.
    pub fn y(&self) -> &ExprRef {
        &self.y
    }

    pub fn n(&self) -> &ExprRef {
        &self.n
    }

    /// Preorder walk over the menu tree.
    ///
    /// With `unique_syms` every symbol is reported at its first node only.
    pub fn node_iter(&self, unique_syms: bool) -> NodeIter<'_> {
        NodeIter::new(self, unique_syms)
    }

    /// Items that must be recomputed when `item` changes.
    pub fn dependents(&self, item: Item) -> &[Item] {
        match item {
            Item::Sym(s) => &self.syms[s.0].dependents,
            Item::Choice(c) => &self.choices[c.0].dependents,
        }
    }

    /// Menu nodes of a symbol or choice.
    pub fn item_nodes(&self, item: Item) -> &[NodeId] {
        match item {
            Item::Sym(s) => &self.syms[s.0].nodes,
            Item::Choice(c) => &self.choices[c.0].nodes,
        }
    }

    /// Symbols and choices referenced by the properties of `node`.
    pub fn node_referenced(&self, node: NodeId) -> Vec<Item> {
        use crate::expr::expr_items;

        let n = &self.nodes[node.0];
        let mut res = expr_items(&n.dep);
        let mut add = |items: Vec<Item>| {
            for item in items {
                if !res.contains(&item) {
                    res.push(item);
                }
            }
        };
        if let Some((_, cond)) = &n.prompt {
            add(expr_items(cond));
        }
        if n.item == MenuItem::Menu {
            add(expr_items(&n.visibility));
        }
        for (value, cond) in &n.defaults {
            add(expr_items(value));
            add(expr_items(cond));
        }
        for (target, cond) in n.selects.iter().chain(&n.implies) {
            add(vec![Item::Sym(*target)]);
            add(expr_items(cond));
        }
        for (low, high, cond) in &n.ranges {
            add(vec![Item::Sym(*low), Item::Sym(*high)]);
            add(expr_items(cond));
        }
        res
    }

    /// Union of [`node_referenced`](Self::node_referenced) over every
    /// definition of `sym`.
    pub fn sym_referenced(&self, sym: SymbolId) -> Vec<Item> {
        let mut res = Vec::new();
        for node in &self.syms[sym.0].nodes {
            for item in self.node_referenced(*node) {
                if !res.contains(&item) {
                    res.push(item);
                }
            }
        }
        res
    }
}
