//! Interactive configuration editor.
//!
//! [`MenuConfig`] is a state machine over the menu tree: keys go in through
//! [`handle_key`](MenuConfig::handle_key), frames come out through
//! [`render`](MenuConfig::render). [`run`](MenuConfig::run) ties both to a
//! [`Terminal`].

use std::{
    collections::HashSet,
    env, io,
    path::{Path, PathBuf},
};

use regex::Regex;

use super::{Color, Key, Region, Screen, Style, Terminal, str_width};
use crate::{
    Kconfig,
    expr::{BinOp, Item, SymbolId, split_expr},
    menu::{MenuItem, NodeId},
    tristate::{SymbolType, Tristate},
};

const SUBMENU_INDENT: usize = 4;

const TITLE_STYLE: Style = Style::new(Color::White, Color::Blue).bold();
const PATH_STYLE: Style = Style::new(Color::Cyan, Color::Default);
const LIST_STYLE: Style = Style::new(Color::Default, Color::Default);
const SELECTED_STYLE: Style = Style::new(Color::Default, Color::Default).reverse();
const INVISIBLE_STYLE: Style = Style::new(Color::Grey, Color::Default);
const STATUS_STYLE: Style = Style::new(Color::Black, Color::White);
const DIALOG_STYLE: Style = Style::new(Color::Black, Color::White);
const DIALOG_BORDER_STYLE: Style = Style::new(Color::Blue, Color::White).bold();

/// A line in the menu list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub node: NodeId,
    /// Nesting level inside implicit submenus.
    pub indent: usize,
    /// False for rows only shown in show-all mode, and for hidden symbols
    /// kept in the list because something below them is shown.
    pub visible: bool,
}

/// Text being edited, with the cursor position in characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LineEdit {
    buf: String,
    cursor: usize,
}

impl LineEdit {
    fn new(buf: impl Into<String>) -> Self {
        let buf = buf.into();
        let cursor = buf.chars().count();
        Self { buf, cursor }
    }

    fn byte_at(&self, c: usize) -> usize {
        self.buf.char_indices().nth(c).map_or(self.buf.len(), |(i, _)| i)
    }

    /// Display column of the cursor.
    fn cursor_col(&self) -> usize {
        str_width(&self.buf[..self.byte_at(self.cursor)])
    }

    /// Applies an editing key. False for keys that do not edit.
    fn key(&mut self, key: Key) -> bool {
        let len = self.buf.chars().count();
        match key {
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(len),
            Key::Home => self.cursor = 0,
            Key::End => self.cursor = len,
            Key::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let i = self.byte_at(self.cursor);
                    self.buf.remove(i);
                }
            }
            Key::Delete => {
                if self.cursor < len {
                    let i = self.byte_at(self.cursor);
                    self.buf.remove(i);
                }
            }
            Key::Char(c) => {
                let i = self.byte_at(self.cursor);
                self.buf.insert(i, c);
                self.cursor += 1;
            }
            _ => return false,
        }
        true
    }
}

/// What the text entered in the input dialog is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Value(SymbolId),
    Load,
    Save,
    SaveMin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Menu,
    Info {
        node: NodeId,
        scroll: usize,
    },
    Input {
        target: Input,
        line: LineEdit,
    },
    Search {
        line: LineEdit,
        sel: usize,
        scroll: usize,
    },
    ConfirmQuit,
    ConfirmLoad,
    Message(String),
}

/// Menu position kept while a submenu is open.
#[derive(Debug, Clone, Copy)]
struct Level {
    menu: NodeId,
    sel: usize,
    scroll: usize,
}

pub struct MenuConfig {
    kconf: Kconfig,
    config_path: PathBuf,
    header: Option<String>,
    stack: Vec<Level>,
    cur: Level,
    mode: Mode,
    show_all: bool,
    show_name: bool,
    needs_save: bool,
    done: bool,
    list_height: usize,
}

impl MenuConfig {
    /// Starts at the top menu. `config_path` is where `s` saves to.
    ///
    /// Starts out with unsaved changes if saving would change what was
    /// loaded into `kconf`.
    pub fn new(kconf: Kconfig, config_path: impl Into<PathBuf>) -> Self {
        let top = kconf.top_node();
        let needs_save = kconf.config_outdated();
        Self {
            kconf,
            config_path: config_path.into(),
            header: None,
            stack: Vec::new(),
            cur: Level {
                menu: top,
                sel: 0,
                scroll: 0,
            },
            mode: Mode::Menu,
            show_all: false,
            show_name: false,
            needs_save,
            done: false,
            list_height: 20,
        }
    }

    /// Header written at the top of saved configuration files, instead of
    /// `$KCONFIG_CONFIG_HEADER`.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn kconf(&self) -> &Kconfig {
        &self.kconf
    }

    pub fn into_kconfig(self) -> Kconfig {
        self.kconf
    }

    /// True when values changed since the last save.
    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn current_menu(&self) -> NodeId {
        self.cur.menu
    }

    /// File that `s` and the quit dialog save to.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Runs until the user quits.
    pub fn run(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        let (w, h) = term.size()?;
        let mut screen = Screen::new(w, h);
        loop {
            self.list_height = usize::from(screen.height()).saturating_sub(3).max(1);
            self.fix_scroll();
            screen.clear_regions();
            self.render(&mut screen);
            screen.flush(term)?;
            if self.done {
                return Ok(());
            }
            match term.read_key()? {
                Key::Resize(w, h) => screen.resize(w, h),
                key => self.handle_key(key),
            }
        }
    }

    fn node_visible(&self, node: NodeId) -> bool {
        let n = self.kconf.node(node);
        let Some((_, cond)) = n.prompt() else {
            return false;
        };
        self.kconf.eval(cond) != Tristate::N
            && (n.item() != MenuItem::Menu || self.kconf.eval(n.visibility()) != Tristate::N)
    }

    fn is_transitional(&self, node: NodeId) -> bool {
        match self.kconf.node(node).item() {
            MenuItem::Symbol(s) => self.kconf.sym(s).is_transitional(),
            _ => false,
        }
    }

    /// Nodes with their own menu: menus, choices and `menuconfig` symbols.
    fn is_menu_like(&self, node: NodeId) -> bool {
        self.kconf.node(node).is_menuconfig()
    }

    /// The menu `node` is listed in.
    fn parent_menu(&self, node: NodeId) -> NodeId {
        let mut cur = self.kconf.node(node).parent();
        while let Some(p) = cur {
            if self.kconf.node(p).is_menuconfig() {
                return p;
            }
            cur = self.kconf.node(p).parent();
        }
        self.kconf.top_node()
    }

    /// Rows of `menu`, with children of plain symbols (implicit submenus)
    /// shown indented below them.
    ///
    /// A choice lists the members from every location it is defined at,
    /// each symbol once. Prompts from `menu` itself win.
    pub fn rows_of(&self, menu: NodeId) -> Vec<Row> {
        let n = self.kconf.node(menu);
        let here = self.shown_rows(n.list(), 0);
        let MenuItem::Choice(choice) = n.item() else {
            return here;
        };
        let locations = self.kconf.choice(choice).nodes();
        if locations.len() <= 1 || !locations.contains(&menu) {
            return here;
        }

        let mut seen: HashSet<SymbolId> = here
            .iter()
            .filter_map(|r| self.kconf.node(r.node).sym())
            .collect();
        let mut rows = Vec::new();
        for &loc in locations {
            if loc == menu {
                rows.extend_from_slice(&here);
                continue;
            }
            for row in self.shown_rows(self.kconf.node(loc).list(), 0) {
                match self.kconf.node(row.node).sym() {
                    Some(sym) if !seen.insert(sym) => {}
                    _ => rows.push(row),
                }
            }
        }
        rows
    }

    fn shown_rows(&self, first: Option<NodeId>, indent: usize) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut node = first;
        while let Some(id) = node {
            let n = self.kconf.node(id);
            node = n.next();
            if self.is_transitional(id) {
                continue;
            }

            let visible = self.node_visible(id);
            if visible || self.show_all {
                rows.push(Row {
                    node: id,
                    indent,
                    visible,
                });
                if !n.is_menuconfig() {
                    rows.extend(self.shown_rows(n.list(), indent + 1));
                }
            } else if n.list().is_some() && n.sym().is_some() {
                // A symbol with a disabled optional prompt can still have
                // visible children. Keep it so they have somewhere to hang.
                let children = self.shown_rows(n.list(), indent + 1);
                if !children.is_empty() {
                    rows.push(Row {
                        node: id,
                        indent,
                        visible: false,
                    });
                    if !n.is_menuconfig() {
                        rows.extend(children);
                    }
                }
            }
        }
        rows
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows_of(self.cur.menu)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.rows().get(self.cur.sel).map(|r| r.node)
    }

    /// Moves the selection to `node` if it is in the current list.
    fn select(&mut self, node: NodeId) -> bool {
        match self.rows().iter().position(|r| r.node == node) {
            Some(pos) => {
                self.cur.sel = pos;
                true
            }
            None => false,
        }
    }

    fn is_y_mode_choice_sym(&self, sym: SymbolId) -> bool {
        self.kconf
            .sym(sym)
            .choice()
            .is_some_and(|c| self.kconf.choice_tri_value(c) == Tristate::Y)
    }

    /// The value indicator: `[*]`, `<M>`, `-*-` (pinned), `(X)` (choice
    /// member), `(text)` for string, int and hex symbols.
    fn value_str(&self, node: NodeId) -> String {
        let kconf = &self.kconf;
        let (tri, assignable, ty) = match kconf.node(node).item() {
            MenuItem::Symbol(sym) => {
                let orig = kconf.sym(sym).orig_type();
                if orig == SymbolType::Unknown {
                    return String::new();
                }
                if !orig.is_bool_or_tristate() {
                    return format!("({})", kconf.str_value(sym));
                }
                if self.is_y_mode_choice_sym(sym) {
                    let selected = kconf
                        .sym(sym)
                        .choice()
                        .and_then(|c| kconf.choice_selection(c))
                        == Some(sym);
                    return if selected { "(X)" } else { "( )" }.to_string();
                }
                (kconf.tri_value(sym), kconf.assignable(sym), kconf.sym_type(sym))
            }
            MenuItem::Choice(c) => {
                let assignable = kconf.choice_assignable(c);
                if assignable.len() <= 1 {
                    return String::new();
                }
                (kconf.choice_tri_value(c), assignable, kconf.choice_type(c))
            }
            MenuItem::Menu | MenuItem::Comment => return String::new(),
        };

        let ch = match tri {
            Tristate::N => ' ',
            Tristate::M => 'M',
            Tristate::Y => '*',
        };
        if assignable.len() <= 1 {
            format!("-{ch}-")
        } else if ty == SymbolType::Bool {
            format!("[{ch}]")
        } else if assignable == [Tristate::M, Tristate::Y] {
            format!("{{{ch}}}")
        } else {
            format!("<{ch}>")
        }
    }

    /// Full text of a menu row, e.g. `[*] Enable networking (NEW)`.
    pub fn row_text(&self, row: &Row) -> String {
        let kconf = &self.kconf;
        let n = kconf.node(row.node);
        let width = 3 + SUBMENU_INDENT * row.indent;
        let mut s = format!("{:<width$}", self.value_str(row.node));

        // Promptless nodes only show up in show-all mode
        if n.prompt().is_none() || self.show_name {
            match n.item() {
                MenuItem::Symbol(sym) => s.push_str(&format!(" <{}>", kconf.sym(sym).name())),
                MenuItem::Choice(c) => {
                    s.push(' ');
                    s.push_str(&kconf.item_str(Item::Choice(c)));
                }
                MenuItem::Menu | MenuItem::Comment => {}
            }
        }

        if let Some(prompt) = n.prompt_text() {
            match n.item() {
                MenuItem::Comment => s.push_str(&format!(" *** {prompt} ***")),
                _ => {
                    s.push(' ');
                    s.push_str(prompt);
                }
            }
            if let MenuItem::Symbol(sym) = n.item() {
                let symbol = kconf.sym(sym);
                if symbol.user_value().is_none()
                    && symbol.orig_type() != SymbolType::Unknown
                    && !self.is_y_mode_choice_sym(sym)
                {
                    s.push_str(" (NEW)");
                }
            }
        }

        if let MenuItem::Choice(c) = n.item() {
            if kconf.choice_tri_value(c) == Tristate::Y {
                // The member's prompt at this location, or any prompt it has
                let selected = kconf.choice_selection(c).and_then(|sel| {
                    let nodes = kconf.sym(sel).nodes();
                    nodes
                        .iter()
                        .filter(|sn| kconf.node(**sn).parent() == Some(row.node))
                        .chain(nodes)
                        .find_map(|sn| kconf.node(*sn).prompt_text())
                });
                if let Some(text) = selected {
                    s.push_str(&format!(" ({text})"));
                }
            }
        }

        if self.is_menu_like(row.node) {
            s.push_str(if self.rows_of(row.node).is_empty() {
                "  ----"
            } else {
                "  --->"
            });
        }
        s
    }

    /// `Main menu > Networking > Drivers`
    fn menu_path(&self) -> String {
        self.stack
            .iter()
            .map(|l| l.menu)
            .chain(std::iter::once(self.cur.menu))
            .map(|m| self.kconf.node(m).prompt_text().unwrap_or("").to_string())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    fn fix_scroll(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.cur.sel = 0;
        } else if self.cur.sel >= len {
            self.cur.sel = len - 1;
        }
        if self.cur.sel < self.cur.scroll {
            self.cur.scroll = self.cur.sel;
        } else if self.cur.sel >= self.cur.scroll + self.list_height {
            self.cur.scroll = self.cur.sel + 1 - self.list_height;
        }
    }

    pub fn handle_key(&mut self, key: Key) {
        match std::mem::replace(&mut self.mode, Mode::Menu) {
            Mode::Menu => self.menu_key(key),
            Mode::Info { node, scroll } => self.info_key(node, scroll, key),
            Mode::Input { target, line } => self.input_key(target, line, key),
            Mode::Search { line, sel, scroll } => self.search_key(line, sel, scroll, key),
            Mode::ConfirmQuit => self.confirm_quit_key(key),
            Mode::ConfirmLoad => self.confirm_load_key(key),
            // Any key dismisses a message
            Mode::Message(_) => {}
        }
        self.fix_scroll();
    }

    fn menu_key(&mut self, key: Key) {
        let len = self.rows().len();
        let page = self.list_height.max(1);
        match key {
            Key::Up | Key::Char('k') => self.cur.sel = self.cur.sel.saturating_sub(1),
            Key::Down | Key::Char('j') => {
                if self.cur.sel + 1 < len {
                    self.cur.sel += 1;
                }
            }
            Key::PageUp => self.cur.sel = self.cur.sel.saturating_sub(page),
            Key::PageDown => self.cur.sel = (self.cur.sel + page).min(len.saturating_sub(1)),
            Key::Home => self.cur.sel = 0,
            Key::End => self.cur.sel = len.saturating_sub(1),
            Key::Enter | Key::Right | Key::Char('l') => {
                if let Some(node) = self.selected() {
                    if self.is_menu_like(node) {
                        if !self.rows_of(node).is_empty() {
                            self.enter(node);
                        }
                    } else if key == Key::Enter {
                        self.change_node(node);
                    }
                }
            }
            Key::Char(' ') => {
                if let Some(node) = self.selected() {
                    self.change_node(node);
                }
            }
            Key::Char(c @ ('y' | 'm' | 'n')) => {
                if let (Some(node), Some(tri)) =
                    (self.selected(), Tristate::from_str_exact(&c.to_string()))
                {
                    self.set_tri(node, tri);
                }
            }
            Key::Esc | Key::Left | Key::Char('h') => {
                if !self.leave() {
                    self.request_quit();
                }
            }
            Key::Char('?') => {
                if let Some(node) = self.selected() {
                    self.mode = Mode::Info { node, scroll: 0 };
                }
            }
            Key::Char('/') => {
                self.mode = Mode::Search {
                    line: LineEdit::default(),
                    sel: 0,
                    scroll: 0,
                }
            }
            Key::Char('a' | 'A' | 'z' | 'Z') => {
                let keep = self.selected();
                self.show_all = !self.show_all;
                if let Some(node) = keep {
                    self.select(node);
                }
            }
            Key::Char('c' | 'C') => self.show_name = !self.show_name,
            Key::Char('o' | 'O') => {
                if self.needs_save {
                    self.mode = Mode::ConfirmLoad;
                } else {
                    self.open_load_dialog();
                }
            }
            Key::Char('s' | 'S') => {
                self.mode = Mode::Input {
                    target: Input::Save,
                    line: LineEdit::new(self.config_path.display().to_string()),
                }
            }
            Key::Char('d' | 'D') => {
                self.mode = Mode::Input {
                    target: Input::SaveMin,
                    line: LineEdit::new("defconfig"),
                }
            }
            Key::Char('q' | 'Q') => self.request_quit(),
            _ => {}
        }
    }

    fn enter(&mut self, node: NodeId) {
        self.stack.push(self.cur);
        self.cur = Level {
            menu: node,
            sel: 0,
            scroll: 0,
        };
        self.select_choice_selection();
    }

    /// In a choice, moves the selection to the selected member.
    fn select_choice_selection(&mut self) {
        if let MenuItem::Choice(c) = self.kconf.node(self.cur.menu).item() {
            if let Some(sel) = self.kconf.choice_selection(c) {
                if let Some(pos) = self
                    .rows()
                    .iter()
                    .position(|r| self.kconf.node(r.node).sym() == Some(sel))
                {
                    self.cur.sel = pos;
                }
            }
        }
    }

    /// Returns to the parent menu. False at the top.
    fn leave(&mut self) -> bool {
        match self.stack.pop() {
            Some(level) => {
                self.cur = level;
                true
            }
            None => false,
        }
    }

    /// Shows `node` selected in the menu that lists it. A non-empty menu or
    /// choice is entered instead. Turns on show-all when the node would be
    /// hidden otherwise.
    pub fn jump_to(&mut self, node: NodeId) {
        let n = self.kconf.node(node);
        let jump_into =
            matches!(n.item(), MenuItem::Menu | MenuItem::Choice(_)) && n.list().is_some();
        let menu = if jump_into {
            node
        } else {
            self.parent_menu(node)
        };

        self.cur = Level {
            menu,
            sel: 0,
            scroll: 0,
        };
        if jump_into {
            if self.rows().is_empty() {
                self.show_all = true;
            }
            self.select_choice_selection();
        } else if !self.select(node) {
            self.show_all = true;
            self.select(node);
        }

        // Rebuild the way back up, with each parent selecting the way down
        let mut chain = Vec::new();
        let mut child = menu;
        while child != self.kconf.top_node() {
            let parent = self.parent_menu(child);
            chain.push((parent, child));
            child = parent;
        }
        self.stack = chain
            .into_iter()
            .rev()
            .map(|(parent, child)| Level {
                menu: parent,
                sel: self
                    .rows_of(parent)
                    .iter()
                    .position(|r| r.node == child)
                    .unwrap_or(0),
                scroll: 0,
            })
            .collect();
        self.mode = Mode::Menu;
    }

    /// Nodes for the jump-to dialog, in display order: symbols by name,
    /// then choices, menus and comments by prompt.
    ///
    /// Every whitespace-separated token of `query` is a case-insensitive
    /// regex that has to match the name or the prompt. A leading config
    /// prefix on a token is ignored.
    pub fn search(&self, query: &str) -> Result<Vec<NodeId>, String> {
        let kconf = &self.kconf;
        let prefix = kconf.config_prefix().to_lowercase();
        let regexes = query
            .to_lowercase()
            .split_whitespace()
            .map(|token| Regex::new(token.strip_prefix(prefix.as_str()).unwrap_or(token)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("Bad regular expression: {}", regex_reason(&e)))?;
        let matches_all = |texts: &[Option<&str>]| {
            regexes.iter().all(|re| {
                texts
                    .iter()
                    .flatten()
                    .any(|text| re.is_match(&text.to_lowercase()))
            })
        };

        let mut syms = kconf.unique_defined_syms().to_vec();
        syms.sort_by(|a, b| kconf.sym(*a).name().cmp(kconf.sym(*b).name()));
        let mut choices = kconf.unique_choices().to_vec();
        choices.sort_by(|a, b| kconf.choice(*a).name().cmp(&kconf.choice(*b).name()));
        let mut choice_nodes: Vec<NodeId> = choices
            .iter()
            .flat_map(|c| kconf.choice(*c).nodes().iter().copied())
            .collect();
        choice_nodes.sort_by(|a, b| prompt_of(kconf, *a).cmp(prompt_of(kconf, *b)));

        let mut found = Vec::new();
        let sc_nodes = syms
            .iter()
            .flat_map(|s| kconf.sym(*s).nodes().iter().copied())
            .chain(choice_nodes);
        for node in sc_nodes {
            let name = match kconf.node(node).item() {
                MenuItem::Symbol(s) => Some(kconf.sym(s).name()),
                MenuItem::Choice(c) => kconf.choice(c).name(),
                MenuItem::Menu | MenuItem::Comment => None,
            };
            if matches_all(&[name, kconf.node(node).prompt_text()]) {
                found.push(node);
            }
        }

        for list in [kconf.menus(), kconf.comments()] {
            let mut nodes = list.to_vec();
            nodes.sort_by(|a, b| prompt_of(kconf, *a).cmp(prompt_of(kconf, *b)));
            found.extend(
                nodes
                    .into_iter()
                    .filter(|n| matches_all(&[kconf.node(*n).prompt_text()])),
            );
        }
        Ok(found)
    }

    /// A jump-to result: `NAME(=value) "prompt"`, `menu "prompt"`, ...
    pub fn search_text(&self, node: NodeId) -> String {
        let kconf = &self.kconf;
        let n = kconf.node(node);
        let prompt = n
            .prompt_text()
            .map(|p| format!(" \"{p}\""))
            .unwrap_or_default();
        match n.item() {
            MenuItem::Symbol(sym) => format!(
                "{}(={}){prompt}",
                kconf.sym(sym).name(),
                kconf.str_value(sym)
            ),
            MenuItem::Choice(c) => format!("{}{prompt}", kconf.item_str(Item::Choice(c))),
            MenuItem::Menu => format!("menu{prompt}"),
            MenuItem::Comment => format!("comment{prompt}"),
        }
    }

    fn search_key(&mut self, mut line: LineEdit, sel: usize, scroll: usize, key: Key) {
        let matches = self.search(&line.buf).unwrap_or_default();
        let last = matches.len().saturating_sub(1);
        let page = self.list_height.max(1);
        let sel = match key {
            Key::Esc => return,
            Key::Enter => {
                if let Some(&node) = matches.get(sel) {
                    self.jump_to(node);
                    return;
                }
                sel
            }
            Key::Up => sel.saturating_sub(1),
            Key::Down => (sel + 1).min(last),
            Key::PageUp => sel.saturating_sub(page),
            Key::PageDown => (sel + page).min(last),
            _ => {
                let before = line.buf.clone();
                line.key(key);
                // New query, back to the first match
                if line.buf != before { 0 } else { sel }
            }
        };
        let scroll = if sel < scroll {
            sel
        } else if sel >= scroll + page {
            sel + 1 - page
        } else {
            scroll
        };
        self.mode = Mode::Search { line, sel, scroll };
    }

    fn request_quit(&mut self) {
        if self.needs_save {
            self.mode = Mode::ConfirmQuit;
        } else {
            self.done = true;
        }
    }

    fn save(&mut self) {
        self.save_to(self.config_path.clone());
    }

    /// Writes the configuration to `path`, which becomes the file later
    /// saves go to.
    fn save_to(&mut self, path: PathBuf) {
        let saved = self
            .kconf
            .write_config(Some(path.as_path()), self.header.as_deref(), true);
        self.mode = match saved {
            Ok(msg) => {
                self.config_path = path;
                self.needs_save = false;
                Mode::Message(msg)
            }
            Err(e) => Mode::Message(format!("Failed to save configuration: {e}")),
        };
    }

    fn save_min(&mut self, path: PathBuf) {
        let saved = self
            .kconf
            .write_min_config(&path, self.header.as_deref());
        self.mode = Mode::Message(match saved {
            Ok(msg) => msg,
            Err(e) => format!("Failed to save minimal configuration: {e}"),
        });
    }

    fn open_load_dialog(&mut self) {
        self.mode = Mode::Input {
            target: Input::Load,
            line: LineEdit::new(self.config_path.display().to_string()),
        };
    }

    /// Replaces all values with the ones in `path`.
    fn load(&mut self, path: PathBuf) {
        let keep = self.selected();
        self.mode = match self.kconf.load_config(Some(path.as_path()), true) {
            Ok(_) => {
                self.needs_save = self.kconf.config_outdated();
                if let Some(node) = keep {
                    if !self.select(node) {
                        self.show_all = true;
                        self.select(node);
                    }
                }
                let msg = format!("Loaded {}", path.display());
                self.config_path = path;
                Mode::Message(msg)
            }
            Err(e) => Mode::Message(format!("Failed to load '{}': {e}", path.display())),
        };
    }

    /// Space/Enter on a row: cycle bool/tristate values, select choice
    /// members, edit string/int/hex values.
    fn change_node(&mut self, node: NodeId) {
        match self.kconf.node(node).item() {
            MenuItem::Symbol(sym) => {
                let orig = self.kconf.sym(sym).orig_type();
                if orig.is_int_or_hex() || orig == SymbolType::String {
                    if self.kconf.visibility(sym) != Tristate::N {
                        self.mode = Mode::Input {
                            target: Input::Value(sym),
                            line: LineEdit::new(self.kconf.str_value(sym)),
                        };
                    }
                    return;
                }
                if self.is_y_mode_choice_sym(sym) {
                    self.set_tri(node, Tristate::Y);
                    return;
                }
                let assignable = self.kconf.assignable(sym);
                if assignable.len() > 1 {
                    let cur = self.kconf.tri_value(sym);
                    let next = next_value(assignable, cur);
                    self.set_tri(node, next);
                }
            }
            MenuItem::Choice(c) => {
                let assignable = self.kconf.choice_assignable(c);
                if assignable.len() > 1 {
                    let next = next_value(assignable, self.kconf.choice_tri_value(c));
                    self.set_tri(node, next);
                }
            }
            MenuItem::Menu | MenuItem::Comment => {}
        }
    }

    fn set_tri(&mut self, node: NodeId, tri: Tristate) {
        match self.kconf.node(node).item() {
            MenuItem::Symbol(sym) => {
                if !self.kconf.sym(sym).orig_type().is_bool_or_tristate()
                    || !self.kconf.assignable(sym).contains(&tri)
                {
                    return;
                }
                let before = self.kconf.tri_value(sym);
                let was_user_sel = self
                    .kconf
                    .sym(sym)
                    .choice()
                    .map(|c| self.kconf.choice(c).user_selection());
                if self.kconf.set_value(sym, tri.as_str())
                    && (self.kconf.tri_value(sym) != before
                        || was_user_sel.is_some_and(|u| u != Some(sym)))
                {
                    self.needs_save = true;
                }
            }
            MenuItem::Choice(c) => {
                if self.kconf.choice_assignable(c).contains(&tri)
                    && self.kconf.choice_tri_value(c) != tri
                    && self.kconf.set_choice_value(c, tri.as_str())
                {
                    self.needs_save = true;
                }
            }
            MenuItem::Menu | MenuItem::Comment => {}
        }
    }

    fn input_key(&mut self, target: Input, mut line: LineEdit, key: Key) {
        match key {
            Key::Esc => {}
            Key::Enter => self.commit_input(target, line.buf),
            _ => {
                line.key(key);
                self.mode = Mode::Input { target, line };
            }
        }
    }

    fn commit_input(&mut self, target: Input, text: String) {
        match target {
            Input::Value(sym) => self.commit_edit(sym, text),
            _ if text.trim().is_empty() => {}
            Input::Load => self.load(expand_home(text.trim())),
            Input::Save => self.save_to(expand_home(text.trim())),
            Input::SaveMin => self.save_min(expand_home(text.trim())),
        }
    }

    fn commit_edit(&mut self, sym: SymbolId, buf: String) {
        let before = self.kconf.str_value(sym);
        let orig = self.kconf.sym(sym).orig_type();
        let buf = match orig {
            SymbolType::Int | SymbolType::Hex => buf.trim().to_string(),
            _ => buf,
        };
        if !self.kconf.set_value(sym, &buf) {
            self.mode = Mode::Message(format!("'{buf}' is not a valid {orig} value"));
            return;
        }
        let after = self.kconf.str_value(sym);
        if after != before {
            self.needs_save = true;
        }
        if after != buf {
            self.mode = Mode::Message(format!(
                "{buf} is outside the active range, the value stays {after}"
            ));
        }
    }

    fn info_key(&mut self, node: NodeId, scroll: usize, key: Key) {
        let scroll = match key {
            Key::Esc | Key::Left | Key::Enter | Key::Char('q' | '?') => return,
            Key::Up | Key::Char('k') => scroll.saturating_sub(1),
            Key::Down | Key::Char('j') => scroll + 1,
            Key::PageUp => scroll.saturating_sub(self.list_height),
            Key::PageDown => scroll + self.list_height,
            Key::Home => 0,
            _ => scroll,
        };
        let max = self.info_text(node).len().saturating_sub(1);
        self.mode = Mode::Info {
            node,
            scroll: scroll.min(max),
        };
    }

    fn confirm_quit_key(&mut self, key: Key) {
        match key {
            Key::Char('y' | 'Y') | Key::Enter => {
                self.save();
                if !self.needs_save {
                    self.done = true;
                }
            }
            Key::Char('n' | 'N') => self.done = true,
            Key::Esc => {}
            _ => self.mode = Mode::ConfirmQuit,
        }
    }

    fn confirm_load_key(&mut self, key: Key) {
        match key {
            Key::Char('o' | 'O') | Key::Enter => self.open_load_dialog(),
            Key::Char('c' | 'C') | Key::Esc => {}
            _ => self.mode = Mode::ConfirmLoad,
        }
    }

    /// Lines of the symbol information view.
    pub fn info_text(&self, node: NodeId) -> Vec<String> {
        let kconf = &self.kconf;
        let n = kconf.node(node);
        let mut lines = Vec::new();

        let item = match n.item() {
            MenuItem::Symbol(s) => Some(Item::Sym(s)),
            MenuItem::Choice(c) => Some(Item::Choice(c)),
            MenuItem::Menu | MenuItem::Comment => None,
        };

        if let Some(text) = n.prompt_text() {
            lines.push(format!("Prompt: {text}"));
        }
        if let MenuItem::Symbol(sym) = n.item() {
            let s = kconf.sym(sym);
            lines.push(format!("Name: {}", s.name()));
            lines.push(format!("Type: {}", kconf.sym_type(sym)));
            lines.push(format!("Value: {}", kconf.str_value(sym)));
        }
        if let MenuItem::Choice(c) = n.item() {
            lines.push(format!("Type: {}", kconf.choice_type(c)));
            lines.push(format!("Mode: {}", kconf.choice_tri_value(c)));
        }

        lines.push(String::new());
        match n.help() {
            Some(help) => lines.extend(help.lines().map(str::to_string)),
            None => lines.push("There is no help available for this item.".to_string()),
        }

        if let Some(Item::Sym(sym)) = item {
            let s = kconf.sym(sym);
            lines.push(String::new());
            lines.push(format!(
                "Direct dependencies (={}):",
                kconf.eval(s.direct_dep())
            ));
            lines.push(format!("  {}", kconf.expr_str(s.direct_dep())));

            let selects = kconf.active_selects(sym);
            if !selects.is_empty() {
                lines.push(String::new());
                lines.push(format!("Selected by (={}):", kconf.eval(s.rev_dep())));
                for term in &selects {
                    lines.push(format!("  - {}", self.term_str(term)));
                }
            }
            let implies = kconf.active_implies(sym);
            if !implies.is_empty() {
                lines.push(String::new());
                lines.push(format!("Implied by (={}):", kconf.eval(s.weak_rev_dep())));
                for term in &implies {
                    lines.push(format!("  - {}", self.term_str(term)));
                }
            }
            if let Some((value, cond)) = kconf.active_default(sym) {
                lines.push(String::new());
                lines.push("Active default:".to_string());
                lines.push(format!(
                    "  {} (={}) if {}",
                    kconf.expr_str(&value),
                    kconf.eval(&value),
                    kconf.expr_str(&cond)
                ));
            }
        }

        lines.push(String::new());
        lines.push("Definition:".to_string());
        match item {
            Some(item) => lines.extend(kconf.item_definition(item).lines().map(str::to_string)),
            None => lines.extend(kconf.node_str(node).lines().map(str::to_string)),
        }
        let at = format!("(defined at {}:{})", n.filename(), n.linenr());
        lines.push(String::new());
        lines.push(at);
        lines
    }

    /// `SELECTOR (=y), condition COND` for a select/imply term.
    fn term_str(&self, term: &crate::ExprRef) -> String {
        let kconf = &self.kconf;
        let parts = split_expr(term, BinOp::And);
        match parts.as_slice() {
            [first, rest @ ..] if !rest.is_empty() => format!(
                "{} (={}), condition {}",
                kconf.expr_str(first),
                kconf.eval(first),
                rest.iter()
                    .map(|r| kconf.expr_str(r))
                    .collect::<Vec<_>>()
                    .join(" && ")
            ),
            _ => format!("{} (={})", kconf.expr_str(term), kconf.eval(term)),
        }
    }

    /// Draws the current state.
    pub fn render(&self, screen: &mut Screen) {
        let (w, h) = (screen.width(), screen.height());
        if w == 0 || h == 0 {
            return;
        }

        let title = screen.add_region(Region::new(0, 0, w, 1));
        let r = screen.region_mut(title);
        r.fill(TITLE_STYLE);
        let modified = if self.needs_save { " *" } else { "" };
        r.put_str(1, 0, &format!("{}{modified}", self.kconf.mainmenu_text()), TITLE_STYLE);

        match &self.mode {
            Mode::Info { node, scroll } => {
                self.render_info(screen, *node, *scroll);
                return;
            }
            Mode::Search { line, sel, scroll } => {
                self.render_search(screen, line, *sel, *scroll);
                return;
            }
            _ => {}
        }

        let path = screen.add_region(Region::new(0, 1, w, 1));
        screen.region_mut(path).put_str(1, 0, &self.menu_path(), PATH_STYLE);

        let list_h = h.saturating_sub(3);
        let list = screen.add_region(Region::new(0, 2, w, list_h));
        let region = screen.region_mut(list);
        region.fill(LIST_STYLE);
        let rows = self.rows();
        for (i, row) in rows
            .iter()
            .enumerate()
            .skip(self.cur.scroll)
            .take(usize::from(list_h))
        {
            let style = if i == self.cur.sel {
                SELECTED_STYLE
            } else if !row.visible {
                INVISIBLE_STYLE
            } else {
                LIST_STYLE
            };
            let y = u16::try_from(i - self.cur.scroll).unwrap_or(u16::MAX);
            region.put_str(1, y, &self.row_text(row), style);
        }

        let status = screen.add_region(Region::new(0, h.saturating_sub(1), w, 1));
        let r = screen.region_mut(status);
        r.fill(STATUS_STYLE);
        let help = format!(
            "[Space] Change  [?] Info  [/] Jump  [a] {}  [c] Names  [o] Load  [s] Save  \
             [d] Minimal  [q] Quit",
            if self.show_all { "Hide invisible" } else { "Show all" }
        );
        r.put_str(1, 0, &help, STATUS_STYLE);

        match &self.mode {
            Mode::Input { target, line } => {
                let title = match target {
                    Input::Value(sym) => {
                        let s = self.kconf.sym(*sym);
                        format!("{} ({})", s.name(), s.orig_type())
                    }
                    Input::Load => "File to load".to_string(),
                    Input::Save => "Filename to save configuration to".to_string(),
                    Input::SaveMin => "Filename to save minimal configuration to".to_string(),
                };
                self.render_dialog(screen, &title, &[line.buf.clone()], Some(line));
            }
            Mode::ConfirmQuit => self.render_dialog(
                screen,
                "Quit",
                &["Save configuration? [y]es / [n]o / [Esc] cancel".to_string()],
                None,
            ),
            Mode::ConfirmLoad => self.render_dialog(
                screen,
                "Load",
                &[
                    "You have unsaved changes. Load new".to_string(),
                    "configuration anyway?".to_string(),
                    String::new(),
                    "         (O)K  (C)ancel".to_string(),
                ],
                None,
            ),
            Mode::Message(msg) => self.render_dialog(screen, "", &[msg.clone()], None),
            Mode::Menu | Mode::Info { .. } | Mode::Search { .. } => {}
        }
    }

    fn render_info(&self, screen: &mut Screen, node: NodeId, scroll: usize) {
        let (w, h) = (screen.width(), screen.height());
        let body = screen.add_region(Region::new(0, 1, w, h.saturating_sub(1)));
        let r = screen.region_mut(body);
        r.fill(LIST_STYLE);
        for (y, line) in self
            .info_text(node)
            .iter()
            .skip(scroll)
            .take(usize::from(h.saturating_sub(1)))
            .enumerate()
        {
            let y = u16::try_from(y).unwrap_or(u16::MAX);
            r.put_str(1, y, &crate::util::expand_tabs(line), LIST_STYLE);
        }
    }

    fn render_search(&self, screen: &mut Screen, line: &LineEdit, sel: usize, scroll: usize) {
        let (w, h) = (screen.width(), screen.height());

        let edit = screen.add_region(Region::new(0, 1, w, 1));
        let r = screen.region_mut(edit);
        r.fill(DIALOG_STYLE);
        let x = 1 + r.put_str(1, 0, "Jump to: ", DIALOG_STYLE);
        r.put_str(x, 0, &line.buf, DIALOG_STYLE);
        draw_cursor(r, x, 0, line);

        let list_h = h.saturating_sub(3);
        let list = screen.add_region(Region::new(0, 2, w, list_h));
        let r = screen.region_mut(list);
        r.fill(LIST_STYLE);
        match self.search(&line.buf) {
            Ok(matches) if matches.is_empty() => {
                r.put_str(1, 0, "No matches", INVISIBLE_STYLE);
            }
            Ok(matches) => {
                for (i, node) in matches
                    .iter()
                    .enumerate()
                    .skip(scroll)
                    .take(usize::from(list_h))
                {
                    let style = if i == sel { SELECTED_STYLE } else { LIST_STYLE };
                    let y = u16::try_from(i - scroll).unwrap_or(u16::MAX);
                    r.put_str(1, y, &self.search_text(*node), style);
                }
            }
            Err(msg) => {
                r.put_str(1, 0, &msg, LIST_STYLE);
            }
        }

        let status = screen.add_region(Region::new(0, h.saturating_sub(1), w, 1));
        let r = screen.region_mut(status);
        r.fill(STATUS_STYLE);
        r.put_str(
            1,
            0,
            "Names and prompts, regexes allowed  [Enter] Jump  [Up/Down] Select  [Esc] Cancel",
            STATUS_STYLE,
        );
    }

    fn render_dialog(
        &self,
        screen: &mut Screen,
        title: &str,
        lines: &[String],
        cursor: Option<&LineEdit>,
    ) {
        let (w, h) = (screen.width(), screen.height());
        let text_w = lines
            .iter()
            .map(|l| str_width(l) + 1)
            .chain([str_width(title) + 2, 30])
            .max()
            .unwrap_or(30);
        let dw = u16::try_from(text_w + 4).unwrap_or(u16::MAX).min(w);
        let dh = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX).min(h);
        let x = (w - dw) / 2;
        let y = (h - dh) / 2;

        let id = screen.add_region(Region::new(x, y, dw, dh));
        let r = screen.region_mut(id);
        r.fill(DIALOG_STYLE);
        r.draw_border(DIALOG_BORDER_STYLE);
        if !title.is_empty() {
            r.put_str(2, 0, &format!(" {title} "), DIALOG_BORDER_STYLE);
        }
        for (i, line) in lines.iter().enumerate() {
            let ly = u16::try_from(i + 1).unwrap_or(u16::MAX);
            r.put_str(2, ly, line, DIALOG_STYLE);
        }
        if let Some(line) = cursor {
            draw_cursor(r, 2, 1, line);
        }
    }
}

/// Highlights the character under the cursor of `line`, drawn at `(x, y)`.
fn draw_cursor(r: &mut Region, x: u16, y: u16, line: &LineEdit) {
    let cx = x.saturating_add(u16::try_from(line.cursor_col()).unwrap_or(u16::MAX));
    let ch = line.buf.chars().nth(line.cursor).unwrap_or(' ');
    r.put_str(cx, y, &ch.to_string(), DIALOG_STYLE.reverse());
}

/// The value after `cur` in `assignable`, wrapping around.
fn next_value(assignable: &[Tristate], cur: Tristate) -> Tristate {
    match assignable.iter().position(|v| *v == cur) {
        Some(i) => assignable[(i + 1) % assignable.len()],
        None => assignable[0],
    }
}

fn prompt_of(kconf: &Kconfig, node: NodeId) -> &str {
    kconf.node(node).prompt_text().unwrap_or("")
}

/// Last line of a regex error, without its `error: ` label.
fn regex_reason(e: &regex::Error) -> String {
    let msg = e.to_string();
    msg.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or(msg.as_str())
        .trim()
        .trim_start_matches("error: ")
        .to_string()
}

/// Expands a leading `~` to `$HOME`.
fn expand_home(path: &str) -> PathBuf {
    let home = env::var_os("HOME").filter(|h| !h.is_empty());
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            PathBuf::from(home).join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tests::ScriptTerminal;

    const TEXT: &str = "\
mainmenu \"Test Config\"

config A
\tbool \"Enable A\"

config B
\tbool \"Always B\"
\tdefault y
\tselect C

config C
\tbool \"C\"

config NAME
\tstring \"Name\"
\tdefault \"hello\"

menu \"Sub\"

config D
\tbool \"D in sub\"
\thelp
\t  Some help.

endmenu

comment \"A comment\"
";

    fn menuconfig() -> MenuConfig {
        let kconf = Kconfig::from_text(TEXT, "Kconfig").unwrap();
        MenuConfig::new(kconf, ".config-test-unused")
    }

    fn texts(mc: &MenuConfig) -> Vec<String> {
        mc.rows().iter().map(|r| mc.row_text(r)).collect()
    }

    #[test]
    fn test_row_texts() {
        let mc = menuconfig();
        assert_eq!(
            texts(&mc),
            [
                "[ ] Enable A (NEW)",
                "[*] Always B (NEW)",
                "-*- C (NEW)",
                "(hello) Name (NEW)",
                "    Sub  --->",
                "    *** A comment ***",
            ]
        );
    }

    #[test]
    fn test_toggle_and_navigate() {
        let mut mc = menuconfig();
        mc.handle_key(Key::Char(' '));
        assert!(mc.needs_save());
        let a = mc.kconf().lookup("A").unwrap();
        assert_eq!(mc.kconf().tri_value(a), Tristate::Y);

        // Pinned symbols do not change
        mc.handle_key(Key::Down);
        mc.handle_key(Key::Down);
        mc.handle_key(Key::Char('n'));
        let c = mc.kconf().lookup("C").unwrap();
        assert_eq!(mc.kconf().tri_value(c), Tristate::Y);

        mc.handle_key(Key::End);
        mc.handle_key(Key::Up);
        mc.handle_key(Key::Enter);
        assert_eq!(texts(&mc), ["[ ] D in sub (NEW)"]);
        mc.handle_key(Key::Esc);
        assert_eq!(mc.current_menu(), mc.kconf().top_node());
    }

    #[test]
    fn test_edit_string() {
        let mut mc = menuconfig();
        for key in [Key::Down, Key::Down, Key::Down, Key::Enter, Key::Backspace] {
            mc.handle_key(key);
        }
        for ch in "p!".chars() {
            mc.handle_key(Key::Char(ch));
        }
        mc.handle_key(Key::Enter);
        let name = mc.kconf().lookup("NAME").unwrap();
        assert_eq!(mc.kconf().str_value(name), "hellp!");
    }

    #[test]
    fn test_info_shows_provenance() {
        let mc = menuconfig();
        let c = mc.kconf().lookup("C").unwrap();
        let node = mc.kconf().sym(c).nodes()[0];
        let info = mc.info_text(node);
        assert!(info.iter().any(|l| l.starts_with("Selected by (=y)")));
        assert!(info.iter().any(|l| l == "  - B (=y)"));
    }

    #[test]
    fn test_run_saves_and_quits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".config");
        let kconf = Kconfig::from_text(TEXT, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, &path);

        let keys = [Key::Char(' '), Key::Char('q'), Key::Char('y')];
        let mut term = ScriptTerminal::new(80, 24, &keys);
        mc.run(&mut term).unwrap();

        assert!(mc.is_done());
        assert!(!mc.needs_save());
        assert!(term.contains("Test Config"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("CONFIG_A=y\n"));
    }

    #[test]
    fn test_quit_without_saving() {
        let mut mc = menuconfig();
        mc.handle_key(Key::Char(' '));
        mc.handle_key(Key::Char('q'));
        assert!(!mc.is_done());
        mc.handle_key(Key::Char('n'));
        assert!(mc.is_done());
        assert!(mc.needs_save());
    }

    const HIDDEN_TEXT: &str = "\
config COND
\tbool \"cond\"

config A
\tbool
\tprompt \"a\" if COND
\tdefault y

config B
\tbool \"b\"
\tdepends on A

config P
\tbool
";

    fn type_text(mc: &mut MenuConfig, text: &str) {
        for ch in text.chars() {
            mc.handle_key(Key::Char(ch));
        }
    }

    /// Empties the input field of the open dialog.
    fn clear_input(mc: &mut MenuConfig) {
        mc.handle_key(Key::End);
        for _ in 0..256 {
            mc.handle_key(Key::Backspace);
        }
    }

    #[test]
    fn test_hidden_symbol_keeps_visible_children() {
        let kconf = Kconfig::from_text(HIDDEN_TEXT, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, ".config-test-unused");
        assert_eq!(texts(&mc), ["[ ] cond (NEW)", "-*- a (NEW)", "[ ]     b (NEW)"]);
        let visible: Vec<bool> = mc.rows().iter().map(|r| r.visible).collect();
        assert_eq!(visible, [true, false, true]);

        // B can still be changed from under its hidden parent
        mc.handle_key(Key::End);
        mc.handle_key(Key::Char(' '));
        let b = mc.kconf().lookup("B").unwrap();
        assert_eq!(mc.kconf().tri_value(b), Tristate::Y);
    }

    #[test]
    fn test_show_all_lists_promptless() {
        let kconf = Kconfig::from_text(HIDDEN_TEXT, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, ".config-test-unused");
        mc.handle_key(Key::Char('a'));
        assert_eq!(
            texts(&mc),
            ["[ ] cond (NEW)", "-*- a (NEW)", "[ ]     b (NEW)", "- - <P>"]
        );
        let visible: Vec<bool> = mc.rows().iter().map(|r| r.visible).collect();
        assert_eq!(visible, [true, false, true, false]);

        mc.handle_key(Key::Char('a'));
        assert_eq!(mc.rows().len(), 3);
    }

    #[test]
    fn test_show_names() {
        let mut mc = menuconfig();
        mc.handle_key(Key::Char('c'));
        let rows = texts(&mc);
        assert_eq!(rows[0], "[ ] <A> Enable A (NEW)");
        assert_eq!(rows[4], "    Sub  --->");
        mc.handle_key(Key::Char('c'));
        assert_eq!(texts(&mc)[0], "[ ] Enable A (NEW)");
    }

    #[test]
    fn test_choice_lists_members_from_all_locations() {
        let text = "choice CH\n\tprompt \"ch\"\nconfig X\n\tbool \"x\"\nendchoice\n\
                    choice CH\nconfig Y\n\tbool \"y\"\nendchoice\n";
        let kconf = Kconfig::from_text(text, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, ".config-test-unused");
        mc.handle_key(Key::Enter);
        let syms: Vec<&str> = mc
            .rows()
            .iter()
            .filter_map(|r| mc.kconf().node(r.node).sym())
            .map(|s| mc.kconf().sym(s).name())
            .collect();
        assert_eq!(syms, ["X", "Y"]);
    }

    #[test]
    fn test_search() {
        let mc = menuconfig();
        let all = mc.search("").unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(mc.search_text(all[0]), "A(=n) \"Enable A\"");
        assert_eq!(mc.search_text(all[5]), "menu \"Sub\"");
        assert_eq!(mc.search_text(all[6]), "comment \"A comment\"");

        // Config prefix is ignored, case too
        let found = mc.search("CONFIG_NAME").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(mc.search_text(found[0]), "NAME(=hello) \"Name\"");

        // Every token has to match
        assert_eq!(mc.search("enable c").unwrap().len(), 0);
        assert_eq!(mc.search("always ^b$").unwrap().len(), 1);

        let err = mc.search("(").unwrap_err();
        assert!(err.starts_with("Bad regular expression: "));
    }

    #[test]
    fn test_jump_to_nested_symbol() {
        let mut mc = menuconfig();
        mc.handle_key(Key::Char('/'));
        type_text(&mut mc, "d in");
        mc.handle_key(Key::Enter);

        let d = mc.kconf().lookup("D").unwrap();
        assert_eq!(mc.selected(), Some(mc.kconf().sym(d).nodes()[0]));
        assert_eq!(mc.menu_path(), "Test Config > Sub");

        // Going back up lands on the menu that was jumped into
        mc.handle_key(Key::Esc);
        assert_eq!(mc.current_menu(), mc.kconf().top_node());
        assert_eq!(mc.row_text(&mc.rows()[mc.cur.sel]), "    Sub  --->");
    }

    #[test]
    fn test_jump_to_hidden_turns_on_show_all() {
        let kconf = Kconfig::from_text(HIDDEN_TEXT, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, ".config-test-unused");
        mc.handle_key(Key::Char('/'));
        type_text(&mut mc, "^p$");
        mc.handle_key(Key::Enter);

        assert!(mc.show_all);
        let p = mc.kconf().lookup("P").unwrap();
        assert_eq!(mc.selected(), Some(mc.kconf().sym(p).nodes()[0]));
    }

    #[test]
    fn test_search_bad_regex_stays_open() {
        let mut mc = menuconfig();
        mc.handle_key(Key::Char('/'));
        type_text(&mut mc, "[");
        mc.handle_key(Key::Enter);
        assert!(matches!(mc.mode, Mode::Search { .. }));

        let mut screen = Screen::new(80, 24);
        mc.render(&mut screen);
        let mut term = ScriptTerminal::new(80, 24, &[]);
        screen.flush(&mut term).unwrap();
        assert!(term.contains("Bad regular expression"));

        mc.handle_key(Key::Esc);
        assert_eq!(mc.mode, Mode::Menu);
    }

    #[test]
    fn test_load_save_as_and_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.config");
        let mut prepared = Kconfig::from_text(TEXT, "Kconfig").unwrap();
        let a = prepared.lookup("A").unwrap();
        prepared.set_value(a, "y");
        prepared.write_config(Some(other.as_path()), Some(""), false).unwrap();

        let kconf = Kconfig::from_text(TEXT, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, dir.path().join(".config"));
        // Nothing loaded yet, so there is something to save
        assert!(mc.needs_save());

        mc.handle_key(Key::Char('o'));
        assert_eq!(mc.mode, Mode::ConfirmLoad);
        mc.handle_key(Key::Char('o'));
        clear_input(&mut mc);
        type_text(&mut mc, &other.display().to_string());
        mc.handle_key(Key::Enter);

        let a = mc.kconf().lookup("A").unwrap();
        assert_eq!(mc.kconf().tri_value(a), Tristate::Y);
        assert!(!mc.needs_save());
        assert_eq!(mc.config_path(), other.as_path());
        assert!(matches!(&mc.mode, Mode::Message(msg) if msg.starts_with("Loaded ")));
        mc.handle_key(Key::Esc);

        // Save under a new name, which becomes the save target
        let saved = dir.path().join("saved.config");
        mc.handle_key(Key::Char(' '));
        mc.handle_key(Key::Char('s'));
        clear_input(&mut mc);
        type_text(&mut mc, &saved.display().to_string());
        mc.handle_key(Key::Enter);
        assert!(!mc.needs_save());
        assert_eq!(mc.config_path(), saved.as_path());
        let written = std::fs::read_to_string(&saved).unwrap();
        assert!(written.contains("# CONFIG_A is not set\n"));
        mc.handle_key(Key::Esc);

        let defconfig = dir.path().join("defconfig");
        mc.handle_key(Key::Char('D'));
        clear_input(&mut mc);
        type_text(&mut mc, &defconfig.display().to_string());
        mc.handle_key(Key::Enter);
        let min = std::fs::read_to_string(&defconfig).unwrap();
        assert!(!min.contains("CONFIG_A"));
        assert!(!min.contains("CONFIG_B"));
        assert!(!min.contains("CONFIG_NAME"));
    }

    #[test]
    fn test_wide_prompt_renders() {
        let text = "config W\n\tbool \"中文选项\"\n";
        let kconf = Kconfig::from_text(text, "Kconfig").unwrap();
        let mut mc = MenuConfig::new(kconf, ".config-test-unused");
        let mut term = ScriptTerminal::new(40, 6, &[Key::Char('n'), Key::Char('q'), Key::Char('n')]);
        mc.run(&mut term).unwrap();
        assert!(term.contains("[ ] 中文选项 (NEW)"));
    }
}
