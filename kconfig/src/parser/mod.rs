//! Kconfig parser.
//!
//! Builds the raw menu tree: nodes are linked and carry their own properties,
//! but nothing has been propagated yet. See [`crate::finalize`] for the
//! second stage.

mod glob;
mod lexer;
mod preprocess;

use std::path::Path;

pub use preprocess::{DefaultPreprocessor, Preprocessor};

use crate::{
    Kconfig, Result,
    error::{Error, Location},
    expr::{ChoiceId, Expr, ExprRef, Item, SymbolId, make_and, make_or},
    menu::{MenuItem, MenuNode, NodeId},
    tristate::SymbolType,
    util::expand_tabs,
};
use lexer::{Token, tokenize};

/// A tokenized logical line.
pub(crate) struct Line {
    tokens: Vec<Token>,
    pos: usize,
    filename: String,
    linenr: usize,
    text: String,
}

impl Line {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_tok(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn check_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn keyword(&self) -> Option<&str> {
        match self.tokens.first() {
            Some(Token::Word(w)) => Some(w),
            _ => None,
        }
    }

    fn loc(&self) -> (&str, usize) {
        (&self.filename, self.linenr)
    }

    fn error(&self, msg: impl AsRef<str>) -> Error {
        Error::parse(
            Location::new(&self.filename, self.linenr),
            format!("couldn't parse '{}': {}", self.text.trim(), msg.as_ref()),
        )
    }
}

/// Physical lines of one Kconfig file.
struct Reader {
    filename: String,
    lines: Vec<String>,
    pos: usize,
    pending: Option<Line>,
}

impl Reader {
    fn new(filename: &str, text: &str) -> Self {
        Self {
            filename: filename.to_string(),
            lines: text.lines().map(str::to_string).collect(),
            pos: 0,
            pending: None,
        }
    }

    fn read_raw(&mut self) -> Option<String> {
        let line = self.lines.get(self.pos).cloned();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn unread_raw(&mut self) {
        self.pos -= 1;
    }

    /// Line number of the line returned by the last `read_raw`.
    fn linenr(&self) -> usize {
        self.pos
    }
}

struct Parser<'a> {
    kconf: &'a mut Kconfig,
    pp: &'a mut dyn Preprocessor,
    include_path: Vec<(String, usize)>,
}

/// Parses `text` as the top Kconfig file into `kconf`.
pub(crate) fn parse(
    kconf: &mut Kconfig,
    filename: &str,
    text: &str,
    pp: &mut dyn Preprocessor,
) -> Result<()> {
    let top = kconf.top_node;
    let mut parser = Parser {
        kconf,
        pp,
        include_path: Vec::new(),
    };
    let mut reader = Reader::new(filename, text);
    let last = parser.parse_block(&mut reader, None, top, top)?;
    parser.node_mut(last).next = None;
    let first = parser.node_mut(top).next.take();
    parser.node_mut(top).list = first;
    debug!(
        "parsed {} ({} files, {} nodes)",
        filename,
        parser.kconf.kconfig_filenames.len(),
        parser.kconf.nodes.len()
    );
    Ok(())
}

impl Parser<'_> {
    fn node_mut(&mut self, id: NodeId) -> &mut MenuNode {
        &mut self.kconf.nodes[id.0]
    }

    fn add_node(&mut self, item: MenuItem, line: &Line, parent: NodeId) -> NodeId {
        let mut node = MenuNode::new(item, &self.kconf.y, &line.filename, line.linenr);
        node.parent = Some(parent);
        node.include_path = self.include_path.clone();
        let id = NodeId(self.kconf.nodes.len());
        self.kconf.nodes.push(node);
        id
    }

    fn link(&mut self, prev: NodeId, node: NodeId) -> NodeId {
        self.node_mut(prev).next = Some(node);
        node
    }

    /// Reads the next non-blank logical line, joining `\` continuations and
    /// running the preprocessor.
    fn next_line(&mut self, r: &mut Reader) -> Result<Option<Line>> {
        if let Some(line) = r.pending.take() {
            return Ok(Some(line));
        }
        while let Some(mut raw) = r.read_raw() {
            while raw.ends_with('\\') {
                raw.pop();
                match r.read_raw() {
                    Some(cont) => raw.push_str(&cont),
                    None => break,
                }
            }
            let loc = Location::new(&r.filename, r.linenr());
            let Some(text) = self.pp.process(&raw, &loc)? else {
                continue;
            };
            let tokens = tokenize(&text).map_err(|msg| {
                Error::parse(loc.clone(), format!("{msg} (in '{}')", text.trim()))
            })?;
            if tokens.is_empty() {
                continue;
            }
            return Ok(Some(Line {
                tokens,
                pos: 1,
                filename: loc.filename,
                linenr: loc.linenr,
                text,
            }));
        }
        Ok(None)
    }

    fn parse_block(
        &mut self,
        r: &mut Reader,
        end: Option<&'static str>,
        parent: NodeId,
        mut prev: NodeId,
    ) -> Result<NodeId> {
        while let Some(mut line) = self.next_line(r)? {
            let Some(kw) = line.keyword().map(str::to_string) else {
                return Err(line.error("unrecognized construct"));
            };

            match kw.as_str() {
                "config" | "menuconfig" => {
                    let sym = self.expect_nonconst_sym(&mut line)?;
                    self.expect_eol(&line)?;
                    let node = self.add_node(MenuItem::Symbol(sym), &line, parent);
                    self.node_mut(node).is_menuconfig = kw == "menuconfig";
                    self.kconf.syms[sym.0].nodes.push(node);
                    self.kconf.defined_syms.push(sym);
                    self.parse_props(r, node)?;
                    if kw == "menuconfig" && self.kconf.nodes[node.0].prompt.is_none() {
                        let msg = format!(
                            "the menuconfig symbol {} has no prompt",
                            self.kconf.name_and_loc(Item::Sym(sym))
                        );
                        self.kconf.warn_msg(msg);
                    }
                    prev = self.link(prev, node);
                }
                "source" | "rsource" | "osource" | "orsource" => {
                    prev = self.parse_source(r, &kw, &mut line, parent, prev)?;
                }
                k if Some(k) == end => {
                    self.expect_eol(&line)?;
                    self.node_mut(prev).next = None;
                    return Ok(prev);
                }
                "if" => {
                    let dep = self.expect_expr_and_eol(&mut line)?;
                    let node = self.add_node(MenuItem::Menu, &line, parent);
                    self.node_mut(node).is_if = true;
                    self.node_mut(node).dep = dep;
                    self.parse_child_block(r, "endif", node)?;
                    prev = self.link(prev, node);
                }
                "menu" => {
                    let title = self.expect_str_and_eol(&mut line)?;
                    let node = self.add_node(MenuItem::Menu, &line, parent);
                    {
                        let y = self.kconf.y.clone();
                        let n = self.node_mut(node);
                        n.is_menuconfig = true;
                        n.prompt = Some((title, y));
                    }
                    self.kconf.menus.push(node);
                    self.parse_props(r, node)?;
                    self.parse_child_block(r, "endmenu", node)?;
                    prev = self.link(prev, node);
                }
                "comment" => {
                    let text = self.expect_str_and_eol(&mut line)?;
                    let node = self.add_node(MenuItem::Comment, &line, parent);
                    let y = self.kconf.y.clone();
                    self.node_mut(node).prompt = Some((text, y));
                    self.kconf.comments.push(node);
                    self.parse_props(r, node)?;
                    prev = self.link(prev, node);
                }
                "choice" => {
                    let choice = self.parse_choice_header(&mut line)?;
                    self.kconf.choice_defs.push(choice);
                    let node = self.add_node(MenuItem::Choice(choice), &line, parent);
                    self.node_mut(node).is_menuconfig = true;
                    self.kconf.choices[choice.0].nodes.push(node);
                    self.parse_props(r, node)?;
                    self.parse_child_block(r, "endchoice", node)?;
                    prev = self.link(prev, node);
                }
                "mainmenu" => {
                    let title = self.expect_str_and_eol(&mut line)?;
                    let y = self.kconf.y.clone();
                    let top = self.kconf.top_node;
                    self.node_mut(top).prompt = Some((title, y));
                }
                "endchoice" => return Err(line.error("no corresponding 'choice'")),
                "endif" => return Err(line.error("no corresponding 'if'")),
                "endmenu" => return Err(line.error("no corresponding 'menu'")),
                _ => return Err(line.error("unrecognized construct")),
            }
        }

        if let Some(end) = end {
            return Err(Error::parse(
                Location::new(&r.filename, r.lines.len()),
                format!("expected '{end}' at end of '{}'", r.filename),
            ));
        }
        Ok(prev)
    }

    /// Parses the children of a menu, choice or `if` up to `end` and hangs
    /// them below `node`.
    fn parse_child_block(&mut self, r: &mut Reader, end: &'static str, node: NodeId) -> Result<()> {
        self.parse_block(r, Some(end), node, node)?;
        let first = self.node_mut(node).next.take();
        self.node_mut(node).list = first;
        Ok(())
    }

    fn parse_choice_header(&mut self, line: &mut Line) -> Result<ChoiceId> {
        let name = match line.next_tok() {
            None => None,
            Some(Token::Word(name)) | Some(Token::Str(name)) => Some(name),
            Some(_) => return Err(line.error("expected choice name")),
        };
        self.expect_eol(line)?;

        if let Some(name) = &name {
            if let Some(id) = self.kconf.named_choices.get(name) {
                return Ok(*id);
            }
        }
        let id = ChoiceId(self.kconf.choices.len());
        self.kconf
            .choices
            .push(crate::choice::Choice::new(name.clone(), &self.kconf.n));
        if let Some(name) = name {
            self.kconf.named_choices.insert(name, id);
        }
        Ok(id)
    }

    fn parse_source(
        &mut self,
        r: &mut Reader,
        kw: &str,
        line: &mut Line,
        parent: NodeId,
        mut prev: NodeId,
    ) -> Result<NodeId> {
        let mut pattern = self.expect_str_and_eol(line)?;
        if kw == "rsource" || kw == "orsource" {
            if let Some(dir) = Path::new(&r.filename).parent() {
                pattern = dir.join(&pattern).to_string_lossy().into_owned();
            }
        }

        let filenames = glob::expand(self.kconf.srctree.as_deref(), &pattern);
        if filenames.is_empty() && (kw == "source" || kw == "rsource") {
            let srctree = self
                .kconf
                .srctree
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return Err(Error::parse(
                Location::new(&line.filename, line.linenr),
                format!(
                    "'{pattern}' not found (in '{}'). Check that environment variables are set \
                     correctly (e.g. $srctree, which is \"{srctree}\"). Also note that unset \
                     environment variables expand to the empty string.",
                    line.text.trim()
                ),
            ));
        }

        for filename in filenames {
            self.include_path.push((r.filename.clone(), line.linenr));
            if self.include_path.iter().any(|(name, _)| *name == filename) {
                let chain = self
                    .include_path
                    .iter()
                    .map(|(name, nr)| format!("{name}:{nr}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                return Err(Error::RecursiveSource {
                    location: Location::new(&line.filename, line.linenr),
                    file: filename,
                    chain,
                });
            }

            let full = self.kconf.resolve_path(Path::new(&filename));
            let text = std::fs::read_to_string(&full).map_err(|e| Error::io(&full, e))?;
            debug!("entering {filename}");
            self.kconf.kconfig_filenames.push(filename.clone());
            let mut sub = Reader::new(&filename, &text);
            prev = self.parse_block(&mut sub, None, parent, prev)?;
            self.include_path.pop();
        }
        Ok(prev)
    }

    fn parse_props(&mut self, r: &mut Reader, node: NodeId) -> Result<()> {
        let item = self.kconf.nodes[node.0].item;

        while let Some(mut line) = self.next_line(r)? {
            let Some(kw) = line.keyword().map(str::to_string) else {
                r.pending = Some(line);
                return Ok(());
            };

            match kw.as_str() {
                "bool" | "boolean" | "tristate" | "string" | "int" | "hex" => {
                    self.set_type(&line, item, type_of(&kw))?;
                    if !line.at_end() {
                        self.parse_prompt(&mut line, node)?;
                    }
                }
                "def_bool" | "def_tristate" | "def_int" | "def_hex" | "def_string" => {
                    self.set_type(&line, item, type_of(&kw[4..]))?;
                    let value = self.parse_expr(&mut line, false)?;
                    let cond = self.parse_cond(&mut line)?;
                    self.node_mut(node).defaults.push((value, cond));
                }
                "depends" => {
                    if !line.check_word("on") {
                        return Err(line.error("expected 'on' after 'depends'"));
                    }
                    let dep = self.parse_depends(&mut line)?;
                    let n = self.node_mut(node);
                    n.dep = make_and(&n.dep, &dep);
                }
                "help" | "---help---" => {
                    self.expect_eol(&line)?;
                    self.parse_help(r, node)?;
                }
                "select" | "imply" => {
                    if !matches!(item, MenuItem::Symbol(_)) {
                        return Err(line.error(format!("only symbols can {kw}")));
                    }
                    let target = self.expect_nonconst_sym(&mut line)?;
                    let cond = self.parse_cond(&mut line)?;
                    let n = self.node_mut(node);
                    if kw == "select" {
                        n.selects.push((target, cond));
                    } else {
                        n.implies.push((target, cond));
                    }
                }
                "default" => {
                    let value = self.parse_expr(&mut line, false)?;
                    let cond = self.parse_cond(&mut line)?;
                    self.node_mut(node).defaults.push((value, cond));
                }
                "prompt" => self.parse_prompt(&mut line, node)?,
                "range" => {
                    let low = self.expect_sym(&mut line)?;
                    let high = self.expect_sym(&mut line)?;
                    let cond = self.parse_cond(&mut line)?;
                    self.node_mut(node).ranges.push((low, high, cond));
                }
                "visible" => {
                    if !line.check_word("if") {
                        return Err(line.error("expected 'if' after 'visible'"));
                    }
                    let cond = self.expect_expr_and_eol(&mut line)?;
                    let n = self.node_mut(node);
                    n.visibility = make_and(&n.visibility, &cond);
                }
                "option" => self.parse_option(&mut line, node)?,
                "optional" => {
                    let MenuItem::Choice(choice) = item else {
                        return Err(line.error("\"optional\" is only valid for choices"));
                    };
                    self.expect_eol(&line)?;
                    self.kconf.choices[choice.0].is_optional = true;
                }
                "modules" => {
                    let MenuItem::Symbol(sym) = item else {
                        return Err(line.error("\"modules\" is only valid for symbols"));
                    };
                    self.expect_eol(&line)?;
                    self.kconf.modules = sym;
                }
                "transitional" => {
                    let MenuItem::Symbol(sym) = item else {
                        return Err(line.error("\"transitional\" is only valid for symbols"));
                    };
                    self.expect_eol(&line)?;
                    self.kconf.syms[sym.0].is_transitional = true;
                }
                _ => {
                    r.pending = Some(line);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// `depends on EXPR [if COND]`. The qualified form becomes
    /// `!COND || EXPR`.
    fn parse_depends(&mut self, line: &mut Line) -> Result<ExprRef> {
        let dep = self.parse_expr(line, true)?;
        if !line.check_word("if") {
            self.expect_eol(line)?;
            return Ok(dep);
        }
        if line.at_end() {
            return Err(line.error("expected condition after 'if'"));
        }
        let cond = self.parse_expr(line, true)?;
        if matches!(line.peek(), Some(Token::Word(w)) if w == "if") {
            return Err(line.error("multiple 'if' qualifiers on a single 'depends on'"));
        }
        self.expect_eol(line)?;
        Ok(make_or(&Expr::not(cond), &dep))
    }

    fn parse_option(&mut self, line: &mut Line, node: NodeId) -> Result<()> {
        let item = self.kconf.nodes[node.0].item;
        let sym = match item {
            MenuItem::Symbol(s) => Some(s),
            _ => None,
        };

        if line.check_word("env") {
            if !line.check(&Token::Rel(crate::expr::RelOp::Equal)) {
                return Err(line.error("expected '=' after 'env'"));
            }
            let env_var = self.expect_str_and_eol(line)?;
            let Some(sym) = sym else {
                return Err(line.error("'option env' is only valid for symbols"));
            };
            self.kconf.syms[sym.0].env_var = Some(env_var.clone());
            self.kconf.env_vars.insert(env_var.clone());
            let name = self.kconf.syms[sym.0].name.clone();
            match std::env::var(&env_var) {
                Ok(value) => {
                    let value = Expr::sym(self.kconf.lookup_const(&value));
                    let y = self.kconf.y.clone();
                    self.node_mut(node).defaults.push((value, y));
                }
                Err(_) => self.kconf.warn_at(
                    format!(
                        "{name} has 'option env=\"{env_var}\"', but the environment variable \
                         {env_var} is not set"
                    ),
                    Some(line.loc()),
                ),
            }
        } else if line.check_word("defconfig_list") {
            self.expect_eol(line)?;
            let Some(sym) = sym else {
                return Err(line.error("'option defconfig_list' is only valid for symbols"));
            };
            match self.kconf.defconfig_list {
                None => self.kconf.defconfig_list = Some(sym),
                Some(existing) if existing != sym => {
                    let msg = format!(
                        "'option defconfig_list' set on multiple symbols ({} and {}). Only {} \
                         will be used.",
                        self.kconf.syms[existing.0].name,
                        self.kconf.syms[sym.0].name,
                        self.kconf.syms[existing.0].name
                    );
                    self.kconf.warn_msg(msg);
                }
                Some(_) => {}
            }
        } else if line.check_word("modules") {
            self.expect_eol(line)?;
            let Some(sym) = sym else {
                return Err(line.error("'option modules' is only valid for symbols"));
            };
            self.kconf.modules = sym;
        } else if line.check_word("allnoconfig_y") {
            self.expect_eol(line)?;
            let Some(sym) = sym else {
                return Err(line.error("the 'allnoconfig_y' option is only valid for symbols"));
            };
            self.kconf.syms[sym.0].is_allnoconfig_y = true;
        } else {
            return Err(line.error("unrecognized option"));
        }
        Ok(())
    }

    fn set_type(&mut self, line: &Line, item: MenuItem, new_type: SymbolType) -> Result<()> {
        let (old, item) = match item {
            MenuItem::Symbol(s) => (&mut self.kconf.syms[s.0].orig_type, Item::Sym(s)),
            MenuItem::Choice(c) => (&mut self.kconf.choices[c.0].orig_type, Item::Choice(c)),
            _ => return Err(line.error("types are only valid for symbols and choices")),
        };
        let changed = *old != SymbolType::Unknown && *old != new_type;
        *old = new_type;
        if changed {
            let msg = format!(
                "{} defined with multiple types, {} will be used",
                self.kconf.name_and_loc(item),
                new_type
            );
            self.kconf.warn_msg(msg);
        }
        Ok(())
    }

    fn parse_prompt(&mut self, line: &mut Line, node: NodeId) -> Result<()> {
        let what = self.node_desc(node);
        if self.kconf.nodes[node.0].prompt.is_some() {
            self.kconf
                .warn_msg(format!("{what} defined with multiple prompts in single location"));
        }
        let Some(Token::Str(mut prompt)) = line.next_tok() else {
            return Err(line.error("expected prompt string"));
        };
        if prompt.trim() != prompt {
            self.kconf
                .warn_msg(format!("{what} has leading or trailing whitespace in its prompt"));
            prompt = prompt.trim().to_string();
        }
        let cond = self.parse_cond(line)?;
        self.node_mut(node).prompt = Some((prompt, cond));
        Ok(())
    }

    fn parse_help(&mut self, r: &mut Reader, node: NodeId) -> Result<()> {
        let what = self.node_desc(node);
        if self.kconf.nodes[node.0].help.is_some() {
            self.kconf.warn_msg(format!(
                "{what} defined with more than one help text -- only the last one will be used"
            ));
        }

        let first = loop {
            match r.read_raw() {
                None => {
                    self.empty_help(node, &what);
                    return Ok(());
                }
                Some(l) if l.trim().is_empty() => continue,
                Some(l) => break l,
            }
        };

        let expanded = expand_tabs(&first);
        let indent = expanded.len() - expanded.trim_start().len();
        if indent == 0 {
            r.unread_raw();
            self.empty_help(node, &what);
            return Ok(());
        }

        let mut text = String::new();
        text.push_str(&expanded[indent..]);
        text.push('\n');
        while let Some(l) = r.read_raw() {
            if l.trim().is_empty() {
                text.push('\n');
                continue;
            }
            let expanded = expand_tabs(&l);
            if expanded.len() - expanded.trim_start().len() < indent {
                r.unread_raw();
                break;
            }
            text.push_str(&expanded[indent..]);
            text.push('\n');
        }
        self.node_mut(node).help = Some(text.trim_end().to_string());
        Ok(())
    }

    fn empty_help(&mut self, node: NodeId, what: &str) {
        self.kconf
            .warn_msg(format!("{what} has 'help' but empty help text"));
        self.node_mut(node).help = Some(String::new());
    }

    /// How warnings refer to the item of a node.
    fn node_desc(&self, node: NodeId) -> String {
        let n = &self.kconf.nodes[node.0];
        match n.item {
            MenuItem::Symbol(s) => self.kconf.name_and_loc(Item::Sym(s)),
            MenuItem::Choice(c) => self.kconf.name_and_loc(Item::Choice(c)),
            MenuItem::Menu => format!("menu at {}:{}", n.filename, n.linenr),
            MenuItem::Comment => format!("comment at {}:{}", n.filename, n.linenr),
        }
    }

    fn expect_eol(&self, line: &Line) -> Result<()> {
        if line.at_end() {
            Ok(())
        } else {
            Err(line.error("extra tokens at end of line"))
        }
    }

    fn expect_str_and_eol(&self, line: &mut Line) -> Result<String> {
        match line.next_tok() {
            Some(Token::Str(s)) => {
                self.expect_eol(line)?;
                Ok(s)
            }
            _ => Err(line.error("expected string")),
        }
    }

    fn expect_expr_and_eol(&mut self, line: &mut Line) -> Result<ExprRef> {
        let expr = self.parse_expr(line, true)?;
        self.expect_eol(line)?;
        Ok(expr)
    }

    /// Optional `if COND` at the end of a property line.
    fn parse_cond(&mut self, line: &mut Line) -> Result<ExprRef> {
        let cond = if line.check_word("if") {
            self.parse_expr(line, true)?
        } else {
            self.kconf.y.clone()
        };
        self.expect_eol(line)?;
        Ok(cond)
    }

    fn word_sym(&mut self, name: &str) -> SymbolId {
        match name {
            "n" => SymbolId::N,
            "m" => SymbolId::M,
            "y" => SymbolId::Y,
            _ => self.kconf.lookup_or_create(name),
        }
    }

    fn expect_sym(&mut self, line: &mut Line) -> Result<SymbolId> {
        match line.next_tok() {
            Some(Token::Word(w)) if w != "if" => Ok(self.word_sym(&w)),
            Some(Token::Str(s)) => Ok(self.kconf.lookup_const(&s)),
            _ => Err(line.error("expected symbol")),
        }
    }

    fn expect_nonconst_sym(&mut self, line: &mut Line) -> Result<SymbolId> {
        match line.next_tok() {
            Some(Token::Word(w)) if !matches!(w.as_str(), "n" | "m" | "y") => {
                Ok(self.kconf.lookup_or_create(&w))
            }
            _ => Err(line.error("expected nonconstant symbol")),
        }
    }

    /// ```text
    /// expr     := and_expr ['||' expr]
    /// and_expr := factor ['&&' and_expr]
    /// factor   := symbol [relation symbol] | '!' factor | '(' expr ')'
    /// ```
    ///
    /// With `transform_m`, a plain `m` becomes `m && MODULES`. Conditions
    /// use this; default values do not.
    fn parse_expr(&mut self, line: &mut Line, transform_m: bool) -> Result<ExprRef> {
        let and_expr = self.parse_and_expr(line, transform_m)?;
        if line.check(&Token::Or) {
            let rest = self.parse_expr(line, transform_m)?;
            return Ok(Expr::or(and_expr, rest));
        }
        Ok(and_expr)
    }

    fn parse_and_expr(&mut self, line: &mut Line, transform_m: bool) -> Result<ExprRef> {
        let factor = self.parse_factor(line, transform_m)?;
        if line.check(&Token::And) {
            let rest = self.parse_and_expr(line, transform_m)?;
            return Ok(Expr::and(factor, rest));
        }
        Ok(factor)
    }

    fn parse_factor(&mut self, line: &mut Line, transform_m: bool) -> Result<ExprRef> {
        let sym = match line.next_tok() {
            Some(Token::Word(w)) if w == "if" => {
                return Err(line.error("expected an expression before 'if'"));
            }
            Some(Token::Word(w)) => self.word_sym(&w),
            Some(Token::Str(s)) => self.kconf.lookup_const(&s),
            Some(Token::Not) => return Ok(Expr::not(self.parse_factor(line, transform_m)?)),
            Some(Token::LParen) => {
                let expr = self.parse_expr(line, transform_m)?;
                if !line.check(&Token::RParen) {
                    return Err(line.error("malformed expression"));
                }
                return Ok(expr);
            }
            _ => return Err(line.error("malformed expression")),
        };

        if let Some(Token::Rel(op)) = line.peek() {
            let op = *op;
            line.pos += 1;
            let rhs = self.expect_sym(line)?;
            return Ok(std::rc::Rc::new(Expr::Rel(op, sym, rhs)));
        }

        if transform_m && sym == SymbolId::M {
            return Ok(Expr::and(Expr::sym(SymbolId::M), Expr::sym(self.kconf.modules)));
        }
        Ok(Expr::sym(sym))
    }
}

fn type_of(kw: &str) -> SymbolType {
    match kw {
        "bool" | "boolean" => SymbolType::Bool,
        "tristate" => SymbolType::Tristate,
        "string" => SymbolType::String,
        "int" => SymbolType::Int,
        "hex" => SymbolType::Hex,
        _ => SymbolType::Unknown,
    }
}

/// Parses a standalone expression, for [`Kconfig::eval_string`].
pub(crate) fn parse_expr_str(kconf: &mut Kconfig, s: &str) -> Result<ExprRef> {
    let mut pp = DefaultPreprocessor::new();
    let mut parser = Parser {
        kconf,
        pp: &mut pp,
        include_path: Vec::new(),
    };
    let tokens = tokenize(s).map_err(|msg| Error::parse(Location::new("<string>", 1), msg))?;
    let mut line = Line {
        tokens,
        pos: 0,
        filename: "<string>".to_string(),
        linenr: 1,
        text: s.to_string(),
    };
    parser.expect_expr_and_eol(&mut line)
}
