//! Options-struct extraction from header text.
//!
//! A small line-oriented state machine. Outside of buffered statements the
//! scanner is either at top level or inside a struct body; constructors,
//! multi-line aliases and macro arguments are buffered until complete and
//! then resume whichever of the two states was active. Namespaces and
//! structs are tracked against brace depth.
//!
//! Lines that match nothing are skipped. Declarations come out in the
//! order they open in the source: a struct precedes anything nested in it.

mod lexer;

use std::collections::VecDeque;
use std::path::Path;

use tracing::trace;

use crate::decl::{
    AliasDecl, ConstructorParam, OptionArgDecl, OptionsStructDecl, RawDeclaration, VariantDecl,
};
use crate::error::Result;

/// What the scanner treats as an options struct and as a field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Struct names ending in this suffix are options structs.
    pub struct_suffix: String,
    /// The field-declaring macro, called as `MACRO(type, name)`.
    pub arg_macro: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            struct_suffix: "Options".to_string(),
            arg_macro: "TORCH_ARG".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    TopLevel,
    InStruct,
    InConstructor(String),
    InVariant(String),
    InArg(String),
}

#[derive(Debug)]
struct StructFrame {
    decl: OptionsStructDecl,
    is_options: bool,
    /// Brace depth of the struct body.
    body_depth: usize,
    /// Declarations found inside the body, released after the struct.
    nested: Vec<RawDeclaration>,
}

/// Lazy scanner over one header's text.
pub struct HeaderScanner<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
    config: ScannerConfig,
    state: State,
    in_comment: bool,
    depth: usize,
    namespaces: Vec<(String, usize)>,
    structs: Vec<StructFrame>,
    pending_namespace: Option<Vec<String>>,
    pending_struct: Option<StructFrame>,
    pending_template: Option<Vec<String>>,
    ready: VecDeque<RawDeclaration>,
    finished: bool,
}

/// Scan header text with the default configuration.
pub fn scan(text: &str) -> HeaderScanner<'_> {
    HeaderScanner::new(text, ScannerConfig::default())
}

/// Load a header from disk and collect its declarations.
pub fn load_header(path: &Path, config: &ScannerConfig) -> Result<Vec<RawDeclaration>> {
    let content = std::fs::read_to_string(path)?;
    let decls: Vec<_> = HeaderScanner::new(&content, config.clone()).collect();
    tracing::debug!(path = %path.display(), count = decls.len(), "scanned header");
    Ok(decls)
}

impl<'a> HeaderScanner<'a> {
    pub fn new(text: &'a str, config: ScannerConfig) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
            config,
            state: State::TopLevel,
            in_comment: false,
            depth: 0,
            namespaces: Vec::new(),
            structs: Vec::new(),
            pending_namespace: None,
            pending_struct: None,
            pending_template: None,
            ready: VecDeque::new(),
            finished: false,
        }
    }

    fn feed_line(&mut self, raw: &str) {
        self.line_no += 1;
        let stripped = lexer::strip_comments(raw, &mut self.in_comment);
        let line = stripped.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with('#') {
            trace!(line = self.line_no, "preprocessor line");
            return;
        }

        match std::mem::replace(&mut self.state, State::TopLevel) {
            State::InConstructor(mut buf) => {
                push_line(&mut buf, line);
                if ends_constructor(line) {
                    self.finish_constructor(&buf);
                    self.state = self.resume_state();
                } else {
                    self.state = State::InConstructor(buf);
                }
            }
            State::InVariant(mut buf) => {
                push_line(&mut buf, line);
                if line.contains(';') {
                    self.finish_alias(&buf);
                    self.state = self.resume_state();
                } else {
                    self.state = State::InVariant(buf);
                }
            }
            State::InArg(mut buf) => {
                push_line(&mut buf, line);
                if arg_complete(&buf) {
                    self.finish_arg(&buf);
                    self.state = self.resume_state();
                } else {
                    self.state = State::InArg(buf);
                }
            }
            State::TopLevel | State::InStruct => {
                self.state = self.resume_state();
                self.scan_statement(line);
            }
        }

        self.apply_braces(line);
    }

    fn resume_state(&self) -> State {
        if self.structs.is_empty() {
            State::TopLevel
        } else {
            State::InStruct
        }
    }

    fn scan_statement(&mut self, line: &str) {
        let mut line = line;
        if let Some((params, rest)) = lexer::split_template_prefix(line) {
            self.pending_template = Some(params);
            if rest.is_empty() {
                return;
            }
            line = rest;
        }
        let template = self.pending_template.take().unwrap_or_default();

        if self.pending_struct.is_some() && !line.contains('{') && line.contains(';') {
            trace!(line = self.line_no, "struct header without body");
            self.pending_struct = None;
        }

        let line_no_inline = line.strip_prefix("inline ").unwrap_or(line);
        if let Some(rest) = strip_keyword(line_no_inline, "namespace") {
            self.open_namespace(rest);
            return;
        }
        if let Some(rest) = strip_keyword(line, "struct").or_else(|| strip_keyword(line, "class")) {
            self.open_struct(rest, template);
            return;
        }
        if strip_keyword(line, "using").is_some() || strip_keyword(line, "typedef").is_some() {
            if line.contains(';') {
                self.finish_alias(line);
            } else {
                self.state = State::InVariant(line.to_string());
            }
            return;
        }

        if self.in_options_struct() {
            if self.is_arg_macro(line) {
                if arg_complete(line) {
                    self.finish_arg(line);
                } else {
                    self.state = State::InArg(line.to_string());
                }
                return;
            }
            if self.is_constructor(line) {
                if ends_constructor(line) {
                    self.finish_constructor(line);
                } else {
                    self.state = State::InConstructor(line.to_string());
                }
                return;
            }
        }

        trace!(line = self.line_no, text = line, "ignored line");
    }

    fn apply_braces(&mut self, line: &str) {
        for open in lexer::brace_events(line) {
            if open {
                self.depth += 1;
                if let Some(names) = self.pending_namespace.take() {
                    for name in names {
                        self.namespaces.push((name, self.depth));
                    }
                } else if let Some(mut frame) = self.pending_struct.take() {
                    frame.body_depth = self.depth;
                    self.structs.push(frame);
                }
            } else {
                self.depth = self.depth.saturating_sub(1);
                self.close_scopes();
            }
        }
        if matches!(self.state, State::TopLevel | State::InStruct) {
            self.state = self.resume_state();
        }
    }

    fn close_scopes(&mut self) {
        while self.structs.last().is_some_and(|f| f.body_depth > self.depth) {
            if let Some(frame) = self.structs.pop() {
                self.close_struct(frame);
            }
        }
        while self.namespaces.last().is_some_and(|(_, d)| *d > self.depth) {
            self.namespaces.pop();
        }
    }

    fn close_struct(&mut self, frame: StructFrame) {
        let mut out = Vec::with_capacity(frame.nested.len() + 1);
        if frame.is_options {
            trace!(name = %frame.decl.name, args = frame.decl.args.len(), "options struct closed");
            out.push(RawDeclaration::OptionsStruct(frame.decl));
        }
        out.extend(frame.nested);
        for decl in out {
            self.emit(decl);
        }
    }

    fn emit(&mut self, decl: RawDeclaration) {
        match self.structs.last_mut() {
            Some(parent) => parent.nested.push(decl),
            None => self.ready.push_back(decl),
        }
    }

    fn namespace_path(&self) -> Vec<String> {
        self.namespaces.iter().map(|(n, _)| n.clone()).collect()
    }

    fn in_options_struct(&self) -> bool {
        self.structs.last().is_some_and(|f| f.is_options)
    }

    fn open_namespace(&mut self, rest: &str) {
        if rest.contains('=') {
            trace!(line = self.line_no, "namespace alias");
            return;
        }
        let head = rest.split('{').next().unwrap_or("").trim();
        let names = if head.is_empty() {
            vec![String::new()]
        } else {
            head.split("::").map(|n| n.trim().to_string()).collect()
        };
        self.pending_namespace = Some(names);
    }

    fn open_struct(&mut self, rest: &str, template_params: Vec<String>) {
        let rest = rest.trim();
        if rest.ends_with(';') && !rest.contains('{') {
            trace!(line = self.line_no, "forward declaration");
            return;
        }

        let mut tokens = rest;
        let (name, after) = loop {
            match lexer::leading_ident(tokens) {
                Some((ident, after)) if lexer::is_macro_token(ident) => tokens = after,
                Some(found) => break found,
                None => break ("", tokens),
            }
        };
        let name = name.rsplit("::").next().unwrap_or(name);
        let after = after.trim_start();
        let specialization = after.starts_with('<');
        let after = after.strip_prefix("final").unwrap_or(after).trim_start();

        let parent = after.strip_prefix(':').and_then(|bases| {
            let bases = bases.split('{').next().unwrap_or("");
            let first = lexer::split_top_level(bases, ',').into_iter().next()?;
            let base = first
                .split_whitespace()
                .filter(|w| !matches!(*w, "public" | "private" | "protected" | "virtual"))
                .collect::<Vec<_>>()
                .join(" ");
            (!base.is_empty()).then_some(base)
        });

        let is_options = !specialization
            && !name.is_empty()
            && name.ends_with(self.config.struct_suffix.as_str());

        self.pending_struct = Some(StructFrame {
            decl: OptionsStructDecl {
                name: name.to_string(),
                namespace: self.namespace_path(),
                template_params,
                parent,
                args: Vec::new(),
                constructor: None,
            },
            is_options,
            body_depth: 0,
            nested: Vec::new(),
        });
    }

    fn is_arg_macro(&self, line: &str) -> bool {
        line.strip_prefix(self.config.arg_macro.as_str())
            .is_some_and(|r| r.trim_start().starts_with('('))
    }

    fn is_constructor(&self, line: &str) -> bool {
        let Some(frame) = self.structs.last() else {
            return false;
        };
        let line = line.strip_prefix("explicit ").map_or(line, str::trim_start);
        line.strip_prefix(frame.decl.name.as_str())
            .is_some_and(|r| r.trim_start().starts_with('('))
    }

    fn finish_arg(&mut self, stmt: &str) {
        let Some(open) = stmt.find('(') else {
            return;
        };
        let Some(close) = lexer::matching_close(stmt, open) else {
            trace!(line = self.line_no, "unbalanced argument macro");
            return;
        };
        let parts = lexer::split_top_level(&stmt[open + 1..close], ',');
        let [native_type, name] = parts.as_slice() else {
            trace!(line = self.line_no, "argument macro with unexpected arity");
            return;
        };
        let default = stmt[close + 1..]
            .trim()
            .strip_prefix('=')
            .map(|d| d.split(';').next().unwrap_or("").trim().to_string())
            .filter(|d| !d.is_empty());

        let arg = OptionArgDecl {
            native_type: native_type.to_string(),
            name: name.to_string(),
            default,
        };
        if let Some(frame) = self.structs.last_mut() {
            frame.decl.args.push(arg);
        }
    }

    fn finish_constructor(&mut self, stmt: &str) {
        let Some(open) = stmt.find('(') else {
            return;
        };
        let Some(close) = lexer::matching_close(stmt, open) else {
            trace!(line = self.line_no, "unbalanced constructor");
            return;
        };
        let Some(frame) = self.structs.last_mut() else {
            return;
        };

        let mut params = Vec::new();
        for param in lexer::split_top_level(&stmt[open + 1..close], ',') {
            let without_default = lexer::split_top_level(param, '=')
                .into_iter()
                .next()
                .unwrap_or(param);
            match lexer::trailing_ident(without_default) {
                Some((ty, name)) if !ty.is_empty() => params.push(ConstructorParam {
                    native_type: ty.to_string(),
                    name: name.to_string(),
                }),
                _ => trace!(param, "unnamed constructor parameter"),
            }
        }

        if params.len() == 1 && params[0].native_type.contains(frame.decl.name.as_str()) {
            trace!(name = %frame.decl.name, "copy constructor ignored");
            return;
        }
        match &frame.decl.constructor {
            Some(existing) if !existing.is_empty() || params.is_empty() => {
                trace!(name = %frame.decl.name, "additional constructor ignored");
            }
            _ => frame.decl.constructor = Some(params),
        }
    }

    fn finish_alias(&mut self, buf: &str) {
        let stmt = buf.split(';').next().unwrap_or("").trim();

        let (name, target) = if let Some(rest) = strip_keyword(stmt, "using") {
            if strip_keyword(rest.trim_start(), "namespace").is_some() {
                return;
            }
            let Some((name, target)) = rest.split_once('=') else {
                trace!(line = self.line_no, "using declaration");
                return;
            };
            (name.trim(), target.trim())
        } else if let Some(rest) = strip_keyword(stmt, "typedef") {
            let Some((target, name)) = lexer::trailing_ident(rest) else {
                return;
            };
            (name, target.trim())
        } else {
            return;
        };
        if name.is_empty() || target.is_empty() {
            return;
        }

        let scope = self
            .structs
            .last()
            .map(|f| f.decl.name.clone())
            .filter(|n| !n.is_empty());
        let namespace = self.namespace_path();
        let decl = match variant_arms(target) {
            Some(arms) => RawDeclaration::VariantEnum(VariantDecl {
                name: name.to_string(),
                namespace,
                scope,
                arms,
            }),
            None => RawDeclaration::TypeAlias(AliasDecl {
                name: name.to_string(),
                target: target.to_string(),
                namespace,
                scope,
            }),
        };
        self.emit(decl);
    }

    fn finish(&mut self) {
        match std::mem::replace(&mut self.state, State::TopLevel) {
            State::TopLevel | State::InStruct => {}
            _ => trace!("unterminated statement at end of input"),
        }
        self.pending_struct = None;
        while let Some(frame) = self.structs.pop() {
            self.close_struct(frame);
        }
        self.finished = true;
    }
}

impl Iterator for HeaderScanner<'_> {
    type Item = RawDeclaration;

    fn next(&mut self) -> Option<RawDeclaration> {
        loop {
            if let Some(decl) = self.ready.pop_front() {
                return Some(decl);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some(line) => self.feed_line(line),
                None => self.finish(),
            }
        }
    }
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(line);
}

fn strip_keyword<'s>(line: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '{' => Some(rest),
        Some(_) => None,
    }
}

fn ends_constructor(line: &str) -> bool {
    line.contains(';') || line.contains('{') || line.starts_with(':') || line.ends_with(':')
}

fn arg_complete(stmt: &str) -> bool {
    stmt.find('(')
        .is_some_and(|open| lexer::matching_close(stmt, open).is_some())
}

fn variant_arms(target: &str) -> Option<Vec<String>> {
    let open = target.find('<')?;
    let head = target[..open].trim();
    if head.rsplit("::").next()? != "variant" {
        return None;
    }
    let close = lexer::matching_close(target, open)?;
    Some(
        lexer::split_top_level(&target[open + 1..close], ',')
            .into_iter()
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
