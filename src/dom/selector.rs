//! CSS selector subset used by generated container paths and the scanner.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! presence and the `= *= ^= $= ~=` operators, `:first-child`,
//! `:nth-child(n)`, `:not(<compound>)`, the descendant and child combinators,
//! and comma-separated groups. Identifiers and quoted values accept CSS
//! backslash escapes.

use std::collections::HashSet;

use crate::dom::document::{Document, NodeId};
use crate::error::SelectorError;

// ============================================================================
// Parsed form
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    Contains { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Includes { key: String, value: String },
}

impl AttrCondition {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            AttrCondition::Exists { key } => doc.has_attr(node, key),
            AttrCondition::Eq { key, value } => doc.attr(node, key) == Some(value.as_str()),
            AttrCondition::Contains { key, value } => doc
                .attr(node, key)
                .is_some_and(|attr| !value.is_empty() && attr.contains(value.as_str())),
            AttrCondition::StartsWith { key, value } => doc
                .attr(node, key)
                .is_some_and(|attr| !value.is_empty() && attr.starts_with(value.as_str())),
            AttrCondition::EndsWith { key, value } => doc
                .attr(node, key)
                .is_some_and(|attr| !value.is_empty() && attr.ends_with(value.as_str())),
            AttrCondition::Includes { key, value } => doc
                .attr(node, key)
                .is_some_and(|attr| attr.split_whitespace().any(|t| t == value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    NthChild(usize),
    Not(Box<Compound>),
}

/// One compound selector, e.g. `div.form-group[data-name="city"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
    pub pseudo: Vec<PseudoClass>,
}

impl Compound {
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };

        if let Some(tag) = &self.tag {
            if element.tag() != tag.as_str() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if self.classes.iter().any(|c| !element.has_class(c)) {
            return false;
        }
        if self.attrs.iter().any(|a| !a.matches(doc, node)) {
            return false;
        }

        self.pseudo.iter().all(|p| match p {
            PseudoClass::FirstChild => doc.child_index(node) == Some(1),
            PseudoClass::NthChild(n) => doc.child_index(node) == Some(*n),
            PseudoClass::Not(inner) => !inner.matches(doc, node),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A compound plus the combinator joining it to the compound on its left.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    combinator: Combinator,
    compound: Compound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<Part>,
}

/// Work item for the right-to-left matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Step {
    /// `node` matched part `k`; the parts left of it still need matching.
    Matched(NodeId, usize),
    /// Look for part `k` at `node` or any of its ancestors.
    Seek(NodeId, usize),
}

impl Complex {
    /// Right-to-left match with backtracking over ancestor choices.
    ///
    /// The work list lives on the heap and every step is expanded at most
    /// once, so deep documents neither overflow the stack nor blow up
    /// combinatorially. Nearer ancestors are tried first.
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(last) = self.parts.len().checked_sub(1) else {
            return false;
        };
        if !self.parts[last].compound.matches(doc, node) {
            return false;
        }

        let mut pending = vec![Step::Matched(node, last)];
        let mut seen: HashSet<Step> = HashSet::new();
        while let Some(step) = pending.pop() {
            if !seen.insert(step) {
                continue;
            }
            match step {
                Step::Matched(_, 0) => return true,
                Step::Matched(current, k) => {
                    let Some(parent) = doc.parent_element(current) else {
                        continue;
                    };
                    match self.parts[k].combinator {
                        Combinator::Child => {
                            if self.parts[k - 1].compound.matches(doc, parent) {
                                pending.push(Step::Matched(parent, k - 1));
                            }
                        }
                        Combinator::Descendant => pending.push(Step::Seek(parent, k - 1)),
                    }
                }
                Step::Seek(candidate, k) => {
                    if let Some(parent) = doc.parent_element(candidate) {
                        pending.push(Step::Seek(parent, k));
                    }
                    if self.parts[k].compound.matches(doc, candidate) {
                        pending.push(Step::Matched(candidate, k));
                    }
                }
            }
        }
        false
    }
}

/// A parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

impl Selector {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        if selector.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut cursor = Cursor::new(selector);
        let mut groups = Vec::new();
        loop {
            groups.push(cursor.parse_complex()?);
            cursor.skip_ws();
            match cursor.peek() {
                None => break,
                Some(',') => {
                    cursor.bump();
                }
                Some(c) => {
                    return Err(cursor.error(format!("unexpected '{}'", c)));
                }
            }
        }
        Ok(Selector { groups })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node) && self.groups.iter().any(|g| g.matches(doc, node))
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Cursor<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Cursor {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::unsupported(self.source, reason)
    }

    fn parse_complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let mut parts = vec![Part {
            combinator: Combinator::Descendant,
            compound: self.parse_compound()?,
        }];

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some('+') | Some('~') => {
                    return Err(self.error("sibling combinators are not supported"));
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            parts.push(Part {
                combinator,
                compound: self.parse_compound()?,
            });
        }

        Ok(Complex { parts })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut empty = true;

        if self.eat('*') {
            empty = false;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            empty = false;
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.bump();
                    compound.pseudo.push(self.parse_pseudo()?);
                }
                _ => break,
            }
            empty = false;
        }

        if empty {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a selector, found '{}'", c)),
                None => self.error("expected a selector"),
            });
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrCondition, SelectorError> {
        self.skip_ws();
        let key = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.eat(']') {
            return Ok(AttrCondition::Exists { key });
        }

        let op = match self.bump() {
            Some('=') => None,
            Some(c @ ('*' | '^' | '$' | '~')) => {
                if !self.eat('=') {
                    return Err(self.error("unsupported attribute operator"));
                }
                Some(c)
            }
            _ => return Err(self.error("unsupported attribute operator")),
        };
        self.skip_ws();

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.parse_quoted(q)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }

        Ok(match op {
            None => AttrCondition::Eq { key, value },
            Some('*') => AttrCondition::Contains { key, value },
            Some('^') => AttrCondition::StartsWith { key, value },
            Some('$') => AttrCondition::EndsWith { key, value },
            _ => AttrCondition::Includes { key, value },
        })
    }

    fn parse_pseudo(&mut self) -> Result<PseudoClass, SelectorError> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(PseudoClass::FirstChild),
            "nth-child" => {
                self.expect_open()?;
                let mut digits = String::new();
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    digits.push(c);
                    self.bump();
                }
                self.expect_close()?;
                let n = digits
                    .parse::<usize>()
                    .map_err(|_| self.error("nth-child expects a positive integer"))?;
                if n == 0 {
                    return Err(self.error("nth-child expects a positive integer"));
                }
                Ok(PseudoClass::NthChild(n))
            }
            "not" => {
                self.expect_open()?;
                let inner = self.parse_compound()?;
                if inner.pseudo.iter().any(|p| matches!(p, PseudoClass::Not(_))) {
                    return Err(self.error(":not() cannot be nested"));
                }
                self.expect_close()?;
                Ok(PseudoClass::Not(Box::new(inner)))
            }
            other => Err(self.error(format!("unsupported pseudo-class ':{}'", other))),
        }
    }

    fn expect_open(&mut self) -> Result<(), SelectorError> {
        if !self.eat('(') {
            return Err(self.error("expected '('"));
        }
        self.skip_ws();
        Ok(())
    }

    fn expect_close(&mut self) -> Result<(), SelectorError> {
        self.skip_ws();
        if !self.eat(')') {
            return Err(self.error("expected ')'"));
        }
        Ok(())
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    out.push(self.parse_escape()?);
                }
                Some(c) if is_ident_char(c) => {
                    self.bump();
                    out.push(c);
                }
                _ => break,
            }
        }
        if out.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(out)
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => out.push(self.parse_escape()?),
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    /// Called after the backslash.
    fn parse_escape(&mut self) -> Result<char, SelectorError> {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.bump();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            return self.bump().ok_or_else(|| self.error("dangling escape"));
        }

        // A single whitespace terminates a hex escape.
        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid escape"))?;
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{fffd}'))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

// ============================================================================
// Escaping for selector builders
// ============================================================================

/// Escape a value for use as an identifier (`#id`, `.class`).
pub fn css_escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (i == 0 || (i == 1 && value.starts_with('-')));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else if is_ident_char(c) {
            out.push(c);
        } else if c.is_control() {
            out.push_str(&format!("\\{:x} ", c as u32));
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    if out == "-" {
        return "\\-".to_string();
    }
    out
}

/// Quote a value for use inside `[attr="..."]`.
pub fn css_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\{:x} ", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
