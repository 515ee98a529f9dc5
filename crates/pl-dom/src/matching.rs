//! Selector matching
//!
//! Parses and matches the selector subset produced by selector synthesis:
//! compounds of `tag`, `#id` and `:nth-child(n)` joined by the child
//! combinator `>`. Tag names and ids compare ASCII case-insensitively,
//! since synthesized selectors are lower-cased.

use std::iter::Peekable;
use std::str::Chars;

use crate::{DomTree, NodeId};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Empty compound selector at position {0}")]
    EmptyCompound(usize),

    #[error("Unexpected character {0:?}")]
    Unexpected(char),

    #[error("Unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),

    #[error("Invalid :nth-child argument {0:?}")]
    InvalidNth(String),
}

/// One compound selector (`tag#id:nth-child(n)`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    nth_child: Option<usize>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.nth_child.is_none()
    }

    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && !tag.eq_ignore_ascii_case(&elem.name) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if !elem.id().is_some_and(|own| own.eq_ignore_ascii_case(id)) {
                return false;
            }
        }
        if let Some(n) = self.nth_child {
            let position = tree
                .parent(node)
                .and_then(|parent| tree.element_index(parent, node));
            if position != Some(n) {
                return false;
            }
        }
        true
    }
}

/// Parsed selector: compounds joined by child combinators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut chars = input.trim().chars().peekable();
        if chars.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        let mut compounds = Vec::new();
        loop {
            skip_whitespace(&mut chars);
            let compound = parse_compound(&mut chars)?;
            if compound.is_empty() {
                return Err(match chars.peek() {
                    Some(&c) if c != '>' => SelectorError::Unexpected(c),
                    _ => SelectorError::EmptyCompound(compounds.len()),
                });
            }
            compounds.push(compound);

            skip_whitespace(&mut chars);
            match chars.next() {
                None => break,
                Some('>') => continue,
                Some(c) => return Err(SelectorError::Unexpected(c)),
            }
        }

        Ok(Self { compounds })
    }

    /// Check whether `node` matches this selector
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let mut current = Some(node);
        for compound in self.compounds.iter().rev() {
            let Some(id) = current else {
                return false;
            };
            if !compound.matches(tree, id) {
                return false;
            }
            current = tree.parent(id);
        }
        true
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();

    if chars.peek() == Some(&'*') {
        chars.next();
        compound.tag = Some("*".to_string());
    } else {
        let tag = read_ident(chars);
        if !tag.is_empty() {
            compound.tag = Some(tag);
        }
    }

    loop {
        match chars.peek() {
            Some('#') => {
                chars.next();
                let id = read_ident(chars);
                if id.is_empty() {
                    return Err(SelectorError::Unexpected('#'));
                }
                compound.id = Some(id);
            }
            Some(':') => {
                chars.next();
                let pseudo = read_ident(chars);
                if !pseudo.eq_ignore_ascii_case("nth-child") {
                    return Err(SelectorError::UnsupportedPseudo(pseudo));
                }
                if chars.next() != Some('(') {
                    return Err(SelectorError::InvalidNth(String::new()));
                }
                let argument: String = chars.by_ref().take_while(|&c| c != ')').collect();
                let n = argument
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| SelectorError::InvalidNth(argument.clone()))?;
                compound.nth_child = Some(n);
            }
            _ => break,
        }
    }

    Ok(compound)
}

/// Read a CSS identifier, resolving backslash escapes
fn read_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c == '\\' {
            chars.next();
            if let Some(resolved) = read_escape(chars) {
                ident.push(resolved);
            }
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn read_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut hex = String::new();
    while hex.len() < 6 {
        match chars.peek() {
            Some(&c) if c.is_ascii_hexdigit() => {
                hex.push(c);
                chars.next();
            }
            _ => break,
        }
    }

    if hex.is_empty() {
        return chars.next();
    }

    // A single whitespace terminates a hex escape
    if chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    let code = u32::from_str_radix(&hex, 16).ok()?;
    Some(char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}'))
}
