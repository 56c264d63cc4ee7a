//! The interned symbol store.
//!
//! Every distinct terminal, rule reference and character set used by a
//! grammar is interned once and addressed by a dense handle; downstream
//! equality checks are integer comparisons. The store is append-only and
//! handles are never recycled. It is not thread-safe: one compilation owns
//! one store.

use std::{collections::HashMap, fmt::Write};

use cranelift_entity::{entity_impl, PrimaryMap};
use dewy::{charset::CharSet, codepoint::AUGMENT, RcString};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolHandle(u32);

entity_impl! { SymbolHandle }

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Symbol {
    /// A rule reference by name.
    Identifier(RcString),
    /// A literal terminal; `caseless` is the case-insensitivity marker
    /// propagated from the meta-AST.
    Literal { text: RcString, caseless: bool },
    /// A terminal matching one codepoint out of a set.
    Charset(CharSet),
    /// A synthesized non-terminal standing in for a composite subtree.
    Anonymous(u32),
}

impl Symbol {
    pub fn identifier(name: impl Into<RcString>) -> Symbol {
        Symbol::Identifier(name.into())
    }
    pub fn literal(text: impl Into<RcString>, caseless: bool) -> Symbol {
        Symbol::Literal {
            text: text.into(),
            caseless,
        }
    }

    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        match self {
            Symbol::Identifier(name) => write!(buf, "#{name}"),
            Symbol::Literal { text, caseless } => {
                let quote = if *caseless { '\'' } else { '"' };
                write!(buf, "{quote}{text}{quote}")
            }
            Symbol::Charset(set) => set.display_into(buf),
            Symbol::Anonymous(n) => write!(buf, "#__{n}"),
        }
    }

    /// Printed width in characters, computed without rendering.
    pub fn display_width(&self) -> usize {
        match self {
            Symbol::Identifier(name) => 1 + name.chars().count(),
            Symbol::Literal { text, .. } => 2 + text.chars().count(),
            Symbol::Charset(set) => set.display_width(),
            Symbol::Anonymous(n) => 3 + decimal_width(*n as u64),
        }
    }
}

pub(crate) fn decimal_width(mut value: u64) -> usize {
    let mut width = 1;
    while value >= 10 {
        value /= 10;
        width += 1;
    }
    width
}

/// Append-only interning table. Equal values always collide to the same
/// handle, and a value's handle depends only on the order of first
/// occurrences.
#[derive(Default)]
pub struct SymbolStore {
    table: PrimaryMap<SymbolHandle, Symbol>,
    lookup: HashMap<Symbol, SymbolHandle>,
    anonymous: u32,
}

impl SymbolStore {
    pub fn new() -> SymbolStore {
        SymbolStore::default()
    }

    pub fn intern(&mut self, symbol: Symbol) -> SymbolHandle {
        if let Some(&handle) = self.lookup.get(&symbol) {
            return handle;
        }
        let handle = self.table.push(symbol.clone());
        self.lookup.insert(symbol, handle);
        handle
    }

    /// Mint a non-terminal that cannot collide with anything written by the
    /// grammar author.
    pub fn fresh_anonymous(&mut self) -> SymbolHandle {
        let symbol = Symbol::Anonymous(self.anonymous);
        self.anonymous += 1;
        self.intern(symbol)
    }

    /// The end-of-rule marker: a charset holding only the augment codepoint.
    pub fn augment(&mut self) -> SymbolHandle {
        self.intern(Symbol::Charset(CharSet::single(AUGMENT)))
    }

    pub fn get(&self, handle: SymbolHandle) -> &Symbol {
        &self.table[handle]
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolHandle, &Symbol)> {
        self.table.iter()
    }
}
