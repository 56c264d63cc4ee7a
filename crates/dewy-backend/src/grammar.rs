//! Lowering of folded rule bodies into context-free productions.
//!
//! Every production is a head symbol and a right-hand string of symbol
//! handles. Composite subtrees that a symbol string cannot express
//! (alternation, repetition) are pulled out under synthesized anonymous
//! heads; the order-constraint operators become table filter entries for the
//! GLR table builder.

use std::{borrow::Cow, fmt::Display, fmt::Write};

use cranelift_entity::{entity_impl, PrimaryMap};
use dewy::{ast::Expr, RcString};

use crate::symbols::{Symbol, SymbolHandle, SymbolStore};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProductionHandle(u32);

entity_impl! { ProductionHandle }

/// `head → body…`; an empty body derives the empty string.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Production {
    pub head: SymbolHandle,
    pub body: Vec<SymbolHandle>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterKind {
    /// `A - B`: matches of the subject equal to a match of the operand are
    /// discarded.
    Reject,
    /// `A / B`: the subject must not be followed by the operand.
    NoFollow,
    /// `A > B`: prefer the longer parse of the subject.
    Greater,
    /// `A < B`: prefer the shorter parse of the subject.
    Less,
}

impl FilterKind {
    pub fn name(self) -> &'static str {
        match self {
            FilterKind::Reject => "reject",
            FilterKind::NoFollow => "nofollow",
            FilterKind::Greater => "greater",
            FilterKind::Less => "less",
        }
    }
}

/// A match-filtering constraint the plain production form cannot carry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Filter {
    pub kind: FilterKind,
    pub subject: SymbolHandle,
    pub operand: SymbolHandle,
}

/// Fatal lowering error; a set operator survived folding with non-set
/// operands, or a caseless wrapper holds something other than a string.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LowerError {
    pub rule: RcString,
    pub message: Cow<'static, str>,
}

impl LowerError {
    fn new(rule: &RcString, message: &'static str) -> LowerError {
        LowerError {
            rule: rule.clone(),
            message: message.into(),
        }
    }
}

impl Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule #{}: {}", self.rule, self.message)
    }
}

impl std::error::Error for LowerError {}

#[derive(Default)]
pub struct Grammar {
    pub symbols: SymbolStore,
    pub productions: PrimaryMap<ProductionHandle, Production>,
    pub filters: Vec<Filter>,
    pub start: Option<SymbolHandle>,
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Lower one folded rule body. Defining the same name twice accumulates
    /// alternatives.
    pub fn add_rule(&mut self, name: &RcString, body: &Expr) -> Result<SymbolHandle, LowerError> {
        let head = self.symbols.intern(Symbol::Identifier(name.clone()));
        let mut cx = LowerCx { grammar: self, rule: name };
        for alternative in alternatives(body) {
            let body = cx.lower_string(alternative)?;
            cx.grammar.push_production(head, body);
        }
        Ok(head)
    }

    /// Add the augmented start production `S' → S ⟨augment⟩` and remember
    /// the start symbol.
    pub fn set_start(&mut self, start: SymbolHandle) -> SymbolHandle {
        let augment = self.symbols.augment();
        let head = self.symbols.fresh_anonymous();
        self.push_production(head, vec![start, augment]);
        self.start = Some(head);
        head
    }

    fn push_production(&mut self, head: SymbolHandle, body: Vec<SymbolHandle>) -> ProductionHandle {
        self.productions.push(Production { head, body })
    }

    pub fn productions_of(
        &self,
        head: SymbolHandle,
    ) -> impl Iterator<Item = (ProductionHandle, &Production)> {
        self.productions.iter().filter(move |(_, p)| p.head == head)
    }

    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        for (_, production) in self.productions.iter() {
            self.symbols.get(production.head).display_into(buf)?;
            buf.write_str(" ->")?;
            if production.body.is_empty() {
                buf.write_str(" \\e")?;
            }
            for &symbol in &production.body {
                buf.write_char(' ')?;
                self.symbols.get(symbol).display_into(buf)?;
            }
            buf.write_char('\n')?;
        }
        for filter in &self.filters {
            write!(buf, "{}(", filter.kind.name())?;
            self.symbols.get(filter.subject).display_into(buf)?;
            buf.write_str(", ")?;
            self.symbols.get(filter.operand).display_into(buf)?;
            buf.write_str(")\n")?;
        }
        Ok(())
    }
}

/// The alternatives of a rule body: the right-leaning spine of `or` nodes.
fn alternatives(body: &Expr) -> Vec<&Expr> {
    let mut out = Vec::new();
    let mut cursor = body;
    while let Expr::Or(left, right) = cursor {
        out.push(&**left);
        cursor = right;
    }
    out.push(cursor);
    out
}

struct LowerCx<'a> {
    grammar: &'a mut Grammar,
    rule: &'a RcString,
}

impl<'a> LowerCx<'a> {
    /// Post-order lowering of a subtree into a symbol string.
    fn lower_string(&mut self, ast: &Expr) -> Result<Vec<SymbolHandle>, LowerError> {
        let symbols = &mut self.grammar.symbols;
        match ast {
            Expr::Eps => Ok(vec![]),
            Expr::String(text) => {
                if text.is_empty() {
                    return Ok(vec![]);
                }
                Ok(vec![symbols.intern(Symbol::Literal {
                    text: text.clone(),
                    caseless: false,
                })])
            }
            Expr::Caseless(inner) => match &**inner {
                Expr::String(text) => Ok(vec![symbols.intern(Symbol::Literal {
                    text: text.clone(),
                    caseless: true,
                })]),
                _ => Err(LowerError::new(
                    self.rule,
                    "caseless wrapper does not hold a string",
                )),
            },
            Expr::Identifier(name) => Ok(vec![symbols.intern(Symbol::Identifier(name.clone()))]),
            Expr::Charset(set) => Ok(vec![symbols.intern(Symbol::Charset(set.clone()))]),
            Expr::Capture(inner) => self.lower_string(inner),
            Expr::Cat(children) => {
                let mut out = Vec::new();
                for child in children {
                    out.extend(self.lower_string(child)?);
                }
                Ok(out)
            }
            Expr::Or(..) => {
                let head = self.grammar.symbols.fresh_anonymous();
                for alternative in alternatives(ast) {
                    let body = self.lower_string(alternative)?;
                    self.grammar.push_production(head, body);
                }
                Ok(vec![head])
            }
            Expr::Star(inner) => {
                let head = self.grammar.symbols.fresh_anonymous();
                let mut body = vec![head];
                body.extend(self.lower_string(inner)?);
                self.grammar.push_production(head, vec![]);
                self.grammar.push_production(head, body);
                Ok(vec![head])
            }
            Expr::Plus(inner) => {
                let head = self.grammar.symbols.fresh_anonymous();
                let once = self.lower_string(inner)?;
                let mut more = vec![head];
                more.extend(once.iter().copied());
                self.grammar.push_production(head, once);
                self.grammar.push_production(head, more);
                Ok(vec![head])
            }
            Expr::Maybe(inner) => {
                let head = self.grammar.symbols.fresh_anonymous();
                let body = self.lower_string(inner)?;
                self.grammar.push_production(head, vec![]);
                self.grammar.push_production(head, body);
                Ok(vec![head])
            }
            Expr::Count(count, inner) => {
                let once = self.lower_string(inner)?;
                let mut out = Vec::with_capacity(once.len() * *count as usize);
                for _ in 0..*count {
                    out.extend(once.iter().copied());
                }
                Ok(out)
            }
            Expr::Reject(l, r) => self.lower_filter(FilterKind::Reject, l, r),
            Expr::NoFollow(l, r) => self.lower_filter(FilterKind::NoFollow, l, r),
            Expr::Greater(l, r) => self.lower_filter(FilterKind::Greater, l, r),
            Expr::Less(l, r) => self.lower_filter(FilterKind::Less, l, r),
            Expr::Complement(_) | Expr::Intersect(..) => Err(LowerError::new(
                self.rule,
                "set operation applied to operands that are not character sets",
            )),
        }
    }

    fn lower_filter(
        &mut self,
        kind: FilterKind,
        left: &Expr,
        right: &Expr,
    ) -> Result<Vec<SymbolHandle>, LowerError> {
        let subject = self.lower_symbol(left)?;
        let operand = self.lower_symbol(right)?;
        self.grammar.filters.push(Filter {
            kind,
            subject,
            operand,
        });
        Ok(vec![subject])
    }

    /// Lower a subtree to exactly one symbol, wrapping longer strings under
    /// an anonymous head.
    fn lower_symbol(&mut self, ast: &Expr) -> Result<SymbolHandle, LowerError> {
        let string = self.lower_string(ast)?;
        if string.len() == 1 {
            return Ok(string[0]);
        }
        let head = self.grammar.symbols.fresh_anonymous();
        self.grammar.push_production(head, string);
        Ok(head)
    }
}
