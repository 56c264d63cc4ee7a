//! The meta-AST: the tree form of a grammar author's rule bodies.
//!
//! Nodes are built bottom-up by the parser, rewritten in place by the folder
//! (a rewrite swaps the node out of its owner's slot and drops the displaced
//! subtree), and consumed by CFG lowering.

pub mod display;
pub mod fold;
pub mod parse;

use crate::{charset::CharSet, RcString};

pub use parse::{parse_expr, parse_file};

#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    /// The empty string.
    Eps,
    /// A literal terminal.
    String(RcString),
    /// Case-insensitive wrapper around a string. Never fused with
    /// case-sensitive neighbors.
    Caseless(Box<Expr>),
    /// Reference to another rule by name.
    Identifier(RcString),
    /// A character set, always in canonical form.
    Charset(CharSet),
    Complement(Box<Expr>),
    Intersect(Box<Expr>, Box<Expr>),
    /// Zero or more repetitions.
    Star(Box<Expr>),
    /// One or more repetitions.
    Plus(Box<Expr>),
    /// Zero or one.
    Maybe(Box<Expr>),
    /// Exactly `n` repetitions, n ≥ 2. Zero is rejected by the parser and a
    /// count of one collapses to the inner node.
    Count(u64, Box<Expr>),
    /// Parenthesized capture group, retained for the eventual parser's
    /// semantic actions.
    Capture(Box<Expr>),
    /// Concatenation of two or more units.
    Cat(Vec<Expr>),
    /// Alternation; union when both sides are sets.
    Or(Box<Expr>, Box<Expr>),
    /// Prefer the longer (greedy) match.
    Greater(Box<Expr>, Box<Expr>),
    /// Prefer the shorter (lazy) match.
    Less(Box<Expr>, Box<Expr>),
    /// Exclusion; set difference when both sides are sets.
    Reject(Box<Expr>, Box<Expr>),
    /// Negative lookahead.
    NoFollow(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Concatenation with the structural invariants applied: no node for an
    /// empty sequence, no 1-element wrapper.
    pub fn cat(mut children: Vec<Expr>) -> Expr {
        match children.len() {
            0 => Expr::Eps,
            1 => children.pop().unwrap(),
            _ => Expr::Cat(children),
        }
    }

    /// Exact repetition; a count of one is the inner node itself. Callers
    /// reject zero before constructing.
    pub fn count(count: u64, inner: Expr) -> Expr {
        match count {
            0 => Expr::Eps,
            1 => inner,
            _ => Expr::Count(count, Box::new(inner)),
        }
    }

    /// Binding strength of the node's operator; smaller binds tighter. Atoms
    /// are level 1, alternation the weakest at level 9. The parser's split
    /// order and the printer's grouping decisions both read this table.
    pub fn precedence_level(&self) -> u8 {
        match self {
            Expr::Eps
            | Expr::String(_)
            | Expr::Caseless(_)
            | Expr::Identifier(_)
            | Expr::Charset(_)
            | Expr::Capture(_) => 1,
            Expr::Star(_) | Expr::Plus(_) | Expr::Maybe(_) | Expr::Count(..) => 2,
            Expr::Complement(_) => 3,
            Expr::Cat(_) => 4,
            Expr::Intersect(..) => 5,
            Expr::Reject(..) => 6,
            Expr::Greater(..) | Expr::Less(..) => 7,
            Expr::NoFollow(..) => 8,
            Expr::Or(..) => 9,
        }
    }

    /// Whether the node reads as one unit in the surface syntax, so that
    /// writing it next to another unit concatenates without an operator.
    pub fn is_single_unit(&self) -> bool {
        self.precedence_level() <= 3
    }
}

/// A named rule definition: `#name = body ;`.
#[derive(Clone, PartialEq, Debug)]
pub struct Rule {
    pub name: RcString,
    pub body: Expr,
}

/// All rule definitions of one grammar file.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct File {
    pub rules: Vec<Rule>,
}

impl File {
    /// Fold every rule body to its fixed point.
    pub fn fold_all(&mut self) {
        for rule in &mut self.rules {
            while fold::fold(&mut rule.body) {}
        }
    }
}
