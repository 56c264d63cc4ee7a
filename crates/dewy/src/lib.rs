//! Front-end of the Dewy meta-grammar compiler.
//!
//! The pipeline is: source bytes → meta-tokens ([`token::scan`]) → meta-AST
//! ([`ast::parse_file`]) → folded AST ([`ast::fold`] to a fixed point). The
//! lowering into CFG productions and the RNGLR table primitives live in the
//! `dewy-backend` crate.

pub mod ast;
pub mod charset;
pub mod codepoint;
pub mod error;
pub mod token;

use std::rc::Rc;

pub type RcString = Rc<str>;
