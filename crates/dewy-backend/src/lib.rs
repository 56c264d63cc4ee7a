//! Table side of the Dewy meta-grammar compiler: the interned symbol store,
//! CFG productions lowered from folded rule bodies, and the RNGLR reduction
//! primitive the generalized parser's tables are built from.

pub mod grammar;
pub mod reduction;
pub mod symbols;
