//! Precedence parser over the meta-token sequence.
//!
//! Each call scans its token window at bracket depth zero for the weakest
//! operator present and splits the window there; both halves are strictly
//! shorter, which bounds the recursion. Whitespace tokens must already be
//! stripped (see [`crate::token::strip_whitespace`]).

use crate::{
    charset::CharSet,
    error::ParseError,
    token::{Token, TokenKind},
};

use super::{Expr, File, Rule};

/// Parse a whole token sequence as one expression.
pub fn parse_expr(tokens: &[Token]) -> Result<Expr, ParseError> {
    Parser { tokens }.expr(0, tokens.len())
}

/// Parse a sequence of `#name = body ;` definitions.
pub fn parse_file(tokens: &[Token]) -> Result<File, ParseError> {
    let mut rules = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        if matches!(tokens[start].kind, TokenKind::Semicolon) {
            start += 1;
            continue;
        }
        let end = tokens[start..]
            .iter()
            .position(|t| matches!(t.kind, TokenKind::Semicolon))
            .map_or(tokens.len(), |p| start + p);
        rules.push(parse_rule(tokens, start, end)?);
        start = end + 1;
    }
    Ok(File { rules })
}

fn parse_rule(tokens: &[Token], lo: usize, hi: usize) -> Result<Rule, ParseError> {
    let name = match tokens[lo..hi].first().map(|t| &t.kind) {
        Some(TokenKind::Hashtag(name)) => name.clone(),
        _ => return Err(ParseError::new(lo, "expected a rule name")),
    };
    match tokens[lo + 1..hi].first().map(|t| &t.kind) {
        Some(TokenKind::Equals) => {}
        _ => return Err(ParseError::new(lo + 1, "expected '=' after the rule name")),
    }
    let body = Parser { tokens }.expr(lo + 2, hi)?;
    Ok(Rule { name, body })
}

/// Binding strength of an infix operator token; weaker operators have larger
/// levels and are split first. See [`Expr::precedence_level`].
fn binary_level(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Ampersand => Some(5),
        TokenKind::Minus => Some(6),
        TokenKind::Gt | TokenKind::Lt => Some(7),
        TokenKind::Slash => Some(8),
        TokenKind::Pipe => Some(9),
        _ => None,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
}

impl<'a> Parser<'a> {
    fn expr(&self, lo: usize, hi: usize) -> Result<Expr, ParseError> {
        if lo == hi {
            return Ok(Expr::Eps);
        }

        // weakest operator at the top bracket level decides the split; ties
        // go to the rightmost occurrence (left associativity), except
        // alternation which keeps the leftmost
        let mut weakest: Option<(u8, usize)> = None;
        let mut i = lo;
        while i < hi {
            match &self.tokens[i].kind {
                TokenKind::LParen | TokenKind::LBrace => {
                    i = self.find_matching_pair(i, hi)?;
                }
                TokenKind::RParen | TokenKind::RBrace => {
                    return Err(ParseError::new(i, "unbalanced closing bracket"));
                }
                kind => {
                    if let Some(level) = binary_level(kind) {
                        let replace = match weakest {
                            None => true,
                            Some((best, _)) if level != best => level > best,
                            Some(_) => level != 9,
                        };
                        if replace {
                            weakest = Some((level, i));
                        }
                    }
                }
            }
            i += 1;
        }

        if let Some((_, at)) = weakest {
            return self.binary(lo, at, hi);
        }

        // no infix operator: either a single unit or an implicit
        // concatenation of adjacent units
        let end = self.scan_unit_end(lo, hi)?;
        if end == hi {
            return self.unit(lo, hi);
        }

        let mut children = Vec::new();
        let mut start = lo;
        while start < hi {
            let end = self.scan_unit_end(start, hi)?;
            children.push(self.unit(start, end)?);
            start = end;
        }
        Ok(Expr::cat(children))
    }

    fn binary(&self, lo: usize, at: usize, hi: usize) -> Result<Expr, ParseError> {
        let kind = &self.tokens[at].kind;

        // an empty alternative is epsilon; every other operator needs both
        // operands
        if !matches!(kind, TokenKind::Pipe) {
            if at == lo {
                return Err(ParseError::new(at, "operator is missing its left operand"));
            }
            if at + 1 == hi {
                return Err(ParseError::new(at, "operator is missing its right operand"));
            }
        }

        let left = Box::new(self.expr(lo, at)?);
        let right = Box::new(self.expr(at + 1, hi)?);
        Ok(match kind {
            TokenKind::Pipe => Expr::Or(left, right),
            TokenKind::Slash => Expr::NoFollow(left, right),
            TokenKind::Gt => Expr::Greater(left, right),
            TokenKind::Lt => Expr::Less(left, right),
            TokenKind::Minus => Expr::Reject(left, right),
            TokenKind::Ampersand => Expr::Intersect(left, right),
            _ => unreachable!(),
        })
    }

    /// Parse a window known to hold exactly one unit: any number of leading
    /// complements, an atom, any number of repetition suffixes.
    fn unit(&self, lo: usize, hi: usize) -> Result<Expr, ParseError> {
        if matches!(self.tokens[lo].kind, TokenKind::Tilde) {
            if lo + 1 == hi {
                return Err(ParseError::new(lo, "'~' is missing its operand"));
            }
            return Ok(Expr::Complement(Box::new(self.unit(lo + 1, hi)?)));
        }

        match &self.tokens[hi - 1].kind {
            TokenKind::Star => {
                return Ok(Expr::Star(Box::new(self.unit(lo, hi - 1)?)));
            }
            TokenKind::Plus => {
                return Ok(Expr::Plus(Box::new(self.unit(lo, hi - 1)?)));
            }
            TokenKind::Question => {
                return Ok(Expr::Maybe(Box::new(self.unit(lo, hi - 1)?)));
            }
            TokenKind::Integer(n) => {
                if *n == 0 {
                    return Err(ParseError::new(hi - 1, "repetition count of zero"));
                }
                return Ok(Expr::count(*n, self.unit(lo, hi - 1)?));
            }
            _ => {}
        }

        if hi - lo == 1 {
            let token = &self.tokens[lo];
            return match &token.kind {
                TokenKind::Hashtag(name) => Ok(Expr::Identifier(name.clone())),
                TokenKind::Epsilon => Ok(Expr::Eps),
                TokenKind::String(text) => Ok(Expr::String(text.clone())),
                TokenKind::Caseless(text) => {
                    Ok(Expr::Caseless(Box::new(Expr::String(text.clone()))))
                }
                TokenKind::Charset(set) => Ok(Expr::Charset(set.clone())),
                TokenKind::Hex(c) => Ok(Expr::Charset(CharSet::single(*c))),
                TokenKind::Anyset => Ok(Expr::Charset(CharSet::any())),
                kind => Err(ParseError::new(
                    lo,
                    format!("expected an expression, found {}", kind.name()),
                )),
            };
        }

        let kind = &self.tokens[lo].kind;
        if matches!(kind, TokenKind::LParen | TokenKind::LBrace) {
            let close = self.find_matching_pair(lo, hi)?;
            if close == hi - 1 {
                let inner = self.expr(lo + 1, hi - 1)?;
                return Ok(match kind {
                    TokenKind::LParen => Expr::Capture(Box::new(inner)),
                    _ => inner,
                });
            }
        }
        Err(ParseError::new(lo, "malformed expression"))
    }

    /// Exclusive end index of the unit starting at `start`.
    fn scan_unit_end(&self, start: usize, hi: usize) -> Result<usize, ParseError> {
        let mut i = start;
        while i < hi && matches!(self.tokens[i].kind, TokenKind::Tilde) {
            i += 1;
        }
        if i == hi {
            return Err(ParseError::new(start, "'~' is missing its operand"));
        }
        match &self.tokens[i].kind {
            TokenKind::LParen | TokenKind::LBrace => {
                i = self.find_matching_pair(i, hi)? + 1;
            }
            TokenKind::Hashtag(_)
            | TokenKind::Epsilon
            | TokenKind::String(_)
            | TokenKind::Caseless(_)
            | TokenKind::Charset(_)
            | TokenKind::Hex(_)
            | TokenKind::Anyset => i += 1,
            kind => {
                return Err(ParseError::new(
                    i,
                    format!("expected an expression, found {}", kind.name()),
                ));
            }
        }
        while i < hi {
            match self.tokens[i].kind {
                TokenKind::Star
                | TokenKind::Plus
                | TokenKind::Question
                | TokenKind::Integer(_) => i += 1,
                _ => break,
            }
        }
        Ok(i)
    }

    /// Index of the closing bracket matching the opener at `open`. Both
    /// bracket kinds nest freely inside each other.
    fn find_matching_pair(&self, open: usize, hi: usize) -> Result<usize, ParseError> {
        let mut stack = Vec::new();
        for i in open..hi {
            match &self.tokens[i].kind {
                TokenKind::LParen => stack.push(TokenKind::RParen),
                TokenKind::LBrace => stack.push(TokenKind::RBrace),
                kind @ (TokenKind::RParen | TokenKind::RBrace) => match stack.pop() {
                    Some(ref expected) if expected == kind => {
                        if stack.is_empty() {
                            return Ok(i);
                        }
                    }
                    _ => return Err(ParseError::new(i, "mismatched closing bracket")),
                },
                _ => {}
            }
        }
        Err(ParseError::new(open, "unbalanced bracket"))
    }
}
