//! Meta-tokenizer.
//!
//! Produces the ordered token sequence the expression parser consumes. The
//! scanner is fatal on malformed tokens (unknown characters, unterminated
//! literals, bad escapes) but tolerates ill-formed UTF-8: the codepoint
//! cursor substitutes 0 and a diagnostic is accumulated.

use crate::{
    charset::{CharRange, CharSet},
    codepoint::{
        ascii_case_pair, dec_digit_value, escape_to_codepoint, hex_digit_value,
        is_identifier_continue, is_identifier_start, is_whitespace, parse_base, Codepoints,
        AUGMENT, UNICODE_MAX,
    },
    error::{Diagnostics, ScanError},
    RcString,
};

/// Byte range a token covers in the source, end exclusive. Tokens are the
/// only spanned values in the pipeline; fatal errors carry bare offsets and
/// the AST is position-free.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    fn of(start: usize, end: usize) -> Span {
        Span {
            start: start as u32,
            end: end as u32,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    /// `#name` or a bare letter-started identifier.
    Hashtag(RcString),
    /// `\e`
    Epsilon,
    /// `"…"`
    String(RcString),
    /// `'…'` with two or more codepoints.
    Caseless(RcString),
    /// `[…]`, or a single-quoted single codepoint (scanned together with its
    /// ASCII case pair).
    Charset(CharSet),
    /// `\xHH`, `\XHHHH`, `\uHHHH`, `\UHHHHHHHH`
    Hex(u32),
    /// `\U` with no digits following.
    Anyset,
    Integer(u64),
    Star,
    Plus,
    Question,
    Tilde,
    Pipe,
    Gt,
    Lt,
    Minus,
    Slash,
    Ampersand,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Equals,
    Semicolon,
    Whitespace,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Hashtag(_) => "identifier",
            TokenKind::Epsilon => "'\\e'",
            TokenKind::String(_) => "string",
            TokenKind::Caseless(_) => "caseless string",
            TokenKind::Charset(_) => "character set",
            TokenKind::Hex(_) => "hex literal",
            TokenKind::Anyset => "'\\U'",
            TokenKind::Integer(_) => "count",
            TokenKind::Star => "'*'",
            TokenKind::Plus => "'+'",
            TokenKind::Question => "'?'",
            TokenKind::Tilde => "'~'",
            TokenKind::Pipe => "'|'",
            TokenKind::Gt => "'>'",
            TokenKind::Lt => "'<'",
            TokenKind::Minus => "'-'",
            TokenKind::Slash => "'/'",
            TokenKind::Ampersand => "'&'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Equals => "'='",
            TokenKind::Semicolon => "';'",
            TokenKind::Whitespace => "whitespace",
        }
    }
    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub fn scan(src: &[u8], diagnostics: &Diagnostics) -> Result<Vec<Token>, ScanError> {
    let mut scanner = Scanner {
        cursor: Codepoints::new(src),
        diagnostics,
    };
    scanner.scan_all()
}

/// Drop whitespace tokens before handing the stream to the parser.
pub fn strip_whitespace(mut tokens: Vec<Token>) -> Vec<Token> {
    tokens.retain(|t| !t.kind.is_whitespace());
    tokens
}

struct Scanner<'a> {
    cursor: Codepoints<'a>,
    diagnostics: &'a Diagnostics,
}

impl<'a> Scanner<'a> {
    fn next(&mut self) -> Option<u32> {
        let pos = self.cursor.pos();
        match self.cursor.eat()? {
            Ok(c) => Some(c),
            Err(()) => {
                self.diagnostics.report(pos as u32, "ill-formed UTF-8 byte");
                Some(0)
            }
        }
    }

    fn peek(&self, n: usize) -> Option<u32> {
        self.cursor.peek(n)
    }

    fn scan_all(&mut self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();

        loop {
            let start = self.cursor.pos();
            let Some(c) = self.next() else { break };

            let kind = match c {
                0 => continue,
                c if is_whitespace(c) => {
                    while self.peek(0).is_some_and(is_whitespace) {
                        self.next();
                    }
                    TokenKind::Whitespace
                }
                c if c == '#' as u32 => TokenKind::Hashtag(self.scan_identifier(start)?),
                c if is_identifier_start(c) => {
                    let mut name = String::new();
                    name.push(char::from_u32(c).unwrap());
                    name.push_str(&self.scan_identifier_tail());
                    TokenKind::Hashtag(name.into())
                }
                c if c == '"' as u32 => TokenKind::String(self.scan_quoted('"' as u32, start)?),
                c if c == '\'' as u32 => self.scan_single_quoted(start)?,
                c if c == '[' as u32 => TokenKind::Charset(self.scan_charset(start)?),
                c if c == '\\' as u32 => self.scan_escape_token(start)?,
                c if dec_digit_value(c).is_some() => {
                    let mut digits = vec![c];
                    while self.peek(0).is_some_and(|c| dec_digit_value(c).is_some()) {
                        digits.push(self.next().unwrap());
                    }
                    let value = parse_base(&digits, 10, dec_digit_value)
                        .ok_or_else(|| ScanError::new(start, "count does not fit in 64 bits"))?;
                    TokenKind::Integer(value)
                }
                c if c == '*' as u32 => TokenKind::Star,
                c if c == '+' as u32 => TokenKind::Plus,
                c if c == '?' as u32 => TokenKind::Question,
                c if c == '~' as u32 => TokenKind::Tilde,
                c if c == '|' as u32 => TokenKind::Pipe,
                c if c == '>' as u32 => TokenKind::Gt,
                c if c == '<' as u32 => TokenKind::Lt,
                c if c == '-' as u32 => TokenKind::Minus,
                c if c == '/' as u32 => TokenKind::Slash,
                c if c == '&' as u32 => TokenKind::Ampersand,
                c if c == '(' as u32 => TokenKind::LParen,
                c if c == ')' as u32 => TokenKind::RParen,
                c if c == '{' as u32 => TokenKind::LBrace,
                c if c == '}' as u32 => TokenKind::RBrace,
                c if c == '=' as u32 => TokenKind::Equals,
                c if c == ';' as u32 => TokenKind::Semicolon,
                _ => return Err(ScanError::new(start, "unrecognized character")),
            };

            tokens.push(Token {
                kind,
                span: Span::of(start, self.cursor.pos()),
            });
        }

        Ok(tokens)
    }

    fn scan_identifier(&mut self, start: usize) -> Result<RcString, ScanError> {
        if !self.peek(0).is_some_and(is_identifier_start) {
            return Err(ScanError::new(start, "expected a name after '#'"));
        }
        Ok(self.scan_identifier_tail().into())
    }

    fn scan_identifier_tail(&mut self) -> String {
        let mut name = String::new();
        while self.peek(0).is_some_and(is_identifier_continue) {
            let c = self.next().unwrap();
            name.push(char::from_u32(c).unwrap());
        }
        name
    }

    /// Content of a quoted literal, escapes resolved. The opening quote has
    /// already been consumed.
    fn scan_quoted(&mut self, quote: u32, start: usize) -> Result<RcString, ScanError> {
        let mut text = String::new();
        loop {
            let Some(c) = self.next() else {
                return Err(ScanError::new(start, "unterminated string"));
            };
            let c = match c {
                c if c == quote => break,
                c if c == '\\' as u32 => self.scan_escape_value(start)?,
                c => c,
            };
            let Some(c) = char::from_u32(c) else {
                return Err(ScanError::new(start, "codepoint is out of range for a string"));
            };
            text.push(c);
        }
        Ok(text.into())
    }

    /// `'…'`: one codepoint makes a caseless character set, more make a
    /// caseless string.
    fn scan_single_quoted(&mut self, start: usize) -> Result<TokenKind, ScanError> {
        let text = self.scan_quoted('\'' as u32, start)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let mut set = CharSet::single(c as u32);
                if let Some(pair) = ascii_case_pair(c as u32) {
                    set.insert(CharRange::single(pair));
                }
                Ok(TokenKind::Charset(set))
            }
            _ => Ok(TokenKind::Caseless(text)),
        }
    }

    fn scan_charset(&mut self, start: usize) -> Result<CharSet, ScanError> {
        let mut set = CharSet::new();
        loop {
            let Some(c) = self.next() else {
                return Err(ScanError::new(start, "unterminated character set"));
            };
            if c == ']' as u32 {
                break;
            }
            let lo = if c == '\\' as u32 {
                self.scan_escape_value(start)?
            } else {
                c
            };

            // `a-z` is a range unless the '-' is the last member
            let is_range = self.peek(0) == Some('-' as u32) && self.peek(1) != Some(']' as u32);
            if is_range {
                self.next();
                let Some(c) = self.next() else {
                    return Err(ScanError::new(start, "unterminated character set"));
                };
                let hi = if c == '\\' as u32 {
                    self.scan_escape_value(start)?
                } else {
                    c
                };
                if lo > hi {
                    return Err(ScanError::new(start, "character range is reversed"));
                }
                set.insert(CharRange::new(lo, hi));
            } else {
                set.insert(CharRange::single(lo));
            }
        }
        Ok(set)
    }

    /// Value of an escape sequence; the backslash has been consumed.
    fn scan_escape_value(&mut self, start: usize) -> Result<u32, ScanError> {
        let Some(c) = self.next() else {
            return Err(ScanError::new(start, "unfinished escape sequence"));
        };
        match hex_escape_width(c) {
            Some(width) => {
                let digits = self.scan_hex_digits(width);
                if digits.is_empty() {
                    return Err(ScanError::new(start, "expected hex digits after escape"));
                }
                self.hex_value(&digits, start)
            }
            None => Ok(escape_to_codepoint(c)),
        }
    }

    /// A token starting with `\` outside any literal: epsilon, a hex literal,
    /// or the anyset.
    fn scan_escape_token(&mut self, start: usize) -> Result<TokenKind, ScanError> {
        let Some(c) = self.next() else {
            return Err(ScanError::new(start, "unfinished escape sequence"));
        };
        if c == 'e' as u32 {
            return Ok(TokenKind::Epsilon);
        }
        let Some(width) = hex_escape_width(c) else {
            return Err(ScanError::new(start, "unrecognized escape sequence"));
        };
        let digits = self.scan_hex_digits(width);
        if digits.is_empty() {
            if c == 'U' as u32 {
                return Ok(TokenKind::Anyset);
            }
            return Err(ScanError::new(start, "expected hex digits after escape"));
        }
        Ok(TokenKind::Hex(self.hex_value(&digits, start)?))
    }

    fn scan_hex_digits(&mut self, width: usize) -> Vec<u32> {
        let mut digits = Vec::new();
        while digits.len() < width && self.peek(0).is_some_and(|c| hex_digit_value(c).is_some()) {
            digits.push(self.next().unwrap());
        }
        digits
    }

    fn hex_value(&self, digits: &[u32], start: usize) -> Result<u32, ScanError> {
        let value = parse_base(digits, 16, hex_digit_value)
            .filter(|&v| v <= UNICODE_MAX as u64 || v == AUGMENT as u64)
            .ok_or_else(|| ScanError::new(start, "codepoint is out of range"))?;
        Ok(value as u32)
    }
}

fn hex_escape_width(c: u32) -> Option<usize> {
    match c {
        c if c == 'x' as u32 => Some(2),
        c if c == 'X' as u32 => Some(4),
        c if c == 'u' as u32 => Some(4),
        c if c == 'U' as u32 => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let diagnostics = Diagnostics::new();
        let tokens = scan(src.as_bytes(), &diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        strip_whitespace(tokens).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_a_rule() {
        let kinds = kinds("#sum = #sum [+\\-] #term | \"x\";");
        assert_eq!(kinds[0], TokenKind::Hashtag("sum".into()));
        assert_eq!(kinds[1], TokenKind::Equals);
        assert_eq!(kinds[2], TokenKind::Hashtag("sum".into()));
        assert!(matches!(kinds[3], TokenKind::Charset(ref s)
            if s.contains('+' as u32) && s.contains('-' as u32) && s.count() == 2));
        assert_eq!(kinds[4], TokenKind::Hashtag("term".into()));
        assert_eq!(kinds[5], TokenKind::Pipe);
        assert_eq!(kinds[6], TokenKind::String("x".into()));
        assert_eq!(kinds[7], TokenKind::Semicolon);
    }

    #[test]
    fn single_quotes_fold_case() {
        match &kinds("'a'")[0] {
            TokenKind::Charset(set) => {
                assert!(set.contains('a' as u32) && set.contains('A' as u32));
                assert_eq!(set.count(), 2);
            }
            other => panic!("expected charset, got {other:?}"),
        }
        assert_eq!(kinds("'ab'")[0], TokenKind::Caseless("ab".into()));
        assert_eq!(kinds("\"a\"")[0], TokenKind::String("a".into()));
    }

    #[test]
    fn hex_and_anyset() {
        assert_eq!(kinds("\\x41")[0], TokenKind::Hex(0x41));
        assert_eq!(kinds("\\uABCD")[0], TokenKind::Hex(0xABCD));
        assert_eq!(kinds("\\U0001F596")[0], TokenKind::Hex(0x1F596));
        assert_eq!(kinds("\\U00200000")[0], TokenKind::Hex(AUGMENT));
        assert_eq!(kinds("\\U")[0], TokenKind::Anyset);
        assert_eq!(kinds("\\U *")[0], TokenKind::Anyset);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\tb\n\"\\""#)[0], TokenKind::String("a\tb\n\"\\".into()));
        assert_eq!(kinds(r#""\x41B""#)[0], TokenKind::String("AB".into()));
    }

    #[test]
    fn charset_ranges_and_escapes() {
        match &kinds(r"[a-z\-\]0]")[0] {
            TokenKind::Charset(set) => {
                assert!(set.contains('q' as u32));
                assert!(set.contains('-' as u32));
                assert!(set.contains(']' as u32));
                assert!(set.contains('0' as u32));
                assert!(!set.contains('A' as u32));
            }
            other => panic!("expected charset, got {other:?}"),
        }
        // trailing '-' is a literal member
        match &kinds("[a-]")[0] {
            TokenKind::Charset(set) => {
                assert_eq!(set.count(), 2);
                assert!(set.contains('-' as u32));
            }
            other => panic!("expected charset, got {other:?}"),
        }
    }

    #[test]
    fn fatal_scan_errors() {
        let diagnostics = Diagnostics::new();
        assert_eq!(scan(b"\"abc", &diagnostics).unwrap_err().offset, 0);
        assert_eq!(scan(b"a @", &diagnostics).unwrap_err().offset, 2);
        assert_eq!(scan(b"[z-a]", &diagnostics).unwrap_err().offset, 0);
        assert_eq!(scan(b"\\q", &diagnostics).unwrap_err().offset, 0);
    }

    #[test]
    fn ill_formed_utf8_is_tolerated() {
        let diagnostics = Diagnostics::new();
        let tokens = scan(b"#a \xFF #b", &diagnostics).unwrap();
        let tokens = strip_whitespace(tokens);
        assert_eq!(tokens.len(), 2);
        let reported = diagnostics.take();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].offset, 3);
        assert!(diagnostics.is_empty());
    }
}
