//! Codepoint-level view of raw source bytes.
//!
//! The scanner works on decoded codepoints rather than bytes so that grammar
//! authors can use any Unicode text in strings, identifiers and character
//! sets. Ill-formed UTF-8 is tolerated: the cursor advances one byte and
//! reports codepoint 0, and the caller records a diagnostic.

/// Largest Unicode scalar value.
pub const UNICODE_MAX: u32 = 0x10FFFF;

/// Reserved codepoint marking the end of a meta-rule. First value past the
/// 21-bit codepoint space, so it can never collide with real input.
pub const AUGMENT: u32 = 0x200000;

/// Decode the UTF-8 sequence starting at `src[0]`, returning the codepoint
/// and the number of bytes consumed. `None` when the sequence is ill-formed.
pub fn decode_utf8(src: &[u8]) -> Option<(u32, usize)> {
    let b0 = *src.first()?;

    if b0 < 0x80 {
        return Some((b0 as u32, 1));
    }

    let (len, init) = match b0 {
        0xC0..=0xDF => (2, (b0 & 0x1F) as u32),
        0xE0..=0xEF => (3, (b0 & 0x0F) as u32),
        0xF0..=0xF7 => (4, (b0 & 0x07) as u32),
        _ => return None,
    };

    if src.len() < len {
        return None;
    }

    let mut c = init;
    for &b in &src[1..len] {
        if b >> 6 != 0b10 {
            return None;
        }
        c = c << 6 | (b & 0x3F) as u32;
    }

    // reject overlong encodings and surrogates
    let min = [0, 0, 0x80, 0x800, 0x10000][len];
    if c < min || c > UNICODE_MAX || (0xD800..=0xDFFF).contains(&c) {
        return None;
    }

    Some((c, len))
}

/// Cursor yielding codepoints from a byte slice.
#[derive(Clone)]
pub struct Codepoints<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Codepoints<'a> {
    pub fn new(src: &'a [u8]) -> Codepoints<'a> {
        Self { src, pos: 0 }
    }

    /// Byte offset of the next unread codepoint.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Decode and consume the next codepoint. `Err(())` means the bytes were
    /// ill-formed; the cursor has advanced one byte and the caller should
    /// treat the codepoint as 0 after diagnosing.
    pub fn eat(&mut self) -> Option<Result<u32, ()>> {
        let rest = &self.src[self.pos..];
        if rest.is_empty() {
            return None;
        }
        match decode_utf8(rest) {
            Some((c, len)) => {
                self.pos += len;
                Some(Ok(c))
            }
            None => {
                self.pos += 1;
                Some(Err(()))
            }
        }
    }

    /// Codepoint `n` positions ahead without consuming anything. Ill-formed
    /// sequences read as 0 here; [`Codepoints::eat`] is where they get
    /// diagnosed.
    pub fn peek(&self, n: usize) -> Option<u32> {
        let mut copy = self.clone();
        let mut c = None;
        for _ in 0..=n {
            c = Some(copy.eat()?.unwrap_or(0));
        }
        c
    }
}

/// Number of codepoints in a byte stream; each ill-formed byte counts as one
/// replacement codepoint, matching the cursor's behavior.
pub fn codepoint_length(src: &[u8]) -> usize {
    let mut cursor = Codepoints::new(src);
    let mut len = 0;
    while cursor.eat().is_some() {
        len += 1;
    }
    len
}

pub fn dec_digit_value(c: u32) -> Option<u64> {
    match c {
        0x30..=0x39 => Some((c - 0x30) as u64),
        _ => None,
    }
}

pub fn hex_digit_value(c: u32) -> Option<u64> {
    match c {
        0x30..=0x39 => Some((c - 0x30) as u64),
        0x41..=0x46 => Some((c - 0x41 + 10) as u64),
        0x61..=0x66 => Some((c - 0x61 + 10) as u64),
        _ => None,
    }
}

/// Accumulate digits into a value for an arbitrary base. `None` on overflow
/// or when a codepoint is not a digit of the base.
pub fn parse_base(
    digits: &[u32],
    base: u64,
    digit_value: impl Fn(u32) -> Option<u64>,
) -> Option<u64> {
    let mut val: u64 = 0;
    for &c in digits {
        let d = digit_value(c)?;
        val = val.checked_mul(base)?.checked_add(d)?;
    }
    Some(val)
}

/// The other-cased ASCII letter, if there is one. Case folding outside ASCII
/// is out of scope for the meta-grammar.
pub fn ascii_case_pair(c: u32) -> Option<u32> {
    match c {
        0x41..=0x5A => Some(c + 0x20),
        0x61..=0x7A => Some(c - 0x20),
        _ => None,
    }
}

pub fn is_whitespace(c: u32) -> bool {
    matches!(c, 0x09 | 0x0A | 0x0B | 0x0C | 0x0D | 0x20)
}

pub fn is_identifier_start(c: u32) -> bool {
    c == '_' as u32 || char::from_u32(c).is_some_and(|c| c.is_alphabetic())
}

pub fn is_identifier_continue(c: u32) -> bool {
    c == '_' as u32 || char::from_u32(c).is_some_and(|c| c.is_alphanumeric())
}

/// The literal codepoint named by a character escape. Unrecognized escapes
/// yield the escaped character itself, which covers `\\` `\'` `\"` `\[` `\]`
/// and `\-`.
pub fn escape_to_codepoint(c: u32) -> u32 {
    match c {
        c if c == 'a' as u32 => 0x7,
        c if c == 'b' as u32 => 0x8,
        c if c == 't' as u32 => 0x9,
        c if c == 'n' as u32 => 0xA,
        c if c == 'v' as u32 => 0xB,
        c if c == 'f' as u32 => 0xC,
        c if c == 'r' as u32 => 0xD,
        _ => c,
    }
}

#[test]
fn test_decode_utf8() {
    assert_eq!(decode_utf8(b"a"), Some(('a' as u32, 1)));
    assert_eq!(decode_utf8("π".as_bytes()), Some((0x3C0, 2)));
    assert_eq!(decode_utf8("€".as_bytes()), Some((0x20AC, 3)));
    assert_eq!(decode_utf8("🖖".as_bytes()), Some((0x1F596, 4)));
    // continuation byte with no lead
    assert_eq!(decode_utf8(&[0x80]), None);
    // overlong encoding of '/'
    assert_eq!(decode_utf8(&[0xC0, 0xAF]), None);
    // truncated sequence
    assert_eq!(decode_utf8(&[0xE2, 0x82]), None);
}

#[test]
fn test_cursor_replacement() {
    let mut c = Codepoints::new(&[b'a', 0xFF, b'b']);
    assert_eq!(c.eat(), Some(Ok('a' as u32)));
    assert_eq!(c.eat(), Some(Err(())));
    assert_eq!(c.eat(), Some(Ok('b' as u32)));
    assert_eq!(c.eat(), None);
}

#[test]
fn test_codepoint_length() {
    assert_eq!(codepoint_length(b"abc"), 3);
    assert_eq!(codepoint_length("aπ🖖".as_bytes()), 3);
    assert_eq!(codepoint_length(&[b'a', 0xFF, b'b']), 3);
}

#[test]
fn test_parse_base() {
    let digits: Vec<u32> = "ff".chars().map(|c| c as u32).collect();
    assert_eq!(parse_base(&digits, 16, hex_digit_value), Some(255));
    let digits: Vec<u32> = "123".chars().map(|c| c as u32).collect();
    assert_eq!(parse_base(&digits, 10, dec_digit_value), Some(123));
    assert_eq!(parse_base(&digits, 10, hex_digit_value), Some(0x123));
}
