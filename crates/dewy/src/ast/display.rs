//! Printing of meta-AST trees.
//!
//! Two forms: an indented structural repr for debugging, and the surface
//! grammar syntax. The surface printer consults the precedence table and
//! wraps a child in a non-capturing `{…}` group when its operator binds
//! weaker than the parent's, or equally on the non-associative side, so that
//! parsing the printed text reproduces the tree exactly.

use std::fmt::{Display, Write};

use super::{Expr, File};

impl Expr {
    /// Surface grammar syntax.
    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        write_expr(buf, self)
    }

    /// Indented structural dump.
    pub fn display_repr_into(&self, buf: &mut dyn Write, indent: u32) -> std::fmt::Result {
        for _ in 0..indent {
            buf.write_str("  ")?;
        }
        match self {
            Expr::Eps => write!(buf, "Eps")?,
            Expr::String(text) => write!(buf, "String({text:?})")?,
            Expr::Caseless(_) => write!(buf, "Caseless")?,
            Expr::Identifier(name) => write!(buf, "Identifier(#{name})")?,
            Expr::Charset(set) => write!(buf, "Charset({set})")?,
            Expr::Complement(_) => write!(buf, "Complement")?,
            Expr::Intersect(..) => write!(buf, "Intersect")?,
            Expr::Star(_) => write!(buf, "Star")?,
            Expr::Plus(_) => write!(buf, "Plus")?,
            Expr::Maybe(_) => write!(buf, "Maybe")?,
            Expr::Count(count, _) => write!(buf, "Count({count})")?,
            Expr::Capture(_) => write!(buf, "Capture")?,
            Expr::Cat(_) => write!(buf, "Cat")?,
            Expr::Or(..) => write!(buf, "Or")?,
            Expr::Greater(..) => write!(buf, "Greater")?,
            Expr::Less(..) => write!(buf, "Less")?,
            Expr::Reject(..) => write!(buf, "Reject")?,
            Expr::NoFollow(..) => write!(buf, "NoFollow")?,
        }
        buf.write_char('\n')?;
        match self {
            Expr::Caseless(inner)
            | Expr::Complement(inner)
            | Expr::Star(inner)
            | Expr::Plus(inner)
            | Expr::Maybe(inner)
            | Expr::Count(_, inner)
            | Expr::Capture(inner) => inner.display_repr_into(buf, indent + 1)?,
            Expr::Intersect(l, r)
            | Expr::Or(l, r)
            | Expr::Greater(l, r)
            | Expr::Less(l, r)
            | Expr::Reject(l, r)
            | Expr::NoFollow(l, r) => {
                l.display_repr_into(buf, indent + 1)?;
                r.display_repr_into(buf, indent + 1)?;
            }
            Expr::Cat(children) => {
                for child in children {
                    child.display_repr_into(buf, indent + 1)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.display_into(f)
    }
}

fn write_quoted(buf: &mut dyn Write, text: &str, quote: char) -> std::fmt::Result {
    buf.write_char(quote)?;
    for c in text.chars() {
        match c {
            '\\' => buf.write_str("\\\\")?,
            c if c == quote => {
                buf.write_char('\\')?;
                buf.write_char(quote)?;
            }
            '\x07' => buf.write_str("\\a")?,
            '\x08' => buf.write_str("\\b")?,
            '\t' => buf.write_str("\\t")?,
            '\n' => buf.write_str("\\n")?,
            '\x0B' => buf.write_str("\\v")?,
            '\x0C' => buf.write_str("\\f")?,
            '\r' => buf.write_str("\\r")?,
            c if (c as u32) < 0x20 => write!(buf, "\\x{:02X}", c as u32)?,
            c => buf.write_char(c)?,
        }
    }
    buf.write_char(quote)
}

/// Write `child`, grouped in `{…}` when its operator binds weaker than the
/// parent, or equally while sitting on the parent's non-associative side.
fn write_child(
    buf: &mut dyn Write,
    child: &Expr,
    parent_level: u8,
    associative_side: bool,
) -> std::fmt::Result {
    let level = child.precedence_level();
    let grouped = level > parent_level || (level == parent_level && !associative_side);
    if grouped {
        buf.write_char('{')?;
        write_expr(buf, child)?;
        buf.write_char('}')
    } else {
        write_expr(buf, child)
    }
}

fn write_binary(
    buf: &mut dyn Write,
    left: &Expr,
    right: &Expr,
    op: &str,
    level: u8,
    left_associative: bool,
) -> std::fmt::Result {
    write_child(buf, left, level, left_associative)?;
    buf.write_str(op)?;
    write_child(buf, right, level, !left_associative)
}

fn write_expr(buf: &mut dyn Write, ast: &Expr) -> std::fmt::Result {
    match ast {
        Expr::Eps => buf.write_str("\\e"),
        Expr::String(text) => write_quoted(buf, text, '"'),
        Expr::Caseless(inner) => match &**inner {
            Expr::String(text) => write_quoted(buf, text, '\''),
            other => {
                buf.write_char('{')?;
                write_expr(buf, other)?;
                buf.write_char('}')
            }
        },
        Expr::Identifier(name) => write!(buf, "#{name}"),
        Expr::Charset(set) => set.display_into(buf),
        // a complement operand reads as part of the unit only while it is
        // itself a single unit
        Expr::Complement(inner) => {
            buf.write_char('~')?;
            if inner.is_single_unit() {
                write_expr(buf, inner)
            } else {
                buf.write_char('{')?;
                write_expr(buf, inner)?;
                buf.write_char('}')
            }
        }
        Expr::Star(inner) => {
            write_child(buf, inner, 2, true)?;
            buf.write_char('*')
        }
        Expr::Plus(inner) => {
            write_child(buf, inner, 2, true)?;
            buf.write_char('+')
        }
        Expr::Maybe(inner) => {
            write_child(buf, inner, 2, true)?;
            buf.write_char('?')
        }
        // the space keeps the count from gluing onto an identifier
        Expr::Count(count, inner) => {
            write_child(buf, inner, 2, true)?;
            write!(buf, " {count}")
        }
        Expr::Capture(inner) => {
            buf.write_char('(')?;
            write_expr(buf, inner)?;
            buf.write_char(')')
        }
        Expr::Cat(children) => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    buf.write_char(' ')?;
                }
                write_child(buf, child, 4, false)?;
            }
            Ok(())
        }
        Expr::Intersect(l, r) => write_binary(buf, l, r, " & ", 5, true),
        Expr::Reject(l, r) => write_binary(buf, l, r, " - ", 6, true),
        Expr::Greater(l, r) => write_binary(buf, l, r, " > ", 7, true),
        Expr::Less(l, r) => write_binary(buf, l, r, " < ", 7, true),
        Expr::NoFollow(l, r) => write_binary(buf, l, r, " / ", 8, true),
        Expr::Or(l, r) => write_binary(buf, l, r, " | ", 9, false),
    }
}

impl File {
    pub fn display_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        for rule in &self.rules {
            write!(buf, "#{} = ", rule.name)?;
            rule.body.display_into(buf)?;
            buf.write_str(" ;\n")?;
        }
        Ok(())
    }

    pub fn display_repr_into(&self, buf: &mut dyn Write) -> std::fmt::Result {
        for rule in &self.rules {
            write!(buf, "#{} =\n", rule.name)?;
            rule.body.display_repr_into(buf, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Expr {
        Expr::Identifier(name.into())
    }

    #[test]
    fn surface_forms() {
        let or = Expr::Or(Box::new(id("A")), Box::new(Expr::Cat(vec![id("B"), id("C")])));
        assert_eq!(or.to_string(), "#A | #B #C");

        let nested = Expr::Star(Box::new(Expr::Capture(Box::new(id("A")))));
        assert_eq!(nested.to_string(), "(#A)*");

        let grouped = Expr::Star(Box::new(Expr::Or(Box::new(id("A")), Box::new(id("B")))));
        assert_eq!(grouped.to_string(), "{#A | #B}*");

        let count = Expr::Count(3, Box::new(Expr::String("ab".into())));
        assert_eq!(count.to_string(), "\"ab\" 3");

        let complement = Expr::Complement(Box::new(Expr::Star(Box::new(id("A")))));
        assert_eq!(complement.to_string(), "~#A*");
    }

    #[test]
    fn grouping_follows_associativity() {
        let right_leaning = Expr::Or(
            Box::new(id("A")),
            Box::new(Expr::Or(Box::new(id("B")), Box::new(id("C")))),
        );
        assert_eq!(right_leaning.to_string(), "#A | #B | #C");

        let left_leaning = Expr::Or(
            Box::new(Expr::Or(Box::new(id("A")), Box::new(id("B")))),
            Box::new(id("C")),
        );
        assert_eq!(left_leaning.to_string(), "{#A | #B} | #C");

        let rejects = Expr::Reject(
            Box::new(Expr::Reject(Box::new(id("A")), Box::new(id("B")))),
            Box::new(id("C")),
        );
        assert_eq!(rejects.to_string(), "#A - #B - #C");
    }

    #[test]
    fn string_escapes_round_trip_textually() {
        let ast = Expr::String("a\"b\\c\nd".into());
        assert_eq!(ast.to_string(), r#""a\"b\\c\nd""#);
        let caseless = Expr::Caseless(Box::new(Expr::String("it's".into())));
        assert_eq!(caseless.to_string(), r"'it\'s'");
    }

    #[test]
    fn repr_is_indented() {
        let ast = Expr::Or(Box::new(id("A")), Box::new(Expr::String("x".into())));
        let mut buf = String::new();
        ast.display_repr_into(&mut buf, 0).unwrap();
        assert_eq!(buf, "Or\n  Identifier(#A)\n  String(\"x\")\n");
    }
}
