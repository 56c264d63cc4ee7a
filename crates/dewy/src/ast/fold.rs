//! Constant folding over the meta-AST.
//!
//! Two rewrite passes collapse constant subtrees into canonical leaf forms:
//! set algebra over charset leaves and concatenation of adjacent string
//! leaves. Each pass reports whether it changed anything; the driver calls
//! [`fold`] until a full pass is quiet. Every rewrite preserves the language
//! the subtree denotes.

use crate::{charset::CharSet, RcString};

use super::Expr;

/// One charset pass and one string pass. Returns true when either changed
/// the tree; callers iterate to the fixed point.
pub fn fold(ast: &mut Expr) -> bool {
    let mut changed = fold_charsets(ast);
    changed |= fold_strings(ast);
    changed
}

/// A charset leaf, or a string of exactly one codepoint viewed as a
/// singleton set. Promotion is what lets set operators consume
/// single-character strings.
fn promoted(ast: &Expr) -> Option<CharSet> {
    match ast {
        Expr::Charset(set) => Some(set.clone()),
        Expr::String(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(CharSet::single(c as u32)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn charset_leaf(ast: &Expr) -> Option<&CharSet> {
    match ast {
        Expr::Charset(set) => Some(set),
        _ => None,
    }
}

/// Collapse set operations whose operands are (or promote to) charset
/// leaves. Bottom-up, so nested set expressions reduce in one pass.
pub fn fold_charsets(ast: &mut Expr) -> bool {
    let mut changed = match ast {
        Expr::Caseless(inner)
        | Expr::Complement(inner)
        | Expr::Star(inner)
        | Expr::Plus(inner)
        | Expr::Maybe(inner)
        | Expr::Count(_, inner)
        | Expr::Capture(inner) => fold_charsets(inner),
        Expr::Intersect(l, r)
        | Expr::Or(l, r)
        | Expr::Greater(l, r)
        | Expr::Less(l, r)
        | Expr::Reject(l, r)
        | Expr::NoFollow(l, r) => {
            let left = fold_charsets(l);
            fold_charsets(r) | left
        }
        Expr::Cat(children) => {
            let mut changed = false;
            for child in children {
                changed |= fold_charsets(child);
            }
            changed
        }
        Expr::Eps | Expr::String(_) | Expr::Identifier(_) | Expr::Charset(_) => false,
    };

    let replacement = match &*ast {
        // alternation is only a set union when at least one side already is
        // a set; two length-1 strings stay an alternation of strings
        Expr::Or(l, r) => match (charset_leaf(l), charset_leaf(r)) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (Some(a), None) => promoted(r).map(|b| a.union(&b)),
            (None, Some(b)) => promoted(l).map(|a| a.union(b)),
            (None, None) => None,
        },
        Expr::Reject(l, r) => promoted(l).zip(promoted(r)).map(|(a, b)| a.diff(&b)),
        Expr::Intersect(l, r) => promoted(l).zip(promoted(r)).map(|(a, b)| a.intersect(&b)),
        Expr::Complement(inner) => promoted(inner).map(|a| a.complement()),
        _ => None,
    };

    if let Some(set) = replacement {
        *ast = Expr::Charset(set);
        changed = true;
    }
    changed
}

fn concat(left: &str, right: &str) -> RcString {
    format!("{left}{right}").into()
}

/// Collapse constant string structure: empty strings to epsilon, adjacent
/// string leaves of a concatenation into one leaf (caseless wrappers fuse
/// only with each other), counted repetitions of a constant string into the
/// repeated text.
pub fn fold_strings(ast: &mut Expr) -> bool {
    let mut changed = match ast {
        Expr::Caseless(inner)
        | Expr::Complement(inner)
        | Expr::Star(inner)
        | Expr::Plus(inner)
        | Expr::Maybe(inner)
        | Expr::Count(_, inner)
        | Expr::Capture(inner) => fold_strings(inner),
        Expr::Intersect(l, r)
        | Expr::Or(l, r)
        | Expr::Greater(l, r)
        | Expr::Less(l, r)
        | Expr::Reject(l, r)
        | Expr::NoFollow(l, r) => {
            let left = fold_strings(l);
            fold_strings(r) | left
        }
        Expr::Cat(children) => {
            let mut changed = false;
            for child in children {
                changed |= fold_strings(child);
            }
            changed
        }
        Expr::Eps | Expr::String(_) | Expr::Identifier(_) | Expr::Charset(_) => false,
    };

    match ast {
        Expr::String(text) if text.is_empty() => {
            *ast = Expr::Eps;
            changed = true;
        }
        Expr::Caseless(inner) if matches!(**inner, Expr::Eps) => {
            *ast = Expr::Eps;
            changed = true;
        }
        Expr::Count(count, inner) => {
            let repeated = match &**inner {
                Expr::String(text) => Some(Expr::String(text.repeat(*count as usize).into())),
                Expr::Caseless(wrapped) => match &**wrapped {
                    Expr::String(text) => Some(Expr::Caseless(Box::new(Expr::String(
                        text.repeat(*count as usize).into(),
                    )))),
                    _ => None,
                },
                _ => None,
            };
            if let Some(repeated) = repeated {
                *ast = repeated;
                changed = true;
            }
        }
        Expr::Cat(children) => {
            let old = std::mem::take(children);
            let mut merged: Vec<Expr> = Vec::with_capacity(old.len());
            for child in old {
                match child {
                    Expr::Eps => changed = true,
                    Expr::String(text) => {
                        if let Some(Expr::String(prev)) = merged.last_mut() {
                            *prev = concat(prev, &text);
                            changed = true;
                        } else {
                            merged.push(Expr::String(text));
                        }
                    }
                    Expr::Caseless(inner) => {
                        let mut fused = false;
                        if let Expr::String(text) = &*inner {
                            if let Some(Expr::Caseless(prev)) = merged.last_mut() {
                                if let Expr::String(prev_text) = &mut **prev {
                                    *prev_text = concat(prev_text, text);
                                    fused = true;
                                }
                            }
                        }
                        if fused {
                            changed = true;
                        } else {
                            merged.push(Expr::Caseless(inner));
                        }
                    }
                    other => merged.push(other),
                }
            }
            match merged.len() {
                0 => {
                    *ast = Expr::Eps;
                    changed = true;
                }
                1 => {
                    *ast = merged.pop().unwrap();
                    changed = true;
                }
                _ => {
                    if let Expr::Cat(children) = ast {
                        *children = merged;
                    }
                }
            }
        }
        _ => {}
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::CharRange;

    fn folded(mut ast: Expr) -> Expr {
        while fold(&mut ast) {}
        ast
    }

    fn string(text: &str) -> Expr {
        Expr::String(text.into())
    }

    fn range(lo: char, hi: char) -> Expr {
        Expr::Charset(CharSet::from_ranges([CharRange::new(lo as u32, hi as u32)]))
    }

    #[test]
    fn union_of_charsets() {
        let ast = Expr::Or(Box::new(range('a', 'f')), Box::new(range('d', 'z')));
        assert_eq!(folded(ast), range('a', 'z'));
    }

    #[test]
    fn string_promotion_needs_a_set_neighbor() {
        // a length-1 string next to a charset promotes
        let ast = Expr::Or(Box::new(string("a")), Box::new(range('b', 'b')));
        assert_eq!(folded(ast), range('a', 'b'));
        // two strings stay an alternation of strings
        let ast = Expr::Or(Box::new(string("a")), Box::new(string("b")));
        assert_eq!(folded(ast.clone()), ast);
        // reject always needs sets, so both sides promote
        let ast = Expr::Reject(Box::new(range('a', 'c')), Box::new(string("b")));
        let expected = Expr::Charset(CharSet::from_ranges([
            CharRange::single('a' as u32),
            CharRange::single('c' as u32),
        ]));
        assert_eq!(folded(ast), expected);
    }

    #[test]
    fn cat_of_strings_concatenates() {
        let ast = Expr::Cat(vec![string("foo"), string("bar")]);
        assert_eq!(folded(ast), string("foobar"));
    }

    #[test]
    fn mixed_alternation_is_preserved() {
        let ast = Expr::Or(Box::new(string("foo")), Box::new(string("bar")));
        assert_eq!(folded(ast.clone()), ast);
    }

    #[test]
    fn caseless_does_not_fuse_across_case_boundaries() {
        let caseless = |text: &str| Expr::Caseless(Box::new(string(text)));
        let ast = Expr::Cat(vec![caseless("ab"), caseless("cd"), string("ef")]);
        assert_eq!(
            folded(ast),
            Expr::Cat(vec![caseless("abcd"), string("ef")])
        );
    }

    #[test]
    fn epsilon_vanishes_from_cat() {
        let ast = Expr::Cat(vec![Expr::Eps, string("x"), Expr::Eps, range('a', 'z')]);
        assert_eq!(
            folded(ast),
            Expr::Cat(vec![string("x"), range('a', 'z')])
        );
        let ast = Expr::Cat(vec![Expr::Eps, Expr::Eps]);
        assert_eq!(folded(ast), Expr::Eps);
    }

    #[test]
    fn counted_string_unrolls() {
        let ast = Expr::Count(3, Box::new(string("ab")));
        assert_eq!(folded(ast), string("ababab"));
    }

    #[test]
    fn folding_is_idempotent() {
        let cases = [
            Expr::Or(Box::new(range('a', 'f')), Box::new(range('d', 'z'))),
            Expr::Cat(vec![string("foo"), string("bar"), Expr::Identifier("x".into())]),
            Expr::Complement(Box::new(range('a', 'z'))),
            Expr::Count(4, Box::new(Expr::Identifier("x".into()))),
        ];
        for case in cases {
            let mut once = case.clone();
            while fold(&mut once) {}
            let mut twice = once.clone();
            assert!(!fold(&mut twice));
            assert_eq!(once, twice);
        }
    }
}
