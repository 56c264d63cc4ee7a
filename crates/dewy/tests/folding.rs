//! End-to-end folding behavior: source text through the scanner and parser,
//! then folded to its fixed point.

use dewy::ast::{fold::fold, parse_expr, Expr};
use dewy::charset::{CharRange, CharSet};
use dewy::codepoint::UNICODE_MAX;
use dewy::error::Diagnostics;
use dewy::token::{scan, strip_whitespace};
use rstest::rstest;

fn parse(src: &str) -> Expr {
    let diagnostics = Diagnostics::new();
    let tokens = strip_whitespace(scan(src.as_bytes(), &diagnostics).unwrap());
    assert!(diagnostics.is_empty());
    parse_expr(&tokens).unwrap()
}

fn folded(src: &str) -> Expr {
    let mut ast = parse(src);
    while fold(&mut ast) {}
    ast
}

fn charset(ranges: &[(u32, u32)]) -> Expr {
    Expr::Charset(CharSet::from_ranges(
        ranges.iter().map(|&(a, b)| CharRange::new(a, b)),
    ))
}

#[rstest]
#[case("[a-f] | [d-z]", "[a-z]")]
#[case("[a-c] | [x]", "[a-cx]")]
#[case("[a-z] - [aeiou]", "[b-df-hj-np-tv-z]")]
#[case("[a-c] & [b-z]", "[b-c]")]
#[case("\"a\" | [b-c]", "[a-c]")]
#[case("[b-c] | \"a\"", "[a-c]")]
#[case("[a-c] - \"b\"", "[ac]")]
#[case("'a' | [b]", "[Aa-b]")]
#[case("~[a-z] & [a-z]", "[]")]
fn charset_folds(#[case] src: &str, #[case] expected: &str) {
    let ast = folded(src);
    assert!(matches!(ast, Expr::Charset(_)), "{src} gave {ast:?}");
    assert_eq!(ast.to_string(), expected, "for {src}");
}

#[rstest]
#[case("\"foo\" \"bar\"", "foobar")]
#[case("\"foo\" \"bar\" \"baz\"", "foobarbaz")]
#[case("\"ab\" 3", "ababab")]
#[case("\\e \"x\" \\e", "x")]
#[case("\"\" \"x\"", "x")]
fn string_folds(#[case] src: &str, #[case] expected: &str) {
    assert_eq!(folded(src), Expr::String(expected.into()), "for {src}");
}

#[test]
fn complement_covers_the_rest_of_the_scalar_range() {
    let ast = folded("~[a-z]");
    assert_eq!(
        ast,
        charset(&[(0, 0x60), (0x7B, UNICODE_MAX)]),
    );
}

#[test]
fn anyset_complement_is_empty() {
    let ast = folded("~\\U");
    assert_eq!(ast, charset(&[]));
}

#[test]
fn mixed_alternation_is_preserved() {
    let ast = folded("\"foo\" | \"bar\"");
    assert_eq!(
        ast,
        Expr::Or(
            Box::new(Expr::String("foo".into())),
            Box::new(Expr::String("bar".into())),
        )
    );
}

#[test]
fn single_character_strings_survive_outside_set_algebra() {
    // "a" next to a string stays textual, it never becomes a charset
    assert_eq!(folded("\"a\" \"b\""), Expr::String("ab".into()));
    let ast = folded("\"a\" | \"b\"");
    assert_eq!(
        ast,
        Expr::Or(
            Box::new(Expr::String("a".into())),
            Box::new(Expr::String("b".into())),
        )
    );
}

#[test]
fn partial_runs_merge_inside_cat() {
    let ast = folded("\"foo\" \"bar\" #rest");
    assert_eq!(
        ast,
        Expr::Cat(vec![
            Expr::String("foobar".into()),
            Expr::Identifier("rest".into()),
        ])
    );
}

#[test]
fn caseless_fuses_only_with_caseless() {
    let caseless = |text: &str| Expr::Caseless(Box::new(Expr::String(text.into())));
    let ast = folded("'ab' 'cd' \"ef\"");
    assert_eq!(
        ast,
        Expr::Cat(vec![caseless("abcd"), Expr::String("ef".into())])
    );
}

#[test]
fn nested_set_expressions_reduce_in_one_fixed_point() {
    let ast = folded("{[a-f] | [d-z]} & ~[x-z]");
    assert_eq!(ast, charset(&[('a' as u32, 'w' as u32)]));
}

#[rstest]
#[case("[a-f] | [d-z]")]
#[case("\"foo\" \"bar\" #rest")]
#[case("~[a-z]")]
#[case("\"ab\" 3 | #x")]
#[case("'ab' 'cd' \"ef\"")]
#[case("#a #b #c | \\e")]
fn folding_is_idempotent(#[case] src: &str) {
    let mut once = parse(src);
    while fold(&mut once) {}
    let mut twice = once.clone();
    assert!(!fold(&mut twice), "second fold changed {src}");
    assert_eq!(once, twice);
}
