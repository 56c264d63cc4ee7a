use std::{env::args, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use dewy::{
    ast::parse_file,
    error::Diagnostics,
    token::{scan, strip_whitespace},
};
use dewy_backend::grammar::Grammar;

fn line_col(src: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let mut line = 1;
    let mut col = 1;
    for &b in &src[..offset] {
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn report_diagnostics(file: &str, src: &[u8], diagnostics: &Diagnostics) {
    for d in diagnostics.take() {
        let (line, col) = line_col(src, d.offset as usize);
        eprintln!("{file}:{line}:{col} {}", d.message);
    }
}

/// Render one phase dump through its `fmt::Write` printer and put the result
/// on stdout.
fn dump(render: impl FnOnce(&mut String) -> std::fmt::Result) {
    let mut out = String::new();
    render(&mut out).expect("rendering a dump into a String cannot fail");
    print!("{out}");
}

fn main() -> Result<()> {
    let args: Vec<String> = args().skip(1).collect();

    let mut do_tokens = false;
    let mut do_ast = false;
    let mut do_folded = false;
    let mut do_grammar = false;
    let mut do_json = false;
    let mut files = Vec::new();

    for arg in &args {
        match arg.as_str() {
            "--tokens" => do_tokens = true,
            "--ast" => do_ast = true,
            "--folded" => do_folded = true,
            "--grammar" => do_grammar = true,
            "--json" => do_json = true,
            flag if flag.starts_with('-') => bail!("unknown flag `{flag}`"),
            file => files.push(file),
        }
    }

    let path = match files.as_slice() {
        [one] => PathBuf::from(one),
        _ => bail!("expected exactly one grammar file"),
    };

    let src =
        std::fs::read(&path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let file_name = path.display().to_string();
    let diagnostics = Diagnostics::new();

    let tokens = match scan(&src, &diagnostics) {
        Ok(tokens) => tokens,
        Err(e) => {
            let (line, col) = line_col(&src, e.offset);
            bail!("{file_name}:{line}:{col} {}", e.message);
        }
    };
    report_diagnostics(&file_name, &src, &diagnostics);

    if do_tokens {
        for token in &tokens {
            println!("{:>4}..{:<4} {:?}", token.span.start, token.span.end, token.kind);
        }
    }

    let tokens = strip_whitespace(tokens);
    let mut file = match parse_file(&tokens) {
        Ok(file) => file,
        Err(e) => {
            let offset = tokens
                .get(e.offset)
                .map_or(src.len(), |t| t.span.start as usize);
            let (line, col) = line_col(&src, offset);
            bail!("{file_name}:{line}:{col} {}", e.message);
        }
    };

    if do_ast {
        dump(|out| file.display_repr_into(out));
    }

    file.fold_all();

    if do_folded {
        dump(|out| file.display_into(out));
    }

    let mut grammar = Grammar::new();
    let mut start = None;
    for rule in &file.rules {
        let head = grammar
            .add_rule(&rule.name, &rule.body)
            .map_err(|e| anyhow!("{file_name}: {e}"))?;
        if start.is_none() {
            start = Some(head);
        }
    }
    if let Some(start) = start {
        grammar.set_start(start);
    }

    if do_grammar {
        dump(|out| grammar.display_into(out));
    }

    if do_json {
        println!("{}", serde_json::to_string_pretty(&grammar_json(&grammar))?);
    }

    Ok(())
}

fn grammar_json(grammar: &Grammar) -> serde_json::Value {
    let symbols: Vec<serde_json::Value> = grammar
        .symbols
        .iter()
        .map(|(handle, symbol)| {
            let mut text = String::new();
            symbol.display_into(&mut text).unwrap();
            serde_json::json!({ "index": handle.as_u32(), "symbol": text })
        })
        .collect();

    let productions: Vec<serde_json::Value> = grammar
        .productions
        .iter()
        .map(|(_, production)| {
            serde_json::json!({
                "head": production.head.as_u32(),
                "body": production.body.iter().map(|s| s.as_u32()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let filters: Vec<serde_json::Value> = grammar
        .filters
        .iter()
        .map(|filter| {
            serde_json::json!({
                "kind": filter.kind.name(),
                "subject": filter.subject.as_u32(),
                "operand": filter.operand.as_u32(),
            })
        })
        .collect();

    serde_json::json!({
        "start": grammar.start.map(|s| s.as_u32()),
        "symbols": symbols,
        "productions": productions,
        "filters": filters,
    })
}
