//! Reindentation of formatted queries into Go raw string literals.
//!
//! A query formatted for the call
//!
//! ```text
//! <tab>err := db.Select(&rows, `...`)
//! ```
//!
//! becomes a literal whose body is indented one tab deeper than the call
//! line, with the closing backtick aligned to the call line.

use crate::error::{TypegenError, TypegenResult};
use crate::source::SourceTree;

/// The leading whitespace run of a line.
pub fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Remove surrounding blank lines and the indentation common to every
/// non-blank line. Used on raw literal text before it is formatted.
pub fn dedent(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let body = &lines[first..=last];

    let common = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| leading_whitespace(l))
        .reduce(|a, b| {
            let n = a
                .bytes()
                .zip(b.bytes())
                .take_while(|(x, y)| x == y)
                .count();
            &a[..n]
        })
        .unwrap_or("");

    body.iter()
        .map(|l| l.strip_prefix(common).unwrap_or(l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a raw literal for `query`, indented relative to `base`.
pub fn reindent(query: &str, base: &str) -> TypegenResult<String> {
    if query.contains('`') {
        return Err(TypegenError::Literal(
            "formatted query contains a backtick and cannot be a raw string".to_string(),
        ));
    }

    let indent = format!("{}\t", base);
    let body = query.trim_start_matches(['\n', '\r']).trim_end();

    let mut out = String::from("`\n");
    for line in body.lines() {
        if !line.is_empty() {
            out.push_str(&indent);
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str(base);
    out.push('`');
    Ok(out)
}

/// Reindent for a call site, measuring the call's source line.
pub fn literal_for_call(tree: &SourceTree, line: usize, query: &str) -> TypegenResult<String> {
    let src_line = tree.line(line).ok_or_else(|| {
        TypegenError::Literal(format!(
            "line {} not found in {}",
            line,
            tree.path().display()
        ))
    })?;
    reindent(query, leading_whitespace(src_line))
}
