//! Query normalization for introspection, using nom.
//!
//! Turns a formatted, parameterized query into a single-line statement the
//! database will accept as a view body:
//!
//! ```text
//! SELECT id            -- owner
//! FROM users
//! WHERE org_id = $1;
//! ```
//!
//! becomes `SELECT id FROM users WHERE org_id = null`.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until},
    character::complete::{anychar, char, digit1, multispace1},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};

use crate::error::{TypegenError, TypegenResult};

/// Literal substituted for positional parameters.
pub const PLACEHOLDER_VALUE: &str = "null";

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    /// String literal or quoted identifier, kept verbatim.
    Quoted(&'a str),
    /// `$1`, `$2`, ...
    Placeholder,
    /// Whitespace or a comment.
    Space,
    Text(&'a str),
}

/// Normalize a query for use in `create view ... as <query>`.
pub fn normalize(query: &str) -> TypegenResult<String> {
    let mut out = String::with_capacity(query.len());
    let mut input = query;

    while !input.is_empty() {
        let (rest, token) = parse_token(input).map_err(|e| {
            TypegenError::Introspection(format!("normalizing query: {:?}", e))
        })?;
        match token {
            Token::Quoted(s) | Token::Text(s) => out.push_str(s),
            Token::Placeholder => out.push_str(PLACEHOLDER_VALUE),
            Token::Space => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
        }
        input = rest;
    }

    let trimmed = out.trim().trim_end_matches(';').trim_end();
    Ok(trimmed.to_string())
}

fn parse_token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(|i| quoted('\'', i), Token::Quoted),
        map(|i| quoted('"', i), Token::Quoted),
        value(Token::Placeholder, pair(char('$'), digit1)),
        value(Token::Space, line_comment),
        value(Token::Space, block_comment),
        value(Token::Space, multispace1),
        map(is_not("'\"$-/ \t\r\n"), Token::Text),
        map(recognize(anychar), Token::Text),
    ))(input)
}

/// A quoted run where a doubled quote is an escaped quote.
fn quoted(q: char, input: &str) -> IResult<&str, &str> {
    let doubled = format!("{}{}", q, q);
    let delim = q.to_string();
    recognize(tuple((
        char(q),
        many0(alt((tag(doubled.as_str()), is_not(delim.as_str())))),
        char(q),
    )))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("--"), opt(is_not("\n"))))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}
