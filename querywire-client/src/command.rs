//! One-line query language for the REPL.
//!
//! ```text
//! Cost where UnitCost > 100 and Prod.ProdCategory = 'Photo' orderby UnitCost desc take 5 include Prod
//! ```

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use querywire::client::Query;
use querywire::predicate::{col, Expr, Literal};
use rust_decimal::Decimal;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
}

impl Token {
    fn word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Quoted(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryCommand {
    pub entity: String,
    pub filters: Vec<Expr>,
    pub order: Option<(Expr, bool)>,
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub include: Vec<String>,
}

impl QueryCommand {
    pub fn apply(&self, mut query: Query<Value>) -> Query<Value> {
        for filter in &self.filters {
            query = query.filter(filter.clone());
        }
        if let Some((key, descending)) = &self.order {
            query = if *descending {
                query.order_by_descending(key.clone())
            } else {
                query.order_by(key.clone())
            };
        }
        if let Some(n) = self.skip {
            query = query.skip(n);
        }
        if let Some(n) = self.take {
            query = query.take(n);
        }
        for relation in &self.include {
            query = query.include(relation.clone());
        }
        query
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        text.push('\'');
                    }
                    Some('\'') => break,
                    Some(ch) => text.push(ch),
                    None => bail!("unterminated string literal"),
                }
            }
            tokens.push(Token::Quoted(text));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '\'' {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }
    Ok(tokens)
}

/// Parse a literal token: quoted text, `null`, `true`/`false`, dates,
/// integers, decimals or comma-separated integer lists.
fn parse_literal(token: &Token) -> Result<Literal> {
    let word = match token {
        Token::Quoted(text) => return Ok(Literal::Text(text.clone())),
        Token::Word(w) => w.as_str(),
    };

    match word.to_ascii_lowercase().as_str() {
        "null" => return Ok(Literal::Null),
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }
    if word.contains(',') {
        let items = word
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<i64>().with_context(|| format!("bad list item `{}`", s)))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Literal::IntegerList(items));
    }
    if let Ok(i) = word.parse::<i64>() {
        return Ok(Literal::Integer(i));
    }
    if let Ok(d) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
        return Ok(Literal::Date(d));
    }
    if let Ok(d) = Decimal::from_str(word) {
        return Ok(Literal::Decimal(d));
    }
    Err(anyhow!("cannot read `{}` as a value; quote text with '...'", word))
}

fn parse_comparison(path: &str, op: &str, value: &Token) -> Result<Expr> {
    let lhs = col(path);
    let rhs = Expr::Literal(parse_literal(value)?);
    Ok(match op {
        "=" | "==" => lhs.eq(rhs),
        ">" => lhs.gt(rhs),
        ">=" => lhs.ge(rhs),
        "<" => lhs.lt(rhs),
        "<=" => lhs.le(rhs),
        "in" => lhs.is_in(rhs),
        other => bail!("unknown operator `{}`", other),
    })
}

fn next_word<'a>(tokens: &'a [Token], i: &mut usize, what: &str) -> Result<&'a str> {
    let word = tokens
        .get(*i)
        .and_then(Token::word)
        .ok_or_else(|| anyhow!("expected {}", what))?;
    *i += 1;
    Ok(word)
}

pub fn parse_query(input: &str) -> Result<QueryCommand> {
    let tokens = tokenize(input)?;
    let mut i = 0;
    let mut command = QueryCommand {
        entity: next_word(&tokens, &mut i, "an entity name")?.to_string(),
        ..Default::default()
    };

    while i < tokens.len() {
        let keyword = next_word(&tokens, &mut i, "a keyword")?.to_ascii_lowercase();
        match keyword.as_str() {
            "where" | "and" => {
                let path = next_word(&tokens, &mut i, "a column path")?;
                let op = next_word(&tokens, &mut i, "an operator")?.to_ascii_lowercase();
                let value = tokens
                    .get(i)
                    .ok_or_else(|| anyhow!("expected a value after `{} {}`", path, op))?;
                i += 1;
                command.filters.push(parse_comparison(path, &op, value)?);
            }
            "orderby" => {
                let path = next_word(&tokens, &mut i, "a column to order by")?;
                let descending = matches!(
                    tokens.get(i).and_then(Token::word),
                    Some(w) if w.eq_ignore_ascii_case("desc")
                );
                if descending {
                    i += 1;
                }
                command.order = Some((col(path), descending));
            }
            "skip" => command.skip = Some(next_word(&tokens, &mut i, "a row count")?.parse()?),
            "take" => command.take = Some(next_word(&tokens, &mut i, "a row count")?.parse()?),
            "include" => {
                let relations = next_word(&tokens, &mut i, "a relation name")?;
                command
                    .include
                    .extend(relations.split(',').filter(|r| !r.is_empty()).map(String::from));
            }
            other => bail!("unexpected `{}`", other),
        }
    }
    Ok(command)
}
