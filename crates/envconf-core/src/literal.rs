//! Literal expression parsing.
//!
//! Raw environment strings such as `True`, `None`, `42`, `["a", "b"]` or
//! `(1125, 2436)` are turned into [`Value`]s by a small recursive descent
//! parser. Only literals are accepted; nothing is ever evaluated.
//!
//! Grammar:
//! - `None`, `True`, `False`
//! - integers with an optional sign, `_` allowed between digits
//! - strings in single or double quotes with `\\ \' \" \n \t \r` escapes
//! - lists `[a, b]` and tuples `(a, b)`, `(a,)`, `()`, trailing commas allowed
//! - a parenthesised expression `(a)` is just `a`
//!
//! Lists and tuples nest at most [`MAX_DEPTH`] levels deep.

use crate::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct LiteralError {
    pub message: String,
    pub position: usize,
}

/// Maximum nesting of lists and tuples.
pub const MAX_DEPTH: usize = 64;

/// Parse a literal expression into a [`Value`].
pub fn parse(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        chars: input.char_indices().collect(),
        pos: 0,
        len: input.len(),
        depth: 0,
    };
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected trailing character '{}'", c)));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    len: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map(|(i, _)| *i).unwrap_or(self.len)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            message: message.into(),
            position: self.offset(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.parse_list(),
            Some('(') => self.parse_parenthesised(),
            Some('\'') | Some('"') => self.parse_string().map(Value::Str),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.parse_int(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let start_offset = self.offset();
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        match word.as_str() {
            "None" => Ok(Value::None),
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            _ => {
                self.pos = start;
                Err(LiteralError {
                    message: format!("unknown name '{}'", word),
                    position: start_offset,
                })
            }
        }
    }

    fn parse_int(&mut self) -> Result<Value, LiteralError> {
        let start_offset = self.offset();
        let mut digits = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            digits.push(sign);
            self.pos += 1;
        }

        let mut last_was_digit = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                last_was_digit = true;
            } else if c == '_' && last_was_digit {
                last_was_digit = false;
            } else {
                break;
            }
            self.pos += 1;
        }

        if !last_was_digit {
            return Err(self.error("malformed integer"));
        }
        if self.peek().is_some_and(|c| c.is_alphanumeric() || c == '.') {
            return Err(self.error("only integer literals are supported"));
        }

        digits.parse::<i64>().map(Value::Int).map_err(|e| LiteralError {
            message: format!("invalid integer: {}", e),
            position: start_offset,
        })
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(c) => {
                            self.pos -= 1;
                            return Err(self.error(format!("unsupported escape '\\{}'", c)));
                        }
                        None => return Err(self.error("unterminated string")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let (items, _) = self.parse_nested(']')?;
        Ok(Value::List(items))
    }

    fn parse_parenthesised(&mut self) -> Result<Value, LiteralError> {
        self.expect('(')?;
        let (mut items, trailing_comma) = self.parse_nested(')')?;
        if items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Tuple(items))
    }

    fn parse_nested(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting too deep (max {})", MAX_DEPTH)));
        }
        self.depth += 1;
        let result = self.parse_items(close);
        self.depth -= 1;
        result
    }

    /// Parse comma separated items up to `close`. Returns the items and
    /// whether the last item was followed by a comma.
    fn parse_items(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, trailing_comma));
            }
            if !items.is_empty() && !trailing_comma {
                return Err(self.error(format!("expected ',' or '{}'", close)));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            trailing_comma = self.peek() == Some(',');
            if trailing_comma {
                self.pos += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse("True").unwrap(), Value::Bool(true));
        assert_eq!(parse(" False ").unwrap(), Value::Bool(false));
        assert_eq!(parse("None").unwrap(), Value::None);
    }

    #[test]
    fn test_lowercase_booleans_rejected() {
        let err = parse("true").unwrap_err();
        assert_eq!(err.position, 0);
        assert!(err.message.contains("unknown name 'true'"));
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse("1000").unwrap(), Value::Int(1000));
        assert_eq!(parse("-5").unwrap(), Value::Int(-5));
        assert_eq!(parse("10_000").unwrap(), Value::Int(10_000));
        assert!(parse("1.5").is_err());
        assert!(parse("12abc").is_err());
        assert!(parse("-").is_err());
        assert!(parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parse("'abc'").unwrap(), Value::from("abc"));
        assert_eq!(parse(r#""a\"b""#).unwrap(), Value::from("a\"b"));
        assert_eq!(parse(r"'line\n'").unwrap(), Value::from("line\n"));
        assert!(parse("'open").is_err());
        assert!(parse(r"'\x41'").is_err());
    }

    #[test]
    fn test_parse_lists_and_tuples() {
        assert_eq!(parse("[]").unwrap(), Value::List(vec![]));
        assert_eq!(
            parse(r#"["127.0.0.1", ]"#).unwrap(),
            Value::List(vec![Value::from("127.0.0.1")])
        );
        assert_eq!(
            parse("(1125, 2436)").unwrap(),
            Value::Tuple(vec![Value::Int(1125), Value::Int(2436)])
        );
        assert_eq!(
            parse("('/srv/app/locale', )").unwrap(),
            Value::Tuple(vec![Value::from("/srv/app/locale")])
        );
        assert_eq!(parse("()").unwrap(), Value::Tuple(vec![]));
        assert_eq!(parse("(7)").unwrap(), Value::Int(7));
        assert_eq!(
            parse("[['a'], (None,)]").unwrap(),
            Value::List(vec![
                Value::List(vec![Value::from("a")]),
                Value::Tuple(vec![Value::None]),
            ])
        );
    }

    #[test]
    fn test_reject_malformed() {
        assert!(parse("").is_err());
        assert!(parse("[1 2]").is_err());
        assert!(parse("[1,,2]").is_err());
        assert!(parse("(1, 2").is_err());
        assert!(parse("True False").is_err());
        assert!(parse("__import__('os')").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&nested).is_ok());

        let too_deep = format!("{}{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        let err = parse(&too_deep).unwrap_err();
        assert!(err.message.contains("nesting too deep"));
        assert_eq!(err.position, MAX_DEPTH + 1);

        let err = parse(&"[".repeat(200_000)).unwrap_err();
        assert!(err.message.contains("nesting too deep"));
    }

    #[test]
    fn test_display_parses_back() {
        let value = parse(r#"[("a", 1), None, True, 'it\'s']"#).unwrap();
        assert_eq!(parse(&value.to_string()).unwrap(), value);
    }
}
