//! Parser for JavaScript object and array literals.
//!
//! Catalogue pages ship their data as literal source text inside inline
//! scripts. This parser reads that text into a [`serde_json::Value`] without
//! evaluating anything: it accepts JSON plus the relaxations found in
//! hand-written or minified scripts (unquoted and numeric keys, single-quoted
//! and backtick strings, trailing commas, array holes, comments, `undefined`,
//! hex numbers and the extra JavaScript string escapes).

use serde_json::{Map, Number, Value};
use std::fmt;

/// Deepest object/array nesting accepted before parsing gives up
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

impl LiteralError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for LiteralError {}

/// Parse `src` as a single literal. Only whitespace, comments and an optional
/// trailing semicolon may follow the value.
pub fn parse_literal(src: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(src);
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if parser.peek() == Some(';') {
        parser.bump();
        parser.skip_trivia();
    }
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Cursor over script source. Shared with the script sandbox, which drives
/// it statement by statement.
pub struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError::new(self.pos, message)
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{}`, found `{}`", expected, c))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected))),
        }
    }

    /// Skip whitespace, line comments and block comments.
    pub fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    match self.rest().find("*/") {
                        Some(end) => self.pos += end + 2,
                        None => self.pos = self.src.len(),
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier (`[A-Za-z_$][A-Za-z0-9_$]*`, unicode letters
    /// included) without skipping trivia first.
    pub fn parse_identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            _ => return None,
        }
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            self.bump();
        }
        Some(&self.src[start..self.pos])
    }

    pub fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia();
        match self.peek() {
            Some(open @ ('{' | '[')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let value = if open == '{' {
                    self.parse_object()
                } else {
                    self.parse_array()
                };
                self.depth -= 1;
                value
            }
            Some(q @ ('"' | '\'' | '`')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let word = self.parse_identifier().unwrap_or_default();
                match word {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    other => Err(LiteralError::new(
                        start,
                        format!("`{}` is not a literal value", other),
                    )),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character `{}`", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_object(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_trivia();
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                Some(c) => {
                    return Err(self.error(format!("expected `,` or `}}` in object, found `{}`", c)));
                }
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => self.parse_string(q),
            Some(c) if c.is_ascii_digit() => match self.parse_number()? {
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(self.error("invalid numeric key")),
            },
            Some(c) if is_ident_start(c) => Ok(self
                .parse_identifier()
                .map(str::to_string)
                .unwrap_or_default()),
            Some(c) => Err(self.error(format!("unexpected character `{}` in object key", c))),
            None => Err(self.error("unterminated object")),
        }
    }

    fn parse_array(&mut self) -> Result<Value, LiteralError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                // a hole, as in `[1,,2]`, keeps its slot
                Some(',') => {
                    self.bump();
                    items.push(Value::Null);
                    continue;
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }
            items.push(self.parse_value()?);
            self.skip_trivia();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                Some(c) => {
                    return Err(self.error(format!("expected `,` or `]` in array, found `{}`", c)));
                }
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(LiteralError::new(start, "unterminated string"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => self.parse_escape(&mut out)?,
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("template interpolation is not a literal"));
                }
                '\n' if quote != '`' => {
                    return Err(LiteralError::new(start, "unterminated string"));
                }
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.parse_hex_digits(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.error("invalid \\x escape"))?);
            }
            'u' => {
                let code = self.parse_unicode_escape()?;
                out.push(code);
            }
            // line continuation
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn parse_unicode_escape(&mut self) -> Result<char, LiteralError> {
        if self.peek() == Some('{') {
            self.bump();
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.src[start..self.pos];
            self.expect('}')?;
            let code = u32::from_str_radix(digits, 16)
                .map_err(|_| LiteralError::new(start, "invalid \\u{} escape"))?;
            return char::from_u32(code).ok_or_else(|| LiteralError::new(start, "invalid code point"));
        }

        let high = self.parse_hex_digits(4)?;
        if (0xd800..0xdc00).contains(&high) && self.rest().starts_with("\\u") {
            let save = self.pos;
            self.pos += 2;
            let low = self.parse_hex_digits(4)?;
            if (0xdc00..0xe000).contains(&low) {
                let code = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
                return char::from_u32(code).ok_or_else(|| self.error("invalid surrogate pair"));
            }
            self.pos = save;
        }
        Ok(char::from_u32(high).unwrap_or('\u{fffd}'))
    }

    fn parse_hex_digits(&mut self, count: usize) -> Result<u32, LiteralError> {
        let start = self.pos;
        let digits = self
            .rest()
            .get(..count)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("invalid hex escape"))?;
        self.pos += count;
        u32::from_str_radix(digits, 16).map_err(|_| LiteralError::new(start, "invalid hex escape"))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let value = i64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| LiteralError::new(start, "invalid hex number"))?;
            return Ok(Value::Number(Number::from(if negative { -value } else { value })));
        }

        if self.rest().starts_with("Infinity") || self.rest().starts_with("NaN") {
            return Err(LiteralError::new(start, "non-finite numbers are not supported"));
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    if matches!(self.peek_second(), Some('+' | '-')) {
                        self.bump();
                    }
                }
                _ => break,
            }
            self.bump();
        }

        let text = &self.src[start..self.pos];
        let text = text.strip_prefix('+').unwrap_or(text);
        if !is_float && let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(Number::from(n)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError::new(start, format!("invalid number `{}`", text)))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_literal(r#"{"a": [1, 2.5, "x"], "b": null, "c": true}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, "x"], "b": null, "c": true}));
    }

    #[test]
    fn test_javascript_relaxations() {
        let src = r#"{
            // publication settings
            config: {
                publicationTitle: 'IKEA 1951',
                pages: 0x10,
                ratio: .5,
                'quoted-key': "a\x41B",
                1999: undefined,
            },
            /* trailing */
            list: [1,,2,],
        };"#;
        let value = parse_literal(src).unwrap();
        assert_eq!(
            value,
            json!({
                "config": {
                    "publicationTitle": "IKEA 1951",
                    "pages": 16,
                    "ratio": 0.5,
                    "quoted-key": "aAB",
                    "1999": null
                },
                "list": [1, null, 2]
            })
        );
    }

    #[test]
    fn test_array_holes_keep_positions() {
        assert_eq!(parse_literal("[1,,2]").unwrap(), json!([1, null, 2]));
        assert_eq!(parse_literal("[,'a']").unwrap(), json!([null, "a"]));
        assert_eq!(parse_literal("[,]").unwrap(), json!([null]));
        assert_eq!(parse_literal("[1,2,]").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&nested).is_ok());

        let too_deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        let err = parse_literal(&too_deep).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
        assert_eq!(err.offset, MAX_DEPTH);

        let hostile = "{a:".repeat(100_000);
        assert_eq!(parse_literal(&hostile).unwrap_err().message, "nesting too deep");
    }

    #[test]
    fn test_escaped_urls_and_surrogates() {
        let value = parse_literal(r#"["https:\/\/example.com\/a.pdf", "😀", `tick`]"#)
            .unwrap();
        assert_eq!(value, json!(["https://example.com/a.pdf", "😀", "tick"]));
    }

    #[test]
    fn test_rejects_code() {
        let err = parse_literal("{a: foo()}").unwrap_err();
        assert!(err.message.contains("`foo`"));
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_rejects_template_interpolation() {
        assert!(parse_literal("`a ${b}`").is_err());
    }

    #[test]
    fn test_unterminated_object() {
        let err = parse_literal("{a: 1").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_trailing_input_is_an_error() {
        assert!(parse_literal("{} {}").is_err());
        assert!(parse_literal("{} ; // done").is_ok());
    }
}
