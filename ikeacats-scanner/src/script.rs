//! Reads the global bindings a script would leave behind, without running it.
//!
//! Only statements of the shape `var|let|const name = <literal>` (several
//! declarators allowed), `name = <literal>`, `window.name = <literal>` and bare
//! literal expressions are understood. Every other statement is skipped.

use crate::literal::{LiteralError, Parser};
use serde_json::Value;

const GLOBAL_OBJECTS: [&str; 3] = ["window", "globalThis", "self"];

#[derive(Debug, Default, Clone)]
pub struct Sandbox {
    bindings: Vec<(String, Value)>,
    failures: Vec<(String, LiteralError)>,
    expressions: Vec<Value>,
}

impl Sandbox {
    /// Collect the bindings of `source`. Never fails: right-hand sides that
    /// are not literals are recorded as failures for the binding's name.
    pub fn evaluate(source: &str) -> Self {
        let mut sandbox = Sandbox::default();
        let mut parser = Parser::new(source);

        loop {
            parser.skip_trivia();
            if parser.at_end() {
                break;
            }
            let start = parser.pos();

            match parser.peek() {
                Some('{' | '[') => match parser.parse_value() {
                    Ok(value) => sandbox.expressions.push(value),
                    Err(_) => {
                        parser.set_pos(start);
                        skip_statement(&mut parser);
                    }
                },
                Some(';') => {
                    parser.bump();
                }
                _ => {
                    if !sandbox.read_assignment(&mut parser) {
                        parser.set_pos(start);
                        skip_statement(&mut parser);
                    }
                }
            }

            if parser.pos() == start {
                parser.bump();
            }
        }

        sandbox
    }

    /// Value of the most recent binding called `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Why the right-hand side bound to `name` could not be read, if it was
    /// bound to something that is not a literal.
    pub fn failure(&self, name: &str) -> Option<&LiteralError> {
        self.failures
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, err)| err)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Bare literal statements, e.g. a plain JSON document.
    pub fn expressions(&self) -> &[Value] {
        &self.expressions
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.expressions.is_empty()
    }

    /// Returns false when the statement at the cursor is not an assignment.
    fn read_assignment(&mut self, parser: &mut Parser<'_>) -> bool {
        let Some(first) = parser.parse_identifier() else {
            return false;
        };

        if matches!(first, "var" | "let" | "const") {
            return self.read_declarators(parser);
        }

        let mut name = first.to_string();
        while parser.peek() == Some('.') {
            parser.bump();
            let Some(part) = parser.parse_identifier() else {
                return false;
            };
            name.push('.');
            name.push_str(part);
        }
        for global in GLOBAL_OBJECTS {
            if let Some(stripped) = name.strip_prefix(global).and_then(|n| n.strip_prefix('.')) {
                name = stripped.to_string();
                break;
            }
        }

        parser.skip_trivia();
        if parser.peek() != Some('=') || parser.rest().starts_with("==") {
            return false;
        }
        parser.bump();
        self.read_right_hand_side(parser, name);
        true
    }

    fn read_declarators(&mut self, parser: &mut Parser<'_>) -> bool {
        loop {
            parser.skip_trivia();
            let Some(name) = parser.parse_identifier() else {
                return false;
            };
            let name = name.to_string();
            parser.skip_trivia();

            if parser.peek() == Some('=') {
                parser.bump();
                if !self.read_right_hand_side(parser, name) {
                    return true;
                }
            } else {
                self.bindings.push((name, Value::Null));
            }

            parser.skip_trivia();
            if parser.peek() == Some(',') {
                parser.bump();
                continue;
            }
            if parser.peek() == Some(';') {
                parser.bump();
            }
            return true;
        }
    }

    /// Returns false when the value could not be read; the rest of the
    /// statement has then already been skipped.
    fn read_right_hand_side(&mut self, parser: &mut Parser<'_>, name: String) -> bool {
        let start = parser.pos();
        match parser.parse_value() {
            Ok(value) => {
                self.bindings.push((name, value));
                true
            }
            Err(err) => {
                self.failures.push((name, err));
                parser.set_pos(start);
                skip_statement(parser);
                false
            }
        }
    }
}

/// Advance past the statement at the cursor: up to and including the next
/// `;` or line break outside brackets, strings and comments.
fn skip_statement(parser: &mut Parser<'_>) {
    let mut depth: usize = 0;
    while let Some(c) = parser.peek() {
        match c {
            '"' | '\'' | '`' => skip_string(parser, c),
            '/' if parser.rest().starts_with("//") || parser.rest().starts_with("/*") => {
                let had_newline = parser.rest().starts_with("//");
                parser.skip_trivia();
                if had_newline && depth == 0 {
                    return;
                }
            }
            '(' | '[' | '{' => {
                depth += 1;
                parser.bump();
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                parser.bump();
            }
            ';' | '\n' if depth == 0 => {
                parser.bump();
                return;
            }
            _ => {
                parser.bump();
            }
        }
    }
}

fn skip_string(parser: &mut Parser<'_>, quote: char) {
    parser.bump();
    while let Some(c) = parser.bump() {
        if c == '\\' {
            parser.bump();
        } else if c == quote || (c == '\n' && quote != '`') {
            return;
        }
    }
}
