use tracing::trace;

use crate::{
    ast::{Token, TokenKind},
    error::{HyperlambdaError, Position, Result},
};

/// How much already consumed source a syntax error quotes.
const CONTEXT_CHARS: usize = 40;

/// Turns Hyperlambda source into a flat list of tokens.
///
/// One line is `[space] name [: [type :] value]`, or a comment. Indentation
/// is only tokenized in front of a name or comment; blank lines produce
/// nothing at all.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

/// Tokenize `source` in one go.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Read a quoted string (`"…"`, `'…'` or `@"…"`) at the start of `text`.
///
/// Returns the unescaped content and the number of chars consumed, closing
/// quote included.
pub(crate) fn read_quoted_prefix(text: &str) -> Result<(String, usize)> {
    let mut lexer = Lexer::new(text);
    let content = match (lexer.current_char(), lexer.peek_char(1)) {
        (Some('@'), Some('"')) => {
            lexer.advance();
            lexer.advance();
            lexer.read_multiline_string()?
        }
        (Some(quote @ ('"' | '\'')), _) => {
            lexer.advance();
            lexer.read_quoted_string(quote)?
        }
        _ => return Err(lexer.error("Expected a quoted string")),
    };
    Ok((content, lexer.position))
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current_char(), None | Some('\r') | Some('\n'))
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn error(&self, message: impl Into<String>) -> HyperlambdaError {
        let consumed = &self.input[..self.position.min(self.input.len())];
        let start = consumed.len().saturating_sub(CONTEXT_CHARS);
        let context: String = consumed[start..].iter().collect();
        HyperlambdaError::syntax(message, self.here(), context)
    }

    fn push(&mut self, kind: TokenKind, text: impl Into<String>, position: Position) {
        self.tokens.push(Token::new(kind, text, position));
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while !self.at_end() {
            // Indentation, then a name, or any number of comment lines
            loop {
                self.skip_line_breaks()?;
                if self.at_end() {
                    break;
                }
                self.read_space()?;
                if self.at_end() {
                    break;
                }
                let was_comment = self.read_name_or_comment()?;
                if self.at_end() || !was_comment {
                    break;
                }
            }
            if self.at_end() {
                break;
            }

            if self.read_separator() && self.read_type_or_value(true)? && self.read_separator() {
                self.read_type_or_value(false)?;
            }
            if self.at_end() {
                break;
            }
            self.read_line_break()?;
        }
        trace!(tokens = self.tokens.len(), "tokenized");
        Ok(self.tokens)
    }

    /// Consume one `\n` or `\r\n`. A `\r` on its own is an error.
    fn consume_line_break(&mut self) -> Result<()> {
        match (self.current_char(), self.peek_char(1)) {
            (Some('\n'), _) => {
                self.advance();
                Ok(())
            }
            (Some('\r'), Some('\n')) => {
                self.advance();
                self.advance();
                Ok(())
            }
            (Some('\r'), _) => Err(self.error("Carriage return without a matching line feed")),
            _ => Err(self.error("Expected end of line")),
        }
    }

    fn skip_line_breaks(&mut self) -> Result<()> {
        while matches!(self.current_char(), Some('\r') | Some('\n')) {
            self.consume_line_break()?;
        }
        Ok(())
    }

    fn read_line_break(&mut self) -> Result<()> {
        let position = self.here();
        self.consume_line_break()?;
        self.push(TokenKind::LineBreak, "\r\n", position);
        Ok(())
    }

    /// Indentation in front of a name or comment.
    ///
    /// Lines holding nothing but spaces are skipped entirely.
    fn read_space(&mut self) -> Result<()> {
        loop {
            let position = self.here();
            let mut count = 0;
            while self.current_char() == Some(' ') {
                count += 1;
                self.advance();
            }
            if count == 0 || self.at_end() {
                return Ok(());
            }
            if self.at_line_end() {
                self.skip_line_breaks()?;
                continue;
            }
            if count % 3 != 0 {
                return Err(self.error(format!(
                    "Indentation of {count} spaces is not a multiple of 3"
                )));
            }
            self.push(TokenKind::Space, " ".repeat(count), position);
            return Ok(());
        }
    }

    /// Returns true when a comment was read rather than a name.
    fn read_name_or_comment(&mut self) -> Result<bool> {
        let position = self.here();
        match (self.current_char(), self.peek_char(1)) {
            (Some(':'), _) => {
                self.push(TokenKind::Name, "", position);
                Ok(false)
            }
            (Some('/'), Some('*')) => {
                self.advance();
                self.advance();
                let comment = self.read_block_comment()?;
                self.finish_comment(TokenKind::BlockComment, comment, position)?;
                Ok(true)
            }
            (Some('/'), Some('/')) => {
                self.advance();
                self.advance();
                let mut comment = String::new();
                while !self.at_line_end() {
                    if let Some(ch) = self.current_char() {
                        comment.push(ch);
                    }
                    self.advance();
                }
                self.finish_comment(TokenKind::LineComment, comment.trim().to_string(), position)?;
                Ok(true)
            }
            (Some('@'), Some('"')) => {
                self.advance();
                self.advance();
                let name = self.read_multiline_string()?;
                self.push(TokenKind::Name, name, position);
                self.expect_after_name()?;
                Ok(false)
            }
            (Some(quote @ ('"' | '\'')), _) => {
                self.advance();
                let name = self.read_quoted_string(quote)?;
                self.push(TokenKind::Name, name, position);
                self.expect_after_name()?;
                Ok(false)
            }
            _ => {
                let (name, _) = self.read_bare();
                self.push(TokenKind::Name, name, position);
                Ok(false)
            }
        }
    }

    /// Push a comment and the line break it ends with.
    fn finish_comment(&mut self, kind: TokenKind, text: String, position: Position) -> Result<()> {
        let line_end = self.here();
        if !self.at_end() {
            self.consume_line_break()?;
        }
        if !text.is_empty() {
            self.push(kind, text, position);
            self.push(TokenKind::LineBreak, "\r\n", line_end);
        } else if self.tokens.last().is_some_and(|token| token.kind == TokenKind::Space) {
            // An empty comment leaves a blank line, indentation included
            self.tokens.pop();
        }
        Ok(())
    }

    fn read_block_comment(&mut self) -> Result<String> {
        let mut raw = String::new();
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (None, _) => return Err(self.error("Block comment not closed before end of input")),
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    break;
                }
                (Some(ch), _) => {
                    raw.push(ch);
                    self.advance();
                }
            }
        }
        while self.current_char() == Some(' ') {
            self.advance();
        }
        if !self.at_line_end() {
            return Err(self.error("Unexpected characters after end of block comment"));
        }
        let lines: Vec<&str> = raw
            .lines()
            .map(|line| line.trim_start_matches([' ', '*']).trim_end())
            .collect();
        Ok(lines.join("\r\n").trim().to_string())
    }

    fn read_separator(&mut self) -> bool {
        if self.current_char() == Some(':') {
            let position = self.here();
            self.advance();
            self.push(TokenKind::Separator, ":", position);
            true
        } else {
            false
        }
    }

    /// Returns true when a type was read, which only happens if `allow_type`.
    fn read_type_or_value(&mut self, allow_type: bool) -> Result<bool> {
        let position = self.here();
        match (self.current_char(), self.peek_char(1)) {
            (None | Some('\r') | Some('\n'), _) => {
                self.push(TokenKind::Value, "", position);
                Ok(false)
            }
            (Some('@'), Some('"')) => {
                self.advance();
                self.advance();
                let value = self.read_multiline_string()?;
                self.push(TokenKind::Value, value, position);
                self.expect_after_value()?;
                Ok(false)
            }
            (Some(quote @ ('"' | '\'')), _) => {
                self.advance();
                let value = self.read_quoted_string(quote)?;
                self.push(TokenKind::Value, value, position);
                self.expect_after_value()?;
                Ok(false)
            }
            _ => {
                let (text, followed_by_separator) = self.read_bare();
                let text = text.trim().to_string();
                if !followed_by_separator {
                    self.push(TokenKind::Value, text, position);
                    Ok(false)
                } else if allow_type {
                    self.push(TokenKind::Type, text, position);
                    Ok(true)
                } else {
                    Err(self.error("Unexpected ':' after value, quote values containing ':'"))
                }
            }
        }
    }

    /// Read up to `:`, a line break or end of input.
    fn read_bare(&mut self) -> (String, bool) {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                ':' => return (result, true),
                '\r' | '\n' => break,
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
        (result, false)
    }

    fn expect_after_name(&self) -> Result<()> {
        if self.at_line_end() || self.current_char() == Some(':') {
            Ok(())
        } else {
            Err(self.error("Garbage characters after quoted name"))
        }
    }

    fn expect_after_value(&self) -> Result<()> {
        if self.at_line_end() {
            Ok(())
        } else {
            Err(self.error("Garbage characters after quoted value"))
        }
    }

    /// Body of an `@"…"` string, opening `@"` already consumed.
    fn read_multiline_string(&mut self) -> Result<String> {
        let mut result = String::new();
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (None, _) => return Err(self.error("String literal not closed before end of input")),
                (Some('"'), Some('"')) => {
                    result.push('"');
                    self.advance();
                    self.advance();
                }
                (Some('"'), _) => {
                    self.advance();
                    return Ok(result);
                }
                (Some('\r' | '\n'), _) => {
                    self.consume_line_break()?;
                    result.push_str("\r\n");
                }
                (Some(ch), _) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Body of a `"…"` or `'…'` string, opening quote already consumed.
    fn read_quoted_string(&mut self, quote: char) -> Result<String> {
        let mut result = String::new();
        loop {
            match self.current_char() {
                None => return Err(self.error("String literal not closed before end of input")),
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance();
                    self.read_escape(quote, &mut result)?;
                }
                Some('\r' | '\n') => return Err(self.error("Unexpected line break in string literal")),
                Some(ch) => {
                    result.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Character after a backslash, backslash already consumed.
    fn read_escape(&mut self, quote: char, result: &mut String) -> Result<()> {
        let Some(ch) = self.current_char() else {
            return Err(self.error("End of input in escape sequence"));
        };
        self.advance();
        match ch {
            c if c == quote => result.push(c),
            '"' => result.push('"'),
            '\'' => result.push('\''),
            '\\' => result.push('\\'),
            'a' => result.push('\u{07}'),
            'b' => result.push('\u{08}'),
            'f' => result.push('\u{0C}'),
            't' => result.push('\t'),
            'v' => result.push('\u{0B}'),
            'n' => result.push('\n'),
            'r' => {
                if self.current_char() != Some('\\') || self.peek_char(1) != Some('n') {
                    return Err(self.error("\\r escape must be followed by \\n"));
                }
                self.advance();
                self.advance();
                result.push_str("\r\n");
            }
            'x' => {
                let digits: String = (0..4).filter_map(|i| self.peek_char(i)).collect();
                let code = (digits.len() == 4)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(format!("Invalid \\x escape '{digits}'")))?;
                for _ in 0..4 {
                    self.advance();
                }
                result.push(code);
            }
            other => return Err(self.error(format!("Invalid escape sequence '\\{other}'"))),
        }
        Ok(())
    }
}

#[cfg(test)]
fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_name_type_value() {
    use TokenKind::*;
    assert_eq!(kinds("foo:int:5"), vec![Name, Separator, Type, Separator, Value]);
    let tokens = tokenize("foo:int: 5 ").unwrap();
    assert_eq!(tokens[2].text, "int");
    assert_eq!(tokens[4].text, "5");
}

#[test]
fn test_separator_at_end_of_line_yields_empty_value() {
    use TokenKind::*;
    assert_eq!(kinds("foo:\r\nbar"), vec![Name, Separator, Value, LineBreak, Name]);
    let tokens = tokenize("foo:").unwrap();
    assert_eq!(tokens.last().map(|t| (t.kind, t.text.as_str())), Some((Value, "")));
}

#[test]
fn test_blank_lines_are_skipped() {
    use TokenKind::*;
    assert_eq!(kinds("foo\n      \n\nbar"), vec![Name, LineBreak, Name]);
}

#[test]
fn test_bad_indentation() {
    let err = tokenize("foo\n  bar").unwrap_err();
    assert!(matches!(err, HyperlambdaError::Syntax { position, .. } if position.line == 2));
}

#[test]
fn test_lone_carriage_return() {
    assert!(tokenize("foo\rbar").is_err());
}

#[test]
fn test_escapes() {
    let tokens = tokenize(r#"foo:"a\tb\r\nc\x0041\"""#).unwrap();
    assert_eq!(tokens[2].text, "a\tb\r\ncA\"");
}

#[test]
fn test_position_points_into_line() {
    let err = tokenize("foo\nbar:\"x").unwrap_err();
    match err {
        HyperlambdaError::Syntax { position, context, .. } => {
            assert_eq!(position.line, 2);
            assert!(context.ends_with("bar:\"x"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
