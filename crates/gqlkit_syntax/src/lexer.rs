//! Lexer for GraphQL source text.

use crate::block_string;
use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};
use gqlkit_core::{Source, Span};
use memchr::memchr2;

/// A lexer over a single [`Source`].
///
/// The lexer is a cursor: each call to [`Lexer::advance`] continues from
/// where the previous token ended. It is cheap to clone, which is how
/// [`Lexer::lookahead`] peeks without consuming.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a Source,
    bytes: &'a [u8],
    pos: u32,
    line: u32,
    line_start: u32,
    /// Span of the last significant token returned by `advance`.
    prev: Option<Span>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer positioned at the start of `source`.
    pub fn new(source: &'a Source) -> Self {
        Self {
            source,
            bytes: source.body().as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            prev: None,
        }
    }

    #[must_use]
    pub fn source(&self) -> &'a Source {
        self.source
    }

    /// Returns the current byte position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn bump_by(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    fn slice(&self, start: u32, end: u32) -> &'a str {
        &self.source.body()[start as usize..end as usize]
    }

    /// The full character at `pos`, for error messages.
    fn char_at(&self, pos: u32) -> Option<char> {
        self.source.body()[pos as usize..].chars().next()
    }

    fn column(&self, start: u32) -> u32 {
        let chars = self.slice(self.line_start, start).chars().count();
        u32::try_from(chars + 1).unwrap_or(u32::MAX)
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    fn error(&self, pos: u32, message: impl Into<String>) -> SyntaxError {
        let len = self.char_at(pos).map_or(0, char::len_utf8);
        let end = pos + u32::try_from(len).unwrap_or(0);
        SyntaxError::new(self.source, Span::new(pos, end), message)
    }

    /// Returns the next significant token. Comments read on the way are
    /// attached to it as leading trivia.
    pub fn advance(&mut self) -> Result<Token, SyntaxError> {
        let mut trivia = Vec::new();
        loop {
            let mut token = self.read_token()?;
            token.prev = self.prev;
            if token.kind.is_trivia() {
                trivia.push(token);
                continue;
            }
            token.leading_trivia = trivia;
            self.prev = Some(token.span);
            return Ok(token);
        }
    }

    /// Peeks at the token after the current position without consuming it.
    pub fn lookahead(&self) -> Result<Token, SyntaxError> {
        self.clone().advance()
    }

    /// Reads the next token, including comments.
    pub fn read_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_ignored();

        let start = self.pos;
        let line = self.line;
        let column = self.column(start);
        let token = |kind: TokenKind, end: u32| Token::new(kind, Span::new(start, end), line, column);

        let Some(c) = self.peek() else {
            return Ok(token(TokenKind::Eof, start));
        };

        let kind = match c {
            b'!' => TokenKind::Bang,
            b'$' => TokenKind::Dollar,
            b'&' => TokenKind::Amp,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b':' => TokenKind::Colon,
            b'=' => TokenKind::Equals,
            b'@' => TokenKind::At,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'|' => TokenKind::Pipe,
            b'}' => TokenKind::RBrace,
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.bump_by(3);
                    return Ok(token(TokenKind::Spread, self.pos));
                }
                return Err(self.error(start, "Unexpected character: \".\"."));
            }
            b'#' => {
                let text = self.scan_comment()?;
                return Ok(token(TokenKind::Comment, self.pos).with_value(text));
            }
            b'"' => {
                let (kind, value) = if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
                    (TokenKind::BlockString, self.scan_block_string()?)
                } else {
                    (TokenKind::String, self.scan_string()?)
                };
                return Ok(token(kind, self.pos).with_value(value));
            }
            b'-' | b'0'..=b'9' => {
                let kind = self.scan_number()?;
                return Ok(token(kind, self.pos).with_value(self.slice(start, self.pos)));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.scan_name();
                return Ok(token(TokenKind::Name, self.pos).with_value(self.slice(start, self.pos)));
            }
            b'\'' => {
                return Err(self.error(
                    start,
                    "Unexpected single quote character ('), did you mean to use a double quote (\")?",
                ));
            }
            _ => return Err(self.unexpected_character(start)),
        };

        self.bump();
        Ok(token(kind, self.pos))
    }

    fn unexpected_character(&self, pos: u32) -> SyntaxError {
        match self.char_at(pos) {
            Some(c) if is_invalid_source_char(c) => {
                self.error(pos, format!("Invalid character: {}.", code_point(c)))
            }
            Some(c) => self.error(pos, format!("Unexpected character: \"{c}\".")),
            None => self.error(pos, "Unexpected <EOF>."),
        }
    }

    /// Skips whitespace, line terminators, commas and the byte-order mark.
    fn skip_ignored(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b',') => self.bump(),
                Some(b'\n') => {
                    self.bump();
                    self.new_line();
                }
                Some(b'\r') => {
                    self.bump();
                    if self.peek() == Some(b'\n') {
                        self.bump();
                    }
                    self.new_line();
                }
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.bump_by(3);
                }
                _ => break,
            }
        }
    }

    /// Scans `# ...` up to the end of the line and returns the text after `#`.
    fn scan_comment(&mut self) -> Result<&'a str, SyntaxError> {
        self.bump();
        let start = self.pos;
        let rest = &self.bytes[start as usize..];
        let len = memchr2(b'\n', b'\r', rest).unwrap_or(rest.len());
        let end = start + u32::try_from(len).unwrap_or(0);
        let text = self.slice(start, end);
        if let Some((offset, c)) = text.char_indices().find(|(_, c)| *c != '\t' && is_invalid_source_char(*c)) {
            let pos = start + u32::try_from(offset).unwrap_or(0);
            return Err(self.error(pos, format!("Invalid character: {}.", code_point(c))));
        }
        self.pos = end;
        Ok(text)
    }

    /// Scans a name: `[_A-Za-z][_0-9A-Za-z]*`.
    fn scan_name(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Scans an int or float literal.
    fn scan_number(&mut self) -> Result<TokenKind, SyntaxError> {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.bump();
        }

        if self.peek() == Some(b'0') {
            self.bump();
            if let Some(c) = self.peek().filter(u8::is_ascii_digit) {
                return Err(self.error(
                    self.pos,
                    format!("Invalid number, unexpected digit after 0: \"{}\".", char::from(c)),
                ));
            }
        } else {
            self.scan_digits()?;
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            self.scan_digits()?;
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.bump();
            if let Some(b'+' | b'-') = self.peek() {
                self.bump();
            }
            self.scan_digits()?;
        }

        // A number may not run straight into a name or a dot.
        if let Some(c) = self.peek() {
            if c == b'.' || c == b'_' || c.is_ascii_alphabetic() {
                return Err(self.expected_digit(self.pos));
            }
        }

        Ok(if is_float {
            TokenKind::Float
        } else {
            TokenKind::Int
        })
    }

    /// Scans one or more digits.
    fn scan_digits(&mut self) -> Result<(), SyntaxError> {
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.expected_digit(self.pos));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        Ok(())
    }

    fn expected_digit(&self, pos: u32) -> SyntaxError {
        let found = self
            .char_at(pos)
            .map_or_else(|| "<EOF>".to_string(), |c| format!("\"{c}\""));
        self.error(pos, format!("Invalid number, expected digit but got: {found}."))
    }

    /// Scans a `"..."` string and returns its value with escapes resolved.
    fn scan_string(&mut self) -> Result<String, SyntaxError> {
        self.bump();
        let mut value = String::new();
        let mut chunk_start = self.pos;

        loop {
            match self.peek() {
                None | Some(b'\n' | b'\r') => {
                    return Err(self.error(self.pos, "Unterminated string."));
                }
                Some(b'"') => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    self.bump();
                    return Ok(value);
                }
                Some(b'\\') => {
                    value.push_str(self.slice(chunk_start, self.pos));
                    value.push(self.scan_escape()?);
                    chunk_start = self.pos;
                }
                Some(c) if c < 0x20 && c != b'\t' => {
                    return Err(self.error(
                        self.pos,
                        format!("Invalid character within String: {}.", code_point(char::from(c))),
                    ));
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Scans an escape sequence starting at `\`.
    fn scan_escape(&mut self) -> Result<char, SyntaxError> {
        let start = self.pos;
        self.bump();
        let escaped = match self.peek() {
            Some(b'"') => '"',
            Some(b'\\') => '\\',
            Some(b'/') => '/',
            Some(b'b') => '\u{0008}',
            Some(b'f') => '\u{000C}',
            Some(b'n') => '\n',
            Some(b'r') => '\r',
            Some(b't') => '\t',
            Some(b'u') => {
                self.bump();
                return self.scan_unicode_escape(start);
            }
            _ => {
                let seq = self.char_at(self.pos).map_or_else(String::new, String::from);
                return Err(self.error(
                    start,
                    format!("Invalid character escape sequence: \"\\{seq}\"."),
                ));
            }
        };
        self.bump();
        Ok(escaped)
    }

    /// Reads `XXXX` after `\u`, combining a UTF-16 surrogate pair if present.
    fn scan_unicode_escape(&mut self, start: u32) -> Result<char, SyntaxError> {
        let invalid = |lexer: &Self, len: u32| {
            let end = (start + len).min(u32::try_from(lexer.bytes.len()).unwrap_or(u32::MAX));
            let seq = lexer.source.body().get(start as usize..end as usize).unwrap_or("\\u");
            lexer.error(start, format!("Invalid Unicode escape sequence: \"{seq}\"."))
        };

        let high = self.read_hex4().ok_or_else(|| invalid(self, 6))?;
        if !(0xD800..=0xDBFF).contains(&high) {
            return char::from_u32(high).ok_or_else(|| invalid(self, 6));
        }

        if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'u') {
            let rewind = self.pos;
            self.bump_by(2);
            if let Some(low) = self.read_hex4().filter(|low| (0xDC00..=0xDFFF).contains(low)) {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).ok_or_else(|| invalid(self, 12));
            }
            self.pos = rewind;
        }
        Err(invalid(self, 6))
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let digits = self.bytes.get(self.pos as usize..self.pos as usize + 4)?;
        let text = std::str::from_utf8(digits).ok()?;
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(text, 16).ok()?;
        self.bump_by(4);
        Some(value)
    }

    /// Scans a `"""..."""` block string and returns its dedented value.
    fn scan_block_string(&mut self) -> Result<String, SyntaxError> {
        self.bump_by(3);
        let mut raw = String::new();
        let mut chunk_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error(self.pos, "Unterminated string.")),
                Some(b'"') if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') => {
                    raw.push_str(self.slice(chunk_start, self.pos));
                    self.bump_by(3);
                    return Ok(block_string::dedent(&raw));
                }
                Some(b'\\')
                    if self.peek_at(1) == Some(b'"')
                        && self.peek_at(2) == Some(b'"')
                        && self.peek_at(3) == Some(b'"') =>
                {
                    raw.push_str(self.slice(chunk_start, self.pos));
                    raw.push_str("\"\"\"");
                    self.bump_by(4);
                    chunk_start = self.pos;
                }
                Some(b'\n') => {
                    self.bump();
                    self.new_line();
                }
                Some(b'\r') => {
                    self.bump();
                    if self.peek() == Some(b'\n') {
                        self.bump();
                    }
                    self.new_line();
                }
                Some(c) if c < 0x20 && c != b'\t' => {
                    return Err(self.error(
                        self.pos,
                        format!("Invalid character within String: {}.", code_point(char::from(c))),
                    ));
                }
                Some(_) => self.bump(),
            }
        }
    }
}

/// Control characters other than tab, line feed and carriage return are not
/// GraphQL source characters.
fn is_invalid_source_char(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')
}

fn code_point(c: char) -> String {
    format!("U+{:04X}", c as u32)
}

/// Tokenizes the entire source, including comments, up to and including EOF.
pub fn tokenize(source: &Source) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.read_token()?;
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(&Source::new(text))
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(text: &str) -> Token {
        Lexer::new(&Source::new(text)).advance().unwrap()
    }

    fn lex_error(text: &str) -> SyntaxError {
        let source = Source::new(text);
        let mut lexer = Lexer::new(&source);
        loop {
            match lexer.advance() {
                Ok(token) if token.is_eof() => panic!("expected a lex error for {text:?}"),
                Ok(_) => {}
                Err(err) => return err,
            }
        }
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("! $ & ( ) ... : = @ [ ] { | }"),
            vec![
                TokenKind::Bang,
                TokenKind::Dollar,
                TokenKind::Amp,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Spread,
                TokenKind::Colon,
                TokenKind::Equals,
                TokenKind::At,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LBrace,
                TokenKind::Pipe,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_are_names() {
        let tokens = tokenize(&Source::new("query type on")).unwrap();
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Name));
        assert!(tokens[0].is_keyword("query"));
        assert_eq!(tokens[2].text(), "on");
    }

    #[test]
    fn test_ignored_tokens() {
        let source = Source::new("\u{feff} ,,\t\n  # comment\r\n  foo");
        let mut lexer = Lexer::new(&source);
        let token = lexer.advance().unwrap();
        assert_eq!(token.kind, TokenKind::Name);
        assert_eq!(token.text(), "foo");
        assert_eq!((token.line, token.column), (3, 3));
    }

    #[test]
    fn test_comment_token() {
        let tokens = tokenize(&Source::new("# hello\nx")).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text(), " hello");
        assert_eq!(tokens[1].text(), "x");
    }

    #[test]
    fn test_tokens_link_back_through_comments() {
        let source = Source::new("a # one\n# two\nb c");
        let mut lexer = Lexer::new(&source);

        let a = lexer.advance().unwrap();
        assert_eq!(a.prev, None);
        assert!(a.leading_trivia.is_empty());

        let b = lexer.advance().unwrap();
        assert_eq!(b.prev, Some(a.span));
        let comments: Vec<_> = b.leading_trivia.iter().map(Token::text).collect();
        assert_eq!(comments, [" one", " two"]);
        assert_eq!(b.leading_trivia[1].line, 2);

        let c = lexer.advance().unwrap();
        assert_eq!(c.prev, Some(b.span));
        assert!(c.leading_trivia.is_empty());

        assert_eq!(lexer.lookahead().unwrap().prev, Some(c.span));
        assert_eq!(lexer.advance().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 -17 0 -0 3.14 1e10 2.5e-3 6E+2"),
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_int_consumes_exact_substring() {
        for text in ["0", "-0", "7", "-7", "1234567890", "-2147483648"] {
            let source = Source::new(format!("{text} "));
            let token = Lexer::new(&source).advance().unwrap();
            assert_eq!(token.kind, TokenKind::Int);
            assert_eq!(token.text(), text);
            assert_eq!(token.span, Span::new(0, u32::try_from(text.len()).unwrap()));
        }
    }

    #[test]
    fn test_leading_zero_is_error() {
        for text in ["00", "01", "-01", "0123"] {
            let err = lex_error(text);
            assert!(
                err.message.starts_with("Invalid number, unexpected digit after 0"),
                "{text}: {}",
                err.message
            );
        }
    }

    #[test]
    fn test_number_followed_by_name_is_error() {
        assert_eq!(
            lex_error("123abc").message,
            "Invalid number, expected digit but got: \"a\"."
        );
        assert_eq!(lex_error("1.").message, "Invalid number, expected digit but got: <EOF>.");
        assert_eq!(lex_error("1.2.3").message, "Invalid number, expected digit but got: \".\".");
        assert_eq!(lex_error("-").message, "Invalid number, expected digit but got: <EOF>.");
    }

    #[test]
    fn test_string_escapes() {
        let token = single(r#""quote \" slash \\ \/ \b\f\n\r\t uni \u00e9""#);
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.text(), "quote \" slash \\ / \u{8}\u{c}\n\r\t uni é");
    }

    #[test]
    fn test_surrogate_pair_escape() {
        assert_eq!(single(r#""\uD83D\uDE00""#).text(), "😀");
        assert!(lex_error(r#""\uD83D""#)
            .message
            .starts_with("Invalid Unicode escape sequence"));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(lex_error("\"abc").message, "Unterminated string.");
        assert_eq!(lex_error("\"ab\ncd\"").message, "Unterminated string.");
        assert_eq!(
            lex_error(r#""\x""#).message,
            "Invalid character escape sequence: \"\\x\"."
        );
        assert_eq!(
            lex_error(r#""\u12G4""#).message,
            "Invalid Unicode escape sequence: \"\\u12G4\"."
        );
        assert_eq!(
            lex_error("\"a\u{7}b\"").message,
            "Invalid character within String: U+0007."
        );
    }

    #[test]
    fn test_block_string() {
        let token = single("\"\"\"\n    Hello,\n      World!\n    contains \\\"\"\" escaped\n  \"\"\"");
        assert_eq!(token.kind, TokenKind::BlockString);
        assert_eq!(token.text(), "Hello,\n  World!\ncontains \"\"\" escaped");
    }

    #[test]
    fn test_block_string_tracks_lines() {
        let source = Source::new("\"\"\"a\nb\r\nc\"\"\" next");
        let mut lexer = Lexer::new(&source);
        lexer.advance().unwrap();
        let next = lexer.advance().unwrap();
        assert_eq!((next.line, next.column), (3, 6));
    }

    #[test]
    fn test_unterminated_block_string() {
        assert_eq!(lex_error("\"\"\"abc").message, "Unterminated string.");
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(lex_error("\u{7}").message, "Invalid character: U+0007.");
        assert_eq!(lex_error("?").message, "Unexpected character: \"?\".");
        assert_eq!(lex_error("..").message, "Unexpected character: \".\".");
        assert!(lex_error("'a'").message.starts_with("Unexpected single quote"));
        assert_eq!(lex_error("ü").message, "Unexpected character: \"ü\".");
    }

    #[test]
    fn test_error_location() {
        let err = lex_error("{\n  a ?\n}");
        assert_eq!(err.location.line, 2);
        assert_eq!(err.location.column, 5);
        assert_eq!(err.offset(), 6);
    }

    #[test]
    fn test_lookahead_does_not_consume() {
        let source = Source::new("a b");
        let mut lexer = Lexer::new(&source);
        assert_eq!(lexer.lookahead().unwrap().text(), "a");
        assert_eq!(lexer.advance().unwrap().text(), "a");
        assert_eq!(lexer.lookahead().unwrap().text(), "b");
    }
}
