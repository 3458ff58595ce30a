//! Character-level reader for An8 text.
//!
//! Tracks 1-based line and column across the whole input and knows how to
//! read the grammar's terminals: identifiers, integers, floats, strings and
//! fixed-arity float tuples. Whitespace and `/* ... */` comments are
//! interchangeable separators.

use an8_math::{DQuat, DVec2, DVec3};

use super::parser::{ParseError, ParseResult};

/// Cursor over the raw bytes of an An8 document.
#[derive(Clone, Copy, Debug)]
pub struct Reader<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_delimiter(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b'{' | b'}' | b'(' | b')' | b'"')
}

impl<'a> Reader<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            src: content.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Build an error located at the current character.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    /// Consume one character, updating line and column.
    pub fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        match c {
            b'\n' => {
                self.line += 1;
                self.column = 1;
            }
            b'\r' => self.column = 1,
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Skip whitespace and block comments.
    pub fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Skip a `/* ... */` comment starting at the current position.
    pub fn skip_comment(&mut self) -> ParseResult<()> {
        let start = self.error("unterminated comment");
        self.bump();
        self.bump();
        loop {
            match self.bump() {
                Some(b'*') if self.peek() == Some(b'/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(start),
            }
        }
    }

    /// Consume `expected` after optional trivia.
    pub fn expect(&mut self, expected: u8) -> ParseResult<()> {
        self.skip_trivia()?;
        self.expect_with(|c| c == expected, &format!("'{}'", expected as char))
            .map(|_| ())
    }

    /// Consume the current character if it satisfies `pred`.
    pub fn expect_with(&mut self, pred: impl Fn(u8) -> bool, what: &str) -> ParseResult<u8> {
        match self.peek() {
            Some(c) if pred(c) => {
                self.bump();
                Ok(c)
            }
            Some(c) => Err(self.error(format!("expected {}, found '{}'", what, c as char))),
            None => Err(self.error(format!("expected {}, found end of file", what))),
        }
    }

    pub fn starts_identifier(&self) -> bool {
        self.peek().is_some_and(is_identifier_start)
    }

    pub fn starts_int(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some(b'+' | b'-') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    pub fn starts_float(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() || c == b'.' => true,
            Some(b'+' | b'-') => self
                .peek_at(1)
                .is_some_and(|c| c.is_ascii_digit() || c == b'.'),
            _ => false,
        }
    }

    /// A quote, or a single marker character directly followed by a quote.
    pub fn starts_string(&self) -> bool {
        match self.peek() {
            Some(b'"') => true,
            Some(c) if !is_delimiter(c) => self.peek_at(1) == Some(b'"'),
            _ => false,
        }
    }

    pub fn starts_tuple(&self) -> bool {
        self.peek() == Some(b'(')
    }

    pub fn read_identifier(&mut self) -> ParseResult<String> {
        self.skip_trivia()?;
        let first = self.expect_with(is_identifier_start, "identifier")?;
        let mut ident = String::from(first as char);
        while let Some(c) = self.peek().filter(|c| is_identifier_char(*c)) {
            ident.push(c as char);
            self.bump();
        }
        Ok(ident)
    }

    pub fn read_int(&mut self) -> ParseResult<i64> {
        self.skip_trivia()?;
        let mut text = String::new();
        if let Some(c @ (b'+' | b'-')) = self.peek() {
            text.push(c as char);
            self.bump();
        }
        self.expect_with(|c| c.is_ascii_digit(), "digit")
            .map(|c| text.push(c as char))?;
        while let Some(c) = self.peek().filter(u8::is_ascii_digit) {
            text.push(c as char);
            self.bump();
        }
        text.parse::<i64>()
            .map_err(|_| self.error(format!("integer out of range: {}", text)))
    }

    /// Read a non-negative integer used as an index.
    pub fn read_index(&mut self) -> ParseResult<u32> {
        let value = self.read_int()?;
        u32::try_from(value).map_err(|_| self.error(format!("invalid index {}", value)))
    }

    pub fn read_float(&mut self) -> ParseResult<f64> {
        self.skip_trivia()?;
        if !self.starts_float() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected number, found '{}'", c as char)),
                None => self.error("expected number, found end of file"),
            });
        }
        let mut text = String::new();
        let mut prev = 0u8;
        while let Some(c) = self.peek() {
            let accepted = c.is_ascii_digit()
                || matches!(c, b'.' | b'e' | b'E')
                || (matches!(c, b'+' | b'-') && (text.is_empty() || matches!(prev, b'e' | b'E')));
            if !accepted {
                break;
            }
            text.push(c as char);
            prev = c;
            self.bump();
        }
        text.parse::<f64>()
            .map_err(|_| self.error(format!("invalid number: {}", text)))
    }

    /// Read a double-quoted string, discarding an optional one-character prefix.
    pub fn read_string(&mut self) -> ParseResult<String> {
        self.skip_trivia()?;
        if self.peek() != Some(b'"') && self.starts_string() {
            self.bump();
        }
        self.expect_with(|c| c == b'"', "string")?;

        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = match self.bump() {
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        Some(b'r') => b'\r',
                        Some(b'a') => 0x07,
                        Some(b'b') => 0x08,
                        Some(b'f') => 0x0c,
                        Some(b'v') => 0x0b,
                        Some(other) => other,
                        None => return Err(self.error("unterminated string")),
                    };
                    bytes.push(escaped);
                }
                Some(c) => bytes.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Skip a string without decoding it.
    pub fn skip_string(&mut self) -> ParseResult<()> {
        self.read_string().map(|_| ())
    }

    /// Read a parenthesized group of exactly `N` floats.
    pub fn read_tuple<const N: usize>(&mut self) -> ParseResult<[f64; N]> {
        self.expect(b'(')?;
        let mut values = [0.0; N];
        for value in values.iter_mut() {
            *value = self.read_float()?;
        }
        self.expect(b')')?;
        Ok(values)
    }

    pub fn read_texcoord(&mut self) -> ParseResult<DVec2> {
        self.read_tuple::<2>().map(DVec2::from_array)
    }

    pub fn read_point(&mut self) -> ParseResult<DVec3> {
        self.read_tuple::<3>().map(DVec3::from_array)
    }

    /// Quaternions are written `(x y z w)`.
    pub fn read_quat(&mut self) -> ParseResult<DQuat> {
        self.read_tuple::<4>().map(DQuat::from_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column_tracking() {
        let mut reader = Reader::new("ab\ncd\r\nx");
        assert_eq!((reader.line(), reader.column()), (1, 1));
        reader.bump();
        reader.bump();
        assert_eq!((reader.line(), reader.column()), (1, 3));
        reader.bump(); // LF
        assert_eq!((reader.line(), reader.column()), (2, 1));
        reader.bump();
        reader.bump();
        reader.bump(); // CR
        assert_eq!(reader.column(), 1);
        reader.bump(); // LF
        assert_eq!((reader.line(), reader.column()), (3, 1));
    }

    #[test]
    fn test_comments_are_trivia() {
        let mut reader = Reader::new("  /* a { b } */ \n /**/name");
        assert_eq!(reader.read_identifier().unwrap(), "name");
    }

    #[test]
    fn test_unterminated_comment() {
        let mut reader = Reader::new("/* never closed");
        assert!(reader.skip_trivia().is_err());
    }

    #[test]
    fn test_numbers() {
        let mut reader = Reader::new("-12 +7 3.5 -0.25e2 1E-3 .5");
        assert_eq!(reader.read_int().unwrap(), -12);
        assert_eq!(reader.read_int().unwrap(), 7);
        assert_eq!(reader.read_float().unwrap(), 3.5);
        assert_eq!(reader.read_float().unwrap(), -25.0);
        assert!((reader.read_float().unwrap() - 0.001).abs() < 1e-12);
        assert_eq!(reader.read_float().unwrap(), 0.5);
    }

    #[test]
    fn test_bad_number_reports_position() {
        let mut reader = Reader::new("\n  1.2.3");
        let err = reader.read_float().unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_string_escapes() {
        let mut reader = Reader::new(r#""a\tb\nc\"d\\e\qf""#);
        assert_eq!(reader.read_string().unwrap(), "a\tb\nc\"d\\eqf");
    }

    #[test]
    fn test_string_marker_prefix() {
        let mut reader = Reader::new(r#"  @"tagged""#);
        assert!(!reader.starts_string());
        reader.skip_trivia().unwrap();
        assert!(reader.starts_string());
        assert_eq!(reader.read_string().unwrap(), "tagged");
    }

    #[test]
    fn test_tuples() {
        let mut reader = Reader::new("(1 2) ( 1 2 3 ) (0 0 0 1)");
        assert_eq!(reader.read_texcoord().unwrap(), DVec2::new(1.0, 2.0));
        assert_eq!(reader.read_point().unwrap(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(reader.read_quat().unwrap(), DQuat::IDENTITY);
    }

    #[test]
    fn test_short_tuple_is_error() {
        let mut reader = Reader::new("(1 2)");
        assert!(reader.read_point().is_err());
    }
}
