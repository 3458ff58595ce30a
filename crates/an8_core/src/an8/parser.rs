//! Schema-driven recursive-descent parser for An8 chunks.
//!
//! A chunk body is read in two phases: first the positional values declared
//! in the chunk's field table, in table order, then named fields in file
//! order until the closing brace. Unknown names are reported through the
//! warning sink and skipped by brace matching.
//!
//! # Supported Syntax
//!
//! - `name { "positional" 1 2.5 (0 1 0) subchunk { ... } }`
//! - `name { value }` and the inline form `name value`
//! - face records: `4 6 0 -1 ( (0 0 0) (1 1 1) (2 2 2) (3 3 3) )`
//! - weight records: `(2 (0 0.25) (1 0.75))`

use thiserror::Error;

use crate::mesh::{Corner, Face, FaceFlags};

use super::reader::Reader;
use super::schema::{Chunk, Field, Shape, Value, ValueKind, ValueSetter};
use super::types::An8Document;

/// A fatal error in an An8 document.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Per-vertex weight record: `(bone index, weight)` pairs.
pub type WeightRecord = Vec<(u32, f64)>;

/// Parser state for one document.
pub struct ChunkParser<'a> {
    reader: Reader<'a>,
    warn: &'a mut dyn FnMut(&str),
    depth: usize,
    max_depth: usize,
}

impl<'a> ChunkParser<'a> {
    pub fn new(content: &'a str, max_depth: usize, warn: &'a mut dyn FnMut(&str)) -> Self {
        Self {
            reader: Reader::new(content),
            warn,
            depth: 0,
            max_depth,
        }
    }

    /// Report a non-fatal condition.
    pub fn warn(&mut self, message: &str) {
        log::warn!("{}", message);
        (self.warn)(message);
    }

    pub fn reader(&mut self) -> &mut Reader<'a> {
        &mut self.reader
    }

    /// Parse a whole document: a chunk body that ends at end of input.
    pub fn parse_document<T: Chunk>(&mut self) -> ParseResult<T> {
        let mut target = T::default();
        self.body(&mut target, true)?;
        target.finish();
        Ok(target)
    }

    /// Parse `{ body }` into a fresh chunk of type `T`.
    pub fn chunk<T: Chunk>(&mut self) -> ParseResult<T> {
        self.reader.expect(b'{')?;
        self.enter()?;
        let mut target = T::default();
        self.body(&mut target, false)?;
        self.reader.expect(b'}')?;
        self.depth -= 1;
        target.finish();
        Ok(target)
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.reader.error(format!(
                "chunk nesting exceeds maximum depth of {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn body<T: Chunk>(&mut self, target: &mut T, top_level: bool) -> ParseResult<()> {
        for field in T::FIELDS {
            if let Shape::Positional { kind, repeated, set } = &field.shape {
                self.reader.skip_trivia()?;
                if *repeated {
                    while self.starts_value(*kind) {
                        set(target, self.read_value(*kind)?);
                        self.reader.skip_trivia()?;
                    }
                } else if self.starts_value(*kind) {
                    set(target, self.read_value(*kind)?);
                }
            }
        }

        loop {
            self.reader.skip_trivia()?;
            match self.reader.peek() {
                None if top_level => return Ok(()),
                None => {
                    return Err(self
                        .reader
                        .error(format!("unexpected end of file inside {}", T::NAME)))
                }
                Some(b'}') if !top_level => return Ok(()),
                Some(_) => {}
            }

            if !self.reader.starts_identifier() {
                let found = self.reader.peek().map(char::from).unwrap_or(' ');
                return Err(self.reader.error(format!(
                    "expected chunk name in {}, found '{}'",
                    T::NAME,
                    found
                )));
            }

            let line = self.reader.line();
            let name = self.reader.read_identifier()?;
            match T::field(&name) {
                Some(field) => self.named_field(target, field)?,
                None if T::QUIET => {
                    log::debug!("Skipping '{}' in {} (line {})", name, T::NAME, line);
                    self.skip_unknown()?;
                }
                None => {
                    self.warn(&format!(
                        "Skipping unknown chunk '{}' in {} (line {})",
                        name,
                        T::NAME,
                        line
                    ));
                    self.skip_unknown()?;
                }
            }
        }
    }

    fn named_field<T: Chunk>(&mut self, target: &mut T, field: &Field<T>) -> ParseResult<()> {
        match &field.shape {
            Shape::Positional { kind, repeated, set } | Shape::Wrapped { kind, repeated, set } => {
                self.wrapped_value(target, field.name, *kind, *repeated, *set)
            }
            Shape::Nested(parse) => parse(target, self),
            Shape::Marker(set) => {
                self.reader.skip_trivia()?;
                if self.reader.peek() == Some(b'{') {
                    self.skip_block()?;
                }
                set(target);
                Ok(())
            }
            Shape::Custom(parse) => {
                self.reader.expect(b'{')?;
                self.enter()?;
                parse(target, self)?;
                self.reader.expect(b'}')?;
                self.depth -= 1;
                Ok(())
            }
            Shape::Ignored => self.skip_unknown(),
        }
    }

    fn wrapped_value<T>(
        &mut self,
        target: &mut T,
        name: &str,
        kind: ValueKind,
        repeated: bool,
        set: ValueSetter<T>,
    ) -> ParseResult<()> {
        self.reader.skip_trivia()?;
        let braced = self.reader.peek() == Some(b'{');
        if braced {
            self.reader.bump();
            self.reader.skip_trivia()?;
        }

        if repeated {
            while self.starts_value(kind) {
                set(target, self.read_value(kind)?);
                self.reader.skip_trivia()?;
            }
        } else if self.starts_value(kind) {
            set(target, self.read_value(kind)?);
        } else if !braced {
            return Err(self
                .reader
                .error(format!("expected {} after '{}'", kind.describe(), name)));
        }

        if braced {
            self.reader.expect(b'}')?;
        }
        Ok(())
    }

    fn starts_value(&self, kind: ValueKind) -> bool {
        match kind {
            ValueKind::Int | ValueKind::Flags => self.reader.starts_int(),
            ValueKind::Float => self.reader.starts_float(),
            ValueKind::Str => self.reader.starts_string(),
            ValueKind::Name => self.reader.starts_identifier(),
            ValueKind::TexCoord | ValueKind::Point | ValueKind::Quat => self.reader.starts_tuple(),
        }
    }

    /// Read one value of the given kind.
    pub fn read_value(&mut self, kind: ValueKind) -> ParseResult<Value> {
        let reader = &mut self.reader;
        Ok(match kind {
            ValueKind::Int => Value::Int(reader.read_int()?),
            ValueKind::Float => Value::Float(reader.read_float()?),
            ValueKind::Str => Value::Str(reader.read_string()?),
            ValueKind::Name => Value::Name(reader.read_identifier()?),
            ValueKind::Flags => Value::Flags(reader.read_index()?),
            ValueKind::TexCoord => Value::TexCoord(reader.read_texcoord()?),
            ValueKind::Point => Value::Point(reader.read_point()?),
            ValueKind::Quat => Value::Quat(reader.read_quat()?),
        })
    }

    /// Skip whatever follows an unknown or ignored name: a braced block, or
    /// the inline values up to the next name or closing brace.
    fn skip_unknown(&mut self) -> ParseResult<()> {
        self.reader.skip_trivia()?;
        if self.reader.peek() == Some(b'{') {
            return self.skip_block();
        }
        loop {
            self.reader.skip_trivia()?;
            if self.reader.starts_string() {
                self.reader.skip_string()?;
            } else if self.reader.starts_float() {
                self.reader.read_float()?;
            } else if self.reader.starts_tuple() {
                self.skip_parens()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip a brace-delimited block starting at `{`, honouring nested
    /// braces, strings and comments.
    pub fn skip_block(&mut self) -> ParseResult<()> {
        self.skip_balanced(b'{', b'}')
    }

    fn skip_parens(&mut self) -> ParseResult<()> {
        self.skip_balanced(b'(', b')')
    }

    fn skip_balanced(&mut self, open: u8, close: u8) -> ParseResult<()> {
        let start = self.reader.error(format!("unterminated '{}'", open as char));
        self.reader
            .expect_with(|c| c == open, &format!("'{}'", open as char))?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.reader.peek() {
                None => return Err(start),
                Some(b'"') => self.reader.skip_string()?,
                Some(b'/') if self.reader.peek_at(1) == Some(b'*') => self.reader.skip_comment()?,
                Some(c) => {
                    if c == open {
                        depth += 1;
                    } else if c == close {
                        depth -= 1;
                    }
                    self.reader.bump();
                }
            }
        }
        Ok(())
    }

    /// Read face records until the closing brace of a `faces` chunk.
    ///
    /// Each record is `count flags material flatnormal ( corner* )`, where a
    /// corner is `(point [normal] [texcoord])` and the optional indices are
    /// present according to `flags`.
    pub fn face_records(&mut self) -> ParseResult<Vec<Face>> {
        let mut faces = Vec::new();
        loop {
            self.reader.skip_trivia()?;
            if matches!(self.reader.peek(), Some(b'}') | None) {
                return Ok(faces);
            }

            let count = self.reader.read_int()?;
            let count = usize::try_from(count)
                .map_err(|_| self.reader.error(format!("invalid face point count {}", count)))?;
            let flags = FaceFlags::from_bits_retain(self.reader.read_index()?);
            let material = self.read_i32("material index")?;
            let flat_normal = self.read_i32("flat normal index")?;

            let has_normals = flags.contains(FaceFlags::HAS_NORMALS);
            let has_texture = flags.contains(FaceFlags::HAS_TEXTURE);

            self.reader.expect(b'(')?;
            let mut corners = Vec::with_capacity(count.min(64));
            loop {
                self.reader.skip_trivia()?;
                if self.reader.peek() == Some(b')') {
                    self.reader.bump();
                    break;
                }
                self.reader.expect(b'(')?;
                let mut corner = Corner::new(self.reader.read_index()?);
                if has_normals {
                    corner.normal = Some(self.reader.read_index()?);
                }
                if has_texture {
                    corner.texcoord = Some(self.reader.read_index()?);
                }
                self.reader.expect(b')')?;
                corners.push(corner);
            }

            if corners.len() != count {
                return Err(self.reader.error(format!(
                    "face declares {} points but lists {}",
                    count,
                    corners.len()
                )));
            }

            faces.push(Face {
                flags,
                material,
                flat_normal,
                corners,
            });
        }
    }

    fn read_i32(&mut self, what: &str) -> ParseResult<i32> {
        let value = self.reader.read_int()?;
        i32::try_from(value).map_err(|_| self.reader.error(format!("{} out of range: {}", what, value)))
    }

    /// Read weight records until the closing brace of a `weights` chunk.
    ///
    /// A record is `(count (bone weight)*)`; the pairs may also be wrapped
    /// in one extra pair of parentheses.
    pub fn weight_records(&mut self) -> ParseResult<Vec<WeightRecord>> {
        let mut records = Vec::new();
        loop {
            self.reader.skip_trivia()?;
            if matches!(self.reader.peek(), Some(b'}') | None) {
                return Ok(records);
            }

            self.reader.expect(b'(')?;
            let count = self.reader.read_int()?;
            let mut record = Vec::new();
            self.weight_entries(&mut record, true)?;

            if record.len() as i64 != count {
                return Err(self.reader.error(format!(
                    "weight record declares {} entries but lists {}",
                    count,
                    record.len()
                )));
            }
            records.push(record);
        }
    }

    /// Read `(bone weight)` pairs up to and including the closing paren.
    fn weight_entries(&mut self, record: &mut WeightRecord, allow_wrapper: bool) -> ParseResult<()> {
        loop {
            self.reader.skip_trivia()?;
            match self.reader.peek() {
                Some(b')') => {
                    self.reader.bump();
                    return Ok(());
                }
                _ => {
                    self.reader.expect(b'(')?;
                    self.reader.skip_trivia()?;
                    if allow_wrapper && self.reader.peek() == Some(b'(') {
                        self.weight_entries(record, false)?;
                        continue;
                    }
                    let bone = self.reader.read_index()?;
                    let weight = self.reader.read_float()?;
                    self.reader.expect(b')')?;
                    record.push((bone, weight));
                }
            }
        }
    }
}

/// Parse an An8 document.
///
/// `warn` receives every non-fatal diagnostic (unknown chunks and the like).
pub fn parse_an8(
    content: &str,
    max_depth: usize,
    warn: &mut dyn FnMut(&str),
) -> ParseResult<An8Document> {
    let mut parser = ChunkParser::new(content, max_depth, warn);
    parser.parse_document()
}
