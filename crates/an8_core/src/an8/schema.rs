//! Static field tables describing each An8 chunk type.
//!
//! Every chunk type lists its fields once, in a `const` table of
//! `(name, shape, setter)` entries. The parser walks these tables instead of
//! inspecting the target type at runtime.

use an8_math::{DQuat, DVec2, DVec3};

use super::parser::{ChunkParser, ParseResult};

/// Kinds of scalar and composite values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    /// Double-quoted string
    Str,
    /// Enumerated value written as a bare identifier
    Name,
    /// Enumerated bit set written as an integer
    Flags,
    /// `(u v)`
    TexCoord,
    /// `(x y z)`
    Point,
    /// `(x y z w)`
    Quat,
}

impl ValueKind {
    pub fn describe(self) -> &'static str {
        match self {
            ValueKind::Int => "integer",
            ValueKind::Float => "number",
            ValueKind::Str => "string",
            ValueKind::Name => "name",
            ValueKind::Flags => "flags",
            ValueKind::TexCoord => "texcoord",
            ValueKind::Point => "point",
            ValueKind::Quat => "quaternion",
        }
    }
}

/// A parsed value, always of the kind its field declared.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Flags(u32),
    TexCoord(DVec2),
    Point(DVec3),
    Quat(DQuat),
}

impl Value {
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Flags(v) => i64::from(*v),
            Value::Float(v) => *v as i64,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Float(v) => *v,
            Value::Int(v) => *v as f64,
            _ => 0.0,
        }
    }

    pub fn as_flags(&self) -> u32 {
        match self {
            Value::Flags(v) => *v,
            _ => 0,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Value::Str(s) | Value::Name(s) => s,
            _ => String::new(),
        }
    }

    pub fn as_texcoord(&self) -> DVec2 {
        match self {
            Value::TexCoord(v) => *v,
            _ => DVec2::ZERO,
        }
    }

    pub fn as_point(&self) -> DVec3 {
        match self {
            Value::Point(v) => *v,
            _ => DVec3::ZERO,
        }
    }

    pub fn as_quat(&self) -> DQuat {
        match self {
            Value::Quat(v) => *v,
            _ => DQuat::IDENTITY,
        }
    }
}

/// Stores one parsed value into the target chunk.
pub type ValueSetter<T> = fn(&mut T, Value);

/// Parses part of a chunk body into the target chunk.
pub type BodyParser<T> = fn(&mut T, &mut ChunkParser<'_>) -> ParseResult<()>;

/// How a field appears in the chunk body.
pub enum Shape<T> {
    /// Bare value(s) at the start of the body, consumed in table order.
    /// Also accepted by name, like `Wrapped`.
    Positional {
        kind: ValueKind,
        repeated: bool,
        set: ValueSetter<T>,
    },
    /// `name { value }`, or inline as `name value`
    Wrapped {
        kind: ValueKind,
        repeated: bool,
        set: ValueSetter<T>,
    },
    /// `name { ... }` parsed as a chunk of its own (braces included)
    Nested(BodyParser<T>),
    /// `name { }`, only presence matters
    Marker(fn(&mut T)),
    /// Bespoke grammar between the braces
    Custom(BodyParser<T>),
    /// Known chunk with no meaning for conversion, skipped without a warning
    Ignored,
}

/// One entry of a chunk's field table.
pub struct Field<T> {
    pub name: &'static str,
    pub shape: Shape<T>,
}

impl<T> Field<T> {
    pub const fn positional(name: &'static str, kind: ValueKind, set: ValueSetter<T>) -> Self {
        Self {
            name,
            shape: Shape::Positional {
                kind,
                repeated: false,
                set,
            },
        }
    }

    pub const fn positional_list(name: &'static str, kind: ValueKind, set: ValueSetter<T>) -> Self {
        Self {
            name,
            shape: Shape::Positional {
                kind,
                repeated: true,
                set,
            },
        }
    }

    pub const fn wrapped(name: &'static str, kind: ValueKind, set: ValueSetter<T>) -> Self {
        Self {
            name,
            shape: Shape::Wrapped {
                kind,
                repeated: false,
                set,
            },
        }
    }

    pub const fn wrapped_list(name: &'static str, kind: ValueKind, set: ValueSetter<T>) -> Self {
        Self {
            name,
            shape: Shape::Wrapped {
                kind,
                repeated: true,
                set,
            },
        }
    }

    pub const fn nested(name: &'static str, parse: BodyParser<T>) -> Self {
        Self {
            name,
            shape: Shape::Nested(parse),
        }
    }

    pub const fn marker(name: &'static str, set: fn(&mut T)) -> Self {
        Self {
            name,
            shape: Shape::Marker(set),
        }
    }

    pub const fn custom(name: &'static str, parse: BodyParser<T>) -> Self {
        Self {
            name,
            shape: Shape::Custom(parse),
        }
    }

    pub const fn ignored(name: &'static str) -> Self {
        Self {
            name,
            shape: Shape::Ignored,
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.shape, Shape::Positional { .. })
    }
}

/// A chunk type the parser can populate.
pub trait Chunk: Default + Sized + 'static {
    /// Chunk name, used in diagnostics.
    const NAME: &'static str;

    /// Field table, positional fields first in declaration order.
    const FIELDS: &'static [Field<Self>];

    /// Skip unknown names without reporting them.
    const QUIET: bool = false;

    /// Called once the closing brace has been consumed.
    fn finish(&mut self) {}

    /// Look up a field by name, preferring named entries over positional ones.
    fn field(name: &str) -> Option<&'static Field<Self>> {
        Self::FIELDS
            .iter()
            .find(|f| f.name == name && !f.is_positional())
            .or_else(|| Self::FIELDS.iter().find(|f| f.name == name))
    }
}
