//! Schema types and representations.
//!
//! This module defines the schema type system: primitives, records, enums,
//! arrays, maps, fixed-size blobs, unions, and named references. Schemas are
//! immutable trees; recursive definitions are expressed with [`Schema::Ref`]
//! nodes that name a previously defined record, enum, or fixed schema.

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use crate::schema::fingerprint::Fingerprint;

/// Represents a schema.
///
/// Supports all primitive types, complex types, and named type references.
/// [`Schema::Promoted`] only appears in resolved schemas produced by
/// [`SchemaCompatibility::resolve`](crate::schema::SchemaCompatibility::resolve);
/// it records the writer's on-wire type alongside the reader's nominal type.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating-point.
    Float,
    /// 64-bit IEEE 754 floating-point.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Complex types
    /// Record type with named fields.
    Record(RecordSchema),
    /// Enumeration type.
    Enum(EnumSchema),
    /// Array of items with a single schema.
    Array(Box<Schema>),
    /// Map with string keys and values of a single schema.
    Map(Box<Schema>),
    /// Fixed-size byte array.
    Fixed(FixedSchema),
    /// Union of multiple schemas.
    Union(Vec<Schema>),

    /// Non-owning reference to a named schema, by full name.
    Ref(String),

    /// A scalar in a resolved schema whose on-wire type is the writer's.
    Promoted(TypePromotion),
}

/// The type tag of a schema node, used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Fixed,
    Union,
    Ref,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Union => "union",
            SchemaKind::Ref => "ref",
        };
        f.write_str(name)
    }
}

/// True for the scalar kinds that need no structural recursion.
pub fn is_native(kind: SchemaKind) -> bool {
    matches!(
        kind,
        SchemaKind::Null
            | SchemaKind::Boolean
            | SchemaKind::Int
            | SchemaKind::Long
            | SchemaKind::Float
            | SchemaKind::Double
            | SchemaKind::Bytes
            | SchemaKind::String
    )
}

/// True if a writer of this kind has at least one promotable reader kind.
pub fn is_promotable(kind: SchemaKind) -> bool {
    matches!(
        kind,
        SchemaKind::Int
            | SchemaKind::Long
            | SchemaKind::Float
            | SchemaKind::String
            | SchemaKind::Bytes
    )
}

/// A sanctioned widening conversion from a writer scalar to a reader scalar.
///
/// The table is one-directional: no variant exists for the reverse of any
/// conversion listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePromotion {
    /// int → long
    IntToLong,
    /// int → float
    IntToFloat,
    /// int → double
    IntToDouble,
    /// long → float
    LongToFloat,
    /// long → double
    LongToDouble,
    /// float → double
    FloatToDouble,
    /// string → bytes
    StringToBytes,
    /// bytes → string
    BytesToString,
}

impl TypePromotion {
    /// Look up the promotion from a writer kind to a reader kind.
    ///
    /// Returns `None` when the pair is not in the promotion table, including
    /// every equal-kind pair and every reversed pair.
    pub fn between(writer: SchemaKind, reader: SchemaKind) -> Option<Self> {
        match (writer, reader) {
            (SchemaKind::Int, SchemaKind::Long) => Some(TypePromotion::IntToLong),
            (SchemaKind::Int, SchemaKind::Float) => Some(TypePromotion::IntToFloat),
            (SchemaKind::Int, SchemaKind::Double) => Some(TypePromotion::IntToDouble),
            (SchemaKind::Long, SchemaKind::Float) => Some(TypePromotion::LongToFloat),
            (SchemaKind::Long, SchemaKind::Double) => Some(TypePromotion::LongToDouble),
            (SchemaKind::Float, SchemaKind::Double) => Some(TypePromotion::FloatToDouble),
            (SchemaKind::String, SchemaKind::Bytes) => Some(TypePromotion::StringToBytes),
            (SchemaKind::Bytes, SchemaKind::String) => Some(TypePromotion::BytesToString),
            _ => None,
        }
    }

    /// The writer-side (on-wire) kind.
    pub fn writer_kind(&self) -> SchemaKind {
        match self {
            TypePromotion::IntToLong | TypePromotion::IntToFloat | TypePromotion::IntToDouble => {
                SchemaKind::Int
            }
            TypePromotion::LongToFloat | TypePromotion::LongToDouble => SchemaKind::Long,
            TypePromotion::FloatToDouble => SchemaKind::Float,
            TypePromotion::StringToBytes => SchemaKind::String,
            TypePromotion::BytesToString => SchemaKind::Bytes,
        }
    }

    /// The reader-side (presented) kind.
    pub fn reader_kind(&self) -> SchemaKind {
        match self {
            TypePromotion::IntToLong => SchemaKind::Long,
            TypePromotion::IntToFloat | TypePromotion::LongToFloat => SchemaKind::Float,
            TypePromotion::IntToDouble
            | TypePromotion::LongToDouble
            | TypePromotion::FloatToDouble => SchemaKind::Double,
            TypePromotion::StringToBytes => SchemaKind::Bytes,
            TypePromotion::BytesToString => SchemaKind::String,
        }
    }
}

/// Schema for a record type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    /// The name of the record.
    pub name: String,
    /// Optional namespace for the record.
    pub namespace: Option<String>,
    /// The fields of the record.
    pub fields: Vec<FieldSchema>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this record.
    pub aliases: Vec<String>,

    pub(crate) fingerprint: OnceLock<Fingerprint>,
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.fields == other.fields
            && self.doc == other.doc
            && self.aliases == other.aliases
    }
}

impl RecordSchema {
    /// Create a new RecordSchema with the given name and fields.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            fields,
            doc: None,
            aliases: Vec::new(),
            fingerprint: OnceLock::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self.fingerprint = OnceLock::new();
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Three-state decode tag assigned to fields during schema resolution.
///
/// The value decoder uses this tag to implement evolution-aware decoding; every
/// field in a resolved record carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldAction {
    /// Read the field normally.
    #[default]
    None,
    /// Writer-only field: consume and discard its encoded bytes.
    Ignore,
    /// Reader-only field: emit the default value, consume no bytes.
    SetDefault,
}

/// Field ordering for record comparison; passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    #[default]
    Ascending,
    Descending,
    Ignore,
}

/// Schema for a field within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// The name of the field.
    pub name: String,
    /// The schema of the field's value.
    pub schema: Schema,
    /// Optional default value for the field.
    pub default: Option<Value>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Field ordering (ascending, descending, ignore).
    pub order: FieldOrder,
    /// Aliases for this field.
    pub aliases: Vec<String>,
    /// Decode action assigned by schema resolution.
    pub action: FieldAction,
}

impl FieldSchema {
    /// Create a new FieldSchema with the given name and schema.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
            doc: None,
            order: FieldOrder::Ascending,
            aliases: Vec::new(),
            action: FieldAction::None,
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Whether the field declares a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone)]
pub struct EnumSchema {
    /// The name of the enum.
    pub name: String,
    /// Optional namespace for the enum.
    pub namespace: Option<String>,
    /// The symbols (variants) of the enum.
    pub symbols: Vec<String>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this enum.
    pub aliases: Vec<String>,
    /// Default symbol (for schema resolution).
    pub default: Option<String>,
    /// The writer's symbol list, set on resolved enums whose writer declared
    /// symbols the reader does not know.
    pub actual_symbols: Option<Vec<String>>,

    pub(crate) fingerprint: OnceLock<Fingerprint>,
}

impl PartialEq for EnumSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.symbols == other.symbols
            && self.doc == other.doc
            && self.aliases == other.aliases
            && self.default == other.default
            && self.actual_symbols == other.actual_symbols
    }
}

impl EnumSchema {
    /// Create a new EnumSchema with the given name and symbols.
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            symbols,
            doc: None,
            aliases: Vec::new(),
            default: None,
            actual_symbols: None,
            fingerprint: OnceLock::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self.fingerprint = OnceLock::new();
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Set the default symbol.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Whether the enum declares a default symbol.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Map a wire symbol index to the symbol the reader should present.
    ///
    /// On a resolved enum the index refers to the writer's "actual" symbol
    /// list; a writer symbol unknown to the reader falls back to the reader's
    /// default, and is unmappable without one.
    pub fn symbol(&self, index: usize) -> Option<&str> {
        match &self.actual_symbols {
            Some(actual) => {
                let symbol = actual.get(index)?;
                if self.symbols.iter().any(|s| s == symbol) {
                    Some(symbol)
                } else {
                    self.default.as_deref()
                }
            }
            None => self.symbols.get(index).map(String::as_str),
        }
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone)]
pub struct FixedSchema {
    /// The name of the fixed type.
    pub name: String,
    /// Optional namespace for the fixed type.
    pub namespace: Option<String>,
    /// The size in bytes.
    pub size: usize,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this fixed type.
    pub aliases: Vec<String>,

    pub(crate) fingerprint: OnceLock<Fingerprint>,
}

impl PartialEq for FixedSchema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.namespace == other.namespace
            && self.size == other.size
            && self.doc == other.doc
            && self.aliases == other.aliases
    }
}

impl FixedSchema {
    /// Create a new FixedSchema with the given name and size.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            size,
            doc: None,
            aliases: Vec::new(),
            fingerprint: OnceLock::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self.fingerprint = OnceLock::new();
        self
    }

    /// Set the aliases.
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl Schema {
    /// The type tag of this schema node.
    ///
    /// A promoted scalar reports its reader-side (nominal) kind.
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::Bytes => SchemaKind::Bytes,
            Schema::String => SchemaKind::String,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Ref(_) => SchemaKind::Ref,
            Schema::Promoted(p) => p.reader_kind(),
        }
    }

    /// Get the fully qualified name of a named type, if applicable.
    pub fn fullname(&self) -> Option<String> {
        match self {
            Schema::Record(r) => Some(r.fullname()),
            Schema::Enum(e) => Some(e.fullname()),
            Schema::Fixed(f) => Some(f.fullname()),
            Schema::Ref(name) => Some(name.clone()),
            _ => None,
        }
    }

    /// Check if this schema is a nullable union: exactly two branches, one of
    /// which is `Null`.
    pub fn is_nullable(&self) -> bool {
        match self {
            Schema::Union(branches) => {
                branches.len() == 2 && branches.iter().any(|b| matches!(b, Schema::Null))
            }
            _ => false,
        }
    }

    /// For a nullable union, get the non-null branch.
    pub fn nullable_inner(&self) -> Option<&Schema> {
        match self {
            Schema::Union(branches) if self.is_nullable() => {
                branches.iter().find(|b| !matches!(b, Schema::Null))
            }
            _ => None,
        }
    }
}
