//! Schema compatibility checking and resolution for schema-evolving formats
//!
//! This library answers two questions about a reader/writer schema pair:
//! whether data written with the writer schema can be read using the reader
//! schema ([`SchemaCompatibility::compatible`]), and how to read it
//! ([`SchemaCompatibility::resolve`], which produces a merged schema
//! annotated with per-field decode actions and type promotions).
//!
//! Checks are memoized by schema fingerprint in a concurrent cache, so a
//! long-lived [`SchemaCompatibility`] shared across threads answers repeated
//! questions about hot schema pairs from the cache.

pub mod error;
pub mod schema;

// Re-export main types
pub use error::SchemaError;
pub use schema::{
    canonical_form, is_native, is_promotable, EnumSchema, FieldAction, FieldOrder, FieldSchema,
    Fingerprint, FixedSchema, Named, NamedTypeRegistry, RecordSchema, Schema, SchemaCompatibility,
    SchemaKind, TypePromotion,
};
