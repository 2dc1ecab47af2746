//! Schema model, fingerprinting, compatibility checking, and resolution.

mod compatibility;
mod fingerprint;
mod name;
mod registry;
mod resolution;
mod types;

pub use compatibility::SchemaCompatibility;
pub use fingerprint::{canonical_form, Fingerprint};
pub use name::Named;
pub use registry::NamedTypeRegistry;
pub use types::{
    is_native, is_promotable, EnumSchema, FieldAction, FieldOrder, FieldSchema, FixedSchema,
    RecordSchema, Schema, SchemaKind, TypePromotion,
};
