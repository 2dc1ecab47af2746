//! Named-type registry backing `Schema::Ref` lookups.
//!
//! Named schemas (records, enums, fixed) live in an arena keyed by full name;
//! a [`Schema::Ref`] is a lookup key into that arena, never an owning pointer.
//! This breaks ownership cycles in self-referential schemas while preserving
//! shared identity.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::types::Schema;

/// Registry of named types by their fully qualified name.
#[derive(Debug, Clone, Default)]
pub struct NamedTypeRegistry {
    named_types: HashMap<String, Schema>,
}

impl NamedTypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry by extracting every named type from a schema tree.
    pub fn build_from_schema(schema: &Schema) -> Self {
        let mut registry = Self::new();
        registry.extract(schema);
        registry
    }

    /// Register a named type under the given full name.
    pub fn register(&mut self, fullname: String, schema: Schema) {
        self.named_types.insert(fullname, schema);
    }

    /// Get a named type.
    pub fn get(&self, fullname: &str) -> Option<&Schema> {
        self.named_types.get(fullname)
    }

    /// Check if a named type exists.
    pub fn contains(&self, fullname: &str) -> bool {
        self.named_types.contains_key(fullname)
    }

    /// Dereference a `Ref` to its target; any other schema passes through.
    ///
    /// Dereferencing never copies, it returns the shared named schema.
    pub fn deref<'a>(&'a self, schema: &'a Schema) -> Result<&'a Schema, SchemaError> {
        match schema {
            Schema::Ref(name) => self
                .named_types
                .get(name)
                .ok_or_else(|| SchemaError::UnresolvedRef(name.clone())),
            _ => Ok(schema),
        }
    }

    fn extract(&mut self, schema: &Schema) {
        match schema {
            Schema::Record(record) => {
                self.named_types.insert(record.fullname(), schema.clone());
                for field in &record.fields {
                    self.extract(&field.schema);
                }
            }
            Schema::Enum(e) => {
                self.named_types.insert(e.fullname(), schema.clone());
            }
            Schema::Fixed(f) => {
                self.named_types.insert(f.fullname(), schema.clone());
            }
            Schema::Array(items) => self.extract(items),
            Schema::Map(values) => self.extract(values),
            Schema::Union(branches) => {
                for branch in branches {
                    self.extract(branch);
                }
            }
            // Primitives, refs, and promoted scalars define no names.
            _ => {}
        }
    }
}
