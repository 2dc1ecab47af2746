//! Schema compatibility checking.
//!
//! Determines whether data written with a writer schema can be read using a
//! reader schema. Compatibility is directional: `compatible(r, w)` says
//! nothing about `compatible(w, r)`.
//!
//! Results are memoized per `(reader fingerprint, writer fingerprint)` pair in
//! a concurrent map owned by a long-lived [`SchemaCompatibility`] instance.
//! Before recursing into a pair the checker stores an in-progress sentinel;
//! re-encountering the sentinel means the question is already being evaluated
//! further up the call chain (mutually recursive records) and is assumed to
//! hold. That "assume true" approximation is deliberate, not a bug. Two
//! threads racing on the same key recompute the same pure function, so the
//! last write wins harmlessly.

use dashmap::DashMap;
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::fingerprint::Fingerprint;
use crate::schema::name::{find_field, names_match, FieldMatch, Named};
use crate::schema::registry::NamedTypeRegistry;
use crate::schema::types::{EnumSchema, FixedSchema, RecordSchema, Schema, TypePromotion};

type CompatKey = (Fingerprint, Fingerprint);

#[derive(Debug, Clone)]
enum CacheEntry {
    /// Cycle guard: the pair is being evaluated on the current call chain.
    InProgress,
    Ok,
    Failed(String),
}

/// Per-call environment: the named-type arenas of the two schema trees.
///
/// `Ref` nodes in the reader tree resolve against the reader arena and writer
/// refs against the writer arena; sides never swap during recursion.
pub(crate) struct Context {
    pub(crate) reader_names: NamedTypeRegistry,
    pub(crate) writer_names: NamedTypeRegistry,
}

impl Context {
    pub(crate) fn new(reader: &Schema, writer: &Schema) -> Self {
        Self {
            reader_names: NamedTypeRegistry::build_from_schema(reader),
            writer_names: NamedTypeRegistry::build_from_schema(writer),
        }
    }
}

/// Determines the compatibility of reader/writer schema pairs.
///
/// Cheap to share behind an `Arc`; the memo cache grows monotonically for the
/// lifetime of the instance.
#[derive(Debug, Default)]
pub struct SchemaCompatibility {
    cache: DashMap<CompatKey, CacheEntry>,
}

impl SchemaCompatibility {
    /// Create a new compatibility checker with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether data written with `writer` can be read using `reader`.
    ///
    /// Returns `Ok(())` on compatibility, or an error carrying the first
    /// incompatibility encountered. No side effects beyond populating the
    /// shared cache.
    pub fn compatible(&self, reader: &Schema, writer: &Schema) -> Result<(), SchemaError> {
        let ctx = Context::new(reader, writer);
        self.check(reader, writer, &ctx)
    }

    /// Memoized compatibility check.
    pub(crate) fn check(
        &self,
        reader: &Schema,
        writer: &Schema,
        ctx: &Context,
    ) -> Result<(), SchemaError> {
        // Dereference before keying: a ref's identity is its target's
        // structure. The cache outlives any one schema tree, and two trees
        // can bind the same name to different definitions, so a name-based
        // key would replay one tree's verdict for the other.
        let reader = ctx.reader_names.deref(reader)?;
        let writer = ctx.writer_names.deref(writer)?;

        let key = (reader.fingerprint(), writer.fingerprint());
        if let Some(entry) = self.cache.get(&key) {
            return match entry.value() {
                // Break the recursion here.
                CacheEntry::InProgress | CacheEntry::Ok => Ok(()),
                CacheEntry::Failed(reason) => Err(SchemaError::Incompatible(reason.clone())),
            };
        }

        self.cache.insert(key, CacheEntry::InProgress);
        match self.match_schemas(reader, writer, ctx) {
            Ok(()) => {
                self.cache.insert(key, CacheEntry::Ok);
                Ok(())
            }
            Err(err) => {
                if matches!(err, SchemaError::UnresolvedRef(_)) {
                    // A dangling reference is a malformed tree, not a verdict
                    // on the pair; surface it as-is and leave no cache entry.
                    self.cache.remove(&key);
                    return Err(err);
                }
                // Normalize to the reason string so cached and fresh results
                // are identical.
                let reason = err.reason().to_string();
                debug!(%reason, "schemas incompatible");
                self.cache.insert(key, CacheEntry::Failed(reason.clone()));
                Err(SchemaError::Incompatible(reason))
            }
        }
    }

    /// The recursive matcher; `reader` and `writer` arrive dereferenced.
    fn match_schemas(
        &self,
        reader: &Schema,
        writer: &Schema,
        ctx: &Context,
    ) -> Result<(), SchemaError> {
        if reader.kind() != writer.kind() {
            if let Schema::Union(branches) = writer {
                // Data written as any writer branch must be readable.
                for branch in branches {
                    self.check(reader, branch, ctx)?;
                }
                return Ok(());
            }

            if let Schema::Union(branches) = reader {
                // The writer must be readable as at least one reader branch.
                for branch in branches {
                    if self.check(branch, writer, ctx).is_ok() {
                        return Ok(());
                    }
                }
                return Err(SchemaError::Incompatible(format!(
                    "reader union lacking writer schema {}",
                    writer.kind()
                )));
            }

            return match TypePromotion::between(writer.kind(), reader.kind()) {
                Some(_) => Ok(()),
                None => Err(SchemaError::Incompatible(format!(
                    "reader schema {} not compatible with writer schema {}",
                    reader.kind(),
                    writer.kind()
                ))),
            };
        }

        match (reader, writer) {
            (Schema::Array(r), Schema::Array(w)) => self.check(r, w, ctx),

            (Schema::Map(r), Schema::Map(w)) => self.check(r, w, ctx),

            (Schema::Fixed(r), Schema::Fixed(w)) => {
                Self::check_schema_name(r, w)?;
                Self::check_fixed_size(r, w)
            }

            (Schema::Enum(r), Schema::Enum(w)) => {
                Self::check_schema_name(r, w)?;
                match Self::check_enum_symbols(r, w) {
                    // Unknown writer symbols fall back to the reader default
                    // at decode time.
                    Err(_) if r.has_default() => Ok(()),
                    other => other,
                }
            }

            (Schema::Record(r), Schema::Record(w)) => {
                Self::check_schema_name(r, w)?;
                self.check_record_fields(r, w, ctx)
            }

            (Schema::Union(_), Schema::Union(branches)) => {
                // Each writer branch must be readable as the reader union.
                for branch in branches {
                    self.check(reader, branch, ctx)?;
                }
                Ok(())
            }

            // Equal scalar kinds are trivially compatible.
            _ => Ok(()),
        }
    }

    fn check_schema_name(reader: &impl Named, writer: &impl Named) -> Result<(), SchemaError> {
        if names_match(reader, writer) {
            return Ok(());
        }
        Err(SchemaError::Incompatible(format!(
            "reader schema {} and writer schema {} names do not match",
            reader.fullname(),
            writer.fullname()
        )))
    }

    fn check_fixed_size(reader: &FixedSchema, writer: &FixedSchema) -> Result<(), SchemaError> {
        if reader.size != writer.size {
            return Err(SchemaError::Incompatible(format!(
                "{} reader and writer fixed sizes do not match",
                reader.fullname()
            )));
        }
        Ok(())
    }

    /// Every writer symbol must exist in the reader's symbol set, by name.
    pub(crate) fn check_enum_symbols(
        reader: &EnumSchema,
        writer: &EnumSchema,
    ) -> Result<(), SchemaError> {
        for symbol in &writer.symbols {
            if !reader.symbols.contains(symbol) {
                return Err(SchemaError::Incompatible(format!(
                    "reader {} is missing symbol {}",
                    reader.fullname(),
                    symbol
                )));
            }
        }
        Ok(())
    }

    fn check_record_fields(
        &self,
        reader: &RecordSchema,
        writer: &RecordSchema,
        ctx: &Context,
    ) -> Result<(), SchemaError> {
        for reader_field in &reader.fields {
            let opts = FieldMatch { field_alias: true, elem_alias: false };
            match find_field(&writer.fields, reader_field, opts) {
                Some(writer_field) => {
                    self.check(&reader_field.schema, &writer_field.schema, ctx)?;
                }
                // Writer-only fields are ignored at decode time; reader-only
                // fields need a default.
                None if reader_field.has_default() => {}
                None => {
                    return Err(SchemaError::Incompatible(format!(
                        "reader field {} is missing in writer schema and has no default",
                        reader_field.name
                    )));
                }
            }
        }
        Ok(())
    }
}
