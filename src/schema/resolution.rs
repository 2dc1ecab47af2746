//! Schema resolution: merging a compatible reader/writer pair into a single
//! decode plan.
//!
//! [`SchemaCompatibility::resolve`] produces a schema shaped like the reader's
//! but annotated with everything the decoder needs to consume data written
//! with the writer schema: field order follows the writer, writer-only fields
//! carry [`FieldAction::Ignore`], reader-only fields carry
//! [`FieldAction::SetDefault`], promoted scalars become
//! [`Schema::Promoted`], and evolved enums record the writer's symbol list in
//! `actual_symbols`.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::SchemaError;
use crate::schema::compatibility::{Context, SchemaCompatibility};
use crate::schema::name::{find_field, FieldMatch};
use crate::schema::types::{
    is_native, FieldAction, FieldSchema, RecordSchema, Schema, TypePromotion,
};

/// Tracks record pairs currently being merged on this call chain.
///
/// A self-referential record would otherwise recurse without bound; on
/// re-entry the merge emits a `Ref` to the (reader-named) record instead.
struct ResolveState {
    in_progress: RefCell<HashSet<(String, String)>>,
}

impl ResolveState {
    fn new() -> Self {
        Self {
            in_progress: RefCell::new(HashSet::new()),
        }
    }
}

impl SchemaCompatibility {
    /// Produce the resolved schema for reading data written with `writer`
    /// using `reader`.
    ///
    /// Fails with the pair's incompatibility when no resolution exists. The
    /// result is deterministic for a given pair of inputs.
    pub fn resolve(&self, reader: &Schema, writer: &Schema) -> Result<Schema, SchemaError> {
        let ctx = Context::new(reader, writer);
        self.check(reader, writer, &ctx)?;
        self.merge(reader, writer, &ctx, &ResolveState::new())
    }

    /// Check then merge one branch; used where resolution picks among
    /// alternatives and must not commit before compatibility is known.
    fn resolve_branch(
        &self,
        reader: &Schema,
        writer: &Schema,
        ctx: &Context,
        state: &ResolveState,
    ) -> Result<Schema, SchemaError> {
        self.check(reader, writer, ctx)?;
        self.merge(reader, writer, ctx, state)
    }

    fn merge(
        &self,
        reader: &Schema,
        writer: &Schema,
        ctx: &Context,
        state: &ResolveState,
    ) -> Result<Schema, SchemaError> {
        let reader = ctx.reader_names.deref(reader)?;
        let writer = ctx.writer_names.deref(writer)?;

        if reader.kind() != writer.kind() {
            // A reader union reads a non-union writer as its first matching
            // branch.
            if let Schema::Union(branches) = reader {
                for branch in branches {
                    if let Ok(resolved) = self.resolve_branch(branch, writer, ctx, state) {
                        return Ok(resolved);
                    }
                }
                return Err(SchemaError::Resolution(format!(
                    "reader union has no branch for writer schema {}",
                    writer.kind()
                )));
            }

            // A non-union reader reads a writer union branch by branch.
            if let Schema::Union(branches) = writer {
                return self.merge_writer_union(reader, branches, ctx, state);
            }

            return match TypePromotion::between(writer.kind(), reader.kind()) {
                Some(promotion) => Ok(Schema::Promoted(promotion)),
                None => Err(SchemaError::Resolution(format!(
                    "failed to resolve composite schema for {} and {}",
                    reader.kind(),
                    writer.kind()
                ))),
            };
        }

        if is_native(reader.kind()) {
            return Ok(reader.clone());
        }

        match (reader, writer) {
            (Schema::Enum(r), Schema::Enum(w)) => {
                if Self::check_enum_symbols(r, w).is_ok() {
                    return Ok(reader.clone());
                }
                // Writer-only symbols decode to the reader default.
                if !r.has_default() {
                    return Err(SchemaError::Resolution(format!(
                        "reader enum {} has no default for writer symbols",
                        r.fullname()
                    )));
                }
                let mut merged = r.clone();
                merged.actual_symbols = Some(w.symbols.clone());
                Ok(Schema::Enum(merged))
            }

            (Schema::Fixed(_), Schema::Fixed(_)) => Ok(reader.clone()),

            (Schema::Array(r), Schema::Array(w)) => {
                let items = self.merge(r, w, ctx, state)?;
                Ok(Schema::Array(Box::new(items)))
            }

            (Schema::Map(r), Schema::Map(w)) => {
                let values = self.merge(r, w, ctx, state)?;
                Ok(Schema::Map(Box::new(values)))
            }

            (Schema::Union(_), Schema::Union(branches)) => {
                self.merge_writer_union(reader, branches, ctx, state)
            }

            (Schema::Record(r), Schema::Record(w)) => self.merge_record(r, w, ctx, state),

            (r, w) => Err(SchemaError::Resolution(format!(
                "failed to resolve composite schema for {} and {}",
                r.kind(),
                w.kind()
            ))),
        }
    }

    /// Resolve every writer branch against the reader; the result is a union
    /// in the writer's branch order so wire indices still line up.
    fn merge_writer_union(
        &self,
        reader: &Schema,
        branches: &[Schema],
        ctx: &Context,
        state: &ResolveState,
    ) -> Result<Schema, SchemaError> {
        let mut resolved = Vec::with_capacity(branches.len());
        for branch in branches {
            resolved.push(self.resolve_branch(reader, branch, ctx, state)?);
        }
        Ok(Schema::Union(resolved))
    }

    fn merge_record(
        &self,
        reader: &RecordSchema,
        writer: &RecordSchema,
        ctx: &Context,
        state: &ResolveState,
    ) -> Result<Schema, SchemaError> {
        let key = (reader.fullname(), writer.fullname());
        if !state.in_progress.borrow_mut().insert(key.clone()) {
            // Already merging this pair further up the chain; the merged
            // record keeps the reader's full name, so a reference suffices.
            return Ok(Schema::Ref(reader.fullname()));
        }

        let result = self.merge_record_fields(reader, writer, ctx, state);
        state.in_progress.borrow_mut().remove(&key);

        let fields = result?;
        let mut merged = RecordSchema::new(reader.name.clone(), fields);
        merged.namespace = reader.namespace.clone();
        merged.doc = reader.doc.clone();
        merged.aliases = reader.aliases.clone();
        Ok(Schema::Record(merged))
    }

    /// Merge field lists: writer fields first, in writer order, then the
    /// reader-only fields with their defaults.
    fn merge_record_fields(
        &self,
        reader: &RecordSchema,
        writer: &RecordSchema,
        ctx: &Context,
        state: &ResolveState,
    ) -> Result<Vec<FieldSchema>, SchemaError> {
        let mut fields = Vec::with_capacity(writer.fields.len());
        let mut seen: HashSet<&str> = HashSet::new();

        for writer_field in &writer.fields {
            let opts = FieldMatch { field_alias: false, elem_alias: true };
            match find_field(&reader.fields, writer_field, opts) {
                Some(reader_field) => {
                    let schema =
                        self.merge(&reader_field.schema, &writer_field.schema, ctx, state)?;
                    let mut field = FieldSchema::new(reader_field.name.clone(), schema);
                    field.default = reader_field.default.clone();
                    field.doc = reader_field.doc.clone();
                    field.order = reader_field.order;
                    field.aliases = reader_field.aliases.clone();
                    seen.insert(reader_field.name.as_str());
                    fields.push(field);
                }
                None => {
                    // Writer-only field: decoded and discarded.
                    let mut field = writer_field.clone();
                    field.action = FieldAction::Ignore;
                    fields.push(field);
                }
            }
        }

        for reader_field in &reader.fields {
            if seen.contains(reader_field.name.as_str()) {
                continue;
            }
            // Compatibility already guaranteed a default exists.
            let mut field = reader_field.clone();
            field.action = FieldAction::SetDefault;
            fields.push(field);
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{EnumSchema, SchemaKind};

    fn record(name: &str, fields: Vec<FieldSchema>) -> Schema {
        Schema::Record(RecordSchema::new(name, fields))
    }

    fn fields_of(schema: &Schema) -> &[FieldSchema] {
        match schema {
            Schema::Record(r) => &r.fields,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_identical_primitive() {
        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&Schema::String, &Schema::String).unwrap();
        assert_eq!(resolved, Schema::String);
    }

    #[test]
    fn test_resolve_promoted_scalar() {
        let checker = SchemaCompatibility::new();

        let resolved = checker.resolve(&Schema::Long, &Schema::Int).unwrap();
        assert_eq!(resolved, Schema::Promoted(TypePromotion::IntToLong));
        assert_eq!(resolved.kind(), SchemaKind::Long);

        let resolved = checker.resolve(&Schema::String, &Schema::Bytes).unwrap();
        assert_eq!(resolved, Schema::Promoted(TypePromotion::BytesToString));
    }

    #[test]
    fn test_resolve_incompatible_fails() {
        let checker = SchemaCompatibility::new();
        assert!(checker.resolve(&Schema::Int, &Schema::Long).is_err());
        assert!(checker.resolve(&Schema::Boolean, &Schema::String).is_err());
    }

    #[test]
    fn test_resolve_record_field_order_follows_writer() {
        let writer = record(
            "User",
            vec![
                FieldSchema::new("b", Schema::Int),
                FieldSchema::new("a", Schema::String),
            ],
        );
        let reader = record(
            "User",
            vec![
                FieldSchema::new("a", Schema::String),
                FieldSchema::new("b", Schema::Long),
            ],
        );

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&reader, &writer).unwrap();
        let fields = fields_of(&resolved);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "b");
        assert_eq!(fields[0].schema, Schema::Promoted(TypePromotion::IntToLong));
        assert_eq!(fields[0].action, FieldAction::None);
        assert_eq!(fields[1].name, "a");
        assert_eq!(fields[1].action, FieldAction::None);
    }

    #[test]
    fn test_resolve_record_writer_only_field_ignored() {
        let writer = record(
            "User",
            vec![
                FieldSchema::new("a", Schema::String),
                FieldSchema::new("legacy", Schema::Int),
            ],
        );
        let reader = record("User", vec![FieldSchema::new("a", Schema::String)]);

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&reader, &writer).unwrap();
        let fields = fields_of(&resolved);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, "legacy");
        assert_eq!(fields[1].action, FieldAction::Ignore);
    }

    #[test]
    fn test_resolve_record_reader_only_field_defaulted() {
        let writer = record("User", vec![FieldSchema::new("a", Schema::String)]);
        let reader = record(
            "User",
            vec![
                FieldSchema::new("a", Schema::String),
                FieldSchema::new("b", Schema::Int).with_default(serde_json::json!(7)),
            ],
        );

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&reader, &writer).unwrap();
        let fields = fields_of(&resolved);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, "b");
        assert_eq!(fields[1].action, FieldAction::SetDefault);
        assert_eq!(fields[1].default, Some(serde_json::json!(7)));
    }

    #[test]
    fn test_resolve_record_field_renamed_via_alias() {
        let writer = record("User", vec![FieldSchema::new("user_id", Schema::Long)]);
        let reader = record(
            "User",
            vec![FieldSchema::new("id", Schema::Long).with_aliases(vec!["user_id".to_string()])],
        );

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&reader, &writer).unwrap();
        let fields = fields_of(&resolved);

        // The resolved field carries the reader's name.
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        assert_eq!(fields[0].action, FieldAction::None);
    }

    #[test]
    fn test_resolve_enum_with_writer_only_symbols() {
        let writer = Schema::Enum(EnumSchema::new(
            "Color",
            vec!["RED".to_string(), "BLUE".to_string()],
        ));
        let reader = Schema::Enum(
            EnumSchema::new("Color", vec!["RED".to_string()]).with_default("RED"),
        );

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&reader, &writer).unwrap();

        let Schema::Enum(e) = resolved else {
            panic!("expected enum");
        };
        assert_eq!(
            e.actual_symbols,
            Some(vec!["RED".to_string(), "BLUE".to_string()])
        );
        assert_eq!(e.symbol(1), Some("RED"));
    }

    #[test]
    fn test_resolve_enum_same_symbols_untouched() {
        let schema = Schema::Enum(EnumSchema::new(
            "Color",
            vec!["RED".to_string(), "BLUE".to_string()],
        ));

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&schema, &schema).unwrap();

        let Schema::Enum(e) = resolved else {
            panic!("expected enum");
        };
        assert_eq!(e.actual_symbols, None);
    }

    #[test]
    fn test_resolve_array_and_map_rewrap() {
        let checker = SchemaCompatibility::new();

        let reader = Schema::Array(Box::new(Schema::Double));
        let writer = Schema::Array(Box::new(Schema::Float));
        let resolved = checker.resolve(&reader, &writer).unwrap();
        assert_eq!(
            resolved,
            Schema::Array(Box::new(Schema::Promoted(TypePromotion::FloatToDouble)))
        );

        let reader = Schema::Map(Box::new(Schema::Long));
        let writer = Schema::Map(Box::new(Schema::Int));
        let resolved = checker.resolve(&reader, &writer).unwrap();
        assert_eq!(
            resolved,
            Schema::Map(Box::new(Schema::Promoted(TypePromotion::IntToLong)))
        );
    }

    #[test]
    fn test_resolve_writer_union_preserves_branch_order() {
        let checker = SchemaCompatibility::new();

        let reader = Schema::Double;
        let writer = Schema::Union(vec![Schema::Int, Schema::Float]);
        let resolved = checker.resolve(&reader, &writer).unwrap();
        assert_eq!(
            resolved,
            Schema::Union(vec![
                Schema::Promoted(TypePromotion::IntToDouble),
                Schema::Promoted(TypePromotion::FloatToDouble),
            ])
        );
    }

    #[test]
    fn test_resolve_reader_union_picks_branch() {
        let checker = SchemaCompatibility::new();

        let reader = Schema::Union(vec![Schema::Null, Schema::Long]);
        let resolved = checker.resolve(&reader, &Schema::Int).unwrap();
        assert_eq!(resolved, Schema::Promoted(TypePromotion::IntToLong));
    }

    #[test]
    fn test_resolve_recursive_record() {
        let list = record(
            "LinkedList",
            vec![
                FieldSchema::new("value", Schema::Int),
                FieldSchema::new(
                    "next",
                    Schema::Union(vec![Schema::Null, Schema::Ref("LinkedList".to_string())]),
                ),
            ],
        );

        let checker = SchemaCompatibility::new();
        let resolved = checker.resolve(&list, &list).unwrap();
        let fields = fields_of(&resolved);

        assert_eq!(fields.len(), 2);
        // The recursive branch resolves to a reference, not an infinite tree.
        let Schema::Union(branches) = &fields[1].schema else {
            panic!("expected union");
        };
        assert_eq!(branches[1], Schema::Ref("LinkedList".to_string()));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let writer = record(
            "User",
            vec![
                FieldSchema::new("id", Schema::Int),
                FieldSchema::new("name", Schema::String),
            ],
        );
        let reader = record(
            "User",
            vec![
                FieldSchema::new("id", Schema::Long),
                FieldSchema::new("name", Schema::String),
                FieldSchema::new("email", Schema::String)
                    .with_default(serde_json::json!("")),
            ],
        );

        let checker = SchemaCompatibility::new();
        let first = checker.resolve(&reader, &writer).unwrap();
        let second = checker.resolve(&reader, &writer).unwrap();
        assert_eq!(first, second);
    }
}
