//! Name and alias matching for named schemas and record fields.
//!
//! Matching is directional. A reader schema matches a writer schema when the
//! full names are equal or when the writer's full name appears among the
//! reader's aliases; the reverse alias direction is never consulted. Field
//! lookup likewise distinguishes whether the probe field's own aliases are
//! matched against candidate names (`field_alias`, used by the compatibility
//! matcher) or the candidates' aliases against the probe name (`elem_alias`,
//! used by the resolver). The two directions decide which side renames the
//! other and must not be conflated.

use crate::schema::types::{EnumSchema, FieldSchema, FixedSchema, RecordSchema};

/// Common surface of the named schema variants (record, enum, fixed).
pub trait Named {
    /// The bare name.
    fn name(&self) -> &str;
    /// The namespace, if any.
    fn namespace(&self) -> Option<&str>;
    /// Aliases as declared; bare aliases are qualified at match time.
    fn aliases(&self) -> &[String];

    /// The fully qualified name (namespace.name).
    fn fullname(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}.{}", ns, self.name()),
            None => self.name().to_string(),
        }
    }
}

impl Named for RecordSchema {
    fn name(&self) -> &str {
        &self.name
    }
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl Named for EnumSchema {
    fn name(&self) -> &str {
        &self.name
    }
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl Named for FixedSchema {
    fn name(&self) -> &str {
        &self.name
    }
    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Qualify a bare alias with the owning schema's namespace.
pub(crate) fn full_alias(namespace: Option<&str>, alias: &str) -> String {
    match namespace {
        Some(ns) if !alias.contains('.') => format!("{ns}.{alias}"),
        _ => alias.to_string(),
    }
}

/// Whether the reader schema's name matches the writer schema's.
///
/// True when the full names are equal, or when the writer's full name appears
/// among the reader's (qualified) aliases.
pub(crate) fn names_match(reader: &impl Named, writer: &impl Named) -> bool {
    let writer_fullname = writer.fullname();
    if reader.fullname() == writer_fullname {
        return true;
    }
    reader
        .aliases()
        .iter()
        .any(|alias| full_alias(reader.namespace(), alias) == writer_fullname)
}

/// Which alias directions a field lookup consults.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FieldMatch {
    /// Match the probe field's aliases against candidate names.
    pub field_alias: bool,
    /// Match candidate aliases against the probe field's name.
    pub elem_alias: bool,
}

/// Scan `candidates` for a field matching `field` by name or alias.
pub(crate) fn find_field<'a>(
    candidates: &'a [FieldSchema],
    field: &FieldSchema,
    opts: FieldMatch,
) -> Option<&'a FieldSchema> {
    for candidate in candidates {
        if candidate.name == field.name {
            return Some(candidate);
        }
        if opts.field_alias && field.aliases.iter().any(|a| *a == candidate.name) {
            return Some(candidate);
        }
        if opts.elem_alias && candidate.aliases.iter().any(|a| *a == field.name) {
            return Some(candidate);
        }
    }
    None
}
