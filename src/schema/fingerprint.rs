//! Structural schema fingerprints.
//!
//! A fingerprint is the SHA-256 digest of a schema's parsing canonical form:
//! the schema rendered as minimal JSON with fully qualified names, attribute
//! keys in a fixed order, and decode-irrelevant attributes (doc, aliases,
//! defaults, field order) stripped. Two dereferenced schemas with equal
//! fingerprints are interchangeable as compatibility-cache keys.
//!
//! A `Ref` node renders as its target's full name, so fingerprinting a
//! self-referential schema terminates. A ref's fingerprint therefore covers
//! only the name, not the target's structure; cache keys are always computed
//! on dereferenced schemas.

use sha2::{Digest, Sha256};

use crate::schema::types::Schema;

/// A 32-byte structural schema hash.
pub type Fingerprint = [u8; 32];

impl Schema {
    /// The structural fingerprint of this schema.
    ///
    /// Memoized on record, enum, and fixed nodes; recomputed for the cheap
    /// remaining variants.
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Schema::Record(r) => *r.fingerprint.get_or_init(|| hash(self)),
            Schema::Enum(e) => *e.fingerprint.get_or_init(|| hash(self)),
            Schema::Fixed(f) => *f.fingerprint.get_or_init(|| hash(self)),
            _ => hash(self),
        }
    }
}

fn hash(schema: &Schema) -> Fingerprint {
    Sha256::digest(canonical_form(schema).as_bytes()).into()
}

/// Render a schema's parsing canonical form.
pub fn canonical_form(schema: &Schema) -> String {
    let mut out = String::new();
    write_canonical(schema, &mut out);
    out
}

fn write_canonical(schema: &Schema, out: &mut String) {
    match schema {
        Schema::Null
        | Schema::Boolean
        | Schema::Int
        | Schema::Long
        | Schema::Float
        | Schema::Double
        | Schema::Bytes
        | Schema::String => {
            write_quoted(&schema.kind().to_string(), out);
        }
        // A promoted scalar fingerprints as its nominal (reader) type; the
        // on-wire annotation is not part of structural identity.
        Schema::Promoted(p) => {
            write_quoted(&p.reader_kind().to_string(), out);
        }
        Schema::Ref(name) => {
            write_quoted(name, out);
        }
        Schema::Record(r) => {
            out.push_str("{\"name\":");
            write_quoted(&r.fullname(), out);
            out.push_str(",\"type\":\"record\",\"fields\":[");
            for (i, field) in r.fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_quoted(&field.name, out);
                out.push_str(",\"type\":");
                write_canonical(&field.schema, out);
                out.push('}');
            }
            out.push_str("]}");
        }
        Schema::Enum(e) => {
            out.push_str("{\"name\":");
            write_quoted(&e.fullname(), out);
            out.push_str(",\"type\":\"enum\",\"symbols\":[");
            for (i, symbol) in e.symbols.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_quoted(symbol, out);
            }
            out.push_str("]}");
        }
        Schema::Fixed(f) => {
            out.push_str("{\"name\":");
            write_quoted(&f.fullname(), out);
            out.push_str(",\"type\":\"fixed\",\"size\":");
            out.push_str(&f.size.to_string());
            out.push('}');
        }
        Schema::Array(items) => {
            out.push_str("{\"type\":\"array\",\"items\":");
            write_canonical(items, out);
            out.push('}');
        }
        Schema::Map(values) => {
            out.push_str("{\"type\":\"map\",\"values\":");
            write_canonical(values, out);
            out.push('}');
        }
        Schema::Union(branches) => {
            out.push('[');
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(branch, out);
            }
            out.push(']');
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    out.push_str(s);
    out.push('"');
}
