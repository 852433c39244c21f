//! Named segment adapter
//!
//! The typed segment structs describe their content as [`NamedFields`]. This
//! adapter resolves the names against the [`SegmentSchema`] and hands the
//! values to the same field codec the positional adapter uses.

use crate::error::{FintsError, FintsResult};
use crate::schema::{FieldValue, GroupForm, NamedFields, SegmentSchema};
use crate::segment::Segment;

/// Build a segment from values by field name
///
/// # Errors
/// Returns a schema error for names the schema does not declare.
pub fn encode_named(schema: &SegmentSchema, number: u32, fields: &NamedFields) -> FintsResult<Segment> {
    if let Some(unknown) = fields.names().find(|n| !schema.fields.iter().any(|f| f.name == *n)) {
        return Err(FintsError::Schema(format!(
            "{} has no field {}",
            schema.type_id, unknown
        )));
    }

    let refs: Vec<&FieldValue> = schema.fields.iter().map(|f| fields.get(f.name)).collect();
    schema.build(number, &refs)
}

/// Read a segment into values by field name; absent fields are left out
pub fn decode_named(schema: &SegmentSchema, segment: &Segment) -> FintsResult<NamedFields> {
    let values = schema.read(segment, GroupForm::Named)?;
    let mut fields = NamedFields::new();
    for (field, value) in schema.fields.iter().zip(values) {
        if !value.is_absent() {
            fields.set(field.name, value);
        }
    }
    Ok(fields)
}
