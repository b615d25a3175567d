use crate::error::NormalizeError;
use model::{
    records::{raw::RawRow, record::Record},
    schema::field::RecordSchema,
};

/// Flattens raw result rows into [`Record`]s holding only each variable's value.
///
/// Required fields must be bound in every row. Optional fields are copied
/// when bound and left out of the record otherwise, never written as null
/// or an empty string.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    schema: RecordSchema,
}

impl RowNormalizer {
    pub fn new(schema: RecordSchema) -> Self {
        RowNormalizer { schema }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Normalizes a page of rows. Stops at the first row missing a required field.
    pub fn normalize(&self, rows: &[RawRow]) -> Result<Vec<Record>, NormalizeError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.normalize_row(index, row))
            .collect()
    }

    pub fn normalize_row(&self, index: usize, row: &RawRow) -> Result<Record, NormalizeError> {
        let fields = self.schema.fields();
        let mut record = Record::with_capacity(fields.len());

        for field in fields {
            match row.value(&field.name) {
                Some(value) => record.insert(&field.name, value),
                None if field.optional => {}
                None => {
                    return Err(NormalizeError::MissingRequiredField {
                        row: index,
                        field: field.name.clone(),
                    });
                }
            }
        }

        Ok(record)
    }
}
