use crate::schema::error::SchemaError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeSet, fmt::Display, str::FromStr};

/// One output field of a record. The textual form is the field name,
/// suffixed with `?` when the field is optional (e.g. `entityPrefLabel?`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub optional: bool,
}

impl FieldSpec {
    pub fn required(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            optional: false,
        }
    }

    pub fn optional(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            optional: true,
        }
    }
}

impl FromStr for FieldSpec {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, optional) = match s.strip_suffix('?') {
            Some(name) => (name.trim_end(), true),
            None => (s, false),
        };

        if name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }

        Ok(FieldSpec {
            name: name.to_string(),
            optional,
        })
    }
}

impl Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.optional {
            write!(f, "{}?", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Serialize for FieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Shape of the records produced from one query: which variables must be
/// bound in every row, which may be missing, and the order fields are written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        if fields.iter().all(|f| f.optional) {
            return Err(SchemaError::NoRequiredField);
        }

        Ok(RecordSchema { fields })
    }

    /// Builds a schema with the required keys first, in the given order,
    /// followed by the optional keys.
    pub fn from_keys(required: &[&str], optional: &[&str]) -> Result<Self, SchemaError> {
        let fields = required
            .iter()
            .map(|name| FieldSpec::required(name))
            .chain(optional.iter().map(|name| FieldSpec::optional(name)))
            .collect();
        Self::new(fields)
    }

    /// Parses the `name` / `name?` notation used in configuration files.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, SchemaError> {
        let fields = specs
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<FieldSpec>, _>>()?;
        Self::new(fields)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn required_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.optional)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn optional_keys(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .filter(|f| f.optional)
            .map(|f| f.name.as_str())
            .collect()
    }
}

impl<'de> Deserialize<'de> for RecordSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<FieldSpec>::deserialize(deserializer)?;
        RecordSchema::new(fields).map_err(serde::de::Error::custom)
    }
}
