use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

/// Term type of a bound variable, as reported by the query service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    /// Non-standard spelling some endpoints use for literals carrying a datatype.
    TypedLiteral,
    Bnode,
}

impl Display for TermKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermKind::Uri => write!(f, "uri"),
            TermKind::Literal => write!(f, "literal"),
            TermKind::TypedLiteral => write!(f, "typed-literal"),
            TermKind::Bnode => write!(f, "bnode"),
        }
    }
}

/// Tagged value wrapper for one variable binding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoundValue {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

impl BoundValue {
    pub fn uri(value: &str) -> Self {
        BoundValue {
            kind: TermKind::Uri,
            value: value.to_string(),
            lang: None,
            datatype: None,
        }
    }

    pub fn literal(value: &str) -> Self {
        BoundValue {
            kind: TermKind::Literal,
            value: value.to_string(),
            lang: None,
            datatype: None,
        }
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }
}

/// One result row: variable name -> bound value. Unbound variables are simply absent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct RawRow {
    bindings: BTreeMap<String, BoundValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, var: &str, value: BoundValue) -> Self {
        self.bindings.insert(var.to_string(), value);
        self
    }

    pub fn get(&self, var: &str) -> Option<&BoundValue> {
        self.bindings.get(var)
    }

    pub fn value(&self, var: &str) -> Option<&str> {
        self.get(var).map(|b| b.value.as_str())
    }

    pub fn contains(&self, var: &str) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, BoundValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, BoundValue)>>(iter: I) -> Self {
        RawRow {
            bindings: iter.into_iter().collect(),
        }
    }
}
