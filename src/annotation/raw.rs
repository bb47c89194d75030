//! Raw partial values carried by reducible annotations between shards.

use std::collections::BTreeMap;

use crate::variant::Allele;

/// Tagged raw partial value.
///
/// Keeping the variants explicit lets combine steps match on the payload
/// instead of downcasting, and keeps mixing incompatible partials a visible
/// error rather than a silent reinterpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// A single accumulating number (e.g. a running sum of squares).
    Numeric(f64),
    /// A structured list of numbers (e.g. per-strand counts).
    Structured(Vec<f64>),
}

impl RawValue {
    /// Numeric view of the value.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) => Some(*v),
            Self::Structured(_) => None,
        }
    }
}

/// Per-allele raw statistic plus its serialized transport form.
///
/// The raw string is what travels between shards; the attribute map is the
/// parsed, per-allele view used while combining. Site-level statistics that
/// do not split by allele key their single value by the no-call allele.
#[derive(Debug, Clone, Default)]
pub struct ReducibleAnnotationData {
    raw_data: Option<String>,
    attributes: BTreeMap<Allele, RawValue>,
}

impl ReducibleAnnotationData {
    /// Empty partial with no serialized form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Partial carrying a serialized raw string, parsed lazily by the
    /// owning annotation.
    pub fn from_raw_string(raw: impl Into<String>) -> Self {
        Self {
            raw_data: Some(raw.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Serialized transport form, when present.
    pub fn raw_data(&self) -> Option<&str> {
        self.raw_data.as_deref()
    }

    /// Value for one allele.
    pub fn attribute(&self, allele: &Allele) -> Option<&RawValue> {
        self.attributes.get(allele)
    }

    /// Store the value for one allele.
    pub fn put_attribute(&mut self, allele: Allele, value: RawValue) {
        self.attributes.insert(allele, value);
    }

    /// Parsed per-allele view.
    pub fn attribute_map(&self) -> &BTreeMap<Allele, RawValue> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_key_by_allele() {
        let mut data = ReducibleAnnotationData::new();
        data.put_attribute(Allele::no_call(), RawValue::Numeric(3600.0));
        assert_eq!(
            data.attribute(&Allele::no_call()).and_then(RawValue::as_numeric),
            Some(3600.0)
        );
        assert!(data.attribute(&Allele::reference(b"A")).is_none());
    }
}
