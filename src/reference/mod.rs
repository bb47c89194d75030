//! Reference-sequence accessor collaborator.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::position::{ContigDictionary, GenomeLocation, LocationError};

/// Random access to reference bases by contig and position range.
pub trait ReferenceProvider {
    /// Bases of `location`, uppercase ASCII, one byte per position.
    fn bases(&self, location: &GenomeLocation) -> Result<Vec<u8>, LocationError>;

    /// Contig names and lengths backing this reference.
    fn dictionary(&self) -> &ContigDictionary;
}

/// Reference held fully in memory, suitable for tests and small regions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    sequences: BTreeMap<Arc<str>, Vec<u8>>,
    dictionary: ContigDictionary,
}

impl InMemoryReference {
    /// Build from `(contig, sequence)` pairs.
    pub fn from_contigs<I, S>(contigs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<Arc<str>>,
    {
        let mut reference = Self::default();
        for (name, sequence) in contigs {
            let name = name.into();
            reference.dictionary.add(Arc::clone(&name), sequence.len() as u64);
            reference.sequences.insert(name, sequence);
        }
        reference
    }
}

impl ReferenceProvider for InMemoryReference {
    fn bases(&self, location: &GenomeLocation) -> Result<Vec<u8>, LocationError> {
        let sequence = self
            .sequences
            .get(location.contig().as_ref())
            .ok_or_else(|| LocationError::UnknownContig(location.contig().to_string()))?;
        let start = (location.start() - 1) as usize;
        let end = (location.end() as usize).min(sequence.len());
        if start >= sequence.len() {
            return Ok(Vec::new());
        }
        Ok(sequence[start..end].to_vec())
    }

    fn dictionary(&self) -> &ContigDictionary {
        &self.dictionary
    }
}
