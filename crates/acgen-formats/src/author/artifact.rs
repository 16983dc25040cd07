use crate::magic::{END_MAGIC, START_MAGIC};

/// Wrap a serialized table in its start and end magic
pub fn bracket(table: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(table.len() + START_MAGIC.len() + END_MAGIC.len());
    out.extend_from_slice(&START_MAGIC);
    out.extend_from_slice(table);
    out.extend_from_slice(&END_MAGIC);
    out
}

/// Flat byte buffer standing in for a compiled artifact
///
/// Tables are embedded magic-bracketed with nothing interposed between a
/// magic sequence and the table bytes; anything else (code, string pools,
/// alignment) is modelled as opaque filler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    bytes: Vec<u8>,
    tables: usize,
}

impl Artifact {
    /// Empty artifact
    pub fn new() -> Self {
        Self::default()
    }

    /// Append opaque bytes
    pub fn filler(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append a table bracketed by the magic sequences
    pub fn embed(&mut self, table: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(&bracket(table));
        self.tables += 1;
        tracing::trace!(len = table.len(), total = self.tables, "embedded table");
        self
    }

    /// Number of embedded tables
    pub fn table_count(&self) -> usize {
        self.tables
    }

    /// Artifact bytes so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the artifact bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bracket() {
        assert_eq!(bracket(b"XY"), b"ACGSXYACGE".to_vec());
        assert_eq!(bracket(b""), b"ACGSACGE".to_vec());
    }

    #[test]
    fn test_artifact_layout() {
        let mut artifact = Artifact::new();
        artifact.filler(&[0xAA; 3]).embed(b"T1").filler(&[0xBB]).embed(b"T2");

        assert_eq!(artifact.table_count(), 2);
        assert_eq!(
            artifact.as_bytes(),
            b"\xAA\xAA\xAAACGST1ACGE\xBBACGST2ACGE".as_slice()
        );
    }
}
