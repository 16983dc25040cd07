//! Built-in board tables
//!
//! Each [`Platform`] authors a fixed set of tables with their checksums left
//! at zero. Finalization happens after extraction.

pub mod qcom;

use crate::author::{Artifact, AuthorError};
use std::fmt;
use std::str::FromStr;

/// Board with built-in tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Qualcomm Snapdragon 855
    Sm8150,
    /// Qualcomm Snapdragon 8 Elite Gen 5
    Sm8850,
}

impl Platform {
    /// Every known platform
    pub const ALL: [Self; 2] = [Self::Sm8150, Self::Sm8850];

    /// Lower-case name used on the command line
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sm8150 => "sm8150",
            Self::Sm8850 => "sm8850",
        }
    }

    /// Look up a platform by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.name().eq_ignore_ascii_case(name))
    }

    /// Author every table of this platform, unbracketed and unfinalized
    pub fn tables(self) -> Result<Vec<Vec<u8>>, AuthorError> {
        match self {
            Self::Sm8150 => Ok(vec![qcom::sm8150_gtdt()?]),
            Self::Sm8850 => Ok(vec![qcom::sm8850_dbg2()?]),
        }
    }

    /// Artifact embedding this platform's tables between filler bytes
    ///
    /// The filler mimics the code and data a compiler would place around the
    /// table objects, so extraction has to find them by magic alone.
    pub fn artifact(self) -> Result<Artifact, AuthorError> {
        let mut artifact = Artifact::new();
        artifact.filler(&[0x7F, b'E', b'L', b'F']).filler(&[0u8; 60]);
        for table in self.tables()? {
            artifact.embed(&table).filler(&[0xCC; 13]);
        }
        artifact.filler(&[0u8; 32]);
        Ok(artifact)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown platform name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}', expected one of: sm8150, sm8850")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::magic::scan_all;

    #[test]
    fn test_names_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_name(platform.name()), Some(platform));
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
        assert_eq!(Platform::from_name("SM8150"), Some(Platform::Sm8150));
        assert!("sm8250".parse::<Platform>().is_err());
    }

    #[test]
    fn test_artifact_contains_every_table() {
        for platform in Platform::ALL {
            let tables = platform.tables().expect("Test operation should succeed");
            let artifact = platform.artifact().expect("Test operation should succeed");
            assert_eq!(artifact.table_count(), tables.len());

            let records = scan_all(artifact.as_bytes()).expect("Test operation should succeed");
            assert_eq!(records.len(), tables.len());
            for (record, table) in records.iter().zip(&tables) {
                assert_eq!(record.bytes(artifact.as_bytes()), table.as_slice());
            }
        }
    }
}
