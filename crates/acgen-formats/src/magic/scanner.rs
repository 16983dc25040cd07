use super::error::ScanError;
use super::{END_MAGIC, ExtractedRecord, START_MAGIC};
use tracing::debug;

/// Lazy left-to-right scan for magic-bracketed records
///
/// Yields one [`ExtractedRecord`] per start/end pair, in the order the start
/// magics appear, never overlapping. After an unmatched start magic it yields
/// [`ScanError::TruncatedArtifact`] once and then ends.
///
/// The buffer is borrowed immutably for the scanner's lifetime, so records
/// can never outlive or observe mutation of the artifact they came from.
#[derive(Debug, Clone)]
pub struct MagicScanner<'a> {
    buffer: &'a [u8],
    cursor: usize,
    strict: bool,
    done: bool,
}

impl<'a> MagicScanner<'a> {
    /// Scan `buffer` from its first byte
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            strict: false,
            done: false,
        }
    }

    /// Skip start-magic candidates not followed by a plausible signature
    ///
    /// The bracket protocol itself does not disambiguate magic bytes that
    /// occur by coincidence; this only filters candidates whose first four
    /// bytes cannot be an ACPI signature. Off by default.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Offset the next search starts from
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Iterator for MagicScanner<'_> {
    type Item = Result<ExtractedRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some(found) = find(&self.buffer[self.cursor..], &START_MAGIC) else {
                self.done = true;
                return None;
            };

            let magic_at = self.cursor + found;
            let start = magic_at + START_MAGIC.len();

            // An unmatched start magic is fatal even when strict would skip it
            let Some(len) = find(&self.buffer[start..], &END_MAGIC) else {
                self.done = true;
                return Some(Err(ScanError::TruncatedArtifact { offset: magic_at }));
            };

            if self.strict && !plausible_signature(&self.buffer[start..]) {
                debug!(
                    offset = magic_at,
                    following = %hex::encode(&self.buffer[start..self.buffer.len().min(start + 4)]),
                    "skipping start magic without a plausible signature"
                );
                self.cursor = magic_at + 1;
                continue;
            }

            let end = start + len;
            self.cursor = end + END_MAGIC.len();
            debug!(start, end, "found bracketed record");
            return Some(Ok(ExtractedRecord::new(start, end)));
        }
    }
}

impl std::iter::FusedIterator for MagicScanner<'_> {}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// ACPI signatures are four upper-case letters, digits or underscores
fn plausible_signature(bytes: &[u8]) -> bool {
    bytes.len() >= 4
        && bytes[..4]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_')
}
