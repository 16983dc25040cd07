//! C array rendering of binary files
//!
//! Turns a byte range into `0xFF, 0x00, ...` lines ready to paste into C
//! sources, optionally wrapped in a `const TYPE NAME[] = { ... };`
//! definition.

use std::num::NonZeroUsize;
use tracing::warn;

/// Bytes per line when not given
pub const DEFAULT_PER_LINE: NonZeroUsize = match NonZeroUsize::new(12) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexdumpOptions {
    /// Variable name; bare byte list when absent
    pub name: Option<String>,
    /// C element type
    pub ctype: String,
    /// Bytes per output line
    pub per_line: NonZeroUsize,
    /// Also emit `size_t NAME_len`
    pub var_length: bool,
}

impl Default for HexdumpOptions {
    fn default() -> Self {
        Self {
            name: None,
            ctype: "uint8_t".to_string(),
            per_line: DEFAULT_PER_LINE,
            var_length: false,
        }
    }
}

/// Indented, comma-separated `0xNN` lines with no trailing comma
pub fn format_bytes(data: &[u8], per_line: NonZeroUsize) -> String {
    data.chunks(per_line.get())
        .map(|line| {
            let parts: Vec<String> = line.iter().map(|b| format!("0x{b:02X}")).collect();
            format!("  {}", parts.join(", "))
        })
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Full output text, without a trailing newline
pub fn render(data: &[u8], options: &HexdumpOptions) -> String {
    let ctype = &options.ctype;

    if data.is_empty() {
        return match &options.name {
            Some(name) if options.var_length => {
                format!("const {ctype} {name}[] = {{}};\nsize_t {name}_len = 0;")
            }
            Some(name) => format!("const {ctype} {name}[] = {{}};"),
            None => String::new(),
        };
    }

    let body = format_bytes(data, options.per_line);
    match &options.name {
        Some(name) => {
            let mut out = format!("const {ctype} {name}[] = {{\n{body},\n}};");
            if options.var_length {
                out.push_str(&format!("\nsize_t {name}_len = sizeof({name});"));
            }
            out
        }
        None => format!("{body},"),
    }
}

/// Bytes `[offset, offset + size)` of `data`, clamped to its end
///
/// An offset past the end yields nothing and logs a warning.
pub fn slice(data: &[u8], offset: usize, size: Option<usize>) -> &[u8] {
    if offset > data.len() {
        warn!(
            offset,
            size = data.len(),
            "offset beyond end of file, no data to read"
        );
        return &[];
    }
    let available = data.len() - offset;
    let len = size.map_or(available, |size| size.min(available));
    &data[offset..offset + len]
}

/// Parse an integer with an optional `0x`, `0o` or `0b` prefix
pub fn parse_int(s: &str) -> Result<usize, String> {
    let trimmed = s.trim();
    let (digits, radix) = match trimmed.get(..2) {
        Some("0x" | "0X") => (&trimmed[2..], 16),
        Some("0o" | "0O") => (&trimmed[2..], 8),
        Some("0b" | "0B") => (&trimmed[2..], 2),
        _ => (trimmed, 10),
    };
    usize::from_str_radix(&digits.replace('_', ""), radix)
        .map_err(|_| format!("Invalid integer: {s}"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn per_line(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("Test operation should succeed")
    }

    #[test]
    fn test_format_bytes_wraps_lines() {
        let data: Vec<u8> = (0..5).collect();
        assert_eq!(
            format_bytes(&data, per_line(2)),
            "  0x00, 0x01,\n  0x02, 0x03,\n  0x04"
        );
        assert_eq!(format_bytes(&[0xAB], per_line(12)), "  0xAB");
    }

    #[test]
    fn test_render_bare() {
        let options = HexdumpOptions::default();
        assert_eq!(render(&[0xFF, 0x00], &options), "  0xFF, 0x00,");
        assert_eq!(render(&[], &options), "");
    }

    #[test]
    fn test_render_named() {
        let options = HexdumpOptions {
            name: Some("gtdt".to_string()),
            per_line: per_line(2),
            var_length: true,
            ..HexdumpOptions::default()
        };
        assert_eq!(
            render(&[1, 2, 3], &options),
            "const uint8_t gtdt[] = {\n  0x01, 0x02,\n  0x03,\n};\nsize_t gtdt_len = sizeof(gtdt);"
        );
    }

    #[test]
    fn test_render_named_empty() {
        let mut options = HexdumpOptions {
            name: Some("blob".to_string()),
            ctype: "unsigned char".to_string(),
            ..HexdumpOptions::default()
        };
        assert_eq!(render(&[], &options), "const unsigned char blob[] = {};");
        options.var_length = true;
        assert_eq!(
            render(&[], &options),
            "const unsigned char blob[] = {};\nsize_t blob_len = 0;"
        );
    }

    #[test]
    fn test_slice() {
        let data = [0u8, 1, 2, 3, 4];
        assert_eq!(slice(&data, 1, Some(2)), &[1, 2]);
        assert_eq!(slice(&data, 3, Some(100)), &[3, 4]);
        assert_eq!(slice(&data, 2, None), &[2, 3, 4]);
        assert_eq!(slice(&data, 5, None), &[] as &[u8]);
        assert_eq!(slice(&data, 6, Some(1)), &[] as &[u8]);
    }

    proptest! {
        #[test]
        fn prop_lines_hold_per_line_bytes(
            data in proptest::collection::vec(any::<u8>(), 1..200),
            n in 1usize..20,
        ) {
            let body = format_bytes(&data, per_line(n));
            let lines: Vec<&str> = body.split(",\n").collect();
            prop_assert_eq!(lines.len(), data.len().div_ceil(n));
            for line in &lines {
                prop_assert!(line.starts_with("  0x"));
                prop_assert!(line.split(", ").count() <= n);
            }
        }
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("0x1000"), Ok(0x1000));
        assert_eq!(parse_int("0X1f"), Ok(0x1F));
        assert_eq!(parse_int("256"), Ok(256));
        assert_eq!(parse_int("0o17"), Ok(15));
        assert_eq!(parse_int("0b101"), Ok(5));
        assert_eq!(parse_int("0"), Ok(0));
        assert!(parse_int("0xZZ").is_err());
        assert!(parse_int("-1").is_err());
    }
}
