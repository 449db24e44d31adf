//! objects::tree
//!
//! Decoder for Git's tree object binary format.
//!
//! A tree object is a sequence of variable-length records with no count or
//! length prefix; the decoder consumes bytes until none remain. Each record
//! is `<mode><SP><name><NUL><20 raw id bytes>`. Directory modes are encoded
//! as the five digits `40000`, one digit shorter than file modes, so a fixed
//! 6-byte read captures either `"40000 "` (separator included) or the six
//! digits of a file mode (separator still pending).

use crate::errors::Error;

/// One decoded tree record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Normalized 6-character mode string, e.g. `040000` or `100644`.
    pub mode: String,
    /// Entry object id, 40 lowercase hex chars.
    pub id: String,
    /// Entry name.
    pub name: String,
}

impl TreeEntry {
    /// Whether this entry names a subtree.
    pub fn is_tree(&self) -> bool {
        self.mode == "040000"
    }
}

/// Raw byte length of an entry's object id.
const RAW_ID_LEN: usize = 20;

/// Decode a raw tree payload into its ordered entries.
///
/// An empty payload decodes to an empty list. Any short read is an error;
/// records are never silently truncated.
pub fn decode(bytes: &[u8]) -> Result<Vec<TreeEntry>, Error> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let mode_bytes = take(bytes, &mut pos, 6)?;
        let mode = if mode_bytes == b"40000 " {
            // The 6th byte was the separator; nothing further to skip.
            "040000".to_string()
        } else {
            let mode = std::str::from_utf8(mode_bytes)
                .map_err(|_| format_error(pos, "mode is not valid text"))?
                .to_string();
            // Skip the separator following a 6-digit mode.
            take(bytes, &mut pos, 1)?;
            mode
        };

        let name_end = bytes[pos..]
            .iter()
            .position(|&b| b == 0x00)
            .ok_or_else(|| format_error(pos, "unterminated entry name"))?;
        let name = String::from_utf8_lossy(&bytes[pos..pos + name_end]).into_owned();
        pos += name_end + 1;

        let raw_id = take(bytes, &mut pos, RAW_ID_LEN)?;
        entries.push(TreeEntry {
            mode,
            id: hex::encode(raw_id),
            name,
        });
    }

    Ok(entries)
}

/// Consume exactly `len` bytes, or fail with a short-read error.
fn take<'a>(bytes: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], Error> {
    if *pos + len > bytes.len() {
        return Err(format_error(
            *pos,
            &format!("needed {} more bytes, {} available", len, bytes.len() - *pos),
        ));
    }
    let slice = &bytes[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}

fn format_error(pos: usize, message: &str) -> Error {
    Error::IoFailure {
        context: "decoding tree object".to_string(),
        message: format!("malformed record at byte {}: {}", pos, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode entries into the on-disk record format.
    fn encode(entries: &[(&str, &str, &str)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (mode, id, name) in entries {
            let wire_mode = if *mode == "040000" { "40000" } else { mode };
            bytes.extend_from_slice(wire_mode.as_bytes());
            bytes.push(b' ');
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0x00);
            bytes.extend_from_slice(&hex::decode(id).unwrap());
        }
        bytes
    }

    #[test]
    fn empty_tree_decodes_to_empty_list() {
        assert_eq!(decode(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn round_trips_blob_and_subtree() {
        let a = "a".repeat(40);
        let b = "b".repeat(40);
        let bytes = encode(&[("100644", &a, "file.txt"), ("040000", &b, "subdir")]);

        let entries = decode(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mode, "100644");
        assert_eq!(entries[0].id, a);
        assert_eq!(entries[0].name, "file.txt");
        assert!(!entries[0].is_tree());
        assert_eq!(entries[1].mode, "040000");
        assert_eq!(entries[1].id, b);
        assert_eq!(entries[1].name, "subdir");
        assert!(entries[1].is_tree());
    }

    #[test]
    fn directory_mode_is_normalized() {
        let bytes = encode(&[("040000", &"c".repeat(40), "dir")]);
        let entries = decode(&bytes).unwrap();
        assert_eq!(entries[0].mode, "040000");
    }

    #[test]
    fn executable_and_symlink_modes_pass_through() {
        let bytes = encode(&[
            ("100755", &"d".repeat(40), "run.sh"),
            ("120000", &"e".repeat(40), "link"),
        ]);
        let entries = decode(&bytes).unwrap();
        assert_eq!(entries[0].mode, "100755");
        assert_eq!(entries[1].mode, "120000");
    }

    #[test]
    fn preserves_entry_order() {
        let ids: Vec<String> = (0..5).map(|i| format!("{:040x}", i)).collect();
        let entries: Vec<(&str, &str, &str)> = vec![
            ("100644", &ids[0], "a"),
            ("040000", &ids[1], "b"),
            ("100644", &ids[2], "c"),
            ("100644", &ids[3], "d"),
            ("040000", &ids[4], "e"),
        ];
        let decoded = decode(&encode(&entries)).unwrap();
        let names: Vec<&str> = decoded.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn truncated_mode_is_an_error() {
        let err = decode(b"1006").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::IoFailure);
    }

    #[test]
    fn unterminated_name_is_an_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"100644 file.txt");
        // No NUL, no id.
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::IoFailure);
    }

    #[test]
    fn truncated_id_is_an_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"100644 file.txt\x00");
        bytes.extend_from_slice(&[0xab; 10]);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::IoFailure);
    }

    #[test]
    fn id_renders_as_lowercase_hex() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"100644 x\x00");
        bytes.extend_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE]);
        bytes.extend_from_slice(&[0u8; 16]);
        let entries = decode(&bytes).unwrap();
        assert!(entries[0].id.starts_with("cafebabe"));
        assert_eq!(entries[0].id.len(), 40);
    }
}
