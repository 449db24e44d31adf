//! Property-based tests for the tree decoder.
//!
//! Encodes synthetic trees into the binary record format and checks that
//! decoding reproduces the original entries, for arbitrary entry mixes.

use proptest::prelude::*;

use gander::objects::tree::{decode, TreeEntry};

/// Modes as they appear on the wire (directory mode is five digits).
fn mode_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("100644"),
        Just("100755"),
        Just("120000"),
        Just("160000"),
        Just("040000"),
    ]
}

fn entry_strategy() -> impl Strategy<Value = (String, [u8; 20], String)> {
    (
        mode_strategy().prop_map(|mode| mode.to_string()),
        any::<[u8; 20]>(),
        "[a-zA-Z0-9._-]{1,24}",
    )
}

/// Encode entries the way git stores them: `<mode><SP><name><NUL><raw id>`,
/// with the directory mode shortened to `40000`.
fn encode(entries: &[(String, [u8; 20], String)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (mode, raw_id, name) in entries {
        let wire_mode = if mode == "040000" { "40000" } else { mode };
        bytes.extend_from_slice(wire_mode.as_bytes());
        bytes.push(b' ');
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0x00);
        bytes.extend_from_slice(raw_id);
    }
    bytes
}

proptest! {
    #[test]
    fn decode_inverts_encode(entries in prop::collection::vec(entry_strategy(), 0..32)) {
        let bytes = encode(&entries);
        let decoded = decode(&bytes).unwrap();

        let expected: Vec<TreeEntry> = entries
            .iter()
            .map(|(mode, raw_id, name)| TreeEntry {
                mode: mode.clone(),
                id: hex::encode(raw_id),
                name: name.clone(),
            })
            .collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn truncated_payloads_never_decode_silently(
        entries in prop::collection::vec(entry_strategy(), 1..8),
        cut in 1usize..20,
    ) {
        let bytes = encode(&entries);
        let cut = cut.min(bytes.len() - 1).max(1);
        let truncated = &bytes[..bytes.len() - cut];

        // Dropping bytes from the end either removes whole trailing entries
        // or leaves a malformed record; it must never invent entries.
        match decode(truncated) {
            Ok(decoded) => prop_assert!(decoded.len() < entries.len()),
            Err(_) => {}
        }
    }
}
