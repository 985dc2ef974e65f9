//! Magic-byte signatures of the supported binary tab formats.

/// A known prefix at a fixed offset.
struct Signature {
    offset: usize,
    magic: &'static [u8],
    extension: &'static str,
}

// Guitar Pro 3-5 and TuxGuitar headers are Pascal strings: one length byte,
// then the text. Ordered longest magic first so specific entries win.
const SIGNATURES: &[Signature] = &[
    Signature { offset: 1, magic: b"FICHIER GUITAR PRO v5", extension: ".gp5" },
    Signature { offset: 1, magic: b"FICHIER GUITAR PRO v4", extension: ".gp4" },
    Signature { offset: 1, magic: b"FICHIER GUITAR PRO v3", extension: ".gp3" },
    Signature { offset: 1, magic: b"TuxGuitar", extension: ".tg" },
    Signature { offset: 0, magic: b"PK\x03\x04", extension: ".gp" },
    Signature { offset: 0, magic: b"BCFZ", extension: ".gpx" },
    Signature { offset: 0, magic: b"BCFS", extension: ".gpx" },
    Signature { offset: 0, magic: b"ptab", extension: ".ptb" },
];

/// Extension implied by the payload's leading bytes, if any signature matches.
pub fn sniff(body: &[u8]) -> Option<&'static str> {
    SIGNATURES
        .iter()
        .find(|sig| {
            body.get(sig.offset..sig.offset + sig.magic.len())
                .is_some_and(|window| window == sig.magic)
        })
        .map(|sig| sig.extension)
}
