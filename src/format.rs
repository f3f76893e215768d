//! Content sniffing and parser dispatch.
use crate::errors::Error;
use crate::model::{EvidenceRecord, EvidenceRecordType, IncorporationType};
use crate::traits::EvidenceRecordParser;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// DER tag of a constructed SEQUENCE.
const DER_SEQUENCE: u8 = 0x30;

/// Guess the serialization family of `bytes`.
///
/// XML is recognised by its first significant character `<` (which also covers the
/// `<?xml` preamble), after an optional byte order mark and whitespace. DER is recognised by
/// a leading SEQUENCE tag followed by a definite length, short form or long form on one to
/// four bytes, that fits in `bytes`.
pub fn sniff(bytes: &[u8]) -> Option<EvidenceRecordType> {
    if let [DER_SEQUENCE, rest @ ..] = bytes {
        return der_content_length(rest)
            .filter(|&(header, length)| length <= rest.len() - header)
            .map(|_| EvidenceRecordType::Asn1);
    }
    let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => Some(EvidenceRecordType::Xml),
        _ => None,
    }
}

/// Size of the DER length header at the start of `bytes`, and the content length it declares.
fn der_content_length(bytes: &[u8]) -> Option<(usize, usize)> {
    match bytes.first().copied()? {
        short @ 0x00..=0x7F => Some((1, usize::from(short))),
        long @ 0x81..=0x84 => {
            let size = usize::from(long & 0x7F);
            let length = bytes
                .get(1..=size)?
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
            Some((1 + size, length))
        }
        _ => None,
    }
}

/// Parse `bytes` with the first parser of the sniffed family that supports them.
///
/// # Errors
/// `Error::UnsupportedFormat` if the family cannot be recognised or no parser supports the
/// bytes; otherwise whatever the selected parser returns.
pub fn parse_with(
    parsers: &[&dyn EvidenceRecordParser],
    bytes: &[u8],
    incorporation: IncorporationType,
) -> Result<EvidenceRecord, Error> {
    let record_type = sniff(bytes).ok_or_else(|| {
        Error::UnsupportedFormat("neither a DER sequence nor an XML document".to_owned())
    })?;
    let parser = parsers
        .iter()
        .find(|p| p.record_type() == record_type && p.is_supported(bytes))
        .ok_or_else(|| {
            Error::UnsupportedFormat(format!("no parser supports this {:?} record", record_type))
        })?;
    debug!(?record_type, ?incorporation, len = bytes.len(), "parsing evidence record");
    parser.parse(bytes, incorporation)
}
