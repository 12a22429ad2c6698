//! Minimal BER reader for token signatures.
//!
//! Payment token signatures are CMS `SignedData` in BER with indefinite
//! lengths, which DER decoders refuse. Only single-byte tags are supported;
//! nothing in a CMS signature needs more.

use pay_core::{PaymentError, PaymentResult};

pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_UTC_TIME: u8 = 0x17;
pub(crate) const TAG_GENERALIZED_TIME: u8 = 0x18;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_SET: u8 = 0x31;
/// `[0]`, constructed
pub(crate) const TAG_CONTEXT_0: u8 = 0xa0;

const CONSTRUCTED: u8 = 0x20;
const INDEFINITE: u8 = 0x80;

fn malformed(message: &str) -> PaymentError {
    PaymentError::InvalidSignature(format!("malformed signature: {}", message))
}

/// One tag-length-value element
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tlv<'a> {
    pub tag: u8,
    /// Whole encoding, header included
    pub raw: &'a [u8],
    /// Content octets, without the end-of-contents marker
    pub content: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Fail unless the element carries `tag`
    pub fn tagged(self, tag: u8, what: &str) -> PaymentResult<Self> {
        if self.tag != tag {
            return Err(malformed(&format!(
                "expected {} (tag {:#04x}), found tag {:#04x}",
                what, tag, self.tag
            )));
        }
        Ok(self)
    }

    /// Elements nested in a constructed value
    pub fn children(&self) -> PaymentResult<Vec<Tlv<'a>>> {
        let mut items = Vec::new();
        let mut rest = self.content;
        while !rest.is_empty() {
            let (item, next) = read(rest)?;
            items.push(item);
            rest = next;
        }
        Ok(items)
    }
}

/// Read the element at the start of `input`, returning it and what follows
pub(crate) fn read(input: &[u8]) -> PaymentResult<(Tlv<'_>, &[u8])> {
    let (&tag, rest) = input.split_first().ok_or_else(|| malformed("truncated tag"))?;
    if tag & 0x1f == 0x1f {
        return Err(malformed("multi-byte tags are not supported"));
    }
    let (&first, mut rest) = rest.split_first().ok_or_else(|| malformed("truncated length"))?;

    if first == INDEFINITE {
        if tag & CONSTRUCTED == 0 {
            return Err(malformed("indefinite length on a primitive value"));
        }
        let mut cursor = rest;
        while !cursor.starts_with(&[0, 0]) {
            let (_, next) = read(cursor)?;
            cursor = next;
        }
        let content_len = rest.len() - cursor.len();
        // tag, length byte, content, end-of-contents
        let consumed = 2 + content_len + 2;
        return Ok((
            Tlv {
                tag,
                raw: &input[..consumed],
                content: &rest[..content_len],
            },
            &input[consumed..],
        ));
    }

    let len = if first & 0x80 == 0 {
        first as usize
    } else {
        let octets = (first & 0x7f) as usize;
        if octets == 0 || octets > 4 || rest.len() < octets {
            return Err(malformed("invalid length"));
        }
        let len = rest[..octets]
            .iter()
            .fold(0usize, |len, b| (len << 8) | *b as usize);
        rest = &rest[octets..];
        len
    };
    if rest.len() < len {
        return Err(malformed("truncated content"));
    }

    let consumed = input.len() - rest.len() + len;
    Ok((
        Tlv {
            tag,
            raw: &input[..consumed],
            content: &rest[..len],
        },
        &input[consumed..],
    ))
}

/// Read exactly one element spanning all of `input`
pub(crate) fn read_single(input: &[u8]) -> PaymentResult<Tlv<'_>> {
    let (tlv, rest) = read(input)?;
    if !rest.is_empty() {
        return Err(malformed("trailing data"));
    }
    Ok(tlv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definite_lengths() {
        // SEQUENCE { OID 1.2.3, OCTET STRING 0x0102 } followed by a stray byte
        let bytes = [0x30, 0x08, 0x06, 0x02, 0x2a, 0x03, 0x04, 0x02, 0x01, 0x02, 0xff];

        let (seq, rest) = read(&bytes).unwrap();
        assert_eq!(seq.tag, TAG_SEQUENCE);
        assert_eq!(seq.raw.len(), 10);
        assert_eq!(rest, &[0xff]);

        let children = seq.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].content, &[0x2a, 0x03]);
        assert_eq!(children[1].tagged(TAG_OCTET_STRING, "digest").unwrap().content, &[1, 2]);
    }

    #[test]
    fn test_indefinite_length() {
        // [0] { SEQUENCE (indefinite) { INTEGER 1 } }
        let bytes = [0xa0, 0x80, 0x30, 0x80, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00];

        let outer = read_single(&bytes).unwrap();
        assert_eq!(outer.tag, TAG_CONTEXT_0);
        let inner = outer.children().unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].content, &[0x02, 0x01, 0x01]);
        assert_eq!(inner[0].raw.len(), 7);
    }

    #[test]
    fn test_long_form_length() {
        let mut bytes = vec![0x04, 0x81, 0x80];
        bytes.extend(std::iter::repeat(0xab).take(0x80));

        let octets = read_single(&bytes).unwrap();
        assert_eq!(octets.content.len(), 0x80);
    }

    #[test]
    fn test_malformed_input() {
        assert!(read(&[]).is_err());
        assert!(read(&[0x30, 0x05, 0x01]).is_err());
        assert!(read(&[0x04, 0x80, 0x00, 0x00]).is_err());
        assert!(read(&[0x30, 0x80, 0x02, 0x01]).is_err());
        assert!(read_single(&[0x05, 0x00, 0x00]).is_err());
        assert!(read(&[0x1f, 0x01, 0x00]).is_err());
    }
}
