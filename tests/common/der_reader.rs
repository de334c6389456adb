//! Minimal DER TLV reader for asserting on encoded structures.

/// One decoded TLV.
#[derive(Debug, Clone, Copy)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Contents octets.
    pub value: &'a [u8],
    /// Full encoding including tag and length.
    pub raw: &'a [u8],
}

/// Decode the first TLV of `input`, returning it and the remaining bytes.
pub fn read_tlv(input: &[u8]) -> (Tlv<'_>, &[u8]) {
    assert!(input.len() >= 2, "truncated TLV");
    let tag = input[0];
    let first = input[1];
    let (len, header) = if first < 0x80 {
        (first as usize, 2)
    } else {
        let n = (first & 0x7F) as usize;
        assert!(n > 0 && n <= 4, "unsupported length form");
        let len = input[2..2 + n]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, 2 + n)
    };
    let end = header + len;
    assert!(input.len() >= end, "TLV length exceeds input");
    (
        Tlv {
            tag,
            value: &input[header..end],
            raw: &input[..end],
        },
        &input[end..],
    )
}

/// Decode a single TLV that must span all of `input`.
pub fn read_single(input: &[u8]) -> Tlv<'_> {
    let (tlv, rest) = read_tlv(input);
    assert!(rest.is_empty(), "trailing bytes after TLV");
    tlv
}

/// Decode the children of a constructed value.
pub fn children(value: &[u8]) -> Vec<Tlv<'_>> {
    let mut out = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let (tlv, next) = read_tlv(rest);
        out.push(tlv);
        rest = next;
    }
    out
}
