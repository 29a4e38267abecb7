//! Byte-oriented run-length codec used for D2 RLE payloads.
//!
//! Each packet starts with a control byte:
//! - high bit set: run packet, `(control & 0x7F) + 1` copies of the next byte (2-128)
//! - high bit clear: literal packet, the next `control + 1` bytes verbatim (1-128)

use crate::error::{ConvertError, Result};

/// Longest run or literal a single packet can describe
pub const MAX_PACKET_LEN: usize = 128;

const RUN_FLAG: u8 = 0x80;

/// One decoded packet, borrowing literal bytes from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    Run { value: u8, len: usize },
    Literal(&'a [u8]),
}

impl Packet<'_> {
    /// Number of output bytes this packet expands to
    pub fn len(&self) -> usize {
        match self {
            Packet::Run { len, .. } => *len,
            Packet::Literal(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Length of the run of identical bytes at the start of `data`, capped at 128
#[inline]
fn run_length(data: &[u8]) -> usize {
    match data.first() {
        Some(&first) => data
            .iter()
            .take(MAX_PACKET_LEN)
            .take_while(|&&b| b == first)
            .count(),
        None => 0,
    }
}

#[inline]
fn flush_literal(output: &mut Vec<u8>, literal: &[u8]) {
    if literal.is_empty() {
        return;
    }
    debug_assert!(literal.len() <= MAX_PACKET_LEN);
    output.push((literal.len() - 1) as u8);
    output.extend_from_slice(literal);
}

/// Compress `data` with a greedy run/literal scan.
///
/// Runs of two or more identical bytes become run packets; everything else
/// is gathered into literal packets. Empty input gives empty output.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / MAX_PACKET_LEN + 1);
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < data.len() {
        let run = run_length(&data[pos..]);

        if run >= 2 {
            flush_literal(&mut output, &data[literal_start..pos]);
            output.push(RUN_FLAG | (run - 1) as u8);
            output.push(data[pos]);
            pos += run;
            literal_start = pos;
        } else {
            pos += 1;
            if pos - literal_start == MAX_PACKET_LEN {
                flush_literal(&mut output, &data[literal_start..pos]);
                literal_start = pos;
            }
        }
    }

    flush_literal(&mut output, &data[literal_start..pos]);
    output
}

/// Iterator over the packets of an encoded stream
pub struct Packets<'a> {
    data: &'a [u8],
    pos: usize,
}

/// Walk the packets of `encoded` without expanding them
pub fn packets(encoded: &[u8]) -> Packets<'_> {
    Packets { data: encoded, pos: 0 }
}

impl<'a> Iterator for Packets<'a> {
    type Item = Result<Packet<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pos;
        let control = *self.data.get(offset)?;
        let body = &self.data[offset + 1..];

        let (packet, consumed) = if control & RUN_FLAG != 0 {
            let len = (control & !RUN_FLAG) as usize + 1;
            (body.first().map(|&value| Packet::Run { value, len }), 2)
        } else {
            let len = control as usize + 1;
            (body.get(..len).map(Packet::Literal), 1 + len)
        };

        match packet {
            Some(packet) => {
                self.pos = offset + consumed;
                Some(Ok(packet))
            }
            None => {
                // Stop after reporting the broken packet
                self.pos = self.data.len();
                Some(Err(ConvertError::MalformedRleStream { offset }))
            }
        }
    }
}

/// Expand an RLE stream back to raw bytes.
///
/// Fails with `MalformedRleStream` when a packet is cut short.
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(encoded.len() * 2);

    for packet in packets(encoded) {
        match packet? {
            Packet::Run { value, len } => output.resize(output.len() + len, value),
            Packet::Literal(bytes) => output.extend_from_slice(bytes),
        }
    }

    Ok(output)
}
