//! Writes small, well-formed SEG-Y files for tests, benchmarks and demos.
//!
//! Header regions are filled with non-zero patterns so byte-preservation
//! checks have something to notice.

use super::{
    ByteOrder, SampleFormat, BINARY_HEADER_LEN, BIN_EXTENDED_HEADERS, BIN_FIXED_LENGTH_FLAG,
    BIN_FORMAT_CODE, BIN_SAMPLES_PER_TRACE, TEXTUAL_HEADER_LEN, TRACE_HEADER_LEN,
    TRACE_SAMPLE_COUNT,
};
use crate::ScaleError;
use std::fs;
use std::path::Path;

const BIN_SAMPLE_INTERVAL: usize = 16;
const BIN_REVISION: usize = 300;
const TRACE_SEQUENCE: usize = 0;
const TRACE_SOURCE_X: usize = 72;
const TRACE_SOURCE_Y: usize = 76;
const EBCDIC_SPACE: u8 = 0x40;

#[derive(Debug, Clone)]
pub struct SegyBuilder {
    format: SampleFormat,
    byte_order: ByteOrder,
    extended_headers: usize,
    samples_per_trace: Option<usize>,
    fixed_length: bool,
    traces: Vec<Vec<f32>>,
}

impl SegyBuilder {
    pub fn new(format: SampleFormat) -> Self {
        SegyBuilder {
            format,
            byte_order: ByteOrder::Big,
            extended_headers: 0,
            samples_per_trace: None,
            fixed_length: false,
            traces: Vec::new(),
        }
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn extended_headers(mut self, count: usize) -> Self {
        self.extended_headers = count;
        self
    }

    /// Override the binary-header sample count (defaults to the first trace's length).
    pub fn samples_per_trace(mut self, count: usize) -> Self {
        self.samples_per_trace = Some(count);
        self
    }

    /// Mark every trace as using the binary-header sample count.
    pub fn fixed_length(mut self, fixed: bool) -> Self {
        self.fixed_length = fixed;
        self
    }

    pub fn trace(mut self, samples: Vec<f32>) -> Self {
        self.traces.push(samples);
        self
    }

    pub fn traces<I: IntoIterator<Item = Vec<f32>>>(mut self, traces: I) -> Self {
        self.traces.extend(traces);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let order = self.byte_order;
        let mut out = Vec::new();

        let mut textual = vec![EBCDIC_SPACE; TEXTUAL_HEADER_LEN as usize];
        // "C 1" in EBCDIC, the conventional first card.
        textual[..3].copy_from_slice(&[0xC3, EBCDIC_SPACE, 0xF1]);
        out.extend_from_slice(&textual);

        let spt = self
            .samples_per_trace
            .unwrap_or_else(|| self.traces.first().map_or(0, Vec::len));
        let mut binary = vec![0u8; BINARY_HEADER_LEN as usize];
        put_u16(&mut binary, BIN_SAMPLE_INTERVAL, 4000, order);
        put_u16(&mut binary, BIN_SAMPLES_PER_TRACE, spt as u16, order);
        put_u16(&mut binary, BIN_FORMAT_CODE, self.format.code(), order);
        put_u16(&mut binary, BIN_REVISION, 0x0100, order);
        put_u16(&mut binary, BIN_FIXED_LENGTH_FLAG, self.fixed_length as u16, order);
        put_u16(&mut binary, BIN_EXTENDED_HEADERS, self.extended_headers as u16, order);
        out.extend_from_slice(&binary);

        for stanza in 0..self.extended_headers {
            out.extend(std::iter::repeat_n(0xE0 + stanza as u8, TEXTUAL_HEADER_LEN as usize));
        }

        for (i, samples) in self.traces.iter().enumerate() {
            let mut header = vec![0u8; TRACE_HEADER_LEN as usize];
            put_u32(&mut header, TRACE_SEQUENCE, i as u32 + 1, order);
            put_u32(&mut header, TRACE_SOURCE_X, 500_000 + i as u32 * 25, order);
            put_u32(&mut header, TRACE_SOURCE_Y, 7_100_000 + i as u32 * 25, order);
            put_u16(&mut header, TRACE_SAMPLE_COUNT, samples.len() as u16, order);
            out.extend_from_slice(&header);
            for &s in samples {
                out.extend_from_slice(&self.format.encode(s, order));
            }
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ScaleError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

fn put_u16(buf: &mut [u8], at: usize, value: u16, order: ByteOrder) {
    let raw = match order {
        ByteOrder::Big => value.to_be_bytes(),
        ByteOrder::Little => value.to_le_bytes(),
    };
    buf[at..at + 2].copy_from_slice(&raw);
}

fn put_u32(buf: &mut [u8], at: usize, value: u32, order: ByteOrder) {
    buf[at..at + 4].copy_from_slice(&order.u32_to(value));
}
