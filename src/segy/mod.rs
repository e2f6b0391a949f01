//! Random-access SEG-Y codec.
//!
//! Only the fields needed to locate trace sample payloads are decoded.
//! Every other byte of the container (textual headers, binary header,
//! trace headers) is never written, so rewriting samples in place keeps
//! them bit-identical.

pub mod builder;
pub mod ibm;

use crate::ScaleError;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const TEXTUAL_HEADER_LEN: u64 = 3200;
pub const BINARY_HEADER_LEN: u64 = 400;
pub const TRACE_HEADER_LEN: u64 = 240;
pub const SAMPLE_LEN: u64 = 4;

// Offsets within the binary header.
const BIN_SAMPLES_PER_TRACE: usize = 20;
const BIN_FORMAT_CODE: usize = 24;
const BIN_REVISION: usize = 300;
const BIN_FIXED_LENGTH_FLAG: usize = 302;
const BIN_EXTENDED_HEADERS: usize = 304;

// Offset within each trace header.
const TRACE_SAMPLE_COUNT: usize = 114;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    fn u16_at(self, bytes: &[u8], at: usize) -> u16 {
        let raw = [bytes[at], bytes[at + 1]];
        match self {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        }
    }

    fn u32_from(self, raw: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        }
    }

    fn u32_to(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }
}

/// Sample encodings this codec can rewrite in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    IbmFloat,
    IeeeFloat,
}

impl SampleFormat {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(SampleFormat::IbmFloat),
            5 => Some(SampleFormat::IeeeFloat),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            SampleFormat::IbmFloat => 1,
            SampleFormat::IeeeFloat => 5,
        }
    }

    pub fn decode(self, raw: [u8; 4], order: ByteOrder) -> f32 {
        let bits = order.u32_from(raw);
        match self {
            SampleFormat::IbmFloat => ibm::ibm_to_f32(bits),
            SampleFormat::IeeeFloat => f32::from_bits(bits),
        }
    }

    pub fn encode(self, value: f32, order: ByteOrder) -> [u8; 4] {
        let bits = match self {
            SampleFormat::IbmFloat => ibm::f32_to_ibm(value),
            SampleFormat::IeeeFloat => value.to_bits(),
        };
        order.u32_to(bits)
    }
}

/// Where one trace lives inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSlot {
    pub header_offset: u64,
    pub data_offset: u64,
    pub samples: usize,
}

impl TraceSlot {
    pub fn payload_len(&self) -> u64 {
        self.samples as u64 * SAMPLE_LEN
    }
}

#[derive(Debug, Clone)]
pub struct SegyLayout {
    pub format: SampleFormat,
    pub byte_order: ByteOrder,
    pub samples_per_trace: usize,
    pub extended_headers: usize,
    pub file_len: u64,
    pub traces: Vec<TraceSlot>,
}

impl SegyLayout {
    /// Index every trace in a `file_len`-byte SEG-Y stream.
    pub fn scan<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<Self, ScaleError> {
        let headers_len = TEXTUAL_HEADER_LEN + BINARY_HEADER_LEN;
        if file_len < headers_len {
            return Err(ScaleError::Format(format!(
                "file is {} bytes, shorter than the {} byte SEG-Y headers",
                file_len, headers_len
            )));
        }

        let mut binary = [0u8; BINARY_HEADER_LEN as usize];
        reader.seek(SeekFrom::Start(TEXTUAL_HEADER_LEN))?;
        reader.read_exact(&mut binary)?;

        let (format, byte_order) = detect_format(&binary)?;
        let samples_per_trace = byte_order.u16_at(&binary, BIN_SAMPLES_PER_TRACE) as usize;
        // Bytes 302..306 are unassigned before rev1 and often hold junk.
        let revised = byte_order.u16_at(&binary, BIN_REVISION) >> 8 != 0;
        let fixed_length = revised && byte_order.u16_at(&binary, BIN_FIXED_LENGTH_FLAG) == 1;
        let extended = if revised {
            byte_order.u16_at(&binary, BIN_EXTENDED_HEADERS) as i16
        } else {
            0
        };
        if extended < 0 {
            return Err(ScaleError::Format(
                "variable count of extended textual headers is not supported".to_string(),
            ));
        }
        let extended_headers = extended as usize;

        let mut offset = headers_len + extended_headers as u64 * TEXTUAL_HEADER_LEN;
        if offset > file_len {
            return Err(ScaleError::Format(format!(
                "{} extended textual headers run past end of file",
                extended_headers
            )));
        }

        let mut traces = Vec::new();
        let mut header = [0u8; TRACE_HEADER_LEN as usize];
        while offset < file_len {
            if file_len - offset < TRACE_HEADER_LEN {
                return Err(ScaleError::Format(format!(
                    "truncated trace header for trace {} at byte {}",
                    traces.len(),
                    offset
                )));
            }
            reader.seek(SeekFrom::Start(offset))?;
            reader.read_exact(&mut header)?;

            let declared = byte_order.u16_at(&header, TRACE_SAMPLE_COUNT) as usize;
            let samples = if fixed_length || declared == 0 {
                samples_per_trace
            } else {
                declared
            };
            let slot = TraceSlot {
                header_offset: offset,
                data_offset: offset + TRACE_HEADER_LEN,
                samples,
            };
            let end = slot.data_offset + slot.payload_len();
            if end > file_len {
                return Err(ScaleError::Format(format!(
                    "trace {} needs {} sample bytes but file ends at byte {}",
                    traces.len(),
                    slot.payload_len(),
                    file_len
                )));
            }
            traces.push(slot);
            offset = end;
        }

        Ok(SegyLayout {
            format,
            byte_order,
            samples_per_trace,
            extended_headers,
            file_len,
            traces,
        })
    }
}

fn detect_format(binary: &[u8]) -> Result<(SampleFormat, ByteOrder), ScaleError> {
    let big = ByteOrder::Big.u16_at(binary, BIN_FORMAT_CODE);
    let little = ByteOrder::Little.u16_at(binary, BIN_FORMAT_CODE);
    match (SampleFormat::from_code(big), SampleFormat::from_code(little)) {
        (Some(format), _) => Ok((format, ByteOrder::Big)),
        (None, Some(format)) => Ok((format, ByteOrder::Little)),
        (None, None) if (1..=16).contains(&big) => Err(ScaleError::Format(format!(
            "unsupported sample format code {}",
            big
        ))),
        (None, None) => Err(ScaleError::Format(format!(
            "unrecognized sample format code {:#06x}",
            big
        ))),
    }
}

/// Trace-addressed access to a seismic container.
pub trait TraceStore {
    fn trace_count(&self) -> usize;
    fn read_trace(&mut self, index: usize) -> Result<Vec<f32>, ScaleError>;
    fn write_trace(&mut self, index: usize, samples: &[f32]) -> Result<(), ScaleError>;
}

/// An open SEG-Y file. The OS handle is released when this is dropped;
/// call [`SegyFile::close`] on writable handles to surface flush errors.
pub struct SegyFile {
    path: PathBuf,
    file: File,
    layout: SegyLayout,
    writable: bool,
}

impl SegyFile {
    pub fn open_read(path: &Path) -> Result<Self, ScaleError> {
        Self::open_with(path, false)
    }

    pub fn open_read_write(path: &Path) -> Result<Self, ScaleError> {
        Self::open_with(path, true)
    }

    fn open_with(path: &Path, writable: bool) -> Result<Self, ScaleError> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ScaleError::NotFound(path.to_path_buf()),
                _ => ScaleError::Io(e),
            })?;
        let file_len = file.metadata()?.len();

        let layout = SegyLayout::scan(&mut &file, file_len)?;

        Ok(SegyFile {
            path: path.to_path_buf(),
            file,
            layout,
            writable,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &SegyLayout {
        &self.layout
    }

    fn slot(&self, index: usize) -> Result<TraceSlot, ScaleError> {
        self.layout
            .traces
            .get(index)
            .copied()
            .ok_or(ScaleError::Index {
                index,
                count: self.layout.traces.len(),
            })
    }

    /// Flush pending writes to disk and release the handle.
    pub fn close(self) -> Result<(), ScaleError> {
        if self.writable {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl TraceStore for SegyFile {
    fn trace_count(&self) -> usize {
        self.layout.traces.len()
    }

    fn read_trace(&mut self, index: usize) -> Result<Vec<f32>, ScaleError> {
        let slot = self.slot(index)?;
        let mut payload = vec![0u8; slot.payload_len() as usize];
        self.file.seek(SeekFrom::Start(slot.data_offset))?;
        self.file.read_exact(&mut payload)?;

        let (format, order) = (self.layout.format, self.layout.byte_order);
        Ok(payload
            .chunks_exact(SAMPLE_LEN as usize)
            .map(|c| format.decode([c[0], c[1], c[2], c[3]], order))
            .collect())
    }

    fn write_trace(&mut self, index: usize, samples: &[f32]) -> Result<(), ScaleError> {
        if !self.writable {
            return Err(ScaleError::Other(format!(
                "{} was opened read-only",
                self.path.display()
            )));
        }
        let slot = self.slot(index)?;
        if samples.len() != slot.samples {
            return Err(ScaleError::ShapeMismatch {
                index,
                expected: slot.samples,
                actual: samples.len(),
            });
        }

        let (format, order) = (self.layout.format, self.layout.byte_order);
        let payload: Vec<u8> = samples
            .iter()
            .flat_map(|&s| format.encode(s, order))
            .collect();
        self.file.seek(SeekFrom::Start(slot.data_offset))?;
        self.file.write_all(&payload)?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::builder::SegyBuilder;
    use super::*;

    fn write_fixture(dir: &Path, name: &str, builder: &SegyBuilder) -> PathBuf {
        let path = dir.join(name);
        builder.write_to(&path).unwrap();
        path
    }

    #[test]
    fn test_open_read_indexes_every_trace() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SegyBuilder::new(SampleFormat::IeeeFloat)
            .trace(vec![1.0, -2.0, 3.0])
            .trace(vec![0.5, 0.25, -0.125]);
        let path = write_fixture(dir.path(), "a.sgy", &builder);

        let mut file = SegyFile::open_read(&path).unwrap();
        assert_eq!(file.trace_count(), 2);
        assert_eq!(file.layout().byte_order, ByteOrder::Big);
        assert_eq!(file.read_trace(0).unwrap(), vec![1.0, -2.0, 3.0]);
        assert_eq!(file.read_trace(1).unwrap(), vec![0.5, 0.25, -0.125]);
    }

    #[test]
    fn test_read_past_end_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "a.sgy",
            &SegyBuilder::new(SampleFormat::IeeeFloat).trace(vec![1.0]),
        );
        let mut file = SegyFile::open_read(&path).unwrap();
        match file.read_trace(1) {
            Err(ScaleError::Index { index: 1, count: 1 }) => {}
            other => panic!("expected index error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = SegyFile::open_read(&dir.path().join("missing.sgy"));
        assert!(matches!(result, Err(ScaleError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.sgy");
        std::fs::write(&path, b"definitely not seismic").unwrap();
        assert!(matches!(SegyFile::open_read(&path), Err(ScaleError::Format(_))));
    }

    #[test]
    fn test_truncated_trace_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = SegyBuilder::new(SampleFormat::IeeeFloat)
            .trace(vec![1.0; 8])
            .to_bytes();
        let path = dir.path().join("short.sgy");
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(SegyFile::open_read(&path), Err(ScaleError::Format(_))));
    }

    #[test]
    fn test_integer_formats_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = SegyBuilder::new(SampleFormat::IeeeFloat)
            .trace(vec![1.0])
            .to_bytes();
        let at = (TEXTUAL_HEADER_LEN as usize) + BIN_FORMAT_CODE;
        bytes[at..at + 2].copy_from_slice(&3u16.to_be_bytes());
        let path = dir.path().join("int16.sgy");
        std::fs::write(&path, &bytes).unwrap();
        match SegyFile::open_read(&path) {
            Err(ScaleError::Format(msg)) => assert!(msg.contains("unsupported")),
            other => panic!("expected format error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_rev0_ignores_unassigned_header_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = SegyBuilder::new(SampleFormat::IeeeFloat)
            .trace(vec![1.0, 2.0])
            .trace(vec![3.0, 4.0, 5.0])
            .to_bytes();
        let binary = TEXTUAL_HEADER_LEN as usize;
        bytes[binary + BIN_REVISION..binary + BIN_REVISION + 2].copy_from_slice(&[0, 0]);
        bytes[binary + BIN_FIXED_LENGTH_FLAG..binary + BIN_EXTENDED_HEADERS + 2]
            .copy_from_slice(&[0x00, 0x01, 0xFF, 0xFF]);
        let path = dir.path().join("rev0.sgy");
        std::fs::write(&path, &bytes).unwrap();

        let mut file = SegyFile::open_read(&path).unwrap();
        assert_eq!(file.layout().extended_headers, 0);
        assert_eq!(file.trace_count(), 2);
        assert_eq!(file.read_trace(1).unwrap(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_rev1_negative_extended_count_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = SegyBuilder::new(SampleFormat::IeeeFloat)
            .trace(vec![1.0])
            .to_bytes();
        let at = TEXTUAL_HEADER_LEN as usize + BIN_EXTENDED_HEADERS;
        bytes[at..at + 2].copy_from_slice(&[0xFF, 0xFF]);
        let path = dir.path().join("variable.sgy");
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(SegyFile::open_read(&path), Err(ScaleError::Format(_))));
    }

    #[test]
    fn test_little_endian_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SegyBuilder::new(SampleFormat::IeeeFloat)
            .byte_order(ByteOrder::Little)
            .trace(vec![4.0, -8.0]);
        let path = write_fixture(dir.path(), "le.sgy", &builder);
        let mut file = SegyFile::open_read(&path).unwrap();
        assert_eq!(file.layout().byte_order, ByteOrder::Little);
        assert_eq!(file.read_trace(0).unwrap(), vec![4.0, -8.0]);
    }

    #[test]
    fn test_variable_length_traces() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SegyBuilder::new(SampleFormat::IbmFloat)
            .trace(vec![1.0, 2.0])
            .trace(vec![3.0, 4.0, 5.0, 6.0])
            .trace(vec![7.0]);
        let path = write_fixture(dir.path(), "var.sgy", &builder);
        let mut file = SegyFile::open_read(&path).unwrap();
        let counts: Vec<usize> = file.layout().traces.iter().map(|t| t.samples).collect();
        assert_eq!(counts, vec![2, 4, 1]);
        assert_eq!(file.read_trace(1).unwrap(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(file.read_trace(2).unwrap(), vec![7.0]);
    }

    #[test]
    fn test_write_trace_changes_only_payload_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SegyBuilder::new(SampleFormat::IeeeFloat)
            .extended_headers(1)
            .trace(vec![1.0, 2.0, 3.0])
            .trace(vec![4.0, 5.0, 6.0]);
        let path = write_fixture(dir.path(), "rw.sgy", &builder);
        let before = std::fs::read(&path).unwrap();

        let mut file = SegyFile::open_read_write(&path).unwrap();
        let slot = file.layout().traces[1];
        file.write_trace(1, &[-1.0, -2.0, -3.0]).unwrap();
        file.close().unwrap();

        let after = std::fs::read(&path).unwrap();
        assert_eq!(before.len(), after.len());
        let payload = slot.data_offset as usize..(slot.data_offset + slot.payload_len()) as usize;
        for (i, (a, b)) in before.iter().zip(after.iter()).enumerate() {
            if !payload.contains(&i) {
                assert_eq!(a, b, "byte {} outside the payload changed", i);
            }
        }
        let mut reopened = SegyFile::open_read(&path).unwrap();
        assert_eq!(reopened.read_trace(0).unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(reopened.read_trace(1).unwrap(), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_write_wrong_length_is_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "a.sgy",
            &SegyBuilder::new(SampleFormat::IeeeFloat).trace(vec![1.0, 2.0]),
        );
        let mut file = SegyFile::open_read_write(&path).unwrap();
        assert!(matches!(
            file.write_trace(0, &[1.0]),
            Err(ScaleError::ShapeMismatch { index: 0, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_read_only_handle_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "a.sgy",
            &SegyBuilder::new(SampleFormat::IeeeFloat).trace(vec![1.0]),
        );
        let mut file = SegyFile::open_read(&path).unwrap();
        assert!(file.write_trace(0, &[0.5]).is_err());
    }
}
