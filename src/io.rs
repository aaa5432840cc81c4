//! Safetensors and JSON I/O for the command-line drivers.
//!
//! Reader: a dataset file holds the four arrays a search needs.
//!
//! | key                 | dtype     | shape                     |
//! |---------------------|-----------|---------------------------|
//! | `background`        | F32 / F64 | [trials, channels, T_bg]  |
//! | `background_target` | F32 / F64 | [trials, T_bg]            |
//! | `signal`            | F32 / F64 | [trials, channels, T_sig] |
//! | `signal_target`     | F32 / F64 | [trials, T_sig]           |
//! | `channels`          | U8        | newline-joined labels (optional) |
//! | `msnr`              | F32 / F64 | scalar (optional)         |
use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array2, Array3, ArrayView, Dimension};
use std::collections::HashMap;
use std::path::Path;

use crate::search::{SearchInput, SearchOutcome};
use crate::snr::mean_snr;

// ── Low-level safetensors parser ──────────────────────────────────────────────

type Header = HashMap<String, serde_json::Value>;

fn parse_header(bytes: &[u8]) -> Result<(Header, usize)> {
    ensure!(bytes.len() >= 8, "safetensors file too small");
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let data_start = usize::try_from(u64::from_le_bytes(len))
        .ok()
        .and_then(|n| n.checked_add(8))
        .context("safetensors header length overflows")?;
    ensure!(bytes.len() >= data_start, "safetensors header truncated");
    let mut header: Header = serde_json::from_slice(&bytes[8..data_start])
        .context("failed to parse safetensors header")?;
    header.remove("__metadata__");
    Ok((header, data_start))
}

fn raw_bytes<'a>(bytes: &'a [u8], data_start: usize, name: &str, entry: &serde_json::Value) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"]
        .as_array()
        .with_context(|| format!("'{name}': missing data_offsets"))?;
    let bound = |i: usize| {
        offsets
            .get(i)
            .and_then(|v| v.as_u64())
            .and_then(|v| usize::try_from(v).ok())
            .and_then(|v| data_start.checked_add(v))
            .with_context(|| format!("'{name}': bad data_offsets"))
    };
    let (s, e) = (bound(0)?, bound(1)?);
    ensure!(s <= e && e <= bytes.len(), "'{name}': data_offsets out of bounds");
    Ok(&bytes[s..e])
}

fn shape_of(name: &str, entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .with_context(|| format!("'{name}': missing shape"))?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).with_context(|| format!("'{name}': bad shape")))
        .collect()
}

/// Read a floating-point tensor as f64, with its shape.
fn read_float_tensor(bytes: &[u8], data_start: usize, header: &Header, name: &str) -> Result<(Vec<usize>, Vec<f64>)> {
    let entry = header.get(name).with_context(|| format!("missing '{name}' key"))?;
    let shape = shape_of(name, entry)?;
    let raw = raw_bytes(bytes, data_start, name, entry)?;
    let values: Vec<f64> = match entry["dtype"].as_str() {
        Some("F32") => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        Some("F64") => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        other => bail!("'{name}': unsupported dtype {other:?} (expected F32 or F64)"),
    };
    let expected: usize = shape.iter().product();
    ensure!(
        values.len() == expected,
        "'{name}': {} values for shape {shape:?}",
        values.len()
    );
    Ok((shape, values))
}

fn read_arr2(bytes: &[u8], data_start: usize, header: &Header, name: &str) -> Result<Array2<f64>> {
    let (shape, values) = read_float_tensor(bytes, data_start, header, name)?;
    ensure!(shape.len() == 2, "'{name}': expected 2 dimensions, got shape {shape:?}");
    Ok(Array2::from_shape_vec((shape[0], shape[1]), values)?)
}

fn read_arr3(bytes: &[u8], data_start: usize, header: &Header, name: &str) -> Result<Array3<f64>> {
    let (shape, values) = read_float_tensor(bytes, data_start, header, name)?;
    ensure!(shape.len() == 3, "'{name}': expected 3 dimensions, got shape {shape:?}");
    Ok(Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)?)
}

// ── Public structs ────────────────────────────────────────────────────────────

/// Arrays for one search run, loaded from a safetensors file.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub channels: Vec<String>,
    pub msnr: f64,
    /// [trials, channels, T_bg]
    pub background: Array3<f64>,
    /// [trials, T_bg]
    pub background_target: Array2<f64>,
    /// [trials, channels, T_sig]
    pub signal: Array3<f64>,
    /// [trials, T_sig]
    pub signal_target: Array2<f64>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let (header, data_start) = parse_header(&bytes)?;

        let background = read_arr3(&bytes, data_start, &header, "background")?;
        let background_target = read_arr2(&bytes, data_start, &header, "background_target")?;
        let signal = read_arr3(&bytes, data_start, &header, "signal")?;
        let signal_target = read_arr2(&bytes, data_start, &header, "signal_target")?;

        // Labels are optional.
        let channels: Vec<String> = match header.get("channels") {
            Some(entry) => {
                let raw = raw_bytes(&bytes, data_start, "channels", entry)?;
                std::str::from_utf8(raw)
                    .context("'channels' is not valid UTF-8")?
                    .split('\n')
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            None => (0..background.dim().1).map(|i| format!("ch{i}")).collect(),
        };

        let msnr = if header.contains_key("msnr") {
            let (_, v) = read_float_tensor(&bytes, data_start, &header, "msnr")?;
            *v.first().context("'msnr' is empty")?
        } else {
            mean_snr(signal_target.view())
        };

        tracing::info!(
            path = %path.display(),
            trials = background.dim().0,
            channels = channels.len(),
            background_samples = background.dim().2,
            signal_samples = signal.dim().2,
            msnr,
            "dataset loaded"
        );
        Ok(Self { channels, msnr, background, background_target, signal, signal_target })
    }

    /// Borrow the arrays as a search input.
    pub fn input(&self) -> SearchInput<'_, String> {
        SearchInput {
            channels: &self.channels,
            msnr: self.msnr,
            background: self.background.view(),
            background_target: self.background_target.view(),
            signal: self.signal.view(),
            signal_target: self.signal_target.view(),
        }
    }

    /// Write the dataset in the layout [`load`](Self::load) reads.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.add_f64_array("background", self.background.view());
        w.add_f64_array("background_target", self.background_target.view());
        w.add_f64_array("signal", self.signal.view());
        w.add_f64_array("signal_target", self.signal_target.view());
        w.add_str("channels", &self.channels.join("\n"));
        w.add_f64("msnr", &[self.msnr], &[]);
        w.write(path)
    }
}

// ── Generic safetensors builder ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
    I32,
    U8,
}

impl Dtype {
    fn tag(self) -> &'static str {
        match self {
            Dtype::F32 => "F32",
            Dtype::F64 => "F64",
            Dtype::I32 => "I32",
            Dtype::U8 => "U8",
        }
    }
}

#[derive(Debug, Clone)]
struct Tensor {
    name: String,
    dtype: Dtype,
    shape: Vec<usize>,
    data: Vec<u8>,
}

/// In-memory safetensors builder for F32, F64, I32 and U8 tensors.
///
/// Tensors are stored in insertion order; [`to_bytes`](Self::to_bytes) lays
/// them out back to back after an 8-byte-aligned JSON header.
///
/// ```rust,no_run
/// use mcee::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("residual", &[1.0f32, 2.0, 3.0], &[1, 3]);
/// w.add_i32("channels", &[4, 0, 2], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct StWriter {
    tensors: Vec<Tensor>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, dtype: Dtype, shape: &[usize], data: Vec<u8>) {
        self.tensors.push(Tensor { name: name.to_string(), dtype, shape: shape.to_vec(), data });
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        self.push(name, Dtype::F32, shape, data.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        self.push(name, Dtype::F64, shape, data.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        self.push(name, Dtype::I32, shape, data.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    /// f64 array of any dimension, in logical (row-major) order.
    pub fn add_f64_array<D: Dimension>(&mut self, name: &str, arr: ArrayView<'_, f64, D>) {
        let bytes = arr.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push(name, Dtype::F64, arr.shape(), bytes);
    }

    /// UTF-8 text stored as a 1-D U8 tensor.
    pub fn add_str(&mut self, name: &str, text: &str) {
        self.push(name, Dtype::U8, &[text.len()], text.as_bytes().to_vec());
    }

    /// Serialise to the safetensors layout: little-endian header length,
    /// space-padded JSON header, then the tensor bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = serde_json::Map::new();
        let mut offset = 0usize;
        for t in &self.tensors {
            let end = offset + t.data.len();
            header.insert(
                t.name.clone(),
                serde_json::json!({ "dtype": t.dtype.tag(), "shape": t.shape, "data_offsets": [offset, end] }),
            );
            offset = end;
        }
        let mut json = serde_json::to_vec(&header)?;
        json.resize(json.len().next_multiple_of(8), b' ');

        let mut out = Vec::with_capacity(8 + json.len() + offset);
        out.extend_from_slice(&(json.len() as u64).to_le_bytes());
        out.extend_from_slice(&json);
        for t in &self.tensors {
            out.extend_from_slice(&t.data);
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?).with_context(|| format!("writing {}", path.display()))
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Write a search outcome as pretty-printed JSON.
pub fn write_outcome_json(outcome: &SearchOutcome<String>, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(outcome)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read back a file written by [`write_outcome_json`].
pub fn read_outcome_json(path: &Path) -> Result<SearchOutcome<String>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
