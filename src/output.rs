use crate::config::ArrayFormat;
use crate::error::DriverError;
use crate::lattice::Snapshot;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
/// Magic (6) + version (2) + header length field (2)
const NPY_PREAMBLE_LEN: usize = 10;
const NPY_ALIGN: usize = 64;

/// Persist a snapshot in the requested format
pub fn write_array(path: &Path, snapshot: &Snapshot, format: ArrayFormat) -> Result<(), DriverError> {
    match format {
        ArrayFormat::Npy => write_npy(path, snapshot),
        ArrayFormat::Png => write_png(path, snapshot),
    }
}

/// `.npy` v1.0 header describing a C-ordered `u8` array of the snapshot's shape,
/// space padded so the data starts on a 64-byte boundary
fn npy_header(rows: usize, cols: usize) -> Vec<u8> {
    let dict = format!("{{'descr': '|u1', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // +1 for the trailing newline
    let unpadded = NPY_PREAMBLE_LEN + dict.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(NPY_PREAMBLE_LEN + header_len);
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    out
}

pub fn write_npy(path: &Path, snapshot: &Snapshot) -> Result<(), DriverError> {
    let file = File::create(path).map_err(|e| DriverError::io("create array file", path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&npy_header(snapshot.rows, snapshot.cols))
        .and_then(|_| writer.write_all(&snapshot.cells))
        .and_then(|_| writer.flush())
        .map_err(|e| DriverError::io("write array file", path, e))
}

pub fn write_png(path: &Path, snapshot: &Snapshot) -> Result<(), DriverError> {
    let pixels = snapshot.cells.iter().map(|&c| if c != 0 { 255 } else { 0 }).collect();
    let image = image::GrayImage::from_raw(snapshot.cols as u32, snapshot.rows as u32, pixels)
        .ok_or_else(|| DriverError::InvalidConfig("snapshot buffer does not match its shape".into()))?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// One row of the sweep's metadata table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub index: usize,
    /// Particles requested for the run
    pub num_particles: i64,
    pub stickiness: f64,
    pub filepath: PathBuf,
    pub shape: usize,
    /// Cells in the final aggregate, seed included
    pub particles_stuck: usize,
    /// Run ended early because no entry point was left
    pub exhausted: bool,
}

const METADATA_HEADER: &str = ",num_particles,stickiness,filepath,shape,particles_stuck,exhausted";

/// Append-only CSV table, flushed after every row so an interrupted sweep leaves a readable file
pub struct MetadataTable {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl MetadataTable {
    /// Create (or truncate) the table and write its header
    pub fn create(path: &Path) -> Result<Self, DriverError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DriverError::io("create directory", parent, e))?;
        }
        let file = File::create(path).map_err(|e| DriverError::io("create metadata table", path, e))?;
        let mut table = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        };
        table.write_line(METADATA_HEADER)?;
        Ok(table)
    }

    pub fn append(&mut self, row: &MetadataRow) -> Result<(), DriverError> {
        let line = format!(
            "{},{},{:?},{},{},{},{}",
            row.index,
            row.num_particles,
            row.stickiness,
            csv_field(&row.filepath.display().to_string()),
            row.shape,
            row.particles_stuck,
            row.exhausted,
        );
        self.write_line(&line)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> Result<(), DriverError> {
        writeln!(self.writer, "{line}")
            .and_then(|_| self.writer.flush())
            .map_err(|e| DriverError::io("write metadata table", &self.path, e))
    }
}

/// Quote a field when it holds a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
