//! Write-only state dumps.
//!
//! A [`Snapshot`] copies the machine's registers, last buffers and the whole
//! tape into a serde-serializable record. Nothing in the crate reads it back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::machine::Machine;

pub const DEFAULT_DUMP_FILE: &str = "sbfi-dump.json";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to write dump to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize dump: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDump {
    pub address: usize,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(rename = "memory-size")]
    pub memory_size: usize,
    #[serde(rename = "instruction-ptr")]
    pub instruction_ptr: usize,
    #[serde(rename = "memory-cursor")]
    pub memory_cursor: usize,
    #[serde(rename = "last-input-buffer")]
    pub last_input_buffer: String,
    #[serde(rename = "last-output-buffer")]
    pub last_output_buffer: String,
    /// `"true"` or `"false"`; the dump format keeps the flag as text.
    #[serde(rename = "debug-mode?")]
    pub debug_mode: String,
    #[serde(rename = "memory-dump")]
    pub memory_dump: Vec<CellDump>,
}

impl Snapshot {
    pub(crate) fn capture(machine: &Machine) -> Self {
        Self {
            memory_size: machine.tape_length(),
            instruction_ptr: machine.instruction_pointer(),
            memory_cursor: machine.data_pointer(),
            last_input_buffer: machine.input().to_string(),
            last_output_buffer: machine.output().to_string(),
            debug_mode: machine.is_debug().to_string(),
            memory_dump: machine
                .tape()
                .iter()
                .enumerate()
                .map(|(address, &value)| CellDump { address, value })
                .collect(),
        }
    }

    /// Serialize with four-space indentation.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        // serde_json only emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the dump to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let io_err = |source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer.flush().map_err(io_err)
    }

    fn write_json<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        let mut ser = serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        Ok(())
    }
}
