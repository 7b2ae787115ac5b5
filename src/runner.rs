//! Convenience entry points around [`Machine::execute`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::machine::{Machine, MachineError};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("file \"{}\" does not exist.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read \"{}\": {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// Run inline source text.
pub fn run_code(machine: &mut Machine, source: &str, input: &str) -> Result<String, RunError> {
    Ok(machine.execute(source, input)?)
}

/// Load a whole file as UTF-8 text and run it.
pub fn exec_file(
    machine: &mut Machine,
    path: impl AsRef<Path>,
    input: &str,
) -> Result<String, RunError> {
    let source = read_source(path.as_ref())?;
    run_code(machine, &source, input)
}

pub fn read_source(path: &Path) -> Result<String, RunError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => RunError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => RunError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}
