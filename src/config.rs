use crate::ScaleError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use sysinfo::System;

/// Everything a run needs: where to read, where to write, how wide to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub workers: usize,
}

impl ScaleConfig {
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        ScaleConfig {
            input_root: input_root.into(),
            output_root: output_root.into(),
            workers: default_workers(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The input root must exist and neither root may contain the other,
    /// otherwise pass 2 could write over files it is still reading.
    pub fn validate(&self) -> Result<(), ScaleError> {
        let input = self.input_root.canonicalize().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScaleError::NotFound(self.input_root.clone()),
            _ => ScaleError::Io(e),
        })?;
        if !input.is_dir() {
            return Err(ScaleError::Config(format!(
                "input root {} is not a directory",
                self.input_root.display()
            )));
        }

        let output = resolve(&self.output_root)?;
        if output.starts_with(&input) {
            return Err(ScaleError::Config(format!(
                "output root {} must not be inside input root {}",
                self.output_root.display(),
                self.input_root.display()
            )));
        }
        if input.starts_with(&output) {
            return Err(ScaleError::Config(format!(
                "input root {} must not be inside output root {}",
                self.input_root.display(),
                self.output_root.display()
            )));
        }
        Ok(())
    }
}

fn resolve(path: &Path) -> Result<PathBuf, ScaleError> {
    if path.exists() {
        Ok(path.canonicalize()?)
    } else {
        Ok(std::path::absolute(path)?)
    }
}

/// One worker per logical CPU.
pub fn default_workers() -> usize {
    let mut sys = System::new();
    sys.refresh_cpu();
    sys.cpus().len().max(1)
}
