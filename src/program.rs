//! The external processing program and the interpreter that runs it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{MinifyConfig, ProgramConfig};
use crate::dispatch::MinifyError;
use crate::log;
use crate::utils::path::expand_path;

/// Resolved interpreter and script, located once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProgram {
    interpreter: PathBuf,
    script: PathBuf,
}

impl ExternalProgram {
    pub fn new(interpreter: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    /// Find the script (copying it in from a search location if needed)
    /// and resolve the interpreter on `PATH`.
    pub fn locate(config: &MinifyConfig) -> Result<Self, MinifyError> {
        let script = locate_script(&config.program, config.get_root())?;
        let interpreter = which::which(&config.program.interpreter).map_err(|_| {
            MinifyError::ExternalProgramMissing {
                what: "interpreter",
                name: config.program.interpreter.clone(),
                searched: Vec::new(),
            }
        })?;
        Ok(Self::new(interpreter, script))
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script(&self) -> &Path {
        &self.script
    }
}

fn locate_script(program: &ProgramConfig, root: &Path) -> Result<PathBuf, MinifyError> {
    let script = expand_path(&program.script, root);
    if script.is_file() {
        return Ok(script);
    }

    let mut searched = vec![script.clone()];
    for candidate in &program.search {
        let candidate = expand_path(candidate, root);
        if !candidate.is_file() {
            searched.push(candidate);
            continue;
        }

        if let Some(parent) = script.parent() {
            fs::create_dir_all(parent).map_err(|e| MinifyError::io(parent, e))?;
        }
        fs::copy(&candidate, &script).map_err(|e| MinifyError::io(&script, e))?;
        log!("program"; "copied {} to {}", candidate.display(), script.display());
        return Ok(script);
    }

    Err(MinifyError::ExternalProgramMissing {
        what: "processing program",
        name: program.script.display().to_string(),
        searched,
    })
}
