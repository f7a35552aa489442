//! Command dispatch.
//!
//! Every user-visible operation goes through [`Dispatcher`]:
//!
//! ```text
//! minify_file ───────────────► run program on file ──► stat sizes ──► FileReport
//! minify_directory ──────────► run program on dir ───► parse stdout ► DirectoryReport
//! minify_directory_*_only ──► scratch variant ──┘
//! ```
//!
//! Validation happens before anything is spawned: an unsupported extension
//! or a missing target never reaches the subprocess.

mod error;

#[cfg(test)]
mod tests;

pub use error::MinifyError;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::asset::{AssetFilter, Target, is_already_minified, minified_sibling};
use crate::config::{MinifyConfig, RunConfig, VariantConfig};
use crate::host::Host;
use crate::program::ExternalProgram;
use crate::report::{DirectoryReport, FileReport, SingleFileOutcome};
use crate::utils::exec::Cmd;
use crate::variant::ScratchScript;
use crate::{debug, log};

/// What to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MinifyFile,
    MinifyDirectory(AssetFilter),
}

impl Action {
    /// Subject used in "Error minifying ..." messages.
    fn subject(self) -> &'static str {
        match self {
            Self::MinifyFile => "file",
            Self::MinifyDirectory(AssetFilter::All) => "directory",
            Self::MinifyDirectory(AssetFilter::StyleOnly) => "CSS files",
            Self::MinifyDirectory(AssetFilter::ScriptOnly) => "JavaScript files",
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Report {
    File(FileReport),
    Directory(DirectoryReport),
}

impl Report {
    /// Soft outcomes (nothing produced, nothing found) show as warnings.
    pub fn is_warning(&self) -> bool {
        match self {
            Self::File(report) => report.is_warning(),
            Self::Directory(report) => report.is_empty(),
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(report) => write!(f, "{report}"),
            Self::Directory(report) => write!(f, "{report}"),
        }
    }
}

/// Routes user actions to the external program and turns its results into
/// reports.
///
/// Runs share nothing mutable, so several can be in flight at once (for
/// example a CSS-only and a JS-only run over the same tree).
pub struct Dispatcher<H: Host> {
    host: H,
    program: ExternalProgram,
    run: RunConfig,
    variant: VariantConfig,
    scratch_dir: PathBuf,
    cancel: CancellationToken,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(host: H, program: ExternalProgram, config: &MinifyConfig) -> Self {
        Self {
            host,
            program,
            run: config.run.clone(),
            variant: config.variant.clone(),
            scratch_dir: config.scratch_dir(),
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel in-flight runs when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run `action` and report the outcome through the host.
    pub async fn execute(&self, action: Action, path: Option<&Path>) -> Result<Report, MinifyError> {
        let result = match action {
            Action::MinifyFile => self.minify_file(path).await.map(Report::File),
            Action::MinifyDirectory(AssetFilter::All) => {
                self.minify_directory(path).await.map(Report::Directory)
            }
            Action::MinifyDirectory(AssetFilter::StyleOnly) => self
                .minify_directory_style_only(path)
                .await
                .map(Report::Directory),
            Action::MinifyDirectory(AssetFilter::ScriptOnly) => self
                .minify_directory_script_only(path)
                .await
                .map(Report::Directory),
        };

        match &result {
            Ok(report) if report.is_warning() => self.host.warn(&report.to_string()),
            Ok(report) => self.host.info(&report.to_string()),
            Err(MinifyError::NoTargetSelected) => {
                self.host.error("No file or directory selected.", "");
            }
            Err(err) => {
                let detail = match err.hint() {
                    Some(hint) => format!("{err}\n{hint}"),
                    None => err.to_string(),
                };
                self.host
                    .error(&format!("Error minifying {}", action.subject()), &detail);
            }
        }
        result
    }

    // ========================================================================
    // single file
    // ========================================================================

    /// Minify one `.css`/`.js` file, falling back to the host's active
    /// document when `path` is `None`.
    pub async fn minify_file(&self, path: Option<&Path>) -> Result<FileReport, MinifyError> {
        let path = self.resolve(path, H::active_document)?;
        let target = Target::file(&path)?;

        if is_already_minified(target.path()) {
            return Ok(FileReport::AlreadyMinified { path });
        }
        if let Some(class) = target.class() {
            debug!("dispatch"; "{} file {}", class.display_name(), target.path().display());
        }

        let _progress = self
            .host
            .begin_progress(&format!("Minifying {}...", target.display_name()));

        self.command(self.program.script(), &[], target.path())
            .run()
            .await?;

        let Some(output) = minified_sibling(target.path()) else {
            return Ok(FileReport::NoOutput { path });
        };
        let minified_size = match fs::metadata(&output) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("dispatch"; "no output at {}", output.display());
                return Ok(FileReport::NoOutput { path });
            }
            Err(e) => return Err(MinifyError::io(&output, e)),
        };
        let original_size = fs::metadata(target.path())
            .map_err(|e| MinifyError::io(target.path(), e))?
            .len();

        Ok(FileReport::Minified {
            outcome: SingleFileOutcome::compute(original_size, minified_size),
            path,
            output,
        })
    }

    // ========================================================================
    // directories
    // ========================================================================

    /// Minify every CSS and JS file under `dir`.
    pub async fn minify_directory(&self, dir: Option<&Path>) -> Result<DirectoryReport, MinifyError> {
        self.minify_directory_filtered(dir, AssetFilter::All).await
    }

    /// Minify only the CSS files under `dir`.
    pub async fn minify_directory_style_only(
        &self,
        dir: Option<&Path>,
    ) -> Result<DirectoryReport, MinifyError> {
        self.minify_directory_filtered(dir, AssetFilter::StyleOnly)
            .await
    }

    /// Minify only the JavaScript files under `dir`.
    pub async fn minify_directory_script_only(
        &self,
        dir: Option<&Path>,
    ) -> Result<DirectoryReport, MinifyError> {
        self.minify_directory_filtered(dir, AssetFilter::ScriptOnly)
            .await
    }

    /// Directory run restricted by `filter`, falling back to the host's
    /// selection when `dir` is `None`.
    pub async fn minify_directory_filtered(
        &self,
        dir: Option<&Path>,
        filter: AssetFilter,
    ) -> Result<DirectoryReport, MinifyError> {
        let dir = self.resolve(dir, H::selection)?;
        let target = Target::directory(&dir)?;

        let _progress = self.host.begin_progress(&format!(
            "Minifying {} in {}...",
            filter.label(),
            target.display_name()
        ));

        let output = match filter.excluded() {
            None => self.capture(self.program.script(), &[], target.path()).await?,
            Some(excluded) if self.variant.uses_filter_args() => {
                let args = self.variant.filter_args_for(excluded.other());
                self.capture(self.program.script(), &args, target.path())
                    .await?
            }
            Some(excluded) => {
                let scratch = ScratchScript::create(
                    self.program.script(),
                    excluded,
                    &self.variant,
                    &self.scratch_dir,
                )?;
                let result = self.capture(scratch.path(), &[], target.path()).await;
                if let Err(e) = scratch.remove() {
                    log!("warning"; "{e}");
                }
                result?
            }
        };

        Ok(DirectoryReport::new(target.path(), filter, &output))
    }

    // ========================================================================
    // helpers
    // ========================================================================

    fn resolve(
        &self,
        explicit: Option<&Path>,
        fallback: fn(&H) -> Option<PathBuf>,
    ) -> Result<PathBuf, MinifyError> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| fallback(&self.host))
            .ok_or(MinifyError::NoTargetSelected)
    }

    /// `<interpreter> <script> [extra...] <target>` with the run limits applied.
    fn command(&self, script: &Path, extra: &[String], target: &Path) -> Cmd {
        Cmd::new(self.program.interpreter())
            .arg(script)
            .args(extra)
            .arg(target)
            .envs([("PYTHONIOENCODING", "utf-8")])
            .max_output(self.run.max_output)
            .timeout(self.run.timeout())
            .cancel_on(self.cancel.clone())
    }

    async fn capture(&self, script: &Path, extra: &[String], target: &Path) -> Result<String, MinifyError> {
        let output = self
            .command(script, extra, target)
            .capture(true)
            .run()
            .await?;
        debug!("dispatch"; "program wrote {} bytes", output.len());
        Ok(output)
    }
}
