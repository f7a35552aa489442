//! Dispatcher tests against small `sh` programs standing in for the
//! processing program.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::{MinifyConfig, RunConfig, VariantConfig};
use crate::host::Host;

// ============================================================================
// Test Helpers
// ============================================================================

/// Host that records every interaction.
#[derive(Default)]
struct RecordingHost {
    active_document: Option<PathBuf>,
    selection: Option<PathBuf>,
    events: Arc<Mutex<Vec<String>>>,
}

struct ProgressGuard(Arc<Mutex<Vec<String>>>);

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.0.lock().push("progress-end".into());
    }
}

impl Host for RecordingHost {
    type Progress = ProgressGuard;

    fn active_document(&self) -> Option<PathBuf> {
        self.active_document.clone()
    }

    fn selection(&self) -> Option<PathBuf> {
        self.selection.clone()
    }

    fn begin_progress(&self, label: &str) -> ProgressGuard {
        self.events.lock().push(format!("progress: {label}"));
        ProgressGuard(Arc::clone(&self.events))
    }

    fn info(&self, message: &str) {
        self.events.lock().push(format!("info: {message}"));
    }

    fn warn(&self, message: &str) {
        self.events.lock().push(format!("warn: {message}"));
    }

    fn error(&self, summary: &str, detail: &str) {
        self.events.lock().push(format!("error: {summary}: {detail}"));
    }
}

impl RecordingHost {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

/// Counts per class, with the two traversal lines the variant patches.
const COUNTING_PROGRAM: &str = r#"css_count=$(find "$1" -name '*.css' | wc -l | tr -d ' ')
js_count=$(find "$1" -name '*.js' | wc -l | tr -d ' ')
sleep 0.3
test -f "$0" || exit 9
echo "Found $css_count CSS files and $js_count JavaScript files to process"
echo "CSS: $css_count/$css_count, JS: $js_count/$js_count"
"#;

/// Writes `<stem>.min.<ext>` holding the first 40 bytes of the input.
const HALVING_PROGRAM: &str = r#"f="$1"
case "$f" in
  *.css) out="${f%.css}.min.css" ;;
  *.js) out="${f%.js}.min.js" ;;
esac
head -c 40 "$f" > "$out"
"#;

/// Like the stock program: the output extension is always lowercase.
const LOWERCASING_PROGRAM: &str = r#"f="$1"
ext=$(printf '%s' "${f##*.}" | tr 'A-Z' 'a-z')
head -c 40 "$f" > "${f%.*}.min.$ext"
"#;

struct Fixture {
    dir: TempDir,
    scratch: PathBuf,
    marker: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch");
        let marker = dir.path().join("ran");
        Self {
            dir,
            scratch,
            marker,
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Program that records it ran before executing `body`.
    fn program(&self, body: &str) -> ExternalProgram {
        let script = self.write(
            "minify_assets.sh",
            &format!("touch '{}'\n{body}", self.marker.display()),
        );
        ExternalProgram::new("sh", script)
    }

    fn config(&self) -> MinifyConfig {
        MinifyConfig {
            root: self.root().to_path_buf(),
            run: RunConfig {
                scratch_dir: Some(self.scratch.clone()),
                ..RunConfig::default()
            },
            variant: counting_variant(),
            ..MinifyConfig::default()
        }
    }

    fn dispatcher(&self, body: &str, host: RecordingHost) -> Dispatcher<RecordingHost> {
        Dispatcher::new(host, self.program(body), &self.config())
    }

    fn program_ran(&self) -> bool {
        self.marker.exists()
    }

    fn scratch_files(&self) -> usize {
        fs::read_dir(&self.scratch).map(|d| d.count()).unwrap_or(0)
    }

    /// Tree with two stylesheets and one script, one level deep.
    fn asset_tree(&self) -> PathBuf {
        self.write("site/a.css", "body { color: red; }");
        self.write("site/nested/b.css", "p { margin: 0; }");
        self.write("site/nested/app.js", "console.log(1);");
        self.root().join("site")
    }
}

fn counting_variant() -> VariantConfig {
    VariantConfig {
        style_traversal: r#"css_count=$(find "$1" -name '*.css' | wc -l | tr -d ' ')"#.into(),
        style_replacement: "css_count=0".into(),
        script_traversal: r#"js_count=$(find "$1" -name '*.js' | wc -l | tr -d ' ')"#.into(),
        script_replacement: "js_count=0".into(),
        filter_args: Vec::new(),
    }
}

// ============================================================================
// single file
// ============================================================================

#[tokio::test]
async fn test_unsupported_extension_never_spawns() {
    let fx = Fixture::new();
    let readme = fx.write("README.txt", "hello");
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let result = dispatcher.minify_file(Some(&readme)).await;

    assert!(matches!(result, Err(MinifyError::UnsupportedAssetType(p)) if p == readme));
    assert!(!fx.program_ran());
    assert!(dispatcher.host.events().is_empty());
}

#[tokio::test]
async fn test_missing_file_is_target_not_found() {
    let fx = Fixture::new();
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let result = dispatcher.minify_file(Some(&fx.root().join("gone.css"))).await;

    assert!(matches!(result, Err(MinifyError::TargetNotFound(_))));
    assert!(!fx.program_ran());
}

#[tokio::test]
async fn test_minify_file_reports_savings() {
    let fx = Fixture::new();
    let app = fx.write("static/app.js", &"x".repeat(100));
    let dispatcher = fx.dispatcher(HALVING_PROGRAM, RecordingHost::default());

    let report = dispatcher
        .execute(Action::MinifyFile, Some(&app))
        .await
        .unwrap();

    let Report::File(FileReport::Minified { output, outcome, .. }) = &report else {
        panic!("expected a minified file, got {report:?}");
    };
    assert_eq!(output, &fx.root().join("static/app.min.js"));
    assert_eq!(outcome.original_size_bytes, 100);
    assert_eq!(outcome.minified_size_bytes, 40);
    assert_eq!(outcome.saved_bytes, 60);
    assert_eq!(outcome.saved_percent, 60.0);

    let events = dispatcher.host.events();
    assert_eq!(
        events,
        vec![
            "progress: Minifying app.js...".to_string(),
            "progress-end".to_string(),
            "info: Successfully minified app.js. Saved 60.0% (60 bytes).".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_uppercase_extension_finds_lowercase_output() {
    let fx = Fixture::new();
    let app = fx.write("static/App.JS", &"x".repeat(100));
    let dispatcher = fx.dispatcher(LOWERCASING_PROGRAM, RecordingHost::default());

    let report = dispatcher.minify_file(Some(&app)).await.unwrap();

    let FileReport::Minified { output, outcome, .. } = &report else {
        panic!("expected a minified file, got {report:?}");
    };
    assert_eq!(output, &fx.root().join("static/App.min.js"));
    assert_eq!(outcome.minified_size_bytes, 40);
}

#[tokio::test]
async fn test_minify_file_without_output() {
    let fx = Fixture::new();
    let style = fx.write("site.css", "body {}");
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let report = dispatcher
        .execute(Action::MinifyFile, Some(&style))
        .await
        .unwrap();

    assert_eq!(report, Report::File(FileReport::NoOutput { path: style }));
    assert!(fx.program_ran());
    assert!(
        dispatcher
            .host
            .events()
            .contains(&"warn: Failed to minify site.css. Minified file not found.".to_string())
    );
}

#[tokio::test]
async fn test_already_minified_is_skipped() {
    let fx = Fixture::new();
    let min = fx.write("vendor.min.js", "a()");
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let report = dispatcher.minify_file(Some(&min)).await.unwrap();

    assert_eq!(report, FileReport::AlreadyMinified { path: min });
    assert!(!fx.program_ran());
}

#[tokio::test]
async fn test_minify_file_falls_back_to_active_document() {
    let fx = Fixture::new();
    let app = fx.write("app.css", &"y".repeat(80));
    let host = RecordingHost {
        active_document: Some(app.clone()),
        ..RecordingHost::default()
    };
    let dispatcher = fx.dispatcher(HALVING_PROGRAM, host);

    let report = dispatcher.minify_file(None).await.unwrap();

    assert_eq!(report.path(), app);
    assert!(fx.root().join("app.min.css").is_file());
}

#[tokio::test]
async fn test_no_target_selected() {
    let fx = Fixture::new();
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let result = dispatcher.execute(Action::MinifyFile, None).await;
    assert!(matches!(result, Err(MinifyError::NoTargetSelected)));

    let result = dispatcher
        .execute(Action::MinifyDirectory(AssetFilter::All), None)
        .await;
    assert!(matches!(result, Err(MinifyError::NoTargetSelected)));

    assert!(!fx.program_ran());
    assert_eq!(
        dispatcher.host.events(),
        vec![
            "error: No file or directory selected.: ".to_string(),
            "error: No file or directory selected.: ".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_subprocess_failure_carries_stderr() {
    let fx = Fixture::new();
    let style = fx.write("site.css", "body {}");
    let dispatcher = fx.dispatcher(
        "echo \"ModuleNotFoundError: No module named 'cssmin'\" >&2\nexit 1",
        RecordingHost::default(),
    );

    let result = dispatcher.execute(Action::MinifyFile, Some(&style)).await;

    match result {
        Err(MinifyError::SubprocessFailure { stderr, .. }) => {
            assert_eq!(stderr, "ModuleNotFoundError: No module named 'cssmin'");
        }
        other => panic!("expected SubprocessFailure, got {other:?}"),
    }
    let events = dispatcher.host.events();
    let last = events.last().unwrap();
    assert!(last.starts_with("error: Error minifying file: "));
    assert!(last.contains("No module named 'cssmin'"));
}

// ============================================================================
// directories
// ============================================================================

#[tokio::test]
async fn test_minify_directory_parses_output() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let dispatcher = fx.dispatcher(
        "echo 'Found 2 CSS files and 1 JavaScript files to process'\n\
         echo 'Processed 3 files. Counted 3 successful minifications.'\n\
         echo 'Successfully processed 2 files in nested subdirectories (1 CSS, 1 JS)'",
        RecordingHost::default(),
    );

    let report = dispatcher.minify_directory(Some(&site)).await.unwrap();

    assert_eq!(report.summary.style_files_found, 2);
    assert_eq!(report.summary.script_files_found, 1);
    assert_eq!(report.summary.successfully_minified, 3);
    assert_eq!(
        report.to_string(),
        "Minified 3 of 3 files in site (including files in subdirectories)."
    );
}

#[tokio::test]
async fn test_minify_directory_from_selection() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let host = RecordingHost {
        selection: Some(site.clone()),
        ..RecordingHost::default()
    };
    let dispatcher = fx.dispatcher("echo 'nothing useful'", host);

    let report = dispatcher
        .execute(Action::MinifyDirectory(AssetFilter::All), None)
        .await
        .unwrap();

    assert_eq!(
        report.to_string(),
        "No CSS or JS files found in site."
    );
    assert!(
        dispatcher
            .host
            .events()
            .contains(&"warn: No CSS or JS files found in site.".to_string())
    );
}

#[tokio::test]
async fn test_minify_directory_not_a_directory() {
    let fx = Fixture::new();
    let file = fx.write("app.js", "");
    let dispatcher = fx.dispatcher("exit 0", RecordingHost::default());

    let result = dispatcher.minify_directory(Some(&file)).await;

    assert!(matches!(result, Err(MinifyError::TargetNotFound(_))));
    assert!(!fx.program_ran());
}

#[tokio::test]
async fn test_style_only_uses_variant() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let dispatcher = fx.dispatcher(COUNTING_PROGRAM, RecordingHost::default());

    let report = dispatcher
        .minify_directory_style_only(Some(&site))
        .await
        .unwrap();

    assert_eq!(report.summary.style_files_found, 2);
    assert_eq!(report.summary.script_files_found, 0);
    assert_eq!(report.summary.successfully_minified, 2);
    assert_eq!(report.to_string(), "Minified 2 of 2 CSS files in site.");
    assert_eq!(fx.scratch_files(), 0);
}

#[tokio::test]
async fn test_concurrent_restricted_runs_do_not_collide() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let dispatcher = fx.dispatcher(COUNTING_PROGRAM, RecordingHost::default());

    // Each program sleeps and then checks its own file still exists.
    let (style, script) = tokio::join!(
        dispatcher.minify_directory_style_only(Some(&site)),
        dispatcher.minify_directory_script_only(Some(&site)),
    );
    let (style, script) = (style.unwrap(), script.unwrap());

    assert_eq!(style.summary.total_for(AssetFilter::StyleOnly), 2);
    assert_eq!(style.summary.script_files_found, 0);
    assert_eq!(script.summary.total_for(AssetFilter::ScriptOnly), 1);
    assert_eq!(script.summary.style_files_found, 0);
    assert_eq!(
        script.to_string(),
        "Minified 1 of 1 JavaScript files in site."
    );
    assert_eq!(fx.scratch_files(), 0);
}

#[tokio::test]
async fn test_scratch_removed_after_failure() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let dispatcher = fx.dispatcher(
        &format!("{COUNTING_PROGRAM}echo 'broken' >&2\nexit 4\n"),
        RecordingHost::default(),
    );

    let result = dispatcher.minify_directory_script_only(Some(&site)).await;

    assert!(matches!(result, Err(MinifyError::SubprocessFailure { .. })));
    assert!(fx.program_ran());
    assert_eq!(fx.scratch_files(), 0);
}

#[tokio::test]
async fn test_filter_args_run_unmodified_program() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let mut config = fx.config();
    config.variant.filter_args = vec!["--only".into(), "{class}".into()];
    let program = fx.program(
        "[ \"$1\" = --only ] && [ \"$2\" = js ] || exit 7\n\
         test -d \"$3\" || exit 8\n\
         echo 'Found 0 CSS files and 1 JavaScript files to process'\n\
         echo 'Minified 1 files'",
    );
    let dispatcher = Dispatcher::new(RecordingHost::default(), program, &config);

    let report = dispatcher
        .minify_directory_script_only(Some(&site))
        .await
        .unwrap();

    assert_eq!(report.to_string(), "Minified 1 of 1 JavaScript files in site.");
    assert!(!fx.scratch.exists());
}

#[tokio::test]
async fn test_timeout_kills_program() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let mut config = fx.config();
    config.run.timeout = 1;
    let dispatcher = Dispatcher::new(RecordingHost::default(), fx.program("sleep 5"), &config);

    let result = dispatcher.minify_directory(Some(&site)).await;

    assert!(matches!(result, Err(MinifyError::Timeout(d)) if d.as_secs() == 1));
}

#[tokio::test]
async fn test_cancelled_run_removes_scratch() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let token = CancellationToken::new();
    let dispatcher = fx
        .dispatcher(&format!("{COUNTING_PROGRAM}sleep 5\n"), RecordingHost::default())
        .with_cancellation(token.clone());

    token.cancel();
    let result = dispatcher.minify_directory_style_only(Some(&site)).await;

    assert!(matches!(result, Err(MinifyError::Cancelled)));
    assert_eq!(fx.scratch_files(), 0);
}

#[tokio::test]
async fn test_output_limit() {
    let fx = Fixture::new();
    let site = fx.asset_tree();
    let mut config = fx.config();
    config.run.max_output = 16;
    let dispatcher = Dispatcher::new(
        RecordingHost::default(),
        fx.program("echo 'Found 2 CSS files and 1 JavaScript files to process'"),
        &config,
    );

    let result = dispatcher.minify_directory(Some(&site)).await;

    assert!(matches!(result, Err(MinifyError::OutputLimitExceeded(16))));
}

#[test]
fn test_report_json_shape() {
    let report = Report::File(FileReport::AlreadyMinified {
        path: PathBuf::from("app.min.js"),
    });
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "file");
    assert_eq!(json["status"], "already-minified");
}
