// ============================================================================
// ReefPaint CLI: render a coloring page headlessly from a stroke script
// ============================================================================
//
// Usage examples:
//   reefpaint --artwork 2 --script strokes.txt --output colorir.png
//   reefpaint --artwork-file my_lineart.png -s fill.txt -o done.png
//   reefpaint --project progress.reef --output colorir.png
//   reefpaint -a 3 -s strokes.txt --save-project progress.reef --seed 42
//
// No window is opened in CLI mode. Everything runs on the current thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::assets::{AppSettings, Artwork};
use crate::io::{ProgressProject, load_project, save_project};
use crate::ops::script::StrokeScript;
use crate::session::{CanvasEditorSession, SessionOptions};
use crate::{log_err, logger};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// ReefPaint headless page renderer.
///
/// Load a coral artwork, replay a stroke script on it and export the
/// colored page, without opening the window.
#[derive(Parser, Debug, Default)]
#[command(
    name = "reefpaint",
    about = "ReefPaint headless coloring page renderer",
    long_about = "Replay a stroke script against one of the coral artworks and export\n\
                  the finished page as PNG, or save progress as a .reef project.\n\n\
                  Example:\n  \
                  reefpaint --artwork 2 --script strokes.txt --output colorir.png"
)]
pub struct CliArgs {
    /// Preset artwork id (1, 2 or 3). Unknown ids fall back to 1.
    #[arg(short, long, value_name = "ID")]
    pub artwork: Option<String>,

    /// Line-art image file to color instead of a preset.
    #[arg(long, value_name = "FILE", conflicts_with = "artwork")]
    pub artwork_file: Option<PathBuf>,

    /// Saved progress (.reef) to continue from.
    #[arg(short, long, value_name = "FILE.reef")]
    pub project: Option<PathBuf>,

    /// Stroke script to replay.
    #[arg(short, long, value_name = "SCRIPT.txt")]
    pub script: Option<PathBuf>,

    /// Where to write the composited PNG. Defaults to the configured export
    /// file name when no other output is requested.
    #[arg(short, long, value_name = "FILE.png")]
    pub output: Option<PathBuf>,

    /// Also save progress as a .reef project.
    #[arg(long, value_name = "FILE.reef")]
    pub save_project: Option<PathBuf>,

    /// Seed for the spray tool, for reproducible output.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Mirror the session log to stderr and print timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when a headless-only flag is present in the real process
    /// arguments. `--artwork` alone opens the window on that artwork.
    pub fn is_cli_mode() -> bool {
        std::env::args().skip(1).any(|a| is_headless_flag(&a))
    }
}

/// Matches `--script`, `--output` and `--save-project` in both their spaced
/// and `--flag=value` forms, and `-s`/`-o` alone, glued to their value, or
/// after `-v` in a short cluster.
fn is_headless_flag(arg: &str) -> bool {
    if let Some(long) = arg.strip_prefix("--") {
        let name = long.split_once('=').map_or(long, |(name, _)| name);
        return matches!(name, "script" | "output" | "save-project");
    }
    let Some(cluster) = arg.strip_prefix('-') else {
        return false;
    };
    for c in cluster.chars() {
        match c {
            's' | 'o' => return true,
            'v' => continue,
            // any other short flag takes the rest as its value
            _ => return false,
        }
    }
    false
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the headless pipeline and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    run_logged(args, &logger::log_file_path())
}

/// [`run`] with the session log written to `log_path`. `--verbose` also
/// mirrors it to stderr.
pub fn run_logged(args: CliArgs, log_path: &Path) -> ExitCode {
    logger::init_at(log_path, args.verbose);

    let start = Instant::now();
    match run_inner(&args, &AppSettings::load()) {
        Ok(written) => {
            if args.verbose {
                for path in &written {
                    println!("  → {}", path.display());
                }
                println!("done in {:.0}ms", start.elapsed().as_secs_f64() * 1000.0);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_err!("CLI run failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load → restore → replay → write. Returns the paths written.
pub fn run_inner(args: &CliArgs, settings: &AppSettings) -> Result<Vec<PathBuf>, String> {
    let mut options = SessionOptions::from(settings);
    if args.seed.is_some() {
        options.spray_seed = args.seed;
    }
    let mut session = CanvasEditorSession::new(options);

    // -- Step 1: Artwork -------------------------------------------------
    let project = match &args.project {
        Some(path) => Some(
            load_project(path).map_err(|e| format!("could not read '{}': {}", path.display(), e))?,
        ),
        None => None,
    };
    load_start_artwork(&mut session, args, settings, project.as_ref())?;

    // -- Step 2: Saved progress ------------------------------------------
    if let Some(project) = &project {
        session
            .restore_progress(project)
            .map_err(|e| format!("could not restore progress: {}", e))?;
    }

    // -- Step 3: Script --------------------------------------------------
    if let Some(path) = &args.script {
        let script = StrokeScript::load(path)
            .map_err(|e| format!("script '{}': {}", path.display(), e))?;
        script
            .run(&mut session)
            .map_err(|e| format!("script '{}': {}", path.display(), e))?;
    }

    // -- Step 4: Outputs -------------------------------------------------
    let mut written = Vec::new();
    let output = match (&args.output, &args.save_project) {
        (Some(out), _) => Some(out.clone()),
        (None, None) => Some(PathBuf::from(&settings.export_file_name)),
        (None, Some(_)) => None,
    };
    if let Some(out) = output {
        session
            .export_to(&out)
            .map_err(|e| format!("export to '{}' failed: {}", out.display(), e))?;
        written.push(out);
    }
    if let Some(path) = &args.save_project {
        write_progress(&session, path)?;
        written.push(path.clone());
    }
    Ok(written)
}

// ============================================================================
// Helpers
// ============================================================================

/// Pick the line art: explicit file, explicit preset, the project's preset,
/// then the configured default.
fn load_start_artwork(
    session: &mut CanvasEditorSession,
    args: &CliArgs,
    settings: &AppSettings,
    project: Option<&ProgressProject>,
) -> Result<(), String> {
    if let Some(path) = &args.artwork_file {
        return session
            .load_artwork_file(path)
            .map_err(|e| format!("could not load '{}': {}", path.display(), e));
    }
    let artwork = match (&args.artwork, project.and_then(|p| p.artwork_id.as_deref())) {
        (Some(id), _) => Artwork::from_query(Some(id)),
        (None, Some(id)) => Artwork::from_query(Some(id)),
        (None, None) => settings.default_artwork,
    };
    session
        .load_artwork(artwork)
        .map_err(|e| format!("could not load artwork {}: {}", artwork.id(), e))
}

fn write_progress(session: &CanvasEditorSession, path: &Path) -> Result<(), String> {
    let project = session.progress().map_err(|e| e.to_string())?;
    save_project(&project, path).map_err(|e| format!("could not save '{}': {}", path.display(), e))
}
