use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::io::Write;
use std::path::{Path, PathBuf};
use treewrite::{
    load_from_path, run_script_with_sink, Diagnostic, DiagnosticSink, EditOutcome, ScriptReport,
    SourceBuffer,
};

#[derive(Parser)]
#[command(name = "treewrite")]
#[command(about = "Conflict-checked source rewriting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a rewrite script to source files
    Apply {
        /// Path to the rewrite script (TOML)
        #[arg(short, long)]
        script: PathBuf,

        /// Files to rewrite
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write results back in place (atomic); otherwise print to stdout
        #[arg(short, long)]
        modify: bool,

        /// Show a unified diff of the changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check a script against files without writing anything
    Check {
        /// Path to the rewrite script (TOML)
        #[arg(short, long)]
        script: PathBuf,

        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Prints `warn`-policy diagnostics as they are emitted.
struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        eprintln!("{} {}", "warning:".yellow().bold(), diagnostic);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            script,
            files,
            modify,
            diff,
        } => cmd_apply(&script, &files, modify, diff),

        Commands::Check { script, files } => cmd_check(&script, &files),
    }
}

fn cmd_apply(script_path: &Path, files: &[PathBuf], modify: bool, show_diff: bool) -> Result<()> {
    let script = load_from_path(script_path)?;
    if !script.meta.name.is_empty() {
        println!("Script: {}", script.meta.name);
    }

    let mut total_applied = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for file in files {
        let buffer = SourceBuffer::from_path(file)?;
        let report = run_script_with_sink(&script, &buffer, Box::new(StderrSink));

        report_outcomes(&buffer, &report, &mut total_applied, &mut total_failed);

        if !report.changed(&buffer) {
            println!("{} {}: unchanged", "⊙".yellow(), file.display());
            total_unchanged += 1;
            continue;
        }

        if show_diff {
            display_diff(file, buffer.source(), &report.output);
        }

        if modify {
            atomic_write(file, report.output.as_bytes())?;
            println!("{} {}: rewritten", "✓".green(), file.display());
        } else if !show_diff {
            print!("{}", report.output);
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", total_applied).green());
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(script_path: &Path, files: &[PathBuf]) -> Result<()> {
    let script = load_from_path(script_path)?;

    println!("{}", "Checking rewrite script...".bold());

    let mut total_clean = 0;
    let mut total_failed = 0;

    for file in files {
        let buffer = SourceBuffer::from_path(file)?;
        let report = run_script_with_sink(&script, &buffer, Box::new(StderrSink));

        let failures = report.failures();
        if failures == 0 {
            let status = if report.changed(&buffer) {
                "would rewrite"
            } else {
                "unchanged"
            };
            println!("{} {}: {}", "✓".green(), file.display(), status);
            total_clean += 1;
        } else {
            for (id, outcome) in &report.outcomes {
                if let Err(error) = outcome {
                    eprintln!("{} {}: {} - {}", "✗".red(), file.display(), id, error);
                }
            }
            total_failed += 1;
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} clean", format!("{}", total_clean).green());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn report_outcomes(
    buffer: &SourceBuffer,
    report: &ScriptReport,
    applied: &mut usize,
    failed: &mut usize,
) {
    for (id, outcome) in &report.outcomes {
        match outcome {
            Ok(EditOutcome::Applied { .. }) => {
                *applied += 1;
            }
            Ok(EditOutcome::NoChange { range }) => {
                println!(
                    "{} {}: no-op at {}",
                    "⊙".yellow(),
                    id,
                    format!("{}:{}", buffer.name(), range).dimmed()
                );
            }
            Err(error) => {
                eprintln!("{} {}: {}", "✗".red(), id, error);
                *failed += 1;
            }
        }
    }
}

/// Show unified diff between original and rewritten content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the file is left untouched.
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent directory: {}", path.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
