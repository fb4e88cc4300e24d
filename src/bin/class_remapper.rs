//! class-remapper: apply Tiny mappings to a jar.
//!
//! ```bash
//! class-remapper input.jar output.jar mappings.tiny official named lib.jar
//! class-remapper input.jar output.jar mappings.tiny official named --removeFrames
//! class-remapper classes/ output.jar mappings.tiny official named --json
//! ```

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use class_remapper::{remap, RemapOptions, RunSummary};
use remapper_core::{RemapperConfig, RewriteFailure};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "class-remapper",
    author,
    version,
    about = "Rename classes, fields and methods in compiled JVM classes",
    override_usage = "class-remapper <input> <output> <mappings> <from> <to> [<classpath>]... \
                      [--reverse] [--forcePropagation=<file>] [--propagatePrivate] [--removeFrames]"
)]
struct Cli {
    /// Jar, class directory or single .class file to remap
    input: PathBuf,

    /// Output jar
    output: PathBuf,

    /// Tiny v1 mappings file
    mappings: PathBuf,

    /// Namespace the input is in
    from: String,

    /// Namespace to remap to
    to: String,

    /// Jars or directories providing classes that are not remapped
    classpath: Vec<PathBuf>,

    /// Reverse the mapping direction (accepted, not implemented)
    #[arg(long)]
    reverse: bool,

    /// File listing members that always share a name with their overrides
    #[arg(
        long = "forcePropagation",
        alias = "force-propagation",
        alias = "forcepropagation",
        value_name = "FILE"
    )]
    force_propagation: Option<PathBuf>,

    /// Propagate names to private methods too
    #[arg(long = "propagatePrivate", alias = "propagate-private", alias = "propagateprivate")]
    propagate_private: bool,

    /// Drop StackMapTable attributes
    #[arg(long = "removeFrames", alias = "remove-frames", alias = "removeframes")]
    remove_frames: bool,

    /// Worker threads (default: available parallelism)
    #[arg(long, env = "REMAPPER_THREADS", value_name = "N")]
    threads: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    let diagnostics = &summary.diagnostics;
    println!(
        "mappings: {} classes, {} methods, {} fields",
        summary.mappings.classes, summary.mappings.methods, summary.mappings.fields
    );
    println!(
        "remapped {} classes, copied {} resources ({} inferred names, {} ambiguous, {} unresolved)",
        summary.classes,
        summary.resources,
        summary.inferred,
        diagnostics.ambiguous_mappings,
        diagnostics.unresolved_symbols
    );
    println!("Finished after {:.2} ms.", summary.elapsed_ms);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.reverse {
        warn!("--reverse is not currently implemented");
        eprintln!("WARNING: --reverse is not currently implemented!");
    }
    ensure!(
        cli.input.exists(),
        "Can't read input file {}.",
        cli.input.display()
    );
    ensure!(
        cli.mappings.is_file(),
        "Can't read mappings file {}.",
        cli.mappings.display()
    );
    for (index, path) in cli.classpath.iter().enumerate() {
        ensure!(
            path.exists(),
            "Can't read classpath file {index}: {}.",
            path.display()
        );
    }

    let options = RemapOptions {
        input: cli.input,
        output: cli.output,
        mappings: cli.mappings,
        from: cli.from,
        to: cli.to,
        classpath: cli.classpath,
        force_propagation: cli.force_propagation,
        config: RemapperConfig::default()
            .with_propagate_private(cli.propagate_private)
            .with_remove_frames(cli.remove_frames)
            .with_threads(cli.threads),
    };
    match remap(&options) {
        Ok(summary) => print_summary(&summary, cli.json),
        Err(err) => {
            if let (true, Some(failure)) = (cli.json, err.downcast_ref::<RewriteFailure>()) {
                let aborted = serde_json::json!({
                    "error": failure.error.to_string(),
                    "report": failure.report,
                });
                println!("{}", serde_json::to_string_pretty(&aborted)?);
            }
            Err(err)
        }
    }
}
