//! End-to-end remapping of one input against mappings and a classpath.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use remapper_core::{
    DiagnosticReport, DiagnosticSummary, ModuleRole, ModuleSource, Remapper, RemapperConfig,
};
use remapper_mappings::{read_forced_list, MemberKey, TinyMappingLoader};
use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{read_classes, read_entries, write_jar, ArchiveEntry};

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RemapOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mappings: PathBuf,
    pub from: String,
    pub to: String,
    pub classpath: Vec<PathBuf>,
    pub force_propagation: Option<PathBuf>,
    pub config: RemapperConfig,
}

/// Counts of the loaded mapping source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    pub classes: usize,
    pub methods: usize,
    pub fields: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mappings: MappingStats,
    pub forced: usize,
    pub classes: usize,
    pub classpath_classes: usize,
    pub resources: usize,
    pub closures: usize,
    pub inferred: usize,
    pub frames_removed: usize,
    pub diagnostics: DiagnosticSummary,
    #[serde(skip)]
    pub report: DiagnosticReport,
    pub elapsed_ms: f64,
}

/// Remap `options.input` into `options.output`.
///
/// Class entries are written at their remapped path; every other entry is
/// copied unchanged. Entries keep their input order.
pub fn remap(options: &RemapOptions) -> Result<RunSummary> {
    let started = Instant::now();

    let forced: IndexSet<MemberKey> = match &options.force_propagation {
        Some(path) => read_forced_list(path)
            .with_context(|| format!("Can't read forcePropagation file {}", path.display()))?,
        None => IndexSet::new(),
    };
    let loader = TinyMappingLoader::from_path(&options.mappings, &options.from, &options.to);
    let remapper = Remapper::new(options.config.clone(), &loader, forced)
        .with_context(|| format!("Can't read mappings file {}", options.mappings.display()))?;
    let table = remapper.table();
    let mappings = MappingStats {
        classes: table.class_count(),
        methods: table.method_count(),
        fields: table.field_count(),
    };
    let forced = table.forced_members().len();

    let entries = read_entries(&options.input)
        .with_context(|| format!("Can't read input file {}", options.input.display()))?;
    let inputs: Vec<ModuleSource> = entries
        .iter()
        .filter(|entry| entry.is_class())
        .map(ArchiveEntry::to_module)
        .collect();
    let mut classpath = Vec::new();
    for (index, path) in options.classpath.iter().enumerate() {
        classpath.extend(read_classes(path).with_context(|| {
            format!("Can't read classpath file {index}: {}", path.display())
        })?);
    }
    let classpath_classes = classpath.len();

    let mut session = remapper.start()?;
    session.ingest_all(classpath, ModuleRole::Classpath)?;
    let input_paths: Vec<String> = inputs.iter().map(|m| m.name.clone()).collect();
    let class_names = session.ingest_all(inputs, ModuleRole::RewriteTarget)?;
    let class_of: HashMap<&str, &str> = input_paths
        .iter()
        .map(String::as_str)
        .zip(class_names.iter().map(String::as_str))
        .collect();

    let remapper = session.finalize_mappings();
    let (closures, inferred) = (remapper.closures(), remapper.inferred());
    let (rewritten, report) = match remapper.rewrite_all().into_result() {
        Ok(done) => done,
        Err(failure) => {
            for diagnostic in failure.report.iter().filter(|d| d.is_incomplete_classpath()) {
                warn!("{diagnostic}");
            }
            let summary = &failure.report.summary;
            warn!(
                ambiguous = summary.ambiguous_mappings,
                unresolved = summary.unresolved_symbols,
                incomplete = summary.incomplete_classpath,
                "remapping aborted, no output written"
            );
            return Err(failure.into());
        }
    };
    let by_name: HashMap<&str, _> = rewritten
        .iter()
        .map(|class| (class.original_name.as_str(), class))
        .collect();

    let mut output = Vec::with_capacity(entries.len());
    let mut resources = 0usize;
    for entry in &entries {
        let class = class_of
            .get(entry.path.as_str())
            .and_then(|name| by_name.get(name));
        match class {
            Some(class) => output.push(ArchiveEntry::new(
                ArchiveEntry::class_path(&class.name),
                class.bytes.clone(),
            )),
            None => {
                resources += 1;
                output.push(entry.clone());
            }
        }
    }
    write_jar(&options.output, &output)
        .with_context(|| format!("Can't write output file {}", options.output.display()))?;

    let summary = RunSummary {
        mappings,
        forced,
        classes: rewritten.len(),
        classpath_classes,
        resources,
        closures,
        inferred,
        frames_removed: rewritten.iter().map(|c| c.frames_removed).sum(),
        diagnostics: report.summary,
        report,
        elapsed_ms: started.elapsed().as_secs_f64() * 1e3,
    };
    info!(
        classes = summary.classes,
        resources = summary.resources,
        elapsed_ms = summary.elapsed_ms,
        "remap finished"
    );
    Ok(summary)
}
