//! The three-phase remapping run.
//!
//! ```text
//!   Remapper ──start()──▶ IngestSession ──finalize_mappings()──▶ FinalizedRemapper
//!   (config + table)      ingest / ingest_all                    rewrite / rewrite_all
//! ```
//!
//! Each transition consumes the previous stage, so ingest cannot overlap
//! propagation and nothing mutates the mapping table once rewriting starts.
//! Classpath modules only feed the hierarchy; their parsed form is dropped
//! during ingest.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use remapper_classfile::ClassFile;
use remapper_mappings::{MappingLoader, MappingTable, MemberKey};
use tracing::{debug, info, warn};

use crate::config::RemapperConfig;
use crate::diagnostics::{Diagnostic, DiagnosticReport};
use crate::errors::{RemapError, Result, RewriteFailure};
use crate::hierarchy::{ClassHierarchy, ClassNode, HierarchyBuilder, ModuleRole};
use crate::propagation::propagate;
use crate::rewriter::{RewrittenClass, Rewriter};

/// A named chunk of class file bytes (jar entry, file path, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ModuleSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A configured engine holding the explicit mapping table.
#[derive(Debug, Clone)]
pub struct Remapper {
    config: RemapperConfig,
    table: MappingTable,
}

impl Remapper {
    /// Load mappings from `loader` and combine them with the forced list.
    pub fn new(
        config: RemapperConfig,
        loader: &impl MappingLoader,
        forced: IndexSet<MemberKey>,
    ) -> Result<Self> {
        let set = loader.load_mappings()?;
        let table = MappingTable::new(set, forced);
        info!(
            classes = table.class_count(),
            methods = table.method_count(),
            fields = table.field_count(),
            forced = table.forced_members().len(),
            "mappings loaded"
        );
        Ok(Self::from_table(config, table))
    }

    pub fn from_table(config: RemapperConfig, table: MappingTable) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &RemapperConfig {
        &self.config
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Build the worker pool and open the ingest phase.
    pub fn start(self) -> Result<IngestSession> {
        let threads = self.config.thread_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("remap-worker-{index}"))
            .build()
            .map_err(|e| RemapError::ThreadPool(e.to_string()))?;
        debug!(threads, "worker pool ready");
        Ok(IngestSession {
            config: self.config,
            table: self.table,
            pool,
            graph: HierarchyBuilder::new(),
            targets: IndexMap::new(),
        })
    }
}

/// Phase 1: modules are parsed and registered in the hierarchy.
pub struct IngestSession {
    config: RemapperConfig,
    table: MappingTable,
    pool: ThreadPool,
    graph: HierarchyBuilder,
    /// Rewrite-set classes in ingest order.
    targets: IndexMap<String, ClassFile>,
}

impl IngestSession {
    /// Parse and register one module. Returns its class name.
    pub fn ingest(&mut self, module: ModuleSource, role: ModuleRole) -> Result<String> {
        let (name, class) = ingest_one(&self.graph, module, role)?;
        if let Some(class) = class {
            self.targets.insert(name.clone(), class);
        }
        Ok(name)
    }

    /// Parse and register `modules` on the worker pool.
    ///
    /// Every module is attempted; the first failure in input order is
    /// returned. Rewrite-set classes keep the input order.
    pub fn ingest_all(&mut self, modules: Vec<ModuleSource>, role: ModuleRole) -> Result<Vec<String>> {
        let count = modules.len();
        let graph = &self.graph;
        let results: Vec<Result<(String, Option<ClassFile>)>> = self.pool.install(|| {
            modules
                .into_par_iter()
                .map(|module| ingest_one(graph, module, role))
                .collect()
        });

        let mut names = Vec::with_capacity(count);
        for result in results {
            let (name, class) = result?;
            if let Some(class) = class {
                self.targets.insert(name.clone(), class);
            }
            names.push(name);
        }
        info!(modules = count, ?role, "ingested");
        Ok(names)
    }

    /// Number of rewrite-set classes ingested so far.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Close the hierarchy and run propagation.
    pub fn finalize_mappings(self) -> FinalizedRemapper {
        let hierarchy = self.graph.close();
        let mut diagnostics: Vec<Diagnostic> = hierarchy
            .absent_classes()
            .map(|(class_name, referenced_from)| Diagnostic::IncompleteClasspath {
                class_name: class_name.to_string(),
                referenced_from: referenced_from.to_string(),
            })
            .collect();
        for diagnostic in &diagnostics {
            debug!("{diagnostic}");
        }

        let outcome = propagate(&hierarchy, self.table, &self.config);
        diagnostics.extend(outcome.diagnostics);
        info!(
            classes = hierarchy.len(),
            targets = self.targets.len(),
            absent = diagnostics.iter().filter(|d| d.is_incomplete_classpath()).count(),
            "mappings finalized"
        );

        FinalizedRemapper {
            config: self.config,
            pool: self.pool,
            hierarchy,
            table: outcome.table,
            targets: self.targets,
            diagnostics,
            closures: outcome.closures,
            inferred: outcome.inferred,
        }
    }
}

fn ingest_one(
    graph: &HierarchyBuilder,
    module: ModuleSource,
    role: ModuleRole,
) -> Result<(String, Option<ClassFile>)> {
    let malformed = |source| RemapError::MalformedModule {
        module: module.name.clone(),
        source,
    };
    let class = ClassFile::parse(&module.bytes).map_err(malformed)?;
    let node = ClassNode::from_class(&class, role).map_err(malformed)?;
    let name = node.name.clone();
    graph.ingest(node)?;
    debug!(module = %module.name, class = %name, "registered");
    let class = match role {
        ModuleRole::RewriteTarget => Some(class),
        ModuleRole::Classpath => None,
    };
    Ok((name, class))
}

/// Result of rewriting the whole rewrite set.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// Successfully rewritten classes in input order.
    pub classes: Vec<RewrittenClass>,
    /// Fatal per-class failures in input order.
    pub failures: Vec<RemapError>,
    /// Mapping and rewrite diagnostics.
    pub report: DiagnosticReport,
}

impl RewriteOutcome {
    /// The rewritten classes, or the first failure in input order together
    /// with the diagnostics collected so far.
    pub fn into_result(
        self,
    ) -> std::result::Result<(Vec<RewrittenClass>, DiagnosticReport), RewriteFailure> {
        match self.failures.into_iter().next() {
            Some(error) => Err(RewriteFailure {
                error,
                report: self.report,
            }),
            None => Ok((self.classes, self.report)),
        }
    }
}

/// Phases 2 and 3: the completed table is read-only; rewrites can run in any
/// order and in parallel.
pub struct FinalizedRemapper {
    config: RemapperConfig,
    pool: ThreadPool,
    hierarchy: ClassHierarchy,
    table: MappingTable,
    targets: IndexMap<String, ClassFile>,
    /// Diagnostics from closing the hierarchy and from propagation.
    diagnostics: Vec<Diagnostic>,
    closures: usize,
    inferred: usize,
}

impl FinalizedRemapper {
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    pub fn config(&self) -> &RemapperConfig {
        &self.config
    }

    /// Rewrite-set class names in input order.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Closures with more than one member found during propagation.
    pub fn closures(&self) -> usize {
        self.closures
    }

    /// Entries propagation added to the table.
    pub fn inferred(&self) -> usize {
        self.inferred
    }

    /// Diagnostics produced before rewriting: ambiguous mappings and absent
    /// supertypes.
    pub fn conflict_report(&self) -> DiagnosticReport {
        DiagnosticReport::new(self.diagnostics.clone())
    }

    /// Rewrite a single rewrite-set class by its original name.
    pub fn rewrite(&self, name: &str) -> Result<RewrittenClass> {
        let class = self
            .targets
            .get(name)
            .ok_or_else(|| RemapError::UnknownClass {
                name: name.to_string(),
            })?;
        self.rewriter().rewrite(class.clone())
    }

    /// Rewrite every rewrite-set class on the worker pool.
    ///
    /// All classes are attempted even when some fail. Unresolved class names
    /// are reported once, attributed to the first module (in input order)
    /// that references them.
    pub fn rewrite_all(&self) -> RewriteOutcome {
        let rewriter = self.rewriter();
        let classes: Vec<&ClassFile> = self.targets.values().collect();
        let results: Vec<Result<RewrittenClass>> = self.pool.install(|| {
            classes
                .par_iter()
                .map(|class| rewriter.rewrite((*class).clone()))
                .collect()
        });

        let mut diagnostics = self.diagnostics.clone();
        let mut reported: HashSet<String> = HashSet::new();
        let mut rewritten = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(class) => {
                    for missing in &class.unresolved {
                        if reported.insert(missing.clone()) {
                            let diagnostic = Diagnostic::UnresolvedSymbol {
                                class_name: missing.clone(),
                                referenced_from: class.original_name.clone(),
                            };
                            warn!("{diagnostic}");
                            diagnostics.push(diagnostic);
                        }
                    }
                    rewritten.push(class);
                }
                Err(err) => failures.push(err),
            }
        }

        info!(
            rewritten = rewritten.len(),
            failed = failures.len(),
            unresolved = reported.len(),
            "rewrite complete"
        );
        RewriteOutcome {
            classes: rewritten,
            failures,
            report: DiagnosticReport::new(diagnostics),
        }
    }

    fn rewriter(&self) -> Rewriter<'_> {
        Rewriter::new(&self.hierarchy, &self.table, &self.config)
    }
}
