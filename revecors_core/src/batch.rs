//! Sequential processing of a directory of models
//!
//! Every model lives in its own subdirectory named after the model. Models are
//! processed in sorted order, and a model which fails is logged and skipped so the
//! rest of the batch still runs.
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::curation::currency::prune_currency;
use crate::curation::{curate_model, CurationRules};
use crate::graph::MetabolicGraph;
use crate::io::locus::load_model;
use crate::io::tables::{CompoundTable, ReferenceTables};
use crate::metabolic_model::model::Model;

/// Step of the processing of a model, reported along with failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Validate,
    Load,
    Curate,
    Graph,
    Write,
    Summary,
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Validate => "validate",
            Step::Load => "load",
            Step::Curate => "curate",
            Step::Graph => "graph",
            Step::Write => "write",
            Step::Summary => "summary",
        };
        write!(f, "{}", name)
    }
}

/// A model which could not be processed
#[derive(Clone, Debug, PartialEq)]
pub struct ModelFailure {
    pub model: String,
    pub step: Step,
    pub path: PathBuf,
    /// The error along with its chain of causes
    pub error: String,
}

/// Outcome of a batch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    /// Models processed successfully, in processing order
    pub processed: Vec<String>,
    pub failures: Vec<ModelFailure>,
}

impl BatchReport {
    /// True when the batch had models and none of them succeeded
    pub fn all_failed(&self) -> bool {
        self.processed.is_empty() && !self.failures.is_empty()
    }

    fn fail(&mut self, model: &str, step: Step, path: &Path, err: &dyn std::error::Error) {
        let failure = ModelFailure {
            model: model.to_string(),
            step,
            path: path.to_path_buf(),
            error: error_chain(err),
        };
        error!(
            "Model {} failed at step {} ({}): {}",
            failure.model,
            failure.step,
            failure.path.display(),
            failure.error
        );
        self.failures.push(failure);
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Gene, metabolite and reaction counts of a model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSummary {
    pub model: String,
    pub genes: usize,
    pub metabolites: usize,
    pub reactions: usize,
    /// Only recorded by the curation pass
    pub balanced: Option<bool>,
}

impl ModelSummary {
    pub fn new(id: &str, model: &Model, balanced: Option<bool>) -> Self {
        let (genes, metabolites, reactions) = model.counts();
        ModelSummary {
            model: id.to_string(),
            genes,
            metabolites,
            reactions,
            balanced,
        }
    }
}

/// Layout of the summary table written by each pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryFormat {
    /// `modelStats.tsv`, with a balanced column
    Curation,
    /// `prunedModelStats.tsv`
    Pruning,
    /// `ModelStatistics.txt`, comma separated
    Graph,
}

impl SummaryFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            SummaryFormat::Curation => "modelStats.tsv",
            SummaryFormat::Pruning => "prunedModelStats.tsv",
            SummaryFormat::Graph => "ModelStatistics.txt",
        }
    }

    fn delimiter(&self) -> &'static str {
        match self {
            SummaryFormat::Graph => ",",
            _ => "\t",
        }
    }

    fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["Model", "Genes", "Metabolites", "Reactions"];
        if *self == SummaryFormat::Curation {
            columns.push("Balanced");
        }
        columns
    }

    fn row(&self, summary: &ModelSummary) -> String {
        let mut fields = vec![
            summary.model.clone(),
            summary.genes.to_string(),
            summary.metabolites.to_string(),
            summary.reactions.to_string(),
        ];
        if *self == SummaryFormat::Curation {
            fields.push(if summary.balanced.unwrap_or(false) { "1" } else { "0" }.to_string());
        }
        fields.join(self.delimiter())
    }
}

/// Summary table receiving one row per model, flushed as soon as it is written
pub struct SummaryWriter {
    file: File,
    path: PathBuf,
    format: SummaryFormat,
}

impl SummaryWriter {
    /// Create the summary table in `dir` and write its header
    pub fn create<P: AsRef<Path>>(dir: P, format: SummaryFormat) -> Result<Self, BatchError> {
        let path = dir.as_ref().join(format.file_name());
        let file = File::create(&path).map_err(|source| BatchError::Summary {
            path: path.clone(),
            source,
        })?;
        let mut writer = SummaryWriter { file, path, format };
        let header = format.columns().join(format.delimiter());
        writer.write_line(&header)?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, summary: &ModelSummary) -> Result<(), BatchError> {
        let row = self.format.row(summary);
        self.write_line(&row)
    }

    fn write_line(&mut self, line: &str) -> Result<(), BatchError> {
        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.flush())
            .map_err(|source| BatchError::Summary {
                path: self.path.clone(),
                source,
            })
    }
}

/// Names of the model subdirectories of `dir`, sorted
pub fn discover_models<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, BatchError> {
    let dir = dir.as_ref();
    let discover_err = |source| BatchError::Discover {
        path: dir.to_path_buf(),
        source,
    };
    let mut models = Vec::new();
    for entry in fs::read_dir(dir).map_err(discover_err)? {
        let entry = entry.map_err(discover_err)?;
        if entry.file_type().map_err(discover_err)?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                models.push(name.to_string());
            }
        }
    }
    models.sort();
    Ok(models)
}

fn model_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(id).join(format!("{}.json", id))
}

fn compound_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(id).join(format!("{}Compounds.tsv", id))
}

fn create_dir(path: &Path) -> Result<(), BatchError> {
    fs::create_dir_all(path).map_err(|source| BatchError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Directories used by a batch
#[derive(Clone, Debug)]
pub struct BatchDirs {
    /// Raw models as downloaded, one subdirectory per model
    pub raw: PathBuf,
    /// Curated and pruned models, one subdirectory per model
    pub processed: PathBuf,
    /// Reference tables
    pub reference: PathBuf,
    /// Summary tables
    pub summary: PathBuf,
}

/// Load, curate and write every raw model
///
/// Reference tables are read before any model is processed, and compound tables of
/// all models are validated up front. Models whose compound table is unusable are
/// reported and skipped.
pub fn run_curation(dirs: &BatchDirs, rules: &CurationRules) -> Result<BatchReport, BatchError> {
    let tables = ReferenceTables::from_dir(&dirs.reference)?;
    let models = discover_models(&dirs.raw)?;
    create_dir(&dirs.summary)?;
    let mut summary = SummaryWriter::create(&dirs.summary, SummaryFormat::Curation)?;
    let mut report = BatchReport::default();

    let mut valid = Vec::with_capacity(models.len());
    for id in models {
        let path = compound_path(&dirs.raw, &id);
        match CompoundTable::validate(&path) {
            Ok(()) => valid.push(id),
            Err(err) => report.fail(&id, Step::Validate, &path, &err),
        }
    }

    let total = valid.len();
    for (i, id) in valid.iter().enumerate() {
        info!("Processing model {}, {} of {}", id, i + 1, total);
        let raw_path = model_path(&dirs.raw, id);
        let mut model = match load_model(&raw_path, id) {
            Ok(model) => model,
            Err(err) => {
                report.fail(id, Step::Load, &raw_path, &err);
                continue;
            }
        };
        let compounds_path = compound_path(&dirs.raw, id);
        let compounds = match CompoundTable::read(&compounds_path) {
            Ok(compounds) => compounds,
            Err(err) => {
                report.fail(id, Step::Load, &compounds_path, &err);
                continue;
            }
        };
        let outcome = match curate_model(&mut model, &tables, &compounds, rules) {
            Ok(outcome) => outcome,
            Err(err) => {
                report.fail(id, Step::Curate, &raw_path, &err);
                continue;
            }
        };
        if !outcome.balanced {
            warn!("Model {} has unbalanced reactions", id);
        }
        let out_path = model_path(&dirs.processed, id);
        if let Err(err) = create_dir(&dirs.processed.join(id)) {
            report.fail(id, Step::Write, &out_path, &err);
            continue;
        }
        if let Err(err) = model.write_json(&out_path) {
            report.fail(id, Step::Write, &out_path, &err);
            continue;
        }
        if let Err(err) = summary.append(&ModelSummary::new(id, &model, Some(outcome.balanced))) {
            report.fail(id, Step::Summary, summary.path(), &err);
            continue;
        }
        report.processed.push(id.clone());
    }
    Ok(report)
}

/// Prune currency metabolites from every curated model, overwriting it
pub fn run_pruning<P, Q, R>(
    processed: P,
    reference: Q,
    summary_dir: R,
    rules: &CurationRules,
) -> Result<BatchReport, BatchError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let processed = processed.as_ref();
    let tables = ReferenceTables::from_dir(reference)?;
    let models = discover_models(processed)?;
    create_dir(summary_dir.as_ref())?;
    let mut summary = SummaryWriter::create(summary_dir, SummaryFormat::Pruning)?;
    let mut report = BatchReport::default();
    let total = models.len();
    for (i, id) in models.iter().enumerate() {
        info!("Processing model {}, {} of {}", id, i + 1, total);
        let path = model_path(processed, id);
        let mut model = match Model::read_json(&path) {
            Ok(model) => model,
            Err(err) => {
                report.fail(id, Step::Load, &path, &err);
                continue;
            }
        };
        prune_currency(&mut model, &tables, rules);
        if let Err(err) = model.write_json(&path) {
            report.fail(id, Step::Write, &path, &err);
            continue;
        }
        if let Err(err) = summary.append(&ModelSummary::new(id, &model, None)) {
            report.fail(id, Step::Summary, summary.path(), &err);
            continue;
        }
        report.processed.push(id.clone());
    }
    Ok(report)
}

/// Write the adjacency and reaction edge lists of every processed model
pub fn run_graph<P, Q>(processed: P, summary_dir: Q) -> Result<BatchReport, BatchError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let processed = processed.as_ref();
    let models = discover_models(processed)?;
    create_dir(summary_dir.as_ref())?;
    let mut summary = SummaryWriter::create(summary_dir, SummaryFormat::Graph)?;
    let mut report = BatchReport::default();
    let total = models.len();
    for (i, id) in models.iter().enumerate() {
        info!("Processing model {}, {} of {}", id, i + 1, total);
        let path = model_path(processed, id);
        let mut model = match Model::read_json(&path) {
            Ok(model) => model,
            Err(err) => {
                report.fail(id, Step::Load, &path, &err);
                continue;
            }
        };
        model.id = Some(id.clone());
        let graph = MetabolicGraph::from_model(&model);
        if let Err(err) = graph.write(processed.join(id), id) {
            report.fail(id, Step::Graph, &processed.join(id), &err);
            continue;
        }
        if let Err(err) = summary.append(&ModelSummary::new(id, &model, None)) {
            report.fail(id, Step::Summary, summary.path(), &err);
            continue;
        }
        report.processed.push(id.clone());
    }
    Ok(report)
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Unable to list models in {path}")]
    Discover {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to create directory {path}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to write summary table {path}")]
    Summary {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to load reference tables")]
    Tables(#[from] crate::io::tables::TableError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data")
    }

    /// Lay out a raw directory holding the toy model under `id`
    fn setup(root: &Path, ids: &[&str]) -> BatchDirs {
        let dirs = BatchDirs {
            raw: root.join("raw"),
            processed: root.join("processed"),
            reference: test_data().join("reference"),
            summary: root.join("summary"),
        };
        for id in ids {
            let model_dir = dirs.raw.join(id);
            fs::create_dir_all(&model_dir).unwrap();
            let model = fs::read_to_string(test_data().join("test_models").join("toy_kbase.json"))
                .unwrap()
                .replace("Org.genome", &format!("{}.genome", id));
            fs::write(model_path(&dirs.raw, id), model).unwrap();
            fs::copy(
                test_data().join("test_models").join("OrgCompounds.tsv"),
                compound_path(&dirs.raw, id),
            )
            .unwrap();
        }
        dirs
    }

    #[test]
    fn discover_sorted_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b", "a", "c"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        assert_eq!(discover_models(dir.path()).unwrap(), vec!["a", "b", "c"]);
        assert!(discover_models(dir.path().join("missing")).is_err());
    }

    #[test]
    fn summary_rows() {
        let summary = ModelSummary {
            model: "Org".to_string(),
            genes: 2,
            metabolites: 6,
            reactions: 1,
            balanced: Some(true),
        };
        assert_eq!(SummaryFormat::Curation.row(&summary), "Org\t2\t6\t1\t1");
        assert_eq!(SummaryFormat::Pruning.row(&summary), "Org\t2\t6\t1");
        assert_eq!(SummaryFormat::Graph.row(&summary), "Org,2,6,1");
    }

    #[test]
    fn curate_prune_and_graph() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = setup(dir.path(), &["Org"]);
        let rules = CurationRules::default();

        let report = run_curation(&dirs, &rules).unwrap();
        assert_eq!(report.processed, vec!["Org"]);
        assert!(report.failures.is_empty());
        let curated = Model::read_json(model_path(&dirs.processed, "Org")).unwrap();
        assert_eq!(curated.id.as_deref(), Some("Org"));
        assert_eq!(curated.reactions.len(), 1);
        let rxn = &curated.reactions["rxn05893_c"];
        assert_eq!(
            rxn.build_reaction_string(),
            rules.stoichiometry_overrides["rxn05893_c0"].replace("_c0", "_c")
        );
        assert_eq!(rxn.name.as_deref(), Some("Ferredoxin nitrite reductase"));
        assert!(curated.genes.contains_key("Org_CDS_12"));
        assert!(!curated.genes.contains_key("Unknown"));
        assert_eq!(curated.compartments.as_ref().unwrap()["c"], "Cytosol");
        let stats = fs::read_to_string(dirs.summary.join("modelStats.tsv")).unwrap();
        assert_eq!(
            stats,
            "Model\tGenes\tMetabolites\tReactions\tBalanced\nOrg\t2\t6\t1\t1\n"
        );

        let report = run_pruning(&dirs.processed, &dirs.reference, &dirs.summary, &rules).unwrap();
        assert_eq!(report.processed, vec!["Org"]);
        let pruned = Model::read_json(model_path(&dirs.processed, "Org")).unwrap();
        assert_eq!(
            pruned.reactions["rxn05893_c"].build_reaction_string(),
            "2.0 cpd00013_c <=> 2.0 cpd00075_c"
        );
        let stats = fs::read_to_string(dirs.summary.join("prunedModelStats.tsv")).unwrap();
        assert_eq!(stats, "Model\tGenes\tMetabolites\tReactions\nOrg\t2\t2\t1\n");

        let report = run_graph(&dirs.processed, &dirs.summary).unwrap();
        assert_eq!(report.processed, vec!["Org"]);
        let edges = fs::read_to_string(dirs.processed.join("Org").join("OrgRxnEdges.txt")).unwrap();
        assert_eq!(
            edges,
            "cpd00013_c\tcpd00075_c\trxn05893_c\ncpd00075_c\tcpd00013_c\trxn05893_c\n"
        );
        let adjacency = fs::read_to_string(dirs.processed.join("Org").join("OrgAdjList.txt")).unwrap();
        assert_eq!(adjacency, "cpd00013_c\tcpd00075_c\ncpd00075_c\tcpd00013_c\n");
        let stats = fs::read_to_string(dirs.summary.join("ModelStatistics.txt")).unwrap();
        assert_eq!(stats, "Model,Genes,Metabolites,Reactions\nOrg,2,2,1\n");
    }

    #[test]
    fn failing_model_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = setup(dir.path(), &["Alpha", "Beta", "Gamma"]);
        fs::remove_file(compound_path(&dirs.raw, "Alpha")).unwrap();
        fs::write(model_path(&dirs.raw, "Gamma"), "{ not json").unwrap();

        let report = run_curation(&dirs, &CurationRules::default()).unwrap();
        assert_eq!(report.processed, vec!["Beta"]);
        assert!(!report.all_failed());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].model, "Alpha");
        assert_eq!(report.failures[0].step, Step::Validate);
        assert_eq!(report.failures[1].model, "Gamma");
        assert_eq!(report.failures[1].step, Step::Load);
        assert_eq!(report.failures[1].path, model_path(&dirs.raw, "Gamma"));
        let stats = fs::read_to_string(dirs.summary.join("modelStats.tsv")).unwrap();
        assert_eq!(stats.lines().count(), 2);
    }

    #[test]
    fn failed_graph_write_leaves_no_summary_row() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = setup(dir.path(), &["Alpha", "Beta"]);
        run_curation(&dirs, &CurationRules::default()).unwrap();
        let blocked = dirs.processed.join("Alpha").join("AlphaAdjList.txt");
        fs::create_dir_all(blocked.join("occupied")).unwrap();

        let report = run_graph(&dirs.processed, &dirs.summary).unwrap();
        assert_eq!(report.processed, vec!["Beta"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].model, "Alpha");
        assert_eq!(report.failures[0].step, Step::Graph);
        let stats = fs::read_to_string(dirs.summary.join("ModelStatistics.txt")).unwrap();
        assert_eq!(stats, "Model,Genes,Metabolites,Reactions\nBeta,2,6,1\n");
    }

    #[test]
    fn missing_reference_tables_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut dirs = setup(dir.path(), &["Org"]);
        dirs.reference = dir.path().join("no_reference");
        assert!(matches!(
            run_curation(&dirs, &CurationRules::default()),
            Err(BatchError::Tables(_))
        ));
    }

    #[test]
    fn all_failed() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = setup(dir.path(), &["Org"]);
        fs::remove_file(compound_path(&dirs.raw, "Org")).unwrap();
        let report = run_curation(&dirs, &CurationRules::default()).unwrap();
        assert!(report.all_failed());
        assert!(!BatchReport::default().all_failed());
    }
}
