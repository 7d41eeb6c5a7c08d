//! Conversion of a curated model into a directed metabolite graph
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::io::write_atomically;
use crate::metabolic_model::model::Model;

/// A directed edge from a reactant to a product, labelled with its reaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionEdge {
    pub source: String,
    pub target: String,
    pub reaction: String,
}

/// Adjacency rows and reaction labelled edges derived from a model
///
/// Each row lists a reactant followed by every product of one reaction. Reversible
/// reactions contribute rows and edges in both directions. Rows and edges are not
/// deduplicated across reactions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetabolicGraph {
    pub adjacency: Vec<Vec<String>>,
    pub edges: Vec<ReactionEdge>,
}

impl MetabolicGraph {
    pub fn from_model(model: &Model) -> Self {
        let mut graph = MetabolicGraph::default();
        for rxn in model.reactions.values() {
            let reactants = rxn.reactants();
            let products = rxn.products();
            graph.connect(&reactants, &products, &rxn.id);
            if rxn.is_reversible() {
                graph.connect(&products, &reactants, &rxn.id);
            }
        }
        graph
    }

    fn connect(&mut self, sources: &[&str], targets: &[&str], reaction: &str) {
        for source in sources {
            let mut row = Vec::with_capacity(targets.len() + 1);
            row.push(source.to_string());
            row.extend(targets.iter().map(|t| t.to_string()));
            self.adjacency.push(row);
            self.edges.extend(targets.iter().map(|target| ReactionEdge {
                source: source.to_string(),
                target: target.to_string(),
                reaction: reaction.to_string(),
            }));
        }
    }

    /// Adjacency list text, one tab separated row per line
    pub fn adjacency_text(&self) -> String {
        self.adjacency
            .iter()
            .map(|row| format!("{}\n", row.join("\t")))
            .collect()
    }

    /// Edge list text, one `source<TAB>target<TAB>reaction` line per edge
    pub fn edge_text(&self) -> String {
        self.edges
            .iter()
            .map(|e| format!("{}\t{}\t{}\n", e.source, e.target, e.reaction))
            .collect()
    }

    /// Write `<id>AdjList.txt` and `<id>RxnEdges.txt` into `dir`
    ///
    /// # Returns
    /// The paths of the adjacency list and edge list files
    pub fn write<P: AsRef<Path>>(&self, dir: P, id: &str) -> Result<(PathBuf, PathBuf), GraphError> {
        let dir = dir.as_ref();
        let adjacency = dir.join(format!("{}AdjList.txt", id));
        let edges = dir.join(format!("{}RxnEdges.txt", id));
        for (path, text) in [(&adjacency, self.adjacency_text()), (&edges, self.edge_text())] {
            write_atomically(path, text.as_bytes()).map_err(|source| GraphError::Write {
                path: path.clone(),
                source,
            })?;
        }
        debug!(
            "Wrote {} adjacency rows and {} edges for {}",
            self.adjacency.len(),
            self.edges.len(),
            id
        );
        Ok((adjacency, edges))
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Unable to write graph file {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
