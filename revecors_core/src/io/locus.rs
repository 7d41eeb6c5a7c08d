//! Rewriting of KBase gene locus identifiers in raw model files
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

use crate::io::json::JsonError;
use crate::io::write_atomically;
use crate::metabolic_model::model::Model;

/// Rewrite `<name>.genome.CDS.<n>` and the legacy `kb|g.<g>.CDS.<n>` loci to `<name>_CDS_<n>`
///
/// Returns the rewritten text along with the number of loci that were replaced.
pub fn rewrite_loci(text: &str, name: &str) -> Result<(String, usize), regex::Error> {
    let patterns = [
        format!(r"{}\.genome\.CDS\.(\d+)", regex::escape(name)),
        r"kb\|g\.\d+\.CDS\.(\d+)".to_string(),
    ];
    let mut rewritten = text.to_string();
    let mut count = 0;
    for pattern in patterns {
        let re = Regex::new(&pattern)?;
        count += re.find_iter(&rewritten).count();
        rewritten = re
            .replace_all(&rewritten, |caps: &Captures| format!("{}_CDS_{}", name, &caps[1]))
            .into_owned();
    }
    Ok((rewritten, count))
}

/// Rewrite the gene loci of a model file in place
///
/// The file is only replaced when at least one locus was rewritten.
pub fn rewrite_gene_loci<P: AsRef<Path>>(path: P, name: &str) -> Result<usize, LocusError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LocusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (rewritten, count) = rewrite_loci(&text, name)?;
    if count > 0 {
        write_atomically(path, rewritten.as_bytes()).map_err(|source| LocusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    debug!("Rewrote {} gene loci in {}", count, path.display());
    Ok(count)
}

/// Normalize the gene loci of a raw model file, then load it under its canonical name
pub fn load_model<P: AsRef<Path>>(path: P, name: &str) -> Result<Model, LocusError> {
    let path = path.as_ref();
    rewrite_gene_loci(path, name)?;
    let mut model = Model::read_json(path).map_err(|source| LocusError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    model.id = Some(name.to_string());
    Ok(model)
}

#[derive(Debug, Error)]
pub enum LocusError {
    #[error("Unable to rewrite gene loci of {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid locus pattern")]
    Pattern(#[from] regex::Error),
    #[error("Unable to load model {path}")]
    Json { path: PathBuf, source: JsonError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_both_locus_forms() {
        let text = r#""gene_reaction_rule": "Org.genome.CDS.12 or kb|g.3562.CDS.7""#;
        let (rewritten, count) = rewrite_loci(text, "Org").unwrap();
        assert_eq!(count, 2);
        assert_eq!(rewritten, r#""gene_reaction_rule": "Org_CDS_12 or Org_CDS_7""#);
    }

    #[test]
    fn name_is_matched_literally() {
        let (rewritten, count) = rewrite_loci("OrgXgenome.CDS.1 Org.1.genome.CDS.2", "Org.1").unwrap();
        assert_eq!(count, 1);
        assert_eq!(rewritten, "OrgXgenome.CDS.1 Org.1_CDS_2");
    }

    #[test]
    fn name_is_inserted_verbatim() {
        let (rewritten, count) = rewrite_loci("Org$1.genome.CDS.4", "Org$1").unwrap();
        assert_eq!(count, 1);
        assert_eq!(rewritten, "Org$1_CDS_4");
    }

    #[test]
    fn no_match_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Org.json");
        fs::write(&path, "Other.genome.CDS.1").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(rewrite_gene_loci(&path, "Org").unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Other.genome.CDS.1");
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn load_sets_canonical_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Org.json");
        let raw = r#"{"id":"kb|fm.1","metabolites":[{"id":"cpd00001_c0","compartment":"c0"}],
"genes":[{"id":"Org.genome.CDS.5"}],
"reactions":[{"id":"rxn00001_c0","metabolites":{"cpd00001_c0":-1.0},
"lower_bound":-1000.0,"upper_bound":1000.0,"gene_reaction_rule":"Org.genome.CDS.5"}]}"#;
        fs::write(&path, raw).unwrap();
        let model = load_model(&path, "Org").unwrap();
        assert_eq!(model.id.as_deref(), Some("Org"));
        assert!(model.genes.contains_key("Org_CDS_5"));
        assert_eq!(model.reactions["rxn00001_c0"].gene_reaction_rule(), "Org_CDS_5");
        assert!(fs::read_to_string(&path).unwrap().contains("Org_CDS_5"));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_model("does/not/exist.json", "Org"),
            Err(LocusError::Io { .. })
        ));
    }
}
