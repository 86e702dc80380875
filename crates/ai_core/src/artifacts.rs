//! Persisted model artifacts
//!
//! A trained model is written as three files in one directory:
//!
//! - `model.json`: canonical JSON of the [`Model`]
//! - `model.hash`: blake3 hex digest of the `model.json` bytes
//! - `columns.json`: canonical JSON array of column names
//!
//! Loading is all-or-nothing. The column list must be the one the model was
//! trained against (same width, same canonical digest).

use psp_types::Transaction;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::ArtifactError;
use crate::features::{encode, ColumnList};
use crate::gbdt::Model;
use crate::serde_canon::{digest_hex, to_canonical_json};

pub const MODEL_FILE: &str = "model.json";
pub const COLUMNS_FILE: &str = "columns.json";
pub const HASH_FILE: &str = "model.hash";

/// Locations of the three artifact files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub columns: PathBuf,
    /// Optional on load: verified only when present
    pub hash: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            columns: dir.join(COLUMNS_FILE),
            hash: dir.join(HASH_FILE),
        }
    }
}

/// Digests of a saved artifact set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDigest {
    pub model_hash: String,
    pub columns_hash: String,
}

/// A classifier together with the column list it was trained against
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    model: Model,
    columns: ColumnList,
}

impl ModelArtifacts {
    pub fn new(model: Model, columns: ColumnList) -> Result<Self, ArtifactError> {
        check_pairing(&model, &columns)?;
        Ok(Self { model, columns })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn columns(&self) -> &ColumnList {
        &self.columns
    }

    /// Encode `txn` with the persisted column list and score it.
    pub fn predict_proba(&self, txn: &Transaction) -> f64 {
        let features = encode(txn, &self.columns);
        self.model.predict_proba(&features)
    }

    pub fn save(&self, paths: &ArtifactPaths) -> Result<ArtifactDigest, ArtifactError> {
        for path in [&paths.model, &paths.columns, &paths.hash] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let columns_json = to_canonical_json(&self.columns)?;
        write_file(&paths.columns, &columns_json)?;

        let model_json = self
            .model
            .to_canonical_json()
            .map_err(|source| ArtifactError::InvalidModel {
                path: paths.model.clone(),
                source,
            })?;
        write_file(&paths.model, &model_json)?;

        let model_hash = digest_hex(model_json.as_bytes());
        write_file(&paths.hash, &model_hash)?;

        info!(
            model = %paths.model.display(),
            columns = %paths.columns.display(),
            model_hash = %model_hash,
            "saved model artifacts"
        );

        Ok(ArtifactDigest {
            model_hash,
            columns_hash: self.model.metadata.columns_hash.clone(),
        })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let model_json = read_required(&paths.model)?;
        let columns_json = read_required(&paths.columns)?;

        match fs::read_to_string(&paths.hash) {
            Ok(expected) => {
                let expected = expected.trim().to_string();
                let actual = digest_hex(model_json.as_bytes());
                if expected != actual {
                    return Err(ArtifactError::IntegrityMismatch {
                        path: paths.model.clone(),
                        expected,
                        actual,
                    });
                }
                debug!(model_hash = %actual, "model digest verified");
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    path = %paths.hash.display(),
                    "no model digest file, skipping integrity check"
                );
            }
            Err(source) => {
                return Err(ArtifactError::Io {
                    path: paths.hash.clone(),
                    source,
                })
            }
        }

        let model: Model =
            serde_json::from_str(&model_json).map_err(|source| ArtifactError::Malformed {
                path: paths.model.clone(),
                source,
            })?;
        model
            .validate()
            .map_err(|source| ArtifactError::InvalidModel {
                path: paths.model.clone(),
                source,
            })?;

        let columns: ColumnList =
            serde_json::from_str(&columns_json).map_err(|source| ArtifactError::Malformed {
                path: paths.columns.clone(),
                source,
            })?;

        let artifacts = Self::new(model, columns)?;
        info!(
            trees = artifacts.model.num_trees(),
            columns = artifacts.columns.len(),
            "loaded model artifacts"
        );
        Ok(artifacts)
    }
}

fn check_pairing(model: &Model, columns: &ColumnList) -> Result<(), ArtifactError> {
    if model.feature_count() != columns.len() {
        return Err(ArtifactError::Inconsistent(format!(
            "model expects {} features, column list has {}",
            model.feature_count(),
            columns.len()
        )));
    }

    let digest = columns.hash_hex()?;
    if model.metadata.columns_hash != digest {
        return Err(ArtifactError::Inconsistent(format!(
            "model was trained against column list {}, loaded list is {}",
            display_digest(&model.metadata.columns_hash),
            digest
        )));
    }

    Ok(())
}

fn display_digest(digest: &str) -> &str {
    if digest.is_empty() {
        "<none>"
    } else {
        digest
    }
}

fn read_required(path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ArtifactError::Missing(path.to_path_buf())
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), ArtifactError> {
    fs::write(path, contents).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::{logit, ModelMetadata, Node, Tree};

    fn artifacts() -> ModelArtifacts {
        let columns = ColumnList::from_names(["amount", "app_GooglePay", "app_PhonePe"]).unwrap();
        let tree = Tree::new(
            vec![
                Node::internal(0, 1, 0.5, 1, 2),
                Node::leaf(1, 0.0),
                Node::leaf(2, 1.0),
            ],
            1.0,
        );
        let metadata = ModelMetadata {
            feature_count: columns.len(),
            columns_hash: columns.hash_hex().unwrap(),
            ..ModelMetadata::default()
        };
        let model = Model::new(vec![tree], logit(0.1), metadata);
        ModelArtifacts::new(model, columns).unwrap()
    }

    #[test]
    fn save_then_load_restores_pair() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path().join("nested"));
        let original = artifacts();
        let digest = original.save(&paths).unwrap();
        assert_eq!(digest.model_hash.len(), 64);

        let loaded = ModelArtifacts::load(&paths).unwrap();
        assert_eq!(loaded, original);

        let persisted: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&paths.columns).unwrap()).unwrap();
        assert_eq!(persisted, vec!["amount", "app_GooglePay", "app_PhonePe"]);
    }

    #[test]
    fn missing_files_are_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        artifacts().save(&paths).unwrap();

        fs::remove_file(&paths.columns).unwrap();
        match ModelArtifacts::load(&paths) {
            Err(ArtifactError::Missing(path)) => assert_eq!(path, paths.columns),
            other => panic!("expected missing columns, got {other:?}"),
        }

        fs::remove_file(&paths.model).unwrap();
        match ModelArtifacts::load(&paths) {
            Err(ArtifactError::Missing(path)) => assert_eq!(path, paths.model),
            other => panic!("expected missing model, got {other:?}"),
        }
    }

    #[test]
    fn tampered_model_fails_integrity_check() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        artifacts().save(&paths).unwrap();

        let json = fs::read_to_string(&paths.model).unwrap();
        fs::write(&paths.model, json.replace("\"weight\":1.0", "\"weight\":2.0")).unwrap();
        assert!(matches!(
            ModelArtifacts::load(&paths),
            Err(ArtifactError::IntegrityMismatch { .. })
        ));

        fs::remove_file(&paths.hash).unwrap();
        assert!(ModelArtifacts::load(&paths).is_ok());
    }

    #[test]
    fn mismatched_column_list_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        artifacts().save(&paths).unwrap();

        fs::write(&paths.columns, r#"["amount","app_PhonePe","app_GooglePay"]"#).unwrap();
        assert!(matches!(
            ModelArtifacts::load(&paths),
            Err(ArtifactError::Inconsistent(_))
        ));

        fs::write(&paths.columns, r#"["amount"]"#).unwrap();
        assert!(matches!(
            ModelArtifacts::load(&paths),
            Err(ArtifactError::Inconsistent(_))
        ));
    }

    #[test]
    fn malformed_json_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        artifacts().save(&paths).unwrap();
        fs::write(&paths.columns, "not json").unwrap();
        assert!(matches!(
            ModelArtifacts::load(&paths),
            Err(ArtifactError::Malformed { .. })
        ));
    }

    #[test]
    fn predict_uses_persisted_columns() {
        let artifacts = artifacts();
        let google = Transaction {
            app: Some("GooglePay".into()),
            ..Transaction::default()
        };
        let paytm = Transaction {
            app: Some("Paytm".into()),
            ..Transaction::default()
        };
        assert!(artifacts.predict_proba(&google) > artifacts.predict_proba(&paytm));
        assert!((artifacts.predict_proba(&paytm) - 0.1).abs() < 1e-9);
    }
}
