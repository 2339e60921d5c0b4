use std::future::Future;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::METADATA_FILE;
use crate::error::LoadError;
use crate::model::{Command, CommandList, Metadata};

/// Fetch every batch concurrently, one task per batch, and merge them.
///
/// All tasks are joined before returning. Commands keep their order inside
/// a batch and batches are concatenated in the order given. If any batch
/// fails, the error of the first failing batch in that order is returned
/// and nothing is merged.
pub async fn load_batches<F, Fut>(batches: &[String], fetch: F) -> Result<Vec<Command>, LoadError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<Command>, LoadError>> + Send + 'static,
{
    let handles: Vec<(String, JoinHandle<Result<Vec<Command>, LoadError>>)> = batches
        .iter()
        .map(|batch| (batch.clone(), tokio::spawn(fetch(batch.clone()))))
        .collect();

    let mut merged = Vec::new();
    let mut first_err: Option<LoadError> = None;

    for (file, handle) in handles {
        match handle.await {
            Ok(Ok(commands)) => {
                debug!(file = %file, commands = commands.len(), "batch loaded");
                if first_err.is_none() {
                    merged.extend(commands);
                }
            }
            Ok(Err(source)) => {
                warn!(file = %file, error = %source, "batch failed");
                first_err.get_or_insert(LoadError::BatchLoad {
                    file,
                    source: Box::new(source),
                });
            }
            Err(source) => {
                warn!(file = %file, error = %source, "batch task aborted");
                first_err.get_or_insert(LoadError::Join { file, source });
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(merged),
    }
}

async fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_yaml::from_str(&text).map_err(|source| LoadError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and validate the dataset manifest in `data_dir`.
pub async fn read_metadata(data_dir: &Path) -> Result<Metadata, LoadError> {
    let path = data_dir.join(METADATA_FILE);
    let metadata: Metadata = read_yaml(&path).await?;
    metadata
        .validate()
        .map_err(|source| LoadError::Invalid { path, source })?;
    Ok(metadata)
}

/// Read and validate one data file, relative to `data_dir`.
pub async fn read_command_list(data_dir: &Path, file: &str) -> Result<CommandList, LoadError> {
    let path = data_dir.join(file);
    let list: CommandList = read_yaml(&path).await?;
    list.validate()
        .map_err(|source| LoadError::Invalid { path, source })?;
    Ok(list)
}

/// A loaded dataset: the manifest and every command it names.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub metadata: Metadata,
    pub commands: Vec<Command>,
}

/// YAML dataset reader rooted at one data directory.
#[derive(Debug, Clone)]
pub struct Loader {
    data_dir: PathBuf,
}

impl Loader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Loader {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load every data file named by the manifest.
    pub async fn load_all(&self) -> Result<Dataset, LoadError> {
        let metadata = read_metadata(&self.data_dir).await?;

        let data_dir = self.data_dir.clone();
        let commands = load_batches(&metadata.data_files, move |file| {
            let data_dir = data_dir.clone();
            async move {
                read_command_list(&data_dir, &file)
                    .await
                    .map(|list| list.commands)
            }
        })
        .await?;

        info!(
            data_dir = %self.data_dir.display(),
            version = %metadata.version,
            files = metadata.data_files.len(),
            commands = commands.len(),
            "dataset loaded"
        );

        Ok(Dataset { metadata, commands })
    }
}
