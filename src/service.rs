use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::SearchCache;
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_DATA_DIR};
use crate::error::{Error, Result};
use crate::index::{Index, IndexSnapshot};
use crate::loader::Loader;
use crate::model::{Command, Metadata, RiskLevel};
use crate::search::SearchHits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Read API over one command dataset.
///
/// Owns the index and the search cache and keeps them consistent: every
/// successful rebuild clears the cache, and reloads are serialized.
pub struct CommandService {
    loader: Option<Loader>,
    index: Index,
    cache: SearchCache,
    reload_lock: tokio::sync::Mutex<()>,
}

impl CommandService {
    fn with_parts(loader: Option<Loader>, cache_capacity: usize) -> Self {
        CommandService {
            loader,
            index: Index::new(),
            cache: SearchCache::new(cache_capacity),
            reload_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Load the dataset under `config.data_dir` and index it.
    pub async fn open(config: &ServiceConfig) -> Result<Self> {
        let service = Self::with_parts(
            Some(Loader::new(&config.data_dir)),
            config.cache_capacity,
        );
        service.reload().await?;
        Ok(service)
    }

    /// Index `commands` directly, without a backing data directory.
    pub fn from_commands(commands: Vec<Command>, cache_capacity: usize) -> Result<Self> {
        let service = Self::with_parts(None, cache_capacity);
        service.rebuild(commands)?;
        Ok(service)
    }

    /// Re-read the data directory and swap in a fresh index.
    ///
    /// On failure the running generation and its cached results stay live.
    pub async fn reload(&self) -> Result<u64> {
        let loader = self.loader.as_ref().ok_or(Error::NoDataSource)?;
        let _guard = self.reload_lock.lock().await;

        let dataset = loader.load_all().await.inspect_err(|err| {
            warn!(error = %err, "reload failed, keeping current index");
        })?;
        self.publish(dataset.commands, Some(dataset.metadata))
    }

    /// Replace the index with `commands` and drop every cached result.
    ///
    /// The new generation carries no manifest.
    pub fn rebuild(&self, commands: Vec<Command>) -> Result<u64> {
        self.publish(commands, None)
    }

    fn publish(&self, commands: Vec<Command>, metadata: Option<Metadata>) -> Result<u64> {
        let generation = self.index.build_with_metadata(commands, metadata)?;
        self.cache.clear();
        info!(generation, "search cache cleared");
        Ok(generation)
    }

    pub fn command(&self, name: &str) -> Result<Arc<Command>> {
        Ok(self.index.get_by_name(name)?)
    }

    pub fn by_category(&self, category: &str) -> Vec<Arc<Command>> {
        self.index.get_by_category(category)
    }

    pub fn by_platform(&self, platform: &str) -> Vec<Arc<Command>> {
        self.index.get_by_platform(platform)
    }

    /// Cached ranked search.
    pub fn search(&self, query: &str) -> SearchHits {
        if let Some(hits) = self.cache.get(query) {
            return hits;
        }

        // Read the epoch before touching the index so a result computed
        // against a generation that gets replaced is never cached.
        let epoch = self.cache.epoch();
        let hits: SearchHits = self.index.search(query).into();
        if !self.cache.set_if_current(epoch, query, Arc::clone(&hits)) {
            debug!(query, "index replaced during search, result not cached");
        }
        hits
    }

    pub fn categories(&self) -> BTreeSet<String> {
        self.index.get_all_categories()
    }

    pub fn all_commands(&self) -> Vec<Arc<Command>> {
        self.index.get_all_commands()
    }

    pub fn command_count(&self) -> usize {
        self.index.len()
    }

    pub fn category_count(&self) -> usize {
        self.index.snapshot().category_index.len()
    }

    pub fn generation(&self) -> u64 {
        self.index.generation()
    }

    /// Manifest of the currently indexed dataset, if it came from disk.
    pub fn metadata(&self) -> Option<Arc<Metadata>> {
        self.index.snapshot().metadata.clone()
    }

    /// The published generation with its views and manifest.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.index.snapshot()
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Commands whose highest declared risk is exactly `level`.
    pub fn filter_by_risk(&self, level: RiskLevel) -> Vec<Arc<Command>> {
        self.all_commands()
            .into_iter()
            .filter(|cmd| cmd.highest_risk() == level)
            .collect()
    }

    pub fn high_risk_commands(&self) -> Vec<Arc<Command>> {
        self.all_commands()
            .into_iter()
            .filter(|cmd| cmd.highest_risk() >= RiskLevel::High)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use crate::index::tests::cmd;
    use crate::model::Risk;

    fn risky(name: &str, levels: &[RiskLevel]) -> Command {
        let mut c = cmd(name, "OS/Linux", "risky tool", &["linux"]);
        c.risks = levels
            .iter()
            .map(|&level| Risk {
                level,
                description: level.to_string(),
            })
            .collect();
        c
    }

    fn service() -> CommandService {
        CommandService::from_commands(
            vec![
                cmd("ls", "OS/Linux", "list directory contents", &["linux", "macos"]),
                cmd("lsof", "OS/Linux", "list open files", &["linux"]),
                cmd("cat", "OS/Linux", "concatenate ls output", &["linux"]),
                cmd("docker", "Container/Docker", "container runtime", &["linux"]),
            ],
            8,
        )
        .unwrap()
    }

    fn names(hits: &[Arc<Command>]) -> Vec<&str> {
        hits.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn search_populates_and_reuses_cache() {
        let svc = service();
        assert!(svc.cache().is_empty());

        let first = svc.search("ls");
        assert_eq!(names(&first), vec!["ls", "lsof", "cat"]);
        assert_eq!(svc.cache().len(), 1);

        let second = svc.search("ls");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(svc.cache().len(), 1);
    }

    #[test]
    fn rebuild_clears_cache_even_with_same_data() {
        let svc = service();
        svc.search("ls");
        svc.search("docker");
        assert_eq!(svc.cache().len(), 2);

        let same: Vec<Command> = svc.all_commands().iter().map(|c| (**c).clone()).collect();
        svc.rebuild(same).unwrap();

        assert_eq!(svc.cache().len(), 0);
    }

    #[test]
    fn failed_rebuild_keeps_index_and_cache() {
        let svc = service();
        let before = svc.generation();
        svc.search("ls");

        let dup = vec![
            cmd("x", "A", "one", &["linux"]),
            cmd("x", "B", "two", &["linux"]),
        ];
        let err = svc.rebuild(dup).unwrap_err();
        assert!(matches!(
            err,
            Error::Index(IndexError::DuplicateName { ref name }) if name == "x"
        ));

        assert_eq!(svc.generation(), before);
        assert_eq!(svc.command_count(), 4);
        assert_eq!(svc.cache().len(), 1);
    }

    #[test]
    fn lookups_delegate_to_index() {
        let svc = service();
        assert_eq!(svc.command("docker").unwrap().category, "Container/Docker");
        assert!(matches!(
            svc.command("nope"),
            Err(Error::Index(IndexError::NotFound { .. }))
        ));
        assert_eq!(names(&svc.by_category("OS/Linux")), vec!["ls", "lsof", "cat"]);
        assert_eq!(names(&svc.by_platform("macos")), vec!["ls"]);
        assert_eq!(svc.category_count(), 2);
        assert!(svc.categories().contains("Container/Docker"));
        assert!(svc.metadata().is_none());
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(service().search("").is_empty());
    }

    #[test]
    fn risk_filters() {
        let svc = CommandService::from_commands(
            vec![
                risky("safe", &[]),
                risky("medium", &[RiskLevel::Medium]),
                risky("high", &[RiskLevel::Low, RiskLevel::High]),
                risky("crit", &[RiskLevel::Critical, RiskLevel::Medium]),
            ],
            4,
        )
        .unwrap();

        assert_eq!(names(&svc.filter_by_risk(RiskLevel::Low)), vec!["safe"]);
        assert_eq!(names(&svc.filter_by_risk(RiskLevel::Medium)), vec!["medium"]);
        assert_eq!(names(&svc.high_risk_commands()), vec!["high", "crit"]);
    }

    #[tokio::test]
    async fn reload_without_loader_fails() {
        let svc = service();
        assert!(matches!(svc.reload().await, Err(Error::NoDataSource)));
    }

    #[tokio::test]
    async fn open_fails_on_missing_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            data_dir: tmp.path().join("absent"),
            ..ServiceConfig::default()
        };
        assert!(matches!(
            CommandService::open(&config).await,
            Err(Error::Load(_))
        ));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ServiceConfig = serde_json::from_str(r#"{"cache_capacity": 5}"#).unwrap();
        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }
}
