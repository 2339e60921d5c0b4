use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::IndexError;
use crate::model::{Command, Metadata};
use crate::search::rank;
use crate::text::tokenize;

/// One build generation: the command set plus its four derived views.
///
/// Buckets hold positions into `docs`, so every view of a generation
/// shares the same `Arc<Command>` instances. A snapshot is never mutated
/// once published.
pub struct IndexSnapshot {
    pub generation: u64,
    /// Manifest of the dataset these commands were loaded from.
    pub metadata: Option<Arc<Metadata>>,
    pub docs: Vec<Arc<Command>>,
    pub name_index: HashMap<String, u32>,
    pub category_index: HashMap<String, Vec<u32>>,
    pub platform_index: HashMap<String, Vec<u32>>,
    pub keyword_index: HashMap<String, Vec<u32>>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        IndexSnapshot {
            generation: 0,
            metadata: None,
            docs: Vec::new(),
            name_index: HashMap::new(),
            category_index: HashMap::new(),
            platform_index: HashMap::new(),
            keyword_index: HashMap::new(),
        }
    }

    /// Build all views in one pass over `commands`, in the given order.
    pub fn build(generation: u64, commands: Vec<Command>) -> Result<Self, IndexError> {
        let mut docs = Vec::with_capacity(commands.len());
        let mut name_index: HashMap<String, u32> = HashMap::with_capacity(commands.len());
        let mut category_index: HashMap<String, Vec<u32>> = HashMap::new();
        let mut platform_index: HashMap<String, Vec<u32>> = HashMap::new();
        let mut keyword_index: HashMap<String, Vec<u32>> = HashMap::new();

        for (doc_id, cmd) in commands.into_iter().enumerate() {
            let doc_id = doc_id as u32;

            if name_index.contains_key(&cmd.name) {
                return Err(IndexError::DuplicateName { name: cmd.name });
            }
            name_index.insert(cmd.name.clone(), doc_id);

            category_index
                .entry(cmd.category.clone())
                .or_default()
                .push(doc_id);

            // A command listing the same platform twice still lands once.
            let platforms: HashSet<&String> = cmd.platforms.iter().collect();
            for platform in platforms {
                platform_index
                    .entry(platform.clone())
                    .or_default()
                    .push(doc_id);
            }

            let keywords: HashSet<String> = tokenize(&cmd.name)
                .into_iter()
                .chain(tokenize(&cmd.description))
                .chain(tokenize(&cmd.category))
                .collect();
            for keyword in keywords {
                keyword_index.entry(keyword).or_default().push(doc_id);
            }

            docs.push(Arc::new(cmd));
        }

        Ok(IndexSnapshot {
            generation,
            metadata: None,
            docs,
            name_index,
            category_index,
            platform_index,
            keyword_index,
        })
    }

    fn resolve(&self, ids: Option<&Vec<u32>>) -> Vec<Arc<Command>> {
        ids.map(|ids| {
            ids.iter()
                .map(|&id| Arc::clone(&self.docs[id as usize]))
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<Command>, IndexError> {
        self.name_index
            .get(name)
            .map(|&id| Arc::clone(&self.docs[id as usize]))
            .ok_or_else(|| IndexError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn get_by_category(&self, category: &str) -> Vec<Arc<Command>> {
        self.resolve(self.category_index.get(category))
    }

    pub fn get_by_platform(&self, platform: &str) -> Vec<Arc<Command>> {
        self.resolve(self.platform_index.get(platform))
    }

    pub fn categories(&self) -> BTreeSet<String> {
        self.category_index.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Shared command index.
///
/// Readers grab the current [`IndexSnapshot`] under a short read lock and
/// then work on it lock-free; [`Index::build`] assembles a complete new
/// snapshot off to the side and swaps it in under the write lock. A failed
/// build never touches the published snapshot.
pub struct Index {
    current: RwLock<Arc<IndexSnapshot>>,
    next_generation: AtomicU64,
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Index {
    pub fn new() -> Self {
        Index {
            current: RwLock::new(Arc::new(IndexSnapshot::empty())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Replace the whole index with one built from `commands`.
    pub fn build(&self, commands: Vec<Command>) -> Result<u64, IndexError> {
        self.build_with_metadata(commands, None)
    }

    /// Like [`Index::build`], publishing `metadata` in the same swap so a
    /// snapshot never pairs one dataset's commands with another's manifest.
    pub fn build_with_metadata(
        &self,
        commands: Vec<Command>,
        metadata: Option<Metadata>,
    ) -> Result<u64, IndexError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let total = commands.len();

        let mut snapshot = match IndexSnapshot::build(generation, commands) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(generation, error = %err, "index build rejected");
                return Err(err);
            }
        };
        snapshot.metadata = metadata.map(Arc::new);

        info!(
            generation,
            commands = total,
            categories = snapshot.category_index.len(),
            platforms = snapshot.platform_index.len(),
            keywords = snapshot.keyword_index.len(),
            "index built"
        );

        *self.current.write() = Arc::new(snapshot);
        Ok(generation)
    }

    /// The currently published generation.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<Command>, IndexError> {
        self.snapshot().get_by_name(name)
    }

    pub fn get_by_category(&self, category: &str) -> Vec<Arc<Command>> {
        self.snapshot().get_by_category(category)
    }

    pub fn get_by_platform(&self, platform: &str) -> Vec<Arc<Command>> {
        self.snapshot().get_by_platform(platform)
    }

    /// Ranked, de-duplicated search. See [`crate::search::rank`].
    pub fn search(&self, query: &str) -> Vec<Arc<Command>> {
        rank(&self.snapshot(), query)
    }

    pub fn get_all_categories(&self) -> BTreeSet<String> {
        self.snapshot().categories()
    }

    pub fn get_all_commands(&self) -> Vec<Arc<Command>> {
        self.snapshot().docs.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
