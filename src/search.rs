use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use crate::constants::*;
use crate::index::IndexSnapshot;
use crate::model::Command;
use crate::text::tokenize;

/// Immutable ranked result set, shared between the cache and callers.
pub type SearchHits = Arc<[Arc<Command>]>;

fn name_priority(name: &str, query: &str) -> Option<u8> {
    let name = name.to_lowercase();
    if name == query {
        Some(PRIORITY_EXACT)
    } else if name.starts_with(query) {
        Some(PRIORITY_PREFIX)
    } else if name.contains(query) {
        Some(PRIORITY_CONTAINS)
    } else {
        None
    }
}

/// Rank `index` against `query`.
///
/// Each command is placed once, at the strongest tier it reaches: exact
/// name, name prefix, name substring (all case-insensitive), then keyword
/// hit on any query token. Ties inside a tier are broken by name so the
/// order never depends on map iteration.
pub fn rank(index: &IndexSnapshot, query: &str) -> Vec<Arc<Command>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut placed: HashMap<u32, u8> = HashMap::new();

    for (doc_id, doc) in index.docs.iter().enumerate() {
        if let Some(priority) = name_priority(&doc.name, &query) {
            placed.insert(doc_id as u32, priority);
        }
    }

    for token in tokenize(&query) {
        let Some(doc_ids) = index.keyword_index.get(&token) else {
            continue;
        };
        for &doc_id in doc_ids {
            placed.entry(doc_id).or_insert(PRIORITY_KEYWORD);
        }
    }

    let mut ranked: Vec<(u32, u8)> = placed.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| {
            index.docs[a.0 as usize]
                .name
                .cmp(&index.docs[b.0 as usize].name)
        })
    });

    ranked
        .into_iter()
        .map(|(doc_id, _)| Arc::clone(&index.docs[doc_id as usize]))
        .collect()
}

/// Plain-text listing of `hits` as the CLI prints it.
pub fn write_results<W: Write>(
    w: &mut W,
    query: &str,
    hits: &[Arc<Command>],
    top_k: usize,
) -> io::Result<()> {
    writeln!(w, "\nQuery: '{query}'")?;

    if hits.is_empty() {
        writeln!(w, "  No results found.")?;
        return Ok(());
    }

    writeln!(w, "  {} result(s)", hits.len())?;
    for cmd in hits.iter().take(top_k) {
        writeln!(
            w,
            "  {} {:<20} {}",
            cmd.highest_risk().indicator(),
            cmd.name,
            cmd.description
        )?;
    }
    if hits.len() > top_k {
        writeln!(w, "  … {} more", hits.len() - top_k)?;
    }
    Ok(())
}

pub fn search_and_print(query: &str, hits: &[Arc<Command>], top_k: usize) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, query, hits, top_k)?;
    out.flush()
}
