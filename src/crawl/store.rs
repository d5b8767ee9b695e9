// src/crawl/store.rs
// =============================================================================
// The result store: crawled page URL -> links found on that page.
//
// It has a hard capacity (the --max-pages limit). Once full, record() refuses
// new entries instead of overwriting or failing, and the coordinator uses
// that refusal as its stop condition. The capacity check and the insert are
// one critical section, so two workers recording at the same moment can
// never push the store past its capacity.
// =============================================================================

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

// One crawled page in the final output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub links: Vec<String>,
}

pub struct ResultStore {
    capacity: usize,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    next_sequence: u64,
}

struct Entry {
    // Order in which the page was first recorded, used to sort the snapshot
    sequence: u64,
    links: BTreeSet<String>,
}

impl ResultStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(StoreState::default()),
        }
    }

    // Records the links found on a page.
    //
    // Returns false (and changes nothing) if the store is already full.
    // Recording a URL that is already present replaces its links but keeps
    // its original position in the snapshot.
    pub fn record(&self, url: impl Into<String>, links: BTreeSet<String>) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.entries.len() >= self.capacity {
            return false;
        }

        let url = url.into();
        match state.entries.get_mut(&url) {
            Some(entry) => entry.links = links,
            None => {
                let sequence = state.next_sequence;
                state.next_sequence += 1;
                state.entries.insert(url, Entry { sequence, links });
            }
        }
        true
    }

    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }

    // Exports every entry in the order pages were recorded, links sorted
    pub fn snapshot(&self) -> Vec<PageRecord> {
        let state = self.lock();
        let mut entries: Vec<_> = state.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.sequence);

        entries
            .into_iter()
            .map(|(url, entry)| PageRecord {
                url: url.clone(),
                links: entry.links.iter().cloned().collect(),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
