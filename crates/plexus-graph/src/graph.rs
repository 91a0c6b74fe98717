//! The graph container.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use petgraph::stable_graph::StableDiGraph;

use crate::TRACING_TARGET_EDIT;
use crate::cache::{self, CacheStatistics, HashCache, ValueCache};
use crate::config::GraphConfig;
use crate::edit::GraphEdit;
use crate::error::GraphResult;
use crate::event::{GraphEvent, GraphObserver};
use crate::id::{NodeId, PlugId};
use crate::node::NodeBehavior;
use crate::plug::PlugData;
use crate::view::{GraphView, StateRef};

pub(crate) struct NodeData {
    pub name: String,
    pub plugs: Vec<PlugId>,
    pub behavior: Option<Arc<dyn NodeBehavior>>,
}

/// Arena storage for nodes and plugs.
///
/// Removed plugs leave a `None` tombstone so that identifiers are never
/// reused. Structural connections are edges of `connections`, directed from
/// source to destination. `generation` changes with every structural or
/// value mutation.
#[derive(Default)]
pub(crate) struct GraphState {
    pub nodes: Vec<NodeData>,
    pub plugs: Vec<Option<PlugData>>,
    pub connections: StableDiGraph<PlugId, ()>,
    pub child_watchers: HashMap<PlugId, Vec<NodeId>>,
    pub plug_watchers: HashMap<PlugId, Vec<NodeId>>,
    pub generation: u64,
}

pub(crate) struct Shared {
    pub config: GraphConfig,
    pub hashes: HashCache,
    pub values: ValueCache,
}

/// A graph of nodes connected through plugs.
///
/// Any number of threads may read and evaluate the graph at once through
/// [`Graph::read`]. Mutations go through [`Graph::edit`], which holds the
/// graph exclusively until the edit and every reaction to it have finished.
pub struct Graph {
    state: RwLock<GraphState>,
    shared: Shared,
    observers: RwLock<Vec<Arc<dyn GraphObserver>>>,
}

impl Graph {
    /// Creates an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Creates an empty graph.
    pub fn with_config(config: GraphConfig) -> Self {
        let hashes = HashCache::new(config.hash_cache_capacity);
        let values = ValueCache::new(config.value_cache_capacity);
        Self {
            state: RwLock::new(GraphState::default()),
            shared: Shared {
                config,
                hashes,
                values,
            },
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the graph configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.shared.config
    }

    /// Returns a read-only view of the graph.
    ///
    /// Edits block until every view has been dropped.
    pub fn read(&self) -> GraphView<'_> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        GraphView::new(StateRef::Read(guard), &self.shared)
    }

    /// Runs `f` with exclusive access to the graph.
    ///
    /// Events produced by the edit are dispatched to node behaviours while
    /// it runs, and to observers once the graph has been released. When `f`
    /// or a reaction fails, mutations made before the failure remain
    /// applied.
    pub fn edit<R>(&self, f: impl FnOnce(&mut GraphEdit<'_>) -> GraphResult<R>) -> GraphResult<R> {
        let (result, events) = {
            let guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let generation = guard.generation;
            let mut edit = GraphEdit::new(guard, &self.shared);

            let result = f(&mut edit).and_then(|value| edit.flush().map(|()| value));
            if edit.view().generation() != generation {
                self.shared.hashes.clear();
            }
            (result, edit.finish())
        };

        if let Err(error) = &result {
            tracing::warn!(
                target: TRACING_TARGET_EDIT,
                error = %error,
                events = events.len(),
                "Graph edit failed"
            );
        }

        self.notify(&events);
        result
    }

    /// Registers an observer for events from future edits.
    pub fn subscribe(&self, observer: Arc<dyn GraphObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Returns a snapshot of cache activity.
    pub fn cache_statistics(&self) -> CacheStatistics {
        cache::statistics(&self.shared.hashes, &self.shared.values)
    }

    fn notify(&self, events: &[GraphEvent]) {
        if events.is_empty() {
            return;
        }

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for event in events {
            for observer in &observers {
                observer.on_event(event);
            }
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Graph")
            .field("nodes", &state.nodes.len())
            .field("plugs", &state.plugs.iter().flatten().count())
            .field("generation", &state.generation)
            .finish()
    }
}
