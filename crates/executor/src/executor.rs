//! The Executor - single entry point to Quarry.
//!
//! The Executor owns the dataset, the active index snapshot, and the session
//! store, and routes every operation to the component that implements it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use quarry_core::{validate_dense_ids, Error, Item, ItemId, Result};
use quarry_engine::search::{IndexBuilder, IndexSnapshot, IndexStats, SnapshotHandle};
use quarry_engine::QuarryConfig;
use tracing::{info, warn};

use crate::output::{Page, SessionView};
use crate::query::{page_ids, search_with, SearchResult};
use crate::session::{ViewState, ViewStatePatch};
use crate::store::SessionStore;
use crate::{Command, Output};

/// Dataset and index as of one publication
struct View {
    items: Arc<Vec<Item>>,
    snapshot: Option<Arc<IndexSnapshot>>,
    generation: u64,
}

/// The search engine with per-session state.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads. Queries read
/// a consistent (dataset, snapshot) pair; a rebuild swaps both together.
/// Operations on one session are serialized by that session's lock, so
/// concurrent writers to the same session see last-write-wins.
///
/// # Example
///
/// ```ignore
/// use quarry_executor::Executor;
///
/// let executor = Executor::open(items, QuarryConfig::default())?;
/// let result = executor.search("session-1", "alpha be");
/// executor.reorder("session-1", 4, 1)?;
/// ```
pub struct Executor {
    config: QuarryConfig,
    items: RwLock<Arc<Vec<Item>>>,
    index: SnapshotHandle,
    sessions: SessionStore,
}

impl Executor {
    /// Create an executor with an empty dataset and no index.
    pub fn new(config: QuarryConfig) -> Self {
        Self {
            config,
            items: RwLock::new(Arc::new(Vec::new())),
            index: SnapshotHandle::new(),
            sessions: SessionStore::new(),
        }
    }

    /// Create an executor and index `items`.
    pub fn open(items: Vec<Item>, config: QuarryConfig) -> Result<Self> {
        config.validate()?;
        let executor = Self::new(config);
        executor.load(items)?;
        Ok(executor)
    }

    /// Create an executor configured from `quarry.toml` at `path`.
    pub fn open_with_config_file(items: Vec<Item>, path: &Path) -> Result<Self> {
        Self::open(items, QuarryConfig::from_file(path)?)
    }

    /// Index `items` and publish them. Same as [`rebuild`](Self::rebuild).
    pub fn load(&self, items: Vec<Item>) -> Result<IndexStats> {
        self.rebuild(items)
    }

    /// Replace the dataset and its indexes.
    ///
    /// The build runs without blocking readers. On failure nothing is
    /// published and the previous dataset and snapshot stay active.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if ids are not dense `1..=N`
    /// - a storage error if staging fails
    pub fn rebuild(&self, items: Vec<Item>) -> Result<IndexStats> {
        validate_dense_ids(&items)?;

        let builder = IndexBuilder::new(self.config.index.build_options());
        let snapshot = match builder.build_in_dir(&items, &self.config.index.staging_root()) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    target: "quarry::index",
                    items = items.len(),
                    error = %e,
                    "Rebuild failed, keeping active snapshot"
                );
                return Err(e);
            }
        };
        let stats = snapshot.stats();

        let mut guard = self.items.write();
        *guard = Arc::new(items);
        let generation = self.index.publish(snapshot);
        drop(guard);

        info!(
            target: "quarry::index",
            generation,
            items = stats.items,
            tokens = stats.tokens,
            prefixes = stats.prefixes,
            ngrams = stats.ngrams,
            "Published index snapshot"
        );
        Ok(stats)
    }

    /// Active configuration
    pub fn config(&self) -> &QuarryConfig {
        &self.config
    }

    /// Number of items in the active dataset
    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    /// Key counts of the active snapshot, if one is published
    pub fn stats(&self) -> Option<IndexStats> {
        self.index.current().map(|snapshot| snapshot.stats())
    }

    /// Session registry
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn view(&self) -> View {
        let items = self.items.read();
        let (snapshot, generation) = self.index.current_with_generation();
        View {
            items: Arc::clone(&items),
            snapshot,
            generation,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Ranked ids for `query` in `session`'s context.
    pub fn search(&self, session: &str, query: &str) -> SearchResult {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                search_with(
                    query,
                    Some(state),
                    &view.items,
                    view.snapshot.as_deref(),
                    &self.config.search,
                )
            })
    }

    /// One page of items for `query`.
    ///
    /// `limit` of 0 uses the configured page size.
    pub fn page(&self, session: &str, query: &str, offset: usize, limit: usize) -> Page {
        let view = self.view();
        let result = self
            .sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                search_with(
                    query,
                    Some(state),
                    &view.items,
                    view.snapshot.as_deref(),
                    &self.config.search,
                )
            });
        let window = page_ids(&result.ids, offset, limit, &self.config.search);
        Page {
            items: resolve_items(&view.items, &window.ids),
            has_more: window.has_more,
            total_found: result.total_found,
        }
    }

    /// Matches for `query` ordered by the session's order and pins.
    pub fn matching(&self, session: &str, query: &str) -> Vec<ItemId> {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.build_matching_array(query, view.snapshot.as_deref())
            })
    }

    /// First page of the session's order and its selection.
    pub fn state(&self, session: &str) -> SessionView {
        let view = self.view();
        let (ids, selected) =
            self.sessions
                .with_session(session, view.items.len(), view.generation, |state| {
                    let end = state.len().min(self.config.search.page_size);
                    (state.order()[..end].to_vec(), state.selected().to_vec())
                });
        SessionView {
            first_page: resolve_items(&view.items, &ids),
            selected,
        }
    }

    // ========================================================================
    // Session updates
    // ========================================================================

    /// Select or deselect the ids in `payload`. Returns the new selection.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] unless `payload` is an array of positive
    /// integers or numeric strings. The selection is unchanged on error.
    pub fn select(
        &self,
        session: &str,
        payload: &serde_json::Value,
        selected: bool,
    ) -> Result<Vec<ItemId>> {
        let ids = parse_ids(payload)?;
        let view = self.view();
        Ok(self
            .sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.update_selection(&ids, selected);
                state.selected().to_vec()
            }))
    }

    /// Move `source` to the position `destination` holds.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if either id is not in the session's order.
    pub fn reorder(&self, session: &str, source: ItemId, destination: ItemId) -> Result<()> {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.reorder(source, destination)
            })
    }

    /// Replace the session's global order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `order` is not a permutation of `1..=N`.
    pub fn update_order(&self, session: &str, order: Vec<ItemId>) -> Result<()> {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.update_order(order)
            })
    }

    /// Patch the session's view state. Returns the merged state.
    pub fn update_view_state(&self, session: &str, patch: ViewStatePatch) -> ViewState {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.update_view_state(patch);
                state.view_state().clone()
            })
    }

    /// Pin `order` as the ordering for `query`.
    pub fn pin_search_order(&self, session: &str, query: &str, order: Vec<ItemId>) {
        let view = self.view();
        self.sessions
            .with_session(session, view.items.len(), view.generation, |state| {
                state.update_search_order(query, order)
            })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Execute a single command.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        match cmd {
            Command::Search { session, query } => Ok(Output::Search(self.search(&session, &query))),
            Command::Page {
                session,
                query,
                offset,
                limit,
            } => Ok(Output::Page(self.page(&session, &query, offset, limit))),
            Command::Matching { session, query } => {
                Ok(Output::Ids(self.matching(&session, &query)))
            }
            Command::Select {
                session,
                ids,
                selected,
            } => self.select(&session, &ids, selected).map(Output::Ids),
            Command::Reorder {
                session,
                source,
                destination,
            } => self
                .reorder(&session, source, destination)
                .map(|()| Output::Unit),
            Command::UpdateOrder { session, order } => {
                self.update_order(&session, order).map(|()| Output::Unit)
            }
            Command::UpdateViewState { session, patch } => {
                Ok(Output::ViewState(self.update_view_state(&session, patch)))
            }
            Command::PinSearchOrder {
                session,
                query,
                order,
            } => {
                self.pin_search_order(&session, &query, order);
                Ok(Output::Unit)
            }
            Command::State { session } => Ok(Output::State(self.state(&session))),
            Command::Rebuild { items } => self.rebuild(items).map(Output::Stats),
            Command::Stats => Ok(Output::Stats(self.stats().unwrap_or_default())),
        }
    }
}

/// Items for `ids`, skipping ids outside the dataset.
fn resolve_items(items: &[Item], ids: &[ItemId]) -> Vec<Item> {
    ids.iter()
        .filter_map(|&id| Item::slot(id).and_then(|slot| items.get(slot)))
        .cloned()
        .collect()
}

/// Parse a selection payload: an array of positive integers or numeric
/// strings.
pub(crate) fn parse_ids(payload: &serde_json::Value) -> Result<Vec<ItemId>> {
    let values = payload
        .as_array()
        .ok_or_else(|| Error::invalid_input("ids must be an array"))?;

    values
        .iter()
        .map(|value| {
            let id = match value {
                serde_json::Value::Number(n) => n.as_u64().and_then(|n| ItemId::try_from(n).ok()),
                serde_json::Value::String(s) => s.trim().parse::<ItemId>().ok(),
                _ => None,
            };
            match id {
                Some(id) if id >= 1 => Ok(id),
                _ => Err(Error::invalid_input(format!("invalid id: {}", value))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(dir: &Path) -> QuarryConfig {
        let mut config = QuarryConfig::default();
        config.index.staging_dir = Some(dir.to_path_buf());
        config.index.batch_size = 2;
        config.index.log_progress = false;
        config
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new(1, "alpha beta").with_city("Oslo"),
            Item::new(2, "beta gamma"),
            Item::new(3, "alpha gamma delta"),
            Item::new(4, "zeta"),
            Item::new(5, "beta alpha gamma"),
        ]
    }

    fn open() -> (tempfile::TempDir, Executor) {
        let dir = tempfile::tempdir().unwrap();
        let executor = Executor::open(items(), config(dir.path())).unwrap();
        (dir, executor)
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids(&json!([1, "2", " 3 "])).unwrap(), vec![1, 2, 3]);
        assert!(parse_ids(&json!([])).unwrap().is_empty());
        assert!(parse_ids(&json!("1")).unwrap_err().is_input());
        assert!(parse_ids(&json!({"ids": [1]})).unwrap_err().is_input());
        assert!(parse_ids(&json!([0])).unwrap_err().is_input());
        assert!(parse_ids(&json!([-1])).unwrap_err().is_input());
        assert!(parse_ids(&json!([1.5])).unwrap_err().is_input());
        assert!(parse_ids(&json!(["x"])).unwrap_err().is_input());
        assert!(parse_ids(&json!([null])).unwrap_err().is_input());
    }

    #[test]
    fn test_open_publishes_index() {
        let (_dir, executor) = open();
        assert_eq!(executor.item_count(), 5);
        let stats = executor.stats().unwrap();
        assert_eq!(stats.items, 5);
        assert!(stats.tokens >= 6);
    }

    #[test]
    fn test_open_rejects_sparse_ids() {
        let dir = tempfile::tempdir().unwrap();
        let result = Executor::open(vec![Item::new(2, "x")], config(dir.path()));
        assert!(matches!(result, Err(e) if e.is_input()));
    }

    #[test]
    fn test_search_and_page() {
        let (_dir, executor) = open();
        assert_eq!(executor.search("s", "alpha beta").ids, vec![1, 5]);

        let page = executor.page("s", "gamma", 0, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.total_found, 3);
    }

    #[test]
    fn test_state_first_page() {
        let (_dir, executor) = open();
        executor.update_order("s", vec![3, 1, 4, 2, 5]).unwrap();
        executor.select("s", &json!([2]), true).unwrap();
        let view = executor.state("s");
        let ids: Vec<ItemId> = view.first_page.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2, 5]);
        assert_eq!(view.selected, vec![2]);
    }

    #[test]
    fn test_select_invalid_payload_leaves_selection() {
        let (_dir, executor) = open();
        executor.select("s", &json!([1]), true).unwrap();
        assert!(executor.select("s", &json!([1, "x"]), true).is_err());
        assert_eq!(executor.state("s").selected, vec![1]);
    }

    #[test]
    fn test_rebuild_resets_pins() {
        let (_dir, executor) = open();
        executor.pin_search_order("s", "beta", vec![5, 2, 1]);
        assert_eq!(executor.matching("s", "beta"), vec![5, 2, 1]);

        executor.rebuild(items()).unwrap();
        assert_eq!(executor.matching("s", "beta"), vec![1, 2, 5]);
    }

    #[test]
    fn test_execute_dispatch() {
        let (_dir, executor) = open();
        let out = executor
            .execute(Command::Reorder {
                session: "s".into(),
                source: 9,
                destination: 1,
            })
            .unwrap_err();
        assert!(out.is_not_found());

        let out = executor
            .execute(Command::UpdateViewState {
                session: "s".into(),
                patch: ViewStatePatch {
                    search: Some("zeta".into()),
                    ..Default::default()
                },
            })
            .unwrap();
        match out {
            Output::ViewState(state) => assert_eq!(state.search, "zeta"),
            other => panic!("unexpected output {:?}", other),
        }

        match executor.execute(Command::Stats).unwrap() {
            Output::Stats(stats) => assert_eq!(stats.items, 5),
            other => panic!("unexpected output {:?}", other),
        }
    }
}
