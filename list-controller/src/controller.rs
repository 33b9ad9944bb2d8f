//! The list controller.
//!
//! [`SyncController`] owns a live query against a [`RecordStore`] and keeps a
//! [`RenderSurface`] in step with it. Store notifications are fed through
//! the pure [`DispatchState`] machine and the resulting ops are applied to
//! the surface. Commands issued from the surface (delete, move, insert) go
//! to the store; their visual effect arrives back as change events, except
//! for moves, which the user has already performed on screen and whose
//! notifications are suppressed.
//!
//! # Example
//!
//! ```ignore
//! let controller = SyncController::new(store, surface, ListOptions::new("Cell"))?
//!     .with_bind_row(|row, _path, record| *row = record.get("title").to_string());
//! controller.configure(QueryDescriptor::new("Event").sort_by("position", true))?;
//! controller.commit_delete(0, 1)?;
//! ```

use std::cell::{Cell, Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use list_core::{
    propose_move_target, reorder, DispatchState, ResultSet, RowSource, Signal, SurfaceOp,
};
use list_types::{
    ChangeEvent, ConfigurationError, FieldValue, IndexPath, ListError, PersistenceError,
    QueryDescriptor, Record, RecordId, SchemaError,
};
use tracing::{debug, error, info, warn};

use crate::store::{ChangeListener, RecordStore, SharedResultSet, SubscriptionId};
use crate::surface::RenderSurface;

/// Renders a record into a visual row.
pub type BindRowFn<Row> = Box<dyn Fn(&mut Row, IndexPath, &Record)>;

/// Persists a user-driven reorder; receives the section in its new order.
pub type ReorderCommitFn = Box<dyn Fn(&[Record]) -> Result<(), PersistenceError>>;

/// Runs before a record is deleted through the controller.
pub type BeforeDeleteFn = Box<dyn Fn(&Record)>;

/// Static list options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Whether rows may be deleted.
    pub allow_editing: bool,
    /// Whether rows may be reordered.
    pub allow_reordering: bool,
    /// Identifier the surface uses to recycle rows. Must not be blank.
    pub cell_reuse_identifier: String,
    /// List title; defaults to the entity name once configured.
    pub title: Option<String>,
}

impl ListOptions {
    /// Options with editing and reordering disabled.
    pub fn new(cell_reuse_identifier: &str) -> Self {
        Self {
            allow_editing: false,
            allow_reordering: false,
            cell_reuse_identifier: cell_reuse_identifier.to_string(),
            title: None,
        }
    }

    /// Allow or forbid deleting rows.
    pub fn editable(mut self, allow: bool) -> Self {
        self.allow_editing = allow;
        self
    }

    /// Allow or forbid reordering rows.
    pub fn reorderable(mut self, allow: bool) -> Self {
        self.allow_reordering = allow;
        self
    }

    /// Set an explicit title.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

enum Lifecycle {
    Unconfigured,
    Configured {
        descriptor: QueryDescriptor,
        result_set: SharedResultSet,
        subscription: SubscriptionId,
    },
}

struct Callbacks<Row> {
    bind_row: Option<BindRowFn<Row>>,
    reorder_commit: Option<ReorderCommitFn>,
    before_delete: Option<BeforeDeleteFn>,
}

impl<Row> Default for Callbacks<Row> {
    fn default() -> Self {
        Self {
            bind_row: None,
            reorder_commit: None,
            before_delete: None,
        }
    }
}

/// Sets the suppression flag for its lifetime, restoring the previous
/// value on drop (including unwinding).
struct SuppressionGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> SuppressionGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Row source over a shared result set. Borrows of the result set are never
/// held while the bind callback runs.
struct Binder<'a, Row> {
    result_set: SharedResultSet,
    bind: Option<&'a BindRowFn<Row>>,
}

impl<Row> RowSource<Row> for Binder<'_, Row> {
    fn section_count(&self) -> usize {
        self.result_set.borrow().section_count()
    }

    fn row_count(&self, section: usize) -> usize {
        self.result_set.borrow().row_count(section).unwrap_or(0)
    }

    fn bind_row(&self, row: &mut Row, path: IndexPath) {
        let record = self.result_set.borrow().record_at(path).ok().cloned();
        if let (Some(bind), Some(record)) = (self.bind, record) {
            bind(row, path, &record);
        }
    }
}

struct Core<S: RecordStore, R: RenderSurface> {
    store: S,
    surface: RefCell<R>,
    options: ListOptions,
    callbacks: RefCell<Callbacks<R::Row>>,
    suppressed: Cell<bool>,
    dispatch: Cell<DispatchState>,
    lifecycle: RefCell<Lifecycle>,
    violations: Cell<u64>,
}

impl<S: RecordStore, R: RenderSurface> Core<S, R> {
    fn result_set(&self) -> Result<SharedResultSet, ConfigurationError> {
        match &*self.lifecycle.borrow() {
            Lifecycle::Configured { result_set, .. } => Ok(Rc::clone(result_set)),
            Lifecycle::Unconfigured => Err(ConfigurationError::NotConfigured),
        }
    }

    fn descriptor(&self) -> Result<QueryDescriptor, ConfigurationError> {
        match &*self.lifecycle.borrow() {
            Lifecycle::Configured { descriptor, .. } => Ok(descriptor.clone()),
            Lifecycle::Unconfigured => Err(ConfigurationError::NotConfigured),
        }
    }

    fn with_source<T>(&self, f: impl FnOnce(&dyn RowSource<R::Row>) -> T) -> T {
        let result_set = self
            .result_set()
            .unwrap_or_else(|_| Rc::new(RefCell::new(ResultSet::empty())));
        let callbacks = self.callbacks.borrow();
        let source = Binder {
            result_set,
            bind: callbacks.bind_row.as_ref(),
        };
        f(&source)
    }

    fn redraw(&self) {
        self.with_source(|source| self.surface.borrow_mut().reload_data(source));
    }

    fn reload(&self) -> Result<(), ListError> {
        let descriptor = self.descriptor()?;
        let result_set = self.result_set()?;
        let result = match self.store.execute_query(&descriptor) {
            Ok(fresh) => {
                debug!(
                    entity = %descriptor.entity,
                    sections = fresh.section_count(),
                    records = fresh.len(),
                    "reloaded"
                );
                *result_set.borrow_mut() = fresh;
                Ok(())
            }
            Err(e) => {
                warn!(entity = %descriptor.entity, error = %e, "query failed, keeping previous results");
                Err(e.into())
            }
        };
        self.redraw();
        result
    }

    fn detach(&self) {
        let previous = std::mem::replace(&mut *self.lifecycle.borrow_mut(), Lifecycle::Unconfigured);
        if let Lifecycle::Configured { subscription, .. } = previous {
            self.store.unsubscribe(subscription);
        }
        self.dispatch.set(DispatchState::Idle);
    }

    fn step(&self, signal: Signal) {
        let (next, ops) = self.dispatch.get().on_signal(signal, self.suppressed.get());
        self.dispatch.set(next);
        // One full reload per signal is enough.
        let mut reloaded = false;
        for op in ops {
            if reloaded && op == SurfaceOp::ForceReload {
                continue;
            }
            reloaded |= self.apply(op);
        }
    }

    /// Execute one op. Returns whether the surface was fully reloaded.
    fn apply(&self, op: SurfaceOp) -> bool {
        let staged = match op {
            SurfaceOp::BeginUpdates => {
                debug!("begin updates");
                self.surface.borrow_mut().begin_updates();
                Ok(())
            }
            SurfaceOp::EndUpdates => {
                debug!("end updates");
                let ended = self.with_source(|source| self.surface.borrow_mut().end_updates(source));
                if let Err(e) = ended {
                    warn!(error = %e, "batch did not apply cleanly, reloading");
                    self.force_reload();
                    return true;
                }
                return false;
            }
            SurfaceOp::InsertSection { index, animation } => {
                self.surface.borrow_mut().insert_sections(&[index], animation)
            }
            SurfaceOp::DeleteSection { index, animation } => {
                self.surface.borrow_mut().delete_sections(&[index], animation)
            }
            SurfaceOp::InsertRow { path, animation } => {
                self.surface.borrow_mut().insert_rows(&[path], animation)
            }
            SurfaceOp::DeleteRow { path, animation } => {
                self.surface.borrow_mut().delete_rows(&[path], animation)
            }
            SurfaceOp::RebindRow { id, path } => {
                self.rebind(id, path);
                Ok(())
            }
            SurfaceOp::ForceReload => {
                self.force_reload();
                return true;
            }
            SurfaceOp::Report(violation) => {
                self.violations.set(self.violations.get() + 1);
                error!(%violation, "change protocol violation");
                return false;
            }
        };
        if let Err(e) = staged {
            warn!(?op, error = %e, "surface rejected primitive");
        }
        false
    }

    fn force_reload(&self) {
        if let Err(e) = self.reload() {
            debug!(error = %e, "forced reload did not complete");
        }
    }

    fn rebind(&self, id: RecordId, path: IndexPath) {
        let Ok(result_set) = self.result_set() else {
            return;
        };
        let Some(record) = result_set.borrow().record(id).cloned() else {
            return;
        };
        let callbacks = self.callbacks.borrow();
        let Some(bind) = callbacks.bind_row.as_ref() else {
            return;
        };
        let mut surface = self.surface.borrow_mut();
        if let Some(row) = surface.row_mut(path) {
            bind(row, path, &record);
        }
    }
}

impl<S: RecordStore, R: RenderSurface> ChangeListener for Core<S, R> {
    fn begin_batch(&self) {
        self.step(Signal::BatchBegin);
    }

    fn on_change(&self, event: &ChangeEvent) {
        self.step(Signal::Change(*event));
    }

    fn end_batch(&self) {
        self.step(Signal::BatchEnd);
    }
}

impl<S: RecordStore, R: RenderSurface> Drop for Core<S, R> {
    fn drop(&mut self) {
        if let Lifecycle::Configured { subscription, .. } = self.lifecycle.get_mut() {
            self.store.unsubscribe(*subscription);
        }
    }
}

/// Keeps a sectioned list surface synchronized with a live store query.
pub struct SyncController<S: RecordStore, R: RenderSurface> {
    core: Rc<Core<S, R>>,
}

impl<S: RecordStore + 'static, R: RenderSurface + 'static> SyncController<S, R> {
    /// Create an unconfigured controller.
    ///
    /// Fails with [`ConfigurationError::MissingReuseIdentifier`] when the
    /// reuse identifier is blank.
    pub fn new(store: S, surface: R, options: ListOptions) -> Result<Self, ConfigurationError> {
        if options.cell_reuse_identifier.trim().is_empty() {
            return Err(ConfigurationError::MissingReuseIdentifier);
        }
        Ok(Self {
            core: Rc::new(Core {
                store,
                surface: RefCell::new(surface),
                options,
                callbacks: RefCell::new(Callbacks::default()),
                suppressed: Cell::new(false),
                dispatch: Cell::new(DispatchState::new()),
                lifecycle: RefCell::new(Lifecycle::Unconfigured),
                violations: Cell::new(0),
            }),
        })
    }

    /// Set the cell-binding callback.
    pub fn with_bind_row(self, bind: impl Fn(&mut R::Row, IndexPath, &Record) + 'static) -> Self {
        self.core.callbacks.borrow_mut().bind_row = Some(Box::new(bind));
        self
    }

    /// Set the callback that persists a user-driven reorder.
    pub fn with_reorder_commit(
        self,
        commit: impl Fn(&[Record]) -> Result<(), PersistenceError> + 'static,
    ) -> Self {
        self.core.callbacks.borrow_mut().reorder_commit = Some(Box::new(commit));
        self
    }

    /// Set the callback run before a record is deleted.
    pub fn with_before_delete(self, before: impl Fn(&Record) + 'static) -> Self {
        self.core.callbacks.borrow_mut().before_delete = Some(Box::new(before));
        self
    }

    // ===========================================
    // Configuration
    // ===========================================

    /// Bind the controller to a query and perform the initial load.
    ///
    /// The descriptor is validated against the store's schema. The
    /// subscription is registered before the load, so no change made after
    /// this call returns can be missed. Any previous subscription is
    /// replaced; if the new query fails, the previous one stays bound.
    pub fn configure(&self, descriptor: QueryDescriptor) -> Result<(), ListError> {
        if descriptor.entity.trim().is_empty() {
            return Err(ConfigurationError::EmptyEntity.into());
        }
        let schema = self.core.store.schema(&descriptor.entity).ok_or_else(|| {
            ConfigurationError::from(SchemaError::UnknownEntity(descriptor.entity.clone()))
        })?;
        descriptor.validate(&schema)?;

        let listener: Weak<dyn ChangeListener> =
            Rc::downgrade(&self.core) as Weak<dyn ChangeListener>;
        let (subscription, result_set) =
            match self.core.store.subscribe(descriptor.clone(), listener) {
                Ok(subscribed) => subscribed,
                Err(e) => {
                    warn!(entity = %descriptor.entity, error = %e, "query failed, keeping previous configuration");
                    return Err(e.into());
                }
            };
        self.core.detach();

        info!(
            entity = %descriptor.entity,
            ?subscription,
            cache = descriptor.cache_name.as_deref().unwrap_or("-"),
            "list configured"
        );
        *self.core.lifecycle.borrow_mut() = Lifecycle::Configured {
            descriptor,
            result_set,
            subscription,
        };
        self.core.reload()
    }

    /// Re-run the query and redraw everything.
    ///
    /// On a query failure the previous results stay in place; the surface is
    /// redrawn either way.
    pub fn reload(&self) -> Result<(), ListError> {
        info!("reloading list");
        self.core.reload()
    }

    /// Drop the subscription and show an empty list.
    pub fn unconfigure(&self) {
        self.core.detach();
        info!("list unconfigured");
        self.core.redraw();
    }

    /// Whether a query is bound.
    pub fn is_configured(&self) -> bool {
        matches!(&*self.core.lifecycle.borrow(), Lifecycle::Configured { .. })
    }

    // ===========================================
    // Read surface
    // ===========================================

    /// Number of sections (0 when unconfigured).
    pub fn section_count(&self) -> usize {
        self.core
            .result_set()
            .map_or(0, |rs| rs.borrow().section_count())
    }

    /// Number of rows in `section`.
    pub fn row_count(&self, section: usize) -> Result<usize, ListError> {
        let rs = self.core.result_set()?;
        let count = rs.borrow().row_count(section)?;
        Ok(count)
    }

    /// The record at `(section, row)`.
    pub fn record_at(&self, section: usize, row: usize) -> Result<Record, ListError> {
        let rs = self.core.result_set()?;
        let record = rs.borrow().record_at(IndexPath::new(section, row))?.clone();
        Ok(record)
    }

    /// Display name of `section`.
    pub fn section_name(&self, section: usize) -> Result<String, ListError> {
        let rs = self.core.result_set()?;
        let name = rs.borrow().section(section)?.name().to_string();
        Ok(name)
    }

    /// Render the record at `(section, row)` into `visual_row`.
    pub fn bind_row(
        &self,
        visual_row: &mut R::Row,
        section: usize,
        row: usize,
    ) -> Result<(), ListError> {
        let record = self.record_at(section, row)?;
        if let Some(bind) = self.core.callbacks.borrow().bind_row.as_ref() {
            bind(visual_row, IndexPath::new(section, row), &record);
        }
        Ok(())
    }

    /// All fetched records in section order.
    pub fn fetched_records(&self) -> Vec<Record> {
        self.core
            .result_set()
            .map(|rs| rs.borrow().records().cloned().collect())
            .unwrap_or_default()
    }

    /// The bound query.
    pub fn descriptor(&self) -> Option<QueryDescriptor> {
        self.core.descriptor().ok()
    }

    /// The list title: the configured one, else the entity name.
    pub fn title(&self) -> Option<String> {
        self.core
            .options
            .title
            .clone()
            .or_else(|| self.descriptor().map(|d| d.entity))
    }

    /// Static options.
    pub fn options(&self) -> &ListOptions {
        &self.core.options
    }

    /// Identifier the surface recycles rows under.
    pub fn cell_reuse_identifier(&self) -> &str {
        &self.core.options.cell_reuse_identifier
    }

    /// Whether store notifications are currently being discarded.
    pub fn is_suppressed(&self) -> bool {
        self.core.suppressed.get()
    }

    /// Number of protocol violations seen so far.
    pub fn violation_count(&self) -> u64 {
        self.core.violations.get()
    }

    /// The rendering surface.
    pub fn surface(&self) -> Ref<'_, R> {
        self.core.surface.borrow()
    }

    /// The store.
    pub fn store(&self) -> &S {
        &self.core.store
    }

    // ===========================================
    // Commands
    // ===========================================

    /// Whether the row may be deleted.
    pub fn can_edit(&self, _section: usize, _row: usize) -> bool {
        self.core.options.allow_editing
    }

    /// Whether the row may be reordered.
    pub fn can_move(&self, _section: usize, _row: usize) -> bool {
        self.core.options.allow_reordering
    }

    /// Constrain a drag target to the source section.
    pub fn propose_move_target(&self, source: IndexPath, proposed: IndexPath) -> IndexPath {
        propose_move_target(source, proposed)
    }

    /// Delete the record at `(section, row)` and save.
    ///
    /// The surface is not touched here; the store's resulting
    /// `RecordDeleted` event removes the row.
    pub fn commit_delete(&self, section: usize, row: usize) -> Result<(), ListError> {
        let record = self.record_at(section, row)?;
        if let Some(before) = self.core.callbacks.borrow().before_delete.as_ref() {
            before(&record);
        }
        debug!(id = %record.id(), section, row, "deleting record");
        self.core.store.delete_record(record.id())?;
        self.core.store.save()?;
        Ok(())
    }

    /// Apply a user-driven move and persist it through the reorder callback.
    ///
    /// Only moves within one section are accepted. Store notifications
    /// raised while the callback runs are discarded, since the surface
    /// already shows the new order. Returns the section in its new order.
    pub fn commit_move(&self, from: IndexPath, to: IndexPath) -> Result<Vec<Record>, ListError> {
        if from.section != to.section {
            return Err(ListError::MoveRejected { from, to });
        }
        let rs = self.core.result_set()?;
        let records = rs.borrow().section(from.section)?.records().to_vec();
        let reordered =
            reorder(&records, from.row, to.row).ok_or(ListError::MoveRejected { from, to })?;

        debug!(%from, %to, "committing move");
        {
            let _guard = SuppressionGuard::engage(&self.core.suppressed);
            if let Some(commit) = self.core.callbacks.borrow().reorder_commit.as_ref() {
                commit(&reordered)?;
            }
        }
        Ok(reordered)
    }

    /// Insert a record of the configured entity and save.
    pub fn insert_record(&self, fields: BTreeMap<String, FieldValue>) -> Result<Record, ListError> {
        let descriptor = self.core.descriptor()?;
        let record = self.core.store.insert_record(&descriptor.entity, fields)?;
        debug!(id = %record.id(), entity = %descriptor.entity, "inserting record");
        self.core.store.save()?;
        Ok(record)
    }
}
