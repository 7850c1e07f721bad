use crate::engine::dimension::{DimensionHandle, DimensionState, FilterDelta};
use crate::engine::group::{
    GroupAllHandle, GroupAllState, GroupCore, GroupHandle, GroupState, Reducer,
};
use crate::engine::record_store::RecordStore;
use crate::engine::{FacetError, FilterPredicate, GroupRow, MAX_DIMENSIONS};

struct GroupSlot<R> {
    /// Dimension whose filter this group ignores (`None` for group_all,
    /// which sees every filter)
    dim: Option<usize>,
    core: Box<dyn GroupCore<R>>,
}

/// Query facade: owns the record store, all dimensions and all groups, and
/// keeps every group's accumulators correct as filters change.
///
/// Per record it holds a `u32` fail mask — bit d set means the record fails
/// dimension d's filter. A record is visible to a group attached to
/// dimension e iff `mask & !bit(e) == 0`: the self-filter exemption is the
/// exempt bit, nothing more. A filter change flips exactly the bits of
/// records whose pass status changed and forwards one add/remove per
/// (key, record) transition to each group, in group registration order —
/// cost proportional to the size of the change, not the dataset.
///
/// # Examples
///
/// ```rust,ignore
/// let mut frame = Frame::from_records(records);
/// let sex = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;
/// let balance = frame.group(sex, Reducer::count());
/// frame.filter(sex, Some(FilterPredicate::Equals(Key::from("Female"))))?;
/// for row in frame.group_rows(balance) {
///     println!("{:?} => {}", row.key, row.value);
/// }
/// ```
pub struct Frame<R> {
    store: RecordStore<R>,
    dimensions: Vec<DimensionState>,
    groups: Vec<GroupSlot<R>>,
    masks: Vec<u32>,
}

impl<R: 'static> Frame<R> {
    pub fn new(store: RecordStore<R>) -> Self {
        let masks = vec![0u32; store.size()];
        Frame {
            store,
            dimensions: Vec::new(),
            groups: Vec::new(),
            masks,
        }
    }

    pub fn from_records(records: Vec<R>) -> Self {
        Self::new(RecordStore::load(records))
    }

    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    /// Number of records passing every active filter
    pub fn active_count(&self) -> usize {
        self.masks.iter().filter(|&&m| m == 0).count()
    }

    /// Register a dimension: a pure projection of each record onto a key.
    ///
    /// The key function runs once per record here; keys are cached for the
    /// process lifetime (records never mutate).
    pub fn dimension(
        &mut self,
        name: &str,
        key_fn: impl Fn(&R) -> crate::engine::Key,
    ) -> Result<DimensionHandle, FacetError> {
        if self.dimensions.len() == MAX_DIMENSIONS {
            return Err(FacetError::DimensionLimit);
        }
        let keys = self.store.all().iter().map(key_fn).collect();
        self.dimensions
            .push(DimensionState::new(name.to_string(), keys));
        Ok(DimensionHandle(self.dimensions.len() - 1))
    }

    /// Attach an incremental group to a dimension.
    ///
    /// `initial()` runs once per distinct key of the full unfiltered set,
    /// then `add` folds once per record of the dimension-exempted active
    /// subset, in record order — the only full pass this group will ever do.
    pub fn group<A: Clone + 'static>(
        &mut self,
        dim: DimensionHandle,
        reducer: Reducer<R, A>,
    ) -> GroupHandle<A> {
        let mut state = GroupState::new(reducer);
        let exempt = 1u32 << dim.0;
        let dstate = &self.dimensions[dim.0];
        for key in dstate.keys() {
            state.seed(key);
        }
        for (idx, record) in self.store.all().iter().enumerate() {
            if self.masks[idx] & !exempt == 0 {
                state.record_entered(Some(dstate.key_of(idx)), record);
            }
        }
        self.groups.push(GroupSlot {
            dim: Some(dim.0),
            core: Box::new(state),
        });
        GroupHandle::new(self.groups.len() - 1)
    }

    /// Counting group-by (the default reducer)
    pub fn group_count(&mut self, dim: DimensionHandle) -> GroupHandle<i64> {
        self.group(dim, Reducer::count())
    }

    /// Single global accumulator over the whole active subset, ignoring all
    /// dimension keys (scalar summaries). Sees every filter — no exemption.
    pub fn group_all<A: Clone + 'static>(&mut self, reducer: Reducer<R, A>) -> GroupAllHandle<A> {
        let mut state = GroupAllState::new(reducer);
        for (idx, record) in self.store.all().iter().enumerate() {
            if self.masks[idx] == 0 {
                state.record_entered(None, record);
            }
        }
        self.groups.push(GroupSlot {
            dim: None,
            core: Box::new(state),
        });
        GroupAllHandle::new(self.groups.len() - 1)
    }

    /// Set, replace or clear (with `None`) a dimension's filter.
    ///
    /// The only mutation entry point after construction. Computes the
    /// precise enter/leave delta, flips the affected mask bits, then
    /// notifies every group in registration order.
    pub fn filter(
        &mut self,
        dim: DimensionHandle,
        pred: Option<FilterPredicate>,
    ) -> Result<(), FacetError> {
        let d = dim.0;
        let bit = 1u32 << d;
        let plan = self.dimensions[d].replace_filter(pred)?;

        // (record, mask before the flip) per transition
        let mut delta: Vec<(u32, u32)> = Vec::new();
        match plan {
            FilterDelta::Windows { enter, leave } => {
                let order = self.dimensions[d].order()?;
                for (start, end) in enter {
                    for &rec in &order[start..end] {
                        let old = self.masks[rec as usize];
                        self.masks[rec as usize] = old & !bit;
                        delta.push((rec, old));
                    }
                }
                for (start, end) in leave {
                    for &rec in &order[start..end] {
                        let old = self.masks[rec as usize];
                        self.masks[rec as usize] = old | bit;
                        delta.push((rec, old));
                    }
                }
            }
            FilterDelta::Rescan => {
                for idx in 0..self.masks.len() {
                    let passes = self.dimensions[d].record_passes(idx);
                    let failed = self.masks[idx] & bit != 0;
                    if failed == passes {
                        let old = self.masks[idx];
                        self.masks[idx] = old ^ bit;
                        delta.push((idx as u32, old));
                    }
                }
            }
        }

        for slot in &mut self.groups {
            let exempt = slot.dim.map_or(0, |e| 1u32 << e);
            for &(rec, old) in &delta {
                let new = old ^ bit;
                let before = old & !exempt == 0;
                let after = new & !exempt == 0;
                if before == after {
                    continue;
                }
                let record = &self.store.all()[rec as usize];
                let key = slot.dim.map(|e| self.dimensions[e].key_of(rec as usize));
                if after {
                    slot.core.record_entered(key, record);
                } else {
                    slot.core.record_left(key, record);
                }
            }
        }
        Ok(())
    }

    /// The predicate currently installed on a dimension, if any
    pub fn current_filter(&self, dim: DimensionHandle) -> Option<&FilterPredicate> {
        self.dimensions[dim.0].filter()
    }

    /// Read-only `{key, value}` snapshot of a group.
    ///
    /// Rows come sorted by key on orderable dimensions, in first-observed
    /// key order otherwise. Keys with no active records report their zero
    /// accumulator.
    pub fn group_rows<A: Clone + 'static>(&self, group: GroupHandle<A>) -> Vec<GroupRow<A>> {
        let slot = &self.groups[group.idx];
        let state = slot
            .core
            .as_any()
            .downcast_ref::<GroupState<R, A>>()
            .expect("group handle used with a foreign frame");
        let mut rows = state.snapshot();
        if let Some(d) = slot.dim {
            if self.dimensions[d].is_orderable() {
                rows.sort_by(|a, b| {
                    a.key
                        .try_cmp(&b.key)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        rows
    }

    /// Current value of a global accumulator
    pub fn group_all_value<A: Clone + 'static>(&self, group: GroupAllHandle<A>) -> A {
        self.groups[group.idx]
            .core
            .as_any()
            .downcast_ref::<GroupAllState<R, A>>()
            .expect("group handle used with a foreign frame")
            .value()
    }

    /// The n records with the largest key on `dim` among records passing
    /// every filter (including this dimension's own), ties in insertion
    /// order. Errors on a dimension without a total key order.
    pub fn top(&self, dim: DimensionHandle, n: usize) -> Result<Vec<&R>, FacetError> {
        let dstate = &self.dimensions[dim.0];
        let order = dstate.order()?;
        let mut out = Vec::new();
        let mut end = order.len();
        while end > 0 && out.len() < n {
            // equal-key run ending at `end`, emitted in insertion order
            let key = dstate.key_of(order[end - 1] as usize);
            let mut start = end;
            while start > 0 && dstate.key_of(order[start - 1] as usize) == key {
                start -= 1;
            }
            for &rec in &order[start..end] {
                if self.masks[rec as usize] == 0 && out.len() < n {
                    out.push(&self.store.all()[rec as usize]);
                }
            }
            end = start;
        }
        Ok(out)
    }

    /// The n records with the smallest key on `dim`; see [`Frame::top`]
    pub fn bottom(&self, dim: DimensionHandle, n: usize) -> Result<Vec<&R>, FacetError> {
        let order = self.dimensions[dim.0].order()?;
        let mut out = Vec::new();
        for &rec in order {
            if self.masks[rec as usize] == 0 {
                out.push(&self.store.all()[rec as usize]);
                if out.len() == n {
                    break;
                }
            }
        }
        Ok(out)
    }
}
