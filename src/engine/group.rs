use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::engine::{GroupRow, Key};

/// Handle to a keyed group registered on a frame
#[derive(Debug)]
pub struct GroupHandle<A> {
    pub(crate) idx: usize,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for GroupHandle<A> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<A> Copy for GroupHandle<A> {}

impl<A> GroupHandle<A> {
    pub(crate) fn new(idx: usize) -> Self {
        GroupHandle {
            idx,
            _marker: PhantomData,
        }
    }
}

/// Handle to a global (keyless) accumulator registered on a frame
#[derive(Debug)]
pub struct GroupAllHandle<A> {
    pub(crate) idx: usize,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for GroupAllHandle<A> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<A> Copy for GroupAllHandle<A> {}

impl<A> GroupAllHandle<A> {
    pub(crate) fn new(idx: usize) -> Self {
        GroupAllHandle {
            idx,
            _marker: PhantomData,
        }
    }
}

/// An incremental reducer: three pure functions threaded through every
/// record that enters or leaves the active subset.
///
/// `add` and `remove` must be exact inverses for the same record and must
/// not touch anything but the accumulator; a violation silently breaks the
/// incremental invariant (it is a precondition, not runtime-checked).
pub struct Reducer<R, A> {
    pub(crate) initial: Box<dyn Fn() -> A>,
    pub(crate) add: Box<dyn Fn(A, &R) -> A>,
    pub(crate) remove: Box<dyn Fn(A, &R) -> A>,
}

impl<R, A> Reducer<R, A> {
    pub fn new(
        initial: impl Fn() -> A + 'static,
        add: impl Fn(A, &R) -> A + 'static,
        remove: impl Fn(A, &R) -> A + 'static,
    ) -> Self {
        Reducer {
            initial: Box::new(initial),
            add: Box::new(add),
            remove: Box::new(remove),
        }
    }
}

impl<R> Reducer<R, i64> {
    /// Default counting group-by: add = +1, remove = -1, initial = 0
    pub fn count() -> Self {
        Reducer::new(|| 0, |a, _| a + 1, |a, _| a - 1)
    }

    /// Sum of an integer projection
    pub fn sum(value: impl Fn(&R) -> i64 + 'static) -> Self {
        let value = Rc::new(value);
        let v2 = Rc::clone(&value);
        Reducer::new(|| 0, move |a, r| a + value(r), move |a, r| a - v2(r))
    }
}

impl<R> Reducer<R, Average> {
    /// Running average of a numeric projection.
    ///
    /// Removing the last record of a key resets total and average to 0
    /// exactly instead of leaving stale values (and never divides by zero).
    pub fn average(value: impl Fn(&R) -> f64 + 'static) -> Self {
        let value = Rc::new(value);
        let v2 = Rc::clone(&value);
        Reducer::new(
            Average::default,
            move |mut a, r| {
                a.count += 1;
                a.total += value(r);
                a.average = a.total / a.count as f64;
                a
            },
            move |mut a, r| {
                a.count -= 1;
                if a.count == 0 {
                    a.total = 0.0;
                    a.average = 0.0;
                } else {
                    a.total -= v2(r);
                    a.average = a.total / a.count as f64;
                }
                a
            },
        )
    }
}

impl<R> Reducer<R, Fraction> {
    /// Share of records satisfying `matches` among all records of the key.
    ///
    /// Several fraction groups stacked on one dimension (one per category)
    /// stay independent: each reads the same active subset.
    pub fn fraction(matches: impl Fn(&R) -> bool + 'static) -> Self {
        let matches = Rc::new(matches);
        let m2 = Rc::clone(&matches);
        Reducer::new(
            Fraction::default,
            move |mut a, r| {
                a.total += 1;
                if matches(r) {
                    a.matched += 1;
                }
                a
            },
            move |mut a, r| {
                a.total -= 1;
                if m2(r) {
                    a.matched -= 1;
                }
                a
            },
        )
    }
}

/// Accumulator of [`Reducer::average`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Average {
    pub count: i64,
    pub total: f64,
    pub average: f64,
}

/// Accumulator of [`Reducer::fraction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fraction {
    pub total: i64,
    pub matched: i64,
}

impl Fraction {
    /// `matched / total`, defined as 0 when the denominator is 0
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Type-erased group as the frame drives it during filter changes
pub(crate) trait GroupCore<R> {
    fn record_entered(&mut self, key: Option<&Key>, record: &R);
    fn record_left(&mut self, key: Option<&Key>, record: &R);
    fn as_any(&self) -> &dyn Any;
}

/// Per-key accumulators of one keyed group.
///
/// Every key ever observed in the full record set stays present; a key whose
/// records are all filtered out reports its zero accumulator.
pub(crate) struct GroupState<R, A> {
    reducer: Reducer<R, A>,
    accs: HashMap<Key, A>,
    /// Distinct keys in first-seen record order, for deterministic snapshots
    key_order: Vec<Key>,
}

impl<R, A> GroupState<R, A> {
    pub(crate) fn new(reducer: Reducer<R, A>) -> Self {
        GroupState {
            reducer,
            accs: HashMap::new(),
            key_order: Vec::new(),
        }
    }

    /// Ensure `key` has an accumulator (the once-per-distinct-key
    /// `initial()` call)
    pub(crate) fn seed(&mut self, key: &Key) {
        if !self.accs.contains_key(key) {
            self.accs.insert(key.clone(), (self.reducer.initial)());
            self.key_order.push(key.clone());
        }
    }

    fn fold(&mut self, key: &Key, record: &R, adding: bool) {
        let acc = match self.accs.remove(key) {
            Some(acc) => acc,
            None => {
                self.key_order.push(key.clone());
                (self.reducer.initial)()
            }
        };
        let acc = if adding {
            (self.reducer.add)(acc, record)
        } else {
            (self.reducer.remove)(acc, record)
        };
        self.accs.insert(key.clone(), acc);
    }
}

impl<R, A> GroupState<R, A>
where
    A: Clone,
{
    pub(crate) fn snapshot(&self) -> Vec<GroupRow<A>> {
        self.key_order
            .iter()
            .map(|key| GroupRow {
                key: key.clone(),
                value: self.accs[key].clone(),
            })
            .collect()
    }
}

impl<R: 'static, A: 'static> GroupCore<R> for GroupState<R, A> {
    fn record_entered(&mut self, key: Option<&Key>, record: &R) {
        let Some(key) = key else { return };
        self.fold(key, record, true);
    }

    fn record_left(&mut self, key: Option<&Key>, record: &R) {
        let Some(key) = key else { return };
        self.fold(key, record, false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Single global accumulator over the whole active subset (no keys, no
/// self-filter exemption)
pub(crate) struct GroupAllState<R, A> {
    reducer: Reducer<R, A>,
    acc: A,
}

impl<R, A> GroupAllState<R, A> {
    pub(crate) fn new(reducer: Reducer<R, A>) -> Self {
        let acc = (reducer.initial)();
        GroupAllState { reducer, acc }
    }

    fn fold(&mut self, record: &R, adding: bool) {
        let acc = std::mem::replace(&mut self.acc, (self.reducer.initial)());
        self.acc = if adding {
            (self.reducer.add)(acc, record)
        } else {
            (self.reducer.remove)(acc, record)
        };
    }
}

impl<R, A> GroupAllState<R, A>
where
    A: Clone,
{
    pub(crate) fn value(&self) -> A {
        self.acc.clone()
    }
}

impl<R: 'static, A: 'static> GroupCore<R> for GroupAllState<R, A> {
    fn record_entered(&mut self, _key: Option<&Key>, record: &R) {
        self.fold(record, true);
    }

    fn record_left(&mut self, _key: Option<&Key>, record: &R) {
        self.fold(record, false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        salary: f64,
        rank: &'static str,
    }

    #[test]
    fn test_average_add_remove_inverse() {
        let reducer = Reducer::<Row, Average>::average(|r| r.salary);
        let r = Row {
            salary: 100.0,
            rank: "Prof",
        };
        let a = (reducer.add)(Average::default(), &r);
        let a = (reducer.add)(a, &Row {
            salary: 50.0,
            rank: "AsstProf",
        });
        let restored = (reducer.remove)((reducer.add)(a, &r), &r);
        assert_eq!(restored, a);
    }

    #[test]
    fn test_average_zero_count_resets_exactly() {
        let reducer = Reducer::<Row, Average>::average(|r| r.salary);
        let r = Row {
            salary: 123.0,
            rank: "Prof",
        };
        let acc = (reducer.add)(Average::default(), &r);
        assert_eq!(acc.average, 123.0);
        let acc = (reducer.remove)(acc, &r);
        assert_eq!(
            acc,
            Average {
                count: 0,
                total: 0.0,
                average: 0.0
            }
        );
    }

    #[test]
    fn test_fraction_ratio_guards_zero_denominator() {
        let reducer = Reducer::<Row, Fraction>::fraction(|r| r.rank == "Prof");
        let acc = Fraction::default();
        assert_eq!(acc.ratio(), 0.0);
        let acc = (reducer.add)(acc, &Row {
            salary: 1.0,
            rank: "Prof",
        });
        let acc = (reducer.add)(acc, &Row {
            salary: 1.0,
            rank: "AsstProf",
        });
        assert_eq!(acc, Fraction { total: 2, matched: 1 });
        assert_eq!(acc.ratio(), 0.5);
    }

    #[test]
    fn test_group_state_keeps_empty_keys() {
        let mut state = GroupState::<Row, i64>::new(Reducer::count());
        state.seed(&Key::from("Male"));
        state.seed(&Key::from("Female"));
        let r = Row {
            salary: 1.0,
            rank: "Prof",
        };
        state.record_entered(Some(&Key::from("Male")), &r);
        state.record_left(Some(&Key::from("Male")), &r);
        let rows = state.snapshot();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.value == 0));
    }
}
