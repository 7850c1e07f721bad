use crate::engine::{FacetError, FilterPredicate, Key};

/// Handle to a dimension registered on a [`Frame`](crate::engine::frame::Frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionHandle(pub(crate) usize);

/// Per-dimension state: the cached key of every record, the reverse index
/// (record indices sorted by key, ties by insertion order) and the active
/// filter.
///
/// `window` is the current passing set expressed as an interval of the
/// reverse index, maintained whenever the filter is window-shaped (none,
/// equals, or an ordered predicate on an orderable dimension). Replacing one
/// window filter with another then yields the enter/leave delta from two
/// binary searches plus interval differences, never a rescan.
pub(crate) struct DimensionState {
    name: String,
    keys: Vec<Key>,
    /// Record indices sorted by `(key, insertion index)`; `None` when the
    /// observed keys are not mutually comparable.
    order: Option<Vec<u32>>,
    filter: Option<FilterPredicate>,
    window: Option<(usize, usize)>,
}

/// How a filter replacement reaches the records whose pass status flips
pub(crate) enum FilterDelta {
    /// Reverse-index position ranges entering/leaving the passing set
    Windows {
        enter: [(usize, usize); 2],
        leave: [(usize, usize); 2],
    },
    /// Arbitrary predicate: evaluate per key, emit transitions only
    Rescan,
}

impl DimensionState {
    pub(crate) fn new(name: String, keys: Vec<Key>) -> Self {
        let orderable = match keys.first() {
            None => true,
            Some(first) => keys[1..]
                .iter()
                .all(|k| first.same_kind(k) && first.try_cmp(k).is_some()),
        };
        let order = orderable.then(|| {
            let mut idx: Vec<u32> = (0..keys.len() as u32).collect();
            // stable by construction: ties keep ascending insertion order
            idx.sort_by(|&a, &b| {
                keys[a as usize]
                    .try_cmp(&keys[b as usize])
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.cmp(&b))
            });
            idx
        });
        let n = keys.len();
        let window = order.is_some().then_some((0, n));
        DimensionState {
            name,
            keys,
            order,
            filter: None,
            window,
        }
    }

    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn key_of(&self, record: usize) -> &Key {
        &self.keys[record]
    }

    pub(crate) fn is_orderable(&self) -> bool {
        self.order.is_some()
    }

    pub(crate) fn order(&self) -> Result<&[u32], FacetError> {
        self.order
            .as_deref()
            .ok_or_else(|| FacetError::UndefinedKeyOrder(self.name.clone()))
    }

    /// Plan the delta for replacing the current filter with `pred`, then
    /// commit `pred` as the active filter.
    ///
    /// Ordered predicates on a non-orderable dimension are rejected before
    /// any state changes.
    pub(crate) fn replace_filter(
        &mut self,
        pred: Option<FilterPredicate>,
    ) -> Result<FilterDelta, FacetError> {
        if pred.as_ref().is_some_and(|p| p.needs_order()) && self.order.is_none() {
            return Err(FacetError::UndefinedKeyOrder(self.name.clone()));
        }

        let new_window = self.window_for(pred.as_ref());
        let delta = match (self.window, new_window) {
            (Some(old), Some(new)) => FilterDelta::Windows {
                enter: interval_diff(new, old),
                leave: interval_diff(old, new),
            },
            _ => FilterDelta::Rescan,
        };

        self.window = new_window;
        self.filter = pred;
        Ok(delta)
    }

    pub(crate) fn filter(&self) -> Option<&FilterPredicate> {
        self.filter.as_ref()
    }

    pub(crate) fn record_passes(&self, record: usize) -> bool {
        match &self.filter {
            None => true,
            Some(p) => p.matches(&self.keys[record]),
        }
    }

    /// Passing set as a reverse-index interval, when the predicate admits one
    fn window_for(&self, pred: Option<&FilterPredicate>) -> Option<(usize, usize)> {
        let order = self.order.as_deref()?;
        let n = order.len();
        // a bound key of a foreign kind compares with no key, so the
        // predicate matches nothing
        let kind_ok = match pred {
            Some(
                FilterPredicate::Equals(k)
                | FilterPredicate::GreaterThan(k)
                | FilterPredicate::LessThan(k),
            ) => self.keys.first().is_none_or(|f| f.same_kind(k)),
            Some(FilterPredicate::Between(lo, hi)) => self
                .keys
                .first()
                .is_none_or(|f| f.same_kind(lo) && f.same_kind(hi)),
            _ => true,
        };
        if !kind_ok {
            return Some((0, 0));
        }
        let key_at = |pos: usize| &self.keys[order[pos] as usize];
        // partition point over the sorted index
        let lower = |k: &Key, inclusive: bool| {
            let mut lo = 0;
            let mut hi = n;
            while lo < hi {
                let mid = (lo + hi) / 2;
                let below = match key_at(mid).try_cmp(k) {
                    Some(std::cmp::Ordering::Less) => true,
                    Some(std::cmp::Ordering::Equal) => !inclusive,
                    _ => false,
                };
                if below {
                    lo = mid + 1;
                } else {
                    hi = mid;
                }
            }
            lo
        };

        match pred {
            None => Some((0, n)),
            Some(FilterPredicate::Equals(k)) => Some((lower(k, true), lower(k, false))),
            Some(FilterPredicate::GreaterThan(k)) => Some((lower(k, false), n)),
            Some(FilterPredicate::LessThan(k)) => Some((0, lower(k, true))),
            Some(FilterPredicate::Between(lo, hi)) => Some((lower(lo, true), lower(hi, true))),
            Some(FilterPredicate::Custom(_)) => None,
        }
    }
}

/// Positions in interval `a` but not in `b` (up to two disjoint ranges)
fn interval_diff(a: (usize, usize), b: (usize, usize)) -> [(usize, usize); 2] {
    let head = (a.0, a.1.min(b.0).max(a.0));
    let tail = (a.0.max(b.1).min(a.1), a.1);
    [head, tail]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_keys(vals: &[i64]) -> Vec<Key> {
        vals.iter().map(|&v| Key::Int(v)).collect()
    }

    #[test]
    fn test_reverse_index_breaks_ties_by_insertion_order() {
        let dim = DimensionState::new("x".into(), int_keys(&[20, 10, 20, 5]));
        assert_eq!(dim.order().unwrap(), &[3, 1, 0, 2]);
    }

    #[test]
    fn test_mixed_keys_are_not_orderable() {
        let dim = DimensionState::new(
            "x".into(),
            vec![Key::Int(1), Key::Str("a".into())],
        );
        assert!(!dim.is_orderable());
        assert!(matches!(
            dim.order(),
            Err(FacetError::UndefinedKeyOrder(_))
        ));
    }

    #[test]
    fn test_window_for_between() {
        let dim = DimensionState::new("x".into(), int_keys(&[5, 10, 15, 20, 25]));
        let w = dim
            .window_for(Some(&FilterPredicate::Between(Key::Int(10), Key::Int(25))))
            .unwrap();
        // sorted order equals insertion order here; [10, 25) covers 10,15,20
        assert_eq!(w, (1, 4));
    }

    #[test]
    fn test_window_for_equals_run() {
        let dim = DimensionState::new("x".into(), int_keys(&[7, 3, 7, 9]));
        let w = dim
            .window_for(Some(&FilterPredicate::Equals(Key::Int(7))))
            .unwrap();
        assert_eq!(w, (1, 3));
    }

    #[test]
    fn test_foreign_kind_bound_matches_nothing() {
        let dim = DimensionState::new("x".into(), int_keys(&[5, 10, 15]));
        for pred in [
            FilterPredicate::Equals(Key::Str("a".into())),
            FilterPredicate::GreaterThan(Key::Str("a".into())),
            FilterPredicate::Between(Key::Str("a".into()), Key::Str("z".into())),
        ] {
            assert_eq!(dim.window_for(Some(&pred)), Some((0, 0)));
        }
    }

    #[test]
    fn test_interval_diff_disjoint_and_overlapping() {
        assert_eq!(interval_diff((0, 10), (20, 30)), [(0, 10), (10, 10)]);
        assert_eq!(interval_diff((0, 10), (5, 30)), [(0, 5), (10, 10)]);
        assert_eq!(interval_diff((0, 30), (10, 20)), [(0, 10), (20, 30)]);
        assert_eq!(interval_diff((10, 20), (0, 30)), [(10, 10), (20, 20)]);
    }

    #[test]
    fn test_replace_filter_rejects_ordered_predicate_without_order() {
        let mut dim = DimensionState::new(
            "x".into(),
            vec![Key::Int(1), Key::Str("a".into())],
        );
        let err = dim.replace_filter(Some(FilterPredicate::GreaterThan(Key::Int(0))));
        assert!(matches!(err, Err(FacetError::UndefinedKeyOrder(_))));
        // state untouched, equals still usable
        assert!(dim.filter().is_none());
        assert!(dim
            .replace_filter(Some(FilterPredicate::Equals(Key::Int(1))))
            .is_ok());
        assert!(dim.record_passes(0));
        assert!(!dim.record_passes(1));
    }
}
