/// Immutable store of typed records, loaded once at startup.
///
/// Records keep their input order for the process lifetime; only membership
/// in the active subset (tracked by the frame, not here) ever changes.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    records: Vec<R>,
}

impl<R> RecordStore<R> {
    /// Accepts pre-typed rows. Parse failures happen upstream in the
    /// loader, which never hands over a partial row set.
    pub fn load(records: Vec<R>) -> Self {
        RecordStore { records }
    }

    /// All records, in stable input order
    pub fn all(&self) -> &[R] {
        &self.records
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&R> {
        self.records.get(idx)
    }
}
