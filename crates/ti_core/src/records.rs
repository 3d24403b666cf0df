use std::sync::Arc;

/// One API-backed entity that projects into a single tabular row.
pub trait Record {
    /// Stable unique id within the source system, when known.
    fn record_id(&self) -> Option<&str>;

    /// Query string that produced this record, kept for provenance.
    fn source_query(&self) -> Option<&str>;
}

/// Ordered collection of records parsed from one bulk API response.
///
/// Derivative lists (filtered or re-sorted views) share the parent's records
/// through `Arc` and copy only the scalar metadata declared by
/// `with_records`. The parent list is never mutated by derivation.
pub trait RecordList: Sized {
    type Item: Record;

    /// Total record count reported by the API. May exceed the number of
    /// records actually loaded, e.g. when the response was paginated.
    fn total_records(&self) -> Option<u64>;

    /// Query string that produced this list, when known.
    fn source_query(&self) -> Option<&str>;

    fn records(&self) -> &[Arc<Self::Item>];

    /// Shallow-copy builder: a new list carrying the same scalar metadata
    /// and the given record sequence.
    fn with_records(&self, records: Vec<Arc<Self::Item>>) -> Self;

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn get(&self, index: usize) -> Option<&Arc<Self::Item>> {
        self.records().get(index)
    }
}
