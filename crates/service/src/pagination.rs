//! Offset/limit pagination over sorted listings.

use serde::Deserialize;

/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 1000;

/// Pagination parameters. Absent `limit` means "everything from `offset` on".
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Pagination {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Pagination {
    /// Clamp to sane values: offset defaults to 0, limit to `1..=MAX_LIMIT`.
    pub fn normalize(self) -> (usize, Option<usize>) {
        (self.offset.unwrap_or(0), self.limit.map(|l| l.clamp(1, MAX_LIMIT)))
    }

    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        let (offset, limit) = self.normalize();
        let page = items.into_iter().skip(offset);
        match limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        }
    }
}
