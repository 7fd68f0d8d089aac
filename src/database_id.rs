//! Database ID type definition and the request bodies that carry many IDs.

use serde::{Deserialize, Serialize};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The body of a bulk delete request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteForm {
    /// The IDs of the rows to delete.
    pub ids: Vec<DatabaseId>,
}

/// A row that was removed by a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRow {
    /// The ID the row had.
    pub id: DatabaseId,
}
