//! Location: one row per distinct path.
//!
//! Locations are created lazily the first time a path is referenced and are
//! never deleted. Their ancestors are implied by label prefixes.

use serde::{Deserialize, Serialize};

use crate::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub id:   i64,
  pub path: Path,
}
