//! Reference directories for the Slack bridge.
//!
//! Tool handlers accept `#channel`, `@user` and `@mpdm-…` references as well
//! as raw IDs. [`DirectoryCache`] turns those into Slack IDs, loading the
//! directory lazily and refreshing it once on a miss.

mod cache;
mod error;
mod snapshot;

pub use cache::{DirectoryCache, DirectoryConfig, RefreshPolicy};
pub use error::{DirectoryError, DirectoryResult};
pub use snapshot::{DirectoryEntry, DirectoryKind, DirectorySnapshot, EntryKind};
