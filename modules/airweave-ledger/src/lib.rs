//! The Entity Ledger component (spec §4.7 / C8) and the Sync Cursor store
//! it sits alongside (spec §3, supplemented in `SPEC_FULL.md` §C.1).

pub mod cursor;
pub mod store;
pub mod types;

pub use cursor::SyncCursorStore;
pub use store::EntityLedgerStore;
pub use types::{LedgerAction, LedgerDiff, LedgerRow};
