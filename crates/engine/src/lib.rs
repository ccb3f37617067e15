pub mod bulk;
pub mod controller;
pub mod error;
pub mod events;
pub mod filter;
pub mod input;
pub mod loader;
pub mod rows;

pub use bulk::{BulkReport, DispatchedBulk, GroupOutcome, GroupPlan, PendingBulk};
pub use controller::GridController;
pub use error::GridError;
pub use events::{EventQueue, GridEvent, Notice, NoticeLevel};
pub use filter::{StatusFilter, VisibleRow};
pub use input::{Direction, GridInput, Key};
pub use loader::{
    AcquisitionPath, JobHandle, LoadOutcome, LoadRequest, LoadState, LoadTicket, LoaderConfig,
    SnapshotLoader,
};
pub use rows::{DetailState, PersonRow, RowStore};
