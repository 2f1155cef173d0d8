//! Rolling, session-tagged log of recorded interactions.

pub mod api;
pub mod config;
pub mod errors;
pub mod model;
pub mod read;
pub mod ring;
pub mod session;
pub mod storage;

pub use api::{AppendAck, EventLog};
pub use config::LogPolicy;
pub use errors::{EsError, EsErrorKind, EsResult};
pub use model::{
    ActiveElement, ElementAttributes, ElementContext, EntryFilter, EventContext, LogEntry,
    Modifiers, MouseInfo, PageInfo, Position, ScrollDirection, ScrollInfo, ScrollPosition,
    Viewport,
};
pub use read::{export_entries, write_export_file, ExportFormat};
pub use ring::RollingBuffer;
pub use session::{SessionInfo, SessionStats, StatsTable};
pub use storage::{FileStorage, LogStorage, MemoryStorage, StorageManager};
