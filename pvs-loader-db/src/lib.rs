pub mod connection;
pub mod copy;
pub mod loader;
pub mod plan;
pub mod sql;
pub mod store;

pub use connection::{Session, connect};

pub use copy::{LineCounter, locate_csv};

pub use loader::{
    RunReport,
    SnapshotLoader,
    Step,
    StepOutcome,
};

pub use plan::SnapshotPlan;

pub use store::{
    CopyOutcome,
    PgStore,
    SnapshotStore,
};
