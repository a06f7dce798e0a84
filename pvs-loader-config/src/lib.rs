pub mod setting;
pub mod snapshot;
pub mod dbconfig;

pub use setting::{Settings, ConfigSource, DEFAULT_CONFIG_FILE, DEFAULT_SECTION};
pub use snapshot::SnapshotConfig;
pub use dbconfig::ConnectionConfig;
