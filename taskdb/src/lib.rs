pub mod mem_store;
#[cfg(feature = "mysql")]
pub mod mysql_store;

pub use mem_store::{InMemoryStageRecordStore, InMemoryTaskStore};
#[cfg(feature = "mysql")]
pub use mysql_store::{open_pool, MySqlConfig, MySqlStageRecordStore, MySqlTaskStore};
