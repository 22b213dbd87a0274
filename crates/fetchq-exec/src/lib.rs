mod error;
pub use error::ExecError;

mod proxy;
pub use proxy::{HttpModuleProxy, escape_path};

mod store;
pub use store::MemoryStore;

mod processor;
pub use processor::FetchAndStore;
