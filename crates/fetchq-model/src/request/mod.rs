mod fetch;
pub use fetch::{FetchRequest, ModuleVersion};
