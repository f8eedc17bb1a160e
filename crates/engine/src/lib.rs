pub mod expr;
pub mod filter;
pub mod history;
pub mod host;
pub mod table;

pub use expr::Probe;
pub use host::MemoryHost;
pub use table::Table;
