pub mod cache;
pub mod defaults;
pub mod fetcher;
pub mod key;
pub mod reader;


pub use cache::CacheStore;
pub use defaults::DefaultDatasets;
pub use key::TrackSetKey;
pub use reader::{LoadedTable, Provenance, TrackSetReader};
