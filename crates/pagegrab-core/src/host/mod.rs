//! Host capabilities the pipeline consumes: network fetch, ephemeral content
//! handles, and file save.
//!
//! Each capability is a trait so the orchestrator can be driven by the real
//! curl/filesystem implementations or by test doubles.

mod fetch;
mod handles;
mod save;

pub use fetch::{get_text, CurlFetcher, FetchError, FetchedText, Fetcher};
pub use handles::{ContentHandle, HandleLease, HandleStore};
pub use save::{
    download_to, numbered_path, reserve_unique_path, temp_path, ConflictAction, FsSaveHost,
    SaveError, SaveHost, SaveRequest, SaveSource,
};
