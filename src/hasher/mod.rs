pub mod cache;
pub mod digest;

pub use cache::{HashCache, HashCacheEntry};
pub use digest::{compute_digest, HashMethod};
