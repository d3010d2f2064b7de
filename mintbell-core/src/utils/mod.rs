pub mod dedup_ring;
pub mod shutdown;

pub use dedup_ring::DedupRing;
