#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

pub mod cache;
pub mod hash;
pub mod sync;

// -----------------------------------------------------------------------------
// Top-level exports

pub use cache::CacheMap;
