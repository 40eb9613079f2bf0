//! URL handling module for Page-Sieve
//!
//! URLs are the cache keys, so every URL entering the crawler goes through
//! [`normalize_url`] first. Batches are de-duplicated after normalization.

mod normalize;

pub use normalize::{normalize_batch, normalize_url, parse_target, split_url_list};
