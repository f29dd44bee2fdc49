//! URL handling module for Gig-Crawler
//!
//! Listing URLs are the natural key for deduplication, so every scraped URL
//! goes through the same canonical form before it is compared or stored.

mod canonical;

pub use canonical::{canonical_listing_key, canonicalize_url};
