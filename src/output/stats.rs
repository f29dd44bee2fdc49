//! Listing statistics from the store
//!
//! Counts stored listings per platform and prints them in a readable form.

use crate::output::OutputResult;
use crate::storage::Storage;
use serde::Serialize;
use std::collections::BTreeMap;

/// Listing counts summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingStatistics {
    /// Total number of stored listings
    pub total: u64,

    /// Count of listings per platform
    pub by_platform: BTreeMap<String, u64>,
}

/// Loads statistics from storage
///
/// Every name in `platforms` appears in the result, with zero when nothing
/// has been stored for it yet. Platforms found in the store but not listed
/// are kept as well.
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `platforms` - Platforms that must be reported even when empty
pub fn load_statistics(
    storage: &dyn Storage,
    platforms: &[&str],
) -> OutputResult<ListingStatistics> {
    let mut by_platform = storage.platform_counts()?;
    for platform in platforms {
        by_platform.entry(platform.to_string()).or_insert(0);
    }

    Ok(ListingStatistics {
        total: by_platform.values().sum(),
        by_platform,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ListingStatistics) {
    println!("=== Listing Statistics ===\n");
    println!("Total listings: {}", stats.total);
    println!();

    println!("By Platform:");
    let mut counts: Vec<_> = stats.by_platform.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (platform, count) in counts {
        let percentage = if stats.total > 0 {
            (*count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", platform, count, percentage);
    }
}
