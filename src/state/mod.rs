/// State management module
///
/// This module handles all gallery state:
/// - Shared data structures (data.rs)
/// - The scroll pager and its fetch slot (pager.rs)

pub mod data;
pub mod pager;
