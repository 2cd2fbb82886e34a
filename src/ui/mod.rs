/// UI module
///
/// - `gallery.rs` - the infinite-scrolling gallery widget
/// - `style.rs` - tile and loader styles, registered once by the host

pub mod gallery;
pub mod style;

pub use gallery::Gallery;
