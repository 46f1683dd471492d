//! Rate collection from the central bank's statistics page.
//!
//! ## Architecture
//!
//! - `transport` - HTTP fetching behind the `Transport` trait
//! - `locator` - Paginated discovery of spreadsheet download links
//! - `extractor` - Worksheet parsing into `Rate` records

pub mod error;
pub mod extractor;
pub mod locator;
pub mod transport;

pub use error::*;
pub use extractor::*;
pub use locator::*;
pub use transport::*;
