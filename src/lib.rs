//! Reader and writer for classic Mac OS resource forks.
//!
//! ```
//! use rsrcfork::format::{rsrc::{Resource, ResourceMap}, FourCC};
//!
//! let mut map = ResourceMap::new();
//! map.types.insert(FourCC(*b"TEST"), vec![Resource {
//!     id: 128,
//!     name: Some("Ship".to_string()),
//!     attributes: 0,
//!     data: vec![1, 2, 3, 4],
//! }]);
//! let data = map.write().unwrap();
//! assert_eq!(ResourceMap::read(&data).unwrap(), map);
//! ```
pub mod error;
pub mod format;
pub mod util;

pub use error::{Error, Result};
pub use format::{
    rsrc::{Resource, ResourceMap},
    FourCC,
};
