//! To ease access to most frequently items
//!

pub use crate::error::*;

pub use crate::network::*;
pub use crate::embedding::*;
pub use crate::embedder::*;
pub use crate::knn::*;

pub use crate::tools::dist::*;
pub use crate::tools::edge::*;
