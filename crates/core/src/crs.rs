//! Coordinate Reference System tags
//!
//! The toolkit performs no reprojection. Point, envelope and reference
//! layers are expected to share one planar CRS whose linear unit matches
//! the blur radius; `Crs` is the identity tag used to validate that
//! expectation before a run starts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Coordinate Reference System identity tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    authid: String,
}

impl Crs {
    /// Create a CRS tag from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            authid: format!("EPSG:{code}"),
        }
    }

    /// Create a CRS tag from an authority identifier such as `"EPSG:32719"`
    pub fn from_authid(authid: impl Into<String>) -> Self {
        Self {
            authid: authid.into(),
        }
    }

    /// The authority identifier
    pub fn authid(&self) -> &str {
        &self.authid
    }

    /// Fail with `CrsMismatch` unless both tags name the same CRS.
    pub fn ensure_matches(&self, other: &Crs) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(Error::CrsMismatch(
                self.authid.clone(),
                other.authid.clone(),
            ))
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.authid)
    }
}
