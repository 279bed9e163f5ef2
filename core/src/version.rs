//! Two-component (major, minor) version with a total order (spec §4.2).

use crate::error::{MoldError, Result, Status};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A `major.minor` version. Field declaration order is load-bearing:
/// deriving `Ord` on `(major, minor)` gives exactly the lexicographic
/// total order spec §4.2 asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The version every freshly-begun mold/config starts at.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(1, 0)
    }
}

impl FromStr for Version {
    type Err = MoldError;

    /// Accepts `M` or `M.N` (`N` defaults to 0). Negative components are
    /// rejected by construction: `u32::from_str` fails on a leading `-`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, '.');
        let major_str = parts.next().unwrap_or("");
        if major_str.is_empty() {
            return Err(MoldError::new(Status::InvalidArgument, "empty version string"));
        }
        let major: u32 = major_str.parse().map_err(|_| {
            MoldError::new(
                Status::InvalidArgument,
                format!("invalid major version component: {major_str}"),
            )
        })?;
        let minor = match parts.next() {
            Some(minor_str) => minor_str.parse().map_err(|_| {
                MoldError::new(
                    Status::InvalidArgument,
                    format!("invalid minor version component: {minor_str}"),
                )
            })?,
            None => 0,
        };
        Ok(Self::new(major, minor))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

/// `introduced <= v < deprecated` (deprecated of 0 means "never").
#[must_use]
pub fn applicable_at(introduced: Version, deprecated: Option<Version>, v: Version) -> bool {
    introduced <= v && deprecated.map_or(true, |d| v < d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_only() {
        assert_eq!("3".parse::<Version>().unwrap(), Version::new(3, 0));
    }

    #[test]
    fn parses_major_minor() {
        assert_eq!("2.5".parse::<Version>().unwrap(), Version::new(2, 5));
    }

    #[test]
    fn rejects_negative() {
        assert!("-1".parse::<Version>().is_err());
        assert!("1.-2".parse::<Version>().is_err());
    }

    #[test]
    fn total_order_is_lexicographic() {
        assert!(Version::new(1, 9) < Version::new(2, 0));
        assert!(Version::new(2, 0) < Version::new(2, 1));
        assert_eq!(Version::new(2, 1), Version::new(2, 1));
    }

    #[test]
    fn formats_as_major_dot_minor() {
        assert_eq!(Version::new(1, 0).to_string(), "1.0");
    }
}
