//! Post content kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Number of distinct content kinds the platform tracks. The diversity
/// sub-score saturates when a business has published all of them.
pub const TRACKED_KINDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Reel,
    Video,
    Short,
    Image,
}

impl PostKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PostKind::Reel => "reel",
            PostKind::Video => "video",
            PostKind::Short => "short",
            PostKind::Image => "image",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reel" => Ok(PostKind::Reel),
            "video" => Ok(PostKind::Video),
            "short" => Ok(PostKind::Short),
            "image" => Ok(PostKind::Image),
            other => Err(CoreError::UnknownPostKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for kind in [PostKind::Reel, PostKind::Video, PostKind::Short, PostKind::Image] {
            assert_eq!(kind.as_str().parse::<PostKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!("story".parse::<PostKind>().is_err());
    }
}
