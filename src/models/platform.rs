use serde::{Deserialize, Serialize};
use std::fmt;

/// Known social platforms a job may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Twitter,
    Tiktok,
    Facebook,
    Linkedin,
    Youtube,
    Pinterest,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Self::Instagram,
        Self::Twitter,
        Self::Tiktok,
        Self::Facebook,
        Self::Linkedin,
        Self::Youtube,
        Self::Pinterest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
            Self::Linkedin => "linkedin",
            Self::Youtube => "youtube",
            Self::Pinterest => "pinterest",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|platform| platform.as_str() == s)
            .ok_or_else(|| format!("Invalid platform: {s}"))
    }
}
