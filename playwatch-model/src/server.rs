use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Media server vendor a session was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ServerType {
    Plex,
    Jellyfin,
    Emby,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Plex => "plex",
            ServerType::Jellyfin => "jellyfin",
            ServerType::Emby => "emby",
        }
    }
}

impl Display for ServerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plex" => Ok(ServerType::Plex),
            "jellyfin" => Ok(ServerType::Jellyfin),
            "emby" => Ok(ServerType::Emby),
            other => Err(format!("unknown server type: {other}")),
        }
    }
}
