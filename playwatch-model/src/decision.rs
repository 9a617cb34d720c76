use std::fmt::{self, Display, Formatter};

/// How a stream reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StreamDecision {
    /// Original file bytes, untouched.
    #[default]
    DirectPlay,
    /// Streams remuxed into a different container without re-encoding.
    Copy,
    /// At least one stream re-encoded on the server.
    Transcode,
}

impl StreamDecision {
    pub fn is_transcode(&self) -> bool {
        matches!(self, StreamDecision::Transcode)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamDecision::DirectPlay => "directplay",
            StreamDecision::Copy => "copy",
            StreamDecision::Transcode => "transcode",
        }
    }
}

impl Display for StreamDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
