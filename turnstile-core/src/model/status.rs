use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ELIGIBLE_CODE: &str = "1";
const WAITING_CODE: &str = "2";

/// Queue status pushed to every connected client on each poll tick.
///
/// Encoded as `<code>-<value>`: `1-` tells the head of the queue to send its
/// offer, `2-<n>` reports a waiting client's 0-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFrame {
    Eligible,
    Waiting(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("status frame has no '-' separator: {0:?}")]
    MissingSeparator(String),

    #[error("unknown status code {0:?}")]
    UnknownCode(String),

    #[error("invalid queue position {0:?}")]
    InvalidPosition(String),
}

impl fmt::Display for StatusFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFrame::Eligible => write!(f, "{ELIGIBLE_CODE}-"),
            StatusFrame::Waiting(position) => write!(f, "{WAITING_CODE}-{position}"),
        }
    }
}

impl FromStr for StatusFrame {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((code, value)) = s.split_once('-') else {
            return Err(FrameError::MissingSeparator(s.to_owned()));
        };

        match code {
            ELIGIBLE_CODE => Ok(StatusFrame::Eligible),
            WAITING_CODE => value
                .parse()
                .map(StatusFrame::Waiting)
                .map_err(|_| FrameError::InvalidPosition(value.to_owned())),
            other => Err(FrameError::UnknownCode(other.to_owned())),
        }
    }
}
