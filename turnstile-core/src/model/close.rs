/// Reasons the gateway closes a signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Queue was full when the client connected.
    CapacityExceeded,
    /// Answer delivered; the client's turn is over.
    Negotiated,
    /// The client sent something that is not a negotiation frame.
    MalformedFrame,
    /// The client was eligible but did not send its offer in time.
    OfferTimeout,
    /// The engine could not produce an answer.
    NegotiationFailed,
}

impl CloseReason {
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::CapacityExceeded => 1013,
            CloseReason::Negotiated => 1000,
            CloseReason::MalformedFrame => 1007,
            CloseReason::OfferTimeout => 1008,
            CloseReason::NegotiationFailed => 1011,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            CloseReason::CapacityExceeded => "Maximum Websocket Connection Reached",
            CloseReason::Negotiated => "WebRTC Connection Successful",
            CloseReason::MalformedFrame => "Malformed negotiation frame",
            CloseReason::OfferTimeout => "Offer not received in time",
            CloseReason::NegotiationFailed => "Negotiation failed",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        [
            CloseReason::CapacityExceeded,
            CloseReason::Negotiated,
            CloseReason::MalformedFrame,
            CloseReason::OfferTimeout,
            CloseReason::NegotiationFailed,
        ]
        .into_iter()
        .find(|r| r.code() == code)
    }
}
