use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// Connection description produced by the media transport. The relay carries
/// it untouched; only the two transports ever look inside `sdp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// Messages exchanged between the two negotiation coordinators of a pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SignalingMessage {
    CallOffer { description: SessionDescription },
    CallAnswer { description: SessionDescription },
    NegotiationOffer { description: SessionDescription },
    NegotiationAnswer { description: SessionDescription },
    Candidate { candidate: IceCandidate },
}

impl SignalingMessage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallOffer { .. } => "call-offer",
            Self::CallAnswer { .. } => "call-answer",
            Self::NegotiationOffer { .. } => "negotiation-offer",
            Self::NegotiationAnswer { .. } => "negotiation-answer",
            Self::Candidate { .. } => "candidate",
        }
    }
}
