use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{error::FrameError, network::Network};

type HmacSha256 = Hmac<Sha256>;

const CHAIN_PREFIX: &str = "chain_";

/// The screen a post-back came from. Absence of a state means the initial card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Overview,
    Chain(Network),
}

impl FrameState {
    pub fn tag(&self) -> String {
        match self {
            FrameState::Overview => "overview".to_owned(),
            FrameState::Chain(network) => format!("{}{}", CHAIN_PREFIX, network.name()),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag == "overview" {
            return Some(FrameState::Overview);
        }
        tag.strip_prefix(CHAIN_PREFIX)
            .and_then(|name| name.parse().ok())
            .map(FrameState::Chain)
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Signs frame states into `<tag>.<mac>` tokens and verifies them on the way
/// back, so a client can only echo states this server issued.
#[derive(Clone)]
pub struct StateCodec {
    key: Vec<u8>,
}

impl StateCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, tag: &str) -> HmacSha256 {
        // HMAC takes keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(tag.as_bytes());
        mac
    }

    pub fn encode(&self, state: FrameState) -> String {
        let tag = state.tag();
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&tag).finalize().into_bytes());
        format!("{}.{}", tag, signature)
    }

    pub fn decode(&self, token: &str) -> Result<FrameState, FrameError> {
        let (tag, signature) = split_token(token)
            .ok_or_else(|| FrameError::malformed(format!("state token {:?} is unsigned", token)))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|error| FrameError::malformed(format!("state signature: {}", error)))?;
        self.mac(tag)
            .verify_slice(&signature)
            .map_err(|_| FrameError::malformed(format!("state {:?} failed verification", tag)))?;
        FrameState::from_tag(tag)
            .ok_or_else(|| FrameError::malformed(format!("unknown frame state {:?}", tag)))
    }
}

fn split_token(token: &str) -> Option<(&str, &str)> {
    let index = token.rfind('.')?;
    Some((&token[..index], &token[index + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(FrameState::Overview.tag(), "overview");
        assert_eq!(FrameState::Chain(Network::Osmosis).tag(), "chain_osmosis");
        assert_eq!(
            FrameState::from_tag("chain_base"),
            Some(FrameState::Chain(Network::Base))
        );
        assert_eq!(FrameState::from_tag("chain_solana"), None);
        assert_eq!(FrameState::from_tag("initial"), None);
    }

    #[test]
    fn tokens_round_trip() {
        let codec = StateCodec::new("secret");
        for state in [
            FrameState::Overview,
            FrameState::Chain(Network::Ethereum),
            FrameState::Chain(Network::Osmosis),
        ]
        .iter()
        {
            let token = codec.encode(*state);
            assert!(token.starts_with(&state.tag()));
            assert_eq!(codec.decode(&token).unwrap(), *state);
        }
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let codec = StateCodec::new("secret");
        let token = codec.encode(FrameState::Chain(Network::Base));
        let forged = token.replacen("chain_base", "chain_optimism", 1);
        assert!(codec.decode(&forged).is_err());
        assert!(codec.decode("chain_base").is_err());
        assert!(codec.decode("overview.not-base64!").is_err());
        assert!(StateCodec::new("other").decode(&token).is_err());
    }
}
