use itertools::join;
use thiserror::Error;

use crate::network::Network;

/// An RPC endpoint that failed its liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub url: String,
    pub reason: String,
}

/// Everything that turns a frame request into the error card.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("all RPC providers failed for {chain}: [{}]", describe_failures(.failures))]
    ProviderExhausted {
        chain: Network,
        failures: Vec<EndpointFailure>,
    },

    #[error("failed to fetch {source_name}: {message}")]
    FetchFailure { source_name: String, message: String },

    #[error("malformed frame request: {0}")]
    MalformedRequest(String),
}

impl FrameError {
    pub fn fetch(source_name: impl Into<String>, error: anyhow::Error) -> Self {
        FrameError::FetchFailure {
            source_name: source_name.into(),
            message: format!("{:#}", error),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        FrameError::MalformedRequest(message.into())
    }
}

fn describe_failures(failures: &[EndpointFailure]) -> String {
    join(
        failures
            .iter()
            .map(|failure| format!("{} -> {}", failure.url, failure.reason)),
        "; ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_lists_every_endpoint() {
        let error = FrameError::ProviderExhausted {
            chain: Network::Base,
            failures: vec![
                EndpointFailure {
                    url: "https://a.example".to_owned(),
                    reason: "timeout".to_owned(),
                },
                EndpointFailure {
                    url: "https://b.example".to_owned(),
                    reason: "rate limited".to_owned(),
                },
            ],
        };
        assert_eq!(
            error.to_string(),
            "all RPC providers failed for base: [https://a.example -> timeout; https://b.example -> rate limited]"
        );
    }
}
