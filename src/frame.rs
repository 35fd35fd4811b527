use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use serde::Deserialize;

use crate::{
    error::FrameError,
    html::{FrameButton, FrameMeta},
    network::Network,
    settings::Settings,
    state::{FrameState, StateCodec},
    svg::{render_chain, render_error, render_overview, svg_data_uri},
    weighting::Valuation,
    MarketSource,
};

/// A frame action as posted by the client.
#[derive(Debug, Default, Deserialize)]
pub struct FrameAction {
    #[serde(rename = "untrustedData", default)]
    pub untrusted_data: Option<UntrustedData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedData {
    pub fid: Option<u64>,
    pub button_index: Option<u8>,
    pub state: Option<String>,
}

/// An empty body is not an action; anything else must be valid JSON.
pub fn parse_action(body: &[u8]) -> Result<Option<FrameAction>, FrameError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|error| FrameError::malformed(format!("frame action body: {}", error)))
}

/// The card to render next. Errors are not a screen of their own: any screen
/// whose data cannot be fetched renders the error card instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Initial,
    Overview,
    ChainDetail(Network),
}

pub const BACK_BUTTON: u8 = 1;
pub const SHOW_PRICES_BUTTON: u8 = 1;

pub fn next_screen(prior: Option<FrameState>, button: Option<u8>) -> Screen {
    match (prior, button) {
        (None, Some(SHOW_PRICES_BUTTON)) => Screen::Overview,
        (None, _) => Screen::Initial,
        (Some(FrameState::Overview), Some(index)) => match Network::from_button(index) {
            Some(network) => Screen::ChainDetail(network),
            None => Screen::Overview,
        },
        (Some(FrameState::Overview), None) => Screen::Overview,
        (Some(FrameState::Chain(_)), Some(BACK_BUTTON)) => Screen::Overview,
        (Some(FrameState::Chain(network)), _) => Screen::ChainDetail(network),
    }
}

/// Turns frame requests into cards.
pub struct FrameResponder {
    settings: Arc<Settings>,
    codec: StateCodec,
    market: Arc<dyn MarketSource>,
}

impl FrameResponder {
    pub fn new(settings: Arc<Settings>, market: Arc<dyn MarketSource>) -> Self {
        let codec = StateCodec::new(&settings.state_secret);
        Self {
            settings,
            codec,
            market,
        }
    }

    /// Handles a post-back. Never fails: errors become the error card.
    pub async fn respond(&self, query_state: Option<&str>, body: &[u8]) -> FrameMeta {
        match self.try_respond(query_state, body).await {
            Ok(frame) => frame,
            Err(error) => {
                error!("Frame request failed: {}", error);
                self.error(&error)
            }
        }
    }

    async fn try_respond(
        &self,
        query_state: Option<&str>,
        body: &[u8],
    ) -> Result<FrameMeta, FrameError> {
        let action = match parse_action(body)? {
            Some(action) => action,
            None => return Ok(self.initial()),
        };
        let data = action.untrusted_data.unwrap_or_default();
        let token = query_state.or_else(|| data.state.as_deref());
        let prior = match token {
            Some(token) => Some(self.codec.decode(token)?),
            None => None,
        };
        let screen = next_screen(prior, data.button_index);
        info!(
            "fid {:?} pressed {:?} from {} -> {:?}",
            data.fid,
            data.button_index,
            prior.map(|state| state.tag()).unwrap_or_else(|| "initial".to_owned()),
            screen
        );
        self.render(screen).await
    }

    pub async fn render(&self, screen: Screen) -> Result<FrameMeta, FrameError> {
        match screen {
            Screen::Initial => Ok(self.initial()),
            Screen::Overview => {
                let valuation = self.valuation().await?;
                Ok(self.overview(&valuation))
            }
            Screen::ChainDetail(network) => {
                let valuation = self.valuation().await?;
                Ok(self.chain(&valuation, network))
            }
        }
    }

    pub async fn valuation(&self) -> Result<Valuation, FrameError> {
        let snapshot = self.market.snapshot().await?;
        let valuation = Valuation::from_snapshot(&snapshot, &self.settings.supply);
        info!(
            "Weighted price {:.6}, weights {:?}",
            valuation.weighted_price, valuation.effective_weights
        );
        Ok(valuation)
    }

    fn post_url(&self, state: Option<FrameState>) -> String {
        match state {
            Some(state) => format!(
                "{}?state={}",
                self.settings.frame_url(),
                self.codec.encode(state)
            ),
            None => self.settings.frame_url(),
        }
    }

    fn frame(
        &self,
        image: String,
        buttons: Vec<FrameButton>,
        state: Option<FrameState>,
    ) -> FrameMeta {
        FrameMeta {
            image,
            buttons,
            post_url: self.post_url(state),
            state: state.map(|state| self.codec.encode(state)),
        }
    }

    pub fn initial(&self) -> FrameMeta {
        self.frame(
            self.settings.static_image_url.clone(),
            vec![
                FrameButton::post("Show Prices"),
                FrameButton::link(
                    "Trade $PAGE on Base",
                    self.settings.dex_url(Network::Base),
                ),
                FrameButton::link("Visit PageDAO.org", self.settings.links.pagedao.as_str()),
                FrameButton::link("Join PAGE Channel", self.settings.links.channel.as_str()),
            ],
            None,
        )
    }

    pub fn overview(&self, valuation: &Valuation) -> FrameMeta {
        let svg = render_overview(valuation, Utc::now());
        self.frame(
            svg_data_uri(&svg),
            Network::ALL
                .iter()
                .map(|network| FrameButton::post(network.label()))
                .collect(),
            Some(FrameState::Overview),
        )
    }

    pub fn chain(&self, valuation: &Valuation, network: Network) -> FrameMeta {
        let svg = render_chain(valuation, network, Utc::now());
        self.frame(
            svg_data_uri(&svg),
            vec![
                FrameButton::post("Back"),
                FrameButton::post("Refresh"),
                FrameButton::link(
                    format!("Trade on {}", network.label()),
                    self.settings.dex_url(network),
                ),
            ],
            Some(FrameState::Chain(network)),
        )
    }

    /// The retry button posts without a state, so it is handled like the
    /// initial card's "Show Prices".
    pub fn error(&self, error: &FrameError) -> FrameMeta {
        let svg = render_error(&error.to_string());
        self.frame(
            svg_data_uri(&svg),
            vec![
                FrameButton::post("Retry"),
                FrameButton::link("Visit PageDAO.org", self.settings.links.pagedao.as_str()),
            ],
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        assert_eq!(next_screen(None, Some(1)), Screen::Overview);
        assert_eq!(next_screen(None, None), Screen::Initial);
        assert_eq!(next_screen(None, Some(3)), Screen::Initial);
        assert_eq!(
            next_screen(Some(FrameState::Overview), Some(2)),
            Screen::ChainDetail(Network::Optimism)
        );
        assert_eq!(
            next_screen(Some(FrameState::Overview), Some(4)),
            Screen::ChainDetail(Network::Osmosis)
        );
        assert_eq!(next_screen(Some(FrameState::Overview), Some(9)), Screen::Overview);
        assert_eq!(
            next_screen(Some(FrameState::Chain(Network::Base)), Some(1)),
            Screen::Overview
        );
        assert_eq!(
            next_screen(Some(FrameState::Chain(Network::Base)), Some(2)),
            Screen::ChainDetail(Network::Base)
        );
    }

    #[test]
    fn action_bodies() {
        assert!(parse_action(b"").unwrap().is_none());
        assert!(parse_action(b"  \n").unwrap().is_none());
        assert!(parse_action(b"{not json").is_err());
        let action = parse_action(br#"{"untrustedData":{"fid":2,"buttonIndex":3,"state":"overview.x"}}"#)
            .unwrap()
            .unwrap();
        let data = action.untrusted_data.unwrap();
        assert_eq!(data.fid, Some(2));
        assert_eq!(data.button_index, Some(3));
        assert_eq!(data.state.as_deref(), Some("overview.x"));
    }
}
