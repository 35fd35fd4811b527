use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// The networks PAGE has liquidity on, in overview button order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Optimism,
    Base,
    Osmosis,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Ethereum,
        Network::Optimism,
        Network::Base,
        Network::Osmosis,
    ];

    /// Networks read through JSON-RPC pool contracts.
    pub const EVM: [Network; 3] = [Network::Ethereum, Network::Optimism, Network::Base];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Optimism => "optimism",
            Network::Base => "base",
            Network::Osmosis => "osmosis",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Optimism => "Optimism",
            Network::Base => "Base",
            Network::Osmosis => "Osmosis",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Network::Ethereum => "#6F7CBA",
            Network::Optimism => "#FF0420",
            Network::Base => "#0052FF",
            Network::Osmosis => "#5E12A0",
        }
    }

    /// 1-based overview button for this network.
    pub fn button_index(&self) -> u8 {
        match self {
            Network::Ethereum => 1,
            Network::Optimism => 2,
            Network::Base => 3,
            Network::Osmosis => 4,
        }
    }

    pub fn from_button(index: u8) -> Option<Network> {
        Network::ALL
            .iter()
            .copied()
            .find(|network| network.button_index() == index)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .iter()
            .copied()
            .find(|network| network.name() == s)
            .ok_or_else(|| anyhow!("unknown network {}", s))
    }
}

/// One value per network.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerNetwork<T> {
    pub ethereum: T,
    pub optimism: T,
    pub base: T,
    pub osmosis: T,
}

impl<T> PerNetwork<T> {
    pub fn from_fn(mut f: impl FnMut(Network) -> T) -> Self {
        Self {
            ethereum: f(Network::Ethereum),
            optimism: f(Network::Optimism),
            base: f(Network::Base),
            osmosis: f(Network::Osmosis),
        }
    }

    pub fn get(&self, network: Network) -> &T {
        match network {
            Network::Ethereum => &self.ethereum,
            Network::Optimism => &self.optimism,
            Network::Base => &self.base,
            Network::Osmosis => &self.osmosis,
        }
    }

    pub fn get_mut(&mut self, network: Network) -> &mut T {
        match network {
            Network::Ethereum => &mut self.ethereum,
            Network::Optimism => &mut self.optimism,
            Network::Base => &mut self.base,
            Network::Osmosis => &mut self.osmosis,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerNetwork<U> {
        PerNetwork::from_fn(|network| f(self.get(network)))
    }

    /// Iterates in `Network::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Network, &T)> + '_ {
        Network::ALL
            .to_vec()
            .into_iter()
            .map(move |network| (network, self.get(network)))
    }
}

pub type PriceSnapshot = PerNetwork<Option<f64>>;
pub type TvlSnapshot = PerNetwork<Option<f64>>;
pub type WeightVector = PerNetwork<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_back_to_networks() {
        for network in Network::ALL.iter() {
            assert_eq!(Network::from_button(network.button_index()), Some(*network));
        }
        assert_eq!(Network::from_button(0), None);
        assert_eq!(Network::from_button(5), None);
    }

    #[test]
    fn names_parse() {
        assert_eq!("base".parse::<Network>().unwrap(), Network::Base);
        assert!("solana".parse::<Network>().is_err());
    }
}
