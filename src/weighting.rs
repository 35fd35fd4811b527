use crate::{
    network::{Network, PerNetwork, PriceSnapshot, TvlSnapshot, WeightVector},
    settings::Supply,
    MarketSnapshot,
};

/// Share of total liquidity per network.
///
/// Falls back to equal weights when the total is not positive or any network's
/// TVL is unavailable.
pub fn compute_weights(tvl: &TvlSnapshot) -> WeightVector {
    let equal = 1.0 / Network::ALL.len() as f64;
    let mut total = 0.0;
    for (_, value) in tvl.iter() {
        match value {
            Some(value) if value.is_finite() && *value >= 0.0 => total += value,
            _ => return PerNetwork::from_fn(|_| equal),
        }
    }
    if !(total > 0.0) || !total.is_finite() {
        return PerNetwork::from_fn(|_| equal);
    }
    tvl.map(|value| value.unwrap_or(0.0) / total)
}

/// The weights the average is actually taken with: networks without a price
/// get 0 and the rest are rescaled to sum to one. All zero when no network
/// has both a price and a positive weight.
pub fn effective_weights(prices: &PriceSnapshot, weights: &WeightVector) -> WeightVector {
    let weight_sum: f64 = prices
        .iter()
        .filter(|(_, price)| price.is_some())
        .map(|(network, _)| *weights.get(network))
        .sum();
    PerNetwork::from_fn(|network| match prices.get(network) {
        Some(_) if weight_sum > 0.0 => weights.get(network) / weight_sum,
        _ => 0.0,
    })
}

/// Sum of price times weight. Networks without a price drop out and the
/// remaining weights are rescaled to sum to one.
pub fn compute_weighted_price(prices: &PriceSnapshot, weights: &WeightVector) -> f64 {
    let effective = effective_weights(prices, weights);
    prices
        .iter()
        .filter_map(|(network, price)| price.map(|price| price * effective.get(network)))
        .sum()
}

pub fn market_cap(weighted_price: f64, supply: &Supply) -> f64 {
    weighted_price * supply.circulating
}

pub fn fully_diluted_value(weighted_price: f64, supply: &Supply) -> f64 {
    weighted_price * supply.total
}

/// Percent above (positive) or below the weighted average.
pub fn premium(price: f64, weighted_price: f64) -> Option<f64> {
    if weighted_price > 0.0 {
        Some((price - weighted_price) / weighted_price * 100.0)
    } else {
        None
    }
}

/// Everything a frame image shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub prices: PriceSnapshot,
    pub tvl: TvlSnapshot,
    pub weights: WeightVector,
    /// Weights behind `weighted_price`; these are the ones shown.
    pub effective_weights: WeightVector,
    pub weighted_price: f64,
    pub market_cap: f64,
    pub fully_diluted_value: f64,
}

impl Valuation {
    pub fn from_snapshot(snapshot: &MarketSnapshot, supply: &Supply) -> Self {
        let prices = snapshot.prices();
        let tvl = snapshot.tvl();
        let weights = compute_weights(&tvl);
        let effective_weights = effective_weights(&prices, &weights);
        let weighted_price = compute_weighted_price(&prices, &weights);
        Self {
            prices,
            tvl,
            weights,
            effective_weights,
            weighted_price,
            market_cap: market_cap(weighted_price, supply),
            fully_diluted_value: fully_diluted_value(weighted_price, supply),
        }
    }

    pub fn premium(&self, network: Network) -> Option<f64> {
        self.prices
            .get(network)
            .and_then(|price| premium(price, self.weighted_price))
    }

    /// Share of the weighted average, `None` for a network without a price.
    pub fn share(&self, network: Network) -> Option<f64> {
        self.prices
            .get(network)
            .map(|_| *self.effective_weights.get(network))
    }
}
