use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};

use crate::{html::escape, network::Network, weighting::Valuation};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 628;
const UNAVAILABLE: &str = "unavailable";

pub fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(price) => format!("{:.6}", price),
        None => UNAVAILABLE.to_owned(),
    }
}

/// Whole dollars with thousands separators, e.g. `$1,234,567`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return UNAVAILABLE.to_owned();
    }
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if value.round() < 0.0 {
        grouped.push('-');
    }
    grouped.push('$');
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

pub fn format_weight(weight: Option<f64>) -> String {
    match weight {
        Some(weight) => format!("{:.1}%", weight * 100.0),
        None => "n/a".to_owned(),
    }
}

pub fn format_premium(premium: Option<f64>) -> String {
    match premium {
        Some(p) if p > 0.005 => format!("+{:.2}% premium", p),
        Some(p) if p < -0.005 => format!("{:.2}% discount", p),
        Some(_) => "at parity".to_owned(),
        None => "n/a".to_owned(),
    }
}

fn open(background: &str) -> String {
    format!(
        "<svg width=\"{w}\" height=\"{h}\" xmlns=\"http://www.w3.org/2000/svg\">\n  <rect width=\"{w}\" height=\"{h}\" fill=\"{bg}\"/>\n",
        w = WIDTH,
        h = HEIGHT,
        bg = background
    )
}

fn text(svg: &mut String, y: u32, size: u32, fill: &str, bold: bool, content: &str) {
    svg.push_str(&format!(
        "  <text x=\"100\" y=\"{}\" font-size=\"{}\" fill=\"{}\"{}>{}</text>\n",
        y,
        size,
        fill,
        if bold { " font-weight=\"bold\"" } else { "" },
        escape(content)
    ));
}

fn updated_line(svg: &mut String, updated: DateTime<Utc>) {
    text(
        svg,
        580,
        24,
        "#aaaaaa",
        false,
        &format!("Last Updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC")),
    );
}

/// Per-network prices with their TVL share, the weighted average and the
/// derived valuations.
pub fn render_overview(valuation: &Valuation, updated: DateTime<Utc>) -> String {
    let mut svg = open("#1e2d3a");
    text(&mut svg, 90, 48, "white", true, "$PAGE Token Prices");
    for (i, network) in Network::ALL.iter().enumerate() {
        let line = format!(
            "{}: {} ({})",
            network.label(),
            format_price(*valuation.prices.get(*network)),
            format_weight(valuation.share(*network))
        );
        text(&mut svg, 160 + 55 * i as u32, 34, network.color(), false, &line);
    }
    text(
        &mut svg,
        400,
        42,
        "white",
        true,
        &format!("TVL-Weighted Avg: {:.6}", valuation.weighted_price),
    );
    text(
        &mut svg,
        455,
        30,
        "white",
        false,
        &format!(
            "Market Cap: {}   FDV: {}",
            format_usd(valuation.market_cap),
            format_usd(valuation.fully_diluted_value)
        ),
    );
    text(
        &mut svg,
        505,
        24,
        "#aaaaaa",
        false,
        "*Percentages represent TVL distribution among priced networks",
    );
    updated_line(&mut svg, updated);
    svg.push_str("</svg>\n");
    svg
}

pub fn render_chain(valuation: &Valuation, network: Network, updated: DateTime<Utc>) -> String {
    let mut svg = open("#1e2d3a");
    text(
        &mut svg,
        90,
        48,
        network.color(),
        true,
        &format!("$PAGE on {}", network.label()),
    );
    let price = *valuation.prices.get(network);
    let tvl = *valuation.tvl.get(network);
    text(
        &mut svg,
        170,
        36,
        "white",
        false,
        &format!("Price: {}", format_price(price)),
    );
    text(
        &mut svg,
        230,
        36,
        "white",
        false,
        &format!("TVL: {}", tvl.map(format_usd).unwrap_or_else(|| UNAVAILABLE.to_owned())),
    );
    text(
        &mut svg,
        290,
        36,
        "white",
        false,
        &format!("TVL Weight: {}", format_weight(valuation.share(network))),
    );
    text(
        &mut svg,
        350,
        36,
        "white",
        false,
        &format!("vs. Weighted Avg: {}", format_premium(valuation.premium(network))),
    );
    text(
        &mut svg,
        440,
        40,
        "white",
        true,
        &format!("TVL-Weighted Avg: {:.6}", valuation.weighted_price),
    );
    updated_line(&mut svg, updated);
    svg.push_str("</svg>\n");
    svg
}

pub fn render_error(message: &str) -> String {
    let mut svg = open("#5c1e1e");
    text(&mut svg, 100, 48, "white", true, "Error Fetching $PAGE Prices");
    text(&mut svg, 180, 36, "white", false, "Please try again later");
    text(&mut svg, 240, 24, "#dddddd", false, message);
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_grouping() {
        assert_eq!(format_usd(850_000.0), "$850,000");
        assert_eq!(format_usd(1_234_567.4), "$1,234,567");
        assert_eq!(format_usd(999.6), "$1,000");
        assert_eq!(format_usd(12.0), "$12");
        assert_eq!(format_usd(-2500.0), "-$2,500");
        assert_eq!(format_usd(f64::NAN), "unavailable");
    }

    #[test]
    fn weight_wording() {
        assert_eq!(format_weight(Some(1.0 / 3.0)), "33.3%");
        assert_eq!(format_weight(None), "n/a");
    }

    #[test]
    fn premium_wording() {
        assert_eq!(format_premium(Some(1.234)), "+1.23% premium");
        assert_eq!(format_premium(Some(-0.5)), "-0.50% discount");
        assert_eq!(format_premium(Some(0.0)), "at parity");
        assert_eq!(format_premium(None), "n/a");
    }

    #[test]
    fn error_message_is_escaped() {
        let svg = render_error("<bad> & \"worse\"");
        assert!(svg.contains("&lt;bad&gt; &amp; &quot;worse&quot;"));
        assert!(svg.contains("fill=\"#5c1e1e\""));
    }

    #[test]
    fn data_uri_is_base64() {
        assert_eq!(svg_data_uri("<svg/>"), "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
