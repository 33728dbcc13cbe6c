//! Caption rendering for buy alerts.

use buy_alert_domain::config::CaptionLinks;
use buy_alert_domain::model::{MarketSnapshot, MonitoredToken, NotificationPayload, TokenChange};

/// Maximum characters per decoration line.
pub const DECORATION_LINE_WIDTH: usize = 20;
/// Upper bound on decoration units so oversized buys keep captions bounded.
pub const MAX_DECORATION_REPEATS: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct NotificationComposer {
    links: CaptionLinks,
}

impl NotificationComposer {
    pub fn new(links: CaptionLinks) -> Self {
        Self { links }
    }

    pub fn compose(
        &self,
        token: &MonitoredToken,
        change: &TokenChange,
        snapshot: &MarketSnapshot,
        signer: &str,
        signature: &str,
    ) -> NotificationPayload {
        let spent_usd = fixed2(change.amount * snapshot.token_price_usd);
        // SOL spend derives from the rounded USD figure shown next to it.
        let rounded_usd: f64 = spent_usd
            .parse()
            .unwrap_or(change.amount * snapshot.token_price_usd);
        let spent_sol = fixed2(rounded_usd / snapshot.sol_price_usd);

        let holder_status = match change.position_increase {
            Some(increase) if !change.is_new_holder => format!("Position +{}%", fixed2(increase)),
            _ => "New Holder".to_string(),
        };
        let links = &self.links;

        let caption = format!(
            "*{name} Buy!*\n\
             {emojis}\n\n\
             🔀 Spent *${spent_usd} ({spent_sol} SOL)*\n\
             🔀 Got *{amount} {symbol}*\n\
             👤 [Buyer]({buyer_base}{signer}) / [Txn]({txn_base}{signature})\n\
             🪙 *{holder_status}*\n\
             💸 Market Cap *${market_cap}*\n\n\
             [DexT]({dex_t_url}) | [Screener]({screener_base}{signature}) | [Buy]({swap_base}{signature})",
            name = token.name.to_uppercase(),
            emojis = decoration(&token.min_value_emojis, change.amount, token.min_value),
            amount = fixed2(change.amount),
            symbol = token.symbol,
            buyer_base = links.buyer_url_base,
            txn_base = links.txn_url_base,
            market_cap = group_thousands(snapshot.market_cap),
            dex_t_url = token.dex_t_url,
            screener_base = links.screener_url_base,
            swap_base = links.swap_url_base,
        );

        NotificationPayload {
            destination_id: token.destination_id.clone(),
            image: token.image.clone(),
            caption,
        }
    }
}

/// Repeats `unit` once per whole `min_value` in `amount`, then wraps the
/// result into lines of at most [`DECORATION_LINE_WIDTH`] chars.
pub fn decoration(unit: &str, amount: f64, min_value: f64) -> String {
    if unit.is_empty() || min_value.is_nan() || min_value <= 0.0 || !amount.is_finite() {
        return String::new();
    }
    let times = (amount / min_value).floor();
    let times = if times >= MAX_DECORATION_REPEATS as f64 {
        MAX_DECORATION_REPEATS
    } else {
        times as usize
    };
    wrap_chars(&unit.repeat(times), DECORATION_LINE_WIDTH)
}

pub fn wrap_chars(text: &str, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width.max(1))
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `2500` → `2,500`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Two decimals with halves rounded away from zero. `{:.2}` alone sends exact
/// binary halves such as `0.125` to the even neighbour.
pub fn fixed2(value: f64) -> String {
    let eighths = value * 8.0;
    let exact_half = eighths.fract() == 0.0 && eighths.abs() % 2.0 == 1.0;
    if !exact_half {
        return format!("{value:.2}");
    }
    let cents = (value.abs() * 100.0).ceil() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> MonitoredToken {
        MonitoredToken {
            mint: "mint-a".into(),
            destination_id: "-100200".into(),
            image: "https://img.example/a.png".into(),
            name: "Alpha".into(),
            symbol: "ALP".into(),
            min_value: 5.0,
            min_value_emojis: "🟢".into(),
            dex_t_url: "https://www.dextools.io/app/solana/pair-explorer/pair-a".into(),
        }
    }

    fn snapshot(token_price: f64, sol_price: f64) -> MarketSnapshot {
        MarketSnapshot::from_supply(1_000_000_000_000, 6, token_price, sol_price)
    }

    #[test]
    fn wraps_forty_seven_units_into_three_lines() {
        let wrapped = decoration("x", 47.0, 1.0);
        let lines: Vec<_> = wrapped.split('\n').map(str::len).collect();
        assert_eq!(lines, vec![20, 20, 7]);
    }

    #[test]
    fn wraps_multibyte_units_by_char() {
        let wrapped = decoration("🟢", 21.0, 1.0);
        let lines: Vec<_> = wrapped.split('\n').map(|l| l.chars().count()).collect();
        assert_eq!(lines, vec![20, 1]);
    }

    #[test]
    fn decoration_repeats_floor_of_ratio() {
        assert_eq!(decoration("ab", 9.9, 2.0), "abababab");
        assert_eq!(decoration("ab", 1.0, 2.0), "");
    }

    #[test]
    fn decoration_is_bounded() {
        let wrapped = decoration("x", 1e12, 1.0);
        assert_eq!(wrapped.replace('\n', "").len(), MAX_DECORATION_REPEATS);
        assert_eq!(decoration("x", 10.0, 0.0), "");
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(fixed2(0.125), "0.13");
        assert_eq!(fixed2(0.375), "0.38");
        assert_eq!(fixed2(2.625), "2.63");
        assert_eq!(fixed2(-0.125), "-0.13");
        // Not exact halves in binary; they round to the nearest value.
        assert_eq!(fixed2(1.005), "1.00");
        assert_eq!(fixed2(2.675), "2.67");
        assert_eq!(fixed2(0.0), "0.00");
        assert_eq!(fixed2(12.5), "12.50");
    }

    #[test]
    fn tie_amounts_render_rounded_up() {
        let composer = NotificationComposer::default();
        let change = TokenChange::between(0.0, 0.125).unwrap();
        let payload = composer.compose(&token(), &change, &snapshot(1.0, 100.0), "buyer", "sig");
        assert!(payload.caption.contains("🔀 Got *0.13 ALP*"));
        assert!(payload.caption.contains("🔀 Spent *$0.13 (0.00 SOL)*"));
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(2500), "2,500");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn spend_is_converted_to_sol() {
        let composer = NotificationComposer::default();
        let change = TokenChange::between(0.0, 10.0).unwrap();
        let payload = composer.compose(&token(), &change, &snapshot(2.0, 100.0), "buyer", "sig");
        assert!(payload
            .caption
            .contains("🔀 Spent *$20.00 (0.20 SOL)*"));
        assert!(payload.caption.contains("🔀 Got *10.00 ALP*"));
    }

    #[test]
    fn renders_full_caption_for_existing_holder() {
        let composer = NotificationComposer::default();
        let change = TokenChange::between(20.0, 30.0).unwrap();
        let payload = composer.compose(&token(), &change, &snapshot(2.5, 150.0), "buyer", "sig");

        let expected = "*ALPHA Buy!*\n\
                        🟢🟢\n\n\
                        🔀 Spent *$25.00 (0.17 SOL)*\n\
                        🔀 Got *10.00 ALP*\n\
                        👤 [Buyer](https://solscan.io/account/buyer) / [Txn](https://solscan.io/tx/sig)\n\
                        🪙 *Position +50.00%*\n\
                        💸 Market Cap *$2,500,000*\n\n\
                        [DexT](https://www.dextools.io/app/solana/pair-explorer/pair-a) | \
                        [Screener](https://dexscreener.com/solana/sig) | \
                        [Buy](https://jup.ag/swap/USDC-sig)";
        assert_eq!(payload.caption, expected);
        assert_eq!(payload.destination_id, "-100200");
        assert_eq!(payload.image, "https://img.example/a.png");
    }

    #[test]
    fn new_holder_caption_hides_position() {
        let composer = NotificationComposer::default();
        let change = TokenChange::between(0.0, 10.0).unwrap();
        let payload = composer.compose(&token(), &change, &snapshot(1.0, 100.0), "buyer", "sig");
        assert!(payload.caption.contains("🪙 *New Holder*"));
        assert!(!payload.caption.contains("Position +"));
    }

    #[test]
    fn uses_configured_links() {
        let composer = NotificationComposer::new(CaptionLinks {
            buyer_url_base: "https://b/".into(),
            txn_url_base: "https://t/".into(),
            screener_url_base: "https://s/".into(),
            swap_url_base: "https://w/".into(),
        });
        let change = TokenChange::between(0.0, 10.0).unwrap();
        let payload = composer.compose(&token(), &change, &snapshot(1.0, 100.0), "buyer", "sig");
        assert!(payload.caption.contains("[Buyer](https://b/buyer) / [Txn](https://t/sig)"));
        assert!(payload.caption.ends_with("[Screener](https://s/sig) | [Buy](https://w/sig)"));
    }
}
