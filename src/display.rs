//! Snapshot / session -> display strings. No I/O, no clocks: `now` is passed in.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::board::{Slot, SlotUpdate};
use crate::config::NetworkProfile;
use crate::types::{PresaleSnapshot, UserStats, WalletSession};

pub const TOKEN_SYMBOL: &str = "$GENE";

/// Element ids of the dashboard page.
pub mod slot {
    pub const TOTAL_RAISED: &str = "totalRaised";
    pub const TOTAL_RAISED_USD: &str = "totalRaisedUSD";
    pub const HARD_CAP: &str = "hardCap";
    pub const PRESALE_PROGRESS: &str = "presaleProgress";
    pub const PROGRESS_PERCENT: &str = "progressPercent";
    pub const PROGRESS_WIDTH: &str = "progressWidth";
    pub const PROGRESS_TONE: &str = "progressTone";
    pub const RAISED_AMOUNT: &str = "raisedAmount";
    pub const TARGET_AMOUNT: &str = "targetAmount";
    pub const REMAINING_AMOUNT: &str = "remainingAmount";
    pub const TOTAL_CONTRIBUTORS: &str = "totalContributors";
    pub const AVERAGE_CONTRIBUTION: &str = "averageContribution";
    pub const TOKEN_PRICE: &str = "tokenPriceDisplay";
    pub const TOKENS_SOLD: &str = "tokensSold";
    pub const DAYS_LEFT: &str = "daysLeft";
    pub const MIN_CONTRIBUTION: &str = "minContribution";
    pub const MAX_CONTRIBUTION: &str = "maxContribution";
    pub const PRESALE_STATUS: &str = "presaleStatus";
    pub const WHITELIST_STATUS: &str = "whitelistStatus";
    pub const LAST_UPDATED: &str = "lastUpdated";

    pub const WALLET_STATUS: &str = "walletStatus";
    pub const WALLET_ADDRESS: &str = "walletAddress";
    pub const WALLET_TYPE: &str = "walletType";
    pub const WALLET_BALANCE: &str = "walletBalance";
    pub const WALLET_INFO_COMPACT: &str = "walletInfoCompact";
    pub const WALLET_ADDRESS_COMPACT: &str = "walletAddressCompact";
    pub const WALLET_BALANCE_COMPACT: &str = "walletBalanceCompact";
    pub const CONNECT_WALLET: &str = "connectWallet";
    pub const CONTRIBUTE_BUTTON: &str = "contributeBtn";

    pub const USER_STATS: &str = "userStats";
    pub const USER_CONTRIBUTION: &str = "userContribution";
    pub const USER_TOKENS: &str = "userTokens";
    pub const CLAIM_SECTION: &str = "claimSection";
    pub const TOKEN_AMOUNT: &str = "tokenAmount";
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Fixed decimal places, no grouping: `12.3456, 2` -> `"12.35"`.
pub fn fixed(value: Decimal, dp: u32) -> String {
    format!("{:.*}", dp as usize, round(value, dp))
}

/// Fixed decimal places with thousands separators: `1234567.8, 1` -> `"1,234,567.8"`.
pub fn grouped(value: Decimal, dp: u32) -> String {
    let text = fixed(value, dp);
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn amount(value: Decimal, dp: u32, symbol: &str) -> String {
    format!("{} {symbol}", fixed(value, dp))
}

/// `50` -> `"50.0%"`
pub fn percent(value: Decimal) -> String {
    format!("{}%", fixed(value, 1))
}

/// Whole dollars: `735.6` -> `"$736"`
pub fn usd(value: Decimal) -> String {
    format!("${}", grouped(value, 0))
}

/// Progress bar color band.
pub fn progress_tone(progress: Decimal) -> &'static str {
    if progress >= Decimal::ONE_HUNDRED {
        "complete"
    } else if progress >= Decimal::from(50) {
        "halfway"
    } else {
        "early"
    }
}

/// Progress shown on the page: against the dollar goal when the profile has one,
/// otherwise against the on-chain cap.
pub fn display_progress(snapshot: &PresaleSnapshot, network: &NetworkProfile) -> Decimal {
    snapshot.progress_toward(network.target_amount(snapshot))
}

pub fn snapshot_slots(snapshot: &PresaleSnapshot, network: &NetworkProfile, now: DateTime<Utc>) -> Vec<SlotUpdate> {
    let symbol = network.symbol();
    let progress = display_progress(snapshot, network);
    let progress_text = percent(progress);
    let target = network.target_amount(snapshot);
    let remaining = (target - snapshot.amount_raised).max(Decimal::ZERO);

    let mut updates = vec![
        (slot::TOTAL_RAISED, Slot::text(amount(snapshot.amount_raised, 2, symbol))),
        (slot::HARD_CAP, Slot::text(amount(snapshot.cap, 2, symbol))),
        (slot::PRESALE_PROGRESS, Slot::text(progress_text.clone())),
        (slot::PROGRESS_PERCENT, Slot::text(progress_text.clone())),
        (slot::PROGRESS_WIDTH, Slot::text(progress_text)),
        (slot::PROGRESS_TONE, Slot::toned(progress_tone(progress), progress_tone(progress))),
        (slot::RAISED_AMOUNT, Slot::text(amount(snapshot.amount_raised, 2, symbol))),
        (slot::TARGET_AMOUNT, Slot::text(amount(target, 2, symbol))),
        (slot::REMAINING_AMOUNT, Slot::text(amount(remaining, 2, symbol))),
        (slot::TOTAL_CONTRIBUTORS, Slot::text(grouped(Decimal::from(snapshot.contributor_count), 0))),
        (slot::AVERAGE_CONTRIBUTION, Slot::text(amount(snapshot.average_contribution(), 4, symbol))),
        (slot::TOKEN_PRICE, Slot::text(amount(snapshot.token_price, 6, symbol))),
        (slot::TOKENS_SOLD, Slot::text(grouped(snapshot.tokens_sold().floor(), 0))),
        (slot::DAYS_LEFT, Slot::text(snapshot.days_remaining(now).to_string())),
        (slot::MIN_CONTRIBUTION, Slot::text(format!("{} {symbol}", snapshot.min_contribution.normalize()))),
        (slot::MAX_CONTRIBUTION, Slot::text(format!("{} {symbol}", snapshot.max_contribution.normalize()))),
        (
            slot::PRESALE_STATUS,
            if snapshot.is_active {
                Slot::toned("Active", "active")
            } else {
                Slot::toned("Ended", "ended")
            },
        ),
        (
            slot::WHITELIST_STATUS,
            Slot::text(if snapshot.whitelist_enabled { "Whitelist only" } else { "Open to all" }),
        ),
    ];

    if let Some(price) = network.usd_price {
        let raised_usd = snapshot.amount_raised.checked_mul(price).unwrap_or(Decimal::MAX);
        updates.push((slot::TOTAL_RAISED_USD, Slot::text(usd(raised_usd))));
    }
    updates
}

pub fn last_updated(now: DateTime<Utc>) -> SlotUpdate {
    (slot::LAST_UPDATED, Slot::text(format!("Last updated: {}", now.format("%H:%M:%S"))))
}

/// Wallet header, buttons and compact info. `None` restores the connect call-to-action
/// and hides every user-specific field.
pub fn wallet_slots(session: Option<&WalletSession>) -> Vec<SlotUpdate> {
    match session.filter(|s| s.is_connected) {
        Some(session) => {
            let short = session.short_address();
            vec![
                (slot::WALLET_STATUS, Slot::toned("Connected", "connected")),
                (slot::CONNECT_WALLET, Slot::text("Disconnect")),
                (slot::WALLET_ADDRESS, Slot::text(short.clone())),
                (slot::WALLET_TYPE, Slot::text(session.kind.label())),
                (slot::WALLET_INFO_COMPACT, Slot::text("")),
                (slot::WALLET_ADDRESS_COMPACT, Slot::text(short)),
                (slot::CONTRIBUTE_BUTTON, Slot::text("Contribute to Presale")),
            ]
        }
        None => {
            let mut updates = vec![
                (slot::WALLET_STATUS, Slot::toned("Not Connected", "disconnected")),
                (slot::CONNECT_WALLET, Slot::text("Connect Wallet")),
                (slot::WALLET_ADDRESS, Slot::hidden()),
                (slot::WALLET_TYPE, Slot::hidden()),
                (slot::WALLET_INFO_COMPACT, Slot::hidden()),
                (slot::WALLET_ADDRESS_COMPACT, Slot::hidden()),
                (slot::CONTRIBUTE_BUTTON, Slot::text("Connect Wallet to Contribute")),
            ];
            updates.extend(cleared_user_slots());
            updates
        }
    }
}

pub fn cleared_user_slots() -> Vec<SlotUpdate> {
    vec![
        (slot::WALLET_BALANCE, Slot::hidden()),
        (slot::WALLET_BALANCE_COMPACT, Slot::hidden()),
        (slot::USER_STATS, Slot::hidden()),
        (slot::USER_CONTRIBUTION, Slot::hidden()),
        (slot::USER_TOKENS, Slot::hidden()),
        (slot::CLAIM_SECTION, Slot::hidden()),
    ]
}

pub fn user_slots(stats: &UserStats, network: &NetworkProfile, token_price: Decimal) -> Vec<SlotUpdate> {
    let symbol = network.symbol();
    let balance = amount(stats.balance, 4, symbol);
    let tokens = stats.contribution.checked_div(token_price).unwrap_or(Decimal::ZERO);
    vec![
        (slot::WALLET_BALANCE, Slot::text(balance.clone())),
        (slot::WALLET_BALANCE_COMPACT, Slot::text(balance)),
        (slot::USER_STATS, Slot::text("")),
        (slot::USER_CONTRIBUTION, Slot::text(amount(stats.contribution, 4, symbol))),
        (slot::USER_TOKENS, Slot::text(format!("{} {TOKEN_SYMBOL}", grouped(tokens.floor(), 0)))),
        (
            slot::CLAIM_SECTION,
            if stats.contribution > Decimal::ZERO { Slot::text("") } else { Slot::hidden() },
        ),
    ]
}

/// Calculator next to the amount input. Non-positive amounts show `0`.
pub fn token_estimate(amount: Decimal, token_price: Decimal) -> SlotUpdate {
    let tokens = if amount <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        amount.checked_div(token_price).unwrap_or(Decimal::ZERO)
    };
    (slot::TOKEN_AMOUNT, Slot::text(grouped(tokens, 0)))
}
