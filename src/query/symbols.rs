//! Raw asset identifier → canonical display symbol lookup.
//!
//! Axelscan records assets by their on-chain denomination (`uusdc`,
//! `weth-wei`, ...). Reports group by the human-readable ticker instead.
//! The same table drives the SQL expression in the statement builder and
//! the in-process [`canonical_symbol`] used by the in-memory warehouse.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use super::sql_literal;

/// Every IBC voucher denomination (`ibc/<hash>`) is reported as one bucket.
pub const IBC_PREFIX: &str = "ibc/";
pub const IBC_SYMBOL: &str = "IBC";

/// Exact raw identifier → display symbol pairs.
pub const TOKEN_SYMBOLS: &[(&str, &str)] = &[
    // Axelar-native and Cosmos denominations
    ("uaxl", "AXL"),
    ("uusdc", "USDC"),
    ("uusdt", "USDT"),
    ("uatom", "ATOM"),
    ("uosmo", "OSMO"),
    ("ukuji", "KUJI"),
    ("uluna", "LUNA"),
    ("ujuno", "JUNO"),
    ("uscrt", "SCRT"),
    ("ustars", "STARS"),
    ("uakt", "AKT"),
    ("ucre", "CRE"),
    ("uregen", "REGEN"),
    ("ustrd", "STRD"),
    ("ucmdx", "CMDX"),
    ("unls", "NLS"),
    ("untrn", "NTRN"),
    ("usei", "SEI"),
    ("utia", "TIA"),
    ("uumee", "UMEE"),
    ("uxprt", "XPRT"),
    ("uhuahua", "HUAHUA"),
    ("ubld", "BLD"),
    ("uist", "IST"),
    ("ukava", "KAVA"),
    ("inj", "INJ"),
    ("aevmos", "EVMOS"),
    ("acanto", "CANTO"),
    // EVM denominations
    ("weth-wei", "WETH"),
    ("wbtc-satoshi", "WBTC"),
    ("dai-wei", "DAI"),
    ("frax-wei", "FRAX"),
    ("busd-wei", "BUSD"),
    ("tusd-wei", "TUSD"),
    ("lusd-wei", "LUSD"),
    ("usdy-wei", "USDY"),
    ("wmatic-wei", "WMATIC"),
    ("wavax-wei", "WAVAX"),
    ("wftm-wei", "WFTM"),
    ("wbnb-wei", "WBNB"),
    ("wglmr-wei", "WGLMR"),
    ("wfil-wei", "WFIL"),
    ("wmnt-wei", "WMNT"),
    ("wkava-wei", "WKAVA"),
    ("wsteth-wei", "wstETH"),
    ("steth-wei", "stETH"),
    ("reth-wei", "rETH"),
    ("cbeth-wei", "cbETH"),
    ("frxeth-wei", "frxETH"),
    ("sfrxeth-wei", "sfrxETH"),
    ("ezeth-wei", "ezETH"),
    ("weeth-wei", "weETH"),
    ("link-wei", "LINK"),
    ("ape-wei", "APE"),
    ("shib-wei", "SHIB"),
    ("pepe-wei", "PEPE"),
    ("aave-wei", "AAVE"),
    ("uni-wei", "UNI"),
    ("mkr-wei", "MKR"),
    ("ldo-wei", "LDO"),
    ("crv-wei", "CRV"),
    ("sushi-wei", "SUSHI"),
    ("grt-wei", "GRT"),
    ("pendle-wei", "PENDLE"),
    ("arb-wei", "ARB"),
    ("op-wei", "OP"),
    // Axelar-wrapped tickers already in display form
    ("axlusdc", "axlUSDC"),
    ("axlusdt", "axlUSDT"),
    ("axlweth", "axlWETH"),
    ("axlwbtc", "axlWBTC"),
];

static SYMBOL_INDEX: Lazy<FxHashMap<&'static str, &'static str>> =
    Lazy::new(|| TOKEN_SYMBOLS.iter().copied().collect());

/// Map a raw asset identifier to its display symbol.
///
/// Unmapped identifiers pass through unchanged.
pub fn canonical_symbol(raw: &str) -> Cow<'_, str> {
    if raw.starts_with(IBC_PREFIX) {
        return Cow::Borrowed(IBC_SYMBOL);
    }
    match SYMBOL_INDEX.get(raw) {
        Some(symbol) => Cow::Borrowed(*symbol),
        None => Cow::Borrowed(raw),
    }
}

/// ClickHouse expression mapping the `raw_asset` String column to a
/// `Nullable(String)` display symbol. Empty identifiers become NULL.
pub fn symbol_expression(column: &str) -> String {
    let (from, to): (Vec<String>, Vec<String>) = TOKEN_SYMBOLS
        .iter()
        .map(|(raw, symbol)| (sql_literal(raw), sql_literal(symbol)))
        .unzip();

    format!(
        "if({col} = '', NULL, if(startsWith({col}, {prefix}), {ibc}, transform({col}, [{from}], [{to}], {col})))",
        col = column,
        prefix = sql_literal(IBC_PREFIX),
        ibc = sql_literal(IBC_SYMBOL),
        from = from.join(", "),
        to = to.join(", "),
    )
}
