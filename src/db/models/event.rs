use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::query::{canonical_symbol, path_key, Dimension};

/// The two Axelar services unioned into the event view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    TokenTransfer,
    Gmp,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::TokenTransfer => "token_transfer",
            ServiceKind::Gmp => "gmp",
        }
    }
}

/// One settled transfer or GMP call, as exposed by the canonical event view.
///
/// Chain identifiers are lower-cased on construction, matching the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub created_at: NaiveDateTime,
    pub id: String,
    pub service: ServiceKind,
    pub sender: Option<String>,
    pub source_chain: Option<String>,
    pub destination_chain: Option<String>,
    pub amount_usd: Option<f64>,
    pub fee_usd: Option<f64>,
    pub raw_asset: Option<String>,
}

impl Event {
    pub fn new(service: ServiceKind, id: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            created_at,
            id: id.into(),
            service,
            sender: None,
            source_chain: None,
            destination_chain: None,
            amount_usd: None,
            fee_usd: None,
            raw_asset: None,
        }
    }

    pub fn with_route(mut self, source_chain: &str, destination_chain: &str) -> Self {
        self.source_chain = non_empty(source_chain).map(str::to_lowercase);
        self.destination_chain = non_empty(destination_chain).map(str::to_lowercase);
        self
    }

    pub fn with_sender(mut self, sender: &str) -> Self {
        self.sender = non_empty(sender).map(str::to_string);
        self
    }

    pub fn with_amounts(mut self, amount_usd: Option<f64>, fee_usd: Option<f64>) -> Self {
        self.amount_usd = amount_usd;
        self.fee_usd = fee_usd;
        self
    }

    pub fn with_asset(mut self, raw_asset: &str) -> Self {
        self.raw_asset = non_empty(raw_asset).map(str::to_string);
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.created_at.date()
    }

    /// Globally unique key: ids are only unique within one service.
    pub fn event_key(&self) -> String {
        format!("{}:{}", self.service.as_str(), self.id)
    }

    pub fn token_symbol(&self) -> Option<Cow<'_, str>> {
        self.raw_asset.as_deref().map(canonical_symbol)
    }

    /// Value of `dimension` for this event, or `None` when a grouping column is null.
    pub fn dimension_value(&self, dimension: Dimension) -> Option<String> {
        match dimension {
            Dimension::SourceChain => self.source_chain.clone(),
            Dimension::DestinationChain => self.destination_chain.clone(),
            Dimension::Path => match (&self.source_chain, &self.destination_chain) {
                (Some(source), Some(destination)) => Some(path_key(source, destination)),
                _ => None,
            },
            Dimension::Token => self.token_symbol().map(Cow::into_owned),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_same_id_in_both_services_yields_distinct_keys() {
        let transfer = Event::new(ServiceKind::TokenTransfer, "42", at("2025-01-01"));
        let call = Event::new(ServiceKind::Gmp, "42", at("2025-01-01"));
        assert_ne!(transfer.event_key(), call.event_key());
    }

    #[test]
    fn test_dimension_values() {
        let event = Event::new(ServiceKind::Gmp, "1", at("2025-01-01"))
            .with_route("Ethereum", "Polygon")
            .with_asset("uusdc");

        assert_eq!(event.dimension_value(Dimension::SourceChain).as_deref(), Some("ethereum"));
        assert_eq!(event.dimension_value(Dimension::Path).as_deref(), Some("ethereum→polygon"));
        assert_eq!(event.dimension_value(Dimension::Token).as_deref(), Some("USDC"));
    }

    #[test]
    fn test_missing_route_side_has_no_path() {
        let event = Event::new(ServiceKind::TokenTransfer, "1", at("2025-01-01")).with_route("osmosis", "");
        assert_eq!(event.dimension_value(Dimension::Path), None);
        assert_eq!(event.dimension_value(Dimension::SourceChain).as_deref(), Some("osmosis"));
        assert_eq!(event.dimension_value(Dimension::Token), None);
    }
}
