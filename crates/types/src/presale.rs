//! Presale ledger state

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A completed purchase. Participants are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Participant {
    /// Buyer wallet address (base58)
    pub address: String,
    /// External-currency contribution
    pub usd_amount: Decimal,
    /// Tokens transferred, exact to the token's decimals
    pub token_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Persisted presale state.
///
/// Cumulative totals always equal the sums over `participants`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PresaleState {
    pub participants: Vec<Participant>,
    pub total_tokens_sold: Decimal,
    pub total_usd_raised: Decimal,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl PresaleState {
    /// Append a participant and fold it into the running totals
    pub fn record_purchase(&mut self, participant: Participant) {
        self.total_tokens_sold += participant.token_amount;
        self.total_usd_raised += participant.usd_amount;
        self.participants.push(participant);
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_totals_track_participants() {
        let mut state = PresaleState::default();
        for (usd, tokens) in [("30", "1000"), ("0.45", "15")] {
            state.record_purchase(Participant {
                address: "buyer".to_string(),
                usd_amount: Decimal::from_str(usd).unwrap(),
                token_amount: Decimal::from_str(tokens).unwrap(),
                timestamp: Utc::now(),
            });
        }

        assert_eq!(state.participant_count(), 2);
        assert_eq!(state.total_usd_raised, Decimal::from_str("30.45").unwrap());
        assert_eq!(state.total_tokens_sold, Decimal::from(1015));
        assert_eq!(
            state.total_tokens_sold,
            state.participants.iter().map(|p| p.token_amount).sum::<Decimal>()
        );
    }

    #[test]
    fn test_default_state_shape() {
        let value = serde_json::to_value(PresaleState::default()).unwrap();
        assert_eq!(value["isActive"], false);
        assert_eq!(value["participants"], serde_json::json!([]));
        assert!(value.get("startTime").is_none());
    }
}
