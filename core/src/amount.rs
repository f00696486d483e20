//! Bidirectional amount and fee calculation.
//!
//! All amounts are satoshis. Fees are a percentage of the swapped amount plus a fixed miner
//! fee. Every computation goes through [`Decimal`] with an explicit rounding step: fees
//! round up, payable amounts round down.
//!
//! `send_from_receive(receive_from_send(x))` is not guaranteed to give back `x`; the
//! difference is bounded by one satoshi per rounded fee.

use crate::error::{Error, Result};
use crate::types::Direction;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fixed on-chain fee component of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinerFee {
    /// A single figure (submarine swaps).
    Flat(u64),
    /// Lockup and claim legs quoted separately (reverse swaps).
    Split { lockup: u64, claim: u64 },
}

impl MinerFee {
    /// Total miner fee the user pays.
    pub fn total(&self) -> u64 {
        match self {
            MinerFee::Flat(fee) => *fee,
            MinerFee::Split { lockup, claim } => lockup.saturating_add(*claim),
        }
    }
}

impl Default for MinerFee {
    fn default() -> Self {
        MinerFee::Flat(0)
    }
}

/// Fees and limits for one swap direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: Direction,
    /// Service fee in percent, e.g. `0.5` for half a percent.
    pub fee_percent: Decimal,
    pub miner_fee: MinerFee,
    /// Protocol minimum, in the service's convention for `direction`.
    pub min_limit: u64,
    /// Protocol maximum, in the service's convention for `direction`.
    pub max_limit: u64,
}

impl SwapQuote {
    /// Build a quote, rejecting fee percentages outside `[0, 100]`.
    pub fn new(
        direction: Direction,
        fee_percent: Decimal,
        miner_fee: MinerFee,
        min_limit: u64,
        max_limit: u64,
    ) -> Result<Self> {
        if fee_percent.is_sign_negative() || fee_percent > dec!(100) {
            return Err(Error::InputValidation(format!(
                "Fee percentage out of range: {fee_percent}"
            )));
        }
        Ok(Self {
            direction,
            fee_percent,
            miner_fee,
            min_limit,
            max_limit,
        })
    }

    /// A quote with no fees and no limits, used before the schedule has loaded.
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            fee_percent: Decimal::ZERO,
            miner_fee: MinerFee::default(),
            min_limit: 0,
            max_limit: 0,
        }
    }

    pub fn receive_from_send(&self, send: u64) -> u64 {
        receive_from_send(send, self.fee_percent, self.miner_fee.total(), self.direction)
    }

    pub fn send_from_receive(&self, receive: u64) -> Result<u64> {
        send_from_receive(receive, self.fee_percent, self.miner_fee.total(), self.direction)
    }

    pub fn service_fee(&self, send: u64) -> u64 {
        service_fee(send, self.fee_percent, self.miner_fee.total(), self.direction)
    }

    /// Smallest amount the user may send.
    pub fn min_send(&self) -> Result<u64> {
        self.effective_limit(self.min_limit)
    }

    /// Largest amount the user may send.
    pub fn max_send(&self) -> Result<u64> {
        self.effective_limit(self.max_limit)
    }

    pub fn effective_limit(&self, limit: u64) -> Result<u64> {
        effective_limit(
            limit,
            self.fee_percent,
            self.miner_fee.total(),
            self.direction,
        )
    }
}

/// Amount the user receives for sending `send`.
pub fn receive_from_send(
    send: u64,
    fee_percent: Decimal,
    miner_fee: u64,
    direction: Direction,
) -> u64 {
    let send = Decimal::from(send);
    let miner_fee = Decimal::from(miner_fee);
    let rate = fee_percent / dec!(100);

    let receive = match direction {
        Direction::Submarine => (send - miner_fee) / (Decimal::ONE + rate),
        Direction::Reverse => send - (send * rate).ceil() - miner_fee,
    };

    to_sats(receive.max(Decimal::ZERO).floor())
}

/// Amount the user has to send so that `receive` arrives on the other side.
///
/// Fails for reverse swaps with a fee of 100 % or more, which have no finite answer.
pub fn send_from_receive(
    receive: u64,
    fee_percent: Decimal,
    miner_fee: u64,
    direction: Direction,
) -> Result<u64> {
    let receive = Decimal::from(receive);
    let miner_fee = Decimal::from(miner_fee);
    let rate = fee_percent / dec!(100);

    let send = match direction {
        Direction::Submarine => (receive + (receive * rate).ceil() + miner_fee).floor(),
        Direction::Reverse => {
            let keep = Decimal::ONE - rate;
            if keep <= Decimal::ZERO {
                return Err(Error::InputValidation(format!(
                    "Fee percentage {fee_percent} leaves nothing to receive"
                )));
            }
            ((receive + miner_fee) / keep).ceil()
        }
    };

    send.to_u64()
        .ok_or_else(|| Error::InputValidation(format!("Send amount {send} out of range")))
}

/// Service fee charged when sending `send`.
pub fn service_fee(send: u64, fee_percent: Decimal, miner_fee: u64, direction: Direction) -> u64 {
    match direction {
        Direction::Reverse => {
            let rate = fee_percent / dec!(100);
            to_sats((Decimal::from(send) * rate).ceil())
        }
        Direction::Submarine => {
            if send < miner_fee {
                return 0;
            }
            let receive = receive_from_send(send, fee_percent, miner_fee, direction);
            let fee = Decimal::from(send) - Decimal::from(receive) - Decimal::from(miner_fee);
            to_sats(fee.ceil())
        }
    }
}

/// Convert a protocol limit into the send-side limit shown to the user.
///
/// Submarine limits are quoted on the receive side; reverse limits already are send-side.
pub fn effective_limit(
    limit: u64,
    fee_percent: Decimal,
    miner_fee: u64,
    direction: Direction,
) -> Result<u64> {
    match direction {
        Direction::Submarine => send_from_receive(limit, fee_percent, miner_fee, direction),
        Direction::Reverse => Ok(limit),
    }
}

/// Lenient amount parsing for live form input.
///
/// Empty, non-numeric and negative input become zero; fractions are dropped.
pub fn parse_amount(input: &str) -> u64 {
    let input = input.trim();
    if input.is_empty() {
        return 0;
    }
    match Decimal::from_str(input) {
        Ok(value) if value.is_sign_positive() => to_sats(value.floor()),
        _ => 0,
    }
}

/// Strict amount parsing for submission.
///
/// Empty input is zero; anything else must be a non-negative whole number of satoshis.
pub fn parse_amount_strict(input: &str) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }
    let value = Decimal::from_str(input)
        .map_err(|e| Error::InputValidation(format!("Not a number: {input:?} ({e})")))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::InputValidation(format!("Negative amount: {input}")));
    }
    if !value.fract().is_zero() {
        return Err(Error::InputValidation(format!(
            "Amount must be whole satoshis: {input}"
        )));
    }
    value
        .to_u64()
        .ok_or_else(|| Error::InputValidation(format!("Amount out of range: {input}")))
}

/// Render a satoshi amount with thousands separators.
pub fn format_sats(sats: u64) -> String {
    let digits = sats.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn to_sats(value: Decimal) -> u64 {
    if value.is_sign_negative() {
        return 0;
    }
    value.to_u64().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submarine_example() {
        let receive = receive_from_send(100_000, dec!(0.5), 150, Direction::Submarine);
        assert_eq!(receive, 99_353);

        let fee = service_fee(100_000, dec!(0.5), 150, Direction::Submarine);
        assert_eq!(fee, 497);
    }

    #[test]
    fn test_reverse_example() {
        let fee = service_fee(50_000, dec!(0.25), 300, Direction::Reverse);
        assert_eq!(fee, 125);

        let receive = receive_from_send(50_000, dec!(0.25), 300, Direction::Reverse);
        assert_eq!(receive, 49_575);

        // exact inverse in this case
        let send = send_from_receive(49_575, dec!(0.25), 300, Direction::Reverse).unwrap();
        assert_eq!(send, 50_000);
    }

    #[test]
    fn test_submarine_send_from_receive_rounds_fee_up() {
        // 0.1% of 50_001 is 50.001, charged as 51
        let send = send_from_receive(50_001, dec!(0.1), 152, Direction::Submarine).unwrap();
        assert_eq!(send, 50_001 + 51 + 152);
    }

    #[test]
    fn test_receive_never_negative() {
        for direction in [Direction::Submarine, Direction::Reverse] {
            assert_eq!(receive_from_send(0, dec!(0.5), 150, direction), 0);
            assert_eq!(receive_from_send(100, dec!(0.5), 150, direction), 0);
            assert_eq!(receive_from_send(1_000, dec!(99.9), 999, direction), 0);
        }
    }

    #[test]
    fn test_receive_non_negative_over_grid() {
        let percents = [dec!(0), dec!(0.1), dec!(0.25), dec!(0.5), dec!(1), dec!(50), dec!(99.99)];
        let miner_fees = [0u64, 1, 150, 300, 5_000];
        for direction in [Direction::Submarine, Direction::Reverse] {
            for pct in percents {
                for miner_fee in miner_fees {
                    for extra in [0u64, 1, 7, 999, 123_456, 21_000_000] {
                        let send = miner_fee + extra;
                        let receive = receive_from_send(send, pct, miner_fee, direction);
                        assert!(receive <= send, "{direction} {pct} {miner_fee} {send}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_submarine_parts_add_up() {
        for pct in [dec!(0.1), dec!(0.5), dec!(1.25), dec!(3)] {
            for miner_fee in [0u64, 150, 3_000] {
                for send in [miner_fee, miner_fee + 1, 10_000, 100_000, 2_500_000, 99_999_999] {
                    if send < miner_fee {
                        continue;
                    }
                    let receive = receive_from_send(send, pct, miner_fee, Direction::Submarine);
                    let fee = service_fee(send, pct, miner_fee, Direction::Submarine);
                    let total = fee + receive + miner_fee;
                    assert!(total.abs_diff(send) <= 1, "{pct} {miner_fee} {send}: {total}");
                }
            }
        }
    }

    #[test]
    fn test_round_trip_within_slack() {
        for direction in [Direction::Submarine, Direction::Reverse] {
            for send in [1_000u64, 12_345, 100_000, 1_234_567] {
                let receive = receive_from_send(send, dec!(0.5), 150, direction);
                let back = send_from_receive(receive, dec!(0.5), 150, direction).unwrap();
                assert!(back.abs_diff(send) <= 2, "{direction} {send} -> {receive} -> {back}");
            }
        }
    }

    #[test]
    fn test_submarine_fee_is_zero_below_miner_fee() {
        assert_eq!(service_fee(100, dec!(0.5), 150, Direction::Submarine), 0);
    }

    #[test]
    fn test_reverse_full_fee_has_no_inverse() {
        let err = send_from_receive(1_000, dec!(100), 0, Direction::Reverse).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(
            effective_limit(50_000, dec!(0.1), 152, Direction::Submarine).unwrap(),
            50_202
        );
        assert_eq!(
            effective_limit(50_000, dec!(0.1), 152, Direction::Reverse).unwrap(),
            50_000
        );

        let direction = Direction::Submarine;
        let before = effective_limit(25_000_000, dec!(0.1), 152, direction).unwrap();
        let after =
            effective_limit(25_000_000, dec!(0.1), 152, direction.toggled().toggled()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_split_miner_fee_is_summed() {
        let fee = MinerFee::Split {
            lockup: 462,
            claim: 333,
        };
        assert_eq!(fee.total(), 795);

        let quote = SwapQuote::new(Direction::Reverse, dec!(0.25), fee, 1_000, 25_000_000).unwrap();
        assert_eq!(quote.receive_from_send(50_000), 50_000 - 125 - 795);
    }

    #[test]
    fn test_quote_rejects_bad_fee_percent() {
        assert!(SwapQuote::new(Direction::Submarine, dec!(-1), MinerFee::Flat(0), 0, 0).is_err());
        assert!(
            SwapQuote::new(Direction::Submarine, dec!(100.5), MinerFee::Flat(0), 0, 0).is_err()
        );
    }

    #[test]
    fn test_parse_amount_lenient() {
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("   "), 0);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount("-500"), 0);
        assert_eq!(parse_amount("NaN"), 0);
        assert_eq!(parse_amount("1500.9"), 1_500);
        assert_eq!(parse_amount(" 42 "), 42);
    }

    #[test]
    fn test_parse_amount_strict() {
        assert_eq!(parse_amount_strict("").unwrap(), 0);
        assert_eq!(parse_amount_strict("100000").unwrap(), 100_000);
        assert!(matches!(
            parse_amount_strict("12a"),
            Err(Error::InputValidation(_))
        ));
        assert!(matches!(
            parse_amount_strict("-1"),
            Err(Error::InputValidation(_))
        ));
        assert!(matches!(
            parse_amount_strict("1.5"),
            Err(Error::InputValidation(_))
        ));
        assert!(matches!(
            parse_amount_strict("99999999999999999999999"),
            Err(Error::InputValidation(_))
        ));
    }

    #[test]
    fn test_format_sats() {
        assert_eq!(format_sats(0), "0");
        assert_eq!(format_sats(999), "999");
        assert_eq!(format_sats(1_000), "1,000");
        assert_eq!(format_sats(1_234_567), "1,234,567");
        assert_eq!(format_sats(100_000), "100,000");
    }
}
