//! Two-sided trade form.
//!
//! Holds what a swap form shows: the amount the user sends, the amount they receive, and the
//! fees in between. Editing either side recomputes the other from the quote of the current
//! direction. Toggling the direction recomputes everything from the side the user last
//! edited, so no value computed under the old direction survives.

use crate::amount::{self, SwapQuote};
use crate::error::{Error, Result};
use crate::types::Direction;
use rust_decimal::Decimal;

/// Which amount the user typed last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Send,
    Receive,
}

#[derive(Debug, Clone)]
pub struct TradeForm {
    direction: Direction,
    submarine: SwapQuote,
    reverse: SwapQuote,
    send: u64,
    receive: u64,
    service_fee: u64,
    last_edited: Side,
    mirror_failed: bool,
}

impl TradeForm {
    /// Empty form in submarine direction.
    pub fn new(submarine: SwapQuote, reverse: SwapQuote) -> Self {
        Self {
            direction: Direction::Submarine,
            submarine,
            reverse,
            send: 0,
            receive: 0,
            service_fee: 0,
            last_edited: Side::Send,
            mirror_failed: false,
        }
    }

    /// Form with no fee schedule loaded yet.
    pub fn unquoted() -> Self {
        Self::new(
            SwapQuote::empty(Direction::Submarine),
            SwapQuote::empty(Direction::Reverse),
        )
    }

    /// Replace both quotes after a refresh and recompute.
    pub fn set_quotes(&mut self, submarine: SwapQuote, reverse: SwapQuote) {
        self.submarine = submarine;
        self.reverse = reverse;
        self.recompute();
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Quote for the current direction.
    pub fn quote(&self) -> &SwapQuote {
        match self.direction {
            Direction::Submarine => &self.submarine,
            Direction::Reverse => &self.reverse,
        }
    }

    pub fn send(&self) -> u64 {
        self.send
    }

    pub fn receive(&self) -> u64 {
        self.receive
    }

    pub fn service_fee(&self) -> u64 {
        self.service_fee
    }

    pub fn fee_percent(&self) -> Decimal {
        self.quote().fee_percent
    }

    /// Total miner fee of the current direction.
    pub fn network_fee(&self) -> u64 {
        self.quote().miner_fee.total()
    }

    /// Minimum send amount; zero if the limit cannot be expressed.
    pub fn min_send(&self) -> u64 {
        self.quote().min_send().unwrap_or(0)
    }

    /// Maximum send amount; zero if the limit cannot be expressed.
    pub fn max_send(&self) -> u64 {
        self.quote().max_send().unwrap_or(0)
    }

    /// The user edited the send field.
    pub fn set_send_input(&mut self, input: &str) {
        self.send = amount::parse_amount(input);
        self.last_edited = Side::Send;
        self.recompute();
    }

    /// The user edited the receive field.
    pub fn set_receive_input(&mut self, input: &str) {
        self.receive = amount::parse_amount(input);
        self.last_edited = Side::Receive;
        self.recompute();
    }

    /// Flip the direction and recompute from the side edited last.
    pub fn toggle_direction(&mut self) {
        self.direction = self.direction.toggled();
        log::debug!("Trade direction is now {}", self.direction);
        self.recompute();
    }

    /// Send amount is non-zero and outside `[min_send, max_send]`.
    pub fn send_error(&self) -> bool {
        (self.send != 0 && self.send < self.min_send()) || self.send > self.max_send()
    }

    /// The receive amount could not be mirrored onto the send side.
    pub fn receive_error(&self) -> bool {
        self.mirror_failed
    }

    pub fn has_error(&self) -> bool {
        self.send_error() || self.receive_error()
    }

    /// Send amount to submit, or why the form cannot be submitted.
    pub fn validate(&self) -> Result<u64> {
        if self.receive_error() {
            return Err(Error::InputValidation(format!(
                "Cannot receive {} sats at {}% fee",
                self.receive,
                self.fee_percent()
            )));
        }
        if self.send == 0 {
            return Err(Error::InputValidation("Amount is zero".to_string()));
        }
        if self.send_error() {
            return Err(Error::InputValidation(format!(
                "Amount {} outside limits [{}, {}]",
                amount::format_sats(self.send),
                amount::format_sats(self.min_send()),
                amount::format_sats(self.max_send())
            )));
        }
        Ok(self.send)
    }

    fn recompute(&mut self) {
        self.mirror_failed = false;
        let quote = self.quote().clone();
        match self.last_edited {
            Side::Send => {
                self.receive = quote.receive_from_send(self.send);
                self.service_fee = quote.service_fee(self.send);
            }
            Side::Receive if self.receive == 0 => {
                self.send = 0;
                self.service_fee = 0;
            }
            Side::Receive => match quote.send_from_receive(self.receive) {
                Ok(send) => {
                    self.send = send;
                    self.service_fee = match self.direction {
                        Direction::Reverse => quote.service_fee(send),
                        Direction::Submarine => send
                            .saturating_sub(self.receive)
                            .saturating_sub(quote.miner_fee.total()),
                    };
                }
                Err(e) => {
                    log::warn!("Could not mirror receive amount: {e}");
                    self.send = 0;
                    self.service_fee = 0;
                    self.mirror_failed = true;
                }
            },
        }
    }
}

impl Default for TradeForm {
    fn default() -> Self {
        Self::unquoted()
    }
}
