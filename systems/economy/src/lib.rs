#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gold ledger that follows the world's event stream.
//!
//! The world never holds gold. It reports purchases, refunds and bounties as
//! events and this ledger folds them into per-team balances, which callers
//! pass back to the world as a [`Treasury`] when requesting placements.

use skirmish_core::{Event, Team, Treasury};
use tracing::debug;

/// Per-team gold balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GoldLedger {
    blue: u32,
    red: u32,
}

impl GoldLedger {
    /// Creates a ledger where both teams start with `starting` gold.
    #[must_use]
    pub const fn new(starting: u32) -> Self {
        Self {
            blue: starting,
            red: starting,
        }
    }

    /// Creates a ledger with distinct opening balances.
    #[must_use]
    pub const fn with_balances(blue: u32, red: u32) -> Self {
        Self { blue, red }
    }

    /// Gold currently held by `team`.
    #[must_use]
    pub const fn balance(&self, team: Team) -> u32 {
        match team {
            Team::Blue => self.blue,
            Team::Red => self.red,
        }
    }

    /// Reports whether `team` holds at least `cost` gold.
    #[must_use]
    pub const fn can_afford(&self, team: Team, cost: u32) -> bool {
        self.balance(team) >= cost
    }

    /// Snapshot of both balances for placement requests.
    #[must_use]
    pub const fn treasury(&self) -> Treasury {
        Treasury::new(self.blue, self.red)
    }

    /// Applies every economy-relevant event in order.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::UnitPlaced { team, cost } => {
                    let balance = self.balance_mut(team);
                    *balance = balance.saturating_sub(cost);
                    debug!(?team, cost, balance = *balance, "gold spent");
                }
                Event::UnitRemoved { team, refund, .. } => {
                    let balance = self.balance_mut(team);
                    *balance = balance.saturating_add(refund);
                    debug!(?team, refund, balance = *balance, "gold refunded");
                }
                Event::UnitKilled {
                    reward_team,
                    gold_value,
                    ..
                } => {
                    let balance = self.balance_mut(reward_team);
                    *balance = balance.saturating_add(gold_value);
                    debug!(team = ?reward_team, gold_value, balance = *balance, "bounty awarded");
                }
                _ => {}
            }
        }
    }

    fn balance_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }
}
