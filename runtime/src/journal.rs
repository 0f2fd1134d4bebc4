//! Compensation journal for one call.
//!
//! Every external mutation a call performs (tokens pulled, tickets minted)
//! is recorded here. If the call does not commit, the journal undoes them
//! newest-first when it is dropped, which also covers a collaborator panic.

use ticket_marketplace_core::environment::MarketplaceEnvironment;
use ticket_marketplace_core::issuance::IssuanceAdapter;
use ticket_marketplace_core::{Address, Amount, TicketId};

/// One undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Return pulled tokens to the buyer
    RefundTokens {
        /// Token ledger address
        token: Address,
        /// Buyer the tokens came from
        to: Address,
        /// Amount pulled
        amount: Amount,
    },
    /// Remove a minted ticket
    RevokeTicket {
        /// Minted ticket
        ticket_id: TicketId,
    },
}

/// Undo log bound to the environment that performed the steps.
pub struct Journal<'a, E: MarketplaceEnvironment + ?Sized> {
    env: &'a E,
    entries: Vec<Compensation>,
    committed: bool,
}

impl<'a, E: MarketplaceEnvironment + ?Sized> Journal<'a, E> {
    /// Start an empty journal
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self {
            env,
            entries: Vec::new(),
            committed: false,
        }
    }

    /// Record an undo step
    pub fn record(&mut self, compensation: Compensation) {
        self.entries.push(compensation);
    }

    /// Recorded steps, oldest first
    #[must_use]
    pub fn entries(&self) -> &[Compensation] {
        &self.entries
    }

    /// Keep every recorded step. Nothing is undone on drop.
    pub fn commit(mut self) {
        self.committed = true;
    }

    fn unwind(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        tracing::warn!(steps = self.entries.len(), "Rolling back external effects");
        metrics::counter!("marketplace_compensations_total").increment(self.entries.len() as u64);

        let me = self.env.marketplace_address();
        while let Some(entry) = self.entries.pop() {
            let outcome = match &entry {
                Compensation::RefundTokens { token, to, amount } => {
                    match self.env.token_ledger(token) {
                        Some(ledger) => match ledger.transfer(&me, to, *amount) {
                            Ok(true) => Ok(()),
                            Ok(false) => Err("token ledger refused the refund".to_string()),
                            Err(e) => Err(e.to_string()),
                        },
                        None => Err("token ledger disappeared".to_string()),
                    }
                }
                Compensation::RevokeTicket { ticket_id } => {
                    IssuanceAdapter::new(self.env.ticket_issuer(), me)
                        .revoke(*ticket_id)
                        .map_err(|e| e.to_string())
                }
            };

            if let Err(reason) = outcome {
                tracing::error!(?entry, %reason, "Compensation failed");
                metrics::counter!("marketplace_compensation_failures_total").increment(1);
            }
        }
    }
}

impl<E: MarketplaceEnvironment + ?Sized> Drop for Journal<'_, E> {
    fn drop(&mut self) {
        if !self.committed {
            self.unwind();
        }
    }
}
