use log::trace;

/// Gas charged in simulate mode in place of the ledger transfer that is
/// skipped, so estimates match real execution.
pub const BANK_SEND_GAS_CONSUMPTION: u64 = 12_490;

/// Flat cost of a denomination conversion.
pub const RESOLVE_GAS_COST: u64 = 1_000;

/// Key-value store pricing, per access.
pub const READ_COST_FLAT: u64 = 1_000;
pub const READ_COST_PER_BYTE: u64 = 3;
pub const WRITE_COST_FLAT: u64 = 2_000;
pub const WRITE_COST_PER_BYTE: u64 = 30;

/// Tally of the gas the fee-market logic itself consumes while settling a
/// transaction. The meter has no limit; the host adds the total to the
/// transaction's own consumption.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GasMeter {
    consumed: u64,
}

impl GasMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn consume(&mut self, amount: u64, descriptor: &str) {
        self.consumed = self.consumed.saturating_add(amount);
        trace!("consumed {amount} gas for {descriptor}, total {}", self.consumed);
    }

    pub fn consume_read(&mut self, bytes: usize, descriptor: &str) {
        self.consume(
            READ_COST_FLAT.saturating_add(READ_COST_PER_BYTE.saturating_mul(bytes as u64)),
            descriptor,
        );
    }

    pub fn consume_write(&mut self, bytes: usize, descriptor: &str) {
        self.consume(
            WRITE_COST_FLAT.saturating_add(WRITE_COST_PER_BYTE.saturating_mul(bytes as u64)),
            descriptor,
        );
    }
}
