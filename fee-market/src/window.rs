use {
    crate::decimal::Dec,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Fixed-capacity ring buffer of per-block utilization ratios.
///
/// `samples` is allocated once at full capacity; `next` is the slot the next
/// push overwrites and `len` counts the slots filled so far. Once full, every
/// push evicts the oldest sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UtilizationWindow {
    samples: Vec<Dec>,
    next: u64,
    len: u64,
}

impl UtilizationWindow {
    /// Empty window holding up to `capacity` samples (at least one).
    pub fn new(capacity: u64) -> Self {
        Self {
            samples: vec![Dec::ZERO; capacity.max(1) as usize],
            next: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, utilization: Dec) {
        let capacity = self.capacity();
        self.samples[self.next as usize] = utilization;
        self.next = (self.next + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Held samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Dec> + '_ {
        let capacity = self.capacity();
        let start = (self.next + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.samples[((start + i) % capacity) as usize])
    }

    pub fn latest(&self) -> Option<Dec> {
        if self.is_empty() {
            return None;
        }
        let capacity = self.capacity();
        Some(self.samples[((self.next + capacity - 1) % capacity) as usize])
    }

    /// Mean of the held samples; zero while empty.
    pub fn mean(&self) -> Dec {
        if self.is_empty() {
            return Dec::ZERO;
        }
        let sum = self.iter().fold(Dec::ZERO, Dec::saturating_add);
        sum.checked_quo(Dec::from_int(self.len as i64))
            .unwrap_or(Dec::ZERO)
    }

    /// `Σ (uᵢ − target)` over the held samples.
    pub fn net_deviation(&self, target: Dec) -> Dec {
        self.iter()
            .fold(Dec::ZERO, |acc, u| acc.saturating_add(u.saturating_sub(target)))
    }

    /// Size of the borsh encoding: the length-prefixed sample vector plus
    /// both cursors.
    pub fn encoded_len(&self) -> usize {
        4 + self.samples.len() * Dec::ENCODED_LEN + 2 * 8
    }

    /// Copy into a window of a new capacity, keeping the newest samples.
    pub fn resized(&self, capacity: u64) -> Self {
        let mut resized = Self::new(capacity);
        let skip = self.len.saturating_sub(resized.capacity()) as usize;
        self.iter().skip(skip).for_each(|u| resized.push(u));
        resized
    }

    /// Structural check for windows that arrive from outside (genesis,
    /// store), where the private fields may be inconsistent.
    pub fn validate(&self) -> Result<(), String> {
        if self.samples.is_empty() {
            return Err("utilization window has zero capacity".to_string());
        }
        if self.next >= self.capacity() || self.len > self.capacity() {
            return Err(format!(
                "utilization window cursor out of range: next {}, len {}, capacity {}",
                self.next,
                self.len,
                self.capacity()
            ));
        }
        if let Some(u) = self.iter().find(|u| u.is_negative() || *u > Dec::ONE) {
            return Err(format!("utilization sample {u} outside [0, 1]"));
        }
        Ok(())
    }
}
