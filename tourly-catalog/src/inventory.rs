use serde::{Deserialize, Serialize};

/// Seat counter of a single tour.
///
/// `available == None` means the tour is not seat-limited. When set,
/// `0 <= available <= capacity` holds after every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInventory {
    pub available: Option<i32>,
    pub capacity: Option<i32>,
}

/// Outcome of an atomic conditional seat decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatReservation {
    /// Seats taken. `remaining` is `None` for tours without a seat limit.
    Reserved { remaining: Option<i32> },
    /// Nothing changed: fewer seats than requested were left.
    Insufficient { available: i32 },
    TourMissing,
}

impl SeatInventory {
    pub fn unlimited() -> Self {
        Self {
            available: None,
            capacity: None,
        }
    }

    pub fn limited(capacity: i32) -> Self {
        let capacity = capacity.max(0);
        Self {
            available: Some(capacity),
            capacity: Some(capacity),
        }
    }

    /// Check without mutating.
    pub fn check(&self, requested: u32) -> Result<(), InventoryError> {
        match self.available {
            Some(available) if (available as i64) < requested as i64 => {
                Err(InventoryError::InsufficientInventory {
                    requested,
                    available,
                })
            }
            _ => Ok(()),
        }
    }

    /// Decrement only if enough seats remain.
    pub fn reserve(&mut self, requested: u32) -> SeatReservation {
        match self.available {
            None => SeatReservation::Reserved { remaining: None },
            Some(available) if (available as i64) < requested as i64 => {
                SeatReservation::Insufficient { available }
            }
            Some(available) => {
                let remaining = available - requested as i32;
                self.available = Some(remaining);
                SeatReservation::Reserved {
                    remaining: Some(remaining),
                }
            }
        }
    }

    /// Return seats, never exceeding the original capacity.
    pub fn release(&mut self, seats: u32) -> Option<i32> {
        let available = self.available?;
        let restored = (available as i64 + seats as i64)
            .min(self.capacity.map(i64::from).unwrap_or(i64::from(i32::MAX))) as i32;
        self.available = Some(restored);
        Some(restored)
    }

    /// Change the capacity while keeping the number of seats sold.
    pub fn resize(&mut self, capacity: i32) -> Result<(), CapacityError> {
        let (Some(available), Some(current)) = (self.available, self.capacity) else {
            return Err(CapacityError::NotSeatLimited);
        };
        let sold = (current - available).max(0);
        if capacity < sold {
            return Err(CapacityError::BelowSold { capacity, sold });
        }
        self.available = Some(capacity - sold);
        self.capacity = Some(capacity);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Not enough available seats for this tour: requested {requested}, available {available}")]
    InsufficientInventory { requested: u32, available: i32 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("seatCapacity {capacity} is below the {sold} seats already booked")]
    BelowSold { capacity: i32, sold: i32 },

    #[error("seatCapacity can only be changed on a seat-limited tour")]
    NotSeatLimited,
}
