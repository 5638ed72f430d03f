use serde::{Deserialize, Serialize};

/// Price snapshot taken when a booking is created.
///
/// The total is frozen onto the booking, so later edits to the tour price do
/// not change what an existing booking owes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub total_amount: f64,
}

impl PriceQuote {
    pub fn for_guests(unit_price: f64, guests: u32) -> Self {
        Self {
            total_amount: unit_price * guests as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_price_times_guests() {
        let quote = PriceQuote::for_guests(1000.0, 2);
        assert_eq!(quote.total_amount, 2000.0);

        let quote = PriceQuote::for_guests(4599.5, 3);
        assert_eq!(quote.total_amount, 4599.5 * 3.0);
    }
}
