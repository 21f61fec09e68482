use super::model::InventoryDirection;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    #[error("Insufficient stock: {available} available, {requested} requested")]
    Insufficient { available: i32, requested: i32 },

    #[error("Quantity must be positive")]
    NonPositive,

    #[error("Stock level would overflow")]
    Overflow,
}

/// Balance after moving `quantity` units. An outgoing movement larger than
/// the current stock is refused rather than clamped.
pub fn apply(current: i32, direction: InventoryDirection, quantity: i32) -> Result<i32, StockError> {
    if quantity <= 0 {
        return Err(StockError::NonPositive);
    }
    match direction {
        InventoryDirection::In => current.checked_add(quantity).ok_or(StockError::Overflow),
        InventoryDirection::Out if quantity > current => Err(StockError::Insufficient {
            available: current,
            requested: quantity,
        }),
        InventoryDirection::Out => Ok(current - quantity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_adds() {
        assert_eq!(apply(5, InventoryDirection::In, 3), Ok(8));
    }

    #[test]
    fn test_out_to_exactly_zero() {
        assert_eq!(apply(5, InventoryDirection::Out, 5), Ok(0));
    }

    #[test]
    fn test_out_beyond_stock_is_refused() {
        assert_eq!(
            apply(2, InventoryDirection::Out, 3),
            Err(StockError::Insufficient {
                available: 2,
                requested: 3
            })
        );
    }

    #[test]
    fn test_zero_quantity_is_refused() {
        assert_eq!(apply(2, InventoryDirection::In, 0), Err(StockError::NonPositive));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(apply(i32::MAX, InventoryDirection::In, 1), Err(StockError::Overflow));
    }
}
