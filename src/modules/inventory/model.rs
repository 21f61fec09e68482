use chrono::{DateTime, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const ITEM_COLUMNS: &str =
    "id, school_id, name, category, unit, quantity, created_at, updated_at";
pub const TRANSACTION_COLUMNS: &str =
    "id, item_id, direction, quantity, balance_after, note, performed_by, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "inventory_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InventoryDirection {
    In,
    Out,
}

impl InventoryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryDirection::In => "in",
            InventoryDirection::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryItem {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItemDto {
    #[validate(length(min = 1, max = 255, message = "Item name is required"))]
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    /// Opening stock, recorded as an `in` transaction when positive
    #[validate(range(min = 0, message = "Opening stock cannot be negative"))]
    pub initial_quantity: Option<i32>,
    pub school_id: Option<Uuid>,
}

/// Quantity is not editable here; it only moves through transactions.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateItemDto {
    #[validate(length(min = 1, max = 255, message = "Item name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilterParams {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedItemsResponse {
    pub data: Vec<InventoryItem>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub direction: InventoryDirection,
    pub quantity: i32,
    pub balance_after: i32,
    pub note: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionDto {
    pub direction: InventoryDirection,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 500, message = "Note is at most 500 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockMovement {
    pub item: InventoryItem,
    pub transaction: InventoryTransaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_wire_format() {
        let dto: CreateTransactionDto =
            serde_json::from_str(r#"{"direction":"out","quantity":2}"#).unwrap();
        assert_eq!(dto.direction, InventoryDirection::Out);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_fails_validation() {
        let dto: CreateTransactionDto =
            serde_json::from_str(r#"{"direction":"in","quantity":0}"#).unwrap();
        assert!(dto.validate().is_err());
    }
}
