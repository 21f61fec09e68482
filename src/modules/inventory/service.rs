use scholaris_core::{AppError, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;

use super::model::{
    CreateItemDto, CreateTransactionDto, ITEM_COLUMNS, InventoryDirection, InventoryItem,
    InventoryTransaction, ItemFilterParams, PaginatedItemsResponse, StockMovement,
    TRANSACTION_COLUMNS, UpdateItemDto,
};
use super::stock::{self, StockError};

fn map_duplicate(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict(anyhow::anyhow!("An item with this name already exists"))
        }
        _ => AppError::database(e),
    }
}

pub struct InventoryService;

impl InventoryService {
    #[instrument(skip(db, dto), fields(item.name = %dto.name, db.table = "inventory_items"))]
    pub async fn create_item(
        db: &PgPool,
        school_id: Uuid,
        performed_by: Uuid,
        dto: CreateItemDto,
    ) -> Result<InventoryItem, AppError> {
        let mut tx = db.begin().await?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "INSERT INTO inventory_items (school_id, name, category, unit)
             VALUES ($1, $2, $3, $4)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(&dto.category)
        .bind(&dto.unit)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_duplicate)?;

        let item = match dto.initial_quantity {
            Some(quantity) if quantity > 0 => {
                let movement = Self::record(
                    &mut tx,
                    item,
                    InventoryDirection::In,
                    quantity,
                    Some("Opening stock"),
                    performed_by,
                )
                .await?;
                movement.item
            }
            _ => item,
        };

        tx.commit().await?;
        info!(item.id = %item.id, quantity = item.quantity, "Inventory item created");
        Ok(item)
    }

    pub async fn list_items(
        db: &PgPool,
        school_id: Uuid,
        filters: &ItemFilterParams,
    ) -> Result<PaginatedItemsResponse, AppError> {
        let search = filters.search.as_deref().map(|s| format!("%{}%", s.trim()));
        let where_clause = "WHERE school_id = $1
               AND ($2::text IS NULL OR name ILIKE $2)
               AND ($3::text IS NULL OR category = $3)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM inventory_items {where_clause}"
        ))
        .bind(school_id)
        .bind(&search)
        .bind(&filters.category)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items {where_clause}
             ORDER BY name
             LIMIT $4 OFFSET $5"
        ))
        .bind(school_id)
        .bind(&search)
        .bind(&filters.category)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedItemsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn get_item(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Item not found")))
    }

    pub async fn update_item(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateItemDto,
    ) -> Result<InventoryItem, AppError> {
        sqlx::query_as::<_, InventoryItem>(&format!(
            "UPDATE inventory_items
             SET name = COALESCE($3, name),
                 category = COALESCE($4, category),
                 unit = COALESCE($5, unit),
                 updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.category)
        .bind(&dto.unit)
        .fetch_optional(db)
        .await
        .map_err(map_duplicate)?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Item not found")))
    }

    pub async fn delete_item(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM inventory_items WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Item not found")));
        }
        Ok(())
    }

    /// Writes the new balance and the ledger row for an item already locked
    /// by the caller's transaction.
    async fn record(
        conn: &mut PgConnection,
        item: InventoryItem,
        direction: InventoryDirection,
        quantity: i32,
        note: Option<&str>,
        performed_by: Uuid,
    ) -> Result<StockMovement, AppError> {
        let balance = stock::apply(item.quantity, direction, quantity).map_err(|e| match e {
            StockError::Insufficient { .. } => AppError::conflict(e),
            StockError::NonPositive | StockError::Overflow => AppError::bad_request(e),
        })?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "UPDATE inventory_items SET quantity = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item.id)
        .bind(balance)
        .fetch_one(&mut *conn)
        .await?;

        let transaction = sqlx::query_as::<_, InventoryTransaction>(&format!(
            "INSERT INTO inventory_transactions (item_id, direction, quantity, balance_after, note, performed_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(item.id)
        .bind(direction)
        .bind(quantity)
        .bind(balance)
        .bind(note)
        .bind(performed_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(StockMovement { item, transaction })
    }

    /// Moves stock in or out. The item row is locked so concurrent `out`
    /// movements cannot jointly overdraw it; a refused movement leaves the
    /// quantity unchanged.
    #[instrument(skip(db, dto), fields(direction = dto.direction.as_str(), quantity = dto.quantity))]
    pub async fn move_stock(
        db: &PgPool,
        item_id: Uuid,
        scope: Option<Uuid>,
        performed_by: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<StockMovement, AppError> {
        let mut tx = db.begin().await?;

        let item = sqlx::query_as::<_, InventoryItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             FOR UPDATE"
        ))
        .bind(item_id)
        .bind(scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Item not found")))?;

        let movement = match Self::record(
            &mut tx,
            item,
            dto.direction,
            dto.quantity,
            dto.note.as_deref(),
            performed_by,
        )
        .await
        {
            Ok(movement) => movement,
            Err(e) => {
                warn!(error = %e.error, "Stock movement refused");
                return Err(e);
            }
        };

        tx.commit().await?;
        metrics::track_inventory_movement(dto.direction.as_str(), dto.quantity);
        info!(balance = movement.item.quantity, "Stock moved");
        Ok(movement)
    }

    pub async fn list_transactions(
        db: &PgPool,
        item_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let item = Self::get_item(db, item_id, scope).await?;
        let transactions = sqlx::query_as::<_, InventoryTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions
             WHERE item_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(item.id)
        .fetch_all(db)
        .await?;
        Ok(transactions)
    }
}
