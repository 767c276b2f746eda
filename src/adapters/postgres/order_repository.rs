//! PostgreSQL implementation of OrderRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    CustomerId, DomainError, DriverId, ErrorCode, Money, OrderId, PaymentId, Timestamp, VendorId,
};
use crate::domain::order::{Order, OrderStatus, OrderTotals};
use crate::domain::payment::PaymentStatus;
use crate::ports::OrderRepository;

/// PostgreSQL implementation of the OrderRepository port.
///
/// `update` is a compare-and-swap on the `version` column: the UPDATE
/// only matches when the stored version equals the caller's, so two
/// concurrent transitions on one order resolve to a single winner.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    status: String,
    customer_id: Uuid,
    vendor_id: Uuid,
    driver_id: Option<Uuid>,
    subtotal_minor: i64,
    tax_minor: i64,
    delivery_fee_minor: i64,
    total_minor: i64,
    currency: String,
    payment_id: Option<Uuid>,
    payment_status: Option<String>,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    version: i32,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status)
            .map_err(|e| DomainError::database(format!("invalid order status: {}", e)))?;
        let payment_status = row
            .payment_status
            .as_deref()
            .map(|s| {
                PaymentStatus::parse(s).ok_or_else(|| {
                    DomainError::database(format!("invalid payment status '{}'", s))
                })
            })
            .transpose()?;

        let money = |amount: i64| {
            Money::new(amount, row.currency.clone())
                .map_err(|e| DomainError::database(format!("invalid money column: {}", e)))
        };
        let totals = OrderTotals {
            subtotal: money(row.subtotal_minor)?,
            tax: money(row.tax_minor)?,
            delivery_fee: money(row.delivery_fee_minor)?,
            total: money(row.total_minor)?,
        };

        Ok(Order {
            id: OrderId::from_uuid(row.id),
            status,
            customer: CustomerId::from_uuid(row.customer_id),
            vendor: VendorId::from_uuid(row.vendor_id),
            driver: row.driver_id.map(DriverId::from_uuid),
            totals,
            payment: row.payment_id.map(PaymentId::from_uuid),
            payment_status,
            cancellation_reason: row.cancellation_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            delivered_at: row.delivered_at.map(Timestamp::from_datetime),
            version: row.version as u32,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, status, customer_id, vendor_id, driver_id, subtotal_minor,
                   tax_minor, delivery_fee_minor, total_minor, currency, payment_id,
                   payment_status, cancellation_reason, created_at, delivered_at, version
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to find order: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, status, customer_id, vendor_id, driver_id, subtotal_minor,
                tax_minor, delivery_fee_minor, total_minor, currency, payment_id,
                payment_status, cancellation_reason, created_at, delivered_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.customer.as_uuid())
        .bind(order.vendor.as_uuid())
        .bind(order.driver.as_ref().map(|d| *d.as_uuid()))
        .bind(order.totals.subtotal.amount_minor())
        .bind(order.totals.tax.amount_minor())
        .bind(order.totals.delivery_fee.amount_minor())
        .bind(order.totals.total.amount_minor())
        .bind(order.totals.total.currency())
        .bind(order.payment.as_ref().map(|p| *p.as_uuid()))
        .bind(order.payment_status.map(|s| s.as_str()))
        .bind(&order.cancellation_reason)
        .bind(order.created_at.as_datetime())
        .bind(order.delivered_at.as_ref().map(|t| *t.as_datetime()))
        .bind(order.version as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to insert order: {}", e)))?;

        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                driver_id = $3,
                payment_id = $4,
                payment_status = $5,
                cancellation_reason = $6,
                delivered_at = $7,
                version = version + 1
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.driver.as_ref().map(|d| *d.as_uuid()))
        .bind(order.payment.as_ref().map(|p| *p.as_uuid()))
        .bind(order.payment_status.map(|s| s.as_str()))
        .bind(&order.cancellation_reason)
        .bind(order.delivered_at.as_ref().map(|t| *t.as_datetime()))
        .bind(order.version as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to update order: {}", e)))?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost version race.
            let exists: Option<(i32,)> =
                sqlx::query_as("SELECT version FROM orders WHERE id = $1")
                    .bind(order.id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| {
                        DomainError::database(format!("failed to check order: {}", e))
                    })?;

            return match exists {
                Some((version,)) => Err(DomainError::conflict(format!(
                    "order {} version moved from {} to {}",
                    order.id, order.version, version
                ))),
                None => Err(DomainError::new(
                    ErrorCode::OrderNotFound,
                    format!("order {} not found", order.id),
                )),
            };
        }

        Ok(())
    }
}
