//! PostgreSQL implementation of PaymentRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Money, OrderId, PaymentId, Timestamp};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::ports::PaymentRepository;

/// PostgreSQL implementation of the PaymentRepository port.
pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    provider_payment_id: String,
    status: String,
    amount_minor: i64,
    currency: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = PaymentStatus::parse(&row.status).ok_or_else(|| {
            DomainError::database(format!("invalid payment status '{}'", row.status))
        })?;
        let amount = Money::new(row.amount_minor, row.currency)
            .map_err(|e| DomainError::database(format!("invalid money column: {}", e)))?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            order_id: OrderId::from_uuid(row.order_id),
            provider_payment_id: row.provider_payment_id,
            status,
            amount,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, order_id, provider_payment_id, status, amount_minor, currency,
           failure_reason, created_at, updated_at
    FROM payments
"#;

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_PAYMENT))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE order_id = $1", SELECT_PAYMENT))
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE provider_payment_id = $1", SELECT_PAYMENT))
                .bind(provider_payment_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn insert(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, provider_payment_id, status, amount_minor, currency,
                failure_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(&payment.provider_payment_id)
        .bind(payment.status.as_str())
        .bind(payment.amount.amount_minor())
        .bind(payment.amount.currency())
        .bind(&payment.failure_reason)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_provider_payment_id_key") {
                    return DomainError::conflict(format!(
                        "provider payment id {} already exists",
                        payment.provider_payment_id
                    ));
                }
            }
            DomainError::database(format!("failed to insert payment: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $2,
                failure_reason = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.status.as_str())
        .bind(&payment.failure_reason)
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("failed to update payment: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentNotFound,
                format!("payment {} not found", payment.id),
            ));
        }

        Ok(())
    }
}
