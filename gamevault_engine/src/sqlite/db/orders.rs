use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderChange, OrderId, StatusPair},
    traits::OrderStoreError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can
/// embed this call inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as
/// the connection argument.
///
/// New orders always start in PENDING/WAITING; the column defaults take care of that.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                order_number,
                customer_name,
                customer_email,
                customer_phone,
                product_id,
                product_name,
                unit_price,
                quantity,
                total,
                payment_expiry,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.order_number.clone())
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(order.product_id)
    .bind(order.product_name)
    .bind(order.unit_price.value())
    .bind(order.quantity)
    .bind(order.total.value())
    .bind(order.payment_expiry)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderStoreError::OrderAlreadyExists(order.order_number))
        },
        Err(e) => Err(e.into()),
    }
}

/// Returns the order with the given system id, if it exists.
pub async fn fetch_order_by_id(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order matching the given key on either the system id or the order number.
/// Customers paste both forms into the status page, so the lookup accepts either.
pub async fn fetch_order_by_id_or_number(
    key: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 OR order_number = $1 LIMIT 1")
        .bind(key)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Applies `change` in a single conditional UPDATE guarded on the expected
/// `(status, payment_status)` pair. Exactly one of any set of racing writers observes a row here;
/// the rest get `None` back.
pub(crate) async fn checked_update(
    id: &OrderId,
    expected: StatusPair,
    change: OrderChange,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    if change.is_empty() {
        debug!("📝️ No fields to update for order {id}. Update request skipped.");
        return Err(OrderStoreError::EmptyUpdate(id.clone()));
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = change.new_status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(payment_status) = change.new_payment_status {
        set_clause.push("payment_status = ");
        set_clause.push_bind_unseparated(payment_status.to_string());
    }
    if let Some(method) = change.new_payment_method {
        set_clause.push("payment_method = ");
        set_clause.push_bind_unseparated(method.to_string());
    }
    if let Some(paid_at) = change.paid_at {
        set_clause.push("paid_at = ");
        set_clause.push_bind_unseparated(paid_at);
    }
    if let Some(delivered_at) = change.delivered_at {
        set_clause.push("delivered_at = ");
        set_clause.push_bind_unseparated(delivered_at);
    }
    if let Some(account_email) = change.account_email {
        set_clause.push("account_email = ");
        set_clause.push_bind_unseparated(account_email);
    }
    if let Some(account_password) = change.account_password {
        set_clause.push("account_password = ");
        set_clause.push_bind_unseparated(account_password);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str());
    builder.push(" AND status = ");
    builder.push_bind(expected.status.to_string());
    builder.push(" AND payment_status = ");
    builder.push_bind(expected.payment_status.to_string());
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let res = builder.build().fetch_optional(conn).await?.map(|row: SqliteRow| Order::from_row(&row)).transpose()?;
    trace!("📝️ Result of checked_update: {res:?}");
    Ok(res)
}

/// Fetches the orders the expiry sweep should cancel: still PENDING, no verified payment, and a
/// payment window that lapsed before `now`.
pub(crate) async fn expired_pending(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let rows = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status = 'PENDING'
          AND payment_status IN ('WAITING', 'PENDING')
          AND datetime(payment_expiry) < datetime($1)
        ORDER BY payment_expiry ASC
        "#,
    )
    .bind(now)
    .fetch_all(&mut *conn)
    .await?;
    let w1: Vec<Order> = sqlx::query_as(
        r#"SELECT * FROM orders WHERE status='PENDING' AND payment_status IN ('WAITING','PENDING') AND datetime(payment_expiry) < datetime(CAST(? AS TEXT))"#,
    ).bind(now).fetch_all(&mut *conn).await?;
    let w2: Vec<Order> = sqlx::query_as(
        r#"SELECT * FROM orders WHERE status='PENDING' AND payment_status IN ('WAITING','PENDING') AND datetime(payment_expiry) < datetime(?1)"#,
    ).bind(now).fetch_all(&mut *conn).await?;
    let w3: Vec<Order> = sqlx::query_as(
        r#"SELECT * FROM orders WHERE status='PENDING' AND payment_status IN ('WAITING','PENDING') AND datetime(payment_expiry) < datetime(?)"#,
    ).bind(now.to_rfc3339()).fetch_all(&mut *conn).await?;
    eprintln!("DBG cast={} qmark1={} bindstring={}", w1.len(), w2.len(), w3.len());
    Ok(rows)
}

/// Fetches the PROCESSING orders that were paid before `cutoff` but still have no account
/// assigned and no refund escalation sent.
pub(crate) async fn stuck_processing(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let rows = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status = 'PROCESSING'
          AND account_email IS NULL
          AND refund_escalated_at IS NULL
          AND datetime(paid_at) < datetime($1)
        ORDER BY paid_at ASC
        "#,
    )
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Sets the refund-escalation marker, guarded on it still being unset and the order still being
/// undelivered PROCESSING. The winner of this write is the one sweep run that sends the message.
pub(crate) async fn mark_refund_escalated(
    id: &OrderId,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let order = sqlx::query_as(
        r#"
        UPDATE orders SET refund_escalated_at = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2
          AND status = 'PROCESSING'
          AND account_email IS NULL
          AND refund_escalated_at IS NULL
        RETURNING *
        "#,
    )
    .bind(at)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
