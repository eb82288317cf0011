//! Attendance core: the append-only event ledger, the per-day summary
//! aggregation, and the orchestration that keeps both consistent inside
//! one transaction.

use chrono::{Local, NaiveDate, NaiveDateTime};
use sqlx::{MySqlConnection, MySqlPool};
use tracing::debug;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceLog, DailySummaryRow, EventKind};

/// Typed bind values for dynamically assembled WHERE clauses.
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

/// Record one IN/OUT event for `employee_id` at the current server time.
///
/// The duplicate check, the ledger insert and the summary upsert run in a
/// single transaction; on any failure path the transaction drops and rolls
/// back, so a rejected call leaves zero net rows.
pub async fn mark_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    kind: EventKind,
    source: &str,
) -> Result<AttendanceLog, AttendanceError> {
    if source.trim().is_empty() {
        return Err(AttendanceError::Validation(
            "source must not be empty".into(),
        ));
    }

    let timestamp = Local::now().naive_local();
    let today = timestamp.date();

    let mut tx = pool.begin().await?;

    let active: Option<u64> =
        sqlx::query_scalar("SELECT id FROM employees WHERE id = ? AND is_active = 1")
            .bind(employee_id)
            .fetch_optional(&mut *tx)
            .await?;
    if active.is_none() {
        return Err(AttendanceError::NotFound);
    }

    // Serialize concurrent markers for the same (employee, day) on the
    // summary key's row lock before reading the day's last event.
    lock_summary_key(&mut tx, employee_id, today).await?;

    let last = last_event_on(&mut tx, employee_id, today).await?;
    if violates_alternation(last.as_ref().map(|l| l.event_type), kind) {
        return Err(AttendanceError::DuplicateEvent(kind));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_logs (employee_id, event_type, timestamp, source)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(kind)
    .bind(timestamp)
    .bind(source)
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_id();

    recompute_summary(&mut tx, employee_id, today, Local::now().naive_local()).await?;

    tx.commit().await?;

    debug!(employee_id, %kind, id, "attendance event recorded");

    Ok(AttendanceLog {
        id,
        employee_id,
        event_type: kind,
        timestamp,
        source: source.to_owned(),
    })
}

/// Record whichever kind is the opposite of the employee's current status.
/// The in-transaction duplicate check in `mark_attendance` stays
/// authoritative if another writer slips in between the two steps.
pub async fn toggle_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    source: &str,
) -> Result<AttendanceLog, AttendanceError> {
    let next = current_status(pool, employee_id).await?.opposite();
    mark_attendance(pool, employee_id, next, source).await
}

/// IN if today's last event is an IN; OUT in every other case, including
/// "no event today". Yesterday's events never carry over.
pub async fn current_status(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<EventKind, AttendanceError> {
    let today = Local::now().date_naive();
    let mut conn = pool.acquire().await?;
    let last = last_event_on(&mut conn, employee_id, today).await?;
    Ok(status_from_last(last.map(|l| l.event_type)))
}

/// Ledger query: optional, independently combinable filters, newest first.
/// Date bounds are inclusive and compare against the event's date component.
pub async fn list_logs(
    pool: &MySqlPool,
    employee_id: Option<u64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<AttendanceLog>, AttendanceError> {
    let (where_sql, args) = build_log_filter(employee_id, start_date, end_date);
    let sql = format!(
        "SELECT id, employee_id, event_type, timestamp, source \
         FROM attendance_logs{} ORDER BY timestamp DESC, id DESC",
        where_sql
    );

    let mut query = sqlx::query_as::<_, AttendanceLog>(&sql);
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(v),
            FilterValue::Date(d) => query.bind(d),
        };
    }

    Ok(query.fetch_all(pool).await?)
}

/// Summary query, newest date first, with the employee's display name and
/// code joined in at read time. A specific date takes precedence over the
/// start/end bounds.
pub async fn list_summaries(
    pool: &MySqlPool,
    employee_id: Option<u64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    on_date: Option<NaiveDate>,
) -> Result<Vec<DailySummaryRow>, AttendanceError> {
    let (where_sql, args) = build_summary_filter(employee_id, start_date, end_date, on_date);
    let sql = format!(
        "SELECT s.id, s.employee_id, s.date, s.first_in, s.last_out, \
         s.total_duration_seconds, s.notes, \
         e.full_name AS employee_name, e.employee_code \
         FROM attendance_summary s \
         LEFT JOIN employees e ON s.employee_id = e.id{} \
         ORDER BY s.date DESC",
        where_sql
    );

    let mut query = sqlx::query_as::<_, DailySummaryRow>(&sql);
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(v),
            FilterValue::Date(d) => query.bind(d),
        };
    }

    Ok(query.fetch_all(pool).await?)
}

/// Latest event for the employee within that exact calendar date.
async fn last_event_on(
    conn: &mut MySqlConnection,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<AttendanceLog>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceLog>(
        r#"
        SELECT id, employee_id, event_type, timestamp, source
        FROM attendance_logs
        WHERE employee_id = ? AND DATE(timestamp) = ?
        ORDER BY timestamp DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await
}

/// Prime the (employee, date) summary row and lock it. InnoDB serializes
/// every other marker for the same key on this lock until commit/rollback;
/// the priming insert rolls back with the rest on rejection.
async fn lock_summary_key(
    conn: &mut MySqlConnection,
    employee_id: u64,
    date: NaiveDate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO attendance_summary (employee_id, date, total_duration_seconds)
        VALUES (?, ?, 0)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .execute(&mut *conn)
    .await?;

    sqlx::query_scalar::<_, u64>(
        "SELECT id FROM attendance_summary WHERE employee_id = ? AND date = ? FOR UPDATE",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(())
}

/// Re-derive first_in / last_out / total_duration_seconds for one
/// (employee, date) from the ledger and upsert the summary row.
/// `notes` is never touched here.
async fn recompute_summary(
    conn: &mut MySqlConnection,
    employee_id: u64,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    let (first_in, last_out): (Option<NaiveDateTime>, Option<NaiveDateTime>) = sqlx::query_as(
        r#"
        SELECT
            MIN(CASE WHEN event_type = 'IN' THEN timestamp END) AS first_in,
            MAX(CASE WHEN event_type = 'OUT' THEN timestamp END) AS last_out
        FROM attendance_logs
        WHERE employee_id = ? AND DATE(timestamp) = ?
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    let total = total_seconds(first_in, last_out, now);

    sqlx::query(
        r#"
        INSERT INTO attendance_summary
            (employee_id, date, first_in, last_out, total_duration_seconds)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            first_in = VALUES(first_in),
            last_out = VALUES(last_out),
            total_duration_seconds = VALUES(total_duration_seconds)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(first_in)
    .bind(last_out)
    .bind(total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Day total in whole seconds. With only a first IN the day is still
/// running and the total is measured against `now`. Out-of-order events
/// can make this negative; the value is stored as computed.
fn total_seconds(
    first_in: Option<NaiveDateTime>,
    last_out: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> i64 {
    match (first_in, last_out) {
        (Some(first_in), Some(last_out)) => (last_out - first_in).num_seconds(),
        (Some(first_in), None) => (now - first_in).num_seconds(),
        (None, _) => 0,
    }
}

/// Same kind twice in a row on one day is rejected. The first event of a
/// day passes whatever its kind is.
fn violates_alternation(last_today: Option<EventKind>, requested: EventKind) -> bool {
    last_today == Some(requested)
}

/// Presence derived from today's last event only.
fn status_from_last(last_today: Option<EventKind>) -> EventKind {
    match last_today {
        Some(EventKind::In) => EventKind::In,
        _ => EventKind::Out,
    }
}

fn build_log_filter(
    employee_id: Option<u64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(id) = employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(id));
    }
    if let Some(date) = start_date {
        where_sql.push_str(" AND DATE(timestamp) >= ?");
        args.push(FilterValue::Date(date));
    }
    if let Some(date) = end_date {
        where_sql.push_str(" AND DATE(timestamp) <= ?");
        args.push(FilterValue::Date(date));
    }

    (where_sql, args)
}

fn build_summary_filter(
    employee_id: Option<u64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    on_date: Option<NaiveDate>,
) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(id) = employee_id {
        where_sql.push_str(" AND s.employee_id = ?");
        args.push(FilterValue::U64(id));
    }

    if let Some(date) = on_date {
        // start/end are ignored entirely when a specific date is given
        where_sql.push_str(" AND s.date = ?");
        args.push(FilterValue::Date(date));
    } else {
        if let Some(date) = start_date {
            where_sql.push_str(" AND s.date >= ?");
            args.push(FilterValue::Date(date));
        }
        if let Some(date) = end_date {
            where_sql.push_str(" AND s.date <= ?");
            args.push(FilterValue::Date(date));
        }
    }

    (where_sql, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(date: &str, time: &str) -> NaiveDateTime {
        format!("{date}T{time}").parse().unwrap()
    }

    #[test]
    fn full_day_duration() {
        let first_in = Some(dt("2026-08-06", "09:00:00"));
        let last_out = Some(dt("2026-08-06", "17:00:00"));
        let now = dt("2026-08-06", "23:00:00");
        assert_eq!(total_seconds(first_in, last_out, now), 28_800);
    }

    #[test]
    fn running_total_measures_against_now() {
        let first_in = Some(dt("2026-08-06", "09:00:00"));
        let now = dt("2026-08-06", "09:30:00");
        assert_eq!(total_seconds(first_in, None, now), 1_800);
    }

    #[test]
    fn no_in_event_means_zero() {
        let now = dt("2026-08-06", "12:00:00");
        assert_eq!(total_seconds(None, None, now), 0);
        // an OUT-only day still totals zero
        assert_eq!(total_seconds(None, Some(dt("2026-08-06", "08:00:00")), now), 0);
    }

    #[test]
    fn out_of_order_events_yield_negative_total() {
        let first_in = Some(dt("2026-08-06", "17:00:00"));
        let last_out = Some(dt("2026-08-06", "09:00:00"));
        let now = dt("2026-08-06", "18:00:00");
        assert_eq!(total_seconds(first_in, last_out, now), -28_800);
    }

    #[test]
    fn recompute_is_idempotent_for_fixed_inputs() {
        let first_in = Some(dt("2026-08-06", "09:00:00"));
        let last_out = Some(dt("2026-08-06", "17:00:00"));
        let now = dt("2026-08-06", "18:00:00");
        let a = total_seconds(first_in, last_out, now);
        let b = total_seconds(first_in, last_out, now);
        assert_eq!(a, b);
    }

    #[test]
    fn same_kind_twice_is_a_duplicate() {
        assert!(violates_alternation(Some(EventKind::In), EventKind::In));
        assert!(violates_alternation(Some(EventKind::Out), EventKind::Out));
        assert!(!violates_alternation(Some(EventKind::In), EventKind::Out));
        assert!(!violates_alternation(Some(EventKind::Out), EventKind::In));
    }

    #[test]
    fn first_event_of_the_day_may_be_either_kind() {
        assert!(!violates_alternation(None, EventKind::In));
        assert!(!violates_alternation(None, EventKind::Out));
    }

    #[test]
    fn status_defaults_to_out() {
        assert_eq!(status_from_last(None), EventKind::Out);
        assert_eq!(status_from_last(Some(EventKind::Out)), EventKind::Out);
        assert_eq!(status_from_last(Some(EventKind::In)), EventKind::In);
    }

    #[test]
    fn log_filter_combines_bounds_independently() {
        let (sql, args) = build_log_filter(None, None, None);
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());

        let (sql, args) = build_log_filter(
            Some(42),
            Some("2026-08-01".parse().unwrap()),
            Some("2026-08-06".parse().unwrap()),
        );
        assert_eq!(
            sql,
            " WHERE 1=1 AND employee_id = ? AND DATE(timestamp) >= ? AND DATE(timestamp) <= ?"
        );
        assert_eq!(args.len(), 3);

        let (sql, args) = build_log_filter(None, None, Some("2026-08-06".parse().unwrap()));
        assert_eq!(sql, " WHERE 1=1 AND DATE(timestamp) <= ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn specific_date_overrides_range_bounds() {
        let (sql, args) = build_summary_filter(
            Some(42),
            Some("2026-08-01".parse().unwrap()),
            Some("2026-08-31".parse().unwrap()),
            Some("2026-08-06".parse().unwrap()),
        );
        assert_eq!(sql, " WHERE 1=1 AND s.employee_id = ? AND s.date = ?");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn summary_range_bounds_apply_without_specific_date() {
        let (sql, args) = build_summary_filter(
            None,
            Some("2026-08-01".parse().unwrap()),
            None,
            None,
        );
        assert_eq!(sql, " WHERE 1=1 AND s.date >= ?");
        assert_eq!(args.len(), 1);
    }

    // Exercises the summary-key lock under real contention. Needs a MySQL
    // with schema.sql applied and DATABASE_URL pointing at it.
    #[actix_web::test]
    #[ignore = "requires MySQL at DATABASE_URL"]
    async fn two_concurrent_marks_one_survives() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = MySqlPool::connect(&url).await.unwrap();

        sqlx::query(
            r#"
            INSERT INTO employees (employee_code, full_name, email, password_hash, role)
            VALUES ('EMP-RACE', 'Race Fixture', 'race@example.test', 'x', 'employee')
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let employee_id: u64 =
            sqlx::query_scalar("SELECT id FROM employees WHERE employee_code = 'EMP-RACE'")
                .fetch_one(&pool)
                .await
                .unwrap();

        sqlx::query("DELETE FROM attendance_logs WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM attendance_summary WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&pool)
            .await
            .unwrap();

        let (a, b) = futures::join!(
            mark_attendance(&pool, employee_id, EventKind::In, "test"),
            mark_attendance(&pool, employee_id, EventKind::In, "test"),
        );
        assert!(a.is_ok() != b.is_ok(), "exactly one mark must win");

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_logs WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);

        let summaries: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_summary WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(summaries, 1);
    }
}
