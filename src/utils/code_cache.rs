use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => identifier is TAKEN
/// false => identifier is AVAILABLE (usually we store only taken)
pub static IDENTIFIER_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single employee code or email as taken
pub async fn mark_taken(identifier: &str) {
    IDENTIFIER_CACHE
        .insert(identifier.to_lowercase(), true)
        .await;
}

/// Check if an identifier is taken
pub async fn is_taken(identifier: &str) -> bool {
    IDENTIFIER_CACHE
        .get(&identifier.to_lowercase())
        .await
        .unwrap_or(false)
}

/// Batch mark identifiers as taken
async fn batch_mark(identifiers: &[String]) {
    let futures: Vec<_> = identifiers
        .iter()
        .map(|i| IDENTIFIER_CACHE.insert(i.to_lowercase(), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load identifiers of RECENTLY registered employees into the cache (batched)
pub async fn warmup_identifier_cache(
    pool: &MySqlPool,
    days: u32,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT employee_code, email
        FROM employees
        WHERE created_at >= NOW() - INTERVAL ? DAY
        ORDER BY created_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (code, email) = row?;
        batch.push(code);
        batch.push(email);
        total_count += 1;

        if batch.len() >= batch_size * 2 {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    tracing::info!(
        "Identifier cache warmup complete: {} recent employees (last {} days)",
        total_count,
        days
    );

    Ok(())
}
