use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 50_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Taken employee codes and emails, normalized to lowercase.
static IDENTIFIER_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// Check if an identifier might be taken (false positives possible)
pub fn might_exist(identifier: &str) -> bool {
    let identifier = normalize(identifier);
    IDENTIFIER_FILTER
        .read()
        .expect("identifier filter poisoned")
        .contains(&identifier)
}

/// Insert a single identifier into the filter
pub fn insert(identifier: &str) {
    let identifier = normalize(identifier);
    IDENTIFIER_FILTER
        .write()
        .expect("identifier filter poisoned")
        .add(&identifier);
}

/// Warm up the filter from the employees table using streaming + batching
pub async fn warmup_identifier_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String, String)>("SELECT employee_code, email FROM employees")
            .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size * 2);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code, email) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        batch.push(normalize(&email));
        total += 1;

        if batch.len() >= batch_size * 2 {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    tracing::info!("Identifier filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized identifiers
fn insert_batch(identifiers: &[String]) {
    let mut filter = IDENTIFIER_FILTER
        .write()
        .expect("identifier filter poisoned");

    for identifier in identifiers {
        filter.add(identifier);
    }
}
