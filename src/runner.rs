use anyhow::{Context, Result};
use mongodb::{
    Database,
    bson::{Bson, Document, doc},
};

use crate::db::models::Book;
use crate::db::queries;

const FEATURED_GENRE: &str = "Fantasy";
const PRICE_RAISE_FACTOR: f64 = 1.1;
const CUTOFF_YEAR: i32 = 1950;
const PAGE_SIZE: i64 = 5;
const TOP_GROUPS: i64 = 5;

/// Execute the fixed operation sequence against the books collection.
///
/// Every step is awaited before the next; the first error aborts the
/// remainder and propagates to the caller, which still owns the connection.
pub async fn run(db: &Database) -> Result<()> {
    // 1. Filtered read with projection
    tracing::info!("🔎 {FEATURED_GENRE} books (title, author, price):");
    let featured = queries::find_by_genre(db, FEATURED_GENRE).await?;
    for book in &featured {
        tracing::info!("   {} by {} (${:.2})", book.title, book.author, book.price);
    }
    tracing::info!("✅ {} {FEATURED_GENRE} books found", featured.len());

    // 2. Bulk price update
    // Reruns compound prices; reseed the collection before running twice.
    tracing::warn!("⚠️ price raise is not idempotent across reruns");
    let modified = queries::raise_prices(db, FEATURED_GENRE, PRICE_RAISE_FACTOR).await?;
    tracing::info!(
        "✅ raised {FEATURED_GENRE} prices by {:.0}%: {modified} books updated",
        (PRICE_RAISE_FACTOR - 1.0) * 100.0
    );

    // 3. Bulk delete
    let deleted = queries::delete_published_before(db, CUTOFF_YEAR).await?;
    tracing::info!("🗑️ deleted {deleted} books published before {CUTOFF_YEAR}");

    // 4. Paginated reads
    tracing::info!("📖 cheapest in-stock books, first page:");
    let in_stock = queries::find_page(
        db,
        doc! { "in_stock": true },
        doc! { "price": 1 },
        0,
        PAGE_SIZE,
    )
    .await?;
    for book in &in_stock {
        log_book(book);
    }

    tracing::info!("📖 {FEATURED_GENRE} books by recency, second page:");
    let recent = queries::find_page(
        db,
        doc! { "genre": FEATURED_GENRE },
        doc! { "published_year": -1 },
        PAGE_SIZE as u64,
        PAGE_SIZE,
    )
    .await?;
    for book in &recent {
        log_book(book);
    }

    // 5. Grouping aggregations
    for (label, key) in [
        ("author", Bson::from("$author")),
        ("genre", Bson::from("$genre")),
        ("decade", queries::decade_key()),
    ] {
        tracing::info!("📊 top {TOP_GROUPS} {label}s by average price:");
        let stats = queries::group_stats(db, key, TOP_GROUPS).await?;
        for stat in &stats {
            tracing::info!(
                "   {}: avg ${:.2} across {} books",
                stat.key,
                stat.avg_price,
                stat.count
            );
        }
    }

    // 6. Index creation
    let created = queries::create_catalog_indexes(db).await?;
    tracing::info!("✅ created indexes: {}", created.join(", "));

    // 7. Index listing
    let names = queries::index_names(db).await?;
    tracing::info!("📇 indexes on books: {}", names.join(", "));

    // 8. Full sorts by price
    tracing::info!("💰 catalog by price, ascending:");
    let ascending = queries::find_sorted_by_price(db, true).await?;
    for book in &ascending {
        log_book(book);
    }
    tracing::info!("💰 catalog by price, descending:");
    let descending = queries::find_sorted_by_price(db, false).await?;
    for book in &descending {
        log_book(book);
    }
    tracing::info!(
        "✅ sorted {} books by price, ascending and descending",
        descending.len()
    );

    // 9. Query plans, indexed vs not
    let indexed = queries::explain_find(db, doc! { "genre": FEATURED_GENRE }).await?;
    report_plan("genre equality (indexed)", &indexed)?;

    let unindexed = queries::explain_find(db, doc! { "title": "The Hobbit" }).await?;
    report_plan("title equality (no index)", &unindexed)?;

    Ok(())
}

fn log_book(book: &Book) {
    tracing::info!(
        "   {} by {} ({}, ${:.2})",
        book.title,
        book.author,
        book.published_year,
        book.price
    );
}

/// Dump the raw execution stats and log a one-line plan summary.
fn report_plan(label: &str, explain: &Document) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(explain)?);

    let stats = explain
        .get_document("executionStats")
        .context("explain reply has no executionStats")?;
    let stage = explain
        .get_document("queryPlanner")
        .ok()
        .and_then(|planner| planner.get_document("winningPlan").ok())
        .and_then(winning_stage)
        .unwrap_or("unknown");

    tracing::info!(
        "🧭 {label}: {stage}, examined {} docs, returned {}",
        stat_i64(stats, "totalDocsExamined"),
        stat_i64(stats, "nReturned")
    );

    Ok(())
}

/// Innermost stage of a winning plan, e.g. IXSCAN or COLLSCAN.
fn winning_stage(plan: &Document) -> Option<&str> {
    match plan.get_document("inputStage") {
        Ok(inner) => winning_stage(inner),
        Err(_) => plan.get_str("stage").ok(),
    }
}

// Servers report counters as either int32 or int64 depending on version.
fn stat_i64(stats: &Document, key: &str) -> i64 {
    match stats.get(key) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winning_stage_walks_to_innermost_input_stage() {
        let plan = doc! {
            "stage": "FETCH",
            "inputStage": {
                "stage": "IXSCAN",
                "keyPattern": { "genre": 1 },
            }
        };
        assert_eq!(winning_stage(&plan), Some("IXSCAN"));

        let flat = doc! { "stage": "COLLSCAN" };
        assert_eq!(winning_stage(&flat), Some("COLLSCAN"));
    }

    #[test]
    fn stat_i64_reads_both_integer_widths() {
        let stats = doc! { "totalDocsExamined": 12i32, "nReturned": 7i64 };
        assert_eq!(stat_i64(&stats, "totalDocsExamined"), 12);
        assert_eq!(stat_i64(&stats, "nReturned"), 7);
        assert_eq!(stat_i64(&stats, "missing"), 0);
    }
}
