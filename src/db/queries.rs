use anyhow::Result;
use futures_util::TryStreamExt;
use mongodb::{
    Database, IndexModel,
    bson::{Bson, Document, bson, doc},
};

use super::models::*;

const COLLECTION: &str = "books";

/// Books in one genre, projected down to title, author and price.
pub async fn find_by_genre(db: &Database, genre: &str) -> Result<Vec<BookSummary>> {
    let collection = db.collection::<BookSummary>(COLLECTION);

    let mut cursor = collection
        .find(doc! { "genre": genre })
        .projection(doc! { "title": 1, "author": 1, "price": 1, "_id": 0 })
        .await?;

    let mut books = Vec::new();
    while cursor.advance().await? {
        books.push(cursor.deserialize_current()?);
    }

    Ok(books)
}

/// Multiply the price of every matching book. Returns the modified count.
/// Not idempotent: each call compounds on the previous one.
pub async fn raise_prices(db: &Database, genre: &str, factor: f64) -> Result<u64> {
    let collection = db.collection::<Book>(COLLECTION);

    let result = collection
        .update_many(
            doc! { "genre": genre },
            doc! { "$mul": { "price": factor } },
        )
        .await?;

    Ok(result.modified_count)
}

/// Delete every book published before the given year. Returns the deleted count.
pub async fn delete_published_before(db: &Database, year: i32) -> Result<u64> {
    let collection = db.collection::<Book>(COLLECTION);

    let result = collection
        .delete_many(doc! { "published_year": { "$lt": year } })
        .await?;

    Ok(result.deleted_count)
}

/// One page of books for the given filter and sort order.
pub async fn find_page(
    db: &Database,
    filter: Document,
    sort: Document,
    skip: u64,
    limit: i64,
) -> Result<Vec<Book>> {
    let collection = db.collection::<Book>(COLLECTION);

    let mut cursor = collection
        .find(filter)
        .sort(sort)
        .skip(skip)
        .limit(limit)
        .await?;

    let mut books = Vec::new();
    while cursor.advance().await? {
        books.push(cursor.deserialize_current()?);
    }

    Ok(books)
}

/// Group key expression for the decade a book was published in.
pub fn decade_key() -> Bson {
    bson!({ "$subtract": ["$published_year", { "$mod": ["$published_year", 10] }] })
}

/// The grouping pipeline shared by every grouping key: average price and
/// book count per group, highest average first, top `limit` groups.
pub fn group_pipeline(key: impl Into<Bson>, limit: i64) -> Vec<Document> {
    vec![
        doc! {
            "$group": {
                "_id": key.into(),
                "avg_price": { "$avg": "$price" },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "avg_price": -1 } },
        doc! { "$limit": limit },
    ]
}

/// Run the grouping pipeline for one key.
pub async fn group_stats(
    db: &Database,
    key: impl Into<Bson>,
    limit: i64,
) -> Result<Vec<GroupStat>> {
    let collection = db.collection::<Book>(COLLECTION);

    let stats = collection
        .aggregate(group_pipeline(key, limit))
        .with_type::<GroupStat>()
        .await?
        .try_collect()
        .await?;

    Ok(stats)
}

/// Create the catalog's secondary indexes, one single-field and one
/// compound. Returns the created index names.
pub async fn create_catalog_indexes(db: &Database) -> Result<Vec<String>> {
    let collection = db.collection::<Book>(COLLECTION);

    let genre_index = collection
        .create_index(IndexModel::builder().keys(doc! { "genre": 1 }).build())
        .await?;

    let author_year_index = collection
        .create_index(
            IndexModel::builder()
                .keys(doc! { "author": 1, "published_year": 1 })
                .build(),
        )
        .await?;

    Ok(vec![genre_index.index_name, author_year_index.index_name])
}

/// Names of every index on the books collection.
pub async fn index_names(db: &Database) -> Result<Vec<String>> {
    let collection = db.collection::<Book>(COLLECTION);

    Ok(collection.list_index_names().await?)
}

/// Every book, sorted by price.
pub async fn find_sorted_by_price(db: &Database, ascending: bool) -> Result<Vec<Book>> {
    let collection = db.collection::<Book>(COLLECTION);
    let direction = if ascending { 1 } else { -1 };

    let mut cursor = collection
        .find(doc! {})
        .sort(doc! { "price": direction })
        .await?;

    let mut books = Vec::new();
    while cursor.advance().await? {
        books.push(cursor.deserialize_current()?);
    }

    Ok(books)
}

/// Ask the server how it would execute a find with the given filter,
/// including execution statistics.
pub async fn explain_find(db: &Database, filter: Document) -> Result<Document> {
    let reply = db
        .run_command(doc! {
            "explain": { "find": COLLECTION, "filter": filter },
            "verbosity": "executionStats",
        })
        .await?;

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_pipeline_has_group_sort_limit_stages() {
        let pipeline = group_pipeline("$author", 5);
        assert_eq!(pipeline.len(), 3);

        let group = pipeline[0].get_document("$group").unwrap();
        assert_eq!(group.get_str("_id").unwrap(), "$author");
        let avg = group.get_document("avg_price").unwrap();
        assert_eq!(avg.get_str("$avg").unwrap(), "$price");
        let count = group.get_document("count").unwrap();
        assert_eq!(count.get_i32("$sum").unwrap(), 1);

        let sort = pipeline[1].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("avg_price").unwrap(), -1);

        assert_eq!(pipeline[2].get_i64("$limit").unwrap(), 5);
    }

    #[test]
    fn decade_key_truncates_year_to_decade() {
        let Bson::Document(expr) = decade_key() else {
            panic!("decade key must be a document expression");
        };

        let subtract = expr.get_array("$subtract").unwrap();
        assert_eq!(subtract[0], Bson::String("$published_year".into()));

        let Bson::Document(modulo) = &subtract[1] else {
            panic!("second operand must be a $mod expression");
        };
        let operands = modulo.get_array("$mod").unwrap();
        assert_eq!(operands[0], Bson::String("$published_year".into()));
        assert_eq!(operands[1], Bson::Int32(10));
    }
}
