use mongodb::bson::{Bson, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A catalog entry. The schema is owned by the database; this mirrors it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub price: f64,
    pub published_year: i32,
    pub in_stock: bool,
}

/// Projected subset returned by the genre listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: String,
    pub price: f64,
}

/// One row of a grouping aggregation. The key is a string for author and
/// genre groupings and an integer for decade groupings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStat {
    #[serde(rename = "_id")]
    pub key: Bson,
    pub avg_price: f64,
    pub count: i64,
}

impl Book {
    pub fn new(
        title: &str,
        author: &str,
        genre: &str,
        price: f64,
        published_year: i32,
        in_stock: bool,
    ) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            price,
            published_year,
            in_stock,
        }
    }
}
