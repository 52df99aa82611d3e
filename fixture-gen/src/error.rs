use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("SQL Error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("MongoDB Error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("BSON serialization Error: {0}")]
    Bson(#[from] bson::ser::Error),
    #[error("The sample pool `{0}` is empty")]
    EmptyPool(&'static str),
    #[error("The document collection `{0}` holds no documents to link")]
    EmptyCollection(&'static str),
    #[error("At least one bank is required to reference banks by id")]
    NoBanks,
}
