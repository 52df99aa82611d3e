use async_trait::async_trait;
use log::{debug, info};
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, Credential, FindOptions, ServerAddress};
use mongodb::{Client, Database};

use crate::config::MongoConfig;
use crate::error::FixtureError;
use crate::store::DocumentStore;

/// The document target. Ids are generated by the server on insert.
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Builds the client handle. No round trip happens until the first operation.
    ///
    /// # Errors
    /// Errors when the client options are rejected by the driver
    pub fn connect(config: &MongoConfig) -> Result<Self, FixtureError> {
        let credential = Credential::builder()
            .username(config.username.clone())
            .password(config.password.clone())
            .source(config.auth_source.clone())
            .build();
        let options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: config.host.clone(),
                port: Some(config.port),
            }])
            .credential(credential)
            .build();
        let client = Client::with_options(options)?;
        info!(
            "Using MongoDB at {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(MongoStore {
            database: client.database(&config.database),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&mut self, collection: &str, document: Document) -> Result<Bson, FixtureError> {
        let result = self
            .database
            .collection::<Document>(collection)
            .insert_one(document, None)
            .await?;
        debug!("Inserted {} into {collection}", result.inserted_id);
        Ok(result.inserted_id)
    }

    async fn ids(&mut self, collection: &str) -> Result<Vec<Bson>, FixtureError> {
        let options = FindOptions::builder().projection(doc! { "_id": 1 }).build();
        let mut cursor = self
            .database
            .collection::<Document>(collection)
            .find(doc! {}, options)
            .await?;
        let mut ids = Vec::new();
        while cursor.advance().await? {
            if let Some(id) = cursor.deserialize_current()?.remove("_id") {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[tokio::test]
    #[ignore = "needs the MongoDB test database"]
    async fn test_live_ids_read_back() {
        let mut store = MongoStore::connect(&MongoConfig::default()).unwrap();
        let collection = format!("fixture_gen_ids_{}", ObjectId::new());
        let first = store.insert(&collection, doc! { "name": "BBVA" }).await.unwrap();
        let second = store.insert(&collection, doc! { "name": "COTO" }).await.unwrap();

        let ids = store.ids(&collection).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first));
        assert!(ids.contains(&second));

        store
            .database
            .collection::<Document>(&collection)
            .drop(None)
            .await
            .unwrap();
    }
}
