use crate::error::FixtureError;

const DATABASE: &str = "payment_registration_system";

/// Connection settings for the relational (MySQL) target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Connection settings for the document (MongoDB) target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Database the credentials are defined in
    pub auth_source: String,
    pub database: String,
}

/// How many records of each kind a full run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureCounts {
    pub banks: usize,
    pub customers: usize,
    pub discounts: usize,
    /// Customers linked in the relational store, and link documents drawn in the document store
    pub relationships: usize,
}

/// The fixed pools names and titles are sampled from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplePools {
    pub bank_names: Vec<String>,
    pub customer_names: Vec<String>,
    pub promotion_titles: Vec<String>,
    pub store_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub mysql: MySqlConfig,
    pub mongodb: MongoConfig,
    pub counts: FixtureCounts,
    pub pools: SamplePools,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        MySqlConfig {
            host: "localhost".to_owned(),
            port: 3306,
            user: "testuser".to_owned(),
            password: "testpassword".to_owned(),
            database: DATABASE.to_owned(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            host: "localhost".to_owned(),
            port: 27017,
            username: "testuser".to_owned(),
            password: "testpassword".to_owned(),
            auth_source: DATABASE.to_owned(),
            database: DATABASE.to_owned(),
        }
    }
}

impl Default for FixtureCounts {
    fn default() -> Self {
        FixtureCounts {
            banks: 10,
            customers: 50,
            discounts: 5,
            relationships: 50,
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|&v| v.to_owned()).collect()
}

impl Default for SamplePools {
    fn default() -> Self {
        SamplePools {
            bank_names: owned(&["Galicia", "BBVA", "Galicia Mas", "Santander"]),
            customer_names: owned(&[
                "German Castiglione",
                "Jeremias Herrera",
                "Ignazio March",
                "Ramiro Gershkovich",
                "Graciana Endrizzi",
                "Yara Fanucci",
                "Crisanna Toledo",
                "Carilla Benítez",
                "Vicenta Gimenez",
                "Eliana Pereyra",
            ]),
            promotion_titles: owned(&["10% Off", "Zero Interest", "Cashback 2%"]),
            store_names: owned(&["Falabela", "COTO", "Kiosko 365", "Tecno Compro"]),
        }
    }
}

impl SamplePools {
    /// # Errors
    /// Errors with [`FixtureError::EmptyPool`] naming the first pool with nothing to sample
    pub fn validate(&self) -> Result<(), FixtureError> {
        let pools = [
            ("bank_names", &self.bank_names),
            ("customer_names", &self.customer_names),
            ("promotion_titles", &self.promotion_titles),
            ("store_names", &self.store_names),
        ];
        match pools.iter().find(|(_, pool)| pool.is_empty()) {
            Some(&(name, _)) => Err(FixtureError::EmptyPool(name)),
            None => Ok(()),
        }
    }
}

impl Config {
    /// # Errors
    /// Errors when any sample pool is empty
    pub fn validate(&self) -> Result<(), FixtureError> {
        self.pools.validate()
    }
}
