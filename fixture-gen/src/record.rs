use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{self, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::SamplePools;
use crate::error::FixtureError;
use crate::store::{RelationalRow, SqlValue};

/// Number of decimal places kept for percentages and price caps
pub const NUM_DECIMAL_PLACES: u32 = 2;

/// A record written once to a relational table and once to a document collection.
///
/// Timestamps are UTC on both sides, not local wall-clock time.
pub trait Fixture: Serialize {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const COLLECTION: &'static str;

    /// The record's values in [`Fixture::COLUMNS`] order
    fn values(&self) -> Vec<SqlValue>;

    #[must_use]
    fn to_row(&self) -> RelationalRow {
        RelationalRow {
            table: Self::TABLE,
            columns: Self::COLUMNS,
            values: self.values(),
        }
    }

    /// # Errors
    /// Errors when the record cannot be represented as BSON
    fn to_document(&self) -> Result<Document, FixtureError> {
        Ok(bson::to_document(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bank {
    pub name: String,
    pub cuit: String,
    pub address: String,
    pub telephone: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub complete_name: String,
    pub dni: String,
    pub cuit: String,
    pub address: String,
    pub telephone: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub entry_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discount {
    pub code: String,
    pub promotion_title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    pub name_store: String,
    pub cuit_store: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub validity_start_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub validity_end_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_cap: Decimal,
    pub only_cash: bool,
    pub comments: String,
    /// Drawn from the configured bank id range, never checked against inserted rows
    pub bank_id: u64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

fn sample<'a, R: Rng + ?Sized>(
    rng: &mut R,
    pool: &'a [String],
    pool_name: &'static str,
) -> Result<&'a str, FixtureError> {
    pool.choose(rng)
        .map(String::as_str)
        .ok_or(FixtureError::EmptyPool(pool_name))
}

fn telephone<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(1_000_000_000_u64..=9_999_999_999).to_string()
}

/// `30` followed by `sequence` padded to 11 digits and one random check digit
fn company_cuit<R: Rng + ?Sized>(rng: &mut R, sequence: usize) -> String {
    format!("30{sequence:011}{}", rng.gen_range(0..=9))
}

/// A uniformly drawn amount in `[low, high]` with [`NUM_DECIMAL_PLACES`] decimals
fn amount<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> Decimal {
    let scale = 10_i64.pow(NUM_DECIMAL_PLACES);
    Decimal::new(rng.gen_range(low * scale..=high * scale), NUM_DECIMAL_PLACES)
}

impl Bank {
    /// Builds the bank at position `index` of a batch
    ///
    /// # Errors
    /// Errors when the bank name pool is empty
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        index: usize,
        pools: &SamplePools,
        now: DateTime<Utc>,
    ) -> Result<Self, FixtureError> {
        let name = sample(rng, &pools.bank_names, "bank_names")?.to_owned();
        let cuit = company_cuit(rng, index + 1);
        let address = format!("{} Bank Street", rng.gen_range(1..=999));
        Ok(Bank {
            name,
            cuit,
            address,
            telephone: telephone(rng),
            created_at: now,
        })
    }
}

impl Fixture for Bank {
    const TABLE: &'static str = "BANKS";
    const COLUMNS: &'static [&'static str] = &["name", "cuit", "address", "telephone", "created_at"];
    const COLLECTION: &'static str = "banks";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.name.clone()),
            SqlValue::Text(self.cuit.clone()),
            SqlValue::Text(self.address.clone()),
            SqlValue::Text(self.telephone.clone()),
            SqlValue::Timestamp(self.created_at),
        ]
    }
}

impl Customer {
    /// # Errors
    /// Errors when the customer name pool is empty
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        pools: &SamplePools,
        now: DateTime<Utc>,
    ) -> Result<Self, FixtureError> {
        let complete_name = sample(rng, &pools.customer_names, "customer_names")?.to_owned();
        let dni = rng.gen_range(4_000_000..=50_000_000).to_string();
        let cuit = format!("{}{dni}{}", rng.gen_range(20..=27), rng.gen_range(0..=9));
        let address = format!("{} Customer Avenue", rng.gen_range(1..=999));
        Ok(Customer {
            complete_name,
            dni,
            cuit,
            address,
            telephone: telephone(rng),
            entry_date: now,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Fixture for Customer {
    const TABLE: &'static str = "CUSTOMERS";
    const COLUMNS: &'static [&'static str] = &[
        "complete_name",
        "dni",
        "cuit",
        "address",
        "telephone",
        "entry_date",
        "created_at",
        "updated_at",
    ];
    const COLLECTION: &'static str = "customers";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.complete_name.clone()),
            SqlValue::Text(self.dni.clone()),
            SqlValue::Text(self.cuit.clone()),
            SqlValue::Text(self.address.clone()),
            SqlValue::Text(self.telephone.clone()),
            SqlValue::Timestamp(self.entry_date),
            SqlValue::Timestamp(self.created_at),
            SqlValue::Timestamp(self.updated_at),
        ]
    }
}

impl Discount {
    /// Builds the discount at position `index` of a batch, owned by a bank id in `1..=bank_count`
    ///
    /// # Errors
    /// Errors when `bank_count` is zero or a title/store pool is empty
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        index: usize,
        bank_count: usize,
        pools: &SamplePools,
        now: DateTime<Utc>,
    ) -> Result<Self, FixtureError> {
        if bank_count == 0 {
            return Err(FixtureError::NoBanks);
        }
        let promotion_title = sample(rng, &pools.promotion_titles, "promotion_titles")?.to_owned();
        let discount_percentage = amount(rng, 5, 50);
        let name_store = sample(rng, &pools.store_names, "store_names")?.to_owned();
        let cuit_store = company_cuit(rng, index + 5);
        let validity_end_date = now + Duration::days(rng.gen_range(1..=30));
        let price_cap = amount(rng, 100, 1000);
        let only_cash = rng.gen();
        let comments = format!("Discount for {name_store}");
        let is_deleted = rng.gen();
        let bank_id = rng.gen_range(1..=bank_count as u64);
        Ok(Discount {
            code: format!("DIS-{index:03}"),
            promotion_title,
            discount_percentage,
            name_store,
            cuit_store,
            validity_start_date: now,
            validity_end_date,
            price_cap,
            only_cash,
            comments,
            bank_id,
            created_at: now,
            updated_at: now,
            is_deleted,
        })
    }
}

impl Fixture for Discount {
    const TABLE: &'static str = "DISCOUNTS";
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "promotion_title",
        "discount_percentage",
        "name_store",
        "cuit_store",
        "validity_start_date",
        "validity_end_date",
        "price_cap",
        "only_cash",
        "comments",
        "bank_id",
        "created_at",
        "updated_at",
        "is_deleted",
    ];
    const COLLECTION: &'static str = "discounts";

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.code.clone()),
            SqlValue::Text(self.promotion_title.clone()),
            SqlValue::Decimal(self.discount_percentage),
            SqlValue::Text(self.name_store.clone()),
            SqlValue::Text(self.cuit_store.clone()),
            SqlValue::Timestamp(self.validity_start_date),
            SqlValue::Timestamp(self.validity_end_date),
            SqlValue::Decimal(self.price_cap),
            SqlValue::Bool(self.only_cash),
            SqlValue::Text(self.comments.clone()),
            SqlValue::Int(self.bank_id),
            SqlValue::Timestamp(self.created_at),
            SqlValue::Timestamp(self.updated_at),
            SqlValue::Bool(self.is_deleted),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mongodb::bson::Bson;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-11-20T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_bank_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let pools = SamplePools::default();
        for index in 0..20 {
            let bank = Bank::generate(&mut rng, index, &pools, now()).unwrap();
            assert!(pools.bank_names.contains(&bank.name));
            assert_eq!(bank.cuit.len(), 14);
            assert!(bank.cuit.starts_with(&format!("30{:011}", index + 1)));
            assert!(bank.address.ends_with(" Bank Street"));
            assert_eq!(bank.telephone.len(), 10);
            assert_eq!(bank.created_at, now());
        }
    }

    #[test]
    fn test_customer_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let pools = SamplePools::default();
        for _ in 0..50 {
            let customer = Customer::generate(&mut rng, &pools, now()).unwrap();
            assert!(pools.customer_names.contains(&customer.complete_name));
            let dni: u64 = customer.dni.parse().unwrap();
            assert!((4_000_000..=50_000_000).contains(&dni));
            let prefix: u64 = customer.cuit[..2].parse().unwrap();
            assert!((20..=27).contains(&prefix));
            assert_eq!(&customer.cuit[2..2 + customer.dni.len()], customer.dni);
            assert_eq!(customer.cuit.len(), customer.dni.len() + 3);
            assert!(customer.address.ends_with(" Customer Avenue"));
            assert_eq!(customer.created_at, customer.updated_at);
            assert_eq!(customer.entry_date, customer.created_at);
        }
    }

    #[test]
    fn test_discount_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let pools = SamplePools::default();
        let low_pct = Decimal::new(500, 2);
        let high_pct = Decimal::new(5000, 2);
        let low_cap = Decimal::new(10000, 2);
        let high_cap = Decimal::new(100_000, 2);
        for index in 0..200 {
            let discount = Discount::generate(&mut rng, index, 10, &pools, now()).unwrap();
            assert!(discount.discount_percentage >= low_pct);
            assert!(discount.discount_percentage <= high_pct);
            assert_eq!(discount.discount_percentage.scale(), NUM_DECIMAL_PLACES);
            assert!(discount.price_cap >= low_cap);
            assert!(discount.price_cap <= high_cap);
            assert_eq!(discount.price_cap.scale(), NUM_DECIMAL_PLACES);

            let window = discount.validity_end_date - discount.validity_start_date;
            assert!(window >= Duration::days(1));
            assert!(window <= Duration::days(30));
            assert_eq!(window.num_seconds() % 86_400, 0);

            assert!((1..=10).contains(&discount.bank_id));
            assert_eq!(discount.comments, format!("Discount for {}", discount.name_store));
            assert!(discount.cuit_store.starts_with(&format!("30{:011}", index + 5)));
        }
    }

    #[test]
    fn test_discount_codes() {
        let mut rng = StdRng::seed_from_u64(3);
        let pools = SamplePools::default();
        let codes: Vec<String> = (0..5)
            .map(|i| Discount::generate(&mut rng, i, 10, &pools, now()).unwrap().code)
            .collect();
        assert_eq!(codes, vec!["DIS-000", "DIS-001", "DIS-002", "DIS-003", "DIS-004"]);
    }

    #[test]
    fn test_discount_without_banks() {
        let mut rng = StdRng::seed_from_u64(3);
        let res = Discount::generate(&mut rng, 0, 0, &SamplePools::default(), now());
        assert!(matches!(res, Err(FixtureError::NoBanks)));
    }

    #[test]
    fn test_same_seed_same_records() {
        let pools = SamplePools::default();
        let mut rng_1 = StdRng::seed_from_u64(42);
        let mut rng_2 = StdRng::seed_from_u64(42);
        for index in 0..5 {
            assert_eq!(
                Discount::generate(&mut rng_1, index, 10, &pools, now()).unwrap(),
                Discount::generate(&mut rng_2, index, 10, &pools, now()).unwrap()
            );
        }
    }

    #[test]
    fn test_row_matches_columns() {
        let mut rng = StdRng::seed_from_u64(5);
        let pools = SamplePools::default();
        let bank = Bank::generate(&mut rng, 0, &pools, now()).unwrap();
        let customer = Customer::generate(&mut rng, &pools, now()).unwrap();
        let discount = Discount::generate(&mut rng, 0, 10, &pools, now()).unwrap();

        let row = bank.to_row();
        assert_eq!(row.table, "BANKS");
        assert_eq!(row.values.len(), row.columns.len());
        let row = customer.to_row();
        assert_eq!(row.values.len(), 8);
        assert_eq!(row.values.len(), row.columns.len());
        let row = discount.to_row();
        assert_eq!(row.values.len(), 14);
        assert_eq!(row.values.len(), row.columns.len());
        assert_eq!(row.values[10], SqlValue::Int(discount.bank_id));
        assert_eq!(row.values[13], SqlValue::Bool(discount.is_deleted));
    }

    #[test]
    fn test_discount_document() {
        let mut rng = StdRng::seed_from_u64(5);
        let discount =
            Discount::generate(&mut rng, 2, 10, &SamplePools::default(), now()).unwrap();
        let document = discount.to_document().unwrap();
        assert_eq!(document.get_str("code").unwrap(), "DIS-002");
        assert!(matches!(document.get("discount_percentage"), Some(Bson::Double(_))));
        assert!(matches!(document.get("price_cap"), Some(Bson::Double(_))));
        assert!(matches!(document.get("validity_end_date"), Some(Bson::DateTime(_))));
        assert!(matches!(document.get("only_cash"), Some(Bson::Boolean(_))));
        assert_eq!(document.len(), Discount::COLUMNS.len());
    }

    #[test]
    fn test_discount_amounts_are_doubles() {
        use rust_decimal::prelude::ToPrimitive;

        let mut rng = StdRng::seed_from_u64(5);
        let pools = SamplePools::default();
        for index in 0..20 {
            let discount = Discount::generate(&mut rng, index, 10, &pools, now()).unwrap();
            let document = discount.to_document().unwrap();
            let percentage = document.get_f64("discount_percentage").unwrap();
            let cap = document.get_f64("price_cap").unwrap();
            assert!((percentage - discount.discount_percentage.to_f64().unwrap()).abs() < 1e-9);
            assert!((cap - discount.price_cap.to_f64().unwrap()).abs() < 1e-9);
        }
    }
}
