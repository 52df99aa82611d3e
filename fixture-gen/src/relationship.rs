//! Bank–customer associations. The relational and document stores each get their own,
//! independently drawn, set of links.

use mongodb::bson::{self, Bson, Document};
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::Serialize;

use crate::error::FixtureError;
use crate::store::{RelationalRow, SqlValue};

pub const LINK_TABLE: &str = "customers_banks";
pub const LINK_COLUMNS: &[&str] = &["customer_entity_sql_id", "bank_entity_sql_id"];
pub const LINK_COLLECTION: &str = "customers_banks";

/// Most banks a single customer is linked to in the relational store
pub const MAX_BANKS_PER_CUSTOMER: usize = 3;

/// A `customers_banks` row, referencing both sides by primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationalLink {
    pub customer_id: u64,
    pub bank_id: u64,
}

/// A `customers_banks` document, referencing both sides by document `_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLink {
    pub customer_id: Bson,
    pub bank_id: Bson,
}

impl RelationalLink {
    #[must_use]
    pub fn to_row(&self) -> RelationalRow {
        RelationalRow {
            table: LINK_TABLE,
            columns: LINK_COLUMNS,
            values: vec![SqlValue::Int(self.customer_id), SqlValue::Int(self.bank_id)],
        }
    }
}

impl DocumentLink {
    /// # Errors
    /// Errors when either id cannot be represented as BSON
    pub fn to_document(&self) -> Result<Document, FixtureError> {
        Ok(bson::to_document(self)?)
    }
}

/// Picks `count` distinct customers out of `1..=customer_count` in random order and links each
/// to between 1 and [`MAX_BANKS_PER_CUSTOMER`] distinct banks out of `1..=bank_count`.
///
/// `count` is capped at `customer_count`, and the per-customer bank count at `bank_count`.
///
/// # Errors
/// Errors when there are customers to link but no banks to link them to
pub fn plan_relational_links<R: Rng + ?Sized>(
    rng: &mut R,
    customer_count: usize,
    bank_count: usize,
    count: usize,
) -> Result<Vec<RelationalLink>, FixtureError> {
    let count = count.min(customer_count);
    if count == 0 {
        return Ok(Vec::new());
    }
    if bank_count == 0 {
        return Err(FixtureError::NoBanks);
    }

    let mut links = Vec::with_capacity(count * 2);
    for customer in index::sample(rng, customer_count, count) {
        let banks_for_customer = rng
            .gen_range(1..=MAX_BANKS_PER_CUSTOMER)
            .min(bank_count);
        for bank in index::sample(rng, bank_count, banks_for_customer) {
            links.push(RelationalLink {
                customer_id: customer as u64 + 1,
                bank_id: bank as u64 + 1,
            });
        }
    }
    Ok(links)
}

/// Draws `count` (customer, bank) pairs with replacement out of the given document ids.
/// Repeated pairs are kept.
///
/// # Errors
/// Errors when `count` is non-zero and either id list is empty
pub fn plan_document_links<R: Rng + ?Sized>(
    rng: &mut R,
    customer_ids: &[Bson],
    bank_ids: &[Bson],
    count: usize,
) -> Result<Vec<DocumentLink>, FixtureError> {
    (0..count)
        .map(|_| {
            let customer_id = customer_ids
                .choose(rng)
                .ok_or(FixtureError::EmptyCollection("customers"))?;
            let bank_id = bank_ids
                .choose(rng)
                .ok_or(FixtureError::EmptyCollection("banks"))?;
            Ok::<_, FixtureError>(DocumentLink {
                customer_id: customer_id.clone(),
                bank_id: bank_id.clone(),
            })
        })
        .collect()
}
