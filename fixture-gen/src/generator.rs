use std::fmt;

use chrono::Utc;
use log::{debug, info};
use rand::Rng;

use crate::config::Config;
use crate::error::FixtureError;
use crate::record::{Bank, Customer, Discount, Fixture};
use crate::relationship::{plan_document_links, plan_relational_links, LINK_COLLECTION};
use crate::store::{DocumentStore, RelationalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Banks,
    Customers,
    Discounts,
    Relationships,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Banks => "banks",
            Category::Customers => "customers",
            Category::Discounts => "discounts",
            Category::Relationships => "relationships",
        };
        f.write_str(name)
    }
}

/// What one category wrote. The two stores are counted separately since nothing ties them together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub relational_rows: usize,
    pub documents: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationReport {
    pub banks: CategoryReport,
    pub customers: CategoryReport,
    pub discounts: CategoryReport,
    pub relationships: CategoryReport,
}

impl CategoryReport {
    fn new(category: Category) -> Self {
        CategoryReport {
            category,
            relational_rows: 0,
            documents: 0,
        }
    }
}

/// Writes synthetic banks, customers, discounts and their links into a relational store and a
/// document store. Every record is inserted into the relational store first, then into the
/// document store; the relational side is committed once per category.
pub struct FixtureGenerator<R, S, D> {
    config: Config,
    rng: R,
    relational: S,
    documents: D,
}

impl<R, S, D> FixtureGenerator<R, S, D>
where
    R: Rng,
    S: RelationalStore,
    D: DocumentStore,
{
    /// # Errors
    /// Errors when the configuration has an empty sample pool
    pub fn new(config: Config, rng: R, relational: S, documents: D) -> Result<Self, FixtureError> {
        config.validate()?;
        Ok(FixtureGenerator {
            config,
            rng,
            relational,
            documents,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn relational(&self) -> &S {
        &self.relational
    }

    #[must_use]
    pub fn documents(&self) -> &D {
        &self.documents
    }

    async fn write<F: Fixture + Sync>(
        &mut self,
        record: &F,
        report: &mut CategoryReport,
    ) -> Result<(), FixtureError> {
        self.relational.insert(&record.to_row()).await?;
        report.relational_rows += 1;
        let id = self
            .documents
            .insert(F::COLLECTION, record.to_document()?)
            .await?;
        report.documents += 1;
        debug!("Wrote {} record {}", F::COLLECTION, id);
        Ok(())
    }

    /// # Errors
    /// Errors on the first failed insert or on commit; rows queued for this call stay uncommitted
    pub async fn populate_banks(&mut self, count: usize) -> Result<CategoryReport, FixtureError> {
        info!("Populating Banks...");
        let mut report = CategoryReport::new(Category::Banks);
        for index in 0..count {
            let bank = Bank::generate(&mut self.rng, index, &self.config.pools, Utc::now())?;
            self.write(&bank, &mut report).await?;
        }
        self.relational.commit().await?;
        info!("Inserted {count} banks.");
        Ok(report)
    }

    /// # Errors
    /// Errors on the first failed insert or on commit; rows queued for this call stay uncommitted
    pub async fn populate_customers(
        &mut self,
        count: usize,
    ) -> Result<CategoryReport, FixtureError> {
        info!("Populating Customers...");
        let mut report = CategoryReport::new(Category::Customers);
        for _ in 0..count {
            let customer = Customer::generate(&mut self.rng, &self.config.pools, Utc::now())?;
            self.write(&customer, &mut report).await?;
        }
        self.relational.commit().await?;
        info!("Inserted {count} customers.");
        Ok(report)
    }

    /// Each discount references a bank id drawn from `1..=config.counts.banks`.
    ///
    /// # Errors
    /// Errors when no banks are configured, on the first failed insert, or on commit
    pub async fn populate_discounts(
        &mut self,
        count: usize,
    ) -> Result<CategoryReport, FixtureError> {
        info!("Populating Discounts...");
        let mut report = CategoryReport::new(Category::Discounts);
        let bank_count = self.config.counts.banks;
        for index in 0..count {
            let discount = Discount::generate(
                &mut self.rng,
                index,
                bank_count,
                &self.config.pools,
                Utc::now(),
            )?;
            self.write(&discount, &mut report).await?;
        }
        self.relational.commit().await?;
        info!("Inserted {count} discounts.");
        Ok(report)
    }

    /// Links customers and banks in both stores, independently of each other:
    /// the relational store gets up to `count` customers (by primary key) with 1–3 banks each,
    /// the document store gets exactly `count` pairs drawn with replacement from the ids it holds.
    ///
    /// # Errors
    /// Errors when either side has nothing to link, on the first failed insert, or on commit
    pub async fn populate_relationships(
        &mut self,
        count: usize,
    ) -> Result<CategoryReport, FixtureError> {
        info!("Populating Banks, Customers, and Relationships...");
        let mut report = CategoryReport::new(Category::Relationships);
        let counts = self.config.counts;

        let relational_links =
            plan_relational_links(&mut self.rng, counts.customers, counts.banks, count)?;
        for link in &relational_links {
            self.relational.insert(&link.to_row()).await?;
            report.relational_rows += 1;
        }

        let customer_ids = self.documents.ids(Customer::COLLECTION).await?;
        let bank_ids = self.documents.ids(Bank::COLLECTION).await?;
        let document_links = plan_document_links(&mut self.rng, &customer_ids, &bank_ids, count)?;
        for link in &document_links {
            self.documents
                .insert(LINK_COLLECTION, link.to_document()?)
                .await?;
            report.documents += 1;
        }

        self.relational.commit().await?;
        info!(
            "Inserted relationships for {} customers and {} banks.",
            counts.customers, counts.banks
        );
        Ok(report)
    }

    /// Runs every category in order with the configured counts
    ///
    /// # Errors
    /// Stops at, and returns, the first category error
    pub async fn run(&mut self) -> Result<PopulationReport, FixtureError> {
        let counts = self.config.counts;
        let banks = self.populate_banks(counts.banks).await?;
        let customers = self.populate_customers(counts.customers).await?;
        let discounts = self.populate_discounts(counts.discounts).await?;
        let relationships = self.populate_relationships(counts.relationships).await?;
        Ok(PopulationReport {
            banks,
            customers,
            discounts,
            relationships,
        })
    }

    /// Closes the relational connection and hands back the document store
    ///
    /// # Errors
    /// Errors when the relational store fails to close
    pub async fn close(self) -> Result<D, FixtureError> {
        self.relational.close().await?;
        Ok(self.documents)
    }
}
