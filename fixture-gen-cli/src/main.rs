use std::error::Error;

use clap::Parser;
use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use fixture_gen::config::Config;
use fixture_gen::generator::{CategoryReport, FixtureGenerator};
use fixture_gen::mongo::MongoStore;
use fixture_gen::mysql::MySqlStore;

/// Populates the MySQL and MongoDB test databases with banks, customers, discounts and the
/// links between them. Every run appends a fresh batch.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {}

fn log_report(report: &CategoryReport) {
    info!(
        "{}: {} rows in MySQL, {} documents in MongoDB",
        report.category, report.relational_rows, report.documents
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    Cli::parse();

    let config = Config::default();
    let relational = MySqlStore::connect(&config.mysql).await?;
    let documents = MongoStore::connect(&config.mongodb)?;

    let mut generator =
        FixtureGenerator::new(config, StdRng::from_entropy(), relational, documents)?;
    let report = generator.run().await?;
    generator.close().await?;

    for category in [
        &report.banks,
        &report.customers,
        &report.discounts,
        &report.relationships,
    ] {
        log_report(category);
    }
    info!("Data population complete.");

    Ok(())
}
