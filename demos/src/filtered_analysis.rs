//! Derives the available filters, narrows the data and re-runs the analysis.
//!
//! Run with:
//! ```bash
//! cargo run --example filtered_analysis
//! ```

use chrono::NaiveDate;
use term_explore::prelude::*;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vendas.csv");

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== Filtros ===\n");

    let dataset = CsvSource::new(SAMPLE)?.load().await?;
    let layer = FilterLayer::new();
    let candidates = layer.derive_candidates(&dataset).await?;

    if let Some(date) = &candidates.date {
        println!(
            "Período em `{}`: {} a {}",
            date.column, date.bounds.start, date.bounds.end
        );
    }
    for candidate in &candidates.categorical {
        println!("`{}`: {}", candidate.column, candidate.values.join(", "));
    }

    let first_half = FilterSelection::new()
        .with_date_range(
            "Data_Venda",
            NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid date")?,
            NaiveDate::from_ymd_opt(2024, 6, 30).ok_or("invalid date")?,
        )
        .with_values("Regiao", ["Sul", "Sudeste"]);

    let output = InsightEngine::new()
        .run_filtered(&dataset, &first_half)
        .await?;
    println!("\n--- Primeiro semestre, Sul e Sudeste ---\n");
    println!("{}", output.report);

    // An inverted range keeps no rows; only the overview sections remain.
    let nothing = FilterSelection::new().with_date_range(
        "Data_Venda",
        NaiveDate::from_ymd_opt(2024, 12, 31).ok_or("invalid date")?,
        NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid date")?,
    );
    let output = InsightEngine::new().run_filtered(&dataset, &nothing).await?;
    println!("\n--- Intervalo vazio ---\n");
    println!("{}", output.report);

    Ok(())
}
