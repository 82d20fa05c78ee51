//! Analyzes a sales CSV and prints the narrative report.
//!
//! Run with:
//! ```bash
//! cargo run --example sales_report
//! cargo run --example sales_report -- path/to/file.csv
//! ```

use term_explore::logging::setup::{init_logging, LoggingConfig};
use term_explore::prelude::*;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vendas.csv");

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default().with_level(tracing::Level::WARN))?;

    let path = std::env::args().nth(1).unwrap_or_else(|| SAMPLE.to_string());
    println!("=== Análise Automática: {path} ===\n");

    let dataset = match CsvSource::new(&path)?.load().await {
        Ok(dataset) => dataset,
        Err(err) => {
            let (message, hint) = err.user_message();
            eprintln!("{message}\n{hint}");
            return Ok(());
        }
    };
    println!(
        "Arquivo carregado: {} linhas, {} colunas\n",
        dataset.num_rows(),
        dataset.num_columns()
    );

    let engine = InsightEngine::builder()
        .on_progress(|progress| {
            println!(
                "  [{:>3.0}%] {}",
                progress.fraction() * 100.0,
                progress.message
            );
        })
        .build();

    let output = match engine.run(&dataset).await {
        Ok(output) => output,
        Err(err) => {
            let (message, hint) = err.user_message();
            eprintln!("{message}\n{hint}");
            return Ok(());
        }
    };

    println!("\n{}\n", output.report);

    if let Some(top) = output.bundle.ranking("top_sellers") {
        println!("Melhor vendedor: {} ({:.2})", top[0].label, top[0].total);
    }

    Ok(())
}
