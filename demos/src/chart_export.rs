//! Plans charts, formats the report three ways and writes the export document.
//!
//! Chart images are normally produced by a plotting backend; this example
//! draws plain bar bitmaps for rankings and counts and an empty frame for
//! everything else.
//!
//! Run with:
//! ```bash
//! cargo run --example chart_export
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use term_explore::charts::ChartData;
use term_explore::formatters::{JsonFormatter, MarkdownFormatter, PlainTextFormatter};
use term_explore::prelude::*;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vendas.csv");
const WIDTH: u32 = 480;
const HEIGHT: u32 = 240;

/// Bars for ranked totals, or a bare frame when the chart has none.
fn render(chart: &ChartSpec) -> std::result::Result<Vec<u8>, image::ImageError> {
    let totals: Vec<f64> = match &chart.data {
        ChartData::Ranking { entries } | ChartData::CategoryCounts { counts: Some(entries), .. } => {
            entries.iter().map(|e| e.total).collect()
        }
        _ => Vec::new(),
    };

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([255, 255, 255]));
    for x in 0..WIDTH {
        img.put_pixel(x, HEIGHT - 1, Rgb([0, 0, 0]));
    }
    for y in 0..HEIGHT {
        img.put_pixel(0, y, Rgb([0, 0, 0]));
    }

    let max = totals.iter().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        let slot = (WIDTH - 2) / totals.len() as u32;
        for (idx, total) in totals.iter().enumerate() {
            let bar = ((total / max) * f64::from(HEIGHT - 10)) as u32;
            let left = 1 + idx as u32 * slot + slot / 4;
            for x in left..left + slot / 2 {
                for y in HEIGHT - 1 - bar..HEIGHT - 1 {
                    img.put_pixel(x, y, Rgb([31, 119, 180]));
                }
            }
        }
    }

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut cache = DatasetCache::new();
    let source = CsvSource::new(SAMPLE)?;
    let dataset = cache.get_or_load(&source).await?;

    let output = InsightEngine::new().run(&dataset).await?;

    println!("=== Markdown ===\n{}\n", MarkdownFormatter::new().format(&output)?);
    println!("=== Texto ===\n{}\n", PlainTextFormatter::new().format(&output)?);
    println!(
        "=== JSON ===\n{}\n",
        JsonFormatter::with_config(FormatterConfig::minimal()).format(&output)?
    );

    let plan = ChartPlan::from_output(&output).resolve(&dataset).await?;
    println!("=== Gráficos ({}) ===", plan.len());
    for chart in plan.charts() {
        println!("  {:?} [{}] {}", chart.kind, chart.group.title(), chart.title);
    }
    println!("\n{}", serde_json::to_string_pretty(&plan)?);

    let images = plan
        .charts()
        .iter()
        .map(|chart| Ok((chart.title.clone(), render(chart)?)))
        .collect::<std::result::Result<Vec<_>, image::ImageError>>()?;
    let bytes = ExportDocument::from_output(&output)
        .with_charts(images)
        .to_bytes()?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("relatorio_analise.pdf");
    std::fs::write(&path, &bytes)?;
    println!("\nDocumento exportado: {} ({} bytes)", path.display(), bytes.len());

    // Loading the same content again is served from the cache.
    cache.get_or_load(&source).await?;
    println!("Cache: {:?}", cache.stats());

    Ok(())
}
