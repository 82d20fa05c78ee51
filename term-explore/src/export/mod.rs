//! Downloadable report document.
//!
//! [`ExportDocument`] lays out the narrative and the rendered charts as an A4
//! PDF: a title page with the generation time, the report text wrapped to a
//! fixed width, then one page per chart image scaled to a fixed width under
//! the chart's title. Text is reduced to ASCII so the built-in Courier font
//! can draw it.

mod pdf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{ExploreError, Result};
use crate::formatters::{strip_markdown, TIMESTAMP_FORMAT};
use crate::report::AnalysisOutput;
use pdf::{PageContent, PdfPage, RgbImage, PAGE_HEIGHT, PAGE_WIDTH};

pub const DEFAULT_LINE_WIDTH: usize = 90;
pub const DEFAULT_LINES_PER_PAGE: usize = 56;
/// Width every chart image is scaled to, in points.
pub const CHART_WIDTH: f64 = 480.0;
const MIN_LINE_WIDTH: usize = 20;
const MIN_LINES_PER_PAGE: usize = 8;

const PAGE_HEADER: &str = "Relatório de Análise de Dados com IA";
const DOCUMENT_TITLE: &str = "Análise e Insights da IA";
const CHARTS_TITLE: &str = "Visualizações dos Dados";

const FONT_SIZE: f64 = 9.0;
const HEADER_SIZE: f64 = 11.0;
const LEADING: f64 = 12.0;
/// Courier advances 0.6 em per character.
const CHAR_ADVANCE: f64 = 0.6;
const TEXT_TOP: f64 = PAGE_HEIGHT - 70.0;
const HEADER_Y: f64 = PAGE_HEIGHT - 40.0;
const FOOTER_Y: f64 = 30.0;
const CHART_BOTTOM: f64 = 60.0;

/// A rendered chart to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub title: String,
    /// PNG, JPEG or GIF bytes
    pub bytes: Vec<u8>,
}

impl ChartImage {
    pub fn new(title: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            title: title.into(),
            bytes: bytes.into(),
        }
    }
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<String>,
    /// Index of the chart drawn below the lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<usize>,
}

/// Report plus charts, ready to paginate.
///
/// # Example
///
/// ```rust
/// use term_explore::export::ExportDocument;
///
/// let document = ExportDocument::new("### 1. Visão Geral do Dataset\n- **Número de Linhas:** 5");
/// let pages = document.pages().unwrap();
/// assert!(pages[0].lines.contains(&"1. Visao Geral do Dataset".to_string()));
///
/// let pdf = document.to_bytes().unwrap();
/// assert!(pdf.starts_with(b"%PDF-1.4"));
/// ```
#[derive(Debug, Clone)]
pub struct ExportDocument {
    report_text: String,
    charts: Vec<ChartImage>,
    generated_at: DateTime<Local>,
    line_width: usize,
    lines_per_page: usize,
}

impl ExportDocument {
    pub fn new(report_text: impl Into<String>) -> Self {
        Self {
            report_text: report_text.into(),
            charts: Vec::new(),
            generated_at: Local::now(),
            line_width: DEFAULT_LINE_WIDTH,
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }

    pub fn from_output(output: &AnalysisOutput) -> Self {
        Self::new(output.report.text())
    }

    pub fn with_chart(mut self, title: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.charts.push(ChartImage::new(title, bytes));
        self
    }

    /// Adds charts from a `(title, image bytes)` mapping, keeping its order.
    pub fn with_charts<I, S>(mut self, charts: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        self.charts
            .extend(charts.into_iter().map(|(title, bytes)| ChartImage::new(title, bytes)));
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_lines_per_page(mut self, lines: usize) -> Self {
        self.lines_per_page = lines;
        self
    }

    pub fn charts(&self) -> &[ChartImage] {
        &self.charts
    }

    /// Lays the document out into pages: text pages first, then one page per chart.
    pub fn pages(&self) -> Result<Vec<Page>> {
        self.validate()?;

        let mut layout = Layout::new(self.line_width, self.lines_per_page);
        layout.push(&to_ascii(DOCUMENT_TITLE));
        layout.push(&to_ascii(&format!(
            "Relatório gerado em: {}",
            self.generated_at.format(TIMESTAMP_FORMAT)
        )));
        layout.blank();

        for line in strip_markdown(&self.report_text).lines() {
            layout.push(&to_ascii(line));
        }

        let mut pages = layout.finish();
        for (idx, chart) in self.charts.iter().enumerate() {
            let mut lines = Vec::new();
            if idx == 0 {
                lines.push(to_ascii(CHARTS_TITLE));
                lines.push(String::new());
            }
            lines.extend(wrap(&to_ascii(&chart.title), self.line_width));
            pages.push(Page {
                number: pages.len() + 1,
                lines,
                chart: Some(idx),
            });
        }
        Ok(pages)
    }

    /// Renders the document as PDF bytes.
    ///
    /// Fails with [`ExploreError::Export`] when a chart image cannot be decoded.
    #[instrument(skip(self), fields(charts = self.charts.len()))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let pages = self.pages()?;
        let mut images = self
            .charts
            .iter()
            .map(|chart| {
                RgbImage::decode(&chart.bytes).map(Some).map_err(|e| {
                    ExploreError::export(format!("chart '{}': {e}", chart.title))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let header = to_ascii(PAGE_HEADER);
        let total = pages.len();
        let mut rendered = Vec::with_capacity(total);
        for page in pages {
            let mut content = PageContent::new();
            content.text(centered_x(&header, HEADER_SIZE), HEADER_Y, HEADER_SIZE, &header);

            let mut y = TEXT_TOP;
            for line in &page.lines {
                if !line.is_empty() {
                    content.text(self.left_margin(), y, FONT_SIZE, line);
                }
                y -= LEADING;
            }

            let image = page.chart.and_then(|idx| images[idx].take());
            if let Some(image) = &image {
                let (width, height) = fit_chart(image.width, image.height, y - CHART_BOTTOM);
                content.image(
                    page.number - 1,
                    (PAGE_WIDTH - width) / 2.0,
                    y - height,
                    width,
                    height,
                );
            }

            let footer = format!("Pagina {}", page.number);
            content.text(centered_x(&footer, FONT_SIZE), FOOTER_Y, FONT_SIZE, &footer);
            rendered.push(PdfPage { content, image });
        }

        let bytes = pdf::write_document(&to_ascii(DOCUMENT_TITLE), rendered)?;
        debug!(pages = total, size = bytes.len(), "Rendered export document");
        Ok(bytes)
    }

    /// Left edge that centres a full-width text line on the page.
    fn left_margin(&self) -> f64 {
        ((PAGE_WIDTH - self.line_width as f64 * CHAR_ADVANCE * FONT_SIZE) / 2.0).max(20.0)
    }

    fn validate(&self) -> Result<()> {
        if self.line_width < MIN_LINE_WIDTH {
            return Err(ExploreError::export(format!(
                "line width must be at least {MIN_LINE_WIDTH}, got {}",
                self.line_width
            )));
        }
        if self.lines_per_page < MIN_LINES_PER_PAGE {
            return Err(ExploreError::export(format!(
                "pages must hold at least {MIN_LINES_PER_PAGE} lines, got {}",
                self.lines_per_page
            )));
        }
        if (self.lines_per_page as f64) * LEADING > TEXT_TOP - FOOTER_Y - LEADING {
            return Err(ExploreError::export(format!(
                "{} lines do not fit on a page",
                self.lines_per_page
            )));
        }
        if let Some(chart) = self.charts.iter().find(|c| c.bytes.is_empty()) {
            return Err(ExploreError::export(format!(
                "chart image '{}' is empty",
                chart.title
            )));
        }
        Ok(())
    }
}

/// Scales an image to [`CHART_WIDTH`], shrinking it further when it would be
/// taller than `max_height`. Aspect ratio is kept.
fn fit_chart(width: u32, height: u32, max_height: f64) -> (f64, f64) {
    let ratio = f64::from(height) / f64::from(width);
    let mut out_width = CHART_WIDTH;
    let mut out_height = CHART_WIDTH * ratio;
    if out_height > max_height {
        out_height = max_height;
        out_width = max_height / ratio;
    }
    (out_width, out_height)
}

fn centered_x(text: &str, size: f64) -> f64 {
    ((PAGE_WIDTH - text.len() as f64 * CHAR_ADVANCE * size) / 2.0).max(0.0)
}

/// Reduces text to ASCII: accents are dropped, anything else becomes `?`.
pub fn to_ascii(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii() {
                return c.to_string();
            }
            let base: String = c
                .to_string()
                .nfd()
                .filter(|d| !is_combining_mark(*d))
                .collect();
            if !base.is_empty() && base.is_ascii() {
                base
            } else {
                "?".to_string()
            }
        })
        .collect()
}

/// Greedy word wrap. Continuation lines keep the original indentation.
fn wrap(line: &str, width: usize) -> Vec<String> {
    if line.len() <= width {
        return vec![line.to_string()];
    }

    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len.min(width / 2)];
    let mut lines = Vec::new();
    let mut current = indent.to_string();

    for word in line.split_whitespace() {
        let mut word = word;
        loop {
            let sep = usize::from(current.len() > indent.len());
            if current.len() + sep + word.len() <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }
            if current.len() > indent.len() {
                lines.push(std::mem::replace(&mut current, indent.to_string()));
                continue;
            }
            // Word longer than a whole line.
            let room = width - indent.len();
            let (head, tail) = word.split_at(room.min(word.len()));
            current.push_str(head);
            lines.push(std::mem::replace(&mut current, indent.to_string()));
            word = tail;
            if word.is_empty() {
                break;
            }
        }
    }
    if current.len() > indent.len() {
        lines.push(current);
    }
    lines
}

struct Layout {
    width: usize,
    lines_per_page: usize,
    pages: Vec<Page>,
    current: Vec<String>,
}

impl Layout {
    fn new(width: usize, lines_per_page: usize) -> Self {
        Self {
            width,
            lines_per_page,
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Pushes one ASCII line, wrapping it as needed.
    fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            self.blank();
            return;
        }
        for wrapped in wrap(line, self.width) {
            self.push_raw(wrapped);
        }
    }

    fn blank(&mut self) {
        if !self.current.is_empty() {
            self.push_raw(String::new());
        }
    }

    fn push_raw(&mut self, line: String) {
        if self.current.len() == self.lines_per_page {
            self.break_page();
        }
        self.current.push(line);
    }

    fn break_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            lines: std::mem::take(&mut self.current),
            chart: None,
        });
    }

    fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.pages
    }
}
