//! Minimal PDF 1.4 object writer.
//!
//! Only what the export document draws: Courier text, flate-compressed RGB
//! images and A4 pages. Text must already be ASCII.

use std::fmt::Write as _;
use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{ExploreError, Result};

/// A4 in points.
pub const PAGE_WIDTH: f64 = 595.0;
pub const PAGE_HEIGHT: f64 = 842.0;

const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Decoded RGB pixels ready to embed.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbImage {
    /// Decodes PNG, JPEG or GIF bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ExploreError::export(format!("unreadable chart image: {e}")))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ExploreError::export("chart image has no pixels"));
        }
        Ok(Self {
            width,
            height,
            pixels: decoded.into_raw(),
        })
    }
}

/// Drawing operations for one page's content stream.
#[derive(Debug, Default)]
pub struct PageContent {
    ops: String,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws one line of text with its baseline at `(x, y)`.
    pub fn text(&mut self, x: f64, y: f64, size: f64, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /F1 {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET",
            escape(text)
        );
    }

    /// Draws image `/Im{index}` scaled to `width` x `height` with its lower
    /// left corner at `(x, y)`.
    pub fn image(&mut self, index: usize, x: f64, y: f64, width: f64, height: f64) {
        let _ = writeln!(
            self.ops,
            "q {width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm /Im{index} Do Q"
        );
    }

    fn into_bytes(self) -> Vec<u8> {
        self.ops.into_bytes()
    }
}

/// A page and the image it shows, if any.
#[derive(Debug)]
pub struct PdfPage {
    pub content: PageContent,
    pub image: Option<RgbImage>,
}

/// Serializes pages into a complete PDF file.
pub fn write_document(title: &str, pages: Vec<PdfPage>) -> Result<Vec<u8>> {
    let mut writer = ObjectWriter::new();
    let catalog = writer.reserve();
    let page_tree = writer.reserve();
    let font = writer.reserve();
    let info = writer.reserve();

    writer.object(
        font,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        info,
        format!("<< /Title ({}) /Producer (term-explore) >>", escape(title)).as_bytes(),
    );

    let mut kids = Vec::with_capacity(pages.len());
    for (index, page) in pages.into_iter().enumerate() {
        let page_id = writer.reserve();
        let content_id = writer.reserve();

        let xobjects = match page.image {
            Some(image) => {
                let image_id = writer.reserve();
                let compressed = deflate(&image.pixels)?;
                writer.stream(
                    image_id,
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode",
                        image.width, image.height
                    ),
                    &compressed,
                );
                format!(" /XObject << /Im{index} {image_id} 0 R >>")
            }
            None => String::new(),
        };

        writer.stream(content_id, "", &page.content.into_bytes());
        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {page_tree} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 {font} 0 R >>{xobjects} >> /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );
        kids.push(format!("{page_id} 0 R"));
    }

    writer.object(
        page_tree,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            kids.len()
        )
        .as_bytes(),
    );
    writer.object(
        catalog,
        format!("<< /Type /Catalog /Pages {page_tree} 0 R >>").as_bytes(),
    );

    writer.finish(catalog, info)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Escapes the characters PDF literal strings reserve.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<Option<usize>>,
}

impl ObjectWriter {
    fn new() -> Self {
        Self {
            buf: HEADER.to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Allocates an object number to be written later.
    fn reserve(&mut self) -> usize {
        self.offsets.push(None);
        self.offsets.len()
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets[id - 1] = Some(self.buf.len());
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        let mut body = format!("<< {dict} /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(id, &body);
    }

    fn finish(mut self, root: usize, info: usize) -> Result<Vec<u8>> {
        let xref = self.buf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for (idx, offset) in self.offsets.iter().enumerate() {
            let offset = offset.ok_or_else(|| {
                ExploreError::export(format!("PDF object {} was never written", idx + 1))
            })?;
            let _ = write!(table, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            self.offsets.len() + 1
        );
        self.buf.extend_from_slice(table.as_bytes());
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r"a (b) \c"), r"a \(b\) \\c");
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut content = PageContent::new();
        content.text(50.0, 800.0, 10.0, "ola");
        let bytes = write_document(
            "t",
            vec![PdfPage {
                content,
                image: None,
            }],
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        // Everything after the binary marker line is ASCII.
        let text = std::str::from_utf8(&bytes[HEADER.len()..]).unwrap();
        let xref_at: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        let xref = &text[xref_at - HEADER.len()..];
        assert!(xref.starts_with("xref\n0 7\n"));

        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take(6)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (idx, offset) in entries.iter().enumerate() {
            assert!(text[offset - HEADER.len()..].starts_with(&format!("{} 0 obj\n", idx + 1)));
        }
        assert!(text.contains("(ola) Tj"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = RgbImage::decode(&[0x89, b'P', b'N', b'G']).unwrap_err();
        assert!(matches!(err, ExploreError::Export(_)));
    }
}
