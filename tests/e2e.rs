//! End-to-end integration tests for pdf2img.
//!
//! These tests render real PDFs through PDFium. The documents are generated
//! on the fly (solid-colour pages of known size), so the expected pixels and
//! dimensions are exact. They are gated behind `E2E_ENABLED` because the
//! first run may download the PDFium library.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use image::Rgba;
use pdf2img::{convert, convert_path, inspect, ConversionConfig, ErrorKind, SourceDocument};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
    }};
}

/// One page: fill colour (0–1 RGB) and MediaBox size in points.
struct Page {
    rgb: [f32; 3],
    size: (u32, u32),
}

/// Build a well-formed PDF whose pages are each filled with one colour.
fn build_pdf(pages: &[Page]) -> Vec<u8> {
    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 3 + 2 * i))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
    ];
    for (i, page) in pages.iter().enumerate() {
        let (w, h) = page.size;
        let [r, g, b] = page.rgb;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] /Contents {} 0 R /Resources << >> >>",
            4 + 2 * i
        ));
        let content = format!("{r} {g} {b} rg 0 0 {w} {h} re f");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

fn red_landscape() -> Page {
    Page {
        rgb: [1.0, 0.0, 0.0],
        size: (100, 50),
    }
}

fn blue_square() -> Page {
    Page {
        rgb: [0.0, 0.0, 1.0],
        size: (300, 300),
    }
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes)
        .expect("output should be a valid PNG")
        .to_rgba8()
}

// ── Success paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_page_renders_at_double_scale() {
    e2e_skip_unless_ready!();

    let document = SourceDocument::new("report.pdf", build_pdf(&[red_landscape()]));
    let result = convert(&document, &ConversionConfig::default()).await;

    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert!(result.image_url.starts_with("data:image/png;base64,"));
    let file = result.file.expect("file should be present");
    assert_eq!(file.name, "report.png");

    let img = decode(&file.bytes);
    assert_eq!(img.dimensions(), (200, 100));
    assert_eq!(img.get_pixel(100, 50), &Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn test_only_first_page_is_rendered() {
    e2e_skip_unless_ready!();

    let document = SourceDocument::new(
        "deck.pdf",
        build_pdf(&[red_landscape(), blue_square(), blue_square()]),
    );
    let file = convert(&document, &ConversionConfig::default())
        .await
        .into_result()
        .expect("conversion should succeed");

    let img = decode(&file.bytes);
    // Page 2/3 are 300 pt squares in blue; page 1 is a red 100×50 strip.
    assert_eq!(img.dimensions(), (200, 100));
    let blue = img.pixels().filter(|p| p[2] > 200 && p[0] < 50).count();
    assert_eq!(blue, 0, "blue from a later page leaked in");
}

#[tokio::test]
async fn test_scale_controls_output_size() {
    e2e_skip_unless_ready!();

    let config = ConversionConfig::builder().scale(1.0).build().unwrap();
    let document = SourceDocument::new("small.pdf", build_pdf(&[red_landscape()]));
    let file = convert(&document, &config).await.into_result().unwrap();
    assert_eq!(decode(&file.bytes).dimensions(), (100, 50));
}

#[tokio::test]
async fn test_repeated_conversion_is_stable() {
    e2e_skip_unless_ready!();

    let document = SourceDocument::new("REPORT.PDF", build_pdf(&[red_landscape()]));
    let config = ConversionConfig::default();

    let first = convert(&document, &config).await.into_result().unwrap();
    let second = convert(&document, &config).await.into_result().unwrap();

    assert_eq!(first.name, "REPORT.png");
    assert_eq!(first.name, second.name);
    assert_eq!(decode(&first.bytes), decode(&second.bytes));
}

#[tokio::test]
async fn test_convert_path_reads_from_disk() {
    e2e_skip_unless_ready!();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Invoice.Pdf");
    std::fs::write(&path, build_pdf(&[red_landscape()])).unwrap();

    let result = convert_path(&path, &ConversionConfig::default()).await;
    let file = result.file.expect("file should be present");
    assert_eq!(file.name, "Invoice.png");

    let written = file.write_into_dir(dir.path()).unwrap();
    assert_eq!(decode(&std::fs::read(written).unwrap()).dimensions(), (200, 100));
}

#[tokio::test]
async fn test_inspect_reports_pages_and_size() {
    e2e_skip_unless_ready!();

    let document = SourceDocument::new("deck.pdf", build_pdf(&[red_landscape(), blue_square()]));
    let meta = inspect(&document, &ConversionConfig::default())
        .await
        .expect("inspect() should succeed");

    assert_eq!(meta.page_count, 2);
    assert_eq!(meta.first_page_size, Some((100.0, 50.0)));
    assert!(!meta.pdf_version.is_empty());
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_truncated_pdf_fails_cleanly() {
    e2e_skip_unless_ready!();

    let mut bytes = build_pdf(&[red_landscape()]);
    bytes.truncate(24);
    let result = convert(&SourceDocument::new("cut.pdf", bytes), &ConversionConfig::default()).await;

    assert!(result.file.is_none());
    assert_eq!(result.image_url, "");
    assert_eq!(result.error_kind, Some(ErrorKind::Upstream));
    assert!(!result.error.unwrap().is_empty());
}

#[tokio::test]
async fn test_garbage_after_header_fails_cleanly() {
    e2e_skip_unless_ready!();

    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.extend(std::iter::repeat(0xAB).take(4096));
    let result = convert(&SourceDocument::new("noise.pdf", bytes), &ConversionConfig::default()).await;

    assert!(result.file.is_none());
    assert!(result.error.unwrap().starts_with("Failed to convert PDF:"));
}

#[tokio::test]
async fn test_non_pdf_input_fails_cleanly() {
    e2e_skip_unless_ready!();

    let doc = SourceDocument::new("notes.pdf", b"just some text".to_vec());
    let result = convert(&doc, &ConversionConfig::default()).await;
    assert!(result.file.is_none());
    assert!(result.error.unwrap().contains("not a PDF"));
}

#[tokio::test]
async fn test_missing_engine_is_environment_failure() {
    // Runs without E2E_ENABLED: no library is touched.
    let config = ConversionConfig::builder()
        .engine_library("/no/such/dir/libpdfium.so")
        .download_engine(false)
        .build()
        .unwrap();
    let document = SourceDocument::new("report.pdf", build_pdf(&[red_landscape()]));
    let result = convert(&document, &config).await;

    assert!(result.file.is_none());
    assert_eq!(result.image_url, "");
    assert_eq!(result.error_kind, Some(ErrorKind::Environment));
    assert!(!result.error.unwrap().is_empty());
}

#[test]
fn test_generated_pdf_has_consistent_xref() {
    let bytes = build_pdf(&[red_landscape(), blue_square()]);
    let text = String::from_utf8(bytes).unwrap();
    let startxref: usize = text
        .rsplit("startxref\n")
        .next()
        .and_then(|tail| tail.lines().next())
        .and_then(|n| n.parse().ok())
        .unwrap();
    assert!(text[startxref..].starts_with("xref\n0 7\n"));
    for obj in 1..=6 {
        assert!(text.contains(&format!("{obj} 0 obj\n")));
    }
}
