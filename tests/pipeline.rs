// tests/pipeline.rs
mod common;

use common::*;
use docmark::docx;
use docmark::pdf_extraction;
use docmark::types::OCTET_STREAM_MIME;
use docmark::{LocateOptions, Pipeline, Settings, StructuralUnit, Summary};
use rstest::rstest;

fn pipeline() -> Pipeline {
    Pipeline::new(Settings::default())
}

fn marks_per_page(bytes: &[u8], pages: u32) -> Vec<usize> {
    let highlights = pdf_extraction::read_highlights(bytes).unwrap();
    (1..=pages)
        .map(|page| highlights.iter().filter(|(p, _)| *p == page).count())
        .collect()
}

/// Two of three sentences are marked; the page holding the third gets nothing
#[test]
fn test_cats_and_dogs_pdf() {
    let outcome = pipeline().process(&cats_and_dogs_pdf(), "pdf", 2).unwrap();
    let sentences = outcome.summary.sentences().to_vec();
    assert_eq!(sentences.len(), 2);
    assert_eq!(outcome.marks, 2);

    let per_page = marks_per_page(&outcome.document, 3);
    for (page, sentence) in CATS_AND_DOGS.iter().enumerate() {
        let expected = if sentences.iter().any(|s| s == sentence) { 1 } else { 0 };
        assert_eq!(per_page[page], expected, "page {} ({})", page + 1, sentence);
    }
    assert_eq!(per_page.iter().sum::<usize>(), 2);
}

#[test]
fn test_cats_and_dogs_docx() {
    let outcome = pipeline().process(&cats_and_dogs_docx(), "docx", 2).unwrap();
    let sentences = outcome.summary.sentences().to_vec();
    assert_eq!(sentences.len(), 2);
    assert_eq!(outcome.marks, 2);

    let paragraphs = docx::read_paragraphs(&outcome.document).unwrap();
    assert_eq!(paragraphs.len(), 3);
    for paragraph in &paragraphs {
        if sentences.contains(&paragraph.text) {
            assert_eq!(paragraph.highlighted_text(), paragraph.text);
        } else {
            assert_eq!(paragraph.highlighted_text(), "");
        }
    }
}

#[test]
fn test_summary_report_joins_sentences() {
    let outcome = pipeline().process(&cats_and_dogs_docx(), "docx", 2).unwrap();
    assert_eq!(outcome.report, outcome.summary.sentences().join(" "));
}

#[test]
fn test_no_match_returns_identical_bytes() {
    let sentences = vec!["This sentence appears nowhere in the document.".to_string()];

    let pdf = cats_and_dogs_pdf();
    let outcome = pdf_extraction::highlight(&pdf, &sentences, LocateOptions::default()).unwrap();
    assert_eq!(outcome.marks, 0);
    assert_eq!(outcome.bytes, pdf);

    let docx_bytes = cats_and_dogs_docx();
    let outcome = docx::highlight(&docx_bytes, &sentences, LocateOptions::default()).unwrap();
    assert_eq!(outcome.marks, 0);
    assert_eq!(outcome.bytes, docx_bytes);
}

/// Standard-14 fonts without /Widths still get real glyph advances
#[test]
fn test_highlight_rects_follow_font_metrics() {
    let input = pdf_with_pages(&[&["iiiiiiiiii"], &["MMMMMMMMMM"]]);
    let sentences = vec!["iiiiiiiiii".to_string(), "MMMMMMMMMM".to_string()];
    let outcome = pdf_extraction::highlight(&input, &sentences, LocateOptions::default()).unwrap();
    assert_eq!(outcome.marks, 2);

    let rects = pdf_extraction::read_highlights(&outcome.bytes).unwrap();
    let width_on = |page: u32| {
        rects
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, rect)| rect.width())
            .unwrap()
    };
    // 10 glyphs at 12pt: i is 222/1000 em, M is 833/1000 em
    assert!((width_on(1) - 26.64).abs() < 0.01, "narrow width {}", width_on(1));
    assert!((width_on(2) - 99.96).abs() < 0.01, "wide width {}", width_on(2));
    assert!(rects.iter().all(|(_, rect)| (rect.x0 - 72.0).abs() < 1e-3));
}

#[rstest]
#[case("pdf")]
#[case("docx")]
fn test_deterministic(#[case] extension: &str) {
    let input = match extension {
        "pdf" => cats_and_dogs_pdf(),
        _ => cats_and_dogs_docx(),
    };
    let first = pipeline().process(&input, extension, 2).unwrap();
    let second = pipeline().process(&input, extension, 2).unwrap();
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.marks, second.marks);
    if extension == "pdf" {
        assert_eq!(
            pdf_extraction::read_highlights(&first.document).unwrap(),
            pdf_extraction::read_highlights(&second.document).unwrap()
        );
    }
}

#[rstest]
#[case("pdf")]
#[case("docx")]
fn test_highlighting_keeps_extracted_text(#[case] extension: &str) {
    let input = match extension {
        "pdf" => pdf_with_pages(&[
            &["The harbour opened at dawn for the fishing fleet.", "Nets were mended on the quay."],
            &["Markets filled with the morning catch by noon."],
        ]),
        _ => docx_with_paragraphs(&[
            &["The harbour opened at dawn ", "for the fishing fleet."],
            &["Nets were mended on the quay. Markets filled by noon."],
        ]),
    };
    let p = pipeline();
    let outcome = p.process(&input, extension, 2).unwrap();
    assert!(outcome.marks > 0);
    assert_eq!(
        p.extract(&outcome.document, extension).unwrap().flat_text,
        p.extract(&input, extension).unwrap().flat_text
    );
}

#[test]
fn test_zero_byte_pdf_is_insufficient_but_valid() {
    let p = pipeline();
    let outcome = p.process(&[], "pdf", 2).unwrap();
    assert!(outcome.summary.is_insufficient());
    assert_eq!(outcome.report, "No text found.");
    let reopened = p.extract(&outcome.document, "pdf").unwrap();
    assert_eq!(reopened.units.len(), 1);
    assert!(reopened.flat_text.is_empty());
}

#[test]
fn test_zero_byte_docx_is_valid() {
    let p = pipeline();
    let outcome = p.process(&[], "docx", 2).unwrap();
    assert_eq!(outcome.summary, Summary::InsufficientText);
    assert_eq!(docx::read_paragraphs(&outcome.document).unwrap().len(), 1);
}

#[rstest]
#[case("txt")]
#[case("xlsx")]
#[case("")]
fn test_unsupported_format_falls_back(#[case] extension: &str) {
    let input = b"Some text that will never be parsed. It is opaque.".to_vec();
    let outcome = pipeline().process(&input, extension, 3).unwrap();
    assert_eq!(outcome.document, input);
    assert_eq!(outcome.mime_type, OCTET_STREAM_MIME);
    assert_eq!(outcome.summary, Summary::InsufficientText);
}

#[test]
fn test_count_is_monotonic() {
    let input = cats_and_dogs_pdf();
    let p = pipeline();
    for count in 1..=5 {
        let outcome = p.process(&input, "pdf", count).unwrap();
        assert_eq!(outcome.summary.sentences().len(), count.min(3));
        assert_eq!(outcome.marks, count.min(3));
    }
}

#[test]
fn test_pptx_is_summarized_but_passed_through() {
    let input = pptx_with_slides(&[
        "Quarterly revenue grew in every region.",
        "Hiring slowed in the second half.",
    ]);
    let outcome = pipeline().process(&input, "pptx", 1).unwrap();
    assert_eq!(outcome.summary.sentences().len(), 1);
    assert_eq!(outcome.marks, 0);
    assert_eq!(outcome.document, input);
    assert_eq!(outcome.mime_type, OCTET_STREAM_MIME);
}

#[test]
fn test_unreadable_pptx_degrades_to_no_text() {
    let input = b"PK\x03\x04 truncated presentation".to_vec();
    let outcome = pipeline().process(&input, "pptx", 2).unwrap();
    assert_eq!(outcome.summary, Summary::InsufficientText);
    assert_eq!(outcome.report, "No text found.");
    assert_eq!(outcome.document, input);
    assert_eq!(outcome.mime_type, OCTET_STREAM_MIME);
}

#[test]
fn test_docx_run_split_marks_only_the_sentence() {
    let input = docx_with_paragraphs(&[&["Opening remarks go first. The budget was approved on Friday."]]);
    let sentences = vec!["The budget was approved on Friday.".to_string()];
    let outcome = docx::highlight(&input, &sentences, LocateOptions::default()).unwrap();
    assert_eq!(outcome.marks, 1);

    let paragraphs = docx::read_paragraphs(&outcome.bytes).unwrap();
    assert_eq!(paragraphs[0].text, "Opening remarks go first. The budget was approved on Friday.");
    assert_eq!(paragraphs[0].runs.len(), 2);
    assert!(!paragraphs[0].runs[0].highlighted);
    assert_eq!(paragraphs[0].highlighted_text(), "The budget was approved on Friday.");
}

#[test]
fn test_extract_reports_units() {
    let document = pipeline().extract(&cats_and_dogs_pdf(), "PDF").unwrap();
    assert_eq!(document.units.len(), 3);
    assert!(matches!(document.units[0], StructuralUnit::Page(_)));
    assert_eq!(document.flat_text.split('\u{000C}').count(), 3);
}
