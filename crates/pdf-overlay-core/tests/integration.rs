//! Integration tests for pdf-overlay-core
//!
//! These tests verify the end-to-end workflow:
//! - PDF loading and positioned text extraction
//! - Overlay redraw at arbitrary canvas sizes
//! - Translation passes with a mock backend
//! - Selection, batch editing and the project store

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream};
use pdf_overlay_core::{
    BatchEdit, Canvas, Color, Error, ExportOutcome, FrameInput, Lang, NewProject, NormPoint,
    OverlayFont, OverlayRenderer, PdfDocument, PdfExporter, PixelRect, ProjectSession,
    PageRenderer, ProjectStore, Result, Selection, SelectionController, SelectionMode, TextExtractor,
    TranslationPass, Translator, AppConfig,
    config::RenderConfig,
    translator::TranslatorInfo,
};
use uuid::Uuid;

// =============================================================================
// Mock Translator for Testing
// =============================================================================

/// A mock translator that returns predictable translations without network calls.
struct MockTranslator {
    /// Prefix to add to translations for verification
    prefix: String,
    /// Fail on this (1-based) call, if set
    fail_on_call: Option<usize>,
    /// Drop the last string of every response
    short_by_one: bool,
    calls: AtomicUsize,
}

impl MockTranslator {
    fn new() -> Self {
        Self {
            prefix: "[EN]".to_string(),
            fail_on_call: None,
            short_by_one: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }

    fn short_by_one() -> Self {
        Self {
            short_by_one: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "mock",
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source: &Lang,
        _target: &Lang,
    ) -> Result<Vec<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(Error::TranslationRequest("Mock translation failure".to_string()));
        }

        let mut out: Vec<String> = texts
            .iter()
            .map(|t| format!("{} {}", self.prefix, t))
            .collect();
        if self.short_by_one {
            out.pop();
        }
        Ok(out)
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Build a US Letter PDF; each page shows its lines in 24pt Helvetica.
fn create_test_pdf(pages: &[&[(&str, i64, i64)]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(lopdf::Dictionary::from_iter([(
        "Font",
        Object::Dictionary(lopdf::Dictionary::from_iter([(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for &(text, x, y) in *lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 24.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content_bytes = Content { operations }.encode().unwrap();
        let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let page_id = doc.add_object(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        page_tree_id,
        Object::Dictionary(lopdf::Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap();
    output
}

fn three_page_pdf() -> Vec<u8> {
    create_test_pdf(&[
        &[("Bonjour le monde", 100, 700), ("Deuxieme ligne", 100, 600)],
        &[("Page deux", 72, 720)],
        &[("Page trois", 72, 720)],
    ])
}

/// Store with one project created from `pdf`.
fn project_with(pdf: Vec<u8>) -> (ProjectStore, Uuid) {
    let store = ProjectStore::temporary().unwrap();
    let new = NewProject::from_pdf("", "rapport.pdf", pdf, Lang::new("fr"), Lang::new("en"))
        .expect("fixture PDF should open");
    let project = store.create_project(new).unwrap();
    (store, project.id)
}

/// Low-resolution rasters keep the tests fast.
fn fast_render() -> RenderConfig {
    RenderConfig {
        scale: 0.5,
        ..RenderConfig::default()
    }
}

/// Records draw calls; every glyph is `0.5 * font_size` wide.
#[derive(Default)]
struct RecordingCanvas {
    width: u32,
    height: u32,
    texts: Vec<(String, f32, f32, f32)>,
    fills: Vec<PixelRect>,
}

impl Canvas for RecordingCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.texts.clear();
        self.fills.clear();
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn draw_image(&mut self, _image: &RgbaImage) {}
    fn fill_rect(&mut self, rect: PixelRect, _color: Color) {
        self.fills.push(rect);
    }
    fn stroke_rect(&mut self, _rect: PixelRect, _color: Color, _line_width: f32) {}
    fn fill_circle(&mut self, _cx: f32, _cy: f32, _radius: f32, _color: Color) {}
    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }
    fn fill_text(&mut self, text: &str, x: f32, baseline: f32, font_size: f32, _color: Color) {
        self.texts.push((text.to_string(), x, baseline, font_size));
    }
}

// =============================================================================
// PDF Loading and Extraction Tests
// =============================================================================

#[test]
fn test_pdf_page_count() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    assert_eq!(doc.page_count(), 3);
}

#[test]
fn test_invalid_pdf_bytes() {
    assert!(matches!(
        PdfDocument::from_bytes(b"not a pdf".to_vec()),
        Err(Error::PdfOpen(_))
    ));
}

#[test]
fn test_invalid_page_number() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    let extractor = TextExtractor::new(&doc);
    assert!(matches!(
        extractor.extract_page(0),
        Err(Error::PdfInvalidPage { page: 0, total: 3 })
    ));
    assert!(matches!(
        extractor.extract_page(4),
        Err(Error::PdfInvalidPage { page: 4, total: 3 })
    ));
}

#[test]
fn test_rasterized_page_decodes_at_scaled_size() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    let renderer = PageRenderer::with_config(&doc, &fast_render());

    let webp = renderer.render_page_webp(2).unwrap();
    let decoded = image::load_from_memory(&webp).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (306, 396));

    let stored = renderer.rasterize_base64(2).unwrap();
    let img = pdf_overlay_core::pdf::decode_page_image(&stored).unwrap().unwrap();
    assert_eq!(img.dimensions(), (306, 396));
}

#[test]
fn test_extraction_ratios() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    let (viewport, segments) = TextExtractor::new(&doc).extract_page(1).unwrap();

    assert!((viewport.width - 612.0).abs() < 0.5);
    assert!((viewport.height - 792.0).abs() < 0.5);
    assert_eq!(segments.len(), 2);

    let first = &segments[0];
    assert_eq!(first.text.trim(), "Bonjour le monde");
    assert_eq!(first.original_text(), first.text);
    assert!((first.x_ratio - 100.0 / 612.0).abs() < 0.01);
    assert!((first.y_ratio - 92.0 / 792.0).abs() < 0.01);
    assert!((first.font_size - 24.0).abs() < 0.5);
    assert!((first.height_ratio - first.font_size / 792.0).abs() < 1e-5);
    assert!(first.width_ratio > 0.0 && first.width_ratio < 1.0);
    assert!((first.viewport_width - viewport.width).abs() < f32::EPSILON);

    // Document order: the line higher on the page comes first.
    assert!(segments[1].y_ratio > first.y_ratio);
}

// =============================================================================
// Overlay Tests
// =============================================================================

#[test]
fn test_extracted_ratios_redraw_proportionally() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    let (_, segments) = TextExtractor::new(&doc).extract_page(1).unwrap();
    let selected = BTreeSet::new();
    let source = RgbaImage::new(612 * 3, 792 * 3);

    for width in [300_u32, 1200, 2000] {
        let renderer = OverlayRenderer::default().with_width(width);
        let mut canvas = RecordingCanvas::default();
        let layout = renderer.render(
            &mut canvas,
            &FrameInput {
                image: Some(&source),
                segments: &segments,
                show_original: false,
                edit_mode: false,
                selected: &selected,
                gesture: None,
            },
        );

        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (layout.width as f32, layout.height as f32);
        for (segment, (_, x, baseline, size)) in segments.iter().zip(&canvas.texts) {
            assert!((x - segment.x_ratio * w).abs() < 1e-2);
            assert!((baseline - segment.y_ratio * h).abs() < 1e-2);
            let drawn = canvas.measure_text(&segment.text, *size);
            assert!(drawn <= segment.width_ratio * w + 1e-3);
        }
        assert_eq!(canvas.fills.len(), segments.len());
    }
}

// =============================================================================
// Translation Pass Tests
// =============================================================================

#[tokio::test]
async fn test_pass_translates_and_persists_pages() {
    let (store, id) = project_with(three_page_pdf());
    let pass = TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render());

    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = Arc::clone(&seen);
    let report = pass
        .run(
            id,
            1..=3,
            Some(Box::new(move |_progress| {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await
        .unwrap();

    assert_eq!(report.completed, vec![1, 2, 3]);
    assert_eq!(seen.load(Ordering::SeqCst), 3);

    let session = ProjectSession::load(store, id).unwrap();
    assert_eq!(session.translated_page_numbers(), vec![1, 2, 3]);
    let page = session.page(1).unwrap();
    assert!(page.is_available());
    assert_eq!(page.segments.len(), 2);
    assert!(page.segments[0].text.starts_with("[EN] "));
    assert_eq!(page.segments[0].original_text().trim(), "Bonjour le monde");
}

#[tokio::test]
async fn test_pass_failure_keeps_completed_pages() {
    let (store, id) = project_with(three_page_pdf());
    let pass = TranslationPass::new(
        store.clone(),
        Arc::new(MockTranslator::failing_on(2)),
        fast_render(),
    );

    let err = pass.run(id, 1..=3, None).await.unwrap_err();
    match err {
        Error::PassAborted {
            page,
            completed,
            reason,
        } => {
            assert_eq!(page, 2);
            assert_eq!(completed, vec![1]);
            assert!(reason.contains("Mock translation failure"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(store.get_page(id, 1).unwrap().is_some());
    assert!(store.get_page(id, 2).unwrap().is_none());
    assert!(store.get_page(id, 3).unwrap().is_none());
}

#[tokio::test]
async fn test_short_translation_falls_back_to_original() {
    let (store, id) = project_with(three_page_pdf());
    let pass = TranslationPass::new(
        store.clone(),
        Arc::new(MockTranslator::short_by_one()),
        fast_render(),
    );
    pass.run(id, 1..=1, None).await.unwrap();

    let page = store.get_page(id, 1).unwrap().unwrap();
    assert!(page.segments[0].is_translated());
    assert!(!page.segments[1].is_translated());
    assert_eq!(page.segments[1].text, page.segments[1].original_text());
}

#[tokio::test]
async fn test_pass_range_is_clamped() {
    let (store, id) = project_with(three_page_pdf());
    let pass = TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render());

    let report = pass.run(id, 3..=10, None).await.unwrap();
    assert_eq!(report.completed, vec![3]);

    let report = pass.run(id, 7..=9, None).await.unwrap();
    assert!(report.completed.is_empty());
    assert!(report.message.is_some());
}

#[tokio::test]
async fn test_project_deleted_mid_pass_stays_deleted() {
    let (store, id) = project_with(three_page_pdf());
    let pass = TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render());

    let deleter = store.clone();
    let result = pass
        .run(
            id,
            1..=3,
            Some(Box::new(move |progress| {
                if progress.page == 1 {
                    deleter.delete_project(id).unwrap();
                }
            })),
        )
        .await;

    assert!(matches!(result, Err(Error::ProjectNotFound(_))));
    assert!(store.get_project(id).unwrap().is_none());
    assert!(store.pages_for_project(id).unwrap().is_empty());
    assert!(store.get_page(id, 2).unwrap().is_none());
}

#[tokio::test]
async fn test_pass_unknown_project() {
    let store = ProjectStore::temporary().unwrap();
    let pass = TranslationPass::new(store, Arc::new(MockTranslator::new()), fast_render());
    assert!(matches!(
        pass.run(Uuid::new_v4(), 1..=1, None).await,
        Err(Error::ProjectNotFound(_))
    ));
}

// =============================================================================
// Session, Selection and Batch Edit Tests
// =============================================================================

#[tokio::test]
async fn test_select_and_batch_edit_round_trip() {
    let (store, id) = project_with(three_page_pdf());
    TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render())
        .run(id, 1..=1, None)
        .await
        .unwrap();
    let mut session = ProjectSession::load(store.clone(), id).unwrap();
    let page = session.page(1).unwrap().clone();

    let mut controller = SelectionController::default();
    let mut selection = Selection::default();
    selection.activate_page(1);

    let anchor = page.segments[1].anchor();
    let update = controller
        .pointer_up(1, anchor, &page.segments, &selection.indices_for(1))
        .unwrap();
    selection.apply(update);
    assert_eq!(selection.indices_for(1), BTreeSet::from([1]));

    let mut batch = BatchEdit::begin(&page, selection.indices());
    batch.set_text(1, "Second line");
    let mut edited = page.clone();
    assert_eq!(batch.commit(&mut edited), 1);
    session.save_page_segments(1, edited.segments).unwrap();

    let reloaded = store.get_page(id, 1).unwrap().unwrap();
    assert_eq!(reloaded.segments[1].text, "Second line");
    assert_eq!(reloaded.segments[0].text, page.segments[0].text);
    assert_eq!(session.first_untranslated(0), Some(2));
}

#[test]
fn test_points_gesture_does_not_cross_pages() {
    let doc = PdfDocument::from_bytes(three_page_pdf()).unwrap();
    let extractor = TextExtractor::new(&doc);
    let (_, page2) = extractor.extract_page(2).unwrap();
    let (_, page3) = extractor.extract_page(3).unwrap();

    let mut controller = SelectionController::default();
    controller.set_mode(SelectionMode::Points);
    let mut selection = Selection::default();

    selection.activate_page(2);
    assert!(
        controller
            .pointer_up(2, NormPoint::new(0.0, 0.0), &page2, &selection.indices_for(2))
            .is_none()
    );

    selection.activate_page(3);
    controller.page_changed(3);
    let second = controller.pointer_up(3, NormPoint::new(1.0, 1.0), &page3, &selection.indices_for(3));
    assert!(second.is_none());
    assert!(selection.is_empty());
}

// =============================================================================
// Store Tests
// =============================================================================

#[tokio::test]
async fn test_delete_project_cascades() {
    let (store, id) = project_with(three_page_pdf());
    TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render())
        .run(id, 1..=3, None)
        .await
        .unwrap();
    assert_eq!(store.pages_for_project(id).unwrap().len(), 3);

    assert!(store.delete_project(id).unwrap());
    assert!(store.get_project(id).unwrap().is_none());
    assert!(store.get_blob(id).unwrap().is_none());
    assert!(store.pages_for_project(id).unwrap().is_empty());
    assert!(store.get_page(id, 1).unwrap().is_none());
}

#[test]
fn test_project_name_defaults_to_file_stem() {
    let (store, id) = project_with(three_page_pdf());
    let project = store.get_project(id).unwrap().unwrap();
    assert_eq!(project.name, "rapport");
    assert_eq!(project.page_count, 3);
}

// =============================================================================
// Export Tests
// =============================================================================

/// Exports need a real font; skip when the machine has none.
fn system_font() -> Option<OverlayFont> {
    OverlayFont::load(None).ok()
}

#[tokio::test]
async fn test_export_translated_pages() {
    let Some(font) = system_font() else {
        return;
    };
    let (store, id) = project_with(three_page_pdf());
    TranslationPass::new(store.clone(), Arc::new(MockTranslator::new()), fast_render())
        .run(id, 1..=2, None)
        .await
        .unwrap();
    let session = ProjectSession::load(store, id).unwrap();

    let mut config = AppConfig::default();
    config.overlay.export_width = 400;
    let exporter = PdfExporter::from_config(&config, font);

    match exporter.export(&session, &[]).unwrap() {
        ExportOutcome::Exported { pdf, pages } => {
            assert_eq!(pages, vec![1, 2]);
            let exported = PdfDocument::from_bytes(pdf).unwrap();
            assert_eq!(exported.page_count(), 2);
        }
        ExportOutcome::NothingToExport { reason } => panic!("nothing exported: {reason}"),
    }

    assert!(matches!(
        exporter.export(&session, &[3]).unwrap(),
        ExportOutcome::NothingToExport { .. }
    ));
}
