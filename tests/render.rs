//! DocumentRenderer tests against a fake engine.

mod common;

use article2pdf::{
    CancellationToken, DocumentRenderer, EngineError, ExtractedDocument, PageLayout, PrintStage,
    RenderEngineManager, RenderError, RenderRequest,
};
use chrono::NaiveDate;
use common::{FakeLauncher, PrintBehaviour, FAKE_PDF};
use std::sync::Arc;

fn sample_document() -> ExtractedDocument {
    ExtractedDocument::new(
        "Understanding Async",
        Some("Jane".into()),
        NaiveDate::from_ymd_opt(2026, 1, 15),
        "<p>Body text</p>",
    )
    .unwrap()
}

fn renderer(launcher: FakeLauncher) -> DocumentRenderer<FakeLauncher> {
    DocumentRenderer::new(
        Arc::new(RenderEngineManager::new(launcher)),
        PageLayout::a4(),
        None,
    )
}

#[tokio::test]
async fn writes_pdf_and_composes_page_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out/article.pdf");
    let css = dir.path().join("custom.css");
    std::fs::write(&css, "h1 { color: rebeccapurple; }").unwrap();

    let r = renderer(FakeLauncher::default());
    let request = RenderRequest::new(sample_document(), &dest).with_stylesheet_path(&css);
    let written = r.render(&request, &CancellationToken::new()).await.unwrap();

    assert_eq!(written, FAKE_PDF.len());
    assert_eq!(std::fs::read(&dest).unwrap(), FAKE_PDF);

    let engine = r.engines().acquire(&CancellationToken::new()).await.unwrap();
    let pages = engine.printed();
    assert_eq!(pages.len(), 1);
    let html = &pages[0];

    let default_css = html.find("font-family: Georgia").unwrap();
    let custom_css = html.find("rebeccapurple").unwrap();
    let heading = html.find("<h1>Understanding Async</h1>").unwrap();
    let meta = html
        .find(r#"<div class="article-meta">By Jane &middot; January 15, 2026</div>"#)
        .unwrap();
    let body = html.find("<p>Body text</p>").unwrap();
    assert!(default_css < custom_css);
    assert!(custom_css < heading);
    assert!(heading < meta);
    assert!(meta < body);
}

#[tokio::test]
async fn missing_stylesheet_fails_before_engine_use() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("article.pdf");
    let r = renderer(FakeLauncher::default());

    let request =
        RenderRequest::new(sample_document(), &dest).with_stylesheet_path(dir.path().join("nope.css"));
    let err = r.render(&request, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, RenderError::Configuration { .. }));
    assert_eq!(r.engines().initializations(), 0);
    assert_eq!(r.engines().launcher().runtime_calls(), 0);
    assert!(!dest.exists());
}

#[tokio::test]
async fn non_utf8_stylesheet_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let css = dir.path().join("binary.css");
    std::fs::write(&css, [0xff, 0xfe, 0x00]).unwrap();

    let r = renderer(FakeLauncher::default());
    let request = RenderRequest::new(sample_document(), dir.path().join("a.pdf"))
        .with_stylesheet_path(&css);
    let err = r.render(&request, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, RenderError::Configuration { ref path, .. } if *path == css));
    assert_eq!(r.engines().initializations(), 0);
}

#[tokio::test]
async fn engine_errors_pass_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let r = renderer(FakeLauncher::failing_launch(1));
    let request = RenderRequest::new(sample_document(), dir.path().join("a.pdf"));

    let err = r.render(&request, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, RenderError::Engine(EngineError::LaunchFailed(_))));
}

#[tokio::test]
async fn print_failure_becomes_generation_failed_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.pdf");
    let r = renderer(FakeLauncher::printing(PrintBehaviour::Fail(PrintStage::Export)));

    let err = r
        .render(&RenderRequest::new(sample_document(), &dest), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RenderError::GenerationFailed { path, detail } => {
            assert_eq!(path, dest);
            assert!(detail.contains("exporting PDF"), "{detail}");
        }
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn non_pdf_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.pdf");
    let r = renderer(FakeLauncher::printing(PrintBehaviour::Bytes(
        b"<html>oops</html>".to_vec(),
    )));

    let err = r
        .render(&RenderRequest::new(sample_document(), &dest), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::GenerationFailed { .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn concurrent_renders_share_one_engine() {
    let dir = tempfile::tempdir().unwrap();
    let r = Arc::new(renderer(FakeLauncher::default()));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let r = Arc::clone(&r);
            let dest = dir.path().join(format!("a{i}.pdf"));
            tokio::spawn(async move {
                r.render(&RenderRequest::new(sample_document(), dest), &CancellationToken::new())
                    .await
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(r.engines().initializations(), 1);
    let engine = r.engines().acquire(&CancellationToken::new()).await.unwrap();
    assert_eq!(engine.printed().len(), 4);
}

#[tokio::test]
async fn cancelled_render_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.pdf");
    let r = renderer(FakeLauncher::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = r
        .render(&RenderRequest::new(sample_document(), &dest), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::Engine(EngineError::Cancelled)));
    assert!(!dest.exists());
}

#[tokio::test]
async fn concurrent_renders_to_one_destination_leave_one_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("same.pdf");
    let r = Arc::new(renderer(FakeLauncher::default()));

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let r = Arc::clone(&r);
            let dest = dest.clone();
            tokio::spawn(async move {
                r.render(&RenderRequest::new(sample_document(), dest), &CancellationToken::new())
                    .await
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(std::fs::read(&dest).unwrap(), FAKE_PDF);
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("same.pdf")]);
}
