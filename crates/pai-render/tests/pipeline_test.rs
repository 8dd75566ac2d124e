#![cfg(unix)]

use pai_render::{DiagramKind, DiagramRenderer, RenderConfig, RenderError, RenderPipeline};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable shell script and returns its path.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A fake pdflatex: checks the wrapped document and writes `diagram.pdf`
/// into the working directory, appending one line to `calls` per run.
fn mock_compiler(bin: &Path, calls: &Path) -> PathBuf {
    write_script(
        bin,
        "pdflatex",
        &format!(
            "echo compile >> {calls}\n\
             for last; do :; done\n\
             grep -q 'begin{{circuitikz}}' \"$last\" || exit 3\n\
             printf '%%PDF-1.4 mock' > diagram.pdf",
            calls = calls.display()
        ),
    )
}

/// A fake `convert -density N in.pdf out.png`.
fn mock_rasterizer(bin: &Path) -> PathBuf {
    write_script(
        bin,
        "convert",
        "[ \"$1\" = \"-density\" ] || exit 4\nprintf 'PNG-%s' \"$2\" > \"$4\"",
    )
}

struct Fixture {
    _bin: tempfile::TempDir,
    work: tempfile::TempDir,
    calls: PathBuf,
    config: RenderConfig,
}

fn fixture() -> Fixture {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let calls = bin.path().join("calls.log");
    let config = RenderConfig {
        latex_binary: mock_compiler(bin.path(), &calls),
        rasterizer_binary: mock_rasterizer(bin.path()),
        work_dir: Some(work.path().to_path_buf()),
        ..RenderConfig::default()
    };
    Fixture {
        _bin: bin,
        work,
        calls,
        config,
    }
}

fn leftover_dirs(work: &Path) -> usize {
    std::fs::read_dir(work).unwrap().count()
}

#[tokio::test]
async fn renders_image_and_pdf_and_cleans_up() {
    let fx = fixture();
    let pipeline = RenderPipeline::new(fx.config.clone());

    let rendered = pipeline
        .render(DiagramKind::Tikz, "\\draw (0,0) to (1,1);")
        .await
        .expect("render should succeed");

    assert_eq!(rendered.image, b"PNG-300");
    assert_eq!(rendered.pdf.as_deref(), Some(&b"%PDF-1.4 mock"[..]));
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn density_is_passed_to_rasterizer() {
    let fx = fixture();
    let pipeline = RenderPipeline::new(RenderConfig {
        density: 150,
        ..fx.config.clone()
    });

    let rendered = pipeline
        .render(DiagramKind::Tikz, "\\draw (0,0) to[R] (2,0);")
        .await
        .unwrap();
    assert_eq!(rendered.image, b"PNG-150");
}

#[tokio::test]
async fn compiler_failure_is_reported_and_cleaned_up() {
    let fx = fixture();
    let bin = tempfile::tempdir().unwrap();
    let failing = write_script(
        bin.path(),
        "pdflatex",
        "echo '! Undefined control sequence.'\nexit 1",
    );
    let pipeline = RenderPipeline::new(RenderConfig {
        latex_binary: failing,
        ..fx.config.clone()
    });

    let result = pipeline.render(DiagramKind::Tikz, "\\drwa (0,0);").await;
    match result {
        Err(RenderError::CompileFailed(msg)) => {
            assert!(msg.contains("Undefined control sequence"), "got: {}", msg)
        }
        other => panic!("expected CompileFailed, got {:?}", other),
    }
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn compiler_without_output_is_a_compile_failure() {
    let fx = fixture();
    let bin = tempfile::tempdir().unwrap();
    let silent = write_script(bin.path(), "pdflatex", "exit 0");
    let pipeline = RenderPipeline::new(RenderConfig {
        latex_binary: silent,
        ..fx.config.clone()
    });

    let result = pipeline.render(DiagramKind::Tikz, "\\draw (0,0);").await;
    match result {
        Err(RenderError::CompileFailed(msg)) => assert!(msg.contains("was not produced")),
        other => panic!("expected CompileFailed, got {:?}", other),
    }
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn rasterizer_failure_is_reported_separately() {
    let fx = fixture();
    let bin = tempfile::tempdir().unwrap();
    let failing = write_script(bin.path(), "convert", "echo 'no decode delegate' >&2\nexit 1");
    let pipeline = RenderPipeline::new(RenderConfig {
        rasterizer_binary: failing,
        ..fx.config.clone()
    });

    let result = pipeline.render(DiagramKind::Tikz, "\\draw (0,0);").await;
    match result {
        Err(RenderError::RasterizeFailed(msg)) => assert!(msg.contains("no decode delegate")),
        other => panic!("expected RasterizeFailed, got {:?}", other),
    }
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn slow_compiler_times_out() {
    let fx = fixture();
    let bin = tempfile::tempdir().unwrap();
    let slow = write_script(bin.path(), "pdflatex", "sleep 5");
    let pipeline = RenderPipeline::new(RenderConfig {
        latex_binary: slow,
        timeout_seconds: 1,
        ..fx.config.clone()
    });

    let result = pipeline.render(DiagramKind::Tikz, "\\draw (0,0);").await;
    assert!(
        matches!(
            result,
            Err(RenderError::Timeout {
                seconds: 1,
                ..
            })
        ),
        "got {:?}",
        result
    );
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn concurrent_renders_use_separate_directories() {
    let fx = fixture();
    let pipeline = RenderPipeline::new(fx.config.clone());

    let (a, b, c) = tokio::join!(
        pipeline.render(DiagramKind::Tikz, "\\draw (0,0) to (1,1);"),
        pipeline.render(DiagramKind::Tikz, "\\draw (0,0) to (2,2);"),
        pipeline.render(DiagramKind::Tikz, "\\draw (0,0) to (3,3);"),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let calls = std::fs::read_to_string(&fx.calls).unwrap();
    assert_eq!(calls.lines().count(), 3);
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}

#[tokio::test]
async fn mermaid_uses_the_mermaid_cli() {
    let fx = fixture();
    let bin = tempfile::tempdir().unwrap();
    // mmdc -i diagram.mmd -o diagram.pdf --pdfFit
    let mmdc = write_script(
        bin.path(),
        "mmdc",
        "[ \"$1\" = \"-i\" ] || exit 5\ngrep -q 'flowchart' \"$2\" || exit 6\nprintf '%%PDF-1.4 mermaid' > \"$4\"",
    );
    let pipeline = RenderPipeline::new(RenderConfig {
        mermaid_binary: mmdc,
        ..fx.config.clone()
    });

    let rendered = pipeline
        .render(DiagramKind::Mermaid, "flowchart LR\n  Sensor --> MCU")
        .await
        .expect("mermaid render should succeed");
    assert_eq!(rendered.pdf.as_deref(), Some(&b"%PDF-1.4 mermaid"[..]));
    assert_eq!(leftover_dirs(fx.work.path()), 0);
}
