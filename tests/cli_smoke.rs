mod support;

use std::path::PathBuf;

use support::{FrameSpec, GifBuilder, rgb_palette};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_glyphgif")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "glyphgif.exe"
            } else {
                "glyphgif"
            });
            p
        })
}

fn fixture(dir: &std::path::Path) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let gif = GifBuilder::new(4, 4, Some(&rgb_palette()))
        .netscape_loop(2)
        .comment("smoke")
        .frame(&FrameSpec::full(4, 4, 1, vec![1; 16]))
        .frame(&FrameSpec::full(4, 4, 2, vec![2; 16]))
        .finish();
    let path = dir.join("anim.gif");
    std::fs::write(&path, gif).unwrap();
    path
}

#[test]
fn cli_export_writes_frames() {
    let dir = PathBuf::from("target").join("cli_smoke_export");
    let _ = std::fs::remove_dir_all(&dir);
    let gif = fixture(&dir);
    let out = dir.join("frames");

    let status = std::process::Command::new(exe())
        .args(["export", "--width", "4", "--in"])
        .arg(&gif)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out.join("frame_00000.txt").exists());
    assert!(out.join("frame_00001.png").exists());
    assert!(out.join("timeline.json").exists());
}

#[test]
fn cli_inspect_prints_json() {
    let dir = PathBuf::from("target").join("cli_smoke_inspect");
    let _ = std::fs::remove_dir_all(&dir);
    let gif = fixture(&dir);

    let output = std::process::Command::new(exe())
        .args(["inspect", "--in"])
        .arg(&gif)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["width"], 4);
    assert_eq!(report["frames"], 2);
    assert_eq!(report["loop_count"], 2);
    assert_eq!(report["delays"], serde_json::json!([1, 2]));
    assert_eq!(report["comments"], serde_json::json!(["smoke"]));
}

#[test]
fn cli_rejects_malformed_input() {
    let dir = PathBuf::from("target").join("cli_smoke_bad");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bad.gif");
    std::fs::write(&path, b"PNG not a gif").unwrap();

    let output = std::process::Command::new(exe())
        .args(["inspect", "--in"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed container"));
}
