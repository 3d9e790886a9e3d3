use super::*;

fn fixture_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("scan_unit")
        .join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, w: u32, h: u32) {
    let mut rgba = Vec::with_capacity((w * h * 4) as usize);
    for i in 0..w * h {
        // Left half keyed magenta, right half opaque white.
        if i % w < w / 2 {
            rgba.extend_from_slice(&[255, 0, 255, 255]);
        } else {
            rgba.extend_from_slice(&[255, 255, 255, 255]);
        }
    }
    image::save_buffer_with_format(
        path,
        &rgba,
        w,
        h,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .unwrap();
}

#[test]
fn builds_sorted_tree_and_skips_broken_files() {
    let root = fixture_dir("tree");
    write_png(&root.join("b.png"), 200, 100);
    write_png(&root.join("a.png"), 20, 10);
    fs::write(root.join("broken.png"), b"not an image").unwrap();
    fs::write(root.join("notes.txt"), b"ignored").unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    write_png(&root.join("sub").join("c.png"), 4, 4);
    fs::create_dir_all(root.join("empty")).unwrap();

    let opts = ScanOptions {
        thumb_size: 50,
        threads: Some(2),
        ..ScanOptions::default()
    };
    let report = scan_overlay_library(&root, &opts, &CancelToken::new()).unwrap();

    assert!(!report.cancelled);
    assert_eq!(
        report.counts,
        ScanCounts {
            total: 4,
            loaded: 3,
            skipped: 1
        }
    );
    assert_eq!(report.counts.fraction(), 1.0);

    let tree = &report.tree;
    assert_eq!(tree.dirs.len(), 1);
    assert_eq!(tree.dirs[0].path, root.join("sub"));
    let names: Vec<_> = tree
        .overlays
        .iter()
        .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.png", "b.png"]);
    assert_eq!(tree.overlays[1].thumbnail.dimensions(), (50, 25));
    assert_eq!(tree.overlay_count(), 3);
    assert_eq!(tree.entries()[0].path, root.join("sub").join("c.png"));
}

#[test]
fn cancelled_scan_returns_partial_tree() {
    let root = fixture_dir("cancelled");
    write_png(&root.join("a.png"), 4, 4);
    let cancel = CancelToken::new();
    cancel.cancel();
    let report = scan_overlay_library(&root, &ScanOptions::default(), &cancel).unwrap();
    assert!(report.cancelled);
    assert!(report.tree.is_empty());
    assert_eq!(report.counts.loaded, 0);
}

#[test]
fn rejects_bad_settings_and_missing_root() {
    let root = fixture_dir("settings");
    let zero_threads = ScanOptions {
        threads: Some(0),
        ..ScanOptions::default()
    };
    assert!(scan_overlay_library(&root, &zero_threads, &CancelToken::new()).is_err());
    let zero_thumb = ScanOptions {
        thumb_size: 0,
        ..ScanOptions::default()
    };
    assert!(scan_overlay_library(&root, &zero_thumb, &CancelToken::new()).is_err());
    assert!(
        scan_overlay_library(&root.join("nope"), &ScanOptions::default(), &CancelToken::new())
            .is_err()
    );
}

#[test]
fn progress_counters_are_shared_with_caller() {
    let root = fixture_dir("progress");
    write_png(&root.join("a.png"), 4, 4);
    let progress = ScanProgress::new();
    scan_overlay_library_with_progress(
        &root,
        &ScanOptions::default(),
        &CancelToken::new(),
        &progress,
    )
    .unwrap();
    assert_eq!(progress.snapshot().loaded, 1);
}
