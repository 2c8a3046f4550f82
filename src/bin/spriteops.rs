//! Command-line front-end for the spriteops compiler.
//!
//! Deliberately out of the core's scope (`spec.md` §1): this binary only
//! talks to the core through `Document::from_slice`, `validate`,
//! `imaging::render_sprite`, and `imaging::encode_gif`. No argument-parsing
//! crate appears anywhere in the retrieved corpus, so none is introduced
//! here — subcommands are matched by hand, the way a small internal tool
//! would.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use spriteops::document::Document;
use spriteops::imaging::{encode_gif, render_sprite, Layout, RenderOptions};
use spriteops::validate::validate;

const PALETTE_PRESETS: &[(&str, &[&str])] = &[
    ("gameboy", &["#00000000", "#0f380f", "#306230", "#8bac0f", "#9bbc0f"]),
    (
        "pico8",
        &[
            "#00000000", "#1d2b53", "#7e2553", "#008751", "#ab5236", "#5f574f", "#c2c3c7", "#fff1e8", "#ff004d", "#ffa300",
            "#ffec27", "#00e436", "#29adff", "#83769c", "#ff77a8", "#ffccaa",
        ],
    ),
    ("grayscale", &["#00000000", "#000000", "#555555", "#aaaaaa", "#ffffff"]),
    ("default", &["#00000000", "#000000", "#ffffff", "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff"]),
];

fn main() -> ExitCode {
    env_logger::init();
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("validate") => cmd_validate(args.collect()),
        Some("render") => cmd_render(args.collect()),
        Some("new") => cmd_new(args.collect()),
        _ => {
            eprintln!("usage: spriteops <validate|render|new> ...");
            ExitCode::FAILURE
        }
    }
}

fn spriteops_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut out = Vec::new();
    collect_spriteops_files(path, &mut out);
    out
}

fn collect_spriteops_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let p = entry.path();
        if p.is_dir() {
            collect_spriteops_files(&p, out);
        } else if p.to_string_lossy().ends_with(".spriteops.json") {
            out.push(p);
        }
    }
}

fn cmd_validate(args: Vec<String>) -> ExitCode {
    let strict = args.iter().any(|a| a == "--strict");
    let path = match args.iter().find(|a| !a.starts_with("--")) {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("validate: missing PATH");
            return ExitCode::FAILURE;
        }
    };

    let files = spriteops_files(&path);
    if files.is_empty() {
        eprintln!("No .spriteops.json files found in {}", path.display());
        return ExitCode::FAILURE;
    }

    let mut total_errors = 0usize;
    for file in &files {
        let bytes = match fs::read(file) {
            Ok(b) => b,
            Err(e) => {
                println!("[FAIL] {}", file.display());
                eprintln!("  Failed to read file: {e}");
                total_errors += 1;
                continue;
            }
        };
        let doc = match Document::from_slice(&bytes) {
            Ok(d) => d,
            Err(e) => {
                println!("[FAIL] {}", file.display());
                eprintln!("  Invalid JSON: {e}");
                total_errors += 1;
                continue;
            }
        };
        let diagnostics = validate(&doc, Some(&file.display().to_string()), strict);
        if diagnostics.is_empty() {
            println!("[OK] {}", file.display());
        } else {
            println!("[FAIL] {}", file.display());
            for d in &diagnostics {
                eprintln!("  {}", d.message);
            }
            total_errors += diagnostics.len();
        }
    }

    if total_errors > 0 {
        eprintln!("\n{total_errors} error(s) found");
        ExitCode::FAILURE
    } else {
        println!("\n{} file(s) validated successfully", files.len());
        ExitCode::SUCCESS
    }
}

fn cmd_render(args: Vec<String>) -> ExitCode {
    let mut path = None;
    let mut outdir = None;
    let mut scale: u32 = 1;
    let mut layout = Layout::Horizontal;
    let mut cols: u32 = 4;
    let mut export_frames = false;
    let mut export_gif = false;

    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--outdir" | "-o" => outdir = it.next(),
            "--scale" | "-s" => scale = it.next().and_then(|v| v.parse().ok()).unwrap_or(1),
            "--layout" => {
                layout = match it.next().as_deref() {
                    Some("grid") => Layout::Grid { cols },
                    _ => Layout::Horizontal,
                }
            }
            "--cols" => {
                cols = it.next().and_then(|v| v.parse().ok()).unwrap_or(4);
                if let Layout::Grid { .. } = layout {
                    layout = Layout::Grid { cols };
                }
            }
            "--frames" => export_frames = true,
            "--gif" => export_gif = true,
            other if !other.starts_with('-') => path = Some(PathBuf::from(other)),
            _ => {}
        }
    }

    let (Some(path), Some(outdir)) = (path, outdir) else {
        eprintln!("render: usage: render PATH --outdir DIR [--scale N] [--layout horizontal|grid] [--cols N] [--frames] [--gif]");
        return ExitCode::FAILURE;
    };
    let outdir = PathBuf::from(outdir);
    if let Err(e) = fs::create_dir_all(&outdir) {
        eprintln!("render: failed to create output directory: {e}");
        return ExitCode::FAILURE;
    }

    let files = spriteops_files(&path);
    if files.is_empty() {
        eprintln!("No .spriteops.json files found in {}", path.display());
        return ExitCode::FAILURE;
    }

    let opts = RenderOptions { scale, layout };

    for file in &files {
        let base_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
            .trim_end_matches(".spriteops.json")
            .to_string();

        let bytes = match fs::read(file) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("[FAIL] {} - {e}", file.display());
                return ExitCode::FAILURE;
            }
        };
        let doc = match Document::from_slice(&bytes) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("[FAIL] {} - {e}", file.display());
                return ExitCode::FAILURE;
            }
        };

        let diagnostics = validate(&doc, Some(&file.display().to_string()), false);
        if !diagnostics.is_empty() {
            println!("[FAIL] {} - validation failed", file.display());
            for d in &diagnostics {
                eprintln!("  {}", d.message);
            }
            return ExitCode::FAILURE;
        }

        let rendered = match render_sprite(&doc, &base_name, &opts) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[FAIL] {} - render failed: {e}", file.display());
                return ExitCode::FAILURE;
            }
        };

        let sheet_path = outdir.join(format!("{base_name}_sheet.png"));
        if let Err(e) = rendered.sheet.save(&sheet_path) {
            eprintln!("[FAIL] {} - {e}", file.display());
            return ExitCode::FAILURE;
        }

        if export_frames {
            for (i, frame) in rendered.frames.iter().enumerate() {
                let scaled = image::imageops::resize(
                    frame,
                    frame.width() * scale.max(1),
                    frame.height() * scale.max(1),
                    image::imageops::FilterType::Nearest,
                );
                let frame_path = outdir.join(format!("frame_{i:02}.png"));
                if let Err(e) = scaled.save(&frame_path) {
                    eprintln!("[FAIL] {} - {e}", frame_path.display());
                    return ExitCode::FAILURE;
                }
            }
        }

        let meta_path = outdir.join(format!("{base_name}_meta.json"));
        let meta_json = serde_json::to_string_pretty(&rendered.meta).unwrap();
        if let Err(e) = fs::write(&meta_path, meta_json) {
            eprintln!("[FAIL] {} - {e}", file.display());
            return ExitCode::FAILURE;
        }

        println!("[OK] {}", file.display());
        println!("  -> {}", sheet_path.display());
        println!("  -> {}", meta_path.display());

        if export_gif && rendered.frames.len() > 1 {
            let gif_path = outdir.join(format!("{base_name}.gif"));
            match fs::File::create(&gif_path) {
                Ok(f) => {
                    if let Err(e) = encode_gif(f, &rendered.frames, &rendered.frame_durations_ms, scale) {
                        eprintln!("[FAIL] {} - gif encode failed: {e}", file.display());
                        return ExitCode::FAILURE;
                    }
                    println!("  -> {}", gif_path.display());
                }
                Err(e) => {
                    eprintln!("[FAIL] {} - {e}", file.display());
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    println!("\n{} sprite(s) rendered successfully", files.len());
    ExitCode::SUCCESS
}

fn cmd_new(args: Vec<String>) -> ExitCode {
    let mut name = None;
    let mut w: u32 = 32;
    let mut h: u32 = 32;
    let mut palette_arg = "default".to_string();

    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--w" | "-w" => w = it.next().and_then(|v| v.parse().ok()).unwrap_or(32),
            "--h" | "-h" => h = it.next().and_then(|v| v.parse().ok()).unwrap_or(32),
            "--palette" | "-p" => palette_arg = it.next().unwrap_or_else(|| "default".to_string()),
            other if !other.starts_with('-') => name = Some(other.to_string()),
            _ => {}
        }
    }

    let Some(name) = name else {
        eprintln!("new: usage: new NAME [--w N] [--h N] [--palette NAME|#hex,#hex,...]");
        return ExitCode::FAILURE;
    };

    let colors: Vec<String> = if let Some((_, preset)) = PALETTE_PRESETS.iter().find(|(n, _)| *n == palette_arg) {
        preset.iter().map(|s| s.to_string()).collect()
    } else if palette_arg.contains(',') {
        let mut c = vec!["#00000000".to_string()];
        c.extend(palette_arg.split(',').map(|s| s.trim().to_string()));
        c
    } else {
        PALETTE_PRESETS.iter().find(|(n, _)| *n == "default").unwrap().1.iter().map(|s| s.to_string()).collect()
    };

    let template = serde_json::json!({
        "format": "spriteops",
        "version": 1,
        "canvas": { "w": w, "h": h },
        "palette": colors,
        "animations": { "idle": { "loop": true, "frames": [0] } },
        "frames": [{
            "durationMs": 100,
            "ops": [
                ["clear", 0],
                ["layer_begin", "main"],
                ["layer_end"],
                ["layer_merge", "final"],
                ["outline", 1, 1]
            ]
        }]
    });

    let output_path = PathBuf::from(format!("{name}.spriteops.json"));
    if let Err(e) = fs::write(&output_path, serde_json::to_string_pretty(&template).unwrap()) {
        eprintln!("new: failed to write {}: {e}", output_path.display());
        return ExitCode::FAILURE;
    }

    println!("[OK] Created {}", output_path.display());
    println!("  Canvas: {w}x{h}");
    println!("  Palette: {palette_arg} ({} colors)", colors.len());
    ExitCode::SUCCESS
}
