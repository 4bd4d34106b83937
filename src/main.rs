//! dom2svg – command-line DOM snapshot → SVG converter.
//!
//! Usage:
//!   dom2svg <snapshot.json> [output.svg] [--capture x,y,w,h] [--no-links] [--inline] [--options opts.json]
//!
//! If `output.svg` is omitted the SVG is written next to the input file with
//! the same stem (e.g. `page.json` → `page.svg`).

use std::{env, fs, path::PathBuf, process};

use dom_to_svg::dom::Rect;
use dom_to_svg::{document_to_svg, inline_resources, DomToSvgOptions, FileFetcher, SourceDocument};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut options_path: Option<PathBuf> = None;
    let mut capture: Option<Rect> = None;
    let mut no_links = false;
    let mut inline = false;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-links" => no_links = true,
            "--inline" => inline = true,
            "--capture" | "-c" => match iter.next().map(|v| parse_rect(v)) {
                Some(Some(rect)) => capture = Some(rect),
                _ => {
                    eprintln!("--capture expects x,y,width,height");
                    process::exit(1);
                }
            },
            "--options" | "-o" => match iter.next() {
                Some(v) => options_path = Some(PathBuf::from(v)),
                None => {
                    eprintln!("--options expects a file path");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("svg");
        o
    });

    let json = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };
    let document = match SourceDocument::from_json(&json) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error parsing snapshot '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let mut options = match options_path {
        Some(path) => {
            let loaded = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| DomToSvgOptions::from_json(&s));
            match loaded {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Error reading options '{}': {e}", path.display());
                    process::exit(1);
                }
            }
        }
        None => DomToSvgOptions::default(),
    };
    // Flags override the options file.
    if let Some(rect) = capture {
        options = options.with_capture_area(rect);
    }
    if no_links {
        options = options.with_keep_links(false);
    }

    let mut svg = match document_to_svg(&document, Some(&options)) {
        Ok(svg) => svg,
        Err(e) => {
            eprintln!("Error converting document: {e}");
            process::exit(1);
        }
    };
    if inline {
        let count = inline_resources(&mut svg, &FileFetcher);
        log::info!("Inlined {count} resource(s)");
    }

    let xml = match svg.to_xml_string() {
        Ok(xml) => xml,
        Err(e) => {
            eprintln!("Error serialising SVG: {e}");
            process::exit(1);
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(&output, &xml) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
    eprintln!("Wrote '{}' ({} bytes)", output.display(), xml.len());
}

fn parse_rect(value: &str) -> Option<Rect> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts[..] {
        [x, y, width, height] => Some(Rect::new(x, y, width, height)),
        _ => None,
    }
}

fn print_usage(prog: &str) {
    eprintln!("dom2svg – DOM snapshot to SVG converter (dom-to-svg)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <snapshot.json> [output.svg] [--capture x,y,w,h] [--no-links] [--inline] [--options opts.json]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <snapshot.json>  Serialised DOM snapshot to convert");
    eprintln!("  [output.svg]     Output path  (default: same stem as input with .svg)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --capture, -c    Capture area in document coordinates (default: root element box)");
    eprintln!("  --no-links       Do not keep <a href> elements as SVG links");
    eprintln!("  --inline         Embed file: images and fonts as data: URIs");
    eprintln!("  --options, -o    JSON options file (captureArea, keepLinks)");
    eprintln!("  --help           Print this message");
}
