//! Headless recognizer: reads a drawing as JSON and prints ranked candidates.
//!
//! The drawing is a list of strokes, each a list of `[timestamp_ms, x, y]`
//! samples, read from a file or from stdin when no path is given.

use std::io::Read;
use std::path::PathBuf;

use hwyla::config;
use hwyla::logging::{self, ConsoleTarget};
use hwyla::recognition::{self, RecognitionSession, StrokeSample, SymbolCatalog};

fn main() {
    if let Err(err) = logging::init_with(ConsoleTarget::Stderr) {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct Options {
    input: Option<PathBuf>,
    top_k: Option<usize>,
    model: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let strokes = read_strokes(options.input.as_ref())?;

    let mut cfg = config::load_or_default().map_err(|err| err.to_string())?;
    if let Some(model) = options.model {
        cfg.recognition.model_path = model;
    }
    let top_k = options.top_k.unwrap_or(cfg.recognition.top_k);
    let catalog = SymbolCatalog::embedded().map_err(|err| err.to_string())?;
    let worker = recognition::spawn_tflite_worker(&cfg.recognition, &catalog)
        .map_err(|err| err.to_string())?;

    let mut session = RecognitionSession::new(worker, top_k);
    let mut result = None;
    for stroke in strokes {
        session.begin_stroke().map_err(|err| err.to_string())?;
        for sample in stroke {
            session.add_sample(sample).map_err(|err| err.to_string())?;
        }
        result = session.end_stroke().map_err(|err| err.to_string())?;
    }
    let Some(result) = result else {
        return Err("Drawing contains no samples".into());
    };
    for ranked in result.ranked() {
        match catalog.get(ranked.symbol_id) {
            Some(entry) => println!(
                "{}\t{}\t{}\t{}",
                ranked.rank + 1,
                entry.id,
                entry.glyph,
                entry.command
            ),
            None => println!("{}\t{}\t?\t?", ranked.rank + 1, ranked.symbol_id),
        }
    }
    Ok(())
}

fn read_strokes(path: Option<&PathBuf>) -> Result<Vec<Vec<StrokeSample>>, String> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            text
        }
    };
    serde_json::from_str(&text).map_err(|err| format!("Invalid drawing JSON: {err}"))
}

fn parse_args(args: Vec<String>) -> Result<Options, String> {
    let mut options = Options {
        input: None,
        top_k: None,
        model: None,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--top-k" | "-k" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--top-k requires a value".to_string())?;
                let k = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --top-k value: {value}"))?;
                if k == 0 {
                    return Err("--top-k must be positive".into());
                }
                options.top_k = Some(k);
            }
            "--model" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(help_text()),
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            path => options.input = Some(PathBuf::from(path)),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    "Usage: hwyla-recognize [--top-k N] [--model PATH] [DRAWING.json]\n\
     Reads [[[t_ms, x, y], ...], ...] from the file or stdin and prints\n\
     rank, symbol id, glyph and LaTeX command per line."
        .to_string()
}
