use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use image::RgbImage;
use shakmaty::{CastlingMode, Color};

use chessboard_advisor::vision::{self, BoardRecognizer, RecognizedBoard};
use chessboard_advisor::{Advisor, HintGenerator};

/// Analyze a chessboard photograph and recommend a move.
#[derive(Parser)]
#[command(name = "chessboard-advisor", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read the board and report the detected position
    Recognize {
        #[command(flatten)]
        board: BoardArgs,
        /// Directory to dump per-square piece thumbnails into
        #[arg(long, value_name = "DIR")]
        dump_cells: Option<PathBuf>,
    },
    /// Recommend the best move and render it onto the board image
    Advise {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        search: SearchArgs,
        /// Path for the rendered after-image
        #[arg(long, default_value = "advised.png")]
        output: PathBuf,
    },
    /// Phrase the best move as a strategy hint
    Hint {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        search: SearchArgs,
        /// Seed for reproducible template selection
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(clap::Args)]
struct BoardArgs {
    /// Board photograph: square, with a side divisible by 8
    image: PathBuf,
    /// Side to move
    #[arg(long, value_enum)]
    side: Side,
    /// Weights file for the color model stage
    #[arg(long, value_name = "FILE")]
    color_model: Option<PathBuf>,
    /// Weights file for the piece type model
    #[arg(long, value_name = "FILE")]
    piece_model: Option<PathBuf>,
    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Search depth in plies
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=5))]
    depth: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::White => "white",
        Side::Black => "black",
    }
}

#[derive(serde::Serialize)]
struct Report<'a> {
    fen: &'a str,
    side: &'a str,
    white_pieces: Vec<String>,
    black_pieces: Vec<String>,
    degraded_labels: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    match Args::parse().command {
        Command::Recognize { board, dump_cells } => recognize(board, dump_cells),
        Command::Advise {
            board,
            search,
            output,
        } => advise(board, search, output),
        Command::Hint {
            board,
            search,
            seed,
        } => hint(board, search, seed),
    }
}

fn recognize(board: BoardArgs, dump_cells: Option<PathBuf>) -> Result<()> {
    let img = load_image(&board)?;
    let mut advisor = build_advisor(&board, None);
    let (recognition, fen) = advisor.recognize(&img, Color::from(board.side))?;

    if let Some(dir) = &dump_cells {
        dump_thumbnails(&recognition, dir)?;
    }

    print_report(&report_for(&board, &fen, &recognition), board.json)
}

fn advise(board: BoardArgs, search: SearchArgs, output: PathBuf) -> Result<()> {
    let img = load_image(&board)?;
    let mut advisor = build_advisor(&board, None);
    let advice = advisor.advise(&img, Color::from(board.side), search.depth)?;

    let saved = match &advice.rendered {
        Some(rendered) => {
            rendered
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            Some(output.display().to_string())
        }
        None => None,
    };

    let mut report = report_for(&board, &advice.fen, &advice.recognition);
    report.depth = Some(search.depth);
    report.value = advice
        .result
        .best_move
        .is_some()
        .then_some(advice.result.value);
    report.best_move = advice
        .result
        .best_move
        .map(|mv| mv.to_uci(CastlingMode::Standard).to_string());
    report.saved = saved;
    print_report(&report, board.json)?;

    if !board.json && advice.result.best_move.is_none() {
        println!("No legal move to recommend.");
    }
    Ok(())
}

fn hint(board: BoardArgs, search: SearchArgs, seed: Option<u64>) -> Result<()> {
    let img = load_image(&board)?;
    let mut advisor = build_advisor(&board, seed);
    let advice = advisor.advise(&img, Color::from(board.side), search.depth)?;

    let mut report = report_for(&board, &advice.fen, &advice.recognition);
    report.depth = Some(search.depth);
    report.hint = Some(&advice.hint);
    print_report(&report, board.json)
}

fn load_image(board: &BoardArgs) -> Result<RgbImage> {
    vision::load_board_image(&board.image)
        .with_context(|| format!("reading {}", board.image.display()))
}

fn build_advisor(board: &BoardArgs, seed: Option<u64>) -> Advisor {
    let recognizer =
        BoardRecognizer::with_models(board.color_model.as_deref(), board.piece_model.as_deref());
    let hints = match seed {
        Some(seed) => HintGenerator::with_seed(seed),
        None => HintGenerator::new(),
    };
    Advisor::new(recognizer, hints)
}

fn report_for<'a>(board: &BoardArgs, fen: &'a str, recognition: &RecognizedBoard) -> Report<'a> {
    Report {
        fen,
        side: side_name(board.side),
        white_pieces: recognition.inventory(Color::White),
        black_pieces: recognition.inventory(Color::Black),
        degraded_labels: recognition.degraded_labels,
        depth: None,
        best_move: None,
        value: None,
        hint: None,
        saved: None,
    }
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!("White pieces: {}", report.white_pieces.join(", "));
    println!("Black pieces: {}", report.black_pieces.join(", "));
    println!(
        "Detected pieces: {}",
        report.white_pieces.len() + report.black_pieces.len()
    );
    println!("FEN: {}", report.fen);
    if report.degraded_labels > 0 {
        println!("Degraded labels: {}", report.degraded_labels);
    }
    if let Some(best_move) = &report.best_move {
        println!("Best move: {best_move}");
    }
    if let Some(value) = report.value {
        println!("Value: {value:.2}");
    }
    if let Some(hint) = report.hint {
        println!("Hint: {hint}");
    }
    if let Some(saved) = &report.saved {
        println!("Saved: {saved}");
    }
    Ok(())
}

fn dump_thumbnails(recognition: &RecognizedBoard, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for piece in &recognition.pieces {
        let path = dir.join(format!("{}.png", piece.square));
        piece
            .thumbnail
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
