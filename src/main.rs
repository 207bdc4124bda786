//! book-pager - paginate a post body for a phone-sized viewport

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use book_pager::{paginate_markup, Book, BookConfig, Viewport};

#[derive(Parser)]
#[command(name = "book-pager")]
#[command(version, about = "Paginate post markup into viewport-sized sheets", long_about = None)]
#[command(after_help = "EXAMPLES:
    book-pager post.html                   Summarize sheets at 390x844
    book-pager -W 360 -H 640 post.html     Paginate for a smaller phone
    book-pager --html post.html            Print the book markup")]
struct Cli {
    /// Post body markup file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Viewport width in pixels
    #[arg(short = 'W', long, default_value_t = 390.0)]
    width: f32,

    /// Viewport height in pixels
    #[arg(short = 'H', long, default_value_t = 844.0)]
    height: f32,

    /// Content container width (defaults to the viewport width)
    #[arg(long)]
    container_width: Option<f32>,

    /// Height of fixed chrome above the content
    #[arg(long, default_value_t = 0.0)]
    header_height: f32,

    /// JSON config file
    #[arg(short, long)]
    config: Option<String>,

    /// Print a JSON report
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Print the book markup
    #[arg(long)]
    html: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    source: String,
    pages: Vec<PageReport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageReport {
    index: usize,
    nodes: usize,
    overflow: bool,
    text: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            BookConfig::from_json(&json).map_err(|e| e.to_string())?
        }
        None => BookConfig::default(),
    };
    let markup = std::fs::read_to_string(&cli.input).map_err(|e| format!("{}: {e}", cli.input))?;

    let viewport = Viewport::new(cli.width, cli.height)
        .with_container_width(cli.container_width.unwrap_or(cli.width))
        .with_header_height(cli.header_height);

    let Some(book) =
        paginate_markup(&cli.input, &markup, &viewport, &config).map_err(|e| e.to_string())?
    else {
        println!(
            "Book mode off: viewport {}px is wider than {}px or content is blank",
            cli.width, config.max_viewport_width
        );
        return Ok(());
    };

    if cli.html {
        println!("{}", book.to_markup());
    } else if cli.json {
        let report = report(&cli.input, &book);
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&cli.input, &book);
    }
    Ok(())
}

fn report(source: &str, book: &Book) -> Report {
    Report {
        source: source.to_string(),
        pages: book
            .sheets()
            .iter()
            .enumerate()
            .map(|(index, sheet)| PageReport {
                index,
                nodes: sheet.nodes.len(),
                overflow: sheet.overflow,
                text: preview(&sheet.nodes),
            })
            .collect(),
    }
}

fn print_summary(source: &str, book: &Book) {
    println!("File: {source}");
    println!("Sheets: {}", book.page_count());
    for (index, sheet) in book.sheets().iter().enumerate() {
        let flag = if sheet.overflow { " [overflow]" } else { "" };
        println!(
            "  {:>3}: {} blocks{flag}  {}",
            index + 1,
            sheet.nodes.len(),
            preview(&sheet.nodes)
        );
    }
}

fn preview(nodes: &[book_pager::ContentNode]) -> String {
    let text: String = nodes
        .iter()
        .map(|n| n.text_content())
        .collect::<Vec<_>>()
        .join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > 60 {
        format!("{}...", text.chars().take(60).collect::<String>())
    } else {
        text
    }
}
