use std::path::PathBuf;

use clap::Parser;
use panel_nesting::config::{CuttingConfig, SheetCatalog};
use panel_nesting::input::{read_json, read_pieces_csv};
use panel_nesting::optimizer::Optimizer;
use panel_nesting::render;
use panel_nesting::report::cut_list_csv;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_nesting",
    about = "Shelf/guillotine cutting plan for panel pieces grouped by material"
)]
struct Cli {
    /// Piece list CSV (piece_id,material_id,w_mm,h_mm,qty,rotate,banding,notes)
    #[arg(long)]
    pieces: PathBuf,

    /// Cutting configuration JSON (sheet size, kerf, minimum offcut, materials)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Material catalog JSON with per-material sheet_mm overrides
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Project identifier written into the report
    #[arg(long)]
    project: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the per-placement cut list CSV here
    #[arg(long)]
    cutlist: Option<PathBuf>,

    /// Show ASCII layout of each sheet on stderr
    #[arg(long)]
    layout: bool,
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let requirements = read_pieces_csv(&cli.pieces).unwrap_or_else(|e| fail(e));
    let config: CuttingConfig = match &cli.config {
        Some(path) => read_json(path).unwrap_or_else(|e| fail(e)),
        None => CuttingConfig::default(),
    };
    let catalog: SheetCatalog = match &cli.catalog {
        Some(path) => read_json(path).unwrap_or_else(|e| fail(e)),
        None => SheetCatalog::default(),
    };

    let optimizer = Optimizer::new(config, catalog);
    let plan = optimizer
        .optimize(cli.project.clone(), &requirements)
        .unwrap_or_else(|e| fail(e));

    if cli.layout {
        for m in &plan.materials {
            for sheet in &m.sheets {
                eprintln!("{} sheet {} ({}):", m.material_id, sheet.index, m.stock);
                eprint!("{}", render::render_sheet(m.stock, sheet));
                eprintln!();
            }
        }
    }

    let json = serde_json::to_string_pretty(&plan.report()).unwrap_or_else(|e| fail(e));
    match &cli.out {
        Some(path) => std::fs::write(path, json + "\n").unwrap_or_else(|e| fail(e)),
        None => println!("{}", json),
    }

    if let Some(path) = &cli.cutlist {
        std::fs::write(path, cut_list_csv(&plan.cut_list())).unwrap_or_else(|e| fail(e));
    }

    eprintln!(
        "Summary: {} sheet{} used across {} material{}",
        plan.sheet_count(),
        if plan.sheet_count() == 1 { "" } else { "s" },
        plan.materials.len(),
        if plan.materials.len() == 1 { "" } else { "s" },
    );
}
