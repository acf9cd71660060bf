//! CLI tool for vgrid - virtualizes a JSON table headlessly and prints the
//! materialized window as JSON
//!
//! Usage:
//!   vgrid_cli <rows.json>                          # 800x600 viewport at 0,0
//!   vgrid_cli <rows.json> --size 640x480 --scroll 0,2800
//!   vgrid_cli <rows.json> --config grid.json --edit 3,B=42
//!
//! Set `RUST_LOG=vgrid=debug` to trace virtualization passes and edits.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vgrid::{shared, ArrayDataSource, CellValue, CommitOutcome, Grid, GridConfig, MemorySurface};

const USAGE: &str = "Usage: vgrid_cli <rows.json> [--config grid.json] [--size WxH] [--scroll X,Y] [--edit ROW,COL=VALUE]";

#[derive(Serialize)]
struct Output {
    rows: usize,
    columns: Vec<String>,
    content_size: (f64, f64),
    window: Option<WindowOut>,
    cells: Vec<CellOut>,
    changes: Vec<vgrid::CellChange>,
}

#[derive(Serialize)]
struct WindowOut {
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
}

#[derive(Serialize)]
struct CellOut {
    row: usize,
    column: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    text: String,
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn parse_pair(s: &str, sep: char) -> Option<(f64, f64)> {
    let (a, b) = s.split_once(sep)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn parse_edit(s: &str) -> Option<(usize, String, String)> {
    let (cell, value) = s.split_once('=')?;
    let (row, col) = cell.split_once(',')?;
    Some((row.trim().parse().ok()?, col.trim().to_string(), value.to_string()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        fail(USAGE);
    }

    let input_path = &args[1];
    let mut config = GridConfig::default();
    let mut size = (800.0, 600.0);
    let mut scroll = (0.0, 0.0);
    let mut edits: Vec<(usize, String, String)> = Vec::new();

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        let Some(value) = args.get(i + 1) else {
            fail(USAGE);
        };
        match flag {
            "--config" => {
                let text = fs::read_to_string(value)
                    .unwrap_or_else(|e| fail(&format!("Error reading {value}: {e}")));
                config = GridConfig::from_json(&text)
                    .unwrap_or_else(|e| fail(&format!("Error in {value}: {e}")));
            }
            "--size" => {
                size = parse_pair(value, 'x').unwrap_or_else(|| fail("--size expects WxH"));
            }
            "--scroll" => {
                scroll = parse_pair(value, ',').unwrap_or_else(|| fail("--scroll expects X,Y"));
            }
            "--edit" => {
                edits.push(
                    parse_edit(value).unwrap_or_else(|| fail("--edit expects ROW,COL=VALUE")),
                );
            }
            _ => fail(USAGE),
        }
        i += 2;
    }

    let json = fs::read_to_string(input_path)
        .unwrap_or_else(|e| fail(&format!("Error reading {input_path}: {e}")));
    let source = ArrayDataSource::from_json(&json, None)
        .unwrap_or_else(|e| fail(&format!("Error parsing rows: {e}")));
    let source = shared(source);

    let mut grid = Grid::new(source, config, MemorySurface::new())
        .unwrap_or_else(|e| fail(&format!("Error creating grid: {e}")));

    let changes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    {
        let changes = std::rc::Rc::clone(&changes);
        grid.subscribe(move |change| {
            changes.borrow_mut().push(change.clone());
            Ok(())
        });
    }

    grid.observe_size(size.0, size.1).unwrap();
    grid.scroll_to(scroll.0, scroll.1).unwrap();

    for (row, column, text) in edits {
        let begun = grid
            .begin_edit(row, &column)
            .unwrap_or_else(|e| fail(&format!("Error editing {row},{column}: {e}")));
        if begun.status != vgrid::EditStatus::Started {
            eprintln!("Skipped edit {row},{column}: {:?}", begun.status);
            continue;
        }
        grid.update_draft(CellValue::parse_input(&text)).unwrap();
        match grid.commit_edit().unwrap() {
            CommitOutcome::Reverted { reason, .. } => {
                eprintln!("Edit {row},{column} reverted: {reason}");
            }
            outcome => tracing::debug!(?outcome, "edit applied"),
        }
    }

    let surface = grid.surface();
    let cells = surface
        .coords()
        .filter_map(|(row, column)| {
            let cell = surface.cell(row, column)?;
            Some(CellOut {
                row,
                column: column.to_string(),
                x: cell.rect.x,
                y: cell.rect.y,
                width: cell.rect.width,
                height: cell.rect.height,
                text: cell.text.clone(),
            })
        })
        .collect();

    let output = Output {
        rows: grid.layout().row_count(),
        columns: grid.columns().keys().map(str::to_string).collect(),
        content_size: surface.content_size(),
        window: grid.window().map(|w| WindowOut {
            first_row: w.rows.first,
            last_row: w.rows.last,
            first_col: w.cols.first,
            last_col: w.cols.last,
        }),
        cells,
        changes: changes.borrow().clone(),
    };

    let json = serde_json::to_string_pretty(&output)
        .unwrap_or_else(|e| fail(&format!("Error serializing JSON: {e}")));
    io::stdout().write_all(json.as_bytes()).unwrap();
    println!();
}
