use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ancestra::{analyze_categorical, analyze_continuous, Binning, Reconstruction};

#[derive(Parser, Debug)]
#[command(
    name = "ancestra",
    about = "Ancestral state reconstruction under generalized (Sankoff) parsimony"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconstruct a categorical character.
    Categorical {
        /// Newick format phylogeny.
        #[arg(long)]
        tree: PathBuf,
        /// Character state data: `tip_label,state_label` per line.
        #[arg(long)]
        chars: PathBuf,
        /// Optional transition costs: `from,to,cost` per line
        /// (default: unit-cost model).
        #[arg(long)]
        costs: Option<PathBuf>,
    },
    /// Reconstruct a continuous character discretized into bins.
    Continuous {
        /// Newick format phylogeny.
        #[arg(long)]
        tree: PathBuf,
        /// Character data: `tip_label,value` per line.
        #[arg(long)]
        chars: PathBuf,
        /// Number of equal-width bins when no breakpoints are given.
        #[arg(long, default_value_t = 4)]
        bins: usize,
        /// Optional breakpoints file, one real per line.
        #[arg(long)]
        breaks: Option<PathBuf>,
        /// Asymmetry parameter scaling increases of the trait value.
        #[arg(long, default_value_t = 1.0)]
        asymmetry: f64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let reconstruction = match cli.command {
        Commands::Categorical { tree, chars, costs } => run_categorical(tree, chars, costs)?,
        Commands::Continuous {
            tree,
            chars,
            bins,
            breaks,
            asymmetry,
        } => run_continuous(tree, chars, bins, breaks, asymmetry)?,
    };
    print_reconstruction(&reconstruction);
    Ok(())
}

fn run_categorical(
    tree_path: PathBuf,
    chars_path: PathBuf,
    costs_path: Option<PathBuf>,
) -> Result<Reconstruction> {
    let description = read_to_string(&tree_path)?;
    let rows = read_categorical_rows(&chars_path)?;
    let costs = costs_path.map(|path| read_cost_entries(&path)).transpose()?;
    analyze_categorical(&description, &rows, costs.as_deref())
        .context("categorical analysis failed")
}

fn run_continuous(
    tree_path: PathBuf,
    chars_path: PathBuf,
    bins: usize,
    breaks_path: Option<PathBuf>,
    asymmetry: f64,
) -> Result<Reconstruction> {
    let description = read_to_string(&tree_path)?;
    let rows = read_continuous_rows(&chars_path)?;
    let binning = match breaks_path {
        Some(path) => Binning::Breakpoints(read_breakpoints(&path)?),
        None => Binning::EqualWidth(bins),
    };
    analyze_continuous(&description, &rows, &binning, asymmetry)
        .context("continuous analysis failed")
}

fn print_reconstruction(reconstruction: &Reconstruction) {
    let labels: Vec<&str> = reconstruction
        .states
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    println!("states: {}", labels.join(", "));
    println!("parsimony score: {}", reconstruction.score);
    for node in &reconstruction.nodes {
        let name = if node.label.is_empty() {
            format!("node {}", node.node_id)
        } else {
            format!("node {} ({})", node.node_id, node.label)
        };
        println!(
            "{}: downpass [{}] final [{}]",
            name,
            format_vector(&node.downpass),
            format_vector(&node.uppass)
        );
    }
}

fn format_vector(vector: &[f64]) -> String {
    vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_to_string(path: &Path) -> Result<String> {
    let mut text = String::new();
    File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text)
}

fn read_categorical_rows(path: &Path) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();
    for (line_no, line) in read_lines(path)?.into_iter().enumerate() {
        let (tip, state) = split_two(&line)
            .with_context(|| format!("{}:{}: expected `tip,state`", path.display(), line_no + 1))?;
        rows.push((tip.to_string(), state.to_string()));
    }
    Ok(rows)
}

fn read_continuous_rows(path: &Path) -> Result<Vec<(String, f64)>> {
    let mut rows = Vec::new();
    for (line_no, line) in read_lines(path)?.into_iter().enumerate() {
        let (tip, value) = split_two(&line)
            .with_context(|| format!("{}:{}: expected `tip,value`", path.display(), line_no + 1))?;
        let value: f64 = value.trim().parse().with_context(|| {
            format!("{}:{}: invalid value {:?}", path.display(), line_no + 1, value)
        })?;
        rows.push((tip.to_string(), value));
    }
    Ok(rows)
}

fn read_cost_entries(path: &Path) -> Result<Vec<(String, String, f64)>> {
    let mut entries = Vec::new();
    for (line_no, line) in read_lines(path)?.into_iter().enumerate() {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 3 {
            bail!(
                "{}:{}: expected `from,to,cost`",
                path.display(),
                line_no + 1
            );
        }
        let cost: f64 = fields[2].trim().parse().with_context(|| {
            format!(
                "{}:{}: invalid cost {:?}",
                path.display(),
                line_no + 1,
                fields[2]
            )
        })?;
        entries.push((fields[0].trim().to_string(), fields[1].trim().to_string(), cost));
    }
    Ok(entries)
}

fn read_breakpoints(path: &Path) -> Result<Vec<f64>> {
    let mut breaks = Vec::new();
    for (line_no, line) in read_lines(path)?.into_iter().enumerate() {
        let value: f64 = line.trim().parse().with_context(|| {
            format!(
                "{}:{}: invalid breakpoint {:?}",
                path.display(),
                line_no + 1,
                line
            )
        })?;
        breaks.push(value);
    }
    Ok(breaks)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
    );
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line.trim().to_string());
        }
    }
    Ok(lines)
}

fn split_two(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.splitn(2, ',');
    let first = fields.next()?.trim();
    let second = fields.next()?.trim();
    Some((first, second))
}
