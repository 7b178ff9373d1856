use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Combined FishBase/SeaLifeBase CSV export.
    input: PathBuf,

    #[arg(short, long, default_value = "../bank.bin")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    process::load_species(&args.input, &args.output)?;

    Ok(())
}
