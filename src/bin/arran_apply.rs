use std::env;

use anyhow::Context;
use log::info;

use arran::normalize::apply_deltas;
use arran::source::{
    read_delta_spec_from_path, read_weight_table_from_path, write_weight_table_to_path,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() != 4 {
        anyhow::bail!("Usage: arran_apply [strategy_csv] [deltas_json] [output_csv]");
    }

    let table = read_weight_table_from_path(&args[1])
        .with_context(|| format!("Failed to read strategy table from {}", args[1]))?;
    let deltas = read_delta_spec_from_path(&args[2])
        .with_context(|| format!("Failed to read delta spec from {}", args[2]))?;

    let tilted = apply_deltas(&table, &deltas)?;

    write_weight_table_to_path(&args[3], &tilted)
        .with_context(|| format!("Failed to write output table to {}", args[3]))?;

    info!(
        "Tilted {} rows across {} instruments into {}",
        tilted.rows().len(),
        tilted.instruments().len(),
        args[3]
    );
    Ok(())
}
