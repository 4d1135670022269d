use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dataset::{build_table, load, LoaderConfig};
use query_api::{query, region_1_options, region_2_options, DashboardContext};
use shared::{
    domain::{Metric, RegionSelector, Selection},
    protocol::RegionOption,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    #[arg(long, default_value = "Google Movements GB.csv")]
    cache_file: String,
    #[arg(long, default_value = "regions_csv.csv")]
    mapping_file: String,
    #[arg(
        long,
        default_value = "https://www.gstatic.com/covid19/mobility/Global_Mobility_Report.csv"
    )]
    source_url: String,
    #[arg(long, default_value = "GB")]
    country_code: String,
    #[arg(long, default_value = "United Kingdom")]
    country_name: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the source table and rewrite the country cache.
    Refresh,
    /// List first-level regions, or the sub-regions of `--region-1`.
    Regions {
        #[arg(long)]
        region_1: Option<String>,
    },
    /// Print the six series for a selection as CSV.
    Series {
        #[arg(long)]
        region_1: Option<String>,
        #[arg(long)]
        region_2: Option<String>,
        #[arg(long)]
        no_rolling: bool,
    },
}

impl Cli {
    fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            cache_path: self.data_dir.join(&self.cache_file),
            mapping_path: self.data_dir.join(&self.mapping_file),
            source_url: self.source_url.clone(),
            country_code: self.country_code.clone(),
        }
    }
}

fn print_options(options: &[RegionOption]) {
    for option in options {
        println!("{}", option.label);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let loader = cli.loader_config();

    match cli.command {
        Command::Refresh => {
            let observations = load(&loader, true).await?;
            println!(
                "wrote {} rows to {}",
                observations.len(),
                loader.cache_path.display()
            );
        }
        Command::Regions { region_1 } => {
            let table = build_table(&loader, false).await?;
            let ctx = DashboardContext::new(table, cli.country_name);
            match region_1 {
                None => print_options(&region_1_options(&ctx)),
                Some(name) => {
                    print_options(&region_2_options(&ctx, &RegionSelector::from(Some(name))))
                }
            }
        }
        Command::Series {
            region_1,
            region_2,
            no_rolling,
        } => {
            let table = build_table(&loader, false).await?;
            let ctx = DashboardContext::new(table, cli.country_name);
            let selection = Selection {
                region_1: RegionSelector::from(region_1),
                region_2: RegionSelector::from(region_2),
                rolling_average: !no_rolling,
            };
            let result = query(&ctx, &selection);
            eprintln!("{}", result.title);

            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            let mut header = vec!["date"];
            header.extend(Metric::ALL.iter().map(|metric| metric.label()));
            writer.write_record(&header)?;

            let rows = result.series.first().map_or(0, |series| series.len());
            for index in 0..rows {
                let mut record = vec![result.series[0].points[index].date.to_string()];
                record.extend(result.series.iter().map(|series| {
                    series.points[index]
                        .value
                        .map(|value| value.to_string())
                        .unwrap_or_default()
                }));
                writer.write_record(&record)?;
            }
            writer.flush().context("failed to write series")?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
