use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;

use ihm_cli::cli::build_cli;
use ihm_cli::measure::input::MeasureRunConfig;
use ihm_cli::measure::run::run_measures;
use ihm_measures::HardnessConfig;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("IHM_LOG", "error,ihm=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("measure", sub_m)) => handle_measure(sub_m),
        Some(("config", _)) => {
            println!("{}", serde_json::to_string_pretty(&HardnessConfig::default())?);
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_measure(matches: &ArgMatches) -> Result<()> {
    let config = MeasureRunConfig::from_arguments(matches)?;
    log::info!("[IHM::Measure] Reading instances from {:?}", config.input);

    match run_measures(&config) {
        Ok(table) => {
            eprintln!(
                "[IHM::Measure] Wrote {} column(s) for {} instances to {:?}",
                table.columns.len(),
                table.n_rows(),
                config.output_file
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Measure computation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
