use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

/// Argument definitions for the `ihm` binary.
pub fn build_cli() -> Command {
    Command::new("ihm")
        .version(clap::crate_version!())
        .about("Instance hardness measures for labelled tabular data")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("measure")
                .about("Compute hardness measures for every instance of a CSV/TSV table")
                .arg(
                    Arg::new("input")
                        .help("Path to the input table (*.csv or *.tsv)")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("label")
                        .short('l')
                        .long("label")
                        .help("Name of the label column. Defaults to the last column.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("measures")
                        .short('m')
                        .long("measures")
                        .help(
                            "Comma-separated measures to compute (kDN, N2, CLD, DCP, TD_P, TD_U). \
                             Overrides the measures in the configuration file.",
                        )
                        .value_delimiter(',')
                        .num_args(1)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("k")
                        .short('k')
                        .long("neighbors")
                        .help("Neighborhood size for kDN.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("metric")
                        .long("metric")
                        .help("Distance metric for the neighbor measures.")
                        .value_parser(["gower", "euclidean", "manhattan", "chebyshev"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to a JSON configuration file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path of the CSV output. Defaults to <input>_hardness.csv.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for cross-validation shuffling.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("no_parallel")
                        .long("no-parallel")
                        .help("Run leave-one-out folds on a single thread.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no_index")
                        .long("no-index")
                        .help("Omit the leading instance column from the output.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config").about("Print the default configuration as JSON"),
        )
}
