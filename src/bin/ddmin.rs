//! The `ddmin` executable.

#![deny(missing_docs)]

extern crate clap;
extern crate ddmin;
extern crate regex;

use ddmin::config::{Config, Granularity, InnerReducer};
use ddmin::counters::CompletionStatus;
use ddmin::error;
use ddmin::logger::Logger;
use ddmin::model::{ByteModel, InputModel, LineModel, TokenModel};
use ddmin::oracle::Script;
use std::fs;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

fn main() {
    if let Err(e) = try_main() {
        let stderr = io::stderr();
        let mut stderr = stderr.lock();
        let _ = writeln!(&mut stderr, "Error: {}", e);
        process::exit(1);
    }
}

fn parse_args() -> clap::ArgMatches<'static> {
    clap::App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            clap::Arg::with_name("input")
                .required(true)
                .help("The initial failing input file to reduce.")
        )
        .arg(
            clap::Arg::with_name("oracle")
                .required(true)
                .help("The is-FAIL predicate script, invoked with the candidate's path.")
        )
        .arg(
            clap::Arg::with_name("reducer")
                .long("reducer")
                .takes_value(true)
                .possible_values(&["ddmin", "tictocmin", "hdd", "probdd"])
                .default_value("ddmin")
                .help("Which reducer to run.")
        )
        .arg(
            clap::Arg::with_name("granularity")
                .long("granularity")
                .takes_value(true)
                .possible_values(&["bytes", "lines", "custom"])
                .default_value("bytes")
                .requires_if("custom", "custom_separator")
                .help("The atom granularity to split the input into.")
        )
        .arg(
            clap::Arg::with_name("custom_separator")
                .long("custom-separator")
                .takes_value(true)
                .value_name("REGEX")
                .help("The regex separator for --granularity custom.")
        )
        .arg(
            clap::Arg::with_name("no_cache")
                .long("no-cache")
                .help("Disable the verdict cache.")
        )
        .arg(
            clap::Arg::with_name("cache_cap")
                .long("cache-cap")
                .takes_value(true)
                .value_name("N")
                .validator(|a| a.parse::<usize>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("Cap the verdict cache to N entries with LRU eviction. Unbounded by default.")
        )
        .arg(
            clap::Arg::with_name("time_budget")
                .long("time-budget")
                .takes_value(true)
                .value_name("SECONDS")
                .validator(|a| a.parse::<u64>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("Cancel the run after this many seconds, keeping the best result so far.")
        )
        .arg(
            clap::Arg::with_name("hdd_inner")
                .long("hdd-inner")
                .takes_value(true)
                .possible_values(&["ddmin", "tictocmin"])
                .default_value("ddmin")
                .help("Which sequence reducer HDD runs at each tree level.")
        )
        .arg(
            clap::Arg::with_name("probdd_tau")
                .long("probdd-tau")
                .takes_value(true)
                .value_name("TAU")
                .validator(|a| a.parse::<f64>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("ProbDD's joint-removal-probability threshold. Default 0.7.")
        )
        .arg(
            clap::Arg::with_name("probdd_epsilon")
                .long("probdd-epsilon")
                .takes_value(true)
                .value_name("EPSILON")
                .validator(|a| a.parse::<f64>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("ProbDD's pinning convergence threshold. Default 0.001.")
        )
        .arg(
            clap::Arg::with_name("probdd_stall_k")
                .long("probdd-stall-k")
                .takes_value(true)
                .value_name("N")
                .validator(|a| a.parse::<usize>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("ProbDD's consecutive no-progress iterations before giving up. Defaults to 2n.")
        )
        .arg(
            clap::Arg::with_name("oracle_timeout")
                .long("oracle-timeout")
                .takes_value(true)
                .value_name("SECONDS")
                .validator(|a| a.parse::<u64>().map(|_| ()).map_err(|e| format!("{}", e)))
                .help("Kill and score UNRESOLVED any single oracle invocation that outlives this.")
        )
        .get_matches()
}

fn build_config(args: &clap::ArgMatches) -> error::Result<Config> {
    let mut config = Config::default();

    config.granularity = match args.value_of("granularity").unwrap() {
        "bytes" => Granularity::Bytes,
        "lines" => Granularity::Lines,
        "custom" => {
            let sep = args.value_of("custom_separator")
                .ok_or_else(|| error::Error::ContractViolation(
                    "--granularity custom requires --custom-separator".to_string(),
                ))?;
            Granularity::Custom(sep.to_string())
        }
        _ => unreachable!(),
    };

    config.cache_enabled = !args.is_present("no_cache");
    if let Some(cap) = args.value_of("cache_cap") {
        config.cache_cap = Some(cap.parse().unwrap());
    }
    if let Some(secs) = args.value_of("time_budget") {
        config.time_budget = Some(Duration::from_secs(secs.parse().unwrap()));
    }

    config.hdd_inner_reducer = match args.value_of("hdd_inner").unwrap() {
        "ddmin" => InnerReducer::DdMin,
        "tictocmin" => InnerReducer::TicTocMin,
        _ => unreachable!(),
    };

    if let Some(tau) = args.value_of("probdd_tau") {
        config.probdd.tau = tau.parse().unwrap();
    }
    if let Some(epsilon) = args.value_of("probdd_epsilon") {
        config.probdd.epsilon = epsilon.parse().unwrap();
    }
    if let Some(k) = args.value_of("probdd_stall_k") {
        config.probdd.stall_k = Some(k.parse().unwrap());
    }

    Ok(config)
}

fn build_oracle(args: &clap::ArgMatches) -> Script {
    let program = args.value_of("oracle").unwrap();
    let mut script = Script::new(program);
    if let Some(secs) = args.value_of("oracle_timeout") {
        script = script.with_timeout(Duration::from_secs(secs.parse().unwrap()));
    }
    script
}

fn run_on_bytes(
    bytes: Vec<u8>,
    args: &clap::ArgMatches,
    config: &Config,
    logger: &Logger,
) -> error::Result<(Vec<u8>, ddmin::counters::Counters)> {
    let model = ByteModel::new(bytes);
    let mut oracle = build_oracle(args);
    let reducer = args.value_of("reducer").unwrap();
    let (result, counters) = match reducer {
        "ddmin" => ddmin::reducers::ddmin::reduce(&model, &mut oracle, logger, config)?,
        "tictocmin" => ddmin::reducers::tictocmin::reduce(&model, &mut oracle, logger, config)?,
        "probdd" => ddmin::reducers::probdd::reduce(&model, &mut oracle, logger, config)?,
        _ => unreachable!("hdd is dispatched separately; requires a tree input"),
    };
    Ok((model.materialize(&result), counters))
}

fn run_on_lines(
    text: &str,
    args: &clap::ArgMatches,
    config: &Config,
    logger: &Logger,
) -> error::Result<(String, ddmin::counters::Counters)> {
    let model = LineModel::new(text);
    let mut oracle = build_oracle(args);
    let reducer = args.value_of("reducer").unwrap();
    let (result, counters) = match reducer {
        "ddmin" => ddmin::reducers::ddmin::reduce(&model, &mut oracle, logger, config)?,
        "tictocmin" => ddmin::reducers::tictocmin::reduce(&model, &mut oracle, logger, config)?,
        "probdd" => ddmin::reducers::probdd::reduce(&model, &mut oracle, logger, config)?,
        _ => unreachable!("hdd is dispatched separately; requires a tree input"),
    };
    Ok((model.materialize(&result), counters))
}

fn run_on_tokens(
    text: &str,
    separator: &str,
    args: &clap::ArgMatches,
    config: &Config,
    logger: &Logger,
) -> error::Result<(String, ddmin::counters::Counters)> {
    let separator = regex::Regex::new(separator)
        .map_err(|e| error::Error::ContractViolation(format!("invalid --custom-separator: {}", e)))?;
    let model = TokenModel::new(text, &separator);
    let mut oracle = build_oracle(args);
    let reducer = args.value_of("reducer").unwrap();
    let (result, counters) = match reducer {
        "ddmin" => ddmin::reducers::ddmin::reduce(&model, &mut oracle, logger, config)?,
        "tictocmin" => ddmin::reducers::tictocmin::reduce(&model, &mut oracle, logger, config)?,
        "probdd" => ddmin::reducers::probdd::reduce(&model, &mut oracle, logger, config)?,
        _ => unreachable!("hdd is dispatched separately; requires a tree input"),
    };
    Ok((model.materialize(&result), counters))
}

fn try_main() -> error::Result<()> {
    let args = parse_args();
    let config = build_config(&args)?;
    let logger = Logger::spawn(io::stderr());

    let input_path = args.value_of("input").unwrap();
    let bytes = fs::read(input_path)?;

    if args.value_of("reducer").unwrap() == "hdd" {
        let stderr = io::stderr();
        let mut stderr = stderr.lock();
        let _ = writeln!(
            &mut stderr,
            "hdd has no file-based subject tree builder; use the library API directly."
        );
        process::exit(2);
    }

    let (result, counters) = match config.granularity {
        Granularity::Bytes => run_on_bytes(bytes, &args, &config, &logger)?,
        Granularity::Lines => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let (s, c) = run_on_lines(&text, &args, &config, &logger)?;
            (s.into_bytes(), c)
        }
        Granularity::Custom(ref sep) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let (s, c) = run_on_tokens(&text, sep, &args, &config, &logger)?;
            (s.into_bytes(), c)
        }
    };

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    stdout.write_all(&result)?;

    let stderr = io::stderr();
    let mut stderr = stderr.lock();
    let _ = writeln!(
        &mut stderr,
        "{} -> {} atoms, {} oracle queries, {} cache hits, {:?}",
        counters.initial_size,
        counters.final_size,
        counters.oracle_queries,
        counters.cache_hits,
        counters.status(),
    );

    // The best FAIL configuration found so far has already been written to
    // stdout above; surface the cancellation to the exit code only after
    // that, per §7's "only contract violations and cancellation propagate to
    // the caller".
    if counters.status() == CompletionStatus::Cancelled {
        return Err(error::Error::Cancelled);
    }

    Ok(())
}
