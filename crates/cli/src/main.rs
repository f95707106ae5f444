use std::path::Path;
use std::sync::Arc;
use std::{fs, process};

use chrono::Local;
use clap::Parser;
use dbbench_cli::{App, CheckArgs, Command, ExecArgs, TargetReport, TranslateArgs};
use dbbench_core::{
    BenchContext, ConfigErrorKind, DatabaseTarget, Properties, TraceSink, Translator,
};
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    match &app.command {
        Command::Check(args) => check(args),
        Command::Translate(args) => translate(args),
        Command::Exec(args) => exec(args),
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {e}", path.display());
        process::exit(1);
    })
}

fn load_properties(path: &Path) -> Properties {
    dbbench_parser::parse_properties(&read(path)).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {e}", path.display());
        process::exit(1);
    })
}

fn check(args: &CheckArgs) {
    let registry = dbbench_drivers::default_registry();
    let context = BenchContext::new(Arc::new(TraceSink::discard()));
    let targets = dbbench_parser::parse_targets(&context, &registry, &read(&args.config));

    let mut resolved = 0;
    let mut unknown_driver = false;
    for (line, target) in &targets {
        match target {
            Ok(db) => {
                resolved += 1;
                println!("line {line}: ok {} ({})", db.name(), db.url());
            }
            Err(e) => {
                unknown_driver |= matches!(e.kind, ConfigErrorKind::UnknownDriver(_));
                println!("line {line}: {e}");
            }
        }
    }
    if unknown_driver {
        println!("known drivers: {}", dbbench_cli::known_drivers(&registry));
    }

    if resolved == 0 {
        eprintln!("No database in {} could be loaded", args.config.display());
        process::exit(1);
    }
}

fn translate(args: &TranslateArgs) {
    let properties = load_properties(&args.properties);
    let translator = Translator::for_url(&args.url, &properties);
    println!("{}", translator.translate(&args.sql));
}

fn exec(args: &ExecArgs) {
    let statements = dbbench_parser::parse_script(&read(&args.script)).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {e}", args.script.display());
        process::exit(1);
    });
    let properties = args
        .properties
        .as_deref()
        .map(load_properties)
        .unwrap_or_default();

    let sink = args
        .trace_file
        .as_ref()
        .map_or_else(TraceSink::stdout, TraceSink::file)
        .verbose(args.verbose);
    let context = BenchContext::new(Arc::new(sink));
    let registry = dbbench_drivers::default_registry();

    let mut targets: Vec<DatabaseTarget> =
        dbbench_parser::parse_targets(&context, &registry, &read(&args.config))
            .into_iter()
            .filter_map(|(line, target)| {
                target
                    .inspect_err(|e| eprintln!("line {line}: {e}"))
                    .ok()
            })
            .collect();
    if targets.is_empty() {
        eprintln!("No database in {} could be loaded", args.config.display());
        process::exit(1);
    }
    for db in &mut targets {
        db.set_translations(&properties);
    }

    context.set_collect(args.collect);
    let mut reports: Vec<TargetReport> = targets
        .par_iter_mut()
        .map(|db| {
            let started = Local::now();
            let outcome = dbbench_cli::run_script(db, &statements);
            TargetReport::new(db, started, outcome)
        })
        .collect();
    reports.sort_by_key(|report| report.id);

    let mut any_failed = false;
    for report in &reports {
        any_failed |= report.error.is_some();
        if args.json {
            let line = serde_json::to_string(report).unwrap_or_else(|e| {
                eprintln!("Failed to serialize report for {}: {e}", report.name);
                process::exit(1);
            });
            println!("{line}");
        } else {
            print_report(report);
        }
    }

    if any_failed {
        process::exit(1);
    }
}

fn print_report(report: &TargetReport) {
    match &report.error {
        Some(error) => println!("{}: FAIL ({error})", report.name),
        None => println!(
            "{}: {} statements, {} ms",
            report.name, report.executed_statements, report.total_ms
        ),
    }
    for sample in &report.samples {
        println!("  {}: {} {}", sample.action, sample.value, sample.unit);
    }
}
