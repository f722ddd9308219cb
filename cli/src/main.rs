use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Term;
use log::{debug, info};
use sealang_core::error::{CompileError, ErrorKind};
use sealang_core::reports::ReportCollector;
use sealang_core::{Compiler, CompilerConfig, SeaErrorExt, script::Script};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod output;

use output::{FileOutcome, FormatStyle};

fn main() {
    let cli = Command::new("sealang")
        .version("0.1.0")
        .about("Compile typed sealang sources to Perl 5");

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    std::process::exit(dispatch_commands(&matches));
}

fn input_arg() -> Arg {
    Arg::new("files")
        .help("Source files or glob patterns")
        .required(true)
        .num_args(1..)
        .value_parser(clap::value_parser!(String))
        .value_name("FILES")
}

fn common_args(cmd: Command) -> Command {
    cmd.arg(input_arg())
        .arg(
            Arg::new("config")
                .help("Use this sealang.json instead of looking next to each file")
                .short('c')
                .long("config")
                .value_parser(clap::value_parser!(PathBuf))
                .value_name("FILE"),
        )
        .arg(
            Arg::new("module")
                .help("Compile as a module (allows `package`, ends with `1;`)")
                .long("module")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("message-format")
                .help("How diagnostics are printed")
                .long("message-format")
                .value_parser(["human", "json"])
                .default_value("human")
                .value_name("FORMAT"),
        )
        .arg(
            Arg::new("verbose")
                .help("Increase logging (-v info, -vv debug)")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count),
        )
}

/// Sets up the CLI with its subcommands and arguments.
fn setup_cli(cli: Command) -> Command {
    cli.subcommand_required(true)
        .subcommand(
            common_args(Command::new("build").about("Compile and write the output files"))
                .arg(
                    Arg::new("output")
                        .help("Directory receiving the generated files")
                        .short('o')
                        .long("output")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("dump")
                        .help("Print an intermediate stage to stdout")
                        .short('d')
                        .long("dump")
                        .value_parser(["ir", "text"])
                        .value_name("STAGE"),
                ),
        )
        .subcommand(common_args(
            Command::new("check").about("Compile without writing anything"),
        ))
}

/// Dispatches the subcommand and returns the process exit code.
fn dispatch_commands(matches: &ArgMatches) -> i32 {
    match matches.subcommand() {
        Some(("build", sub_m)) => run(sub_m, true),
        Some(("check", sub_m)) => run(sub_m, false),
        _ => {
            eprintln!("No valid subcommand was used. Use --help for more information.");
            2
        }
    }
}

struct Options {
    config: Option<CompilerConfig>,
    module: bool,
    output: Option<PathBuf>,
    dump: Option<String>,
    write: bool,
}

fn run(matches: &ArgMatches, write: bool) -> i32 {
    output::init_logger(matches.get_count("verbose"));
    let json = matches
        .get_one::<String>("message-format")
        .is_some_and(|f| f == "json");
    let styles = FormatStyle::default();
    let mut collector = ReportCollector::new();

    let patterns: Vec<String> = matches
        .get_many::<String>("files")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();

    let explicit_config = match matches.get_one::<PathBuf>("config") {
        Some(path) => match CompilerConfig::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                collector.push_error(&e);
                return finish(&collector, &[], &HashMap::new(), json, &styles);
            }
        },
        None => None,
    };
    let options = Options {
        config: explicit_config,
        module: matches.get_flag("module"),
        output: matches.try_get_one::<PathBuf>("output").ok().flatten().cloned(),
        dump: matches.try_get_one::<String>("dump").ok().flatten().cloned(),
        write,
    };

    let inputs = match expand_inputs(&patterns) {
        Ok(inputs) => inputs,
        Err(e) => {
            collector.push_error(&e);
            return finish(&collector, &[], &HashMap::new(), json, &styles);
        }
    };

    let pb = output::progress_bar(inputs.len(), !json && Term::stderr().is_term());
    let mut outcomes = Vec::with_capacity(inputs.len());
    let mut sources = HashMap::new();
    for path in inputs {
        pb.set_message(path.display().to_string());
        let script = match Script::new(path.clone()) {
            Ok(script) => script,
            Err(e) => {
                collector.push_error(e.as_ref());
                outcomes.push(FileOutcome {
                    input: path.display().to_string(),
                    output: None,
                    lines: 0,
                    ok: false,
                });
                pb.inc(1);
                continue;
            }
        };
        let result = compile_one(&script, &options);
        let lines = script.lines().count();
        match result {
            Ok(written) => outcomes.push(FileOutcome {
                input: path.display().to_string(),
                output: written.map(|p| p.display().to_string()),
                lines,
                ok: true,
            }),
            Err(e) => {
                collector.push_error(e.as_ref());
                outcomes.push(FileOutcome {
                    input: path.display().to_string(),
                    output: None,
                    lines,
                    ok: false,
                });
            }
        }
        sources.insert(script.name.clone(), script.content);
        pb.inc(1);
    }
    pb.finish_and_clear();

    finish(&collector, &outcomes, &sources, json, &styles)
}

/// Compile one script; returns the written path when writing.
fn compile_one(script: &Script, options: &Options) -> Result<Option<PathBuf>, Box<dyn SeaErrorExt>> {
    let script_dir = script
        .path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = match &options.config {
        Some(config) => config.clone(),
        None => CompilerConfig::discover(&script_dir)?.unwrap_or_default(),
    };
    if options.module {
        config.module = true;
    }
    debug!("config for {}: {:?}", script.name, config);

    let compiler = Compiler::new(config);
    let compilation = compiler.compile(script)?;

    match options.dump.as_deref() {
        Some("ir") => println!("{}", compilation.dump_ir()),
        Some("text") => println!("{}", compilation.text()?),
        _ => {}
    }

    if !options.write {
        return Ok(None);
    }
    let out_dir = options
        .output
        .clone()
        .or_else(|| compiler.config().output_dir.clone())
        .unwrap_or(script_dir);
    let written = compilation.write(&out_dir, &compiler.config().extension)?;
    info!("{} -> {}", script.name, written.display());
    Ok(Some(written))
}

fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand glob patterns; plain paths pass through untouched.
fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>, CompileError> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        if !has_glob_chars(pattern) {
            inputs.push(PathBuf::from(pattern));
            continue;
        }
        let entries = glob::glob(pattern).map_err(|e| {
            CompileError::new(
                ErrorKind::Io,
                format!("Invalid glob pattern '{}': {}", pattern, e),
                "sealang.cli.inputs",
            )
        })?;
        let before = inputs.len();
        for entry in entries.flatten() {
            if entry.is_file() {
                inputs.push(entry);
            }
        }
        if inputs.len() == before {
            return Err(CompileError::new(
                ErrorKind::Io,
                format!("No input matches '{}'", pattern),
                "sealang.cli.inputs",
            ));
        }
    }
    Ok(inputs)
}

fn finish(
    collector: &ReportCollector,
    outcomes: &[FileOutcome],
    sources: &HashMap<String, String>,
    json: bool,
    styles: &FormatStyle,
) -> i32 {
    if json {
        let doc = serde_json::json!({
            "files": outcomes,
            "reports": collector.reports,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("failed to serialize diagnostics: {}", e),
        }
        return collector.exit_code();
    }

    for report in &collector.reports {
        let source = report
            .location
            .as_ref()
            .and_then(|l| sources.get(&l.file))
            .map(String::as_str)
            .unwrap_or("");
        eprint!("{}", report.pretty_with_source(source));
    }

    if !outcomes.is_empty() {
        println!("{}", styles.title.apply_to("Summary"));
        println!("{}", output::summary_table(outcomes));
    }
    let failed = outcomes.iter().filter(|o| !o.ok).count();
    if collector.has_errors() {
        eprintln!(
            "{}",
            styles
                .error
                .apply_to(format!("{} of {} file(s) failed", failed.max(1), outcomes.len()))
        );
    } else {
        println!(
            "{}",
            styles
                .success
                .apply_to(format!("{} file(s) compiled", outcomes.len()))
        );
    }
    collector.exit_code()
}
