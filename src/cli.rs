use crate::compiler::compiler_errors::{CompileError, print_errors, print_formatted_error};
use crate::settings::{ProjectConfig, SPROUT_FILE_EXTENSION};
use crate::{Compiler, Flag, Strategy, file_output, timer_log};
use colour::{e_red_ln, green_ln_bold, grey_ln, red_ln};
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

enum Command {
    Build(PathBuf), // Compiles a file and writes the artifacts
    Check(PathBuf), // Compiles a file and reports diagnostics only
    Help,
}

pub fn start_cli() {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&compiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            red_ln!("{}", e);
            print_help(true);
            return;
        }
    };

    // Gather a list of any additional flags
    let flags = get_flags(&compiler_args);

    match command {
        Command::Help => {
            print_help(false);
        }

        Command::Build(path) => {
            build_file(&path, &flags, true);
        }

        Command::Check(path) => {
            build_file(&path, &flags, false);
        }
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") => Ok(Command::Help),

        Some("build") => match args.get(1) {
            Some(path) => Ok(Command::Build(PathBuf::from(path))),
            None => Err("'build' needs a path to a source file".to_string()),
        },

        Some("check") => match args.get(1) {
            Some(path) => Ok(Command::Check(PathBuf::from(path))),
            None => Err("'check' needs a path to a source file".to_string()),
        },

        Some(other) => Err(format!("Invalid command: '{other}'")),
        None => Err("No command given".to_string()),
    }
}

fn get_flags(args: &[String]) -> Vec<Flag> {
    let mut flags = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--resumable" => flags.push(Flag::Resumable),
            "--structured" => flags.push(Flag::Structured),
            "--wat-only" => flags.push(Flag::WatOnly),
            "--hide-timers" => flags.push(Flag::DisableTimers),

            _ => {}
        }
    }

    flags
}

fn build_file(path: &Path, flags: &[Flag], write_output: bool) {
    let start = Instant::now();

    if path.extension().and_then(|e| e.to_str()) != Some(SPROUT_FILE_EXTENSION) {
        red_ln!(
            "Expected a .{} source file, got: {}",
            SPROUT_FILE_EXTENSION,
            path.display()
        );
        return;
    }

    let source_code = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            e_red_ln!("Can't read {}: {e}", path.display());
            return;
        }
    };

    let config = match ProjectConfig::load_for_source(path) {
        Ok(config) => config,
        Err(e) => {
            print_formatted_error(&e, &source_code);
            return;
        }
    };

    let strategy = choose_strategy(flags, &config);
    let compiler = Compiler::new(strategy);

    match compiler.compile(&source_code) {
        Ok(program) => {
            if write_output {
                let output_dir = config.output_dir.as_deref();
                let wat_only = flags.contains(&Flag::WatOnly);

                match file_output::write_artifacts(&program, path, output_dir, wat_only) {
                    Ok(artifact_path) => {
                        println!("Compiled {} -> {}", path.display(), artifact_path.display());
                    }
                    Err(e) => {
                        print_formatted_error(&e, &source_code);
                        return;
                    }
                }
            } else {
                println!("{} compiles cleanly", path.display());
            }

            if !flags.contains(&Flag::DisableTimers) {
                let duration = start.elapsed();
                grey_ln!("------------------------------------");
                print!("Compiled in: ");
                green_ln_bold!("{:?}", duration);
            }

            timer_log!(start, "Full build took: ");
        }

        Err(errors) => {
            report_errors(&errors, &source_code, path);
        }
    }
}

fn choose_strategy(flags: &[Flag], config: &ProjectConfig) -> Strategy {
    // CLI flags win over the project config
    if flags.contains(&Flag::Resumable) {
        return Strategy::Resumable;
    }
    if flags.contains(&Flag::Structured) {
        return Strategy::Structured;
    }

    match config.strategy {
        Some(choice) => choice.into(),
        None => Strategy::default(),
    }
}

fn report_errors(errors: &[CompileError], source_code: &str, path: &Path) {
    e_red_ln!("Errors while compiling {}: \n", path.display());

    // Short machine-friendly lines first, then the formatted snippets
    for error in errors {
        eprintln!("{error}");
    }

    print_errors(errors, source_code);
}

fn print_help(commands_only: bool) {
    if !commands_only {
        grey_ln!("------------------------------------");
        green_ln_bold!("The sprout compiler!");
        println!("Usage: sprout <command> <args>");
    }
    green_ln_bold!("Commands:");
    println!("  build <path>   - Compiles a .spr file to .wasm and .wat");
    println!("  check <path>   - Reports errors without writing artifacts");
    println!("  help           - Shows this message");
    println!();
    green_ln_bold!("Flags:");
    println!("  --structured   - Lower reads to a blocking host call (default)");
    println!("  --resumable    - Lower the program to a host-driven state machine");
    println!("  --wat-only     - Only write the textual module");
    println!("  --hide-timers  - Skip the build timing summary");
}
