use std::error::Error;
use std::io::Write;

use env_logger::Builder;
use log::{Level, LevelFilter};
use static_shape::{analyze, convert, StabilizeMode};

mod args;

use args::{parse_args, Args};

fn level_token(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "*",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

/// Log to stderr. Warnings are shown by default and each `-v` enables the
/// next level. `RUST_LOG` overrides the level.
fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = Builder::new();
    builder.format(|buf, record| {
        writeln!(buf, "[{}] {}", level_token(record.level()), record.args())
    });
    builder.filter_level(level);
    builder.parse_env("RUST_LOG");
    builder.init();
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if args.analyze_only {
        let summary = analyze(&args.model)?;
        println!("{}", summary);
        return Ok(());
    }

    let Some(output) = args.output else {
        return Err("missing `<output>` arg".into());
    };
    let report = convert(&args.model, &output, &args.options)?;

    println!("Input model:\n{}\n", report.before);
    for name in &report.fixed_inputs {
        println!("Fixed input \"{}\" to [1, {}]", name, args.options.seq_len);
    }

    let stabilize = &report.stabilize;
    match stabilize.mode {
        StabilizeMode::Declarative => println!(
            "Set declared shape of \"{}\" to [{}]. The length computed by the model may differ.",
            stabilize.output, args.options.output_len
        ),
        StabilizeMode::Structural => {
            println!(
                "Padded \"{}\" to {} elements",
                stabilize.output, args.options.output_len
            );
            if let Some(intermediate) = &stabilize.intermediate {
                println!("  Unpadded value: {}", intermediate);
            }
            println!("  Added nodes: {}", stabilize.added_nodes.join(", "));
            println!(
                "  Added initializers: {}",
                stabilize.added_initializers.join(", ")
            );
            if !stabilize.rewired.is_empty() {
                println!("  Rewired nodes: {}", stabilize.rewired.join(", "));
            }
        }
    }

    println!("\nSaved {}:\n{}", output.display(), report.after);
    Ok(())
}

/// Tool for making the shapes of an ONNX model's inputs and output static, so
/// that the model can be compiled for accelerators which require static
/// shapes.
///
/// ```text
/// static-shape kokoro.onnx --analyze-only
/// static-shape kokoro.onnx kokoro_static.onnx --structural
/// ```
fn main() {
    let args = match parse_args(lexopt::Parser::from_env()) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };
    init_logger(args.verbosity);

    if let Err(err) = run(args) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
