use std::path::PathBuf;

use static_shape::{OverflowPolicy, RewriteOptions, StabilizeMode, TensorSelector};

#[derive(Debug)]
pub struct Args {
    /// Model file to load.
    pub model: PathBuf,

    /// Path to write the rewritten model to.
    pub output: Option<PathBuf>,

    /// Print the model's inputs and outputs without rewriting it.
    pub analyze_only: bool,

    pub options: RewriteOptions,

    /// Number of `-v` flags.
    pub verbosity: u8,
}

fn print_help(bin_name: &str) {
    println!(
        "Rewrite an ONNX model so that its inputs and output have static shapes.

Usage: {bin_name} [OPTIONS] <model> [<output>]

Options:
  -o, --output <path>         Path of the rewritten model
  -s, --seq-length <n>        Sequence length of token inputs (default: 512)
  -a, --output-length <n>     Length of the output (default: 192000)
      --max-audio-samples <n> Alias for --output-length
      --structural            Pad or truncate the output with Concat and
                              Slice nodes, instead of only changing its
                              declared shape
      --add-padding           Alias for --structural
      --axis <n>              Axis along which the output is padded (default: 0)
      --reject-truncation     Fail if the output may be longer than
                              --output-length
      --input <name>          Input to fix. Can be repeated. Defaults to
                              any of `input_ids` and `tokens`
      --output-name <name>    Output to fix. Defaults to one of `audio` and
                              `waveform`
      --allow-unused-inputs   Don't fail if a graph input is unused
      --analyze-only          Print the model's inputs and outputs and exit
  -v, --verbose               Log more details. Repeat for debug output
  -h, --help                  Print help
"
    );
}

/// Parse command line arguments from `parser`.
///
/// Prints help and exits if `-h` is passed.
pub fn parse_args(mut parser: lexopt::Parser) -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = Vec::new();
    let mut output = None;
    let mut analyze_only = false;
    let mut verbosity = 0;
    let mut inputs = Vec::new();
    let mut output_name = None;
    let mut options = RewriteOptions::default();

    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push(PathBuf::from(val)),
            Short('o') | Long("output") => output = Some(PathBuf::from(parser.value()?)),
            Short('s') | Long("seq-length") => options.seq_len = parser.value()?.parse()?,
            Short('a') | Long("output-length") | Long("max-audio-samples") => {
                options.output_len = parser.value()?.parse()?
            }
            Long("structural") | Long("add-padding") => options.mode = StabilizeMode::Structural,
            Long("axis") => options.axis = parser.value()?.parse()?,
            Long("reject-truncation") => options.overflow = OverflowPolicy::Reject,
            Long("input") => inputs.push(parser.value()?.string()?),
            Long("output-name") => output_name = Some(parser.value()?.string()?),
            Long("allow-unused-inputs") => options.allow_unused_inputs = true,
            Long("analyze-only") => analyze_only = true,
            Short('v') | Long("verbose") => verbosity += 1,
            Short('h') | Long("help") => {
                print_help(parser.bin_name().unwrap_or("static-shape"));
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let (model, output) = resolve_paths(values, output, analyze_only)?;

    if !inputs.is_empty() {
        options.inputs = TensorSelector::Names(inputs);
    }
    if let Some(name) = output_name {
        options.output = TensorSelector::Names(vec![name]);
    }

    Ok(Args {
        model,
        output,
        analyze_only,
        options,
        verbosity,
    })
}

/// Get the model and output paths from the positional arguments and the
/// `--output` option.
///
/// The output path may be given as the second positional argument or with
/// `--output`, but not both. It is required unless the model is only being
/// analyzed.
fn resolve_paths(
    values: Vec<PathBuf>,
    mut output: Option<PathBuf>,
    analyze_only: bool,
) -> Result<(PathBuf, Option<PathBuf>), lexopt::Error> {
    let mut values = values.into_iter();
    let model = values.next().ok_or("missing `<model>` arg")?;
    if let Some(path) = values.next() {
        if output.is_some() {
            return Err("output path specified twice".into());
        }
        output = Some(path);
    }
    if let Some(extra) = values.next() {
        return Err(format!("unexpected argument {}", extra.display()).into());
    }
    if output.is_none() && !analyze_only {
        return Err("missing `<output>` arg. Use --analyze-only to inspect a model".into());
    }
    Ok((model, output))
}
