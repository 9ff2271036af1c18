use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use mathrender::{Config, Error, Math};

/// Render MathML or LaTeX math to a standalone SVG.
#[derive(Parser, Debug)]
#[command(name = "mathrender", version, about)]
struct Args {
  /// Treat the input as LaTeX math.
  #[arg(long, conflicts_with = "mathml")]
  latex: bool,

  /// Treat the input as MathML (the default).
  #[arg(long)]
  mathml: bool,

  /// Output path; stdout when omitted.
  #[arg(long, short, value_name = "PATH")]
  output: Option<PathBuf>,

  /// Base font size in px.
  #[arg(long, short)]
  size: Option<f32>,

  /// Math font file (must contain a MATH table).
  #[arg(long, short, value_name = "PATH")]
  font: Option<PathBuf>,

  /// Decimal precision for SVG coordinates.
  #[arg(long, short)]
  precision: Option<usize>,

  /// Emit SVG 1.1 (inline paths) instead of SVG2 symbol references.
  #[arg(long)]
  svg11: bool,

  /// Input path, or `-` for stdin.
  #[arg(value_name = "INPUT")]
  input: Option<PathBuf>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .init();

  match run() {
    Ok(()) => {}
    Err(err) => {
      eprintln!("error: {err}");
      let code = match err {
        Error::Parse(_) => 1,
        Error::Io(_) => 2,
        Error::Font(_) => 3,
        _ => 1,
      };
      std::process::exit(code);
    }
  }
}

fn run() -> Result<(), Error> {
  let args = Args::parse();

  Config::update(|config| {
    if let Some(font) = &args.font {
      config.math.mathfont = Some(font.display().to_string());
    }
    if let Some(precision) = args.precision {
      config.precision = precision;
    }
    if args.svg11 {
      config.svg2 = false;
    }
  });

  let source = match &args.input {
    Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
    _ => {
      let mut buffer = String::new();
      std::io::stdin().read_to_string(&mut buffer)?;
      buffer
    }
  };
  let source = source.trim();

  let mut math = if args.latex {
    #[cfg(feature = "latex")]
    {
      Math::from_latex(source)?
    }
    #[cfg(not(feature = "latex"))]
    {
      return Err(Error::Other(
        "this build was compiled without the latex feature".to_string(),
      ));
    }
  } else {
    Math::new(source)?
  };
  if let Some(size) = args.size {
    math = math.with_size(size);
  }

  let svg = math.svg()?;
  match &args.output {
    Some(path) => std::fs::write(path, svg)?,
    None => println!("{svg}"),
  }
  Ok(())
}
