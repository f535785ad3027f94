use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sheet_discount::batch::BatchRunner;
use sheet_discount::config::{BatchOptions, BatchPlan, MissingInputPolicy};
use sheet_discount::generator::{SampleWorkbookGenerator, DEFAULT_OUTPUT};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-discount")]
#[command(about = "Apply a price discount to Excel workbooks and chart the corrected prices")]
#[command(long_about = "sheet-discount - batch price discounts for Excel workbooks

For every requested sheet, prices in column C (from row 2) are discounted,
written to column E with a \"$\"#,##0.00 currency style, and charted in a bar
chart placed to the right of the data. Output files are named
<name>_processed.xlsx.

COMMANDS:
  process   - Discount one or more workbooks in parallel
  generate  - Create a synthetic transactions workbook

EXAMPLES:
  sheet-discount process a.xlsx b.xlsx --sheets Sheet1,Sheet2 --discount 0.1
  sheet-discount process --plan plan.yaml
  sheet-discount generate --start-id 2000 --sheets 3")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Discount one or more workbooks in parallel.

Each file is processed independently. A missing file or a failing workbook
prints an 'Error:' line and the remaining files still run. Sheets that do not
exist in a workbook are skipped.

PLAN FILE:
  files: [a.xlsx, b.xlsx]
  sheets: [Sheet1, Sheet2, Sheet3]
  discount: 0.1
  output_dir: processed_files
  workers: 4
  missing_input: report   # or abort")]
    /// Discount one or more workbooks
    Process {
        /// Input workbooks (.xlsx)
        #[arg(required_unless_present = "plan", conflicts_with = "plan")]
        files: Vec<PathBuf>,

        /// YAML plan file describing the batch
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Sheets to process, comma separated
        #[arg(short, long, value_delimiter = ',', default_value = "Sheet1,Sheet2,Sheet3")]
        sheets: Vec<String>,

        /// Discount fraction in [0, 1)
        #[arg(short, long, default_value = "0.1")]
        discount: f64,

        /// Directory receiving the processed workbooks
        #[arg(short, long, default_value = "processed_files")]
        output_dir: PathBuf,

        /// Worker count (default: available parallelism)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Fail before processing anything if an input file is missing
        #[arg(long)]
        abort_on_missing: bool,
    },

    /// Create a synthetic transactions workbook
    Generate {
        /// Transaction ids start right after this value
        #[arg(long, default_value = "2000")]
        start_id: u64,

        /// Inclusive product id range: min,max
        #[arg(long, value_delimiter = ',', default_value = "1,100")]
        product_ids: Vec<i64>,

        /// Inclusive price range: min,max
        #[arg(long, value_delimiter = ',', default_value = "5.0,50.0")]
        prices: Vec<f64>,

        /// Number of sheets
        #[arg(long, default_value = "3")]
        sheets: usize,

        /// Output workbook path
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheet_discount=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn pair<T: Copy>(values: &[T], what: &str) -> anyhow::Result<(T, T)> {
    match values {
        [lo, hi] => Ok((*lo, *hi)),
        _ => bail!("{} expects exactly two values: min,max", what),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            files,
            plan,
            sheets,
            discount,
            output_dir,
            workers,
            abort_on_missing,
        } => {
            let plan = match plan {
                Some(path) => BatchPlan::from_file(&path)
                    .with_context(|| format!("Failed to read plan {}", path.display()))?,
                None => BatchPlan {
                    files,
                    sheets,
                    discount,
                    output_dir,
                    workers,
                    missing_input: if abort_on_missing {
                        MissingInputPolicy::Abort
                    } else {
                        MissingInputPolicy::Report
                    },
                },
            };

            println!("{}", "💲 sheet-discount - Processing workbooks".bold().green());
            println!("   Files:    {}", plan.files.len());
            println!("   Sheets:   {}", plan.sheets.join(", "));
            println!("   Discount: {}\n", plan.discount);

            let options: BatchOptions = plan.options();
            BatchRunner::new(options).run(&plan.files, &plan.sheets, plan.discount, &plan.output_dir)?;
        }

        Commands::Generate {
            start_id,
            product_ids,
            prices,
            sheets,
            output,
            seed,
        } => {
            let (id_lo, id_hi) = pair(&product_ids, "--product-ids")?;
            let (price_lo, price_hi) = pair(&prices, "--prices")?;

            let generator =
                SampleWorkbookGenerator::new(start_id, id_lo..=id_hi, price_lo..=price_hi, sheets)?
                    .with_output(&output);
            match seed {
                Some(seed) => generator.generate_with(&mut StdRng::seed_from_u64(seed))?,
                None => generator.generate()?,
            };
        }
    }

    Ok(())
}
