use amptrim::discover::{sample_name, SamplePair};
use amptrim::run::{run_directory, trim_pair, RunLayout};
use amptrim::summary::SummaryWriter;
use amptrim::{ErrorBudget, PrimerChoice, PrimerRegistry, PrimerSet, RunConfig, RunContext};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "amptrim")]
#[command(version)]
#[command(about = "Trim primers from paired-end amplicon (metabarcoding) reads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TrimArgs {
    #[arg(short = 'p', long, help = "Primer set name, or OTHER to give the primer sequences")]
    primer_set: String,

    #[arg(short = 'f', long, help = "Forward primer (3' end, >= 8 bases recommended); OTHER only")]
    forward: Option<String>,

    #[arg(short = 'r', long, help = "Reverse primer (3' end, >= 8 bases recommended); OTHER only")]
    reverse: Option<String>,

    #[arg(long, default_value_t = 1, help = "Mismatches allowed in the forward primer")]
    forward_errors: usize,

    #[arg(long, default_value_t = 1, help = "Mismatches allowed in the reverse primer")]
    reverse_errors: usize,

    #[arg(
        short = 'l',
        long,
        help = "Marker length; 0 searches for the opposite primer. Defaults to the primer set's length, required for OTHER"
    )]
    marker_length: Option<usize>,

    #[arg(long, help = "Trimmed reads must be longer than this; required for variable-length markers")]
    min_length: Option<f64>,

    #[arg(short = 's', long, help = "Reject index hops using Klymus et al. spacer inserts")]
    spacers: bool,

    #[arg(short = 'c', long, help = "Compress output files with gzip")]
    compress: bool,

    #[arg(long, default_value = "primer_sets.tsv", help = "Primer set table (built-in sets when absent)")]
    registry: PathBuf,
}

impl TrimArgs {
    fn context(&self) -> Result<RunContext> {
        let registry = PrimerRegistry::load_or_builtin(&self.registry)?;
        let config = RunConfig {
            primers: PrimerChoice::from_args(&self.primer_set, self.forward.as_deref(), self.reverse.as_deref())?,
            budget: ErrorBudget::new(self.forward_errors, self.reverse_errors),
            marker_length: self.marker_length,
            spacers: self.spacers,
            min_length: self.min_length,
            compress_output: self.compress,
        };
        Ok(config.resolve(&registry)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Trim every sample in the sub-directories of a run directory
    Run {
        #[arg(default_value = ".", help = "Run directory holding one sub-directory per sequencing folder")]
        root: PathBuf,

        #[arg(short = 'o', long, help = "Output directory (default: <root>/<name>TrimmedFastqs)")]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Summary table (default: <root>/<name>TrimSummary.txt)")]
        summary: Option<PathBuf>,

        #[command(flatten)]
        trim: TrimArgs,
    },

    /// Trim a single pair of mate files
    Pair {
        #[arg(short = '1', long, help = "Input R1 FASTQ file")]
        r1_input: PathBuf,

        #[arg(short = '2', long, help = "Input R2 FASTQ file")]
        r2_input: PathBuf,

        #[arg(short = 'o', long, default_value = ".", help = "Output directory")]
        output_dir: PathBuf,

        #[arg(long, help = "Sample name (default: R1 file name up to the first '_')")]
        sample: Option<String>,

        #[arg(long, help = "Also write a one-row summary table")]
        summary: Option<PathBuf>,

        #[command(flatten)]
        trim: TrimArgs,
    },

    /// List the primer sets
    PrimerSets {
        #[arg(long, default_value = "primer_sets.tsv")]
        registry: PathBuf,
    },

    /// Add a primer set to the primer set table
    AddPrimer {
        name: String,
        forward: String,
        reverse: String,
        #[arg(help = "Marker length, 0 for variable")]
        marker_length: usize,
        #[arg(long, default_value = "primer_sets.tsv")]
        registry: PathBuf,
    },

    /// Remove a primer set from the primer set table
    RemovePrimer {
        name: String,
        #[arg(long, default_value = "primer_sets.tsv")]
        registry: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            root,
            output_dir,
            summary,
            trim,
        } => {
            let ctx = trim.context()?;
            let mut layout = RunLayout::for_root(&root)?;
            if let Some(dir) = output_dir {
                layout.output_dir = dir;
            }
            if let Some(path) = summary {
                layout.summary_path = path;
            }
            run_directory(&ctx, &root, &layout)
                .with_context(|| format!("Trimming samples under {}", root.display()))?;
        }

        Commands::Pair {
            r1_input,
            r2_input,
            output_dir,
            sample,
            summary,
            trim,
        } => {
            let ctx = trim.context()?;
            let sample = match sample {
                Some(s) => s,
                None => default_sample(&r1_input),
            };
            let pair = SamplePair {
                sample,
                forward: r1_input,
                reverse: r2_input,
            };
            let mut writer = match summary {
                Some(path) => Some(SummaryWriter::create(&path, ctx.spacers.is_some())?),
                None => None,
            };
            let row = trim_pair(&ctx, &pair, &output_dir, writer.as_mut())
                .with_context(|| format!("Trimming sample {}", pair.sample))?;
            println!("{}", row.to_record().join("\t"));
        }

        Commands::PrimerSets { registry } => {
            let registry = PrimerRegistry::load_or_builtin(&registry)?;
            println!("Primer Set\tFor Seq\tRev Seq\tLength");
            for set in registry.iter() {
                println!("{}\t{}\t{}\t{}", set.name, set.forward, set.reverse, set.marker_length);
            }
        }

        Commands::AddPrimer {
            name,
            forward,
            reverse,
            marker_length,
            registry,
        } => {
            let mut sets = PrimerRegistry::load_or_builtin(&registry)?;
            let set = PrimerSet::new(&name, &forward, &reverse, marker_length);
            info!(
                "Adding primer set {} F seq: {} R seq: {} Target length: {}",
                set.name, set.forward, set.reverse, set.marker_length
            );
            sets.add(set)?;
            sets.save(&registry)
                .with_context(|| format!("Writing {}", registry.display()))?;
        }

        Commands::RemovePrimer { name, registry } => {
            let mut sets = PrimerRegistry::load_or_builtin(&registry)?;
            let removed = sets.remove(&name)?;
            info!("Removing primer set {} from {}", removed.name, registry.display());
            sets.save(&registry)
                .with_context(|| format!("Writing {}", registry.display()))?;
        }
    }

    Ok(())
}

fn default_sample(path: &Path) -> String {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("sample");
    sample_name(file_name).to_string()
}
