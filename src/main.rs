use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use variant_annotator::annotation::VcfHeaderLine;
use variant_annotator::genomics::tables::{read_reads, read_sites, ReadsBySample, SiteTable};
use variant_annotator::genomics::{stratify_reads, write_vcf};
use variant_annotator::variant::{FilteredRecordMergeType, GenotypeMergeType};
use variant_annotator::{
    simple_merge, AnnotationRegistry, AnnotatorConfig, FeatureTracker, MergeOptions, ReferenceSequence, SiteInput,
    VariantAnnotatorEngine, VariantContext,
};

/// Track name given to the `--dbsnp` input.
const DBSNP_TRACK: &str = "dbsnp";

#[derive(Parser, Debug)]
#[command(name = "variant-annotator", about = "Annotate and merge called genomic variants")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered annotations and their groups.
    Annotations,
    /// Annotate a site table against reads and a reference.
    Annotate(AnnotateArgs),
    /// Merge site tables from several sources into one record per site.
    Merge(MergeArgs),
}

#[derive(clap::Args, Debug)]
struct AnnotateArgs {
    /// Site table to annotate (VCF column layout, tab-separated).
    #[arg(long)]
    sites: PathBuf,
    /// Reference genome in FASTA format.
    #[arg(long)]
    reference: PathBuf,
    /// Read table (`sample name contig pos mapq cigar sequence qualities strand`).
    #[arg(long)]
    reads: Option<PathBuf>,
    /// Annotation groups to enable.
    #[arg(short = 'G', long = "group")]
    groups: Vec<String>,
    /// Individual annotations to enable.
    #[arg(short = 'A', long = "annotation")]
    annotations: Vec<String>,
    /// Annotations to exclude.
    #[arg(short = 'X', long = "exclude")]
    exclusions: Vec<String>,
    /// Enable every registered annotation.
    #[arg(long)]
    all: bool,
    /// dbSNP site table used for rsIDs and the DB flag.
    #[arg(long)]
    dbsnp: Option<PathBuf>,
    /// Comparison track as `name=path`.
    #[arg(long = "comp", value_parser = parse_named_path)]
    comps: Vec<(String, PathBuf)>,
    /// Resource track as `name=path`, usable from expressions.
    #[arg(long = "resource", value_parser = parse_named_path)]
    resources: Vec<(String, PathBuf)>,
    /// `resource.field` expression to copy into INFO.
    #[arg(short = 'E', long = "expression")]
    expressions: Vec<String>,
    /// Founder sample for population statistics (repeatable).
    #[arg(long = "founder")]
    founders: Vec<String>,
    /// Reference bases on each side of a site.
    #[arg(long, default_value_t = 20)]
    flank: u32,
    /// Worker threads for batch annotation (0 = rayon default).
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Output path (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct MergeArgs {
    /// Input site table as `name=path`, in priority order unless `--priority` is given.
    #[arg(required = true, value_parser = parse_named_path)]
    inputs: Vec<(String, PathBuf)>,
    /// Comma-separated source names, highest priority first.
    #[arg(long, value_delimiter = ',')]
    priority: Vec<String>,
    /// How genotypes from different sources are combined.
    #[arg(long, value_enum, default_value_t = GenotypeMerge::Unsorted)]
    genotype_merge: GenotypeMerge,
    /// How per-source filters combine.
    #[arg(long, value_enum, default_value_t = FilteredMerge::KeepIfAnyUnfiltered)]
    filtered_merge: FilteredMerge,
    /// Record contributing sources in the `set` INFO key.
    #[arg(long)]
    annotate_origin: bool,
    /// INFO key for the origin label.
    #[arg(long, default_value = "set")]
    set_key: String,
    /// Ignore filtered records entirely.
    #[arg(long)]
    filtered_are_uncalled: bool,
    /// Take INFO from the source with the largest AC.
    #[arg(long)]
    max_ac_info: bool,
    /// Output path (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GenotypeMerge {
    Uniquify,
    Prioritize,
    Unsorted,
    RequireUnique,
}

impl From<GenotypeMerge> for GenotypeMergeType {
    fn from(value: GenotypeMerge) -> Self {
        match value {
            GenotypeMerge::Uniquify => GenotypeMergeType::Uniquify,
            GenotypeMerge::Prioritize => GenotypeMergeType::Prioritize,
            GenotypeMerge::Unsorted => GenotypeMergeType::Unsorted,
            GenotypeMerge::RequireUnique => GenotypeMergeType::RequireUnique,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilteredMerge {
    KeepIfAnyUnfiltered,
    KeepIfAllUnfiltered,
}

impl From<FilteredMerge> for FilteredRecordMergeType {
    fn from(value: FilteredMerge) -> Self {
        match value {
            FilteredMerge::KeepIfAnyUnfiltered => FilteredRecordMergeType::KeepIfAnyUnfiltered,
            FilteredMerge::KeepIfAllUnfiltered => FilteredRecordMergeType::KeepIfAllUnfiltered,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Annotations => list_annotations(),
        Commands::Annotate(args) => run_annotate(args),
        Commands::Merge(args) => run_merge(args),
    }
}

fn parse_named_path(text: &str) -> Result<(String, PathBuf), String> {
    match text.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name.to_string(), PathBuf::from(path))),
        _ => Err(format!("expected name=path, got {text:?}")),
    }
}

fn list_annotations() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for annotation in AnnotationRegistry::builtin().list() {
        let groups = annotation.groups.iter().map(|g| g.name()).collect::<Vec<_>>().join(",");
        let kind = if annotation.is_info { "INFO" } else { "FORMAT" };
        writeln!(out, "{}\t{kind}\t{groups}\t{}", annotation.name, annotation.description)?;
    }
    Ok(())
}

fn load_sites(path: &Path, source: &str) -> Result<SiteTable> {
    let file = File::open(path).with_context(|| format!("failed to open site table {}", path.display()))?;
    read_sites(BufReader::new(file), source).with_context(|| format!("failed to parse {}", path.display()))
}

fn materialize(table: &SiteTable) -> Result<Vec<VariantContext>> {
    table
        .sites
        .iter()
        .map(|site| site.materialize().cloned().map_err(Into::into))
        .collect()
}

fn load_track(tracker: &mut FeatureTracker, name: &str, path: &Path) -> Result<SiteTable> {
    let table = load_sites(path, name)?;
    tracker.extend(name, table.sites.iter().map(|site| site.site().clone()));
    info!(track = name, records = table.sites.len(), "loaded track");
    Ok(table)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// `##` lines from the inputs minus those the writer emits itself.
fn passthrough_meta(lines: &[String]) -> impl Iterator<Item = &String> {
    lines
        .iter()
        .filter(|line| !line.starts_with("##fileformat") && !line.starts_with("##source"))
}

fn run_annotate(args: AnnotateArgs) -> Result<()> {
    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("failed to configure thread pool")?;
    }

    let reference_file =
        File::open(&args.reference).with_context(|| format!("failed to open reference {}", args.reference.display()))?;
    let reference = ReferenceSequence::from_fasta(BufReader::new(reference_file))
        .with_context(|| format!("failed to parse reference {}", args.reference.display()))?;

    let reads: ReadsBySample = match &args.reads {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("failed to open read table {}", path.display()))?;
            read_reads(BufReader::new(file)).with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => ReadsBySample::new(),
    };

    let mut tracker = FeatureTracker::new();
    let mut config = AnnotatorConfig::new()
        .with_groups(args.groups)
        .with_annotations(args.annotations)
        .with_exclusions(args.exclusions)
        .with_expressions(args.expressions)
        .with_founder_ids(args.founders)
        .with_all(args.all);

    if let Some(path) = &args.dbsnp {
        load_track(&mut tracker, DBSNP_TRACK, path)?;
        config = config.with_dbsnp(DBSNP_TRACK);
    }
    for (name, path) in &args.comps {
        load_track(&mut tracker, name, path)?;
    }
    config = config.with_comp_tracks(args.comps.iter().map(|(name, _)| name.clone()));

    let mut resource_headers = Vec::new();
    for (name, path) in &args.resources {
        let table = load_track(&mut tracker, name, path)?;
        resource_headers.extend(
            table
                .meta_lines
                .iter()
                .filter_map(|line| VcfHeaderLine::parse(line))
                .map(|line| {
                    let id = format!("{name}.{}", line.id);
                    line.renamed(id)
                }),
        );
    }
    config = config.with_resources(args.resources.iter().map(|(name, _)| name.clone()));

    let engine = VariantAnnotatorEngine::new(&config)?.with_header_info(resource_headers);

    let table = load_sites(&args.sites, "input")?;
    let inputs = materialize(&table)?
        .into_iter()
        .map(|vc| {
            let window = reference
                .context(vc.contig(), vc.start(), args.flank)
                .ok_or_else(|| anyhow!("{} is outside the reference", vc.location()))?;
            let pileups = stratify_reads(vc.contig(), vc.start(), &reads);
            Ok(SiteInput::new(vc, window, pileups))
        })
        .collect::<Result<Vec<_>>>()?;

    let annotated = engine.annotate_batch(&tracker, &inputs)?;
    info!(sites = annotated.len(), "annotated sites");

    let mut seen = HashSet::new();
    let meta: Vec<String> = passthrough_meta(&table.meta_lines)
        .cloned()
        .chain(engine.vcf_annotation_descriptions().iter().map(ToString::to_string))
        .filter(|line| seen.insert(line.clone()))
        .collect();

    let mut out = open_output(args.output.as_deref())?;
    write_vcf(&mut out, &meta, &table.samples, &annotated)
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let mut options = MergeOptions::default()
        .with_genotype_merge_type(args.genotype_merge.into())
        .with_filtered_record_merge_type(args.filtered_merge.into())
        .with_annotate_origin(args.annotate_origin)
        .with_set_key(Some(args.set_key))
        .with_filtered_are_uncalled(args.filtered_are_uncalled)
        .with_merge_info_with_max_ac(args.max_ac_info);
    let priority = if args.priority.is_empty() {
        args.inputs.iter().map(|(name, _)| name.clone()).collect()
    } else {
        args.priority
    };
    options = options.with_priority(priority);

    let mut meta = Vec::new();
    let mut seen_meta = HashSet::new();
    let mut by_site: BTreeMap<(String, u32), Vec<VariantContext>> = BTreeMap::new();
    for (name, path) in &args.inputs {
        let table = load_sites(path, name)?;
        for line in passthrough_meta(&table.meta_lines) {
            if seen_meta.insert(line.clone()) {
                meta.push(line.clone());
            }
        }
        for vc in materialize(&table)? {
            by_site.entry((vc.contig().to_string(), vc.start())).or_default().push(vc);
        }
    }

    let mut merged = Vec::with_capacity(by_site.len());
    for ((contig, start), records) in by_site {
        match simple_merge(&records, &options).with_context(|| format!("failed to merge {contig}:{start}"))? {
            Some(vc) => merged.push(vc),
            None => warn!(contig = %contig, start, "no record survived the merge"),
        }
    }

    let mut seen_samples = HashSet::new();
    let samples: Vec<String> = merged
        .iter()
        .flat_map(|vc| vc.sample_names())
        .filter(|name| seen_samples.insert(name.to_string()))
        .map(str::to_string)
        .collect();
    info!(records = merged.len(), samples = samples.len(), "merged sites");

    let mut out = open_output(args.output.as_deref())?;
    write_vcf(&mut out, &meta, &samples, &merged)
}
