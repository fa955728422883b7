use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::{Table, settings::Style};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use docseal::{ConfigOverrides, DigestAlgorithm, DocSealError, NamingRule, Namespace, SealConfig};
use docseal::{Reconciler, ReconcileReport, IntegrityState, VerifyTableRow};
use docseal::{Generator, GenerationMode, GenerateTableRow};
use docseal::{CleanupPlan, CleanupOutcome, Confirm, AutoConfirm, ReportNaming};
use docseal::report::{render_generation_markdown, render_listing_markdown, render_verify_markdown, write_report, ListingTableRow, HUMAN_TIME_FORMAT};

#[derive(Parser)]
#[command(name = "docseal")]
#[command(about = "Sidecar checksum records for document folders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Folder containing the documents
    #[arg(short = 'C', long, env = "DOCSEAL_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to <root>/.docseal.yaml, then the user config dir)
    #[arg(long, env = "DOCSEAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Document extension to seal (repeatable, case-insensitive)
    #[arg(short, long = "extension", env = "DOCSEAL_EXTENSIONS", value_delimiter = ',', global = true)]
    extensions: Vec<String>,

    /// Digest algorithm: sha256 or sha512
    #[arg(long, env = "DOCSEAL_ALGORITHM", value_parser = parse_algorithm, global = true)]
    algorithm: Option<DigestAlgorithm>,

    /// Include subdirectories
    #[arg(short, long, global = true)]
    recursive: bool,

    /// Number of documents digested in parallel
    #[arg(short, long, env = "DOCSEAL_JOBS", global = true)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a checksum record next to every document
    Generate {
        /// Only seal documents that have no record yet
        #[arg(long)]
        missing_only: bool,

        /// Do not write the README overview
        #[arg(long)]
        no_report: bool,
    },

    /// Check every document against its record
    Verify {
        /// Output format: table, yaml, json
        #[arg(short, long, default_value = "table")]
        output: OutputFormat,

        /// Show only entries that are not OK
        #[arg(long)]
        problems_only: bool,

        /// Do not write the Markdown verify report
        #[arg(long)]
        no_report: bool,
    },

    /// List documents with size and timestamps
    List {
        /// Do not write the Markdown listing report
        #[arg(long)]
        no_report: bool,
    },

    /// Delete records and generated reports
    Cleanup {
        /// Delete without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate, verify and list in one go, stopping at the first failing step
    Run {
        /// Do not write Markdown reports
        #[arg(long)]
        no_report: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Yaml,
    Json,
}

/// Result of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean,
    Problems,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Clean => ExitCode::SUCCESS,
            Outcome::Problems => ExitCode::from(1),
        }
    }
}

struct Context {
    root: PathBuf,
    config: SealConfig,
    rule: NamingRule,
}

impl Context {
    fn display_root(&self) -> PathBuf {
        self.root.canonicalize().unwrap_or_else(|_| self.root.clone())
    }

    fn scan(&self) -> docseal::Result<Namespace> {
        Namespace::scan(&self.root, &self.rule, self.config.recursive)
    }
}

struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> docseal::Result<bool> {
        if !atty::is(atty::Stream::Stdin) {
            return Err(DocSealError::Prompt("stdin is not a terminal, pass --yes to delete".to_string()));
        }

        let mut editor = DefaultEditor::new().map_err(|e| DocSealError::Prompt(e.to_string()))?;
        match editor.readline(prompt) {
            Ok(answer) => {
                let answer = answer.trim().to_ascii_lowercase();
                Ok(answer == "y" || answer == "yes")
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(false),
            Err(e) => Err(DocSealError::Prompt(e.to_string())),
        }
    }
}

fn parse_algorithm(s: &str) -> Result<DigestAlgorithm, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("docseal=debug,info")
    } else {
        EnvFilter::new("docseal=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            print_error(e);
            ExitCode::from(2)
        }
    }
}

fn print_error(err: Box<dyn std::error::Error>) {
    eprintln!("{} {}", "✗ Error:".red(), err);
}

async fn run(cli: Cli) -> Result<Outcome, Box<dyn std::error::Error>> {
    let (config, source) = SealConfig::load(cli.config.as_deref(), &cli.root)?;
    if let Some(source) = source {
        debug!("Using config {}", source.display());
    }

    let config = config.apply(ConfigOverrides {
        extensions: cli.extensions,
        algorithm: cli.algorithm,
        recursive: cli.recursive,
        jobs: cli.jobs,
        chunk_size: None,
    })?;

    let ctx = Context {
        rule: config.naming_rule(),
        root: cli.root,
        config,
    };

    match cli.command {
        Commands::Generate { missing_only, no_report } => {
            let mode = if missing_only { GenerationMode::MissingOnly } else { GenerationMode::All };
            cmd_generate(&ctx, mode, !no_report).await
        }

        Commands::Verify { output, problems_only, no_report } => {
            cmd_verify(&ctx, output, problems_only, !no_report).await
        }

        Commands::List { no_report } => cmd_list(&ctx, !no_report),

        Commands::Cleanup { yes } => {
            if yes {
                cmd_cleanup(&ctx, &mut AutoConfirm(true))
            } else {
                cmd_cleanup(&ctx, &mut TerminalConfirm)
            }
        }

        Commands::Run { no_report } => cmd_pipeline(&ctx, !no_report).await,
    }
}

async fn cmd_generate(ctx: &Context, mode: GenerationMode, write_readme: bool) -> Result<Outcome, Box<dyn std::error::Error>> {
    let namespace = ctx.scan()?;
    info!("Sealing {} documents in {}", namespace.documents().len(), ctx.root.display());

    let generator = Generator::new(ctx.rule.clone(), ctx.config.chunk_size);
    let report = generator
        .generate_concurrent(&namespace, mode, ctx.config.jobs)
        .await?;

    println!("Folder: {}", ctx.display_root().display());
    println!("Documents found: {}", namespace.documents().len());

    if report.entries.is_empty() {
        println!("No documents found in {}", ctx.root.display());
    } else {
        let rows: Vec<GenerateTableRow> = report.entries.iter().map(GenerateTableRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::markdown());
        println!("\n{}\n", table);
    }

    let mut written_files: Vec<String> = report
        .entries
        .iter()
        .filter(|e| e.digest.is_some())
        .map(|e| e.record.clone())
        .collect();

    if write_readme {
        let naming = ReportNaming::new(&ctx.rule);
        let markdown = render_generation_markdown(
            &report,
            &ctx.display_root(),
            ctx.rule.algorithm().tag(),
            chrono::Local::now(),
        );
        write_report(&ctx.root, &naming.generation_readme(), &markdown)?;
        written_files.push(naming.generation_readme());
    }

    if !written_files.is_empty() {
        println!("Written files:");
        for name in &written_files {
            print_file_line(&ctx.root, name);
        }
    }

    println!();
    println!("  {} {} written", "✓".green(), report.written_count());
    if report.skipped_count() > 0 {
        println!("  ○ {} kept", report.skipped_count());
    }

    let failures = report.failures();
    if failures.is_empty() {
        Ok(Outcome::Clean)
    } else {
        println!("  {} {} failed", "✗".red(), failures.len());
        for entry in failures {
            if let docseal::GenerationOutcome::Failed(reason) = &entry.outcome {
                println!("    {}: {}", entry.document, reason);
            }
        }
        Ok(Outcome::Problems)
    }
}

fn print_file_line(root: &Path, name: &str) {
    match fs::metadata(root.join(name)) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .map(|t| chrono::DateTime::<chrono::Local>::from(t).format(HUMAN_TIME_FORMAT).to_string())
                .unwrap_or_else(|_| "—".to_string());
            println!("  {}   {} bytes   {}", name, meta.len(), modified);
        }
        Err(_) => println!("  {}", name),
    }
}

async fn cmd_verify(
    ctx: &Context,
    output: OutputFormat,
    problems_only: bool,
    write_markdown: bool,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let namespace = ctx.scan()?;
    info!(
        "Verifying {} documents and {} records in {}",
        namespace.documents().len(),
        namespace.records().len(),
        ctx.root.display()
    );

    let reconciler = Reconciler::new(ctx.rule.clone(), ctx.config.chunk_size);
    let report = reconciler.reconcile_concurrent(&namespace, ctx.config.jobs).await;

    let shown: Vec<_> = if problems_only {
        report.problems().into_iter().cloned().collect()
    } else {
        report.entries.clone()
    };

    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&shown)?);
        }
        OutputFormat::Table => {
            if shown.is_empty() {
                if problems_only {
                    println!("{} No problems found", "✓".green());
                } else {
                    println!("No documents or records found in {}", ctx.root.display());
                }
            } else {
                let rows: Vec<VerifyTableRow> = shown.iter().map(VerifyTableRow::from).collect();
                let mut table = Table::new(rows);
                table.with(Style::markdown());
                println!("\n{}\n", table);
            }
            print_verify_summary(&report);
        }
    }

    if write_markdown {
        let naming = ReportNaming::new(&ctx.rule);
        let now = chrono::Local::now();
        let markdown = render_verify_markdown(&report, &ctx.display_root(), ctx.rule.algorithm().tag(), now);
        let name = naming.verify_report(now);
        write_report(&ctx.root, &name, &markdown)?;
        eprintln!("Report: {}", name);
    }

    if report.is_clean() {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::Problems)
    }
}

fn print_verify_summary(report: &ReconcileReport) {
    println!("Summary:");
    for state in IntegrityState::ALL {
        let count = report.count(state);
        if count == 0 && !state.is_ok() {
            continue;
        }
        let line = format!("  {} {} {}", state.symbol(), count, state.as_str());
        match state {
            IntegrityState::Ok => println!("{}", line.green()),
            IntegrityState::Mismatch | IntegrityState::UnreadableDocument => println!("{}", line.red()),
            _ => println!("{}", line.yellow()),
        }
    }
}

fn cmd_list(ctx: &Context, write_markdown: bool) -> Result<Outcome, Box<dyn std::error::Error>> {
    let namespace = ctx.scan()?;
    let documents = namespace.documents();

    if documents.is_empty() {
        println!("No documents found in {}", ctx.root.display());
    } else {
        let rows: Vec<ListingTableRow> = documents.iter().map(ListingTableRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::markdown());
        println!("{}", table);
    }

    if write_markdown {
        let naming = ReportNaming::new(&ctx.rule);
        let now = chrono::Local::now();
        let label = ctx.rule.extensions().first().map(String::as_str).unwrap_or("document");
        let markdown = render_listing_markdown(documents, &ctx.display_root(), label, now);
        let name = naming.listing_report(now);
        write_report(&ctx.root, &name, &markdown)?;
        eprintln!("Report: {}", name);
    }

    Ok(Outcome::Clean)
}

fn cmd_cleanup(ctx: &Context, confirm: &mut dyn Confirm) -> Result<Outcome, Box<dyn std::error::Error>> {
    let namespace = ctx.scan()?;
    let plan = CleanupPlan::build(&namespace, &ctx.rule)?;

    println!("Folder: {}", ctx.display_root().display());
    println!(
        "Found {} record files and {} report files.",
        plan.records().len(),
        plan.reports().len()
    );

    if !plan.is_empty() {
        println!("\nWill delete:");
        for name in plan.targets() {
            println!("  {}", name);
        }
        println!();
    }

    match plan.execute(confirm)? {
        CleanupOutcome::NothingToDelete => {
            println!("Nothing to delete.");
            Ok(Outcome::Clean)
        }
        CleanupOutcome::Aborted => {
            println!("Aborted.");
            Ok(Outcome::Problems)
        }
        CleanupOutcome::Deleted { deleted, failed } => {
            for (name, reason) in &failed {
                println!("{} deleting {}: {}", "✗".red(), name, reason);
            }
            println!("{} deleted {} file(s)", "✓".green(), deleted);
            if failed.is_empty() {
                Ok(Outcome::Clean)
            } else {
                Ok(Outcome::Problems)
            }
        }
    }
}

async fn cmd_pipeline(ctx: &Context, write_reports: bool) -> Result<Outcome, Box<dyn std::error::Error>> {
    println!("Folder: {}", ctx.display_root().display());
    println!("Time: {}\n", chrono::Local::now().format(HUMAN_TIME_FORMAT));

    println!("== RUN GENERATE ==");
    let outcome = cmd_generate(ctx, GenerationMode::All, write_reports).await?;
    println!("== EXIT GENERATE == {:?}\n", outcome);
    if outcome != Outcome::Clean {
        println!("Stopped because generate reported problems.");
        return Ok(outcome);
    }

    println!("== RUN VERIFY ==");
    let outcome = cmd_verify(ctx, OutputFormat::Table, false, write_reports).await?;
    println!("== EXIT VERIFY == {:?}\n", outcome);
    if outcome != Outcome::Clean {
        println!("Stopped because verify reported problems.");
        return Ok(outcome);
    }

    println!("== RUN LIST ==");
    let outcome = cmd_list(ctx, write_reports)?;
    println!("== EXIT LIST == {:?}\n", outcome);

    println!("DONE.");
    Ok(outcome)
}
