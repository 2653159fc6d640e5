//! `sat finding` command - Audit finding management

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, format_short_id, resolve_entity, truncate_str};
use crate::cli::OutputFormat;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::sequence::{SequenceIndex, SEQ_FINDING};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::audit::Audit;
use crate::entities::finding::{Finding, FindingStatus, Severity};

#[derive(clap::Subcommand, Debug)]
pub enum FindingCommands {
    /// List findings with filtering
    List(ListArgs),

    /// Record a new finding against an audit
    New(NewArgs),

    /// Show a finding's details
    Show(ShowArgs),

    /// Edit a finding in your editor
    Edit(EditArgs),
}

/// Severity filter
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SeverityFilter {
    Critical,
    Major,
    Minor,
    Observation,
    All,
}

/// Status filter
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusFilter {
    Open,
    ActionDefined,
    InProgress,
    Closed,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by audit ID, reference, or short ID
    #[arg(long, short = 'a')]
    pub audit: Option<String>,

    /// Filter by severity
    #[arg(long, short = 'S', default_value = "all")]
    pub severity: SeverityFilter,

    /// Filter by derived status
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,

    /// Search in description
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Audit ID, reference, or short ID (@N) the finding belongs to
    #[arg(long, short = 'a')]
    pub audit: String,

    /// Finding description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Severity level
    #[arg(long, short = 'S', default_value = "minor")]
    pub severity: String,

    /// Related question line number (its category is inherited)
    #[arg(long, short = 'l')]
    pub line: Option<u32>,

    /// Standard/requirement reference
    #[arg(long)]
    pub standard_ref: Option<String>,

    /// Evidence
    #[arg(long, short = 'e')]
    pub evidence: Option<String>,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Finding ID, reference, or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Finding ID, reference, or short ID (@N)
    pub id: String,
}

pub fn run(cmd: FindingCommands) -> Result<()> {
    match cmd {
        FindingCommands::List(args) => run_list(args),
        FindingCommands::New(args) => run_new(args),
        FindingCommands::Show(args) => run_show(args),
        FindingCommands::Edit(args) => run_edit(args),
    }
}

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let mut findings: Vec<Finding> = loader::load_all(&project.entity_dir(EntityPrefix::Fnd))?;

    if let Some(ref audit_ref) = args.audit {
        let (_, audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, audit_ref)?;
        findings.retain(|f| f.audit == audit.id);
    }

    findings.retain(|f| match args.severity {
        SeverityFilter::Critical => f.severity == Severity::Critical,
        SeverityFilter::Major => f.severity == Severity::Major,
        SeverityFilter::Minor => f.severity == Severity::Minor,
        SeverityFilter::Observation => f.severity == Severity::Observation,
        SeverityFilter::All => true,
    });

    findings.retain(|f| match args.status {
        StatusFilter::Open => f.status == FindingStatus::Open,
        StatusFilter::ActionDefined => f.status == FindingStatus::ActionDefined,
        StatusFilter::InProgress => f.status == FindingStatus::InProgress,
        StatusFilter::Closed => f.status == FindingStatus::Closed,
        StatusFilter::All => true,
    });

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        findings.retain(|f| f.description.to_lowercase().contains(&needle));
    }

    findings.sort_by(|a, b| b.created.cmp(&a.created));

    if args.count {
        println!("{}", findings.len());
        return Ok(());
    }

    if findings.is_empty() {
        println!("No findings found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.ensure_all(findings.iter().map(|f| f.id.to_string()));
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&findings).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&findings).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("short_id,reference,audit,severity,status,description");
            for finding in &findings {
                let short_id = short_ids
                    .get_short_id(&finding.id.to_string())
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                println!(
                    "{},{},{},{},{},{}",
                    short_id,
                    finding.reference,
                    finding.audit,
                    finding.severity,
                    finding.status,
                    escape_csv(&finding.description)
                );
            }
        }
        OutputFormat::Id => {
            for finding in &findings {
                println!("{}", finding.id);
            }
        }
        _ => {
            println!(
                "{:<6} {:<9} {:<17} {:<12} {:<15} {:<30}",
                style("SHORT").bold().dim(),
                style("REF").bold(),
                style("AUDIT").bold(),
                style("SEVERITY").bold(),
                style("STATUS").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(92));

            for finding in &findings {
                let short_id = short_ids
                    .get_short_id(&finding.id.to_string())
                    .map(|n| format!("@{}", n))
                    .unwrap_or_default();
                let severity_styled = match finding.severity {
                    Severity::Critical => style(finding.severity.to_string()).red().bold(),
                    Severity::Major => style(finding.severity.to_string()).yellow(),
                    _ => style(finding.severity.to_string()).white(),
                };

                println!(
                    "{:<6} {:<9} {:<17} {:<12} {:<15} {:<30}",
                    style(&short_id).cyan(),
                    finding.reference,
                    format_short_id(&finding.audit),
                    severity_styled,
                    finding.status.to_string(),
                    truncate_str(&finding.description, 28)
                );
            }

            println!();
            println!("{} finding(s) found.", style(findings.len()).cyan());
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let (_, audit): (_, Audit) = resolve_entity(&project, EntityPrefix::Aud, &args.audit)?;

    let description: String;
    let severity: String;

    if args.interactive || args.description.is_none() {
        use dialoguer::{Input, Select};

        description = Input::new()
            .with_prompt("Finding description")
            .interact_text()
            .into_diagnostic()?;

        let severity_options = ["critical", "major", "minor", "observation"];
        let severity_idx = Select::new()
            .with_prompt("Severity")
            .items(&severity_options)
            .default(2)
            .interact()
            .into_diagnostic()?;
        severity = severity_options[severity_idx].to_string();
    } else {
        description = args
            .description
            .ok_or_else(|| miette::miette!("Description is required (use --description or -d)"))?;
        severity = args.severity;
    }

    let severity: Severity = severity
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let mut sequences = SequenceIndex::load(&project);
    let reference = sequences.next(SEQ_FINDING);

    let mut finding = Finding::new(
        reference,
        audit.id.clone(),
        description,
        severity,
        config.author(),
    );
    finding.standard_reference = args.standard_ref;
    finding.evidence = args.evidence;

    // The related question line contributes its category
    if let Some(number) = args.line {
        let line = audit
            .lines
            .iter()
            .find(|l| l.number == number)
            .ok_or_else(|| miette::miette!("No question line {} on {}", number, audit.reference))?;
        finding.question_line = Some(number);
        finding.category = line.category.clone();
    }

    let path = project.entity_path(EntityPrefix::Fnd, &finding.id);
    loader::save_entity(&path, &finding)?;
    sequences.save(&project).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(finding.id.to_string());
    let _ = short_ids.save(&project);

    let severity_styled = match finding.severity {
        Severity::Critical => style(finding.severity.to_string()).red().bold(),
        Severity::Major => style(finding.severity.to_string()).yellow(),
        _ => style(finding.severity.to_string()).white(),
    };

    println!(
        "{} Recorded finding {} ({}) on {}",
        style("✓").green(),
        style(&finding.reference).cyan(),
        style(format!("@{}", short_id)).cyan(),
        style(&audit.reference).white()
    );
    println!(
        "   {} | {}",
        severity_styled,
        truncate_str(&finding.description, 50)
    );
    println!("   {}", style(path.display()).dim());

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _): (_, Finding) = resolve_entity(&project, EntityPrefix::Fnd, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;
    print!("{}", content);

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, _): (_, Finding) = resolve_entity(&project, EntityPrefix::Fnd, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}
