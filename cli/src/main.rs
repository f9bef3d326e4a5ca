//! paperlint CLI - paper formatting checker

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use paperlint::rules::builtin_templates;
use paperlint::{
    detect_format_from_path, open_file_with_options, JsonFormat, Paperlint, ParseOptions,
    RenderOptions,
};

#[derive(Parser)]
#[command(name = "paperlint")]
#[command(version)]
#[command(about = "Check .docx paper formatting and annotate findings as comments", long_about = None)]
struct Cli {
    /// Input DOCX file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a document and write the report and annotated copy
    Check {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Additional template file (repeatable)
        #[arg(short, long = "template", value_name = "TEMPLATE")]
        templates: Vec<PathBuf>,

        /// Do not run the built-in modules
        #[arg(long)]
        no_builtin: bool,

        /// Also write a JSON report
        #[arg(long)]
        json: bool,

        /// Run modules one after another
        #[arg(long)]
        sequential: bool,

        /// Fall back to an empty stylesheet when styles are malformed
        #[arg(long)]
        lenient: bool,

        /// Comment author
        #[arg(long, env = "PAPERLINT_AUTHOR", default_value = "paperlint")]
        author: String,

        /// Comment author initials
        #[arg(long, env = "PAPERLINT_INITIALS", default_value = "PL")]
        initials: String,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the built-in templates
    Templates {
        /// Print the templates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

struct CheckArgs {
    templates: Vec<PathBuf>,
    no_builtin: bool,
    json: bool,
    sequential: bool,
    lenient: bool,
    author: String,
    initials: String,
}

impl Default for CheckArgs {
    fn default() -> Self {
        Self {
            templates: Vec::new(),
            no_builtin: false,
            json: false,
            sequential: false,
            lenient: false,
            author: std::env::var("PAPERLINT_AUTHOR").unwrap_or_else(|_| "paperlint".into()),
            initials: std::env::var("PAPERLINT_INITIALS").unwrap_or_else(|_| "PL".into()),
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Check {
            input,
            output,
            templates,
            no_builtin,
            json,
            sequential,
            lenient,
            author,
            initials,
        }) => cmd_check(
            &input,
            output.as_deref(),
            CheckArgs {
                templates,
                no_builtin,
                json,
                sequential,
                lenient,
                author,
                initials,
            },
        ),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Templates { json }) => cmd_templates(json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: check if input is provided
            if let Some(input) = cli.input {
                cmd_check(&input, cli.output.as_deref(), CheckArgs::default())
            } else {
                println!("{}", "Usage: paperlint <FILE> [OUTPUT]".yellow());
                println!("       paperlint --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_check(input: &Path, output: Option<&Path>, args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy().to_string();
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        input
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    });
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading rules...");
    let mut builder = Paperlint::new()
        .with_author(args.author, args.initials)
        .with_render_options(
            RenderOptions::new()
                .with_source(input.display().to_string())
                .with_timestamp(),
        );
    if args.lenient {
        builder = builder.lenient();
    }
    if args.sequential {
        builder = builder.sequential();
    }
    if args.no_builtin {
        builder = builder.without_builtin();
    }
    for template in args.templates {
        builder = builder.with_template(template);
    }
    // Fail on bad templates before reading the document.
    builder.checker()?;
    pb.inc(1);

    pb.set_message("Checking document...");
    let result = builder.check(input)?;
    pb.inc(1);

    pb.set_message("Writing report...");
    let report_path = output_dir.join(format!("{stem}_report.txt"));
    fs::write(&report_path, result.to_text())?;
    let json_path = output_dir.join(format!("{stem}_report.json"));
    if args.json {
        fs::write(&json_path, result.to_json(JsonFormat::Pretty)?)?;
    }
    pb.inc(1);

    pb.set_message("Writing annotated copy...");
    let annotated_path = output_dir.join(format!("{stem}_annotated.docx"));
    result.save_annotated(&annotated_path)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    let summary = result.summary();
    let annotated = &result.run.annotated;
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Checks".bold(), summary.total);
    println!("{}: {}", "Passed".bold(), summary.passed.to_string().green());
    println!("{}: {}", "Failed".bold(), summary.failed.to_string().red());
    println!("{}: {:.2}%", "Pass rate".bold(), summary.pass_rate);
    if summary.errored_modules > 0 {
        println!("{}: {}", "Modules failed".bold(), summary.errored_modules.to_string().red());
    }
    println!(
        "{}: {} placed, {} unplaced",
        "Comments".bold(),
        annotated.placed.len(),
        annotated.unplaced.len() + annotated.failed.len()
    );

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), report_path.display());
    if args.json {
        println!("  {} {}", "├─".dimmed(), json_path.display());
    }
    println!("  {} {}", "└─".dimmed(), annotated_path.display());

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let format = detect_format_from_path(input)?;
    let doc = open_file_with_options(input, ParseOptions::new().lenient())?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Main part".bold(), doc.main_part());

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref editor) = doc.metadata.last_modified_by {
        println!("{}: {}", "Last modified by".bold(), editor);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!("{}: {}", "Paragraphs".bold(), doc.paragraph_count());
    println!("{}: {}", "Tables".bold(), doc.tables().len());
    println!("{}: {}", "Styles".bold(), doc.styles.len());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!("{}: {}", "Comments".bold(), doc.comments.len());
    if !doc.comments.people().is_empty() {
        let authors: Vec<&str> = doc.comments.people().iter().map(|p| p.author.as_str()).collect();
        println!("{}: {}", "Reviewers".bold(), authors.join(", "));
    }

    Ok(())
}

fn cmd_templates(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let templates = builtin_templates()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    println!("{}", "Built-in templates".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for template in &templates {
        println!(
            "{} {}",
            template.module.bold(),
            template.description.as_deref().unwrap_or("").dimmed()
        );
        for section in &template.sections {
            let required = if section.required { "" } else { " (optional)" };
            println!("  {} {}{}", "•".dimmed(), section.name, required);
        }
    }
    println!("{} {}", "Table".bold(), "Table caption numbering, format and placement".dimmed());
    println!("{} {}", "Figure".bold(), "Figure caption numbering, format and placement".dimmed());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "paperlint".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Paper formatting checker for DOCX files");
}
