//! Remedia command-line consultation.
//!
//! Runs one free-text symptom description through inference, the safety
//! gate and recommendation ranking, then prints the result.
//!
//! Usage:
//!   cargo run -p demo -- consult "fever and chills since yesterday"
//!   cargo run -p demo -- consult "back pain" --allergy aspirin --json
//!   cargo run -p demo -- consult "cough" --journal consultations.jsonl
//!   cargo run -p demo -- verify-journal consultations.jsonl

mod pipeline;

use std::{
    error::Error,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use remedia_contracts::{
    config::RemediaConfig, consultation::Consultation, recommend::Recommendation,
};
use remedia_core::{config::load_config_file, traits::ConsultationJournal};
use remedia_journal::{read_entries, verify_chain, InMemoryJournal, JsonlJournal};

use pipeline::{build_consultant, declared_allergens, ArcJournal};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Remedia: symptom text in, condition and safety-screened suggestions out.
#[derive(Parser)]
#[command(
    name = "remedia",
    about = "Symptom-based condition inference with safety-gated recommendations",
    long_about = "Infers a likely condition from a free-text symptom description,\n\
                  screens it for emergencies, drug interactions and allergies, and\n\
                  ranks herbal and pharmaceutical suggestions. Informational only."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one consultation.
    Consult {
        /// Symptom description, e.g. "headache and nausea for two days".
        text: String,
        /// Declared allergen; repeat for several.
        #[arg(long = "allergy", value_name = "ALLERGEN")]
        allergies: Vec<String>,
        /// TOML configuration file.
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Statistical model artifact (JSON); overrides the config file.
        #[arg(long, value_name = "FILE")]
        model: Option<PathBuf>,
        /// JSON-lines journal to append to; overrides the config file.
        #[arg(long, value_name = "FILE")]
        journal: Option<PathBuf>,
        /// Print the consultation as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check the hash chain of a journal file.
    VerifyJournal {
        path: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-stage output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Consult {
            text,
            allergies,
            config,
            model,
            journal,
            json,
        } => run_consult(&text, &allergies, config, model, journal, json),
        Command::VerifyJournal { path } => run_verify(&path),
    };

    if let Err(e) = result {
        eprintln!("remedia: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_consult(
    text: &str,
    allergies: &[String],
    config_path: Option<PathBuf>,
    model: Option<PathBuf>,
    journal_path: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let mut config = match &config_path {
        Some(path) => load_config_file(path)?,
        None => RemediaConfig::default(),
    };
    if model.is_some() {
        config.tables.model = model;
    }
    if journal_path.is_some() {
        config.tables.journal = journal_path;
    }

    let memory = Arc::new(InMemoryJournal::new());
    let journal: Box<dyn ConsultationJournal> = match &config.tables.journal {
        Some(path) => Box::new(JsonlJournal::open(path)?),
        None => Box::new(ArcJournal(Arc::clone(&memory))),
    };

    let consultant = build_consultant(&config, journal)?;

    let allergens = declared_allergens(allergies);
    let declared = (!allergens.is_empty()).then_some(&allergens);

    let consultation = consultant.consult(text, declared)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&consultation)?);
        return Ok(());
    }

    print_consultation(&consultation);
    match &config.tables.journal {
        Some(path) => println!("Journal:     appended to {}", path.display()),
        None => println!(
            "Journal:     in memory ({} entries), head {}",
            memory.len(),
            memory.terminal_hash()
        ),
    }
    Ok(())
}

fn run_verify(path: &Path) -> Result<(), Box<dyn Error>> {
    let entries = read_entries(path)?;
    if verify_chain(&entries) {
        println!("{}: {} entries, chain intact", path.display(), entries.len());
        Ok(())
    } else {
        Err(format!("{}: chain verification FAILED", path.display()).into())
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_consultation(c: &Consultation) {
    let inference = &c.inference;
    let recs = &c.recommendations;

    println!();
    println!("Condition:   {}", inference.condition);
    println!(
        "Confidence:  {:.0}% ({})",
        inference.confidence * 100.0,
        inference.source
    );
    if let Some(pattern) = &inference.pattern_detected {
        println!("Pattern:     {}", pattern);
    }
    if !inference.alternates.is_empty() {
        let others: Vec<&str> = inference.alternates.iter().map(|a| a.name.as_str()).collect();
        println!("Also likely: {}", others.join(", "));
    }
    for question in &inference.follow_up_questions {
        println!("  ? {}", question);
    }
    println!();

    if let Some(message) = &recs.emergency_message {
        println!("!! EMERGENCY !!");
        println!("{}", message);
        println!();
        println!("{}", recs.disclaimer);
        println!();
        return;
    }

    if let Some(warning) = &recs.low_confidence_warning {
        println!("Note: {}", warning);
    }
    for i in &recs.drug_interactions {
        println!(
            "INTERACTION [{}] {} + {}: {} {}",
            i.severity, i.drug_a, i.drug_b, i.effect, i.recommendation
        );
    }
    for a in &recs.allergy_warnings {
        println!("{}", a.warning());
    }
    if c.safety.has_warnings() {
        println!();
    }

    print_section("Herbal suggestions", &recs.herbal, print_herb);
    print_section("Pharmaceutical options", &recs.pharmaceutical, print_drug);

    println!("{}", recs.disclaimer);
    println!();
}

fn print_section(title: &str, items: &[Recommendation], item: fn(usize, &Recommendation)) {
    println!("{}:", title);
    if items.is_empty() {
        println!("  (none)");
    }
    for (idx, rec) in items.iter().enumerate() {
        item(idx + 1, rec);
    }
    println!();
}

fn print_herb(n: usize, r: &Recommendation) {
    println!("  {}. {} (relevance {:.2})", n, r.name, r.rank_score);
    println!("     Benefits:         {}", r.field("benefits"));
    println!("     Active compounds: {}", r.field("active_compounds"));
    println!("     Usage:            {}", r.field("usage"));
}

fn print_drug(n: usize, r: &Recommendation) {
    println!("  {}. {} [{}]", n, r.name, r.field("type"));
    println!("     Brands:       {}", r.field("brand_names"));
    println!("     Purpose:      {}", r.field("purpose"));
    println!("     Dosage:       {}", r.field("dosage"));
    println!("     Availability: {}", r.field("availability"));
    println!("     Price:        {}", r.field("price_range"));
    println!("     Side effects: {}", r.field("side_effects"));
}
