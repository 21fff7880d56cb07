use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use karttem_pdf::{BRANDING_ENV, Branding, GenerateOptions, share};

#[derive(Parser)]
#[command(name = "karttem-pdf", version, about = "Generate a property listing sheet (PDF)")]
struct Cli {
    /// Property JSON: a bare record or an API response envelope
    record: PathBuf,
    /// Main image (JPEG or PNG)
    #[arg(short, long)]
    image: Option<PathBuf>,
    /// Output file or directory [default: {BRAND}-Propiedad-{id}.pdf]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Branding JSON file
    #[arg(long, env = BRANDING_ENV)]
    branding: Option<PathBuf>,
    /// Footer date as dd/mm/yyyy [default: today]
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Also print the contact and share links for the listing
    #[arg(long)]
    links: bool,
    /// Public page of the listing, used in the share links
    #[arg(long, requires = "links")]
    url: Option<String>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y").map_err(|e| format!("expected dd/mm/yyyy: {e}"))
}

fn run(cli: Cli) -> Result<(), karttem_pdf::Error> {
    let branding = match &cli.branding {
        Some(path) => Branding::load(path)?,
        None => Branding::default(),
    };
    let mut options = GenerateOptions {
        branding,
        ..GenerateOptions::default()
    };
    if let Some(date) = cli.date {
        options.generated_on = date;
    }

    let output = match cli.output {
        Some(path) => path,
        None => PathBuf::from("."),
    };
    let written =
        karttem_pdf::convert_record_file(&cli.record, cli.image.as_deref(), &output, &options)?;
    println!("{}", written.display());

    if cli.links {
        let json = std::fs::read_to_string(&cli.record)?;
        let record = karttem_pdf::parse_property_json(&json)?;
        let branding = &options.branding;
        println!("{}", share::whatsapp_inquiry_link(&record, branding));
        if let Some(url) = &cli.url {
            println!("{}", share::whatsapp_share_link(&record, url, branding));
            println!("{}", share::email_share_link(&record, url, branding));
            println!("{}", share::facebook_share_link(url));
            println!("{}", share::twitter_share_link(&record, url, branding));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
