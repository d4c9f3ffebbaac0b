use clap::Parser;
use std::path::{Path, PathBuf};

use cv_docx::gemini::DEFAULT_MODEL;
use cv_docx::text::InputKind;
use cv_docx::{ConvertOptions, GeminiClient, GeminiConfig, TextModel};

#[derive(Parser)]
#[command(name = "cv-docx", about = "Convert a PDF CV into a styled DOCX file")]
struct Args {
    /// Input CV (.pdf or .docx) or an extracted record (.json)
    input: PathBuf,
    /// Output DOCX file (defaults to the input with a .docx extension)
    output: Option<PathBuf>,
    /// Header photo, used when the file exists
    #[arg(long, default_value = "profile.png")]
    photo: PathBuf,
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Gemini model name
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
    /// Also write the extracted record as JSON
    #[arg(long, value_name = "PATH")]
    save_json: Option<PathBuf>,
}

fn default_output(input: &Path) -> PathBuf {
    match InputKind::from_path(input) {
        Ok(InputKind::Docx) => input.with_extension("cv.docx"),
        _ => input.with_extension("docx"),
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let output = args.output.unwrap_or_else(|| default_output(&args.input));

    let client = match args.api_key {
        Some(key) if !key.is_empty() => {
            let mut config = GeminiConfig::new(key);
            config.model = args.model;
            match GeminiClient::new(config) {
                Ok(client) => Some(client),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        _ => None,
    };

    let options = ConvertOptions { photo: Some(args.photo), save_record: args.save_json };
    let model = client.as_ref().map(|c| c as &dyn TextModel);

    if let Err(e) = cv_docx::convert(&args.input, &output, &options, model) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    println!("Saved CV to: {}", output.display());
}
