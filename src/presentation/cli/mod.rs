pub mod scan;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Args, Parser, Subcommand};

use crate::application::{ExtractorKind, LookupKind, PipelineConfig, Profile};
use crate::infrastructure::{ai, ocr, retail};
use scan::ScanCommand;

#[derive(Debug, Parser)]
#[command(author, version, about = "Find shop links for the books in a bookshelf photo", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Scan a local image and print the results as JSON
    Scan(ScanCommand),
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(long, env = "SHELFSCAN_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl ServeCommand {
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Pipeline selection and collaborator endpoints, shared by `serve` and `scan`.
#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Preset stage combination; individual stage flags override it
    #[arg(long, env = "SHELFSCAN_PROFILE", value_enum, default_value_t = Profile::Rated)]
    pub profile: Profile,

    #[arg(long, env = "SHELFSCAN_EXTRACTOR", value_enum)]
    pub extractor: Option<ExtractorKind>,

    /// Clean extracted lines with a language model (true/false)
    #[arg(long, env = "SHELFSCAN_CLEANUP")]
    pub cleanup: Option<bool>,

    #[arg(long, env = "SHELFSCAN_LOOKUP", value_enum)]
    pub lookup: Option<LookupKind>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = ai::OPENAI_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "SHELFSCAN_VISION_MODEL", default_value = ai::DEFAULT_VISION_MODEL)]
    pub vision_model: String,

    #[arg(long, env = "SHELFSCAN_CLEANUP_MODEL", default_value = ai::DEFAULT_CLEANUP_MODEL)]
    pub cleanup_model: String,

    /// Path to the tesseract binary
    #[arg(long, env = "SHELFSCAN_TESSERACT", default_value = ocr::DEFAULT_TESSERACT)]
    pub tesseract: String,

    #[arg(long, env = "SHELFSCAN_RETAILER_URL", default_value = retail::DEFAULT_RETAILER_URL)]
    pub retailer_url: String,

    #[arg(long, env = "SHELFSCAN_RETAILER_NAME", default_value = retail::DEFAULT_RETAILER_NAME)]
    pub retailer_name: String,

    #[arg(long, env = "SHELFSCAN_SEARCH_URL", default_value = retail::DEFAULT_SEARCH_URL)]
    pub search_url: String,
}

impl PipelineArgs {
    pub fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            extractor: self.extractor.unwrap_or(self.profile.extractor()),
            cleanup: self.cleanup.unwrap_or(self.profile.cleanup()),
            lookup: self.lookup.unwrap_or(self.profile.lookup()),
            openai_base_url: self.openai_base_url,
            openai_api_key: self.openai_api_key.unwrap_or_default(),
            vision_model: self.vision_model,
            cleanup_model: self.cleanup_model,
            tesseract: self.tesseract,
            retailer_url: self.retailer_url,
            retailer_name: self.retailer_name,
            search_url: self.search_url,
        }
    }
}

pub(crate) fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
