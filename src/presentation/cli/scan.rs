use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{PipelineArgs, print_json};
use crate::application::state::build_http_client;
use crate::domain::UploadedImage;

#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Photo of a bookshelf (JPEG or PNG)
    pub file: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

pub async fn run(command: ScanCommand) -> Result<()> {
    let bytes = tokio::fs::read(&command.file)
        .await
        .with_context(|| format!("failed to read {}", command.file.display()))?;

    let image = UploadedImage {
        bytes,
        file_name: command
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        content_type: None,
    };

    let config = command.pipeline.into_config();
    let scanner = config.build_scanner(&build_http_client()?)?;
    let results = scanner.scan(&image).await?;

    print_json(&results)
}
