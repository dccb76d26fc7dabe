//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::io::Read;
use std::path::Path;
use storyforge_domain::{OwnerMetadata, RecordStore};
use storyforge_extractor::{ExtractionRequest, Extractor};
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract<S>(
    args: ExtractArgs,
    extractor: &Extractor<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: RecordStore + 'static,
{
    let (text, default_source) = read_document(&args)?;
    let source_id = args.source_id.clone().unwrap_or(default_source);
    let owner = OwnerMetadata::new(args.project, args.user);

    info!("Extracting {:?} records from {}", args.kind, source_id);
    let request = ExtractionRequest::new(text, args.kind.into(), owner).with_source_id(source_id);
    let result = extractor.extract(request).await?;

    println!("{}", formatter.run_report(&result)?);
    Ok(())
}

/// Read the document and derive a default source identifier.
fn read_document(args: &ExtractArgs) -> Result<(String, String)> {
    match (&args.file, args.stdin) {
        (Some(path), false) => {
            let text = std::fs::read_to_string(path)?;
            Ok((text, source_name(path)))
        }
        (None, true) => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok((text, "stdin".to_string()))
        }
        _ => Err(CliError::InvalidInput(
            "Provide exactly one of --file or --stdin".to_string(),
        )),
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
