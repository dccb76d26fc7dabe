//! Test-cases command implementation.

use crate::cli::TestCasesArgs;
use crate::error::Result;
use crate::output::Formatter;
use storyforge_domain::{OwnerMetadata, RecordId, RecordStore};
use storyforge_extractor::Extractor;

/// Execute the test-cases command.
pub async fn execute_test_cases<S>(
    args: TestCasesArgs,
    extractor: &Extractor<S>,
    formatter: &Formatter,
) -> Result<()>
where
    S: RecordStore + 'static,
{
    let story_id = RecordId::new(args.story);
    let owner = OwnerMetadata::new(args.project, args.user);

    let result = extractor.generate_test_cases(&story_id, &owner).await?;

    println!("{}", formatter.run_report(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use std::sync::Arc;
    use storyforge_extractor::{ExtractorConfig, ExtractorError};
    use storyforge_llm::MockProvider;
    use storyforge_store::MemoryStore;

    #[tokio::test]
    async fn test_unknown_story() {
        let extractor = Extractor::new(
            Arc::new(MockProvider::new("[]")),
            MemoryStore::new(),
            ExtractorConfig::default(),
        )
        .unwrap();
        let args = TestCasesArgs {
            story: "missing".to_string(),
            project: "p".to_string(),
            user: "u".to_string(),
        };

        let result =
            execute_test_cases(args, &extractor, &Formatter::new(OutputFormat::Quiet, false)).await;
        assert!(matches!(
            result,
            Err(CliError::Extractor(ExtractorError::StoryNotFound(_)))
        ));
    }
}
