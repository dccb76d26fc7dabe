//! Ownership metadata attached to persisted records

/// Who a run's records belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerMetadata {
    /// Project the records are filed under
    pub project_id: String,

    /// User who triggered the run
    pub user_id: String,

    /// Story the records derive from (test cases generated from a story)
    pub user_story_id: Option<String>,
}

impl OwnerMetadata {
    /// Ownership for a project/user pair
    pub fn new(project_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            user_id: user_id.into(),
            user_story_id: None,
        }
    }

    /// Link the run's records to a parent user story
    pub fn with_user_story(mut self, user_story_id: impl Into<String>) -> Self {
        self.user_story_id = Some(user_story_id.into());
        self
    }
}
