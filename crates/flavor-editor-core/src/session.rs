//! Lifetime of one editing session.

use flavor_common::{IdentityProvider, Journal, JournalStore};

use crate::draft::JournalForm;
use crate::error::{SubmitError, ValidationError};
use crate::media::StagingPolicy;
use crate::submit::{self, SubmissionOutcome};

/// Holds at most one open [`JournalForm`].
///
/// `open` starts a session (seeded from a journal when editing), `close`
/// drops it. A successful submit closes the session; a failed one leaves it
/// open for another attempt.
#[derive(Debug, Default)]
pub struct EditorSession {
    form: Option<JournalForm>,
    policy: StagingPolicy,
}

impl EditorSession {
    pub fn new(policy: StagingPolicy) -> Self {
        Self { form: None, policy }
    }

    /// Start editing. Any form already open is discarded.
    pub fn open(&mut self, seed: Option<&Journal>) -> &mut JournalForm {
        if let Some(mut previous) = self.form.take() {
            previous.cancel();
        }
        let form = match seed {
            Some(journal) => JournalForm::edit(journal, self.policy.clone()),
            None => JournalForm::create(self.policy.clone()),
        };
        tracing::debug!(mode = ?form.mode(), "editor session opened");
        self.form.insert(form)
    }

    /// Close without submitting. Staged state is dropped.
    pub fn close(&mut self) {
        if let Some(mut form) = self.form.take() {
            form.cancel();
        }
    }

    pub fn is_open(&self) -> bool {
        self.form.is_some()
    }

    pub fn form(&self) -> Option<&JournalForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut JournalForm> {
        self.form.as_mut()
    }

    /// Submit the open form, closing the session when it succeeds.
    pub async fn submit<S, I>(
        &mut self,
        store: &S,
        identity: &I,
    ) -> Result<SubmissionOutcome, SubmitError>
    where
        S: JournalStore,
        I: IdentityProvider + ?Sized,
    {
        let form = self
            .form
            .as_mut()
            .ok_or(SubmitError::Validation(ValidationError::SessionClosed))?;
        let outcome = submit::submit(form, store, identity).await?;
        self.form = None;
        Ok(outcome)
    }
}
