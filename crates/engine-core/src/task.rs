use connectors::{Connection, ConnectionError};
use model::DataForm;
use tracing::debug;

/// One unit of work for [`crate::ConnectionPool::execute`]: a script, or a
/// function call when arguments are set. The outcome is recorded once.
#[derive(Debug)]
pub struct Task {
    script: String,
    args: Option<Vec<DataForm>>,
    outcome: Option<Result<DataForm, ConnectionError>>,
}

impl Task {
    pub fn new(script: impl Into<String>) -> Self {
        Task {
            script: script.into(),
            args: None,
            outcome: None,
        }
    }

    pub fn with_args(function: impl Into<String>, args: Vec<DataForm>) -> Self {
        Task {
            script: function.into(),
            args: Some(args),
            outcome: None,
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn args(&self) -> Option<&[DataForm]> {
        self.args.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Some(Ok(_)))
    }

    pub fn result(&self) -> Option<&DataForm> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    pub fn error(&self) -> Option<&ConnectionError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }

    /// Moves the outcome out, leaving the task not done.
    pub fn take_outcome(&mut self) -> Option<Result<DataForm, ConnectionError>> {
        self.outcome.take()
    }

    pub(crate) async fn run_on(&mut self, connection: &mut dyn Connection) {
        if self.outcome.is_some() {
            return;
        }

        let outcome = match &self.args {
            Some(args) => connection.run_function(&self.script, args).await,
            None => connection.run_script(&self.script).await,
        };

        debug!(
            address = connection.address(),
            script = %self.script,
            success = outcome.is_ok(),
            "Task finished"
        );
        self.outcome = Some(outcome);
    }
}
