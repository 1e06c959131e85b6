use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::error::QuizError;

/// Interval between two countdown ticks.
pub const TICK: Duration = Duration::from_secs(1);

/// Handle to the single countdown task of a quiz.
///
/// Restarting aborts the previous task before spawning the next one, and
/// dropping the handle aborts whatever is still running.
#[derive(Debug, Default)]
pub struct Countdown {
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn restart<F>(&mut self, task: F) -> Result<(), QuizError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let handle = Handle::try_current().map_err(|_| QuizError::NoRuntime)?;
        self.task = Some(handle.spawn(task));
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
