use crate::executor::task::TaskId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid group id: {0}")]
    InvalidGroup(usize),

    #[error("unknown task id: {0} (never issued or already consumed)")]
    UnknownTask(TaskId),

    #[error("task cancelled: its group was disabled before it ran")]
    Cancelled,

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("result type mismatch for task {0}")]
    TypeMismatch(TaskId),

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }
}
