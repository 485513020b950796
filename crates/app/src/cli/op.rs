use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

use ndn_share::state::{AppState, StateError};

/// What every command gets to work with
#[derive(Debug, Clone)]
pub struct OpContext {
    /// State directory override (defaults to ~/.ndn-share)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Load the initialized state this context points at
    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }
}

/// A CLI command. Its output is printed to stdout on success.
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output: Display + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Generate a clap `Command` enum over a list of `Op` types, plus an
/// `OpError` wrapping each of their errors. The variant and the type share
/// a name. Dispatching renders the output to a `String`.
#[macro_export]
macro_rules! command_enum {
    ($($op:ident),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($op($op),)*
        }

        impl Command {
            /// Variant name, for logging
            pub fn name(&self) -> &'static str {
                match self {
                    $(Command::$op(_) => stringify!($op),)*
                }
            }
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $op(<$op as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = String;
            type Error = OpError;

            async fn execute(
                &self,
                ctx: &$crate::cli::op::OpContext,
            ) -> Result<String, OpError> {
                tracing::debug!("running {}", self.name());
                match self {
                    $(
                        Command::$op(op) => match op.execute(ctx).await {
                            Ok(output) => Ok(output.to_string()),
                            Err(e) => Err(OpError::$op(e)),
                        },
                    )*
                }
            }
        }
    };
}
