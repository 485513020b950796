use std::path::PathBuf;

use clap::Args;

use ndn_share::state::{default_key_name, AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Identity name others will list you under (e.g. /alice)
    #[arg(long)]
    pub identity: String,

    /// Name to store the private key under (default: <identity>/KEY/1)
    #[arg(long)]
    pub key_name: Option<String>,

    /// Default log level (default: info)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write log files to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] ndn_share::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::new(self.identity.clone());
        config.key_name = self
            .key_name
            .clone()
            .unwrap_or_else(|| default_key_name(&self.identity));
        config.log_level = self.log_level.clone();
        config.log_dir = self.log_dir.clone();
        // reject a bad level before anything is written
        config.log_level()?;

        let state = AppState::init(ctx.config_path.clone(), config)?;
        let public_key = state.public_key()?;

        let output = format!(
            "Initialized ndn-share directory at: {}\n\
             - Identity: {}\n\
             - Key name: {}\n\
             - Public key: {}\n\
             - Keys: {}\n\
             - Config: {}",
            state.state_dir.display(),
            state.config.identity,
            state.config.key_name,
            public_key.to_hex(),
            state.keys_path.display(),
            state.config_path.display(),
        );

        Ok(output)
    }
}
