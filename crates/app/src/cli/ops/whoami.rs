use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Whoami;

#[derive(Debug, thiserror::Error)]
pub enum WhoamiError {
    #[error(transparent)]
    State(#[from] ndn_share::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Whoami {
    type Error = WhoamiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let public_key = state.public_key()?;
        Ok(format!(
            "identity:   {}\nkey name:   {}\npublic key: {}",
            state.config.identity,
            state.config.key_name,
            public_key.to_hex()
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::op::{Op, OpContext};
    use ndn_share::state::{AppConfig, AppState};

    #[tokio::test]
    async fn test_whoami() {
        let tmp = tempfile::tempdir().unwrap();
        let state = AppState::init(Some(tmp.path().to_path_buf()), AppConfig::new("bob")).unwrap();
        let ctx = OpContext::new(Some(tmp.path().to_path_buf()));

        let output = Whoami.execute(&ctx).await.unwrap();
        assert!(output.contains("bob/KEY/1"));
        assert!(output.contains(&state.public_key().unwrap().to_hex()));
    }

    #[tokio::test]
    async fn test_whoami_uninitialized() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = OpContext::new(Some(tmp.path().join("nothing-here")));
        assert!(Whoami.execute(&ctx).await.is_err());
    }
}
