use std::path::PathBuf;

use clap::Args;

use common::fetch::Access;
use common::sync_metadata::{parse, Context, MatchPolicy, SyncMetadata};
use common::tlv::DecodeError;
use ndn_share::state::AppState;

/// Show what a sync metadata file contains and whether we can open it
#[derive(Args, Debug, Clone)]
pub struct Inspect {
    /// Sync metadata file
    pub metadata: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("invalid metadata: {0}")]
    Decode(#[from] DecodeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("inspect task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Describe what `state`'s identity would get from `bytes`
fn describe_access(bytes: &[u8], state: &AppState) -> String {
    let identity = state.identity();
    let key_store = state.key_store();
    let ctx = Context::new(&identity, &key_store).with_policy(MatchPolicy::ValidateAll);
    match parse(bytes, &ctx) {
        Ok(request) => match request.access() {
            Access::Granted(key) => format!(
                "granted to {} (AES-{})",
                identity.name,
                key.len() * 8
            ),
            Access::NotAuthorized => format!("{} is not a recipient", identity.name),
        },
        Err(e) => format!("{} cannot open it: {}", identity.name, e),
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inspect {
    type Error = InspectError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = tokio::fs::read(&self.metadata).await?;
        let metadata = SyncMetadata::decode(&bytes)?;

        let mut lines = vec![
            format!("name: {}", metadata.name),
            format!("recipients: {}", metadata.recipients.len()),
        ];
        for entry in &metadata.recipients {
            let iv = entry
                .iv
                .as_ref()
                .map(|iv| iv.to_hex())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "  {}\twrapped key: {} bytes\tiv: {}",
                entry.recipient,
                entry.wrapped_key.len(),
                iv
            ));
        }

        // Access is only reported when there is a local identity to check
        if let Ok(state) = ctx.state() {
            let access =
                tokio::task::spawn_blocking(move || describe_access(&bytes, &state)).await?;
            lines.push(format!("access: {}", access));
        }

        Ok(lines.join("\n"))
    }
}
