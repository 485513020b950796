use clap::{Args, Subcommand};

use common::crypto::{KeyError, PublicKey};
use ndn_share::state::StateError;

use crate::cli::op::{Op, OpContext};

crate::command_enum! {
    Add,
    Ls,
    Rm,
}

pub type ContactCommand = Command;

/// Manage the recipients `seal` can address by name
#[derive(Args, Debug, Clone)]
pub struct Contact {
    #[command(subcommand)]
    pub command: ContactCommand,
}

#[async_trait::async_trait]
impl Op for Contact {
    type Error = OpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid public key: {0}")]
    InvalidKey(#[from] KeyError),
    #[error("no contact named {0:?}")]
    NotFound(String),
}

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Identity name the contact is listed under in recipient entries
    pub name: String,
    /// Hex-encoded public key
    pub public_key: String,
}

#[async_trait::async_trait]
impl Op for Add {
    type Error = ContactError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let public_key = PublicKey::from_hex(&self.public_key)?;
        let mut state = ctx.state()?;
        let replaced = state
            .config
            .contacts
            .insert(self.name.clone(), public_key)
            .is_some();
        state.save()?;

        Ok(if replaced {
            format!("updated contact {}", self.name)
        } else {
            format!("added contact {}", self.name)
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[async_trait::async_trait]
impl Op for Ls {
    type Error = ContactError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if state.config.contacts.is_empty() {
            return Ok("no contacts".to_string());
        }
        let lines: Vec<String> = state
            .config
            .contacts
            .iter()
            .map(|(name, key)| format!("{}\t{}", name, key.to_hex()))
            .collect();
        Ok(lines.join("\n"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct Rm {
    pub name: String,
}

#[async_trait::async_trait]
impl Op for Rm {
    type Error = ContactError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let mut state = ctx.state()?;
        if state.config.contacts.remove(&self.name).is_none() {
            return Err(ContactError::NotFound(self.name.clone()));
        }
        state.save()?;
        Ok(format!("removed contact {}", self.name))
    }
}
