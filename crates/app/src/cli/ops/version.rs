use std::convert::Infallible;

use clap::Args;

use ndn_share::build_info;

/// Print build information
#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Print only the package version
    #[arg(long)]
    pub short: bool,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Version {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let info = build_info();
        Ok(if self.short {
            info.version.to_string()
        } else {
            info.to_string()
        })
    }
}
