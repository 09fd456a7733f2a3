//! CLI command implementations

pub mod call;
pub mod error;
pub mod list;
pub mod request;
pub mod session;

pub use call::CallArgs;
pub use error::CliError;
pub use list::{ListArgs, PageSizeArgs};
pub use request::RequestArgs;
pub use session::{Cli, Commands, OutputFormat};

use serde_json::Value;

/// Run the selected command and return the value to print
pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    if let Some(addr) = cli.metrics_addr {
        crate::metrics::init_metrics(addr)
            .await
            .map_err(|e| CliError::Metrics(format!("{e:#}")))?;
    }

    match &cli.command {
        Commands::Call(args) => args.execute(cli).await,
        Commands::List(args) => args.execute(cli).await,
        Commands::PageSize(args) => args.execute(cli).await,
    }
}
