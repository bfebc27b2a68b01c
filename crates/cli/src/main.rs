use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::App;
use libris_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "libris", version, about = "Library lending service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the merged OpenAPI document
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;
    tracing::info!(command = ?cli.command, env = ?settings.environment, "libris cli");

    let app = App::bootstrap(settings)?;

    match cli.command {
        Command::Serve => app.serve().await,
        Command::Migrate => {
            let applied = app.migrate()?;
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Openapi => {
            let document = serde_json::to_string_pretty(&app.openapi())
                .context("failed to render OpenAPI document")?;
            println!("{document}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::parse_from(["libris", "migrate"]);
        assert!(matches!(cli.command, Command::Migrate));
        assert!(Cli::try_parse_from(["libris", "reindex"]).is_err());
    }
}
