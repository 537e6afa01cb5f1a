use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use page_picker::context::{spawn_page_context, PointerInput, PointerKind, PointerReply};
use page_picker::controller::{Controller, PickTarget, StateStore};
use page_picker::dom::load_html;
use page_picker::export::{self, ExportFormat};
use page_picker::extractor::{Field, ResultSet};
use page_picker::inspector::{InspectorConfig, InspectorServer};
use page_picker::utils::Config;

#[derive(Parser)]
#[command(name = "page-picker")]
#[command(version = "0.1.0")]
#[command(about = "Point-and-click structured data extraction from web pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from a page (URL or HTML file)
    Extract {
        /// URL or path of the page
        source: String,

        /// Selector for the repeated record container. Saved form is used if omitted.
        #[arg(short, long)]
        base: Option<String>,

        /// Field as name=selector. Can be specified multiple times.
        #[arg(short, long)]
        field: Vec<Field>,

        /// Output format (table, csv, json, excel)
        #[arg(long, default_value = "table")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the base selector and fields for later runs
        #[arg(long, default_value = "false")]
        save: bool,
    },

    /// Pick an element and store its selector in the saved form
    Pick {
        /// URL or path of the page
        source: String,

        /// Selector of the element to click
        #[arg(short, long)]
        click: String,

        /// Elements hovered before the click, in order
        #[arg(long)]
        hover: Vec<String>,

        /// Field to fill (relative to the saved base selector). Picks the base selector if omitted.
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Show or clear the saved form
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Start the web UI for a page
    Serve {
        /// URL or path of the page
        source: String,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// Print the saved form
    Show,
    /// Delete the saved form
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let store = StateStore::new(&config.state_file);

    match cli.command {
        Commands::Extract {
            source,
            base,
            field,
            format,
            output,
            save,
        } => {
            let format = match format.as_str() {
                "table" => None,
                other => Some(other.parse::<ExportFormat>()?),
            };

            println!("{} Extracting from: {}", "▶".green().bold(), source.cyan());

            let html = load_html(&source).await?;
            let (client, _pushes) = spawn_page_context(html, &config)?;
            let mut controller = Controller::with_store(client, store)?;
            if let Some(base) = base {
                controller.set_base_selector(base);
            }
            if !field.is_empty() {
                let mut form = controller.form().clone();
                form.fields = field;
                controller.set_form(form);
            }

            let parsed = controller.parse().await;
            if let Some(status) = controller.status() {
                if status.is_error {
                    eprintln!("{} {}", "✗".red(), status.message.red());
                } else {
                    println!("  {}", status.message.green());
                }
            }
            parsed?;
            if let Some(stats) = controller.stats() {
                println!("  {}", stats.cyan());
            }

            if save {
                controller.save_form()?;
                println!("  Form saved to: {}", config.state_file.display());
            }

            let (Some(results), Some(fields)) = (controller.results(), controller.result_fields())
            else {
                bail!("No results to show");
            };
            match format {
                None => print_table(results, fields),
                Some(format) => export::write_export(format, results, fields, output.as_deref())?,
            }
        }

        Commands::Pick {
            source,
            click,
            hover,
            field,
        } => {
            let html = load_html(&source).await?;
            let (client, mut pushes) = spawn_page_context(html, &config)?;
            let mut controller = Controller::with_store(client.clone(), store)?;

            let target = match field {
                Some(name) => {
                    let existing = controller.form().fields.iter().position(|f| f.name == name);
                    let index = match existing {
                        Some(index) => index,
                        None => controller.add_field(Field::new(name, "")),
                    };
                    PickTarget::Field(index)
                }
                None => PickTarget::Base,
            };

            controller.start_picking(target).await?;
            if let Some(status) = controller.status() {
                println!("{} {}", "🎯".to_string().blue(), status.message);
            }

            for selector in hover {
                for kind in [PointerKind::PointerEnter, PointerKind::PointerLeave] {
                    deliver(&client, kind, &selector).await?;
                }
            }
            deliver(&client, PointerKind::Click, &click).await?;

            let push = tokio::time::timeout(
                Duration::from_millis(config.rpc_timeout_ms),
                pushes.recv(),
            )
            .await
            .ok()
            .flatten()
            .context("Page did not report a selection")?;

            controller.apply_push(push)?;
            let selector = match target {
                PickTarget::Base => controller.form().base_selector.clone(),
                PickTarget::Field(index) => controller.form().fields[index].selector.clone(),
            };
            println!("{} Selected: {}", "✓".green(), selector.cyan().bold());
            println!("  Form saved to: {}", config.state_file.display());
        }

        Commands::State { command } => match command {
            StateCommands::Show => {
                let form = store.load()?;
                println!("{} {}", "📄".to_string().blue(), store.path().display());
                println!("{}", serde_json::to_string_pretty(&form)?);
            }
            StateCommands::Clear => {
                store.clear()?;
                println!("{} Saved form cleared", "✓".green());
            }
        },

        Commands::Serve { source, port } => {
            let server = InspectorServer::new(
                InspectorConfig {
                    port: port.unwrap_or(config.inspector_port),
                    source,
                },
                config,
            );
            server.start().await?;
        }
    }

    Ok(())
}

async fn deliver(
    client: &page_picker::context::ContextClient,
    kind: PointerKind,
    target: &str,
) -> anyhow::Result<()> {
    let reply = client
        .pointer(PointerInput {
            kind,
            target: target.to_string(),
        })
        .await?;
    if let PointerReply::Error { error } = reply {
        bail!(error);
    }
    Ok(())
}

/// Print results as an aligned table
fn print_table(results: &ResultSet, fields: &[Field]) {
    let mut widths: Vec<usize> = fields.iter().map(|f| f.name.chars().count()).collect();
    for row in 0..results.count() {
        for (i, field) in fields.iter().enumerate() {
            widths[i] = widths[i].max(results.value(row, &field.name).chars().count());
        }
    }

    let header: Vec<String> = fields
        .iter()
        .zip(&widths)
        .map(|(f, w)| format!("{:<w$}", f.name, w = *w))
        .collect();
    println!("\n{}", header.join(" | ").bold());
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );

    for row in 0..results.count() {
        let cells: Vec<String> = fields
            .iter()
            .zip(&widths)
            .map(|(f, w)| format!("{:<w$}", results.value(row, &f.name), w = *w))
            .collect();
        println!("{}", cells.join(" | "));
    }
    println!();
}
