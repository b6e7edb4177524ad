use clap::{Parser, Subcommand};
use junban::meeting::{self, Format, MeetingSettings};
use junban::order::{self, CustomerId, OrderSettings, Style};
use junban::{Console, Context};
use std::time::Duration;
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(name = "junban", version, about = "Run the sample sequential workflows")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Take, process and complete an order
    Order {
        #[arg(long, default_value = "customer 1")]
        customer: String,

        /// Delay before the kitchen reports cooking completed
        #[arg(long, default_value_t = 3000)]
        cooking_delay_ms: u64,

        #[arg(long, value_enum, default_value_t = Style::Chain)]
        style: Style,
    },
    /// Schedule the project meeting
    Meeting {
        /// Pretend a meeting is already on the calendar
        #[arg(long)]
        has_meeting: bool,

        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::new(Console::stdout());

    let outcome = match cli.command {
        Command::Order {
            customer,
            cooking_delay_ms,
            style,
        } => {
            let settings = OrderSettings {
                customer: CustomerId::new(customer),
                cooking_delay: Duration::from_millis(cooking_delay_ms),
            };
            order::report(&ctx, &settings, style).await.map(|_| ())
        }
        Command::Meeting {
            has_meeting,
            format,
        } => {
            let settings = MeetingSettings { has_meeting };
            meeting::report(&ctx, &settings, format).await.map(|_| ())
        }
    };

    if let Err(e) = outcome {
        info!("Workflow ended with failure: {}", e);
    }

    // Let outstanding detached effects fire before the runtime shuts down.
    ctx.effects().drain().await;
    info!("Finished in {:?}", ctx.elapsed());

    Ok(())
}
