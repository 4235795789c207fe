use anyhow::{bail, Context, Result};
use batching::FlushSchedule;
use clap::{Parser, Subcommand};
use client_core::{SelectedList, SelectionClient, SubmissionQueue};
use shared::{domain::ItemId, protocol::PageQuery};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page of ids not yet selected.
    Items {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Page of the selected order.
    Selected {
        #[command(flatten)]
        page: PageArgs,
    },
    Add {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Select {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Deselect {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Drops ACTIVE onto the slot of OVER as seen through --filter.
    Move {
        #[arg(long, default_value = "")]
        filter: String,
        active: String,
        over: String,
    },
    Queue,
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    #[arg(long, default_value = "")]
    filter: String,
    #[arg(long, default_value_t = 0)]
    offset: usize,
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

impl PageArgs {
    fn query(&self) -> PageQuery {
        PageQuery::new(self.filter.as_str(), self.offset, self.limit)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let client = SelectionClient::new(&cli.server_url)?;

    match cli.command {
        Command::Items { page } => print_page(client.fetch_items(&page.query()).await?.items),
        Command::Selected { page } => {
            print_page(client.fetch_selected(&page.query()).await?.items)
        }
        Command::Add { ids } => {
            let queue = SubmissionQueue::new(client, FlushSchedule::default());
            for id in parse_ids(&ids)? {
                queue.queue_add(id);
            }
            report(queue.flush_all().await)?;
        }
        Command::Select { ids } => {
            let queue = SubmissionQueue::new(client, FlushSchedule::default());
            for id in parse_ids(&ids)? {
                queue.queue_select(id);
            }
            report(queue.flush_all().await)?;
        }
        Command::Deselect { ids } => {
            let queue = SubmissionQueue::new(client, FlushSchedule::default());
            for id in parse_ids(&ids)? {
                queue.queue_deselect(id);
            }
            report(queue.flush_all().await)?;
        }
        Command::Move {
            filter,
            active,
            over,
        } => {
            let active = ItemId::parse(&active)?;
            let over = ItemId::parse(&over)?;
            let mut list = SelectedList::new(client.fetch_all_selected("").await?, filter);
            match list.drag(active, over)? {
                Some(order) => {
                    info!(len = order.len(), "submitting reorder");
                    client.reorder(&order).await?;
                    println!("queued reorder of {} ids", order.len());
                }
                None => println!("order unchanged"),
            }
        }
        Command::Queue => {
            let stats = client.queue_stats().await?;
            println!(
                "add_item={} select={} deselect={} reorder={}",
                stats.add_item, stats.select, stats.deselect, stats.reorder
            );
        }
    }

    Ok(())
}

fn parse_ids(raw: &[String]) -> Result<Vec<ItemId>> {
    raw.iter()
        .map(|value| ItemId::parse(value).with_context(|| format!("bad id {value:?}")))
        .collect()
}

fn print_page(items: Vec<ItemId>) {
    for id in items {
        println!("{id}");
    }
}

fn report(outcome: client_core::FlushOutcome) -> Result<()> {
    println!("sent={} failed={}", outcome.sent, outcome.failed);
    if outcome.failed > 0 {
        bail!("{} submissions were rejected", outcome.failed);
    }
    Ok(())
}
