//! Broadcast commands.

use ajay_core::broadcast::{BroadcastDraft, BroadcastStore, Priority, Publisher, Subscriber};
use ajay_core::notifier::ApiNotifier;
use ajay_core::{BroadcastConfig, RecipientSelection, Role};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::sync::Arc;
use tracing::debug;

use crate::output;

#[derive(Subcommand)]
pub enum BroadcastCommands {
    /// Publish a broadcast
    Send {
        /// Message text
        message: String,

        /// Priority: info, warning or joy
        #[arg(long, short, default_value = "info")]
        priority: Priority,

        /// Recipient roles, comma-separated (defaults to all)
        #[arg(long, value_delimiter = ',')]
        to: Vec<Role>,
    },

    /// Compose broadcasts interactively
    Compose,

    /// Stop the active broadcast
    Stop,

    /// Show the active broadcast as a dashboard would
    Show {
        /// Dashboard role (state, block, agency, field-officer, ...)
        #[arg(long, short)]
        role: Option<Role>,
    },

    /// List previous broadcasts, newest first
    History {
        /// Maximum number of entries to show
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },

    /// Follow the banner for a role until interrupted
    Watch {
        /// Dashboard role (state, block, agency, field-officer, ...)
        #[arg(long, short)]
        role: Option<Role>,
    },
}

pub async fn execute(cmd: BroadcastCommands, config: &BroadcastConfig) -> Result<()> {
    match cmd {
        BroadcastCommands::Send {
            message,
            priority,
            to,
        } => cmd_send(config, message, priority, to).await,
        BroadcastCommands::Compose => cmd_compose(config).await,
        BroadcastCommands::Stop => cmd_stop(config).await,
        BroadcastCommands::Show { role } => cmd_show(config, role).await,
        BroadcastCommands::History { limit } => cmd_history(config, limit).await,
        BroadcastCommands::Watch { role } => cmd_watch(config, role).await,
    }
}

async fn open_store(config: &BroadcastConfig) -> Result<BroadcastStore> {
    let origin = super::connect(config).await?;
    Ok(BroadcastStore::new(Arc::new(origin.open_context())).with_history_limit(config.history_limit))
}

async fn open_publisher(config: &BroadcastConfig) -> Result<Publisher> {
    let mut publisher = Publisher::new(open_store(config).await?, config.sender.clone());
    if let Some(url) = &config.api_url {
        publisher = publisher.with_notifier(ApiNotifier::with_url(url));
    }
    Ok(publisher)
}

/// Recipients from `--to`; none given means every recipient role.
fn selection_from(to: &[Role]) -> RecipientSelection {
    if to.is_empty() {
        RecipientSelection::default()
    } else {
        RecipientSelection::only(to)
    }
}

async fn cmd_send(
    config: &BroadcastConfig,
    message: String,
    priority: Priority,
    to: Vec<Role>,
) -> Result<()> {
    let publisher = open_publisher(config).await?;
    let draft = BroadcastDraft {
        message,
        priority,
        recipients: selection_from(&to),
    };

    match publisher.publish(&draft).await? {
        Some(published) => output::print_published(&published),
        None => println!("{}", "Message is empty, nothing was sent.".yellow()),
    }
    Ok(())
}

async fn cmd_compose(config: &BroadcastConfig) -> Result<()> {
    let mut publisher = open_publisher(config).await?;
    let priorities = [Priority::Info, Priority::Warning, Priority::Joy];
    let priority_labels = ["Info", "Warning (urgent)", "Joy (success)"];
    let recipient_labels: Vec<&str> = Role::RECIPIENTS.iter().map(|r| r.label()).collect();

    println!(
        "{}",
        format!("Composing as {}. Priority and recipients carry over between messages.\n", publisher.sender())
            .dimmed()
    );

    loop {
        publisher.draft.message = Input::new()
            .with_prompt("Message")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read message")?;

        let current = priorities
            .iter()
            .position(|p| *p == publisher.draft.priority)
            .unwrap_or(0);
        let picked = Select::new()
            .with_prompt("Priority")
            .items(&priority_labels)
            .default(current)
            .interact()
            .context("Failed to read priority")?;
        publisher.draft.priority = priorities[picked];

        let defaults: Vec<bool> = Role::RECIPIENTS
            .iter()
            .map(|r| publisher.draft.recipients.is_selected(*r))
            .collect();
        let chosen = MultiSelect::new()
            .with_prompt("Recipients (none selected reaches everyone)")
            .items(&recipient_labels)
            .defaults(&defaults)
            .interact()
            .context("Failed to read recipients")?;
        let mut selection = RecipientSelection::none();
        for index in chosen {
            selection.set(Role::RECIPIENTS[index], true);
        }
        publisher.draft.recipients = selection;

        match publisher.submit().await? {
            Some(published) => output::print_published(&published),
            None => println!("{}", "Message is empty, nothing was sent.".yellow()),
        }

        let again = Confirm::new()
            .with_prompt("Send another broadcast?")
            .default(false)
            .interact()
            .context("Failed to read answer")?;
        if !again {
            break;
        }
    }
    Ok(())
}

async fn cmd_stop(config: &BroadcastConfig) -> Result<()> {
    let publisher = open_publisher(config).await?;
    publisher.stop_broadcasting().await?;
    println!("{} Broadcast stopped", "✓".green());
    Ok(())
}

async fn cmd_show(config: &BroadcastConfig, role: Option<Role>) -> Result<()> {
    let subscriber = Subscriber::mount(open_store(config).await?, role).await?;
    output::print_banner(subscriber.banner().as_ref());
    Ok(())
}

async fn cmd_history(config: &BroadcastConfig, limit: usize) -> Result<()> {
    let history = open_store(config).await?.get_history().await?;
    let shown = history.len().min(limit);
    output::print_history_table(&history[..shown]);
    if history.len() > shown {
        println!("{}", format!("... and {} older", history.len() - shown).dimmed());
    }
    Ok(())
}

async fn cmd_watch(config: &BroadcastConfig, role: Option<Role>) -> Result<()> {
    let store = open_store(config).await?;
    let mut events = store.subscribe();
    let mut subscriber = Subscriber::mount(store, role).await?;

    let viewer = role.map(|r| r.label()).unwrap_or("any role");
    println!("{}", format!("Watching broadcasts for {} (Ctrl+C to stop)\n", viewer).dimmed());
    output::print_banner(subscriber.banner().as_ref());

    loop {
        tokio::select! {
            changed = subscriber.next_change(&mut events) => {
                if !changed? {
                    debug!("Storage events closed");
                    break;
                }
                println!();
                output::print_banner(subscriber.banner().as_ref());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_from_empty_is_everyone() {
        assert_eq!(selection_from(&[]).roles(), Role::RECIPIENTS.to_vec());
    }

    #[test]
    fn test_selection_from_roles() {
        let selection = selection_from(&[Role::FieldOfficer, Role::State]);
        assert_eq!(selection.roles(), vec![Role::State, Role::FieldOfficer]);
    }
}
