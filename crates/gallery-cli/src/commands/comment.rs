//! Comment command
//!
//! Create, moderate and inspect comments.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use gallery_core::comment::{Comment, CommentBuilder, CommentState, RequestMetadata, SaveOutcome};
use gallery_core::error::GalleryError;
use gallery_core::types::{CommentId, IdentityId, ItemId};

use super::context::{Paths, Store};

/// Comment subcommands
#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// Create a comment
    Create(CreateArgs),

    /// Edit or moderate a comment
    Update(UpdateArgs),

    /// Mark a comment as deleted
    Delete {
        /// Comment ID
        id: CommentId,
    },

    /// Show a comment
    Show {
        /// Comment ID
        id: CommentId,

        /// Output the REST representation as JSON
        #[arg(long)]
        json: bool,
    },

    /// List comments
    List {
        /// Only comments on this item
        #[arg(long)]
        item: Option<ItemId>,

        /// Only comments whose item this identity may view
        #[arg(long)]
        viewer: Option<IdentityId>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments for `comment create`
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Item to comment on
    #[arg(long)]
    pub item: ItemId,

    /// Author identity (default: guest)
    #[arg(long)]
    pub author: Option<IdentityId>,

    #[arg(long)]
    pub guest_name: Option<String>,

    #[arg(long)]
    pub guest_email: Option<String>,

    #[arg(long)]
    pub guest_url: Option<String>,

    /// published, unpublished, spam or deleted (default: published)
    #[arg(long)]
    pub state: Option<String>,

    /// Comment text
    #[arg(long)]
    pub text: String,
}

/// Arguments for `comment update`
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Comment ID
    pub id: CommentId,

    #[arg(long)]
    pub text: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub guest_name: Option<String>,

    #[arg(long)]
    pub guest_email: Option<String>,

    #[arg(long)]
    pub guest_url: Option<String>,
}

/// Execute the comment command
pub fn execute(paths: &Paths, cmd: CommentCommand) -> Result<()> {
    let store = paths.open()?;

    match cmd {
        CommentCommand::Create(args) => create_comment(&store, args),
        CommentCommand::Update(args) => update_comment(&store, args),
        CommentCommand::Delete { id } => delete_comment(&store, id),
        CommentCommand::Show { id, json } => show_comment(&store, id, json),
        CommentCommand::List { item, viewer, json } => list_comments(&store, item, viewer, json),
    }
}

/// Request metadata from the CGI environment, if any
fn request_from_env() -> RequestMetadata {
    RequestMetadata::from_cgi(|key| std::env::var(key).ok())
}

fn create_comment(store: &Store, args: CreateArgs) -> Result<()> {
    let manager = &store.manager;
    let author = match args.author {
        Some(id) => id,
        None => manager.identities().guest()?.id,
    };

    let mut builder = CommentBuilder::new(args.item)
        .author(author)
        .text(args.text);
    if let Some(name) = args.guest_name {
        builder = builder.guest_name(name);
    }
    if let Some(email) = args.guest_email {
        builder = builder.guest_email(email);
    }
    if let Some(url) = args.guest_url {
        builder = builder.guest_url(url);
    }
    if let Some(state) = args.state {
        builder = builder.state(state);
    }

    // New drafts go through save so a published comment notifies its item
    let outcome = manager
        .save(builder.build(), &request_from_env())
        .context("Failed to create comment")?;
    report("Created", &outcome);
    Ok(())
}

fn update_comment(store: &Store, args: UpdateArgs) -> Result<()> {
    let manager = &store.manager;
    let comment = manager.get(args.id)?;

    let mut builder = CommentBuilder::edit(&comment);
    if let Some(text) = args.text {
        builder = builder.text(text);
    }
    if let Some(state) = args.state {
        builder = builder.state(state);
    }
    if let Some(name) = args.guest_name {
        builder = builder.guest_name(name);
    }
    if let Some(email) = args.guest_email {
        builder = builder.guest_email(email);
    }
    if let Some(url) = args.guest_url {
        builder = builder.guest_url(url);
    }

    let outcome = manager
        .save(builder.build(), &request_from_env())
        .with_context(|| format!("Failed to update comment {}", args.id))?;
    report("Updated", &outcome);
    Ok(())
}

fn delete_comment(store: &Store, id: CommentId) -> Result<()> {
    let outcome = store
        .manager
        .delete(id)
        .with_context(|| format!("Failed to delete comment {}", id))?;
    report("Deleted", &outcome);
    Ok(())
}

fn report(action: &str, outcome: &SaveOutcome) {
    let id = outcome
        .comment
        .id
        .map(|id| id.to_string())
        .unwrap_or_default();
    println!(
        "{} {} comment #{} [{}]",
        "✓".green(),
        action,
        id.cyan(),
        outcome.comment.state
    );
    let events = outcome.event_names().join(", ");
    println!("  {}", format!("events: {}", events).dimmed());
}

fn show_comment(store: &Store, id: CommentId, as_json: bool) -> Result<()> {
    let manager = &store.manager;

    if as_json {
        let restful = manager.restful(id)?;
        println!("{}", serde_json::to_string_pretty(&restful)?);
        return Ok(());
    }

    let comment = manager.get(id)?;
    let identities = manager.identities();

    println!("{}", "Comment Details".bold().underline());
    println!();
    println!("  ID: {}", id.to_string().green());
    match comment.item(manager.items())? {
        Some(item) => println!(
            "  Item: {} ({})",
            item.title,
            manager.item_url(&item).dimmed()
        ),
        None => println!("  Item: {} {}", comment.item_id, "(missing)".red()),
    }
    println!(
        "  Author: {}",
        comment.author_name(identities)?.unwrap_or_default()
    );
    if let Some(email) = comment.author_email(identities)? {
        println!("  Email: {}", email);
    }
    if let Some(url) = comment.author_url(identities)? {
        println!("  URL: {}", url);
    }
    println!("  State: {}", colored_state(comment.state));
    println!("  Created: {}", comment.created.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated: {}", comment.updated.format("%Y-%m-%d %H:%M:%S"));
    if let Some(addr) = &comment.server.server_remote_addr {
        println!("  From: {}", addr.dimmed());
    }
    println!();
    println!("{}", comment.text);

    Ok(())
}

fn list_comments(
    store: &Store,
    item: Option<ItemId>,
    viewer: Option<IdentityId>,
    as_json: bool,
) -> Result<()> {
    let manager = &store.manager;

    let mut comments: Vec<Comment> = match viewer {
        Some(viewer_id) => {
            let viewer = manager
                .identities()
                .lookup(viewer_id)?
                .ok_or_else(|| anyhow!("Unknown identity: {}", viewer_id))?;
            manager.viewable(&viewer)?
        }
        None => manager.all()?,
    };

    if let Some(item_id) = item {
        if !manager.items().exists(item_id)? {
            return Err(GalleryError::ItemNotFound(item_id).into());
        }
        comments.retain(|c| c.item_id == item_id);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    println!("{}", "Comments:".bold().underline());
    println!();

    for comment in &comments {
        let id = comment.id.map(|id| id.to_string()).unwrap_or_default();
        let author = comment
            .author_name(manager.identities())?
            .unwrap_or_default();
        println!(
            "  #{} {} item {} by {}: {}",
            id.green(),
            colored_state(comment.state),
            comment.item_id,
            author.cyan(),
            first_line(&comment.text)
        );
    }

    println!("\n  {} comment(s), {} item(s) in catalog", comments.len(), store.catalog.items().len());

    Ok(())
}

fn colored_state(state: CommentState) -> colored::ColoredString {
    let label = format!("[{}]", state);
    match state {
        CommentState::Published => label.green(),
        CommentState::Unpublished => label.yellow(),
        CommentState::Spam => label.red(),
        CommentState::Deleted => label.dimmed(),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
