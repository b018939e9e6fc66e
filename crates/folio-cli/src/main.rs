//! Folio command line
//!
//! Seeds an in-memory store and drives a gallery through it, printing the
//! resulting state and the notices each operation produced.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use folio_gallery::{
    GalleryConfig, GallerySnapshot, ItemId, Notice, PagedGallery, Principal, Sentinel,
};
use folio_store::MemoryStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct Report {
    snapshot: GallerySnapshot,
    notices: Vec<Notice>,
}

fn cli() -> Command {
    let seed_args = [
        Arg::new("items")
            .long("items")
            .default_value("30")
            .value_parser(value_parser!(usize))
            .help("Number of items to seed the store with"),
        Arg::new("user")
            .long("user")
            .default_value("demo")
            .help("Signed-in user; also the owner of seeded items"),
        Arg::new("anonymous")
            .long("anonymous")
            .action(ArgAction::SetTrue)
            .help("Act without signing in"),
    ];

    Command::new("folio")
        .version(folio_gallery::VERSION)
        .about("Folio paged gallery")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Path to a TOML gallery config"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the final state as JSON"),
        )
        .subcommand(
            Command::new("demo")
                .about("Scroll through a seeded gallery")
                .args(seed_args.clone())
                .arg(
                    Arg::new("pages")
                        .long("pages")
                        .default_value("2")
                        .value_parser(value_parser!(usize))
                        .help("Sentinel crossings to simulate"),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit an item of a seeded gallery")
                .args(seed_args.clone())
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .help("Item to edit, e.g. item-3; pages load until it is listed"),
                )
                .arg(Arg::new("title").long("title").required(true).help("New title"))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .default_value("")
                        .help("New description; empty clears it"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an item of a seeded gallery")
                .args(seed_args)
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .help("Item to delete; pages load until it is listed"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = match matches.get_one::<String>("config") {
        Some(path) => GalleryConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => GalleryConfig::default(),
    };
    let json = matches.get_flag("json");

    let (name, args) = matches.subcommand().context("no subcommand given")?;
    let gallery = open_seeded(config, args).await?;
    let mut notices = gallery.subscribe();

    match name {
        "demo" => {
            let pages = *args.get_one::<usize>("pages").context("missing --pages")?;
            scroll(&gallery, pages).await;
        }
        "edit" => {
            let id = item_id(args)?;
            reveal(&gallery, &id).await?;
            let title = args.get_one::<String>("title").context("missing --title")?;
            let description = args
                .get_one::<String>("description")
                .map_or("", String::as_str);
            if let Err(e) = gallery.apply_edit(&id, title, description).await {
                tracing::warn!("Edit failed: {}", e);
            }
        }
        "delete" => {
            let id = item_id(args)?;
            reveal(&gallery, &id).await?;
            if let Err(e) = gallery.apply_delete(&id).await {
                tracing::warn!("Delete failed: {}", e);
            }
        }
        other => anyhow::bail!("unknown command {other}"),
    }

    let report = Report {
        snapshot: gallery.snapshot(),
        notices: drain(&mut notices),
    };
    gallery.close();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    Ok(())
}

async fn open_seeded(config: GalleryConfig, args: &ArgMatches) -> Result<PagedGallery> {
    let items = *args.get_one::<usize>("items").context("missing --items")?;
    let user = args.get_one::<String>("user").context("missing --user")?;
    let principal = if args.get_flag("anonymous") {
        Principal::Anonymous
    } else {
        Principal::user(user.as_str())
    };

    let store = Arc::new(MemoryStore::seeded(config.clone(), items, Some(user.as_str())));
    PagedGallery::open(store, principal, config)
        .await
        .context("opening gallery")
}

/// Simulate the user scrolling the sentinel into view `crossings` times
///
/// Each crossing brings the sentinel past the threshold, then the freshly
/// rendered page pushes it back out of view.
async fn scroll(gallery: &PagedGallery, crossings: usize) {
    let mut sentinel = Sentinel::new(gallery.config().sentinel_threshold);
    for _ in 0..crossings {
        if sentinel.observe(1.0) {
            match gallery.load_next_page().await {
                Ok(outcome) => tracing::info!("Sentinel load: {:?}", outcome),
                Err(e) => tracing::warn!("Sentinel load failed: {}", e),
            }
        }
        sentinel.observe(0.0);
    }
}

/// Load pages until `id` is listed or the list is exhausted
async fn reveal(gallery: &PagedGallery, id: &ItemId) -> Result<()> {
    while gallery.has_more() && !gallery.items().iter().any(|item| &item.id == id) {
        gallery.load_next_page().await.context("loading pages")?;
    }
    Ok(())
}

fn item_id(args: &ArgMatches) -> Result<ItemId> {
    args.get_one::<String>("id")
        .map(|id| ItemId::from(id.as_str()))
        .context("missing --id")
}

fn drain(notices: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

fn print_text(report: &Report) {
    let snapshot = &report.snapshot;
    println!(
        "{} items loaded (next page {}, more: {})",
        snapshot.items.len(),
        snapshot.page_index,
        snapshot.has_more
    );
    for item in &snapshot.items {
        match &item.description {
            Some(description) => println!("  {}  {}  - {}", item.id, item.title, description),
            None => println!("  {}  {}", item.id, item.title),
        }
    }
    for notice in &report.notices {
        println!("[{:?}] {}: {}", notice.severity, notice.title, notice.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn parses_edit_with_global_flags() {
        let m = cli()
            .try_get_matches_from(["folio", "edit", "--id", "item-3", "--title", "Dune", "--json"])
            .unwrap();
        assert!(m.get_flag("json"));
        let (name, args) = m.subcommand().unwrap();
        assert_eq!(name, "edit");
        assert_eq!(item_id(args).unwrap(), ItemId::from("item-3"));
        assert_eq!(*args.get_one::<usize>("items").unwrap(), 30);
    }

    #[tokio::test]
    async fn demo_scroll_loads_requested_pages() {
        let args = cli()
            .try_get_matches_from(["folio", "demo", "--items", "40"])
            .unwrap();
        let (_, sub) = args.subcommand().unwrap();
        let gallery = open_seeded(GalleryConfig::default(), sub).await.unwrap();

        scroll(&gallery, 2).await;
        assert_eq!(gallery.len(), 36);
        assert!(gallery.has_more());
    }

    #[tokio::test]
    async fn edit_reaches_items_beyond_the_first_page() {
        let args = cli()
            .try_get_matches_from(["folio", "edit", "--id", "item-3", "--title", "Dune"])
            .unwrap();
        let (_, sub) = args.subcommand().unwrap();
        let gallery = open_seeded(GalleryConfig::default(), sub).await.unwrap();
        let id = item_id(sub).unwrap();
        assert!(gallery.items().iter().all(|item| item.id != id));

        reveal(&gallery, &id).await.unwrap();
        gallery.apply_edit(&id, "Dune", "").await.unwrap();

        let edited = gallery.items().into_iter().find(|item| item.id == id).unwrap();
        assert_eq!(edited.title, "Dune");
    }

    #[tokio::test]
    async fn reveal_stops_when_the_list_is_exhausted() {
        let args = cli()
            .try_get_matches_from(["folio", "delete", "--id", "nope", "--items", "20"])
            .unwrap();
        let (_, sub) = args.subcommand().unwrap();
        let gallery = open_seeded(GalleryConfig::default(), sub).await.unwrap();

        reveal(&gallery, &ItemId::from("nope")).await.unwrap();
        assert_eq!(gallery.len(), 20);
        assert!(!gallery.has_more());
    }
}
