use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use feedgrab::cli::{Cli, Commands, RuleCommands};
use feedgrab::config::Config;
use feedgrab::domain::{ChangeNotifier, DownloadRule, Feed};
use feedgrab::errors::{FeedgrabError, FeedgrabResult};
use feedgrab::services::{AutoDownloader, DownloadService, FeedService, FetchService, PollReport};
use feedgrab::sources::RssAtomSource;
use feedgrab::storage::sqlite::{
    SqliteArticleRepository, SqliteDownloadQueueRepository, SqliteFeedRepository,
    SqliteRuleRepository, SqliteStorage,
};

type Feeds = FeedService<SqliteFeedRepository, RssAtomSource>;
type Fetcher = FetchService<SqliteArticleRepository, RssAtomSource>;
type Downloads = DownloadService<SqliteRuleRepository, SqliteDownloadQueueRepository>;

fn main() {
    set_up_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn set_up_logging() {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_regex(false)
                .with_default_directive(Level::WARN.into())
                .with_env_var("FEEDGRAB_LOG")
                .from_env_lossy(),
        )
        .init();
}

fn run() -> FeedgrabResult<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let storage = SqliteStorage::new(&config.db_path)?;

    let feeds = FeedService::new(SqliteFeedRepository::new(storage.clone()), RssAtomSource::new());
    let fetcher = FetchService::new(
        SqliteArticleRepository::new(storage.clone()),
        RssAtomSource::new(),
        config.max_articles_per_feed,
    );
    let downloads = DownloadService::new(
        SqliteRuleRepository::new(storage.clone()),
        SqliteDownloadQueueRepository::new(storage),
    );

    match cli.command {
        Commands::Add { url } => cmd_add(&url, &feeds),
        Commands::Remove => cmd_remove(&feeds),
        Commands::List => cmd_list(&feeds),
        Commands::Articles { feed, unread } => cmd_articles(&feed, unread, &feeds, &fetcher),
        Commands::Read { feed, guid } => cmd_read(&feed, &guid, &feeds, &fetcher),
        Commands::Run { dry_run } => cmd_run(&feeds, &fetcher, &downloads, dry_run),
        Commands::Rule { action } => cmd_rule(action, &feeds, &downloads),
        Commands::Queue => cmd_queue(&downloads),
    }
}

fn cmd_add(url: &str, feeds: &Feeds) -> FeedgrabResult<()> {
    println!("Validating feed: {}", url);

    match feeds.add(url) {
        Ok(feed) => {
            println!("Feed added successfully!");
            println!("  Title: {}", feed.title);
            println!("  Type: {}", feed.feed_type);
            if feed.url != feed.feed_url {
                println!("  Feed: {}", feed.feed_url);
            }
            Ok(())
        }
        Err(FeedgrabError::FeedAlreadyExists(_)) => {
            println!("Feed already exists: {}", url);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_remove(feeds: &Feeds) -> FeedgrabResult<()> {
    let all = feeds.list()?;

    if all.is_empty() {
        println!("No feeds to remove.");
        return Ok(());
    }

    println!("Select a feed to remove:\n");
    for (i, feed) in all.iter().enumerate() {
        println!("  {}. {} [{}] ({})", i + 1, feed.title, feed.feed_type, feed.url);
    }
    println!();

    print!("Enter number (or 'q' to cancel): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") {
        println!("Cancelled.");
        return Ok(());
    }

    let index: usize = input
        .parse()
        .map_err(|_| FeedgrabError::InvalidInput("Invalid number".to_string()))?;

    if index == 0 || index > all.len() {
        return Err(FeedgrabError::InvalidInput("Number out of range".to_string()));
    }

    let feed = &all[index - 1];
    let feed_id = feed
        .id
        .ok_or_else(|| FeedgrabError::FeedNotFound("Feed has no ID".to_string()))?;

    feeds.remove(feed_id)?;
    println!("Removed: {}", feed.title);

    Ok(())
}

fn cmd_list(feeds: &Feeds) -> FeedgrabResult<()> {
    let all = feeds.list()?;

    if all.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    println!("Configured feeds:\n");
    for feed in all {
        println!("  {} [{}]", feed.title, feed.feed_type);
        println!("    URL: {}", feed.url);
        if feed.url != feed.feed_url {
            println!("    Feed: {}", feed.feed_url);
        }
        println!();
    }

    Ok(())
}

fn cmd_articles(url: &str, unread_only: bool, feeds: &Feeds, fetcher: &Fetcher) -> FeedgrabResult<()> {
    let feed = feeds.find(url)?;
    let articles = fetcher.load_articles(&feed, ChangeNotifier::new())?;

    if articles.is_empty() {
        println!("No articles stored for {}.", feed.title);
        return Ok(());
    }

    println!("{} ({} articles, {} unread):\n", feed.title, articles.len(), articles.unread().count());
    for article in articles.iter().filter(|a| !unread_only || !a.is_read()) {
        let marker = if article.is_read() { "x" } else { " " };
        let date = article
            .published_at()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "no date".to_string());

        println!("  [{}] {} ({})", marker, article.title(), date);
        println!("      guid: {}", article.guid());
        if !article.torrent_url().is_empty() {
            println!("      torrent: {}", article.torrent_url());
        }
    }

    Ok(())
}

fn cmd_read(url: &str, guid: &str, feeds: &Feeds, fetcher: &Fetcher) -> FeedgrabResult<()> {
    let feed = feeds.find(url)?;
    let mut articles = fetcher.load_articles(&feed, ChangeNotifier::new())?;

    match articles.mark_read(guid) {
        None => Err(FeedgrabError::InvalidInput(format!("Unknown article: {}", guid))),
        Some(false) => {
            println!("Already read: {}", guid);
            Ok(())
        }
        Some(true) => {
            fetcher.save_articles(&feed, &mut articles)?;
            println!("Marked read: {}", guid);
            Ok(())
        }
    }
}

fn cmd_run(feeds: &Feeds, fetcher: &Fetcher, downloads: &Downloads, dry_run: bool) -> FeedgrabResult<()> {
    let all = feeds.list()?;

    if all.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    let downloader = Arc::new(downloads.auto_downloader()?);
    println!(
        "Fetching {} feeds with {} active rules...\n",
        all.len(),
        downloader.rule_count()
    );

    let mut total_new = 0;
    let mut total_queued = 0;

    for feed in &all {
        match poll_feed(feed, fetcher, downloads, &downloader, dry_run) {
            Ok((report, queued)) => {
                total_new += report.new_articles;
                total_queued += queued;
            }
            Err(e) => {
                // Log error but continue with other feeds
                tracing::warn!(feed = %feed.url, error = %e, "poll failed");
                println!("{}: FAILED: {}\n", feed.title, e);
            }
        }
    }

    if dry_run {
        println!(
            "Dry run complete. {} new articles, would queue {} torrents.",
            total_new, total_queued
        );
    } else {
        println!("{} new articles, queued {} torrents.", total_new, total_queued);
    }

    Ok(())
}

fn poll_feed(
    feed: &Feed,
    fetcher: &Fetcher,
    downloads: &Downloads,
    downloader: &Arc<AutoDownloader>,
    dry_run: bool,
) -> FeedgrabResult<(PollReport, usize)> {
    // Leftovers from a feed that failed mid-poll
    downloader.take_pending();

    let mut articles = fetcher.load_articles(feed, ChangeNotifier::new())?;
    articles.notifier().subscribe(downloader.clone());

    let report = fetcher.poll(feed, &mut articles)?;
    println!(
        "{} ({} new, {} known, {} too old, {} skipped):",
        feed.title, report.new_articles, report.duplicates, report.outdated, report.malformed
    );

    let queued = if dry_run {
        let preview = downloads.preview(downloader, feed, &articles);
        for download in &preview {
            println!("  [DRY RUN] {}", download.format());
        }
        preview.len()
    } else {
        let queued = downloads.process(downloader, feed, &mut articles)?;
        for download in &queued {
            println!("  Queued: {}", download.format());
        }

        let pruned = fetcher.save_articles(feed, &mut articles)?;
        if pruned > 0 {
            println!("  Pruned {} old articles", pruned);
        }
        queued.len()
    };

    println!();
    Ok((report, queued))
}

fn cmd_rule(action: RuleCommands, feeds: &Feeds, downloads: &Downloads) -> FeedgrabResult<()> {
    match action {
        RuleCommands::Add {
            name,
            must_contain,
            must_not_contain,
            feed,
            disabled,
        } => {
            if let Some(url) = &feed {
                feeds.find(url)?;
            }

            let rule = DownloadRule::new(name)
                .with_must_contain(must_contain)
                .with_must_not_contain(must_not_contain)
                .with_feed_url(feed)
                .with_enabled(!disabled);

            let rule = downloads.add_rule(&rule)?;
            println!("Rule added: {}", rule.name);
            Ok(())
        }
        RuleCommands::Remove { name } => {
            downloads.remove_rule(&name)?;
            println!("Removed rule: {}", name);
            Ok(())
        }
        RuleCommands::List => {
            let rules = downloads.list_rules()?;

            if rules.is_empty() {
                println!("No download rules configured.");
                return Ok(());
            }

            println!("Download rules:\n");
            for rule in rules {
                let state = if rule.enabled { "enabled" } else { "disabled" };
                println!("  {} [{}]", rule.name, state);
                if !rule.must_contain.is_empty() {
                    println!("    Must contain: {}", rule.must_contain);
                }
                if !rule.must_not_contain.is_empty() {
                    println!("    Must not contain: {}", rule.must_not_contain);
                }
                if let Some(feed_url) = &rule.feed_url {
                    println!("    Feed: {}", feed_url);
                }
                println!();
            }
            Ok(())
        }
    }
}

fn cmd_queue(downloads: &Downloads) -> FeedgrabResult<()> {
    let queued = downloads.queue()?;

    if queued.is_empty() {
        println!("Download queue is empty.");
        return Ok(());
    }

    println!("Queued downloads:\n");
    for download in queued {
        println!(
            "  {} {}",
            download.queued_at.as_deref().unwrap_or("-"),
            download.format()
        );
    }

    Ok(())
}
