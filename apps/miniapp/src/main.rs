mod config;
mod render;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    host::{INIT_DATA_ENV, LOCALE_ENV},
    views::{
        run_command, OrderAction, OrderCommand, OrderDetailsView, OrdersListView, ProfileView,
        StatusFilter, WelcomeView,
    },
    ClientError, CreationWizard, FileSessionStorage, HostContext, MiniApp, Notification, Route,
    StartupOutcome,
};
use shared::{
    domain::{Language, OrderId},
    protocol::{Order, OrderPatch},
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "miniapp", about = "Order personalized songs from the terminal")]
struct Args {
    /// Backend root including the API prefix.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Telegram init data; falls back to TELEGRAM_INIT_DATA.
    #[arg(long, global = true)]
    init_data: Option<String>,
    /// Host language hint; falls back to TELEGRAM_LOCALE.
    #[arg(long, global = true)]
    locale_hint: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange init data for a session.
    Login,
    Logout,
    Profile,
    /// Switch the profile language (ru, kz, en).
    Locale { language: String },
    /// List orders, optionally filtered by tab (all, draft, pending, ready).
    Orders {
        #[arg(long, default_value = "all")]
        filter: String,
        #[arg(long, default_value = "")]
        search: String,
    },
    Show { id: i64 },
    /// Walk the creation wizard with the given answers and submit.
    Create {
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        tempo: Option<String>,
        #[arg(long)]
        occasion: Option<String>,
        #[arg(long, default_value = "")]
        recipient: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        mood: Option<String>,
        #[arg(long)]
        tempo: Option<String>,
        #[arg(long)]
        occasion: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Lyrics {
        id: i64,
        #[command(subcommand)]
        action: LyricsCommand,
    },
    Approve { id: i64 },
    /// Start audio generation for an approved order.
    Audio { id: i64 },
    Pay { id: i64 },
    /// Re-fetch an order until its status changes.
    Watch {
        id: i64,
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
        #[arg(long, default_value_t = 60)]
        max_polls: u32,
    },
}

#[derive(Subcommand, Debug)]
enum LyricsCommand {
    Generate,
    Regenerate,
    /// Submit edited lyrics as a new version.
    Edit {
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

const LOGIN_HINT: &str = "the session is missing or expired; run `miniapp login`";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    run(args).await.map_err(with_login_hint)
}

async fn run(args: Args) -> Result<()> {
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(url) = &args.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    if let Some(path) = &args.session_file {
        settings.session_path = Some(path.clone());
    }

    let session_path = settings.session_path()?;
    debug!(api = %settings.api_base_url, session = %session_path.display(), "settings loaded");
    let storage = Arc::new(FileSessionStorage::new(session_path));
    let app = MiniApp::new(&settings.client_config(), storage)
        .await
        .context("failed to initialize client")?;

    let host = HostContext::new(
        args.init_data.clone().or_else(|| std::env::var(INIT_DATA_ENV).ok()),
        args.locale_hint.clone().or_else(|| std::env::var(LOCALE_ENV).ok()),
    );

    match args.command {
        Command::Login => {
            let init_data = host
                .init_data()
                .ok_or_else(|| anyhow!("pass --init-data or set {INIT_DATA_ENV}"))?;
            app.auth().login(init_data).await?;
            println!("{}", render::welcome(&WelcomeView::from_auth(&app.auth().snapshot().await)));
        }
        Command::Logout => {
            app.sign_out().await?;
            println!("Signed out.");
        }
        Command::Profile => {
            ensure_signed_in(&app, &host).await?;
            let user = app.auth().user().await;
            println!("{}", render::profile(&ProfileView::from_user(user.as_ref())));
        }
        Command::Locale { language } => {
            ensure_signed_in(&app, &host).await?;
            let language = parse_language(&language)?;
            app.change_locale(language).await?;
            let user = app.auth().user().await;
            println!("{}", render::profile(&ProfileView::from_user(user.as_ref())));
        }
        Command::Orders { filter, search } => {
            ensure_signed_in(&app, &host).await?;
            let filter = StatusFilter::parse(&filter)
                .ok_or_else(|| anyhow!("unknown filter '{filter}', expected all, draft, pending or ready"))?;
            let view = OrdersListView::new(filter, search);
            app.load_orders(&view).await?;
            let rows = view.rows(&app.orders().orders().await);
            println!("{}", render::orders(&rows, view.empty_message()));
        }
        Command::Show { id } => {
            ensure_signed_in(&app, &host).await?;
            show_order(&app, OrderId(id)).await?;
        }
        Command::Create {
            language,
            genre,
            mood,
            tempo,
            occasion,
            recipient,
            notes,
        } => {
            ensure_signed_in(&app, &host).await?;
            let language = match language {
                Some(tag) => parse_language(&tag)?,
                None => host.detect_language(),
            };

            let mut wizard = CreationWizard::new();
            wizard.set_language(language);
            if let Some(genre) = genre {
                wizard.select_genre(&genre)?;
            }
            if let Some(mood) = mood {
                wizard.select_mood(&mood)?;
            }
            if let Some(tempo) = tempo {
                wizard.select_tempo(&tempo)?;
            }
            if let Some(occasion) = occasion {
                wizard.select_occasion(&occasion)?;
            }
            wizard.set_recipient(recipient);
            wizard.set_notes(notes);
            while wizard.next() {}

            for line in wizard.summary() {
                println!("{line}");
            }
            let outcome = wizard.submit(app.orders()).await;
            println!("{}", render::notification(&outcome.notification));
            let Some(Route::OrderDetails(id)) = outcome.navigate_to else {
                bail!("order was not created");
            };
            let view = app.load_order(id).await?;
            println!("\n{}", render::order_details(&view));
        }
        Command::Update {
            id,
            genre,
            mood,
            tempo,
            occasion,
            recipient,
            notes,
        } => {
            ensure_signed_in(&app, &host).await?;
            let patch = OrderPatch {
                genre,
                mood,
                tempo,
                occasion,
                recipient,
                notes,
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            app.orders().update_order(OrderId(id), &patch).await?;
            show_order(&app, OrderId(id)).await?;
        }
        Command::Lyrics { id, action } => {
            ensure_signed_in(&app, &host).await?;
            let (action, command) = match action {
                LyricsCommand::Generate => (OrderAction::GenerateLyrics, OrderCommand::GenerateLyrics),
                LyricsCommand::Regenerate => {
                    (OrderAction::RegenerateLyrics, OrderCommand::RegenerateLyrics)
                }
                LyricsCommand::Edit { text, file } => {
                    let text = match (text, file) {
                        (Some(text), _) => text,
                        (None, Some(path)) => std::fs::read_to_string(&path)
                            .with_context(|| format!("failed to read '{}'", path.display()))?,
                        (None, None) => bail!("pass --text or --file"),
                    };
                    (OrderAction::EditLyrics, OrderCommand::SubmitLyricsEdit(text))
                }
            };
            run_action(&app, OrderId(id), Some(action), command).await?;
        }
        Command::Approve { id } => {
            ensure_signed_in(&app, &host).await?;
            run_action(&app, OrderId(id), Some(OrderAction::Approve), OrderCommand::Approve).await?;
        }
        Command::Audio { id } => {
            ensure_signed_in(&app, &host).await?;
            run_action(
                &app,
                OrderId(id),
                Some(OrderAction::GenerateAudio),
                OrderCommand::GenerateAudio,
            )
            .await?;
        }
        Command::Pay { id } => {
            ensure_signed_in(&app, &host).await?;
            run_action(&app, OrderId(id), None, OrderCommand::Pay).await?;
        }
        Command::Watch {
            id,
            interval_secs,
            max_polls,
        } => {
            ensure_signed_in(&app, &host).await?;
            watch_order(&app, OrderId(id), Duration::from_secs(interval_secs.max(1)), max_polls)
                .await?;
        }
    }

    Ok(())
}

async fn ensure_signed_in(app: &MiniApp, host: &HostContext) -> Result<()> {
    match app.start(host).await {
        StartupOutcome::Authenticated | StartupOutcome::Restored => Ok(()),
        StartupOutcome::Unauthenticated => {
            let reason = app.auth().error().await.unwrap_or_default();
            bail!("not signed in: {reason}; run `miniapp login`")
        }
    }
}

fn parse_language(tag: &str) -> Result<Language> {
    Language::from_tag(tag).ok_or_else(|| anyhow!("unsupported language '{tag}', expected ru, kz or en"))
}

fn failed(notification: Notification) -> anyhow::Error {
    anyhow!(notification.description)
}

/// Points at `login` when the backend rejected the stored credential.
fn with_login_hint(err: anyhow::Error) -> anyhow::Error {
    let reauth = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ClientError>())
        .any(ClientError::requires_reauth);
    if reauth {
        err.context(LOGIN_HINT)
    } else {
        err
    }
}

async fn show_order(app: &MiniApp, id: OrderId) -> Result<()> {
    let view = app.load_order(id).await?;
    println!("{}", render::order_details(&view));
    Ok(())
}

/// Runs a details-page action, refusing it when the page would not offer it.
async fn run_action(
    app: &MiniApp,
    id: OrderId,
    action: Option<OrderAction>,
    command: OrderCommand,
) -> Result<()> {
    let view = app.load_order(id).await?;
    if let Some(action) = action {
        if !view.allows(action) {
            bail!(
                "'{}' is not available while the order is {}",
                action.label(),
                view.badge.label()
            );
        }
    }

    let outcome = run_command(app.orders(), id, command).await;
    if outcome.notification.is_error() {
        return Err(failed(outcome.notification));
    }
    println!("{}", render::notification(&outcome.notification));
    if let Some(payload) = outcome.payload {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(())
}

/// Polls until the status differs from the first fetch and returns the changed order.
async fn watch_order(app: &MiniApp, id: OrderId, interval: Duration, max_polls: u32) -> Result<Order> {
    let initial = app.orders().fetch_order(id).await?;
    info!(order_id = %id, status = %initial.status, "watching order");
    println!("Order #{} is {}; checking every {interval:?}", id, initial.status);

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    for poll in 1..=max_polls {
        ticker.tick().await;
        let order = app.orders().fetch_order(id).await?;
        debug!(order_id = %id, poll, status = %order.status, "polled order");
        if order.status != initial.status {
            println!("Status changed: {} -> {}", initial.status, order.status);
            println!("{}", render::order_details(&OrderDetailsView::from_order(&order)));
            return Ok(order);
        }
    }

    bail!(
        "order #{id} is still {} after {max_polls} checks",
        initial.status
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
