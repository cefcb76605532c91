use chrono::Utc;
use shared::{domain::AudioAssetId, protocol::AudioAsset};

use super::*;
use crate::mock_backend::{sample_lyrics, sample_order, sample_user, spawn_backend};

fn audio(kind: AudioKind, status: AudioStatus, url: Option<&str>) -> AudioAsset {
    AudioAsset {
        id: AudioAssetId(1),
        kind,
        url: url.map(str::to_string),
        duration_sec: Some(61.6),
        status,
        created_at: Utc::now(),
    }
}

#[test]
fn title_falls_back_when_recipient_is_blank() {
    let mut order = sample_order(1, OrderStatus::Draft);
    assert_eq!(order_title(&order), "Song for Anna");
    order.recipient = Some("  ".into());
    assert_eq!(order_title(&order), "New song");
    order.recipient = None;
    assert_eq!(order_title(&order), "New song");
}

#[test]
fn meta_joins_only_present_fields() {
    let mut order = sample_order(1, OrderStatus::Draft);
    assert_eq!(order_meta(&order), "birthday • pop");
    order.mood = Some("happy".into());
    assert_eq!(order_meta(&order), "birthday • pop • happy");
    order.occasion = None;
    order.genre = None;
    order.mood = None;
    assert_eq!(order_meta(&order), "");
}

#[test]
fn every_status_gets_a_badge_labelled_with_its_wire_name() {
    for status in OrderStatus::ALL {
        let badge = StatusBadge::for_status(status);
        assert_eq!(badge.label(), status.as_str());
    }
    assert_eq!(StatusBadge::for_status(OrderStatus::Canceled).tone, BadgeTone::Danger);
}

#[test]
fn filter_tabs_map_to_backend_statuses() {
    assert_eq!(StatusFilter::parse("Ready"), Some(StatusFilter::Ready));
    assert_eq!(StatusFilter::parse("archived"), None);

    assert_eq!(OrdersListView::default().query().status, None);
    let pending = OrdersListView::new(StatusFilter::Pending, "");
    assert_eq!(pending.query().status.as_deref(), Some("pending_lyrics"));
    let ready = OrdersListView::new(StatusFilter::Ready, "");
    assert_eq!(ready.query().status.as_deref(), Some("lyrics_ready"));
}

#[test]
fn search_matches_recipient_occasion_or_genre() {
    let mut wedding = sample_order(2, OrderStatus::Draft);
    wedding.recipient = Some("Dana".into());
    wedding.occasion = Some("wedding".into());
    wedding.genre = Some("folk".into());
    let orders = vec![sample_order(1, OrderStatus::Draft), wedding];

    let ids = |search: &str| -> Vec<i64> {
        OrdersListView::new(StatusFilter::All, search)
            .rows(&orders)
            .iter()
            .map(|row| row.id.0)
            .collect()
    };
    assert_eq!(ids(""), vec![1, 2]);
    assert_eq!(ids("ANNA"), vec![1]);
    assert_eq!(ids("wed"), vec![2]);
    assert_eq!(ids("folk"), vec![2]);
    assert!(ids("jazz").is_empty());
}

#[test]
fn empty_message_depends_on_filters() {
    assert_eq!(
        OrdersListView::default().empty_message(),
        "You have no orders yet. Create your first song!"
    );
    assert_eq!(
        OrdersListView::new(StatusFilter::Draft, "").empty_message(),
        "No orders found"
    );
    assert_eq!(
        OrdersListView::new(StatusFilter::All, "x").empty_message(),
        "No orders found"
    );
}

#[test]
fn rows_link_to_detail_pages() {
    let mut order = sample_order(5, OrderStatus::LyricsReady);
    order.lyrics_versions.push(sample_lyrics(1, 1, "la la"));
    let rows = OrdersListView::default().rows(&[order]);
    assert_eq!(rows[0].route, Route::OrderDetails(OrderId(5)));
    assert_eq!(rows[0].lyrics_versions, 1);
    assert_eq!(rows[0].badge.label(), "lyrics_ready");
}

#[test]
fn actions_follow_order_status() {
    let draft = sample_order(1, OrderStatus::Draft);
    assert_eq!(available_actions(&draft), vec![OrderAction::GenerateLyrics]);

    let mut ready = sample_order(1, OrderStatus::LyricsReady);
    assert!(available_actions(&ready).is_empty(), "no lyrics to act on yet");
    ready.lyrics_versions.push(sample_lyrics(1, 1, "text"));
    assert_eq!(
        available_actions(&ready),
        vec![
            OrderAction::EditLyrics,
            OrderAction::RegenerateLyrics,
            OrderAction::Approve
        ]
    );

    let mut approved = sample_order(1, OrderStatus::Approved);
    assert_eq!(available_actions(&approved), vec![OrderAction::GenerateAudio]);
    approved
        .audio_assets
        .push(audio(AudioKind::Preview, AudioStatus::Queued, None));
    assert!(available_actions(&approved).is_empty());

    for status in [
        OrderStatus::PendingLyrics,
        OrderStatus::Generating,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ] {
        assert!(available_actions(&sample_order(1, status)).is_empty());
    }
}

#[test]
fn details_show_latest_lyrics_by_version_number() {
    let mut order = sample_order(1, OrderStatus::LyricsReady);
    order.lyrics_versions.push(sample_lyrics(2, 2, "second"));
    order.lyrics_versions.push(sample_lyrics(1, 1, "first"));
    order.notes = Some("   ".into());

    let view = OrderDetailsView::from_order(&order);
    assert!(matches!(
        &view.lyrics,
        LyricsPanel::Latest { version: 2, text, .. } if text == "second"
    ));
    assert_eq!(view.notes, None);
    assert!(view.allows(OrderAction::Approve));
    assert!(!view.allows(OrderAction::GenerateAudio));
}

#[test]
fn lyrics_placeholder_depends_on_status() {
    let pending = OrderDetailsView::from_order(&sample_order(1, OrderStatus::PendingLyrics));
    assert_eq!(pending.lyrics, LyricsPanel::Placeholder("Generating lyrics..."));
    let draft = OrderDetailsView::from_order(&sample_order(1, OrderStatus::Draft));
    assert_eq!(draft.lyrics, LyricsPanel::Placeholder("Lyrics not created yet"));
}

#[test]
fn audio_rows_report_playability() {
    let mut order = sample_order(1, OrderStatus::Delivered);
    order.audio_assets.push(audio(
        AudioKind::Full,
        AudioStatus::Ready,
        Some("https://cdn.example/song.mp3"),
    ));
    order
        .audio_assets
        .push(audio(AudioKind::Preview, AudioStatus::Ready, None));

    let view = OrderDetailsView::from_order(&order);
    assert_eq!(view.audio[0].kind, "Full version");
    assert_eq!(view.audio[0].duration.as_deref(), Some("62s"));
    assert!(view.audio[0].playable);
    assert!(!view.audio[1].playable);
}

#[test]
fn welcome_greets_signed_in_user() {
    let guest = WelcomeView::from_auth(&AuthState::default());
    assert!(!guest.signed_in);
    assert_eq!(guest.greeting, "Hi! Let's make a song.");

    let auth = AuthState {
        user: Some(sample_user()),
        is_authenticated: true,
        ..AuthState::default()
    };
    let welcome = WelcomeView::from_auth(&auth);
    assert!(welcome.signed_in);
    assert_eq!(welcome.greeting, "Hi, Anna! Let's make a song.");
    assert_eq!(welcome.links, vec![Route::Create, Route::Orders, Route::Profile]);
}

#[test]
fn profile_lists_known_fields() {
    let guest = ProfileView::from_user(None);
    assert_eq!(guest.name, "Guest");
    assert!(guest.fields.is_empty());

    let user = sample_user();
    let profile = ProfileView::from_user(Some(&user));
    assert_eq!(profile.name, "Anna");
    assert_eq!(profile.locale, Some(Language::Ru));
    let labels: Vec<_> = profile.fields.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["Telegram ID", "Username", "Language", "Member since"]);
    assert_eq!(profile.fields[1].1, "@anna_k");
}

#[tokio::test]
async fn commands_report_success_and_failure() {
    let backend = spawn_backend().await;
    let store = OrderStore::new(backend.signed_in_transport().await);
    let mut order = sample_order(7, OrderStatus::LyricsReady);
    order.lyrics_versions.push(sample_lyrics(1, 1, "v1"));
    backend.insert_order(order).await;
    store.fetch_order(OrderId(7)).await.expect("open");

    let saved = run_command(&store, OrderId(7), OrderCommand::SubmitLyricsEdit("v2".into())).await;
    assert_eq!(saved.notification.description, "Saved as version 2");

    let approved = run_command(&store, OrderId(7), OrderCommand::Approve).await;
    assert_eq!(approved.notification.title, "Order approved");
    assert_eq!(
        store.current_order().await.map(|o| o.status),
        Some(OrderStatus::Approved)
    );

    let paid = run_command(&store, OrderId(7), OrderCommand::Pay).await;
    assert_eq!(
        paid.payload.as_ref().map(|payload| payload["order_id"].clone()),
        Some(serde_json::json!(7))
    );

    let missing = run_command(&store, OrderId(99), OrderCommand::GenerateAudio).await;
    assert!(missing.notification.is_error());
    assert_eq!(missing.notification.description, "request failed (404): Order not found");
    assert_eq!(missing.payload, None);
}

#[tokio::test]
async fn orders_page_load_failure_becomes_notification() {
    let backend = spawn_backend().await;
    let store = OrderStore::new(backend.transport());

    let err = OrdersListView::default()
        .load(&store)
        .await
        .expect_err("not signed in");
    assert_eq!(err.title, "Error");
    assert!(err.is_error());
}
