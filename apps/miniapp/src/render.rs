//! Plain-text rendering of the page view models.

use std::fmt::Write;

use client_core::{
    views::{LyricsPanel, OrderDetailsView, OrderRow, ProfileView, WelcomeView},
    Notification,
};

pub fn notification(notification: &Notification) -> String {
    let marker = if notification.is_error() { "error" } else { "ok" };
    format!(
        "[{marker}] {}: {}",
        notification.title, notification.description
    )
}

pub fn welcome(view: &WelcomeView) -> String {
    let mut out = view.greeting.clone();
    if view.signed_in {
        let links: Vec<String> = view.links.iter().map(|route| route.path()).collect();
        let _ = write!(out, "\nPages: {}", links.join("  "));
    } else {
        out.push_str("\nNot signed in.");
    }
    out
}

pub fn orders(rows: &[OrderRow], empty_message: &str) -> String {
    if rows.is_empty() {
        return empty_message.to_string();
    }

    let mut out = String::new();
    for row in rows {
        let _ = write!(
            out,
            "#{:<6} {:<15} {}",
            row.id.0,
            row.badge.label(),
            row.title
        );
        if !row.meta.is_empty() {
            let _ = write!(out, " ({})", row.meta);
        }
        let _ = writeln!(out, "  {}  lyrics: {}", row.created, row.lyrics_versions);
    }
    out.trim_end().to_string()
}

pub fn order_details(view: &OrderDetailsView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  [{}]", view.title, view.badge.label());
    if !view.meta.is_empty() {
        let _ = writeln!(out, "{}", view.meta);
    }
    let _ = writeln!(
        out,
        "Order #{}  created {}  language {}",
        view.id.0,
        view.created,
        view.language.display_name()
    );
    if let Some(notes) = &view.notes {
        let _ = writeln!(out, "Notes: {notes}");
    }

    out.push('\n');
    match &view.lyrics {
        LyricsPanel::Latest {
            version,
            created,
            text,
        } => {
            let _ = writeln!(out, "Lyrics v{version} ({created}):");
            for line in text.lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
        LyricsPanel::Placeholder(text) => {
            let _ = writeln!(out, "{text}");
        }
    }

    if !view.audio.is_empty() {
        out.push_str("\nAudio:\n");
        for audio in &view.audio {
            let _ = write!(out, "  {} - {}", audio.kind, audio.status);
            if let Some(duration) = &audio.duration {
                let _ = write!(out, " ({duration})");
            }
            match (&audio.url, audio.playable) {
                (Some(url), true) => {
                    let _ = writeln!(out, "  {url}");
                }
                _ => out.push('\n'),
            }
        }
    }

    if !view.actions.is_empty() {
        let labels: Vec<&str> = view.actions.iter().map(|action| action.label()).collect();
        let _ = writeln!(out, "\nActions: {}", labels.join(", "));
    }
    out.trim_end().to_string()
}

pub fn profile(view: &ProfileView) -> String {
    let mut out = view.name.clone();
    for (label, value) in &view.fields {
        let _ = write!(out, "\n  {label}: {value}");
    }
    out
}
