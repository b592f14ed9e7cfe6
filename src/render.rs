use crate::content::{ContentBundle, DestinationView, Property};
use crate::player::{NoticeKind, Phase, PlaybackCursor, PlayerSnapshot};
use crate::profile::Profile;
use crate::script::{DemoState, DisplayedMessage, Speaker};

pub fn render_message(m: &DisplayedMessage) -> String {
    format!("{}: {}", m.speaker.label(), m.text)
}

pub fn render_transcript(messages: &[DisplayedMessage]) -> String {
    if messages.is_empty() {
        return "(no messages yet)".to_string();
    }
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix printed before a message is revealed character by character.
pub fn typing_prefix(speaker: Speaker) -> String {
    format!("{}: ", speaker.label())
}

pub fn render_thinking() -> &'static str {
    "Pablo is thinking…"
}

pub fn render_notice(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::PaymentProcessing => "💳 Processing payment…",
        NoticeKind::BookingConfirmed => "✅ Booking confirmed! Check your email for details.",
    }
}

pub fn render_progress(cursor: &PlaybackCursor, total: usize, phase: Phase) -> String {
    let status = match (phase, cursor.playing) {
        (Phase::Done, _) => "done",
        (_, true) => "playing",
        (_, false) => "paused",
    };
    format!(
        "[{}/{}] {} · {}",
        cursor.index, total, status, cursor.speed
    )
}

pub fn render_property(p: &Property) -> String {
    let mut out = format!(
        "▸ {} ({})\n  {} · ★ {:.1} ({} reviews)\n  {}",
        p.title, p.location, p.price, p.rating, p.reviews, p.description
    );
    if !p.amenities.is_empty() {
        out.push_str(&format!("\n  {}", p.amenities.join(" • ")));
    }
    out
}

/// The main content pane for a given state.
pub fn render_state(state: &DemoState, content: &ContentBundle, loading: bool) -> String {
    let copy = content.location_copy(&state.location_tag);
    let mut out = format!("{}\n{}\n{}\n", copy.badge, copy.headline, copy.tagline);

    if state.auth_prompt_visible {
        out.push_str("\n[ Continue with Google ]  [ Continue with Apple ]\n");
    }

    let heading = if state.compare_mode {
        "Compare stays"
    } else if state.current_property_id.is_some() {
        "Recommended stay"
    } else {
        "Popular stays"
    };
    out.push_str(&format!("\n{}\n", heading));
    let properties = content.properties_for(state);
    if loading {
        for _ in 0..properties.len().max(1) {
            out.push_str("▸ ░░░░░░░░░░░░\n");
        }
    } else {
        for p in properties {
            out.push_str(&render_property(p));
            out.push('\n');
        }
    }

    if state.itinerary_visible {
        out.push_str("\nItinerary\n");
        for (i, item) in content.itinerary.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, item));
        }
    }

    if state.extras_visible {
        out.push_str("\nExtras\n");
        for extra in &content.extras {
            out.push_str(&format!("  + {} ({})\n", extra.title, extra.detail));
        }
    }

    out
}

/// Full screen: content pane, notices, transcript and progress line.
pub fn render_snapshot(snap: &PlayerSnapshot, content: &ContentBundle) -> String {
    let mut out = render_state(&snap.state, content, snap.loading);
    if snap.payment_processing {
        out.push_str(&format!("\n{}\n", render_notice(NoticeKind::PaymentProcessing)));
    }
    if snap.booking_confirmed {
        out.push_str(&format!("\n{}\n", render_notice(NoticeKind::BookingConfirmed)));
    }
    out.push('\n');
    out.push_str(&render_transcript(&snap.messages));
    out.push('\n');
    if let Some(partial) = &snap.partial {
        out.push_str(&format!("{}{}▌\n", typing_prefix(partial.speaker), partial.text));
    } else if snap.thinking {
        out.push_str(render_thinking());
        out.push('\n');
    }
    out.push_str(&render_progress(&snap.cursor, snap.total_steps, snap.phase));
    out
}

pub fn render_destination(view: &DestinationView) -> String {
    let mut out = format!("{} ({})\n\nStays\n", view.name, view.theme_color);
    for stay in &view.stays {
        out.push_str(&format!("  ▸ {} · {}\n", stay.title, stay.description));
    }
    out.push_str("\nThings to do\n");
    for activity in &view.activities {
        out.push_str(&format!("  - {}\n", activity));
    }
    out.push_str("\nReads\n");
    for title in &view.editorial {
        out.push_str(&format!("  - {}\n", title));
    }
    out.push_str(&format!("\nLocals to follow: {}", view.influencers.join(" ")));
    out
}

/// Featured creators and articles shown when nothing was matched.
pub fn render_featured(content: &ContentBundle) -> String {
    let mut out = String::from("Featured creators\n");
    for i in &content.influencers {
        out.push_str(&format!("  {} ({}) · {}: \"{}\"\n", i.name, i.handle, i.specialty, i.tip));
    }
    out.push_str("\nTrending reads\n");
    for a in content.articles.iter().filter(|a| a.trending) {
        out.push_str(&format!("  - {} by {} ({})\n", a.title, a.author, a.read_time));
    }
    out
}

pub fn render_profile(profile: &Profile) -> String {
    let likes = if profile.likes.is_empty() {
        "(none)".to_string()
    } else {
        profile.likes_summary()
    };
    format!("name:  {}\nlikes: {}", profile.name, likes)
}
