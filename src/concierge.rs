//! Canned replies for the free-text "ask Pablo" input.

use crate::content::ContentBundle;
use crate::profile::Profile;
use serde::Serialize;

const MATCHED_TEMPLATE: &str = "Planning {city} for you — want to include {likes} again?";
const UNMATCHED_REPLY: &str = "Noted. Let's customize your experience.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Destination whose content should replace the main view.
    pub destination: Option<String>,
}

/// Reply to free-text input. Blank input gets no reply.
pub fn reply(input: &str, profile: &Profile, content: &ContentBundle) -> Option<Reply> {
    if input.trim().is_empty() {
        return None;
    }
    let reply = match content.match_destination(input) {
        Some(dest) => Reply {
            text: substitute(
                MATCHED_TEMPLATE,
                &[
                    ("city", dest.name.as_str()),
                    ("likes", profile.likes_summary().as_str()),
                ],
            ),
            destination: Some(dest.name.clone()),
        },
        None => Reply {
            text: UNMATCHED_REPLY.to_string(),
            destination: None,
        },
    };
    Some(reply)
}

/// Substitute `{name}` placeholders in `tpl`.
fn substitute(tpl: &str, vars: &[(&str, &str)]) -> String {
    let mut out = tpl.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
