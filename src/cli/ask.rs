use crate::concierge;
use crate::config::Config;
use crate::content::ContentBundle;
use crate::profile::Profile;
use crate::render;
use anyhow::Result;
use tracing::debug;

pub fn run(config: &Config, text: &str, json: bool) -> Result<()> {
    let profile = Profile::load(&config.profile_path());
    let content = ContentBundle::bundled()?;

    let Some(reply) = concierge::reply(text, &profile, &content) else {
        debug!("Blank question, nothing to answer");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!("Pablo: {}\n", reply.text);
    match reply
        .destination
        .as_deref()
        .and_then(|name| content.destination(name))
    {
        Some(dest) => println!("{}", render::render_destination(&dest.view())),
        None => println!("{}", render::render_featured(&content)),
    }
    Ok(())
}
