use crate::config::Config;
use crate::profile::Profile;
use crate::render;
use anyhow::Result;

#[derive(Debug, Clone)]
pub enum ProfileAction {
    Show,
    SetName { name: String },
    Like { tag: String },
    Unlike { tag: String },
    Reset,
}

pub fn run(action: ProfileAction, config: &Config) -> Result<()> {
    let path = config.profile_path();
    let mut profile = Profile::load(&path);

    match action {
        ProfileAction::Show => {
            println!("{}", render::render_profile(&profile));
            println!("\nfile:  {}", path.display());
            return Ok(());
        }
        ProfileAction::SetName { name } => profile.set_name(&name)?,
        ProfileAction::Like { tag } => {
            if !profile.like(&tag) {
                println!("Already liked: {}", tag.trim());
                return Ok(());
            }
        }
        ProfileAction::Unlike { tag } => {
            if !profile.unlike(&tag) {
                println!("Not in likes: {}", tag.trim());
                return Ok(());
            }
        }
        ProfileAction::Reset => profile = Profile::default(),
    }

    profile.save(&path)?;
    println!("{}", render::render_profile(&profile));
    Ok(())
}
