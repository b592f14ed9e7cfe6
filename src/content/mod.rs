//! Static demo content: destinations, properties, influencers and articles.
//!
//! The bundle is compiled into the binary and never mutated. Views for a
//! destination are derived on demand and returned as owned values.

pub mod matcher;

use crate::script::DemoState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUNDLED_CONTENT: &str = include_str!("../../assets/content/demo.yaml");

/// Number of stay cards and influencer handles derived per destination.
const CARDS_PER_DESTINATION: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCopy {
    pub tag: String,
    pub badge: String,
    pub headline: String,
    pub tagline: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub theme_color: String,
    pub stay_prefix: String,
    pub stay_blurb: String,
    pub activities: Vec<String>,
    pub editorial: Vec<String>,
    pub influencer_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stay {
    pub title: String,
    pub description: String,
}

/// Main-content view for one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationView {
    pub name: String,
    pub theme_color: String,
    pub stays: Vec<Stay>,
    pub activities: Vec<String>,
    pub editorial: Vec<String>,
    pub influencers: Vec<String>,
}

impl Destination {
    pub fn view(&self) -> DestinationView {
        let stays = (1..=CARDS_PER_DESTINATION)
            .map(|i| Stay {
                title: format!("{} {}", self.stay_prefix, i),
                description: self.stay_blurb.clone(),
            })
            .collect();
        let influencers = (1..=CARDS_PER_DESTINATION)
            .map(|i| format!("@{}{}", self.influencer_handle, i))
            .collect();
        DestinationView {
            name: self.name.clone(),
            theme_color: self.theme_color.clone(),
            stays,
            activities: self.activities.clone(),
            editorial: self.editorial.clone(),
            influencers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub price: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub location: String,
    pub rating: f32,
    pub reviews: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    pub name: String,
    pub handle: String,
    pub specialty: String,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub read_time: String,
    #[serde(default)]
    pub trending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extra {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentBundle {
    pub locations: Vec<LocationCopy>,
    pub destinations: Vec<Destination>,
    pub properties: Vec<Property>,
    #[serde(default)]
    pub generic_listing: Vec<String>,
    #[serde(default)]
    pub comparison: Vec<String>,
    #[serde(default)]
    pub influencers: Vec<Influencer>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub itinerary: Vec<String>,
    #[serde(default)]
    pub extras: Vec<Extra>,
}

impl ContentBundle {
    /// The content compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_yaml_str(BUNDLED_CONTENT).context("bundled demo content is invalid")
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let bundle: ContentBundle = serde_yml::from_str(content)?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            anyhow::bail!("content needs at least one location entry");
        }
        for id in self.generic_listing.iter().chain(self.comparison.iter()) {
            if self.property(id).is_none() {
                anyhow::bail!("listing references unknown property '{}'", id);
            }
        }
        Ok(())
    }

    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn destination(&self, name: &str) -> Option<&Destination> {
        self.destinations
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn destination_names(&self) -> impl Iterator<Item = &str> {
        self.destinations.iter().map(|d| d.name.as_str())
    }

    /// First destination whose name appears in `input`.
    pub fn match_destination(&self, input: &str) -> Option<&Destination> {
        let name = matcher::first_match(input, self.destination_names())?;
        self.destination(name)
    }

    /// Hero copy for a location tag; unknown tags use the first entry.
    pub fn location_copy(&self, tag: &str) -> &LocationCopy {
        self.locations
            .iter()
            .find(|l| l.tag == tag)
            .unwrap_or(&self.locations[0])
    }

    /// Property cards to show for a given state: the comparison pair, the
    /// current property, or the generic listing.
    pub fn properties_for(&self, state: &DemoState) -> Vec<&Property> {
        if state.compare_mode {
            return self
                .comparison
                .iter()
                .filter_map(|id| self.property(id))
                .collect();
        }
        if let Some(id) = state.current_property_id.as_deref() {
            return self.property(id).into_iter().collect();
        }
        self.generic_listing
            .iter()
            .filter_map(|id| self.property(id))
            .collect()
    }
}
