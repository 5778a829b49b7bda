use std::fmt;

use serde::{Deserialize, Serialize};

/// A playlist-like collection taking part in a transfer.
///
/// Wire form follows the management API: `{"kind": "provider", ...}` for collections hosted by an
/// external provider, `{"kind": "votuna", ...}` for collections managed by this application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionRef {
    Provider {
        provider: String,
        #[serde(rename = "provider_playlist_id")]
        provider_item_id: String,
    },
    #[serde(rename = "votuna")]
    Managed {
        #[serde(rename = "votuna_playlist_id")]
        collection_id: i64,
    },
}

impl CollectionRef {
    pub fn provider(provider: impl Into<String>, provider_item_id: impl Into<String>) -> Self {
        CollectionRef::Provider {
            provider: provider.into(),
            provider_item_id: provider_item_id.into(),
        }
    }

    pub fn managed(collection_id: i64) -> Self {
        CollectionRef::Managed { collection_id }
    }

    /// Stable string key, used for option keys and cache keys.
    pub fn key(&self) -> String {
        match self {
            CollectionRef::Provider {
                provider,
                provider_item_id,
            } => format!("provider:{provider}:{provider_item_id}"),
            CollectionRef::Managed { collection_id } => format!("managed:{collection_id}"),
        }
    }

    pub fn is_managed(&self) -> bool {
        matches!(self, CollectionRef::Managed { .. })
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// The managed collection a transfer panel is opened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCollection {
    pub collection_id: i64,
    pub owner_user_id: i64,
    pub provider: String,
    pub provider_item_id: String,
    pub title: String,
}

impl CurrentCollection {
    pub fn collection_ref(&self) -> CollectionRef {
        CollectionRef::managed(self.collection_id)
    }
}

/// A collection listed by an external provider for the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCollection {
    pub provider: String,
    #[serde(rename = "provider_playlist_id")]
    pub provider_item_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, rename = "track_count")]
    pub item_count: Option<u32>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// A collection owned by this application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedCollection {
    pub id: i64,
    pub owner_user_id: i64,
    pub provider: String,
    #[serde(rename = "provider_playlist_id")]
    pub provider_item_id: String,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One eligible "other side" of a transfer, ready to be shown as a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyCandidate {
    pub collection: CollectionRef,
    pub label: String,
    pub kind_label: String,
    pub image_url: Option<String>,
}

impl CounterpartyCandidate {
    pub fn key(&self) -> String {
        self.collection.key()
    }
}

impl From<ProviderCollection> for CounterpartyCandidate {
    fn from(c: ProviderCollection) -> Self {
        CounterpartyCandidate {
            collection: CollectionRef::provider(c.provider, c.provider_item_id),
            label: c.title,
            kind_label: "Provider playlist".to_string(),
            image_url: c.image_url,
        }
    }
}

impl From<ManagedCollection> for CounterpartyCandidate {
    fn from(c: ManagedCollection) -> Self {
        CounterpartyCandidate {
            collection: CollectionRef::managed(c.id),
            label: c.title,
            kind_label: "Votuna playlist".to_string(),
            image_url: c.image_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    #[serde(rename = "provider_track_id")]
    pub item_id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// One page of the source collection's items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceItemsPage {
    #[serde(rename = "tracks")]
    pub items: Vec<ItemSummary>,
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: u32,
}

/// Advisory genre/artist candidates for a source collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetSuggestions {
    #[serde(default)]
    pub genres: Vec<FacetCount>,
    #[serde(default)]
    pub artists: Vec<FacetCount>,
    #[serde(default, rename = "total_tracks_considered")]
    pub total_items_considered: u32,
}
