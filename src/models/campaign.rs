//! Campaign singleton record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed key of the singleton campaign row.
pub const CAMPAIGN_ID: &str = "default";

/// Goal used until an administrator sets one.
pub const DEFAULT_GOAL: i64 = 5000;

const SEED_TITLE: &str = "មូលនិធិ៥ពាន់កាបូបនៃស្នាមញញឹម";
const SEED_SUBTITLE: &str = "សម្រាប់ក្មេងៗភៀសសឹក";
const SEED_DONATION_ITEMS: [&str; 5] = [
    "អាវរងារ និង សំលៀកបំពាក់ផ្សេងៗ",
    "ភេសជ្ជៈនំចំណី",
    "សៀវភៅសម្រាប់អាន",
    "សម្ភារៈសម្រាប់សរសេរ និងគូរ",
    "សម្ភារៈក្មេងលេង",
];

/// The single campaign record the whole site reads and mutates.
///
/// Missing fields are filled from the seed defaults, so a partially written
/// local file still yields a complete record. Columns this type does not know
/// about are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignRecord {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub current_bags: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub goal: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub donation_items: Vec<String>,
    pub location_url: Option<String>,
    pub school_name: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for CampaignRecord {
    fn default() -> Self {
        Self {
            id: CAMPAIGN_ID.to_string(),
            title: SEED_TITLE.to_string(),
            subtitle: Some(SEED_SUBTITLE.to_string()),
            current_bags: 0,
            goal: DEFAULT_GOAL,
            donation_items: SEED_DONATION_ITEMS.iter().map(|s| s.to_string()).collect(),
            location_url: Some(String::new()),
            school_name: Some(String::new()),
            last_updated: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl CampaignRecord {
    /// The in-memory default served before anything has been stored.
    pub fn seed() -> Self {
        Self {
            last_updated: Some(Utc::now()),
            ..Self::default()
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep a request field only when it is a JSON number.
fn number_or_ignore<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_f64())
}

/// Keep a request field only when it is a JSON string.
fn string_or_ignore<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Request body for `POST /api/campaign`.
///
/// Fields of the wrong JSON type are ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    #[serde(default, deserialize_with = "string_or_ignore")]
    pub admin_password: Option<String>,
    /// Relative adjustment of the counted total
    #[serde(default, deserialize_with = "number_or_ignore")]
    pub change: Option<f64>,
    /// Absolute value of the counted total; wins over `change`
    #[serde(default, deserialize_with = "number_or_ignore")]
    pub manual: Option<f64>,
    #[serde(default, deserialize_with = "number_or_ignore")]
    pub goal: Option<f64>,
    #[serde(default, deserialize_with = "string_or_ignore")]
    pub title: Option<String>,
}

/// Fields written by an update, echoed back as the response `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignChanges {
    pub current_bags: i64,
    pub goal: i64,
    pub title: String,
    pub last_updated: DateTime<Utc>,
}

/// Request body for `POST /api/admin/validate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAdminRequest {
    #[serde(default, deserialize_with = "string_or_ignore")]
    pub admin_password: Option<String>,
}
