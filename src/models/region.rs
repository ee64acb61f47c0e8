//! Region record - one per federated state, keyed by its two-letter code.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The fixed set of tracked regions as `(code, display name)`.
pub const REGION_CATALOG: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AP", "Amapá"),
    ("AM", "Amazonas"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MT", "Mato Grosso"),
    ("MS", "Mato Grosso do Sul"),
    ("MG", "Minas Gerais"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PR", "Paraná"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RS", "Rio Grande do Sul"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("SC", "Santa Catarina"),
    ("SP", "São Paulo"),
    ("SE", "Sergipe"),
    ("TO", "Tocantins"),
];

/// Note recorded on the first history entry of every seeded region.
pub const SEED_NOTE: &str = "system initialization";

/// Workflow state of a region's re-registration.
///
/// Variants are listed in workflow order. The order only drives the progress
/// heuristic; any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Nothing has happened yet
    #[serde(rename = "Não Iniciada")]
    NotStarted,
    /// First contact made
    #[serde(rename = "Iniciada")]
    Started,
    /// Work under way
    #[serde(rename = "Em Andamento")]
    InProgress,
    /// Waiting on the region
    #[serde(rename = "Pendente")]
    Pending,
    /// Process concluded, awaiting confirmation
    #[serde(rename = "Concluída")]
    Concluded,
    /// Re-registration confirmed
    #[serde(rename = "Recadastrado com Sucesso")]
    ReRegistered,
}

impl RegistrationStatus {
    /// All states in workflow order.
    pub const ALL: [Self; 6] = [
        Self::NotStarted,
        Self::Started,
        Self::InProgress,
        Self::Pending,
        Self::Concluded,
        Self::ReRegistered,
    ];

    /// Display heuristic for how far along the workflow a region is.
    #[must_use]
    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Started => 25,
            Self::InProgress => 50,
            Self::Pending => 75,
            Self::Concluded => 90,
            Self::ReRegistered => 100,
        }
    }

    /// Concluded or re-registered; finished regions never count as expiring.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Concluded | Self::ReRegistered)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Started => "started",
            Self::InProgress => "in progress",
            Self::Pending => "pending",
            Self::Concluded => "concluded",
            Self::ReRegistered => "re-registered successfully",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contact person at the regional authority. All fields are free-form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name
    pub name: String,
    /// Phone number, usually formatted as `(11) 91234-5678`
    pub phone: String,
    /// Contact email
    pub email: String,
}

/// Who last changed a group of fields, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStamp {
    /// Time of the change
    pub last_updated: DateTime<Utc>,
    /// Username of the acting user
    pub user: String,
}

/// One item of a region's document checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    /// Unique id within the region
    pub id: String,
    /// What the document is
    pub description: String,
    /// Last time the item was created or toggled
    pub last_updated: DateTime<Utc>,
    /// Delivered/up to date when true
    pub is_compliant: bool,
}

impl DocumentItem {
    /// Creates a pending (non-compliant) checklist item.
    #[must_use]
    pub fn pending(description: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            description,
            last_updated: now,
            is_compliant: false,
        }
    }

    /// Label used in exports.
    #[must_use]
    pub const fn compliance_label(&self) -> &'static str {
        if self.is_compliant {
            "DELIVERED/UPDATED"
        } else {
            "PENDING"
        }
    }
}

/// Timeline entry. Entries are only ever inserted at the front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique id
    pub id: String,
    /// When the entry was recorded
    pub date: DateTime<Utc>,
    /// Region status at the time of the entry
    pub status: RegistrationStatus,
    /// Free-text note
    pub notes: String,
    /// Username of the author; `None` for system entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl HistoryEntry {
    /// Author name as displayed, `"System"` when absent.
    #[must_use]
    pub fn author(&self) -> &str {
        self.user.as_deref().unwrap_or("System")
    }
}

/// Compliance record of one regional authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Stable two-letter code
    #[serde(rename = "uf")]
    pub code: String,
    /// Display name
    #[serde(rename = "stateName")]
    pub name: String,
    /// Contact at the authority
    pub contact: Contact,
    /// Document checklist, in insertion order
    pub documents: Vec<DocumentItem>,
    /// Deadline for the re-registration
    #[serde(default, with = "flexible_date")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Days before the deadline at which the region is flagged
    pub alert_days: i64,
    /// Last change to the deadline configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_metadata: Option<ChangeStamp>,
    /// Last change to the contact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_metadata: Option<ChangeStamp>,
    /// Reverse-chronological timeline
    pub status_history: Vec<HistoryEntry>,
    /// Current workflow state
    pub current_status: RegistrationStatus,
}

impl Region {
    /// Builds the initial record for a region: no deadline, empty contact and
    /// checklist, and a single "not started" history entry.
    #[must_use]
    pub fn seeded(code: &str, name: &str, alert_days: i64, now: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            contact: Contact::default(),
            documents: Vec::new(),
            expiration_date: None,
            alert_days,
            config_metadata: None,
            contact_metadata: None,
            status_history: vec![HistoryEntry {
                id: Uuid::new_v4().to_string(),
                date: now,
                status: RegistrationStatus::NotStarted,
                notes: SEED_NOTE.to_string(),
                user: None,
            }],
            current_status: RegistrationStatus::NotStarted,
        }
    }

    /// Most recent timeline entry.
    #[must_use]
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.status_history.first()
    }

    /// Case-insensitive match on name or code.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        self.name.to_lowercase().contains(&term) || self.code.to_lowercase().contains(&term)
    }
}

/// Accepts either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (read as
/// UTC midnight), which is what a date picker stores.
mod flexible_date {
    use super::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_some(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };

        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Some(dt.and_utc()))
            .ok_or_else(|| D::Error::custom(format!("invalid expiration date: {raw}")))
    }
}
