//! Service report records and their lifecycle payloads
//!
//! A report is one service transaction submitted by an employee: what was
//! done, what the client paid, who worked on it, and where it sits in the
//! pending/approved/rejected review flow. Wire shape matches the document
//! records (camelCase keys, millisecond timestamps, `service` carrying
//! either a label list or a legacy comma-joined string).

use serde::{Deserialize, Deserializer, Serialize};

/// Well-known service labels used by the shop.
///
/// The record accepts any label; these are the ones the dashboard groups by.
pub mod service_labels {
    pub const NAIL: &str = "Nail";
    pub const EYELASH: &str = "Mi";
    pub const HAIR_WASH: &str = "Gội đầu";
    pub const OTHER: &str = "Khác";
}

/// Review status of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Awaiting review; the only editable status
    #[default]
    Pending,
    /// Accepted by an admin; counts toward realized revenue
    Approved,
    /// Declined by an admin
    Rejected,
}

impl ReportStatus {
    /// Approved and rejected are terminal; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How the client paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    /// Bank transfer
    Transfer,
}

/// A single service transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Storage-assigned identifier
    pub id: String,
    /// Gross price in VND; always positive
    pub price: f64,
    /// Service labels; non-empty after boundary normalization
    #[serde(rename = "service", deserialize_with = "de_service_labels")]
    pub services: Vec<String>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Proof-of-service photo; required at creation, clearable on edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: ReportStatus,
    /// Overtime work earns the higher commission rate
    pub is_overtime: bool,
    /// Submitting employee
    pub user_id: String,
    pub employee_name: String,
    /// Optional second participant sharing the work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    /// Derived: `user_id` plus `partner_id` when set and distinct
    pub participant_ids: Vec<String>,
    /// Business date of the service, Unix millis; editable (backdating)
    pub created_at: i64,
    /// Last modification, Unix millis
    pub updated_at: i64,
}

impl Report {
    /// Ids credited with this report: the submitter, plus the partner when
    /// one is set, non-empty, and distinct from the submitter.
    pub fn derive_participants(user_id: &str, partner_id: Option<&str>) -> Vec<String> {
        let mut ids = vec![user_id.to_owned()];
        if let Some(partner) = partner_id
            && !partner.is_empty()
            && partner != user_id
        {
            ids.push(partner.to_owned());
        }
        ids
    }

    /// Recompute `participant_ids` from the current submitter/partner pair.
    pub fn rebuild_participants(&mut self) {
        self.participant_ids =
            Self::derive_participants(&self.user_id, self.partner_id.as_deref());
    }

    pub fn participant_count(&self) -> usize {
        self.participant_ids.len().max(1)
    }

    /// Per-participant slice of the gross price.
    pub fn shared_price(&self) -> f64 {
        self.price / self.participant_count() as f64
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participant_ids.iter().any(|id| id == user_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Input for creating a report.
///
/// Id, status, participants and `updated_at` are assigned by the engine.
/// `created_at` may be supplied to backdate the business date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub price: f64,
    #[serde(rename = "service", default, deserialize_with = "de_service_labels")]
    pub services: Vec<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Policy requires a photo at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_overtime: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Field-level changes for an edit.
///
/// `None` leaves a field untouched. Nullable fields are double-wrapped so
/// an explicit null can clear them: `Some(None)` clears, `Some(Some(v))`
/// replaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(
        rename = "service",
        default,
        deserialize_with = "de_opt_service_labels",
        skip_serializing_if = "Option::is_none"
    )]
    pub services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(
        default,
        deserialize_with = "de_double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "de_double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_overtime: Option<bool>,
    #[serde(
        default,
        deserialize_with = "de_double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub partner_id: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "de_double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub partner_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl ReportPatch {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.services.is_none()
            && self.payment_method.is_none()
            && self.note.is_none()
            && self.image_url.is_none()
            && self.is_overtime.is_none()
            && self.partner_id.is_none()
            && self.partner_name.is_none()
            && self.created_at.is_none()
    }

    /// Apply the changes onto a report in place.
    ///
    /// Participants are rebuilt when the partner changes. Setting
    /// `updated_at` is the caller's concern.
    pub fn apply_to(&self, report: &mut Report) {
        if let Some(price) = self.price {
            report.price = price;
        }
        if let Some(services) = &self.services {
            report.services = normalize_service_labels(services.clone());
        }
        if let Some(method) = self.payment_method {
            report.payment_method = method;
        }
        if let Some(note) = &self.note {
            report.note = note.clone();
        }
        if let Some(image_url) = &self.image_url {
            report.image_url = image_url.clone();
        }
        if let Some(is_overtime) = self.is_overtime {
            report.is_overtime = is_overtime;
        }
        if let Some(partner_id) = &self.partner_id {
            report.partner_id = partner_id.clone();
            report.rebuild_participants();
        }
        if let Some(partner_name) = &self.partner_name {
            report.partner_name = partner_name.clone();
        }
        if let Some(created_at) = self.created_at {
            report.created_at = created_at;
        }
    }
}

/// Split a legacy comma-joined label string into clean labels.
pub fn split_service_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Trim every label and drop empties.
pub fn normalize_service_labels(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|label| label.trim().to_owned())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Accept `service` as either a label list or a comma-joined string.
fn de_service_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawServices {
        Many(Vec<String>),
        One(String),
    }

    Ok(match RawServices::deserialize(deserializer)? {
        RawServices::Many(labels) => normalize_service_labels(labels),
        RawServices::One(joined) => split_service_labels(&joined),
    })
}

fn de_opt_service_labels<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Labels(#[serde(deserialize_with = "de_service_labels")] Vec<String>);

    Ok(Option::<Labels>::deserialize(deserializer)?.map(|labels| labels.0))
}

/// Keeps explicit null distinct from an absent key: `null` becomes
/// `Some(None)` while a missing field stays `None` via `#[serde(default)]`.
fn de_double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}
