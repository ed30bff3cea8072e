use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ Input Records ============

/// A prospective customer record tied to a vehicle registration.
///
/// Leads are immutable once ingested. Identity is the pair
/// `(lead_id, registration_no)`, concatenated into `lead_key` exactly once
/// at ingestion time and never recomputed afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// ID of the lead from the source system.
    pub lead_id: String,
    /// Vehicle registration number.
    pub registration_no: String,
    /// Registration city.
    pub city: String,
    /// Registration state.
    pub state: String,
    /// Postal code, if the source feed carried one.
    pub pincode: Option<String>,
    /// Stable processing key; `"{lead_id}_{registration_no}"` or a
    /// positional fallback when both identity fields are blank.
    pub lead_key: String,
}

impl Lead {
    /// Builds the canonical lead key from the identity pair.
    pub fn key_for(lead_id: &str, registration_no: &str) -> String {
        format!("{}_{}", lead_id, registration_no)
    }
}

/// A POSP (point-of-sale person) field partner eligible to receive leads.
///
/// Reloaded from the partner feed each run; the engine never mutates the
/// partner record itself, only its capacity counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    /// Unique partner identifier.
    pub partner_id: String,
    /// Display name of the partner.
    pub partner_name: String,
    /// Operating city.
    pub city: String,
    /// Operating state.
    pub state: String,
    /// Postal code, if present in the feed.
    pub pincode: Option<String>,
    /// Date of last recorded business activity; `None` when the feed value
    /// was blank or unparseable.
    pub last_activity_date: Option<NaiveDate>,
    /// Whether the partner app is installed. `None` means the feed had no
    /// such column, which is treated as eligible (fail-open).
    pub app_installed: Option<bool>,
    /// Performance score, 0 when missing or non-numeric.
    pub performance_score: f64,
}

// ============ Geo Matching ============

/// Discrete geographic match strength between a lead and a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoTier {
    /// All 6 postal digits equal.
    PincodeExact,
    /// First 5 postal digits equal.
    Pincode5,
    /// First 3 postal digits equal.
    Pincode3,
    /// Same state, city names equal case-insensitively.
    ExactCity,
    /// Same state, city similarity ratio in [50, 100).
    FuzzyCity,
}

impl GeoTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoTier::PincodeExact => "pincode_exact",
            GeoTier::Pincode5 => "pincode_5",
            GeoTier::Pincode3 => "pincode_3",
            GeoTier::ExactCity => "exact_city",
            GeoTier::FuzzyCity => "fuzzy_city",
        }
    }

    /// True for any postal-prefix tier.
    pub fn is_pincode(&self) -> bool {
        matches!(
            self,
            GeoTier::PincodeExact | GeoTier::Pincode5 | GeoTier::Pincode3
        )
    }
}

/// Outcome of the geo resolver for one (lead, partner) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoMatch {
    pub tier: GeoTier,
    pub base_score: f64,
    /// City similarity percentage; 100 for non-fuzzy tiers.
    pub similarity: f64,
}

// ============ Selection ============

/// A scored partner candidate for one lead, before ranking.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub partner_id: String,
    pub partner_name: String,
    pub partner_city: String,
    pub partner_state: String,
    pub partner_pincode: Option<String>,
    pub tier: GeoTier,
    pub similarity: f64,
    pub total_score: f64,
    pub last_activity_date: Option<NaiveDate>,
    pub days_since_last: i64,
    pub performance_score: f64,
    /// Daily load observed when the candidate was scored; tie-break input.
    pub load_at_scoring: u32,
}

/// Final decision status for a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedStatus {
    Assigned,
    NotAssigned,
}

impl AssignedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignedStatus::Assigned => "assigned",
            AssignedStatus::NotAssigned => "not_assigned",
        }
    }
}

/// One row of the assignment output: either a (lead, partner) decision or a
/// single `not_assigned` row when no partner qualified. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub lead_id: String,
    pub registration_no: String,
    pub lead_city: String,
    pub lead_state: String,
    pub lead_pincode: Option<String>,
    pub partner_id: Option<String>,
    pub partner_name: Option<String>,
    pub partner_city: Option<String>,
    pub partner_state: Option<String>,
    pub partner_pincode: Option<String>,
    /// Geo tier label, or `"none"` for not-assigned rows.
    pub match_type: String,
    pub similarity: f64,
    pub total_score: f64,
    pub last_activity_date: Option<NaiveDate>,
    pub days_since_last: Option<i64>,
    pub performance_score: Option<f64>,
    pub assigned_status: AssignedStatus,
}

impl AssignmentRecord {
    /// Builds an `assigned` row from a winning candidate.
    pub fn assigned(lead: &Lead, candidate: &Candidate) -> Self {
        Self {
            lead_id: lead.lead_id.clone(),
            registration_no: lead.registration_no.clone(),
            lead_city: lead.city.clone(),
            lead_state: lead.state.clone(),
            lead_pincode: lead.pincode.clone(),
            partner_id: Some(candidate.partner_id.clone()),
            partner_name: Some(candidate.partner_name.clone()),
            partner_city: Some(candidate.partner_city.clone()),
            partner_state: Some(candidate.partner_state.clone()),
            partner_pincode: candidate.partner_pincode.clone(),
            match_type: candidate.tier.as_str().to_string(),
            similarity: candidate.similarity,
            total_score: candidate.total_score,
            last_activity_date: candidate.last_activity_date,
            days_since_last: Some(candidate.days_since_last),
            performance_score: Some(candidate.performance_score),
            assigned_status: AssignedStatus::Assigned,
        }
    }

    /// Builds the single `not_assigned` row for a lead with no surviving
    /// candidate.
    pub fn not_assigned(lead: &Lead) -> Self {
        Self {
            lead_id: lead.lead_id.clone(),
            registration_no: lead.registration_no.clone(),
            lead_city: lead.city.clone(),
            lead_state: lead.state.clone(),
            lead_pincode: lead.pincode.clone(),
            partner_id: None,
            partner_name: None,
            partner_city: None,
            partner_state: None,
            partner_pincode: None,
            match_type: "none".to_string(),
            similarity: 0.0,
            total_score: 0.0,
            last_activity_date: None,
            days_since_last: None,
            performance_score: None,
            assigned_status: AssignedStatus::NotAssigned,
        }
    }

    /// Deduplication key for the append-only assignment output.
    pub fn dedup_key(&self) -> (String, String, String, &'static str) {
        (
            self.lead_id.clone(),
            self.registration_no.clone(),
            self.partner_id.clone().unwrap_or_default(),
            self.assigned_status.as_str(),
        )
    }
}

// ============ Durable State ============

/// Per-partner daily assignment counter.
///
/// Reads as 0 whenever `last_reset_date` differs from the processing date;
/// the physical reset is lazy and per-partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityCounter {
    pub partner_id: String,
    pub assigned_count_today: u32,
    pub last_reset_date: NaiveDate,
}

/// One persisted row of the processed-lead ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedLead {
    pub lead_key: String,
    pub lead_id: String,
    pub registration_no: String,
}
