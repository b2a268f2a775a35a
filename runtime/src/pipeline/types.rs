use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNNAMED_OWNER: &str = "Unnamed Owner";
pub const UNKNOWN_ORGANIZATION: &str = "Unknown";
pub const DEFAULT_SKILLS: &[&str] = &["General Certification Skills"];

/// Structured result of one certificate upload.
///
/// Dates serialize as ISO calendar dates (`YYYY-MM-DD`); a missing expiry
/// serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub owner_name: String,
    pub date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub organization: String,
    pub skills: Vec<String>,
}

/// Dates found in the extracted text, in order of appearance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatedDates {
    pub certification: Option<NaiveDate>,
    pub expiry: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_iso_dates_and_null_expiry() {
        let record = CertificateRecord {
            owner_name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(2022, 6, 5).unwrap(),
            expiry_date: None,
            organization: UNKNOWN_ORGANIZATION.into(),
            skills: vec!["Scrum Framework".into()],
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date"], "2022-06-05");
        assert!(value["expiry_date"].is_null());
        assert_eq!(value["skills"][0], "Scrum Framework");
    }
}
