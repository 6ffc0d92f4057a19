use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::constants::{DATE_FORMAT, DELTA_MAGNITUDE_MAX};
use crate::db::models::AccountId;
use crate::db::models::event::ReasonCode;
use crate::error::ValidationError;
use crate::util::normalize::trimmed;

/// Event fields as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub delta: i64,
    pub occurred_on: String,
    pub reason_code: String,
    #[serde(default)]
    pub reason_text: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Full replacement of an event's mutable fields. `createdBy`/`createdAt` may be echoed back
/// but must match the stored values.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRevision {
    #[serde(flatten)]
    pub fields: EventInput,
    #[serde(default)]
    pub created_by: Option<AccountId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated, normalized mutable fields of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub delta: i64,
    pub occurred_on: NaiveDate,
    pub reason_code: ReasonCode,
    pub reason_text: String,
    pub note: String,
}

impl EventInput {
    pub fn validate(&self) -> Result<EventFields, ValidationError> {
        let delta = validate_delta(self.delta)?;

        let occurred_on = NaiveDate::parse_from_str(self.occurred_on.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::MalformedDate(self.occurred_on.clone()))?;

        let reason_code = ReasonCode::parse(&self.reason_code)
            .ok_or_else(|| ValidationError::UnknownReasonCode(self.reason_code.clone()))?;

        let reason_text = match reason_code {
            ReasonCode::Other => {
                let text = trimmed(self.reason_text.as_deref());
                if text.is_empty() {
                    return Err(ValidationError::MissingReasonText);
                }
                text
            }
            code => code.label().to_owned(),
        };

        Ok(EventFields {
            delta,
            occurred_on,
            reason_code,
            reason_text,
            note: trimmed(self.note.as_deref()),
        })
    }
}

pub fn validate_delta(delta: i64) -> Result<i64, ValidationError> {
    match delta {
        0 => Err(ValidationError::ZeroDelta),
        d if d.unsigned_abs() > DELTA_MAGNITUDE_MAX.unsigned_abs() => {
            Err(ValidationError::DeltaOutOfRange(d))
        }
        d => Ok(d),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn input(delta: i64, reason_code: &str, reason_text: Option<&str>) -> EventInput {
        EventInput {
            delta,
            occurred_on: "2026-10-18".into(),
            reason_code: reason_code.into(),
            reason_text: reason_text.map(str::to_owned),
            note: Some("  after dinner ".into()),
        }
    }

    #[test]
    fn test_delta_bounds() {
        assert_eq!(validate_delta(0), Err(ValidationError::ZeroDelta));
        assert_eq!(validate_delta(1), Ok(1));
        assert_eq!(validate_delta(-1), Ok(-1));
        assert_eq!(validate_delta(100), Ok(100));
        assert_eq!(validate_delta(-100), Ok(-100));
        assert_eq!(validate_delta(101), Err(ValidationError::DeltaOutOfRange(101)));
        assert_eq!(validate_delta(-101), Err(ValidationError::DeltaOutOfRange(-101)));
        assert_eq!(
            validate_delta(i64::MIN),
            Err(ValidationError::DeltaOutOfRange(i64::MIN))
        );
    }

    #[test]
    fn test_fixed_reason_uses_catalogue_label() {
        let fields = input(5, "Help", Some("ignored")).validate().unwrap();
        assert_eq!(fields.reason_code, ReasonCode::Help);
        assert_eq!(fields.reason_text, ReasonCode::Help.label());
        assert_eq!(fields.note, "after dinner");
        assert_eq!(fields.occurred_on, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }

    #[test]
    fn test_other_requires_text() {
        assert_eq!(
            input(5, "other", Some("")).validate(),
            Err(ValidationError::MissingReasonText)
        );
        assert_eq!(
            input(5, "other", Some("   ")).validate(),
            Err(ValidationError::MissingReasonText)
        );
        assert_eq!(
            input(5, "other", None).validate(),
            Err(ValidationError::MissingReasonText)
        );

        let fields = input(-3, "other", Some(" fed the cat ")).validate().unwrap();
        assert_eq!(fields.reason_text, "fed the cat");
    }

    #[test]
    fn test_rejects_unknown_reason_and_bad_dates() {
        assert!(matches!(
            input(5, "bribery", None).validate(),
            Err(ValidationError::UnknownReasonCode(_))
        ));

        for date in ["2026-02-30", "18/10/2026", "", "2026-13-01"] {
            let mut bad = input(5, "help", None);
            bad.occurred_on = date.into();
            assert!(
                matches!(bad.validate(), Err(ValidationError::MalformedDate(_))),
                "{date}"
            );
        }
    }

    #[test]
    fn test_revision_deserializes_flattened() {
        let revision: EventRevision = serde_json::from_value(serde_json::json!({
            "delta": -4,
            "occurredOn": "2026-10-01",
            "reasonCode": "promise",
            "createdBy": "u1"
        }))
        .unwrap();

        assert_eq!(revision.fields.delta, -4);
        assert_eq!(revision.created_by, Some("u1".into()));
        assert!(revision.created_at.is_none());
    }
}
