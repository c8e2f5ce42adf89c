use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use super::dto::{CalorieEstimationDraft, FoodItemBreakdown};
use crate::errors::{ResponseDefect, TrackerError, TrackerResult};

lazy_static! {
    static ref FENCE_OPEN: Regex = Regex::new(r"^```(?:json)?[ \t]*\r?\n?").unwrap();
    static ref FENCE_CLOSE: Regex = Regex::new(r"\r?\n?```$").unwrap();
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = FENCE_OPEN.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let body = &trimmed[start..];
    let end = FENCE_CLOSE.find(body).map(|m| m.start()).unwrap_or(body.len());
    &body[..end]
}

/// Integral JSON number. Fractional calories do not fit the declared schema.
fn as_calories(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn breakdown_item(v: &Value) -> Option<FoodItemBreakdown> {
    let obj = v.as_object()?;
    Some(FoodItemBreakdown {
        item: obj.get("item")?.as_str()?.to_string(),
        calories: as_calories(obj.get("calories")?)?,
    })
}

fn check_shape(obj: &Map<String, Value>) -> Option<CalorieEstimationDraft> {
    let description = obj.get("description")?.as_str()?.to_string();
    let total_calories = as_calories(obj.get("totalCalories")?)?;
    if total_calories < 0 {
        return None;
    }
    let breakdown = obj
        .get("breakdown")?
        .as_array()?
        .iter()
        .map(breakdown_item)
        .collect::<Option<Vec<_>>>()?;
    Some(CalorieEstimationDraft {
        description,
        total_calories,
        breakdown,
    })
}

/// Trust boundary for estimation payloads: rejects anything whose shape is
/// off, never repairs it.
///
/// Calories (`totalCalories` and each breakdown `calories`) must be integral
/// JSON numbers: `200` and `200.0` pass, `12.5` is a schema mismatch.
pub fn validate(raw: &str) -> TrackerResult<CalorieEstimationDraft> {
    let body = strip_fence(raw);
    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, payload = raw, "estimation payload is not valid JSON");
        TrackerError::InvalidResponse(ResponseDefect::MalformedPayload)
    })?;

    parsed
        .as_object()
        .and_then(check_shape)
        .ok_or_else(|| {
            warn!(payload = raw, "estimation payload does not match schema");
            TrackerError::InvalidResponse(ResponseDefect::SchemaMismatch)
        })
}

#[cfg(test)]
mod validator_tests {
    use super::*;

    fn defect(raw: &str) -> ResponseDefect {
        match validate(raw) {
            Err(TrackerError::InvalidResponse(d)) => d,
            other => panic!("expected InvalidResponse, got {:?}", other),
        }
    }

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"description\":\"Toast\",\"totalCalories\":200,\"breakdown\":[{\"item\":\"Toast\",\"calories\":200}]}\n```";
        let draft = validate(raw).unwrap();
        assert_eq!(draft.description, "Toast");
        assert_eq!(draft.total_calories, 200);
        assert_eq!(
            draft.breakdown,
            vec![FoodItemBreakdown { item: "Toast".into(), calories: 200 }]
        );
    }

    #[test]
    fn strips_untagged_fence_and_whitespace() {
        let raw = "  ```\n{\"description\":\"Tea\",\"totalCalories\":0,\"breakdown\":[]}\n```  \n";
        let draft = validate(raw).unwrap();
        assert_eq!(draft.total_calories, 0);
        assert!(draft.breakdown.is_empty());
    }

    #[test]
    fn plain_json_passes_unchanged() {
        let raw = r#"{"description":"Eggs and toast","totalCalories":350,"breakdown":[{"item":"Eggs","calories":150},{"item":"Toast","calories":200}],"confidence":"high"}"#;
        let draft = validate(raw).unwrap();
        assert_eq!(draft.breakdown.len(), 2);
        assert_eq!(draft.breakdown[1].item, "Toast");
    }

    #[test]
    fn not_json_is_malformed() {
        assert_eq!(defect("not json"), ResponseDefect::MalformedPayload);
        assert_eq!(defect(""), ResponseDefect::MalformedPayload);
    }

    #[test]
    fn negative_total_is_schema_mismatch() {
        assert_eq!(
            defect(r#"{"description":"x","totalCalories":-5,"breakdown":[]}"#),
            ResponseDefect::SchemaMismatch
        );
    }

    #[test]
    fn wrong_types_are_schema_mismatch() {
        let cases = [
            r#"{"description":1,"totalCalories":5,"breakdown":[]}"#,
            r#"{"description":"x","totalCalories":"5","breakdown":[]}"#,
            r#"{"description":"x","totalCalories":5,"breakdown":{}}"#,
            r#"{"description":"x","totalCalories":5}"#,
            r#"{"description":"x","totalCalories":5,"breakdown":[{"item":"a"}]}"#,
            r#"{"description":"x","totalCalories":5,"breakdown":[{"item":2,"calories":5}]}"#,
            r#"{"description":"x","totalCalories":12.5,"breakdown":[]}"#,
            r#"[1,2,3]"#,
        ];
        for raw in cases {
            assert_eq!(defect(raw), ResponseDefect::SchemaMismatch, "{}", raw);
        }
    }

    #[test]
    fn breakdown_values_are_not_coerced() {
        let raw = r#"{"description":"x","totalCalories":10,"breakdown":[{"item":"a","calories":-4}]}"#;
        assert_eq!(validate(raw).unwrap().breakdown[0].calories, -4);
    }

    #[test]
    fn integral_floats_pass_fractional_calories_do_not() {
        let draft = validate(r#"{"description":"x","totalCalories":200.0,"breakdown":[]}"#).unwrap();
        assert_eq!(draft.total_calories, 200);
        assert_eq!(
            defect(r#"{"description":"x","totalCalories":10,"breakdown":[{"item":"a","calories":2.5}]}"#),
            ResponseDefect::SchemaMismatch
        );
    }
}
