//! Request parsing for the recommendation and search endpoints.
//!
//! Everything here turns loosely typed query strings and JSON bodies into
//! typed requests, raising VALIDATION_ERROR for anything unparseable.

use data_source::GeoPoint;
use resilience::{ClassifiedError, ErrorKind, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sources::{RecommendationContext, RecommendationRequest, RecommendationType};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Build a request from GET `/recommendations` query pairs.
///
/// `exclude` may repeat, hold comma-separated ids, or use the `exclude[]`
/// spelling. Unknown keys are ignored.
pub fn recommendation_request_from_query(
    pairs: Vec<(String, String)>,
    default_limit: usize,
) -> Result<RecommendationRequest> {
    let mut user_id = String::new();
    let mut kind = RecommendationType::default();
    let mut limit = default_limit;
    let mut exclude_ids = BTreeSet::new();
    let mut context = RecommendationContext::default();
    let mut latitude = None;
    let mut longitude = None;

    for (key, value) in pairs {
        match key.as_str() {
            "userId" => user_id = value,
            "type" => kind = value.trim().parse()?,
            "limit" => limit = parse_number("limit", &value)?,
            "exclude" | "exclude[]" | "excludeIds" => exclude_ids.extend(split_ids(&value)),
            "currentPoliticianId" | "currentEntityId" => context.current_entity_id = Some(value),
            "searchQuery" => context.search_query = Some(value),
            "lat" | "latitude" => latitude = Some(parse_number::<f64>("lat", &value)?),
            "lng" | "longitude" => longitude = Some(parse_number::<f64>("lng", &value)?),
            "timeOfDay" => context.time_of_day = Some(parse_enum("timeOfDay", &value)?),
            "deviceType" => context.device_type = Some(parse_enum("deviceType", &value)?),
            _ => {}
        }
    }

    context.location = location_pair(latitude, longitude)?;

    Ok(RecommendationRequest {
        user_id,
        kind,
        limit,
        exclude_ids,
        context: context.normalized(),
    })
}

/// JSON body of POST `/recommendations`. Every field is optional here so
/// that missing values surface as validation errors, not rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBody {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub exclude_ids: Vec<String>,
    pub context: Option<RecommendationContext>,
}

impl RecommendationBody {
    pub fn into_request(self, default_limit: usize) -> Result<RecommendationRequest> {
        let kind = match self.kind.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => RecommendationType::default(),
        };
        Ok(RecommendationRequest {
            user_id: self.user_id.unwrap_or_default(),
            kind,
            limit: self.limit.unwrap_or(default_limit),
            exclude_ids: self.exclude_ids.iter().flat_map(|id| split_ids(id)).collect(),
            context: self.context.unwrap_or_default().normalized(),
        })
    }
}

/// JSON body of POST `/recommendations/feedback`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBody {
    pub user_id: Option<String>,
    pub recommendation_id: Option<String>,
    pub feedback: Option<String>,
}

impl FeedbackBody {
    /// `(user_id, recommendation_id, feedback)`, all present and non-blank.
    pub fn required_fields(self) -> Result<(String, String, String)> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            present(self.user_id),
            present(self.recommendation_id),
            present(self.feedback),
        ) {
            (Some(user_id), Some(recommendation_id), Some(feedback)) => {
                Ok((user_id, recommendation_id, feedback))
            }
            _ => Err(ClassifiedError::validation(
                "Missing required fields: userId, recommendationId, feedback",
            )),
        }
    }
}

/// Query of GET `/search/suggestions`.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

/// Query of GET `/search/related`.
#[derive(Debug, Default, Deserialize)]
pub struct RelatedParams {
    pub id: Option<String>,
    pub limit: Option<String>,
}

/// Parse an optional numeric limit string.
pub fn optional_limit(raw: Option<&str>) -> Result<Option<usize>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_number("limit", value).map(Some),
    }
}

fn split_ids(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn parse_number<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ClassifiedError::builder(ErrorKind::Validation, format!("{field} must be a number"))
            .context(json!({ "field": field, "value": raw }))
            .build()
    })
}

fn parse_enum<T: DeserializeOwned>(field: &str, raw: &str) -> Result<T> {
    serde_json::from_value(json!(raw.trim().to_lowercase()))
        .map_err(|_| ClassifiedError::validation(format!("Invalid {field} '{raw}'")))
}

fn location_pair(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<GeoPoint>> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng))),
        (None, None) => Ok(None),
        _ => Err(ClassifiedError::validation("lat and lng must be provided together")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{DeviceType, TimeOfDay};

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_full_query() {
        let request = recommendation_request_from_query(
            pairs(&[
                ("userId", "u1"),
                ("type", "content"),
                ("limit", "5"),
                ("exclude", "c1,c2"),
                ("exclude", "c3"),
                ("exclude[]", "c4"),
                ("currentPoliticianId", "p1"),
                ("searchQuery", "  "),
                ("lat", "51.5"),
                ("lng", "-0.12"),
                ("timeOfDay", "Evening"),
                ("deviceType", "mobile"),
            ]),
            10,
        )
        .unwrap();

        assert_eq!(request.user_id, "u1");
        assert_eq!(request.kind, RecommendationType::Content);
        assert_eq!(request.limit, 5);
        assert_eq!(request.exclude_ids.len(), 4);
        assert_eq!(request.context.current_entity_id.as_deref(), Some("p1"));
        assert_eq!(request.context.search_query, None);
        assert_eq!(request.context.location, Some(GeoPoint::new(51.5, -0.12)));
        assert_eq!(request.context.time_of_day, Some(TimeOfDay::Evening));
        assert_eq!(request.context.device_type, Some(DeviceType::Mobile));
    }

    #[test]
    fn test_defaults() {
        let request = recommendation_request_from_query(pairs(&[("userId", "u1")]), 7).unwrap();
        assert_eq!(request.kind, RecommendationType::Politician);
        assert_eq!(request.limit, 7);
        assert!(request.exclude_ids.is_empty());
    }

    #[test]
    fn test_unparseable_values_are_validation_errors() {
        for bad in [
            vec![("limit", "ten")],
            vec![("type", "movie")],
            vec![("lat", "north")],
            vec![("lat", "10")],
            vec![("deviceType", "watch")],
        ] {
            let err = recommendation_request_from_query(pairs(&bad), 10).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{bad:?}");
        }
    }

    #[test]
    fn test_body_into_request() {
        let body: RecommendationBody = serde_json::from_value(json!({
            "userId": "u1",
            "type": "search",
            "excludeIds": ["p1", "p2,p3"],
            "context": {"searchQuery": "housing", "currentPoliticianId": "p9"}
        }))
        .unwrap();
        let request = body.into_request(10).unwrap();

        assert_eq!(request.kind, RecommendationType::Search);
        assert_eq!(request.limit, 10);
        assert_eq!(request.exclude_ids.len(), 3);
        assert_eq!(request.context.current_entity_id.as_deref(), Some("p9"));
    }

    #[test]
    fn test_feedback_required_fields() {
        let body = FeedbackBody {
            user_id: Some("u1".into()),
            recommendation_id: None,
            feedback: Some("like".into()),
        };
        assert_eq!(body.required_fields().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_optional_limit() {
        assert_eq!(optional_limit(None).unwrap(), None);
        assert_eq!(optional_limit(Some("4")).unwrap(), Some(4));
        assert!(optional_limit(Some("-1")).is_err());
    }
}
