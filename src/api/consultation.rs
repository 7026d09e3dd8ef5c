use serde::Deserialize;

/// Consultation projection used by the invoice-creation picker
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationLite {
    pub id: u64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub child_id: Option<u64>,
    #[serde(default)]
    pub child_name: Option<String>,
    #[serde(default)]
    pub psychologist_id: Option<u64>,
    #[serde(default)]
    pub psychologist_name: Option<String>,
}

impl ConsultationLite {
    fn matches(&self, needle: &str) -> bool {
        self.id.to_string().contains(needle)
            || [&self.child_name, &self.psychologist_name]
                .into_iter()
                .flatten()
                .any(|name| name.to_lowercase().contains(needle))
    }
}

/// Client-side stand-in for `GET /consultations?lite=1&q=..&limit=..`
pub fn filter_consultations(
    all: Vec<ConsultationLite>,
    term: &str,
    limit: usize,
) -> Vec<ConsultationLite> {
    let needle = term.trim().to_lowercase();
    all.into_iter()
        .filter(|c| needle.is_empty() || c.matches(&needle))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consultation(id: u64, child: &str, psychologist: &str) -> ConsultationLite {
        ConsultationLite {
            id,
            date: None,
            status: None,
            child_id: None,
            child_name: Some(child.to_string()),
            psychologist_id: None,
            psychologist_name: Some(psychologist.to_string()),
        }
    }

    #[test]
    fn filters_by_names_and_id_then_limits() {
        let all = vec![
            consultation(12, "Tomás", "Dra. Rita"),
            consultation(13, "Inês", "Dr. Tomé"),
            consultation(40, "Rui", "Dra. Rita"),
        ];

        let hits = filter_consultations(all.clone(), "rita", 10);
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![12, 40]);

        let hits = filter_consultations(all.clone(), "13", 10);
        assert_eq!(hits.iter().map(|c| c.id).collect::<Vec<_>>(), vec![13]);

        let hits = filter_consultations(all, "", 2);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn decodes_partial_records() {
        let c: ConsultationLite =
            serde_json::from_str(r#"{"id": 5, "childName": "Rui", "extra": true}"#).unwrap();
        assert_eq!(c.id, 5);
        assert_eq!(c.child_name.as_deref(), Some("Rui"));
        assert!(c.psychologist_name.is_none());
    }
}
