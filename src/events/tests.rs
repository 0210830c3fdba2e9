//! Event Module Tests
//!
//! ## Test Scopes
//! - **Store**: date filtering, ordering, volunteer registration.
//! - **Validation**: manual creation rejects incomplete requests.
//! - **Serialization**: wire field names match the public API.

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::events::store::EventStore;
    use crate::events::types::{CreateEventRequest, Event};
    use chrono::{Duration, Utc};

    fn event(id: &str, days_from_now: i64) -> Event {
        Event {
            id: id.to_string(),
            name: format!("Event {}", id),
            date: Utc::now() + Duration::days(days_from_now),
            location: "Pune".to_string(),
            description: "Community work".to_string(),
            skills: vec!["teamwork".to_string()],
            source: "Manual".to_string(),
            external_id: None,
            volunteers: vec![],
        }
    }

    // ============================================================
    // STORE TESTS
    // ============================================================

    #[test]
    fn test_upcoming_excludes_past_events() {
        let store = EventStore::new();
        store.insert(event("past", -3));
        store.insert(event("soon", 1));
        store.insert(event("later", 10));

        let upcoming = store.upcoming(Utc::now());
        let ids: Vec<&str> = upcoming.iter().map(|e| e.id.as_str()).collect();

        assert_eq!(ids, vec!["soon", "later"]);
    }

    #[test]
    fn test_list_is_sorted_by_date() {
        let store = EventStore::new();
        store.insert(event("c", 5));
        store.insert(event("a", -1));
        store.insert(event("b", 2));

        let ids: Vec<String> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_register_volunteer() {
        let store = EventStore::new();
        store.insert(event("e1", 3));

        let updated = store.register_volunteer("e1", "v1").unwrap();
        assert_eq!(updated.volunteers, vec!["v1".to_string()]);
        assert_eq!(store.get("e1").unwrap().volunteers.len(), 1);
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let store = EventStore::new();
        store.insert(event("e1", 3));
        store.register_volunteer("e1", "v1").unwrap();

        let err = store.register_volunteer("e1", "v1").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get("e1").unwrap().volunteers.len(), 1);
    }

    #[test]
    fn test_register_unknown_event() {
        let store = EventStore::new();
        let err = store.register_volunteer("missing", "v1").unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    // ============================================================
    // CREATION TESTS
    // ============================================================

    #[test]
    fn test_create_defaults_to_manual_source() {
        let store = EventStore::new();
        let created = store
            .create(CreateEventRequest {
                name: Some("Tree Planting".to_string()),
                date: Some(Utc::now() + Duration::days(7)),
                location: Some("Nagpur".to_string()),
                description: Some("Plant saplings".to_string()),
                skills: vec!["gardening".to_string()],
                source: None,
                external_id: None,
            })
            .unwrap();

        assert_eq!(created.source, "Manual");
        assert!(created.volunteers.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_requires_fields() {
        let store = EventStore::new();
        let err = store
            .create(CreateEventRequest {
                name: Some("No date".to_string()),
                date: None,
                location: Some("Delhi".to_string()),
                description: Some("x".to_string()),
                skills: vec![],
                source: None,
                external_id: None,
            })
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.is_empty());
    }

    // ============================================================
    // SERIALIZATION TESTS
    // ============================================================

    #[test]
    fn test_event_wire_format() {
        let mut e = event("e1", 1);
        e.external_id = Some("ext-9".to_string());

        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["externalId"], "ext-9");
        assert_eq!(json["source"], "Manual");
        assert!(json.get("external_id").is_none());
    }

    #[test]
    fn test_event_deserialize_defaults() {
        let json = r#"{
            "id": "x",
            "name": "Beach Cleanup",
            "date": "2030-01-01T09:00:00Z",
            "location": "Goa",
            "description": "Clean the beach"
        }"#;

        let e: Event = serde_json::from_str(json).unwrap();
        assert_eq!(e.source, "Manual");
        assert!(e.skills.is_empty());
        assert!(e.external_id.is_none());
    }
}
