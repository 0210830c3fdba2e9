use super::types::{AccountKind, Identity, Ngo, Volunteer};
use crate::storage::memory::DocumentStore;

/// Read side of the two account stores.
///
/// Lookups probe the volunteer store before the NGO store; an id present in
/// both resolves as a volunteer.
pub struct AccountDirectory {
    volunteers: DocumentStore<String, Volunteer>,
    ngos: DocumentStore<String, Ngo>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self {
            volunteers: DocumentStore::new(),
            ngos: DocumentStore::new(),
        }
    }

    pub fn add_volunteer(&self, volunteer: Volunteer) {
        tracing::debug!("Registered volunteer account {}", volunteer.id);
        self.volunteers.put(volunteer.id.clone(), volunteer);
    }

    pub fn add_ngo(&self, ngo: Ngo) {
        tracing::debug!("Registered NGO account {}", ngo.id);
        self.ngos.put(ngo.id.clone(), ngo);
    }

    pub fn resolve(&self, user_id: &str) -> Option<Identity> {
        let key = user_id.to_string();
        if let Some(volunteer) = self.volunteers.get(&key) {
            return Some(Identity {
                user_id: volunteer.id,
                name: volunteer.name,
                kind: AccountKind::Volunteer,
            });
        }

        self.ngos.get(&key).map(|ngo| Identity {
            user_id: ngo.id,
            name: ngo.name,
            kind: AccountKind::Ngo,
        })
    }

    pub fn volunteer_count(&self) -> usize {
        self.volunteers.len()
    }

    pub fn ngo_count(&self) -> usize {
        self.ngos.len()
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}
