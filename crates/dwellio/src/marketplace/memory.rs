//! In-memory document store satisfying the repository ports. The single mutex
//! per collection makes every method, including the conditional updates, behave
//! as one atomic document operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    Offer, OfferId, OfferStatus, Property, PropertyId, PropertyStatus, VerificationStatus,
};
use super::repository::{OfferRepository, PropertyRepository, RepositoryError};

#[derive(Default, Clone)]
pub struct InMemoryPropertyStore {
    records: Arc<Mutex<HashMap<PropertyId, Property>>>,
}

impl InMemoryPropertyStore {
    fn sorted(mut properties: Vec<Property>) -> Vec<Property> {
        properties.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        properties
    }
}

impl PropertyRepository for InMemoryPropertyStore {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        if guard.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        if guard.contains_key(&property.id) {
            guard.insert(property.id.clone(), property);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.records.lock().expect("property store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_verified(&self) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.records.lock().expect("property store mutex poisoned");
        Ok(Self::sorted(
            guard
                .values()
                .filter(|property| property.verification == VerificationStatus::Verified)
                .cloned()
                .collect(),
        ))
    }

    fn list_by_agent(&self, agent_email: &str) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.records.lock().expect("property store mutex poisoned");
        Ok(Self::sorted(
            guard
                .values()
                .filter(|property| property.agent.email.eq_ignore_ascii_case(agent_email))
                .cloned()
                .collect(),
        ))
    }

    fn list_all(&self) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.records.lock().expect("property store mutex poisoned");
        Ok(Self::sorted(guard.values().cloned().collect()))
    }

    fn delete(&self, id: &PropertyId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn delete_by_agent(&self, agent_email: &str) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        let before = guard.len();
        guard.retain(|_, property| !property.agent.email.eq_ignore_ascii_case(agent_email));
        Ok(before - guard.len())
    }

    fn set_status_if(
        &self,
        id: &PropertyId,
        expected: PropertyStatus,
        next: PropertyStatus,
    ) -> Result<Property, RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        let property = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if property.status != expected {
            return Err(RepositoryError::Conflict);
        }
        property.status = next;
        Ok(property.clone())
    }

    fn reserve_acceptance(
        &self,
        id: &PropertyId,
        offer: &OfferId,
    ) -> Result<Property, RepositoryError> {
        let mut guard = self.records.lock().expect("property store mutex poisoned");
        let property = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        match &property.accepted_offer {
            None => {
                property.accepted_offer = Some(offer.clone());
                Ok(property.clone())
            }
            Some(existing) if existing == offer => Ok(property.clone()),
            Some(_) => Err(RepositoryError::Conflict),
        }
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("property store mutex poisoned");
        Ok(guard.len())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOfferStore {
    records: Arc<Mutex<HashMap<OfferId, Offer>>>,
}

impl InMemoryOfferStore {
    fn sorted(mut offers: Vec<Offer>) -> Vec<Offer> {
        offers.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        offers
    }
}

impl OfferRepository for InMemoryOfferStore {
    fn insert(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        let mut guard = self.records.lock().expect("offer store mutex poisoned");
        if guard.contains_key(&offer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    fn fetch(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        let guard = self.records.lock().expect("offer store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_by_buyer(&self, buyer_email: &str) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.records.lock().expect("offer store mutex poisoned");
        Ok(Self::sorted(
            guard
                .values()
                .filter(|offer| offer.buyer.email.eq_ignore_ascii_case(buyer_email))
                .cloned()
                .collect(),
        ))
    }

    fn list_by_property(&self, property_id: &PropertyId) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.records.lock().expect("offer store mutex poisoned");
        Ok(Self::sorted(
            guard
                .values()
                .filter(|offer| &offer.property_id == property_id)
                .cloned()
                .collect(),
        ))
    }

    fn list_all(&self) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.records.lock().expect("offer store mutex poisoned");
        Ok(Self::sorted(guard.values().cloned().collect()))
    }

    fn list_settled(&self) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.records.lock().expect("offer store mutex poisoned");
        Ok(Self::sorted(
            guard
                .values()
                .filter(|offer| offer.status.is_winning())
                .cloned()
                .collect(),
        ))
    }

    fn transition_if(
        &self,
        id: &OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<Offer, RepositoryError> {
        let mut guard = self.records.lock().expect("offer store mutex poisoned");
        let offer = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if offer.status != expected {
            return Err(RepositoryError::Conflict);
        }
        offer.status = next;
        Ok(offer.clone())
    }

    fn complete_if_accepted(
        &self,
        id: &OfferId,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Offer, RepositoryError> {
        let mut guard = self.records.lock().expect("offer store mutex poisoned");
        let offer = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if offer.status != OfferStatus::Accepted {
            return Err(RepositoryError::Conflict);
        }
        offer.status = OfferStatus::Bought;
        offer.transaction_id = Some(transaction_id.to_string());
        offer.paid_at = Some(paid_at);
        Ok(offer.clone())
    }
}
