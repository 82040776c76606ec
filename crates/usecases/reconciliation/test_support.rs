use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::ReconciliationEngine;
use crate::{
    domain::{
        entities::{
            listings::{BoostPlan, Listing},
            notifications::PushMessage,
            users::{SubscriptionPlan, UserEntitlement},
        },
        value_objects::{
            enums::{boost_targets::BoostTarget, user_roles::UserRole},
            fees::FeeSchedule,
        },
    },
    infra::db::memory::MemoryEntitlementStore,
    notifications::outbox::NotificationOutbox,
};

pub(crate) const FEES: FeeSchedule = FeeSchedule {
    platform_fee_bps: 1000,
    provider_fee_bps: 290,
    provider_fixed_fee_minor: 30,
};

pub(crate) struct Harness {
    pub engine: ReconciliationEngine<MemoryEntitlementStore>,
    pub store: Arc<MemoryEntitlementStore>,
    pub messages: mpsc::Receiver<PushMessage>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryEntitlementStore::new());
        let (outbox, messages) = NotificationOutbox::new(64);
        let engine = ReconciliationEngine::new(Arc::clone(&store), FEES, outbox);

        Self {
            engine,
            store,
            messages,
        }
    }

    pub fn drain_messages(&mut self) -> Vec<PushMessage> {
        let mut drained = Vec::new();
        while let Ok(message) = self.messages.try_recv() {
            drained.push(message);
        }
        drained
    }

    pub fn client(&self, now: DateTime<Utc>) -> Uuid {
        let user = client_user(now);
        let id = user.id;
        self.store.insert_user(user);
        id
    }

    pub fn product(&self, owner_id: Uuid, price_minor: i64, quantity: i32) -> Uuid {
        let listing = Listing {
            price_minor: Some(price_minor),
            quantity: Some(quantity),
            ..listing(BoostTarget::Product, owner_id)
        };
        let id = listing.id;
        self.store.insert_listing(listing);
        id
    }

    pub fn service(&self, owner_id: Uuid) -> Uuid {
        let listing = listing(BoostTarget::Service, owner_id);
        let id = listing.id;
        self.store.insert_listing(listing);
        id
    }
}

pub(crate) fn client_user(now: DateTime<Utc>) -> UserEntitlement {
    let id = Uuid::new_v4();
    UserEntitlement {
        id,
        role: UserRole::Client,
        wallet_balance_minor: 0,
        device_tokens: vec![format!("device-{id}")],
        stripe_customer_id: None,
        stripe_default_payment_method: None,
        subscription: SubscriptionPlan::free(now),
    }
}

pub(crate) fn listing(target: BoostTarget, owner_id: Uuid) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        target,
        owner_id,
        title: format!("{target} listing"),
        price_minor: None,
        quantity: None,
        is_active: true,
        boost: BoostPlan::none(),
    }
}
