use anyhow::anyhow;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, delete, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            ledger::{AdminProfitAccrual, RevenueEntry, RevenueEntryRow, WalletTransaction, WalletTransactionRow},
            listings::{BoostPlan, Listing, ProductRow, ServiceRow},
            markers::{
                BoostIntent, BoostIntentRow, PendingMarker, SubscriptionIntent,
                SubscriptionIntentRow, TransientOrderItemRow, TransientOrderRow, WalletTopUp,
            },
            orders::NewPurchasedOrder,
            users::{SubscriptionChangeset, SubscriptionPlan, UserEntitlement, UserRow},
        },
        repositories::entitlement_store::{EntitlementTx, TxError, TxResult},
        value_objects::enums::{boost_targets::BoostTarget, platforms::Platform},
    },
    infra::db::postgres::schema::{
        admin_ledger, admin_profit_accruals, boost_intents, cart_items, products,
        purchased_order_items, purchased_orders, revenue_entries, services,
        subscription_intents, transient_order_items, transient_orders, users, wallet_top_ups,
        wallet_transactions,
    },
};

const ADMIN_LEDGER_ROW: i32 = 1;

impl From<diesel::result::Error> for TxError {
    fn from(value: diesel::result::Error) -> Self {
        TxError::Store(value.into())
    }
}

fn corrupt_row(table: &str, reason: String) -> TxError {
    TxError::Store(anyhow!("corrupt {table} row: {reason}"))
}

/// Unit of work over one Postgres connection already inside a transaction.
pub struct PgEntitlementTx<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgEntitlementTx<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl EntitlementTx for PgEntitlementTx<'_> {
    fn find_marker(&mut self, key: &str) -> TxResult<Option<PendingMarker>> {
        if let Some(order) = transient_orders::table
            .filter(transient_orders::payment_intent_id.eq(key))
            .select(TransientOrderRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
        {
            let items = transient_order_items::table
                .filter(transient_order_items::transient_order_id.eq(order.id))
                .select(TransientOrderItemRow::as_select())
                .load(self.conn)?;
            return Ok(Some(PendingMarker::TransientOrder(order.into_order(items))));
        }

        if let Some(top_up) = wallet_top_ups::table
            .filter(wallet_top_ups::payment_intent_id.eq(key))
            .select(WalletTopUp::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
        {
            return Ok(Some(PendingMarker::WalletTopUp(top_up)));
        }

        if let Some(row) = boost_intents::table
            .filter(boost_intents::payment_intent_id.eq(key))
            .select(BoostIntentRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
        {
            let intent =
                BoostIntent::try_from(row).map_err(|err| corrupt_row("boost_intents", err))?;
            return Ok(Some(PendingMarker::Boost(intent)));
        }

        if let Some(row) = subscription_intents::table
            .filter(subscription_intents::intent_key.eq(key))
            .select(SubscriptionIntentRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
        {
            let intent = SubscriptionIntent::try_from(row)
                .map_err(|err| corrupt_row("subscription_intents", err))?;
            return Ok(Some(PendingMarker::Subscription(intent)));
        }

        Ok(None)
    }

    fn delete_marker(&mut self, marker: &PendingMarker) -> TxResult<()> {
        match marker {
            PendingMarker::TransientOrder(order) => {
                delete(
                    transient_order_items::table
                        .filter(transient_order_items::transient_order_id.eq(order.id)),
                )
                .execute(self.conn)?;
                delete(transient_orders::table.find(order.id)).execute(self.conn)?;
            }
            PendingMarker::WalletTopUp(top_up) => {
                delete(wallet_top_ups::table.find(top_up.id)).execute(self.conn)?;
            }
            PendingMarker::Boost(intent) => {
                delete(boost_intents::table.find(intent.id)).execute(self.conn)?;
            }
            PendingMarker::Subscription(intent) => {
                delete(subscription_intents::table.find(intent.id)).execute(self.conn)?;
            }
        }

        Ok(())
    }

    fn find_user(&mut self, user_id: Uuid) -> TxResult<Option<UserEntitlement>> {
        let row = users::table
            .find(user_id)
            .select(UserRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;

        Ok(row.map(UserEntitlement::from))
    }

    fn find_user_by_subscription(
        &mut self,
        platform: Platform,
        transaction_id: &str,
    ) -> TxResult<Option<UserEntitlement>> {
        let row = users::table
            .filter(users::subscription_platform.eq(platform.as_str()))
            .filter(users::subscription_transaction_id.eq(transaction_id))
            .select(UserRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;

        Ok(row.map(UserEntitlement::from))
    }

    fn update_subscription(&mut self, user_id: Uuid, plan: &SubscriptionPlan) -> TxResult<()> {
        update(users::table.find(user_id))
            .set(&SubscriptionChangeset::from(plan))
            .execute(self.conn)?;

        Ok(())
    }

    fn credit_wallet(&mut self, user_id: Uuid, amount_minor: i64) -> TxResult<()> {
        let updated = update(users::table.find(user_id))
            .set(users::wallet_balance_minor.eq(users::wallet_balance_minor + amount_minor))
            .execute(self.conn)?;

        if updated == 0 {
            return Err(TxError::precondition(format!("wallet owner {user_id} not found")));
        }

        Ok(())
    }

    fn clear_stripe_payment_method(&mut self, payment_method_id: &str) -> TxResult<usize> {
        let updated = update(
            users::table.filter(users::stripe_default_payment_method.eq(payment_method_id)),
        )
        .set(users::stripe_default_payment_method.eq(None::<String>))
        .execute(self.conn)?;

        Ok(updated)
    }

    fn clear_stripe_customer(&mut self, customer_id: &str) -> TxResult<usize> {
        let updated = update(users::table.filter(users::stripe_customer_id.eq(customer_id)))
            .set((
                users::stripe_customer_id.eq(None::<String>),
                users::stripe_default_payment_method.eq(None::<String>),
            ))
            .execute(self.conn)?;

        Ok(updated)
    }

    fn find_listing(&mut self, target: BoostTarget, listing_id: Uuid) -> TxResult<Option<Listing>> {
        let listing = match target {
            BoostTarget::Product => products::table
                .find(listing_id)
                .select(ProductRow::as_select())
                .for_update()
                .first(self.conn)
                .optional()?
                .map(Listing::from),
            BoostTarget::Service => services::table
                .find(listing_id)
                .select(ServiceRow::as_select())
                .for_update()
                .first(self.conn)
                .optional()?
                .map(Listing::from),
        };

        Ok(listing)
    }

    fn update_boost(
        &mut self,
        target: BoostTarget,
        listing_id: Uuid,
        boost: &BoostPlan,
    ) -> TxResult<()> {
        match target {
            BoostTarget::Product => {
                update(products::table.find(listing_id))
                    .set((
                        products::boost_transaction_id.eq(boost.transaction_id.clone()),
                        products::boost_name.eq(boost.name.as_str()),
                        products::boost_purchased_at.eq(boost.purchased_at),
                        products::boost_expires_at.eq(boost.expires_at),
                    ))
                    .execute(self.conn)?;
            }
            BoostTarget::Service => {
                update(services::table.find(listing_id))
                    .set((
                        services::boost_transaction_id.eq(boost.transaction_id.clone()),
                        services::boost_name.eq(boost.name.as_str()),
                        services::boost_purchased_at.eq(boost.purchased_at),
                        services::boost_expires_at.eq(boost.expires_at),
                    ))
                    .execute(self.conn)?;
            }
        }

        Ok(())
    }

    fn insert_purchased_order(&mut self, order: &NewPurchasedOrder) -> TxResult<()> {
        insert_into(purchased_orders::table)
            .values(&order.order)
            .execute(self.conn)?;
        insert_into(purchased_order_items::table)
            .values(&order.items)
            .execute(self.conn)?;

        Ok(())
    }

    fn clear_cart(&mut self, user_id: Uuid) -> TxResult<()> {
        delete(cart_items::table.filter(cart_items::user_id.eq(user_id))).execute(self.conn)?;
        Ok(())
    }

    fn append_revenue(&mut self, entry: &RevenueEntry) -> TxResult<()> {
        insert_into(revenue_entries::table)
            .values(RevenueEntryRow::from(entry))
            .execute(self.conn)?;
        Ok(())
    }

    fn stamp_revenue_cancelled(
        &mut self,
        platform: Platform,
        transaction_id: &str,
        cancelled_at: DateTime<Utc>,
    ) -> TxResult<usize> {
        let updated = update(
            revenue_entries::table
                .filter(revenue_entries::platform.eq(platform.as_str()))
                .filter(revenue_entries::transaction_id.eq(transaction_id))
                .filter(revenue_entries::cancelled_at.is_null()),
        )
        .set(revenue_entries::cancelled_at.eq(Some(cancelled_at)))
        .execute(self.conn)?;

        Ok(updated)
    }

    fn append_wallet_transaction(&mut self, transaction: &WalletTransaction) -> TxResult<()> {
        insert_into(wallet_transactions::table)
            .values(WalletTransactionRow::from(transaction))
            .execute(self.conn)?;
        Ok(())
    }

    fn insert_admin_profit_accrual(&mut self, accrual: &AdminProfitAccrual) -> TxResult<()> {
        insert_into(admin_profit_accruals::table)
            .values(accrual)
            .execute(self.conn)?;
        Ok(())
    }

    fn find_admin_profit_accrual(
        &mut self,
        payment_intent_id: &str,
    ) -> TxResult<Option<AdminProfitAccrual>> {
        let accrual = admin_profit_accruals::table
            .find(payment_intent_id)
            .select(AdminProfitAccrual::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;

        Ok(accrual)
    }

    fn delete_admin_profit_accrual(&mut self, payment_intent_id: &str) -> TxResult<()> {
        delete(admin_profit_accruals::table.find(payment_intent_id)).execute(self.conn)?;
        Ok(())
    }

    fn add_admin_profit(&mut self, profit_minor: i64) -> TxResult<()> {
        let now = Utc::now();

        insert_into(admin_ledger::table)
            .values((
                admin_ledger::id.eq(ADMIN_LEDGER_ROW),
                admin_ledger::total_profit_minor.eq(profit_minor),
                admin_ledger::updated_at.eq(now),
            ))
            .on_conflict(admin_ledger::id)
            .do_update()
            .set((
                admin_ledger::total_profit_minor
                    .eq(admin_ledger::total_profit_minor + profit_minor),
                admin_ledger::updated_at.eq(now),
            ))
            .execute(self.conn)?;

        Ok(())
    }
}
