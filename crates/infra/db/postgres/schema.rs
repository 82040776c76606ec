// Kept in sync with crates/migrations by hand.

diesel::table! {
    users (id) {
        id -> Uuid,
        role -> Text,
        wallet_balance_minor -> Int8,
        device_tokens -> Array<Text>,
        stripe_customer_id -> Nullable<Text>,
        stripe_default_payment_method -> Nullable<Text>,
        subscription_platform -> Text,
        subscription_transaction_id -> Nullable<Text>,
        subscription_name -> Text,
        subscription_available_postings -> Int4,
        subscription_available_boosts -> Int4,
        subscription_wishlist_feature -> Bool,
        subscription_purchased_at -> Nullable<Timestamptz>,
        subscription_renewed_at -> Nullable<Timestamptz>,
        subscription_expires_at -> Nullable<Timestamptz>,
        subscription_status -> Text,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        seller_id -> Uuid,
        title -> Text,
        price_minor -> Int8,
        quantity -> Int4,
        is_active -> Bool,
        boost_transaction_id -> Nullable<Text>,
        boost_name -> Text,
        boost_purchased_at -> Nullable<Timestamptz>,
        boost_expires_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    services (id) {
        id -> Uuid,
        provider_id -> Uuid,
        title -> Text,
        is_active -> Bool,
        boost_transaction_id -> Nullable<Text>,
        boost_name -> Text,
        boost_purchased_at -> Nullable<Timestamptz>,
        boost_expires_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    cart_items (user_id, product_id) {
        user_id -> Uuid,
        product_id -> Uuid,
        quantity -> Int4,
    }
}

diesel::table! {
    transient_orders (id) {
        id -> Uuid,
        buyer_id -> Uuid,
        payment_intent_id -> Text,
        total_minor -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    transient_order_items (transient_order_id, product_id) {
        transient_order_id -> Uuid,
        product_id -> Uuid,
        seller_id -> Uuid,
        price_minor -> Int8,
        quantity -> Int4,
    }
}

diesel::table! {
    purchased_orders (id) {
        id -> Uuid,
        buyer_id -> Uuid,
        payment_intent_id -> Text,
        total_minor -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    purchased_order_items (purchased_order_id, product_id) {
        purchased_order_id -> Uuid,
        product_id -> Uuid,
        seller_id -> Uuid,
        price_minor -> Int8,
        quantity -> Int4,
    }
}

diesel::table! {
    wallet_top_ups (id) {
        id -> Uuid,
        user_id -> Uuid,
        payment_intent_id -> Text,
        amount_minor -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    boost_intents (id) {
        id -> Uuid,
        owner_id -> Uuid,
        target -> Text,
        listing_id -> Uuid,
        boost_name -> Text,
        payment_intent_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    subscription_intents (id) {
        id -> Uuid,
        user_id -> Uuid,
        platform -> Text,
        intent_key -> Text,
        transaction_id -> Text,
        plan_name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    revenue_entries (id) {
        id -> Uuid,
        user_id -> Uuid,
        platform -> Text,
        transaction_id -> Text,
        plan_name -> Text,
        purchased_at -> Timestamptz,
        renewed_at -> Nullable<Timestamptz>,
        expires_at -> Nullable<Timestamptz>,
        price_minor -> Int8,
        cancelled_at -> Nullable<Timestamptz>,
        kind -> Text,
    }
}

diesel::table! {
    wallet_transactions (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount_minor -> Int8,
        kind -> Text,
        reference -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    admin_profit_accruals (payment_intent_id) {
        payment_intent_id -> Text,
        transfer_amount_minor -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    admin_ledger (id) {
        id -> Int4,
        total_profit_minor -> Int8,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    admin_notifications (id) {
        id -> Uuid,
        sender_id -> Uuid,
        kind -> Text,
        title -> Text,
        body -> Text,
        schedule_date -> Nullable<Timestamptz>,
        sent_date -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(cart_items -> users (user_id));
diesel::joinable!(cart_items -> products (product_id));
diesel::joinable!(products -> users (seller_id));
diesel::joinable!(services -> users (provider_id));
diesel::joinable!(transient_order_items -> transient_orders (transient_order_id));
diesel::joinable!(purchased_order_items -> purchased_orders (purchased_order_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    products,
    services,
    cart_items,
    transient_orders,
    transient_order_items,
    purchased_orders,
    purchased_order_items,
    wallet_top_ups,
    boost_intents,
    subscription_intents,
    revenue_entries,
    wallet_transactions,
    admin_profit_accruals,
    admin_ledger,
    admin_notifications,
);
