pub mod payment_webhooks;
