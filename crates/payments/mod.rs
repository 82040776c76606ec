pub mod apple_notifications;
pub mod google_client;
pub mod google_notifications;
pub mod stripe_client;
pub mod stripe_events;
pub mod webhook_error;
