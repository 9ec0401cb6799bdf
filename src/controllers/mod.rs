pub mod admin_controller;
pub mod booking_controller;
pub mod cron_controller;
pub mod customer_controller;
pub mod driver_controller;
pub mod invoice_controller;
pub mod promo_code_controller;
pub mod quote_controller;
pub mod vehicle_controller;
