//! Textos de los mensajes salientes (texto plano)

use super::EmailMessage;
use crate::models::{Booking, Customer, Quote};

pub fn quote_confirmation(quote: &Quote) -> EmailMessage {
    EmailMessage {
        to: quote.email.clone(),
        subject: format!("We received your quote request {}", quote.quote_number),
        body: format!(
            "Hi {},\n\nThank you for your request. Your quote number is {}.\n\
             Event: {} on {} for {} passenger(s).\n\n\
             Our team will get back to you shortly with pricing.\n",
            quote.first_name,
            quote.quote_number,
            quote.event_type,
            quote.event_date,
            quote.passenger_count
        ),
    }
}

pub fn quote_business_alert(quote: &Quote, business_email: &str) -> EmailMessage {
    EmailMessage {
        to: business_email.to_string(),
        subject: format!("New quote request {} ({})", quote.quote_number, quote.event_type),
        body: format!(
            "New quote request {}\n\nName: {}\nEmail: {}\nPhone: {}\nService: {}\n\
             Event: {}\nDate: {}\nPassengers: {}\nPickup: {}\nDrop-off: {}\n\
             Vehicle preference: {}\nRequests: {}\n",
            quote.quote_number,
            quote.full_name(),
            quote.email,
            quote.phone,
            quote.service_type,
            quote.event_type,
            quote.event_date,
            quote.passenger_count,
            quote.pickup_location.as_deref().unwrap_or("-"),
            quote.dropoff_location.as_deref().unwrap_or("-"),
            quote.vehicle_preference.as_deref().unwrap_or("-"),
            quote.special_requests.as_deref().unwrap_or("-"),
        ),
    }
}

pub fn quote_response(quote: &Quote) -> EmailMessage {
    let price = quote
        .quoted_price
        .map(|p| format!("${}", p.round_dp(2)))
        .unwrap_or_else(|| "to be confirmed".to_string());

    EmailMessage {
        to: quote.email.clone(),
        subject: format!("Update on your quote {}", quote.quote_number),
        body: format!(
            "Hi {},\n\nYour quote {} is now {}.\nQuoted price: {}\n",
            quote.first_name,
            quote.quote_number,
            quote.status.as_str(),
            price
        ),
    }
}

pub fn booking_confirmation(booking: &Booking) -> EmailMessage {
    EmailMessage {
        to: booking.customer_email.clone(),
        subject: format!("Booking {} confirmed", booking.booking_number),
        body: format!(
            "Hi {},\n\nYour booking {} is confirmed for {} at {}.\nTotal: ${}\n",
            booking.customer_name,
            booking.booking_number,
            booking.event_date,
            booking.pickup_time,
            booking.total_price.round_dp(2)
        ),
    }
}

pub fn email_verification(customer: &Customer, base_url: &str, token: &str) -> EmailMessage {
    EmailMessage {
        to: customer.email.clone(),
        subject: "Verify your email address".to_string(),
        body: format!(
            "Hi {},\n\nPlease verify your email address:\n{}/customer/verify-email?token={}\n",
            customer.first_name,
            base_url.trim_end_matches('/'),
            token
        ),
    }
}

pub fn password_reset(customer: &Customer, base_url: &str, token: &str) -> EmailMessage {
    EmailMessage {
        to: customer.email.clone(),
        subject: "Reset your password".to_string(),
        body: format!(
            "Hi {},\n\nUse the link below to choose a new password. It expires in 1 hour.\n\
             {}/customer/reset-password?token={}\n\n\
             If you did not request this, you can ignore this email.\n",
            customer.first_name,
            base_url.trim_end_matches('/'),
            token
        ),
    }
}

pub fn quote_reminder(quote: &Quote) -> String {
    format!(
        "Reminder: quote {} from {} ({}, {}) is still {} after 24h.",
        quote.quote_number,
        quote.full_name(),
        quote.event_type,
        quote.event_date,
        quote.status.as_str()
    )
}
