//! Barrido de recordatorios
//!
//! Busca cotizaciones abiertas con más de 24 h sin recordatorio y avisa al
//! negocio por SMS. Cada cotización se reclama antes de enviar para que dos
//! barridos solapados no dupliquen el aviso; si el envío falla se libera el
//! reclamo y la cotización vuelve a ser candidata en la próxima ejecución.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::reminder_cutoff;
use crate::notifications::Notifier;
use crate::repositories::Repositories;
use crate::utils::errors::AppResult;

/// Resultado agregado de un barrido
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SweepReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Ejecutar el barrido de forma secuencial; un fallo individual nunca
/// detiene el resto.
pub async fn run_sweep(
    repos: &Repositories,
    notifier: &Notifier,
    now: DateTime<Utc>,
) -> AppResult<SweepReport> {
    let candidates = repos
        .quotes
        .find_reminder_candidates(reminder_cutoff(now))
        .await?;

    let mut report = SweepReport {
        total: candidates.len(),
        ..SweepReport::default()
    };

    for quote in candidates {
        match repos.quotes.claim_reminder(quote.id, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("⏭️ Cotización {} ya reclamada por otro barrido", quote.quote_number);
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                report.failed += 1;
                report.errors.push(format!("{}: {}", quote.quote_number, e));
                continue;
            }
        }

        match notifier.quote_reminder(&quote).await {
            Ok(()) => {
                tracing::info!("⏰ Recordatorio enviado para {}", quote.quote_number);
                report.sent += 1;
            }
            Err(e) => {
                tracing::warn!("⏰ Falló el recordatorio de {}: {}", quote.quote_number, e);
                if let Err(release_error) = repos.quotes.release_reminder(quote.id).await {
                    tracing::error!(
                        "❌ No se pudo liberar el reclamo de {}: {}",
                        quote.quote_number,
                        release_error
                    );
                }
                report.failed += 1;
                report.errors.push(format!("{}: {}", quote.quote_number, e));
            }
        }
    }

    tracing::info!(
        "⏰ Barrido terminado: {} candidatas, {} enviadas, {} fallidas, {} omitidas",
        report.total,
        report.sent,
        report.failed,
        report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewQuote;
    use crate::notifications::mock::{MockEmailSender, MockSmsSender};
    use crate::notifications::sms::LogSmsSender;
    use crate::repositories::memory::MemoryStore;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn new_quote(first_name: &str) -> NewQuote {
        NewQuote {
            first_name: first_name.to_string(),
            last_name: "Ruiz".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            phone: "3125550199".to_string(),
            service_type: "HOURLY".to_string(),
            event_type: "WEDDING".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            pickup_time: None,
            pickup_location: None,
            dropoff_location: None,
            passenger_count: 2,
            vehicle_preference: None,
            special_requests: None,
            customer_id: None,
        }
    }

    fn notifier(sms: MockSmsSender, phone: Option<&str>) -> Notifier {
        Notifier::new(
            Arc::new(MockEmailSender::new()),
            Arc::new(sms),
            "ops@example.com".to_string(),
            phone.map(str::to_string),
            "http://localhost:3000".to_string(),
        )
    }

    #[tokio::test]
    async fn test_sweep_isolates_failures_and_releases_claim() {
        let store = MemoryStore::new();
        let repos = Repositories::in_memory(store.clone());
        let now = Utc::now();

        let ok = repos.quotes.create(new_quote("Ana")).await.unwrap();
        let bad = repos.quotes.create(new_quote("Luis")).await.unwrap();
        store.backdate_quote(ok.id, now - Duration::hours(30)).await;
        store.backdate_quote(bad.id, now - Duration::hours(30)).await;

        let sms = MockSmsSender::new();
        sms.fail_when_body_contains(&bad.quote_number);
        let report = run_sweep(&repos, &notifier(sms.clone(), Some("+13125550100")), now)
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains(&bad.quote_number));

        let ok = repos.quotes.find_by_id(ok.id).await.unwrap().unwrap();
        let bad = repos.quotes.find_by_id(bad.id).await.unwrap().unwrap();
        assert!(ok.reminder_sent_at.is_some());
        assert!(bad.reminder_sent_at.is_none());
        assert_eq!(sms.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_without_sms_provider_keeps_quotes_pending() {
        let store = MemoryStore::new();
        let repos = Repositories::in_memory(store.clone());
        let now = Utc::now();

        let quote = repos.quotes.create(new_quote("Ana")).await.unwrap();
        store.backdate_quote(quote.id, now - Duration::hours(30)).await;

        let notifier = Notifier::new(
            Arc::new(MockEmailSender::new()),
            Arc::new(LogSmsSender),
            "ops@example.com".to_string(),
            Some("+13125550100".to_string()),
            "http://localhost:3000".to_string(),
        );
        let report = run_sweep(&repos, &notifier, now).await.unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 1);
        let quote = repos.quotes.find_by_id(quote.id).await.unwrap().unwrap();
        assert!(quote.reminder_sent_at.is_none());
    }

    #[tokio::test]
    async fn test_sweep_without_business_phone_fails_every_item() {
        let store = MemoryStore::new();
        let repos = Repositories::in_memory(store.clone());
        let now = Utc::now();

        let quote = repos.quotes.create(new_quote("Ana")).await.unwrap();
        store.backdate_quote(quote.id, now - Duration::hours(48)).await;

        let report = run_sweep(&repos, &notifier(MockSmsSender::new(), None), now)
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
        let quote = repos.quotes.find_by_id(quote.id).await.unwrap().unwrap();
        assert!(quote.reminder_sent_at.is_none());
    }
}
