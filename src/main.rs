use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use limo_booking::build_router;
use limo_booking::config::database::{mask_database_url, DatabaseConfig};
use limo_booking::config::EnvironmentConfig;
use limo_booking::controllers::admin_controller::ensure_bootstrap_admin;
use limo_booking::notifications::email::{HttpEmailSender, LogEmailSender};
use limo_booking::notifications::sms::{LogSmsSender, TwilioSmsSender};
use limo_booking::notifications::{EmailSender, Notifier, SmsSender};
use limo_booking::repositories::Repositories;
use limo_booking::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚘 Limousine Booking API");
    info!("================================================");

    let config = EnvironmentConfig::from_env().context("Invalid configuration")?;
    info!("⚙️ Entorno: {}", config.environment);

    // Inicializar base de datos
    info!("🗄️ Conectando a {}", mask_database_url(&config.database_url));
    let pool = DatabaseConfig::new(config.database_url.clone())
        .create_pool()
        .await
        .context("Error de base de datos")?;
    DatabaseConfig::run_migrations(&pool)
        .await
        .context("Error aplicando migraciones")?;
    info!("✅ Base de datos lista");

    let notifier = build_notifier(&config)?;
    let repos = Repositories::postgres(pool);
    let state = AppState::new(config, repos, notifier);

    if let Some(bootstrap) = state.config.bootstrap_admin.as_ref() {
        ensure_bootstrap_admin(&state.repos, state.passwords, bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Error creando el administrador inicial: {}", e))?;
    }

    let addr: SocketAddr = state
        .config
        .server_url()
        .parse()
        .context("HOST/PORT inválidos")?;
    let app = build_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   POST /api/quotes - Solicitar cotización");
    info!("   POST /api/promo-codes/validate - Validar código promocional");
    info!("   GET  /api/vehicles - Catálogo de vehículos");
    info!("   /api/customer/* - Portal de clientes");
    info!("   /api/admin/* - Panel de administración");
    info!("   GET  /api/cron/check-quotes - Barrido de recordatorios");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Proveedores reales cuando están configurados; si no, solo se registran en el log
fn build_notifier(config: &EnvironmentConfig) -> Result<Notifier> {
    let email: Arc<dyn EmailSender> = match (&config.email.api_url, &config.email.api_key) {
        (Some(url), Some(key)) => {
            info!("📧 Email vía {}", url);
            Arc::new(HttpEmailSender::new(url.clone(), key.clone(), config.email.from.clone())?)
        }
        _ => {
            warn!("⚠️ EMAIL_API_URL/EMAIL_API_KEY no configurados, los emails solo se registran");
            Arc::new(LogEmailSender)
        }
    };

    let sms: Arc<dyn SmsSender> = match &config.sms {
        Some(sms_config) => {
            info!("📱 SMS habilitado desde {}", sms_config.from);
            Arc::new(TwilioSmsSender::new(sms_config.clone())?)
        }
        None => {
            warn!("⚠️ Proveedor SMS no configurado, los recordatorios quedarán pendientes");
            Arc::new(LogSmsSender)
        }
    };

    if config.business_phone.is_none() {
        warn!("⚠️ BUSINESS_PHONE no configurado, los recordatorios fallarán");
    }

    Ok(Notifier::new(
        email,
        sms,
        config.business_email.clone(),
        config.business_phone.clone(),
        config.public_base_url.clone(),
    ))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
