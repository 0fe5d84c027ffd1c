use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use coachline_api::{app, AppState};
use coachline_core::upstream::CoachApi;
use coachline_reservation::{MirrorWriter, PnrMapper, ReservationRegistry};
use coachline_store::artifact_repo::StoreArtifactCache;
use coachline_store::index_repo::StoreBookingIndex;
use coachline_store::purchase_repo::StorePurchaseRepository;
use coachline_store::{
    DbClient, HttpCoachApi, HttpTicketRenderer, InMemoryBookingStore, InMemoryReservationStore,
    LogMailer, MockCoachApi,
};
use coachline_ticket::TicketService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coachline_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = coachline_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Coachline API on port {}", config.server.port);

    let db = DbClient::open(Path::new(&config.database.path))
        .await
        .expect("Failed to open ticket database");

    let bookings = Arc::new(InMemoryBookingStore::new());
    let reservations = Arc::new(InMemoryReservationStore::new());
    let purchases = Arc::new(StorePurchaseRepository::new(db.clone()));
    let artifacts = Arc::new(StoreArtifactCache::new(db.clone()));
    let index = Arc::new(StoreBookingIndex::new(db));

    let mirror = MirrorWriter::spawn(index, 64);
    let registry = Arc::new(ReservationRegistry::new(reservations));
    let mapper = Arc::new(PnrMapper::new(bookings.clone(), mirror));

    let upstream: Arc<dyn CoachApi> = if config.upstream.use_mock {
        Arc::new(MockCoachApi)
    } else {
        Arc::new(HttpCoachApi::new(config.upstream.base_url.clone()))
    };
    let renderer = Arc::new(HttpTicketRenderer::new(config.renderer.base_url.clone()));

    let tickets = Arc::new(TicketService::new(
        bookings,
        purchases.clone(),
        artifacts,
        renderer,
        config.tickets.public_base_url.clone(),
        config.tickets.booked_by.clone(),
    ));

    let app_state = AppState {
        registry,
        mapper,
        tickets,
        purchases,
        upstream,
        mailer: Arc::new(LogMailer),
        default_hold_seconds: config.upstream.default_hold_seconds,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
