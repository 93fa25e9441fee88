mod config;
mod lifecycle;

use anyhow::Result;
use chrono::Local;
use common::auth::{IdentityProvider, TestLoginPolicy};
use common::domain::ListOpportunitiesInput;
use common::supabase::{
    SupabaseClient, SupabaseIdentityProvider, SupabaseInterestRepository,
    SupabaseOpportunityRepository, SupabaseSavedOpportunityRepository, SupabaseUserRepository,
};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryProviders};
use config::ServiceConfig;
use drop_api::domain::{
    format_date_range, truncate_text, EngagementService, FileSnapshotStore, ListingLoader,
    ListingView, LoadOutcome, OpportunityService, SessionMirror,
};
use lifecycle::Lifecycle;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const PREVIEW_COUNT: usize = 3;
const PREVIEW_DESCRIPTION_CHARS: usize = 80;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&config.telemetry())
    {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        supabase_url = %config.supabase_url,
        production = config.production,
        otel_enabled = config.otel_enabled,
        "Starting just-a-drop"
    );
    debug!("Configuration: {:?}", config);

    let client = match SupabaseClient::new(&config.supabase()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create supabase client: {}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };
    if let Err(e) = client.ping().await {
        // Listings still work offline through the bundled dataset
        warn!("Supabase unreachable: {}", e);
    }

    let identity: Arc<dyn IdentityProvider> =
        Arc::new(SupabaseIdentityProvider::new(client.clone()));
    let users = Arc::new(SupabaseUserRepository::new(client.clone()));
    let session = Arc::new(SessionMirror::new(
        identity,
        users,
        Arc::new(FileSnapshotStore::new(
            &config.snapshot_dir,
            &config.snapshot_entry,
        )),
        TestLoginPolicy::new(config.production),
    ));

    let opportunity_service = Arc::new(OpportunityService::new(Arc::new(
        SupabaseOpportunityRepository::new(client.clone()),
    )));
    let engagement_service = Arc::new(EngagementService::new(
        Arc::new(SupabaseSavedOpportunityRepository::new(client.clone())),
        Arc::new(SupabaseInterestRepository::new(client.clone())),
        session.clone(),
    ));
    let listing_loader = ListingLoader::new(opportunity_service);

    // Subscribe before resolving so no provider event is missed
    let events = session.subscribe();
    let token = CancellationToken::new();

    let result = Lifecycle::new(token)
        .with_task("session_listener", {
            let session = session.clone();
            move |ctx| async move {
                session.run_listener(events, ctx).await;
                Ok(())
            }
        })
        .with_task("session_resolver", {
            let session = session.clone();
            move |_| async move {
                report_session(&session, &engagement_service).await;
                Ok(())
            }
        })
        .with_task("listing_refresh", {
            let refresh = config.listing_refresh();
            move |ctx| refresh_listing(listing_loader, refresh, ctx)
        })
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            client.close();
            shutdown_telemetry(telemetry_providers);
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(config.shutdown_timeout_secs))
        .run()
        .await;

    if let Err(e) = result {
        eprintln!("just-a-drop exited with error: {:#}", e);
        std::process::exit(1);
    }
}

async fn report_session(session: &SessionMirror, engagement: &EngagementService) {
    let Some(user) = session.resolve().await else {
        info!("No signed-in user");
        return;
    };
    info!(user_id = %user.id, role = %user.role, "Signed in");

    match engagement.saved_for_user().await {
        Ok(saved) => info!(count = saved.len(), "Saved opportunities"),
        Err(e) => warn!("Failed to load saved opportunities: {}", e),
    }
}

async fn refresh_listing(
    loader: ListingLoader,
    every: Option<Duration>,
    ctx: CancellationToken,
) -> Result<()> {
    let mut view: Option<ListingView> = None;

    loop {
        if let LoadOutcome::Loaded(listing) = loader.load(ListOpportunitiesInput::default()).await {
            if let Some(existing) = view.as_mut() {
                existing.replace_listing(listing);
            } else {
                view = Some(ListingView::new(listing));
            }
            if let Some(view) = &view {
                summarize(view);
            }
        }

        let Some(every) = every else {
            return Ok(());
        };
        tokio::select! {
            _ = ctx.cancelled() => return Ok(()),
            _ = tokio::time::sleep(every) => {}
        }
    }
}

fn summarize(view: &ListingView) {
    let now = Local::now();
    let rendered = view.render(&now);
    info!(
        source = %view.listing().source,
        active = rendered.active.len(),
        past = rendered.past.len(),
        "Opportunities loaded"
    );

    for opportunity in rendered.active.iter().take(PREVIEW_COUNT) {
        let start = opportunity.start_date.map(|d| d.with_timezone(&Local));
        let end = opportunity.end_date.map(|d| d.with_timezone(&Local));
        debug!(
            id = %opportunity.id,
            title = %opportunity.title,
            dates = %format_date_range(start.as_ref(), end.as_ref()),
            "{}",
            truncate_text(&opportunity.description, PREVIEW_DESCRIPTION_CHARS)
        );
    }
}
