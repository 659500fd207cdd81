//! Rentflow Engine
//!
//! Order pricing, availability and reconciliation engine for the Rentflow
//! party-rental booking platform. This crate is the computation and
//! reconciliation layer between the storefront/back-office request handlers
//! and the persistence, distance, notification and payment collaborators;
//! it owns no HTTP surface of its own.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod models;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::availability::AvailabilityService;
use crate::services::changelog::ChangelogService;
use crate::services::geocoding::{Coordinates, DistanceProvider, HaversineDistanceProvider};
use crate::services::notifications::{LoggingNotificationSender, NotificationSender};
use crate::services::pricing_rules::PricingRulesProvider;
use crate::services::quotes::QuoteService;
use crate::services::reconciliation::ReconciliationService;

/// Bundle of the engine's services, wired once at startup and handed to the
/// host application's request handlers.
#[derive(Clone)]
pub struct Engine {
    pub db: Arc<DatabaseConnection>,
    pub config: config::EngineConfig,
    pub rules: Arc<PricingRulesProvider>,
    pub quotes: QuoteService,
    pub availability: AvailabilityService,
    pub changelog: ChangelogService,
    pub reconciliation: ReconciliationService,
}

impl Engine {
    /// Wires the engine against an established database connection.
    ///
    /// `event_sender` is optional: without one, domain events are dropped.
    /// The default notification sender only logs; hosts that deliver real
    /// email/SMS pass their own implementation via [`Engine::with_notifier`].
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::EngineConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self::with_notifier(db, config, event_sender, Arc::new(LoggingNotificationSender))
    }

    pub fn with_notifier(
        db: Arc<DatabaseConnection>,
        config: config::EngineConfig,
        event_sender: Option<Arc<EventSender>>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self::with_collaborators(
            db,
            config,
            event_sender,
            notifier,
            Arc::new(HaversineDistanceProvider),
        )
    }

    /// Full wiring for hosts supplying their own distance backend (e.g.
    /// road distance from a routing service instead of great-circle miles).
    pub fn with_collaborators(
        db: Arc<DatabaseConnection>,
        config: config::EngineConfig,
        event_sender: Option<Arc<EventSender>>,
        notifier: Arc<dyn NotificationSender>,
        distance: Arc<dyn DistanceProvider>,
    ) -> Self {
        let rules = Arc::new(PricingRulesProvider::new(db.clone()));
        let quotes = QuoteService::new(
            rules.clone(),
            distance,
            Coordinates {
                latitude: config.warehouse_latitude,
                longitude: config.warehouse_longitude,
            },
        );
        let availability = AvailabilityService::new(db.clone());
        let changelog = ChangelogService::new(db.clone());
        let reconciliation = ReconciliationService::new(
            db.clone(),
            availability.clone(),
            event_sender,
            notifier,
            config.notifications_enabled,
        );
        Self {
            db,
            config,
            rules,
            quotes,
            availability,
            changelog,
            reconciliation,
        }
    }
}
