//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod reservations;

use crate::{config::CirculationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub reservations: reservations::ReservationsService,
    /// Kept for infrastructure probes (readiness pings the pool directly)
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, circulation_config: CirculationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), circulation_config.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                circulation_config.clone(),
            ),
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                circulation_config,
            ),
            repository,
        }
    }
}
