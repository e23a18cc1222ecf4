use std::sync::Arc;

use common::auth::{AuthService, JwtService};
use common::config::Settings;
use common::db::repositories::{CompanyRepository, JobRepository, UserRepository};
use common::db::DbPool;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub jwt: JwtService,
    pub config: Arc<Settings>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: Settings, metrics: Option<PrometheusHandle>) -> Self {
        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_hours);

        Self {
            db_pool,
            jwt,
            config: Arc::new(config),
            metrics,
        }
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.db_pool.clone())
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.db_pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db_pool.clone()).with_bcrypt_cost(self.config.auth.bcrypt_cost)
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.jwt.clone(), self.users())
    }
}
