// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::Repositories,
    middleware::rate_limit::IpRateLimiter,
    services::{
        auth::AuthService, company_service::CompanyService, credentials::PasswordHasher,
        tenancy_service::TenancyService, token::TokenCodec,
    },
};

const DEV_JWT_SECRET: &str = "your-256-bit-secret";

#[derive(Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: Duration,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub log_level: String,
    pub cors: CorsSettings,
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub trust_proxy_headers: bool,
    pub bcrypt_cost: u32,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Lê o `.env` (se houver) e as variáveis de ambiente.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let max_age_secs: u64 = var("CORS_MAX_AGE", "43200")
            .parse()
            .context("CORS_MAX_AGE deve ser um número de segundos")?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret,
            server_addr: var("SERVER_ADDR", "0.0.0.0:8080"),
            log_level: var("LOG_LEVEL", "info"),
            cors: CorsSettings {
                allowed_origins: split_list(&var("CORS_ALLOWED_ORIGINS", "*")),
                allowed_methods: split_list(&var(
                    "CORS_ALLOWED_METHODS",
                    "GET,POST,PUT,PATCH,DELETE,OPTIONS",
                )),
                allowed_headers: split_list(&var(
                    "CORS_ALLOWED_HEADERS",
                    "Origin,Content-Type,Accept,Authorization",
                )),
                max_age: Duration::from_secs(max_age_secs),
            },
            rate_limit_per_minute: var("RATE_LIMIT_PER_MINUTE", "100")
                .parse()
                .context("RATE_LIMIT_PER_MINUTE deve ser um inteiro")?,
            rate_limit_burst: var("RATE_LIMIT_BURST", "5")
                .parse()
                .context("RATE_LIMIT_BURST deve ser um inteiro")?,
            trust_proxy_headers: var("TRUST_PROXY_HEADERS", "false")
                .parse()
                .context("TRUST_PROXY_HEADERS deve ser true ou false")?,
            bcrypt_cost: var("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())
                .parse()
                .context("BCRYPT_COST deve ser um inteiro")?,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub token_codec: Arc<TokenCodec>,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub tenancy_service: TenancyService,
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Conecta ao Postgres (e roda as migrações) quando `DATABASE_URL` existe;
    /// senão, sobe com o armazenamento em memória.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let repos = match &config.database_url {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(10))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Repositories::postgres(pool)
            }
            None => {
                tracing::warn!("DATABASE_URL não definida, usando armazenamento em memória");
                Repositories::in_memory()
            }
        };

        Ok(Self::with_repositories(config, repos))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_repositories(config: Config, repos: Repositories) -> Self {
        let token_codec = Arc::new(TokenCodec::new(&config.jwt_secret));
        let hasher = PasswordHasher::new(config.bcrypt_cost);

        let auth_service = AuthService::new(repos.users.clone(), hasher, token_codec.clone());
        let company_service = CompanyService::new(repos.companies.clone());
        let tenancy_service = TenancyService::new(&repos, auth_service.clone());
        let rate_limiter = Arc::new(
            IpRateLimiter::new(config.rate_limit_per_minute, config.rate_limit_burst)
                .trusting_proxy_headers(config.trust_proxy_headers),
        );

        Self {
            config: Arc::new(config),
            token_codec,
            auth_service,
            company_service,
            tenancy_service,
            rate_limiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert!(config.database_url.is_none());
        assert!(config.uses_dev_secret());
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.rate_limit_burst, 5);
        assert!(!config.trust_proxy_headers);
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert_eq!(config.cors.allowed_methods.len(), 6);
        assert_eq!(config.cors.max_age, Duration::from_secs(12 * 60 * 60));
    }

    #[test]
    fn lists_are_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "CORS_ALLOWED_ORIGINS",
            " https://a.test , https://b.test ,",
        )]))
        .unwrap();
        assert_eq!(config.cors.allowed_origins, vec!["https://a.test", "https://b.test"]);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let result = Config::from_lookup(lookup_from(&[("RATE_LIMIT_BURST", "lots")]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup_from(&[("TRUST_PROXY_HEADERS", "maybe")]));
        assert!(result.is_err());
    }
}
