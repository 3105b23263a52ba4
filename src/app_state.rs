use std::sync::Arc;

use validator::Validate;

use crate::{
    config::{Config, StoreBackend},
    db::Database,
    errors::AppResult,
    models::{
        domain::TokenScope,
        dto::{
            request::{CurrentTokenQuery, RedeemRequest},
            response::{RedeemResponse, TokenDto},
        },
    },
    repositories::{InMemoryTokenRepository, MongoTokenRepository, TokenRepository},
    services::{
        Clock, ExpirationSweeper, ImageEncoder, QrImageEncoder, RedemptionService, SystemClock,
        TokenIssuer,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub token_issuer: Arc<TokenIssuer>,
    pub redemption_service: Arc<RedemptionService>,
    pub token_repository: Arc<dyn TokenRepository>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let token_repository: Arc<dyn TokenRepository> = match config.store_backend {
            StoreBackend::Mongo => {
                let db = Database::connect(&config).await?;
                let repository = MongoTokenRepository::new(&db, &config.tokens_collection);
                repository.ensure_indexes().await?;
                Arc::new(repository)
            }
            StoreBackend::Memory => {
                log::warn!("Using in-memory token store; tokens are lost on restart");
                Arc::new(InMemoryTokenRepository::new())
            }
        };

        let encoder = Arc::new(QrImageEncoder::new(config.qr_image_size));
        Self::from_parts(config, token_repository, encoder, Arc::new(SystemClock))
    }

    pub fn from_parts(
        config: Config,
        token_repository: Arc<dyn TokenRepository>,
        encoder: Arc<dyn ImageEncoder>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let token_issuer = Arc::new(TokenIssuer::new(
            &config,
            token_repository.clone(),
            encoder,
            clock.clone(),
        )?);
        let redemption_service = Arc::new(RedemptionService::new(
            &config,
            token_repository.clone(),
            token_issuer.clone(),
            clock.clone(),
        ));

        Ok(Self {
            token_issuer,
            redemption_service,
            token_repository,
            clock,
            config: Arc::new(config),
        })
    }

    /// Token to display for the subject's scope.
    pub async fn current_token(&self, subject: Option<&str>) -> AppResult<TokenDto> {
        CurrentTokenQuery {
            subject: subject.map(str::to_string),
        }
        .validate()?;
        let scope = TokenScope::resolve(self.config.subject_partitioning, subject)?;
        let token = self.token_issuer.current(&scope).await?;
        Ok(TokenDto::from_token(token, self.config.validity_window_ms))
    }

    pub async fn redeem(&self, request: RedeemRequest) -> AppResult<RedeemResponse> {
        request.validate()?;
        let outcome = self
            .redemption_service
            .redeem(
                &request.identifier,
                request.subject.as_deref(),
                request.timestamp,
            )
            .await?;
        Ok(RedeemResponse::from_outcome(
            outcome,
            self.config.validity_window_ms,
        ))
    }

    pub fn sweeper(&self) -> ExpirationSweeper {
        ExpirationSweeper::new(&self.config, self.token_repository.clone(), self.clock.clone())
    }
}
