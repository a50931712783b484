use std::sync::Arc;

use crate::application::{
    articles::ArticleService, auth::AuthService, exchange_rates::ExchangeRateService,
    likes::LikeService, pagination::PageLimits, repos::HealthRepo, users::UserService,
};

#[derive(Clone)]
pub struct HttpState {
    pub articles: Arc<ArticleService>,
    pub likes: Arc<LikeService>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub exchange_rates: Arc<ExchangeRateService>,
    pub health: Arc<dyn HealthRepo>,
    pub page_limits: PageLimits,
}
