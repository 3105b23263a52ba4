use async_graphql::{Context, ErrorExtensions, Object};

use crate::{app_state::AppState, models::dto::response::TokenDto};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Token currently on display for the scope; mints one if none is live.
    async fn current_token(
        &self,
        ctx: &Context<'_>,
        subject: Option<String>,
    ) -> async_graphql::Result<TokenDto> {
        let state = ctx.data::<AppState>()?;
        state
            .current_token(subject.as_deref())
            .await
            .map_err(|e| e.extend())
    }
}
