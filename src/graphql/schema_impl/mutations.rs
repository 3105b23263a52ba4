use async_graphql::{Context, ErrorExtensions, Object};

use crate::{
    app_state::AppState,
    models::dto::{request::RedeemRequest, response::RedeemResponse},
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn redeem(
        &self,
        ctx: &Context<'_>,
        input: RedeemRequest,
    ) -> async_graphql::Result<RedeemResponse> {
        let state = ctx.data::<AppState>()?;
        state.redeem(input).await.map_err(|e| e.extend())
    }
}
