//! `CDUP`/`XCUP`: equivalent to `CWD ..` (spec.md §4.2).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use async_trait::async_trait;

pub struct Cdup;

#[async_trait]
impl CommandHandler for Cdup {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        super::cwd::Cwd { path: "..".to_string() }.handle(ctx).await
    }
}
