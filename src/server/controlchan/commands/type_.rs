//! `TYPE` (spec.md §3, §4.2): `TYPE I` → 200; `TYPE A` → 200 and toggle
//! ASCII translation; any other type → 504.

use crate::server::controlchan::command::TransferType;
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use crate::transfer::TransferMode;
use async_trait::async_trait;

pub struct Type {
    pub kind: TransferType,
}

#[async_trait]
impl CommandHandler for Type {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        let mode = match self.kind {
            TransferType::Ascii => TransferMode::Ascii,
            TransferType::Binary => TransferMode::Binary,
            TransferType::Other(code) => {
                return Ok(HandlerOutput::reply_only(Reply::new(
                    ReplyCode::COMMAND_NOT_IMPLEMENTED_FOR_PARAM,
                    format!("Type '{}' not implemented", code),
                )));
            }
        };
        ctx.session.lock().await.transfer_mode = mode;
        Ok(HandlerOutput::reply_only(Reply::new(ReplyCode::COMMAND_OKAY, "Type set ok")))
    }
}
