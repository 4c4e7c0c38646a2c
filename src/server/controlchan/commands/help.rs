//! `HELP`: static command listing, accepted before authentication
//! (spec.md §4.2's authentication sub-machine allowlist).

use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler, HandlerOutput};
use crate::server::controlchan::reply::{Reply, ReplyCode};
use async_trait::async_trait;

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, _ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError> {
        Ok(HandlerOutput::reply_only(Reply::multiline(
            ReplyCode::HELP_MESSAGE,
            vec![
                "The following commands are recognized:",
                " USER PASS AUTH PBSZ PROT QUIT FEAT HELP NOOP SYST STAT ACCT",
                " PWD CWD CDUP TYPE STRU MODE PASV EPSV PORT EPRT",
                " RETR STOR STOU APPE LIST NLST MLSD DELE RMD MKD RNFR RNTO",
                " SIZE MDTM REST ABOR ALLO",
                "Help OK",
            ],
        )))
    }
}
