//! One module per subcommand.  Each exposes an `execute` function that
//! takes the resolved `Context` plus the command's own arguments.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod auth;
pub mod collections;
pub mod completions;
pub mod delete;
pub mod export;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod logins;
pub mod price;
pub mod remove;
pub mod sets;
pub mod show;
pub mod status;
pub mod trade;
pub mod value;
