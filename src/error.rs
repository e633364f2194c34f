use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("cannot open the spool")]
    Spool,
    #[display("cannot open the ledger")]
    Ledger,
    #[display("invalid label settings")]
    Naming,
    #[display("no way to obtain credentials: set `auth.token_command` or `auth.access_token`")]
    NoCredentials,
    #[display("cannot set up the remote client")]
    Remote,
    #[display("import aborted")]
    Import,
}
